//! Record derive macro implementation
//!
//! Reads `#[record(...)]` attributes and implements both `Record` and `Scan`
//! over the mapped fields.

use proc_macro::TokenStream;
use proc_macro2::Ident;
use quote::quote;
use syn::{parse::Result, parse_macro_input, Attribute, Data, DeriveInput, Error, Fields, LitStr};

/// Main implementation function for the Record derive
pub fn derive_record_impl(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match expand(&input) {
        Ok(result) => result.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

/// A struct field and how it maps to a column
struct FieldInfo {
    ident: Ident,
    column: String,
    skip: bool,
}

fn expand(input: &DeriveInput) -> Result<proc_macro2::TokenStream> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let table = parse_table(&input.attrs)?
        .ok_or_else(|| Error::new_spanned(name, "missing #[record(table = \"...\")] attribute"))?;

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => fields
                .named
                .iter()
                .map(|field| {
                    let ident = field.ident.clone().ok_or_else(|| Error::new_spanned(field, "expected a named field"))?;
                    parse_field(ident, &field.attrs)
                })
                .collect::<Result<Vec<_>>>()?,
            _ => {
                return Err(Error::new_spanned(
                    input,
                    "#[derive(Record)] requires a struct with named fields",
                ))
            }
        },
        _ => return Err(Error::new_spanned(input, "#[derive(Record)] can only be applied to structs")),
    };

    let mapped: Vec<&FieldInfo> = fields.iter().filter(|f| !f.skip).collect();
    let columns = mapped.iter().map(|f| f.column.as_str());
    let value_idents = mapped.iter().map(|f| &f.ident);
    let count = mapped.len();

    let scanned = mapped.iter().enumerate().map(|(index, f)| {
        let ident = &f.ident;
        quote! { #ident: row.get(#index)? }
    });
    let defaulted = fields.iter().filter(|f| f.skip).map(|f| {
        let ident = &f.ident;
        quote! { #ident: ::std::default::Default::default() }
    });

    Ok(quote! {
        impl #impl_generics ::unisql::Record for #name #ty_generics #where_clause {
            fn table() -> &'static str {
                #table
            }

            fn fields() -> &'static [&'static str] {
                &[#(#columns),*]
            }

            fn values(&self) -> ::std::vec::Vec<::unisql::Value> {
                ::std::vec![#(::unisql::ToValue::to_value(&self.#value_idents)),*]
            }
        }

        impl #impl_generics ::unisql::Scan for #name #ty_generics #where_clause {
            fn scan(row: &::unisql::Row) -> ::unisql::SqlResult<Self> {
                row.expect_columns(#count)?;
                Ok(Self {
                    #(#scanned,)*
                    #(#defaulted,)*
                })
            }
        }
    })
}

fn parse_table(attrs: &[Attribute]) -> Result<Option<String>> {
    let mut table = None;
    for attr in attrs.iter().filter(|a| a.path().is_ident("record")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("table") {
                let value: LitStr = meta.value()?.parse()?;
                if value.value().trim().is_empty() {
                    return Err(meta.error("table name must not be empty"));
                }
                table = Some(value.value());
                Ok(())
            } else {
                Err(meta.error("unsupported record attribute, expected `table`"))
            }
        })?;
    }
    Ok(table)
}

fn parse_field(ident: Ident, attrs: &[Attribute]) -> Result<FieldInfo> {
    let mut column = None;
    let mut skip = false;

    for attr in attrs.iter().filter(|a| a.path().is_ident("record")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("column") {
                let value: LitStr = meta.value()?.parse()?;
                column = Some(value.value());
                Ok(())
            } else if meta.path.is_ident("skip") {
                skip = true;
                Ok(())
            } else {
                Err(meta.error("unsupported record attribute, expected `column` or `skip`"))
            }
        })?;
    }

    let column = column.unwrap_or_else(|| ident.to_string().trim_start_matches("r#").to_string());
    Ok(FieldInfo { ident, column, skip })
}
