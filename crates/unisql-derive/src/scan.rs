//! Scan derive macro implementation

use proc_macro::TokenStream;
use quote::quote;
use syn::{parse::Result, parse_macro_input, Data, DeriveInput, Error, Fields};

pub fn derive_scan_impl(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match expand(&input) {
        Ok(result) => result.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(input: &DeriveInput) -> Result<proc_macro2::TokenStream> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let data = match &input.data {
        Data::Struct(data) => data,
        _ => return Err(Error::new_spanned(input, "#[derive(Scan)] can only be applied to structs")),
    };

    let count = data.fields.len();
    let body = match &data.fields {
        Fields::Named(fields) => {
            let assignments = fields.named.iter().enumerate().map(|(index, field)| {
                let ident = &field.ident;
                quote! { #ident: row.get(#index)? }
            });
            quote! { Self { #(#assignments),* } }
        }
        Fields::Unnamed(fields) => {
            let values = (0..fields.unnamed.len()).map(|index| quote! { row.get(#index)? });
            quote! { Self(#(#values),*) }
        }
        Fields::Unit => quote! { Self },
    };

    Ok(quote! {
        impl #impl_generics ::unisql::Scan for #name #ty_generics #where_clause {
            fn scan(row: &::unisql::Row) -> ::unisql::SqlResult<Self> {
                row.expect_columns(#count)?;
                Ok(#body)
            }
        }
    })
}
