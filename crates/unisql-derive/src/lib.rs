//! # unisql-derive
//!
//! Derive macros for unisql records and rows:
//! - `#[derive(Record)]`: table mapping plus positional scanning
//! - `#[derive(Scan)]`: positional scanning only

use proc_macro::TokenStream;

mod record;
mod scan;

/// Map a struct with named fields to a table
///
/// Struct attribute `#[record(table = "name")]` is required. Field attributes:
/// `#[record(column = "name")]` renames the column, `#[record(skip)]` leaves
/// the field unmapped (filled with `Default::default()` when scanning).
#[proc_macro_derive(Record, attributes(record))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    record::derive_record_impl(input)
}

/// Fill a struct from a row, one field per column in declaration order
#[proc_macro_derive(Scan)]
pub fn derive_scan(input: TokenStream) -> TokenStream {
    scan::derive_scan_impl(input)
}
