//! Derive macros for sqlbind
//!
//! Provides `#[derive(Record)]`.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod common;
mod record;

/// Derive the `Record` trait for a struct.
///
/// Public fields take part in INSERT normalization and row binding, in
/// declaration order. Private fields are ignored.
///
/// # Example
///
/// ```ignore
/// use sqlbind::Record;
///
/// #[derive(Default, Record)]
/// pub struct User {
///     pub id: i64,
///     #[db(column = "username")]
///     pub name: String,
///     #[db(tag(json = "createdAt"))]
///     pub created_at: Option<chrono::NaiveDateTime>,
///     #[db(unmarshal)]
///     pub labels: Labels,
/// }
/// ```
///
/// # Attributes
///
/// - `#[db(column = "name")]` - Column name under the `db` tag; modifiers after a comma are ignored
/// - `#[db(tag(json = "name", ...))]` - Column names under other tags
/// - `#[db(skip)]` - Leave the field out entirely
/// - `#[db(unmarshal)]` - Decode byte values through the field's `UnmarshalBytes` impl
/// - `#[db(raw)]` - Hand the driver value to the field's `AcceptValue` impl
///
/// Every included field must implement `ToValue`; fields bound through the
/// conversion matrix must also implement `Bindable`.
#[proc_macro_derive(Record, attributes(db))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    record::expand(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
