use proc_macro::TokenStream;

mod record;

/// Derive `dtokit::record::Record` for a struct with named fields.
///
/// Field attributes: `#[record(skip)]`, `#[record(rename = "...")]`,
/// `#[record(presence)]`.
/// Struct attributes: `#[record(name = "...")]` and repeatable
/// `#[record(setter(field = "...", with = "path", getter = "path"))]`.
#[proc_macro_derive(Record, attributes(record))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    record::derive_record(input.into()).into()
}
