//! Procedural macros for pmongo.
//!
//! `#[derive(Document)]` implements `pmongo::document::Document` for a struct.
//! The collection defaults to the struct name and can be overridden:
//!
//! ```ignore
//! #[derive(Debug, Serialize, Deserialize, Document)]
//! #[document(collection = "orderStatusMappingLookUpInfo")]
//! pub struct OrderStatus {
//!     pub internal_status: String,
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as pmongo_macros;

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{DeriveInput, LitStr, parse_macro_input};

#[proc_macro_derive(Document, attributes(document))]
pub fn derive_document(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    expand_document(input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand_document(input: DeriveInput) -> syn::Result<TokenStream2> {
    let collection = collection_name(&input)?
        .unwrap_or_else(|| LitStr::new(&input.ident.to_string(), input.ident.span()));

    if collection.value().trim().is_empty() {
        return Err(syn::Error::new(collection.span(), "collection name must not be empty"));
    }

    let ident = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::pmongo::document::Document for #ident #ty_generics #where_clause {
            fn collection_name() -> &'static str {
                #collection
            }
        }
    })
}

/// Reads `#[document(collection = "...")]`, if present.
fn collection_name(input: &DeriveInput) -> syn::Result<Option<LitStr>> {
    let mut collection = None;

    for attr in input.attrs.iter().filter(|attr| attr.path().is_ident("document")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("collection") {
                collection = Some(meta.value()?.parse::<LitStr>()?);
                Ok(())
            } else {
                Err(meta.error("unsupported document attribute, expected `collection`"))
            }
        })?;
    }

    Ok(collection)
}
