//! Passes the trait definition back out, extended for remote use.

use quote::quote;
use syn::{ItemTrait, TraitItem};

/// Inserts the `&self` receiver into every method and attaches the
/// async-trait attribute, so the trait can be implemented by server
/// objects and by the generated stub alike.
pub(crate) fn extend_trait(mut trait_def: ItemTrait) -> proc_macro2::TokenStream {
    for item in trait_def.items.iter_mut() {
        if let TraitItem::Fn(f) = item {
            f.sig.inputs.insert(0, syn::parse_quote!(&self));
        }
    }

    quote! {
        #[rmi_core::async_trait]
        #trait_def
    }
}
