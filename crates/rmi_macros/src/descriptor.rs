//! Derives the static interface descriptor for an annotated trait.

use quote::{format_ident, quote};
use syn::ItemTrait;

use crate::method::{type_string, RemoteMethod};

pub(crate) fn descriptor_ident(trait_ident: &syn::Ident) -> syn::Ident {
    format_ident!(
        "{}_DESCRIPTOR",
        crate::pascal_to_screaming_snake(&trait_ident.to_string())
    )
}

pub(crate) fn derive(trait_def: &ItemTrait, methods: &[RemoteMethod]) -> proc_macro2::TokenStream {
    let trait_ident = &trait_def.ident;
    let vis = &trait_def.vis;
    let name = trait_ident.to_string();
    let ident = descriptor_ident(trait_ident);

    let entries = methods.iter().map(|m| {
        let method_name = m.ident.to_string();
        let param_types = m.params.iter().map(|(_, ty)| type_string(ty));
        let return_type = type_string(&m.ok_type);
        quote! {
            rmi_core::interface::MethodDescriptor {
                name: #method_name,
                param_types: &[#(#param_types),*],
                return_type: #return_type,
                declares_rmi_error: true,
            }
        }
    });

    quote! {
        #[doc = concat!("Interface descriptor for [`", stringify!(#trait_ident), "`].")]
        #vis static #ident: rmi_core::interface::InterfaceDescriptor =
            rmi_core::interface::InterfaceDescriptor {
                name: #name,
                methods: &[#(#entries),*],
            };
    }
}
