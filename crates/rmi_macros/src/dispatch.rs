//! Derives the server-side dispatch table for an annotated trait.

use quote::{format_ident, quote};
use syn::ItemTrait;

use crate::descriptor::descriptor_ident;
use crate::method::RemoteMethod;

pub(crate) fn derive_dispatch(
    trait_def: &ItemTrait,
    methods: &[RemoteMethod],
) -> proc_macro2::TokenStream {
    let trait_ident = &trait_def.ident;
    let vis = &trait_def.vis;
    let dispatch_ident = format_ident!("{}Dispatch", trait_ident);
    let descriptor = descriptor_ident(trait_ident);

    let arms = methods.iter().map(|m| {
        let ident = &m.ident;
        let name = m.ident.to_string();
        let decodes = m.params.iter().enumerate().map(|(j, (param, ty))| {
            quote! {
                let #param: #ty = rmi_core::codec::decode(&__request.args[#j])?;
            }
        });
        let call_idents = m.params.iter().map(|(param, _)| param);
        quote! {
            #name => {
                #(#decodes)*
                rmi_core::skeleton::encode_outcome(self.server.#ident(#(#call_idents),*).await)
            }
        }
    });

    quote! {
        #[doc = concat!("Dispatch table adapting a [`", stringify!(#trait_ident), "`] server object to a skeleton.")]
        #vis struct #dispatch_ident<T> {
            server: T,
        }

        impl<T> #dispatch_ident<T>
        where
            T: #trait_ident + ::core::marker::Send + ::core::marker::Sync + 'static,
        {
            /// Wrap a server object for exclusive use by one skeleton.
            pub fn new(server: T) -> Self {
                Self { server }
            }
        }

        #[rmi_core::async_trait]
        impl<T> rmi_core::skeleton::Dispatch for #dispatch_ident<T>
        where
            T: #trait_ident + ::core::marker::Send + ::core::marker::Sync + 'static,
        {
            fn interface(&self) -> &'static rmi_core::interface::InterfaceDescriptor {
                &#descriptor
            }

            async fn dispatch(
                &self,
                __request: rmi_core::proto::Request,
            ) -> ::core::result::Result<rmi_core::proto::Response, rmi_core::error::RmiError>
            {
                let method = rmi_core::interface::resolve_method(&#descriptor, &__request)?;
                match method.name {
                    #(#arms)*
                    other => ::core::result::Result::Err(rmi_core::error::RmiError::new(
                        ::std::format!("no dispatch entry for {}", other),
                    )),
                }
            }
        }
    }
}
