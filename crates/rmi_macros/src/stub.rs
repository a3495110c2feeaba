//! Derives the client-side surrogate for an annotated trait.

use quote::{format_ident, quote};
use syn::ItemTrait;

use crate::descriptor::descriptor_ident;
use crate::method::RemoteMethod;

pub(crate) fn derive_stub(trait_def: &ItemTrait, methods: &[RemoteMethod]) -> proc_macro2::TokenStream {
    let trait_ident = &trait_def.ident;
    let vis = &trait_def.vis;
    let stub_ident = format_ident!("{}Stub", trait_ident);
    let descriptor = descriptor_ident(trait_ident);

    let struct_def = quote! {
        #[doc = concat!("Remote surrogate for [`", stringify!(#trait_ident), "`].")]
        #[doc = ""]
        #[doc = "Forwards every method call to the skeleton at its bound address over"]
        #[doc = "one fresh connection. Equality, hashing and rendering use only the"]
        #[doc = "(interface, address) identity and perform no I/O."]
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        #vis struct #stub_ident {
            handle: rmi_core::stub::StubHandle,
        }
    };

    let stub_impl = quote! {
        impl rmi_core::stub::Stub for #stub_ident {
            fn descriptor() -> &'static rmi_core::interface::InterfaceDescriptor {
                &#descriptor
            }

            fn from_handle(handle: rmi_core::stub::StubHandle) -> Self {
                Self { handle }
            }

            fn handle(&self) -> &rmi_core::stub::StubHandle {
                &self.handle
            }
        }

        impl ::core::fmt::Display for #stub_ident {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                ::core::fmt::Display::fmt(&self.handle, f)
            }
        }

        impl rmi_core::serde::Serialize for #stub_ident {
            fn serialize<S>(&self, serializer: S) -> ::core::result::Result<S::Ok, S::Error>
            where
                S: rmi_core::serde::Serializer,
            {
                rmi_core::serde::Serialize::serialize(&self.handle.to_record(), serializer)
            }
        }

        impl<'de> rmi_core::serde::Deserialize<'de> for #stub_ident {
            fn deserialize<D>(deserializer: D) -> ::core::result::Result<Self, D::Error>
            where
                D: rmi_core::serde::Deserializer<'de>,
            {
                let record =
                    <rmi_core::stub::StubRecord as rmi_core::serde::Deserialize>::deserialize(
                        deserializer,
                    )?;
                let handle = rmi_core::stub::StubHandle::from_record(
                    <Self as rmi_core::stub::Stub>::descriptor(),
                    record,
                )
                .map_err(rmi_core::serde::de::Error::custom)?;
                ::core::result::Result::Ok(<Self as rmi_core::stub::Stub>::from_handle(handle))
            }
        }
    };

    let forwarded = methods.iter().enumerate().map(|(index, m)| {
        let ident = &m.ident;
        let output = &m.output;
        let param_idents: Vec<_> = m.params.iter().map(|(ident, _)| ident).collect();
        let param_types: Vec<_> = m.params.iter().map(|(_, ty)| ty).collect();
        quote! {
            async fn #ident(&self, #(#param_idents: #param_types),*) #output {
                let args = ::std::vec![
                    #(
                        rmi_core::codec::encode(&#param_idents)
                            .map_err(rmi_core::error::RemoteError::Rmi)?
                    ),*
                ];
                self.handle
                    .call(
                        &<Self as rmi_core::stub::Stub>::descriptor().methods[#index],
                        args,
                    )
                    .await
            }
        }
    });

    let trait_impl = quote! {
        #[rmi_core::async_trait]
        impl #trait_ident for #stub_ident {
            #(#forwarded)*
        }
    };

    quote! {
        #struct_def
        #stub_impl
        #trait_impl
    }
}
