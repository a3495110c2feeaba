use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, ItemTrait};

mod descriptor;
mod dispatch;
mod extend;
mod method;
mod stub;

/// Generates the code that makes a trait remotely invocable.
///
/// From one annotated trait, the macro derives:
///
/// - the trait itself, extended with `&self` receivers and an
///   `async_trait` attribute, to be implemented by the server object;
/// - a static interface descriptor used for validation and request
///   routing;
/// - a `<Trait>Stub` type implementing the trait by forwarding each call
///   over the network, comparable, hashable and serializable by its
///   (interface, address) identity;
/// - a `<Trait>Dispatch<T>` table that adapts any `T` implementing the
///   trait to a skeleton's dynamic dispatch contract.
///
/// Methods are declared async, without a receiver (one is added during
/// expansion), with owned argument and return types, and must return
/// `Result<T, RemoteError<E>>`: the return shape is how every method
/// declares the RMI error kind in its failure set. Implementors attach
/// `#[rmi_core::async_trait]` to their `impl` block.
///
/// ```ignore
/// use rmi_core::error::RemoteError;
/// use rmi_core::remote_interface;
///
/// #[remote_interface]
/// pub trait Counter {
///     /// Add to the running total and return it.
///     async fn add(amount: u64) -> Result<u64, RemoteError>;
/// }
/// ```
#[proc_macro_attribute]
pub fn remote_interface(_attr: TokenStream, item: TokenStream) -> TokenStream {
    let trait_def = parse_macro_input!(item as ItemTrait);
    match expand(trait_def) {
        Ok(tokens) => tokens.into(),
        Err(e) => e.to_compile_error().into(),
    }
}

fn expand(trait_def: ItemTrait) -> syn::Result<proc_macro2::TokenStream> {
    if !trait_def.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &trait_def.generics,
            "remote interfaces cannot be generic",
        ));
    }

    let methods = method::collect(&trait_def)?;
    let descriptor = descriptor::derive(&trait_def, &methods);
    let stub = stub::derive_stub(&trait_def, &methods);
    let dispatch = dispatch::derive_dispatch(&trait_def, &methods);
    let extended = extend::extend_trait(trait_def);

    Ok(quote! {
        #extended
        #descriptor
        #stub
        #dispatch
    })
}

/// Converts `PascalCase` to `SCREAMING_SNAKE_CASE`.
fn pascal_to_screaming_snake(input: &str) -> String {
    let mut out = String::new();
    for (i, c) in input.chars().enumerate() {
        if c.is_ascii_uppercase() && i != 0 {
            out.push('_');
        }
        out.push(c.to_ascii_uppercase());
    }
    out
}
