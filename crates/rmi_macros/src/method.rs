//! Parses trait method declarations into the form the derivations share.

use quote::ToTokens;
use syn::{FnArg, GenericArgument, ItemTrait, Pat, PathArguments, ReturnType, TraitItem, TraitItemFn, Type};

/// One remote method as declared in the annotated trait.
pub(crate) struct RemoteMethod {
    pub ident: syn::Ident,
    /// Ordered (name, type) parameter pairs.
    pub params: Vec<(syn::Ident, Type)>,
    /// The declared return type, reused verbatim in generated impls.
    pub output: ReturnType,
    /// The success type inside `Result<T, RemoteError<E>>`.
    pub ok_type: Type,
}

pub(crate) fn collect(trait_def: &ItemTrait) -> syn::Result<Vec<RemoteMethod>> {
    let mut methods = Vec::new();
    for item in &trait_def.items {
        if let TraitItem::Fn(f) = item {
            methods.push(parse_method(f)?);
        }
    }
    Ok(methods)
}

fn parse_method(f: &TraitItemFn) -> syn::Result<RemoteMethod> {
    if f.sig.asyncness.is_none() {
        return Err(syn::Error::new_spanned(
            &f.sig,
            "remote interface methods must be async",
        ));
    }
    if f.default.is_some() {
        return Err(syn::Error::new_spanned(
            &f.sig,
            "remote interface methods cannot have default bodies",
        ));
    }

    let mut params = Vec::new();
    for input in &f.sig.inputs {
        match input {
            FnArg::Receiver(r) => {
                return Err(syn::Error::new_spanned(
                    r,
                    "declare remote methods without a receiver; `&self` is added during expansion",
                ));
            }
            FnArg::Typed(typed) => {
                let Pat::Ident(pat) = &*typed.pat else {
                    return Err(syn::Error::new_spanned(
                        &typed.pat,
                        "remote method parameters must be plain identifiers",
                    ));
                };
                params.push((pat.ident.clone(), (*typed.ty).clone()));
            }
        }
    }

    let ReturnType::Type(_, return_ty) = &f.sig.output else {
        return Err(result_shape_error(&f.sig.output));
    };
    let ok_type = parse_remote_result(return_ty).ok_or_else(|| result_shape_error(&**return_ty))?;

    Ok(RemoteMethod {
        ident: f.sig.ident.clone(),
        params,
        output: f.sig.output.clone(),
        ok_type,
    })
}

fn result_shape_error(tokens: &dyn ToTokens) -> syn::Error {
    syn::Error::new_spanned(
        tokens,
        "remote interface methods must return `Result<T, RemoteError<E>>` \
         so that every method declares the RMI error kind",
    )
}

/// Accepts `Result<T, RemoteError<E>>` (and `RemoteError` with its default
/// user type), returning the success type.
fn parse_remote_result(ty: &Type) -> Option<Type> {
    let Type::Path(path) = ty else {
        return None;
    };
    let segment = path.path.segments.last()?;
    if segment.ident != "Result" {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    if args.args.len() != 2 {
        return None;
    }
    let GenericArgument::Type(ok_ty) = &args.args[0] else {
        return None;
    };
    let GenericArgument::Type(Type::Path(err_path)) = &args.args[1] else {
        return None;
    };

    let err_segment = err_path.path.segments.last()?;
    if err_segment.ident != "RemoteError" {
        return None;
    }
    match &err_segment.arguments {
        PathArguments::None => {}
        PathArguments::AngleBracketed(a) if a.args.len() == 1 => {}
        _ => return None,
    }

    Some(ok_ty.clone())
}

/// Normalized token rendering of a type, shared by stub and dispatch sides.
pub(crate) fn type_string(ty: &Type) -> String {
    ty.to_token_stream().to_string().replace(' ', "")
}
