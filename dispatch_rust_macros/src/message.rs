use proc_macro::TokenStream;
use quote::quote;
use syn::{DeriveInput, Type};

pub fn derive_command(input: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(input as DeriveInput);
    let name = &input.ident;

    let expanded = quote! {
        impl dispatch_rust::Message for #name {
            type Result = ();
            const KIND: dispatch_rust::MessageKind = dispatch_rust::MessageKind::Command;
        }

        impl dispatch_rust::Command for #name {}
    };

    TokenStream::from(expanded)
}

pub fn derive_query(input: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(input as DeriveInput);
    let name = &input.ident;

    let result = match extract_result(&input) {
        Ok(ty) => ty,
        Err(err) => return TokenStream::from(err.to_compile_error()),
    };

    let expanded = quote! {
        impl dispatch_rust::Message for #name {
            type Result = #result;
            const KIND: dispatch_rust::MessageKind = dispatch_rust::MessageKind::Query;
        }

        impl dispatch_rust::Query for #name {}
    };

    TokenStream::from(expanded)
}

pub fn derive_event(input: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(input as DeriveInput);
    let name = &input.ident;

    let expanded = quote! {
        impl dispatch_rust::Message for #name {
            type Result = ();
            const KIND: dispatch_rust::MessageKind = dispatch_rust::MessageKind::Event;
        }

        impl dispatch_rust::Event for #name {}
    };

    TokenStream::from(expanded)
}

/// Extract the result type from `#[query(result = ...)]`.
fn extract_result(input: &DeriveInput) -> syn::Result<Type> {
    for attr in &input.attrs {
        if !attr.path().is_ident("query") {
            continue;
        }

        let mut result = None;
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("result") {
                result = Some(meta.value()?.parse::<Type>()?);
                Ok(())
            } else {
                Err(meta.error("unsupported #[query(...)] key; expected `result`"))
            }
        })?;

        if let Some(ty) = result {
            return Ok(ty);
        }
    }

    Err(syn::Error::new_spanned(
        &input.ident,
        "deriving Query requires #[query(result = ...)]",
    ))
}
