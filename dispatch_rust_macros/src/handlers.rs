use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, FnArg, Ident, ImplItem, ImplItemFn, ItemImpl, ReturnType, Type};

/// How a handler method reports its result.
enum RetShape {
    /// No return type, or `()`.
    Unit,
    /// A bare result value (synchronous query handlers).
    Bare,
    /// `Result<_, HandlerError>`.
    Result,
}

struct HandlerMethod {
    name: Ident,
    message: Type,
    has_token: bool,
    is_async: bool,
    ret: RetShape,
}

pub fn expand(_attr: TokenStream, item: TokenStream) -> TokenStream {
    let mut block = parse_macro_input!(item as ItemImpl);
    let self_ty = block.self_ty.clone();

    let mut methods = Vec::new();
    let mut errors: Vec<syn::Error> = Vec::new();

    for item in &mut block.items {
        let ImplItem::Fn(method) = item else {
            continue;
        };

        let mut marked = false;
        method.attrs.retain(|attr| {
            if attr.path().is_ident("handle") {
                marked = true;
                false
            } else {
                true
            }
        });
        if !marked {
            continue;
        }

        match analyze(method) {
            Ok(handler) => methods.push(handler),
            Err(err) => errors.push(err),
        }
    }

    if !errors.is_empty() {
        let mut iter = errors.into_iter();
        let mut combined = iter.next().expect("at least one error");
        for err in iter {
            combined.combine(err);
        }
        let compile_errors = combined.to_compile_error();
        return TokenStream::from(quote! {
            #block
            #compile_errors
        });
    }

    let instance_bindings: Vec<TokenStream2> = methods.iter().map(instance_binding).collect();
    let factory_bindings: Vec<TokenStream2> = methods.iter().map(factory_binding).collect();

    TokenStream::from(quote! {
        #block

        impl dispatch_rust::HandlerGroup for #self_ty {
            fn bindings(
                self: ::std::sync::Arc<Self>,
            ) -> ::std::vec::Vec<dispatch_rust::HandlerDelegate> {
                ::std::vec![#(#instance_bindings),*]
            }

            fn factory_bindings(
                factory: dispatch_rust::HandlerFactory<Self>,
            ) -> ::std::vec::Vec<dispatch_rust::HandlerDelegate> {
                ::std::vec![#(#factory_bindings),*]
            }
        }
    })
}

/// Validate a `#[handle]` method signature and extract what generation needs.
fn analyze(method: &ImplItemFn) -> syn::Result<HandlerMethod> {
    let sig = &method.sig;
    let mut inputs = sig.inputs.iter();

    match inputs.next() {
        Some(FnArg::Receiver(receiver))
            if receiver.reference.is_some() && receiver.mutability.is_none() => {}
        _ => {
            return Err(syn::Error::new_spanned(
                &sig.ident,
                "handler methods must take `&self`",
            ))
        }
    }

    let message = match inputs.next() {
        Some(FnArg::Typed(param)) => (*param.ty).clone(),
        _ => {
            return Err(syn::Error::new_spanned(
                &sig.ident,
                "handler methods need a message parameter",
            ))
        }
    };

    let has_token = match inputs.next() {
        None => false,
        Some(FnArg::Typed(param)) if is_cancellation_token(&param.ty) => true,
        Some(param) => {
            return Err(syn::Error::new_spanned(
                param,
                "the second handler parameter must be a CancellationToken",
            ))
        }
    };

    if let Some(extra) = inputs.next() {
        return Err(syn::Error::new_spanned(
            extra,
            "handler methods take a message and an optional CancellationToken, nothing more",
        ));
    }

    let is_async = sig.asyncness.is_some();
    if has_token && !is_async {
        return Err(syn::Error::new_spanned(
            &sig.ident,
            "a synchronous handler cannot take a CancellationToken; make the method `async`",
        ));
    }

    let ret = match &sig.output {
        ReturnType::Default => RetShape::Unit,
        ReturnType::Type(_, ty) => match &**ty {
            Type::Tuple(tuple) if tuple.elems.is_empty() => RetShape::Unit,
            Type::Path(path)
                if path
                    .path
                    .segments
                    .last()
                    .map(|segment| segment.ident == "Result")
                    .unwrap_or(false) =>
            {
                RetShape::Result
            }
            _ => RetShape::Bare,
        },
    };

    Ok(HandlerMethod {
        name: sig.ident.clone(),
        message,
        has_token,
        is_async,
        ret,
    })
}

fn is_cancellation_token(ty: &Type) -> bool {
    match ty {
        Type::Path(path) => path
            .path
            .segments
            .last()
            .map(|segment| segment.ident == "CancellationToken")
            .unwrap_or(false),
        _ => false,
    }
}

/// A delegate invoking the method on a shared, long-lived instance.
fn instance_binding(method: &HandlerMethod) -> TokenStream2 {
    let name = &method.name;
    let message = &method.message;

    if !method.is_async {
        let body = match method.ret {
            RetShape::Unit => quote! {
                this.#name(message);
                ::std::result::Result::Ok(())
            },
            RetShape::Bare => quote! { ::std::result::Result::Ok(this.#name(message)) },
            RetShape::Result => quote! { this.#name(message) },
        };
        return quote! {{
            let this = ::std::sync::Arc::clone(&self);
            dispatch_rust::HandlerDelegate::from_sync_fn(move |message: #message| {
                #body
            })
        }};
    }

    if method.has_token {
        let body = match method.ret {
            RetShape::Unit => quote! {
                this.#name(message, cancellation).await;
                ::std::result::Result::Ok(())
            },
            RetShape::Bare => quote! {
                ::std::result::Result::Ok(this.#name(message, cancellation).await)
            },
            RetShape::Result => quote! { this.#name(message, cancellation).await },
        };
        quote! {{
            let this = ::std::sync::Arc::clone(&self);
            dispatch_rust::HandlerDelegate::from_cancellable_fn(
                move |message: #message, cancellation: dispatch_rust::CancellationToken| {
                    let this = ::std::sync::Arc::clone(&this);
                    async move { #body }
                },
            )
        }}
    } else {
        let body = match method.ret {
            RetShape::Unit => quote! {
                this.#name(message).await;
                ::std::result::Result::Ok(())
            },
            RetShape::Bare => quote! { ::std::result::Result::Ok(this.#name(message).await) },
            RetShape::Result => quote! { this.#name(message).await },
        };
        quote! {{
            let this = ::std::sync::Arc::clone(&self);
            dispatch_rust::HandlerDelegate::from_fn(move |message: #message| {
                let this = ::std::sync::Arc::clone(&this);
                async move { #body }
            })
        }}
    }
}

/// A delegate instantiating the group through the factory on every call.
fn factory_binding(method: &HandlerMethod) -> TokenStream2 {
    let name = &method.name;
    let message = &method.message;

    if !method.is_async {
        let body = match method.ret {
            RetShape::Unit => quote! {
                this.#name(message);
                ::std::result::Result::Ok(())
            },
            RetShape::Bare => quote! { ::std::result::Result::Ok(this.#name(message)) },
            RetShape::Result => quote! { this.#name(message) },
        };
        return quote! {
            dispatch_rust::HandlerDelegate::from_sync_factory_fn(
                ::std::sync::Arc::clone(&factory),
                |this: ::std::sync::Arc<Self>, message: #message| { #body },
            )
        };
    }

    let call = if method.has_token {
        quote! { this.#name(message, cancellation) }
    } else {
        quote! { this.#name(message) }
    };
    let body = match method.ret {
        RetShape::Unit => quote! {
            #call.await;
            ::std::result::Result::Ok(())
        },
        RetShape::Bare => quote! { ::std::result::Result::Ok(#call.await) },
        RetShape::Result => quote! { #call.await },
    };
    let cancellation = if method.has_token {
        quote! { cancellation }
    } else {
        quote! { _cancellation }
    };

    quote! {
        dispatch_rust::HandlerDelegate::from_async_factory_fn(
            ::std::sync::Arc::clone(&factory),
            |this: ::std::sync::Arc<Self>,
             message: #message,
             #cancellation: dispatch_rust::CancellationToken| async move { #body },
        )
    }
}
