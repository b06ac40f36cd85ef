//! Handler delegate - the one calling convention everything dispatches through.
//!
//! Every handler shape (synchronous, asynchronous, cancellable, produced by a
//! factory) is normalized into a [`HandlerDelegate`]: a callable of the form
//! `(message, cancellation) -> future of result`. The dispatchers and
//! registries only ever see this shape.
//!
//! Two guarantees hold for every delegate:
//!
//! - the boxed message is downcast before any user code runs; a mismatch is a
//!   typed [`DispatchError::MessageType`], never a panic inside a handler;
//! - a synchronous handler body runs inside the returned future, after one
//!   explicit yield, so it cannot fail synchronously out of `invoke` and
//!   cannot run ahead of sibling handlers in an event fan-out.
//!
//! ## Example
//!
//! ```ignore
//! let delegate = HandlerDelegate::from_sync_fn(|cmd: RegisterProduct| {
//!     println!("registering {}", cmd.name);
//!     Ok(())
//! });
//!
//! delegate.invoke_as(RegisterProduct { .. }, CancellationToken::new()).await?;
//! ```

use std::any::{self, Any};
use std::future::Future;
use std::sync::Arc;

use futures::future::{self, BoxFuture, FutureExt};
use tokio::task::yield_now;
use tokio_util::sync::CancellationToken;

use crate::error::DispatchError;
use crate::handler::{Handle, HandleAsync, HandlerError, HandlerFactory, HandlerInstance};
use crate::message::Message;
use crate::token::MessageToken;

/// A message whose concrete type has been erased for dispatch.
///
/// Keeps the type name alongside the boxed value so a failed downcast can
/// name what was actually passed.
pub struct BoxedMessage {
    value: Box<dyn Any + Send>,
    type_name: &'static str,
}

impl BoxedMessage {
    pub fn new<M: Message>(message: M) -> Self {
        BoxedMessage {
            value: Box::new(message),
            type_name: any::type_name::<M>(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    fn downcast<M: Message>(self) -> Result<M, DispatchError> {
        let actual = self.type_name;
        self.value
            .downcast::<M>()
            .map(|boxed| *boxed)
            .map_err(|_| DispatchError::MessageType {
                expected: any::type_name::<M>(),
                actual,
            })
    }
}

/// The type-erased result of a delegate invocation.
pub type BoxedResult = Box<dyn Any + Send>;

type InvokeFn = dyn Fn(BoxedMessage, CancellationToken) -> BoxFuture<'static, Result<BoxedResult, DispatchError>>
    + Send
    + Sync;

/// The normalized callable every handler shape becomes.
///
/// Cheap to clone; the captured handler or factory is shared.
#[derive(Clone)]
pub struct HandlerDelegate {
    message_type: &'static MessageToken,
    invoke: Arc<InvokeFn>,
}

impl HandlerDelegate {
    /// The message type this delegate was built for.
    pub fn message_type(&self) -> &'static MessageToken {
        self.message_type
    }

    /// Invoke with an erased message. The future resolves once the handler
    /// has finished; it never fails synchronously.
    pub fn invoke(
        &self,
        message: BoxedMessage,
        cancellation: CancellationToken,
    ) -> BoxFuture<'static, Result<BoxedResult, DispatchError>> {
        (self.invoke)(message, cancellation)
    }

    /// Invoke with a typed message and get the typed result back.
    pub async fn invoke_as<M: Message>(
        &self,
        message: M,
        cancellation: CancellationToken,
    ) -> Result<M::Result, DispatchError> {
        let result = (self.invoke)(BoxedMessage::new(message), cancellation).await?;
        match result.downcast::<M::Result>() {
            Ok(result) => Ok(*result),
            Err(_) => Err(DispatchError::MessageType {
                expected: any::type_name::<M::Result>(),
                actual: self.message_type.name(),
            }),
        }
    }

    /// Normalize a synchronous handler.
    pub fn from_sync<M, H>(handler: Arc<H>) -> Self
    where
        M: Message,
        H: Handle<M> + ?Sized + 'static,
    {
        Self::build::<M, _, _>(move |message, _cancellation| {
            let handler = Arc::clone(&handler);
            async move {
                yield_now().await;
                finish(handler.handle(message))
            }
        })
    }

    /// Normalize a synchronous closure.
    pub fn from_sync_fn<M, F>(f: F) -> Self
    where
        M: Message,
        F: Fn(M) -> Result<M::Result, HandlerError> + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        Self::build::<M, _, _>(move |message, _cancellation| {
            let f = Arc::clone(&f);
            async move {
                yield_now().await;
                finish(f(message))
            }
        })
    }

    /// Normalize an asynchronous handler.
    pub fn from_async<M, H>(handler: Arc<H>) -> Self
    where
        M: Message,
        H: HandleAsync<M> + ?Sized + 'static,
    {
        Self::build::<M, _, _>(move |message, cancellation| {
            let handler = Arc::clone(&handler);
            async move { finish(handler.handle(message, cancellation).await) }
        })
    }

    /// Normalize an asynchronous closure that does not take a token.
    pub fn from_fn<M, F, Fut>(f: F) -> Self
    where
        M: Message,
        F: Fn(M) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<M::Result, HandlerError>> + Send + 'static,
    {
        Self::build::<M, _, _>(move |message, _cancellation| {
            let fut = f(message);
            async move { finish(fut.await) }
        })
    }

    /// Normalize an asynchronous closure that takes a cancellation token.
    pub fn from_cancellable_fn<M, F, Fut>(f: F) -> Self
    where
        M: Message,
        F: Fn(M, CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<M::Result, HandlerError>> + Send + 'static,
    {
        Self::build::<M, _, _>(move |message, cancellation| {
            let fut = f(message, cancellation);
            async move { finish(fut.await) }
        })
    }

    /// Normalize a factory of handler instances. The factory runs once per
    /// invocation; its failure surfaces as an instantiation error, distinct
    /// from a failure of the handler body.
    pub fn from_factory<M, F>(factory: F) -> Self
    where
        M: Message,
        F: Fn() -> Result<HandlerInstance<M>, Box<dyn std::error::Error + Send + Sync>>
            + Send
            + Sync
            + 'static,
    {
        let factory = Arc::new(factory);
        Self::build::<M, _, _>(move |message, cancellation| {
            let factory = Arc::clone(&factory);
            async move {
                let instance =
                    factory().map_err(|source| DispatchError::instantiation::<M>(source))?;
                match instance {
                    HandlerInstance::Sync(handler) => {
                        yield_now().await;
                        finish(handler.handle(message))
                    }
                    HandlerInstance::Async(handler) => {
                        finish(handler.handle(message, cancellation).await)
                    }
                }
            }
        })
    }

    /// Normalize a synchronous method call on an object produced per
    /// invocation. Used by generated registration code.
    pub fn from_sync_factory_fn<M, G, C>(factory: HandlerFactory<G>, call: C) -> Self
    where
        M: Message,
        G: Send + Sync + 'static,
        C: Fn(Arc<G>, M) -> Result<M::Result, HandlerError> + Send + Sync + 'static,
    {
        let call = Arc::new(call);
        Self::build::<M, _, _>(move |message, _cancellation| {
            let factory = Arc::clone(&factory);
            let call = Arc::clone(&call);
            async move {
                let this = factory().map_err(|source| DispatchError::instantiation::<M>(source))?;
                yield_now().await;
                finish(call(this, message))
            }
        })
    }

    /// Normalize an asynchronous method call on an object produced per
    /// invocation. Used by generated registration code.
    pub fn from_async_factory_fn<M, G, C, Fut>(factory: HandlerFactory<G>, call: C) -> Self
    where
        M: Message,
        G: Send + Sync + 'static,
        C: Fn(Arc<G>, M, CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<M::Result, HandlerError>> + Send + 'static,
    {
        let call = Arc::new(call);
        Self::build::<M, _, _>(move |message, cancellation| {
            let factory = Arc::clone(&factory);
            let call = Arc::clone(&call);
            async move {
                let this = factory().map_err(|source| DispatchError::instantiation::<M>(source))?;
                finish(call(this, message, cancellation).await)
            }
        })
    }

    fn build<M, F, Fut>(f: F) -> Self
    where
        M: Message,
        F: Fn(M, CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<M::Result, DispatchError>> + Send + 'static,
    {
        HandlerDelegate {
            message_type: MessageToken::of::<M>(),
            invoke: Arc::new(move |message: BoxedMessage, cancellation: CancellationToken| {
                match message.downcast::<M>() {
                    Ok(message) => {
                        let fut = f(message, cancellation);
                        async move { fut.await.map(|result| Box::new(result) as BoxedResult) }
                            .boxed()
                    }
                    Err(error) => future::ready(Err(error)).boxed(),
                }
            }),
        }
    }
}

/// Map a handler outcome into a dispatch outcome, keeping cancellation
/// distinguishable from ordinary failure.
fn finish<R>(result: Result<R, HandlerError>) -> Result<R, DispatchError> {
    result.map_err(|err| match err {
        HandlerError::Cancelled => DispatchError::Cancelled,
        other => DispatchError::Execution(other),
    })
}
