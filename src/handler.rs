//! Handler contracts - the traits user code implements.
//!
//! Two shapes exist: a synchronous handler and an asynchronous handler that
//! receives a cancellation token. Both are normalized into a
//! [`HandlerDelegate`](crate::HandlerDelegate) before anything dispatches
//! through them, so the rest of the crate only ever deals with one calling
//! convention.

use std::error::Error;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::message::Message;

/// A synchronous handler for messages of type `M`.
pub trait Handle<M: Message>: Send + Sync {
    fn handle(&self, message: M) -> Result<M::Result, HandlerError>;
}

/// An asynchronous handler for messages of type `M`.
///
/// The cancellation token is cooperative: a handler that never checks it
/// simply runs to completion. A handler that observes cancellation should
/// return [`HandlerError::Cancelled`] so the dispatcher can distinguish the
/// outcome from an ordinary failure.
#[async_trait]
pub trait HandleAsync<M: Message>: Send + Sync {
    async fn handle(
        &self,
        message: M,
        cancellation: CancellationToken,
    ) -> Result<M::Result, HandlerError>;
}

/// Error type a handler body reports.
#[derive(Debug)]
pub enum HandlerError {
    /// Business logic rejected the message.
    Rejected(String),
    /// The handler observed cancellation and stopped early.
    Cancelled,
    /// Any other failure.
    Other(Box<dyn Error + Send + Sync>),
}

impl HandlerError {
    /// Wrap an arbitrary error.
    pub fn other(err: impl Into<Box<dyn Error + Send + Sync>>) -> Self {
        HandlerError::Other(err.into())
    }
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandlerError::Rejected(msg) => write!(f, "rejected: {}", msg),
            HandlerError::Cancelled => write!(f, "handler cancelled"),
            HandlerError::Other(e) => write!(f, "handler error: {}", e),
        }
    }
}

impl Error for HandlerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            HandlerError::Other(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

impl From<Box<dyn Error + Send + Sync>> for HandlerError {
    fn from(err: Box<dyn Error + Send + Sync>) -> Self {
        HandlerError::Other(err)
    }
}

/// A handler produced by a factory, in either shape.
pub enum HandlerInstance<M: Message> {
    Sync(Arc<dyn Handle<M>>),
    Async(Arc<dyn HandleAsync<M>>),
}

impl<M: Message> HandlerInstance<M> {
    /// Wrap a synchronous handler.
    pub fn from_sync<H: Handle<M> + 'static>(handler: H) -> Self {
        HandlerInstance::Sync(Arc::new(handler))
    }

    /// Wrap an asynchronous handler.
    pub fn from_async<H: HandleAsync<M> + 'static>(handler: H) -> Self {
        HandlerInstance::Async(Arc::new(handler))
    }
}

impl<M: Message> Clone for HandlerInstance<M> {
    fn clone(&self) -> Self {
        match self {
            HandlerInstance::Sync(h) => HandlerInstance::Sync(Arc::clone(h)),
            HandlerInstance::Async(h) => HandlerInstance::Async(Arc::clone(h)),
        }
    }
}

/// A shared factory producing fresh instances of a handler object.
///
/// Used by registries that instantiate per dispatch instead of holding a
/// long-lived instance. A factory failure is reported as an instantiation
/// error, distinct from a failure of the handler body itself.
pub type HandlerFactory<T> =
    Arc<dyn Fn() -> Result<Arc<T>, Box<dyn Error + Send + Sync>> + Send + Sync>;
