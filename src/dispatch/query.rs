//! Query dispatcher - exactly one handler, typed result.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::error::DispatchError;
use crate::message::Query;
use crate::registry::HandlerResolver;
use crate::token::MessageToken;

/// Dispatches queries to their single registered handler and returns the
/// handler's typed result.
pub struct QueryDispatcher {
    resolver: Arc<dyn HandlerResolver>,
}

impl QueryDispatcher {
    pub fn new(resolver: Arc<dyn HandlerResolver>) -> Self {
        QueryDispatcher { resolver }
    }

    /// Dispatch a query, waiting for its result.
    pub async fn dispatch<Q: Query>(
        &self,
        query: Q,
        cancellation: CancellationToken,
    ) -> Result<Q::Result, DispatchError> {
        let delegate = self.resolver.resolve_one(MessageToken::of::<Q>())?;
        delegate.invoke_as(query, cancellation).await
    }

    /// Dispatch a query, blocking the calling thread until the result is
    /// available.
    ///
    /// Avoid calling this from inside an async context; see
    /// [`CommandDispatcher::dispatch_blocking`](crate::CommandDispatcher::dispatch_blocking).
    pub fn dispatch_blocking<Q: Query>(&self, query: Q) -> Result<Q::Result, DispatchError> {
        futures::executor::block_on(self.dispatch(query, CancellationToken::new()))
    }
}
