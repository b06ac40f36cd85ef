//! Command dispatcher - exactly one handler, no result.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::error::DispatchError;
use crate::message::Command;
use crate::registry::HandlerResolver;
use crate::token::MessageToken;

/// Dispatches commands to their single registered handler.
pub struct CommandDispatcher {
    resolver: Arc<dyn HandlerResolver>,
}

impl CommandDispatcher {
    pub fn new(resolver: Arc<dyn HandlerResolver>) -> Self {
        CommandDispatcher { resolver }
    }

    /// Dispatch a command, waiting for its handler to finish.
    pub async fn dispatch<C: Command>(
        &self,
        command: C,
        cancellation: CancellationToken,
    ) -> Result<(), DispatchError> {
        let delegate = self.resolver.resolve_one(MessageToken::of::<C>())?;
        delegate.invoke_as(command, cancellation).await
    }

    /// Dispatch a command, blocking the calling thread until the handler
    /// finishes.
    ///
    /// Avoid calling this from inside an async context: blocking a
    /// cooperative scheduler's thread on one of its own futures can
    /// deadlock. Prefer [`dispatch`](Self::dispatch) there.
    pub fn dispatch_blocking<C: Command>(&self, command: C) -> Result<(), DispatchError> {
        futures::executor::block_on(self.dispatch(command, CancellationToken::new()))
    }
}
