//! Event publisher - zero-to-many handlers, concurrent fan-out.
//!
//! Publishing resolves every handler bound to the event's type, starts them
//! all, and waits for all of them - a failing handler never cancels its
//! siblings. The two failure channels are kept apart:
//!
//! - *resolution* failures (a source could not even produce its handlers)
//!   default to being reported through the `on_error` callback while the
//!   publish continues with whatever did resolve;
//! - *execution* failures (a handler ran and failed) default to failing the
//!   publish with every cause, after all handlers finished.
//!
//! Both defaults can be changed per publisher.
//!
//! ## Example
//!
//! ```ignore
//! let publisher = EventPublisher::new(resolver)
//!     .on_error(|_event, err| eprintln!("subscriber lookup failed: {}", err));
//!
//! publisher.publish(ProductRegistered { id }, CancellationToken::new()).await?;
//! ```

use std::any::Any;
use std::sync::Arc;

use futures::future;
use tokio_util::sync::CancellationToken;

use crate::delegate::BoxedMessage;
use crate::error::{DispatchError, PublishError};
use crate::message::Event;
use crate::registry::HandlerResolver;
use crate::token::MessageToken;

/// Callback invoked synchronously from within the publish call for each
/// failure routed to it. It observes; it cannot veto or alter publishing.
pub type ErrorCallback = Box<dyn Fn(&(dyn Any + Send), &DispatchError) + Send + Sync>;

/// What to do when a handler source fails to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionPolicy {
    /// Route the failure to `on_error` and publish to the handlers that did
    /// resolve.
    Report,
    /// Fail the publish immediately.
    Abort,
}

/// What to do when handlers fail while executing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionPolicy {
    /// Fail the publish with every cause once all handlers have finished.
    Aggregate,
    /// Route each failure to `on_error`; the publish itself succeeds.
    Report,
}

/// Publishes events to every registered handler.
pub struct EventPublisher {
    resolver: Arc<dyn HandlerResolver>,
    on_error: Option<ErrorCallback>,
    resolution_policy: ResolutionPolicy,
    execution_policy: ExecutionPolicy,
}

impl EventPublisher {
    pub fn new(resolver: Arc<dyn HandlerResolver>) -> Self {
        EventPublisher {
            resolver,
            on_error: None,
            resolution_policy: ResolutionPolicy::Report,
            execution_policy: ExecutionPolicy::Aggregate,
        }
    }

    /// Install the failure callback.
    pub fn on_error(
        mut self,
        callback: impl Fn(&(dyn Any + Send), &DispatchError) + Send + Sync + 'static,
    ) -> Self {
        self.on_error = Some(Box::new(callback));
        self
    }

    /// Change how resolution failures are treated.
    pub fn resolution_policy(mut self, policy: ResolutionPolicy) -> Self {
        self.resolution_policy = policy;
        self
    }

    /// Change how handler execution failures are treated.
    pub fn execution_policy(mut self, policy: ExecutionPolicy) -> Self {
        self.execution_policy = policy;
        self
    }

    /// Publish an event and wait until every handler has finished.
    ///
    /// No registered handlers is a successful publish. The cancellation
    /// token is handed to every handler; handlers that ignore it run to
    /// completion regardless.
    pub async fn publish<E: Event>(
        &self,
        event: E,
        cancellation: CancellationToken,
    ) -> Result<(), PublishError> {
        let token = MessageToken::of::<E>();
        let resolution = self.resolver.resolve_many(token);

        match self.resolution_policy {
            ResolutionPolicy::Abort => {
                if let Some(failure) = resolution.failures.into_iter().next() {
                    return Err(PublishError::Resolution(failure));
                }
            }
            ResolutionPolicy::Report => {
                for failure in resolution.failures {
                    self.report(&event, &DispatchError::Resolve(failure));
                }
            }
        }

        // Start everything before awaiting anything; join_all keeps the
        // outcomes in binding order even when completion order differs.
        let invocations: Vec<_> = resolution
            .delegates
            .iter()
            .map(|delegate| {
                delegate.invoke(BoxedMessage::new(event.clone()), cancellation.clone())
            })
            .collect();
        let outcomes = future::join_all(invocations).await;

        let failures: Vec<DispatchError> =
            outcomes.into_iter().filter_map(Result::err).collect();
        if failures.is_empty() {
            return Ok(());
        }

        match self.execution_policy {
            ExecutionPolicy::Report => {
                for failure in failures {
                    self.report(&event, &failure);
                }
                Ok(())
            }
            ExecutionPolicy::Aggregate => {
                if failures.iter().all(DispatchError::is_cancelled) {
                    Err(PublishError::Cancelled)
                } else {
                    Err(PublishError::Handlers(failures))
                }
            }
        }
    }

    /// Publish an event, blocking the calling thread until every handler has
    /// finished.
    ///
    /// Avoid calling this from inside an async context; see
    /// [`CommandDispatcher::dispatch_blocking`](crate::CommandDispatcher::dispatch_blocking).
    pub fn publish_blocking<E: Event>(&self, event: E) -> Result<(), PublishError> {
        futures::executor::block_on(self.publish(event, CancellationToken::new()))
    }

    fn report<E: Event>(&self, event: &E, failure: &DispatchError) {
        if let Some(callback) = &self.on_error {
            callback(event, failure);
        }
    }
}
