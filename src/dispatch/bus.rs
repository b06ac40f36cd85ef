//! Bus - one facade over the three dispatch engines.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::{CommandDispatcher, EventPublisher, QueryDispatcher};
use crate::error::{DispatchError, PublishError};
use crate::message::{Command, Event, Query};
use crate::registry::HandlerResolver;

/// Bundles a command dispatcher, a query dispatcher and an event publisher.
///
/// An application typically builds one Bus over its composed resolver and
/// passes it around; the engines stay individually accessible for callers
/// that only need one of them.
///
/// ## Example
///
/// ```ignore
/// let bus = Bus::from_resolver(Arc::new(registry));
///
/// bus.dispatch(RegisterProduct { id, name }, CancellationToken::new()).await?;
/// let stock = bus.query(StockLevel { sku }, CancellationToken::new()).await?;
/// bus.publish(ProductRegistered { id }, CancellationToken::new()).await?;
/// ```
pub struct Bus {
    commands: CommandDispatcher,
    queries: QueryDispatcher,
    events: EventPublisher,
}

impl Bus {
    /// Create a bus from individually configured engines.
    pub fn new(
        commands: CommandDispatcher,
        queries: QueryDispatcher,
        events: EventPublisher,
    ) -> Self {
        Bus {
            commands,
            queries,
            events,
        }
    }

    /// Create a bus whose three engines share one resolver, with default
    /// publisher policies.
    pub fn from_resolver(resolver: Arc<dyn HandlerResolver>) -> Self {
        Bus {
            commands: CommandDispatcher::new(Arc::clone(&resolver)),
            queries: QueryDispatcher::new(Arc::clone(&resolver)),
            events: EventPublisher::new(resolver),
        }
    }

    /// Dispatch a command.
    pub async fn dispatch<C: Command>(
        &self,
        command: C,
        cancellation: CancellationToken,
    ) -> Result<(), DispatchError> {
        self.commands.dispatch(command, cancellation).await
    }

    /// Dispatch a query.
    pub async fn query<Q: Query>(
        &self,
        query: Q,
        cancellation: CancellationToken,
    ) -> Result<Q::Result, DispatchError> {
        self.queries.dispatch(query, cancellation).await
    }

    /// Publish an event.
    pub async fn publish<E: Event>(
        &self,
        event: E,
        cancellation: CancellationToken,
    ) -> Result<(), PublishError> {
        self.events.publish(event, cancellation).await
    }

    /// Get a reference to the command dispatcher.
    pub fn commands(&self) -> &CommandDispatcher {
        &self.commands
    }

    /// Get a reference to the query dispatcher.
    pub fn queries(&self) -> &QueryDispatcher {
        &self.queries
    }

    /// Get a reference to the event publisher.
    pub fn events(&self) -> &EventPublisher {
        &self.events
    }
}
