mod delegate;
mod dispatch;
mod error;
mod handler;
mod message;
mod registry;
mod token;

pub use delegate::{BoxedMessage, BoxedResult, HandlerDelegate};
pub use dispatch::{
    Bus, CommandDispatcher, EventPublisher, ExecutionPolicy, QueryDispatcher, ResolutionPolicy,
};
pub use error::{DispatchError, PublishError, RegistrationError, ResolveError};
pub use handler::{Handle, HandleAsync, HandlerError, HandlerFactory, HandlerInstance};
pub use message::{Command, Event, Message, MessageKind, Query};
pub use registry::{
    CompositeResolver, Container, ContainerError, ContainerResolver, FactoryRegistry,
    HandlerGroup, HandlerResolver, InMemoryContainer, ManyResolution, ScanRegistry,
};
pub use token::MessageToken;

// Re-export the attribute handlers are written with and the cancellation
// token type they receive.
pub use async_trait::async_trait;
pub use tokio_util::sync::CancellationToken;

#[cfg(feature = "macros")]
pub use dispatch_rust_macros::{handlers, Command, Event, Query};
