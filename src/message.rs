//! Message classification - commands, queries, and events.
//!
//! A message is a plain Rust value. Its concrete type is its identity: the
//! dispatchers look handlers up by `TypeId`, so no envelope or name string is
//! involved. The `KIND` constant decides how many handlers may bind to the
//! type - exactly one for commands and queries, zero or more for events.
//!
//! ## Example
//!
//! ```ignore
//! use dispatch_rust::{Command, Event, Query};
//!
//! #[derive(Command)]
//! struct RegisterProduct {
//!     id: String,
//!     name: String,
//! }
//!
//! #[derive(Query)]
//! #[query(result = Option<String>)]
//! struct GetProductName {
//!     id: String,
//! }
//!
//! #[derive(Clone, Event)]
//! struct ProductRegistered {
//!     id: String,
//! }
//! ```

/// How many handlers may bind to a message type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// A state-changing request with no result. Exactly one handler.
    Command,
    /// A read request producing a typed result. Exactly one handler.
    Query,
    /// A notification observed by zero or more handlers.
    Event,
}

impl MessageKind {
    /// Whether this kind is limited to a single handler binding per registry.
    pub fn single_handler(self) -> bool {
        !matches!(self, MessageKind::Event)
    }
}

/// A dispatchable message.
///
/// Implemented via `#[derive(Command)]`, `#[derive(Query)]` or
/// `#[derive(Event)]`, or by hand:
///
/// ```ignore
/// struct RegisterProduct { id: String }
///
/// impl Message for RegisterProduct {
///     type Result = ();
///     const KIND: MessageKind = MessageKind::Command;
/// }
/// impl Command for RegisterProduct {}
/// ```
pub trait Message: Send + 'static {
    /// What dispatching this message produces. `()` for commands and events.
    type Result: Send + 'static;

    /// Classification of the message type, fixed at compile time.
    const KIND: MessageKind;
}

/// Marker for messages dispatched to exactly one handler with no result.
pub trait Command: Message<Result = ()> {}

/// Marker for messages dispatched to exactly one handler with a typed result.
pub trait Query: Message {}

/// Marker for messages fanned out to any number of handlers.
///
/// Events are cloned once per resolved handler, so the type must be `Clone`.
pub trait Event: Message<Result = ()> + Clone {}
