//! Error types for registration, resolution, and dispatch.
//!
//! The variants are deliberately distinct stages: registration errors can
//! only happen while a registry is being built, resolution errors happen when
//! a dispatcher looks a handler up, and dispatch errors cover everything that
//! can go wrong while invoking one. Nothing in this crate retries or logs -
//! every failure is surfaced to the immediate caller.

use std::error::Error;
use std::fmt;

use crate::handler::HandlerError;
use crate::message::Message;

/// Error raised while a registry is being populated, before any dispatch.
#[derive(Debug)]
pub enum RegistrationError {
    /// A command or query type already has a handler in this registry.
    Duplicate { message_type: &'static str },
}

impl fmt::Display for RegistrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistrationError::Duplicate { message_type } => {
                write!(f, "a handler is already registered for {}", message_type)
            }
        }
    }
}

impl Error for RegistrationError {}

/// Error raised while looking a handler up for a message type.
#[derive(Debug)]
pub enum ResolveError {
    /// No handler is registered for the message type.
    NoHandler { message_type: &'static str },
    /// The container adapter failed while resolving handlers.
    Container {
        message_type: &'static str,
        source: Box<dyn Error + Send + Sync>,
    },
}

impl ResolveError {
    /// The message type the lookup was for.
    pub fn message_type(&self) -> &'static str {
        match self {
            ResolveError::NoHandler { message_type } => message_type,
            ResolveError::Container { message_type, .. } => message_type,
        }
    }
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveError::NoHandler { message_type } => {
                write!(f, "no handler registered for {}", message_type)
            }
            ResolveError::Container {
                message_type,
                source,
            } => write!(
                f,
                "container failed resolving handlers for {}: {}",
                message_type, source
            ),
        }
    }
}

impl Error for ResolveError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ResolveError::Container { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

/// Error raised while dispatching a single message to a single handler.
#[derive(Debug)]
pub enum DispatchError {
    /// Handler lookup failed.
    Resolve(ResolveError),
    /// A handler factory failed to produce a usable instance.
    Instantiation {
        message_type: &'static str,
        source: Box<dyn Error + Send + Sync>,
    },
    /// The value handed to a delegate was not of the type it was built for.
    /// Detected before any user code runs.
    MessageType {
        expected: &'static str,
        actual: &'static str,
    },
    /// The handler body failed.
    Execution(HandlerError),
    /// The dispatch ended because its cancellation token fired.
    Cancelled,
}

impl DispatchError {
    /// Build an instantiation error for message type `M`.
    pub fn instantiation<M: Message>(source: Box<dyn Error + Send + Sync>) -> Self {
        DispatchError::Instantiation {
            message_type: std::any::type_name::<M>(),
            source,
        }
    }

    /// Whether this failure is a cancellation outcome.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DispatchError::Cancelled)
    }
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::Resolve(e) => write!(f, "{}", e),
            DispatchError::Instantiation {
                message_type,
                source,
            } => write!(
                f,
                "failed to instantiate handler for {}: {}",
                message_type, source
            ),
            DispatchError::MessageType { expected, actual } => {
                write!(f, "delegate expects {} but was given {}", expected, actual)
            }
            DispatchError::Execution(e) => write!(f, "handler failed: {}", e),
            DispatchError::Cancelled => write!(f, "dispatch cancelled"),
        }
    }
}

impl Error for DispatchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            DispatchError::Resolve(e) => Some(e),
            DispatchError::Instantiation { source, .. } => Some(source.as_ref()),
            DispatchError::Execution(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ResolveError> for DispatchError {
    fn from(err: ResolveError) -> Self {
        DispatchError::Resolve(err)
    }
}

/// Error raised by publishing an event.
#[derive(Debug)]
pub enum PublishError {
    /// Resolution failed and the publisher is configured to abort on it.
    Resolution(ResolveError),
    /// One or more handlers failed. Every cause is retained, in binding
    /// order; the remaining handlers still ran to completion.
    Handlers(Vec<DispatchError>),
    /// Every handler failure was a cancellation.
    Cancelled,
}

impl fmt::Display for PublishError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PublishError::Resolution(e) => write!(f, "publish aborted: {}", e),
            PublishError::Handlers(failures) => {
                write!(f, "{} event handler(s) failed", failures.len())
            }
            PublishError::Cancelled => write!(f, "publish cancelled"),
        }
    }
}

impl Error for PublishError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PublishError::Resolution(e) => Some(e),
            PublishError::Handlers(failures) => {
                failures.first().map(|e| e as &(dyn Error + 'static))
            }
            PublishError::Cancelled => None,
        }
    }
}
