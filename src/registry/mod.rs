//! Handler registries - how message types find their handlers.
//!
//! Every registry implements the same [`HandlerResolver`] contract, so the
//! dispatchers do not care where a handler came from:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     HandlerResolver                          │
//! │  resolve_one(token)  → the single command/query delegate     │
//! │  resolve_many(token) → every event delegate + any failures   │
//! └──────────────────────────────────────────────────────────────┘
//!          │                │                 │             │
//!          ▼                ▼                 ▼             ▼
//!  ┌──────────────┐ ┌──────────────┐ ┌─────────────────┐ ┌───────────┐
//!  │FactoryRegistry│ │ ScanRegistry │ │ContainerResolver│ │ Composite │
//!  │ explicit code │ │ #[handlers]  │ │  DI adapter     │ │  chain    │
//!  └──────────────┘ └──────────────┘ └─────────────────┘ └───────────┘
//! ```
//!
//! Registries are built single-threaded during application setup and are
//! read-only afterwards; share them behind an `Arc<dyn HandlerResolver>`.

pub(crate) mod container;
mod composite;
mod factory;
mod scan;

use std::any::TypeId;
use std::collections::HashMap;

use crate::delegate::HandlerDelegate;
use crate::error::{RegistrationError, ResolveError};
use crate::token::MessageToken;

pub use composite::CompositeResolver;
pub use container::{Container, ContainerError, ContainerResolver, InMemoryContainer};
pub use factory::FactoryRegistry;
pub use scan::{HandlerGroup, ScanRegistry};

/// Maps a message type to its handler delegate(s).
pub trait HandlerResolver: Send + Sync {
    /// Resolve the single handler bound to a command or query type.
    fn resolve_one(&self, token: &'static MessageToken) -> Result<HandlerDelegate, ResolveError>;

    /// Resolve every handler bound to an event type.
    ///
    /// Missing handlers are not an error for events; the result may be empty.
    fn resolve_many(&self, token: &'static MessageToken) -> ManyResolution;
}

/// Outcome of resolving an event type: the delegates that resolved, plus any
/// per-source failures. The two travel together so the publisher can route
/// failures without losing the handlers that did resolve.
#[derive(Default)]
pub struct ManyResolution {
    pub delegates: Vec<HandlerDelegate>,
    pub failures: Vec<ResolveError>,
}

impl ManyResolution {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_delegates(delegates: Vec<HandlerDelegate>) -> Self {
        ManyResolution {
            delegates,
            failures: Vec::new(),
        }
    }

    pub fn from_failure(failure: ResolveError) -> Self {
        ManyResolution {
            delegates: Vec::new(),
            failures: vec![failure],
        }
    }

    /// Append another resolution's delegates and failures, preserving order.
    pub fn merge(&mut self, other: ManyResolution) {
        self.delegates.extend(other.delegates);
        self.failures.extend(other.failures);
    }
}

/// Binding storage shared by the in-crate registries. Enforces the arity
/// rule: one delegate per command/query type, any number per event type, in
/// registration order.
#[derive(Default)]
pub(crate) struct BindingTable {
    slots: HashMap<TypeId, Vec<HandlerDelegate>>,
}

impl BindingTable {
    pub(crate) fn insert(&mut self, delegate: HandlerDelegate) -> Result<(), RegistrationError> {
        let token = delegate.message_type();
        let slot = self.slots.entry(token.id()).or_default();
        if token.kind().single_handler() && !slot.is_empty() {
            return Err(RegistrationError::Duplicate {
                message_type: token.name(),
            });
        }
        slot.push(delegate);
        Ok(())
    }

    pub(crate) fn one(&self, token: &'static MessageToken) -> Result<HandlerDelegate, ResolveError> {
        match self.slots.get(&token.id()) {
            // Commands and queries can never hold more than one binding, so
            // the first entry is the only entry.
            Some(slot) if !slot.is_empty() => Ok(slot[0].clone()),
            _ => Err(ResolveError::NoHandler {
                message_type: token.name(),
            }),
        }
    }

    pub(crate) fn many(&self, token: &'static MessageToken) -> Vec<HandlerDelegate> {
        self.slots.get(&token.id()).cloned().unwrap_or_default()
    }
}
