//! Factory registry - explicit, code-first handler registration.
//!
//! ## Example
//!
//! ```ignore
//! let mut registry = FactoryRegistry::new();
//! registry.register_sync(RegisterProductHandler::new(store.clone()))?;
//! registry.register_async(SendWelcomeMail::new(mailer))?;
//! registry.register_factory(move || Ok(HandlerInstance::from_sync(AuditTrail::open()?)))?;
//!
//! let bus = Bus::from_resolver(Arc::new(registry));
//! ```

use std::error::Error;
use std::sync::Arc;

use super::{BindingTable, HandlerResolver, ManyResolution};
use crate::delegate::HandlerDelegate;
use crate::error::{RegistrationError, ResolveError};
use crate::handler::{Handle, HandleAsync, HandlerInstance};
use crate::message::Message;
use crate::token::MessageToken;

/// Registry populated by explicit registration calls.
///
/// Duplicate command/query registrations fail immediately; event
/// registrations accumulate in call order.
#[derive(Default)]
pub struct FactoryRegistry {
    table: BindingTable,
}

impl FactoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a long-lived synchronous handler.
    pub fn register_sync<M, H>(&mut self, handler: H) -> Result<(), RegistrationError>
    where
        M: Message,
        H: Handle<M> + 'static,
    {
        self.register_delegate(HandlerDelegate::from_sync(Arc::new(handler)))
    }

    /// Register a long-lived asynchronous handler.
    pub fn register_async<M, H>(&mut self, handler: H) -> Result<(), RegistrationError>
    where
        M: Message,
        H: HandleAsync<M> + 'static,
    {
        self.register_delegate(HandlerDelegate::from_async(Arc::new(handler)))
    }

    /// Register a factory evaluated once per dispatch.
    pub fn register_factory<M, F>(&mut self, factory: F) -> Result<(), RegistrationError>
    where
        M: Message,
        F: Fn() -> Result<HandlerInstance<M>, Box<dyn Error + Send + Sync>>
            + Send
            + Sync
            + 'static,
    {
        self.register_delegate(HandlerDelegate::from_factory(factory))
    }

    /// Register an already-normalized delegate.
    pub fn register_delegate(
        &mut self,
        delegate: HandlerDelegate,
    ) -> Result<(), RegistrationError> {
        self.table.insert(delegate)
    }
}

impl HandlerResolver for FactoryRegistry {
    fn resolve_one(&self, token: &'static MessageToken) -> Result<HandlerDelegate, ResolveError> {
        self.table.one(token)
    }

    fn resolve_many(&self, token: &'static MessageToken) -> ManyResolution {
        ManyResolution::from_delegates(self.table.many(token))
    }
}
