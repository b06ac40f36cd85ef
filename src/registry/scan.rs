//! Scan registry - handlers discovered from annotated methods.
//!
//! The `#[handlers]` attribute macro turns an impl block into a
//! [`HandlerGroup`]: one delegate per `#[handle]` method, keyed by the
//! method's message parameter type. The macro validates method signatures at
//! expansion time, so an invalid handler shape never reaches this registry.
//!
//! ## Example
//!
//! ```ignore
//! struct InventoryProjector {
//!     store: InventoryStore,
//! }
//!
//! #[handlers]
//! impl InventoryProjector {
//!     #[handle]
//!     fn on_registered(&self, event: ProductRegistered) {
//!         self.store.add(&event.id);
//!     }
//!
//!     #[handle]
//!     async fn on_archived(&self, event: ProductArchived, cancellation: CancellationToken) {
//!         self.store.remove(&event.id).await;
//!     }
//! }
//!
//! let mut registry = ScanRegistry::new();
//! registry.register(Arc::new(InventoryProjector::new()))?;
//! ```

use std::error::Error;
use std::sync::Arc;

use super::{BindingTable, HandlerResolver, ManyResolution};
use crate::delegate::HandlerDelegate;
use crate::error::{RegistrationError, ResolveError};
use crate::handler::HandlerFactory;
use crate::token::MessageToken;

/// An object whose handler methods have been enumerated into delegates.
///
/// Implemented by the `#[handlers]` attribute macro; rarely by hand.
pub trait HandlerGroup: Send + Sync + 'static {
    /// One delegate per handler method, bound to this instance.
    fn bindings(self: Arc<Self>) -> Vec<HandlerDelegate>;

    /// One delegate per handler method, instantiating through `factory` on
    /// every dispatch.
    fn factory_bindings(factory: HandlerFactory<Self>) -> Vec<HandlerDelegate>
    where
        Self: Sized;
}

/// Registry populated from [`HandlerGroup`] objects.
///
/// Methods across multiple registered groups accumulate into the same event
/// buckets in registration order; a second command/query binding for the same
/// message type fails the registration.
#[derive(Default)]
pub struct ScanRegistry {
    table: BindingTable,
}

impl ScanRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every handler method of a long-lived instance.
    pub fn register<G: HandlerGroup>(&mut self, instance: Arc<G>) -> Result<(), RegistrationError> {
        for delegate in instance.bindings() {
            self.table.insert(delegate)?;
        }
        Ok(())
    }

    /// Register every handler method of a group instantiated per dispatch.
    pub fn register_factory<G, F>(&mut self, factory: F) -> Result<(), RegistrationError>
    where
        G: HandlerGroup,
        F: Fn() -> Result<Arc<G>, Box<dyn Error + Send + Sync>> + Send + Sync + 'static,
    {
        let factory: HandlerFactory<G> = Arc::new(factory);
        for delegate in G::factory_bindings(factory) {
            self.table.insert(delegate)?;
        }
        Ok(())
    }
}

impl HandlerResolver for ScanRegistry {
    fn resolve_one(&self, token: &'static MessageToken) -> Result<HandlerDelegate, ResolveError> {
        self.table.one(token)
    }

    fn resolve_many(&self, token: &'static MessageToken) -> ManyResolution {
        ManyResolution::from_delegates(self.table.many(token))
    }
}
