//! Composite resolver - an ordered fallback chain of resolvers.
//!
//! ## Example
//!
//! ```ignore
//! let resolver = CompositeResolver::new()
//!     .push(Arc::new(factory_registry))
//!     .push(Arc::new(scan_registry))
//!     .push(Arc::new(ContainerResolver::new(container)))
//!     // keep falling through when the container is mid-reload
//!     .continue_if(|err| matches!(err, ResolveError::Container { .. }));
//! ```

use std::sync::Arc;

use super::{HandlerResolver, ManyResolution};
use crate::delegate::HandlerDelegate;
use crate::error::ResolveError;
use crate::token::MessageToken;

type ErrorPredicate = Box<dyn Fn(&ResolveError) -> bool + Send + Sync>;

/// Chains resolvers in a fixed order.
///
/// For commands and queries the first resolver that yields a delegate wins;
/// a `NoHandler` miss falls through to the next. Any other failure aborts the
/// chain unless the configured `continue_if` predicate says to keep going.
/// For events, every resolver contributes: delegates and failures are
/// concatenated in chain order.
#[derive(Default)]
pub struct CompositeResolver {
    resolvers: Vec<Arc<dyn HandlerResolver>>,
    continue_if: Option<ErrorPredicate>,
}

impl CompositeResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a resolver to the end of the chain.
    pub fn push(mut self, resolver: Arc<dyn HandlerResolver>) -> Self {
        self.resolvers.push(resolver);
        self
    }

    /// Treat failures matching `predicate` as misses instead of aborting.
    pub fn continue_if(
        mut self,
        predicate: impl Fn(&ResolveError) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.continue_if = Some(Box::new(predicate));
        self
    }
}

impl HandlerResolver for CompositeResolver {
    fn resolve_one(&self, token: &'static MessageToken) -> Result<HandlerDelegate, ResolveError> {
        for resolver in &self.resolvers {
            match resolver.resolve_one(token) {
                Ok(delegate) => return Ok(delegate),
                Err(ResolveError::NoHandler { .. }) => continue,
                Err(failure) => match &self.continue_if {
                    Some(predicate) if predicate(&failure) => continue,
                    _ => return Err(failure),
                },
            }
        }
        Err(ResolveError::NoHandler {
            message_type: token.name(),
        })
    }

    fn resolve_many(&self, token: &'static MessageToken) -> ManyResolution {
        let mut combined = ManyResolution::empty();
        for resolver in &self.resolvers {
            combined.merge(resolver.resolve_many(token));
        }
        combined
    }
}
