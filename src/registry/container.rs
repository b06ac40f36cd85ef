//! Container resolver - handlers owned by an injected DI container.
//!
//! The crate never constructs a container. It only calls through the
//! [`Container`] adapter: resolve one instance of a handler contract, or all
//! of them. Contracts are identified by the `TypeId` of the handler trait
//! object for a message type (`Arc<dyn HandleAsync<M>>` or
//! `Arc<dyn Handle<M>>`), and instances travel as `Arc<dyn Any>`.
//!
//! The per-message-type downcast glue lives on the [`MessageToken`], minted
//! once per type; see the `token` module. [`InMemoryContainer`] is a minimal
//! adapter implementation, enough for tests and small applications.

use std::any::{self, Any, TypeId};
use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use std::sync::Arc;

use super::{HandlerResolver, ManyResolution};
use crate::delegate::HandlerDelegate;
use crate::error::ResolveError;
use crate::handler::{Handle, HandleAsync};
use crate::message::Message;
use crate::token::MessageToken;

/// Adapter over a dependency-injection container.
///
/// `resolve` serves command/query lookups and must yield at most one
/// instance; `resolve_all` serves event fan-out and may yield any number.
pub trait Container: Send + Sync {
    fn resolve(
        &self,
        contract: TypeId,
    ) -> Result<Option<Arc<dyn Any + Send + Sync>>, ContainerError>;

    fn resolve_all(
        &self,
        contract: TypeId,
    ) -> Result<Vec<Arc<dyn Any + Send + Sync>>, ContainerError>;
}

/// Failure reported by a container adapter.
#[derive(Debug)]
pub enum ContainerError {
    /// The underlying container failed.
    Failed(String),
    /// More than one instance is bound where a single one was requested.
    Ambiguous { count: usize },
    /// The adapter returned an instance that is not of the requested
    /// contract type.
    WrongInstance,
}

impl fmt::Display for ContainerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContainerError::Failed(msg) => write!(f, "container failure: {}", msg),
            ContainerError::Ambiguous { count } => {
                write!(f, "{} instances bound for a single-handler contract", count)
            }
            ContainerError::WrongInstance => {
                write!(f, "container returned an instance of the wrong type")
            }
        }
    }
}

impl Error for ContainerError {}

/// Resolver backed by a [`Container`] adapter.
///
/// When both contracts are bound for a command/query type, the asynchronous
/// one wins.
pub struct ContainerResolver {
    container: Arc<dyn Container>,
}

impl ContainerResolver {
    pub fn new(container: Arc<dyn Container>) -> Self {
        ContainerResolver { container }
    }
}

impl HandlerResolver for ContainerResolver {
    fn resolve_one(&self, token: &'static MessageToken) -> Result<HandlerDelegate, ResolveError> {
        match (token.container.one)(self.container.as_ref()) {
            Ok(Some(delegate)) => Ok(delegate),
            Ok(None) => Err(ResolveError::NoHandler {
                message_type: token.name(),
            }),
            Err(failure) => Err(failure),
        }
    }

    fn resolve_many(&self, token: &'static MessageToken) -> ManyResolution {
        match (token.container.all)(self.container.as_ref()) {
            Ok(delegates) => ManyResolution::from_delegates(delegates),
            Err(failure) => ManyResolution::from_failure(failure),
        }
    }
}

/// Per-message-type container glue, stored on the [`MessageToken`].
///
/// The function pointers are monomorphized for one concrete message type, so
/// the erased resolution path can downcast instances without knowing the
/// type itself.
pub(crate) struct ContainerGlue {
    pub(crate) one: fn(&dyn Container) -> Result<Option<HandlerDelegate>, ResolveError>,
    pub(crate) all: fn(&dyn Container) -> Result<Vec<HandlerDelegate>, ResolveError>,
}

pub(crate) fn glue_for<M: Message>() -> ContainerGlue {
    ContainerGlue {
        one: resolve_single::<M>,
        all: resolve_every::<M>,
    }
}

/// Contract key for the asynchronous handler trait of `M`.
fn async_contract<M: Message>() -> TypeId {
    TypeId::of::<Arc<dyn HandleAsync<M>>>()
}

/// Contract key for the synchronous handler trait of `M`.
fn sync_contract<M: Message>() -> TypeId {
    TypeId::of::<Arc<dyn Handle<M>>>()
}

fn resolve_single<M: Message>(
    container: &dyn Container,
) -> Result<Option<HandlerDelegate>, ResolveError> {
    if let Some(instance) = container
        .resolve(async_contract::<M>())
        .map_err(adapter_failure::<M>)?
    {
        let handler: Arc<dyn HandleAsync<M>> = downcast::<M, _>(instance)?;
        return Ok(Some(HandlerDelegate::from_async(handler)));
    }
    if let Some(instance) = container
        .resolve(sync_contract::<M>())
        .map_err(adapter_failure::<M>)?
    {
        let handler: Arc<dyn Handle<M>> = downcast::<M, _>(instance)?;
        return Ok(Some(HandlerDelegate::from_sync(handler)));
    }
    Ok(None)
}

fn resolve_every<M: Message>(
    container: &dyn Container,
) -> Result<Vec<HandlerDelegate>, ResolveError> {
    let mut delegates = Vec::new();
    for instance in container
        .resolve_all(async_contract::<M>())
        .map_err(adapter_failure::<M>)?
    {
        let handler: Arc<dyn HandleAsync<M>> = downcast::<M, _>(instance)?;
        delegates.push(HandlerDelegate::from_async(handler));
    }
    for instance in container
        .resolve_all(sync_contract::<M>())
        .map_err(adapter_failure::<M>)?
    {
        let handler: Arc<dyn Handle<M>> = downcast::<M, _>(instance)?;
        delegates.push(HandlerDelegate::from_sync(handler));
    }
    Ok(delegates)
}

fn adapter_failure<M: Message>(err: ContainerError) -> ResolveError {
    ResolveError::Container {
        message_type: any::type_name::<M>(),
        source: Box::new(err),
    }
}

fn downcast<M: Message, T: Any + Send + Sync + Clone>(
    instance: Arc<dyn Any + Send + Sync>,
) -> Result<T, ResolveError> {
    instance
        .downcast::<T>()
        .map(|arc| (*arc).clone())
        .map_err(|_| adapter_failure::<M>(ContainerError::WrongInstance))
}

/// Minimal in-memory [`Container`].
///
/// ## Example
///
/// ```ignore
/// let mut container = InMemoryContainer::new();
/// container.bind_async_handler(RegisterProductHandler::new(store));
/// container.bind_sync_handler::<ProductRegistered, _>(IndexUpdater::default());
///
/// let resolver = ContainerResolver::new(Arc::new(container));
/// ```
#[derive(Default)]
pub struct InMemoryContainer {
    entries: HashMap<TypeId, Vec<Arc<dyn Any + Send + Sync>>>,
}

impl InMemoryContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a value under its own type as the contract.
    pub fn bind<T: Any + Send + Sync>(&mut self, value: T) {
        self.entries
            .entry(TypeId::of::<T>())
            .or_default()
            .push(Arc::new(value));
    }

    /// Bind a synchronous handler under the sync contract for `M`.
    pub fn bind_sync_handler<M, H>(&mut self, handler: H)
    where
        M: Message,
        H: Handle<M> + 'static,
    {
        self.bind::<Arc<dyn Handle<M>>>(Arc::new(handler));
    }

    /// Bind an asynchronous handler under the async contract for `M`.
    pub fn bind_async_handler<M, H>(&mut self, handler: H)
    where
        M: Message,
        H: HandleAsync<M> + 'static,
    {
        self.bind::<Arc<dyn HandleAsync<M>>>(Arc::new(handler));
    }
}

impl Container for InMemoryContainer {
    fn resolve(
        &self,
        contract: TypeId,
    ) -> Result<Option<Arc<dyn Any + Send + Sync>>, ContainerError> {
        match self.entries.get(&contract) {
            None => Ok(None),
            Some(slot) => match slot.as_slice() {
                [] => Ok(None),
                [single] => Ok(Some(Arc::clone(single))),
                many => Err(ContainerError::Ambiguous { count: many.len() }),
            },
        }
    }

    fn resolve_all(
        &self,
        contract: TypeId,
    ) -> Result<Vec<Arc<dyn Any + Send + Sync>>, ContainerError> {
        Ok(self
            .entries
            .get(&contract)
            .map(|slot| slot.iter().map(Arc::clone).collect())
            .unwrap_or_default())
    }
}
