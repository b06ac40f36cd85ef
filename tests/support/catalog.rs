//! Shared product-catalog fixtures for the integration tests.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use dispatch_rust::{
    async_trait, CancellationToken, Command, Container, ContainerError, Event, Handle,
    HandleAsync, HandlerError, Query,
};

#[derive(Debug, Clone, PartialEq, Command)]
pub struct RegisterProduct {
    pub id: u32,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Query)]
#[query(result = Option<ProductView>)]
pub struct GetProduct {
    pub id: u32,
}

#[derive(Debug, Clone, PartialEq, Event)]
pub struct ProductRegistered {
    pub id: u32,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProductView {
    pub id: u32,
    pub name: String,
}

/// Records every value a handler sees.
pub struct Recorder<T> {
    calls: Mutex<Vec<T>>,
}

impl<T: Clone> Recorder<T> {
    pub fn new() -> Arc<Self> {
        Arc::new(Recorder {
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn record(&self, value: T) {
        self.calls.lock().unwrap().push(value);
    }

    pub fn calls(&self) -> Vec<T> {
        self.calls.lock().unwrap().clone()
    }
}

/// In-memory product store shared between command and query handlers.
#[derive(Default)]
pub struct CatalogStore {
    products: Mutex<HashMap<u32, ProductView>>,
}

impl CatalogStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn insert(&self, view: ProductView) {
        self.products.lock().unwrap().insert(view.id, view);
    }

    pub fn get(&self, id: u32) -> Option<ProductView> {
        self.products.lock().unwrap().get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.products.lock().unwrap().len()
    }
}

/// Synchronous command handler that records and stores.
pub struct RegisterProductHandler {
    pub recorder: Arc<Recorder<RegisterProduct>>,
    pub store: Arc<CatalogStore>,
}

impl Handle<RegisterProduct> for RegisterProductHandler {
    fn handle(&self, command: RegisterProduct) -> Result<(), HandlerError> {
        self.recorder.record(command.clone());
        self.store.insert(ProductView {
            id: command.id,
            name: command.name,
        });
        Ok(())
    }
}

/// Asynchronous equivalent of [`RegisterProductHandler`].
pub struct RegisterProductHandlerAsync {
    pub recorder: Arc<Recorder<RegisterProduct>>,
    pub store: Arc<CatalogStore>,
}

#[async_trait]
impl HandleAsync<RegisterProduct> for RegisterProductHandlerAsync {
    async fn handle(
        &self,
        command: RegisterProduct,
        _cancellation: CancellationToken,
    ) -> Result<(), HandlerError> {
        self.recorder.record(command.clone());
        self.store.insert(ProductView {
            id: command.id,
            name: command.name,
        });
        Ok(())
    }
}

/// Query handler reading from the shared store.
pub struct GetProductHandler {
    pub store: Arc<CatalogStore>,
}

impl Handle<GetProduct> for GetProductHandler {
    fn handle(&self, query: GetProduct) -> Result<Option<ProductView>, HandlerError> {
        Ok(self.store.get(query.id))
    }
}

/// Event subscriber that records which subscriber saw the event.
pub struct TaggedSubscriber {
    pub tag: &'static str,
    pub recorder: Arc<Recorder<&'static str>>,
}

impl Handle<ProductRegistered> for TaggedSubscriber {
    fn handle(&self, _event: ProductRegistered) -> Result<(), HandlerError> {
        self.recorder.record(self.tag);
        Ok(())
    }
}

/// Container stub whose lookups always fail, for resolution-failure tests.
pub struct OfflineContainer;

impl Container for OfflineContainer {
    fn resolve(
        &self,
        _contract: TypeId,
    ) -> Result<Option<Arc<dyn Any + Send + Sync>>, ContainerError> {
        Err(ContainerError::Failed("container offline".into()))
    }

    fn resolve_all(
        &self,
        _contract: TypeId,
    ) -> Result<Vec<Arc<dyn Any + Send + Sync>>, ContainerError> {
        Err(ContainerError::Failed("container offline".into()))
    }
}
