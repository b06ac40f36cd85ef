mod support;

use std::sync::Arc;

use dispatch_rust::{
    handlers, Bus, CancellationToken, HandlerError, Query, RegistrationError, ScanRegistry,
};
use support::catalog::{
    CatalogStore, ProductRegistered, ProductView, Recorder, RegisterProduct,
};

#[derive(Debug, Clone, Query)]
#[query(result = usize)]
struct CountProducts;

struct CatalogProjector {
    recorder: Arc<Recorder<String>>,
    store: Arc<CatalogStore>,
}

#[handlers]
impl CatalogProjector {
    #[handle]
    fn register(&self, command: RegisterProduct) {
        self.store.insert(ProductView {
            id: command.id,
            name: command.name.clone(),
        });
        self.recorder.record(format!("register:{}", command.id));
    }

    #[handle]
    fn product_count(&self, _query: CountProducts) -> usize {
        self.store.len()
    }

    #[handle]
    async fn on_registered(
        &self,
        event: ProductRegistered,
        cancellation: CancellationToken,
    ) -> Result<(), HandlerError> {
        if cancellation.is_cancelled() {
            return Err(HandlerError::Cancelled);
        }
        self.recorder.record(format!("event:{}", event.id));
        Ok(())
    }
}

struct AuditLog {
    recorder: Arc<Recorder<String>>,
}

#[handlers]
impl AuditLog {
    #[handle]
    async fn on_registered(&self, event: ProductRegistered) {
        self.recorder.record(format!("audit:{}", event.id));
    }
}

fn projector(recorder: &Arc<Recorder<String>>, store: &Arc<CatalogStore>) -> CatalogProjector {
    CatalogProjector {
        recorder: Arc::clone(recorder),
        store: Arc::clone(store),
    }
}

#[tokio::test]
async fn discovered_methods_cover_commands_queries_and_events() {
    let recorder = Recorder::new();
    let store = CatalogStore::new();

    let mut registry = ScanRegistry::new();
    registry
        .register(Arc::new(projector(&recorder, &store)))
        .unwrap();
    registry
        .register(Arc::new(AuditLog {
            recorder: Arc::clone(&recorder),
        }))
        .unwrap();

    let bus = Bus::from_resolver(Arc::new(registry));

    bus.dispatch(
        RegisterProduct {
            id: 8,
            name: "Gear".to_string(),
        },
        CancellationToken::new(),
    )
    .await
    .unwrap();

    let count = bus.query(CountProducts, CancellationToken::new()).await.unwrap();
    assert_eq!(count, 1);

    bus.publish(
        ProductRegistered {
            id: 8,
            name: "Gear".to_string(),
        },
        CancellationToken::new(),
    )
    .await
    .unwrap();

    let calls = recorder.calls();
    assert!(calls.contains(&"register:8".to_string()));
    assert!(calls.contains(&"event:8".to_string()));
    assert!(calls.contains(&"audit:8".to_string()));
}

#[tokio::test]
async fn event_methods_accumulate_across_groups_in_registration_order() {
    let recorder = Recorder::new();
    let store = CatalogStore::new();

    let mut registry = ScanRegistry::new();
    registry
        .register(Arc::new(AuditLog {
            recorder: Arc::clone(&recorder),
        }))
        .unwrap();
    registry
        .register(Arc::new(AuditLog {
            recorder: Arc::clone(&recorder),
        }))
        .unwrap();
    // A third group with command handlers must not disturb the event bucket.
    registry
        .register(Arc::new(projector(&recorder, &store)))
        .unwrap();

    let bus = Bus::from_resolver(Arc::new(registry));
    bus.publish(
        ProductRegistered {
            id: 3,
            name: "Cog".to_string(),
        },
        CancellationToken::new(),
    )
    .await
    .unwrap();

    let audits = recorder
        .calls()
        .into_iter()
        .filter(|c| c.starts_with("audit"))
        .count();
    assert_eq!(audits, 2);
}

#[test]
fn duplicate_command_method_across_registrations_is_rejected() {
    let recorder = Recorder::new();
    let store = CatalogStore::new();

    let mut registry = ScanRegistry::new();
    registry
        .register(Arc::new(projector(&recorder, &store)))
        .unwrap();

    let result = registry.register(Arc::new(projector(&recorder, &store)));
    assert!(matches!(result, Err(RegistrationError::Duplicate { .. })));
}

#[tokio::test]
async fn factory_groups_instantiate_per_dispatch() {
    let recorder = Recorder::new();
    let store = CatalogStore::new();

    let factory_recorder = Arc::clone(&recorder);
    let factory_store = Arc::clone(&store);
    let mut registry = ScanRegistry::new();
    registry
        .register_factory(move || {
            Ok(Arc::new(CatalogProjector {
                recorder: Arc::clone(&factory_recorder),
                store: Arc::clone(&factory_store),
            }))
        })
        .unwrap();

    let bus = Bus::from_resolver(Arc::new(registry));
    for id in [1, 2] {
        bus.dispatch(
            RegisterProduct {
                id,
                name: format!("Part {}", id),
            },
            CancellationToken::new(),
        )
        .await
        .unwrap();
    }

    assert_eq!(store.len(), 2);
    let count = bus.query(CountProducts, CancellationToken::new()).await.unwrap();
    assert_eq!(count, 2);
}
