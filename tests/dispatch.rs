mod support;

use std::sync::Arc;

use dispatch_rust::{
    Bus, CancellationToken, CompositeResolver, ContainerResolver, DispatchError, FactoryRegistry,
    HandlerDelegate, InMemoryContainer, RegistrationError, ResolveError,
};
use support::catalog::{
    CatalogStore, GetProduct, GetProductHandler, ProductView, Recorder, RegisterProduct,
    RegisterProductHandler, RegisterProductHandlerAsync,
};

fn widget() -> RegisterProduct {
    RegisterProduct {
        id: 1,
        name: "Widget".to_string(),
    }
}

#[tokio::test]
async fn command_reaches_its_handler_exactly_once_with_the_exact_value() {
    let recorder = Recorder::new();
    let store = CatalogStore::new();

    let mut registry = FactoryRegistry::new();
    registry
        .register_sync(RegisterProductHandler {
            recorder: Arc::clone(&recorder),
            store: Arc::clone(&store),
        })
        .unwrap();

    let bus = Bus::from_resolver(Arc::new(registry));
    bus.dispatch(widget(), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(recorder.calls(), vec![widget()]);
}

#[tokio::test]
async fn query_returns_what_the_command_stored() {
    let recorder = Recorder::new();
    let store = CatalogStore::new();

    let mut registry = FactoryRegistry::new();
    registry
        .register_async(RegisterProductHandlerAsync {
            recorder,
            store: Arc::clone(&store),
        })
        .unwrap();
    registry
        .register_sync(GetProductHandler {
            store: Arc::clone(&store),
        })
        .unwrap();

    let bus = Bus::from_resolver(Arc::new(registry));
    bus.dispatch(widget(), CancellationToken::new())
        .await
        .unwrap();

    let found = bus
        .query(GetProduct { id: 1 }, CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(
        found,
        Some(ProductView {
            id: 1,
            name: "Widget".to_string()
        })
    );

    let missing = bus
        .query(GetProduct { id: 99 }, CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(missing, None);
}

#[test]
fn second_command_handler_for_the_same_type_fails_registration() {
    let recorder = Recorder::new();
    let store = CatalogStore::new();

    let mut registry = FactoryRegistry::new();
    registry
        .register_sync(RegisterProductHandler {
            recorder: Recorder::new(),
            store: CatalogStore::new(),
        })
        .unwrap();

    let result = registry.register_sync(RegisterProductHandler { recorder, store });
    assert!(matches!(
        result,
        Err(RegistrationError::Duplicate { message_type }) if message_type.contains("RegisterProduct")
    ));
}

#[tokio::test]
async fn unregistered_command_is_a_typed_no_handler_error() {
    let bus = Bus::from_resolver(Arc::new(FactoryRegistry::new()));
    let result = bus.dispatch(widget(), CancellationToken::new()).await;

    match result {
        Err(DispatchError::Resolve(ResolveError::NoHandler { message_type })) => {
            assert!(message_type.contains("RegisterProduct"))
        }
        other => panic!("expected NoHandler, got {:?}", other.err()),
    }
}

#[test]
fn blocking_dispatch_works_outside_a_runtime() {
    let recorder = Recorder::new();
    let store = CatalogStore::new();

    let mut registry = FactoryRegistry::new();
    registry
        .register_sync(RegisterProductHandler {
            recorder: Arc::clone(&recorder),
            store,
        })
        .unwrap();

    let bus = Bus::from_resolver(Arc::new(registry));
    bus.commands().dispatch_blocking(widget()).unwrap();

    assert_eq!(recorder.calls().len(), 1);
}

#[tokio::test]
async fn container_backed_dispatch_behaves_like_registry_backed() {
    let recorder = Recorder::new();
    let store = CatalogStore::new();

    let mut container = InMemoryContainer::new();
    container.bind_async_handler(RegisterProductHandlerAsync {
        recorder: Arc::clone(&recorder),
        store,
    });

    let bus = Bus::from_resolver(Arc::new(ContainerResolver::new(Arc::new(container))));
    bus.dispatch(widget(), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(recorder.calls(), vec![widget()]);
}

#[tokio::test]
async fn composite_falls_back_in_chain_order() {
    let first = Recorder::<RegisterProduct>::new();
    let second = Recorder::new();

    // The command handler lives in the second resolver; the query handler in
    // the first. Both dispatch kinds must find their way.
    let store = CatalogStore::new();
    store.insert(ProductView {
        id: 4,
        name: "Bolt".to_string(),
    });

    let mut front = FactoryRegistry::new();
    front
        .register_sync(GetProductHandler {
            store: Arc::clone(&store),
        })
        .unwrap();

    let mut back = FactoryRegistry::new();
    back.register_sync(RegisterProductHandler {
        recorder: Arc::clone(&second),
        store: CatalogStore::new(),
    })
    .unwrap();

    let resolver = CompositeResolver::new()
        .push(Arc::new(front))
        .push(Arc::new(back));
    let bus = Bus::from_resolver(Arc::new(resolver));

    bus.dispatch(widget(), CancellationToken::new())
        .await
        .unwrap();
    let found = bus
        .query(GetProduct { id: 4 }, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(first.calls().len(), 0);
    assert_eq!(second.calls().len(), 1);
    assert_eq!(found.unwrap().name, "Bolt");
}

#[tokio::test]
async fn composite_prefers_the_first_binding_when_both_sides_have_one() {
    let front_calls = Recorder::new();
    let back_calls = Recorder::new();

    let mut front = FactoryRegistry::new();
    let front_recorder = Arc::clone(&front_calls);
    front
        .register_delegate(HandlerDelegate::from_sync_fn(move |c: RegisterProduct| {
            front_recorder.record(c);
            Ok(())
        }))
        .unwrap();

    let mut back = FactoryRegistry::new();
    let back_recorder = Arc::clone(&back_calls);
    back.register_delegate(HandlerDelegate::from_sync_fn(move |c: RegisterProduct| {
        back_recorder.record(c);
        Ok(())
    }))
    .unwrap();

    let resolver = CompositeResolver::new()
        .push(Arc::new(front))
        .push(Arc::new(back));
    let bus = Bus::from_resolver(Arc::new(resolver));
    bus.dispatch(widget(), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(front_calls.calls().len(), 1);
    assert_eq!(back_calls.calls().len(), 0);
}
