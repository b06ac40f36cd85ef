mod support;

use std::sync::Arc;
use std::time::Duration;

use dispatch_rust::{
    async_trait, Bus, CancellationToken, DispatchError, EventPublisher, FactoryRegistry,
    HandleAsync, HandlerDelegate, HandlerError, PublishError,
};
use support::catalog::{ProductRegistered, Recorder, RegisterProduct};
use tokio::time::sleep;

/// Cooperative handler: finishes after a long sleep unless cancelled first.
struct SlowRegistration;

#[async_trait]
impl HandleAsync<RegisterProduct> for SlowRegistration {
    async fn handle(
        &self,
        _command: RegisterProduct,
        cancellation: CancellationToken,
    ) -> Result<(), HandlerError> {
        tokio::select! {
            _ = cancellation.cancelled() => Err(HandlerError::Cancelled),
            _ = sleep(Duration::from_secs(5)) => Ok(()),
        }
    }
}

fn widget() -> RegisterProduct {
    RegisterProduct {
        id: 1,
        name: "Widget".to_string(),
    }
}

#[tokio::test]
async fn cancelling_a_dispatch_surfaces_the_cancelled_outcome() {
    let mut registry = FactoryRegistry::new();
    registry.register_async(SlowRegistration).unwrap();
    let bus = Bus::from_resolver(Arc::new(registry));

    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        sleep(Duration::from_millis(20)).await;
        trigger.cancel();
    });

    let result = bus.dispatch(widget(), token).await;
    assert!(matches!(result, Err(DispatchError::Cancelled)));
}

#[tokio::test]
async fn handlers_that_ignore_the_token_run_to_completion() {
    let recorder = Recorder::new();
    let seen = Arc::clone(&recorder);
    let mut registry = FactoryRegistry::new();
    registry
        .register_delegate(HandlerDelegate::from_fn(move |command: RegisterProduct| {
            let seen = Arc::clone(&seen);
            async move {
                sleep(Duration::from_millis(30)).await;
                seen.record(command);
                Ok(())
            }
        }))
        .unwrap();
    let bus = Bus::from_resolver(Arc::new(registry));

    let token = CancellationToken::new();
    token.cancel();

    // Cancellation is cooperative; a handler that never looks at the token
    // is not interrupted.
    bus.dispatch(widget(), token).await.unwrap();
    assert_eq!(recorder.calls().len(), 1);
}

#[tokio::test]
async fn publish_where_every_failure_is_cancellation_reports_cancelled() {
    let mut registry = FactoryRegistry::new();
    for _ in 0..2 {
        registry
            .register_delegate(HandlerDelegate::from_cancellable_fn(
                |_: ProductRegistered, cancellation: CancellationToken| async move {
                    tokio::select! {
                        _ = cancellation.cancelled() => Err(HandlerError::Cancelled),
                        _ = sleep(Duration::from_secs(5)) => Ok(()),
                    }
                },
            ))
            .unwrap();
    }

    let publisher = EventPublisher::new(Arc::new(registry));
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        sleep(Duration::from_millis(20)).await;
        trigger.cancel();
    });

    let result = publisher
        .publish(
            ProductRegistered {
                id: 2,
                name: "Widget".to_string(),
            },
            token,
        )
        .await;
    assert!(matches!(result, Err(PublishError::Cancelled)));
}

#[tokio::test]
async fn mixed_cancellation_and_failure_keeps_both_causes() {
    let mut registry = FactoryRegistry::new();
    registry
        .register_delegate(HandlerDelegate::from_cancellable_fn(
            |_: ProductRegistered, cancellation: CancellationToken| async move {
                cancellation.cancelled().await;
                Err(HandlerError::Cancelled)
            },
        ))
        .unwrap();
    registry
        .register_delegate(HandlerDelegate::from_sync_fn(|_: ProductRegistered| {
            Err(HandlerError::Rejected("projector offline".into()))
        }))
        .unwrap();

    let publisher = EventPublisher::new(Arc::new(registry));
    let token = CancellationToken::new();
    token.cancel();

    let result = publisher
        .publish(
            ProductRegistered {
                id: 3,
                name: "Widget".to_string(),
            },
            token,
        )
        .await;

    match result {
        Err(PublishError::Handlers(failures)) => {
            assert_eq!(failures.len(), 2);
            assert!(failures[0].is_cancelled());
            assert!(!failures[1].is_cancelled());
        }
        other => panic!("expected mixed failures, got {:?}", other.err()),
    }
}
