//! End-to-end walkthrough: a tiny product catalog wired through the bus.
//!
//! Run with `cargo run --example catalog`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use dispatch_rust::{
    handlers, Bus, CancellationToken, Command, CompositeResolver, Event, FactoryRegistry,
    HandlerError, Query, ScanRegistry,
};

#[derive(Debug, Clone, Command)]
struct RegisterProduct {
    id: u32,
    name: String,
}

#[derive(Debug, Clone, Query)]
#[query(result = Option<String>)]
struct ProductName {
    id: u32,
}

#[derive(Debug, Clone, Event)]
struct ProductRegistered {
    id: u32,
    name: String,
}

#[derive(Default)]
struct Catalog {
    products: Mutex<HashMap<u32, String>>,
}

#[handlers]
impl Catalog {
    #[handle]
    fn register(&self, command: RegisterProduct) -> Result<(), HandlerError> {
        let mut products = self.products.lock().unwrap();
        if products.contains_key(&command.id) {
            return Err(HandlerError::Rejected(format!(
                "product {} already exists",
                command.id
            )));
        }
        products.insert(command.id, command.name);
        Ok(())
    }

    #[handle]
    fn name_of(&self, query: ProductName) -> Option<String> {
        self.products.lock().unwrap().get(&query.id).cloned()
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut catalog = ScanRegistry::new();
    catalog.register(Arc::new(Catalog::default()))?;

    // Event subscribers live in their own registry; the composite chains
    // both behind one resolver.
    let mut subscribers = FactoryRegistry::new();
    subscribers.register_delegate(dispatch_rust::HandlerDelegate::from_fn(
        |event: ProductRegistered| async move {
            println!("announce: {} is now available", event.name);
            Ok(())
        },
    ))?;

    let resolver = CompositeResolver::new()
        .push(Arc::new(catalog))
        .push(Arc::new(subscribers));
    let bus = Bus::from_resolver(Arc::new(resolver));

    bus.dispatch(
        RegisterProduct {
            id: 1,
            name: "Widget".to_string(),
        },
        CancellationToken::new(),
    )
    .await?;

    bus.publish(
        ProductRegistered {
            id: 1,
            name: "Widget".to_string(),
        },
        CancellationToken::new(),
    )
    .await?;

    let name = bus
        .query(ProductName { id: 1 }, CancellationToken::new())
        .await?;
    println!("product 1 is {:?}", name);

    Ok(())
}
