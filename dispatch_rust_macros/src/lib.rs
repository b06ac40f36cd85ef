mod handlers;
mod message;

use proc_macro::TokenStream;

// ============================================================================
// #[handlers] attribute macro
// ============================================================================

/// Attribute macro that turns an impl block into a handler group.
///
/// Every method marked `#[handle]` becomes one handler binding, keyed by the
/// type of its message parameter. The generated `HandlerGroup` impl is what
/// `ScanRegistry::register` consumes.
///
/// # Usage
///
/// ```ignore
/// #[handlers]
/// impl InventoryProjector {
///     #[handle]
///     fn on_registered(&self, event: ProductRegistered) {
///         // synchronous, no result
///     }
///
///     #[handle]
///     async fn on_archived(&self, event: ProductArchived, cancellation: CancellationToken) {
///         // asynchronous, cooperative cancellation
///     }
///
///     #[handle]
///     fn stock(&self, query: StockLevel) -> u32 {
///         // synchronous query handler, bare result
///         42
///     }
///
///     fn helper(&self) {
///         // unmarked methods are left alone
///     }
/// }
/// ```
///
/// Accepted method shapes:
/// - receiver is `&self`;
/// - exactly one message parameter, taken by value;
/// - an optional trailing `CancellationToken` parameter, only on `async fn`
///   - a synchronous method taking the token is a compile error, since
///   cancellation can only be observed across await points;
/// - return type: nothing, the bare result type, or
///   `Result<_, HandlerError>`.
#[proc_macro_attribute]
pub fn handlers(attr: TokenStream, item: TokenStream) -> TokenStream {
    handlers::expand(attr, item)
}

// ============================================================================
// Message classification derives
// ============================================================================

/// Derive macro marking a type as a command: one handler, no result.
#[proc_macro_derive(Command)]
pub fn derive_command(input: TokenStream) -> TokenStream {
    message::derive_command(input)
}

/// Derive macro marking a type as a query.
///
/// The result type is declared with a helper attribute:
///
/// ```ignore
/// #[derive(Query)]
/// #[query(result = Option<ProductView>)]
/// struct GetProduct { id: String }
/// ```
#[proc_macro_derive(Query, attributes(query))]
pub fn derive_query(input: TokenStream) -> TokenStream {
    message::derive_query(input)
}

/// Derive macro marking a type as an event: zero-to-many handlers.
///
/// The type must also be `Clone`; the publisher clones the value once per
/// resolved handler.
#[proc_macro_derive(Event)]
pub fn derive_event(input: TokenStream) -> TokenStream {
    message::derive_event(input)
}
