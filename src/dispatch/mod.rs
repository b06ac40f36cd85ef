//! Dispatch engines - the calling side of the crate.
//!
//! Three engines share one resolver:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       Bus (optional facade)                 │
//! │  dispatch() / query() / publish()                           │
//! └─────────────────────────────────────────────────────────────┘
//!        │                   │                    │
//!        ▼                   ▼                    ▼
//! ┌──────────────┐  ┌────────────────┐  ┌──────────────────────┐
//! │CommandDispat.│  │QueryDispatcher │  │    EventPublisher    │
//! │ exactly one  │  │ exactly one,   │  │ zero-to-many, fan-out│
//! │ handler      │  │ typed result   │  │ wait for all         │
//! └──────────────┘  └────────────────┘  └──────────────────────┘
//! ```
//!
//! Commands and queries abort on any failure. Events fan out: every resolved
//! handler is started, every one is awaited, and failures are reported per
//! the publisher's configured policies.

mod bus;
mod command;
mod publish;
mod query;

pub use bus::Bus;
pub use command::CommandDispatcher;
pub use publish::{EventPublisher, ExecutionPolicy, ResolutionPolicy};
pub use query::QueryDispatcher;
