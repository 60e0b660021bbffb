//! # Tickflow
//!
//! A cancellable, wall-clock-aligned time-event stream engine for Rust.
//!
//! Tickflow turns a description of "when to fire next" into a lazily
//! evaluated, cancellable sequence of trigger instants synchronized to
//! wall-clock time.
//!
//! ## Core Concepts
//!
//! - **TriggerGenerator**: a stateful source queried with the current time
//!   that answers with the next trigger instant, or end-of-sequence. Three
//!   flavors ship with the crate: periodic (fixed interval with calendar
//!   alignment), schedule (a finite, sorted set of instants), and an adapter
//!   for arbitrary lazy sequences.
//! - **TimerStream**: the driver. It queries a generator, sleeps until the
//!   trigger is due or a one-shot `StopSignal` fires, and yields the
//!   instant. Overdue triggers are drained silently instead of emitted.
//! - **TimerSet**: an engine owning many independent generator/driver
//!   pairs, fanning all emissions out on a broadcast channel. Its
//!   `start`/`reconfigure`/`dispose` operations are what a widget- or
//!   view-layer adapter maps its lifecycle onto.
//! - **Alignment**: triggers can snap to calendar boundaries (whole
//!   seconds, minutes, hours, days), optionally in a configured timezone.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use tickflow::prelude::*;
//! use chrono::Duration;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let set = TimerSet::new();
//!
//!     // Subscribe to the event feed before starting any stream.
//!     let mut events = set.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Received: {:?}", event);
//!         }
//!     });
//!
//!     // Fire every 15 minutes, on whole minutes.
//!     let generator = PeriodicTriggers::new(Duration::minutes(15))?;
//!     let id = set.start("quarter-hourly", Box::new(generator)).await;
//!
//!     tokio::signal::ctrl_c().await?;
//!     set.dispose(id).await;
//!     Ok(())
//! }
//! ```

pub const ENGINE_NAME: &str = "Tickflow Engine";
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Declare all the modules in the crate.
pub mod align;
pub mod common;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod generator;
pub mod stream;

/// A prelude module for easy importing of the most common Tickflow types.
pub mod prelude {
    pub use crate::align::{align_datetime, alignment_unit};
    pub use crate::common::StreamId;
    pub use crate::config::{AlignmentSpec, TriggerSpec};
    pub use crate::engine::TimerSet;
    pub use crate::error::TickError;
    pub use crate::events::StreamEvent;
    pub use crate::generator::{
        BoxGenerator, IterTriggers, PeriodicTriggers, ScheduleTriggers, TriggerGenerator,
    };
    pub use crate::stream::{StopSignal, TimerStream};
}
