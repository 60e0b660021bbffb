//! Public event types broadcast by a [`TimerSet`](crate::engine::TimerSet).

use crate::common::StreamId;
use chrono::{DateTime, Utc};

/// Lifecycle and trigger events for the streams owned by a `TimerSet`.
///
/// Consumers should treat a [`Trigger`](StreamEvent::Trigger) as a signal to
/// refresh whatever state they derive from the clock, not as data to cache:
/// the instant carried is the trigger that was waited on, which may already
/// be marginally in the past by the time the event is observed.
#[derive(Debug, Clone)]
pub enum StreamEvent {
    /// A new stream was registered and its driver task spawned.
    StreamAdded { id: StreamId, label: String },
    /// A stream was disposed or replaced; its driver has terminated.
    StreamRemoved { id: StreamId },
    /// A trigger instant came due and was emitted.
    Trigger { id: StreamId, at: DateTime<Utc> },
    /// A finite stream ran its generator to exhaustion.
    StreamCompleted { id: StreamId },
}
