//! Common, primitive types used across the tickflow engine.

use slotmap::new_key_type;

new_key_type! {
    /// Uniquely and safely identifies a running timer stream inside a
    /// [`TimerSet`](crate::engine::TimerSet).
    ///
    /// Keys are never reused after removal, so a stale `StreamId` held by a
    /// caller cannot accidentally address a later stream.
    pub struct StreamId;
}
