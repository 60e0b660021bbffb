//! Trigger generators: stateful sources of "when to fire next".
//!
//! A generator is queried with the current wall-clock time and answers with
//! the next trigger instant in its own forward sequence, or `None` once the
//! sequence is exhausted. Generators are single-use: the cursor only moves
//! forward, and a new configuration means a new generator.

use crate::align::{align_unchecked, alignment_unit};
use crate::error::TickError;
use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;

/// A stateful source of trigger instants.
///
/// Contract: driven with a non-decreasing `now`, the returned instants are
/// non-decreasing across the sequence. `None` ends the sequence for good;
/// implementations are not restartable.
pub trait TriggerGenerator: Send {
    /// Advances the internal cursor and returns the next trigger instant,
    /// or `None` at end of sequence.
    fn next_trigger(&mut self, now: DateTime<Utc>) -> Option<DateTime<Utc>>;
}

impl<G: TriggerGenerator + ?Sized> TriggerGenerator for Box<G> {
    fn next_trigger(&mut self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        (**self).next_trigger(now)
    }
}

/// A type-erased generator, as stored by the [`TimerSet`](crate::engine::TimerSet).
pub type BoxGenerator = Box<dyn TriggerGenerator>;

/// Fires every `interval`, with each trigger snapped to an alignment
/// boundary.
///
/// After a long suspension the generator catches up: it recomputes the next
/// trigger from the current time instead of replaying every missed tick, so
/// at most one trigger is returned per call.
pub struct PeriodicTriggers {
    interval: Duration,
    alignment: Duration,
    timezone: Tz,
    next: Option<DateTime<Utc>>,
}

impl PeriodicTriggers {
    /// Creates a periodic generator aligned to the natural unit of
    /// `interval` (see [`alignment_unit`]). A 15-minute interval fires on
    /// whole minutes, a 2-hour interval on whole hours.
    ///
    /// # Errors
    /// Returns [`TickError::NonPositiveInterval`] if `interval` is zero or
    /// negative.
    pub fn new(interval: Duration) -> Result<Self, TickError> {
        Self::aligned(interval, alignment_unit(interval))
    }

    /// Creates a periodic generator with an explicit alignment. Pass
    /// `Duration::zero()` to disable alignment entirely.
    ///
    /// # Errors
    /// Returns [`TickError::NonPositiveInterval`] for a non-positive
    /// interval and [`TickError::NegativeAlignment`] for a negative
    /// alignment.
    pub fn aligned(interval: Duration, alignment: Duration) -> Result<Self, TickError> {
        if interval <= Duration::zero() {
            return Err(TickError::NonPositiveInterval(interval));
        }
        if alignment < Duration::zero() {
            return Err(TickError::NegativeAlignment(alignment));
        }
        Ok(Self {
            interval,
            alignment,
            timezone: Tz::UTC,
            next: None,
        })
    }

    /// Sets the timezone whose calendar fields alignment snaps against.
    /// Defaults to UTC. Only observable for alignments of an hour or
    /// coarser, where local offsets shift the boundary.
    pub fn with_timezone(mut self, timezone: Tz) -> Self {
        self.timezone = timezone;
        self
    }

    fn snap(&self, at: DateTime<Utc>) -> DateTime<Utc> {
        let local = at.with_timezone(&self.timezone);
        align_unchecked(local, self.alignment, false).with_timezone(&Utc)
    }
}

impl TriggerGenerator for PeriodicTriggers {
    fn next_trigger(&mut self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let base = self.next.unwrap_or(now);
        let mut candidate = self.snap(base + self.interval);
        if candidate <= now {
            // Catch up after suspension: one trigger from now, not a backlog
            // of missed ticks.
            candidate = self.snap(now + self.interval);
        }
        self.next = Some(candidate);
        Some(candidate)
    }
}

/// Visits a fixed, finite set of instants once each, in ascending order.
///
/// The input is copied and sorted eagerly at construction, so it must be a
/// finite, fully materializable collection. The `now` argument passed to
/// [`TriggerGenerator::next_trigger`] is ignored: the cursor advances by one
/// position per call regardless, and past instants are left for the driver
/// to drain.
pub struct ScheduleTriggers {
    remaining: std::vec::IntoIter<DateTime<Utc>>,
}

impl ScheduleTriggers {
    /// Builds a schedule from any finite collection of instants.
    pub fn new(instants: impl IntoIterator<Item = DateTime<Utc>>) -> Self {
        let mut sorted: Vec<_> = instants.into_iter().collect();
        sorted.sort();
        Self {
            remaining: sorted.into_iter(),
        }
    }

    /// Builds a schedule from a collection with absent entries, which are
    /// discarded before sorting.
    pub fn from_options(instants: impl IntoIterator<Item = Option<DateTime<Utc>>>) -> Self {
        Self::new(instants.into_iter().flatten())
    }
}

impl TriggerGenerator for ScheduleTriggers {
    fn next_trigger(&mut self, _now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.remaining.next()
    }
}

/// Adapts an arbitrary lazy sequence of instants, possibly infinite.
///
/// No ordering or non-past validation is performed here; the sequence is
/// expected to be non-decreasing by construction. The stream driver skips
/// past-due values, so a sequence that keeps returning non-advancing past
/// instants will spin the driver without sleeping. That is a contract
/// violation of the supplied iterator, not something this adapter guards
/// against.
pub struct IterTriggers<I> {
    inner: I,
}

impl<I> IterTriggers<I>
where
    I: Iterator<Item = DateTime<Utc>> + Send,
{
    pub fn new(inner: impl IntoIterator<IntoIter = I>) -> Self {
        Self {
            inner: inner.into_iter(),
        }
    }
}

impl<I> TriggerGenerator for IterTriggers<I>
where
    I: Iterator<Item = DateTime<Utc>> + Send,
{
    fn next_trigger(&mut self, _now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.inner.next()
    }
}
