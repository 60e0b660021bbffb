//! The driving loop that turns a generator into timed, cancellable
//! emissions.

use crate::generator::TriggerGenerator;
use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use tracing::trace;

/// A one-shot cancellation handle for a [`TimerStream`].
///
/// Firing is idempotent and safe even while no wait is pending: the signal
/// is settled eagerly and observed lazily by the stream's next wait. Clones
/// share the same underlying signal.
#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    token: CancellationToken,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Settles the signal. Any in-progress wait is interrupted and the
    /// stream terminates without emitting its pending trigger.
    pub fn fire(&self) {
        self.token.cancel();
    }

    /// Whether the signal has been fired.
    pub fn is_fired(&self) -> bool {
        self.token.is_cancelled()
    }

    pub(crate) async fn fired(&self) {
        self.token.cancelled().await;
    }
}

/// Drives a [`TriggerGenerator`] against wall-clock time.
///
/// Each call to [`next`](TimerStream::next) queries the generator, sleeps
/// until the returned trigger is due, and yields it. The stream ends cleanly
/// when the generator is exhausted or when the [`StopSignal`] fires; once
/// ended it stays ended, and resuming means building a fresh
/// generator/stream pair.
pub struct TimerStream<G> {
    generator: G,
    stop: StopSignal,
    done: bool,
}

impl<G: TriggerGenerator> TimerStream<G> {
    pub fn new(generator: G, stop: StopSignal) -> Self {
        Self {
            generator,
            stop,
            done: false,
        }
    }

    /// Waits for and returns the next trigger instant, or `None` once the
    /// stream has terminated.
    ///
    /// Triggers already in the past when sampled are drained without being
    /// emitted and without sleeping; the generator is simply queried again.
    /// A malformed generator that keeps returning non-advancing past
    /// instants therefore spins this loop tightly. That risk is accepted
    /// here: generators built by this crate always advance.
    ///
    /// The wait races the scheduled sleep against the stop signal. The sleep
    /// completing yields the trigger; the stop signal winning terminates the
    /// stream without yielding the trigger that was being waited on.
    pub async fn next(&mut self) -> Option<DateTime<Utc>> {
        if self.done {
            return None;
        }
        loop {
            if self.stop.is_fired() {
                self.done = true;
                return None;
            }
            let now = Utc::now();
            let Some(trigger) = self.generator.next_trigger(now) else {
                self.done = true;
                return None;
            };
            if trigger <= now {
                trace!(%trigger, %now, "draining past-due trigger");
                continue;
            }
            let wait = (trigger - now).to_std().unwrap_or_default();
            tokio::select! {
                biased;
                _ = self.stop.fired() => {
                    self.done = true;
                    return None;
                }
                _ = tokio::time::sleep(wait) => {
                    return Some(trigger);
                }
            }
        }
    }

    /// The stop handle shared with this stream.
    pub fn stop_signal(&self) -> &StopSignal {
        &self.stop
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::{IterTriggers, PeriodicTriggers, ScheduleTriggers};
    use chrono::Duration;
    use std::time::Duration as StdDuration;

    async fn bounded<G: TriggerGenerator>(
        stream: &mut TimerStream<G>,
    ) -> Option<DateTime<Utc>> {
        tokio::time::timeout(StdDuration::from_secs(2), stream.next())
            .await
            .expect("stream.next() did not settle in time")
    }

    #[tokio::test]
    async fn emits_a_scheduled_trigger_when_its_time_arrives() {
        let at = Utc::now() + Duration::milliseconds(40);
        let mut stream = TimerStream::new(ScheduleTriggers::new([at]), StopSignal::new());
        assert_eq!(bounded(&mut stream).await, Some(at));
        assert!(Utc::now() >= at);
        assert_eq!(bounded(&mut stream).await, None);
    }

    #[tokio::test]
    async fn emits_schedule_entries_in_order() {
        let now = Utc::now();
        let first = now + Duration::milliseconds(30);
        let second = now + Duration::milliseconds(60);
        // Deliberately out of order; the schedule sorts at construction.
        let mut stream =
            TimerStream::new(ScheduleTriggers::new([second, first]), StopSignal::new());
        assert_eq!(bounded(&mut stream).await, Some(first));
        assert_eq!(bounded(&mut stream).await, Some(second));
        assert_eq!(bounded(&mut stream).await, None);
    }

    #[tokio::test]
    async fn stop_before_first_tick_yields_nothing() {
        let generator = PeriodicTriggers::new(Duration::seconds(10)).unwrap();
        let stop = StopSignal::new();
        stop.fire();
        let mut stream = TimerStream::new(generator, stop);
        assert_eq!(bounded(&mut stream).await, None);
    }

    #[tokio::test]
    async fn stop_during_wait_suppresses_the_pending_trigger() {
        let generator = PeriodicTriggers::aligned(Duration::seconds(5), Duration::zero()).unwrap();
        let stop = StopSignal::new();
        let mut stream = TimerStream::new(generator, stop.clone());
        tokio::spawn(async move {
            tokio::time::sleep(StdDuration::from_millis(20)).await;
            stop.fire();
        });
        assert_eq!(bounded(&mut stream).await, None);
        // Terminated streams stay terminated.
        assert_eq!(bounded(&mut stream).await, None);
    }

    #[tokio::test]
    async fn past_due_triggers_are_drained_without_emission() {
        let past = Utc::now() - Duration::hours(1);
        let mut stream = TimerStream::new(ScheduleTriggers::new([past]), StopSignal::new());
        assert_eq!(bounded(&mut stream).await, None);
    }

    #[tokio::test]
    async fn mixed_past_and_future_schedule_only_emits_the_future() {
        let now = Utc::now();
        let past = now - Duration::minutes(5);
        let future = now + Duration::milliseconds(30);
        let mut stream =
            TimerStream::new(ScheduleTriggers::new([past, future]), StopSignal::new());
        assert_eq!(bounded(&mut stream).await, Some(future));
        assert_eq!(bounded(&mut stream).await, None);
    }

    #[tokio::test]
    async fn infinite_iterable_source_keeps_emitting_until_stopped() {
        let start = Utc::now() + Duration::milliseconds(20);
        let ticks =
            std::iter::successors(Some(start), |prev| Some(*prev + Duration::milliseconds(20)));
        let mut stream = TimerStream::new(IterTriggers::new(ticks), StopSignal::new());
        let a = bounded(&mut stream).await.unwrap();
        let b = bounded(&mut stream).await.unwrap();
        assert_eq!(b - a, Duration::milliseconds(20));
        stream.stop_signal().fire();
        assert_eq!(bounded(&mut stream).await, None);
    }
}
