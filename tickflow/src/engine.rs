//! The engine that owns running timer streams and fans their emissions out
//! to subscribers.

use crate::common::StreamId;
use crate::events::StreamEvent;
use crate::generator::BoxGenerator;
use crate::stream::{StopSignal, TimerStream};
use slotmap::SlotMap;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace};

const CHANNEL_CAPACITY: usize = 256;

struct StreamEntry {
    label: String,
    stop: StopSignal,
    task: JoinHandle<()>,
}

/// A set of independently running generator/driver pairs.
///
/// Each stream gets its own driver task and its own [`StopSignal`]; streams
/// share no timing state and cannot interfere with one another. All
/// emissions are multiplexed onto a single broadcast channel obtained via
/// [`subscribe`](TimerSet::subscribe). The set is designed to be cloned and
/// shared across tasks as a handle to the running instance.
#[derive(Clone)]
pub struct TimerSet {
    event_sender: broadcast::Sender<StreamEvent>,
    streams: Arc<RwLock<SlotMap<StreamId, StreamEntry>>>,
}

impl Default for TimerSet {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerSet {
    pub fn new() -> Self {
        let (event_sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            event_sender,
            streams: Arc::new(RwLock::new(SlotMap::with_key())),
        }
    }

    /// Starts driving `generator` on a fresh stream and returns its id.
    ///
    /// The driver task emits a [`StreamEvent::Trigger`] per due instant and
    /// a [`StreamEvent::StreamCompleted`] if the generator runs out. The
    /// `label` is free-form and only used for listing and logging.
    pub async fn start(&self, label: impl Into<String>, generator: BoxGenerator) -> StreamId {
        let label = label.into();
        let stop = StopSignal::new();
        let sender = self.event_sender.clone();

        let mut streams = self.streams.write().await;
        let id = streams.insert_with_key(|key| {
            let mut stream = TimerStream::new(generator, stop.clone());
            let task = tokio::spawn(async move {
                while let Some(at) = stream.next().await {
                    trace!(stream = ?key, %at, "trigger fired");
                    sender.send(StreamEvent::Trigger { id: key, at }).ok();
                }
                if !stream.stop_signal().is_fired() {
                    sender.send(StreamEvent::StreamCompleted { id: key }).ok();
                }
            });
            StreamEntry {
                label: label.clone(),
                stop,
                task,
            }
        });
        drop(streams);

        info!(stream = ?id, %label, "stream started");
        self.event_sender
            .send(StreamEvent::StreamAdded { id, label })
            .ok();
        id
    }

    /// Replaces the generator behind `id` with a new one.
    ///
    /// The old stream's stop signal is fired and its driver task awaited
    /// before the replacement is spawned, so at no point do two drivers race
    /// on overlapping timers. Returns the replacement's id, or `None` if
    /// `id` was not a live stream.
    pub async fn reconfigure(&self, id: StreamId, generator: BoxGenerator) -> Option<StreamId> {
        let entry = self.streams.write().await.remove(id)?;
        let label = entry.label.clone();
        shut_down(entry).await;
        self.event_sender
            .send(StreamEvent::StreamRemoved { id })
            .ok();
        debug!(stream = ?id, %label, "stream reconfigured");
        Some(self.start(label, generator).await)
    }

    /// Stops the stream behind `id` and releases its pending wait.
    ///
    /// Returns `true` if the stream was found and removed. Disposal is
    /// idempotent per id: a second call for the same id returns `false`.
    pub async fn dispose(&self, id: StreamId) -> bool {
        let Some(entry) = self.streams.write().await.remove(id) else {
            return false;
        };
        shut_down(entry).await;
        self.event_sender
            .send(StreamEvent::StreamRemoved { id })
            .ok();
        info!(stream = ?id, "stream disposed");
        true
    }

    /// Stops every stream in the set.
    pub async fn dispose_all(&self) {
        let entries: Vec<(StreamId, StreamEntry)> =
            self.streams.write().await.drain().collect();
        for (id, entry) in entries {
            shut_down(entry).await;
            self.event_sender
                .send(StreamEvent::StreamRemoved { id })
                .ok();
        }
        info!("all streams disposed");
    }

    /// Lists the ids and labels of the streams currently registered.
    pub async fn streams(&self) -> Vec<(StreamId, String)> {
        self.streams
            .read()
            .await
            .iter()
            .map(|(id, entry)| (id, entry.label.clone()))
            .collect()
    }

    /// Subscribes to the [`StreamEvent`] feed for every stream in the set.
    pub fn subscribe(&self) -> broadcast::Receiver<StreamEvent> {
        self.event_sender.subscribe()
    }
}

/// Fires the stop signal and lets the driver loop observe termination.
async fn shut_down(entry: StreamEntry) {
    entry.stop.fire();
    entry.task.await.ok();
}
