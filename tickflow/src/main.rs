use anyhow::Result;
use chrono::{Duration, Utc};
use tickflow::prelude::*;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .init();

    // 2. Create the TimerSet instance.
    let set = TimerSet::new();

    // 3. Spawn a task printing everything the set emits.
    spawn_event_listener(&set);

    // 4. Register a few streams to exercise the engine's core logic.
    register_demo_streams(&set).await?;

    // 5. Run until a shutdown signal arrives (Ctrl+C), then release every
    //    pending wait before exiting.
    info!("{} v{} running. Press Ctrl+C to shut down.", tickflow::ENGINE_NAME, tickflow::VERSION);
    tokio::signal::ctrl_c().await?;
    set.dispose_all().await;
    info!("{} has shut down.", tickflow::ENGINE_NAME);
    Ok(())
}

/// Subscribes to the set's event feed and logs each event.
fn spawn_event_listener(set: &TimerSet) {
    let mut events = set.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                StreamEvent::Trigger { id, at } => info!("[TRIGGER] {:?} fired at {}", id, at),
                other => info!("[LIFECYCLE] => {:?}", other),
            }
        }
    });
}

/// Registers demo streams with the set to demonstrate functionality.
async fn register_demo_streams(set: &TimerSet) -> Result<()> {
    // --- A 2-second heartbeat, snapped to whole seconds ---
    let heartbeat = PeriodicTriggers::new(Duration::seconds(2))?;
    set.start("heartbeat", Box::new(heartbeat)).await;

    // --- A drifting 700ms pulse with alignment disabled ---
    let pulse = PeriodicTriggers::aligned(Duration::milliseconds(700), Duration::zero())?;
    set.start("pulse", Box::new(pulse)).await;

    // --- A finite schedule a few seconds out ---
    let soon = Utc::now();
    let schedule = ScheduleTriggers::new([
        soon + Duration::seconds(3),
        soon + Duration::seconds(5),
        soon + Duration::seconds(7),
    ]);
    set.start("three-shot", Box::new(schedule)).await;

    Ok(())
}
