use anyhow::Result;
use chrono::{Duration, Utc};
use colored::Colorize;
use rustyline::highlight::Highlighter;
use rustyline::Editor;
use rustyline_derive::{Completer, Helper, Hinter, Validator};
use serde::Deserialize;
use std::borrow::Cow;
use std::collections::HashMap;
use std::env;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tickflow::prelude::*;
use tickflow::{ENGINE_NAME, VERSION as LIB_VERSION};
use tracing::info;

const SHELL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// A custom helper struct for rustyline that enables syntax highlighting.
#[derive(Completer, Helper, Hinter, Validator)]
struct CommandHighlighter;

impl Highlighter for CommandHighlighter {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if let Some((command, rest)) = line.split_once(' ') {
            let colored_command = command.yellow().bold();
            let colored_rest = rest.yellow();
            Cow::Owned(format!("{} {}", colored_command, colored_rest))
        } else {
            Cow::Owned(line.yellow().bold().to_string())
        }
    }
    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

/// A named stream definition as loaded from a TOML file.
#[derive(Debug, Clone, Deserialize)]
struct StreamDef {
    label: String,
    #[serde(flatten)]
    spec: TriggerSpec,
}

#[derive(Debug, Clone, Deserialize)]
struct ShellConfig {
    #[serde(default)]
    streams: Vec<StreamDef>,
}

fn print_banner() {
    if env::var("QUIET_MODE").is_ok() {
        return;
    }
    const LOGO_TEXT: &str = include_str!("../logo.log");
    println!("{}", LOGO_TEXT.cyan());

    let version_string = format!(
        "          Shell   v{:<8} Library   v{:<8}",
        SHELL_VERSION, LIB_VERSION
    );

    println!("{}", "-----------------------------------------------------------------------------------------------".dimmed());

    let license_blurb = "
    This software is provided 'as is', without warranty of any kind.
    Distributed under the MIT OR Apache-2.0 license. Use at your own risk.
    ";

    println!("{}", version_string);
    println!("{}", license_blurb.dimmed());

    println!("{}", "-----------------------------------------------------------------------------------------------".dimmed());
}

/// Spawns a task printing the set's event feed, gated by the mute flag.
fn spawn_event_listener(set: &TimerSet, is_muted: Arc<AtomicBool>) {
    let mut events = set.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            if is_muted.load(Ordering::Relaxed) {
                continue;
            }
            match event {
                StreamEvent::Trigger { id, at } => {
                    println!("\n<-- [TRIGGER] {:?} fired at {}\n>> ", id, at)
                }
                other => println!("\n<-- [STREAM EVENT] {:?}\n>> ", other),
            }
        }
    });
}

/// Parses `add ...` arguments into a generator plus label.
fn parse_add(args: &[&str]) -> Result<(String, BoxGenerator), String> {
    match args.first() {
        Some(&"periodic") => {
            let seconds: i64 = args
                .get(1)
                .and_then(|s| s.parse().ok())
                .ok_or("Usage: add periodic <SECONDS> [align <SECONDS>|none]")?;
            let interval = Duration::seconds(seconds);
            let generator = match (args.get(2), args.get(3)) {
                (None, _) => PeriodicTriggers::new(interval),
                (Some(&"none"), _) => PeriodicTriggers::aligned(interval, Duration::zero()),
                (Some(&"align"), Some(unit)) => {
                    let unit_secs: i64 = unit
                        .parse()
                        .map_err(|_| "align unit must be a number of seconds".to_string())?;
                    PeriodicTriggers::aligned(interval, Duration::seconds(unit_secs))
                }
                _ => return Err("Usage: add periodic <SECONDS> [align <SECONDS>|none]".into()),
            }
            .map_err(|e| e.to_string())?;
            Ok((format!("periodic-{}s", seconds), Box::new(generator)))
        }
        Some(&"schedule") => {
            let now = Utc::now();
            let offsets: Result<Vec<i64>, _> =
                args[1..].iter().map(|s| s.parse::<i64>()).collect();
            let offsets =
                offsets.map_err(|_| "Usage: add schedule <OFFSET_SECONDS...>".to_string())?;
            if offsets.is_empty() {
                return Err("Usage: add schedule <OFFSET_SECONDS...>".into());
            }
            let instants = offsets.iter().map(|&s| now + Duration::seconds(s));
            Ok((
                format!("schedule-{}x", offsets.len()),
                Box::new(ScheduleTriggers::new(instants)),
            ))
        }
        _ => Err("Unknown 'add' command. Try 'add periodic' or 'add schedule'.".into()),
    }
}

/// Loads stream definitions from a TOML file via the config crate.
fn load_shell_config(path: &str) -> Result<ShellConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name(path))
        .build()?;
    Ok(settings.try_deserialize()?)
}

fn print_help() {
    println!("Available commands:");
    println!("  add periodic <S> [align <S>|none] - Adds an S-second periodic stream.");
    println!("  add schedule <OFFSETS...>         - Adds one-shot triggers N seconds from now.");
    println!("  retune <H> <S>                    - Replaces stream H with an S-second periodic.");
    println!("  list                              - Shows active streams and their handles.");
    println!("  remove <H>                        - Disposes a stream by its handle.");
    println!("  load <FILE>                       - Loads stream definitions from a TOML file.");
    println!("  mute / unmute                     - Toggles printing of the event feed.");
    println!("  exit                              - Quits the shell.");
}

#[tokio::main]
async fn main() -> Result<()> {
    print_banner();

    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .init();

    let set = TimerSet::new();

    // Create the shared mute flag for the event listener.
    let is_muted = Arc::new(AtomicBool::new(false));
    spawn_event_listener(&set, is_muted.clone());

    info!("{} is ready.", ENGINE_NAME.cyan());

    // The shell's state management variables.
    let mut active_streams: HashMap<usize, StreamId> = HashMap::new();
    let mut next_handle: usize = 0;

    let mut rl = Editor::new()?;
    rl.set_helper(Some(CommandHighlighter));

    println!(
        "{} is running. Type 'help' for commands or 'exit' to quit.",
        ENGINE_NAME.cyan()
    );

    loop {
        let prompt = format!("{}", ">> ".cyan().bold());
        let readline = rl.readline(&prompt);
        match readline {
            Ok(line) => {
                rl.add_history_entry(line.as_str())?;
                let args = line.trim().split_whitespace().collect::<Vec<_>>();

                match args.split_first() {
                    Some((&"add", rest)) => match parse_add(rest) {
                        Ok((label, generator)) => {
                            let id = set.start(label, generator).await;
                            let handle = next_handle;
                            active_streams.insert(handle, id);
                            next_handle += 1;
                            println!("--> Added stream with handle: #{}", handle);
                        }
                        Err(message) => println!("{}", message),
                    },
                    Some((&"retune", rest)) => {
                        let parsed = rest
                            .first()
                            .and_then(|h| h.parse::<usize>().ok())
                            .zip(rest.get(1).and_then(|s| s.parse::<i64>().ok()));
                        let Some((handle, seconds)) = parsed else {
                            println!("Usage: retune <HANDLE> <SECONDS>");
                            continue;
                        };
                        let Some(&id) = active_streams.get(&handle) else {
                            println!("Error: Invalid handle #{}. Use 'list'.", handle);
                            continue;
                        };
                        match PeriodicTriggers::new(Duration::seconds(seconds)) {
                            Ok(generator) => {
                                match set.reconfigure(id, Box::new(generator)).await {
                                    Some(new_id) => {
                                        active_streams.insert(handle, new_id);
                                        println!(
                                            "--> Handle #{} now fires every {}s.",
                                            handle, seconds
                                        );
                                    }
                                    None => {
                                        println!("--> Error: Stream not found in engine.");
                                        active_streams.remove(&handle);
                                    }
                                }
                            }
                            Err(e) => println!("Error: {}", e),
                        }
                    }
                    Some((&"remove", rest)) => {
                        let Some(handle) = rest.first().and_then(|h| h.parse::<usize>().ok())
                        else {
                            println!("Usage: remove <HANDLE>");
                            continue;
                        };
                        if let Some(id) = active_streams.remove(&handle) {
                            if set.dispose(id).await {
                                println!("--> Stream successfully removed.");
                            } else {
                                println!("--> Error: Stream not found in engine.");
                            }
                        } else {
                            println!("Error: Invalid handle #{}. Use 'list'.", handle);
                        }
                    }
                    Some((&"list", _)) => {
                        println!("Active streams:");
                        let running = set.streams().await;
                        for (handle, id) in &active_streams {
                            let label = running
                                .iter()
                                .find(|(running_id, _)| running_id == id)
                                .map(|(_, label)| label.as_str())
                                .unwrap_or("<terminated>");
                            println!("  Handle #{}: {:?} ({})", handle, id, label);
                        }
                    }
                    Some((&"load", rest)) => {
                        let Some(path) = rest.first() else {
                            println!("Usage: load <FILE>");
                            continue;
                        };
                        match load_shell_config(path) {
                            Ok(shell_config) => {
                                for def in shell_config.streams {
                                    match def.spec.build() {
                                        Ok(generator) => {
                                            let id = set.start(def.label.clone(), generator).await;
                                            let handle = next_handle;
                                            active_streams.insert(handle, id);
                                            next_handle += 1;
                                            println!(
                                                "--> Loaded '{}' as handle #{}",
                                                def.label, handle
                                            );
                                        }
                                        Err(e) => {
                                            println!("Error building '{}': {}", def.label, e)
                                        }
                                    }
                                }
                            }
                            Err(e) => println!("Error loading {}: {}", path, e),
                        }
                    }
                    Some((&"mute", _)) => {
                        is_muted.store(true, Ordering::Relaxed);
                        println!("--> Event feed muted.");
                    }
                    Some((&"unmute", _)) => {
                        is_muted.store(false, Ordering::Relaxed);
                        println!("--> Event feed unmuted.");
                    }
                    Some((&"help", _)) => print_help(),
                    Some((&"exit", _)) => break,
                    Some((unknown, _)) => {
                        println!("Unknown command: '{}'. Type 'help'.", unknown)
                    }
                    None => {}
                }
            }
            Err(_) => {
                println!("Exiting tickshell...");
                break;
            }
        }
    }

    // Release every pending wait before the runtime goes away.
    set.dispose_all().await;
    Ok(())
}
