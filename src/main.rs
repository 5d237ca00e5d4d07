//! TETRODE headless driver
//!
//! Replays an event script against a field and prints the final snapshot as
//! JSON. Script lines are event names, optionally with a repeat count
//! (`tick x30`); blank lines and `#` comments are skipped.
//!
//! Usage: tetrode [--seed N] [--config PATH] [SCRIPT]   (script defaults to stdin)

use std::error::Error;
use std::io::{self, Read};
use std::path::PathBuf;
use tetrode::{Changes, Event, EventParseError, Field, FieldConfig};

/// Parsed command line
#[derive(Debug, Default)]
struct Args {
    seed: Option<u32>,
    config: Option<PathBuf>,
    script: Option<PathBuf>,
}

fn parse_args() -> Result<Args, Box<dyn Error>> {
    let mut args = Args::default();
    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--seed" => {
                let value = iter.next().ok_or("--seed needs a value")?;
                args.seed = Some(value.parse()?);
            }
            "--config" => {
                let value = iter.next().ok_or("--config needs a path")?;
                args.config = Some(PathBuf::from(value));
            }
            _ => args.script = Some(PathBuf::from(arg)),
        }
    }
    Ok(args)
}

/// Expand a script into the event sequence it describes
fn parse_script(script: &str) -> Result<Vec<Event>, EventParseError> {
    let mut events = Vec::new();
    for line in script.lines() {
        let line = line.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }

        let mut parts = line.split_whitespace();
        let name = parts.next().unwrap_or("");
        let event: Event = name.parse()?;
        let repeat = match parts.next() {
            Some(count) => count
                .trim_start_matches('x')
                .parse()
                .map_err(|_| EventParseError(line.to_string()))?,
            None => 1,
        };
        events.extend(std::iter::repeat_n(event, repeat));
    }
    Ok(events)
}

fn main() -> Result<(), Box<dyn Error>> {
    let tetrode_dir = std::env::temp_dir().join("tetrode");
    std::fs::create_dir_all(&tetrode_dir)?;

    // Setup tracing to log file
    let file_appender = tracing_appender::rolling::never(&tetrode_dir, "tetrode.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("tetrode=debug".parse()?),
        )
        .with_ansi(false)
        .init();

    let args = parse_args()?;
    let config = match &args.config {
        Some(path) => FieldConfig::load_from(path)?,
        None => FieldConfig::load()?,
    };
    let seed = args.seed.unwrap_or_else(rand::random);
    tracing::info!(seed, ?config, "starting replay");

    let script = match &args.script {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    let events = parse_script(&script)?;

    let mut field = Field::new(&config, seed)?;
    let mut locks = 0;
    for event in &events {
        if matches!(event, Event::Quit) {
            break;
        }
        if field.handle_event(*event).contains(Changes::LOCKED) {
            locks += 1;
        }
        if field.is_topped_out() {
            break;
        }
    }
    tracing::info!(
        events = events.len(),
        locks,
        score = field.score(),
        "replay finished"
    );

    println!("{}", serde_json::to_string_pretty(&field.snapshot())?);
    Ok(())
}
