//! # EnOcean Bridge
//!
//! Gateway daemon connecting an EnOcean ESP3 USB transceiver to a remote
//! collector.
//!
//! The main loop reads raw chunks from the serial port, feeds them to the
//! resynchronizing packet framer, decodes ERP2 telegrams, and interprets
//! rocker-switch presses from allow-listed sensors. Collected events are
//! flushed on an interval to a per-day local CSV log and to the collector
//! endpoint; a failed serial port is reopened after a configurable delay.

use anyhow::{Context, Result};
use clap::Parser;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{error, info, warn};

mod config;
mod error;
mod esp3;
mod events;
mod logger;
mod serial;

use config::Config;
use esp3::{decode_frame, DecodeError, Esp3Framer};
use events::{EventInterpreter, SwitchEvent};
use logger::{CloudLogger, LocalFileLogger};
use serial::Esp3Serial;

/// EnOcean ESP3 gateway
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Path to the TOML settings file
    #[arg(long)]
    config: String,

    /// Override the serial port from the settings file
    #[arg(long)]
    port: Option<String>,

    /// Override the collector endpoint URL from the settings file
    #[arg(long)]
    url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("EnOcean Bridge v{} starting...", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();
    let mut config = Config::load(&args.config)
        .with_context(|| format!("failed to load settings from {}", args.config))?;
    info!("settings loaded from {}", args.config);

    if let Some(port) = args.port {
        info!("using serial port {port} instead");
        config.serial.port = port;
    }
    if let Some(url) = args.url {
        info!("using endpoint URL {url} instead");
        config.collector.endpoint_url = url;
    }

    run(config).await
}

/// Gateway main loop
async fn run(config: Config) -> Result<()> {
    let local_logger = LocalFileLogger::new(&config.logging.directory, config.logging.retention_days);
    let mut cloud_logger = CloudLogger::new(&config.collector);
    let mut interpreter = EventInterpreter::new(config.sensors.originator_ids.clone());
    let mut framer = Esp3Framer::new();
    let mut unsent_events: Vec<SwitchEvent> = Vec::new();

    let mut flush_interval = interval(Duration::from_millis(config.collector.send_interval_ms));
    flush_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let reconnect_delay = Duration::from_millis(config.serial.reconnect_interval_ms);

    'reconnect: loop {
        let mut port = match Esp3Serial::open(&config.serial.port, config.serial.baud_rate) {
            Ok(port) => port,
            Err(e) => {
                warn!("{e}; retrying in {reconnect_delay:?}");
                tokio::time::sleep(reconnect_delay).await;
                continue;
            }
        };
        info!("listening on {}", port.device_path());

        loop {
            tokio::select! {
                chunk = port.read_chunk() => {
                    match chunk {
                        Ok(chunk) => {
                            let events = process_chunk(&mut framer, &mut interpreter, chunk);
                            unsent_events.extend(events);
                        }
                        Err(e) => {
                            warn!("{e}; reconnecting...");
                            tokio::time::sleep(reconnect_delay).await;
                            continue 'reconnect;
                        }
                    }
                }

                _ = flush_interval.tick() => {
                    flush(&local_logger, &mut cloud_logger, &mut unsent_events).await;
                }

                _ = tokio::signal::ctrl_c() => {
                    info!("received Ctrl+C, shutting down...");
                    flush(&local_logger, &mut cloud_logger, &mut unsent_events).await;
                    return Ok(());
                }
            }
        }
    }
}

/// Feed one serial chunk through the framer and both decode layers
///
/// Every decode failure is a skip: the frame or telegram is dropped with
/// a log line and the stream keeps going.
fn process_chunk(
    framer: &mut Esp3Framer,
    interpreter: &mut EventInterpreter,
    chunk: &[u8],
) -> Vec<SwitchEvent> {
    let mut events = Vec::new();
    for frame in framer.feed(chunk) {
        match decode_frame(&frame) {
            Ok(packet) => events.extend(interpreter.interpret(&packet)),
            Err(DecodeError::UnsupportedPacketType(_)) => {
                // Already logged at debug level; common and harmless.
            }
            Err(e) => warn!("dropping frame: {e}"),
        }
    }
    events
}

/// Flush collected events to the local log and the collector
async fn flush(
    local_logger: &LocalFileLogger,
    cloud_logger: &mut CloudLogger,
    unsent_events: &mut Vec<SwitchEvent>,
) {
    let events = std::mem::take(unsent_events);

    if let Err(e) = local_logger.remove_old_logs() {
        error!("log retention sweep failed: {e}");
    }
    if let Err(e) = local_logger.write_log(&events) {
        error!("local log write failed: {e}");
    }
    cloud_logger.send_log(&events).await;
}
