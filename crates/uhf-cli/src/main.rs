//! `uhf-sim`: drive the reader control core against a simulated reader.
//!
//! ```sh
//! uhf-sim                    # built-in scenario
//! uhf-sim scenario.json      # scripted scenario, see `sim.rs`
//! RUST_LOG=debug uhf-sim     # include configuration diffs
//! ```

mod sim;

use std::time::Duration;

use anyhow::bail;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use uhf_reader::{ReaderEvent, ReaderFacade, event_channel};
use uhf_transport::mock::MockTransport;

use crate::sim::{SimConfig, SimStep};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = match std::env::args().nth(1) {
        Some(path) => SimConfig::load(path)?,
        None => SimConfig::default(),
    };
    run(config).await
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();
}

async fn run(config: SimConfig) -> anyhow::Result<()> {
    let (transport, handle) = MockTransport::with_name("uhf-sim");
    handle.set_radio_count(config.radio_count);
    if config.latency_ms > 0 {
        handle.set_latency(Duration::from_millis(config.latency_ms));
    }

    let (tx, mut rx) = event_channel();
    let family = config.hardware_family;
    let reader = ReaderFacade::get_or_init(move || ReaderFacade::new(family, transport).with_sink(tx));

    reader.initialize(config.options.clone())?;
    let attachment = reader.attach().await?;
    info!(radios = attachment.count(), family = %reader.hardware_family(), "reader attached");
    drain(&mut rx);

    for step in &config.steps {
        match apply(reader, step).await {
            Ok(()) => {}
            Err(error) if error.is_recoverable() => warn!(?step, "rejected: {}", error),
            Err(error) => {
                drain(&mut rx);
                bail!("step {step:?} failed: {error}");
            }
        }
        drain(&mut rx);
    }

    reader.shutdown()?;
    drain(&mut rx);

    println!("{}", serde_json::to_string_pretty(&reader.configuration())?);
    info!(commands = handle.sent_count(), "simulation finished");
    Ok(())
}

async fn apply(reader: &ReaderFacade, step: &SimStep) -> uhf_core::Result<()> {
    match *step {
        SimStep::Region { region } => reader.set_region(region).await.map(drop),
        SimStep::Power { level } => reader.set_power_level(level).await.map(drop),
        SimStep::Profile { id } => reader.set_link_profile(id).await.map(drop),
        SimStep::Channel { id } => reader.set_channel(id).await.map(drop),
        SimStep::Lbt { enabled } => reader.set_lbt_enabled(enabled).await.map(drop),
        SimStep::Inventory { duration_ms, cycles } => reader
            .set_inventory_duration(Duration::from_millis(duration_ms), cycles)
            .await
            .map(drop),
        SimStep::SelectRadio { index } => reader.select_radio(index).await.map(drop),
        SimStep::Run => {
            reader.begin_operation().await?;
            reader.end_operation().map(drop)
        }
    }
}

fn drain(rx: &mut mpsc::Receiver<ReaderEvent>) {
    while let Ok(event) = rx.try_recv() {
        match &event {
            ReaderEvent::StateChanged(transition) => {
                info!(from = %transition.from, to = %transition.to, "state changed")
            }
            ReaderEvent::ConfigurationApplied { radio, fields } => {
                info!(radio, fields = fields.len(), "configuration applied")
            }
            ReaderEvent::TransportFault { message } => warn!("transport fault: {}", message),
            _ => {
                if let Ok(json) = serde_json::to_string(&event) {
                    tracing::debug!("{}", json);
                }
            }
        }
    }
}
