//! ravend — serial-to-sinks daemon for RAVEn smart-meter bridges
//!
//! Opens the bridge's serial port, runs the reading pipeline over it, and
//! fans observations out to whichever sinks the config enables. The daemon
//! exits when the serial stream dies; reconnect policy (systemd restart,
//! supervisor, a shell loop) belongs to the operator.

mod config;

use std::io::BufReader;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::Parser;
use log::{info, warn, LevelFilter};

use raven_connectors::{
    ChartConfig, ChartSink, GraphiteConfig, GraphiteSink, MqttConfig, MqttSink,
    WebhookConfig, WebhookSink,
};
use raven_core::{Pipeline, ReaderSource, SourceError};

use crate::config::Config;

#[derive(Parser)]
#[command(name = "ravend", about = "RAVEn smart-meter bridge daemon", version)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "ravend.toml")]
    config: PathBuf,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(match cli.verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        })
        .parse_default_env()
        .init();

    let config = Config::load(&cli.config)?;

    info!(
        "opening {} at {} baud",
        config.serial.port, config.serial.baud
    );
    // The read timeout is the liveness policy: the bridge emits a demand
    // reading every few seconds, so a long silence means the link is dead
    // and the pipeline should stop rather than block forever.
    let port = serialport::new(config.serial.port.as_str(), config.serial.baud)
        .data_bits(serialport::DataBits::Eight)
        .stop_bits(serialport::StopBits::One)
        .parity(serialport::Parity::None)
        .timeout(Duration::from_secs(config.serial.idle_timeout_secs))
        .open()
        .with_context(|| format!("opening serial port {}", config.serial.port))?;

    let mut pipeline = Pipeline::new(ReaderSource::new(BufReader::new(port)));

    if let Some(section) = &config.mqtt {
        let mut mqtt = MqttConfig::new(section.host.clone(), section.port, section.topic.clone());
        if let Some(id) = &section.client_id {
            mqtt = mqtt.client_id(id.clone());
        }
        match MqttSink::connect(mqtt) {
            Ok(sink) => pipeline = pipeline.add_sink(Box::new(sink)),
            Err(err) => warn!("mqtt sink disabled: {err}"),
        }
    }

    if let Some(section) = &config.graphite {
        let graphite =
            GraphiteConfig::new(section.host.clone(), section.port, section.prefix.clone());
        pipeline = pipeline.add_sink(Box::new(GraphiteSink::new(graphite)));
    }

    if let Some(section) = &config.webhook {
        let mut webhook = WebhookConfig::new(section.url.clone());
        if let Some(token) = &section.bearer_token {
            webhook = webhook.bearer_token(token.clone());
        }
        match WebhookSink::new(webhook) {
            Ok(sink) => pipeline = pipeline.add_sink(Box::new(sink)),
            Err(err) => warn!("webhook sink disabled: {err}"),
        }
    }

    if let Some(section) = &config.chart {
        let mut chart = ChartConfig::new(section.url.clone());
        if let Some(token) = &section.token {
            chart = chart.token(token.clone());
        }
        if let Some(kind) = &section.only_kind {
            chart = chart.only_kind(kind.clone());
        }
        match ChartSink::new(chart) {
            Ok(sink) => pipeline = pipeline.add_sink(Box::new(sink)),
            Err(err) => warn!("chart sink disabled: {err}"),
        }
    }

    info!("pipeline starting");
    match pipeline.run() {
        SourceError::Disconnected => bail!("serial stream ended"),
        SourceError::Io(err) => Err(err).context("reading from serial port"),
    }
}
