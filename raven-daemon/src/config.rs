//! ravend configuration
//!
//! One TOML file configures the serial bridge and any number of sinks. A
//! sink is enabled by the presence of its section and disabled by its
//! absence — there are no `enabled = true` switches to forget.
//!
//! ```toml
//! [serial]
//! port = "/dev/ttyUSB0"
//! baud = 115200
//!
//! [mqtt]
//! host = "broker.local"
//! topic = "energy/house"
//!
//! [graphite]
//! host = "graphite.local"
//! prefix = "energy.house"
//!
//! [webhook]
//! url = "https://ingest.example.com/readings"
//! bearer_token = "secret"
//!
//! [chart]
//! url = "https://chart.example.com/stream"
//! only_kind = "estimated"
//! ```

use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

/// Top-level daemon configuration.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// The serial bridge to read from.
    pub serial: SerialConfig,
    /// MQTT sink; absent means disabled.
    pub mqtt: Option<MqttSection>,
    /// Graphite sink; absent means disabled.
    pub graphite: Option<GraphiteSection>,
    /// Webhook sink; absent means disabled.
    pub webhook: Option<WebhookSection>,
    /// Live-chart sink; absent means disabled.
    pub chart: Option<ChartSection>,
}

/// `[serial]` section.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SerialConfig {
    /// Device path, e.g. `/dev/ttyUSB0`.
    pub port: String,
    /// Baud rate; RAVEn bridges run at 115200.
    #[serde(default = "default_baud")]
    pub baud: u32,
    /// Seconds of silence before the link is declared dead. The bridge
    /// chatters every few seconds, so minutes of silence means unplugged.
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

/// `[mqtt]` section.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MqttSection {
    /// Broker hostname or address.
    pub host: String,
    /// Broker port.
    #[serde(default = "default_mqtt_port")]
    pub port: u16,
    /// Topic to publish observations to.
    pub topic: String,
    /// Client identifier override.
    pub client_id: Option<String>,
}

/// `[graphite]` section.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GraphiteSection {
    /// Carbon relay hostname or address.
    pub host: String,
    /// Carbon plaintext port.
    #[serde(default = "default_graphite_port")]
    pub port: u16,
    /// Metric path prefix.
    pub prefix: String,
}

/// `[webhook]` section.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WebhookSection {
    /// Endpoint URL.
    pub url: String,
    /// Optional bearer token.
    pub bearer_token: Option<String>,
}

/// `[chart]` section.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChartSection {
    /// Streaming endpoint URL.
    pub url: String,
    /// Optional stream token.
    pub token: Option<String>,
    /// Forward only this observation kind.
    pub only_kind: Option<String>,
}

fn default_baud() -> u32 {
    115_200
}

fn default_idle_timeout() -> u64 {
    120
}

fn default_mqtt_port() -> u16 {
    1883
}

fn default_graphite_port() -> u16 {
    2003
}

impl Config {
    /// Load and parse a configuration file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        toml::from_str(&text)
            .with_context(|| format!("parsing config file {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_config_parses() {
        let config: Config = toml::from_str(
            r#"
            [serial]
            port = "/dev/ttyUSB0"
            baud = 9600

            [mqtt]
            host = "broker.local"
            topic = "energy/house"

            [graphite]
            host = "graphite.local"
            prefix = "energy.house"

            [webhook]
            url = "https://ingest.example.com/readings"
            bearer_token = "secret"

            [chart]
            url = "https://chart.example.com/stream"
            only_kind = "estimated"
            "#,
        )
        .unwrap();

        assert_eq!(config.serial.baud, 9600);
        assert_eq!(config.mqtt.as_ref().unwrap().port, 1883); // default
        assert_eq!(config.graphite.as_ref().unwrap().port, 2003); // default
        assert!(config.webhook.is_some());
        assert_eq!(
            config.chart.as_ref().unwrap().only_kind.as_deref(),
            Some("estimated")
        );
    }

    #[test]
    fn absent_sections_disable_sinks() {
        let config: Config = toml::from_str(
            r#"
            [serial]
            port = "/dev/ttyUSB0"
            "#,
        )
        .unwrap();

        assert_eq!(config.serial.baud, 115_200); // default
        assert!(config.mqtt.is_none());
        assert!(config.graphite.is_none());
        assert!(config.webhook.is_none());
        assert!(config.chart.is_none());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let result: Result<Config, _> = toml::from_str(
            r#"
            [serial]
            port = "/dev/ttyUSB0"
            bau = 9600
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn serial_section_is_required() {
        let result: Result<Config, _> = toml::from_str("");
        assert!(result.is_err());
    }
}
