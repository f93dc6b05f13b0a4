//! MQTT sink
//!
//! Publishes each observation to a configurable topic as a compact JSON
//! object, e.g.
//!
//! ```json
//! {"kind":"estimated","total_wh":103.6,"at":"2014-05-07T17:00:00Z","basis":"fresh"}
//! ```
//!
//! On connect the sink announces itself on the same topic so a dashboard can
//! notice daemon restarts (and treat the next total accordingly). The
//! rumqttc event loop runs on a background thread owned by the sink;
//! connection-level errors are logged there and the client retries on its
//! own schedule.

use std::thread;
use std::time::Duration;

use rumqttc::{Client, Event, MqttOptions, QoS};

use raven_core::{Observation, ObservationSink, SinkError, VERSION};

use crate::SinkStats;

/// MQTT sink configuration.
#[derive(Debug, Clone)]
pub struct MqttConfig {
    /// Broker hostname or address.
    pub host: String,
    /// Broker port, conventionally 1883.
    pub port: u16,
    /// Topic every observation is published to.
    pub topic: String,
    /// Client identifier presented to the broker.
    pub client_id: String,
    /// Keep-alive interval in seconds.
    pub keep_alive_secs: u64,
}

impl MqttConfig {
    /// Configuration with conventional defaults for client id and keep-alive.
    pub fn new(
        host: impl Into<String>,
        port: u16,
        topic: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            topic: topic.into(),
            client_id: format!("ravend-{VERSION}"),
            keep_alive_secs: 30,
        }
    }

    /// Override the client identifier.
    pub fn client_id(mut self, id: impl Into<String>) -> Self {
        self.client_id = id.into();
        self
    }

    /// Override the keep-alive interval.
    pub fn keep_alive_secs(mut self, secs: u64) -> Self {
        self.keep_alive_secs = secs;
        self
    }
}

/// Publishes observations to an MQTT broker.
pub struct MqttSink {
    client: Client,
    topic: String,
    stats: SinkStats,
}

impl MqttSink {
    /// Connect to the broker and announce startup.
    ///
    /// Spawns the connection event-loop thread; it lives until the sink (and
    /// its client) are dropped and the broker closes the session.
    pub fn connect(config: MqttConfig) -> Result<Self, SinkError> {
        let mut options =
            MqttOptions::new(config.client_id.as_str(), config.host.as_str(), config.port);
        options.set_keep_alive(Duration::from_secs(config.keep_alive_secs));

        let (client, mut connection) = Client::new(options, 16);

        thread::Builder::new()
            .name("mqtt-eventloop".into())
            .spawn(move || {
                for event in connection.iter() {
                    match event {
                        Ok(Event::Incoming(packet)) => log::trace!("mqtt incoming: {packet:?}"),
                        Ok(Event::Outgoing(_)) => {}
                        Err(err) => {
                            // rumqttc backs off and reconnects by itself.
                            log::warn!("mqtt connection error: {err}");
                            thread::sleep(Duration::from_secs(1));
                        }
                    }
                }
            })
            .map_err(|err| SinkError::Connect(err.to_string()))?;

        client
            .publish(
                config.topic.as_str(),
                QoS::AtMostOnce,
                false,
                format!("ravend v{VERSION} starting up"),
            )
            .map_err(|err| SinkError::Connect(err.to_string()))?;

        log::info!(
            "mqtt sink publishing to {} on {}:{}",
            config.topic,
            config.host,
            config.port
        );

        Ok(Self {
            client,
            topic: config.topic,
            stats: SinkStats::default(),
        })
    }

    /// Delivery counters.
    pub fn stats(&self) -> &SinkStats {
        &self.stats
    }
}

impl ObservationSink for MqttSink {
    fn emit(&mut self, observation: &Observation) -> Result<(), SinkError> {
        let payload = serde_json::to_vec(observation)
            .map_err(|err| SinkError::Encode(err.to_string()))?;
        let len = payload.len();

        match self
            .client
            .publish(self.topic.as_str(), QoS::AtMostOnce, false, payload)
        {
            Ok(()) => {
                self.stats.sent += 1;
                self.stats.bytes_sent += len as u64;
                Ok(())
            }
            Err(err) => {
                self.stats.failed += 1;
                Err(SinkError::Write(err.to_string()))
            }
        }
    }

    fn name(&self) -> &'static str {
        "mqtt"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config = MqttConfig::new("broker.local", 1883, "energy/house");
        assert_eq!(config.keep_alive_secs, 30);
        assert!(config.client_id.starts_with("ravend-"));

        let config = config.client_id("meter01").keep_alive_secs(60);
        assert_eq!(config.client_id, "meter01");
        assert_eq!(config.keep_alive_secs, 60);
    }
}
