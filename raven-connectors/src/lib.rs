//! Sink adapters for reconciled meter observations
//!
//! ## Overview
//!
//! The reconciliation engine emits [`Observation`](raven_core::Observation)s;
//! these adapters deliver them to the places an energy dashboard actually
//! lives. Each adapter implements
//! [`ObservationSink`](raven_core::ObservationSink) and owns its transport
//! completely: connection state, reconnects, retries, and payload encoding
//! all stay behind the trait.
//!
//! ## Adapter selection
//!
//! | Adapter | Transport | Payload |
//! |---------|-----------|---------|
//! | [`mqtt::MqttSink`] | MQTT broker (rumqttc) | JSON observation per message |
//! | [`graphite::GraphiteSink`] | Carbon plaintext over TCP | `path value timestamp` |
//! | [`webhook::WebhookSink`] | HTTP POST (ureq) | JSON observation |
//! | [`chart::ChartSink`] | HTTP POST (ureq) | `{"x": timestamp, "y": value}` points |
//!
//! ## Failure containment
//!
//! A sink failure is that sink's problem. Adapters log what went wrong,
//! count it in their [`SinkStats`], and report a
//! [`SinkError`](raven_core::SinkError) that the pipeline counts and drops —
//! reconciliation is never disturbed by a dead broker or a refused socket.
//! Adapters that hold a connection (Graphite) re-establish it lazily on the
//! next emit rather than giving up for the life of the process.

#[cfg(feature = "mqtt")]
pub mod mqtt;

#[cfg(feature = "graphite")]
pub mod graphite;

#[cfg(feature = "webhook")]
pub mod webhook;

#[cfg(feature = "chart")]
pub mod chart;

// Re-export common types
#[cfg(feature = "mqtt")]
pub use mqtt::{MqttConfig, MqttSink};

#[cfg(feature = "graphite")]
pub use graphite::{GraphiteConfig, GraphiteSink};

#[cfg(feature = "webhook")]
pub use webhook::{WebhookConfig, WebhookSink};

#[cfg(feature = "chart")]
pub use chart::{ChartConfig, ChartSink};

/// Delivery statistics common to all sink adapters.
#[derive(Debug, Default, Clone)]
pub struct SinkStats {
    /// Observations delivered successfully.
    pub sent: u64,
    /// Observations that could not be delivered.
    pub failed: u64,
    /// Total payload bytes delivered.
    pub bytes_sent: u64,
    /// Connections (re-)established after the first.
    pub reconnects: u32,
}
