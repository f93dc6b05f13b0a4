//! Live-chart streaming sink
//!
//! Feeds a streaming chart endpoint (plot.ly-style) with one
//! `{"x": "<timestamp>", "y": <value>}` point per observation. The endpoint
//! plots whatever series it is given, so by default every observation kind
//! is forwarded; a dashboard that only wants the reconciled total can filter
//! on its side, or this sink can be restricted to one kind at construction.

use std::time::Duration;

use raven_core::{Observation, ObservationSink, SinkError, VERSION};

use crate::SinkStats;

/// Chart sink configuration.
#[derive(Debug, Clone)]
pub struct ChartConfig {
    /// Streaming endpoint URL.
    pub url: String,
    /// Optional stream token, sent as the `X-Stream-Token` header.
    pub token: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Forward only observations of this kind (`"rate"`, `"actual"`,
    /// `"estimated"`); `None` forwards everything.
    pub only_kind: Option<String>,
}

impl ChartConfig {
    /// Configuration forwarding every observation kind.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            token: None,
            timeout: Duration::from_secs(10),
            only_kind: None,
        }
    }

    /// Attach a stream token.
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Restrict the stream to one observation kind.
    pub fn only_kind(mut self, kind: impl Into<String>) -> Self {
        self.only_kind = Some(kind.into());
        self
    }
}

/// Streams observations as chart points.
pub struct ChartSink {
    config: ChartConfig,
    agent: ureq::Agent,
    stats: SinkStats,
}

impl ChartSink {
    /// Validate the endpoint and build the HTTP agent.
    pub fn new(config: ChartConfig) -> Result<Self, SinkError> {
        if !config.url.starts_with("http://") && !config.url.starts_with("https://") {
            return Err(SinkError::Config(
                "endpoint URL must start with http:// or https://".into(),
            ));
        }

        let agent = ureq::AgentBuilder::new()
            .timeout(config.timeout)
            .user_agent(&format!("ravend/{VERSION}"))
            .build();

        Ok(Self {
            config,
            agent,
            stats: SinkStats::default(),
        })
    }

    /// Delivery counters.
    pub fn stats(&self) -> &SinkStats {
        &self.stats
    }

    /// The `{"x": ..., "y": ...}` point for an observation.
    fn point(observation: &Observation) -> serde_json::Value {
        serde_json::json!({
            "x": observation.at().iso8601(),
            "y": observation.value(),
        })
    }
}

impl ObservationSink for ChartSink {
    fn emit(&mut self, observation: &Observation) -> Result<(), SinkError> {
        if let Some(kind) = &self.config.only_kind {
            if kind != observation.kind() {
                return Ok(());
            }
        }

        let body = Self::point(observation).to_string();

        let mut request = self
            .agent
            .post(&self.config.url)
            .set("Content-Type", "application/json");
        if let Some(token) = &self.config.token {
            request = request.set("X-Stream-Token", token);
        }

        match request.send_string(&body) {
            Ok(_) => {
                self.stats.sent += 1;
                self.stats.bytes_sent += body.len() as u64;
                Ok(())
            }
            Err(err) => {
                self.stats.failed += 1;
                Err(SinkError::Write(err.to_string()))
            }
        }
    }

    fn name(&self) -> &'static str {
        "chart"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use raven_core::MeterTime;

    #[test]
    fn point_shape() {
        let obs = Observation::RateOnly {
            watts: 1176.0,
            at: MeterTime::from_device_secs(0),
        };
        let point = ChartSink::point(&obs);

        assert_eq!(point["x"], "2000-01-01T00:00:00Z");
        assert_eq!(point["y"], 1176.0);
    }

    #[test]
    fn kind_filter_skips_without_error() {
        let mut sink = ChartSink::new(
            ChartConfig::new("http://chart.example/stream").only_kind("estimated"),
        )
        .unwrap();

        // Filtered out: no request is made, so no failure is possible.
        let obs = Observation::RateOnly {
            watts: 1.0,
            at: MeterTime::from_device_secs(1),
        };
        assert!(sink.emit(&obs).is_ok());
        assert_eq!(sink.stats().sent, 0);
        assert_eq!(sink.stats().failed, 0);
    }
}
