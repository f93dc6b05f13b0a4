//! Webhook sink
//!
//! POSTs each observation to a configured HTTP endpoint as a flat JSON
//! object of key/value quantities — the same shape the MQTT payload has, so
//! a receiver can be pointed at either transport.
//!
//! HTTP is stateless, so there is no connection to manage; instead the sink
//! retries transient failures (transport errors, 5xx, 429) with exponential
//! backoff and gives up on client errors immediately. The pipeline ticks at
//! serial-link speed, so a couple of hundred milliseconds of backoff costs
//! nothing.

use std::thread;
use std::time::Duration;

use raven_core::{Observation, ObservationSink, SinkError, VERSION};

use crate::SinkStats;

/// Webhook sink configuration.
#[derive(Debug, Clone)]
pub struct WebhookConfig {
    /// Endpoint URL, `http://` or `https://`.
    pub url: String,
    /// Optional bearer token for an `Authorization` header.
    pub bearer_token: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Retries after the first attempt.
    pub max_retries: u32,
}

impl WebhookConfig {
    /// Configuration with conventional timeout and retry defaults.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            bearer_token: None,
            timeout: Duration::from_secs(10),
            max_retries: 2,
        }
    }

    /// Attach a bearer token.
    pub fn bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// Override the per-request timeout.
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    /// Override the retry budget.
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }
}

/// POSTs observations to an HTTP endpoint.
pub struct WebhookSink {
    config: WebhookConfig,
    agent: ureq::Agent,
    stats: SinkStats,
}

impl WebhookSink {
    /// Validate the endpoint and build the HTTP agent.
    pub fn new(config: WebhookConfig) -> Result<Self, SinkError> {
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

    fn post_with_retry(&self, body: &str) -> Result<(), SinkError> {
        let mut last_error = None;

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                thread::sleep(Duration::from_millis(100 * (1 << attempt)));
            }

            let mut request = self
                .agent
                .post(&self.config.url)
                .set("Content-Type", "application/json");
            if let Some(token) = &self.config.bearer_token {
                request = request.set("Authorization", &format!("Bearer {token}"));
            }

            match request.send_string(body) {
                Ok(_) => return Ok(()),
                Err(ureq::Error::Status(code, _)) if code >= 500 || code == 429 => {
                    // Server hiccup or rate limit: worth retrying.
                    last_error = Some(SinkError::Write(format!("server returned {code}")));
                }
                Err(ureq::Error::Status(code, _)) => {
                    // Client error: retrying will not change the answer.
                    return Err(SinkError::Write(format!("server returned {code}")));
                }
                Err(ureq::Error::Transport(err)) => {
                    last_error = Some(SinkError::Write(err.to_string()));
                }
            }
        }

        Err(last_error.unwrap_or_else(|| SinkError::Write("request failed".into())))
    }

    fn deliver(&mut self, body: &str) -> Result<(), SinkError> {
        match self.post_with_retry(body) {
            Ok(()) => {
                self.stats.sent += 1;
                self.stats.bytes_sent += body.len() as u64;
                Ok(())
            }
            Err(err) => {
                self.stats.failed += 1;
                Err(err)
            }
        }
    }
}

impl ObservationSink for WebhookSink {
    fn emit(&mut self, observation: &Observation) -> Result<(), SinkError> {
        let body = serde_json::to_string(observation)
            .map_err(|err| SinkError::Encode(err.to_string()))?;
        self.deliver(&body)
    }

    fn name(&self) -> &'static str {
        "webhook"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_builder() {
        let config = WebhookConfig::new("https://ingest.example.com/readings")
            .bearer_token("secret")
            .timeout_secs(30)
            .max_retries(5);

        assert_eq!(config.url, "https://ingest.example.com/readings");
        assert_eq!(config.bearer_token.as_deref(), Some("secret"));
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.max_retries, 5);
    }

    #[test]
    fn url_scheme_is_validated() {
        assert!(WebhookSink::new(WebhookConfig::new("not-a-url")).is_err());
        assert!(WebhookSink::new(WebhookConfig::new("https://valid.example")).is_ok());
    }
}
