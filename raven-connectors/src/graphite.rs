//! Graphite sink
//!
//! Speaks the carbon plaintext protocol: one
//! `<path> <value> <unix-timestamp>\n` line per observation over a TCP
//! socket. Metric paths are `<prefix>.<kind>`, so a prefix of
//! `energy.house` produces `energy.house.rate`, `energy.house.actual`, and
//! `energy.house.estimated` series.
//!
//! Carbon relays restart independently of this daemon, so the connection is
//! established lazily and re-established on the next emit after any write
//! failure.

use std::io::Write;
use std::net::TcpStream;
use std::time::Duration;

use raven_core::{Observation, ObservationSink, SinkError};

use crate::SinkStats;

/// Graphite sink configuration.
#[derive(Debug, Clone)]
pub struct GraphiteConfig {
    /// Carbon relay hostname or address.
    pub host: String,
    /// Carbon plaintext port, conventionally 2003.
    pub port: u16,
    /// Metric path prefix, without trailing dot.
    pub prefix: String,
    /// Connect timeout in seconds.
    pub connect_timeout_secs: u64,
}

impl GraphiteConfig {
    /// Configuration with a conventional connect timeout.
    pub fn new(host: impl Into<String>, port: u16, prefix: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            prefix: prefix.into(),
            connect_timeout_secs: 10,
        }
    }
}

/// Writes observations as carbon plaintext metrics.
pub struct GraphiteSink {
    config: GraphiteConfig,
    conn: Option<TcpStream>,
    stats: SinkStats,
}

impl GraphiteSink {
    /// Build the sink. No connection is attempted until the first emit.
    pub fn new(config: GraphiteConfig) -> Self {
        Self {
            config,
            conn: None,
            stats: SinkStats::default(),
        }
    }

    /// Delivery counters.
    pub fn stats(&self) -> &SinkStats {
        &self.stats
    }

    /// One carbon plaintext line for an observation.
    fn format_line(prefix: &str, observation: &Observation) -> String {
        format!(
            "{}.{} {} {}\n",
            prefix,
            observation.kind(),
            observation.value(),
            observation.at().unix_secs()
        )
    }

    fn ensure_connected(&mut self) -> Result<&mut TcpStream, SinkError> {
        if self.conn.is_none() {
            let addr = (self.config.host.as_str(), self.config.port);
            let stream = TcpStream::connect(addr)
                .map_err(|err| SinkError::Connect(err.to_string()))?;
            stream
                .set_write_timeout(Some(Duration::from_secs(
                    self.config.connect_timeout_secs,
                )))
                .map_err(|err| SinkError::Connect(err.to_string()))?;

            if self.stats.sent > 0 || self.stats.failed > 0 {
                self.stats.reconnects += 1;
            }
            log::info!(
                "graphite sink connected to {}:{}",
                self.config.host,
                self.config.port
            );
            self.conn = Some(stream);
        }
        // Populated just above when it was None.
        self.conn.as_mut().ok_or(SinkError::NotConnected)
    }
}

impl ObservationSink for GraphiteSink {
    fn emit(&mut self, observation: &Observation) -> Result<(), SinkError> {
        let line = Self::format_line(&self.config.prefix, observation);

        let result = self
            .ensure_connected()
            .and_then(|conn| {
                conn.write_all(line.as_bytes())
                    .map_err(|err| SinkError::Write(err.to_string()))
            });

        match result {
            Ok(()) => {
                self.stats.sent += 1;
                self.stats.bytes_sent += line.len() as u64;
                Ok(())
            }
            Err(err) => {
                // Drop the socket; the next emit reconnects.
                self.conn = None;
                self.stats.failed += 1;
                Err(err)
            }
        }
    }

    fn name(&self) -> &'static str {
        "graphite"
    }
}
