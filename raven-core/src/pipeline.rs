//! The sequential reading pipeline
//!
//! ## Overview
//!
//! One fragment at a time, strictly in order:
//!
//! ```text
//! LineSource → Framer → decode() → Reconciler → sinks
//! ```
//!
//! There is no pipelining and no parallelism — throughput is bounded by a
//! low-bit-rate serial link with seconds between readings, so the only
//! suspension point is the blocking read inside the framer.
//!
//! ## Error containment
//!
//! - A fragment that fails to decode is logged and dropped; the loop resumes
//!   framing. Reconciliation state is untouched.
//! - A sink that fails to deliver is logged and counted; remaining sinks
//!   still receive the observation, and the reconciler never notices.
//! - Only [`SourceError`] ends the loop: the stream is gone, and whether to
//!   reconnect or exit is the caller's policy.

use crate::decode::decode;
use crate::errors::{SinkError, SourceError};
use crate::frame::{Framer, FramerStats};
use crate::readings::Observation;
use crate::reconcile::Reconciler;
use crate::source::LineSource;

/// A consumer of reconciled observations.
///
/// Implementations own their transport entirely; the pipeline only logs and
/// counts their failures. Observations arrive by value-snapshot reference —
/// there is no live state behind them to share.
pub trait ObservationSink {
    /// Deliver one observation.
    fn emit(&mut self, observation: &Observation) -> Result<(), SinkError>;

    /// Short adapter name for logs and stats.
    fn name(&self) -> &'static str;
}

/// Pipeline counters.
#[derive(Debug, Default, Clone)]
pub struct PipelineStats {
    /// Complete fragments framed.
    pub fragments: usize,
    /// Fragments successfully decoded into readings.
    pub readings: usize,
    /// Fragments dropped by the decoder.
    pub decode_failures: usize,
    /// Observations emitted to sinks (per observation, not per sink).
    pub observations: usize,
    /// Individual sink delivery failures.
    pub sink_failures: usize,
}

/// Framer → decoder → reconciler → sinks, one fragment per iteration.
pub struct Pipeline<S> {
    framer: Framer<S>,
    reconciler: Reconciler,
    sinks: Vec<Box<dyn ObservationSink>>,
    stats: PipelineStats,
}

impl<S: LineSource> Pipeline<S> {
    /// Build a pipeline over a line source, with no sinks yet.
    pub fn new(source: S) -> Self {
        Self {
            framer: Framer::new(source),
            reconciler: Reconciler::new(),
            sinks: Vec::new(),
            stats: PipelineStats::default(),
        }
    }

    /// Attach a sink. Sinks receive every observation in attachment order.
    pub fn add_sink(mut self, sink: Box<dyn ObservationSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Pipeline counters so far.
    pub fn stats(&self) -> &PipelineStats {
        &self.stats
    }

    /// Framing counters so far.
    pub fn framer_stats(&self) -> &FramerStats {
        self.framer.stats()
    }

    /// The reconciliation state, read-only.
    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    /// Process exactly one fragment.
    ///
    /// `Ok` whether or not the fragment decoded — decode failures are
    /// recovered here. `Err` only when the line source is done.
    pub fn step(&mut self) -> Result<(), SourceError> {
        let fragment = self.framer.next_fragment()?;
        self.stats.fragments += 1;

        let reading = match decode(&fragment) {
            Ok(reading) => reading,
            Err(err) => {
                self.stats.decode_failures += 1;
                log::warn!("dropping {} fragment: {err}", fragment.tag().name());
                return Ok(());
            }
        };
        self.stats.readings += 1;

        for observation in self.reconciler.advance(reading) {
            self.stats.observations += 1;
            for sink in &mut self.sinks {
                if let Err(err) = sink.emit(&observation) {
                    self.stats.sink_failures += 1;
                    log::error!("sink {} failed: {err}", sink.name());
                }
            }
        }

        Ok(())
    }

    /// Run until the line source fails; returns the terminal error.
    pub fn run(&mut self) -> SourceError {
        loop {
            if let Err(err) = self.step() {
                log::info!(
                    "pipeline stopping after {} fragments ({} readings, {} decode failures)",
                    self.stats.fragments,
                    self.stats.readings,
                    self.stats.decode_failures,
                );
                return err;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;

    /// Records everything; optionally fails every emit.
    struct RecordingSink {
        observations: std::rc::Rc<std::cell::RefCell<Vec<Observation>>>,
        fail: bool,
    }

    impl ObservationSink for RecordingSink {
        fn emit(&mut self, observation: &Observation) -> Result<(), SinkError> {
            if self.fail {
                return Err(SinkError::NotConnected);
            }
            self.observations.borrow_mut().push(*observation);
            Ok(())
        }

        fn name(&self) -> &'static str {
            "recording"
        }
    }

    fn demand_fragment(timestamp: &str, demand: &str) -> Vec<String> {
        vec![
            "<InstantaneousDemand>".into(),
            format!("<TimeStamp>{timestamp}</TimeStamp>"),
            format!("<Demand>{demand}</Demand>"),
            "<Multiplier>0x1</Multiplier>".into(),
            "<Divisor>0x3e8</Divisor>".into(),
            "</InstantaneousDemand>".into(),
        ]
    }

    #[test]
    fn decode_failure_does_not_stop_the_pipeline() {
        let mut lines = demand_fragment("0x1000", "0xZZ"); // bad hex: dropped
        lines.extend(demand_fragment("0x1010", "0x498"));

        let observations = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let mut pipeline = Pipeline::new(MemorySource::new(lines)).add_sink(Box::new(
            RecordingSink {
                observations: observations.clone(),
                fail: false,
            },
        ));

        pipeline.step().unwrap();
        pipeline.step().unwrap();

        assert_eq!(pipeline.stats().fragments, 2);
        assert_eq!(pipeline.stats().decode_failures, 1);
        assert_eq!(pipeline.stats().readings, 1);
        assert_eq!(observations.borrow().len(), 1);
    }

    #[test]
    fn sink_failure_is_contained() {
        let lines = demand_fragment("0x1000", "0x498");
        let observations = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));

        let mut pipeline = Pipeline::new(MemorySource::new(lines))
            .add_sink(Box::new(RecordingSink {
                observations: observations.clone(),
                fail: true,
            }))
            .add_sink(Box::new(RecordingSink {
                observations: observations.clone(),
                fail: false,
            }));

        pipeline.step().unwrap();

        // The failing sink is counted; the healthy one still delivered.
        assert_eq!(pipeline.stats().sink_failures, 1);
        assert_eq!(observations.borrow().len(), 1);
    }

    #[test]
    fn run_returns_the_terminal_source_error() {
        let mut pipeline: Pipeline<MemorySource> = Pipeline::new(MemorySource::new(["noise"]));
        assert!(matches!(pipeline.run(), SourceError::Disconnected));
    }
}
