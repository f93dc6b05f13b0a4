//! Shared helpers for integration tests.
#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use raven_core::{Observation, ObservationSink, SinkError};

/// Well-formed demand fragment lines with `Multiplier=1`, `Divisor=1000`,
/// so `watts == demand` numerically.
pub fn demand_fragment(timestamp: u32, demand: u32) -> Vec<String> {
    vec![
        "<InstantaneousDemand>".into(),
        format!("<TimeStamp>{timestamp:#x}</TimeStamp>"),
        format!("<Demand>{demand:#x}</Demand>"),
        "<Multiplier>0x1</Multiplier>".into(),
        "<Divisor>0x3e8</Divisor>".into(),
        "</InstantaneousDemand>".into(),
    ]
}

/// Well-formed summation fragment lines with the same unit scaling.
pub fn summation_fragment(timestamp: u32, delivered: u64, received: u64) -> Vec<String> {
    vec![
        "<CurrentSummationDelivered>".into(),
        format!("<TimeStamp>{timestamp:#x}</TimeStamp>"),
        format!("<SummationDelivered>{delivered:#x}</SummationDelivered>"),
        format!("<SummationReceived>{received:#x}</SummationReceived>"),
        "<Multiplier>0x1</Multiplier>".into(),
        "<Divisor>0x3e8</Divisor>".into(),
        "</CurrentSummationDelivered>".into(),
    ]
}

/// Observation log shared between the test body and an attached sink.
#[derive(Clone, Default)]
pub struct ObservationLog(Rc<RefCell<Vec<Observation>>>);

impl ObservationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink that appends every observation to this log.
    pub fn sink(&self) -> RecordingSink {
        RecordingSink { log: self.clone() }
    }

    pub fn snapshot(&self) -> Vec<Observation> {
        self.0.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }
}

pub struct RecordingSink {
    log: ObservationLog,
}

impl ObservationSink for RecordingSink {
    fn emit(&mut self, observation: &Observation) -> Result<(), SinkError> {
        self.log.0.borrow_mut().push(*observation);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}
