//! Reading reconstruction and reconciliation for RAVEn smart-meter bridges
//!
//! Turns the line-oriented text protocol of a home energy monitor into
//! typed, scaled readings, and fuses them into a best-estimate running
//! energy total.
//!
//! ```text
//! LineSource → Framer → decode() → Reconciler → ObservationSink(s)
//! ```
//!
//! - The framer extracts complete protocol fragments from an unbounded line
//!   stream with no fixed message length — only textual tag boundaries.
//! - The decoder maps one fragment to one [`Reading`], hex-decoding and
//!   scaling fields and correcting the two's-complement wraparound that
//!   solar back-feed produces in the demand register.
//! - The reconciler fuses sparse authoritative cumulative readings with
//!   frequent instantaneous rates into [`Observation`]s.
//!
//! Transports live elsewhere: serial ports, brokers, and metrics backends
//! sit behind the [`LineSource`] and [`ObservationSink`] seams.
//!
//! ```
//! use raven_core::{decode, Framer, MemorySource, Reading};
//!
//! let source = MemorySource::new([
//!     "bridge boot banner",
//!     "<InstantaneousDemand>",
//!     "<TimeStamp>0x1b9d86a0</TimeStamp>",
//!     "<Demand>0x498</Demand>",
//!     "<Multiplier>0x1</Multiplier>",
//!     "<Divisor>0x3e8</Divisor>",
//!     "</InstantaneousDemand>",
//! ]);
//!
//! let mut framer = Framer::new(source);
//! let fragment = framer.next_fragment().unwrap();
//! match decode(&fragment).unwrap() {
//!     Reading::InstantaneousDemand { watts, .. } => assert_eq!(watts, 1176.0),
//!     other => panic!("unexpected reading: {other:?}"),
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod decode;
pub mod errors;
pub mod frame;
pub mod pipeline;
pub mod readings;
pub mod reconcile;
pub mod source;
pub mod time;

// Public API
pub use decode::decode;
pub use errors::{DecodeError, SinkError, SourceError};
pub use frame::{FragmentTag, Framer, FramerStats, RawFragment};
pub use pipeline::{ObservationSink, Pipeline, PipelineStats};
pub use readings::{AnchorBasis, Observation, Reading};
pub use reconcile::{Anchor, ObservationBurst, Reconciler, MAX_OBSERVATIONS_PER_READING};
pub use source::{LineSource, MemorySource, ReaderSource};
pub use time::MeterTime;

/// Crate version, for sink announcements and user agents.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
