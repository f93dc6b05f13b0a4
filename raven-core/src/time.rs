//! Device timestamp handling
//!
//! The bridge reports time as whole seconds elapsed since its own epoch,
//! 2000-01-01T00:00:00Z, encoded as a hex field in each fragment. Two
//! consumers need two different shapes of that value:
//!
//! - Reconciliation does elapsed-time arithmetic and needs the raw counter,
//!   exactly as transmitted (no timezone, no sub-second noise).
//! - Sinks and logs need a wall-clock UTC instant.
//!
//! [`MeterTime`] carries the raw counter and derives the UTC instant on
//! demand, so converting back to device seconds is always lossless.

use core::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};

/// Unix timestamp of the device epoch, 2000-01-01T00:00:00Z.
pub const DEVICE_EPOCH_UNIX: i64 = 946_684_800;

/// An instant as reported by the meter bridge.
///
/// Ordering follows the raw counter, so later readings compare greater.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MeterTime(u32);

impl MeterTime {
    /// Wrap a raw seconds-since-2000 counter value.
    pub const fn from_device_secs(secs: u32) -> Self {
        Self(secs)
    }

    /// The raw counter, seconds since 2000-01-01T00:00:00Z.
    pub const fn device_secs(&self) -> u32 {
        self.0
    }

    /// Seconds since the Unix epoch.
    pub const fn unix_secs(&self) -> i64 {
        DEVICE_EPOCH_UNIX + self.0 as i64
    }

    /// The corresponding UTC instant.
    pub fn utc(&self) -> DateTime<Utc> {
        // Device counters top out well inside chrono's representable range.
        DateTime::from_timestamp(self.unix_secs(), 0).unwrap_or_default()
    }

    /// RFC 3339 rendering with a trailing `Z`, second precision.
    pub fn iso8601(&self) -> String {
        self.utc().to_rfc3339_opts(SecondsFormat::Secs, true)
    }

    /// Signed seconds elapsed since `earlier`.
    ///
    /// Negative when `self` precedes `earlier` (a device clock step backwards);
    /// callers decide what a negative interval means.
    pub const fn secs_since(&self, earlier: MeterTime) -> i64 {
        self.0 as i64 - earlier.0 as i64
    }
}

impl fmt::Display for MeterTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.iso8601())
    }
}

impl Serialize for MeterTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.iso8601())
    }
}
