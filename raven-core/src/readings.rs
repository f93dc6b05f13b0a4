//! Typed readings and reportable observations
//!
//! ## Overview
//!
//! Two value families flow through the engine:
//!
//! - [`Reading`] — what the decoder produces from one fragment. A tagged
//!   variant, so the reconciler dispatches on kind deterministically instead
//!   of probing for the presence of fields.
//! - [`Observation`] — what the reconciler emits for sinks. Immutable
//!   snapshots handed off by value; sinks never see live reconciliation
//!   state.
//!
//! The demand/summation asymmetry drives the whole design: summations are
//! ground truth but sparse and often re-transmitted verbatim, while demand
//! readings are frequent but only a rate. Observations therefore distinguish
//! authoritative totals ([`Observation::Actual`]), interpolated totals
//! ([`Observation::Estimated`]), and bare rates ([`Observation::RateOnly`]).

use serde::Serialize;

use crate::time::MeterTime;

/// A decoded, physical-unit reading from one fragment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reading {
    /// Instantaneous power draw.
    InstantaneousDemand {
        /// When the bridge sampled it.
        at: MeterTime,
        /// Signed power; negative when local generation feeds back.
        watts: f64,
    },
    /// Authoritative cumulative energy registers.
    CumulativeSummation {
        /// When the bridge sampled it.
        at: MeterTime,
        /// Energy delivered to the premises.
        delivered_wh: f64,
        /// Energy received from the premises (solar back-feed).
        received_wh: f64,
    },
}

impl Reading {
    /// When the reading was sampled.
    pub fn at(&self) -> MeterTime {
        match self {
            Reading::InstantaneousDemand { at, .. } => *at,
            Reading::CumulativeSummation { at, .. } => *at,
        }
    }
}

/// How trustworthy the current anchor is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AnchorBasis {
    /// First-ever authoritative reading; not yet corroborated by a second.
    Stale,
    /// Corroborated by at least one later, distinct authoritative update.
    Fresh,
}

impl AnchorBasis {
    /// Lowercase label for payloads and logs.
    pub const fn as_str(&self) -> &'static str {
        match self {
            AnchorBasis::Stale => "stale",
            AnchorBasis::Fresh => "fresh",
        }
    }
}

/// A reportable output of reconciliation.
///
/// Serializes as a tagged JSON object, e.g.
/// `{"kind":"estimated","total_wh":103.6,"at":"2014-05-07T17:00:00Z","basis":"fresh"}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Observation {
    /// An authoritative meter total.
    Actual {
        /// Net cumulative energy, delivered minus received.
        total_wh: f64,
        /// Timestamp of the underlying summation reading.
        at: MeterTime,
        /// Whether the total has been corroborated yet.
        basis: AnchorBasis,
    },
    /// A best-estimate running total between authoritative updates.
    Estimated {
        /// Anchor total plus linear integration of the current rate.
        total_wh: f64,
        /// Timestamp of the demand reading the estimate extends to.
        at: MeterTime,
        /// Basis of the anchor the estimate rests on.
        basis: AnchorBasis,
    },
    /// An instantaneous rate, reportable even with no anchor yet.
    RateOnly {
        /// Signed power draw.
        watts: f64,
        /// Timestamp of the demand reading.
        at: MeterTime,
    },
}

impl Observation {
    /// Timestamp the observation refers to.
    pub fn at(&self) -> MeterTime {
        match self {
            Observation::Actual { at, .. } => *at,
            Observation::Estimated { at, .. } => *at,
            Observation::RateOnly { at, .. } => *at,
        }
    }

    /// The primary numeric quantity, for metrics backends.
    pub fn value(&self) -> f64 {
        match self {
            Observation::Actual { total_wh, .. } => *total_wh,
            Observation::Estimated { total_wh, .. } => *total_wh,
            Observation::RateOnly { watts, .. } => *watts,
        }
    }

    /// Short kind label, for metric paths and payload routing.
    pub const fn kind(&self) -> &'static str {
        match self {
            Observation::Actual { .. } => "actual",
            Observation::Estimated { .. } => "estimated",
            Observation::RateOnly { .. } => "rate",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn observation_accessors() {
        let at = MeterTime::from_device_secs(451_321_200);
        let obs = Observation::Estimated {
            total_wh: 103.6,
            at,
            basis: AnchorBasis::Fresh,
        };

        assert_eq!(obs.at(), at);
        assert_eq!(obs.value(), 103.6);
        assert_eq!(obs.kind(), "estimated");
    }

    #[test]
    fn observation_serializes_tagged() {
        let obs = Observation::RateOnly {
            watts: -1.0,
            at: MeterTime::from_device_secs(0),
        };
        let json = serde_json::to_value(obs).unwrap();

        assert_eq!(json["kind"], "rate_only");
        assert_eq!(json["watts"], -1.0);
        assert_eq!(json["at"], "2000-01-01T00:00:00Z");
    }

    #[test]
    fn basis_labels() {
        assert_eq!(AnchorBasis::Stale.as_str(), "stale");
        assert_eq!(
            serde_json::to_string(&AnchorBasis::Fresh).unwrap(),
            "\"fresh\""
        );
    }
}
