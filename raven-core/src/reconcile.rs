//! Reconciliation of sparse totals with frequent rates
//!
//! ## Overview
//!
//! The meter speaks two dialects at two very different cadences:
//!
//! - `CurrentSummationDelivered` — the authoritative cumulative registers,
//!   every few minutes, frequently re-transmitted verbatim in between.
//! - `InstantaneousDemand` — the current rate, every few seconds.
//!
//! The [`Reconciler`] fuses them into a single best-estimate running total:
//! authoritative readings become the *anchor*, and between anchors each
//! demand reading extends the anchor by linear integration of its rate.
//!
//! ```text
//! summation ──→ anchor ──┬─→ Actual
//!                        │
//! demand ────────────────┴─→ RateOnly (+ Estimated, once anchored)
//! ```
//!
//! Three rules keep the estimate honest:
//!
//! 1. **No fabricated totals.** Until the first summation arrives, demand
//!    readings yield only the rate.
//! 2. **Duplicates are not news.** A summation whose net total equals the
//!    anchor is the device repeating itself; it changes nothing and emits
//!    nothing.
//! 3. **Elapsed time is measured from the anchor**, never from the previous
//!    demand sample, so interpolation error stays relative to ground truth
//!    instead of accumulating across samples. (Deliberate design decision —
//!    earlier revisions of this logic disagreed with themselves about the
//!    base; see DESIGN.md.)
//!
//! The first-ever anchor is labeled *stale* until a second, distinct
//! summation corroborates it, letting consumers discount early estimates.
//! After a restart the state is empty again, so the first post-restart
//! summation is always "possibly stale".

use crate::readings::{AnchorBasis, Observation, Reading};
use crate::time::MeterTime;

/// A reading yields at most a rate observation plus an estimate.
pub const MAX_OBSERVATIONS_PER_READING: usize = 2;

/// Bounded burst of observations produced by one reading.
pub type ObservationBurst = heapless::Vec<Observation, MAX_OBSERVATIONS_PER_READING>;

/// The most recent authoritative cumulative reading.
///
/// Holding total, timestamp, and basis in one struct makes the "anchored iff
/// all fields populated" invariant structural: the reconciler either has a
/// complete anchor or none at all.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchor {
    total_wh: f64,
    at: MeterTime,
    basis: AnchorBasis,
}

impl Anchor {
    /// Net cumulative energy at the anchor, delivered minus received.
    pub fn total_wh(&self) -> f64 {
        self.total_wh
    }

    /// When the anchoring summation was sampled.
    pub fn at(&self) -> MeterTime {
        self.at
    }

    /// Whether the anchor has been corroborated.
    pub fn basis(&self) -> AnchorBasis {
        self.basis
    }
}

/// The reconciliation state machine.
///
/// Constructed once per process, advanced once per reading, exclusively
/// owned. State never regresses: once anchored, always anchored. Emitted
/// observations are value snapshots; sinks never alias live state.
#[derive(Debug, Default)]
pub struct Reconciler {
    anchor: Option<Anchor>,
}

impl Reconciler {
    /// Fresh state with no anchor.
    pub fn new() -> Self {
        Self::default()
    }

    /// The current anchor, if any summation has ever been adopted.
    pub fn anchor(&self) -> Option<&Anchor> {
        self.anchor.as_ref()
    }

    /// Whether an authoritative reading has ever been received.
    pub fn has_anchor(&self) -> bool {
        self.anchor.is_some()
    }

    /// Advance the state machine by one reading.
    ///
    /// Returns the observations to report for it, in emission order: for a
    /// demand reading the rate always comes first, followed by the estimate
    /// when an anchor exists.
    pub fn advance(&mut self, reading: Reading) -> ObservationBurst {
        let mut out = ObservationBurst::new();

        match reading {
            Reading::CumulativeSummation {
                at,
                delivered_wh,
                received_wh,
            } => {
                let proposed = delivered_wh - received_wh;
                match self.anchor {
                    None => {
                        // First-ever authoritative reading: adopt verbatim,
                        // but nothing corroborates it yet.
                        log::debug!("adopting first anchor {proposed} Wh at {at}");
                        self.anchor = Some(Anchor {
                            total_wh: proposed,
                            at,
                            basis: AnchorBasis::Stale,
                        });
                        let _ = out.push(Observation::Actual {
                            total_wh: proposed,
                            at,
                            basis: AnchorBasis::Stale,
                        });
                    }
                    Some(anchor) if anchor.total_wh == proposed => {
                        // The device re-transmits the same summation between
                        // rare updates; a repeat is not new information.
                        log::debug!("duplicate summation {proposed} Wh suppressed");
                    }
                    Some(_) => {
                        log::debug!("anchor updated to {proposed} Wh at {at}");
                        self.anchor = Some(Anchor {
                            total_wh: proposed,
                            at,
                            basis: AnchorBasis::Fresh,
                        });
                        let _ = out.push(Observation::Actual {
                            total_wh: proposed,
                            at,
                            basis: AnchorBasis::Fresh,
                        });
                    }
                }
            }
            Reading::InstantaneousDemand { at, watts } => {
                // The rate itself is always reportable.
                let _ = out.push(Observation::RateOnly { watts, at });

                if let Some(anchor) = self.anchor {
                    let elapsed_hours = at.secs_since(anchor.at()) as f64 / 3600.0;
                    let total_wh = anchor.total_wh() + elapsed_hours * watts / 1000.0;
                    let _ = out.push(Observation::Estimated {
                        total_wh,
                        at,
                        basis: anchor.basis(),
                    });
                }
            }
        }

        out
    }
}
