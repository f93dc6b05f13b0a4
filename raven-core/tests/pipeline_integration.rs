//! End-to-end pipeline runs over scripted bridge traffic.

mod common;

use common::{demand_fragment, summation_fragment, ObservationLog};
use raven_core::{
    AnchorBasis, MemorySource, MeterTime, Observation, Pipeline, SourceError,
};

/// A realistic session: boot noise, a rate before any anchor, the first
/// summation, a verbatim re-transmission, interpolation, one corrupt
/// fragment, a corroborating summation, interpolation from the new anchor.
#[test]
fn scripted_session_produces_expected_observations() {
    let mut lines: Vec<String> = vec![
        "RAVEn bridge v2.0".into(),
        "".into(),
        "status: joined".into(),
    ];
    lines.extend(demand_fragment(1_000, 1_200)); // no anchor yet
    lines.extend(summation_fragment(1_200, 200_000, 0)); // first anchor
    lines.extend(summation_fragment(1_500, 200_000, 0)); // duplicate
    lines.extend(demand_fragment(3_000, 1_200)); // 0.5 h past anchor
    let mut corrupt = demand_fragment(3_010, 1_200);
    corrupt[2] = "<Demand>0xNOTHEX</Demand>".into(); // dropped, pipeline continues
    lines.extend(corrupt);
    lines.extend(summation_fragment(4_800, 200_004, 0)); // corroboration
    lines.extend(demand_fragment(8_400, 2_000)); // 1 h past new anchor

    let log = ObservationLog::new();
    let mut pipeline =
        Pipeline::new(MemorySource::new(lines)).add_sink(Box::new(log.sink()));

    assert!(matches!(pipeline.run(), SourceError::Disconnected));

    let at = MeterTime::from_device_secs;
    assert_eq!(
        log.snapshot(),
        vec![
            Observation::RateOnly {
                watts: 1_200.0,
                at: at(1_000),
            },
            Observation::Actual {
                total_wh: 200_000.0,
                at: at(1_200),
                basis: AnchorBasis::Stale,
            },
            Observation::RateOnly {
                watts: 1_200.0,
                at: at(3_000),
            },
            Observation::Estimated {
                total_wh: 200_000.6,
                at: at(3_000),
                basis: AnchorBasis::Stale,
            },
            Observation::Actual {
                total_wh: 200_004.0,
                at: at(4_800),
                basis: AnchorBasis::Fresh,
            },
            Observation::RateOnly {
                watts: 2_000.0,
                at: at(8_400),
            },
            Observation::Estimated {
                total_wh: 200_006.0,
                at: at(8_400),
                basis: AnchorBasis::Fresh,
            },
        ]
    );

    assert_eq!(pipeline.stats().fragments, 7);
    assert_eq!(pipeline.stats().readings, 6);
    assert_eq!(pipeline.stats().decode_failures, 1);
    assert_eq!(pipeline.stats().observations, 7);
    assert_eq!(pipeline.stats().sink_failures, 0);
    assert_eq!(pipeline.framer_stats().noise_discarded, 3);
}

/// Demand-only traffic never fabricates a total.
#[test]
fn rate_only_session_never_estimates() {
    let mut lines = Vec::new();
    for i in 0..20u32 {
        lines.extend(demand_fragment(1_000 + i * 10, 800 + i));
    }

    let log = ObservationLog::new();
    let mut pipeline =
        Pipeline::new(MemorySource::new(lines)).add_sink(Box::new(log.sink()));
    pipeline.run();

    assert_eq!(log.len(), 20);
    assert!(log
        .snapshot()
        .iter()
        .all(|obs| matches!(obs, Observation::RateOnly { .. })));
    assert!(!pipeline.reconciler().has_anchor());
}

/// The decoder never sees partial markup, even when the stream dies
/// mid-fragment.
#[test]
fn no_partial_fragment_ever_reaches_the_decoder() {
    // Close tag never arrives: the only outcome is the source error, with
    // nothing emitted and nothing counted as a fragment.
    let lines = vec![
        "<CurrentSummationDelivered>".to_string(),
        "<TimeStamp>0x1000</TimeStamp>".to_string(),
    ];

    let log = ObservationLog::new();
    let mut pipeline =
        Pipeline::new(MemorySource::new(lines)).add_sink(Box::new(log.sink()));

    assert!(matches!(pipeline.run(), SourceError::Disconnected));
    assert_eq!(pipeline.stats().fragments, 0);
    assert_eq!(log.len(), 0);
}
