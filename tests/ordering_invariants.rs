//! Ordering & Repair Invariant Tests
//!
//! - Accepted timestamps are strictly increasing per enforced scope
//! - Repair rewrites any non-increasing instant to exactly previous + R
//! - A timestamp column beyond the field count follows the unparsable policy
//! - Worked scenarios for global, per-key and repair ordering

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use tsreplay::ordering::{
    CollectingSink, Decision, DecisionKind, DropReason, NullSink, OrderScope, OrderingConfig,
    OrderingEngine, OrderingState, UnparsablePolicy,
};
use tsreplay::source::Record;
use tsreplay::timestamp::parse_timestamp;

// =============================================================================
// Test Utilities
// =============================================================================

fn engine(config: OrderingConfig) -> OrderingEngine {
    OrderingEngine::new(config, OrderingState::new())
}

/// Runs `lines` through `engine`, returning the forwarded lines.
fn run(engine: &mut OrderingEngine, lines: &[&str]) -> Vec<String> {
    let mut out = Vec::new();
    for (i, line) in lines.iter().enumerate() {
        let mut record = Record::parse(line, ',', i as u64 + 1);
        if engine.process(&mut record, &mut NullSink).is_forwarded() {
            out.push(record.to_line());
        }
    }
    out
}

fn seconds(line: &str) -> f64 {
    let field = line.split(',').next().unwrap();
    parse_timestamp(field).unwrap().instant.seconds()
}

// =============================================================================
// Scenarios
// =============================================================================

#[test]
fn test_scenario_a_global_drop_equal() {
    let mut engine = engine(OrderingConfig::with_scope(OrderScope::Global).drop_equal(true));

    let out = run(&mut engine, &["10", "10", "12", "11", "15"]);

    assert_eq!(out, vec!["10", "12", "15"]);
}

#[test]
fn test_scenario_b_per_key() {
    let mut engine = engine(OrderingConfig::with_scope(OrderScope::PerKey).ts_col(1).key_cols(vec![0]));

    let out = run(&mut engine, &["dev1,10", "dev2,5", "dev1,9"]);

    assert_eq!(out, vec!["dev1,10", "dev2,5"]);
}

#[test]
fn test_scenario_c_repair_reapplies() {
    let mut engine = engine(OrderingConfig::with_scope(OrderScope::Global).repair(1.0));
    let mut sink = CollectingSink::new();

    let mut lines = Vec::new();
    for (i, line) in ["100", "100", "101"].iter().enumerate() {
        let mut record = Record::parse(line, ',', i as u64 + 1);
        let decision = engine.process(&mut record, &mut sink);
        assert!(decision.is_forwarded());
        lines.push(record.to_line());
    }

    assert_eq!(lines, vec!["100", "101", "102"]);
    let repaired = sink.of_kind(DecisionKind::Repaired);
    assert_eq!(repaired.len(), 2);
    assert_eq!(repaired[0].original, "100");
    assert_eq!(repaired[0].rewritten.as_deref(), Some("101"));
}

// =============================================================================
// Properties
// =============================================================================

#[test]
fn test_accepted_sequence_strictly_increasing() {
    let mut rng = StdRng::seed_from_u64(7);
    let lines: Vec<String> = (0..500).map(|_| rng.gen_range(0..50).to_string()).collect();
    let refs: Vec<&str> = lines.iter().map(String::as_str).collect();

    let mut engine = engine(OrderingConfig::with_scope(OrderScope::Global).drop_equal(true));
    let out = run(&mut engine, &refs);

    assert!(!out.is_empty());
    for pair in out.windows(2) {
        assert!(seconds(&pair[0]) < seconds(&pair[1]), "{:?}", pair);
    }
}

#[test]
fn test_ties_allowed_without_drop_equal_but_never_regress() {
    let mut engine = engine(OrderingConfig::with_scope(OrderScope::Global));

    let out = run(&mut engine, &["5", "5", "4", "6", "6"]);

    assert_eq!(out, vec!["5", "5", "6", "6"]);
}

#[test]
fn test_per_key_sequences_strictly_increasing() {
    let mut rng = StdRng::seed_from_u64(99);
    let lines: Vec<String> = (0..400)
        .map(|_| format!("k{},{}", rng.gen_range(0..4), rng.gen_range(0..100)))
        .collect();
    let refs: Vec<&str> = lines.iter().map(String::as_str).collect();

    let mut engine = engine(
        OrderingConfig::with_scope(OrderScope::PerKey)
            .ts_col(1)
            .key_cols(vec![0])
            .drop_equal(true),
    );
    let out = run(&mut engine, &refs);

    for key in ["k0", "k1", "k2", "k3"] {
        let values: Vec<f64> = out
            .iter()
            .filter(|l| l.starts_with(key))
            .map(|l| l.split(',').nth(1).unwrap().parse().unwrap())
            .collect();
        for pair in values.windows(2) {
            assert!(pair[0] < pair[1], "{}: {:?}", key, pair);
        }
    }
}

#[test]
fn test_repair_lands_exactly_on_previous_plus_increment() {
    let mut rng = StdRng::seed_from_u64(3);
    let mut engine = engine(OrderingConfig::with_scope(OrderScope::Global).repair(0.25));
    let mut previous: Option<f64> = None;

    for i in 0..300 {
        let line = format!("{}", rng.gen_range(0..20));
        let incoming = seconds(&line);
        let mut record = Record::parse(&line, ',', i + 1);

        let decision = engine.process(&mut record, &mut NullSink);
        let emitted = seconds(&record.to_line());

        match previous {
            Some(p) if incoming <= p => {
                assert!(matches!(decision, Decision::Rewritten { .. }));
                assert!((emitted - (p + 0.25)).abs() < 1e-9, "{} vs {}", emitted, p);
            }
            _ => assert_eq!(decision, Decision::Accepted),
        }
        previous = Some(emitted);
    }
}

#[test]
fn test_both_scopes_per_key_repair_feeds_global() {
    let mut engine = engine(
        OrderingConfig::with_scope(OrderScope::Both)
            .ts_col(1)
            .key_cols(vec![0])
            .repair(1.0),
    );

    // b's second record repairs to 3 for its key, then passes the global check
    // against 2.5 without a second rewrite.
    let out = run(&mut engine, &["b,2", "a,2.5", "b,1"]);

    assert_eq!(out, vec!["b,2", "a,2.5", "b,3"]);
}

#[test]
fn test_datetime_repair_keeps_notation() {
    let mut engine = engine(OrderingConfig::with_scope(OrderScope::Global).repair(1.0));

    let out = run(
        &mut engine,
        &["2024-01-01T00:00:10Z", "2024-01-01T00:00:05Z"],
    );

    assert_eq!(out[1], "2024-01-01T00:00:11Z");
}

// =============================================================================
// Boundary
// =============================================================================

#[test]
fn test_column_out_of_range_forwarded_by_default() {
    let mut engine = engine(OrderingConfig::with_scope(OrderScope::Global).ts_col(5));
    let mut sink = CollectingSink::new();
    let mut record = Record::parse("1,a", ',', 1);

    let decision = engine.process(&mut record, &mut sink);

    assert_eq!(decision, Decision::ForwardedUnparsable);
    assert_eq!(sink.of_kind(DecisionKind::ForwardedUnparsable).len(), 1);
    assert!(engine.state().last_global().is_none());
}

#[test]
fn test_column_out_of_range_dropped_with_drop_policy() {
    let mut engine = engine(
        OrderingConfig::with_scope(OrderScope::Global)
            .ts_col(5)
            .unparsable(UnparsablePolicy::Drop),
    );
    let mut sink = CollectingSink::new();
    let mut record = Record::parse("1,a", ',', 1);

    let decision = engine.process(&mut record, &mut sink);

    assert_eq!(decision, Decision::Dropped(DropReason::IndexOutOfRange));
    assert_eq!(sink.of_kind(DecisionKind::DroppedIndexError).len(), 1);
}

#[test]
fn test_disabled_scope_forwards_everything() {
    let mut engine = engine(OrderingConfig::default());

    let out = run(&mut engine, &["3", "2", "garbage", "1"]);

    assert_eq!(out, vec!["3", "2", "garbage", "1"]);
}
