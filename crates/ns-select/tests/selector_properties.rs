//! Counting behaviour of the selector: aggregate cuts never count their
//! members, totals track calls exactly, declared categories always report,
//! and unit weights keep weighted and unweighted counters equal.

use approx::assert_relative_eq;
use ns_core::FieldMap;
use ns_select::{CutRegistry, SchemeRegistry, SelectWarning, Selector};

fn ev(pairs: &[(&str, f64)]) -> FieldMap {
    pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

fn field(e: &FieldMap, name: &str) -> f64 {
    e.get(name).copied().unwrap_or(f64::NAN)
}

/// Cuts `["ptCut", "massCut", "all"]` and scheme `splitMET` (2 categories,
/// threshold 180 on `met`).
fn selector() -> Selector<FieldMap> {
    let mut cuts = CutRegistry::new();
    cuts.add_atomic("ptCut", |e: &FieldMap| field(e, "pt") > 25.0).unwrap();
    cuts.add_atomic("massCut", |e: &FieldMap| {
        let m = field(e, "m");
        m > 105.0 && m < 160.0
    })
    .unwrap();
    cuts.add_all_cuts("all").unwrap();

    let mut schemes = SchemeRegistry::new();
    schemes.add_thresholds("splitMET", &[180.0], |e: &FieldMap| field(e, "met")).unwrap();
    schemes.add("unused", 3, |_: &FieldMap| Some(0)).unwrap();
    Selector::new(cuts, schemes)
}

/// Event 1 passes both atomic cuts, event 2 fails `ptCut` only, event 3
/// fails `massCut` only.
fn scenario_a_events() -> Vec<FieldMap> {
    vec![
        ev(&[("pt", 40.0), ("m", 125.0)]),
        ev(&[("pt", 10.0), ("m", 125.0)]),
        ev(&[("pt", 40.0), ("m", 200.0)]),
    ]
}

#[test]
fn aggregate_does_not_touch_atomic_counters() {
    let mut sel = selector();
    let all = sel.cut_id("all").unwrap();
    for e in scenario_a_events() {
        sel.load(e);
        sel.passes(all);
    }
    assert_eq!(sel.total_events("all"), 3);
    assert_eq!(sel.passing_events("all"), 1);
    for atomic in ["ptCut", "massCut"] {
        assert_eq!(sel.total_events(atomic), 0, "{atomic} counted by aggregate");
        assert_eq!(sel.passing_events(atomic), 0);
    }
}

#[test]
fn scenario_a_direct_evaluation() {
    let mut sel = selector();
    for e in scenario_a_events() {
        sel.load(e);
        for cut in ["ptCut", "massCut", "all"] {
            sel.passes_cut_named(cut, 1.0);
        }
    }
    assert_eq!((sel.passing_events("ptCut"), sel.total_events("ptCut")), (2, 3));
    assert_eq!((sel.passing_events("massCut"), sel.total_events("massCut")), (2, 3));
    assert_eq!((sel.passing_events("all"), sel.total_events("all")), (1, 3));
    assert_eq!(sel.cutflow(false).to_string(), "ptCut\t2/3\nmassCut\t2/3\nall\t1/3\n");
}

#[test]
fn aggregate_increments_own_counters_by_one_per_call() {
    let mut sel = selector();
    let all = sel.cut_id("all").unwrap();
    for (i, e) in scenario_a_events().into_iter().enumerate() {
        sel.load(e);
        let before = sel.counters().cut(all);
        let passed = sel.passes(all);
        let after = sel.counters().cut(all);
        assert_eq!(after.total, before.total + 1, "event {i}");
        assert_eq!(after.pass, before.pass + u64::from(passed), "event {i}");
    }
}

#[test]
fn totals_are_monotonic_after_reset() {
    let mut sel = selector();
    sel.load(ev(&[("pt", 40.0), ("m", 125.0)]));
    sel.passes_cut_named("ptCut", 1.0);
    sel.reset();
    assert_eq!(sel.total_events("ptCut"), 0);

    let pts = [30.0, 5.0, 26.0, 25.0, 100.0, -3.0, 0.0];
    for (n, pt) in pts.iter().enumerate() {
        sel.load(ev(&[("pt", *pt), ("m", 125.0)]));
        sel.passes_cut_named("ptCut", 1.0);
        assert_eq!(sel.total_events("ptCut"), n as u64 + 1);
        assert!(sel.passing_events("ptCut") <= sel.total_events("ptCut"));
    }
    assert_eq!(sel.passing_events("ptCut"), 3);
}

#[test]
fn reset_keeps_registries_and_event() {
    let mut sel = selector();
    sel.load(ev(&[("pt", 40.0), ("m", 125.0), ("met", 200.0)]));
    sel.passes_cut_named("all", 2.0);
    sel.classify_named("splitMET", 2.0);
    sel.reset();
    assert_eq!(sel.cut_names(), vec!["ptCut", "massCut", "all"]);
    assert!(sel.event().is_some());
    assert_eq!(sel.total_events_weighted("all"), 0.0);
    assert_eq!(sel.category_events("splitMET", 0), 0);
    assert!(sel.passes_cut_named("all", 1.0));
}

#[test]
fn every_declared_category_is_zero_before_any_event() {
    let sel = selector();
    for (scheme, n) in [("splitMET", 2), ("unused", 3)] {
        for i in 0..n {
            assert_eq!(sel.category_events(scheme, i), 0);
            assert_eq!(sel.category_events_weighted(scheme, i), 0.0);
        }
    }
    assert!(sel.warnings().is_empty());
    assert_eq!(sel.categorization(false).to_string(), "splitMET\t0 0\nunused\t0 0 0\n");
}

#[test]
fn rendering_is_idempotent() {
    let mut sel = selector();
    for e in scenario_a_events() {
        sel.load(e);
        sel.passes_cut_named("all", 0.5);
    }
    let first = sel.cutflow(true);
    let second = sel.cutflow(true);
    assert_eq!(first, second);
    assert_eq!(first.to_string(), second.to_string());
    assert_eq!(sel.categorization(false), sel.categorization(false));
}

#[test]
fn unit_weights_keep_weighted_and_unweighted_equal() {
    let mut sel = selector();
    let events = [
        ev(&[("pt", 40.0), ("m", 125.0), ("met", 200.0)]),
        ev(&[("pt", 40.0), ("m", 130.0), ("met", 20.0)]),
        ev(&[("pt", 10.0), ("m", 130.0), ("met", 20.0)]),
    ];
    let all = sel.cut_id("all").unwrap();
    let split = sel.scheme_id("splitMET").unwrap();
    for e in events {
        sel.load(e);
        // Explicit 1.0 and the default form go through the same path.
        sel.passes_cut_named("ptCut", 1.0);
        if sel.passes(all) {
            sel.classify_default(split);
        }
        let unweighted = sel.cutflow(false);
        let weighted = sel.cutflow(true);
        assert_eq!(unweighted.rows, weighted.rows);
        assert_eq!(sel.categorization(false).rows, sel.categorization(true).rows);
    }
}

#[test]
fn weighted_counters_sum_weights() {
    let mut sel = selector();
    let weights = [0.25, 1.5, 2.0];
    for (e, w) in scenario_a_events().into_iter().zip(weights) {
        sel.load(e);
        sel.passes_cut_named("all", w);
    }
    assert_relative_eq!(sel.total_events_weighted("all"), 3.75);
    assert_relative_eq!(sel.passing_events_weighted("all"), 0.25);
    assert_eq!(sel.cutflow(true).to_string(), "ptCut\t0/0\nmassCut\t0/0\nall\t0.25/3.75\n");
}

#[test]
fn scenario_b_split_met() {
    let mut sel = selector();
    sel.load(ev(&[("met", 200.0)]));
    assert_eq!(sel.classify_named("splitMET", 1.0), Some(0));
    sel.load(ev(&[("met", 50.0)]));
    assert_eq!(sel.classify_named("splitMET", 1.0), Some(1));
    assert_eq!(sel.category_events("splitMET", 0), 1);
    assert_eq!(sel.category_events("splitMET", 1), 1);
}

#[test]
fn scenario_c_unknown_scheme_is_soft() {
    let sel = selector();
    assert_eq!(sel.category_events("undefinedScheme", 0), 0);
    assert_eq!(sel.category_events_weighted("undefinedScheme", 0), 0.0);
    assert_eq!(
        sel.warnings(),
        vec![SelectWarning::UnknownScheme("undefinedScheme".into()); 2]
    );
}

#[test]
fn unclassifiable_event_leaves_counters_alone() {
    let mut sel = selector();
    sel.load(ev(&[("pt", 40.0)]));
    assert_eq!(sel.classify_named("splitMET", 1.0), None);
    assert_eq!(sel.categorization(false).to_string().lines().next(), Some("splitMET\t0 0"));
    assert_eq!(
        sel.take_warnings(),
        vec![SelectWarning::Unclassifiable { scheme: "splitMET".into() }]
    );
}

#[test]
fn existence_predicates_have_the_obvious_polarity() {
    let mut sel = selector();
    assert!(sel.has_cut("ptCut"));
    assert!(sel.has_cut("all"));
    assert!(!sel.has_cut("ptcut"));
    assert!(sel.has_scheme("splitMET"));
    assert!(!sel.has_scheme("undefinedScheme"));

    // Registered names never warn; unknown names always do.
    sel.load(ev(&[("pt", 40.0), ("m", 125.0)]));
    assert!(sel.passes_cut_named("ptCut", 1.0));
    sel.total_events("massCut");
    assert!(sel.warnings().is_empty());

    assert!(!sel.passes_cut_named("ptCutt", 1.0));
    assert_eq!(sel.total_events("ptCutt"), 0);
    assert_eq!(sel.passing_events_weighted("ptCutt"), 0.0);
    assert_eq!(sel.take_warnings(), vec![SelectWarning::UnknownCut("ptCutt".into()); 3]);
    assert_eq!(sel.total_events("ptCut"), 1);
}
