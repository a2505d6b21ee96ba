//! Space-Saving: reporting thresholds, error bounds, and flush semantics.

mod common;

use common::collector;
use tsflow_core::prelude::{PayloadKind, Sample};
use tsflow_nodes::spacesave::{FrequentItemsNode, HeavyHittersNode};
use tsflow_nodes::Node;

fn count_of(sample: &Sample) -> f64 {
    sample.float_value().expect("reported samples carry counts")
}

#[test]
fn frequent_items_reports_heavy_ids_in_descending_order() {
    let (sink, node) = collector();
    // ε = 0.1 → 10 counters; φ = 0.2.
    let mut saver = FrequentItemsNode::new(0.1, 0.2, node);
    assert_eq!(saver.capacity(), 10);

    let mut ts = 0u64;
    let mut feed = |saver: &mut FrequentItemsNode, id: u64, times: usize| {
        for _ in 0..times {
            ts += 1;
            assert!(saver.put(&Sample::float(id, ts, 1.0)));
        }
    };
    feed(&mut saver, 1, 40);
    feed(&mut saver, 2, 30);
    for id in 3..=12u64 {
        feed(&mut saver, id, 1);
    }
    saver.complete();

    let sink = sink.lock().unwrap();
    let samples = sink.samples();
    // Support is 0.2 · 80 = 16; only ids 1 and 2 clear it.
    assert_eq!(samples.len(), 2);
    assert_eq!(samples[0].paramid, 1);
    assert_eq!(samples[1].paramid, 2);
    assert!(count_of(&samples[0]) >= count_of(&samples[1]));
    // Neither estimate (count − error; error is 0 for early entries) dips
    // below 20.
    assert!(count_of(&samples[0]) >= 20.0);
    assert!(count_of(&samples[1]) >= 20.0);
    // Reported samples are tagged as id-carrying floats.
    for s in samples {
        assert!(s.payload.kind.contains(PayloadKind::PARAMID));
        assert!(s.payload.kind.contains(PayloadKind::FLOAT));
    }
    assert_eq!(sink.completed(), 1);
}

#[test]
fn overcount_is_bounded_by_error_fraction() {
    let (sink, node) = collector();
    // ε = 0.5 → 2 counters, so evictions inflate newcomers.
    let mut saver = FrequentItemsNode::new(0.5, 0.0, node);

    let stream = [1u64, 1, 1, 1, 2, 3, 2];
    let n = stream.len() as f64;
    for (i, id) in stream.into_iter().enumerate() {
        assert!(saver.put(&Sample::float(id, i as u64, 1.0)));
    }
    saver.complete();

    let sink = sink.lock().unwrap();
    let true_counts = [(1u64, 4.0), (2u64, 2.0), (3u64, 1.0)];
    for sample in sink.samples() {
        let truth = true_counts
            .iter()
            .find(|(id, _)| *id == sample.paramid)
            .map(|(_, c)| *c)
            .unwrap();
        assert!(count_of(sample) >= truth);
        assert!(count_of(sample) <= truth + 0.5 * n);
    }
}

#[test]
fn heavy_hitters_weighs_float_values() {
    let (sink, node) = collector();
    let mut saver = HeavyHittersNode::new(0.1, 0.5, node);

    assert!(saver.put(&Sample::float(1, 1, 10.0)));
    assert!(saver.put(&Sample::float(1, 2, 10.0)));
    assert!(saver.put(&Sample::float(2, 3, 1.0)));
    // Non-float samples carry no weight in the weighted variant.
    assert!(saver.put(&Sample::blob(3, 4, vec![1])));
    saver.complete();

    let sink = sink.lock().unwrap();
    // N = 21, support = 10.5: only series 1 (weight 20) clears it.
    assert_eq!(sink.samples().len(), 1);
    assert_eq!(sink.samples()[0].paramid, 1);
    assert_eq!(count_of(&sink.samples()[0]), 20.0);
}

#[test]
fn flush_resets_counters_and_weight() {
    let (sink, node) = collector();
    let mut saver = FrequentItemsNode::new(0.1, 0.5, node);

    for ts in 0..10u64 {
        assert!(saver.put(&Sample::float(1, ts, 1.0)));
    }
    assert!(saver.put(&Sample::sentinel(10)));
    // A fresh bucket: a single sample must clear the support threshold
    // computed from this bucket's weight alone.
    assert!(saver.put(&Sample::float(2, 11, 1.0)));
    assert!(saver.put(&Sample::sentinel(20)));

    let sink = sink.lock().unwrap();
    let ids: Vec<u64> = sink.samples().iter().map(|s| s.paramid).collect();
    assert_eq!(ids, vec![1, 2]);
}

#[test]
fn sentinel_is_consumed_not_forwarded() {
    let (sink, node) = collector();
    let mut saver = FrequentItemsNode::new(0.1, 0.0, node);

    assert!(saver.put(&Sample::float(1, 1, 1.0)));
    assert!(saver.put(&Sample::sentinel(10)));

    let sink = sink.lock().unwrap();
    assert!(sink.samples().iter().all(|s| !s.is_sentinel()));
}
