//! Node builder: JSON descriptions, scalar flexibility, typed errors.

mod common;

use common::collector;
use serde_json::json;
use tsflow_nodes::NodeKind;
use tsflow_query::{BuildError, NodeBuilder};

#[test]
fn builds_each_documented_sampler() {
    let cases = [
        (json!({"name": "reservoir", "size": "1000"}), NodeKind::RandomSampler),
        (json!({"name": "moving-average"}), NodeKind::MovingAverage),
        (json!({"name": "moving-median"}), NodeKind::MovingMedian),
        (
            json!({"name": "frequent-items", "error": "0.01", "portion": "0.1"}),
            NodeKind::SpaceSaver,
        ),
        (
            json!({"name": "heavy-hitters", "error": "0.01", "portion": "0.1"}),
            NodeKind::SpaceSaver,
        ),
        (
            json!({"name": "anomaly-detector", "method": "ewma", "approx": true,
                   "threshold": 0.95, "window": 20, "bits": 10, "hashes": 3}),
            NodeKind::AnomalyDetector,
        ),
    ];

    for (description, expected) in cases {
        let (_, sink) = collector();
        let mut builder = NodeBuilder::new();
        let node = builder
            .make_sampler(&description, sink)
            .unwrap_or_else(|e| panic!("{description}: {e}"));
        assert_eq!(node.lock().unwrap().kind(), expected);
    }
}

#[test]
fn scalars_accept_native_numbers_and_strings() {
    for description in [
        json!({"name": "reservoir", "size": 1000}),
        json!({"name": "reservoir", "size": "1000"}),
        json!({"name": "frequent-items", "error": 0.01, "portion": "0.1"}),
        json!({"name": "anomaly-detector", "method": "sma", "approx": "false",
               "threshold": "0.5", "window": "20"}),
    ] {
        let (_, sink) = collector();
        let mut builder = NodeBuilder::new();
        assert!(builder.make_sampler(&description, sink).is_ok(), "{description}");
    }
}

#[test]
fn unknown_algorithm_is_rejected() {
    let (_, sink) = collector();
    let mut builder = NodeBuilder::new();
    let err = builder
        .make_sampler(&json!({"name": "percentile"}), sink)
        .unwrap_err();
    assert!(matches!(err, BuildError::UnknownAlgorithm(name) if name == "percentile"));
}

#[test]
fn default_reservoir_size_applies_when_omitted() {
    let (_, sink) = collector();
    let mut builder = NodeBuilder::new().with_default_reservoir_size(Some(64));
    let node = builder
        .make_sampler(&json!({"name": "reservoir"}), sink)
        .unwrap();
    assert_eq!(node.lock().unwrap().kind(), NodeKind::RandomSampler);

    // An explicit size still wins over the default.
    let (_, sink) = collector();
    assert!(builder
        .make_sampler(&json!({"name": "reservoir", "size": 8}), sink)
        .is_ok());
}

#[test]
fn missing_param_is_reported_with_the_node_tag() {
    let (_, sink) = collector();
    let mut builder = NodeBuilder::new();
    let err = builder
        .make_sampler(&json!({"name": "reservoir"}), sink)
        .unwrap_err();
    match err {
        BuildError::InvalidDescription { kind, reason } => {
            assert_eq!(kind, NodeKind::RandomSampler);
            assert!(reason.contains("size"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn unparseable_scalar_is_rejected() {
    let (_, sink) = collector();
    let mut builder = NodeBuilder::new();
    let err = builder
        .make_sampler(&json!({"name": "reservoir", "size": "12x"}), sink)
        .unwrap_err();
    assert!(matches!(
        err,
        BuildError::InvalidDescription { kind: NodeKind::RandomSampler, .. }
    ));
}

#[test]
fn out_of_range_space_saving_params_are_rejected() {
    for description in [
        json!({"name": "frequent-items", "error": 0.0, "portion": 0.1}),
        json!({"name": "frequent-items", "error": 0.1, "portion": 1.5}),
    ] {
        let (_, sink) = collector();
        let mut builder = NodeBuilder::new();
        assert!(matches!(
            builder.make_sampler(&description, sink),
            Err(BuildError::InvalidDescription { kind: NodeKind::SpaceSaver, .. })
        ));
    }
}

#[test]
fn holt_winters_is_rejected_as_unimplemented() {
    let (_, sink) = collector();
    let mut builder = NodeBuilder::new();
    let err = builder
        .make_sampler(
            &json!({"name": "anomaly-detector", "method": "double-hw", "approx": false,
                    "threshold": 0.9}),
            sink,
        )
        .unwrap_err();
    assert!(matches!(err, BuildError::Unimplemented(m) if m == "double-hw"));
}

#[test]
fn unknown_forecasting_method_is_rejected() {
    let (_, sink) = collector();
    let mut builder = NodeBuilder::new();
    assert!(matches!(
        builder.make_sampler(
            &json!({"name": "anomaly-detector", "method": "arima", "approx": false,
                    "threshold": 0.9}),
            sink,
        ),
        Err(BuildError::InvalidDescription { kind: NodeKind::AnomalyDetector, .. })
    ));
}

#[test]
fn description_must_be_an_object_with_a_name() {
    let (_, sink) = collector();
    let mut builder = NodeBuilder::new();
    assert!(matches!(
        builder.make_sampler(&json!(["reservoir"]), sink),
        Err(BuildError::NotAnObject)
    ));

    let (_, sink) = collector();
    assert!(matches!(
        builder.make_sampler(&json!({"size": 10}), sink),
        Err(BuildError::MissingName)
    ));
}

#[test]
fn pipeline_is_folded_tail_first() {
    let (_, sink) = collector();
    let mut builder = NodeBuilder::new();
    let head = builder
        .build_pipeline(
            &[
                json!({"name": "reservoir", "size": 8}),
                json!({"name": "moving-average"}),
            ],
            sink,
        )
        .unwrap();
    // The first description is closest to the producer.
    assert_eq!(head.lock().unwrap().kind(), NodeKind::RandomSampler);
}

#[test]
fn filter_factories_wrap_the_chain() {
    let builder = NodeBuilder::new();

    let (_, sink) = collector();
    let single = builder.make_filter_by_id(7, sink);
    assert_eq!(single.lock().unwrap().kind(), NodeKind::FilterById);

    let (_, sink) = collector();
    let include = builder.make_filter_by_id_list(vec![1, 2, 3], sink);
    assert_eq!(include.lock().unwrap().kind(), NodeKind::FilterById);

    let (_, sink) = collector();
    let exclude = builder.make_filter_out_by_id_list(vec![1], sink);
    assert_eq!(exclude.lock().unwrap().kind(), NodeKind::FilterById);
}
