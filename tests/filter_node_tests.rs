//! Filter node behavior: id predicates, sentinel passthrough, control
//! signal forwarding.

mod common;

use common::collector;
use std::collections::HashSet;
use tsflow_core::prelude::{Sample, Status};
use tsflow_nodes::filter::FilterByIdNode;
use tsflow_nodes::{Node, NodeKind};

#[test]
fn include_single_id_forwards_only_matches() {
    let (sink, node) = collector();
    let mut filter = FilterByIdNode::new(|id| id == 7, node);

    assert!(filter.put(&Sample::float(7, 1, 1.0)));
    assert!(filter.put(&Sample::float(8, 2, 2.0)));
    assert!(filter.put(&Sample::float(7, 3, 3.0)));

    let sink = sink.lock().unwrap();
    let ids: Vec<u64> = sink.samples().iter().map(|s| s.paramid).collect();
    assert_eq!(ids, vec![7, 7]);
}

#[test]
fn include_set_emits_iff_id_in_set() {
    let (sink, node) = collector();
    let idset: HashSet<u64> = [2, 4].into_iter().collect();
    let mut filter = FilterByIdNode::new(move |id| idset.contains(&id), node);

    for id in 1..=5u64 {
        assert!(filter.put(&Sample::float(id, id, 1.0)));
    }

    let sink = sink.lock().unwrap();
    let ids: Vec<u64> = sink.samples().iter().map(|s| s.paramid).collect();
    assert_eq!(ids, vec![2, 4]);
}

#[test]
fn exclude_set_drops_listed_ids() {
    let (sink, node) = collector();
    let idset: HashSet<u64> = [2, 4].into_iter().collect();
    let mut filter = FilterByIdNode::new(move |id| !idset.contains(&id), node);

    for id in 1..=5u64 {
        assert!(filter.put(&Sample::float(id, id, 1.0)));
    }

    let sink = sink.lock().unwrap();
    let ids: Vec<u64> = sink.samples().iter().map(|s| s.paramid).collect();
    assert_eq!(ids, vec![1, 3, 5]);
}

#[test]
fn sentinels_always_pass() {
    let (sink, node) = collector();
    // Predicate that matches nothing.
    let mut filter = FilterByIdNode::new(|_| false, node);

    assert!(filter.put(&Sample::float(1, 5, 1.0)));
    assert!(filter.put(&Sample::sentinel(10)));

    let sink = sink.lock().unwrap();
    assert_eq!(sink.samples().len(), 1);
    assert!(sink.samples()[0].is_sentinel());
    assert_eq!(sink.samples()[0].timestamp, 10);
}

#[test]
fn control_signals_are_forwarded() {
    let (sink, node) = collector();
    let mut filter = FilterByIdNode::new(|_| true, node);

    filter.set_error(Status::Storage);
    filter.complete();

    let sink = sink.lock().unwrap();
    assert_eq!(sink.status(), Status::Storage);
    assert_eq!(sink.completed(), 1);
}

#[test]
fn kind_tag_is_stable() {
    let (_, node) = collector();
    let filter = FilterByIdNode::new(|_| true, node);
    assert_eq!(filter.kind(), NodeKind::FilterById);
}
