//! Filter node with a series-id predicate.
//!
//! Data samples are forwarded iff the predicate holds for their id. Empty
//! sentinels always pass: they are bucket boundaries, not data, and
//! downstream flush behavior depends on them.

use tsflow_core::prelude::{ParamId, Sample, Status};

use crate::node::{Node, NodeKind, SharedNode};

pub struct FilterByIdNode<P>
where
    P: FnMut(ParamId) -> bool + Send,
{
    predicate: P,
    next: SharedNode,
}

impl<P> FilterByIdNode<P>
where
    P: FnMut(ParamId) -> bool + Send,
{
    pub fn new(predicate: P, next: SharedNode) -> Self {
        Self { predicate, next }
    }
}

impl<P> Node for FilterByIdNode<P>
where
    P: FnMut(ParamId) -> bool + Send,
{
    fn put(&mut self, sample: &Sample) -> bool {
        if sample.is_sentinel() {
            return self.next.lock().unwrap().put(sample);
        }
        if (self.predicate)(sample.paramid) {
            self.next.lock().unwrap().put(sample)
        } else {
            true
        }
    }

    fn complete(&mut self) {
        self.next.lock().unwrap().complete();
    }

    fn set_error(&mut self, status: Status) {
        self.next.lock().unwrap().set_error(status);
    }

    fn kind(&self) -> NodeKind {
        NodeKind::FilterById
    }
}
