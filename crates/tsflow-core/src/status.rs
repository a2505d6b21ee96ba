//! In-band stream status codes.
//!
//! These travel tail-ward through `set_error` and are recorded by the sink;
//! the caller retrieves the latest status after completion.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Ok,
    /// A negative value reached the anomaly detector.
    AnomalyNegativeValue,
    /// Producer-side storage fault.
    Storage,
    /// The caller cancelled the query.
    Aborted,
}

impl Status {
    pub fn is_ok(self) -> bool {
        self == Status::Ok
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Status::Ok => "ok",
            Status::AnomalyNegativeValue => "negative value in anomaly detector",
            Status::Storage => "storage fault",
            Status::Aborted => "aborted",
        };
        f.write_str(s)
    }
}
