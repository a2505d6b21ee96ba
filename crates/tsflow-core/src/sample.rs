//! The sample record and the empty-sentinel convention.
//!
//! A `Sample` is what flows through an operator chain: a series id, a
//! timestamp, and a typed payload. The payload carries a flag bitset plus a
//! tagged value; a sample whose flag bitset is empty is the *empty sentinel*,
//! an in-band control signal marking a time-bucket boundary and asking
//! stateful operators to flush.

use bitflags::bitflags;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Series identifier assigned by the storage layer.
pub type ParamId = u64;

/// Monotonic time value. Resolution is owned by the storage layer.
pub type Timestamp = u64;

pub const MIN_TIMESTAMP: Timestamp = Timestamp::MIN;
pub const MAX_TIMESTAMP: Timestamp = Timestamp::MAX;

bitflags! {
    /// Payload type bits. An empty bitset marks the empty sentinel.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct PayloadKind: u16 {
        /// Sample carries a meaningful series id (metadata results).
        const PARAMID = 0b0001;
        /// Sample carries a 64-bit float value.
        const FLOAT = 0b0010;
        /// Sample carries an opaque byte range.
        const BLOB = 0b0100;
        /// Sample was elevated by the anomaly detector.
        const URGENT = 0b1000;
    }
}

impl Serialize for PayloadKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.bits().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PayloadKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        u16::deserialize(deserializer).map(PayloadKind::from_bits_truncate)
    }
}

/// Tagged payload value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// No value (sentinels and id-only metadata samples).
    None,
    Float(f64),
    Blob(Vec<u8>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    pub kind: PayloadKind,
    pub value: Value,
}

/// One element of a sample stream.
///
/// Construct through the associated functions below; they keep `kind` and
/// `value` consistent with each other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub paramid: ParamId,
    pub timestamp: Timestamp,
    pub payload: Payload,
}

impl Sample {
    /// The empty sentinel: a bucket boundary at `timestamp`, no series, no
    /// value.
    pub fn sentinel(timestamp: Timestamp) -> Self {
        Self {
            paramid: 0,
            timestamp,
            payload: Payload {
                kind: PayloadKind::empty(),
                value: Value::None,
            },
        }
    }

    /// A float data sample.
    pub fn float(paramid: ParamId, timestamp: Timestamp, value: f64) -> Self {
        Self {
            paramid,
            timestamp,
            payload: Payload {
                kind: PayloadKind::FLOAT,
                value: Value::Float(value),
            },
        }
    }

    /// A blob data sample.
    pub fn blob(paramid: ParamId, timestamp: Timestamp, bytes: Vec<u8>) -> Self {
        Self {
            paramid,
            timestamp,
            payload: Payload {
                kind: PayloadKind::BLOB,
                value: Value::Blob(bytes),
            },
        }
    }

    /// An id-only sample, as produced by metadata queries.
    pub fn ident(paramid: ParamId) -> Self {
        Self {
            paramid,
            timestamp: 0,
            payload: Payload {
                kind: PayloadKind::PARAMID,
                value: Value::None,
            },
        }
    }

    /// True for the empty sentinel. Sentinels are the only samples carrying
    /// no series identity.
    pub fn is_sentinel(&self) -> bool {
        self.payload.kind.is_empty()
    }

    /// The float value, if this sample carries one.
    pub fn float_value(&self) -> Option<f64> {
        if self.payload.kind.contains(PayloadKind::FLOAT) {
            match self.payload.value {
                Value::Float(v) => Some(v),
                _ => None,
            }
        } else {
            None
        }
    }

    pub fn is_urgent(&self) -> bool {
        self.payload.kind.contains(PayloadKind::URGENT)
    }

    /// Ordering key used by operators that restore stream order per bucket.
    pub fn order_key(&self) -> (Timestamp, ParamId) {
        (self.timestamp, self.paramid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_carries_no_identity() {
        let s = Sample::sentinel(42);
        assert!(s.is_sentinel());
        assert_eq!(s.timestamp, 42);
        assert_eq!(s.float_value(), None);
    }

    #[test]
    fn data_samples_are_not_sentinels() {
        assert!(!Sample::float(1, 0, 1.0).is_sentinel());
        assert!(!Sample::blob(1, 0, vec![1, 2]).is_sentinel());
        assert!(!Sample::ident(1).is_sentinel());
    }

    #[test]
    fn payload_kind_roundtrips_through_serde() {
        let kind = PayloadKind::FLOAT | PayloadKind::URGENT;
        let json = serde_json::to_string(&kind).unwrap();
        let back: PayloadKind = serde_json::from_str(&json).unwrap();
        assert_eq!(kind, back);
    }
}
