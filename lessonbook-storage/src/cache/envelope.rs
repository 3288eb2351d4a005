//! Timestamped cache envelopes and their validation.
//!
//! Everything read back from the store goes through [`EnvelopeRead::parse`],
//! which either yields a fully validated envelope or a [`CorruptReason`].
//! Call sites branch on that result instead of probing fields themselves.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

/// Stored wrapper around a cached payload.
///
/// Serialized as `{"timestamp": <ms since epoch>, "payload": <value>}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEnvelope<T> {
    /// Capture instant, milliseconds since the Unix epoch.
    pub timestamp: u64,
    pub payload: T,
}

impl<T> CacheEnvelope<T> {
    /// Wrap `payload` captured at `cached_at`. Pre-epoch instants clamp to 0.
    pub fn new(payload: T, cached_at: DateTime<Utc>) -> Self {
        Self {
            timestamp: u64::try_from(cached_at.timestamp_millis()).unwrap_or(0),
            payload,
        }
    }

    pub fn cached_at(&self) -> DateTime<Utc> {
        i64::try_from(self.timestamp)
            .ok()
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Age of the envelope at `now`. Envelopes stamped after `now` are age zero.
    pub fn age_at(&self, now: DateTime<Utc>) -> Duration {
        now.signed_duration_since(self.cached_at())
            .to_std()
            .unwrap_or(Duration::ZERO)
    }

    /// Fresh means strictly younger than `window`.
    pub fn is_fresh_at(&self, now: DateTime<Utc>, window: Duration) -> bool {
        self.age_at(now) < window
    }

    pub fn into_payload(self) -> T {
        self.payload
    }
}

impl<T: Serialize> CacheEnvelope<T> {
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Why a stored value was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorruptReason {
    NotJson,
    NotAnObject,
    MissingTimestamp,
    InvalidTimestamp,
    MissingPayload,
    PayloadMismatch(String),
}

impl fmt::Display for CorruptReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotJson => f.write_str("value is not JSON"),
            Self::NotAnObject => f.write_str("value is not a JSON object"),
            Self::MissingTimestamp => f.write_str("timestamp missing"),
            Self::InvalidTimestamp => f.write_str("timestamp is not a non-negative integer"),
            Self::MissingPayload => f.write_str("payload missing"),
            Self::PayloadMismatch(e) => write!(f, "payload has unexpected shape: {}", e),
        }
    }
}

/// Outcome of validating a raw stored value.
#[derive(Debug, Clone, PartialEq)]
pub enum EnvelopeRead<T> {
    Valid(CacheEnvelope<T>),
    Corrupt(CorruptReason),
}

impl<T: DeserializeOwned> EnvelopeRead<T> {
    /// Validate a raw stored string. Never panics.
    pub fn parse(raw: &str) -> Self {
        let value: Value = match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(_) => return Self::Corrupt(CorruptReason::NotJson),
        };
        let Value::Object(mut fields) = value else {
            return Self::Corrupt(CorruptReason::NotAnObject);
        };

        let timestamp = match fields.get("timestamp") {
            None | Some(Value::Null) => return Self::Corrupt(CorruptReason::MissingTimestamp),
            Some(raw) => match raw.as_u64() {
                Some(ms) if within_chrono_range(ms) => ms,
                _ => return Self::Corrupt(CorruptReason::InvalidTimestamp),
            },
        };

        let payload = match fields.remove("payload") {
            None | Some(Value::Null) => return Self::Corrupt(CorruptReason::MissingPayload),
            Some(payload) => payload,
        };

        match serde_json::from_value(payload) {
            Ok(payload) => Self::Valid(CacheEnvelope { timestamp, payload }),
            Err(e) => Self::Corrupt(CorruptReason::PayloadMismatch(e.to_string())),
        }
    }
}

fn within_chrono_range(ms: u64) -> bool {
    i64::try_from(ms)
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .is_some()
}

/// A cache hit, carrying when the value was captured.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheRead<T> {
    value: T,
    cached_at: DateTime<Utc>,
}

impl<T> CacheRead<T> {
    pub fn new(value: T, cached_at: DateTime<Utc>) -> Self {
        Self { value, cached_at }
    }

    pub fn into_value(self) -> T {
        self.value
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn cached_at(&self) -> DateTime<Utc> {
        self.cached_at
    }

    /// How old the value was at `now`.
    pub fn staleness_at(&self, now: DateTime<Utc>) -> Duration {
        now.signed_duration_since(self.cached_at)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }
}

impl<T> From<CacheEnvelope<T>> for CacheRead<T> {
    fn from(envelope: CacheEnvelope<T>) -> Self {
        let cached_at = envelope.cached_at();
        Self::new(envelope.payload, cached_at)
    }
}
