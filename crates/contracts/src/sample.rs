//! Sample types - LineParser output and Dispatcher payloads

use serde::{Deserialize, Serialize};

use crate::ContractError;

/// Key carrying the device's boot-relative millisecond counter
pub const TIME_KEY: &str = "time";

/// Parsed `key:value` line
///
/// Keeps the raw value text; numeric interpretation happens lazily, at translation
/// (for `time`) or dispatch (for every other key). A repeated key overwrites the earlier
/// value but keeps the position of its first occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedSample {
    entries: Vec<(String, String)>,
}

impl ParsedSample {
    /// Create empty sample
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, replacing any previous value for the same key
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Raw value text for a key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Number of distinct keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate all `(key, raw value)` pairs in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Whether the sample carries a `time` field
    pub fn has_time(&self) -> bool {
        self.get(TIME_KEY).is_some()
    }

    /// Device timestamp in milliseconds
    ///
    /// `Ok(None)` when the sample has no `time` field.
    ///
    /// # Errors
    /// Returns `MalformedValue` if the `time` value is not an integer.
    pub fn device_millis(&self) -> Result<Option<i64>, ContractError> {
        self.get(TIME_KEY)
            .map(|raw| {
                raw.trim()
                    .parse::<i64>()
                    .map_err(|_| ContractError::malformed_value(TIME_KEY, raw))
            })
            .transpose()
    }

    /// Iterate non-time fields, parsing each value as `f64`
    pub fn metric_values(&self) -> impl Iterator<Item = Result<(&str, f64), ContractError>> {
        self.iter()
            .filter(|(k, _)| *k != TIME_KEY)
            .map(|(k, v)| {
                v.trim()
                    .parse::<f64>()
                    .map(|value| (k, value))
                    .map_err(|_| ContractError::malformed_value(k, v))
            })
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ParsedSample {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut sample = Self::new();
        for (k, v) in iter {
            sample.insert(k, v);
        }
        sample
    }
}

/// One time-series point bound for the metrics store
///
/// Wire shape: `(path, (epoch_seconds, value))`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricPoint {
    /// `<prefix>.<key>`
    pub path: String,

    /// Whole seconds since the Unix epoch (floored)
    pub epoch_seconds: i64,

    pub value: f64,
}

impl MetricPoint {
    /// Create point under a namespace prefix
    pub fn new(prefix: &str, key: &str, epoch_seconds: i64, value: f64) -> Self {
        Self {
            path: format!("{prefix}.{key}"),
            epoch_seconds,
            value,
        }
    }
}

/// One raw line bound for the log aggregator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    /// Translated instant, nanoseconds since the Unix epoch
    pub epoch_nanos: i64,

    /// Line text exactly as decoded from the device
    pub line: String,
}
