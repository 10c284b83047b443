use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One raw entry of a performance history, as supplied by the storage layer.
///
/// A sample is either a bare number or a record carrying an optional
/// timestamp, a primary value under one of the `value` / `metric` /
/// `performance` aliases, and any number of named auxiliary metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawSample {
    Scalar(f64),
    Record(SampleRecord),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SampleRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performance: Option<f64>,
    /// Named auxiliary metrics (e.g. "load", "pace"); numeric entries only
    /// are usable.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl RawSample {
    pub fn scalar(value: f64) -> Self {
        Self::Scalar(value)
    }

    pub fn dated(date: DateTime<Utc>, value: f64) -> Self {
        Self::Record(SampleRecord {
            date: Some(date),
            value: Some(value),
            ..SampleRecord::default()
        })
    }

    /// The primary value of this sample, if present and finite.
    ///
    /// Records resolve the first populated alias in `value`, `metric`,
    /// `performance` order; a populated but non-finite alias makes the
    /// sample unusable rather than falling through to the next alias.
    pub fn primary_value(&self) -> Option<f64> {
        match self {
            Self::Scalar(v) => v.is_finite().then_some(*v),
            Self::Record(r) => r.primary_value(),
        }
    }

    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Scalar(_) => None,
            Self::Record(r) => r.date,
        }
    }

    /// A named metric of this sample, if present, numeric and finite.
    /// Bare scalars carry no named metrics.
    pub fn metric_value(&self, key: &str) -> Option<f64> {
        match self {
            Self::Scalar(_) => None,
            Self::Record(r) => r.metric_value(key),
        }
    }
}

impl From<f64> for RawSample {
    fn from(value: f64) -> Self {
        Self::Scalar(value)
    }
}

impl SampleRecord {
    pub fn primary_value(&self) -> Option<f64> {
        let raw = self.value.or(self.metric).or(self.performance)?;
        raw.is_finite().then_some(raw)
    }

    pub fn metric_value(&self, key: &str) -> Option<f64> {
        let raw = match key {
            "value" => self.value,
            "metric" => self.metric,
            "performance" => self.performance,
            _ => self.extra.get(key).and_then(serde_json::Value::as_f64),
        }?;
        raw.is_finite().then_some(raw)
    }
}
