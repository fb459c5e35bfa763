use crate::utils::error::{Result, UpdaterError};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;

pub const FIELD_UPLOAD_DATE: &str = "uploadDate";
pub const FIELD_PRICE_PER_KG: &str = "pricePerKg";
pub const FIELD_FRESHNESS_SCORE: &str = "freshnessScore";
pub const FIELD_ORIGINAL_PRICE: &str = "originalPrice";

/// A single typed field value as held by the document store.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Integer(i64),
    Double(f64),
    String(String),
    Timestamp(DateTime<Utc>),
    /// Anything the updater never reads (maps, arrays, references...).
    Other(serde_json::Value),
}

impl FieldValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Integer(v) => Some(*v as f64),
            FieldValue::Double(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            FieldValue::Timestamp(ts) => Some(*ts),
            FieldValue::String(s) => DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|ts| ts.with_timezone(&Utc)),
            _ => None,
        }
    }

    /// 從一般 JSON 值轉換 (RFC 3339 字串視為時間戳)
    pub fn from_json(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => FieldValue::Null,
            serde_json::Value::Bool(b) => FieldValue::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => FieldValue::Integer(i),
                None => FieldValue::Double(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => match DateTime::parse_from_rfc3339(&s) {
                Ok(ts) => FieldValue::Timestamp(ts.with_timezone(&Utc)),
                Err(_) => FieldValue::String(s),
            },
            other => FieldValue::Other(other),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            FieldValue::Null => serde_json::Value::Null,
            FieldValue::Bool(b) => serde_json::Value::Bool(*b),
            FieldValue::Integer(i) => serde_json::Value::from(*i),
            FieldValue::Double(d) => serde_json::Number::from_f64(*d)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            FieldValue::String(s) => serde_json::Value::String(s.clone()),
            FieldValue::Timestamp(ts) => serde_json::Value::String(ts.to_rfc3339()),
            FieldValue::Other(v) => v.clone(),
        }
    }
}

pub type FieldMap = BTreeMap<String, FieldValue>;

/// A raw record as returned by `DocumentStore::list_all`.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: FieldMap,
}

impl Document {
    pub fn new(id: impl Into<String>, fields: FieldMap) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }
}

/// The marketplace listing fields the updater works with.
#[derive(Debug, Clone, PartialEq)]
pub struct Listing {
    pub id: String,
    pub upload_date: DateTime<Utc>,
    pub price_per_kg: f64,
    pub freshness_score: Option<f64>,
    pub original_price: Option<f64>,
}

impl Listing {
    pub fn from_document(doc: &Document) -> Result<Self> {
        let malformed = |reason: &str| UpdaterError::MalformedRecord {
            id: doc.id.clone(),
            reason: reason.to_string(),
        };

        let upload_date = match doc.fields.get(FIELD_UPLOAD_DATE) {
            None | Some(FieldValue::Null) => return Err(malformed("missing uploadDate")),
            Some(value) => value
                .as_timestamp()
                .ok_or_else(|| malformed("uploadDate is not a timestamp"))?,
        };

        let price_per_kg = match doc.fields.get(FIELD_PRICE_PER_KG) {
            None | Some(FieldValue::Null) => return Err(malformed("missing pricePerKg")),
            Some(value) => value
                .as_f64()
                .filter(|p| p.is_finite())
                .ok_or_else(|| malformed("pricePerKg is not a number"))?,
        };

        Ok(Self {
            id: doc.id.clone(),
            upload_date,
            price_per_kg,
            freshness_score: doc.fields.get(FIELD_FRESHNESS_SCORE).and_then(FieldValue::as_f64),
            original_price: doc
                .fields
                .get(FIELD_ORIGINAL_PRICE)
                .and_then(FieldValue::as_f64)
                .filter(|p| p.is_finite()),
        })
    }
}

/// Partial-field write for one listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListingUpdate {
    pub id: String,
    pub days_elapsed: i64,
    pub price_per_kg: f64,
    pub freshness_score: i64,
    /// Set only when the listing has no immutable base price yet.
    pub original_price: Option<f64>,
}

impl ListingUpdate {
    pub fn to_fields(&self) -> FieldMap {
        let mut fields = FieldMap::new();
        fields.insert(
            FIELD_PRICE_PER_KG.to_string(),
            FieldValue::Double(self.price_per_kg),
        );
        fields.insert(
            FIELD_FRESHNESS_SCORE.to_string(),
            FieldValue::Integer(self.freshness_score),
        );
        if let Some(original) = self.original_price {
            fields.insert(
                FIELD_ORIGINAL_PRICE.to_string(),
                FieldValue::Double(original),
            );
        }
        fields
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordFailure {
    pub id: String,
    pub error: String,
}

/// Outcome of one updater run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub scanned: usize,
    pub updated: usize,
    pub not_yet_due: usize,
    pub up_to_date: usize,
    pub malformed: Vec<String>,
    pub failures: Vec<RecordFailure>,
    #[serde(skip)]
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    pub fn log(&self) {
        tracing::info!(
            scanned = self.scanned,
            updated = self.updated,
            not_yet_due = self.not_yet_due,
            up_to_date = self.up_to_date,
            malformed = self.malformed.len(),
            failed = self.failures.len(),
            "📊 Depreciation run finished in {:?}",
            self.elapsed
        );
    }
}
