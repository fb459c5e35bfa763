//! Price and freshness decay for perishable listings.
//!
//! Both values are derived from immutable inputs only (`uploadDate` and the
//! base price), so applying the policy twice on the same day yields the same
//! result.

use crate::domain::model::{Listing, ListingUpdate};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_DAILY_PRICE_RATE: f64 = 0.05;
pub const DEFAULT_MAX_FRESHNESS: i64 = 10;

const PRICE_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DepreciationPolicy {
    /// Fraction of the base price lost per elapsed day.
    #[serde(default = "default_daily_price_rate")]
    pub daily_price_rate: f64,
    #[serde(default = "default_max_freshness")]
    pub max_freshness: i64,
    #[serde(default)]
    pub price_floor: f64,
}

fn default_daily_price_rate() -> f64 {
    DEFAULT_DAILY_PRICE_RATE
}

fn default_max_freshness() -> i64 {
    DEFAULT_MAX_FRESHNESS
}

impl Default for DepreciationPolicy {
    fn default() -> Self {
        Self {
            daily_price_rate: DEFAULT_DAILY_PRICE_RATE,
            max_freshness: DEFAULT_MAX_FRESHNESS,
            price_floor: 0.0,
        }
    }
}

/// Whole days between `upload` and `now`, truncated toward zero.
pub fn elapsed_days(upload: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - upload).num_days()
}

/// Result of applying the policy to one listing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Decision {
    /// Uploaded less than a full day ago (or in the future).
    NotYetDue,
    /// Stored values already match the computed ones.
    UpToDate,
    Update(Depreciated),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Depreciated {
    pub days_elapsed: i64,
    pub price_per_kg: f64,
    pub freshness_score: i64,
    pub base_price: f64,
}

impl DepreciationPolicy {
    pub fn price_after(&self, base_price: f64, days_elapsed: i64) -> f64 {
        let raw = base_price * (1.0 - self.daily_price_rate * days_elapsed as f64);
        raw.max(self.price_floor)
    }

    pub fn freshness_after(&self, days_elapsed: i64) -> i64 {
        (self.max_freshness - days_elapsed).max(0)
    }

    /// Computes decayed values, or `None` while the listing is not a full day old.
    pub fn depreciate(&self, listing: &Listing, now: DateTime<Utc>) -> Option<Depreciated> {
        let days_elapsed = elapsed_days(listing.upload_date, now);
        if days_elapsed <= 0 {
            return None;
        }

        // 以不可變的原始價格為基準，避免每次執行重複折扣
        let base_price = listing.original_price.unwrap_or(listing.price_per_kg);

        Some(Depreciated {
            days_elapsed,
            price_per_kg: self.price_after(base_price, days_elapsed),
            freshness_score: self.freshness_after(days_elapsed),
            base_price,
        })
    }

    pub fn decide(&self, listing: &Listing, now: DateTime<Utc>) -> Decision {
        let Some(result) = self.depreciate(listing, now) else {
            return Decision::NotYetDue;
        };

        let price_unchanged = (listing.price_per_kg - result.price_per_kg).abs() < PRICE_EPSILON;
        let freshness_unchanged = listing
            .freshness_score
            .is_some_and(|f| (f - result.freshness_score as f64).abs() < PRICE_EPSILON);

        if price_unchanged && freshness_unchanged && listing.original_price.is_some() {
            Decision::UpToDate
        } else {
            Decision::Update(result)
        }
    }

    /// Builds the partial write for a listing, if it needs one.
    pub fn plan_update(&self, listing: &Listing, now: DateTime<Utc>) -> Option<ListingUpdate> {
        match self.decide(listing, now) {
            Decision::Update(result) => Some(result.into_update(listing)),
            Decision::NotYetDue | Decision::UpToDate => None,
        }
    }
}

impl Depreciated {
    /// The base price is only written when the listing does not carry one yet.
    pub fn into_update(self, listing: &Listing) -> ListingUpdate {
        ListingUpdate {
            id: listing.id.clone(),
            days_elapsed: self.days_elapsed,
            price_per_kg: self.price_per_kg,
            freshness_score: self.freshness_score,
            original_price: listing.original_price.is_none().then_some(self.base_price),
        }
    }
}
