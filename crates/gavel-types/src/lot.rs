//! Lots: the immutable items put up for bidding.
//!
//! A [`Lot`] is built once by a catalog loader and only ever referenced by
//! the engine afterwards. Its `attributes` bag is opaque display data; the
//! engine only reads it when ordering the queue by a numeric attribute.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Amount, GavelError, LotId, Result};

/// Role of a lot, used for category batches and roster breakdowns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LotCategory {
    Batsman,
    Bowler,
    AllRounder,
    WicketKeeper,
}

impl LotCategory {
    /// Every category, in the conventional auction order.
    pub const ALL: [Self; 4] = [
        Self::Batsman,
        Self::Bowler,
        Self::AllRounder,
        Self::WicketKeeper,
    ];

    /// Lenient parse of free-form role text from a catalog.
    ///
    /// Unknown roles normalize to [`LotCategory::AllRounder`].
    #[must_use]
    pub fn parse_lenient(role: &str) -> Self {
        match role.trim().to_ascii_lowercase().as_str() {
            "batsman" | "batter" => Self::Batsman,
            "bowler" => Self::Bowler,
            "wicket-keeper" | "wicketkeeper" | "wicket keeper" | "keeper" => Self::WicketKeeper,
            _ => Self::AllRounder,
        }
    }
}

impl fmt::Display for LotCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Batsman => write!(f, "Batsman"),
            Self::Bowler => write!(f, "Bowler"),
            Self::AllRounder => write!(f, "All-rounder"),
            Self::WicketKeeper => write!(f, "Wicket-keeper"),
        }
    }
}

/// An item up for auction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lot {
    pub id: LotId,
    pub name: String,
    pub category: LotCategory,
    /// Opaque display bag (nationality, rating, stats, ...).
    #[serde(default)]
    pub attributes: BTreeMap<String, serde_json::Value>,
    /// Opening price in the smallest currency unit. Always positive.
    pub base_price: Amount,
}

impl Lot {
    #[must_use]
    pub fn new(
        id: LotId,
        name: impl Into<String>,
        category: LotCategory,
        base_price: Amount,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            category,
            attributes: BTreeMap::new(),
            base_price,
        }
    }

    /// Builder-style attribute setter.
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    /// Numeric value of a display attribute, `0.0` if missing or non-numeric.
    #[must_use]
    pub fn numeric_attribute(&self, key: &str) -> f64 {
        self.attributes
            .get(key)
            .and_then(serde_json::Value::as_f64)
            .unwrap_or(0.0)
    }

    /// Reject lots the engine cannot auction.
    pub fn validate(&self) -> Result<()> {
        if self.base_price == 0 {
            return Err(GavelError::InvalidLot {
                reason: format!("{} has a zero base price", self.name),
            });
        }
        if self.name.trim().is_empty() {
            return Err(GavelError::InvalidLot {
                reason: format!("{} has an empty name", self.id),
            });
        }
        Ok(())
    }
}

impl fmt::Display for Lot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}) base {}", self.name, self.category, self.base_price)
    }
}

/// Produces the ordered lot list a room is created with.
///
/// Implemented by hosts (CSV/spreadsheet readers, fixtures, ...). The engine
/// never parses catalogs itself.
pub trait LotSource {
    fn load_lots(&self) -> Result<Vec<Lot>>;
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl Lot {
    pub fn dummy(name: &str, category: LotCategory, base_price: Amount) -> Self {
        Self::new(LotId::new(), name, category, base_price)
    }

    pub fn dummy_rated(name: &str, category: LotCategory, base_price: Amount, rating: u32) -> Self {
        Self::dummy(name, category, base_price).with_attribute("overall", rating.into())
    }
}
