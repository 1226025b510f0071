//! JSON catalog loader.
//!
//! A catalog is an array of entries:
//!
//! ```json
//! [
//!   { "name": "V Kohli", "role": "Batter", "base_price": "2", "overall": 92 },
//!   { "name": "J Bumrah", "role": "bowler", "base_price": 1.5 }
//! ]
//! ```
//!
//! `base_price` is in crore (string or number). `role` is parsed leniently.
//! Every other field is kept as a display attribute. Lot ids are derived
//! from position and name, so reloading a catalog yields the same ids.

use std::collections::BTreeMap;
use std::path::PathBuf;

use gavel_types::{GavelError, Lot, LotCategory, LotId, LotSource, Result, from_crore};
use rust_decimal::Decimal;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct CatalogEntry {
    name: String,
    #[serde(default)]
    role: String,
    base_price: Decimal,
    #[serde(flatten)]
    attributes: BTreeMap<String, serde_json::Value>,
}

/// Catalog read from a JSON file.
#[derive(Debug, Clone)]
pub struct JsonCatalog {
    path: PathBuf,
}

impl JsonCatalog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl LotSource for JsonCatalog {
    fn load_lots(&self) -> Result<Vec<Lot>> {
        let raw = std::fs::read_to_string(&self.path)?;
        parse_catalog(&raw)
    }
}

/// Parse and validate catalog JSON.
pub fn parse_catalog(json: &str) -> Result<Vec<Lot>> {
    let entries: Vec<CatalogEntry> = serde_json::from_str(json)?;
    entries
        .into_iter()
        .enumerate()
        .map(|(position, entry)| {
            let base_price =
                from_crore(entry.base_price).ok_or_else(|| GavelError::InvalidLot {
                    reason: format!(
                        "{}: base price {} Cr is not a valid amount",
                        entry.name, entry.base_price
                    ),
                })?;
            let mut lot = Lot::new(
                LotId::deterministic(position as u64, &entry.name),
                entry.name,
                LotCategory::parse_lenient(&entry.role),
                base_price,
            );
            lot.attributes = entry.attributes;
            lot.validate()?;
            Ok(lot)
        })
        .collect()
}
