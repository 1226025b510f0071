//! Configuration types for the engine and for individual rooms.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Amount, GavelError, LotCategory, Result, constants};

/// How a room's lot queue is ordered when the auction starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum AuctionOrder {
    /// Catalog order, untouched.
    #[default]
    AsLoaded,
    /// Category batches in the declared sequence. Categories missing from
    /// `sequence` trail in catalog order. With a seed, lots are shuffled
    /// within each batch.
    Categories {
        sequence: Vec<LotCategory>,
        #[serde(default)]
        shuffle_seed: Option<u64>,
    },
    /// By lot name.
    Alphabetical,
    /// By a numeric display attribute (missing counts as zero).
    Attribute { key: String, descending: bool },
    /// Seeded shuffle; the same seed always yields the same order.
    Shuffled { seed: u64 },
}

/// Per-room rules, owned by the room owner until the auction starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSettings {
    /// Maximum lots a single bidder may win.
    pub squad_cap: usize,
    /// Maximum bidders admitted to the room (owner included).
    pub max_bidders: usize,
    /// Purse every bidder starts with.
    pub starting_purse: Amount,
    /// Legal raises over the current floor.
    pub bid_increments: Vec<Amount>,
    pub auction_order: AuctionOrder,
}

impl Default for RoomSettings {
    fn default() -> Self {
        Self {
            squad_cap: constants::DEFAULT_SQUAD_CAP,
            max_bidders: constants::DEFAULT_MAX_BIDDERS,
            starting_purse: constants::DEFAULT_STARTING_PURSE,
            bid_increments: constants::DEFAULT_BID_INCREMENTS.to_vec(),
            auction_order: AuctionOrder::default(),
        }
    }
}

impl RoomSettings {
    /// Smallest legal raise; a bidder whose purse is below it is ineligible.
    #[must_use]
    pub fn min_increment(&self) -> Amount {
        self.bid_increments.iter().copied().min().unwrap_or(0)
    }

    #[must_use]
    pub fn is_legal_increment(&self, increment: Amount) -> bool {
        self.bid_increments.contains(&increment)
    }

    pub fn validate(&self) -> Result<()> {
        if self.squad_cap == 0 {
            return Err(GavelError::InvalidSettings {
                reason: "squad_cap must be at least 1".to_string(),
            });
        }
        if self.max_bidders == 0 {
            return Err(GavelError::InvalidSettings {
                reason: "max_bidders must be at least 1".to_string(),
            });
        }
        if self.starting_purse == 0 {
            return Err(GavelError::InvalidSettings {
                reason: "starting_purse must be positive".to_string(),
            });
        }
        if self.bid_increments.is_empty() || self.bid_increments.contains(&0) {
            return Err(GavelError::InvalidSettings {
                reason: "bid_increments must be a non-empty set of positive amounts".to_string(),
            });
        }
        if let AuctionOrder::Categories { sequence, .. } = &self.auction_order {
            if sequence.is_empty() {
                return Err(GavelError::InvalidSettings {
                    reason: "category order needs at least one category".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Apply a partial update, returning the merged settings without
    /// touching `self`.
    #[must_use]
    pub fn merged(&self, patch: &SettingsPatch) -> Self {
        let mut next = self.clone();
        if let Some(cap) = patch.squad_cap {
            next.squad_cap = cap;
        }
        if let Some(max) = patch.max_bidders {
            next.max_bidders = max;
        }
        if let Some(purse) = patch.starting_purse {
            next.starting_purse = purse;
        }
        if let Some(increments) = &patch.bid_increments {
            next.bid_increments.clone_from(increments);
        }
        if let Some(order) = &patch.auction_order {
            next.auction_order = order.clone();
        }
        next
    }
}

/// Owner-supplied partial settings update. Absent fields are unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SettingsPatch {
    #[serde(default)]
    pub squad_cap: Option<usize>,
    #[serde(default)]
    pub max_bidders: Option<usize>,
    #[serde(default)]
    pub starting_purse: Option<Amount>,
    #[serde(default)]
    pub bid_increments: Option<Vec<Amount>>,
    #[serde(default)]
    pub auction_order: Option<AuctionOrder>,
}

/// Countdown timing shared by every room of an engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerConfig {
    /// Ticks per countdown; the lot resolves when they run out.
    pub countdown_ticks: u32,
    /// Wall-clock length of one tick.
    pub tick_interval: Duration,
    /// Pause between resolving a lot and revealing the next.
    pub reveal_delay: Duration,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            countdown_ticks: constants::DEFAULT_COUNTDOWN_TICKS,
            tick_interval: Duration::from_millis(constants::DEFAULT_TICK_MS),
            reveal_delay: Duration::from_millis(constants::DEFAULT_REVEAL_DELAY_MS),
        }
    }
}

impl TimerConfig {
    /// Full length of one countdown.
    #[must_use]
    pub fn countdown(&self) -> Duration {
        self.tick_interval * self.countdown_ticks
    }
}

/// Process-wide engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub timer: TimerConfig,
    pub room_code_len: usize,
    /// Broadcast buffer per room.
    pub event_capacity: usize,
    pub max_rooms: usize,
    /// Settings a room starts with unless the creator overrides them.
    pub default_settings: RoomSettings,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            timer: TimerConfig::default(),
            room_code_len: constants::DEFAULT_ROOM_CODE_LEN,
            event_capacity: constants::DEFAULT_EVENT_CAPACITY,
            max_rooms: constants::DEFAULT_MAX_ROOMS,
            default_settings: RoomSettings::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| GavelError::Configuration(format!("invalid engine config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<()> {
        if self.timer.countdown_ticks == 0 {
            return Err(GavelError::Configuration(
                "timer.countdown_ticks must be at least 1".to_string(),
            ));
        }
        if self.timer.tick_interval.is_zero() {
            return Err(GavelError::Configuration(
                "timer.tick_interval must be non-zero".to_string(),
            ));
        }
        if !(4..=32).contains(&self.room_code_len) {
            return Err(GavelError::Configuration(
                "room_code_len must be between 4 and 32".to_string(),
            ));
        }
        if self.event_capacity == 0 || self.max_rooms == 0 {
            return Err(GavelError::Configuration(
                "event_capacity and max_rooms must be positive".to_string(),
            ));
        }
        self.default_settings
            .validate()
            .map_err(|e| GavelError::Configuration(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_are_valid() {
        let settings = RoomSettings::default();
        settings.validate().unwrap();
        assert_eq!(settings.min_increment(), 5_000_000);
        assert!(settings.is_legal_increment(10_000_000));
        assert!(!settings.is_legal_increment(3_000_000));
    }

    #[test]
    fn empty_increments_rejected() {
        let settings = RoomSettings {
            bid_increments: vec![],
            ..RoomSettings::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(GavelError::InvalidSettings { .. })
        ));
    }

    #[test]
    fn empty_category_sequence_rejected() {
        let settings = RoomSettings {
            auction_order: AuctionOrder::Categories {
                sequence: vec![],
                shuffle_seed: None,
            },
            ..RoomSettings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn patch_merges_only_present_fields() {
        let base = RoomSettings::default();
        let patch = SettingsPatch {
            squad_cap: Some(15),
            auction_order: Some(AuctionOrder::Alphabetical),
            ..SettingsPatch::default()
        };
        let merged = base.merged(&patch);
        assert_eq!(merged.squad_cap, 15);
        assert_eq!(merged.auction_order, AuctionOrder::Alphabetical);
        assert_eq!(merged.starting_purse, base.starting_purse);
        assert_eq!(merged.bid_increments, base.bid_increments);
    }

    #[test]
    fn timer_defaults() {
        let timer = TimerConfig::default();
        assert_eq!(timer.countdown_ticks, 15);
        assert_eq!(timer.countdown(), Duration::from_secs(15));
        assert_eq!(timer.reveal_delay, Duration::from_secs(3));
    }

    #[test]
    fn engine_config_json_roundtrip() {
        let cfg = EngineConfig::default();
        let json = serde_json::to_string(&cfg).unwrap();
        let back = EngineConfig::from_json_str(&json).unwrap();
        assert_eq!(cfg, back);
    }

    #[test]
    fn engine_config_rejects_zero_ticks() {
        let mut cfg = EngineConfig::default();
        cfg.timer.countdown_ticks = 0;
        let json = serde_json::to_string(&cfg).unwrap();
        let err = EngineConfig::from_json_str(&json).unwrap_err();
        assert!(matches!(err, GavelError::Configuration(_)));
    }

    #[test]
    fn auction_order_wire_shape() {
        let order = AuctionOrder::Attribute {
            key: "overall".into(),
            descending: true,
        };
        let json = serde_json::to_string(&order).unwrap();
        assert!(json.contains("\"policy\":\"attribute\""), "{json}");
        let back: AuctionOrder = serde_json::from_str(&json).unwrap();
        assert_eq!(back, order);
    }
}
