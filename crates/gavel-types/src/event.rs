//! Notifications fanned out to every subscriber of a room.
//!
//! Events are wrapped in a [`RoomNotification`] envelope carrying the room
//! code and a per-room sequence number, so a client that lagged behind the
//! broadcast buffer can tell it missed something and re-query the room.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    Amount, AuctionStatistics, BidderId, ErrorKind, GavelError, Lot, LotCategory, LotId,
    ResolvedLot, RoomCode, RoomSettings, TeamSnapshot,
};

/// State-change notifications.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RoomEvent {
    RoomCreated {
        code: RoomCode,
        owner: BidderId,
        settings: RoomSettings,
    },
    PlayerJoined {
        bidder_id: BidderId,
        display_name: String,
        /// Team names of everyone in the room, in join order.
        bidders: Vec<String>,
    },
    SettingsUpdated {
        settings: RoomSettings,
    },
    AuctionStarted {
        lot: Arc<Lot>,
        current_bid: Amount,
        current_bidder: Option<BidderId>,
        lots_total: usize,
    },
    /// The lot about to be revealed opens a new category batch.
    BatchStarted {
        category: LotCategory,
        lots_in_batch: usize,
    },
    /// The remainder of a category batch was recorded unsold.
    BatchSkipped {
        category: LotCategory,
        skipped: Vec<ResolvedLot>,
    },
    Tick {
        seconds_remaining: u32,
    },
    BidUpdated {
        lot_id: LotId,
        amount: Amount,
        owner: BidderId,
        owner_name: String,
    },
    LotResolved {
        record: ResolvedLot,
    },
    NextLot {
        lot: Arc<Lot>,
        base_price: Amount,
    },
    TeamStateUpdated {
        teams: Vec<TeamSnapshot>,
    },
    AuctionComplete {
        resolved_lots: Vec<ResolvedLot>,
        statistics: AuctionStatistics,
        ended_early: bool,
    },
    /// Only ever sent to the client whose command failed.
    Error {
        kind: ErrorKind,
        message: String,
    },
}

impl RoomEvent {
    /// Build the error notification for a rejected command.
    #[must_use]
    pub fn error(err: &GavelError) -> Self {
        Self::Error {
            kind: err.kind(),
            message: err.to_string(),
        }
    }

    /// Wire name of the event, for logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::RoomCreated { .. } => "room_created",
            Self::PlayerJoined { .. } => "player_joined",
            Self::SettingsUpdated { .. } => "settings_updated",
            Self::AuctionStarted { .. } => "auction_started",
            Self::BatchStarted { .. } => "batch_started",
            Self::BatchSkipped { .. } => "batch_skipped",
            Self::Tick { .. } => "tick",
            Self::BidUpdated { .. } => "bid_updated",
            Self::LotResolved { .. } => "lot_resolved",
            Self::NextLot { .. } => "next_lot",
            Self::TeamStateUpdated { .. } => "team_state_updated",
            Self::AuctionComplete { .. } => "auction_complete",
            Self::Error { .. } => "error",
        }
    }
}

/// Envelope delivered to subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomNotification {
    pub room: RoomCode,
    /// Per-room, gap-free sequence of emitted events.
    pub seq: u64,
    pub emitted_at: DateTime<Utc>,
    pub event: RoomEvent,
}
