//! Read-only views returned by commands and queries.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{
    Amount, AuctionStatistics, BidderId, Lot, LotId, ResolvedLot, RoomCode, RoomPhase,
    RoomSettings, TeamSnapshot,
};

/// Whole-room view, for joiners and reconnecting clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomSnapshot {
    pub code: RoomCode,
    pub owner: BidderId,
    pub phase: RoomPhase,
    pub settings: RoomSettings,
    /// In join order.
    pub teams: Vec<TeamSnapshot>,
    pub current_lot: Option<Arc<Lot>>,
    pub current_bid_amount: Amount,
    pub current_bid_owner: Option<BidderId>,
    /// Whole ticks left on the live countdown, if any.
    pub seconds_remaining: Option<u32>,
    pub lots_remaining: usize,
    pub lots_resolved: usize,
    pub ended_early: bool,
}

/// The lot on the block and its floor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LotState {
    pub lot: Arc<Lot>,
    pub current_bid: Amount,
    pub current_bidder: Option<BidderId>,
}

/// Acknowledgement of an accepted bid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BidAck {
    pub lot_id: LotId,
    pub amount: Amount,
    pub owner: BidderId,
    /// Position of this bid in the room's bid log.
    pub bid_seq: usize,
}

/// Everything a report exporter needs once the auction is over.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalReport {
    pub code: RoomCode,
    pub resolved_lots: Vec<ResolvedLot>,
    pub statistics: AuctionStatistics,
    pub teams: Vec<TeamSnapshot>,
    pub ended_early: bool,
}
