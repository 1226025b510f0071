//! Transport-agnostic command surface.
//!
//! [`AuctionHouse`] is what a client transport (WebSocket handler, CLI,
//! test harness) talks to. Every command looks the room up by code and then
//! runs under that room's lock; errors are returned to the caller only and
//! never broadcast. A transport that wants to push an error to its client
//! can wrap it with [`RoomEvent::error`](gavel_types::RoomEvent::error).
//!
//! `room_created` takes sequence number 0 while the room is being built,
//! before anyone can subscribe, so no subscriber ever receives it. The
//! creator gets the same information from the [`RoomSnapshot`] returned by
//! [`AuctionHouse::create_room`]; the first event a subscriber can see is
//! sequence 1.

use std::sync::Arc;

use gavel_types::{
    Amount, AuctionStatistics, BidAck, BidLogEntry, BidderId, EngineConfig, FinalReport, Lot,
    LotSource, LotState, ResolvedLot, Result, RoomCode, RoomNotification, RoomSettings,
    RoomSnapshot, SettingsPatch, TeamSnapshot,
};
use tokio::sync::broadcast;

use crate::registry::RoomRegistry;
use crate::room::RoomHandle;

/// The engine entry point.
#[derive(Debug)]
pub struct AuctionHouse {
    registry: RoomRegistry,
}

impl AuctionHouse {
    /// # Errors
    /// `Configuration` if `config` does not validate.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            registry: RoomRegistry::new(config),
        })
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        self.registry.config()
    }

    /// Open a room owned by `owner`. Returns the room code and its initial
    /// state.
    pub async fn create_room(
        &self,
        owner: BidderId,
        team_name: Option<String>,
        settings: Option<RoomSettings>,
        lots: Vec<Lot>,
    ) -> Result<(RoomCode, RoomSnapshot)> {
        let room = self.registry.create(owner, team_name, settings, lots).await?;
        Ok((room.code().clone(), room.snapshot().await))
    }

    /// Open a room with lots pulled from a catalog loader.
    pub async fn create_room_from(
        &self,
        owner: BidderId,
        team_name: Option<String>,
        settings: Option<RoomSettings>,
        source: &dyn LotSource,
    ) -> Result<(RoomCode, RoomSnapshot)> {
        let lots = source.load_lots()?;
        self.create_room(owner, team_name, settings, lots).await
    }

    pub async fn join_room(
        &self,
        code: &RoomCode,
        bidder: BidderId,
        team_name: Option<String>,
    ) -> Result<RoomSnapshot> {
        self.room(code).await?.join(bidder, team_name).await
    }

    pub async fn update_settings(
        &self,
        code: &RoomCode,
        requester: &BidderId,
        patch: &SettingsPatch,
    ) -> Result<RoomSettings> {
        self.room(code).await?.update_settings(requester, patch).await
    }

    pub async fn start_auction(&self, code: &RoomCode) -> Result<LotState> {
        self.room(code).await?.start().await
    }

    pub async fn place_bid(
        &self,
        code: &RoomCode,
        bidder: &BidderId,
        amount: Amount,
    ) -> Result<BidAck> {
        self.room(code).await?.place_bid(bidder, amount).await
    }

    /// Explicit "sell": award the lot on the block to the floor owner.
    pub async fn resolve_lot(&self, code: &RoomCode) -> Result<ResolvedLot> {
        self.room(code).await?.resolve_lot().await
    }

    /// Explicit "skip": record the lot on the block as unsold.
    pub async fn skip_lot(&self, code: &RoomCode) -> Result<ResolvedLot> {
        self.room(code).await?.skip_lot().await
    }

    /// Close the current category batch early: the lot on the block and
    /// the rest of its category run are recorded unsold, then the next
    /// batch is revealed (or the auction completes).
    pub async fn skip_batch(&self, code: &RoomCode) -> Result<Vec<ResolvedLot>> {
        self.room(code).await?.skip_batch().await
    }

    pub async fn end_early(&self, code: &RoomCode) -> Result<FinalReport> {
        self.room(code).await?.end_early().await
    }

    pub async fn query_team_state(&self, code: &RoomCode) -> Result<Vec<TeamSnapshot>> {
        Ok(self.room(code).await?.teams().await)
    }

    pub async fn query_statistics(&self, code: &RoomCode) -> Result<AuctionStatistics> {
        Ok(self.room(code).await?.statistics().await)
    }

    pub async fn query_bid_log(&self, code: &RoomCode) -> Result<Vec<BidLogEntry>> {
        Ok(self.room(code).await?.bid_log().await)
    }

    pub async fn query_room(&self, code: &RoomCode) -> Result<RoomSnapshot> {
        Ok(self.room(code).await?.snapshot().await)
    }

    /// Final report; available in any phase, complete once the auction is.
    pub async fn query_report(&self, code: &RoomCode) -> Result<FinalReport> {
        Ok(self.room(code).await?.read(|room| room.final_report()).await)
    }

    pub async fn subscribe(&self, code: &RoomCode) -> Result<broadcast::Receiver<RoomNotification>> {
        Ok(self.room(code).await?.subscribe())
    }

    pub async fn remove_room(&self, code: &RoomCode) -> Result<()> {
        self.registry.remove(code).await
    }

    /// Codes of every open room, sorted.
    pub async fn active_rooms(&self) -> Vec<RoomCode> {
        self.registry.codes().await
    }

    /// Direct handle to a room, for hosts that issue many commands.
    pub async fn room(&self, code: &RoomCode) -> Result<Arc<RoomHandle>> {
        self.registry.get(code).await
    }
}
