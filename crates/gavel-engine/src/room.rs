//! The room aggregate and the shared handle that serializes access to it.
//!
//! [`Room`] composes the bidder roster, the lot queue, the floor and the
//! resolution log. It is only ever mutated under the [`RoomHandle`] mutex,
//! by the membership methods here, the [`arbiter`] and the [`sequencer`].
//! Countdown tasks hold a `Weak<RoomHandle>`, so a removed room is dropped
//! even while a task is parked on its next tick.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use gavel_types::{
    Amount, AuctionStatistics, BidAck, BidLogEntry, Bidder, BidderId, EngineConfig, FinalReport,
    GavelError, Lot, LotCategory, LotState, ResolutionCause, ResolvedLot, Result, RoomCode,
    RoomEvent, RoomNotification, RoomPhase, RoomSettings, RoomSnapshot, SettingsPatch,
    TeamSnapshot,
};
use tokio::sync::{Mutex, MutexGuard, broadcast};

use crate::broadcaster::EventBroadcaster;
use crate::timer::{TimerCoordinator, TimerHandle};
use crate::{arbiter, ordering, sequencer};

/// Mutable state of one auction room.
#[derive(Debug)]
pub struct Room {
    pub(crate) code: RoomCode,
    pub(crate) owner: BidderId,
    pub(crate) phase: RoomPhase,
    pub(crate) settings: RoomSettings,
    pub(crate) bidders: HashMap<BidderId, Bidder>,
    /// Bidder ids in join order; the owner is always first.
    pub(crate) join_order: Vec<BidderId>,
    /// Lots in the order they were loaded.
    pub(crate) catalog: Vec<Arc<Lot>>,
    pub(crate) lot_queue: VecDeque<Arc<Lot>>,
    pub(crate) current_lot: Option<Arc<Lot>>,
    pub(crate) current_bid_amount: Amount,
    pub(crate) current_bid_owner: Option<BidderId>,
    /// Category of the most recently promoted lot, for batch transitions.
    pub(crate) last_category: Option<LotCategory>,
    pub(crate) resolved_lots: Vec<ResolvedLot>,
    pub(crate) bid_log: Vec<BidLogEntry>,
    pub(crate) ended_early: bool,
    pub(crate) timer: TimerCoordinator,
}

impl Room {
    pub(crate) fn new(
        code: RoomCode,
        owner: Bidder,
        settings: RoomSettings,
        catalog: Vec<Arc<Lot>>,
        timer: TimerCoordinator,
    ) -> Self {
        let lot_queue = ordering::order_lots(catalog.clone(), &settings.auction_order).into();
        let owner_id = owner.id.clone();
        let mut room = Self {
            code,
            owner: owner_id.clone(),
            phase: RoomPhase::Lobby,
            settings,
            bidders: HashMap::from([(owner_id.clone(), owner)]),
            join_order: vec![owner_id],
            catalog,
            lot_queue,
            current_lot: None,
            current_bid_amount: 0,
            current_bid_owner: None,
            last_category: None,
            resolved_lots: Vec::new(),
            bid_log: Vec::new(),
            ended_early: false,
            timer,
        };
        room.recompute_eligibility();
        room
    }

    // --- read side ---

    #[must_use]
    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    #[must_use]
    pub fn owner(&self) -> &BidderId {
        &self.owner
    }

    #[must_use]
    pub fn phase(&self) -> RoomPhase {
        self.phase
    }

    #[must_use]
    pub fn settings(&self) -> &RoomSettings {
        &self.settings
    }

    #[must_use]
    pub fn bidder(&self, id: &BidderId) -> Option<&Bidder> {
        self.bidders.get(id)
    }

    #[must_use]
    pub fn bidder_count(&self) -> usize {
        self.bidders.len()
    }

    #[must_use]
    pub fn current_lot(&self) -> Option<&Arc<Lot>> {
        self.current_lot.as_ref()
    }

    /// The floor: amount and owner.
    #[must_use]
    pub fn current_bid(&self) -> (Amount, Option<&BidderId>) {
        (self.current_bid_amount, self.current_bid_owner.as_ref())
    }

    /// Lots still waiting in the queue (the lot on the block excluded).
    #[must_use]
    pub fn lots_remaining(&self) -> usize {
        self.lot_queue.len()
    }

    #[must_use]
    pub fn resolved_lots(&self) -> &[ResolvedLot] {
        &self.resolved_lots
    }

    #[must_use]
    pub fn bid_log(&self) -> &[BidLogEntry] {
        &self.bid_log
    }

    #[must_use]
    pub fn is_ended_early(&self) -> bool {
        self.ended_early
    }

    #[must_use]
    pub fn timer(&self) -> &TimerCoordinator {
        &self.timer
    }

    /// Team snapshots in join order.
    #[must_use]
    pub fn teams(&self) -> Vec<TeamSnapshot> {
        self.join_order
            .iter()
            .filter_map(|id| self.bidders.get(id))
            .map(Bidder::snapshot)
            .collect()
    }

    #[must_use]
    pub fn team_names(&self) -> Vec<String> {
        self.join_order
            .iter()
            .filter_map(|id| self.bidders.get(id))
            .map(|b| b.display_name.clone())
            .collect()
    }

    #[must_use]
    pub fn statistics(&self) -> AuctionStatistics {
        let on_block = usize::from(self.current_lot.is_some());
        AuctionStatistics::compute(
            &self.resolved_lots,
            self.catalog.len(),
            self.lot_queue.len() + on_block,
        )
    }

    #[must_use]
    pub fn lot_state(&self) -> Option<LotState> {
        self.current_lot.as_ref().map(|lot| LotState {
            lot: Arc::clone(lot),
            current_bid: self.current_bid_amount,
            current_bidder: self.current_bid_owner.clone(),
        })
    }

    #[must_use]
    pub fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            code: self.code.clone(),
            owner: self.owner.clone(),
            phase: self.phase,
            settings: self.settings.clone(),
            teams: self.teams(),
            current_lot: self.current_lot.clone(),
            current_bid_amount: self.current_bid_amount,
            current_bid_owner: self.current_bid_owner.clone(),
            seconds_remaining: self.timer.seconds_remaining(),
            lots_remaining: self.lot_queue.len(),
            lots_resolved: self.resolved_lots.len(),
            ended_early: self.ended_early,
        }
    }

    #[must_use]
    pub fn final_report(&self) -> FinalReport {
        FinalReport {
            code: self.code.clone(),
            resolved_lots: self.resolved_lots.clone(),
            statistics: self.statistics(),
            teams: self.teams(),
            ended_early: self.ended_early,
        }
    }

    // --- write side (crate only) ---

    /// Admit a bidder. Returns `false` if the id is already a member.
    pub(crate) fn add_bidder(&mut self, id: BidderId, display_name: String) -> Result<bool> {
        if self.phase.is_terminal() {
            return Err(GavelError::invalid_state("join", self.phase));
        }
        if self.bidders.contains_key(&id) {
            return Ok(false);
        }
        if self.bidders.len() >= self.settings.max_bidders {
            return Err(GavelError::RoomFull {
                capacity: self.settings.max_bidders,
            });
        }
        let mut bidder = Bidder::new(id.clone(), display_name, self.settings.starting_purse);
        bidder.recompute_eligibility(self.settings.min_increment(), self.settings.squad_cap);
        self.bidders.insert(id.clone(), bidder);
        self.join_order.push(id);
        Ok(true)
    }

    /// Owner-only, lobby-only settings update.
    pub(crate) fn apply_settings(
        &mut self,
        requester: &BidderId,
        patch: &SettingsPatch,
    ) -> Result<&RoomSettings> {
        if *requester != self.owner {
            return Err(GavelError::Forbidden {
                action: "update settings".to_string(),
            });
        }
        if self.phase != RoomPhase::Lobby {
            return Err(GavelError::invalid_state("update settings", self.phase));
        }
        let next = self.settings.merged(patch);
        next.validate()?;
        if next.max_bidders < self.bidders.len() {
            return Err(GavelError::InvalidSettings {
                reason: format!(
                    "max_bidders {} is below the {} bidders already joined",
                    next.max_bidders,
                    self.bidders.len()
                ),
            });
        }

        if next.starting_purse != self.settings.starting_purse {
            for bidder in self.bidders.values_mut() {
                bidder.reset_purse(next.starting_purse);
            }
        }
        if next.auction_order != self.settings.auction_order {
            self.lot_queue = ordering::order_lots(self.catalog.clone(), &next.auction_order).into();
        }
        self.settings = next;
        self.recompute_eligibility();
        Ok(&self.settings)
    }

    pub(crate) fn recompute_eligibility(&mut self) {
        let min_increment = self.settings.min_increment();
        let squad_cap = self.settings.squad_cap;
        for bidder in self.bidders.values_mut() {
            bidder.recompute_eligibility(min_increment, squad_cap);
        }
    }

    /// Put `lot` on the block with the floor at its base price.
    pub(crate) fn open_floor(&mut self, lot: Arc<Lot>) {
        self.current_bid_amount = lot.base_price;
        self.current_bid_owner = None;
        self.current_lot = Some(lot);
        self.phase = RoomPhase::Bidding;
    }

    /// Take the lot off the block, returning it with the final floor.
    pub(crate) fn close_floor(&mut self) -> Option<(Arc<Lot>, Amount, Option<BidderId>)> {
        let lot = self.current_lot.take()?;
        let amount = std::mem::take(&mut self.current_bid_amount);
        Some((lot, amount, self.current_bid_owner.take()))
    }

    pub(crate) fn rearm_countdown(&mut self) -> Result<TimerHandle> {
        self.timer.rearm(self.phase)
    }
}

/// Shared, lock-protected room.
#[derive(Debug)]
pub struct RoomHandle {
    code: RoomCode,
    state: Mutex<Room>,
    events: EventBroadcaster,
}

impl RoomHandle {
    pub(crate) fn new(
        code: RoomCode,
        owner: Bidder,
        settings: RoomSettings,
        catalog: Vec<Arc<Lot>>,
        config: &EngineConfig,
    ) -> Arc<Self> {
        let created = RoomEvent::RoomCreated {
            code: code.clone(),
            owner: owner.id.clone(),
            settings: settings.clone(),
        };
        let handle = Arc::new_cyclic(|weak| {
            let timer = TimerCoordinator::new(code.clone(), weak.clone(), config.timer.clone());
            Self {
                code: code.clone(),
                state: Mutex::new(Room::new(code.clone(), owner, settings, catalog, timer)),
                events: EventBroadcaster::new(code.clone(), config.event_capacity),
            }
        });
        handle.events.emit(created);
        handle
    }

    #[must_use]
    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RoomNotification> {
        self.events.subscribe()
    }

    /// Run a read-only closure against the room state.
    pub async fn read<R>(&self, f: impl FnOnce(&Room) -> R) -> R {
        let room = self.state.lock().await;
        f(&room)
    }

    pub(crate) async fn lock(&self) -> MutexGuard<'_, Room> {
        self.state.lock().await
    }

    // --- commands ---

    pub async fn join(&self, bidder: BidderId, team_name: Option<String>) -> Result<RoomSnapshot> {
        let mut room = self.lock().await;
        let name = team_name.unwrap_or_else(|| bidder.to_string());
        let added = self.rejected("join", room.add_bidder(bidder.clone(), name))?;
        if added {
            let display_name = room
                .bidder(&bidder)
                .map(|b| b.display_name.clone())
                .unwrap_or_default();
            tracing::info!(room = %self.code, bidder = %bidder, bidders = room.bidder_count(), "Bidder joined");
            self.events.emit(RoomEvent::PlayerJoined {
                bidder_id: bidder,
                display_name,
                bidders: room.team_names(),
            });
        }
        Ok(room.snapshot())
    }

    pub async fn update_settings(
        &self,
        requester: &BidderId,
        patch: &SettingsPatch,
    ) -> Result<RoomSettings> {
        let mut room = self.lock().await;
        let settings = self
            .rejected("update settings", room.apply_settings(requester, patch))?
            .clone();
        tracing::info!(room = %self.code, "Settings updated");
        self.events.emit(RoomEvent::SettingsUpdated {
            settings: settings.clone(),
        });
        Ok(settings)
    }

    pub async fn start(&self) -> Result<LotState> {
        let mut room = self.lock().await;
        self.rejected("start", sequencer::start(&mut room, &self.events))
    }

    pub async fn place_bid(&self, bidder: &BidderId, amount: Amount) -> Result<BidAck> {
        let mut room = self.lock().await;
        arbiter::place_bid(&mut room, &self.events, bidder, amount).inspect_err(|err| {
            tracing::debug!(room = %self.code, bidder = %bidder, amount, error = %err, "Bid rejected");
        })
    }

    /// Sell the lot on the block to the floor owner, if any.
    pub async fn resolve_lot(&self) -> Result<ResolvedLot> {
        let mut room = self.lock().await;
        self.rejected(
            "resolve lot",
            sequencer::resolve_current_lot(&mut room, &self.events, ResolutionCause::Sold),
        )
    }

    /// Pass on the lot on the block; always unsold.
    pub async fn skip_lot(&self) -> Result<ResolvedLot> {
        let mut room = self.lock().await;
        self.rejected(
            "skip lot",
            sequencer::resolve_current_lot(&mut room, &self.events, ResolutionCause::Skipped),
        )
    }

    /// Pass on the rest of the current category batch; always unsold.
    pub async fn skip_batch(&self) -> Result<Vec<ResolvedLot>> {
        let mut room = self.lock().await;
        self.rejected("skip batch", sequencer::skip_batch(&mut room, &self.events))
    }

    pub async fn end_early(&self) -> Result<FinalReport> {
        let mut room = self.lock().await;
        self.rejected("end early", sequencer::end_early(&mut room, &self.events))
    }

    pub async fn snapshot(&self) -> RoomSnapshot {
        self.read(Room::snapshot).await
    }

    pub async fn teams(&self) -> Vec<TeamSnapshot> {
        self.read(Room::teams).await
    }

    pub async fn statistics(&self) -> AuctionStatistics {
        self.read(Room::statistics).await
    }

    pub async fn bid_log(&self) -> Vec<BidLogEntry> {
        self.read(|room| room.bid_log.clone()).await
    }

    /// Cancel anything scheduled; used when the room leaves the registry.
    pub(crate) async fn shutdown(&self) {
        self.lock().await.timer.disarm();
    }

    // --- timer callbacks ---

    /// Emit a tick if `generation` is still live. Returns `false` when the
    /// countdown has been superseded.
    pub(crate) async fn on_tick(&self, generation: u64, seconds_remaining: u32) -> bool {
        let room = self.lock().await;
        if !room.timer.is_current(generation) {
            return false;
        }
        tracing::trace!(room = %self.code, generation, seconds_remaining, "Tick");
        self.events.emit(RoomEvent::Tick { seconds_remaining });
        true
    }

    pub(crate) async fn on_expiry(&self, generation: u64) {
        let mut room = self.lock().await;
        if room.ended_early || !room.timer.expire(generation) {
            tracing::debug!(room = %self.code, generation, "Superseded countdown exited");
            return;
        }
        tracing::debug!(room = %self.code, generation, "Countdown expired");
        if let Err(err) =
            sequencer::resolve_current_lot(&mut room, &self.events, ResolutionCause::TimerExpired)
        {
            tracing::warn!(room = %self.code, error = %err, "Expiry could not resolve lot");
        }
    }

    pub(crate) async fn on_reveal(&self, generation: u64) {
        let mut room = self.lock().await;
        if !sequencer::reveal_next(&mut room, &self.events, generation) {
            tracing::debug!(room = %self.code, generation, "Superseded reveal exited");
        }
    }

    fn rejected<T>(&self, action: &'static str, result: Result<T>) -> Result<T> {
        if let Err(err) = &result {
            tracing::warn!(room = %self.code, action, error = %err, "Command rejected");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Weak;

    use gavel_types::{AuctionOrder, TimerConfig};

    use super::*;

    fn room_with(lots: Vec<Lot>) -> Room {
        let settings = RoomSettings {
            max_bidders: 3,
            starting_purse: 100,
            bid_increments: vec![5, 10],
            ..RoomSettings::default()
        };
        let code = RoomCode::new("ROOM01");
        let timer = TimerCoordinator::new(code.clone(), Weak::new(), TimerConfig::default());
        let owner = Bidder::new(BidderId::new("owner"), "Owners XI", 100);
        Room::new(code, owner, settings, lots.into_iter().map(Arc::new).collect(), timer)
    }

    #[test]
    fn owner_is_first_bidder() {
        let room = room_with(vec![]);
        assert_eq!(room.phase(), RoomPhase::Lobby);
        assert_eq!(room.bidder_count(), 1);
        assert_eq!(room.team_names(), vec!["Owners XI".to_string()]);
        assert!(room.bidder(&BidderId::new("owner")).unwrap().eligible);
    }

    #[test]
    fn rejoin_is_idempotent_and_capacity_enforced() {
        let mut room = room_with(vec![]);
        assert!(room.add_bidder(BidderId::new("a"), "A".into()).unwrap());
        assert!(!room.add_bidder(BidderId::new("a"), "A again".into()).unwrap());
        assert!(room.add_bidder(BidderId::new("b"), "B".into()).unwrap());
        let err = room.add_bidder(BidderId::new("c"), "C".into()).unwrap_err();
        assert!(matches!(err, GavelError::RoomFull { capacity: 3 }));
        assert_eq!(room.team_names(), vec!["Owners XI", "A", "B"]);
    }

    #[test]
    fn settings_are_owner_only() {
        let mut room = room_with(vec![]);
        room.add_bidder(BidderId::new("a"), "A".into()).unwrap();
        let patch = SettingsPatch {
            squad_cap: Some(2),
            ..SettingsPatch::default()
        };
        let err = room.apply_settings(&BidderId::new("a"), &patch).unwrap_err();
        assert!(matches!(err, GavelError::Forbidden { .. }));
        let settings = room.apply_settings(&BidderId::new("owner"), &patch).unwrap();
        assert_eq!(settings.squad_cap, 2);
    }

    #[test]
    fn purse_change_resets_every_bidder() {
        let mut room = room_with(vec![]);
        room.add_bidder(BidderId::new("a"), "A".into()).unwrap();
        let patch = SettingsPatch {
            starting_purse: Some(250),
            ..SettingsPatch::default()
        };
        room.apply_settings(&BidderId::new("owner"), &patch).unwrap();
        for team in room.teams() {
            assert_eq!(team.purse_original, 250);
            assert_eq!(team.purse_remaining, 250);
        }
    }

    #[test]
    fn invalid_patch_leaves_settings_unchanged() {
        let mut room = room_with(vec![]);
        let before = room.settings().clone();
        let patch = SettingsPatch {
            bid_increments: Some(vec![]),
            ..SettingsPatch::default()
        };
        assert!(room.apply_settings(&BidderId::new("owner"), &patch).is_err());
        assert_eq!(room.settings(), &before);

        room.add_bidder(BidderId::new("a"), "A".into()).unwrap();
        let shrink = SettingsPatch {
            max_bidders: Some(1),
            ..SettingsPatch::default()
        };
        let err = room.apply_settings(&BidderId::new("owner"), &shrink).unwrap_err();
        assert!(matches!(err, GavelError::InvalidSettings { .. }));
    }

    #[test]
    fn order_change_reorders_queue() {
        let mut room = room_with(vec![
            Lot::dummy("Zaheer", LotCategory::Bowler, 10),
            Lot::dummy("Anil", LotCategory::Bowler, 10),
        ]);
        assert_eq!(room.lot_queue[0].name, "Zaheer");
        let patch = SettingsPatch {
            auction_order: Some(AuctionOrder::Alphabetical),
            ..SettingsPatch::default()
        };
        room.apply_settings(&BidderId::new("owner"), &patch).unwrap();
        assert_eq!(room.lot_queue[0].name, "Anil");
    }

    #[test]
    fn snapshot_reflects_lobby() {
        let room = room_with(vec![Lot::dummy("A", LotCategory::Batsman, 10)]);
        let snap = room.snapshot();
        assert_eq!(snap.phase, RoomPhase::Lobby);
        assert_eq!(snap.lots_remaining, 1);
        assert!(snap.current_lot.is_none());
        assert!(snap.seconds_remaining.is_none());
        assert_eq!(room.statistics().remaining, 1);
    }
}
