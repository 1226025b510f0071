//! Lot sequencing: start, resolution, reveal of the next lot, completion.
//!
//! ```text
//!  Lobby ──start──▶ Bidding ──resolve / skip_batch──▶ Revealing ──reveal──▶ Bidding ...
//!                      │                                   │
//!                      └──last lot / end_early / nobody can bid──▶ Complete
//! ```
//!
//! A resolution is final the moment it is appended to `resolved_lots`;
//! statistics are always recomputed from that log. Completion disarms the
//! timer before `auction_complete` is emitted, so no late expiry can touch a
//! finished room.

use std::sync::Arc;

use gavel_types::{
    Amount, BidderId, FinalReport, GavelError, Lot, LotState, ResolutionCause, ResolvedLot,
    Result, RoomEvent, RoomPhase,
};

use crate::broadcaster::EventBroadcaster;
use crate::ordering;
use crate::room::Room;

/// Order the queue, put the first lot on the block and arm its countdown.
///
/// # Errors
/// `InvalidState` outside the lobby or with no bidders, `EmptyQueue` with
/// no lots.
pub fn start(room: &mut Room, events: &EventBroadcaster) -> Result<LotState> {
    if room.phase != RoomPhase::Lobby {
        return Err(GavelError::invalid_state("start the auction", room.phase));
    }
    if room.bidders.is_empty() {
        return Err(GavelError::invalid_state("start without bidders", room.phase));
    }
    let mut queue = ordering::order_lots(room.catalog.clone(), &room.settings.auction_order);
    if queue.is_empty() {
        return Err(GavelError::EmptyQueue);
    }
    let first = queue.remove(0);
    room.lot_queue = queue.into();
    room.recompute_eligibility();

    room.open_floor(Arc::clone(&first));
    announce_batch(room, events, &first);
    room.rearm_countdown()?;

    tracing::info!(
        room = %room.code,
        lots = room.catalog.len(),
        bidders = room.bidders.len(),
        first = %first.name,
        "Auction started"
    );
    events.emit(RoomEvent::AuctionStarted {
        lot: Arc::clone(&first),
        current_bid: first.base_price,
        current_bidder: None,
        lots_total: room.catalog.len(),
    });
    Ok(LotState {
        current_bid: first.base_price,
        lot: first,
        current_bidder: None,
    })
}

/// Take the lot off the block and record its outcome, then advance.
///
/// `Sold` and `TimerExpired` award the lot to the floor owner if there is
/// one; `Skipped` always records it unsold.
///
/// # Errors
/// `InvalidState` once complete, `NoActiveLot` when nothing is on the block.
pub fn resolve_current_lot(
    room: &mut Room,
    events: &EventBroadcaster,
    cause: ResolutionCause,
) -> Result<ResolvedLot> {
    match room.phase {
        RoomPhase::Bidding => {}
        RoomPhase::Complete => {
            return Err(GavelError::invalid_state("resolve a lot", room.phase));
        }
        RoomPhase::Lobby | RoomPhase::Revealing => return Err(GavelError::NoActiveLot),
    }
    let Some((lot, amount, owner)) = room.close_floor() else {
        return Err(GavelError::NoActiveLot);
    };
    room.timer.disarm();

    let record = match owner {
        Some(owner) if cause != ResolutionCause::Skipped => {
            award(room, lot, amount, &owner, cause)
        }
        _ => ResolvedLot::unsold(lot, cause),
    };
    room.recompute_eligibility();
    room.resolved_lots.push(record.clone());

    tracing::info!(
        room = %room.code,
        lot = %record.lot.name,
        winner = record.winner.as_ref().map(BidderId::as_str),
        price = record.final_price,
        %cause,
        "Lot resolved"
    );
    events.emit(RoomEvent::LotResolved {
        record: record.clone(),
    });
    events.emit(RoomEvent::TeamStateUpdated {
        teams: room.teams(),
    });

    advance(room, events);
    Ok(record)
}

/// Continuation of the reveal pause. Returns `false` when superseded.
pub fn reveal_next(room: &mut Room, events: &EventBroadcaster, generation: u64) -> bool {
    if room.phase != RoomPhase::Revealing || !room.timer.take_reveal(generation) {
        return false;
    }
    promote_next(room, events);
    true
}

/// Stop the auction now. The lot on the block and every queued lot are
/// recorded unsold.
///
/// # Errors
/// `InvalidState` if the auction is already complete.
pub fn end_early(room: &mut Room, events: &EventBroadcaster) -> Result<FinalReport> {
    if room.phase.is_terminal() {
        return Err(GavelError::invalid_state("end the auction", room.phase));
    }
    room.ended_early = true;
    room.timer.disarm();

    let discarded = room.close_floor().map(|(lot, ..)| lot);
    let cause = ResolutionCause::EndedEarly;
    room.resolved_lots.extend(
        discarded
            .into_iter()
            .chain(room.lot_queue.drain(..))
            .map(|lot| ResolvedLot::unsold(lot, cause)),
    );

    complete(room, events);
    Ok(room.final_report())
}

/// Pass over the rest of the current category run: the lot on the block
/// (if any) and every queued lot of the same category up to the next
/// category change are recorded unsold. Then advance as after a resolution.
///
/// During the reveal pause the run is the category of the lot just resolved.
///
/// # Errors
/// `InvalidState` once complete, `NoActiveLot` before the auction starts.
pub fn skip_batch(room: &mut Room, events: &EventBroadcaster) -> Result<Vec<ResolvedLot>> {
    match room.phase {
        RoomPhase::Bidding | RoomPhase::Revealing => {}
        RoomPhase::Complete => {
            return Err(GavelError::invalid_state("skip a batch", room.phase));
        }
        RoomPhase::Lobby => return Err(GavelError::NoActiveLot),
    }
    let on_block = room.close_floor().map(|(lot, ..)| lot);
    let Some(category) = on_block.as_ref().map(|l| l.category).or(room.last_category) else {
        return Err(GavelError::NoActiveLot);
    };
    room.timer.disarm();

    let run = ordering::queued_run(category, &room.lot_queue);
    let cause = ResolutionCause::BatchSkipped;
    let skipped: Vec<ResolvedLot> = on_block
        .into_iter()
        .chain(room.lot_queue.drain(..run))
        .map(|lot| ResolvedLot::unsold(lot, cause))
        .collect();
    room.resolved_lots.extend(skipped.iter().cloned());

    tracing::info!(
        room = %room.code,
        %category,
        skipped = skipped.len(),
        remaining = room.lot_queue.len(),
        "Batch skipped"
    );
    events.emit(RoomEvent::BatchSkipped {
        category,
        skipped: skipped.clone(),
    });

    advance(room, events);
    Ok(skipped)
}

fn award(
    room: &mut Room,
    lot: Arc<Lot>,
    amount: Amount,
    owner: &BidderId,
    cause: ResolutionCause,
) -> ResolvedLot {
    let Some(bidder) = room.bidders.get_mut(owner) else {
        tracing::warn!(room = %room.code, bidder = %owner, "Floor owner left the room; lot unsold");
        return ResolvedLot::unsold(lot, cause);
    };
    match bidder.award(Arc::clone(&lot), amount) {
        Ok(()) => ResolvedLot::sold(lot, amount, owner.clone(), bidder.display_name.clone(), cause),
        Err(err) => {
            tracing::warn!(room = %room.code, bidder = %owner, error = %err, "Award failed; lot unsold");
            ResolvedLot::unsold(lot, cause)
        }
    }
}

/// Move on after a resolution: reveal the next lot or complete.
///
/// When no bidder can bid any more, the queue is recorded unsold and the
/// auction completes instead of running countdowns nobody can act on.
fn advance(room: &mut Room, events: &EventBroadcaster) {
    if room.ended_early || room.lot_queue.is_empty() {
        complete(room, events);
        return;
    }
    if room.bidders.values().all(|b| !b.eligible) {
        let cause = ResolutionCause::NoEligibleBidders;
        tracing::info!(
            room = %room.code,
            unsold = room.lot_queue.len(),
            "No bidder can bid; closing the auction"
        );
        room.resolved_lots
            .extend(room.lot_queue.drain(..).map(|lot| ResolvedLot::unsold(lot, cause)));
        complete(room, events);
        return;
    }
    if room.timer.reveal_delay().is_zero() {
        promote_next(room, events);
        return;
    }
    room.phase = RoomPhase::Revealing;
    room.timer.schedule_reveal();
}

fn promote_next(room: &mut Room, events: &EventBroadcaster) {
    let Some(lot) = room.lot_queue.pop_front() else {
        complete(room, events);
        return;
    };
    room.open_floor(Arc::clone(&lot));
    announce_batch(room, events, &lot);
    if let Err(err) = room.rearm_countdown() {
        tracing::warn!(room = %room.code, error = %err, "Could not arm countdown");
    }
    tracing::debug!(room = %room.code, lot = %lot.name, remaining = room.lot_queue.len(), "Next lot");
    events.emit(RoomEvent::NextLot {
        base_price: lot.base_price,
        lot,
    });
}

/// Emit `batch_started` when `lot` opens a new category run.
fn announce_batch(room: &mut Room, events: &EventBroadcaster, lot: &Lot) {
    if room.last_category == Some(lot.category) {
        return;
    }
    room.last_category = Some(lot.category);
    events.emit(RoomEvent::BatchStarted {
        category: lot.category,
        lots_in_batch: ordering::batch_len(lot.category, &room.lot_queue),
    });
}

fn complete(room: &mut Room, events: &EventBroadcaster) {
    room.timer.disarm();
    room.close_floor();
    room.phase = RoomPhase::Complete;
    let statistics = room.statistics();
    tracing::info!(
        room = %room.code,
        sold = statistics.total_players_sold,
        unsold = statistics.total_unsold,
        total_spent = statistics.total_spent,
        ended_early = room.ended_early,
        "Auction complete"
    );
    events.emit(RoomEvent::AuctionComplete {
        resolved_lots: room.resolved_lots.clone(),
        statistics,
        ended_early: room.ended_early,
    });
}
