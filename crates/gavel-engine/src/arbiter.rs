//! Bid arbitration: the hard gate every bid passes before it touches the
//! floor.
//!
//! Checks run in a fixed order and the first failure wins:
//!
//! 1. a lot is on the block (`NoActiveLot`)
//! 2. the raise is a configured increment (`InvalidIncrement`); with no
//!    floor owner yet, bidding the base price itself is also legal
//! 3. the bidder does not already hold the floor (`ConsecutiveBidRejected`)
//! 4. the bidder exists (`BidderNotFound`), has squad room (`SquadFull`)
//!    and can pay (`InsufficientFunds`)
//!
//! A rejected bid leaves the room untouched. An accepted bid moves the
//! floor, appends to the bid log and rearms the countdown in the same
//! critical section, so the live timer always belongs to the winning bid.

use chrono::Utc;
use gavel_types::{Amount, BidAck, BidLogEntry, BidderId, GavelError, Result, RoomEvent, RoomPhase};

use crate::broadcaster::EventBroadcaster;
use crate::room::Room;

/// Validate a bid without applying it.
///
/// # Errors
/// The first failing check, see the module docs.
pub fn validate_bid(room: &Room, bidder_id: &BidderId, amount: Amount) -> Result<()> {
    // 1. Active lot
    if room.phase != RoomPhase::Bidding || room.ended_early || room.current_lot.is_none() {
        return Err(GavelError::NoActiveLot);
    }

    // 2. Increment
    let increment = i128::from(amount) - i128::from(room.current_bid_amount);
    let opening = room.current_bid_owner.is_none() && increment == 0;
    let legal = opening
        || u64::try_from(increment)
            .is_ok_and(|raise| raise > 0 && room.settings.is_legal_increment(raise));
    if !legal {
        return Err(GavelError::InvalidIncrement {
            increment,
            allowed: room.settings.bid_increments.clone(),
        });
    }

    // 3. No self-outbidding
    if room.current_bid_owner.as_ref() == Some(bidder_id) {
        return Err(GavelError::ConsecutiveBidRejected(bidder_id.clone()));
    }

    // 4. Eligibility
    let bidder = room
        .bidders
        .get(bidder_id)
        .ok_or_else(|| GavelError::BidderNotFound(bidder_id.clone()))?;
    if bidder.roster_size() >= room.settings.squad_cap {
        return Err(GavelError::SquadFull {
            cap: room.settings.squad_cap,
        });
    }
    let min_increment = room.settings.min_increment();
    if bidder.purse_remaining < amount || bidder.purse_remaining < min_increment {
        return Err(GavelError::InsufficientFunds {
            needed: amount.max(min_increment),
            available: bidder.purse_remaining,
        });
    }

    Ok(())
}

/// Validate and apply a bid, rearming the countdown and emitting
/// `bid_updated`.
///
/// # Errors
/// See [`validate_bid`]. Nothing is mutated on error.
pub fn place_bid(
    room: &mut Room,
    events: &EventBroadcaster,
    bidder_id: &BidderId,
    amount: Amount,
) -> Result<BidAck> {
    validate_bid(room, bidder_id, amount)?;
    let lot_id = room
        .current_lot
        .as_ref()
        .map(|lot| lot.id)
        .ok_or(GavelError::NoActiveLot)?;
    let owner_name = room
        .bidders
        .get(bidder_id)
        .map(|b| b.display_name.clone())
        .unwrap_or_default();

    room.current_bid_amount = amount;
    room.current_bid_owner = Some(bidder_id.clone());
    room.bid_log.push(BidLogEntry {
        timestamp: Utc::now(),
        bidder_id: bidder_id.clone(),
        lot_id,
        amount,
    });
    let bid_seq = room.bid_log.len() - 1;
    let timer = room.rearm_countdown()?;

    tracing::debug!(
        room = %room.code,
        bidder = %bidder_id,
        lot = %lot_id,
        amount,
        generation = timer.generation,
        "Bid accepted"
    );
    events.emit(RoomEvent::BidUpdated {
        lot_id,
        amount,
        owner: bidder_id.clone(),
        owner_name,
    });

    Ok(BidAck {
        lot_id,
        amount,
        owner: bidder_id.clone(),
        bid_seq,
    })
}
