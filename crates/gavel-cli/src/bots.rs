//! Simulated bidders for the `simulate` command.
//!
//! Each bot follows the room's event stream, values every lot at a random
//! multiple of its base price, and raises the floor after a short random
//! think time while the next bid stays under its valuation. Rejections are
//! expected (another bot got there first) and only logged.

use std::sync::Arc;
use std::time::Duration;

use gavel_engine::AuctionHouse;
use gavel_types::{Amount, BidderId, RoomCode, RoomEvent, RoomNotification};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tokio::sync::broadcast::Receiver;
use tokio::sync::broadcast::error::RecvError;

/// Tunables shared by every bot in a simulation.
#[derive(Debug, Clone)]
pub struct BotProfile {
    /// Chance of reacting to each floor change.
    pub appetite: f64,
    /// Highest valuation as a multiple of base price, in tenths.
    pub max_markup_tenths: u64,
    pub think_time: Duration,
    pub increments: Vec<Amount>,
}

#[derive(Debug, Default)]
struct Floor {
    base: Amount,
    amount: Amount,
    owner: Option<BidderId>,
    valuation: Amount,
}

/// Bid on behalf of `id` until the auction completes.
pub async fn run_bot(
    house: Arc<AuctionHouse>,
    code: RoomCode,
    id: BidderId,
    profile: BotProfile,
    seed: u64,
    mut events: Receiver<RoomNotification>,
) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut floor = Floor::default();
    loop {
        let event = match events.recv().await {
            Ok(n) => n.event,
            Err(RecvError::Lagged(missed)) => {
                tracing::debug!(bot = %id, missed, "Bot lagged behind room events");
                continue;
            }
            Err(RecvError::Closed) => return,
        };
        match event {
            RoomEvent::AuctionStarted { lot, .. } | RoomEvent::NextLot { lot, .. } => {
                let markup = rng.gen_range(10..=profile.max_markup_tenths.max(10));
                floor = Floor {
                    base: lot.base_price,
                    amount: lot.base_price,
                    owner: None,
                    valuation: lot.base_price / 10 * markup,
                };
            }
            RoomEvent::BidUpdated { amount, owner, .. } => {
                floor.amount = amount;
                floor.owner = Some(owner);
            }
            RoomEvent::AuctionComplete { .. } => return,
            _ => continue,
        }

        let holds_floor = floor.owner.as_ref() == Some(&id);
        if floor.base == 0 || holds_floor || !rng.gen_bool(profile.appetite.clamp(0.0, 1.0)) {
            continue;
        }
        let next = if floor.owner.is_none() {
            floor.amount
        } else {
            floor.amount + profile.increments.choose(&mut rng).copied().unwrap_or(0)
        };
        if next > floor.valuation {
            continue;
        }

        let millis = u64::try_from(profile.think_time.as_millis()).unwrap_or(u64::MAX);
        tokio::time::sleep(Duration::from_millis(rng.gen_range(0..=millis))).await;
        match house.place_bid(&code, &id, next).await {
            Ok(ack) => tracing::debug!(bot = %id, amount = ack.amount, "Bot bid"),
            Err(err) => tracing::debug!(bot = %id, amount = next, error = %err, "Bot bid rejected"),
        }
    }
}
