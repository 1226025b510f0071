//! Lot queue ordering policies.
//!
//! Every policy is deterministic: a seeded shuffle always produces the same
//! queue for the same catalog and seed, so a room can be replayed.

use std::collections::VecDeque;
use std::sync::Arc;

use gavel_types::{AuctionOrder, Lot, LotCategory};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// Arrange `lots` (in catalog order) according to `order`.
#[must_use]
pub fn order_lots(mut lots: Vec<Arc<Lot>>, order: &AuctionOrder) -> Vec<Arc<Lot>> {
    match order {
        AuctionOrder::AsLoaded => lots,
        AuctionOrder::Alphabetical => {
            lots.sort_by(|a, b| a.name.cmp(&b.name));
            lots
        }
        AuctionOrder::Attribute { key, descending } => {
            lots.sort_by(|a, b| {
                let ord = a.numeric_attribute(key).total_cmp(&b.numeric_attribute(key));
                if *descending { ord.reverse() } else { ord }
            });
            lots
        }
        AuctionOrder::Shuffled { seed } => {
            lots.shuffle(&mut StdRng::seed_from_u64(*seed));
            lots
        }
        AuctionOrder::Categories {
            sequence,
            shuffle_seed,
        } => {
            let mut rng = shuffle_seed.map(StdRng::seed_from_u64);
            let mut ordered = Vec::with_capacity(lots.len());
            let mut rest = lots;
            for category in sequence {
                let (mut batch, others): (Vec<_>, Vec<_>) =
                    rest.into_iter().partition(|lot| lot.category == *category);
                if let Some(rng) = rng.as_mut() {
                    batch.shuffle(rng);
                }
                ordered.extend(batch);
                rest = others;
            }
            ordered.extend(rest);
            ordered
        }
    }
}

/// Size of the batch opened by a lot of `category`: the lot itself plus the
/// queued lots of the same category directly behind it.
#[must_use]
pub fn batch_len(category: LotCategory, queue: &VecDeque<Arc<Lot>>) -> usize {
    1 + queued_run(category, queue)
}

/// Leading lots of `queue` that belong to `category`.
#[must_use]
pub fn queued_run(category: LotCategory, queue: &VecDeque<Arc<Lot>>) -> usize {
    queue
        .iter()
        .take_while(|lot| lot.category == category)
        .count()
}
