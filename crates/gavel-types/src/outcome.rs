//! Resolution records, bid log entries and auction statistics.
//!
//! A [`ResolvedLot`] is fixed the moment its lot is resolved and is never
//! revised; statistics are always recomputed from the append-only log.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Amount, BidderId, Lot, LotId};

/// Why a lot left the block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionCause {
    /// The countdown ran out.
    TimerExpired,
    /// Explicit "sell" command.
    Sold,
    /// Explicit "skip" command; always unsold.
    Skipped,
    /// The auction was ended early; always unsold.
    EndedEarly,
    /// The rest of the lot's category run was passed over; always unsold.
    BatchSkipped,
    /// Nobody left in the room could bid; always unsold.
    NoEligibleBidders,
}

impl fmt::Display for ResolutionCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TimerExpired => write!(f, "TIMER_EXPIRED"),
            Self::Sold => write!(f, "SOLD"),
            Self::Skipped => write!(f, "SKIPPED"),
            Self::EndedEarly => write!(f, "ENDED_EARLY"),
            Self::BatchSkipped => write!(f, "BATCH_SKIPPED"),
            Self::NoEligibleBidders => write!(f, "NO_ELIGIBLE_BIDDERS"),
        }
    }
}

/// Final outcome of one lot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedLot {
    pub lot: Arc<Lot>,
    /// Price paid, `0` when unsold.
    pub final_price: Amount,
    pub winner: Option<BidderId>,
    /// Team name of the winner at resolution time.
    pub winner_name: Option<String>,
    pub cause: ResolutionCause,
    pub resolved_at: DateTime<Utc>,
}

impl ResolvedLot {
    #[must_use]
    pub fn sold(
        lot: Arc<Lot>,
        price: Amount,
        winner: BidderId,
        winner_name: String,
        cause: ResolutionCause,
    ) -> Self {
        Self {
            lot,
            final_price: price,
            winner: Some(winner),
            winner_name: Some(winner_name),
            cause,
            resolved_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn unsold(lot: Arc<Lot>, cause: ResolutionCause) -> Self {
        Self {
            lot,
            final_price: 0,
            winner: None,
            winner_name: None,
            cause,
            resolved_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn is_sold(&self) -> bool {
        self.winner.is_some()
    }
}

/// One accepted bid. Append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BidLogEntry {
    pub timestamp: DateTime<Utc>,
    pub bidder_id: BidderId,
    pub lot_id: LotId,
    pub amount: Amount,
}

/// Aggregate statistics over resolved lots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuctionStatistics {
    /// Lots in the room's catalog.
    pub total_lots: usize,
    pub total_players_sold: usize,
    pub total_unsold: usize,
    /// Lots neither resolved nor on the block.
    pub remaining: usize,
    pub total_spent: Amount,
    /// Exact mean of sold prices, zero when nothing sold.
    pub average_price: Decimal,
    /// First lot to reach the highest sold price.
    pub most_expensive: Option<ResolvedLot>,
}

impl AuctionStatistics {
    #[must_use]
    pub fn compute(resolved: &[ResolvedLot], total_lots: usize, remaining: usize) -> Self {
        let mut sold = 0usize;
        let mut total_spent: Amount = 0;
        let mut most_expensive: Option<&ResolvedLot> = None;
        for record in resolved.iter().filter(|r| r.is_sold()) {
            sold += 1;
            total_spent += record.final_price;
            if most_expensive.is_none_or(|m| record.final_price > m.final_price) {
                most_expensive = Some(record);
            }
        }
        let average_price = if sold == 0 {
            Decimal::ZERO
        } else {
            Decimal::from(total_spent) / Decimal::from(sold as u64)
        };
        Self {
            total_lots,
            total_players_sold: sold,
            total_unsold: resolved.len() - sold,
            remaining,
            total_spent,
            average_price,
            most_expensive: most_expensive.cloned(),
        }
    }
}
