//! Bidder (team) state: purse, roster and eligibility.
//!
//! Bidders are created when they join a room and are only ever mutated by
//! the engine: purse and roster change when a lot is awarded, and
//! `eligible` is recomputed after every purchase.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{Amount, BidderId, GavelError, Lot, LotCategory, Result};

/// A lot won by a bidder and the price paid for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub lot: Arc<Lot>,
    pub price_paid: Amount,
}

/// A participant in a room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bidder {
    pub id: BidderId,
    /// Team name shown to other participants.
    pub display_name: String,
    pub purse_remaining: Amount,
    pub purse_original: Amount,
    /// Won lots in purchase order.
    pub roster: Vec<RosterEntry>,
    /// `purse_remaining >= min_increment && roster.len() < squad_cap`.
    pub eligible: bool,
}

impl Bidder {
    /// A fresh bidder with a full purse and an empty roster.
    #[must_use]
    pub fn new(id: BidderId, display_name: impl Into<String>, purse: Amount) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            purse_remaining: purse,
            purse_original: purse,
            roster: Vec::new(),
            eligible: true,
        }
    }

    /// Amount spent so far.
    #[must_use]
    pub fn total_spent(&self) -> Amount {
        self.purse_original - self.purse_remaining
    }

    #[must_use]
    pub fn roster_size(&self) -> usize {
        self.roster.len()
    }

    /// Recompute the derived `eligible` flag.
    pub fn recompute_eligibility(&mut self, min_increment: Amount, squad_cap: usize) {
        self.eligible = self.purse_remaining >= min_increment && self.roster.len() < squad_cap;
    }

    /// Transfer a lot to this bidder at `price`.
    ///
    /// # Errors
    /// Returns `InsufficientFunds` if the purse cannot cover `price`; the
    /// bidder is left unchanged.
    pub fn award(&mut self, lot: Arc<Lot>, price: Amount) -> Result<()> {
        if self.purse_remaining < price {
            return Err(GavelError::InsufficientFunds {
                needed: price,
                available: self.purse_remaining,
            });
        }
        self.purse_remaining -= price;
        self.roster.push(RosterEntry {
            lot,
            price_paid: price,
        });
        Ok(())
    }

    /// Reset the purse to a new starting amount, keeping what was spent.
    ///
    /// Used when the owner changes the starting purse before the auction.
    pub fn reset_purse(&mut self, new_purse: Amount) {
        let spent = self.total_spent();
        self.purse_original = new_purse.max(spent);
        self.purse_remaining = self.purse_original - spent;
    }

    /// Read-only view for team-state queries and events.
    #[must_use]
    pub fn snapshot(&self) -> TeamSnapshot {
        let mut category_counts: BTreeMap<LotCategory, usize> =
            LotCategory::ALL.iter().map(|c| (*c, 0)).collect();
        for entry in &self.roster {
            *category_counts.entry(entry.lot.category).or_insert(0) += 1;
        }
        TeamSnapshot {
            bidder_id: self.id.clone(),
            display_name: self.display_name.clone(),
            purse_remaining: self.purse_remaining,
            purse_original: self.purse_original,
            total_spent: self.total_spent(),
            roster: self.roster.clone(),
            category_counts,
            eligible: self.eligible,
        }
    }
}

/// Per-bidder roster/purse snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamSnapshot {
    pub bidder_id: BidderId,
    pub display_name: String,
    pub purse_remaining: Amount,
    pub purse_original: Amount,
    pub total_spent: Amount,
    pub roster: Vec<RosterEntry>,
    pub category_counts: BTreeMap<LotCategory, usize>,
    pub eligible: bool,
}
