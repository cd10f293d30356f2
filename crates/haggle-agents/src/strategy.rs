//! Budget-constrained offer strategy - the buyer's side of the haggle
//!
//! A bounded-rationality heuristic, not a search procedure: no
//! backtracking, no multi-resource trade-off. If the list price fits the
//! budget, offer it outright; otherwise open at 80% of list. Counters at
//! or under budget are accepted immediately; counters above budget draw
//! one raise to the budget ceiling, and a walk-away when no room remains.

use haggle_types::{Price, Result};
use serde::{Deserialize, Serialize};

/// Decision on a seller counter-offer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CounterDecision {
    /// Counter fits the budget; accept it as the next offer
    Accept(Price),
    /// Counter exceeds budget but the ceiling still improves on our last
    /// offer; raise to it
    Raise(Price),
    /// No affordable offer can improve; end with an explicit no-deal
    WalkAway,
}

/// The buyer's offer heuristic
#[derive(Debug, Clone, Copy)]
pub struct OfferStrategy {
    budget: Price,
}

impl OfferStrategy {
    pub fn new(budget: Price) -> Self {
        Self { budget }
    }

    pub fn budget(&self) -> Price {
        self.budget
    }

    /// Opening offer for a quoted list price.
    ///
    /// The quote comes from the peer and is untrusted; an absurd list price
    /// that overflows the percentage math is an error, not a panic.
    pub fn opening_offer(&self, list_price: Price) -> Result<Price> {
        if list_price <= self.budget {
            Ok(list_price)
        } else {
            list_price.percent(80)
        }
    }

    /// React to a seller counter, given our previous offer
    pub fn on_counter(&self, counter: Price, last_offer: Price) -> CounterDecision {
        if counter <= self.budget {
            return CounterDecision::Accept(counter);
        }

        let ceiling = self.budget;
        if ceiling > last_offer {
            CounterDecision::Raise(ceiling)
        } else {
            CounterDecision::WalkAway
        }
    }
}
