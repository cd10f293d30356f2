//! Offer evaluation - the seller's side of the haggling state machine
//!
//! Three outcomes: accept at list (offer at or above list, clamped down),
//! accept at offer (between floor and list), or counter at the floored
//! midpoint between offer and list, never below the floor. Counters
//! converge monotonically: each counter is at least the previous offer and
//! at most the list price.

use crate::{Catalog, SessionStore};
use haggle_types::{NegotiationSession, Price, ResourceId, Result, SessionId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Outcome of evaluating one offer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum OfferOutcome {
    /// Offer at or above list; final price clamped to list, never above
    AcceptAtList { price: Price },
    /// Offer between floor and list; final price is the offer exactly
    AcceptAtOffer { price: Price },
    /// Offer below floor; counter at `max(floor, (offer + list) / 2)`
    Counter { price: Price },
}

impl OfferOutcome {
    /// The price this outcome carries
    pub fn price(&self) -> Price {
        match self {
            Self::AcceptAtList { price } | Self::AcceptAtOffer { price } | Self::Counter { price } => {
                *price
            }
        }
    }

    /// Whether the offer was accepted
    pub fn is_accept(&self) -> bool {
        !matches!(self, Self::Counter { .. })
    }
}

/// The seller's offer evaluator
///
/// Stateless over an injected catalog and session store. Each evaluation
/// updates the session's current offer and round counter (creating the
/// session on its first offer). No round limit is enforced here; the
/// conversation-level step budget lives in the agent orchestration.
pub struct OfferEvaluator {
    catalog: Arc<Catalog>,
    store: Arc<SessionStore>,
}

impl OfferEvaluator {
    pub fn new(catalog: Arc<Catalog>, store: Arc<SessionStore>) -> Self {
        Self { catalog, store }
    }

    /// Evaluate an offer for a resource within a session
    pub fn evaluate(
        &self,
        session_id: &SessionId,
        resource_id: &ResourceId,
        offer: Price,
    ) -> Result<(OfferOutcome, NegotiationSession)> {
        let resource = self.catalog.get(resource_id)?;
        let list = resource.list_price;
        let floor = resource.floor_price;

        let outcome = if offer >= list {
            OfferOutcome::AcceptAtList { price: list }
        } else if offer >= floor {
            OfferOutcome::AcceptAtOffer { price: offer }
        } else {
            let counter = offer.midpoint(list)?.max(floor);
            OfferOutcome::Counter { price: counter }
        };

        let session = self.store.record_offer(session_id, resource_id, offer);
        tracing::debug!(
            session = %session_id,
            resource = %resource_id,
            offer = %offer,
            round = session.rounds,
            ?outcome,
            "evaluated offer"
        );

        Ok((outcome, session))
    }
}
