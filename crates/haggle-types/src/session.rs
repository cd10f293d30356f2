//! Negotiation session and completed transaction state
//!
//! A session tracks one conversation's haggling over one resource. It is
//! created on the first offer, mutated on every subsequent offer, and
//! deleted once its artifact has been released. A completed transaction is
//! written exactly once per payment token and never mutated; its existence
//! is the sole guard against releasing the same artifact twice.

use crate::{PaymentToken, Price, ResourceId, SessionId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Mutable per-conversation negotiation state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NegotiationSession {
    /// Caller-supplied session key
    pub session_id: SessionId,
    /// Resource under negotiation
    pub resource_id: ResourceId,
    /// Most recent offer from the buyer
    pub current_offer: Price,
    /// Number of offers evaluated so far
    pub rounds: u32,
    /// Payment token once one has been issued; at most one per session
    pub payment_token: Option<PaymentToken>,
    /// When the session was opened
    pub opened_at: DateTime<Utc>,
}

impl NegotiationSession {
    /// Open a new session with its first offer
    pub fn open(session_id: SessionId, resource_id: ResourceId, offer: Price) -> Self {
        Self {
            session_id,
            resource_id,
            current_offer: offer,
            rounds: 1,
            payment_token: None,
            opened_at: Utc::now(),
        }
    }

    /// Record a subsequent offer: replace the amount, bump the round counter
    pub fn record_offer(&mut self, offer: Price) {
        self.current_offer = offer;
        self.rounds += 1;
    }
}

/// Immutable record of a finished sale, keyed by payment token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedTransaction {
    /// Token that paid for the sale
    pub payment_token: PaymentToken,
    /// Resource that was sold
    pub resource_id: ResourceId,
    /// Final agreed price
    pub final_price: Price,
    /// When the artifact was released
    pub completed_at: DateTime<Utc>,
    /// When the released artifact stops being redeemable
    pub artifact_expires_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_open_and_record() {
        let mut session = NegotiationSession::open(
            SessionId::new("s1"),
            ResourceId::new("housing"),
            Price::new(5),
        );
        assert_eq!(session.rounds, 1);
        assert_eq!(session.current_offer, Price::new(5));
        assert!(session.payment_token.is_none());

        session.record_offer(Price::new(8));
        assert_eq!(session.rounds, 2);
        assert_eq!(session.current_offer, Price::new(8));
    }
}
