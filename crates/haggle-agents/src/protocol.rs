//! Negotiation wire messages
//!
//! The protocol both roles must honor, independent of the natural-language
//! wrapper around it. Messages travel as tagged JSON; the LLM envelope
//! (phrasing a message as prose, reading intent out of prose) sits
//! strictly outside this enum and never changes its contents.

use haggle_types::{
    DownloadArtifact, PaymentToken, Price, Receipt, Resource, ResourceId, SessionId,
};
use serde::{Deserialize, Serialize};

/// A message in the buyer/seller handshake
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NegotiationMessage {
    /// Buyer asks what the seller has on offer
    Browse { session: SessionId },

    /// Seller's catalog listing
    Listing {
        session: SessionId,
        resources: Vec<Resource>,
    },

    /// Buyer asks about one resource
    Inquire {
        session: SessionId,
        resource: ResourceId,
    },

    /// Seller quotes the list price
    Quote {
        session: SessionId,
        resource: ResourceId,
        list_price: Price,
        description: String,
    },

    /// Buyer offers a price
    Offer {
        session: SessionId,
        resource: ResourceId,
        amount: Price,
    },

    /// Seller counters below-floor offers
    Counter {
        session: SessionId,
        resource: ResourceId,
        amount: Price,
        round: u32,
    },

    /// Seller accepted; pay this token to get the artifact
    PaymentRequest {
        session: SessionId,
        resource: ResourceId,
        price: Price,
        payment_token: PaymentToken,
    },

    /// Buyer executed the payment and presents proof
    PaymentSent {
        session: SessionId,
        payment_token: Option<PaymentToken>,
        receipt: Receipt,
    },

    /// Seller releases the download artifact
    Artifact {
        session: SessionId,
        artifact: DownloadArtifact,
    },

    /// Either side ends the conversation
    Reject {
        session: SessionId,
        code: String,
        reason: String,
    },
}

impl NegotiationMessage {
    /// The session this message belongs to
    pub fn session(&self) -> &SessionId {
        match self {
            Self::Browse { session }
            | Self::Listing { session, .. }
            | Self::Inquire { session, .. }
            | Self::Quote { session, .. }
            | Self::Offer { session, .. }
            | Self::Counter { session, .. }
            | Self::PaymentRequest { session, .. }
            | Self::PaymentSent { session, .. }
            | Self::Artifact { session, .. }
            | Self::Reject { session, .. } => session,
        }
    }

    /// Short label for transcripts and logs
    pub fn label(&self) -> &'static str {
        match self {
            Self::Browse { .. } => "browse",
            Self::Listing { .. } => "listing",
            Self::Inquire { .. } => "inquire",
            Self::Quote { .. } => "quote",
            Self::Offer { .. } => "offer",
            Self::Counter { .. } => "counter",
            Self::PaymentRequest { .. } => "payment_request",
            Self::PaymentSent { .. } => "payment_sent",
            Self::Artifact { .. } => "artifact",
            Self::Reject { .. } => "reject",
        }
    }
}

/// Terminal outcome of a buyer conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// A deal closed and the artifact was released
    Deal {
        resource: ResourceId,
        final_price: Price,
        artifact: DownloadArtifact,
    },
    /// The conversation ended without a sale
    NoDeal { reason: String },
}

impl Outcome {
    pub fn is_deal(&self) -> bool {
        matches!(self, Self::Deal { .. })
    }

    pub fn no_deal(reason: impl Into<String>) -> Self {
        Self::NoDeal {
            reason: reason.into(),
        }
    }
}
