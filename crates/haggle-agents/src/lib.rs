//! Haggle Agents - Buyer and Seller roles
//!
//! The two scripted roles that speak the negotiation handshake:
//!
//! - [`protocol`]: the wire messages both roles exchange, and the terminal
//!   conversation outcome
//! - [`strategy`]: the buyer's budget-constrained offer heuristic
//! - [`brain`]: LLM phrasing with deterministic fallback; the brain never
//!   decides money
//! - [`link`]: peer messaging, in-process or over HTTP
//! - [`seller`]: the seller role - catalog quotes, offer evaluation,
//!   payment requests, artifact release, 8-step budget per session
//! - [`buyer`]: the buyer role - instruction interpretation, negotiation
//!   loop, payment execution, 12-step budget per conversation

pub mod brain;
pub mod buyer;
pub mod link;
pub mod protocol;
pub mod seller;
pub mod strategy;

pub use brain::AgentBrain;
pub use buyer::{BuyerAgent, Conversation, TranscriptLine};
pub use link::{HttpLink, InProcessLink, PeerLink};
pub use protocol::{NegotiationMessage, Outcome};
pub use seller::SellerAgent;
pub use strategy::{CounterDecision, OfferStrategy};
