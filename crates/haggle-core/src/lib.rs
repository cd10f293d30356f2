//! Haggle Core - The negotiation/payment handshake
//!
//! This crate is the protocol core both agent roles must honor, independent
//! of the natural-language wrapper around it:
//!
//! - [`catalog`]: immutable resource catalog with list and floor prices
//! - [`store`]: injected in-memory state for sessions, completed
//!   transactions, and released artifacts
//! - [`evaluator`]: the seller's offer evaluation state machine
//! - [`checkout`]: payment-request issuance against the gateway
//! - [`fulfillment`]: receipt-to-artifact resolution with double-release
//!   protection and enforced artifact expiry
//!
//! No HTTP, no HTML, no logging helpers live here; the crate is callable
//! from any transport.

pub mod catalog;
pub mod checkout;
pub mod evaluator;
pub mod fulfillment;
pub mod store;

pub use catalog::Catalog;
pub use checkout::Checkout;
pub use evaluator::{OfferEvaluator, OfferOutcome};
pub use fulfillment::{
    DirectResolver, Fulfillment, FulfillmentRequest, ReceiptDereferenceResolver, ReceiptResolver,
};
pub use store::SessionStore;
