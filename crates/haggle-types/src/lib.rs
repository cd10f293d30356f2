//! Haggle Types - Canonical domain types for the negotiation handshake
//!
//! This crate defines the data model shared by every other haggle crate:
//! identifiers, prices, catalog resources, negotiation sessions, completed
//! transactions, download artifacts, and the error taxonomy. It depends on
//! no other haggle crate.

pub mod artifact;
pub mod error;
pub mod identity;
pub mod price;
pub mod resource;
pub mod session;

pub use artifact::*;
pub use error::*;
pub use identity::*;
pub use price::*;
pub use resource::*;
pub use session::*;
