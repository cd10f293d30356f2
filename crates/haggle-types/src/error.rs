//! Error types for Haggle
//!
//! Every failure in the handshake is a structured error; nothing is
//! swallowed and nothing is retried inside the core. Recovery decisions
//! belong to the calling orchestration.

use thiserror::Error;

/// Result type for Haggle operations
pub type Result<T> = std::result::Result<T, HaggleError>;

/// Haggle error taxonomy
#[derive(Debug, Clone, Error)]
pub enum HaggleError {
    // ========================================================================
    // Catalog Errors
    // ========================================================================

    /// Caller referenced a catalog id that does not exist
    #[error("Resource {resource_id} not found in catalog")]
    ResourceNotFound { resource_id: String },

    // ========================================================================
    // Fulfillment Errors
    // ========================================================================

    /// Artifact release requested for a token with no matching session
    #[error("Payment token not found or invalid: {token}")]
    TokenNotFound { token: String },

    /// Token already has a completed transaction; the core idempotence guard
    #[error("Transaction for token {token} is already completed")]
    AlreadyCompleted { token: String },

    /// Receipt could not be dereferenced into a payment token
    #[error("Invalid receipt: {reason}")]
    InvalidReceipt { reason: String },

    /// Artifact redeemed after its validity window closed
    #[error("Artifact expired at {expired_at}")]
    ArtifactExpired { expired_at: String },

    /// Access key does not match any released artifact
    #[error("Unknown access key")]
    UnknownAccessKey,

    // ========================================================================
    // Price Errors
    // ========================================================================

    /// Overflow scaling a price to minor units
    #[error("Price overflow converting to minor units")]
    PriceOverflow,

    // ========================================================================
    // Upstream Errors
    // ========================================================================

    /// Payment gateway call failed; carries the upstream diagnostic
    #[error("Payment gateway failure: {message}")]
    Gateway { message: String },

    /// Peer-role messaging call failed
    #[error("Peer messaging failure: {message}")]
    Peer { message: String },

    // ========================================================================
    // General Errors
    // ========================================================================

    /// Invalid input
    #[error("Invalid input: {field} - {reason}")]
    InvalidInput { field: String, reason: String },
}

impl HaggleError {
    /// Create a resource-not-found error
    pub fn resource_not_found(resource_id: impl Into<String>) -> Self {
        Self::ResourceNotFound {
            resource_id: resource_id.into(),
        }
    }

    /// Create a token-not-found error
    pub fn token_not_found(token: impl Into<String>) -> Self {
        Self::TokenNotFound {
            token: token.into(),
        }
    }

    /// Create a gateway error from an upstream diagnostic
    pub fn gateway(message: impl Into<String>) -> Self {
        Self::Gateway {
            message: message.into(),
        }
    }

    /// Create a peer messaging error
    pub fn peer(message: impl Into<String>) -> Self {
        Self::Peer {
            message: message.into(),
        }
    }

    /// Create an invalid input error
    pub fn invalid_input(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Get an error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ResourceNotFound { .. } => "RESOURCE_NOT_FOUND",
            Self::TokenNotFound { .. } => "TOKEN_NOT_FOUND",
            Self::AlreadyCompleted { .. } => "ALREADY_COMPLETED",
            Self::InvalidReceipt { .. } => "INVALID_RECEIPT",
            Self::ArtifactExpired { .. } => "ARTIFACT_EXPIRED",
            Self::UnknownAccessKey => "UNKNOWN_ACCESS_KEY",
            Self::PriceOverflow => "PRICE_OVERFLOW",
            Self::Gateway { .. } => "GATEWAY_FAILURE",
            Self::Peer { .. } => "PEER_FAILURE",
            Self::InvalidInput { .. } => "INVALID_INPUT",
        }
    }
}
