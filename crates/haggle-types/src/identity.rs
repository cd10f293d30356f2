//! Identity types for Haggle
//!
//! Session ids are supplied by the caller and payment tokens/receipts are
//! minted by the external gateway, so these are strongly typed wrappers
//! around opaque strings rather than UUIDs generated here. The wrappers
//! exist to prevent accidental mixing of different id kinds.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Macro to generate opaque string id types with common implementations
macro_rules! define_opaque_id {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Wrap an existing identifier
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the raw identifier
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_opaque_id!(ResourceId, "Catalog identifier for a sellable resource");
define_opaque_id!(SessionId, "Caller-supplied identifier for a negotiation session");
define_opaque_id!(PaymentToken, "Opaque bearer credential minted by the payment gateway");
define_opaque_id!(ReceiptId, "Identifier of a payment receipt issued by the gateway");
define_opaque_id!(AccessKey, "Unguessable key granting access to a released artifact");

/// Opaque proof of completed payment, issued by the gateway.
///
/// The handshake never inspects its contents; the receipt-dereference
/// resolver variant asks the gateway to recover the embedded payment token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Receipt(pub String);

impl Receipt {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Receipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
