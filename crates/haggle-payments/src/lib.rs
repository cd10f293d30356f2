//! Haggle Payments - Payment gateway abstraction
//!
//! The handshake treats the payment system as an opaque external
//! collaborator with three capabilities: mint a payment request, execute a
//! payment, and recover the token embedded in a receipt. Tokens and
//! receipts are bearer strings; the core never constructs or validates
//! their contents itself.
//!
//! `MockGateway` is an in-process implementation for demos and tests. It
//! issues unguessable tokens and receipts but performs no real money
//! movement and no cryptography beyond CSPRNG token generation.

pub mod remote;

pub use remote::{HttpGateway, MintBody, ReceiptBody, TokenBody};

use async_trait::async_trait;
use dashmap::DashMap;
use haggle_types::{HaggleError, PaymentToken, Receipt, Result};
use rand::rngs::OsRng;
use rand::RngCore;

/// External payment system capabilities consumed by the handshake.
///
/// All three calls are fallible, awaited, and carry no internal timeout or
/// retry; failures propagate to the caller as `HaggleError::Gateway`.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Mint a payment token for `amount_minor` minor units (cents)
    async fn mint_payment_request(
        &self,
        amount_minor: u64,
        description: &str,
    ) -> Result<PaymentToken>;

    /// Execute a previously minted payment request, producing a receipt
    async fn execute_payment(&self, token: &PaymentToken) -> Result<Receipt>;

    /// Recover the payment token embedded in a receipt
    async fn recover_token(&self, receipt: &Receipt) -> Result<PaymentToken>;
}

/// State of a minted payment request inside the mock gateway
#[derive(Debug, Clone)]
struct MintedRequest {
    amount_minor: u64,
    description: String,
    executed: bool,
}

/// In-process gateway that simulates the external payment SDK
#[derive(Default)]
pub struct MockGateway {
    requests: DashMap<PaymentToken, MintedRequest>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Amount (minor units) a token was minted for, if known
    pub fn minted_amount(&self, token: &PaymentToken) -> Option<u64> {
        self.requests.get(token).map(|r| r.amount_minor)
    }

    fn random_suffix() -> String {
        let mut bytes = [0u8; 16];
        OsRng.fill_bytes(&mut bytes);
        hex::encode(bytes)
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn mint_payment_request(
        &self,
        amount_minor: u64,
        description: &str,
    ) -> Result<PaymentToken> {
        let token = PaymentToken::new(format!("payreq_{}", Self::random_suffix()));
        self.requests.insert(
            token.clone(),
            MintedRequest {
                amount_minor,
                description: description.to_string(),
                executed: false,
            },
        );
        tracing::debug!(token = %token, amount_minor, "minted payment request");
        Ok(token)
    }

    async fn execute_payment(&self, token: &PaymentToken) -> Result<Receipt> {
        let mut entry = self
            .requests
            .get_mut(token)
            .ok_or_else(|| HaggleError::gateway(format!("unknown payment token {}", token)))?;

        if entry.executed {
            return Err(HaggleError::gateway(format!(
                "payment token {} already executed",
                token
            )));
        }
        entry.executed = true;

        // Receipt embeds the token after the nonce so recover_token can
        // extract it without any gateway round trip.
        let receipt = Receipt::new(format!("rcpt_{}.{}", Self::random_suffix(), token));
        tracing::debug!(token = %token, description = %entry.description, "executed payment");
        Ok(receipt)
    }

    async fn recover_token(&self, receipt: &Receipt) -> Result<PaymentToken> {
        let (prefix, token) = receipt.as_str().split_once('.').ok_or_else(|| {
            HaggleError::InvalidReceipt {
                reason: "receipt carries no embedded token".to_string(),
            }
        })?;

        if !prefix.starts_with("rcpt_") {
            return Err(HaggleError::InvalidReceipt {
                reason: "unrecognized receipt format".to_string(),
            });
        }

        Ok(PaymentToken::new(token))
    }
}
