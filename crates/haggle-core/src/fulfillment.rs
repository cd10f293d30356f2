//! Fulfillment - receipt-to-artifact resolution
//!
//! Turning proof of payment into a download artifact. Two resolver
//! variants exist as one polymorphic capability, selected by configuration:
//! direct token lookup, or dereferencing a receipt to recover the embedded
//! token. Either way the release path is the same: reject unknown tokens,
//! reject tokens that already completed, mint an unguessable access key,
//! record the completed transaction, and delete the session.
//!
//! Artifact expiry is enforced at redeem time; the advertised 48-hour
//! window is a real contract, not documentation.

use crate::{Catalog, SessionStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use haggle_payments::PaymentGateway;
use haggle_types::{
    AccessKey, CompletedTransaction, DownloadArtifact, HaggleError, PaymentToken, Receipt,
    ReceiptId, Result,
};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Evidence of payment presented for artifact release
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FulfillmentRequest {
    /// Payment token, when the caller holds it directly
    pub payment_token: Option<PaymentToken>,
    /// Receipt identifier quoted alongside a direct token
    pub receipt_id: Option<ReceiptId>,
    /// Opaque receipt, when only proof of payment is in hand
    pub receipt: Option<Receipt>,
}

impl FulfillmentRequest {
    /// Direct-token evidence (resolver variant A)
    pub fn direct(token: PaymentToken, receipt_id: ReceiptId) -> Self {
        Self {
            payment_token: Some(token),
            receipt_id: Some(receipt_id),
            receipt: None,
        }
    }

    /// Receipt-only evidence (resolver variant B)
    pub fn from_receipt(receipt: Receipt) -> Self {
        Self {
            payment_token: None,
            receipt_id: None,
            receipt: Some(receipt),
        }
    }
}

/// Recovers the payment token from fulfillment evidence
#[async_trait]
pub trait ReceiptResolver: Send + Sync {
    async fn payment_token(&self, request: &FulfillmentRequest) -> Result<PaymentToken>;
}

/// Variant A: the caller supplies the payment token directly
pub struct DirectResolver;

#[async_trait]
impl ReceiptResolver for DirectResolver {
    async fn payment_token(&self, request: &FulfillmentRequest) -> Result<PaymentToken> {
        request.payment_token.clone().ok_or_else(|| {
            HaggleError::invalid_input("payment_token", "direct resolver requires a payment token")
        })
    }
}

/// Variant B: dereference the receipt to recover the embedded token
pub struct ReceiptDereferenceResolver {
    gateway: Arc<dyn PaymentGateway>,
}

impl ReceiptDereferenceResolver {
    pub fn new(gateway: Arc<dyn PaymentGateway>) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl ReceiptResolver for ReceiptDereferenceResolver {
    async fn payment_token(&self, request: &FulfillmentRequest) -> Result<PaymentToken> {
        let receipt = request.receipt.as_ref().ok_or_else(|| {
            HaggleError::invalid_input("receipt", "receipt resolver requires a receipt")
        })?;
        self.gateway.recover_token(receipt).await
    }
}

/// Releases and redeems download artifacts
pub struct Fulfillment {
    catalog: Arc<Catalog>,
    store: Arc<SessionStore>,
    resolver: Arc<dyn ReceiptResolver>,
}

impl Fulfillment {
    pub fn new(
        catalog: Arc<Catalog>,
        store: Arc<SessionStore>,
        resolver: Arc<dyn ReceiptResolver>,
    ) -> Self {
        Self {
            catalog,
            store,
            resolver,
        }
    }

    /// Release the artifact for a paid session.
    ///
    /// Fails `TokenNotFound` when no active session carries the token and
    /// `AlreadyCompleted` when the token has already released an artifact.
    /// Double release is never permitted, including under races: the
    /// completed-transaction insert is atomic per token.
    pub async fn release(&self, request: &FulfillmentRequest) -> Result<DownloadArtifact> {
        let token = self.resolver.payment_token(request).await?;

        if self.store.is_completed(&token) {
            return Err(HaggleError::AlreadyCompleted {
                token: token.0.clone(),
            });
        }

        let session = self
            .store
            .find_by_token(&token)
            .ok_or_else(|| HaggleError::token_not_found(token.as_str()))?;
        let resource = self.catalog.get(&session.resource_id)?;

        let now = Utc::now();
        let artifact = DownloadArtifact {
            resource_id: resource.id.clone(),
            url: format!("https://files.haggle.sh/{}.{}", resource.id, resource.format),
            access_key: Self::mint_access_key(),
            expires_at: DownloadArtifact::expiry_from(now),
        };

        self.store.complete(CompletedTransaction {
            payment_token: token.clone(),
            resource_id: resource.id.clone(),
            final_price: session.current_offer,
            completed_at: now,
            artifact_expires_at: artifact.expires_at,
        })?;
        self.store.insert_artifact(artifact.clone());

        tracing::info!(
            token = %token,
            resource = %resource.id,
            price = %session.current_offer,
            expires_at = %artifact.expires_at,
            "released artifact"
        );
        Ok(artifact)
    }

    /// Redeem an access key, enforcing the validity window
    pub fn redeem(&self, key: &AccessKey) -> Result<DownloadArtifact> {
        self.redeem_at(key, Utc::now())
    }

    /// Redeem at an explicit instant; the expiry check is testable this way
    pub fn redeem_at(&self, key: &AccessKey, now: DateTime<Utc>) -> Result<DownloadArtifact> {
        let artifact = self
            .store
            .artifact(key)
            .ok_or(HaggleError::UnknownAccessKey)?;

        if !artifact.is_valid_at(now) {
            return Err(HaggleError::ArtifactExpired {
                expired_at: artifact.expires_at.to_rfc3339(),
            });
        }
        Ok(artifact)
    }

    /// 256-bit CSPRNG access key, hex encoded
    fn mint_access_key() -> AccessKey {
        let mut bytes = [0u8; 32];
        OsRng.fill_bytes(&mut bytes);
        AccessKey::new(hex::encode(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use haggle_payments::MockGateway;
    use haggle_types::{Price, ResourceId, SessionId};

    struct Fixture {
        store: Arc<SessionStore>,
        gateway: Arc<MockGateway>,
        fulfillment: Fulfillment,
    }

    fn fixture(resolver: Arc<dyn ReceiptResolver>) -> Fixture {
        let catalog = Arc::new(Catalog::demo());
        let store = Arc::new(SessionStore::new());
        let gateway = Arc::new(MockGateway::new());
        let fulfillment = Fulfillment::new(catalog, store.clone(), resolver);
        Fixture {
            store,
            gateway,
            fulfillment,
        }
    }

    fn direct_fixture() -> Fixture {
        fixture(Arc::new(DirectResolver))
    }

    async fn paid_session(fx: &Fixture, session: &str) -> PaymentToken {
        let token = fx.gateway.mint_payment_request(800, "housing").await.unwrap();
        fx.store.attach_token(
            &SessionId::new(session),
            &ResourceId::new("housing"),
            Price::new(8),
            token.clone(),
        );
        token
    }

    #[tokio::test]
    async fn test_release_then_double_release_fails() {
        let fx = direct_fixture();
        let token = paid_session(&fx, "s1").await;
        let request = FulfillmentRequest::direct(token.clone(), ReceiptId::new("r1"));

        let artifact = fx.fulfillment.release(&request).await.unwrap();
        assert_eq!(artifact.resource_id, ResourceId::new("housing"));
        assert_eq!(artifact.access_key.as_str().len(), 64);
        assert!(fx.store.session(&SessionId::new("s1")).is_none());

        let err = fx.fulfillment.release(&request).await.unwrap_err();
        assert_eq!(err.error_code(), "ALREADY_COMPLETED");
    }

    #[tokio::test]
    async fn test_release_unknown_token_fails() {
        let fx = direct_fixture();
        let request = FulfillmentRequest::direct(
            PaymentToken::new("payreq_never_issued"),
            ReceiptId::new("r1"),
        );
        let err = fx.fulfillment.release(&request).await.unwrap_err();
        assert_eq!(err.error_code(), "TOKEN_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_receipt_dereference_variant() {
        let catalog = Arc::new(Catalog::demo());
        let store = Arc::new(SessionStore::new());
        let gateway = Arc::new(MockGateway::new());
        let fulfillment = Fulfillment::new(
            catalog,
            store.clone(),
            Arc::new(ReceiptDereferenceResolver::new(gateway.clone())),
        );

        let token = gateway.mint_payment_request(800, "housing").await.unwrap();
        store.attach_token(
            &SessionId::new("s1"),
            &ResourceId::new("housing"),
            Price::new(8),
            token.clone(),
        );
        let receipt = gateway.execute_payment(&token).await.unwrap();

        let artifact = fulfillment
            .release(&FulfillmentRequest::from_receipt(receipt))
            .await
            .unwrap();
        assert_eq!(artifact.resource_id, ResourceId::new("housing"));

        let tx = store.completed_transaction(&token).unwrap();
        assert_eq!(tx.final_price, Price::new(8));
    }

    #[tokio::test]
    async fn test_direct_resolver_rejects_tokenless_request() {
        let fx = direct_fixture();
        let request = FulfillmentRequest::from_receipt(Receipt::new("rcpt_x.payreq_y"));
        let err = fx.fulfillment.release(&request).await.unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");
    }

    #[tokio::test]
    async fn test_redeem_enforces_expiry() {
        let fx = direct_fixture();
        let token = paid_session(&fx, "s1").await;
        let artifact = fx
            .fulfillment
            .release(&FulfillmentRequest::direct(token, ReceiptId::new("r1")))
            .await
            .unwrap();

        // Within the window
        assert!(fx.fulfillment.redeem(&artifact.access_key).is_ok());

        // Past the window
        let later = artifact.expires_at + Duration::minutes(1);
        let err = fx
            .fulfillment
            .redeem_at(&artifact.access_key, later)
            .unwrap_err();
        assert_eq!(err.error_code(), "ARTIFACT_EXPIRED");
    }

    #[tokio::test]
    async fn test_redeem_unknown_key_fails() {
        let fx = direct_fixture();
        let err = fx
            .fulfillment
            .redeem(&AccessKey::new("deadbeef"))
            .unwrap_err();
        assert_eq!(err.error_code(), "UNKNOWN_ACCESS_KEY");
    }

    #[tokio::test]
    async fn test_access_keys_are_distinct() {
        let fx = direct_fixture();
        let t1 = paid_session(&fx, "s1").await;
        let t2 = paid_session(&fx, "s2").await;

        let a1 = fx
            .fulfillment
            .release(&FulfillmentRequest::direct(t1, ReceiptId::new("r1")))
            .await
            .unwrap();
        let a2 = fx
            .fulfillment
            .release(&FulfillmentRequest::direct(t2, ReceiptId::new("r2")))
            .await
            .unwrap();
        assert_ne!(a1.access_key, a2.access_key);
    }
}
