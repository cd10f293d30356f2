//! Checkout - payment request issuance
//!
//! The single point where monetary amounts cross into the payment system.
//! Negotiated prices are whole units; the scale to minor units happens here
//! and nowhere else.

use crate::{Catalog, SessionStore};
use haggle_payments::PaymentGateway;
use haggle_types::{PaymentToken, Price, ResourceId, Result, SessionId};
use std::sync::Arc;

/// Issues payment requests for agreed prices
pub struct Checkout {
    catalog: Arc<Catalog>,
    store: Arc<SessionStore>,
    gateway: Arc<dyn PaymentGateway>,
}

impl Checkout {
    pub fn new(
        catalog: Arc<Catalog>,
        store: Arc<SessionStore>,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Self {
        Self {
            catalog,
            store,
            gateway,
        }
    }

    /// Mint a payment token for an agreed price and record it on the session.
    ///
    /// Fails with `ResourceNotFound` for unknown resource ids; gateway
    /// failures propagate unchanged. Creates the session if this is its
    /// first touch.
    pub async fn request_payment(
        &self,
        session_id: &SessionId,
        resource_id: &ResourceId,
        agreed_price: Price,
    ) -> Result<PaymentToken> {
        let resource = self.catalog.get(resource_id)?;
        let amount_minor = agreed_price.minor_units()?;
        let description = format!("{} ({} download)", resource.name, resource.format);

        let token = self
            .gateway
            .mint_payment_request(amount_minor, &description)
            .await?;

        self.store
            .attach_token(session_id, resource_id, agreed_price, token.clone());

        tracing::info!(
            session = %session_id,
            resource = %resource_id,
            price = %agreed_price,
            token = %token,
            "issued payment request"
        );
        Ok(token)
    }
}
