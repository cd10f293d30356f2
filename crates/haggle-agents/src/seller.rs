//! Seller Agent - quotes the catalog, haggles, gets paid, ships artifacts
//!
//! The seller is a message handler over the handshake core: every inbound
//! protocol message produces exactly one reply. Domain failures (unknown
//! resource, bad token, double release, gateway trouble) become `Reject`
//! replies carrying the structured error code, so the conversation always
//! ends explicitly.

use std::sync::Arc;

use dashmap::DashMap;
use haggle_core::{
    Catalog, Checkout, Fulfillment, FulfillmentRequest, OfferEvaluator, OfferOutcome,
    ReceiptResolver, SessionStore,
};
use haggle_payments::PaymentGateway;
use haggle_types::{HaggleError, ReceiptId, SessionId};

use crate::protocol::NegotiationMessage;

/// Conversation step budget enforced per session on the seller side
pub const SELLER_STEP_BUDGET: u32 = 8;

/// The Seller Agent
pub struct SellerAgent {
    catalog: Arc<Catalog>,
    store: Arc<SessionStore>,
    evaluator: OfferEvaluator,
    checkout: Checkout,
    fulfillment: Fulfillment,
    steps: DashMap<SessionId, u32>,
    step_budget: u32,
}

impl SellerAgent {
    /// Wire a seller over injected state, gateway, and resolver variant
    pub fn new(
        catalog: Arc<Catalog>,
        store: Arc<SessionStore>,
        gateway: Arc<dyn PaymentGateway>,
        resolver: Arc<dyn ReceiptResolver>,
    ) -> Self {
        Self {
            evaluator: OfferEvaluator::new(catalog.clone(), store.clone()),
            checkout: Checkout::new(catalog.clone(), store.clone(), gateway),
            fulfillment: Fulfillment::new(catalog.clone(), store.clone(), resolver),
            catalog,
            store,
            steps: DashMap::new(),
            step_budget: SELLER_STEP_BUDGET,
        }
    }

    /// The catalog this seller quotes from
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// The injected handshake state
    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// Fulfillment component, exposed for the redeem HTTP endpoint
    pub fn fulfillment(&self) -> &Fulfillment {
        &self.fulfillment
    }

    /// Handle one inbound message, producing exactly one reply
    pub async fn handle(&self, message: NegotiationMessage) -> NegotiationMessage {
        let session = message.session().clone();

        if self.consume_step(&session) > self.step_budget {
            tracing::warn!(session = %session, "seller step budget exhausted");
            return NegotiationMessage::Reject {
                session,
                code: "STEP_BUDGET_EXHAUSTED".to_string(),
                reason: format!("conversation exceeded {} seller steps", self.step_budget),
            };
        }

        match self.dispatch(message).await {
            Ok(reply) => reply,
            Err(err) => {
                tracing::warn!(session = %session, error = %err, "seller rejecting");
                NegotiationMessage::Reject {
                    session,
                    code: err.error_code().to_string(),
                    reason: err.to_string(),
                }
            }
        }
    }

    fn consume_step(&self, session: &SessionId) -> u32 {
        let mut count = self.steps.entry(session.clone()).or_insert(0);
        *count += 1;
        *count
    }

    async fn dispatch(
        &self,
        message: NegotiationMessage,
    ) -> Result<NegotiationMessage, HaggleError> {
        match message {
            NegotiationMessage::Browse { session } => Ok(NegotiationMessage::Listing {
                session,
                resources: self.catalog.list().into_iter().cloned().collect(),
            }),

            NegotiationMessage::Inquire { session, resource } => {
                let entry = self.catalog.get(&resource)?;
                Ok(NegotiationMessage::Quote {
                    session,
                    resource,
                    list_price: entry.list_price,
                    description: entry.description.clone(),
                })
            }

            NegotiationMessage::Offer {
                session,
                resource,
                amount,
            } => {
                let (outcome, state) = self.evaluator.evaluate(&session, &resource, amount)?;
                match outcome {
                    OfferOutcome::Counter { price } => Ok(NegotiationMessage::Counter {
                        session,
                        resource,
                        amount: price,
                        round: state.rounds,
                    }),
                    OfferOutcome::AcceptAtList { price }
                    | OfferOutcome::AcceptAtOffer { price } => {
                        let token = self
                            .checkout
                            .request_payment(&session, &resource, price)
                            .await?;
                        Ok(NegotiationMessage::PaymentRequest {
                            session,
                            resource,
                            price,
                            payment_token: token,
                        })
                    }
                }
            }

            NegotiationMessage::PaymentSent {
                session,
                payment_token,
                receipt,
            } => {
                let request = FulfillmentRequest {
                    payment_token,
                    receipt_id: Some(ReceiptId::new(receipt.as_str())),
                    receipt: Some(receipt),
                };
                let artifact = self.fulfillment.release(&request).await?;
                self.steps.remove(&session);
                Ok(NegotiationMessage::Artifact { session, artifact })
            }

            // Seller-originated messages arriving inbound are a protocol
            // violation by the peer.
            other => Err(HaggleError::invalid_input(
                "message",
                format!("seller cannot handle '{}' messages", other.label()),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use haggle_core::DirectResolver;
    use haggle_payments::MockGateway;
    use haggle_types::{Price, ResourceId};

    fn seller() -> (SellerAgent, Arc<MockGateway>) {
        let gateway = Arc::new(MockGateway::new());
        let seller = SellerAgent::new(
            Arc::new(Catalog::demo()),
            Arc::new(SessionStore::new()),
            gateway.clone(),
            Arc::new(DirectResolver),
        );
        (seller, gateway)
    }

    fn offer(session: &str, resource: &str, amount: u64) -> NegotiationMessage {
        NegotiationMessage::Offer {
            session: SessionId::new(session),
            resource: ResourceId::new(resource),
            amount: Price::new(amount),
        }
    }

    #[tokio::test]
    async fn test_browse_lists_catalog() {
        let (seller, _) = seller();
        let reply = seller
            .handle(NegotiationMessage::Browse {
                session: SessionId::new("s1"),
            })
            .await;
        match reply {
            NegotiationMessage::Listing { resources, .. } => assert_eq!(resources.len(), 3),
            other => panic!("unexpected reply: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_low_offer_draws_counter() {
        let (seller, _) = seller();
        let reply = seller.handle(offer("s1", "housing", 5)).await;
        match reply {
            NegotiationMessage::Counter { amount, round, .. } => {
                assert_eq!(amount, Price::new(8));
                assert_eq!(round, 1);
            }
            other => panic!("unexpected reply: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_acceptable_offer_yields_payment_request() {
        let (seller, gateway) = seller();
        let reply = seller.handle(offer("s1", "housing", 8)).await;
        match reply {
            NegotiationMessage::PaymentRequest {
                price,
                payment_token,
                ..
            } => {
                assert_eq!(price, Price::new(8));
                assert_eq!(gateway.minted_amount(&payment_token), Some(800));
            }
            other => panic!("unexpected reply: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_overbid_clamped_to_list() {
        let (seller, _) = seller();
        let reply = seller.handle(offer("s1", "housing", 12)).await;
        match reply {
            NegotiationMessage::PaymentRequest { price, .. } => {
                assert_eq!(price, Price::new(10));
            }
            other => panic!("unexpected reply: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unknown_resource_rejected_with_code() {
        let (seller, _) = seller();
        let reply = seller.handle(offer("s1", "nope", 5)).await;
        match reply {
            NegotiationMessage::Reject { code, .. } => assert_eq!(code, "RESOURCE_NOT_FOUND"),
            other => panic!("unexpected reply: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_full_handshake_releases_artifact_once() {
        let (seller, gateway) = seller();

        let token = match seller.handle(offer("s1", "housing", 8)).await {
            NegotiationMessage::PaymentRequest { payment_token, .. } => payment_token,
            other => panic!("unexpected reply: {other:?}"),
        };
        let receipt = gateway.execute_payment(&token).await.unwrap();

        let paid = NegotiationMessage::PaymentSent {
            session: SessionId::new("s1"),
            payment_token: Some(token),
            receipt,
        };

        match seller.handle(paid.clone()).await {
            NegotiationMessage::Artifact { artifact, .. } => {
                assert_eq!(artifact.resource_id, ResourceId::new("housing"));
            }
            other => panic!("unexpected reply: {other:?}"),
        }

        // Replaying the same payment proof must fail the idempotence guard.
        match seller.handle(paid).await {
            NegotiationMessage::Reject { code, .. } => assert_eq!(code, "ALREADY_COMPLETED"),
            other => panic!("unexpected reply: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_step_budget_exhaustion_is_explicit() {
        let (seller, _) = seller();
        let mut last = None;
        for _ in 0..=SELLER_STEP_BUDGET {
            last = Some(seller.handle(offer("s1", "housing", 1)).await);
        }
        match last.unwrap() {
            NegotiationMessage::Reject { code, .. } => {
                assert_eq!(code, "STEP_BUDGET_EXHAUSTED");
            }
            other => panic!("unexpected reply: {other:?}"),
        }
    }
}
