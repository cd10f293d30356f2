//! Buyer Agent - holds a budget, haggles, pays, collects the artifact
//!
//! The buyer drives the conversation: it browses the seller's catalog,
//! matches the driver's free-text instruction to a resource, negotiates
//! within its budget, executes the payment request, and hands the released
//! artifact back to the caller. Every conversation ends in an explicit
//! outcome - a deal, or a no-deal with its reason - within a 12-step
//! budget.

use std::sync::Arc;

use haggle_payments::PaymentGateway;
use haggle_types::{Price, Result, SessionId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::brain::AgentBrain;
use crate::link::PeerLink;
use crate::protocol::{NegotiationMessage, Outcome};
use crate::strategy::{CounterDecision, OfferStrategy};

/// Conversation step budget on the buyer side (messages sent)
pub const BUYER_STEP_BUDGET: u32 = 12;

/// One line of the negotiation transcript
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptLine {
    pub speaker: String,
    pub text: String,
}

/// A finished conversation: its outcome plus the prose transcript
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub session: SessionId,
    pub outcome: Outcome,
    pub steps: u32,
    pub transcript: Vec<TranscriptLine>,
}

/// The Buyer Agent
pub struct BuyerAgent {
    strategy: OfferStrategy,
    link: Arc<dyn PeerLink>,
    gateway: Arc<dyn PaymentGateway>,
    brain: AgentBrain,
    step_budget: u32,
}

impl BuyerAgent {
    pub fn new(
        budget: Price,
        link: Arc<dyn PeerLink>,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Self {
        Self {
            strategy: OfferStrategy::new(budget),
            link,
            gateway,
            brain: AgentBrain::deterministic(),
            step_budget: BUYER_STEP_BUDGET,
        }
    }

    /// Create with an LLM-backed brain
    pub fn with_brain(
        budget: Price,
        link: Arc<dyn PeerLink>,
        gateway: Arc<dyn PaymentGateway>,
        brain: AgentBrain,
    ) -> Self {
        Self {
            strategy: OfferStrategy::new(budget),
            link,
            gateway,
            brain,
            step_budget: BUYER_STEP_BUDGET,
        }
    }

    pub fn budget(&self) -> Price {
        self.strategy.budget()
    }

    /// Run one free-text instruction to an explicit outcome.
    ///
    /// Peer and gateway failures propagate as errors; everything the
    /// protocol can express ends as a `Deal` or `NoDeal` outcome.
    pub async fn run_instruction(&self, instruction: &str) -> Result<Conversation> {
        let session = SessionId::new(format!("sess_{}", Uuid::new_v4()));
        let mut transcript = Vec::new();
        let mut steps = 0u32;

        tracing::info!(session = %session, instruction, "buyer starting conversation");

        // Find out what the seller has.
        let reply = self
            .exchange(
                &mut transcript,
                &mut steps,
                NegotiationMessage::Browse {
                    session: session.clone(),
                },
            )
            .await?;
        let resources = match reply {
            NegotiationMessage::Listing { resources, .. } => resources,
            other => return Ok(self.finish(session, steps, transcript, Self::unexpected(&other))),
        };

        // Match the instruction against the listing.
        let Some(resource) = self.brain.interpret_instruction(instruction, &resources).await
        else {
            return Ok(self.finish(
                session,
                steps,
                transcript,
                Outcome::no_deal("no catalog entry matches the instruction"),
            ));
        };

        // Get the asking price.
        let reply = self
            .exchange(
                &mut transcript,
                &mut steps,
                NegotiationMessage::Inquire {
                    session: session.clone(),
                    resource: resource.clone(),
                },
            )
            .await?;
        let list_price = match reply {
            NegotiationMessage::Quote { list_price, .. } => list_price,
            NegotiationMessage::Reject { reason, .. } => {
                return Ok(self.finish(session, steps, transcript, Outcome::no_deal(reason)))
            }
            other => return Ok(self.finish(session, steps, transcript, Self::unexpected(&other))),
        };

        // Haggle until accepted, rejected, walked away, or out of steps.
        let mut offer = match self.strategy.opening_offer(list_price) {
            Ok(offer) => offer,
            Err(err) => {
                return Ok(self.finish(
                    session,
                    steps,
                    transcript,
                    Outcome::no_deal(format!("cannot bid against quoted price {list_price}: {err}")),
                ))
            }
        };
        loop {
            if steps >= self.step_budget {
                return Ok(self.finish(
                    session,
                    steps,
                    transcript,
                    Outcome::no_deal(format!("step budget of {} exhausted", self.step_budget)),
                ));
            }

            let reply = self
                .exchange(
                    &mut transcript,
                    &mut steps,
                    NegotiationMessage::Offer {
                        session: session.clone(),
                        resource: resource.clone(),
                        amount: offer,
                    },
                )
                .await?;

            match reply {
                NegotiationMessage::Counter { amount, .. } => {
                    match self.strategy.on_counter(amount, offer) {
                        CounterDecision::Accept(next) | CounterDecision::Raise(next) => {
                            offer = next;
                        }
                        CounterDecision::WalkAway => {
                            return Ok(self.finish(
                                session,
                                steps,
                                transcript,
                                Outcome::no_deal(format!(
                                    "seller wants {amount}, budget is {}",
                                    self.budget()
                                )),
                            ));
                        }
                    }
                }

                NegotiationMessage::PaymentRequest {
                    price,
                    payment_token,
                    resource,
                    ..
                } => {
                    // The evaluator never accepts above our own offer, but
                    // a misbehaving seller could; re-check the budget.
                    if price > self.budget() {
                        return Ok(self.finish(
                            session,
                            steps,
                            transcript,
                            Outcome::no_deal(format!("agreed price {price} exceeds budget")),
                        ));
                    }

                    let receipt = self.gateway.execute_payment(&payment_token).await?;
                    let reply = self
                        .exchange(
                            &mut transcript,
                            &mut steps,
                            NegotiationMessage::PaymentSent {
                                session: session.clone(),
                                payment_token: Some(payment_token),
                                receipt,
                            },
                        )
                        .await?;

                    let outcome = match reply {
                        NegotiationMessage::Artifact { artifact, .. } => Outcome::Deal {
                            resource,
                            final_price: price,
                            artifact,
                        },
                        NegotiationMessage::Reject { reason, .. } => Outcome::no_deal(reason),
                        other => Self::unexpected(&other),
                    };
                    return Ok(self.finish(session, steps, transcript, outcome));
                }

                NegotiationMessage::Reject { reason, .. } => {
                    return Ok(self.finish(session, steps, transcript, Outcome::no_deal(reason)))
                }

                other => {
                    return Ok(self.finish(session, steps, transcript, Self::unexpected(&other)))
                }
            }
        }
    }

    /// Send one message, recording both sides of the exchange as prose
    async fn exchange(
        &self,
        transcript: &mut Vec<TranscriptLine>,
        steps: &mut u32,
        message: NegotiationMessage,
    ) -> Result<NegotiationMessage> {
        *steps += 1;
        transcript.push(TranscriptLine {
            speaker: "buyer".to_string(),
            text: self.brain.phrase("buyer", &message).await,
        });

        let reply = self.link.send(&message).await?;

        transcript.push(TranscriptLine {
            speaker: "seller".to_string(),
            text: self.brain.phrase("seller", &reply).await,
        });
        tracing::debug!(sent = message.label(), got = reply.label(), step = *steps, "exchange");
        Ok(reply)
    }

    fn finish(
        &self,
        session: SessionId,
        steps: u32,
        transcript: Vec<TranscriptLine>,
        outcome: Outcome,
    ) -> Conversation {
        match &outcome {
            Outcome::Deal {
                resource,
                final_price,
                ..
            } => tracing::info!(session = %session, %resource, price = %final_price, "deal closed"),
            Outcome::NoDeal { reason } => {
                tracing::info!(session = %session, reason, "conversation ended without a deal")
            }
        }
        Conversation {
            session,
            outcome,
            steps,
            transcript,
        }
    }

    fn unexpected(message: &NegotiationMessage) -> Outcome {
        Outcome::no_deal(format!("unexpected '{}' reply from seller", message.label()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::InProcessLink;
    use crate::seller::SellerAgent;
    use haggle_core::{Catalog, DirectResolver, SessionStore};
    use haggle_payments::MockGateway;
    use haggle_types::{Resource, ResourceId};

    fn buyer_with_budget(budget: u64) -> (BuyerAgent, Arc<SessionStore>) {
        let store = Arc::new(SessionStore::new());
        let gateway = Arc::new(MockGateway::new());
        let seller = Arc::new(SellerAgent::new(
            Arc::new(Catalog::demo()),
            store.clone(),
            gateway.clone(),
            Arc::new(DirectResolver),
        ));
        let buyer = BuyerAgent::new(
            Price::new(budget),
            Arc::new(InProcessLink::new(seller)),
            gateway,
        );
        (buyer, store)
    }

    #[tokio::test]
    async fn test_affordable_list_price_closes_at_list() {
        let (buyer, store) = buyer_with_budget(20);
        let conversation = buyer
            .run_instruction("buy the housing dataset")
            .await
            .unwrap();

        match conversation.outcome {
            Outcome::Deal {
                resource,
                final_price,
                artifact,
            } => {
                assert_eq!(resource, ResourceId::new("housing"));
                assert_eq!(final_price, Price::new(10));
                assert_eq!(artifact.access_key.as_str().len(), 64);
            }
            other => panic!("expected deal, got {other:?}"),
        }
        // Session cleaned up after release.
        assert_eq!(store.active_sessions(), 0);
        assert_eq!(store.completed_count(), 1);
    }

    #[tokio::test]
    async fn test_negotiated_deal_below_list() {
        // budget 12, llm_paper list 13 floor 12: opening floor(13*0.8)=10,
        // counter max(12, 11)=12, accepted at 12.
        let (buyer, _) = buyer_with_budget(12);
        let conversation = buyer
            .run_instruction("get me the llm_paper survey")
            .await
            .unwrap();

        match conversation.outcome {
            Outcome::Deal { final_price, .. } => assert_eq!(final_price, Price::new(12)),
            other => panic!("expected deal, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_budget_below_floor_walks_away() {
        // budget 10, llm_paper list 13 floor 12: counter 12 exceeds the
        // budget with no room to raise - explicit no-deal, not silent
        // step exhaustion.
        let (buyer, store) = buyer_with_budget(10);
        let conversation = buyer
            .run_instruction("buy the llm_paper for me")
            .await
            .unwrap();

        match conversation.outcome {
            Outcome::NoDeal { reason } => {
                assert!(reason.contains("$12"), "reason was: {reason}");
            }
            other => panic!("expected no-deal, got {other:?}"),
        }
        assert!(conversation.steps <= BUYER_STEP_BUDGET);
        assert_eq!(store.completed_count(), 0);
    }

    #[tokio::test]
    async fn test_overflowing_quote_is_no_deal() {
        // A seller quoting u64::MAX must not wrap or panic the opening
        // offer math; the conversation ends with an explicit no-deal.
        let store = Arc::new(SessionStore::new());
        let gateway = Arc::new(MockGateway::new());
        let catalog = Catalog::new(vec![Resource {
            id: ResourceId::new("archive"),
            name: "Complete Archive".to_string(),
            description: "Everything ever listed".to_string(),
            format: "zip".to_string(),
            size: "900 GB".to_string(),
            list_price: Price::new(u64::MAX),
            floor_price: Price::new(u64::MAX),
            category: "datasets".to_string(),
        }])
        .unwrap();
        let seller = Arc::new(SellerAgent::new(
            Arc::new(catalog),
            store,
            gateway.clone(),
            Arc::new(DirectResolver),
        ));
        let buyer = BuyerAgent::new(
            Price::new(50),
            Arc::new(InProcessLink::new(seller)),
            gateway,
        );

        let conversation = buyer
            .run_instruction("buy the complete archive")
            .await
            .unwrap();
        match conversation.outcome {
            Outcome::NoDeal { reason } => {
                assert!(reason.contains("quoted price"), "reason was: {reason}");
            }
            other => panic!("expected no-deal, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unmatched_instruction_is_no_deal() {
        let (buyer, _) = buyer_with_budget(100);
        let conversation = buyer.run_instruction("order a pizza").await.unwrap();
        match conversation.outcome {
            Outcome::NoDeal { reason } => assert!(reason.contains("no catalog entry")),
            other => panic!("expected no-deal, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_transcript_records_both_sides() {
        let (buyer, _) = buyer_with_budget(20);
        let conversation = buyer
            .run_instruction("buy the housing dataset")
            .await
            .unwrap();

        assert!(conversation.transcript.len() >= 6);
        assert!(conversation
            .transcript
            .iter()
            .any(|line| line.speaker == "seller"));
    }
}
