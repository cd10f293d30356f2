//! Agent Brain - LLM phrasing with deterministic fallback
//!
//! The brain handles the natural-language envelope: turning protocol
//! messages into prose for transcripts, and reading purchase intent out of
//! free-text instructions. Every amount in the conversation comes from the
//! evaluator or the buyer strategy; the brain may phrase, never decide.

use haggle_llm::{CompletionRequest, LlmRouter, Message};
use haggle_types::{Resource, ResourceId};
use serde::Deserialize;

use crate::protocol::NegotiationMessage;

/// The agent's brain - handles the language side of the conversation
pub struct AgentBrain {
    llm: Option<LlmRouter>,
}

impl AgentBrain {
    /// Scripted phrasing only, no LLM
    pub fn deterministic() -> Self {
        Self { llm: None }
    }

    /// Phrase and interpret via an LLM, falling back to scripts
    pub fn with_llm(llm: LlmRouter) -> Self {
        Self { llm: Some(llm) }
    }

    /// Configure from `HAGGLE_LLM_PROVIDER`
    pub fn from_env() -> Self {
        Self::with_llm(LlmRouter::from_env())
    }

    /// Phrase a protocol message as one sentence of prose
    pub async fn phrase(&self, speaker: &str, message: &NegotiationMessage) -> String {
        if let Some(llm) = &self.llm {
            let system = format!(
                "You are the {speaker} in a negotiation between two trading agents. \
                 Rephrase the JSON protocol message as a single short sentence of \
                 natural dialogue. Keep every number exactly as given. Output the \
                 sentence only."
            );
            let user = serde_json::to_string(message).unwrap_or_default();
            let request = CompletionRequest::new(vec![Message::user(user)])
                .with_system(system)
                .with_max_tokens(80);

            if let Some(response) = llm.try_complete(request).await {
                let sentence = response.content.trim();
                if !sentence.is_empty() {
                    return sentence.to_string();
                }
            }
        }

        Self::scripted_phrase(message)
    }

    /// Pick which catalog resource a free-text instruction asks for
    pub async fn interpret_instruction(
        &self,
        instruction: &str,
        candidates: &[Resource],
    ) -> Option<ResourceId> {
        if let Some(llm) = &self.llm {
            if let Some(id) = self.llm_interpret(llm, instruction, candidates).await {
                return Some(id);
            }
        }
        Self::keyword_match(instruction, candidates)
    }

    async fn llm_interpret(
        &self,
        llm: &LlmRouter,
        instruction: &str,
        candidates: &[Resource],
    ) -> Option<ResourceId> {
        #[derive(Deserialize)]
        struct Choice {
            resource: Option<String>,
        }

        let listing = candidates
            .iter()
            .map(|r| format!("- {} : {} ({})", r.id, r.name, r.category))
            .collect::<Vec<_>>()
            .join("\n");

        let system = r#"You match a buyer instruction to a catalog entry. Output valid JSON only.

Schema:
{"resource": "catalog_id"}

Rules:
- resource must be one of the listed catalog ids, or null if nothing matches
- never invent an id"#;

        let user = format!("Catalog:\n{listing}\n\nInstruction: {instruction}");
        let request = CompletionRequest::new(vec![Message::user(user)])
            .with_system(system)
            .with_json_mode()
            .with_max_tokens(64);

        let response = llm.try_complete(request).await?;
        let choice: Choice = serde_json::from_str(response.content.trim()).ok()?;
        let id = ResourceId::new(choice.resource?);

        // Validate against the actual catalog; the model may hallucinate.
        candidates.iter().any(|r| r.id == id).then_some(id)
    }

    fn keyword_match(instruction: &str, candidates: &[Resource]) -> Option<ResourceId> {
        let lowered = instruction.to_lowercase();

        // An exact id or full-name mention is unambiguous; check every
        // candidate for one before falling back to word overlap.
        if let Some(hit) = candidates.iter().find(|r| {
            lowered.contains(&r.id.as_str().to_lowercase())
                || lowered.contains(&r.name.to_lowercase())
        }) {
            return Some(hit.id.clone());
        }

        // Score overlap against id segments and name words and take the
        // best. A single shared word ("market") must not capture an
        // instruction that matches another candidate more fully.
        candidates
            .iter()
            .map(|r| {
                let score = r
                    .id
                    .as_str()
                    .split('_')
                    .chain(r.name.split_whitespace())
                    .map(|word| word.to_lowercase())
                    .filter(|word| word.len() > 3 && lowered.contains(word.as_str()))
                    .count();
                (score, r)
            })
            .filter(|(score, _)| *score > 0)
            .max_by_key(|(score, _)| *score)
            .map(|(_, r)| r.id.clone())
    }

    fn scripted_phrase(message: &NegotiationMessage) -> String {
        match message {
            NegotiationMessage::Browse { .. } => "What do you have for sale?".to_string(),
            NegotiationMessage::Listing { resources, .. } => {
                format!("I have {} items available today.", resources.len())
            }
            NegotiationMessage::Inquire { resource, .. } => {
                format!("Tell me about {resource}.")
            }
            NegotiationMessage::Quote {
                resource,
                list_price,
                ..
            } => format!("{resource} goes for {list_price}."),
            NegotiationMessage::Offer { amount, resource, .. } => {
                format!("I'll give you {amount} for {resource}.")
            }
            NegotiationMessage::Counter { amount, .. } => {
                format!("Can't do that, but I could take {amount}.")
            }
            NegotiationMessage::PaymentRequest { price, .. } => {
                format!("Deal at {price}. Here is the payment request.")
            }
            NegotiationMessage::PaymentSent { .. } => "Payment sent, here is my receipt.".to_string(),
            NegotiationMessage::Artifact { artifact, .. } => {
                format!("All yours - download link valid until {}.", artifact.expires_at)
            }
            NegotiationMessage::Reject { reason, .. } => format!("No deal: {reason}"),
        }
    }
}

impl Default for AgentBrain {
    fn default() -> Self {
        Self::deterministic()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use haggle_core::Catalog;
    use haggle_types::{Price, SessionId};

    fn demo_resources() -> Vec<Resource> {
        Catalog::demo().list().into_iter().cloned().collect()
    }

    #[tokio::test]
    async fn test_keyword_match_by_id() {
        let brain = AgentBrain::deterministic();
        let id = brain
            .interpret_instruction("buy the housing data for me", &demo_resources())
            .await;
        assert_eq!(id, Some(ResourceId::new("housing")));
    }

    #[tokio::test]
    async fn test_keyword_match_by_name_word() {
        let brain = AgentBrain::deterministic();
        let id = brain
            .interpret_instruction("get me that survey about inference", &demo_resources())
            .await;
        assert_eq!(id, Some(ResourceId::new("llm_paper")));
    }

    #[tokio::test]
    async fn test_keyword_match_prefers_fuller_overlap() {
        // "market" appears in the housing dataset's name too; the report
        // matches more of the instruction and must win.
        let brain = AgentBrain::deterministic();
        let id = brain
            .interpret_instruction("buy the market report", &demo_resources())
            .await;
        assert_eq!(id, Some(ResourceId::new("market_report")));
    }

    #[tokio::test]
    async fn test_no_match_yields_none() {
        let brain = AgentBrain::deterministic();
        let id = brain
            .interpret_instruction("order a pizza", &demo_resources())
            .await;
        assert_eq!(id, None);
    }

    #[tokio::test]
    async fn test_scripted_phrase_keeps_numbers() {
        let brain = AgentBrain::deterministic();
        let prose = brain
            .phrase(
                "buyer",
                &NegotiationMessage::Offer {
                    session: SessionId::new("s1"),
                    resource: ResourceId::new("housing"),
                    amount: Price::new(8),
                },
            )
            .await;
        assert!(prose.contains("$8"));
    }
}
