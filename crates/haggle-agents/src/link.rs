//! Peer messaging between the two roles
//!
//! The buyer never calls the seller directly; it talks through a
//! `PeerLink`. The in-process link wires both roles into one binary for
//! the scripted demo; the HTTP link talks to a seller service running
//! elsewhere.

use std::sync::Arc;

use async_trait::async_trait;
use haggle_types::{HaggleError, Result};

use crate::protocol::NegotiationMessage;
use crate::seller::SellerAgent;

/// Opaque, fallible messaging to the peer role
#[async_trait]
pub trait PeerLink: Send + Sync {
    /// Send a message and await the peer's reply
    async fn send(&self, message: &NegotiationMessage) -> Result<NegotiationMessage>;
}

/// Direct in-process link to a seller agent
pub struct InProcessLink {
    seller: Arc<SellerAgent>,
}

impl InProcessLink {
    pub fn new(seller: Arc<SellerAgent>) -> Self {
        Self { seller }
    }
}

#[async_trait]
impl PeerLink for InProcessLink {
    async fn send(&self, message: &NegotiationMessage) -> Result<NegotiationMessage> {
        Ok(self.seller.handle(message.clone()).await)
    }
}

/// HTTP link to a seller service's `/api/message` endpoint
pub struct HttpLink {
    base_url: String,
    client: reqwest::Client,
}

impl HttpLink {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl PeerLink for HttpLink {
    async fn send(&self, message: &NegotiationMessage) -> Result<NegotiationMessage> {
        let url = format!("{}/api/message", self.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .json(message)
            .send()
            .await
            .map_err(|e| HaggleError::peer(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(HaggleError::peer(format!("HTTP {status}: {body}")));
        }

        response
            .json()
            .await
            .map_err(|e| HaggleError::peer(format!("bad reply: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use haggle_core::{Catalog, DirectResolver, SessionStore};
    use haggle_payments::MockGateway;
    use haggle_types::SessionId;

    #[tokio::test]
    async fn test_in_process_link_round_trip() {
        let seller = Arc::new(SellerAgent::new(
            Arc::new(Catalog::demo()),
            Arc::new(SessionStore::new()),
            Arc::new(MockGateway::new()),
            Arc::new(DirectResolver),
        ));
        let link = InProcessLink::new(seller);

        let reply = link
            .send(&NegotiationMessage::Browse {
                session: SessionId::new("s1"),
            })
            .await
            .unwrap();
        assert_eq!(reply.label(), "listing");
    }
}
