//! HTTP client for a payment gateway hosted in another process.
//!
//! The buyer and seller services must talk to the same payment system for
//! tokens and receipts to correlate. `HttpGateway` is the client half: it
//! speaks to whichever process hosts the gateway (the seller service mounts
//! the mock one under `/api/pay`). All failures surface as
//! `HaggleError::Gateway` with the upstream diagnostic attached.

use async_trait::async_trait;
use haggle_types::{HaggleError, PaymentToken, Receipt, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::PaymentGateway;

/// Wire body for minting a payment request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MintBody {
    pub amount_minor: u64,
    pub description: String,
}

/// Wire body carrying a bare payment token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenBody {
    pub payment_token: PaymentToken,
}

/// Wire body carrying a bare receipt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiptBody {
    pub receipt: Receipt,
}

/// Gateway client over HTTP
pub struct HttpGateway {
    base_url: String,
    client: reqwest::Client,
}

impl HttpGateway {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }

    async fn post<B, R>(&self, path: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url.trim_end_matches('/'), path);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| HaggleError::gateway(format!("{path}: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(HaggleError::gateway(format!("{path}: HTTP {status}: {text}")));
        }

        response
            .json()
            .await
            .map_err(|e| HaggleError::gateway(format!("{path}: bad reply: {e}")))
    }
}

#[async_trait]
impl PaymentGateway for HttpGateway {
    async fn mint_payment_request(
        &self,
        amount_minor: u64,
        description: &str,
    ) -> Result<PaymentToken> {
        let body: TokenBody = self
            .post(
                "/api/pay/mint",
                &MintBody {
                    amount_minor,
                    description: description.to_string(),
                },
            )
            .await?;
        Ok(body.payment_token)
    }

    async fn execute_payment(&self, token: &PaymentToken) -> Result<Receipt> {
        let body: ReceiptBody = self
            .post(
                "/api/pay/execute",
                &TokenBody {
                    payment_token: token.clone(),
                },
            )
            .await?;
        Ok(body.receipt)
    }

    async fn recover_token(&self, receipt: &Receipt) -> Result<PaymentToken> {
        let body: TokenBody = self
            .post(
                "/api/pay/recover",
                &ReceiptBody {
                    receipt: receipt.clone(),
                },
            )
            .await?;
        Ok(body.payment_token)
    }
}
