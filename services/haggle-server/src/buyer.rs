//! Buyer service - turns instructions into negotiated purchases.
//!
//! The buyer process holds no handshake state of its own; everything it
//! needs lives behind the peer link and the gateway client, both pointed at
//! the seller service.

use std::sync::Arc;

use axum::extract::State;
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use haggle_agents::{AgentBrain, BuyerAgent, Conversation, HttpLink};
use haggle_payments::HttpGateway;
use haggle_types::Price;
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::error::ApiError;

pub struct BuyerState {
    agent: BuyerAgent,
}

/// Build the buyer router against a running seller service
pub fn router(seller_url: &str, budget: u64) -> Router {
    let agent = BuyerAgent::with_brain(
        Price::new(budget),
        Arc::new(HttpLink::new(seller_url)),
        Arc::new(HttpGateway::new(seller_url)),
        AgentBrain::from_env(),
    );

    Router::new()
        .route("/api/health", get(api_health))
        .route("/api/instruct", post(api_instruct))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(BuyerState { agent }))
}

async fn api_health(State(state): State<Arc<BuyerState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "role": "buyer",
        "budget": state.agent.budget(),
    }))
}

#[derive(Debug, Deserialize)]
struct InstructBody {
    instruction: String,
}

async fn api_instruct(
    State(state): State<Arc<BuyerState>>,
    Json(body): Json<InstructBody>,
) -> Result<Json<Conversation>, ApiError> {
    let conversation = state.agent.run_instruction(&body.instruction).await?;
    Ok(Json(conversation))
}
