//! Seller service - catalog, negotiation, fulfillment, and the hosted
//! payment gateway.
//!
//! The seller process owns the mock payment gateway and mounts it under
//! `/api/pay` so a buyer service running elsewhere can execute payments
//! against the same token space the seller mints from.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use haggle_agents::{NegotiationMessage, SellerAgent};
use haggle_core::{
    Catalog, Checkout, DirectResolver, OfferEvaluator, ReceiptDereferenceResolver,
    ReceiptResolver, SessionStore,
};
use haggle_payments::{MintBody, MockGateway, PaymentGateway, ReceiptBody, TokenBody};
use haggle_types::{AccessKey, DownloadArtifact, Price, Resource, ResourceId, SessionId};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::error::ApiError;
use crate::ResolverKind;

pub struct SellerState {
    agent: Arc<SellerAgent>,
    gateway: Arc<MockGateway>,
    evaluator: OfferEvaluator,
    checkout: Checkout,
}

/// Build the seller router over the demo catalog
pub fn router(resolver: ResolverKind) -> Router {
    let catalog = Arc::new(Catalog::demo());
    let store = Arc::new(SessionStore::new());
    let gateway = Arc::new(MockGateway::new());

    let resolver: Arc<dyn ReceiptResolver> = match resolver {
        ResolverKind::Direct => Arc::new(DirectResolver),
        ResolverKind::Receipt => Arc::new(ReceiptDereferenceResolver::new(gateway.clone())),
    };

    let agent = Arc::new(SellerAgent::new(
        catalog.clone(),
        store.clone(),
        gateway.clone(),
        resolver,
    ));

    let state = Arc::new(SellerState {
        evaluator: OfferEvaluator::new(catalog.clone(), store.clone()),
        checkout: Checkout::new(catalog, store, gateway.clone()),
        agent,
        gateway,
    });

    Router::new()
        .route("/api/health", get(api_health))
        .route("/api/catalog", get(api_catalog))
        .route("/api/catalog/:id", get(api_catalog_entry))
        .route("/api/offer", post(api_offer))
        .route("/api/checkout", post(api_checkout))
        .route("/api/fulfill", post(api_fulfill))
        .route("/api/redeem", post(api_redeem))
        .route("/api/message", post(api_message))
        // Hosted payment gateway
        .route("/api/pay/mint", post(api_pay_mint))
        .route("/api/pay/execute", post(api_pay_execute))
        .route("/api/pay/recover", post(api_pay_recover))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn api_health(State(state): State<Arc<SellerState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "role": "seller",
        "resources": state.agent.catalog().len(),
        "active_sessions": state.agent.store().active_sessions(),
        "completed": state.agent.store().completed_count(),
    }))
}

async fn api_catalog(State(state): State<Arc<SellerState>>) -> Json<Vec<Resource>> {
    Json(state.agent.catalog().list().into_iter().cloned().collect())
}

async fn api_catalog_entry(
    State(state): State<Arc<SellerState>>,
    Path(id): Path<ResourceId>,
) -> Result<Json<Resource>, ApiError> {
    let entry = state.agent.catalog().get(&id)?;
    Ok(Json(entry.clone()))
}

#[derive(Debug, Deserialize)]
struct OfferBody {
    session: SessionId,
    resource: ResourceId,
    amount: Price,
}

async fn api_offer(
    State(state): State<Arc<SellerState>>,
    Json(body): Json<OfferBody>,
) -> Result<Json<Value>, ApiError> {
    let (outcome, session) = state
        .evaluator
        .evaluate(&body.session, &body.resource, body.amount)?;
    let accepted = outcome.is_accept();
    let mut reply = serde_json::to_value(outcome).unwrap_or_else(|_| json!({}));
    if let Some(map) = reply.as_object_mut() {
        map.insert("accepted".to_string(), json!(accepted));
        map.insert("rounds".to_string(), json!(session.rounds));
    }
    Ok(Json(reply))
}

#[derive(Debug, Deserialize)]
struct CheckoutBody {
    session: SessionId,
    resource: ResourceId,
    price: Price,
}

async fn api_checkout(
    State(state): State<Arc<SellerState>>,
    Json(body): Json<CheckoutBody>,
) -> Result<Json<TokenBody>, ApiError> {
    let payment_token = state
        .checkout
        .request_payment(&body.session, &body.resource, body.price)
        .await?;
    Ok(Json(TokenBody { payment_token }))
}

async fn api_fulfill(
    State(state): State<Arc<SellerState>>,
    Json(body): Json<haggle_core::FulfillmentRequest>,
) -> Result<Json<DownloadArtifact>, ApiError> {
    let artifact = state.agent.fulfillment().release(&body).await?;
    Ok(Json(artifact))
}

#[derive(Debug, Deserialize)]
struct RedeemBody {
    access_key: AccessKey,
}

async fn api_redeem(
    State(state): State<Arc<SellerState>>,
    Json(body): Json<RedeemBody>,
) -> Result<Json<DownloadArtifact>, ApiError> {
    let artifact = state.agent.fulfillment().redeem(&body.access_key)?;
    Ok(Json(artifact))
}

async fn api_message(
    State(state): State<Arc<SellerState>>,
    Json(message): Json<NegotiationMessage>,
) -> Json<NegotiationMessage> {
    Json(state.agent.handle(message).await)
}

async fn api_pay_mint(
    State(state): State<Arc<SellerState>>,
    Json(body): Json<MintBody>,
) -> Result<Json<TokenBody>, ApiError> {
    let payment_token = state
        .gateway
        .mint_payment_request(body.amount_minor, &body.description)
        .await?;
    Ok(Json(TokenBody { payment_token }))
}

async fn api_pay_execute(
    State(state): State<Arc<SellerState>>,
    Json(body): Json<TokenBody>,
) -> Result<Json<ReceiptBody>, ApiError> {
    let receipt = state.gateway.execute_payment(&body.payment_token).await?;
    Ok(Json(ReceiptBody { receipt }))
}

async fn api_pay_recover(
    State(state): State<Arc<SellerState>>,
    Json(body): Json<ReceiptBody>,
) -> Result<Json<TokenBody>, ApiError> {
    let payment_token = state.gateway.recover_token(&body.receipt).await?;
    Ok(Json(TokenBody { payment_token }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::util::ServiceExt;

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_catalog_lists_three_resources() {
        let app = router(ResolverKind::Direct);
        let response = app
            .oneshot(Request::get("/api/catalog").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let listing = body_json(response).await;
        assert_eq!(listing.as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_unknown_catalog_entry_is_404() {
        let app = router(ResolverKind::Direct);
        let response = app
            .oneshot(Request::get("/api/catalog/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let error = body_json(response).await;
        assert_eq!(error["code"], "RESOURCE_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_low_offer_draws_counter() {
        let app = router(ResolverKind::Direct);
        let response = app
            .oneshot(post_json(
                "/api/offer",
                json!({"session": "s1", "resource": "housing", "amount": 5}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let reply = body_json(response).await;
        assert_eq!(reply["outcome"], "counter");
        assert_eq!(reply["price"], 8);
        assert_eq!(reply["accepted"], false);
        assert_eq!(reply["rounds"], 1);
    }

    #[tokio::test]
    async fn test_overbid_accepted_at_list() {
        let app = router(ResolverKind::Direct);
        let response = app
            .oneshot(post_json(
                "/api/offer",
                json!({"session": "s1", "resource": "housing", "amount": 12}),
            ))
            .await
            .unwrap();

        let reply = body_json(response).await;
        assert_eq!(reply["outcome"], "accept_at_list");
        assert_eq!(reply["price"], 10);
    }

    #[tokio::test]
    async fn test_full_handshake_over_http() {
        let app = router(ResolverKind::Direct);

        // Agree at the floor.
        let response = app
            .clone()
            .oneshot(post_json(
                "/api/offer",
                json!({"session": "s1", "resource": "housing", "amount": 8}),
            ))
            .await
            .unwrap();
        assert_eq!(body_json(response).await["outcome"], "accept_at_offer");

        // Mint the payment request.
        let response = app
            .clone()
            .oneshot(post_json(
                "/api/checkout",
                json!({"session": "s1", "resource": "housing", "price": 8}),
            ))
            .await
            .unwrap();
        let token = body_json(response).await["payment_token"]
            .as_str()
            .unwrap()
            .to_string();

        // Pay through the hosted gateway.
        let response = app
            .clone()
            .oneshot(post_json("/api/pay/execute", json!({"payment_token": &token})))
            .await
            .unwrap();
        let receipt = body_json(response).await["receipt"]
            .as_str()
            .unwrap()
            .to_string();

        // Release the artifact with direct-token evidence.
        let response = app
            .clone()
            .oneshot(post_json(
                "/api/fulfill",
                json!({"payment_token": &token, "receipt_id": &receipt, "receipt": &receipt}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let artifact = body_json(response).await;
        assert_eq!(artifact["resource_id"], "housing");
        let key = artifact["access_key"].as_str().unwrap().to_string();

        // Replay is a conflict.
        let response = app
            .clone()
            .oneshot(post_json(
                "/api/fulfill",
                json!({"payment_token": &token, "receipt_id": &receipt, "receipt": &receipt}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        // The key redeems inside the validity window.
        let response = app
            .oneshot(post_json("/api/redeem", json!({"access_key": key})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
