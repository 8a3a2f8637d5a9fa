use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use bson::oid::ObjectId;
use tracing::{info, instrument, warn};

use crate::{
    auth::extractors::CurrentUser,
    error::ApiError,
    state::AppState,
    store::Shipment,
};

use super::dto::{CreateShipmentRequest, ShipmentResponse};

pub fn shipment_routes() -> Router<AppState> {
    Router::new()
        .route("/shipments", post(create_shipment).get(list_shipments))
        .route("/shipments/:id", get(get_shipment))
}

#[instrument(skip(state, current, payload))]
pub async fn create_shipment(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(payload): Json<CreateShipmentRequest>,
) -> Result<Json<ShipmentResponse>, ApiError> {
    if payload.item_name.trim().is_empty() {
        return Err(ApiError::Validation("item_name must not be empty".into()));
    }
    if payload.quantity < 1 {
        warn!(quantity = payload.quantity, "rejected non-positive quantity");
        return Err(ApiError::Validation("quantity must be at least 1".into()));
    }

    let shipment = Shipment {
        // id assignment is the store's job; never derived from a counter
        id: None,
        item_name: payload.item_name,
        quantity: payload.quantity,
        description: payload.description,
        status: payload.status.unwrap_or_else(|| "created".into()),
        user_id: current.0.username.clone(),
        created_at: bson::DateTime::now(),
    };
    let stored = state.store.insert_shipment(shipment).await?;

    info!(
        user_id = %stored.user_id,
        shipment_id = %stored.id.map(|id| id.to_hex()).unwrap_or_default(),
        "shipment created"
    );
    Ok(Json(ShipmentResponse::from(stored)))
}

#[instrument(skip(state, current))]
pub async fn list_shipments(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<Vec<ShipmentResponse>>, ApiError> {
    let shipments = state.store.list_shipments(&current.0.username).await?;
    Ok(Json(
        shipments.into_iter().map(ShipmentResponse::from).collect(),
    ))
}

#[instrument(skip(state, current))]
pub async fn get_shipment(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<ShipmentResponse>, ApiError> {
    let id = ObjectId::parse_str(&id)
        .map_err(|_| ApiError::Validation("Invalid shipment id".into()))?;

    let shipment = state
        .store
        .find_shipment(id, &current.0.username)
        .await?
        .ok_or_else(|| ApiError::NotFound("Shipment not found".into()))?;

    Ok(Json(ShipmentResponse::from(shipment)))
}
