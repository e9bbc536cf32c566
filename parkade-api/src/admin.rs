use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use parkade_core::{ResourceType, Slot, SlotId};

use crate::{state::AppState, error::AppError};

#[derive(Debug, Deserialize)]
pub struct AddSlotRequest {
    pub id: SlotId,
    pub resource_type: ResourceType,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/slots", post(add_slot))
        .route("/v1/slots/available", get(list_available_slots))
}

async fn add_slot(
    State(state): State<AppState>,
    Json(req): Json<AddSlotRequest>,
) -> Result<(StatusCode, Json<Slot>), AppError> {
    let slot = state.engine.add_slot(Slot::new(req.id, req.resource_type)).await?;
    Ok((StatusCode::CREATED, Json(slot)))
}

async fn list_available_slots(
    State(state): State<AppState>,
) -> Result<Json<Vec<Slot>>, AppError> {
    Ok(Json(state.engine.list_available_slots().await?))
}
