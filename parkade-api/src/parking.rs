use axum::{
    extract::State,
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use parkade_core::{ResourceType, Ticket, Vehicle};

use crate::{state::AppState, error::AppError};

#[derive(Debug, Deserialize)]
pub struct ParkRequest {
    pub vehicle_id: String,
    pub resource_type: ResourceType,
}

#[derive(Debug, Deserialize)]
pub struct UnparkRequest {
    pub vehicle_id: String,
}

#[derive(Debug, Serialize)]
pub struct UnparkResponse {
    pub vehicle_id: String,
    pub fee: f64,
    pub message: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/parking/park", post(park_vehicle))
        .route("/v1/parking/unpark", post(unpark_vehicle))
}

async fn park_vehicle(
    State(state): State<AppState>,
    Json(req): Json<ParkRequest>,
) -> Result<(StatusCode, Json<Ticket>), AppError> {
    let ticket = state.engine
        .park_vehicle(Vehicle::new(req.vehicle_id, req.resource_type))
        .await?;

    Ok((StatusCode::CREATED, Json(ticket)))
}

async fn unpark_vehicle(
    State(state): State<AppState>,
    Json(req): Json<UnparkRequest>,
) -> Result<Json<UnparkResponse>, AppError> {
    let fee = state.engine.unpark_vehicle(&req.vehicle_id).await?;
    let fee = round_to_cents(fee);

    Ok(Json(UnparkResponse {
        message: format!("Vehicle {} unparked, fee {:.2}", req.vehicle_id.trim(), fee),
        vehicle_id: req.vehicle_id.trim().to_string(),
        fee,
    }))
}

fn round_to_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_to_cents() {
        assert_eq!(round_to_cents(120.0), 120.0);
        assert_eq!(round_to_cents(0.004), 0.0);
        assert_eq!(round_to_cents(12.345678), 12.35);
    }
}
