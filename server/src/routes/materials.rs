//! Material catalog routes.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use wire::{ErrorBody, MaterialSummary};

use crate::services::material;
use crate::state::AppState;

/// `GET /api/materials` — active materials in catalog order.
pub async fn list(
    State(state): State<AppState>,
) -> Result<Json<Vec<MaterialSummary>>, (StatusCode, Json<ErrorBody>)> {
    let materials = material::list_active(&state.pool).await.map_err(|err| {
        (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorBody { error: err.to_string() }))
    })?;
    Ok(Json(materials))
}
