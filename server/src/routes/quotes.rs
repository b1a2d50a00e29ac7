//! Quote API routes.

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::Deserialize;
use uuid::Uuid;
use wire::{
    CalculationResult, ClientDetails, DimensionUpdate, Dimensions, DocumentRef, ErrorBody,
    ExtractionStatus, ObstacleEntry, QuoteDetail, QuoteListItem,
};
use wizard::sync::PayloadError;

use crate::services::calculator::{self, CalcError};
use crate::services::extraction::{self, AiExtraction, ExtractionError};
use crate::services::material::{self, MaterialError};
use crate::services::offer::{self, OfferError};
use crate::services::quote::{self, QuoteError};
use crate::state::AppState;

#[cfg(test)]
#[path = "quotes_test.rs"]
mod tests;

type ApiError = (StatusCode, Json<ErrorBody>);

fn error_response(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(ErrorBody { error: message.into() }))
}

pub(crate) fn quote_error_to_response(err: QuoteError) -> ApiError {
    let status = match &err {
        QuoteError::NotFound(_) => StatusCode::NOT_FOUND,
        QuoteError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        QuoteError::Payload(PayloadError::TooLarge { .. }) => StatusCode::PAYLOAD_TOO_LARGE,
        QuoteError::Payload(PayloadError::UnsupportedType { .. }) => {
            StatusCode::UNSUPPORTED_MEDIA_TYPE
        }
        QuoteError::Database(_) | QuoteError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    error_response(status, err.to_string())
}

fn extraction_error_to_response(err: ExtractionError) -> ApiError {
    match err {
        ExtractionError::NoImage => error_response(StatusCode::BAD_REQUEST, err.to_string()),
        ExtractionError::Quote(inner) => quote_error_to_response(inner),
        ExtractionError::Llm(_) | ExtractionError::Parse(_) => {
            error_response(StatusCode::BAD_GATEWAY, err.to_string())
        }
        ExtractionError::Io(_) | ExtractionError::Database(_) => {
            error_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

fn material_error_to_response(err: MaterialError) -> ApiError {
    match &err {
        MaterialError::NotFound(_) => error_response(StatusCode::NOT_FOUND, err.to_string()),
        MaterialError::Database(_) => {
            error_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

fn calc_error_to_response(err: CalcError) -> ApiError {
    match &err {
        CalcError::MissingDimensions => error_response(StatusCode::CONFLICT, err.to_string()),
        CalcError::Geometry(_) => error_response(StatusCode::UNPROCESSABLE_ENTITY, err.to_string()),
    }
}

fn offer_error_to_response(err: OfferError) -> ApiError {
    match err {
        OfferError::Quote(inner) => quote_error_to_response(inner),
        OfferError::MissingCalculation => error_response(StatusCode::CONFLICT, err.to_string()),
        OfferError::Database(_) => {
            error_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

// =============================================================================
// CRUD
// =============================================================================

/// `POST /api/quotes` — create an empty draft quote.
pub async fn create(State(state): State<AppState>) -> Result<(StatusCode, Json<QuoteDetail>), ApiError> {
    let row = quote::create(&state.pool)
        .await
        .map_err(quote_error_to_response)?;
    let detail = quote::get_detail(&state.pool, row.id)
        .await
        .map_err(quote_error_to_response)?;
    Ok((StatusCode::CREATED, Json(detail)))
}

/// `GET /api/quotes` — list quotes, newest first.
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<QuoteListItem>>, ApiError> {
    let items = quote::list(&state.pool)
        .await
        .map_err(quote_error_to_response)?;
    Ok(Json(items))
}

/// `GET /api/quotes/:id` — full quote state.
pub async fn get_one(
    State(state): State<AppState>,
    Path(quote_id): Path<Uuid>,
) -> Result<Json<QuoteDetail>, ApiError> {
    let detail = quote::get_detail(&state.pool, quote_id)
        .await
        .map_err(quote_error_to_response)?;
    Ok(Json(detail))
}

/// `POST /api/quotes/:id/duplicate` — copy into a fresh draft.
pub async fn duplicate(
    State(state): State<AppState>,
    Path(quote_id): Path<Uuid>,
) -> Result<(StatusCode, Json<QuoteDetail>), ApiError> {
    let row = quote::duplicate(&state.pool, quote_id)
        .await
        .map_err(quote_error_to_response)?;
    let detail = quote::get_detail(&state.pool, row.id)
        .await
        .map_err(quote_error_to_response)?;
    Ok((StatusCode::CREATED, Json(detail)))
}

// =============================================================================
// IMAGE + EXTRACTION
// =============================================================================

/// `POST /api/quotes/:id/upload` — multipart plan image upload.
pub async fn upload(
    State(state): State<AppState>,
    Path(quote_id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<serde_json::Value>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| error_response(StatusCode::BAD_REQUEST, e.to_string()))?
    {
        if field.name() != Some("image") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("upload.jpg").to_owned();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| error_response(StatusCode::BAD_REQUEST, e.to_string()))?;
        let image_url = quote::store_image(&state.pool, &state.media_dir, quote_id, &file_name, &bytes)
            .await
            .map_err(quote_error_to_response)?;
        return Ok(Json(serde_json::json!({ "image_url": image_url })));
    }
    Err(error_response(StatusCode::BAD_REQUEST, "multipart field `image` missing"))
}

/// `POST /api/quotes/:id/process` — run AI extraction over the stored image.
pub async fn process(
    State(state): State<AppState>,
    Path(quote_id): Path<Uuid>,
) -> Result<Json<AiExtraction>, ApiError> {
    let extraction = extraction::run(&state, quote_id)
        .await
        .map_err(extraction_error_to_response)?;
    Ok(Json(extraction))
}

/// `GET /api/quotes/:id/status` — extraction progress flags.
pub async fn extraction_status(
    State(state): State<AppState>,
    Path(quote_id): Path<Uuid>,
) -> Result<Json<ExtractionStatus>, ApiError> {
    let status = extraction::status(&state.pool, quote_id)
        .await
        .map_err(extraction_error_to_response)?;
    Ok(Json(status))
}

// =============================================================================
// VERIFIED DATA
// =============================================================================

/// `PATCH /api/quotes/:id/dimensions` — persist verified roof data.
pub async fn update_dimensions(
    State(state): State<AppState>,
    Path(quote_id): Path<Uuid>,
    Json(body): Json<DimensionUpdate>,
) -> Result<Json<QuoteDetail>, ApiError> {
    quote::update_dimensions(&state.pool, quote_id, &body)
        .await
        .map_err(quote_error_to_response)?;
    let detail = quote::get_detail(&state.pool, quote_id)
        .await
        .map_err(quote_error_to_response)?;
    Ok(Json(detail))
}

#[derive(Debug, Deserialize)]
pub struct ObstaclesBody {
    #[serde(default)]
    pub obstacles: Vec<ObstacleEntry>,
}

/// `PATCH /api/quotes/:id/obstacles` — persist the obstacle list.
pub async fn update_obstacles(
    State(state): State<AppState>,
    Path(quote_id): Path<Uuid>,
    Json(body): Json<ObstaclesBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let stored = quote::update_obstacles(&state.pool, quote_id, &body.obstacles)
        .await
        .map_err(quote_error_to_response)?;
    Ok(Json(serde_json::json!({ "obstacles": stored })))
}

// =============================================================================
// CALCULATION + OFFER
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct CalculateBody {
    pub material_id: i64,
    pub margin_percent: Option<i32>,
}

/// `POST /api/quotes/:id/calculate` — authoritative pricing run.
pub async fn calculate(
    State(state): State<AppState>,
    Path(quote_id): Path<Uuid>,
    Json(body): Json<CalculateBody>,
) -> Result<Json<CalculationResult>, ApiError> {
    let row = quote::load_row(&state.pool, quote_id)
        .await
        .map_err(quote_error_to_response)?;
    let dimensions: Dimensions = row
        .dimensions
        .as_ref()
        .and_then(|value| serde_json::from_value(value.clone()).ok())
        .ok_or_else(|| error_response(StatusCode::CONFLICT, "quote has no verified dimensions"))?;
    let obstacles: Vec<ObstacleEntry> = serde_json::from_value(row.obstacles.clone()).unwrap_or_default();

    let material = material::get_active(&state.pool, body.material_id)
        .await
        .map_err(material_error_to_response)?;
    let margin_percent = body.margin_percent.unwrap_or(row.margin_percent);

    let result = calculator::calculate(
        &dimensions,
        row.pitch_angle,
        &obstacles,
        &material,
        margin_percent,
        row.vat_rate,
    )
    .map_err(calc_error_to_response)?;

    quote::store_calculation(&state.pool, quote_id, material.id, margin_percent, &result)
        .await
        .map_err(quote_error_to_response)?;

    Ok(Json(result))
}

/// `POST /api/quotes/:id/offer` — generate (or regenerate) the offer document.
pub async fn generate_offer(
    State(state): State<AppState>,
    Path(quote_id): Path<Uuid>,
    Json(client): Json<ClientDetails>,
) -> Result<Json<DocumentRef>, ApiError> {
    let document = offer::generate(&state.pool, quote_id, &client)
        .await
        .map_err(offer_error_to_response)?;
    Ok(Json(document))
}

/// `GET /api/quotes/:id/offer` — download the rendered offer document.
pub async fn download_offer(
    State(state): State<AppState>,
    Path(quote_id): Path<Uuid>,
) -> Result<String, ApiError> {
    offer::fetch_body(&state.pool, quote_id)
        .await
        .map_err(offer_error_to_response)?
        .ok_or_else(|| error_response(StatusCode::NOT_FOUND, "no offer generated for this quote"))
}
