//! AI extraction service — plan image → verified-ready roof data.
//!
//! DESIGN
//! ======
//! The stored plan image is sent to the vision provider with a strict
//! JSON-only prompt. The raw model output is then normalized through a set
//! of rules ported from field experience with plan drawings: lenient pitch
//! parsing with clamping into the accepted domain, centimeter/millimeter
//! unit correction from the raw figures, hard caps on element counts, and
//! zeroing of rare elements below high confidence. Every correction leaves a
//! human-readable warning on the quote.
//!
//! Without a configured provider the service answers with a development
//! fixture so the full wizard flow stays drivable.

use std::sync::Arc;

use base64::Engine;
use sqlx::PgPool;
use uuid::Uuid;
use wire::{Dimensions, ExtractionStatus, ObstacleEntry, ObstacleKind, RoofType};

use crate::llm::{EncodedImage, LlmError, VisionExtract, media_type_for};
use crate::services::quote::{self, QuoteError};
use crate::state::AppState;

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("upload a roof plan image first")]
    NoImage,
    #[error(transparent)]
    Quote(#[from] QuoteError),
    #[error("vision request failed: {0}")]
    Llm(#[from] LlmError),
    #[error("reading stored image failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("extraction response unusable: {0}")]
    Parse(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Normalized extraction result as landed on the quote.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AiExtraction {
    pub roof_type: RoofType,
    pub pitch_deg: i32,
    pub dimensions: Dimensions,
    pub obstacles: Vec<ObstacleEntry>,
    pub confidence: f64,
    pub warnings: Vec<String>,
    pub notes: String,
}

// =============================================================================
// PROMPTS
// =============================================================================

const SYSTEM_PROMPT: &str = "You are a precise roofing estimator analyzing a technical roof plan \
drawing. You only report what is visibly drawn; you never guess. You answer with a single JSON \
object and nothing else.";

const EXTRACTION_PROMPT: &str = r#"Analyze this roof plan drawing.

## Building dimensions (most important)
1. Find the dimension lines on the OUTER edges of the drawing (arrows or ticks at the ends).
   The top edge carries the building width, the left or right edge the length.
2. Take the OVERALL dimension, not the inner segments; if only segments are given, sum them.
3. Plans are usually dimensioned in CENTIMETERS: 1308 means 13.08 m. Report both the raw figure
   and the converted meters.

## Pitch angle
Look for a small arc with an arrow next to a sloped roof line, with a two-digit number beside it
(the degree sign is often omitted). Also check sections (A-A, B-B) and elevation views. Report the
exact number you see; report 0 only if no pitch appears anywhere. Never substitute a typical value.

## Roof elements — count only what is clearly identifiable
- chimney: square/rectangle WITH a cross (X) inside. A plain rectangle is NOT a chimney.
- skylight: rectangle explicitly labeled as a roof window or skylight. Unlabeled rectangles do not count.
- roof_hatch: small square explicitly labeled as a hatch. Very rare.
- vent_pipe: small circle, roughly 10-15 cm across. Not a square.
When unsure, report 0. A typical house has 1-2 chimneys and no other elements.

## Response (JSON only, numbers only, no formulas, no markdown)
{
  "roof_type": "one of: shed|gable|gable_l|hip|hip_envelope|multi_hip|multi_hip_l|mansard|half_hip|skillion|flat",
  "pitch_deg": 0,
  "raw_dimensions": { "length_cm": 0, "width_cm": 0 },
  "dimensions": { "length_m": 0, "width_m": 0 },
  "elements": { "chimneys": 0, "vent_pipes": 0, "skylights": 0, "roof_hatches": 0 },
  "confidence": "one of: low|medium|high",
  "uncertain_elements": [],
  "notes": "state the exact pitch figure you saw, plus any observations"
}"#;

// =============================================================================
// ENTRY POINT
// =============================================================================

/// Run extraction for a quote: read the stored image, query the provider (or
/// the fixture), normalize, and land the results on the quote.
///
/// # Errors
///
/// `NoImage` when nothing was uploaded; provider, parse, and database errors
/// otherwise. The `ai_processing` flag is cleared on every exit path.
pub async fn run(state: &AppState, quote_id: Uuid) -> Result<AiExtraction, ExtractionError> {
    let row = quote::load_row(&state.pool, quote_id).await?;
    let Some(image_path) = row.image_path else {
        return Err(ExtractionError::NoImage);
    };

    set_processing(&state.pool, quote_id, true).await?;
    let result = run_inner(state, quote_id, &image_path).await;
    if result.is_err() {
        set_processing(&state.pool, quote_id, false).await?;
    }
    result
}

async fn run_inner(
    state: &AppState,
    quote_id: Uuid,
    image_path: &str,
) -> Result<AiExtraction, ExtractionError> {
    let raw = match &state.vision {
        Some(vision) => {
            let encoded = encode_image(state, image_path).await?;
            query_vision(vision, &encoded).await?
        }
        None => {
            tracing::warn!(%quote_id, "no vision provider configured; serving fixture extraction");
            fixture_response().to_owned()
        }
    };

    let value = parse_model_json(&raw)?;
    let extraction = normalize(&value);
    tracing::info!(
        %quote_id,
        pitch = extraction.pitch_deg,
        confidence = extraction.confidence,
        warnings = extraction.warnings.len(),
        "extraction normalized"
    );
    persist(&state.pool, quote_id, &extraction).await?;
    Ok(extraction)
}

async fn encode_image(state: &AppState, image_path: &str) -> Result<EncodedImage, ExtractionError> {
    let bytes = tokio::fs::read(state.media_dir.join(image_path)).await?;
    Ok(EncodedImage {
        media_type: media_type_for(image_path).to_owned(),
        base64: base64::engine::general_purpose::STANDARD.encode(&bytes),
    })
}

async fn query_vision(
    vision: &Arc<dyn VisionExtract>,
    image: &EncodedImage,
) -> Result<String, ExtractionError> {
    Ok(vision.extract(SYSTEM_PROMPT, EXTRACTION_PROMPT, image).await?)
}

/// Report processing state for the status endpoint.
///
/// # Errors
///
/// Returns `NotFound` for unknown ids, database errors otherwise.
pub async fn status(pool: &PgPool, quote_id: Uuid) -> Result<ExtractionStatus, ExtractionError> {
    let row = quote::load_row(pool, quote_id).await?;
    Ok(ExtractionStatus {
        ai_processing: row.ai_processing,
        ai_processed: row.ai_processed,
        ai_confidence: row.ai_confidence,
    })
}

async fn set_processing(pool: &PgPool, quote_id: Uuid, processing: bool) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE quotes SET ai_processing = $2, updated_at = now() WHERE id = $1")
        .bind(quote_id)
        .bind(processing)
        .execute(pool)
        .await?;
    Ok(())
}

async fn persist(pool: &PgPool, quote_id: Uuid, extraction: &AiExtraction) -> Result<(), sqlx::Error> {
    let plan_area = wizard::geometry::plan_area(&extraction.dimensions);
    sqlx::query(
        "UPDATE quotes
         SET dimensions = $2, pitch_angle = $3, roof_type = $4, obstacles = $5, plan_area = $6,
             ai_extracted = $7, ai_confidence = $8, ai_warnings = $9,
             ai_processed = TRUE, ai_processing = FALSE, updated_at = now()
         WHERE id = $1",
    )
    .bind(quote_id)
    .bind(serde_json::to_value(extraction.dimensions).unwrap_or_default())
    .bind(extraction.pitch_deg)
    .bind(extraction.roof_type.as_str())
    .bind(serde_json::to_value(&extraction.obstacles).unwrap_or_default())
    .bind(plan_area)
    .bind(serde_json::to_value(extraction).unwrap_or_default())
    .bind(extraction.confidence)
    .bind(serde_json::to_value(&extraction.warnings).unwrap_or_default())
    .execute(pool)
    .await?;
    Ok(())
}

// =============================================================================
// MODEL OUTPUT PARSING
// =============================================================================

/// Strip markdown fences and stray prose around the model's JSON object.
fn parse_model_json(raw: &str) -> Result<serde_json::Value, ExtractionError> {
    let mut text = raw.trim();
    if let Some(stripped) = text.strip_prefix("```") {
        // Drop the fence line (``` or ```json) and the closing fence.
        text = stripped
            .split_once('\n')
            .map_or(stripped, |(_, rest)| rest);
        text = text.strip_suffix("```").unwrap_or(text).trim();
    }
    let start = text.find('{');
    let end = text.rfind('}');
    let json = match (start, end) {
        (Some(start), Some(end)) if end > start => &text[start..=end],
        _ => return Err(ExtractionError::Parse("no JSON object in response".to_owned())),
    };
    serde_json::from_str(json).map_err(|e| ExtractionError::Parse(e.to_string()))
}

// =============================================================================
// NORMALIZATION
// =============================================================================

fn as_f64(value: &serde_json::Value, path: &[&str]) -> f64 {
    let mut current = value;
    for key in path {
        match current.get(key) {
            Some(next) => current = next,
            None => return 0.0,
        }
    }
    current.as_f64().unwrap_or(0.0)
}

fn as_u32(value: &serde_json::Value, path: &[&str]) -> u32 {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    {
        as_f64(value, path).max(0.0) as u32
    }
}

/// Pitch parsed leniently: a number, or the first digit run in a string
/// (models sometimes answer `"40°"`).
fn parse_pitch(value: &serde_json::Value) -> (i32, Vec<String>) {
    let mut warnings = Vec::new();
    let raw = value.get("pitch_deg");
    #[allow(clippy::cast_possible_truncation)]
    let mut pitch = match raw {
        Some(serde_json::Value::Number(n)) => n.as_f64().unwrap_or(0.0) as i32,
        Some(serde_json::Value::String(s)) => {
            let digits: String = s.chars().skip_while(|c| !c.is_ascii_digit()).take_while(char::is_ascii_digit).collect();
            match digits.parse::<i32>() {
                Ok(parsed) => {
                    warnings.push(format!("pitch angle extracted from text: {parsed}°"));
                    parsed
                }
                Err(_) => 0,
            }
        }
        _ => 0,
    };

    if pitch == 0 {
        warnings.push(format!(
            "pitch angle not found on the drawing; defaulted to {}° — verify manually",
            wizard::consts::DEFAULT_PITCH_DEG
        ));
        pitch = wizard::consts::DEFAULT_PITCH_DEG;
    } else if pitch < wizard::consts::PITCH_MIN_DEG {
        warnings.push(format!(
            "pitch {pitch}° below the supported range; clamped to {}°",
            wizard::consts::PITCH_MIN_DEG
        ));
        pitch = wizard::consts::PITCH_MIN_DEG;
    } else if pitch > wizard::consts::PITCH_MAX_DEG {
        warnings.push(format!(
            "pitch {pitch}° above the supported range; clamped to {}°",
            wizard::consts::PITCH_MAX_DEG
        ));
        pitch = wizard::consts::PITCH_MAX_DEG;
    }
    (pitch, warnings)
}

/// Dimensions recomputed from the raw drawing figures when present. Raw
/// values over 10 000 are read as millimeters, otherwise centimeters; the
/// recomputed meters override the model's own figures when they disagree by
/// more than 0.1 m.
fn parse_dimensions(value: &serde_json::Value) -> (Dimensions, Vec<String>) {
    let mut warnings = Vec::new();
    let mut length = as_f64(value, &["dimensions", "length_m"]);
    let mut width = as_f64(value, &["dimensions", "width_m"]);
    let raw_length = as_f64(value, &["raw_dimensions", "length_cm"]);
    let raw_width = as_f64(value, &["raw_dimensions", "width_cm"]);

    if raw_length > 0.0 && raw_width > 0.0 {
        let corrected_length = convert_raw(raw_length, &mut warnings);
        let corrected_width = convert_raw(raw_width, &mut warnings);
        if (corrected_length - length).abs() > 0.1 {
            warnings.push(format!("length corrected from raw figure: {length} m → {corrected_length} m"));
            length = corrected_length;
        }
        if (corrected_width - width).abs() > 0.1 {
            warnings.push(format!("width corrected from raw figure: {width} m → {corrected_width} m"));
            width = corrected_width;
        }
    }

    for (axis, extent) in [("length", length), ("width", width)] {
        if !(5.0..=35.0).contains(&extent) {
            warnings.push(format!(
                "{axis} {extent} m outside the typical 5–35 m range — verify manually"
            ));
        }
    }

    (Dimensions::new(length, width), warnings)
}

fn convert_raw(raw: f64, warnings: &mut Vec<String>) -> f64 {
    if raw > 10_000.0 {
        let meters = raw / 1000.0;
        warnings.push(format!("raw figure {raw} interpreted as millimeters → {meters} m"));
        meters
    } else {
        raw / 100.0
    }
}

fn fold_roof_type(raw: &str) -> RoofType {
    match raw {
        "hip" | "hip_envelope" | "multi_hip" | "multi_hip_l" | "half_hip" => RoofType::Hip,
        "mansard" => RoofType::Mansard,
        "flat" => RoofType::Flat,
        // shed/skillion and the gable family price like a gable here.
        _ => RoofType::Gable,
    }
}

struct ElementCounts {
    chimneys: u32,
    vent_pipes: u32,
    skylights: u32,
    roof_hatches: u32,
}

fn cap(count: u32, max: u32, label: &str, warnings: &mut Vec<String>) -> u32 {
    if count > max {
        warnings.push(format!("{label} count corrected from {count} to {max} (typical maximum)"));
        max
    } else {
        count
    }
}

fn zero_rare(count: u32, label: &str, reason: &str, warnings: &mut Vec<String>) -> u32 {
    if count > 0 {
        warnings.push(format!("{label} zeroed ({reason}); was {count}"));
    }
    0
}

/// Apply the full normalization rule set to a parsed model response.
#[must_use]
pub fn normalize(value: &serde_json::Value) -> AiExtraction {
    let mut warnings = Vec::new();

    let (pitch_deg, pitch_warnings) = parse_pitch(value);
    warnings.extend(pitch_warnings);

    let (dimensions, dimension_warnings) = parse_dimensions(value);
    warnings.extend(dimension_warnings);

    let confidence_label = value
        .get("confidence")
        .and_then(|v| v.as_str())
        .unwrap_or("medium");
    let confidence = match confidence_label {
        "high" => 0.9,
        "low" => 0.4,
        _ => 0.7,
    };

    let mut elements = ElementCounts {
        chimneys: as_u32(value, &["elements", "chimneys"]),
        vent_pipes: as_u32(value, &["elements", "vent_pipes"]),
        skylights: as_u32(value, &["elements", "skylights"]),
        roof_hatches: as_u32(value, &["elements", "roof_hatches"]),
    };

    // Rare elements survive only a high-confidence read.
    if confidence < 0.9 {
        let reason = format!("confidence is {confidence_label}");
        elements.skylights = zero_rare(elements.skylights, "skylights", &reason, &mut warnings);
        elements.roof_hatches = zero_rare(elements.roof_hatches, "roof hatches", &reason, &mut warnings);
        elements.vent_pipes = zero_rare(elements.vent_pipes, "vent pipes", &reason, &mut warnings);
    }

    // Anything the model itself flagged as uncertain is dropped.
    let uncertain: Vec<String> = value
        .get("uncertain_elements")
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_str())
                .map(str::to_ascii_lowercase)
                .collect()
        })
        .unwrap_or_default();
    if uncertain.iter().any(|item| item.contains("skylight")) {
        elements.skylights = zero_rare(elements.skylights, "skylights", "listed as uncertain", &mut warnings);
    }
    if uncertain.iter().any(|item| item.contains("hatch")) {
        elements.roof_hatches = zero_rare(elements.roof_hatches, "roof hatches", "listed as uncertain", &mut warnings);
    }
    if uncertain.iter().any(|item| item.contains("vent")) {
        elements.vent_pipes = zero_rare(elements.vent_pipes, "vent pipes", "listed as uncertain", &mut warnings);
    }

    // Hard caps hold even at high confidence.
    elements.chimneys = cap(elements.chimneys, 4, "chimney", &mut warnings);
    elements.skylights = cap(elements.skylights, 2, "skylight", &mut warnings);
    elements.roof_hatches = cap(elements.roof_hatches, 1, "roof hatch", &mut warnings);
    elements.vent_pipes = cap(elements.vent_pipes, 2, "vent pipe", &mut warnings);

    let mut obstacles = Vec::new();
    for (kind, quantity) in [
        (ObstacleKind::Chimney, elements.chimneys),
        (ObstacleKind::VentPipe, elements.vent_pipes),
        (ObstacleKind::Skylight, elements.skylights),
        (ObstacleKind::RoofHatch, elements.roof_hatches),
    ] {
        if quantity > 0 {
            obstacles.push(ObstacleEntry { kind, quantity });
        }
    }

    AiExtraction {
        roof_type: fold_roof_type(value.get("roof_type").and_then(|v| v.as_str()).unwrap_or("gable")),
        pitch_deg,
        dimensions,
        obstacles,
        confidence,
        warnings,
        notes: value
            .get("notes")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_owned(),
    }
}

/// Development fixture served when no vision provider is configured.
fn fixture_response() -> &'static str {
    r#"{
        "roof_type": "multi_hip",
        "pitch_deg": 25,
        "raw_dimensions": { "length_cm": 1308, "width_cm": 1031 },
        "dimensions": { "length_m": 13.08, "width_m": 10.31 },
        "elements": { "chimneys": 2, "vent_pipes": 0, "skylights": 1, "roof_hatches": 0 },
        "confidence": "medium",
        "uncertain_elements": [],
        "notes": "fixture data — no vision provider configured"
    }"#
}

// =============================================================================
// TESTS
// =============================================================================
