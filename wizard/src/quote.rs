//! Quote snapshot types and numeric-domain validation.
//!
//! The snapshot is the wizard's single source of truth for an in-progress
//! quote. It is mutated exclusively by [`crate::controller::Wizard`] actions;
//! the canvas and geometry modules only consume values passed to them.

#[cfg(test)]
#[path = "quote_test.rs"]
mod quote_test;

use uuid::Uuid;
use wire::{
    CalculationResult, ClientDetails, Dimensions, DocumentRef, MaterialSummary, QuoteDetail,
    RoofType,
};

use crate::consts::{DEFAULT_PITCH_DEG, DIMENSION_MAX_M, DIMENSION_MIN_M, PITCH_MAX_DEG, PITCH_MIN_DEG};
use crate::obstacles::ObstacleLedger;

/// A value outside its declared numeric domain. Resolved at the point of
/// input; never escapes to a collaborator call.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ValidationError {
    #[error("dimension {value} m is outside the accepted range ({DIMENSION_MIN_M}–{DIMENSION_MAX_M} m)")]
    DimensionOutOfRange { value: f64 },
    #[error("pitch {value}° is outside the accepted range ({PITCH_MIN_DEG}–{PITCH_MAX_DEG}°)")]
    PitchOutOfRange { value: i32 },
    #[error("`{input}` is not a number")]
    NotANumber { input: String },
}

/// Check a single dimension against the accepted meter range.
///
/// # Errors
///
/// Returns [`ValidationError::DimensionOutOfRange`] for non-finite values or
/// values outside `[2, 50]` m.
pub fn validate_dimension(value: f64) -> Result<f64, ValidationError> {
    if value.is_finite() && (DIMENSION_MIN_M..=DIMENSION_MAX_M).contains(&value) {
        Ok(value)
    } else {
        Err(ValidationError::DimensionOutOfRange { value })
    }
}

/// Check both dimensions of a footprint.
///
/// # Errors
///
/// Returns the first out-of-range dimension.
pub fn validate_dimensions(dimensions: &Dimensions) -> Result<(), ValidationError> {
    validate_dimension(dimensions.length)?;
    validate_dimension(dimensions.width)?;
    Ok(())
}

/// Check a pitch angle against the accepted degree range.
///
/// # Errors
///
/// Returns [`ValidationError::PitchOutOfRange`] outside `[15, 60]`°.
pub fn validate_pitch(value: i32) -> Result<i32, ValidationError> {
    if (PITCH_MIN_DEG..=PITCH_MAX_DEG).contains(&value) {
        Ok(value)
    } else {
        Err(ValidationError::PitchOutOfRange { value })
    }
}

/// Server-assigned identity, created once the upload stage completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteIdentity {
    pub id: Uuid,
    pub number: String,
}

/// Reference to the uploaded plan image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    pub url: String,
}

/// The authoritative in-progress quote record held by the wizard.
#[derive(Debug, Clone)]
pub struct QuoteSnapshot {
    pub identity: Option<QuoteIdentity>,
    pub image: Option<ImageRef>,
    pub dimensions: Dimensions,
    pub pitch_deg: i32,
    pub roof_type: RoofType,
    pub obstacles: ObstacleLedger,
    pub material: Option<MaterialSummary>,
    pub calculation: Option<CalculationResult>,
    pub client: ClientDetails,
    pub offer: Option<DocumentRef>,
    pub ai_processed: bool,
    pub ai_confidence: Option<f64>,
}

impl Default for QuoteSnapshot {
    fn default() -> Self {
        Self {
            identity: None,
            image: None,
            dimensions: Dimensions::default(),
            pitch_deg: DEFAULT_PITCH_DEG,
            roof_type: RoofType::default(),
            obstacles: ObstacleLedger::new(),
            material: None,
            calculation: None,
            client: ClientDetails::default(),
            offer: None,
            ai_processed: false,
            ai_confidence: None,
        }
    }
}

impl QuoteSnapshot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite every field from a server-side quote detail. Used both for
    /// initial hydration and for refreshes after collaborator calls.
    pub fn apply_detail(&mut self, detail: &QuoteDetail) {
        self.identity = Some(QuoteIdentity { id: detail.id, number: detail.number.clone() });
        self.image = detail.image_url.clone().map(|url| ImageRef { url });
        if let Some(dimensions) = detail.dimensions {
            self.dimensions = dimensions;
        }
        self.pitch_deg = detail.pitch_angle;
        self.roof_type = detail.roof_type;
        self.obstacles = ObstacleLedger::from_entries(&detail.obstacles);
        self.material = detail.material.clone();
        self.calculation = detail.calculation.clone();
        self.client = detail.client.clone();
        self.offer = detail.offer.clone();
        self.ai_processed = detail.ai_processed;
        self.ai_confidence = detail.ai_confidence;
    }

    /// The server-assigned quote id, if the quote has been created.
    #[must_use]
    pub fn id(&self) -> Option<Uuid> {
        self.identity.as_ref().map(|identity| identity.id)
    }
}
