//! Wizard controller: the six-stage quote authoring state machine.
//!
//! The controller owns the authoritative [`QuoteSnapshot`] and is the only
//! code that mutates it. Stage transitions are guarded: each forward move
//! validates its inputs, persists through the [`QuoteSync`] collaborator,
//! and only then advances. A failed collaborator call aborts the transition
//! and leaves stage and snapshot exactly as they were, so every failure is
//! recoverable by retrying or navigating backward.
//!
//! Construct one `Wizard` per authoring session and inject it where needed;
//! there is no ambient global state.

#[cfg(test)]
#[path = "controller_test.rs"]
mod controller_test;

use uuid::Uuid;
use wire::{
    CalculationResult, ClientDetails, Dimensions, DimensionUpdate, MaterialSummary, QuoteDetail,
    RoofType,
};

use crate::geometry::{self, GeometryError};
use crate::quote::{
    validate_dimensions, validate_pitch, ImageRef, QuoteSnapshot, ValidationError,
};
use crate::sync::{validate_payload, PayloadError, QuoteSync, SyncError};

/// The six linear authoring stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Upload,
    Processing,
    Verification,
    Material,
    Calculation,
    Client,
}

impl Stage {
    /// One-based stage number as shown in the step indicator.
    #[must_use]
    pub fn number(self) -> u8 {
        match self {
            Self::Upload => 1,
            Self::Processing => 2,
            Self::Verification => 3,
            Self::Material => 4,
            Self::Calculation => 5,
            Self::Client => 6,
        }
    }

    fn previous(self) -> Self {
        match self {
            Self::Upload | Self::Processing => Self::Upload,
            Self::Verification => Self::Processing,
            Self::Material => Self::Verification,
            Self::Calculation => Self::Material,
            Self::Client => Self::Calculation,
        }
    }
}

/// Why a wizard action did not complete.
#[derive(Debug, thiserror::Error)]
pub enum WizardError {
    /// A value was outside its declared numeric domain; nothing was sent.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Geometry inputs escaped their mathematical domain.
    #[error(transparent)]
    Geometry(#[from] GeometryError),
    /// The selected file cannot be uploaded.
    #[error(transparent)]
    Payload(#[from] PayloadError),
    /// A collaborator call failed; the transition was aborted and the prior
    /// stage retained.
    #[error(transparent)]
    Persistence(#[from] SyncError),
    #[error("`{action}` is not available in stage {stage:?}")]
    WrongStage { action: &'static str, stage: Stage },
    #[error("select a roof plan image first")]
    MissingImage,
    #[error("select a material first")]
    MissingMaterial,
    #[error("quote has not been created yet")]
    MissingQuote,
    #[error("no calculation stored for this quote")]
    MissingCalculation,
    #[error("a request is already in flight")]
    Busy,
    #[error("quote is finalized; duplicate it to make changes")]
    Finalized,
}

/// Opaque token tying an out-of-band fetch to the wizard state that issued
/// it. Any navigation invalidates previously issued tickets so a late
/// response cannot mutate a stage the user has already left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncTicket(u64);

/// A locally selected plan image awaiting upload.
#[derive(Debug, Clone)]
struct PendingImage {
    file_name: String,
    bytes: Vec<u8>,
}

/// The wizard: current stage, owned snapshot, and in-flight bookkeeping.
#[derive(Debug)]
pub struct Wizard {
    stage: Stage,
    snapshot: QuoteSnapshot,
    pending_image: Option<PendingImage>,
    busy: bool,
    ticket_seq: u64,
}

impl Default for Wizard {
    fn default() -> Self {
        Self::new()
    }
}

impl Wizard {
    /// Fresh wizard at the upload stage with an empty snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self {
            stage: Stage::Upload,
            snapshot: QuoteSnapshot::new(),
            pending_image: None,
            busy: false,
            ticket_seq: 0,
        }
    }

    // --- Queries ---

    #[must_use]
    pub fn stage(&self) -> Stage {
        self.stage
    }

    #[must_use]
    pub fn snapshot(&self) -> &QuoteSnapshot {
        &self.snapshot
    }

    /// Whether a collaborator request is outstanding; gates the triggering
    /// controls in the host UI.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// The snapshot becomes immutable once an offer document exists.
    #[must_use]
    pub fn is_finalized(&self) -> bool {
        self.snapshot.offer.is_some()
    }

    /// Footprint area derived from the current snapshot, for display.
    #[must_use]
    pub fn plan_area(&self) -> f64 {
        geometry::plan_area(&self.snapshot.dimensions)
    }

    /// Slope-corrected area derived from the current snapshot, for display.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::PitchOutOfDomain`] for pitch ≥ 90°.
    pub fn real_area(&self) -> Result<f64, GeometryError> {
        geometry::real_area(&self.snapshot.dimensions, self.snapshot.pitch_deg)
    }

    /// Ticket tied to the current wizard state. Pair with
    /// [`Wizard::refresh`] when fetching quote state out of band.
    #[must_use]
    pub fn ticket(&self) -> SyncTicket {
        SyncTicket(self.ticket_seq)
    }

    // --- Hydration ---

    /// Seed every wizard field from a persisted quote and open at the stage
    /// its data implies: a generated offer resumes at the client stage, a
    /// stored calculation at the calculation stage, completed AI extraction
    /// at verification, anything earlier back at upload.
    pub fn hydrate(&mut self, detail: &QuoteDetail) {
        self.snapshot = QuoteSnapshot::new();
        self.snapshot.apply_detail(detail);
        self.pending_image = None;
        self.invalidate_tickets();
        self.stage = if detail.offer.is_some() {
            Stage::Client
        } else if detail.calculation.is_some() {
            Stage::Calculation
        } else if detail.ai_processed {
            Stage::Verification
        } else {
            Stage::Upload
        };
    }

    /// Apply an out-of-band quote fetch. Returns `false` (and changes
    /// nothing) when the ticket is stale — the user navigated after the
    /// request was issued.
    pub fn refresh(&mut self, ticket: SyncTicket, detail: &QuoteDetail) -> bool {
        if ticket != self.ticket() {
            return false;
        }
        self.snapshot.apply_detail(detail);
        true
    }

    // --- Navigation ---

    /// Step backward. A no-op in the upload stage. Outstanding tickets are
    /// invalidated so late responses for the abandoned stage are discarded.
    pub fn prev_step(&mut self) -> Stage {
        if self.stage != Stage::Upload {
            self.stage = self.stage.previous();
            self.invalidate_tickets();
        }
        self.stage
    }

    /// Step forward without a guard. Only the calculation → client move is
    /// unconditional; every other forward transition happens through its
    /// guarded action.
    ///
    /// # Errors
    ///
    /// [`WizardError::WrongStage`] anywhere but the calculation stage.
    pub fn next_step(&mut self) -> Result<Stage, WizardError> {
        if self.stage != Stage::Calculation {
            return Err(WizardError::WrongStage { action: "next step", stage: self.stage });
        }
        self.stage = Stage::Client;
        self.invalidate_tickets();
        Ok(self.stage)
    }

    // --- Snapshot edits ---

    /// Adopt dimensions committed on the canvas.
    ///
    /// # Errors
    ///
    /// Rejects out-of-range values and finalized quotes.
    pub fn set_dimensions(&mut self, dimensions: Dimensions) -> Result<(), WizardError> {
        self.ensure_editable()?;
        validate_dimensions(&dimensions)?;
        self.snapshot.dimensions = dimensions;
        Ok(())
    }

    /// Set the roof pitch.
    ///
    /// # Errors
    ///
    /// Rejects values outside `[15, 60]`° and finalized quotes.
    pub fn set_pitch(&mut self, pitch_deg: i32) -> Result<(), WizardError> {
        self.ensure_editable()?;
        self.snapshot.pitch_deg = validate_pitch(pitch_deg)?;
        Ok(())
    }

    /// Set the roof type.
    ///
    /// # Errors
    ///
    /// Rejects finalized quotes.
    pub fn set_roof_type(&mut self, roof_type: RoofType) -> Result<(), WizardError> {
        self.ensure_editable()?;
        self.snapshot.roof_type = roof_type;
        Ok(())
    }

    /// Add one obstacle of the given kind.
    ///
    /// # Errors
    ///
    /// Rejects finalized quotes.
    pub fn add_obstacle(&mut self, kind: wire::ObstacleKind) -> Result<(), WizardError> {
        self.ensure_editable()?;
        self.snapshot.obstacles.increment(kind);
        Ok(())
    }

    /// Remove one obstacle of the given kind.
    ///
    /// # Errors
    ///
    /// Rejects finalized quotes.
    pub fn remove_obstacle(&mut self, kind: wire::ObstacleKind) -> Result<(), WizardError> {
        self.ensure_editable()?;
        self.snapshot.obstacles.decrement(kind);
        Ok(())
    }

    /// Select the material to price against.
    ///
    /// # Errors
    ///
    /// Rejects finalized quotes.
    pub fn set_material(&mut self, material: MaterialSummary) -> Result<(), WizardError> {
        self.ensure_editable()?;
        self.snapshot.material = Some(material);
        Ok(())
    }

    /// Update client contact fields.
    ///
    /// # Errors
    ///
    /// Rejects finalized quotes.
    pub fn set_client(&mut self, client: ClientDetails) -> Result<(), WizardError> {
        self.ensure_editable()?;
        self.snapshot.client = client;
        Ok(())
    }

    /// Stage a locally selected plan image for upload.
    ///
    /// # Errors
    ///
    /// Rejects oversized or non-image/PDF files, actions outside the upload
    /// stage, and finalized quotes.
    pub fn select_image(&mut self, file_name: &str, bytes: Vec<u8>) -> Result<(), WizardError> {
        self.ensure_editable()?;
        self.ensure_stage(Stage::Upload, "select image")?;
        validate_payload(file_name, bytes.len() as u64)?;
        self.pending_image = Some(PendingImage { file_name: file_name.to_owned(), bytes });
        Ok(())
    }

    // --- Guarded transitions ---

    /// Upload → Processing → Verification: create the quote if needed,
    /// upload a newly selected image, trigger extraction, and pull the
    /// extracted results. Any failure falls back to the upload stage.
    ///
    /// # Errors
    ///
    /// [`WizardError::MissingImage`] when nothing was selected and no image
    /// is persisted (the action is a no-op); persistence errors from any
    /// collaborator call, after which the wizard is back at upload.
    pub async fn upload_and_process(&mut self, sync: &dyn QuoteSync) -> Result<Stage, WizardError> {
        self.ensure_editable()?;
        self.ensure_stage(Stage::Upload, "upload")?;
        if self.pending_image.is_none() && self.snapshot.image.is_none() {
            return Err(WizardError::MissingImage);
        }
        self.begin_flight()?;
        let result = self.upload_and_process_inner(sync).await;
        self.end_flight();
        if result.is_err() {
            // Extraction failed: Processing falls back to Upload.
            self.stage = Stage::Upload;
        }
        result
    }

    async fn upload_and_process_inner(&mut self, sync: &dyn QuoteSync) -> Result<Stage, WizardError> {
        self.invalidate_tickets();
        if self.snapshot.identity.is_none() {
            let detail = sync.create_quote().await?;
            self.snapshot.apply_detail(&detail);
        }
        let id = self.snapshot.id().ok_or(WizardError::MissingQuote)?;

        if let Some(image) = self.pending_image.take() {
            match sync.upload_image(id, &image.file_name, &image.bytes).await {
                Ok(url) => self.snapshot.image = Some(ImageRef { url }),
                Err(err) => {
                    // Keep the selection so the user can retry the upload.
                    self.pending_image = Some(image);
                    return Err(err.into());
                }
            }
        }

        self.stage = Stage::Processing;
        sync.process_extraction(id).await?;
        let detail = sync.fetch_quote(id).await?;
        self.snapshot.apply_detail(&detail);
        self.stage = Stage::Verification;
        Ok(self.stage)
    }

    /// Verification → Material: validate the verified roof data, persist
    /// dimensions and obstacles, then advance. On persistence failure the
    /// wizard stays in verification with the snapshot untouched.
    ///
    /// # Errors
    ///
    /// Validation errors before anything is sent; persistence errors abort
    /// the transition.
    pub async fn save_verification(&mut self, sync: &dyn QuoteSync) -> Result<Stage, WizardError> {
        self.ensure_editable()?;
        self.ensure_stage(Stage::Verification, "save verification")?;
        validate_dimensions(&self.snapshot.dimensions)?;
        validate_pitch(self.snapshot.pitch_deg)?;
        let id = self.snapshot.id().ok_or(WizardError::MissingQuote)?;

        self.begin_flight()?;
        let result = self.save_verification_inner(sync, id).await;
        self.end_flight();
        result?;
        self.invalidate_tickets();
        self.stage = Stage::Material;
        Ok(self.stage)
    }

    async fn save_verification_inner(&self, sync: &dyn QuoteSync, id: Uuid) -> Result<(), WizardError> {
        let update = DimensionUpdate {
            length: self.snapshot.dimensions.length,
            width: self.snapshot.dimensions.width,
            pitch_angle: self.snapshot.pitch_deg,
            roof_type: self.snapshot.roof_type,
        };
        sync.save_dimensions(id, &update).await?;
        sync.save_obstacles(id, &self.snapshot.obstacles.list()).await?;
        Ok(())
    }

    /// Material → Calculation: run the authoritative pricing calculation.
    /// The server result replaces any locally derived figures.
    ///
    /// # Errors
    ///
    /// [`WizardError::MissingMaterial`] with the stage unchanged when no
    /// material is selected; persistence errors keep the wizard in the
    /// material stage.
    pub async fn calculate(&mut self, sync: &dyn QuoteSync) -> Result<Stage, WizardError> {
        self.ensure_editable()?;
        self.ensure_stage(Stage::Material, "calculate")?;
        let material_id = self
            .snapshot
            .material
            .as_ref()
            .map(|material| material.id)
            .ok_or(WizardError::MissingMaterial)?;
        let id = self.snapshot.id().ok_or(WizardError::MissingQuote)?;

        self.begin_flight()?;
        let result = sync.calculate(id, material_id).await;
        self.end_flight();
        let calculation: CalculationResult = result?;
        self.snapshot.calculation = Some(calculation);
        self.invalidate_tickets();
        self.stage = Stage::Calculation;
        Ok(self.stage)
    }

    /// Generate (or regenerate) the offer document from the current
    /// snapshot. Idempotent: repeating replaces the stored document
    /// reference and nothing else. The first success finalizes the quote.
    ///
    /// # Errors
    ///
    /// [`WizardError::MissingCalculation`] without a stored calculation;
    /// persistence errors leave the previous document reference in place.
    pub async fn generate_offer(&mut self, sync: &dyn QuoteSync) -> Result<Stage, WizardError> {
        self.ensure_stage(Stage::Client, "generate offer")?;
        if self.snapshot.calculation.is_none() {
            return Err(WizardError::MissingCalculation);
        }
        let id = self.snapshot.id().ok_or(WizardError::MissingQuote)?;

        self.begin_flight()?;
        let result = sync.generate_offer(id, &self.snapshot.client).await;
        self.end_flight();
        self.snapshot.offer = Some(result?);
        Ok(self.stage)
    }

    // --- Internals ---

    fn ensure_stage(&self, expected: Stage, action: &'static str) -> Result<(), WizardError> {
        if self.stage == expected {
            Ok(())
        } else {
            Err(WizardError::WrongStage { action, stage: self.stage })
        }
    }

    fn ensure_editable(&self) -> Result<(), WizardError> {
        if self.is_finalized() {
            Err(WizardError::Finalized)
        } else {
            Ok(())
        }
    }

    fn begin_flight(&mut self) -> Result<(), WizardError> {
        if self.busy {
            return Err(WizardError::Busy);
        }
        self.busy = true;
        Ok(())
    }

    fn end_flight(&mut self) {
        self.busy = false;
    }

    fn invalidate_tickets(&mut self) {
        self.ticket_seq += 1;
    }
}
