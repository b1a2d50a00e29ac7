//! Backend collaborator boundary.
//!
//! The wizard persists and retrieves quote state through this trait. Hosts
//! supply a real transport (the CLI implements it over HTTP); tests supply
//! mocks with scripted failures. Every method is a single request; retry
//! policy belongs to the caller.

#[cfg(test)]
#[path = "sync_test.rs"]
mod sync_test;

use uuid::Uuid;
use wire::{
    CalculationResult, ClientDetails, DimensionUpdate, DocumentRef, ObstacleEntry, QuoteDetail,
};

use crate::consts::MAX_UPLOAD_BYTES;

/// Rejected upload payload: too large or not an accepted media type.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PayloadError {
    #[error("file is {size} bytes; uploads are limited to {MAX_UPLOAD_BYTES} bytes")]
    TooLarge { size: u64 },
    #[error("`{file_name}` is not an accepted type (jpg, jpeg, png, webp, pdf)")]
    UnsupportedType { file_name: String },
}

/// A collaborator call failed. The wizard aborts the transition that issued
/// it and keeps the prior state intact.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error(transparent)]
    Payload(#[from] PayloadError),
    #[error("transport failed: {0}")]
    Transport(String),
    #[error("server rejected request ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("response decode failed: {0}")]
    Decode(String),
}

/// File extensions accepted by the image ingestion endpoint.
pub const ACCEPTED_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "webp", "pdf"];

/// Check an upload candidate against the size and media-type bounds before
/// any bytes travel.
///
/// # Errors
///
/// Returns [`PayloadError::TooLarge`] above the 10 MB bound and
/// [`PayloadError::UnsupportedType`] for anything that is not an image or
/// PDF by extension.
pub fn validate_payload(file_name: &str, size: u64) -> Result<(), PayloadError> {
    if size > MAX_UPLOAD_BYTES {
        return Err(PayloadError::TooLarge { size });
    }
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase());
    match extension {
        Some(ext) if ACCEPTED_EXTENSIONS.contains(&ext.as_str()) => Ok(()),
        _ => Err(PayloadError::UnsupportedType { file_name: file_name.to_owned() }),
    }
}

/// Async interface through which the wizard talks to the quoting backend.
#[async_trait::async_trait]
pub trait QuoteSync: Send + Sync {
    /// Create an empty draft quote and return its server state.
    async fn create_quote(&self) -> Result<QuoteDetail, SyncError>;

    /// Fetch the full current state of a quote.
    async fn fetch_quote(&self, quote_id: Uuid) -> Result<QuoteDetail, SyncError>;

    /// Upload the plan image and return its stored URL. Bounded to 10 MB,
    /// image or PDF only.
    async fn upload_image(
        &self,
        quote_id: Uuid,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<String, SyncError>;

    /// Trigger AI dimension extraction over the stored image.
    async fn process_extraction(&self, quote_id: Uuid) -> Result<(), SyncError>;

    /// Persist verified dimensions, pitch, and roof type.
    async fn save_dimensions(
        &self,
        quote_id: Uuid,
        update: &DimensionUpdate,
    ) -> Result<(), SyncError>;

    /// Persist the obstacle list.
    async fn save_obstacles(
        &self,
        quote_id: Uuid,
        obstacles: &[ObstacleEntry],
    ) -> Result<(), SyncError>;

    /// Run the authoritative pricing calculation for the selected material.
    async fn calculate(
        &self,
        quote_id: Uuid,
        material_id: i64,
    ) -> Result<CalculationResult, SyncError>;

    /// Generate (or regenerate) the client-facing offer document.
    async fn generate_offer(
        &self,
        quote_id: Uuid,
        client: &ClientDetails,
    ) -> Result<DocumentRef, SyncError>;
}
