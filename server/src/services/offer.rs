//! Offer document service.
//!
//! DESIGN
//! ======
//! Generating an offer renders a client-facing plain-text document from the
//! quote's stored calculation and upserts it keyed by quote: regeneration
//! replaces the previous document wholesale, which is what makes the action
//! idempotent. Converting the rendered document to PDF is a downstream
//! concern outside this service.

use std::fmt::Write as _;

use sqlx::PgPool;
use uuid::Uuid;
use wire::{ClientDetails, DocumentRef, QuoteDetail};

use crate::services::quote::{self, QuoteError};

#[derive(Debug, thiserror::Error)]
pub enum OfferError {
    #[error(transparent)]
    Quote(#[from] QuoteError),
    #[error("run the calculation before generating an offer")]
    MissingCalculation,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Upsert client fields, render the offer document, and store it.
///
/// # Errors
///
/// `MissingCalculation` when the quote has no stored calculation; `NotFound`
/// for unknown ids; database errors otherwise.
pub async fn generate(
    pool: &PgPool,
    quote_id: Uuid,
    client: &ClientDetails,
) -> Result<DocumentRef, OfferError> {
    quote::update_client(pool, quote_id, client).await?;

    let detail = quote::get_detail(pool, quote_id).await?;
    if detail.calculation.is_none() {
        return Err(OfferError::MissingCalculation);
    }

    let body = render(&detail);
    let document_id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO offer_documents (id, quote_id, body)
         VALUES ($1, $2, $3)
         ON CONFLICT (quote_id)
         DO UPDATE SET id = EXCLUDED.id, body = EXCLUDED.body, created_at = now()",
    )
    .bind(document_id)
    .bind(quote_id)
    .bind(&body)
    .execute(pool)
    .await?;

    tracing::info!(%quote_id, %document_id, "offer document generated");
    Ok(DocumentRef { id: document_id, url: format!("/api/quotes/{quote_id}/offer") })
}

/// Fetch the stored offer body for download.
///
/// # Errors
///
/// Returns `None` inside `Ok` when no offer exists yet.
pub async fn fetch_body(pool: &PgPool, quote_id: Uuid) -> Result<Option<String>, OfferError> {
    Ok(
        sqlx::query_scalar::<_, String>("SELECT body FROM offer_documents WHERE quote_id = $1")
            .bind(quote_id)
            .fetch_optional(pool)
            .await?,
    )
}

/// Render the client-facing offer text from a quote detail.
#[must_use]
pub fn render(detail: &QuoteDetail) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "ROOFING OFFER {}", detail.number);
    let _ = writeln!(out, "{}", "=".repeat(60));
    out.push('\n');

    if !detail.client.name.is_empty() {
        let _ = writeln!(out, "Prepared for: {}", detail.client.name);
    }
    if !detail.client.address.is_empty() {
        let _ = writeln!(out, "Site address: {}", detail.client.address);
    }
    if !detail.client.email.is_empty() {
        let _ = writeln!(out, "Contact:      {}", detail.client.email);
    }
    out.push('\n');

    if let Some(dimensions) = detail.dimensions {
        let _ = writeln!(
            out,
            "Roof: {} plan, {} x {} m, pitch {}°",
            detail.roof_type.as_str(),
            dimensions.length,
            dimensions.width,
            detail.pitch_angle
        );
    }

    let Some(calculation) = &detail.calculation else {
        return out;
    };
    let _ = writeln!(
        out,
        "Plan area: {:.1} m²   Roof surface: {:.1} m²",
        calculation.plan_area, calculation.real_area
    );
    out.push('\n');

    let _ = writeln!(out, "{:<40} {:>10} {:>6} {:>10}", "Item", "Qty", "Unit", "Total");
    let _ = writeln!(out, "{}", "-".repeat(70));
    for item in calculation.materials.values() {
        let _ = writeln!(
            out,
            "{:<40} {:>10} {:>6} {:>10}",
            item.name, item.quantity, item.unit, item.total
        );
    }
    out.push('\n');

    let summary = &calculation.summary;
    let _ = writeln!(out, "Materials net:    {:>12}", summary.materials_net);
    let _ = writeln!(out, "Labor net:        {:>12}", summary.labor_net);
    let _ = writeln!(out, "Total net:        {:>12}", summary.total_net);
    let _ = writeln!(out, "VAT ({}%):        {:>12}", summary.vat_rate, summary.vat);
    let _ = writeln!(out, "TOTAL GROSS:      {:>12}", summary.total_gross);
    out
}
