//! Material catalog service.

use rust_decimal::Decimal;
use sqlx::PgPool;
use wire::{MaterialCategory, MaterialSummary};

#[derive(Debug, thiserror::Error)]
pub enum MaterialError {
    #[error("material not found: {0}")]
    NotFound(i64),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

type MaterialRow = (i64, String, String, String, Decimal, Decimal, serde_json::Value);

fn to_summary(row: MaterialRow) -> MaterialSummary {
    let (id, name, category, description, price_per_m2, waste_factor, config) = row;
    MaterialSummary {
        id,
        name,
        // Unknown categories read as sheet metal rather than failing the row.
        category: MaterialCategory::from_str(&category).unwrap_or(MaterialCategory::MetalSheet),
        description,
        price_per_m2,
        waste_factor,
        config,
    }
}

/// List active materials in catalog order.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn list_active(pool: &PgPool) -> Result<Vec<MaterialSummary>, MaterialError> {
    let rows = sqlx::query_as::<_, MaterialRow>(
        "SELECT id, name, category, description, price_per_m2, waste_factor, config
         FROM materials
         WHERE active
         ORDER BY sort_order, name",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(to_summary).collect())
}

/// Fetch one active material by id.
///
/// # Errors
///
/// Returns `NotFound` for missing or inactive materials.
pub async fn get_active(pool: &PgPool, material_id: i64) -> Result<MaterialSummary, MaterialError> {
    let row = sqlx::query_as::<_, MaterialRow>(
        "SELECT id, name, category, description, price_per_m2, waste_factor, config
         FROM materials
         WHERE id = $1 AND active",
    )
    .bind(material_id)
    .fetch_optional(pool)
    .await?
    .ok_or(MaterialError::NotFound(material_id))?;

    Ok(to_summary(row))
}
