//! Shared wire model for the quote API.
//!
//! This crate owns the JSON shapes exchanged between the quoting server and
//! its clients (the native CLI and the wizard engine's sync boundary). It is
//! deliberately free of behavior: validation, derivation, and state live in
//! the `wizard` crate; persistence lives in `server`. Money fields use
//! [`rust_decimal::Decimal`] so totals survive serialization without float
//! drift; continuous geometry (areas, meters) stays `f64`.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(test)]
#[path = "lib_test.rs"]
mod lib_test;

/// Roof shape classification. Purely descriptive for area math; pricing may
/// differentiate on it server-side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoofType {
    /// Two slopes meeting at a central ridge.
    #[default]
    Gable,
    /// Four slopes descending to the eaves.
    Hip,
    /// Broken-slope profile with two pitch angles.
    Mansard,
    /// Minimal or zero pitch.
    Flat,
}

impl RoofType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gable => "gable",
            Self::Hip => "hip",
            Self::Mansard => "mansard",
            Self::Flat => "flat",
        }
    }

    /// Parse a stored identifier. Unknown values map to `None`.
    #[must_use]
    pub fn from_str(raw: &str) -> Option<Self> {
        match raw {
            "gable" => Some(Self::Gable),
            "hip" => Some(Self::Hip),
            "mansard" => Some(Self::Mansard),
            "flat" => Some(Self::Flat),
            _ => None,
        }
    }
}

/// Fixture penetrating the roof surface, reducing covered area and adding
/// flashing work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObstacleKind {
    Chimney,
    Skylight,
    RoofHatch,
    VentPipe,
}

impl ObstacleKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Chimney => "chimney",
            Self::Skylight => "skylight",
            Self::RoofHatch => "roof_hatch",
            Self::VentPipe => "vent_pipe",
        }
    }

    /// All kinds, in the stable order used for persistence and display.
    #[must_use]
    pub fn all() -> [Self; 4] {
        [Self::Chimney, Self::Skylight, Self::RoofHatch, Self::VentPipe]
    }
}

/// One obstacle line as persisted: a kind plus a positive count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObstacleEntry {
    pub kind: ObstacleKind,
    pub quantity: u32,
}

/// Building footprint in meters.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Dimensions {
    pub length: f64,
    pub width: f64,
}

impl Dimensions {
    #[must_use]
    pub fn new(length: f64, width: f64) -> Self {
        Self { length, width }
    }
}

/// Payload for persisting verified roof data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DimensionUpdate {
    pub length: f64,
    pub width: f64,
    pub pitch_angle: i32,
    pub roof_type: RoofType,
}

/// Client contact fields collected in the final wizard stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientDetails {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
}

/// Catalog category for roofing materials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaterialCategory {
    MetalTile,
    Ceramic,
    Bitumen,
    MetalSheet,
}

impl MaterialCategory {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MetalTile => "metal_tile",
            Self::Ceramic => "ceramic",
            Self::Bitumen => "bitumen",
            Self::MetalSheet => "metal_sheet",
        }
    }

    #[must_use]
    pub fn from_str(raw: &str) -> Option<Self> {
        match raw {
            "metal_tile" => Some(Self::MetalTile),
            "ceramic" => Some(Self::Ceramic),
            "bitumen" => Some(Self::Bitumen),
            "metal_sheet" => Some(Self::MetalSheet),
            _ => None,
        }
    }
}

/// A material as listed by the catalog endpoint and referenced by quotes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterialSummary {
    pub id: i64,
    pub name: String,
    pub category: MaterialCategory,
    #[serde(default)]
    pub description: String,
    pub price_per_m2: Decimal,
    pub waste_factor: Decimal,
    /// Open-ended pricing knobs (batten spacing, accessory prices, ...).
    #[serde(default)]
    pub config: serde_json::Value,
}

/// One line of the material breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub name: String,
    pub quantity: Decimal,
    pub unit: String,
    /// Absent for aggregate lines (e.g. obstacle flashing).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<Decimal>,
    pub total: Decimal,
}

/// Net/VAT/gross rollup of a calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostSummary {
    pub materials_net: Decimal,
    pub labor_net: Decimal,
    pub total_net: Decimal,
    pub vat: Decimal,
    pub vat_rate: i32,
    pub total_gross: Decimal,
}

/// Full pricing result for a quote. Opaque display data to the wizard once
/// received; the server is authoritative for every figure in here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationResult {
    pub plan_area: f64,
    pub real_area: f64,
    /// Breakdown lines keyed by a stable slug (`roofing`, `battens`, ...).
    pub materials: BTreeMap<String, LineItem>,
    pub summary: CostSummary,
}

/// Lifecycle status of a quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuoteStatus {
    #[default]
    Draft,
    Sent,
    Accepted,
    Rejected,
}

impl QuoteStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Sent => "sent",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }

    #[must_use]
    pub fn from_str(raw: &str) -> Option<Self> {
        match raw {
            "draft" => Some(Self::Draft),
            "sent" => Some(Self::Sent),
            "accepted" => Some(Self::Accepted),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

/// Reference to a generated offer document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRef {
    pub id: Uuid,
    pub url: String,
}

/// Full quote state as returned by `GET /api/quotes/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteDetail {
    pub id: Uuid,
    pub number: String,
    pub status: QuoteStatus,
    pub client: ClientDetails,
    pub roof_type: RoofType,
    pub pitch_angle: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<Dimensions>,
    #[serde(default)]
    pub obstacles: Vec<ObstacleEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan_area: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub real_area: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub ai_processed: bool,
    pub ai_processing: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_confidence: Option<f64>,
    #[serde(default)]
    pub ai_warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub material: Option<MaterialSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calculation: Option<CalculationResult>,
    pub margin_percent: i32,
    pub vat_rate: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offer: Option<DocumentRef>,
}

/// Lightweight row for the quote list endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteListItem {
    pub id: Uuid,
    pub number: String,
    pub status: QuoteStatus,
    pub client_name: String,
    pub roof_type: RoofType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub real_area: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_gross: Option<Decimal>,
}

/// Extraction status as reported by `GET /api/quotes/{id}/status`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ExtractionStatus {
    pub ai_processing: bool,
    pub ai_processed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_confidence: Option<f64>,
}

/// Error body returned by every failing API endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
