//! Area and roof trigonometry derivations.
//!
//! Everything here is a pure, total function over its declared domain. The
//! pricing chain depends on these numbers being exactly reproducible, so the
//! same functions back both the canvas's immediate display values and the
//! server's authoritative calculation. Results keep full double precision;
//! rounding happens only at presentation time.

#[cfg(test)]
#[path = "geometry_test.rs"]
mod geometry_test;

use wire::{Dimensions, ObstacleEntry, ObstacleKind};

use crate::consts::DEFAULT_WASTE_FACTOR;

/// Geometry inputs outside the mathematically valid range. Must never reach
/// the pricing stage; callers reject at the boundary where pitch is accepted.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum GeometryError {
    #[error("pitch angle {0}° has no finite slope correction (must be below 90°)")]
    PitchOutOfDomain(i32),
}

/// Horizontal footprint area: `length × width`.
#[must_use]
pub fn plan_area(dimensions: &Dimensions) -> f64 {
    dimensions.length * dimensions.width
}

/// Slope-corrected roof surface area: `plan / cos(pitch)`.
///
/// # Errors
///
/// Returns [`GeometryError::PitchOutOfDomain`] for `pitch_deg >= 90`, where
/// the correction would blow up instead of silently propagating `NaN` or
/// infinity into pricing.
pub fn real_area(dimensions: &Dimensions, pitch_deg: i32) -> Result<f64, GeometryError> {
    Ok(plan_area(dimensions) / cos_pitch(pitch_deg)?)
}

/// Area to order after applying the material's cutting-waste multiplier.
#[must_use]
pub fn waste_area(real_area: f64, waste_factor: Option<f64>) -> f64 {
    real_area * waste_factor.unwrap_or(DEFAULT_WASTE_FACTOR)
}

/// Vertical rise from eave to ridge for a symmetric two-slope section.
///
/// # Errors
///
/// Returns [`GeometryError::PitchOutOfDomain`] for `pitch_deg >= 90`.
pub fn roof_height(width: f64, pitch_deg: i32) -> Result<f64, GeometryError> {
    if pitch_deg >= 90 {
        return Err(GeometryError::PitchOutOfDomain(pitch_deg));
    }
    Ok((width / 2.0) * f64::from(pitch_deg).to_radians().tan())
}

/// Sloped rafter run from eave to ridge (hypotenuse of half-width and rise).
///
/// # Errors
///
/// Returns [`GeometryError::PitchOutOfDomain`] for `pitch_deg >= 90`.
pub fn rafter_length(width: f64, pitch_deg: i32) -> Result<f64, GeometryError> {
    let rise = roof_height(width, pitch_deg)?;
    Ok((width / 2.0).hypot(rise))
}

/// Covered area lost to one obstacle of the given kind, in m².
#[must_use]
pub fn obstacle_area_loss(kind: ObstacleKind) -> f64 {
    match kind {
        ObstacleKind::Chimney => 1.0,
        ObstacleKind::Skylight => 0.5,
        ObstacleKind::RoofHatch => 0.8,
        ObstacleKind::VentPipe => 0.1,
    }
}

/// Total covered area lost to a set of obstacle entries, in m².
#[must_use]
pub fn obstacle_area_reduction(entries: &[ObstacleEntry]) -> f64 {
    entries
        .iter()
        .map(|entry| obstacle_area_loss(entry.kind) * f64::from(entry.quantity))
        .sum()
}

fn cos_pitch(pitch_deg: i32) -> Result<f64, GeometryError> {
    if pitch_deg >= 90 {
        return Err(GeometryError::PitchOutOfDomain(pitch_deg));
    }
    Ok(f64::from(pitch_deg).to_radians().cos())
}
