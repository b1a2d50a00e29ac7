//! Shared numeric constants for the authoring engine.

// ── Dimension domain ────────────────────────────────────────────

/// Smallest accepted building dimension, in meters.
pub const DIMENSION_MIN_M: f64 = 2.0;

/// Largest accepted building dimension, in meters.
pub const DIMENSION_MAX_M: f64 = 50.0;

// ── Pitch domain ────────────────────────────────────────────────

/// Smallest accepted roof pitch, in whole degrees.
pub const PITCH_MIN_DEG: i32 = 15;

/// Largest accepted roof pitch, in whole degrees.
pub const PITCH_MAX_DEG: i32 = 60;

/// Pitch used for a fresh quote before extraction or manual entry.
pub const DEFAULT_PITCH_DEG: i32 = 35;

// ── Viewport ────────────────────────────────────────────────────

/// Lower zoom clamp.
pub const ZOOM_MIN: f64 = 0.3;

/// Upper zoom clamp.
pub const ZOOM_MAX: f64 = 3.0;

/// Scale factor applied per explicit zoom-in/zoom-out command.
pub const ZOOM_STEP_FACTOR: f64 = 1.2;

/// Scale factor applied per wheel tick.
pub const WHEEL_ZOOM_FACTOR: f64 = 1.1;

// ── Canvas overlay ──────────────────────────────────────────────

/// Inset of the dimension lines from the image edges, in image pixels.
pub const EDGE_INSET_PX: f64 = 20.0;

/// Label font size at scale 1.0; rendered size is divided by the current
/// scale so labels stay legible at any zoom.
pub const LABEL_FONT_PX: f64 = 14.0;

// ── Materials ───────────────────────────────────────────────────

/// Waste multiplier used when the selected material does not declare one.
pub const DEFAULT_WASTE_FACTOR: f64 = 1.12;

// ── Upload ──────────────────────────────────────────────────────

/// Upper bound on uploaded plan images, in bytes.
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;
