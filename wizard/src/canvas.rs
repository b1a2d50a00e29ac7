//! Interactive dimension canvas.
//!
//! Composes the pan/zoom [`Viewport`] with two editable measurement overlays:
//! "length" runs along the bottom edge of the plan image, "width" along the
//! right edge. Handle positions are derived from fixed image-space anchors so
//! they track the image under any zoom or pan, and label text is scaled by
//! `1/scale` so it stays legible. Raw gestures come in, typed events go out;
//! the host owns rendering and routes dimension changes to the wizard.

#[cfg(test)]
#[path = "canvas_test.rs"]
mod canvas_test;

use wire::Dimensions;

use crate::consts::{EDGE_INSET_PX, LABEL_FONT_PX};
use crate::geometry::{self, GeometryError};
use crate::quote::{validate_dimension, ValidationError};
use crate::viewport::{Point, Size, Viewport, WheelDelta, ZoomDirection};

/// Which measurement overlay a gesture or edit targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DimensionField {
    Length,
    Width,
}

/// A failed edit commit. The edit surface is dismissed either way; the
/// displayed dimensions are never partially mutated.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum CanvasError {
    #[error("no edit in progress")]
    NoActiveEdit,
    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

/// Typed events emitted by canvas interactions for the host to process.
#[derive(Debug, Clone, PartialEq)]
pub enum CanvasEvent {
    /// A handle edit was committed with a valid value.
    DimensionsChanged(Dimensions),
    /// Scale or offset changed; overlays need re-rendering.
    ViewChanged,
    /// The numeric edit surface opened for a handle.
    EditOpened(DimensionField),
    /// The edit surface closed without changing anything.
    EditDismissed,
}

/// In-progress numeric edit for one handle.
#[derive(Debug, Clone, PartialEq, Eq)]
struct DimensionEdit {
    field: DimensionField,
    buffer: String,
}

/// Active gesture tracked between pointer-down and pointer-up.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
enum Gesture {
    #[default]
    Idle,
    /// Dragging the stage; carries the previous pointer position so each
    /// move event becomes an incremental pan delta.
    Panning { last_screen: Point },
}

/// The dimension canvas: viewport + overlay handles + edit surface.
#[derive(Debug, Clone)]
pub struct DimensionCanvas {
    viewport: Viewport,
    container: Size,
    image: Option<Size>,
    dimensions: Dimensions,
    pitch_deg: i32,
    edit: Option<DimensionEdit>,
    gesture: Gesture,
}

impl DimensionCanvas {
    #[must_use]
    pub fn new(container: Size) -> Self {
        Self {
            viewport: Viewport::new(),
            container,
            image: None,
            dimensions: Dimensions::default(),
            pitch_deg: crate::consts::DEFAULT_PITCH_DEG,
            edit: None,
            gesture: Gesture::Idle,
        }
    }

    // --- Data inputs ---

    /// Install a freshly loaded plan image and fit it to the container.
    pub fn load_image(&mut self, image: Size) {
        self.image = Some(image);
        self.viewport.fit_to_container(self.container, image);
    }

    /// Track a container resize. The view is left where the user put it.
    pub fn set_container(&mut self, container: Size) {
        self.container = container;
    }

    /// Sync the displayed dimensions from the wizard snapshot.
    pub fn set_dimensions(&mut self, dimensions: Dimensions) {
        self.dimensions = dimensions;
    }

    /// Sync the displayed pitch from the wizard snapshot.
    pub fn set_pitch(&mut self, pitch_deg: i32) {
        self.pitch_deg = pitch_deg;
    }

    // --- Queries ---

    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    #[must_use]
    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    #[must_use]
    pub fn dimension_value(&self, field: DimensionField) -> f64 {
        match field {
            DimensionField::Length => self.dimensions.length,
            DimensionField::Width => self.dimensions.width,
        }
    }

    /// Field currently being edited, if the edit surface is open.
    #[must_use]
    pub fn editing_field(&self) -> Option<DimensionField> {
        self.edit.as_ref().map(|edit| edit.field)
    }

    /// Current text in the edit surface.
    #[must_use]
    pub fn edit_buffer(&self) -> Option<&str> {
        self.edit.as_ref().map(|edit| edit.buffer.as_str())
    }

    /// Zoom readout for the toolbar, in whole percent.
    #[must_use]
    pub fn zoom_percent(&self) -> u32 {
        self.viewport.zoom_percent()
    }

    /// Image-space anchor of a handle: length is centered on the bottom
    /// edge, width is centered on the right edge.
    #[must_use]
    pub fn handle_anchor(&self, field: DimensionField) -> Point {
        let image = self.image.unwrap_or(Size::new(800.0, 600.0));
        match field {
            DimensionField::Length => Point::new(image.width / 2.0, image.height - EDGE_INSET_PX),
            DimensionField::Width => Point::new(image.width - EDGE_INSET_PX, image.height / 2.0),
        }
    }

    /// Where a handle currently sits on screen.
    #[must_use]
    pub fn handle_screen_position(&self, field: DimensionField) -> Point {
        self.viewport.image_to_screen(self.handle_anchor(field))
    }

    /// Label font size in screen pixels, inverse to the current scale.
    #[must_use]
    pub fn label_font_px(&self) -> f64 {
        LABEL_FONT_PX / self.viewport.scale
    }

    /// Footprint area for the quick-info readout.
    #[must_use]
    pub fn plan_area(&self) -> f64 {
        geometry::plan_area(&self.dimensions)
    }

    /// Slope-corrected area for the quick-info readout.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::PitchOutOfDomain`] for pitch ≥ 90°.
    pub fn real_area(&self) -> Result<f64, GeometryError> {
        geometry::real_area(&self.dimensions, self.pitch_deg)
    }

    // --- View commands ---

    pub fn zoom(&mut self, direction: ZoomDirection) -> CanvasEvent {
        self.viewport.zoom(direction);
        CanvasEvent::ViewChanged
    }

    pub fn reset_view(&mut self) -> CanvasEvent {
        self.viewport.reset();
        CanvasEvent::ViewChanged
    }

    // --- Gestures ---

    /// Pointer pressed: begins a stage drag unless the edit surface is open.
    pub fn on_pointer_down(&mut self, screen: Point) {
        if self.edit.is_none() {
            self.gesture = Gesture::Panning { last_screen: screen };
        }
    }

    /// Pointer moved: pans by the delta from the previous event while dragging.
    pub fn on_pointer_move(&mut self, screen: Point) -> Option<CanvasEvent> {
        match self.gesture {
            Gesture::Panning { last_screen } => {
                self.viewport.pan(screen.x - last_screen.x, screen.y - last_screen.y);
                self.gesture = Gesture::Panning { last_screen: screen };
                Some(CanvasEvent::ViewChanged)
            }
            Gesture::Idle => None,
        }
    }

    /// Pointer released: ends the drag.
    pub fn on_pointer_up(&mut self) {
        self.gesture = Gesture::Idle;
    }

    /// Wheel scroll: anchored zoom, ignored while the edit surface is open.
    pub fn on_wheel(&mut self, delta: WheelDelta, pointer: Point) -> Option<CanvasEvent> {
        if self.edit.is_some() {
            return None;
        }
        self.viewport.zoom_at(delta, pointer);
        Some(CanvasEvent::ViewChanged)
    }

    // --- Dimension editing ---

    /// Open the numeric edit surface for a handle, seeded with the current
    /// value.
    pub fn begin_edit(&mut self, field: DimensionField) -> CanvasEvent {
        let value = self.dimension_value(field);
        let buffer = if value == 0.0 { String::new() } else { format!("{value}") };
        self.edit = Some(DimensionEdit { field, buffer });
        self.gesture = Gesture::Idle;
        CanvasEvent::EditOpened(field)
    }

    /// Replace the edit surface text.
    pub fn set_edit_input(&mut self, input: &str) {
        if let Some(edit) = self.edit.as_mut() {
            edit.buffer = input.to_owned();
        }
    }

    /// Escape/cancel: discard the edit without mutation.
    pub fn cancel_edit(&mut self) -> CanvasEvent {
        self.edit = None;
        CanvasEvent::EditDismissed
    }

    /// Commit the edit surface. A valid value updates the displayed
    /// dimensions and is reported for the wizard to adopt; anything else is
    /// rejected whole. The surface is dismissed in every case.
    ///
    /// # Errors
    ///
    /// [`CanvasError::NoActiveEdit`] when no edit is open;
    /// [`CanvasError::Invalid`] for unparsable input or a value outside the
    /// accepted range — the displayed dimensions are untouched.
    pub fn commit_edit(&mut self) -> Result<CanvasEvent, CanvasError> {
        let edit = self.edit.take().ok_or(CanvasError::NoActiveEdit)?;
        let trimmed = edit.buffer.trim();
        let value: f64 = trimmed
            .parse()
            .map_err(|_| ValidationError::NotANumber { input: trimmed.to_owned() })?;
        let value = validate_dimension(value)?;
        match edit.field {
            DimensionField::Length => self.dimensions.length = value,
            DimensionField::Width => self.dimensions.width = value,
        }
        Ok(CanvasEvent::DimensionsChanged(self.dimensions))
    }
}
