#![allow(clippy::float_cmp)]

use super::*;

const EPSILON: f64 = 1e-10;

fn canvas_with_image() -> DimensionCanvas {
    let mut canvas = DimensionCanvas::new(Size::new(600.0, 400.0));
    canvas.load_image(Size::new(800.0, 600.0));
    canvas.set_dimensions(Dimensions::new(10.0, 8.0));
    canvas.set_pitch(35);
    canvas
}

// --- Image loading ---

#[test]
fn load_image_fits_to_container() {
    let canvas = canvas_with_image();
    // 600/800 = 0.75 limits before 400/600 ≈ 0.67 — height is the limiting axis.
    assert!((canvas.viewport().scale - 400.0 / 600.0).abs() < EPSILON);
    assert_eq!(canvas.viewport().offset_x, 0.0);
    assert_eq!(canvas.viewport().offset_y, 0.0);
}

#[test]
fn load_image_resets_previous_pan() {
    let mut canvas = canvas_with_image();
    canvas.on_pointer_down(Point::new(0.0, 0.0));
    canvas.on_pointer_move(Point::new(120.0, 40.0));
    canvas.on_pointer_up();
    canvas.load_image(Size::new(300.0, 200.0));
    assert_eq!(canvas.viewport().offset_x, 0.0);
    assert_eq!(canvas.viewport().offset_y, 0.0);
    assert_eq!(canvas.viewport().scale, 1.0);
}

// --- Handles ---

#[test]
fn length_handle_anchors_to_bottom_edge() {
    let canvas = canvas_with_image();
    let anchor = canvas.handle_anchor(DimensionField::Length);
    assert_eq!(anchor, Point::new(400.0, 580.0));
}

#[test]
fn width_handle_anchors_to_right_edge() {
    let canvas = canvas_with_image();
    let anchor = canvas.handle_anchor(DimensionField::Width);
    assert_eq!(anchor, Point::new(780.0, 300.0));
}

#[test]
fn handle_screen_position_tracks_viewport() {
    let mut canvas = canvas_with_image();
    canvas.reset_view();
    let at_identity = canvas.handle_screen_position(DimensionField::Length);
    assert_eq!(at_identity, Point::new(400.0, 580.0));

    canvas.on_pointer_down(Point::new(0.0, 0.0));
    canvas.on_pointer_move(Point::new(50.0, -25.0));
    let panned = canvas.handle_screen_position(DimensionField::Length);
    assert!((panned.x - 450.0).abs() < EPSILON);
    assert!((panned.y - 555.0).abs() < EPSILON);
}

#[test]
fn label_font_shrinks_as_scale_grows() {
    let mut canvas = canvas_with_image();
    canvas.reset_view();
    assert_eq!(canvas.label_font_px(), 14.0);
    canvas.zoom(ZoomDirection::In);
    assert!((canvas.label_font_px() - 14.0 / 1.2).abs() < EPSILON);
}

// --- Gestures ---

#[test]
fn drag_pans_by_pointer_delta() {
    let mut canvas = canvas_with_image();
    canvas.reset_view();
    canvas.on_pointer_down(Point::new(100.0, 100.0));
    let event = canvas.on_pointer_move(Point::new(130.0, 90.0));
    assert_eq!(event, Some(CanvasEvent::ViewChanged));
    assert!((canvas.viewport().offset_x - 30.0).abs() < EPSILON);
    assert!((canvas.viewport().offset_y + 10.0).abs() < EPSILON);
}

#[test]
fn move_without_down_does_nothing() {
    let mut canvas = canvas_with_image();
    canvas.reset_view();
    assert_eq!(canvas.on_pointer_move(Point::new(10.0, 10.0)), None);
    assert_eq!(canvas.viewport().offset_x, 0.0);
}

#[test]
fn pointer_up_ends_the_drag() {
    let mut canvas = canvas_with_image();
    canvas.on_pointer_down(Point::new(0.0, 0.0));
    canvas.on_pointer_up();
    assert_eq!(canvas.on_pointer_move(Point::new(99.0, 99.0)), None);
}

#[test]
fn wheel_zooms_about_pointer() {
    let mut canvas = canvas_with_image();
    canvas.reset_view();
    let pointer = Point::new(200.0, 150.0);
    let before = canvas.viewport().screen_to_image(pointer);
    let event = canvas.on_wheel(WheelDelta { dx: 0.0, dy: -3.0 }, pointer);
    assert_eq!(event, Some(CanvasEvent::ViewChanged));
    let after = canvas.viewport().screen_to_image(pointer);
    assert!((before.x - after.x).abs() < EPSILON);
    assert!((before.y - after.y).abs() < EPSILON);
    assert!(canvas.viewport().scale > 1.0);
}

#[test]
fn gestures_are_blocked_while_editing() {
    let mut canvas = canvas_with_image();
    canvas.reset_view();
    canvas.begin_edit(DimensionField::Length);
    canvas.on_pointer_down(Point::new(0.0, 0.0));
    assert_eq!(canvas.on_pointer_move(Point::new(40.0, 40.0)), None);
    assert_eq!(canvas.on_wheel(WheelDelta { dx: 0.0, dy: -1.0 }, Point::new(0.0, 0.0)), None);
    assert_eq!(canvas.viewport().scale, 1.0);
}

// --- Zoom commands ---

#[test]
fn zoom_commands_step_and_reset() {
    let mut canvas = canvas_with_image();
    canvas.reset_view();
    canvas.zoom(ZoomDirection::In);
    canvas.zoom(ZoomDirection::In);
    assert!((canvas.viewport().scale - 1.44).abs() < EPSILON);
    assert_eq!(canvas.zoom_percent(), 144);
    canvas.reset_view();
    assert_eq!(canvas.viewport().scale, 1.0);
    assert_eq!(canvas.zoom_percent(), 100);
}

// --- Editing ---

#[test]
fn begin_edit_seeds_buffer_with_current_value() {
    let mut canvas = canvas_with_image();
    let event = canvas.begin_edit(DimensionField::Length);
    assert_eq!(event, CanvasEvent::EditOpened(DimensionField::Length));
    assert_eq!(canvas.edit_buffer(), Some("10"));
    assert_eq!(canvas.editing_field(), Some(DimensionField::Length));
}

#[test]
fn begin_edit_on_zero_value_seeds_empty_buffer() {
    let mut canvas = DimensionCanvas::new(Size::new(600.0, 400.0));
    canvas.begin_edit(DimensionField::Width);
    assert_eq!(canvas.edit_buffer(), Some(""));
}

#[test]
fn commit_valid_edit_updates_dimensions_and_emits() {
    let mut canvas = canvas_with_image();
    canvas.begin_edit(DimensionField::Width);
    canvas.set_edit_input("9.5");
    let event = canvas.commit_edit().unwrap();
    assert_eq!(event, CanvasEvent::DimensionsChanged(Dimensions::new(10.0, 9.5)));
    assert_eq!(canvas.dimensions().width, 9.5);
    assert_eq!(canvas.editing_field(), None);
}

#[test]
fn commit_recomputes_displayed_areas() {
    let mut canvas = canvas_with_image();
    canvas.begin_edit(DimensionField::Length);
    canvas.set_edit_input("12");
    canvas.commit_edit().unwrap();
    assert_eq!(canvas.plan_area(), 12.0 * 8.0);
    let real = canvas.real_area().unwrap();
    assert!((real - 96.0 / 35.0_f64.to_radians().cos()).abs() < 1e-9);
}

#[test]
fn commit_below_minimum_is_rejected_without_mutation() {
    let mut canvas = canvas_with_image();
    canvas.begin_edit(DimensionField::Length);
    canvas.set_edit_input("1.5");
    let err = canvas.commit_edit().unwrap_err();
    assert!(matches!(err, CanvasError::Invalid(ValidationError::DimensionOutOfRange { .. })));
    assert_eq!(canvas.dimensions(), Dimensions::new(10.0, 8.0));
    // Surface is dismissed even on rejection.
    assert_eq!(canvas.editing_field(), None);
}

#[test]
fn commit_above_maximum_is_rejected() {
    let mut canvas = canvas_with_image();
    canvas.begin_edit(DimensionField::Width);
    canvas.set_edit_input("51");
    assert!(canvas.commit_edit().is_err());
    assert_eq!(canvas.dimensions().width, 8.0);
}

#[test]
fn commit_non_numeric_input_is_rejected() {
    let mut canvas = canvas_with_image();
    canvas.begin_edit(DimensionField::Length);
    canvas.set_edit_input("ten meters");
    let err = canvas.commit_edit().unwrap_err();
    assert!(matches!(err, CanvasError::Invalid(ValidationError::NotANumber { .. })));
    assert_eq!(canvas.dimensions().length, 10.0);
}

#[test]
fn commit_without_edit_fails() {
    let mut canvas = canvas_with_image();
    assert_eq!(canvas.commit_edit().unwrap_err(), CanvasError::NoActiveEdit);
}

#[test]
fn cancel_discards_edit_without_mutation() {
    let mut canvas = canvas_with_image();
    canvas.begin_edit(DimensionField::Length);
    canvas.set_edit_input("47");
    let event = canvas.cancel_edit();
    assert_eq!(event, CanvasEvent::EditDismissed);
    assert_eq!(canvas.dimensions().length, 10.0);
    assert_eq!(canvas.editing_field(), None);
}

#[test]
fn commit_accepts_whitespace_padding() {
    let mut canvas = canvas_with_image();
    canvas.begin_edit(DimensionField::Length);
    canvas.set_edit_input("  12.5  ");
    canvas.commit_edit().unwrap();
    assert_eq!(canvas.dimensions().length, 12.5);
}
