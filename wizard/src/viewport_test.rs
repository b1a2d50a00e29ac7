#![allow(clippy::float_cmp)]

use super::*;

const EPSILON: f64 = 1e-10;

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

fn point_approx_eq(a: Point, b: Point) -> bool {
    approx_eq(a.x, b.x) && approx_eq(a.y, b.y)
}

// --- Defaults ---

#[test]
fn default_is_identity_view() {
    let vp = Viewport::default();
    assert_eq!(vp.scale, 1.0);
    assert_eq!(vp.offset_x, 0.0);
    assert_eq!(vp.offset_y, 0.0);
}

// --- image_to_screen / screen_to_image ---

#[test]
fn image_to_screen_identity() {
    let vp = Viewport::default();
    let screen = vp.image_to_screen(Point::new(50.0, 75.0));
    assert!(point_approx_eq(screen, Point::new(50.0, 75.0)));
}

#[test]
fn image_to_screen_with_scale_and_offset() {
    let vp = Viewport { scale: 2.0, offset_x: 10.0, offset_y: -5.0 };
    let screen = vp.image_to_screen(Point::new(5.0, 5.0));
    assert!(approx_eq(screen.x, 20.0));
    assert!(approx_eq(screen.y, 5.0));
}

#[test]
fn screen_to_image_with_scale_and_offset() {
    let vp = Viewport { scale: 2.0, offset_x: 20.0, offset_y: 10.0 };
    let image = vp.screen_to_image(Point::new(20.0, 10.0));
    assert!(point_approx_eq(image, Point::new(0.0, 0.0)));
}

#[test]
fn round_trip_image_first() {
    let vp = Viewport { scale: 1.7, offset_x: 33.3, offset_y: -48.1 };
    let image = Point::new(123.4, -567.8);
    let back = vp.screen_to_image(vp.image_to_screen(image));
    assert!(point_approx_eq(image, back));
}

#[test]
fn round_trip_screen_first() {
    let vp = Viewport { scale: 0.45, offset_x: -12.0, offset_y: 99.0 };
    let screen = Point::new(640.0, 480.0);
    let back = vp.image_to_screen(vp.screen_to_image(screen));
    assert!(point_approx_eq(screen, back));
}

#[test]
fn round_trip_across_scale_range() {
    for scale in [0.3, 0.5, 1.0, 1.5, 2.4, 3.0] {
        let vp = Viewport { scale, offset_x: 17.0, offset_y: -9.0 };
        let p = Point::new(200.0, 150.0);
        let back = vp.screen_to_image(vp.image_to_screen(p));
        assert!(point_approx_eq(p, back), "scale {scale}");
    }
}

// --- zoom ---

#[test]
fn zoom_in_multiplies_by_step_factor() {
    let mut vp = Viewport::default();
    vp.zoom(ZoomDirection::In);
    assert!(approx_eq(vp.scale, 1.2));
}

#[test]
fn zoom_out_divides_by_step_factor() {
    let mut vp = Viewport::default();
    vp.zoom(ZoomDirection::Out);
    assert!(approx_eq(vp.scale, 1.0 / 1.2));
}

#[test]
fn repeated_zoom_in_clamps_at_max() {
    let mut vp = Viewport::default();
    for _ in 0..50 {
        vp.zoom(ZoomDirection::In);
    }
    assert_eq!(vp.scale, 3.0);
}

#[test]
fn repeated_zoom_out_clamps_at_min() {
    let mut vp = Viewport::default();
    for _ in 0..50 {
        vp.zoom(ZoomDirection::Out);
    }
    assert_eq!(vp.scale, 0.3);
}

// --- zoom_at ---

#[test]
fn zoom_at_keeps_pointer_anchor_fixed() {
    let mut vp = Viewport { scale: 1.0, offset_x: 12.0, offset_y: -7.0 };
    let pointer = Point::new(320.0, 200.0);
    let before = vp.screen_to_image(pointer);
    vp.zoom_at(WheelDelta { dx: 0.0, dy: -120.0 }, pointer);
    let after = vp.screen_to_image(pointer);
    assert!(point_approx_eq(before, after));
    assert!(approx_eq(vp.scale, 1.1));
}

#[test]
fn zoom_at_anchor_holds_across_repeated_wheel_ticks() {
    let mut vp = Viewport::default();
    let pointer = Point::new(100.0, 50.0);
    let anchor = vp.screen_to_image(pointer);
    for _ in 0..8 {
        vp.zoom_at(WheelDelta { dx: 0.0, dy: -1.0 }, pointer);
    }
    for _ in 0..3 {
        vp.zoom_at(WheelDelta { dx: 0.0, dy: 1.0 }, pointer);
    }
    assert!(point_approx_eq(anchor, vp.screen_to_image(pointer)));
}

#[test]
fn zoom_at_positive_dy_zooms_out() {
    let mut vp = Viewport::default();
    vp.zoom_at(WheelDelta { dx: 0.0, dy: 53.0 }, Point::new(0.0, 0.0));
    assert!(vp.scale < 1.0);
}

#[test]
fn zoom_at_respects_clamp() {
    let mut vp = Viewport::default();
    let pointer = Point::new(10.0, 10.0);
    for _ in 0..100 {
        vp.zoom_at(WheelDelta { dx: 0.0, dy: -1.0 }, pointer);
    }
    assert_eq!(vp.scale, 3.0);
    for _ in 0..200 {
        vp.zoom_at(WheelDelta { dx: 0.0, dy: 1.0 }, pointer);
    }
    assert_eq!(vp.scale, 0.3);
}

// --- pan / reset ---

#[test]
fn pan_is_cumulative_and_unbounded() {
    let mut vp = Viewport::default();
    vp.pan(100.0, -50.0);
    vp.pan(-10_000.0, 10_000.0);
    assert!(approx_eq(vp.offset_x, -9900.0));
    assert!(approx_eq(vp.offset_y, 9950.0));
}

#[test]
fn reset_restores_identity() {
    let mut vp = Viewport { scale: 2.5, offset_x: 300.0, offset_y: -40.0 };
    vp.reset();
    assert_eq!(vp, Viewport::default());
}

// --- fit_to_container ---

#[test]
fn fit_scales_down_large_image() {
    let mut vp = Viewport::default();
    vp.fit_to_container(Size::new(600.0, 400.0), Size::new(1200.0, 800.0));
    assert!(approx_eq(vp.scale, 0.5));
    assert_eq!(vp.offset_x, 0.0);
    assert_eq!(vp.offset_y, 0.0);
}

#[test]
fn fit_never_enlarges_small_image() {
    let mut vp = Viewport::default();
    vp.fit_to_container(Size::new(600.0, 400.0), Size::new(300.0, 200.0));
    assert_eq!(vp.scale, 1.0);
}

#[test]
fn fit_uses_limiting_axis() {
    let mut vp = Viewport::default();
    // Width would allow 0.75, height only 0.4.
    vp.fit_to_container(Size::new(600.0, 200.0), Size::new(800.0, 500.0));
    assert!(approx_eq(vp.scale, 0.4));
}

#[test]
fn fit_clamps_to_zoom_floor() {
    let mut vp = Viewport::default();
    vp.fit_to_container(Size::new(100.0, 100.0), Size::new(10_000.0, 10_000.0));
    assert_eq!(vp.scale, 0.3);
}

// --- zoom_percent ---

#[test]
fn zoom_percent_rounds_to_whole_number() {
    let vp = Viewport { scale: 1.0 / 1.2, offset_x: 0.0, offset_y: 0.0 };
    assert_eq!(vp.zoom_percent(), 83);
    let vp = Viewport { scale: 3.0, offset_x: 0.0, offset_y: 0.0 };
    assert_eq!(vp.zoom_percent(), 300);
}
