#![allow(clippy::float_cmp)]

use super::*;

const EPSILON: f64 = 1e-10;

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

fn fitted(content: Size, container: Size) -> Viewport {
    let mut vp = Viewport::new(40.0, 600.0);
    vp.set_content(content);
    vp.set_container(Point::new(0.0, 0.0), container);
    vp
}

// --- fit_scale ---

#[test]
fn fit_never_magnifies() {
    let s = Viewport::fit_scale(Size::new(100.0, 100.0), Size::new(4000.0, 4000.0), 40.0, 600.0);
    assert_eq!(s, 1.0);
}

#[test]
fn fit_uses_width_after_padding() {
    // avail_w = 440, avail_h = 600 -> min(440/800, 600/400) = 0.55
    let s = Viewport::fit_scale(Size::new(800.0, 400.0), Size::new(480.0, 900.0), 40.0, 600.0);
    assert!(approx_eq(s, 0.55));
}

#[test]
fn fit_caps_height() {
    // avail_h = min(2000, 600) = 600 -> 600/1200 = 0.5
    let s = Viewport::fit_scale(Size::new(500.0, 1200.0), Size::new(2000.0, 2000.0), 40.0, 600.0);
    assert!(approx_eq(s, 0.5));
}

#[test]
fn fit_is_monotonic_in_container_size() {
    let content = Size::new(1024.0, 768.0);
    let mut last = f64::INFINITY;
    for w in (100..=2000).rev().step_by(50) {
        let w = f64::from(w);
        let s = Viewport::fit_scale(content, Size::new(w, w * 0.75), 40.0, 600.0);
        assert!(s <= last, "shrinking to {w} raised scale {last} -> {s}");
        assert!(s <= 1.0);
        last = s;
    }
}

#[test]
fn fit_with_empty_content_is_identity() {
    assert_eq!(Viewport::fit_scale(Size::new(0.0, 0.0), Size::new(10.0, 10.0), 40.0, 600.0), 1.0);
}

#[test]
fn fit_with_collapsed_container_stays_positive() {
    let s = Viewport::fit_scale(Size::new(800.0, 600.0), Size::new(10.0, 0.0), 40.0, 600.0);
    assert_eq!(s, MIN_SCALE);
}

// --- conversions ---

#[test]
fn screen_to_canonical_divides_by_scale() {
    let mut vp = fitted(Size::new(800.0, 400.0), Size::new(440.0, 900.0));
    vp.set_container(Point::new(100.0, 50.0), Size::new(440.0, 900.0));
    // scale = 400/800 = 0.5
    assert!(approx_eq(vp.scale(), 0.5));
    let c = vp.screen_to_canonical(Point::new(150.0, 80.0));
    assert!(approx_eq(c.x, 100.0));
    assert!(approx_eq(c.y, 60.0));
}

#[test]
fn conversions_are_inverse_on_both_axes() {
    let mut vp = fitted(Size::new(1600.0, 1200.0), Size::new(840.0, 700.0));
    vp.set_container(Point::new(12.0, 34.0), Size::new(840.0, 700.0));
    let p = Point::new(321.0, 654.0);
    let back = vp.screen_to_canonical(vp.canonical_to_screen(p));
    assert!(approx_eq(back.x, p.x));
    assert!(approx_eq(back.y, p.y));
}

#[test]
fn distance_conversion_uses_scale() {
    let vp = fitted(Size::new(800.0, 400.0), Size::new(440.0, 900.0));
    assert!(approx_eq(vp.canonical_dist_to_screen(100.0), 50.0));
    assert!(approx_eq(vp.screen_dist_to_canonical(50.0), 100.0));
}

#[test]
fn display_size_is_scaled_content() {
    let vp = fitted(Size::new(800.0, 400.0), Size::new(440.0, 900.0));
    assert_eq!(vp.display_size(), Size::new(400.0, 200.0));
}

#[test]
fn content_change_refits() {
    let mut vp = fitted(Size::new(800.0, 400.0), Size::new(440.0, 900.0));
    vp.set_content(Size::new(200.0, 100.0));
    assert_eq!(vp.scale(), 1.0);
}
