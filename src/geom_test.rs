#![allow(clippy::float_cmp)]

use super::*;

const EPSILON: f64 = 1e-9;

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

fn point_approx_eq(a: Point, b: Point) -> bool {
    approx_eq(a.x, b.x) && approx_eq(a.y, b.y)
}

// --- rotate_point ---

#[test]
fn rotate_zero_is_identity() {
    for &(x, y, cx, cy) in &[(0.0, 0.0, 0.0, 0.0), (12.5, -3.25, 100.0, 40.0), (1e6, 7.0, -3.0, 9.0)] {
        let p = rotate_point(x, y, cx, cy, 0.0);
        assert_eq!(p, Point::new(x, y));
    }
}

#[test]
fn rotate_full_turns_are_identity() {
    for angle in [360.0, -360.0, 720.0, -1080.0] {
        let p = rotate_point(15.0, 25.0, 5.0, 5.0, angle);
        assert_eq!(p, Point::new(15.0, 25.0));
    }
}

#[test]
fn rotate_is_periodic() {
    for theta in [-170.0, -33.3, 1.0, 45.0, 90.0, 271.5] {
        let a = rotate_point(30.0, -12.0, 4.0, 8.0, theta);
        let b = rotate_point(30.0, -12.0, 4.0, 8.0, theta + 360.0);
        assert!(point_approx_eq(a, b), "theta {theta}: {a:?} vs {b:?}");
    }
}

#[test]
fn rotate_ninety_is_clockwise_with_y_down() {
    // +X axis rotates onto +Y (down on screen).
    let p = rotate_point(10.0, 0.0, 0.0, 0.0, 90.0);
    assert!(point_approx_eq(p, Point::new(0.0, 10.0)));
}

#[test]
fn rotate_about_offset_center() {
    let p = rotate_point(110.0, 50.0, 100.0, 50.0, 180.0);
    assert!(point_approx_eq(p, Point::new(90.0, 50.0)));
}

#[test]
fn rotate_preserves_distance_to_center() {
    let c = Point::new(3.0, 4.0);
    let p = rotate_point(10.0, 20.0, c.x, c.y, 37.0);
    let before = ((10.0 - c.x).powi(2) + (20.0 - c.y).powi(2)).sqrt();
    let after = ((p.x - c.x).powi(2) + (p.y - c.y).powi(2)).sqrt();
    assert!(approx_eq(before, after));
}

#[test]
fn rotate_center_is_fixed_point() {
    let p = rotate_point(7.0, 9.0, 7.0, 9.0, 123.0);
    assert!(point_approx_eq(p, Point::new(7.0, 9.0)));
}

// --- angle_of ---

#[test]
fn angle_of_axes() {
    assert!(approx_eq(angle_of(0.0, 0.0, 1.0, 0.0), 0.0));
    assert!(approx_eq(angle_of(0.0, 0.0, 0.0, 1.0), 90.0));
    assert!(approx_eq(angle_of(0.0, 0.0, -1.0, 0.0), 180.0));
    assert!(approx_eq(angle_of(0.0, 0.0, 0.0, -1.0), -90.0));
}

#[test]
fn angle_of_matches_rotate_point() {
    let start = angle_of(50.0, 50.0, 80.0, 50.0);
    let moved = rotate_point(80.0, 50.0, 50.0, 50.0, 30.0);
    let now = angle_of(50.0, 50.0, moved.x, moved.y);
    assert!(approx_eq(now - start, 30.0));
}

// --- drag_rotation ---

#[test]
fn drag_rotation_adds_pointer_travel() {
    assert_eq!(drag_rotation(10.0, 45.0, 90.0), 55.0);
    assert_eq!(drag_rotation(-5.0, 0.0, -20.0), -25.0);
}

#[test]
fn drag_rotation_is_unbounded() {
    assert_eq!(drag_rotation(350.0, 0.0, 170.0), 520.0);
}

// --- Rect ---

#[test]
fn rect_from_corners_normalizes() {
    let r = Rect::from_corners(Point::new(50.0, 40.0), Point::new(10.0, 5.0));
    assert_eq!(r, Rect::new(10.0, 5.0, 40.0, 35.0));
}

#[test]
fn rect_contains_edges_inclusive() {
    let r = Rect::new(0.0, 0.0, 10.0, 10.0);
    assert!(r.contains(Point::new(0.0, 0.0)));
    assert!(r.contains(Point::new(10.0, 10.0)));
    assert!(!r.contains(Point::new(10.01, 5.0)));
    assert!(!r.contains(Point::new(5.0, -0.01)));
}
