use super::*;
use crate::geom::Size;
use crate::scene::BaseImage;

fn scene() -> Scene {
    let mut scene = Scene::new(Size::new(800.0, 600.0));
    scene.set_base_image(BaseImage { reference: "base".into(), width: 800.0, height: 600.0 });
    scene
}

fn image_at(id: &str, x: f64, y: f64, z: i64) -> CanonicalImage {
    let mut img = CanonicalImage::new(id, "img", 100.0, 50.0);
    img.x = x;
    img.y = y;
    img.z_index = z;
    img
}

fn region_at(id: &str, x: f64, y: f64, z: i64) -> DrawableRegion {
    DrawableRegion {
        id: id.into(),
        x,
        y,
        width: 200.0,
        height: 100.0,
        scroll_width: 600.0,
        z_index: z,
        color: "#fff".into(),
    }
}

#[test]
fn empty_scene_has_no_hit() {
    assert!(hit_test(Point::new(10.0, 10.0), &scene()).is_none());
}

#[test]
fn topmost_item_wins() {
    let mut s = scene();
    s.add_image(image_at("low", 0.0, 0.0, 0)).unwrap();
    s.add_image(image_at("high", 50.0, 0.0, 3)).unwrap();
    let hit = hit_test(Point::new(75.0, 25.0), &s).unwrap();
    assert_eq!(hit, Hit { item_id: "high".into(), kind: HitKind::Image });

    let hit = hit_test(Point::new(25.0, 25.0), &s).unwrap();
    assert_eq!(hit.item_id, "low");
}

#[test]
fn region_hit_reports_kind() {
    let mut s = scene();
    s.add_region(region_at("paper", 100.0, 300.0, 0)).unwrap();
    let hit = hit_test(Point::new(150.0, 350.0), &s).unwrap();
    assert_eq!(hit.kind, HitKind::Region);
    assert!(hit_test(Point::new(99.0, 350.0), &s).is_none());
}

#[test]
fn rotated_image_hit_follows_rotation() {
    let mut img = image_at("lever", 100.0, 100.0, 0);
    img.pivot = Some(Point::new(100.0, 125.0));
    img.rotation = 90.0;
    // The body now hangs below the pivot instead of extending right.
    assert!(image_contains(&img, Point::new(110.0, 200.0)));
    assert!(!image_contains(&img, Point::new(180.0, 110.0)));
}

#[test]
fn regions_containing_returns_all_overlaps() {
    let mut s = scene();
    s.add_region(region_at("a", 0.0, 0.0, 0)).unwrap();
    s.add_region(region_at("b", 100.0, 50.0, 1)).unwrap();
    s.add_region(region_at("c", 500.0, 500.0, 2)).unwrap();
    let hits: Vec<&str> = regions_containing(Point::new(150.0, 75.0), &s)
        .iter()
        .map(|r| r.id.as_str())
        .collect();
    assert_eq!(hits, vec!["a", "b"]);
}

#[test]
fn regions_containing_ignores_images() {
    let mut s = scene();
    s.add_image(image_at("img", 0.0, 0.0, 0)).unwrap();
    assert!(regions_containing(Point::new(10.0, 10.0), &s).is_empty());
}
