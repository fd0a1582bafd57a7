#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use crate::geom::{Point, rotate_point};
use crate::scene::{CanonicalImage, DrawableRegion, ItemId, Scene, SceneItem};

/// Which kind of item was hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitKind {
    Image,
    Region,
}

/// Result of a hit test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hit {
    pub item_id: ItemId,
    pub kind: HitKind,
}

/// Topmost item under `canonical_pt`, honouring z-order.
///
/// Rotated images are tested in their own unrotated frame, so the hit area
/// follows what is drawn on screen.
#[must_use]
pub fn hit_test(canonical_pt: Point, scene: &Scene) -> Option<Hit> {
    scene.sorted_items().into_iter().rev().find_map(|item| match item {
        SceneItem::Image(img) if image_contains(img, canonical_pt) => {
            Some(Hit { item_id: img.id.clone(), kind: HitKind::Image })
        }
        SceneItem::Region(region) if region.bounds().contains(canonical_pt) => {
            Some(Hit { item_id: region.id.clone(), kind: HitKind::Region })
        }
        _ => None,
    })
}

/// Whether a point lies on an image, accounting for its rotation about the pivot.
#[must_use]
pub fn image_contains(img: &CanonicalImage, canonical_pt: Point) -> bool {
    let local = match img.pivot {
        Some(pivot) if img.rotation != 0.0 => {
            rotate_point(canonical_pt.x, canonical_pt.y, pivot.x, pivot.y, -img.rotation)
        }
        _ => canonical_pt,
    };
    img.bounds().contains(local)
}

/// Every drawable region whose viewport contains `canonical_pt`, in draw order.
#[must_use]
pub fn regions_containing(canonical_pt: Point, scene: &Scene) -> Vec<&DrawableRegion> {
    scene
        .regions()
        .into_iter()
        .filter(|region| region.bounds().contains(canonical_pt))
        .collect()
}
