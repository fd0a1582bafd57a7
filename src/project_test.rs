#![allow(clippy::float_cmp)]

use serde_json::json;

use super::*;

fn minimal() -> Value {
    json!({
        "baseImage": "data:image/png;base64,AAAA",
        "baseImageDimensions": { "width": 1000, "height": 700 },
        "subImages": [],
    })
}

fn full() -> Value {
    json!({
        "baseImage": "base.png",
        "baseImageDimensions": { "width": 1000, "height": 700 },
        "subImages": [
            { "id": "stand", "url": "stand.png", "x": 10, "y": 20, "width": 300, "height": 400, "zIndex": 1 },
            {
                "id": "lever", "url": "lever.png", "x": 100, "y": 100, "width": 200, "height": 20,
                "zIndex": 3, "centerX": 110, "centerY": 110,
                "penTipOffsetX": 195, "penTipOffsetY": 10, "rotation": -4.5
            }
        ],
        "drawableAreas": [
            { "id": "drum", "x": 400, "y": 50, "width": 300, "height": 200,
              "scrollWidth": 900, "zIndex": 2, "color": "#fffbe6" }
        ],
    })
}

fn parse(value: &Value) -> Result<ProjectDocument, ImportError> {
    ProjectDocument::parse(&value.to_string())
}

// =============================================================
// Structural validation
// =============================================================

#[test]
fn minimal_document_imports_with_defaults() {
    let doc = parse(&minimal()).unwrap();
    assert!(doc.drawable_areas.is_empty());
    let scene = doc.to_scene().unwrap();
    assert!(scene.is_empty());
    assert_eq!(scene.canvas_size(), Size::new(1000.0, 700.0));
    assert_eq!(scene.base_image().unwrap().reference, "data:image/png;base64,AAAA");
}

#[test]
fn missing_base_image_is_rejected() {
    let mut value = minimal();
    value.as_object_mut().unwrap().remove("baseImage");
    assert!(matches!(parse(&value), Err(ImportError::MissingBaseImage)));

    value["baseImage"] = json!("");
    assert!(matches!(parse(&value), Err(ImportError::MissingBaseImage)));
}

#[test]
fn sub_images_must_be_a_list() {
    let mut value = minimal();
    value["subImages"] = json!({ "id": "x" });
    assert!(matches!(parse(&value), Err(ImportError::SubImagesNotList)));

    value.as_object_mut().unwrap().remove("subImages");
    assert!(matches!(parse(&value), Err(ImportError::SubImagesNotList)));
}

#[test]
fn malformed_json_is_rejected() {
    assert!(matches!(ProjectDocument::parse("{ nope"), Err(ImportError::Json(_))));
}

#[test]
fn wrongly_typed_record_is_rejected() {
    let mut value = minimal();
    value["subImages"] = json!([{ "id": "a", "url": "a.png", "x": "left", "y": 0, "width": 1, "height": 1 }]);
    assert!(matches!(parse(&value), Err(ImportError::InvalidField(_))));
}

// =============================================================
// Records -> scene
// =============================================================

#[test]
fn full_document_builds_scene() {
    let scene = parse(&full()).unwrap().to_scene().unwrap();
    assert_eq!(scene.len(), 3);

    let lever = scene.image("lever").unwrap();
    assert_eq!(lever.pivot, Some(Point::new(110.0, 110.0)));
    assert_eq!(lever.pen_tip_offset, Some(Point::new(195.0, 10.0)));
    assert_eq!(lever.rotation, -4.5);
    assert_eq!(lever.z_index, 3);

    let stand = scene.image("stand").unwrap();
    assert_eq!(stand.rotation, 0.0);
    assert!(stand.pivot.is_none());

    let drum = scene.region("drum").unwrap();
    assert_eq!(drum.scroll_width, 900.0);
    assert_eq!(drum.color, "#fffbe6");

    let order: Vec<&str> = scene.sorted_items().iter().map(|i| i.id()).collect();
    assert_eq!(order, vec!["stand", "drum", "lever"]);
}

#[test]
fn missing_z_index_and_color_default() {
    let mut value = minimal();
    value["subImages"] = json!([{ "id": "a", "url": "a.png", "x": 0, "y": 0, "width": 5, "height": 5 }]);
    value["drawableAreas"] = json!([{ "id": "r", "x": 0, "y": 0, "width": 50, "height": 50, "scrollWidth": 150 }]);
    let scene = parse(&value).unwrap().to_scene().unwrap();
    assert_eq!(scene.image("a").unwrap().z_index, 0);
    assert_eq!(scene.region("r").unwrap().color, DEFAULT_PAPER_COLOR);
}

#[test]
fn duplicate_ids_are_rejected() {
    let mut value = full();
    value["drawableAreas"][0]["id"] = json!("lever");
    let err = parse(&value).unwrap().to_scene().unwrap_err();
    assert!(matches!(err, ImportError::Scene(SceneError::DuplicateId(id)) if id == "lever"));
}

#[test]
fn pen_tip_without_center_is_rejected() {
    let mut value = full();
    let lever = value["subImages"][1].as_object_mut().unwrap();
    lever.remove("centerX");
    lever.remove("centerY");
    let err = parse(&value).unwrap().to_scene().unwrap_err();
    assert!(matches!(err, ImportError::Scene(SceneError::PenTipWithoutPivot(_))));
}

#[test]
fn half_specified_center_is_rejected() {
    let mut value = full();
    value["subImages"][1].as_object_mut().unwrap().remove("centerY");
    let err = parse(&value).unwrap().to_scene().unwrap_err();
    assert!(matches!(err, ImportError::InvalidField(_)));
}

#[test]
fn non_positive_dimensions_are_rejected() {
    let mut value = minimal();
    value["baseImageDimensions"]["width"] = json!(0);
    assert!(matches!(parse(&value).unwrap().to_scene(), Err(ImportError::InvalidField(_))));

    let mut value = full();
    value["drawableAreas"][0]["scrollWidth"] = json!(-1);
    assert!(matches!(parse(&value).unwrap().to_scene(), Err(ImportError::InvalidField(_))));
}

// =============================================================
// Scene -> document
// =============================================================

#[test]
fn export_reproduces_imported_document() {
    let doc = parse(&full()).unwrap();
    let scene = doc.to_scene().unwrap();
    let exported = ProjectDocument::from_scene(&scene).unwrap();
    assert_eq!(exported.base_image, doc.base_image);
    assert_eq!(exported.sub_images, doc.sub_images);
    assert_eq!(exported.drawable_areas, doc.drawable_areas);

    let text = exported.to_json().unwrap();
    let reparsed = ProjectDocument::parse(&text).unwrap();
    assert_eq!(reparsed, exported);
}

#[test]
fn export_omits_unset_points() {
    let scene = parse(&full()).unwrap().to_scene().unwrap();
    let value = serde_json::to_value(ProjectDocument::from_scene(&scene).unwrap()).unwrap();
    let stand = &value["subImages"][0];
    assert_eq!(stand["id"], "stand");
    assert!(stand.get("centerX").is_none());
    assert!(stand.get("penTipOffsetY").is_none());
    assert_eq!(value["drawableAreas"][0]["scrollWidth"], 900.0);
}

#[test]
fn export_normalizes_region_colors() {
    let mut value = full();
    value["drawableAreas"][0]["color"] = json!("#ABC");
    let scene = parse(&value).unwrap().to_scene().unwrap();
    let exported = ProjectDocument::from_scene(&scene).unwrap();
    assert_eq!(exported.drawable_areas[0].color, "#aabbcc");
}

#[test]
fn export_needs_base_image() {
    let scene = Scene::new(Size::new(800.0, 600.0));
    assert!(ProjectDocument::from_scene(&scene).is_none());
}
