//! Project documents: the camelCase JSON bootstrap format.
//!
//! Import is all-or-nothing. The document is checked structurally first, then
//! decoded into records, then built into a fresh [`Scene`]; only a scene that
//! built cleanly is handed back for the caller to swap in.

#[cfg(test)]
#[path = "project_test.rs"]
mod project_test;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::color::normalize_hex_color;
use crate::consts::DEFAULT_PAPER_COLOR;
use crate::geom::{Point, Size};
use crate::scene::{BaseImage, CanonicalImage, DrawableRegion, Scene, SceneError};

/// Error returned when a project document cannot be imported.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("project is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("project has no baseImage")]
    MissingBaseImage,
    #[error("project subImages must be a list")]
    SubImagesNotList,
    #[error("invalid project field: {0}")]
    InvalidField(String),
    #[error(transparent)]
    Scene(#[from] SceneError),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: f64,
    pub height: f64,
}

/// One overlay image record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubImageRecord {
    pub id: String,
    pub url: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub z_index: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub center_x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub center_y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pen_tip_offset_x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pen_tip_offset_y: Option<f64>,
    #[serde(default)]
    pub rotation: f64,
}

/// One drawable region record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawableAreaRecord {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub scroll_width: f64,
    #[serde(default)]
    pub z_index: i64,
    #[serde(default = "default_color")]
    pub color: String,
}

fn default_color() -> String {
    DEFAULT_PAPER_COLOR.to_owned()
}

/// The whole bootstrap document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDocument {
    pub base_image: String,
    pub base_image_dimensions: Dimensions,
    pub sub_images: Vec<SubImageRecord>,
    #[serde(default)]
    pub drawable_areas: Vec<DrawableAreaRecord>,
}

impl ProjectDocument {
    /// Parse and structurally validate a document.
    ///
    /// # Errors
    ///
    /// [`ImportError::MissingBaseImage`] and [`ImportError::SubImagesNotList`] for
    /// the two structural checks, [`ImportError::InvalidField`] when a record has
    /// the wrong shape, [`ImportError::Json`] for malformed text.
    pub fn parse(json: &str) -> Result<Self, ImportError> {
        let value: Value = serde_json::from_str(json)?;
        match value.get("baseImage") {
            Some(Value::String(s)) if !s.is_empty() => {}
            _ => return Err(ImportError::MissingBaseImage),
        }
        if !value.get("subImages").is_some_and(Value::is_array) {
            return Err(ImportError::SubImagesNotList);
        }
        serde_json::from_value(value).map_err(|e| ImportError::InvalidField(e.to_string()))
    }

    /// Build a fresh scene from the records.
    ///
    /// A pivot needs both `centerX` and `centerY`; a pen tip needs both offsets.
    ///
    /// # Errors
    ///
    /// [`ImportError::InvalidField`] for non-positive dimensions or a half-specified
    /// point, and [`ImportError::Scene`] for duplicate ids or a pen tip without pivot.
    pub fn to_scene(&self) -> Result<Scene, ImportError> {
        let dims = self.base_image_dimensions;
        if !(positive(dims.width) && positive(dims.height)) {
            return Err(ImportError::InvalidField(format!(
                "baseImageDimensions must be positive, got {}x{}",
                dims.width, dims.height
            )));
        }
        let mut scene = Scene::new(Size::new(dims.width, dims.height));
        scene.set_base_image(BaseImage {
            reference: self.base_image.clone(),
            width: dims.width,
            height: dims.height,
        });
        for record in &self.sub_images {
            scene.add_image(record.to_image()?)?;
        }
        for record in &self.drawable_areas {
            scene.add_region(record.to_region()?)?;
        }
        Ok(scene)
    }

    /// Capture a scene as a document. `None` when the scene has no base image.
    #[must_use]
    pub fn from_scene(scene: &Scene) -> Option<Self> {
        let base = scene.base_image()?;
        Some(Self {
            base_image: base.reference.clone(),
            base_image_dimensions: Dimensions { width: base.width, height: base.height },
            sub_images: scene.images().into_iter().map(SubImageRecord::from_image).collect(),
            drawable_areas: scene.regions().into_iter().map(DrawableAreaRecord::from_region).collect(),
        })
    }

    /// Pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Propagates serializer failures.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl SubImageRecord {
    fn to_image(&self) -> Result<CanonicalImage, ImportError> {
        if !(positive(self.width) && positive(self.height)) {
            return Err(ImportError::InvalidField(format!("subImage {} has non-positive size", self.id)));
        }
        let mut image = CanonicalImage::new(self.id.clone(), self.url.clone(), self.width, self.height);
        image.x = self.x;
        image.y = self.y;
        image.z_index = self.z_index;
        image.rotation = self.rotation;
        image.pivot = pair(&self.id, "center", self.center_x, self.center_y)?;
        image.pen_tip_offset = pair(&self.id, "penTipOffset", self.pen_tip_offset_x, self.pen_tip_offset_y)?;
        Ok(image)
    }

    fn from_image(image: &CanonicalImage) -> Self {
        Self {
            id: image.id.clone(),
            url: image.url.clone(),
            x: image.x,
            y: image.y,
            width: image.width,
            height: image.height,
            z_index: image.z_index,
            center_x: image.pivot.map(|p| p.x),
            center_y: image.pivot.map(|p| p.y),
            pen_tip_offset_x: image.pen_tip_offset.map(|p| p.x),
            pen_tip_offset_y: image.pen_tip_offset.map(|p| p.y),
            rotation: image.rotation,
        }
    }
}

impl DrawableAreaRecord {
    fn to_region(&self) -> Result<DrawableRegion, ImportError> {
        if !(positive(self.width) && positive(self.height) && positive(self.scroll_width)) {
            return Err(ImportError::InvalidField(format!("drawableArea {} has non-positive size", self.id)));
        }
        Ok(DrawableRegion {
            id: self.id.clone(),
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
            scroll_width: self.scroll_width,
            z_index: self.z_index,
            color: self.color.clone(),
        })
    }

    fn from_region(region: &DrawableRegion) -> Self {
        Self {
            id: region.id.clone(),
            x: region.x,
            y: region.y,
            width: region.width,
            height: region.height,
            scroll_width: region.scroll_width,
            z_index: region.z_index,
            color: normalize_hex_color(&region.color),
        }
    }
}

fn positive(v: f64) -> bool {
    v.is_finite() && v > 0.0
}

fn pair(id: &str, what: &str, x: Option<f64>, y: Option<f64>) -> Result<Option<Point>, ImportError> {
    match (x, y) {
        (Some(x), Some(y)) => Ok(Some(Point::new(x, y))),
        (None, None) => Ok(None),
        _ => Err(ImportError::InvalidField(format!("subImage {id} has only one {what} coordinate"))),
    }
}
