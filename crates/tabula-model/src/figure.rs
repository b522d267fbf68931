use serde::{Deserialize, Serialize};

use crate::charts::ChartDefinition;

pub const CHART_TAG: &str = "chart";
pub const IMAGE_TAG: &str = "image";

/// A floating object anchored on a sheet. Geometry is in pixels.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Figure<T> {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub tag: String,
    pub data: T,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FigureSize {
    pub width: f64,
    pub height: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageData {
    /// Location of the image bytes (package path or URL).
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mimetype: Option<String>,
    pub size: FigureSize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FigureData {
    Chart(ChartDefinition),
    Image(ImageData),
}

impl Figure<FigureData> {
    pub fn chart(id: impl Into<String>, geometry: [f64; 4], chart: ChartDefinition) -> Self {
        let [x, y, width, height] = geometry;
        Self {
            id: id.into(),
            x,
            y,
            width,
            height,
            tag: CHART_TAG.to_string(),
            data: FigureData::Chart(chart),
        }
    }

    pub fn image(id: impl Into<String>, geometry: [f64; 4], image: ImageData) -> Self {
        let [x, y, width, height] = geometry;
        Self {
            id: id.into(),
            x,
            y,
            width,
            height,
            tag: IMAGE_TAG.to_string(),
            data: FigureData::Image(image),
        }
    }
}

/// Guess an image mimetype from a file extension.
pub fn mimetype_from_path(path: &str) -> Option<&'static str> {
    let ext = path.rsplit('.').next()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "bmp" => Some("image/bmp"),
        "svg" => Some("image/svg+xml"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

/// Inverse of [`mimetype_from_path`].
pub fn extension_from_mimetype(mimetype: &str) -> Option<&'static str> {
    match mimetype {
        "image/png" => Some("png"),
        "image/jpeg" => Some("jpeg"),
        "image/gif" => Some("gif"),
        "image/bmp" => Some("bmp"),
        "image/svg+xml" => Some("svg"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}
