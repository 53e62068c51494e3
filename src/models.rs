use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;

/// Bounding box in image coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// A maximal 8-connected region of foreground pixels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    /// 1..N, 0 is the background
    pub label: u32,
    pub bbox: BoundingBox,
    pub area: u32,
    pub centroid: (f64, f64),
}

impl Component {
    pub fn new(label: u32, bbox: BoundingBox, area: u32, centroid: (f64, f64)) -> Self {
        Self {
            label,
            bbox,
            area,
            centroid,
        }
    }

    pub fn width(&self) -> u32 {
        self.bbox.width
    }

    pub fn height(&self) -> u32 {
        self.bbox.height
    }

    pub fn aspect_ratio(&self) -> f64 {
        if self.bbox.height == 0 {
            return 0.0;
        }
        self.bbox.width as f64 / self.bbox.height as f64
    }

    /// Fraction of the bounding box covered by the component
    pub fn extent(&self) -> f64 {
        let box_area = self.bbox.width as f64 * self.bbox.height as f64;
        if box_area == 0.0 {
            return 0.0;
        }
        self.area as f64 / box_area
    }

    pub fn height_to_width_ratio(&self) -> f64 {
        if self.bbox.width == 0 {
            return 0.0;
        }
        self.bbox.height as f64 / self.bbox.width as f64
    }

    pub fn perimeter(&self) -> f64 {
        // Approximate perimeter from bounding box
        2.0 * (self.bbox.width as f64 + self.bbox.height as f64)
    }

    /// Compactness = 4π × area / perimeter²
    pub fn compactness(&self) -> f64 {
        let perimeter = self.perimeter();
        if perimeter == 0.0 {
            return 0.0;
        }
        (4.0 * PI * self.area as f64) / (perimeter * perimeter)
    }

    /// Centroid rounded down to pixel coordinates
    pub fn center(&self) -> (u32, u32) {
        (self.centroid.0 as u32, self.centroid.1 as u32)
    }
}

/// Label assigned to a component by the classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Classification {
    Vehicle,
    Small,
    Large,
    InvalidWidth,
    InvalidHeight,
    TooTall,
    TooWide,
    Tree,
    Crown,
    Irregular,
    Scattered,
    Linear,
}

impl Classification {
    pub fn is_vehicle(self) -> bool {
        self == Classification::Vehicle
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Classification::Vehicle => "VEHICLE",
            Classification::Small => "SMALL",
            Classification::Large => "LARGE",
            Classification::InvalidWidth => "INVALID_WIDTH",
            Classification::InvalidHeight => "INVALID_HEIGHT",
            Classification::TooTall => "TOO_TALL",
            Classification::TooWide => "TOO_WIDE",
            Classification::Tree => "TREE",
            Classification::Crown => "CROWN",
            Classification::Irregular => "IRREGULAR",
            Classification::Scattered => "SCATTERED",
            Classification::Linear => "LINEAR",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
