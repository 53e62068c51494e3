//! Ordered decision list separating vehicles from other blobs.
//!
//! Rules are evaluated top to bottom and the first match decides the label.
//! Order matters: the tree and crown rules overlap, and a tall crown-like
//! blob is always reported as a tree.

use crate::models::{Classification, Component};
use crate::params::{DetectionParams, MAX_HEIGHT, MIN_HEIGHT};

/// Height-to-width ratio above which a blob is a tree trunk/shadow
pub const TREE_HEIGHT_TO_WIDTH: f64 = 4.0;
/// Aspect range of roughly round tree crowns
pub const CROWN_ASPECT: (f64, f64) = (0.7, 1.4);
pub const CROWN_MIN_AREA: u32 = 25000;
pub const CROWN_MIN_COMPACTNESS: f64 = 0.7;
pub const SCATTERED_COMPACTNESS: f64 = 0.05;
pub const LINEAR_ASPECT: f64 = 10.0;

/// A rejection rule: the label it assigns and when it fires
pub struct Rule {
    pub label: Classification,
    pub matches: fn(&Component, &DetectionParams) -> bool,
}

/// Rejection rules in evaluation order. A component matching none is a vehicle.
pub const RULES: [Rule; 11] = [
    Rule {
        label: Classification::Small,
        matches: |c, p| c.area < p.min_area,
    },
    Rule {
        label: Classification::Large,
        matches: |c, p| c.area > p.max_area,
    },
    Rule {
        label: Classification::InvalidWidth,
        matches: |c, p| c.width() < p.min_width || c.width() > p.max_width,
    },
    Rule {
        label: Classification::InvalidHeight,
        matches: |c, _| c.height() < MIN_HEIGHT || c.height() > MAX_HEIGHT,
    },
    Rule {
        label: Classification::TooTall,
        matches: |c, p| c.aspect_ratio() < p.min_aspect,
    },
    Rule {
        label: Classification::TooWide,
        matches: |c, p| c.aspect_ratio() > p.max_aspect,
    },
    Rule {
        label: Classification::Tree,
        matches: |c, _| c.height_to_width_ratio() > TREE_HEIGHT_TO_WIDTH,
    },
    Rule {
        label: Classification::Crown,
        matches: |c, _| {
            let aspect = c.aspect_ratio();
            aspect >= CROWN_ASPECT.0
                && aspect <= CROWN_ASPECT.1
                && c.area > CROWN_MIN_AREA
                && c.compactness() > CROWN_MIN_COMPACTNESS
        },
    },
    Rule {
        label: Classification::Irregular,
        matches: |c, p| c.extent() < p.extent_threshold,
    },
    Rule {
        label: Classification::Scattered,
        matches: |c, _| c.compactness() < SCATTERED_COMPACTNESS,
    },
    Rule {
        label: Classification::Linear,
        matches: |c, _| c.aspect_ratio() > LINEAR_ASPECT,
    },
];

/// Label one component
pub fn classify(component: &Component, params: &DetectionParams) -> Classification {
    RULES
        .iter()
        .find(|rule| (rule.matches)(component, params))
        .map(|rule| rule.label)
        .unwrap_or(Classification::Vehicle)
}

/// Label every component, preserving order
pub fn classify_all(components: &[Component], params: &DetectionParams) -> Vec<Classification> {
    components.iter().map(|c| classify(c, params)).collect()
}

/// Number of components labelled as vehicles
pub fn count_vehicles(classifications: &[Classification]) -> usize {
    classifications.iter().filter(|c| c.is_vehicle()).count()
}
