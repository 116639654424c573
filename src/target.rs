//! Parent-side convergence rule.
//!
//! Decides when a detected object is "close enough and centered": its box
//! center lies inside the target region and the box covers at least
//! `min_coverage` of that region. The matches form the list the capture
//! session observes to stop its loop.

use anyhow::{anyhow, Result};

use crate::detect::{Bounds, DetectedObject};

pub const DEFAULT_MIN_COVERAGE: f64 = 0.75;

/// Normalized rectangle the target is expected to fill.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TargetRegion {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Default for TargetRegion {
    fn default() -> Self {
        Self {
            min_x: 0.2,
            min_y: 0.2,
            max_x: 0.8,
            max_y: 0.8,
        }
    }
}

impl TargetRegion {
    pub fn validate(&self) -> Result<()> {
        let in_unit = |v: f64| (0.0..=1.0).contains(&v);
        if ![self.min_x, self.min_y, self.max_x, self.max_y]
            .into_iter()
            .all(in_unit)
        {
            return Err(anyhow!("target region must lie within [0, 1]"));
        }
        if self.min_x >= self.max_x || self.min_y >= self.max_y {
            return Err(anyhow!("target region must have positive width and height"));
        }
        Ok(())
    }

    fn bounds(&self) -> Bounds {
        Bounds {
            min_x: self.min_x,
            min_y: self.min_y,
            max_x: self.max_x,
            max_y: self.max_y,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TargetMatcher {
    label: Option<String>,
    region: TargetRegion,
    min_coverage: f64,
}

impl Default for TargetMatcher {
    fn default() -> Self {
        Self {
            label: None,
            region: TargetRegion::default(),
            min_coverage: DEFAULT_MIN_COVERAGE,
        }
    }
}

impl TargetMatcher {
    pub fn new(label: Option<String>, region: TargetRegion, min_coverage: f64) -> Result<Self> {
        region.validate()?;
        if !(min_coverage > 0.0 && min_coverage <= 1.0) {
            return Err(anyhow!("min_coverage must be in (0, 1], got {}", min_coverage));
        }
        Ok(Self {
            label: label.filter(|l| !l.trim().is_empty()),
            region,
            min_coverage,
        })
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Fraction of the target region covered by the object's box.
    pub fn coverage(&self, object: &DetectedObject) -> f64 {
        let region = self.region.bounds();
        match object.bounding_poly.bounds() {
            Some(bounds) => bounds.intersection_area(&region) / region.area(),
            None => 0.0,
        }
    }

    pub fn is_match(&self, object: &DetectedObject) -> bool {
        if let Some(label) = &self.label {
            if !object.name.eq_ignore_ascii_case(label) {
                return false;
            }
        }
        let Some(bounds) = object.bounding_poly.bounds() else {
            return false;
        };
        let (cx, cy) = bounds.center();
        self.region.bounds().contains(cx, cy) && self.coverage(object) >= self.min_coverage
    }

    /// Objects from a batch that satisfy the rule.
    pub fn matches(&self, objects: &[DetectedObject]) -> Vec<DetectedObject> {
        objects
            .iter()
            .filter(|object| self.is_match(object))
            .cloned()
            .collect()
    }
}
