use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

/// One object reported by the vision service.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectedObject {
    /// Object label ("cup", "person", ...).
    pub name: String,
    /// Confidence in [0, 1].
    pub score: f64,
    pub bounding_poly: BoundingPoly,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingPoly {
    pub normalized_vertices: Vec<NormalizedVertex>,
}

/// Corner as a fraction of image width/height.
///
/// The vision API omits zero-valued coordinates, so a missing `x` or `y`
/// decodes as 0.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedVertex {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
}

/// Axis-aligned bounds of a polygon, in normalized coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn area(&self) -> f64 {
        self.width().max(0.0) * self.height().max(0.0)
    }

    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    /// Overlapping area with another rectangle (0 when disjoint).
    pub fn intersection_area(&self, other: &Bounds) -> f64 {
        let w = self.max_x.min(other.max_x) - self.min_x.max(other.min_x);
        let h = self.max_y.min(other.max_y) - self.min_y.max(other.min_y);
        if w <= 0.0 || h <= 0.0 {
            0.0
        } else {
            w * h
        }
    }
}

impl BoundingPoly {
    /// Bounding rectangle of the vertices, `None` for an empty polygon.
    pub fn bounds(&self) -> Option<Bounds> {
        let first = self.normalized_vertices.first()?;
        let init = Bounds {
            min_x: first.x,
            min_y: first.y,
            max_x: first.x,
            max_y: first.y,
        };
        Some(
            self.normalized_vertices
                .iter()
                .skip(1)
                .fold(init, |b, v| Bounds {
                    min_x: b.min_x.min(v.x),
                    min_y: b.min_y.min(v.y),
                    max_x: b.max_x.max(v.x),
                    max_y: b.max_y.max(v.y),
                }),
        )
    }
}

impl DetectedObject {
    /// Confidence as a whole percentage, rounded half away from zero.
    pub fn confidence_percent(&self) -> i64 {
        (self.score * 100.0).round() as i64
    }

    fn validate(&self, index: usize) -> Result<()> {
        if !(0.0..=1.0).contains(&self.score) {
            return Err(anyhow!(
                "object {} ({}) has score {} outside [0, 1]",
                index,
                self.name,
                self.score
            ));
        }
        for vertex in &self.bounding_poly.normalized_vertices {
            if !vertex.x.is_finite() || !vertex.y.is_finite() {
                return Err(anyhow!(
                    "object {} ({}) has a non-finite vertex",
                    index,
                    self.name
                ));
            }
        }
        Ok(())
    }
}

/// Decode a detection response body. Either every object is valid or the
/// whole batch is rejected.
pub fn decode_detections(body: &[u8]) -> Result<Vec<DetectedObject>> {
    let objects: Vec<DetectedObject> =
        serde_json::from_slice(body).context("decode detection response")?;
    for (index, object) in objects.iter().enumerate() {
        object.validate(index)?;
    }
    Ok(objects)
}
