//! Detection geometry
//!
//! Engines report each text region as a quadrilateral, axis-aligned or
//! rotated. The minimum corner over all points approximates the top-left
//! origin regardless of rotation.

use serde_json::Value;

use super::types::Anchor;

/// Derive the `(y, x)` anchor of a detection polygon.
///
/// Only points that are arrays whose first two elements are numbers count.
/// Absent geometry, or geometry without a single valid point, anchors at
/// `(0, 0)`.
pub fn extract_anchor(geometry: Option<&Value>) -> Anchor {
    let Some(points) = geometry.and_then(Value::as_array) else {
        return Anchor::default();
    };

    let mut min: Option<Anchor> = None;
    for (x, y) in points.iter().filter_map(point) {
        min = Some(match min {
            Some(m) => Anchor::new(m.y.min(y), m.x.min(x)),
            None => Anchor::new(y, x),
        });
    }

    min.unwrap_or_default()
}

fn point(value: &Value) -> Option<(f64, f64)> {
    match value.as_array()?.as_slice() {
        [x, y, ..] => Some((x.as_f64()?, y.as_f64()?)),
        _ => None,
    }
}
