//! Reading-order reconstruction
//!
//! Collects the accepted detections of every page into one flat list and
//! sorts them top-to-bottom, then left-to-right.

use serde_json::Value;

use super::detection::{normalize, preview};
use super::types::{NormalizedLine, ReadingOrder, Skip};

/// Normalize every detection of every page, in accumulation order.
///
/// Pages and detections that cannot be read are logged and skipped.
pub fn collect_lines(pages: &Value) -> Vec<NormalizedLine> {
    let pages = match pages {
        Value::Null => return Vec::new(),
        Value::Array(pages) => pages,
        other => {
            tracing::warn!("Unexpected OCR result format: {}", preview(other));
            return Vec::new();
        }
    };

    let mut lines = Vec::new();

    for (page_idx, page) in pages.iter().enumerate() {
        let detections = match page.as_array() {
            Some(detections) if !detections.is_empty() => detections,
            _ => {
                tracing::warn!(page = page_idx + 1, "Page has no detections");
                continue;
            }
        };

        tracing::debug!(
            page = page_idx + 1,
            detections = detections.len(),
            "Processing page"
        );

        for (det_idx, detection) in detections.iter().enumerate() {
            if is_blank(detection) {
                continue;
            }

            match normalize(detection, page_idx) {
                Ok(line) => {
                    if lines.len() < 5 {
                        tracing::debug!(
                            "Extracted text #{}: '{}' (confidence: {:.2})",
                            lines.len() + 1,
                            line.text,
                            line.confidence
                        );
                    }
                    lines.push(line);
                }
                Err(Skip::EmptyText) => {
                    tracing::debug!(page = page_idx + 1, detection = det_idx, "Skipping empty text");
                }
                Err(skip) => {
                    tracing::warn!(
                        page = page_idx + 1,
                        detection = det_idx,
                        "Skipping detection: {}",
                        skip
                    );
                }
            }
        }
    }

    lines
}

/// Stable sort of `lines` into reading order.
pub fn sort_lines(lines: &mut [NormalizedLine], order: ReadingOrder) {
    match order {
        ReadingOrder::Global => lines.sort_by(|a, b| {
            a.anchor
                .y
                .total_cmp(&b.anchor.y)
                .then(a.anchor.x.total_cmp(&b.anchor.x))
        }),
        ReadingOrder::PerPage => lines.sort_by(|a, b| {
            a.page
                .cmp(&b.page)
                .then(a.anchor.y.total_cmp(&b.anchor.y))
                .then(a.anchor.x.total_cmp(&b.anchor.x))
        }),
    }
}

/// Texts of all accepted detections, in reading order.
pub fn aggregate(pages: &Value, order: ReadingOrder) -> Vec<String> {
    let mut lines = collect_lines(pages);
    sort_lines(&mut lines, order);
    lines.into_iter().map(|line| line.text).collect()
}

/// `null` and empty arrays are placeholders rather than detections
fn is_blank(detection: &Value) -> bool {
    match detection {
        Value::Null => true,
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}
