//! Detection normalization
//!
//! Turns one raw engine detection into a [`NormalizedLine`]. Engines disagree
//! on the exact shape, so the raw value is matched against a small ordered
//! set of known layouts:
//!
//! 1. `[geometry, text_info, ...]`
//! 2. `[text_info]`
//!
//! and `text_info` itself is either `[text, confidence, ...]` or a bare string.

use serde_json::Value;

use super::geometry::extract_anchor;
use super::types::{NormalizedLine, Skip};

/// Confidence assigned when the engine reports text without a score
pub const DEFAULT_CONFIDENCE: f64 = 0.5;

const PREVIEW_CHARS: usize = 200;

/// Recognized layouts of a raw detection
enum DetectionShape<'a> {
    WithGeometry { geometry: &'a Value, text_info: &'a Value },
    TextOnly { text_info: &'a Value },
}

impl<'a> DetectionShape<'a> {
    fn parse(raw: &'a Value) -> Result<Self, Skip> {
        match raw.as_array().map(Vec::as_slice) {
            Some([geometry, text_info, ..]) => Ok(Self::WithGeometry { geometry, text_info }),
            Some([text_info]) => Ok(Self::TextOnly { text_info }),
            _ => Err(Skip::UnknownShape(preview(raw))),
        }
    }

    fn geometry(&self) -> Option<&'a Value> {
        match self {
            Self::WithGeometry { geometry, .. } => Some(*geometry),
            Self::TextOnly { .. } => None,
        }
    }

    fn text_info(&self) -> &'a Value {
        match self {
            Self::WithGeometry { text_info, .. } | Self::TextOnly { text_info } => *text_info,
        }
    }
}

/// Normalize one raw detection found on `page`.
///
/// Never panics: every shape anomaly comes back as a [`Skip`].
pub fn normalize(raw: &Value, page: usize) -> Result<NormalizedLine, Skip> {
    let shape = DetectionShape::parse(raw)?;
    let (text, confidence) = parse_text_info(shape.text_info())?;

    if text.is_empty() {
        return Err(Skip::EmptyText);
    }

    Ok(NormalizedLine {
        text,
        confidence,
        anchor: extract_anchor(shape.geometry()),
        page,
    })
}

fn parse_text_info(text_info: &Value) -> Result<(String, f64), Skip> {
    match text_info {
        Value::Array(items) if items.len() >= 2 => {
            let text = stringify(&items[0]);
            let confidence = parse_confidence(&items[1])
                .ok_or_else(|| Skip::InvalidConfidence(preview(&items[1])))?;
            Ok((text.trim().to_string(), confidence))
        }
        Value::String(text) => Ok((text.trim().to_string(), DEFAULT_CONFIDENCE)),
        _ => Err(Skip::UnknownTextInfo(preview(text_info))),
    }
}

/// Strings verbatim, anything else in its JSON text form
fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Finite confidence from a number, numeric string or boolean
fn parse_confidence(value: &Value) -> Option<f64> {
    let confidence = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }?;

    confidence.is_finite().then_some(confidence)
}

/// Compact, length-limited rendering of a raw value for log messages
pub(crate) fn preview(value: &Value) -> String {
    let rendered = value.to_string();
    match rendered.char_indices().nth(PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}...", &rendered[..cut]),
        None => rendered,
    }
}
