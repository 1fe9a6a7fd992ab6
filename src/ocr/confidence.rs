//! Aggregate confidence score

use super::types::NormalizedLine;

/// Mean line confidence as a percentage, rounded to 2 decimals.
///
/// Returns `0.0` for no lines. Values are not clamped, so an engine reporting
/// confidences above 1 yields a score above 100.
pub fn aggregate_confidence(lines: &[NormalizedLine]) -> f64 {
    if lines.is_empty() {
        return 0.0;
    }

    let sum: f64 = lines.iter().map(|line| line.confidence).sum();
    round2(sum / lines.len() as f64 * 100.0)
}

/// Two decimals, exact halves to even
fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}
