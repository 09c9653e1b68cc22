//! Numeric helpers shared by the category extractors

use lead_intel_core::ExtractionError;

/// `numerator / max(denominator, 1)`, clamped to [0, 1]
#[inline]
pub fn ratio(numerator: u32, denominator: u32) -> f64 {
    (numerator as f64 / denominator.max(1) as f64).clamp(0.0, 1.0)
}

/// `value / saturation`, clamped to [0, 1]
#[inline]
pub fn saturate(value: f64, saturation: f64) -> f64 {
    if saturation <= 0.0 || !value.is_finite() {
        return 0.0;
    }
    (value / saturation).clamp(0.0, 1.0)
}

/// Least-squares slope of `values` against their index
pub fn least_squares_slope(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 2 {
        return None;
    }
    let n_f = n as f64;
    let mean_x = (n_f - 1.0) / 2.0;
    let mean_y = values.iter().sum::<f64>() / n_f;

    let mut num = 0.0;
    let mut den = 0.0;
    for (i, y) in values.iter().enumerate() {
        let dx = i as f64 - mean_x;
        num += dx * (y - mean_y);
        den += dx * dx;
    }
    if den == 0.0 {
        None
    } else {
        Some(num / den)
    }
}

/// Reject NaN and infinities for a named input
pub fn finite(field: &str, value: f64) -> Result<f64, ExtractionError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ExtractionError::NonFinite {
            field: field.to_string(),
        })
    }
}

/// Normalize a free-form status string into a table key
pub fn table_key(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == ' ' || c == '-' || c == '.' { '_' } else { c })
        .collect()
}
