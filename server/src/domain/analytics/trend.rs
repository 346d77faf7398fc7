//! Trend classification
//!
//! The system-wide convention for labeling a series: compare the average
//! of the recent half against the average of the older half; a change
//! beyond the ±10% band flips the label. Analytics, aggregation, and the
//! cost optimizer all use this one function so the labels agree.

use crate::core::constants::TREND_BAND;
use crate::data::types::TrendDirection;

/// Classify a chronologically-ordered series with the default band
pub fn classify_trend(series: &[f64]) -> TrendDirection {
    classify_trend_with_band(series, TREND_BAND)
}

/// Classify with an explicit band (configuration override)
pub fn classify_trend_with_band(series: &[f64], band: f64) -> TrendDirection {
    if series.len() < 2 {
        return TrendDirection::Stable;
    }

    let mid = series.len() / 2;
    let older = &series[..mid];
    let recent = &series[mid..];

    let older_avg = older.iter().sum::<f64>() / older.len() as f64;
    let recent_avg = recent.iter().sum::<f64>() / recent.len() as f64;

    if recent_avg > older_avg * (1.0 + band) {
        TrendDirection::Increasing
    } else if recent_avg < older_avg * (1.0 - band) {
        TrendDirection::Decreasing
    } else {
        TrendDirection::Stable
    }
}
