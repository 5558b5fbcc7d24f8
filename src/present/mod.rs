//! Chart-ready projections of canonical risk records.
//!
//! Pure data shaping for downstream display; no domain logic lives
//! here. Series keep the record's insertion order and colors are purely
//! positional, so identical input always projects identically.

pub mod highlight;

pub use highlight::wrap_matches;

use crate::risk::{CanonicalRiskRecord, RiskCategory};
use serde::Serialize;

/// Fixed chart palette. Color assignment cycles by position.
pub const PALETTE: [&str; 8] = [
    "#6366f1", "#22c55e", "#f97316", "#ef4444", "#0ea5e9", "#a855f7", "#eab308", "#14b8a6",
];

/// One chart bar/slice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeriesPoint {
    pub label: String,
    pub value: u8,
    pub color: &'static str,
}

/// Color for a series position.
pub fn color_for(position: usize) -> &'static str {
    PALETTE[position % PALETTE.len()]
}

/// Project categories into labeled series points, one per category, in
/// the order given. Never sorted, never deduplicated.
pub fn to_series<'a, I>(categories: I) -> Vec<SeriesPoint>
where
    I: IntoIterator<Item = &'a RiskCategory>,
{
    categories
        .into_iter()
        .enumerate()
        .map(|(i, category)| SeriesPoint {
            label: category.label(),
            value: category.score,
            color: color_for(i),
        })
        .collect()
}

/// The predictor breakdown series: the three derived signals plus the
/// composite severity stretched onto the same 0-100 scale.
pub fn predict_series(record: &CanonicalRiskRecord) -> Vec<SeriesPoint> {
    let derived = record.derived.unwrap_or_default();
    let severity = record.composite_severity.unwrap_or(0);

    let points = [
        ("Bias Risk", derived.bias_risk),
        ("Sensitive Risk", derived.sensitive_risk),
        ("Misinformation", derived.misinfo_risk),
        ("Overall Severity", severity * 10),
    ];

    points
        .iter()
        .enumerate()
        .map(|(i, (label, value))| SeriesPoint {
            label: (*label).to_string(),
            value: *value,
            color: color_for(i),
        })
        .collect()
}
