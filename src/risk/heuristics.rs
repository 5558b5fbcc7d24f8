//! Supplementary risk signals derived from model metadata.
//!
//! These are intentionally simple substring heuristics carried over from
//! the service's documented predictor behavior; they run client-side on
//! every predict run and never on audit runs.

use crate::models::Model;
use serde::Serialize;
use serde_json::Value;

/// Heuristic risk signals attached to a predict result, each 0-100.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DerivedRisks {
    pub bias_risk: u8,
    pub misinfo_risk: u8,
    pub sensitive_risk: u8,
}

impl DerivedRisks {
    /// Compute all three signals from a model's metadata.
    pub fn from_model(model: &Model) -> Self {
        Self {
            bias_risk: bias_risk(&model.dataset_summary),
            misinfo_risk: misinfo_risk(&model.task),
            sensitive_risk: sensitive_risk(&model.sensitive_features),
        }
    }
}

/// Clamp a raw severity value into the 0-10 integer scale.
///
/// Anything that is not a finite number (null, strings, NaN after
/// conversion) collapses to 0.
pub fn normalize_severity(raw: &Value) -> u8 {
    match raw.as_f64() {
        Some(v) if v.is_finite() => v.round().clamp(0.0, 10.0) as u8,
        _ => 0,
    }
}

/// 25 when the dataset summary hints at a small, skewed or regional
/// sample; 0 otherwise.
pub fn bias_risk(dataset_summary: &str) -> u8 {
    let ds = dataset_summary.to_lowercase();
    if ds.contains("small") || ds.contains("skew") || ds.contains("region") {
        25
    } else {
        0
    }
}

/// 30 for generative or text tasks, 0 otherwise.
pub fn misinfo_risk(task: &str) -> u8 {
    let task = task.to_lowercase();
    if task.contains("generate") || task.contains("text") {
        30
    } else {
        0
    }
}

/// 20 when any sensitive feature is declared, 0 otherwise.
pub fn sensitive_risk(sensitive_features: &[String]) -> u8 {
    if sensitive_features.is_empty() {
        0
    } else {
        20
    }
}
