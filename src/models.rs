//! Data models for the ethics analysis client.
//!
//! This module contains the wire types exchanged with the remote analysis
//! service and the shared domain types used throughout the application.
//! Payload fields the service may omit carry serde defaults so a sparse
//! response degrades instead of failing to decode.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// The kind of analysis run, one per assessment operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunKind {
    /// Predictive risk scoring (severity 0-10 plus derived signals).
    Predict,
    /// Adversarial red-team probing.
    Redteam,
    /// Multi-category bias/misinformation/deepfake audit.
    Audit,
    /// Ad-hoc file audit (model-less path).
    UploadAudit,
}

impl fmt::Display for RunKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunKind::Predict => write!(f, "predict"),
            RunKind::Redteam => write!(f, "redteam"),
            RunKind::Audit => write!(f, "audit"),
            RunKind::UploadAudit => write!(f, "upload audit"),
        }
    }
}

impl From<&str> for RunKind {
    fn from(s: &str) -> Self {
        // Run history rows use the service's historical type names.
        match s.to_lowercase().as_str() {
            "redteam" => RunKind::Redteam,
            "model_audit" | "audit" => RunKind::Audit,
            "upload_audit" => RunKind::UploadAudit,
            _ => RunKind::Predict,
        }
    }
}

/// A registered descriptive record about an ML system to be assessed.
///
/// Carries no weights or code. Immutable once created; there is no
/// update operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Model {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub dataset_summary: String,
    #[serde(default)]
    pub task: String,
    /// The service stores this as a comma-separated string; newer
    /// deployments return a JSON array. Accept both.
    #[serde(default, deserialize_with = "string_or_seq")]
    pub sensitive_features: Vec<String>,
}

/// Form fields for registering a new model.
#[derive(Debug, Clone, Default)]
pub struct ModelFields {
    pub name: String,
    pub description: String,
    pub dataset_summary: String,
    pub task: String,
    pub sensitive_features: Vec<String>,
}

/// One adversarial probe produced by a red-team run.
///
/// Kept in the order the service returned them, never re-sorted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttackSample {
    pub id: i64,
    #[serde(rename = "type")]
    pub attack_type: String,
    #[serde(default)]
    pub vulnerability_score: f64,
    #[serde(default)]
    pub attack_prompt: String,
}

/// Raw predictor output before severity normalization and heuristics.
///
/// `severity_score` stays an untyped JSON value: the service has been
/// observed returning numbers, strings and null here.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PredictResult {
    #[serde(default)]
    pub severity_score: Value,
    #[serde(default)]
    pub reasons: Vec<String>,
    #[serde(default)]
    pub mitigation: Vec<String>,
}

/// The combined analysis payload returned by audit and upload-audit runs.
///
/// `bias` and `misinformation` map category keys to loosely-shaped score
/// entries; `serde_json`'s preserve_order feature keeps them in arrival
/// order, which downstream charting relies on.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AnalysisPayload {
    #[serde(default)]
    pub bias: serde_json::Map<String, Value>,
    #[serde(default)]
    pub misinformation: serde_json::Map<String, Value>,
    #[serde(default)]
    pub deepfake: DeepfakeSection,
    #[serde(default)]
    pub model_suggestions: ModelSuggestions,
}

/// Deepfake/manipulation signals section of an analysis payload.
///
/// Scores stay untyped until normalization so a missing or malformed
/// field defaults rather than failing the whole payload.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DeepfakeSection {
    #[serde(default)]
    pub authenticity_score: Value,
    #[serde(default)]
    pub manipulation_type: String,
    #[serde(default)]
    pub face_integrity_score: Value,
    #[serde(default)]
    pub artifact_detection_score: Value,
    #[serde(default)]
    pub notes: Vec<String>,
}

/// Model-type recommendations attached to an analysis payload.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ModelSuggestions {
    #[serde(default)]
    pub recommended_models: Vec<RecommendedModel>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RecommendedModel {
    #[serde(default)]
    pub task: String,
    #[serde(default)]
    pub suggested_model_types: Vec<String>,
    #[serde(default)]
    pub reason: String,
}

/// A single flagged passage inside a bias/misinformation category entry.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ContentIssue {
    #[serde(default)]
    pub original: String,
    #[serde(default)]
    pub corrected: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub highlight_words: Vec<String>,
}

/// One row of the service-owned run history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub id: i64,
    #[serde(default)]
    pub model_id: i64,
    #[serde(default, deserialize_with = "run_kind_from_str")]
    pub run_type: Option<RunKind>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

fn run_kind_from_str<'de, D>(deserializer: D) -> Result<Option<RunKind>, D::Error>
where
    D: Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    Ok(s.as_deref().map(RunKind::from))
}

/// Accept either `["a", "b"]` or `"a, b"` for a list-of-strings field.
fn string_or_seq<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => s
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(String::from)
            .collect(),
        Value::Array(items) => items
            .into_iter()
            .filter_map(|v| v.as_str().map(String::from))
            .collect(),
        _ => Vec::new(),
    })
}
