//! Normalization of raw analysis payloads into the canonical risk record.
//!
//! The service's audit payloads vary in shape between deployments; every
//! expected-but-missing field defaults here instead of raising, so a
//! partial payload still produces a fully displayable record.

use crate::models::{AnalysisPayload, ContentIssue, Model, PredictResult, RecommendedModel};
use crate::risk::heuristics::{normalize_severity, DerivedRisks};
use serde::Serialize;
use serde_json::Value;

/// Which analysis section a category came from. Downstream charting
/// groups by this; the normalizer itself treats all sections alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskSection {
    Bias,
    Misinformation,
    Deepfake,
}

/// One normalized category entry. `key` is the lookup key exactly as the
/// service sent it; the display label is derived on demand and never
/// stored back.
#[derive(Debug, Clone, Serialize)]
pub struct RiskCategory {
    pub key: String,
    pub section: RiskSection,
    /// Always within 0-100.
    pub score: u8,
    pub issues: Vec<ContentIssue>,
}

impl RiskCategory {
    /// Human-readable label for charts and reports.
    pub fn label(&self) -> String {
        pretty_label(&self.key)
    }
}

/// Deepfake fields that stay textual after the scores are flattened
/// into synthetic categories.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DeepfakeDetail {
    pub manipulation_type: String,
    pub notes: Vec<String>,
}

/// The canonical, chart-ready representation produced from any raw
/// analysis payload.
///
/// Audit and upload-audit runs fill `categories` (bias entries, then
/// misinformation, then the three synthetic deepfake entries, in arrival
/// order). Predict runs fill `composite_severity`, `derived`, `reasons`
/// and `mitigation` instead.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CanonicalRiskRecord {
    pub categories: Vec<RiskCategory>,
    /// Composite predictive severity, 0-10. Predict runs only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub composite_severity: Option<u8>,
    /// Heuristic risk signals. Predict runs only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub derived: Option<DerivedRisks>,
    pub reasons: Vec<String>,
    pub mitigation: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deepfake: Option<DeepfakeDetail>,
    pub suggestions: Vec<RecommendedModel>,
}

impl CanonicalRiskRecord {
    pub fn section(&self, section: RiskSection) -> impl Iterator<Item = &RiskCategory> {
        self.categories.iter().filter(move |c| c.section == section)
    }
}

/// Synthetic category keys the deepfake scores flatten into.
const DEEPFAKE_KEYS: [&str; 3] = ["authenticity", "face_integrity", "artifacts"];

/// Normalize a combined audit payload into the canonical record.
pub fn normalize(payload: &AnalysisPayload) -> CanonicalRiskRecord {
    let mut categories = Vec::new();

    for (key, entry) in &payload.bias {
        categories.push(category_entry(key, entry, RiskSection::Bias));
    }
    for (key, entry) in &payload.misinformation {
        categories.push(category_entry(key, entry, RiskSection::Misinformation));
    }

    let df = &payload.deepfake;
    let df_scores = [
        &df.authenticity_score,
        &df.face_integrity_score,
        &df.artifact_detection_score,
    ];
    for (key, raw) in DEEPFAKE_KEYS.iter().zip(df_scores) {
        categories.push(RiskCategory {
            key: (*key).to_string(),
            section: RiskSection::Deepfake,
            score: score_0_100(raw),
            issues: Vec::new(),
        });
    }

    CanonicalRiskRecord {
        categories,
        composite_severity: None,
        derived: None,
        reasons: Vec::new(),
        mitigation: Vec::new(),
        deepfake: Some(DeepfakeDetail {
            manipulation_type: df.manipulation_type.clone(),
            notes: df.notes.clone(),
        }),
        suggestions: payload.model_suggestions.recommended_models.clone(),
    }
}

/// Normalize a raw predictor result, attaching the metadata heuristics.
pub fn normalize_predict(model: &Model, raw: &PredictResult) -> CanonicalRiskRecord {
    CanonicalRiskRecord {
        categories: Vec::new(),
        composite_severity: Some(normalize_severity(&raw.severity_score)),
        derived: Some(DerivedRisks::from_model(model)),
        reasons: raw.reasons.clone(),
        mitigation: raw.mitigation.clone(),
        deepfake: None,
        suggestions: Vec::new(),
    }
}

/// Format a category key for display: underscores become spaces and the
/// first letter of each word is uppercased. The stored key is untouched.
pub fn pretty_label(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut at_word_start = true;
    for c in key.chars() {
        let c = if c == '_' { ' ' } else { c };
        if at_word_start && c != ' ' {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        at_word_start = c == ' ';
    }
    out
}

fn category_entry(key: &str, entry: &Value, section: RiskSection) -> RiskCategory {
    let score = entry.get("score").map(score_0_100).unwrap_or(0);
    let issues = entry
        .get("issues")
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|v| serde_json::from_value(v.clone()).ok())
                .collect()
        })
        .unwrap_or_default();

    RiskCategory {
        key: key.to_string(),
        section,
        score,
        issues,
    }
}

/// Category scores live on a 0-100 scale; anything non-numeric is 0.
fn score_0_100(raw: &Value) -> u8 {
    match raw.as_f64() {
        Some(v) if v.is_finite() => v.round().clamp(0.0, 100.0) as u8,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload_from(json: Value) -> AnalysisPayload {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_normalize_keeps_section_and_arrival_order() {
        let payload = payload_from(json!({
            "bias": {
                "stereotyping": {"score": 62, "issues": []},
                "exclusion": {"score": 12, "issues": []}
            },
            "misinformation": {
                "factual_claims": {"score": 40, "issues": []}
            },
            "deepfake": {
                "authenticity_score": 90,
                "manipulation_type": "none",
                "face_integrity_score": 85,
                "artifact_detection_score": 5,
                "notes": ["no faces detected"]
            }
        }));

        let record = normalize(&payload);
        let keys: Vec<&str> = record.categories.iter().map(|c| c.key.as_str()).collect();
        assert_eq!(
            keys,
            vec![
                "stereotyping",
                "exclusion",
                "factual_claims",
                "authenticity",
                "face_integrity",
                "artifacts"
            ]
        );
        assert_eq!(record.section(RiskSection::Bias).count(), 2);
        assert_eq!(record.section(RiskSection::Deepfake).count(), 3);

        let detail = record.deepfake.unwrap();
        assert_eq!(detail.manipulation_type, "none");
        assert_eq!(detail.notes, vec!["no faces detected"]);
    }

    #[test]
    fn test_missing_score_defaults_to_zero() {
        let payload = payload_from(json!({
            "bias": {
                "stereotyping": {"issues": [{"original": "text"}]},
                "framing": {"score": "high"}
            }
        }));

        let record = normalize(&payload);
        assert_eq!(record.categories[0].score, 0);
        assert_eq!(record.categories[0].issues.len(), 1);
        assert_eq!(record.categories[1].score, 0);
        assert!(record.categories[1].issues.is_empty());
    }

    #[test]
    fn test_missing_deepfake_section_yields_zero_synthetics() {
        let record = normalize(&payload_from(json!({})));
        let scores: Vec<u8> = record
            .section(RiskSection::Deepfake)
            .map(|c| c.score)
            .collect();
        assert_eq!(scores, vec![0, 0, 0]);
    }

    #[test]
    fn test_category_scores_clamped() {
        let payload = payload_from(json!({
            "bias": {"overrun": {"score": 240.7}, "negative": {"score": -3}}
        }));
        let record = normalize(&payload);
        assert_eq!(record.categories[0].score, 100);
        assert_eq!(record.categories[1].score, 0);
    }

    #[test]
    fn test_pretty_label() {
        assert_eq!(pretty_label("face_integrity"), "Face Integrity");
        assert_eq!(pretty_label("stereotyping"), "Stereotyping");
        assert_eq!(pretty_label("factual_claims_v2"), "Factual Claims V2");
        assert_eq!(pretty_label(""), "");
    }

    #[test]
    fn test_label_does_not_touch_key() {
        let payload = payload_from(json!({"bias": {"face_integrity": {"score": 1}}}));
        let record = normalize(&payload);
        assert_eq!(record.categories[0].key, "face_integrity");
        assert_eq!(record.categories[0].label(), "Face Integrity");
    }

    #[test]
    fn test_normalize_predict_end_to_end() {
        let model = Model {
            id: 7,
            name: "gen".to_string(),
            description: String::new(),
            dataset_summary: "small regional sample".to_string(),
            task: "text-generation".to_string(),
            sensitive_features: vec!["gender".to_string()],
        };
        let raw: PredictResult =
            serde_json::from_value(json!({"severity_score": 4.6, "reasons": ["r1"]})).unwrap();

        let record = normalize_predict(&model, &raw);
        assert_eq!(record.composite_severity, Some(5));
        let derived = record.derived.unwrap();
        assert_eq!(derived.bias_risk, 25);
        assert_eq!(derived.misinfo_risk, 30);
        assert_eq!(derived.sensitive_risk, 20);
        assert_eq!(record.reasons, vec!["r1"]);
        assert!(record.mitigation.is_empty());
    }
}
