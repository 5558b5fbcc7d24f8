//! Risk normalization and derived heuristic signals.

pub mod heuristics;
pub mod normalizer;

pub use heuristics::{bias_risk, misinfo_risk, normalize_severity, sensitive_risk, DerivedRisks};
pub use normalizer::{
    normalize, normalize_predict, pretty_label, CanonicalRiskRecord, DeepfakeDetail, RiskCategory,
    RiskSection,
};
