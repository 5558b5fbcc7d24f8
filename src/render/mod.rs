//! Text rendering of analysis outcomes.
//!
//! Markdown-flavored output for the terminal or for saving next to a
//! report. Strictly a consumer of the canonical records and the
//! presentation projections.

use crate::models::{AttackSample, Model, RunRecord};
use crate::present::{predict_series, to_series, wrap_matches, SeriesPoint};
use crate::risk::{CanonicalRiskRecord, RiskSection};
use crate::upload::UploadOutcome;

/// Render a predictor outcome: breakdown series, severity gauge,
/// reasons and mitigation.
pub fn render_predict(model: &Model, record: &CanonicalRiskRecord) -> String {
    let mut out = String::new();

    out.push_str(&format!("# Predictor — {}\n\n", model.name));

    let severity = record.composite_severity.unwrap_or(0);
    out.push_str(&format!(
        "**Severity:** {}/10 ({})\n\n",
        severity,
        severity_band(severity)
    ));

    out.push_str("## Risk Breakdown\n\n");
    out.push_str(&render_series(&predict_series(record)));

    out.push_str("\n## Reasons\n\n");
    if record.reasons.is_empty() {
        out.push_str("_None reported._\n");
    }
    for reason in &record.reasons {
        out.push_str(&format!("- {}\n", reason));
    }

    out.push_str("\n## Mitigation\n\n");
    if record.mitigation.is_empty() {
        out.push_str("_None reported._\n");
    }
    for step in &record.mitigation {
        out.push_str(&format!("- {}\n", step));
    }

    out
}

/// Render a red-team outcome in service order.
pub fn render_attacks(attacks: &[AttackSample]) -> String {
    let mut out = String::new();
    out.push_str("# Red-Team Attacks\n\n");

    if attacks.is_empty() {
        out.push_str("_No attacks returned._\n");
        return out;
    }

    for attack in attacks {
        out.push_str(&format!(
            "## {} — vulnerability {:.2}\n\n",
            attack.attack_type, attack.vulnerability_score
        ));
        out.push_str(&format!("> {}\n\n", attack.attack_prompt));
    }
    out
}

/// Render an audit record: per-section score charts, flagged passages
/// with highlighted trigger words, deepfake signals and suggestions.
pub fn render_audit(record: &CanonicalRiskRecord) -> String {
    let mut out = String::new();

    out.push_str("## Bias Scores\n\n");
    out.push_str(&render_series(&to_series(record.section(RiskSection::Bias))));
    out.push_str(&render_issue_details(record, RiskSection::Bias));

    out.push_str("\n## Misinformation Scores\n\n");
    out.push_str(&render_series(&to_series(
        record.section(RiskSection::Misinformation),
    )));
    out.push_str(&render_issue_details(record, RiskSection::Misinformation));

    out.push_str("\n## Deepfake / Manipulation Signals\n\n");
    out.push_str(&render_series(&to_series(
        record.section(RiskSection::Deepfake),
    )));
    if let Some(detail) = &record.deepfake {
        if !detail.manipulation_type.is_empty() {
            out.push_str(&format!(
                "\nManipulation type: {}\n",
                detail.manipulation_type
            ));
        }
        for note in &detail.notes {
            out.push_str(&format!("- {}\n", note));
        }
    }

    if !record.suggestions.is_empty() {
        out.push_str("\n## Suggested Model Types\n\n");
        for suggestion in &record.suggestions {
            out.push_str(&format!("### {}\n\n", suggestion.task));
            out.push_str(&format!(
                "Models: {}\n\n",
                suggestion.suggested_model_types.join(", ")
            ));
            out.push_str(&format!("{}\n\n", suggestion.reason));
        }
    }

    out
}

/// Render an ad-hoc upload audit outcome.
pub fn render_upload(outcome: &UploadOutcome) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "# Upload Audit — {} ({})\n\n",
        outcome.file_name,
        outcome.media_type.to_uppercase()
    ));
    out.push_str(&render_audit(&outcome.record));
    out
}

/// Render the service-owned run history.
pub fn render_runs(runs: &[RunRecord]) -> String {
    let mut out = String::new();
    out.push_str("# Run History\n\n");

    if runs.is_empty() {
        out.push_str("_No runs yet. Run predict, redteam or audit first._\n");
        return out;
    }

    out.push_str("| Run | Model | Type | Created |\n|---|---|---|---|\n");
    for run in runs {
        let kind = run
            .run_type
            .map(|k| k.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        let created = run
            .created_at
            .map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
            .unwrap_or_default();
        out.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            run.id, run.model_id, kind, created
        ));
    }
    out
}

/// Horizontal text bars, one per series point, in series order.
fn render_series(series: &[SeriesPoint]) -> String {
    let mut out = String::new();
    if series.is_empty() {
        out.push_str("_No data._\n");
        return out;
    }

    // Pad by character count; byte length misaligns non-ASCII labels.
    let width = series
        .iter()
        .map(|p| p.label.chars().count())
        .max()
        .unwrap_or(0);
    for point in series {
        let filled = (point.value as usize) / 4;
        out.push_str(&format!(
            "{:<width$}  {:3}  {}\n",
            point.label,
            point.value,
            "█".repeat(filled),
            width = width
        ));
    }
    out
}

fn render_issue_details(record: &CanonicalRiskRecord, section: RiskSection) -> String {
    let mut out = String::new();
    for category in record.section(section) {
        for issue in &category.issues {
            out.push_str(&format!(
                "\n- **{}** — {}\n",
                category.label(),
                wrap_matches(&issue.original, &issue.highlight_words)
            ));
            if !issue.reason.is_empty() {
                out.push_str(&format!("  - Reason: {}\n", issue.reason));
            }
            if !issue.corrected.is_empty() {
                out.push_str(&format!("  - Corrected: {}\n", issue.corrected));
            }
        }
    }
    out
}

fn severity_band(severity: u8) -> &'static str {
    match severity {
        0..=2 => "low",
        3..=6 => "medium",
        _ => "high",
    }
}
