//! Per-model, per-kind analysis run lifecycles.
//!
//! Each operation begins a ticketed run entry, performs the remote call
//! and applies the completion through the session, which drops anything
//! superseded in the meantime. Failures are contained here: they become
//! an error entry for that (model, kind) and never escape to the caller.

use crate::client::AnalysisService;
use crate::models::RunKind;
use crate::risk::{normalize, normalize_predict};
use crate::session::state::{RunOutcome, RunStatus, Session};
use tracing::{info, warn};

pub struct Orchestrator<S> {
    service: S,
}

impl<S: AnalysisService> Orchestrator<S> {
    pub fn new(service: S) -> Self {
        Self { service }
    }

    /// Run predictive risk scoring for a registered model.
    ///
    /// Severity is normalized to 0-10 and the metadata heuristics are
    /// attached; reasons and mitigation default to empty sequences.
    pub async fn run_predict(&self, session: &mut Session, model_id: i64) -> RunStatus {
        let Some(model) = session.model(model_id).cloned() else {
            let ticket = session.begin(model_id, RunKind::Predict);
            session.fail(
                &ticket,
                format!("model {} is not registered in this session", model_id),
            );
            return RunStatus::Error;
        };

        let ticket = session.begin(model_id, RunKind::Predict);
        match self.service.predict(model_id).await {
            Ok(response) => {
                let record = normalize_predict(&model, &response.result);
                session.complete(&ticket, RunOutcome::Risk(record), response.run_id);
            }
            Err(e) => {
                warn!("Predictor failed for model {}: {}", model_id, e);
                session.fail(&ticket, e.to_string());
            }
        }
        session.status(model_id, RunKind::Predict)
    }

    /// Run adversarial probing. The returned attack sequence is stored
    /// verbatim, in service order, with no post-processing.
    pub async fn run_redteam(
        &self,
        session: &mut Session,
        model_id: i64,
        attacks: usize,
    ) -> RunStatus {
        let ticket = session.begin(model_id, RunKind::Redteam);
        match self.service.redteam(model_id, attacks).await {
            Ok(response) => {
                info!(
                    "Red-team produced {} attacks for model {}",
                    response.attacks.len(),
                    model_id
                );
                session.complete(&ticket, RunOutcome::Attacks(response.attacks), response.run_id);
            }
            Err(e) => {
                warn!("Red-team failed for model {}: {}", model_id, e);
                session.fail(&ticket, e.to_string());
            }
        }
        session.status(model_id, RunKind::Redteam)
    }

    /// Run the multi-category audit. The payload goes through the
    /// normalizer unmodified; no predict-style heuristics are applied.
    pub async fn run_audit(&self, session: &mut Session, model_id: i64) -> RunStatus {
        let ticket = session.begin(model_id, RunKind::Audit);
        match self.service.audit_model(model_id).await {
            Ok(response) => {
                let record = normalize(&response.analysis);
                session.complete(&ticket, RunOutcome::Risk(record), response.run_id);
            }
            Err(e) => {
                warn!("Model audit failed for model {}: {}", model_id, e);
                session.fail(&ticket, e.to_string());
            }
        }
        session.status(model_id, RunKind::Audit)
    }
}
