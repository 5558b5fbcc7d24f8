//! In-session state: the model registry snapshot and per-(model, kind)
//! run lifecycles.
//!
//! A [`Session`] lives from process start to process end and is never a
//! global; everything that mutates it does so through explicit calls.
//! Supersession is enforced with a monotonically increasing request
//! token: completions carrying a stale token are dropped, so re-running
//! an operation while an older request is still in flight can never
//! surface the older result.

use crate::models::{AttackSample, Model, RunKind};
use crate::risk::CanonicalRiskRecord;
use std::collections::HashMap;
use tracing::debug;

/// Identity of one run lifecycle: one model, one operation kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RunKey {
    pub model_id: i64,
    pub kind: RunKind,
}

/// Lifecycle state of a run entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Idle,
    Pending,
    Success,
    Error,
}

/// The stored result of a completed run.
#[derive(Debug, Clone)]
pub enum RunOutcome {
    /// Predict and audit runs store the canonical record.
    Risk(CanonicalRiskRecord),
    /// Red-team runs store the attack sequence verbatim.
    Attacks(Vec<AttackSample>),
}

/// One run lifecycle entry.
#[derive(Debug, Clone)]
pub struct RunSession {
    pub status: RunStatus,
    pub outcome: Option<RunOutcome>,
    pub error: Option<String>,
    /// Server-side run id of the latest completed run, for report export.
    pub run_id: Option<i64>,
    token: u64,
}

/// Handle returned by [`Session::begin`]; a completion may only apply
/// while its ticket is still the latest for the key.
#[derive(Debug, Clone, Copy)]
pub struct RunTicket {
    key: RunKey,
    token: u64,
}

impl RunTicket {
    pub fn key(&self) -> RunKey {
        self.key
    }
}

/// Session-scoped state container. Created at session start, dropped at
/// session end; nothing here survives a restart.
#[derive(Debug, Default)]
pub struct Session {
    models: Vec<Model>,
    runs: HashMap<RunKey, RunSession>,
    next_token: u64,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn models(&self) -> &[Model] {
        &self.models
    }

    pub fn model(&self, id: i64) -> Option<&Model> {
        self.models.iter().find(|m| m.id == id)
    }

    /// Replace the registry snapshot (successful list call).
    pub fn set_models(&mut self, models: Vec<Model>) {
        self.models = models;
    }

    /// Append a newly registered model.
    pub fn push_model(&mut self, model: Model) {
        self.models.push(model);
    }

    /// Remove a model and discard every run entry referencing it,
    /// whatever their status. Entries for other models are untouched.
    pub fn purge_model(&mut self, id: i64) {
        self.models.retain(|m| m.id != id);
        self.runs.retain(|key, _| key.model_id != id);
    }

    pub fn run(&self, model_id: i64, kind: RunKind) -> Option<&RunSession> {
        self.runs.get(&RunKey { model_id, kind })
    }

    pub fn status(&self, model_id: i64, kind: RunKind) -> RunStatus {
        self.run(model_id, kind)
            .map(|r| r.status)
            .unwrap_or(RunStatus::Idle)
    }

    /// Start a new run lifecycle for (model, kind): allocates the next
    /// token, marks the entry pending and optimistically clears any
    /// previous result for that key.
    pub fn begin(&mut self, model_id: i64, kind: RunKind) -> RunTicket {
        self.next_token += 1;
        let key = RunKey { model_id, kind };
        self.runs.insert(
            key,
            RunSession {
                status: RunStatus::Pending,
                outcome: None,
                error: None,
                run_id: None,
                token: self.next_token,
            },
        );
        RunTicket {
            key,
            token: self.next_token,
        }
    }

    /// Whether the ticket still owns its key (no newer request issued,
    /// model not deleted).
    pub fn is_current(&self, ticket: &RunTicket) -> bool {
        self.runs
            .get(&ticket.key)
            .map(|r| r.token == ticket.token)
            .unwrap_or(false)
    }

    /// Apply a successful completion. Returns false (and stores nothing)
    /// when the ticket has been superseded or its model deleted.
    pub fn complete(&mut self, ticket: &RunTicket, outcome: RunOutcome, run_id: Option<i64>) -> bool {
        if !self.is_current(ticket) {
            debug!(
                "Dropping superseded {} result for model {}",
                ticket.key.kind, ticket.key.model_id
            );
            return false;
        }
        let entry = self.runs.get_mut(&ticket.key).unwrap();
        entry.status = RunStatus::Success;
        entry.outcome = Some(outcome);
        entry.error = None;
        entry.run_id = run_id;
        true
    }

    /// Apply a failed completion. Same supersession rules as
    /// [`Session::complete`]; the result stays cleared and only this
    /// key's entry is touched.
    pub fn fail(&mut self, ticket: &RunTicket, message: String) -> bool {
        if !self.is_current(ticket) {
            debug!(
                "Dropping superseded {} failure for model {}",
                ticket.key.kind, ticket.key.model_id
            );
            return false;
        }
        let entry = self.runs.get_mut(&ticket.key).unwrap();
        entry.status = RunStatus::Error;
        entry.outcome = None;
        entry.error = Some(message);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::risk::CanonicalRiskRecord;

    fn model(id: i64) -> Model {
        Model {
            id,
            name: format!("model-{}", id),
            description: String::new(),
            dataset_summary: String::new(),
            task: String::new(),
            sensitive_features: Vec::new(),
        }
    }

    fn risk_outcome() -> RunOutcome {
        RunOutcome::Risk(CanonicalRiskRecord::default())
    }

    #[test]
    fn test_begin_clears_previous_result() {
        let mut session = Session::new();
        session.push_model(model(1));

        let t1 = session.begin(1, RunKind::Predict);
        assert!(session.complete(&t1, risk_outcome(), Some(10)));
        assert!(session.run(1, RunKind::Predict).unwrap().outcome.is_some());

        session.begin(1, RunKind::Predict);
        let entry = session.run(1, RunKind::Predict).unwrap();
        assert_eq!(entry.status, RunStatus::Pending);
        assert!(entry.outcome.is_none());
        assert!(entry.run_id.is_none());
    }

    #[test]
    fn test_second_request_wins_regardless_of_arrival_order() {
        // Responses arrive in issue order.
        let mut session = Session::new();
        let t1 = session.begin(1, RunKind::Predict);
        let t2 = session.begin(1, RunKind::Predict);
        assert!(!session.complete(&t1, risk_outcome(), Some(1)));
        assert!(session.complete(&t2, risk_outcome(), Some(2)));
        assert_eq!(session.run(1, RunKind::Predict).unwrap().run_id, Some(2));

        // Responses arrive in reverse order.
        let mut session = Session::new();
        let t1 = session.begin(1, RunKind::Predict);
        let t2 = session.begin(1, RunKind::Predict);
        assert!(session.complete(&t2, risk_outcome(), Some(2)));
        assert!(!session.complete(&t1, risk_outcome(), Some(1)));
        assert_eq!(session.run(1, RunKind::Predict).unwrap().run_id, Some(2));
        assert_eq!(session.status(1, RunKind::Predict), RunStatus::Success);
    }

    #[test]
    fn test_stale_failure_does_not_clobber_newer_result() {
        let mut session = Session::new();
        let t1 = session.begin(1, RunKind::Audit);
        let t2 = session.begin(1, RunKind::Audit);
        assert!(session.complete(&t2, risk_outcome(), None));
        assert!(!session.fail(&t1, "timed out".to_string()));
        assert_eq!(session.status(1, RunKind::Audit), RunStatus::Success);
    }

    #[test]
    fn test_kinds_do_not_interfere() {
        let mut session = Session::new();
        let predict = session.begin(1, RunKind::Predict);
        let redteam = session.begin(1, RunKind::Redteam);

        assert!(session.fail(&predict, "predictor failed".to_string()));
        assert!(session.complete(&redteam, RunOutcome::Attacks(Vec::new()), Some(3)));

        assert_eq!(session.status(1, RunKind::Predict), RunStatus::Error);
        assert_eq!(session.status(1, RunKind::Redteam), RunStatus::Success);
        assert_eq!(
            session.run(1, RunKind::Predict).unwrap().error.as_deref(),
            Some("predictor failed")
        );
    }

    #[test]
    fn test_purge_model_discards_its_runs_only() {
        let mut session = Session::new();
        session.push_model(model(1));
        session.push_model(model(2));

        let t1 = session.begin(1, RunKind::Predict);
        session.complete(&t1, risk_outcome(), None);
        let pending = session.begin(1, RunKind::Redteam);
        let t2 = session.begin(2, RunKind::Predict);
        session.complete(&t2, risk_outcome(), None);

        session.purge_model(1);

        assert!(session.model(1).is_none());
        assert!(session.model(2).is_some());
        assert_eq!(session.status(1, RunKind::Predict), RunStatus::Idle);
        assert_eq!(session.status(1, RunKind::Redteam), RunStatus::Idle);
        assert_eq!(session.status(2, RunKind::Predict), RunStatus::Success);

        // A late completion for the deleted model is unobservable.
        assert!(!session.complete(&pending, RunOutcome::Attacks(Vec::new()), None));
        assert_eq!(session.status(1, RunKind::Redteam), RunStatus::Idle);
    }

    #[test]
    fn test_status_defaults_to_idle() {
        let session = Session::new();
        assert_eq!(session.status(99, RunKind::Audit), RunStatus::Idle);
    }
}
