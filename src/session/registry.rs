//! Model registry operations against the remote service.
//!
//! The session holds the authoritative in-session model list; this
//! module keeps it in sync with the service. A failed list leaves the
//! snapshot untouched; a removal purges every run entry for that model.

use crate::client::AnalysisService;
use crate::error::ClientError;
use crate::models::{Model, ModelFields};
use crate::session::state::Session;
use tracing::{info, warn};

pub struct ModelRegistry<S> {
    service: S,
}

impl<S: AnalysisService> ModelRegistry<S> {
    pub fn new(service: S) -> Self {
        Self { service }
    }

    /// Fetch the model list and replace the session snapshot.
    ///
    /// On failure the error propagates and the existing snapshot stays
    /// as-is for display.
    pub async fn refresh(&self, session: &mut Session) -> Result<usize, ClientError> {
        let models = self.service.list_models().await?;
        let count = models.len();
        session.set_models(models);
        Ok(count)
    }

    /// Register a new model and append it to the session snapshot.
    pub async fn create(
        &self,
        session: &mut Session,
        fields: ModelFields,
    ) -> Result<Model, ClientError> {
        if fields.name.trim().is_empty() {
            return Err(ClientError::Validation(
                "model name must not be empty".to_string(),
            ));
        }
        let model = self.service.create_model(&fields).await?;
        session.push_model(model.clone());
        Ok(model)
    }

    /// Delete a model and invalidate every run entry keyed on it.
    ///
    /// Idempotent for ids the service no longer knows. In-flight
    /// requests for the model are not cancelled at the transport level;
    /// purging the session makes their eventual results unobservable.
    pub async fn remove(&self, session: &mut Session, id: i64) -> Result<(), ClientError> {
        self.service.delete_model(id).await?;
        if session.model(id).is_none() {
            warn!("Model {} was not in the session snapshot", id);
        }
        session.purge_model(id);
        info!("Deleted model {}", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RunKind;
    use crate::session::test_stub::StubService;
    use crate::session::RunStatus;

    fn model(id: i64, name: &str) -> Model {
        Model {
            id,
            name: name.to_string(),
            description: String::new(),
            dataset_summary: String::new(),
            task: String::new(),
            sensitive_features: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_refresh_replaces_snapshot() {
        let stub = StubService::default();
        stub.set_list(Ok(vec![model(1, "a"), model(2, "b")]));

        let registry = ModelRegistry::new(&stub);
        let mut session = Session::new();
        let count = registry.refresh(&mut session).await.unwrap();

        assert_eq!(count, 2);
        assert_eq!(session.models().len(), 2);
    }

    #[tokio::test]
    async fn test_refresh_failure_leaves_snapshot_unchanged() {
        let stub = StubService::default();
        stub.set_list(Err(ClientError::Connect {
            url: "http://localhost:8000".to_string(),
        }));

        let registry = ModelRegistry::new(&stub);
        let mut session = Session::new();
        session.push_model(model(1, "kept"));

        let err = registry.refresh(&mut session).await.unwrap_err();
        assert!(err.is_network());
        assert_eq!(session.models().len(), 1);
        assert_eq!(session.models()[0].name, "kept");
    }

    #[tokio::test]
    async fn test_create_appends() {
        let stub = StubService::default();
        stub.set_create(Ok(model(9, "fresh")));

        let registry = ModelRegistry::new(&stub);
        let mut session = Session::new();
        let fields = ModelFields {
            name: "fresh".to_string(),
            ..Default::default()
        };
        let created = registry.create(&mut session, fields).await.unwrap();

        assert_eq!(created.id, 9);
        assert_eq!(session.models().len(), 1);
    }

    #[tokio::test]
    async fn test_create_rejects_empty_name_without_network() {
        let stub = StubService::default();
        let registry = ModelRegistry::new(&stub);
        let mut session = Session::new();

        let err = registry
            .create(&mut session, ModelFields::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
        assert_eq!(stub.create_calls(), 0);
    }

    #[tokio::test]
    async fn test_remove_purges_runs_for_that_model_only() {
        let stub = StubService::default();
        let registry = ModelRegistry::new(&stub);
        let mut session = Session::new();
        session.push_model(model(1, "a"));
        session.push_model(model(2, "b"));
        session.begin(1, RunKind::Predict);
        session.begin(2, RunKind::Predict);

        registry.remove(&mut session, 1).await.unwrap();

        assert!(session.model(1).is_none());
        assert_eq!(session.status(1, RunKind::Predict), RunStatus::Idle);
        assert_eq!(session.status(2, RunKind::Predict), RunStatus::Pending);
        assert_eq!(stub.deleted_ids(), vec![1]);
    }

    #[tokio::test]
    async fn test_remove_is_idempotent_for_unknown_ids() {
        let stub = StubService::default();
        let registry = ModelRegistry::new(&stub);
        let mut session = Session::new();

        registry.remove(&mut session, 42).await.unwrap();
        registry.remove(&mut session, 42).await.unwrap();
        assert_eq!(stub.deleted_ids(), vec![42, 42]);
    }
}
