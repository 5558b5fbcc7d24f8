//! HTTP client for the remote ethics analysis service.
//!
//! All remote operations the rest of the crate performs go through the
//! [`AnalysisService`] trait; [`ApiClient`] is the reqwest-backed
//! implementation. Tests substitute a stub implementation.

use crate::error::ClientError;
use crate::models::{
    AnalysisPayload, AttackSample, Model, ModelFields, PredictResult, RunRecord,
};
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

/// Predictor envelope: `{result: {...}, run_id}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PredictResponse {
    #[serde(default)]
    pub result: PredictResult,
    #[serde(default)]
    pub run_id: Option<i64>,
}

/// Red-team envelope: `{attacks: [...], run_id}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RedteamResponse {
    #[serde(default)]
    pub attacks: Vec<AttackSample>,
    #[serde(default)]
    pub run_id: Option<i64>,
}

/// Model audit envelope: `{analysis: {...}, run_id}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuditResponse {
    #[serde(default)]
    pub analysis: AnalysisPayload,
    #[serde(default)]
    pub run_id: Option<i64>,
}

/// Upload audit envelope, echoing the file name and the media type the
/// service inferred from the upload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UploadAuditResponse {
    #[serde(default)]
    pub run_id: Option<i64>,
    #[serde(default)]
    pub file_name: String,
    #[serde(default)]
    pub media_type: String,
    #[serde(default)]
    pub analysis: AnalysisPayload,
}

/// An in-memory file ready for multipart submission.
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

/// The remote operations the orchestration layer depends on.
///
/// Transport detail is an implementation concern; the envelope shapes
/// above are the binding contract.
#[allow(async_fn_in_trait)]
pub trait AnalysisService {
    async fn list_models(&self) -> Result<Vec<Model>, ClientError>;
    async fn create_model(&self, fields: &ModelFields) -> Result<Model, ClientError>;
    async fn delete_model(&self, id: i64) -> Result<(), ClientError>;
    async fn predict(&self, model_id: i64) -> Result<PredictResponse, ClientError>;
    async fn redteam(&self, model_id: i64, attacks: usize) -> Result<RedteamResponse, ClientError>;
    async fn audit_model(&self, model_id: i64) -> Result<AuditResponse, ClientError>;
    async fn upload_audit(&self, upload: FileUpload) -> Result<UploadAuditResponse, ClientError>;
    async fn list_runs(&self) -> Result<Vec<RunRecord>, ClientError>;
    async fn export_report(&self, run_id: i64) -> Result<Vec<u8>, ClientError>;
}

/// reqwest-backed client for the analysis service.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    timeout_seconds: u64,
    show_progress: bool,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(
        base_url: &str,
        timeout_seconds: u64,
        show_progress: bool,
    ) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout_seconds,
            show_progress,
            http,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn map_send_error(&self, e: reqwest::Error) -> ClientError {
        if e.is_timeout() {
            ClientError::Timeout {
                seconds: self.timeout_seconds,
            }
        } else if e.is_connect() {
            ClientError::Connect {
                url: self.base_url.clone(),
            }
        } else {
            ClientError::Transport(e.to_string())
        }
    }

    /// Check the HTTP status, then decode the body while rejecting the
    /// service's soft `{"error": "..."}` envelopes.
    async fn decode<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| self.map_send_error(e))?;

        if !status.is_success() {
            return Err(ClientError::Api {
                status: status.as_u16(),
                body: extract_detail(&body),
            });
        }

        if let Some(message) = service_error(&body) {
            return Err(ClientError::Api {
                status: status.as_u16(),
                body: message,
            });
        }

        serde_json::from_str(&body).map_err(|e| ClientError::Decode(e.to_string()))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        debug!("GET {}", path);
        let response = self
            .http
            .get(self.url(path))
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;
        self.decode(response).await
    }

    async fn post_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        debug!("POST {}", path);
        let response = self
            .http
            .post(self.url(path))
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;
        self.decode(response).await
    }
}

#[derive(Debug, Deserialize)]
struct ModelsEnvelope {
    #[serde(default)]
    models: Vec<Model>,
}

#[derive(Debug, Deserialize)]
struct CreatedEnvelope {
    model: Model,
}

#[derive(Debug, Deserialize)]
struct RunsEnvelope {
    #[serde(default)]
    runs: Vec<RunRecord>,
}

impl AnalysisService for ApiClient {
    async fn list_models(&self) -> Result<Vec<Model>, ClientError> {
        let envelope: ModelsEnvelope = self.get_json("/models/").await?;
        Ok(envelope.models)
    }

    async fn create_model(&self, fields: &ModelFields) -> Result<Model, ClientError> {
        // The service expects multipart form fields, not JSON.
        let form = Form::new()
            .text("name", fields.name.clone())
            .text("description", fields.description.clone())
            .text("dataset_summary", fields.dataset_summary.clone())
            .text("task", fields.task.clone())
            .text("sensitive_features", fields.sensitive_features.join(", "));

        let response = self
            .http
            .post(self.url("/models/"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let envelope: CreatedEnvelope = self.decode(response).await?;
        info!("Registered model #{} ({})", envelope.model.id, envelope.model.name);
        Ok(envelope.model)
    }

    async fn delete_model(&self, id: i64) -> Result<(), ClientError> {
        let response = self
            .http
            .delete(self.url(&format!("/models/{}", id)))
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        // The service reports an already-deleted id as a soft error;
        // deletion is idempotent from the client's point of view.
        let status = response.status();
        if !status.is_success() && status.as_u16() != 404 {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Api {
                status: status.as_u16(),
                body: extract_detail(&body),
            });
        }
        Ok(())
    }

    async fn predict(&self, model_id: i64) -> Result<PredictResponse, ClientError> {
        self.post_json(&format!("/predict/{}", model_id)).await
    }

    async fn redteam(&self, model_id: i64, attacks: usize) -> Result<RedteamResponse, ClientError> {
        self.post_json(&format!("/redteam/{}?attacks={}", model_id, attacks))
            .await
    }

    async fn audit_model(&self, model_id: i64) -> Result<AuditResponse, ClientError> {
        self.post_json(&format!("/analyze_model/{}", model_id)).await
    }

    async fn upload_audit(&self, upload: FileUpload) -> Result<UploadAuditResponse, ClientError> {
        let part = Part::bytes(upload.bytes)
            .file_name(upload.file_name.clone())
            .mime_str(&upload.mime)
            .map_err(|e| ClientError::Validation(format!("unusable media type: {}", e)))?;

        let form = Form::new().part("file", part);

        let response = self
            .http
            .post(self.url("/analyze_upload/"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        self.decode(response).await
    }

    async fn list_runs(&self) -> Result<Vec<RunRecord>, ClientError> {
        let envelope: RunsEnvelope = self.get_json("/runs/").await?;
        Ok(envelope.runs)
    }

    async fn export_report(&self, run_id: i64) -> Result<Vec<u8>, ClientError> {
        let response = self
            .http
            .get(self.url(&format!("/report/{}", run_id)))
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Api {
                status: status.as_u16(),
                body: extract_detail(&body),
            });
        }

        let progress = if self.show_progress {
            let pb = match response.content_length() {
                Some(len) => ProgressBar::new(len),
                None => ProgressBar::new_spinner(),
            };
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{bar:40.cyan/blue}] {bytes}/{total_bytes}")
                    .unwrap()
                    .progress_chars("#>-"),
            );
            Some(pb)
        } else {
            None
        };

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| self.map_send_error(e))?;
            bytes.extend_from_slice(&chunk);
            if let Some(ref pb) = progress {
                pb.set_position(bytes.len() as u64);
            }
        }
        if let Some(pb) = progress {
            pb.finish_and_clear();
        }

        debug!("Downloaded report for run {} ({} bytes)", run_id, bytes.len());
        Ok(bytes)
    }
}

/// Some endpoints report failure as `{"error": "..."}` with HTTP 200.
fn service_error(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value
        .get("error")
        .and_then(|e| e.as_str())
        .map(String::from)
}

/// FastAPI-style error bodies carry the message under `detail`.
fn extract_detail(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(String::from))
        .unwrap_or_else(|| body.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predict_envelope() {
        let json = r#"{"result": {"severity_score": 4.6, "reasons": ["skewed data"], "mitigation": []}, "run_id": 12}"#;
        let response: PredictResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.run_id, Some(12));
        assert_eq!(response.result.reasons, vec!["skewed data"]);
    }

    #[test]
    fn test_redteam_envelope_preserves_order() {
        let json = r#"{"attacks": [
            {"id": 2, "type": "jailbreak", "vulnerability_score": 0.9, "attack_prompt": "b"},
            {"id": 1, "type": "prompt_injection", "vulnerability_score": 0.1, "attack_prompt": "a"}
        ]}"#;
        let response: RedteamResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.attacks[0].id, 2);
        assert_eq!(response.attacks[1].id, 1);
    }

    #[test]
    fn test_upload_envelope() {
        let json = r#"{"run_id": 5, "file_name": "posts.csv", "media_type": "csv", "analysis": {}}"#;
        let response: UploadAuditResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.file_name, "posts.csv");
        assert_eq!(response.media_type, "csv");
        assert!(response.analysis.bias.is_empty());
    }

    #[test]
    fn test_service_error_detection() {
        assert_eq!(
            service_error(r#"{"error": "model not found"}"#),
            Some("model not found".to_string())
        );
        assert_eq!(service_error(r#"{"models": []}"#), None);
        assert_eq!(service_error("not json"), None);
    }

    #[test]
    fn test_extract_detail() {
        assert_eq!(
            extract_detail(r#"{"detail": "Unsupported file type"}"#),
            "Unsupported file type"
        );
        assert_eq!(extract_detail("plain body"), "plain body");
    }

    #[test]
    fn test_base_url_trimmed() {
        let client = ApiClient::new("http://127.0.0.1:8000/", 30, false).unwrap();
        assert_eq!(client.url("/models/"), "http://127.0.0.1:8000/models/");
    }
}
