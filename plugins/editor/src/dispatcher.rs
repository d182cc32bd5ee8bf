//! Run dispatch to the remote execution service

use async_trait::async_trait;
use codepad_core::{CodepadError, EditorConfig, Result, RunRequest, RunResponse};
use std::sync::Arc;
use std::time::Duration;

use crate::render::ResultRenderer;

/// Remote code-execution collaborator
#[async_trait]
pub trait ExecutionClient: Send + Sync {
    /// Submit code; transport failures are errors, logical failures are `ok: false`
    async fn execute(&self, request: &RunRequest) -> Result<RunResponse>;
}

/// [`ExecutionClient`] posting JSON to an HTTP endpoint
pub struct HttpExecutionClient {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpExecutionClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CodepadError::execution(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    /// Client for the configured endpoint, `None` when no endpoint is set
    pub fn from_config(config: &EditorConfig) -> Result<Option<Self>> {
        config
            .run_endpoint
            .as_ref()
            .map(|endpoint| Self::new(endpoint.clone(), Duration::from_secs(config.run_timeout_secs)))
            .transpose()
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ExecutionClient for HttpExecutionClient {
    async fn execute(&self, request: &RunRequest) -> Result<RunResponse> {
        tracing::debug!(
            "Submitting {}/{} to {}",
            request.task_id,
            request.problem_id,
            self.endpoint
        );

        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| CodepadError::execution(format!("Request failed: {}", e)))?;

        let status = response.status();
        // error statuses may still carry an {ok: false, error} body
        response.json::<RunResponse>().await.map_err(|e| {
            if status.is_success() {
                CodepadError::execution(format!("Invalid response body: {}", e))
            } else {
                CodepadError::execution(format!("Execution service returned {}", status))
            }
        })
    }
}

/// Sends run requests and turns the outcome into results-region markup
#[derive(Clone)]
pub struct RunDispatcher {
    client: Arc<dyn ExecutionClient>,
    renderer: ResultRenderer,
}

impl RunDispatcher {
    pub fn new(client: Arc<dyn ExecutionClient>) -> Self {
        Self {
            client,
            renderer: ResultRenderer::new(),
        }
    }

    pub fn renderer(&self) -> &ResultRenderer {
        &self.renderer
    }

    /// Execute the request and render the report
    pub async fn dispatch(&self, request: &RunRequest) -> String {
        match self.client.execute(request).await {
            Ok(response) => {
                tracing::info!(
                    "Run for {}/{} finished: ok={}, {}/{} passed",
                    request.task_id,
                    request.problem_id,
                    response.ok,
                    response.passed_count(),
                    response.results.len()
                );
                self.renderer.render_response(&response)
            }
            Err(e) => {
                tracing::warn!(
                    "Run for {}/{} failed: {}",
                    request.task_id,
                    request.problem_id,
                    e
                );
                self.renderer.render_error(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::StaticExecutionClient;
    use crate::render::GENERIC_RUN_ERROR;
    use codepad_core::SessionKey;

    #[tokio::test]
    async fn test_transport_failure_renders_generic_error() {
        let client = Arc::new(StaticExecutionClient::unreachable());
        let dispatcher = RunDispatcher::new(client.clone());

        let html = dispatcher
            .dispatch(&RunRequest::new(&SessionKey::new("1", "a"), "x"))
            .await;

        assert!(html.contains(GENERIC_RUN_ERROR));
        assert_eq!(client.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_request_carries_session_and_code() {
        let client = Arc::new(StaticExecutionClient::responding(RunResponse {
            ok: true,
            all_passed: Some(true),
            results: Vec::new(),
            error: None,
        }));
        let dispatcher = RunDispatcher::new(client.clone());

        dispatcher
            .dispatch(&RunRequest::new(&SessionKey::new("1", "a"), "print(2)"))
            .await;

        let requests = client.requests();
        assert_eq!(requests[0].task_id, "1");
        assert_eq!(requests[0].problem_id, "a");
        assert_eq!(requests[0].code, "print(2)");
    }

    #[test]
    fn test_http_client_from_config() {
        let mut config = EditorConfig::default();
        assert!(HttpExecutionClient::from_config(&config).unwrap().is_none());

        config.run_endpoint = Some("http://127.0.0.1:9/run".to_string());
        let client = HttpExecutionClient::from_config(&config).unwrap().unwrap();
        assert_eq!(client.endpoint(), "http://127.0.0.1:9/run");
    }

    #[tokio::test]
    async fn test_http_client_unreachable_endpoint_is_error() {
        let client =
            HttpExecutionClient::new("http://127.0.0.1:9/run", Duration::from_secs(2)).unwrap();
        let result = client
            .execute(&RunRequest::new(&SessionKey::new("1", "a"), "x"))
            .await;
        assert!(result.is_err());
    }
}
