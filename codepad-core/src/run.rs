//! Wire types for the remote code-execution collaborator

use serde::{Deserialize, Serialize};

use crate::store::SessionKey;

/// Request sent to the execution endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRequest {
    pub task_id: String,
    pub problem_id: String,
    pub code: String,
}

impl RunRequest {
    /// Build a request for the given session
    pub fn new(key: &SessionKey, code: impl Into<String>) -> Self {
        Self {
            task_id: key.task_id.clone(),
            problem_id: key.problem_id.clone(),
            code: code.into(),
        }
    }
}

/// Response returned by the execution endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RunResponse {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub all_passed: Option<bool>,
    #[serde(default)]
    pub results: Vec<TestCaseResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunResponse {
    /// Whether every test passed; absent means not passed
    pub fn all_passed(&self) -> bool {
        self.all_passed.unwrap_or(false)
    }

    /// Number of passing test cases
    pub fn passed_count(&self) -> usize {
        self.results.iter().filter(|r| r.passed).count()
    }
}

/// Outcome of a single test case
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TestCaseResult {
    pub test: u32,
    pub passed: bool,
    #[serde(default)]
    pub input: String,
    #[serde(default)]
    pub expected: String,
    #[serde(default)]
    pub stdout: String,
    #[serde(default)]
    pub stderr: String,
}

impl TestCaseResult {
    /// Whether the case produced error output worth showing
    pub fn has_error_output(&self) -> bool {
        !self.stderr.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_uses_camel_case() {
        let request = RunRequest::new(&SessionKey::new("3", "b"), "x");
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"taskId": "3", "problemId": "b", "code": "x"})
        );
    }

    #[test]
    fn test_response_optional_fields() {
        let response: RunResponse =
            serde_json::from_str(r#"{"ok": false, "error": "timeout"}"#).unwrap();
        assert!(!response.ok);
        assert!(response.results.is_empty());
        assert!(!response.all_passed());
        assert_eq!(response.error.as_deref(), Some("timeout"));
    }

    #[test]
    fn test_response_with_results() {
        let response: RunResponse = serde_json::from_str(
            r#"{"ok": true, "allPassed": false, "results": [
                {"test": 1, "passed": false, "input": "1", "expected": "2", "stdout": "3", "stderr": ""},
                {"test": 2, "passed": true, "input": "2", "expected": "3", "stdout": "3", "stderr": " "}
            ]}"#,
        )
        .unwrap();

        assert_eq!(response.results.len(), 2);
        assert_eq!(response.passed_count(), 1);
        assert!(!response.results[0].has_error_output());
        assert!(!response.results[1].has_error_output());
    }
}
