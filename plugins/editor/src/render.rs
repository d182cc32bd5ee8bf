//! HTML rendering of run results
//!
//! Execution output is untrusted: every interpolated string goes through
//! [`escape`] before it reaches markup.

use codepad_core::{RunResponse, TestCaseResult};
use std::fmt::Write;

/// Shown when the execution service gives no usable error message
pub const GENERIC_RUN_ERROR: &str = "Run failed. Please try again.";

/// Shown while a run request is outstanding
pub const RUNNING_STATUS: &str = "Running…";

/// Escape `&`, `<` and `>` for text content
pub fn escape(text: &str) -> String {
    html_escape::encode_text(text).into_owned()
}

/// Renders run states into the results region
#[derive(Debug, Clone, Default)]
pub struct ResultRenderer;

impl ResultRenderer {
    pub fn new() -> Self {
        Self
    }

    /// In-progress status
    pub fn render_pending(&self) -> String {
        format!(
            r#"<div class="run-status running">{}</div>"#,
            escape(RUNNING_STATUS)
        )
    }

    /// Error message, or the generic one when absent or blank
    pub fn render_error(&self, message: Option<&str>) -> String {
        let message = message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(GENERIC_RUN_ERROR);
        format!(r#"<div class="run-status error">{}</div>"#, escape(message))
    }

    /// Full report for a response; `ok == false` renders as an error
    pub fn render_response(&self, response: &RunResponse) -> String {
        if !response.ok {
            return self.render_error(response.error.as_deref());
        }

        let mut html = String::new();
        let all_passed = response.all_passed();
        let _ = write!(
            html,
            r#"<div class="run-banner {}">{} ({}/{} passed)</div>"#,
            if all_passed { "pass" } else { "fail" },
            if all_passed {
                "All tests passed"
            } else {
                "Some tests failed"
            },
            response.passed_count(),
            response.results.len()
        );

        for case in &response.results {
            self.render_case(&mut html, case);
        }

        html
    }

    fn render_case(&self, html: &mut String, case: &TestCaseResult) {
        let state = if case.passed { "pass" } else { "fail" };
        let _ = write!(
            html,
            concat!(
                r#"<div class="run-case {state}" data-test="{test}">"#,
                r#"<div class="run-case-head"><span>Test {test}</span>"#,
                r#"<span class="badge {state}">{badge}</span></div>"#,
                r#"<div class="run-case-grid">"#,
                r#"<div><div class="label">Input</div><pre>{input}</pre></div>"#,
                r#"<div><div class="label">Expected</div><pre>{expected}</pre></div>"#,
                r#"<div><div class="label">Actual</div><pre>{actual}</pre></div>"#,
                r#"</div>"#
            ),
            state = state,
            test = case.test,
            badge = if case.passed { "PASS" } else { "FAIL" },
            input = escape(&case.input),
            expected = escape(&case.expected),
            actual = escape(&case.stdout),
        );

        if case.has_error_output() {
            let _ = write!(
                html,
                r#"<div class="run-case-error"><div class="label">Error</div><pre>{}</pre></div>"#,
                escape(&case.stderr)
            );
        }

        html.push_str("</div>");
    }
}
