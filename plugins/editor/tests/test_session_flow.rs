use codepad_core::{FileStorage, RunResponse, SessionKey, SessionStore, TestCaseResult};
use codepad_editor::headless::{HeadlessHost, HeadlessShellView, MemoryTextInput, StaticExecutionClient};
use codepad_editor::{
    ActionOutcome, AdapterKind, HostRegion, Page, SavedBadge, SessionPhase, ShellControl,
    ShellMarkup, MSG_RESET, MSG_SAVED,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

fn practice_shell(view: Arc<HeadlessShellView>, input: &MemoryTextInput) -> ShellMarkup {
    let mut attributes = HashMap::new();
    attributes.insert("data-task-id".to_string(), "1".to_string());
    attributes.insert("data-problem-id".to_string(), "a".to_string());

    ShellMarkup::from_attributes(&attributes, view)
        .unwrap()
        .with_starter("\nprint(1)")
        .with_rich_host(HostRegion::new("cm-1-a"))
        .with_fallback(Box::new(input.clone()))
        .with_controls(ShellControl::ALL)
}

fn one_failing_case() -> RunResponse {
    RunResponse {
        ok: true,
        all_passed: Some(false),
        results: vec![TestCaseResult {
            test: 1,
            passed: false,
            input: "1".to_string(),
            expected: "2".to_string(),
            stdout: "3".to_string(),
            stderr: String::new(),
        }],
        error: None,
    }
}

#[tokio::test]
async fn test_edit_save_reset_flow() {
    init_tracing();
    let host = HeadlessHost::new();
    let input = MemoryTextInput::new();
    let page = Page::boot(host.services(), vec![practice_shell(host.view.clone(), &input)]).await;
    let shell = page.shell(0).unwrap();
    let key = SessionKey::new("1", "a");

    assert_eq!(shell.value().as_deref(), Some("print(1)"));
    assert_eq!(host.view.badge(), Some(SavedBadge::new(false)));

    host.loader.last_component().unwrap().type_text("print(2)");
    assert_eq!(
        page.dispatch(0, ShellControl::Save).await.unwrap(),
        ActionOutcome::Completed
    );
    assert_eq!(host.store.get(&key).unwrap().as_deref(), Some("print(2)"));
    assert_eq!(host.view.badge(), Some(SavedBadge::new(true)));
    assert_eq!(host.toast.visible_message().as_deref(), Some(MSG_SAVED));

    page.dispatch(0, ShellControl::Reset).await.unwrap();
    assert_eq!(shell.value().as_deref(), Some("print(1)"));
    assert_eq!(host.store.get(&key).unwrap(), None);
    assert_eq!(host.view.badge(), Some(SavedBadge::new(false)));
    assert_eq!(host.toast.visible_message().as_deref(), Some(MSG_RESET));
}

#[tokio::test]
async fn test_saved_code_survives_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("storage.json");

    {
        let host = HeadlessHost::with_storage(Arc::new(FileStorage::open(&path).unwrap()));
        let input = MemoryTextInput::new();
        let page =
            Page::boot(host.services(), vec![practice_shell(host.view.clone(), &input)]).await;
        host.loader.last_component().unwrap().type_text("x = 41 + 1");
        page.dispatch(0, ShellControl::Save).await.unwrap();
        page.teardown();
    }

    let host = HeadlessHost::with_storage(Arc::new(FileStorage::open(&path).unwrap()));
    let input = MemoryTextInput::new();
    let page = Page::boot(host.services(), vec![practice_shell(host.view.clone(), &input)]).await;

    assert_eq!(page.shell(0).unwrap().value().as_deref(), Some("x = 41 + 1"));
    assert_eq!(host.view.badge(), Some(SavedBadge::new(true)));
}

#[tokio::test]
async fn test_run_renders_failing_case() {
    let client = Arc::new(StaticExecutionClient::responding(one_failing_case()));
    let host = HeadlessHost::new().with_executor(client.clone());
    let input = MemoryTextInput::new();
    let page = Page::boot(host.services(), vec![practice_shell(host.view.clone(), &input)]).await;
    host.loader.last_component().unwrap().type_text("x");

    assert_eq!(
        page.dispatch(0, ShellControl::Run).await.unwrap(),
        ActionOutcome::Completed
    );

    let html = host.view.results_html();
    assert!(html.contains(r#"<div class="run-banner fail">"#));
    assert_eq!(html.matches(r#"<div class="run-case "#).count(), 1);
    assert!(html.contains("<pre>1</pre>"));
    assert!(html.contains("<pre>2</pre>"));
    assert!(html.contains("<pre>3</pre>"));
    assert!(!html.contains("run-case-error"));

    let requests = client.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].code, "x");
}

#[tokio::test]
async fn test_overlapping_runs_are_rejected() {
    let client = Arc::new(
        StaticExecutionClient::responding(one_failing_case()).with_delay(Duration::from_millis(50)),
    );
    let host = HeadlessHost::new().with_executor(client.clone());
    let input = MemoryTextInput::new();
    let page = Page::boot(host.services(), vec![practice_shell(host.view.clone(), &input)]).await;
    let shell = page.shell(0).unwrap();

    let (first, second) = tokio::join!(shell.run(), shell.run());

    assert_eq!(first, ActionOutcome::Completed);
    assert_eq!(second, ActionOutcome::Busy);
    assert_eq!(client.requests().len(), 1);
    assert_eq!(shell.run().await, ActionOutcome::Completed);
}

#[tokio::test]
async fn test_unreachable_service_shows_generic_error() {
    let host = HeadlessHost::new().with_executor(Arc::new(StaticExecutionClient::unreachable()));
    let input = MemoryTextInput::new();
    let page = Page::boot(host.services(), vec![practice_shell(host.view.clone(), &input)]).await;

    page.dispatch(0, ShellControl::Run).await.unwrap();

    assert!(host.view.results_html().contains(codepad_editor::GENERIC_RUN_ERROR));
}

#[tokio::test]
async fn test_fallback_editor_when_rich_editor_fails() {
    init_tracing();
    let host = HeadlessHost::with_failing_loader();
    let input = MemoryTextInput::new();
    let page = Page::boot(host.services(), vec![practice_shell(host.view.clone(), &input)]).await;
    let shell = page.shell(0).unwrap();

    assert_eq!(shell.phase(), SessionPhase::Degraded);
    assert_eq!(shell.adapter_kind(), Some(AdapterKind::Fallback));
    assert!(host.view.rich_host_cleared());
    assert_eq!(input.text(), "print(1)");

    input.type_text("print(3)");
    page.dispatch(0, ShellControl::Save).await.unwrap();
    assert_eq!(
        host.store.get(&SessionKey::new("1", "a")).unwrap().as_deref(),
        Some("print(3)")
    );
}

#[tokio::test]
async fn test_start_empty_shell() {
    let host = HeadlessHost::new();
    let mut attributes = HashMap::new();
    attributes.insert("data-task-id".to_string(), "2".to_string());
    attributes.insert("data-problem-id".to_string(), "b".to_string());
    attributes.insert("data-start-empty".to_string(), "true".to_string());
    let shell = ShellMarkup::from_attributes(&attributes, host.view.clone())
        .unwrap()
        .with_starter("def solve():\n    pass\n")
        .with_rich_host(HostRegion::new("cm-2-b"))
        .with_controls(ShellControl::ALL);

    let page = Page::boot(host.services(), vec![shell]).await;
    let shell = page.shell(0).unwrap();

    assert_eq!(shell.value().as_deref(), Some(""));
    assert_eq!(host.view.badge(), Some(SavedBadge::new(false)));

    page.dispatch(0, ShellControl::Reset).await.unwrap();
    assert_eq!(shell.value().as_deref(), Some("def solve():\n    pass\n"));
}

#[tokio::test]
async fn test_escape_exits_fullscreen() {
    let host = HeadlessHost::new();
    let input = MemoryTextInput::new();
    let page = Page::boot(host.services(), vec![practice_shell(host.view.clone(), &input)]).await;

    page.dispatch(0, ShellControl::Fullscreen).await.unwrap();
    assert!(host.page.scroll_locked());
    assert_eq!(host.view.expanded(), Some(true));

    page.handle_escape().await;

    assert!(!host.page.scroll_locked());
    assert_eq!(host.view.expanded(), Some(false));
    assert!(!page.shell(0).unwrap().is_expanded());
}
