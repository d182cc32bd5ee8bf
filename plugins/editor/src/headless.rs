//! In-memory host implementation
//!
//! Every host trait has a recording, in-memory implementation here so pages
//! can be driven without a browser: integration harnesses, server-side
//! previews and the crate's own tests.

use async_trait::async_trait;
use codepad_core::{
    CodepadError, EditorConfig, KeyValueSessionStore, MemoryStorage, Result, RunRequest,
    RunResponse, StorageBackend,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::adapter::{splice_chars, ChangeListener};
use crate::clipboard::ClipboardAccess;
use crate::dispatcher::ExecutionClient;
use crate::host::{
    Clipboard, FrameScheduler, HostRegion, LegacyClipboard, PageView, SavedBadge, ShellView,
    TextInput,
};
use crate::notify::{Notifier, SurfaceFactory, ToastSurface};
use crate::rich::{ChangeSet, EditorComponent, RichEditorLoader, RichEditorSpec};
use crate::services::EditorServices;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

#[derive(Debug, Default)]
struct ViewState {
    badge: Option<SavedBadge>,
    expanded: Option<bool>,
    results_html: String,
    rich_host_cleared: bool,
    fallback_visible: Option<bool>,
}

/// [`ShellView`] recording the last value written to each region
#[derive(Debug, Default)]
pub struct HeadlessShellView {
    state: Mutex<ViewState>,
}

impl HeadlessShellView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn badge(&self) -> Option<SavedBadge> {
        lock(&self.state).badge
    }

    pub fn expanded(&self) -> Option<bool> {
        lock(&self.state).expanded
    }

    pub fn results_html(&self) -> String {
        lock(&self.state).results_html.clone()
    }

    pub fn rich_host_cleared(&self) -> bool {
        lock(&self.state).rich_host_cleared
    }

    pub fn fallback_visible(&self) -> Option<bool> {
        lock(&self.state).fallback_visible
    }
}

impl ShellView for HeadlessShellView {
    fn set_saved_badge(&self, badge: SavedBadge) {
        lock(&self.state).badge = Some(badge);
    }

    fn set_expanded(&self, expanded: bool) {
        lock(&self.state).expanded = Some(expanded);
    }

    fn set_results_html(&self, html: &str) {
        lock(&self.state).results_html = html.to_string();
    }

    fn clear_rich_host(&self) {
        lock(&self.state).rich_host_cleared = true;
    }

    fn set_fallback_visible(&self, visible: bool) {
        lock(&self.state).fallback_visible = Some(visible);
    }
}

/// [`PageView`] tracking the scroll lock
#[derive(Debug, Default)]
pub struct HeadlessPage {
    scroll_locked: AtomicBool,
}

impl HeadlessPage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scroll_locked(&self) -> bool {
        self.scroll_locked.load(Ordering::SeqCst)
    }
}

impl PageView for HeadlessPage {
    fn set_scroll_locked(&self, locked: bool) {
        self.scroll_locked.store(locked, Ordering::SeqCst);
    }
}

/// [`FrameScheduler`] that yields once per frame
#[derive(Debug, Default)]
pub struct ImmediateFrames {
    frames: AtomicUsize,
}

impl ImmediateFrames {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames requested so far
    pub fn frames(&self) -> usize {
        self.frames.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FrameScheduler for ImmediateFrames {
    async fn next_frame(&self) {
        self.frames.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
    }
}

#[derive(Debug, Default)]
struct InputState {
    value: String,
    selection: (usize, usize),
    focused: bool,
}

/// [`TextInput`] over shared state; clones observe the same input
#[derive(Debug, Clone, Default)]
pub struct MemoryTextInput {
    state: Arc<Mutex<InputState>>,
}

impl MemoryTextInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate the user selecting `[start, end)`
    pub fn select(&self, start: usize, end: usize) {
        lock(&self.state).selection = (start, end);
    }

    /// Simulate the user replacing the whole text
    pub fn type_text(&self, text: &str) {
        let mut state = lock(&self.state);
        state.value = text.to_string();
        let end = text.chars().count();
        state.selection = (end, end);
    }

    pub fn selection_range(&self) -> (usize, usize) {
        lock(&self.state).selection
    }

    pub fn text(&self) -> String {
        lock(&self.state).value.clone()
    }

    pub fn is_focused(&self) -> bool {
        lock(&self.state).focused
    }
}

impl TextInput for MemoryTextInput {
    fn value(&self) -> String {
        self.text()
    }

    fn set_value(&mut self, value: &str) {
        self.type_text(value);
    }

    fn selection(&self) -> (usize, usize) {
        self.selection_range()
    }

    fn set_selection(&mut self, start: usize, end: usize) {
        self.select(start, end);
    }

    fn focus(&mut self) {
        lock(&self.state).focused = true;
    }
}

#[derive(Default)]
struct BufferState {
    doc: String,
    listeners: Vec<ChangeListener>,
    transactions: usize,
    focus_count: usize,
    destroy_count: usize,
}

/// Observer of a [`BufferComponent`] after it was handed to an editor
#[derive(Clone)]
pub struct BufferHandle {
    state: Arc<Mutex<BufferState>>,
}

impl BufferHandle {
    pub fn doc(&self) -> String {
        lock(&self.state).doc.clone()
    }

    /// Transactions dispatched since construction
    pub fn transactions(&self) -> usize {
        lock(&self.state).transactions
    }

    pub fn is_focused(&self) -> bool {
        self.focus_count() > 0
    }

    pub fn focus_count(&self) -> usize {
        lock(&self.state).focus_count
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroy_count() > 0
    }

    pub fn destroy_count(&self) -> usize {
        lock(&self.state).destroy_count
    }

    /// Simulate a user edit replacing the whole document
    pub fn type_text(&self, text: &str) {
        let len = lock(&self.state).doc.chars().count();
        apply_change(&self.state, ChangeSet::replace_all(len, text));
    }
}

fn apply_change(state: &Mutex<BufferState>, change: ChangeSet) {
    let (doc, listeners) = {
        let mut state = lock(state);
        let (doc, _) = splice_chars(&state.doc, change.from, change.to, &change.insert);
        state.doc = doc.clone();
        state.transactions += 1;
        (doc, state.listeners.clone())
    };
    for listener in listeners {
        listener(&doc);
    }
}

/// Plain text buffer standing in for the rich editing component
pub struct BufferComponent {
    state: Arc<Mutex<BufferState>>,
}

impl EditorComponent for BufferComponent {
    fn doc(&self) -> String {
        lock(&self.state).doc.clone()
    }

    fn doc_len(&self) -> usize {
        lock(&self.state).doc.chars().count()
    }

    fn dispatch(&mut self, change: ChangeSet) {
        apply_change(&self.state, change);
    }

    fn subscribe(&mut self, listener: ChangeListener) {
        lock(&self.state).listeners.push(listener);
    }

    fn focus(&mut self) {
        lock(&self.state).focus_count += 1;
    }

    fn destroy(&mut self) {
        let mut state = lock(&self.state);
        state.destroy_count += 1;
        state.listeners.clear();
    }
}

/// [`RichEditorLoader`] constructing [`BufferComponent`]s, or failing on demand
#[derive(Default)]
pub struct BufferLoader {
    failure: Option<String>,
    loaded: Mutex<Vec<BufferHandle>>,
}

impl BufferLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loader whose every load fails with `message`
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            loaded: Mutex::new(Vec::new()),
        }
    }

    pub fn load_count(&self) -> usize {
        lock(&self.loaded).len()
    }

    pub fn last_component(&self) -> Option<BufferHandle> {
        lock(&self.loaded).last().cloned()
    }

    pub fn components(&self) -> Vec<BufferHandle> {
        lock(&self.loaded).clone()
    }
}

#[async_trait]
impl RichEditorLoader for BufferLoader {
    async fn load(
        &self,
        host: &HostRegion,
        _spec: &RichEditorSpec,
        initial: &str,
    ) -> Result<Box<dyn EditorComponent>> {
        tokio::task::yield_now().await;
        if let Some(message) = &self.failure {
            return Err(CodepadError::adapter(format!("{}: {}", host.id, message)));
        }

        let state = Arc::new(Mutex::new(BufferState {
            doc: initial.to_string(),
            ..BufferState::default()
        }));
        lock(&self.loaded).push(BufferHandle {
            state: state.clone(),
        });
        Ok(Box::new(BufferComponent { state }))
    }
}

#[derive(Debug, Default)]
struct ClipboardState {
    contents: Mutex<Option<String>>,
    primary_denied: AtomicBool,
    legacy_denied: AtomicBool,
}

/// Both clipboard paths over one in-memory buffer
#[derive(Debug, Clone, Default)]
pub struct MemoryClipboard {
    state: Arc<ClipboardState>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deny_primary(self) -> Self {
        self.set_primary_denied(true);
        self
    }

    pub fn deny_legacy(self) -> Self {
        self.set_legacy_denied(true);
        self
    }

    pub fn set_primary_denied(&self, denied: bool) {
        self.state.primary_denied.store(denied, Ordering::SeqCst);
    }

    pub fn set_legacy_denied(&self, denied: bool) {
        self.state.legacy_denied.store(denied, Ordering::SeqCst);
    }

    pub fn contents(&self) -> Option<String> {
        lock(&self.state.contents).clone()
    }

    pub fn access(&self) -> ClipboardAccess {
        ClipboardAccess::new(Arc::new(self.clone()), Arc::new(self.clone()))
    }
}

#[async_trait]
impl Clipboard for MemoryClipboard {
    async fn write_text(&self, text: &str) -> Result<()> {
        if self.state.primary_denied.load(Ordering::SeqCst) {
            return Err(CodepadError::clipboard("clipboard permission denied"));
        }
        *lock(&self.state.contents) = Some(text.to_string());
        Ok(())
    }
}

impl LegacyClipboard for MemoryClipboard {
    fn copy_via_selection(&self, text: &str) -> Result<()> {
        if self.state.legacy_denied.load(Ordering::SeqCst) {
            return Err(CodepadError::clipboard("copy command unsupported"));
        }
        *lock(&self.state.contents) = Some(text.to_string());
        Ok(())
    }
}

#[derive(Debug, Default)]
struct ToastState {
    created: usize,
    visible: Option<String>,
}

/// [`ToastSurface`] remembering the visible message
#[derive(Debug, Clone, Default)]
pub struct RecordingToast {
    state: Arc<Mutex<ToastState>>,
}

impl RecordingToast {
    pub fn new() -> Self {
        Self::default()
    }

    /// Factory handing out this surface, counting creations
    pub fn factory(&self) -> SurfaceFactory {
        let toast = self.clone();
        Box::new(move || {
            lock(&toast.state).created += 1;
            Arc::new(toast.clone()) as Arc<dyn ToastSurface>
        })
    }

    pub fn created_count(&self) -> usize {
        lock(&self.state).created
    }

    pub fn visible_message(&self) -> Option<String> {
        lock(&self.state).visible.clone()
    }
}

impl ToastSurface for RecordingToast {
    fn show(&self, message: &str) {
        lock(&self.state).visible = Some(message.to_string());
    }

    fn hide(&self) {
        lock(&self.state).visible = None;
    }
}

/// [`ExecutionClient`] returning a canned response
#[derive(Default)]
pub struct StaticExecutionClient {
    response: Option<RunResponse>,
    delay: Option<Duration>,
    requests: Mutex<Vec<RunRequest>>,
}

impl StaticExecutionClient {
    /// Every request fails at the transport level
    pub fn unreachable() -> Self {
        Self::default()
    }

    pub fn responding(response: RunResponse) -> Self {
        Self {
            response: Some(response),
            ..Self::default()
        }
    }

    /// Hold every request for `delay` before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn requests(&self) -> Vec<RunRequest> {
        lock(&self.requests).clone()
    }
}

#[async_trait]
impl ExecutionClient for StaticExecutionClient {
    async fn execute(&self, request: &RunRequest) -> Result<RunResponse> {
        lock(&self.requests).push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.response
            .clone()
            .ok_or_else(|| CodepadError::execution("connection refused"))
    }
}

/// [`StorageBackend`] on which every operation fails
#[derive(Debug, Default)]
pub struct UnavailableStorage;

impl StorageBackend for UnavailableStorage {
    fn get_item(&self, _key: &str) -> Result<Option<String>> {
        Err(CodepadError::storage("storage unavailable"))
    }

    fn set_item(&self, _key: &str, _value: &str) -> Result<()> {
        Err(CodepadError::storage("storage unavailable"))
    }

    fn remove_item(&self, _key: &str) -> Result<()> {
        Err(CodepadError::storage("storage unavailable"))
    }

    fn keys(&self) -> Result<Vec<String>> {
        Err(CodepadError::storage("storage unavailable"))
    }
}

/// A complete headless page: one of each host capability, wired into
/// [`EditorServices`]
pub struct HeadlessHost {
    pub view: Arc<HeadlessShellView>,
    pub page: Arc<HeadlessPage>,
    pub frames: Arc<ImmediateFrames>,
    pub toast: RecordingToast,
    pub clipboard: MemoryClipboard,
    pub loader: Arc<BufferLoader>,
    pub store: Arc<KeyValueSessionStore>,
    services: EditorServices,
}

impl HeadlessHost {
    pub fn new() -> Self {
        Self::build(Arc::new(MemoryStorage::new()), BufferLoader::new())
    }

    /// Host whose rich editor never loads
    pub fn with_failing_loader() -> Self {
        Self::build(
            Arc::new(MemoryStorage::new()),
            BufferLoader::failing("module fetch failed"),
        )
    }

    /// Host whose persistent storage rejects every operation
    pub fn with_broken_storage() -> Self {
        Self::build(Arc::new(UnavailableStorage), BufferLoader::new())
    }

    /// Host over an existing storage backend
    pub fn with_storage(backend: Arc<dyn StorageBackend>) -> Self {
        Self::build(backend, BufferLoader::new())
    }

    fn build(backend: Arc<dyn StorageBackend>, loader: BufferLoader) -> Self {
        let config = EditorConfig::default();
        let view = Arc::new(HeadlessShellView::new());
        let page = Arc::new(HeadlessPage::new());
        let frames = Arc::new(ImmediateFrames::new());
        let toast = RecordingToast::new();
        let clipboard = MemoryClipboard::new();
        let loader = Arc::new(loader);
        let store = Arc::new(KeyValueSessionStore::with_prefix(
            backend,
            config.storage_prefix.clone(),
        ));

        let notifier = Arc::new(Notifier::new(
            toast.factory(),
            Duration::from_millis(config.toast_duration_ms),
        ));
        let services = EditorServices::new(
            &config,
            store.clone(),
            notifier,
            clipboard.access(),
            frames.clone(),
            page.clone(),
        )
        .with_loader(loader.clone());

        Self {
            view,
            page,
            frames,
            toast,
            clipboard,
            loader,
            store,
            services,
        }
    }

    /// Route Run through `client`
    pub fn with_executor(mut self, client: Arc<dyn ExecutionClient>) -> Self {
        self.services = self.services.with_executor(client);
        self
    }

    /// Shared services; every call returns handles to the same page state
    pub fn services(&self) -> EditorServices {
        self.services.clone()
    }
}

impl Default for HeadlessHost {
    fn default() -> Self {
        Self::new()
    }
}
