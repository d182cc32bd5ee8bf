//! Per-shell session controller
//!
//! A [`SessionController`] owns one editor session: it resolves the initial
//! content, picks the rich or fallback editor, keeps the saved indicator in
//! line with the store, and runs the shell's actions. All methods take
//! `&self` so a host may drive actions concurrently; a session's own state is
//! never locked across a suspension point.

use codepad_core::{is_saved, RunRequest, SessionKey};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

use crate::adapter::{AdapterKind, ChangeListener, EditorAdapter};
use crate::fallback::FallbackEditor;
use crate::fullscreen::Takeover;
use crate::host::{HostRegion, KeyHandling, KeyPress, SavedBadge, ShellControl, ShellMarkup, ShellView, TextInput};
use crate::notify::{MSG_COPIED, MSG_RESET, MSG_SAVED};
use crate::render::ResultRenderer;
use crate::rich::RichEditor;
use crate::services::EditorServices;
use crate::EditorError;

/// Lifecycle of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Uninitialized,
    /// Waiting for the rich editor to load
    Loading,
    Ready,
    /// Ready on the fallback editor
    Degraded,
    /// Torn down; every action is a no-op
    Destroyed,
}

/// Result of running one action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    Completed,
    /// The shell exposes no control for this action
    Unwired,
    /// The shell has no editor
    NoEditor,
    /// A previous run is still outstanding
    Busy,
    /// Nothing to do in the current state
    Skipped,
    /// The action ran but its underlying capability failed
    Degraded,
}

struct PendingRegions {
    rich_host: Option<HostRegion>,
    fallback: Option<Box<dyn TextInput>>,
}

/// Clears the in-flight flag when a run ends, however it ends
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// Collapse CRLF/CR to LF and drop one leading blank line
pub fn normalize_template(raw: &str) -> String {
    let text = raw.replace("\r\n", "\n").replace('\r', "\n");
    match text.split_once('\n') {
        Some((first, rest)) if first.trim().is_empty() => rest.to_string(),
        _ => text,
    }
}

pub struct SessionController {
    id: Uuid,
    key: SessionKey,
    starter: String,
    start_empty: bool,
    controls: HashSet<ShellControl>,
    view: Arc<dyn ShellView>,
    services: EditorServices,
    regions: Mutex<Option<PendingRegions>>,
    adapter: Mutex<Option<Box<dyn EditorAdapter>>>,
    phase: Mutex<SessionPhase>,
    saved: AtomicBool,
    run_in_flight: AtomicBool,
    revision: Arc<AtomicU64>,
}

impl SessionController {
    /// Bind a controller to a shell; nothing is loaded until [`boot`](Self::boot)
    pub fn new(markup: ShellMarkup, services: EditorServices) -> Self {
        let ShellMarkup {
            task_id,
            problem_id,
            start_empty,
            starter_source,
            rich_host,
            fallback,
            controls,
            view,
        } = markup;

        Self {
            id: Uuid::new_v4(),
            key: SessionKey::new(task_id, problem_id),
            starter: normalize_template(starter_source.as_deref().unwrap_or_default()),
            start_empty,
            controls,
            view,
            services,
            regions: Mutex::new(Some(PendingRegions {
                rich_host,
                fallback,
            })),
            adapter: Mutex::new(None),
            phase: Mutex::new(SessionPhase::Uninitialized),
            saved: AtomicBool::new(false),
            run_in_flight: AtomicBool::new(false),
            revision: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn key(&self) -> &SessionKey {
        &self.key
    }

    /// Normalized starter template
    pub fn starter(&self) -> &str {
        &self.starter
    }

    pub fn phase(&self) -> SessionPhase {
        *lock(&self.phase)
    }

    /// Implementation of the active editor, `None` when there is none
    pub fn adapter_kind(&self) -> Option<AdapterKind> {
        lock(&self.adapter).as_ref().map(|a| a.kind())
    }

    /// Current editor content
    pub fn value(&self) -> Option<String> {
        lock(&self.adapter).as_ref().map(|a| a.get_value())
    }

    /// Saved indicator as last displayed
    pub fn saved_indicator(&self) -> bool {
        self.saved.load(Ordering::SeqCst)
    }

    /// Number of buffer changes observed since boot
    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::SeqCst)
    }

    pub fn is_expanded(&self) -> bool {
        self.services.fullscreen.is_active(self.id)
    }

    pub fn is_wired(&self, control: ShellControl) -> bool {
        self.controls.contains(&control)
    }

    /// Resolve the initial content, construct the editor and show the saved
    /// indicator. Runs once; later calls are ignored.
    pub async fn boot(&self) {
        let Some(regions) = lock(&self.regions).take() else {
            tracing::debug!("Session {} already booted", self.key);
            return;
        };
        self.set_phase(SessionPhase::Loading);

        let persisted = self.read_persisted();
        let initial = match &persisted {
            Some(text) => text.clone(),
            None if self.start_empty => String::new(),
            None => self.starter.clone(),
        };

        let adapter = self.construct_adapter(regions, &initial).await;

        if self.phase() == SessionPhase::Destroyed {
            tracing::debug!("Session {} torn down while loading", self.key);
            if let Some(mut adapter) = adapter {
                adapter.destroy();
            }
            return;
        }

        let phase = match adapter.as_ref().map(|a| a.kind()) {
            Some(AdapterKind::Fallback) => SessionPhase::Degraded,
            _ => SessionPhase::Ready,
        };
        let kind = adapter.as_ref().map(|a| a.kind());
        *lock(&self.adapter) = adapter;
        self.set_phase(phase);
        self.show_saved(is_saved(persisted.as_deref()));

        match kind {
            Some(kind) => tracing::info!("Session {} ready on the {} editor", self.key, kind),
            None => tracing::warn!("Session {} has no editor region", self.key),
        }
    }

    /// Rich editor first, fallback on failure or when there is no rich host
    async fn construct_adapter(
        &self,
        regions: PendingRegions,
        initial: &str,
    ) -> Option<Box<dyn EditorAdapter>> {
        let PendingRegions {
            rich_host,
            fallback,
        } = regions;
        let on_change = self.change_listener();

        if let Some(host) = rich_host {
            match self.load_rich(&host, initial, on_change.clone()).await {
                Ok(editor) => {
                    if fallback.is_some() {
                        self.view.set_fallback_visible(false);
                    }
                    return Some(Box::new(editor));
                }
                Err(e) => {
                    tracing::warn!(
                        "Rich editor unavailable for {}, using fallback: {}",
                        self.key,
                        e
                    );
                    self.view.clear_rich_host();
                }
            }
        }

        fallback.map(|input| {
            Box::new(FallbackEditor::new(
                input,
                initial,
                self.services.indent_width,
                on_change,
            )) as Box<dyn EditorAdapter>
        })
    }

    async fn load_rich(
        &self,
        host: &HostRegion,
        initial: &str,
        on_change: ChangeListener,
    ) -> Result<RichEditor, EditorError> {
        let loader = self
            .services
            .loader
            .as_ref()
            .ok_or_else(|| EditorError::RichEditorUnavailable("no loader configured".to_string()))?;

        RichEditor::create(
            loader.as_ref(),
            host,
            &self.services.rich_spec,
            initial,
            on_change,
        )
        .await
        .map_err(|e| EditorError::RichEditorUnavailable(e.to_string()))
    }

    fn change_listener(&self) -> ChangeListener {
        let key = self.key.clone();
        let revision = self.revision.clone();
        Arc::new(move |doc: &str| {
            revision.fetch_add(1, Ordering::SeqCst);
            tracing::trace!("Session {} changed ({} bytes)", key, doc.len());
        })
    }

    /// Run the action bound to a control
    pub async fn handle(&self, control: ShellControl) -> ActionOutcome {
        match control {
            ShellControl::Save => self.save(),
            ShellControl::Reset => self.reset(),
            ShellControl::Copy => self.copy().await,
            ShellControl::Run => self.run().await,
            ShellControl::Fullscreen => self.enter_fullscreen().await,
            ShellControl::ExitFullscreen => self.exit_fullscreen().await,
        }
    }

    /// Persist the editor content verbatim
    pub fn save(&self) -> ActionOutcome {
        if !self.is_wired(ShellControl::Save) {
            return ActionOutcome::Unwired;
        }
        let Some(value) = self.value() else {
            return ActionOutcome::NoEditor;
        };

        match self.services.store.set(&self.key, &value) {
            Ok(()) => {
                self.show_saved(is_saved(Some(&value)));
                self.services.notifier.notify(MSG_SAVED);
                tracing::info!("Saved {}", self.key);
                ActionOutcome::Completed
            }
            Err(e) => {
                tracing::warn!("Save for {} had no effect: {}", self.key, e);
                self.refresh_saved_indicator();
                ActionOutcome::Degraded
            }
        }
    }

    /// Forget the persisted entry and restore the starter template
    pub fn reset(&self) -> ActionOutcome {
        if !self.is_wired(ShellControl::Reset) {
            return ActionOutcome::Unwired;
        }

        if lock(&self.adapter).is_none() {
            return ActionOutcome::NoEditor;
        }

        match self.services.store.clear(&self.key) {
            Ok(()) => {
                if let Some(adapter) = lock(&self.adapter).as_mut() {
                    adapter.set_value(&self.starter);
                }
                self.show_saved(false);
                self.services.notifier.notify(MSG_RESET);
                tracing::info!("Reset {}", self.key);
                ActionOutcome::Completed
            }
            Err(e) => {
                tracing::warn!("Could not clear persisted code for {}: {}", self.key, e);
                self.refresh_saved_indicator();
                ActionOutcome::Degraded
            }
        }
    }

    /// Place the editor content on the clipboard
    pub async fn copy(&self) -> ActionOutcome {
        if !self.is_wired(ShellControl::Copy) {
            return ActionOutcome::Unwired;
        }
        let Some(value) = self.value() else {
            return ActionOutcome::NoEditor;
        };

        if self.services.clipboard.copy_text(&value).await.succeeded() {
            self.services.notifier.notify(MSG_COPIED);
            ActionOutcome::Completed
        } else {
            ActionOutcome::Degraded
        }
    }

    /// Submit the editor content for execution and render the report
    pub async fn run(&self) -> ActionOutcome {
        if !self.is_wired(ShellControl::Run) {
            return ActionOutcome::Unwired;
        }
        let Some(code) = self.value() else {
            return ActionOutcome::NoEditor;
        };
        if self.run_in_flight.swap(true, Ordering::SeqCst) {
            tracing::debug!("Run for {} already in flight", self.key);
            return ActionOutcome::Busy;
        }
        let _in_flight = InFlight(&self.run_in_flight);

        let Some(dispatcher) = &self.services.dispatcher else {
            tracing::warn!("Run requested for {} but no execution service is configured", self.key);
            self.view
                .set_results_html(&ResultRenderer::new().render_error(None));
            return ActionOutcome::Degraded;
        };

        self.view
            .set_results_html(&dispatcher.renderer().render_pending());
        let html = dispatcher.dispatch(&RunRequest::new(&self.key, code)).await;
        self.view.set_results_html(&html);
        ActionOutcome::Completed
    }

    /// Expand the shell and lock page scrolling
    pub async fn enter_fullscreen(&self) -> ActionOutcome {
        if !self.is_wired(ShellControl::Fullscreen) {
            return ActionOutcome::Unwired;
        }
        if self.phase() == SessionPhase::Destroyed {
            return ActionOutcome::Skipped;
        }

        match self.services.fullscreen.enter(self.id, self.view.clone()) {
            Takeover::AlreadyActive => return ActionOutcome::Skipped,
            Takeover::Entered(Some(displaced)) => {
                displaced.set_expanded(false);
                tracing::debug!("{} took over fullscreen", self.key);
            }
            Takeover::Entered(None) => {}
        }
        self.view.set_expanded(true);
        self.services.page.set_scroll_locked(true);
        self.refocus_next_frame().await;
        ActionOutcome::Completed
    }

    /// Leave fullscreen through the exit control
    pub async fn exit_fullscreen(&self) -> ActionOutcome {
        if !self.is_wired(ShellControl::ExitFullscreen) {
            return ActionOutcome::Unwired;
        }
        self.dismiss_fullscreen().await
    }

    /// Leave fullscreen regardless of which controls exist (Escape, another
    /// shell taking over)
    pub async fn dismiss_fullscreen(&self) -> ActionOutcome {
        if !self.collapse() {
            return ActionOutcome::Skipped;
        }
        self.refocus_next_frame().await;
        ActionOutcome::Completed
    }

    /// Offer a key press to the active editor
    pub fn handle_key(&self, key: &KeyPress) -> KeyHandling {
        match lock(&self.adapter).as_mut() {
            Some(adapter) => adapter.handle_key(key),
            None => KeyHandling::Default,
        }
    }

    /// The host reports user input in the shell's editor
    pub fn handle_input(&self) {
        if let Some(adapter) = lock(&self.adapter).as_mut() {
            adapter.handle_input();
        }
    }

    /// Destroy the editor and release page-wide state held by this shell
    pub fn teardown(&self) {
        self.set_phase(SessionPhase::Destroyed);
        lock(&self.regions).take();
        if let Some(mut adapter) = lock(&self.adapter).take() {
            adapter.destroy();
        }
        self.collapse();
        tracing::debug!("Session {} torn down", self.key);
    }

    fn collapse(&self) -> bool {
        // A shell displaced by another was already collapsed and must not
        // release the scroll lock the new one holds.
        if !self.services.fullscreen.exit(self.id) {
            return false;
        }
        self.view.set_expanded(false);
        self.services.page.set_scroll_locked(false);
        true
    }

    async fn refocus_next_frame(&self) {
        self.services.frames.next_frame().await;
        if let Some(adapter) = lock(&self.adapter).as_mut() {
            adapter.focus();
        }
    }

    fn read_persisted(&self) -> Option<String> {
        self.services.store.get(&self.key).unwrap_or_else(|e| {
            tracing::warn!("Could not read persisted code for {}: {}", self.key, e);
            None
        })
    }

    fn refresh_saved_indicator(&self) {
        let persisted = self.read_persisted();
        self.show_saved(is_saved(persisted.as_deref()));
    }

    fn show_saved(&self, saved: bool) {
        self.saved.store(saved, Ordering::SeqCst);
        self.view.set_saved_badge(SavedBadge::new(saved));
    }

    fn set_phase(&self, phase: SessionPhase) {
        *lock(&self.phase) = phase;
    }
}
