//! Page-level coordination of editor shells
//!
//! A [`Page`] boots every shell found in the document, routes control
//! activations to the owning controller and owns the page-wide behavior:
//! the single fullscreen slot, the global Escape key, template copy buttons
//! and progress badges.

use codepad_core::{aggregate, ProgressSummary};
use futures_util::future::join_all;
use std::sync::Arc;
use uuid::Uuid;

use crate::clipboard::CopyOutcome;
use crate::controller::{ActionOutcome, SessionController};
use crate::host::{Key, KeyHandling, KeyPress, ShellControl, ShellMarkup};
use crate::notify::MSG_COPIED;
use crate::services::EditorServices;
use crate::EditorError;

pub struct Page {
    services: EditorServices,
    shells: Vec<Arc<SessionController>>,
}

impl Page {
    /// Create a controller per shell and boot them concurrently
    pub async fn boot(services: EditorServices, markup: Vec<ShellMarkup>) -> Self {
        let shells: Vec<Arc<SessionController>> = markup
            .into_iter()
            .map(|shell| Arc::new(SessionController::new(shell, services.clone())))
            .collect();

        join_all(shells.iter().map(|shell| shell.boot())).await;
        tracing::info!("Booted {} editor shell(s)", shells.len());

        Self { services, shells }
    }

    pub fn shells(&self) -> &[Arc<SessionController>] {
        &self.shells
    }

    /// Shell by document order
    pub fn shell(&self, index: usize) -> Option<&Arc<SessionController>> {
        self.shells.get(index)
    }

    pub fn find(&self, id: Uuid) -> Option<&Arc<SessionController>> {
        self.shells.iter().find(|shell| shell.id() == id)
    }

    pub fn services(&self) -> &EditorServices {
        &self.services
    }

    /// Activate a control on the shell at `index`
    pub async fn dispatch(
        &self,
        index: usize,
        control: ShellControl,
    ) -> Result<ActionOutcome, EditorError> {
        let shell = self.shell(index).ok_or(EditorError::ShellNotFound(index))?;
        let outcome = shell.handle(control).await;
        tracing::debug!("{} on {} -> {:?}", control, shell.key(), outcome);
        Ok(outcome)
    }

    /// Activate a control on the shell owning session `id`
    pub async fn dispatch_to(
        &self,
        id: Uuid,
        control: ShellControl,
    ) -> Result<ActionOutcome, EditorError> {
        let index = self
            .shells
            .iter()
            .position(|shell| shell.id() == id)
            .ok_or(EditorError::SessionNotFound(id))?;
        self.dispatch(index, control).await
    }

    /// Key press inside the shell at `index`
    pub async fn handle_key(&self, index: usize, key: &KeyPress) -> Result<KeyHandling, EditorError> {
        if key.key == Key::Escape {
            return Ok(self.handle_escape().await);
        }
        let shell = self.shell(index).ok_or(EditorError::ShellNotFound(index))?;
        Ok(shell.handle_key(key))
    }

    /// User input in the fallback editor of the shell at `index`
    pub fn handle_input(&self, index: usize) -> Result<(), EditorError> {
        let shell = self.shell(index).ok_or(EditorError::ShellNotFound(index))?;
        shell.handle_input();
        Ok(())
    }

    /// Global Escape: leave fullscreen if any shell is in it
    pub async fn handle_escape(&self) -> KeyHandling {
        let Some(shell) = self
            .services
            .fullscreen
            .active()
            .and_then(|id| self.find(id))
        else {
            return KeyHandling::Default;
        };

        match shell.dismiss_fullscreen().await {
            ActionOutcome::Completed => KeyHandling::Handled,
            _ => KeyHandling::Default,
        }
    }

    /// Copy a catalog template's code; toast only on success
    pub async fn copy_template(&self, code: &str) -> CopyOutcome {
        let outcome = self.services.clipboard.copy_text(code).await;
        if outcome.succeeded() {
            self.services.notifier.notify(MSG_COPIED);
        }
        outcome
    }

    /// Completion of a task's problems as currently persisted
    pub fn progress<I>(&self, task_id: &str, problem_ids: I) -> ProgressSummary
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        aggregate(self.services.store.as_ref(), task_id, problem_ids)
    }

    /// Tear down every shell
    pub fn teardown(&self) {
        for shell in &self.shells {
            shell.teardown();
        }
        tracing::info!("Tore down {} editor shell(s)", self.shells.len());
    }
}
