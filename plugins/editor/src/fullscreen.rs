//! Page-wide tracking of the shell currently in fullscreen

use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

use crate::host::ShellView;

/// Outcome of asking the registry to make a shell fullscreen
pub enum Takeover {
    /// The shell already holds the slot
    AlreadyActive,
    /// The shell now holds the slot; carries the view of the shell it displaced
    Entered(Option<Arc<dyn ShellView>>),
}

/// At most one shell is fullscreen at a time; the global Escape listener
/// consults this registry to find it.
#[derive(Default)]
pub struct FullscreenRegistry {
    active: Mutex<Option<(Uuid, Arc<dyn ShellView>)>>,
}

impl FullscreenRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self) -> MutexGuard<'_, Option<(Uuid, Arc<dyn ShellView>)>> {
        self.active.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Mark `shell` as fullscreen
    pub fn enter(&self, shell: Uuid, view: Arc<dyn ShellView>) -> Takeover {
        let mut active = self.slot();
        if matches!(active.as_ref(), Some((id, _)) if *id == shell) {
            return Takeover::AlreadyActive;
        }
        Takeover::Entered(active.replace((shell, view)).map(|(_, view)| view))
    }

    /// Clear the fullscreen mark if it belongs to `shell`
    pub fn exit(&self, shell: Uuid) -> bool {
        let mut active = self.slot();
        if matches!(active.as_ref(), Some((id, _)) if *id == shell) {
            *active = None;
            true
        } else {
            false
        }
    }

    /// Shell currently in fullscreen
    pub fn active(&self) -> Option<Uuid> {
        self.slot().as_ref().map(|(id, _)| *id)
    }

    pub fn is_active(&self, shell: Uuid) -> bool {
        self.active() == Some(shell)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::HeadlessShellView;

    #[test]
    fn test_enter_and_exit() {
        let registry = FullscreenRegistry::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let view_a = Arc::new(HeadlessShellView::new());

        assert!(matches!(registry.enter(a, view_a.clone()), Takeover::Entered(None)));
        assert_eq!(registry.active(), Some(a));
        assert!(matches!(registry.enter(a, view_a.clone()), Takeover::AlreadyActive));

        match registry.enter(b, Arc::new(HeadlessShellView::new())) {
            Takeover::Entered(Some(displaced)) => displaced.set_expanded(false),
            _ => panic!("expected a to be displaced"),
        }
        assert_eq!(view_a.expanded(), Some(false));
        assert!(!registry.exit(a));
        assert!(registry.is_active(b));

        assert!(registry.exit(b));
        assert_eq!(registry.active(), None);
    }
}
