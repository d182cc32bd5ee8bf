//! Transient toast notifications shared by every shell on a page
//!
//! One [`Notifier`] per page. The toast surface is created lazily on the first
//! message, a new message replaces the visible one, and the surface hides
//! itself after a fixed interval unless a newer message arrived meanwhile.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

/// Message shown after a successful save
pub const MSG_SAVED: &str = "Saved";
/// Message shown after a reset
pub const MSG_RESET: &str = "Reset";
/// Message shown after a successful copy
pub const MSG_COPIED: &str = "Copied";

/// Host element displaying toast messages
pub trait ToastSurface: Send + Sync {
    fn show(&self, message: &str);
    fn hide(&self);
}

/// Creates the toast surface on first use
pub type SurfaceFactory = Box<dyn Fn() -> Arc<dyn ToastSurface> + Send + Sync>;

/// Single-message-at-a-time toast service
pub struct Notifier {
    factory: SurfaceFactory,
    surface: OnceLock<Arc<dyn ToastSurface>>,
    generation: Arc<AtomicU64>,
    duration: Duration,
}

impl Notifier {
    pub fn new(factory: SurfaceFactory, duration: Duration) -> Self {
        Self {
            factory,
            surface: OnceLock::new(),
            generation: Arc::new(AtomicU64::new(0)),
            duration,
        }
    }

    /// Whether the surface has been created yet
    pub fn is_created(&self) -> bool {
        self.surface.get().is_some()
    }

    /// Show a message, replacing the current one, and schedule auto-dismiss
    pub fn notify(&self, message: &str) {
        let surface = self.surface.get_or_init(|| {
            tracing::debug!("Creating toast surface");
            (self.factory)()
        });
        surface.show(message);

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::debug!("No async runtime; toast '{}' will not auto-dismiss", message);
            return;
        };

        let surface = surface.clone();
        let current = self.generation.clone();
        let duration = self.duration;
        runtime.spawn(async move {
            tokio::time::sleep(duration).await;
            if current.load(Ordering::SeqCst) == generation {
                surface.hide();
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::RecordingToast;

    #[tokio::test]
    async fn test_surface_is_created_lazily_once() {
        let toast = RecordingToast::new();
        let notifier = Notifier::new(toast.factory(), Duration::from_millis(20));

        assert!(!notifier.is_created());
        notifier.notify("Saved");
        notifier.notify("Copied");

        assert!(notifier.is_created());
        assert_eq!(toast.created_count(), 1);
        assert_eq!(toast.visible_message().as_deref(), Some("Copied"));
    }

    #[tokio::test]
    async fn test_auto_dismiss() {
        let toast = RecordingToast::new();
        let notifier = Notifier::new(toast.factory(), Duration::from_millis(20));

        notifier.notify("Saved");
        tokio::time::sleep(Duration::from_millis(80)).await;

        assert_eq!(toast.visible_message(), None);
    }

    #[tokio::test]
    async fn test_newer_message_is_not_dismissed_by_older_timer() {
        let toast = RecordingToast::new();
        let notifier = Notifier::new(toast.factory(), Duration::from_millis(60));

        notifier.notify("Saved");
        tokio::time::sleep(Duration::from_millis(40)).await;
        notifier.notify("Reset");
        tokio::time::sleep(Duration::from_millis(40)).await;

        assert_eq!(toast.visible_message().as_deref(), Some("Reset"));

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(toast.visible_message(), None);
    }
}
