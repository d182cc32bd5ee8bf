//! Per-task progress derived from persisted code

use serde::{Deserialize, Serialize};

use crate::store::{is_saved, SessionKey, SessionStore};

/// How many problems of a task have saved code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProgressSummary {
    pub total: usize,
    pub completed: usize,
}

impl ProgressSummary {
    /// Completion percentage, rounded down; an empty task is 0%
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        ((self.completed * 100) / self.total) as u8
    }

    /// Whether every problem has saved code
    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.completed == self.total
    }
}

/// Count the problems of `task_id` whose persisted code is non-blank.
///
/// Unreadable entries count as not saved.
pub fn aggregate<S, I>(store: &S, task_id: &str, problem_ids: I) -> ProgressSummary
where
    S: SessionStore + ?Sized,
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut summary = ProgressSummary::default();

    for problem_id in problem_ids {
        summary.total += 1;
        let key = SessionKey::new(task_id, problem_id.as_ref());
        match store.get(&key) {
            Ok(entry) if is_saved(entry.as_deref()) => summary.completed += 1,
            Ok(_) => {}
            Err(e) => tracing::warn!("Could not read persisted code for {}: {}", key, e),
        }
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{KeyValueSessionStore, MemoryStorage};
    use std::sync::Arc;

    #[test]
    fn test_counts_only_non_blank_entries() {
        let store = KeyValueSessionStore::new(Arc::new(MemoryStorage::new()));
        store.set(&SessionKey::new("1", "a"), "print(1)").unwrap();
        store.set(&SessionKey::new("1", "b"), "   ").unwrap();
        store.set(&SessionKey::new("2", "c"), "other task").unwrap();

        let summary = aggregate(&store, "1", ["a", "b", "c"]);
        assert_eq!(summary, ProgressSummary { total: 3, completed: 1 });
        assert_eq!(summary.percent(), 33);
        assert!(!summary.is_complete());
    }

    #[test]
    fn test_empty_task() {
        let store = KeyValueSessionStore::new(Arc::new(MemoryStorage::new()));
        let summary = aggregate(&store, "1", Vec::<String>::new());
        assert_eq!(summary.percent(), 0);
        assert!(!summary.is_complete());
    }
}
