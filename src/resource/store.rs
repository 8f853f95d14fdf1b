//! Form State Store
//!
//! Holds the items each resource kind has created or updated, and the status
//! of the latest submission per kind. It is only ever written through
//! [`FormStateStore::dispatch`].

use super::item::ResourceItem;
use super::registry::ResourceKind;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

/// A state transition
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    Created { kind: ResourceKind, item: ResourceItem },
    Updated { kind: ResourceKind, item: ResourceItem },
    SubmissionFailed { kind: ResourceKind, message: String },
}

impl Transition {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::Created { kind, .. }
            | Self::Updated { kind, .. }
            | Self::SubmissionFailed { kind, .. } => *kind,
        }
    }

    /// Label such as `CREATED_ACCOUNT`
    pub fn label(&self) -> String {
        let verb = match self {
            Self::Created { .. } => "CREATED",
            Self::Updated { .. } => "UPDATED",
            Self::SubmissionFailed { .. } => "SUBMIT_FAILED",
        };
        format!("{}_{}", verb, self.kind().label())
    }
}

/// Outcome of the latest submission for a kind
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SubmissionStatus {
    #[default]
    Idle,
    Succeeded,
    Failed(String),
}

/// Items of one resource kind, keyed by id
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceSlice {
    pub items: BTreeMap<String, ResourceItem>,
}

#[derive(Debug, Default)]
struct StoreState {
    slices: HashMap<ResourceKind, ResourceSlice>,
    submissions: HashMap<ResourceKind, SubmissionStatus>,
    history: VecDeque<String>,
}

/// Transition labels kept by default
const DEFAULT_MAX_HISTORY: usize = 100;

/// Shared application state for resource forms
#[derive(Debug)]
pub struct FormStateStore {
    state: Mutex<StoreState>,
    /// Maximum transition labels to keep in history
    max_history: usize,
}

impl Default for FormStateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl FormStateStore {
    pub fn new() -> Self {
        Self::with_max_history(DEFAULT_MAX_HISTORY)
    }

    pub fn with_max_history(max_history: usize) -> Self {
        Self {
            state: Mutex::new(StoreState::default()),
            max_history,
        }
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Apply a transition
    pub fn dispatch(&self, transition: Transition) {
        let label = transition.label();
        tracing::debug!("dispatch {}", label);

        let mut state = self.lock();
        match transition {
            Transition::Created { kind, item } | Transition::Updated { kind, item } => {
                state
                    .slices
                    .entry(kind)
                    .or_default()
                    .items
                    .insert(item.id.clone(), item);
                state.submissions.insert(kind, SubmissionStatus::Succeeded);
            }
            Transition::SubmissionFailed { kind, message } => {
                state
                    .submissions
                    .insert(kind, SubmissionStatus::Failed(message));
            }
        }
        state.history.push_back(label);
        while state.history.len() > self.max_history {
            state.history.pop_front();
        }
    }

    /// Snapshot of a kind's items
    pub fn slice(&self, kind: ResourceKind) -> ResourceSlice {
        self.lock().slices.get(&kind).cloned().unwrap_or_default()
    }

    pub fn item(&self, kind: ResourceKind, id: &str) -> Option<ResourceItem> {
        self.lock()
            .slices
            .get(&kind)
            .and_then(|slice| slice.items.get(id))
            .cloned()
    }

    pub fn submission_status(&self, kind: ResourceKind) -> SubmissionStatus {
        self.lock()
            .submissions
            .get(&kind)
            .cloned()
            .unwrap_or_default()
    }

    /// Labels of the most recent transitions, oldest first
    pub fn history(&self) -> Vec<String> {
        self.lock().history.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels() {
        let created = Transition::Created {
            kind: ResourceKind::Account,
            item: ResourceItem::new("acc1"),
        };
        let updated = Transition::Updated {
            kind: ResourceKind::Asset,
            item: ResourceItem::new("a1"),
        };
        assert_eq!(created.label(), "CREATED_ACCOUNT");
        assert_eq!(updated.label(), "UPDATED_ASSET");
    }

    #[test]
    fn test_created_and_updated_replace_item() {
        let store = FormStateStore::new();
        store.dispatch(Transition::Created {
            kind: ResourceKind::Account,
            item: ResourceItem::new("acc1"),
        });

        let mut renamed = ResourceItem::new("acc1");
        renamed.alias = Some("alice".to_string());
        store.dispatch(Transition::Updated {
            kind: ResourceKind::Account,
            item: renamed.clone(),
        });

        assert_eq!(store.item(ResourceKind::Account, "acc1"), Some(renamed));
        assert_eq!(store.slice(ResourceKind::Account).items.len(), 1);
        assert!(store.slice(ResourceKind::Asset).items.is_empty());
        assert_eq!(
            store.submission_status(ResourceKind::Account),
            SubmissionStatus::Succeeded
        );
    }

    #[test]
    fn test_failure_leaves_slice_untouched() {
        let store = FormStateStore::new();
        store.dispatch(Transition::Created {
            kind: ResourceKind::Asset,
            item: ResourceItem::new("a1"),
        });
        let before = store.slice(ResourceKind::Asset);

        store.dispatch(Transition::SubmissionFailed {
            kind: ResourceKind::Asset,
            message: "boom".to_string(),
        });

        assert_eq!(store.slice(ResourceKind::Asset), before);
        assert_eq!(
            store.submission_status(ResourceKind::Asset),
            SubmissionStatus::Failed("boom".to_string())
        );
        assert_eq!(store.history(), vec!["CREATED_ASSET", "SUBMIT_FAILED_ASSET"]);
    }

    #[test]
    fn test_history_is_capped() {
        let store = FormStateStore::with_max_history(2);
        for id in ["a1", "a2", "a3"] {
            store.dispatch(Transition::Created {
                kind: ResourceKind::Asset,
                item: ResourceItem::new(id),
            });
        }
        store.dispatch(Transition::SubmissionFailed {
            kind: ResourceKind::Asset,
            message: "boom".to_string(),
        });

        assert_eq!(store.history(), vec!["CREATED_ASSET", "SUBMIT_FAILED_ASSET"]);
        assert_eq!(store.slice(ResourceKind::Asset).items.len(), 3);
    }
}
