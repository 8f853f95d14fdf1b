//! Navigation
//!
//! Forms never move between views themselves; they hand a [`Navigation`] to a
//! [`Navigator`]. [`Router`] is the console's navigator: it keeps the visited
//! paths and the flash message that travels with them.

use crate::flash::{FlashLevel, FlashManager};
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

/// A navigation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    pub path: String,
    /// Keep the pending flash message across this navigation
    pub preserve_flash: bool,
}

impl Navigation {
    pub fn to(path: &str) -> Self {
        Self {
            path: path.to_string(),
            preserve_flash: false,
        }
    }
}

/// Receives navigation side effects
pub trait Navigator: Send + Sync {
    fn navigate(&self, navigation: Navigation);

    /// Queue a flash message for the next view
    fn flash(&self, _level: FlashLevel, _message: String) {}
}

#[derive(Debug, Default)]
struct RouterState {
    history: VecDeque<Navigation>,
    flash: FlashManager,
}

/// History-keeping navigator
#[derive(Debug)]
pub struct Router {
    state: Mutex<RouterState>,
    /// Maximum navigations to keep in history
    max_history: usize,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    pub fn new() -> Self {
        Self::with_max_history(50)
    }

    pub fn with_max_history(max_history: usize) -> Self {
        Self {
            state: Mutex::new(RouterState::default()),
            max_history,
        }
    }

    fn lock(&self) -> MutexGuard<'_, RouterState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn current_path(&self) -> Option<String> {
        self.lock().history.back().map(|nav| nav.path.clone())
    }

    /// Recent navigations, oldest first
    pub fn history(&self) -> Vec<Navigation> {
        self.lock().history.iter().cloned().collect()
    }

    /// The flash message on screen, formatted for display
    pub fn current_flash(&self) -> Option<String> {
        self.lock().flash.current().map(|flash| flash.display())
    }
}

impl Navigator for Router {
    fn navigate(&self, navigation: Navigation) {
        tracing::info!(
            "Navigate to {} (preserve_flash={})",
            navigation.path,
            navigation.preserve_flash
        );
        let mut state = self.lock();
        state.flash.on_navigate(navigation.preserve_flash);
        state.history.push_back(navigation);
        while state.history.len() > self.max_history {
            state.history.pop_front();
        }
    }

    fn flash(&self, level: FlashLevel, message: String) {
        self.lock().flash.push(level, message);
    }
}
