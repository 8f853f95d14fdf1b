//! Flash Messages
//!
//! One-shot messages shown after a form submission ("Created account acc1").
//! A flash survives exactly the navigations that ask to preserve it and is
//! dropped by the first one that does not.

use std::collections::VecDeque;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Severity of a flash message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashLevel {
    Success,
    Error,
}

impl FlashLevel {
    pub fn icon(&self) -> &'static str {
        match self {
            Self::Success => "✓",
            Self::Error => "✗",
        }
    }
}

/// A single flash message
#[derive(Debug, Clone)]
pub struct FlashMessage {
    pub id: Uuid,
    pub level: FlashLevel,
    pub message: String,
    pub created_at: Instant,
}

impl FlashMessage {
    pub fn new(level: FlashLevel, message: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            level,
            message,
            created_at: Instant::now(),
        }
    }

    /// Age of the message
    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }

    /// Format for display
    pub fn display(&self) -> String {
        format!("{} {}", self.level.icon(), self.message)
    }
}

/// Flash manager
#[derive(Debug)]
pub struct FlashManager {
    /// The message currently on screen
    current: Option<FlashMessage>,
    /// Past messages (recent first)
    pub history: VecDeque<FlashMessage>,
    /// Maximum messages to keep in history
    pub max_history: usize,
}

impl Default for FlashManager {
    fn default() -> Self {
        Self::new()
    }
}

impl FlashManager {
    pub fn new() -> Self {
        Self {
            current: None,
            history: VecDeque::new(),
            max_history: 50,
        }
    }

    /// Show a new message, replacing the current one
    pub fn push(&mut self, level: FlashLevel, message: String) -> Uuid {
        let flash = FlashMessage::new(level, message);
        let id = flash.id;
        self.history.push_front(flash.clone());
        self.current = Some(flash);
        self.trim_history();
        id
    }

    /// Apply a navigation; drops the current message unless preserved
    pub fn on_navigate(&mut self, preserve: bool) {
        if !preserve {
            if let Some(dropped) = self.current.take() {
                tracing::debug!("Dropping flash {} after {:?}", dropped.id, dropped.age());
            }
        }
    }

    pub fn current(&self) -> Option<&FlashMessage> {
        self.current.as_ref()
    }

    fn trim_history(&mut self) {
        while self.history.len() > self.max_history {
            self.history.pop_back();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flash_survives_preserving_navigation() {
        let mut manager = FlashManager::new();
        manager.push(FlashLevel::Success, "Created account acc1".to_string());

        manager.on_navigate(true);
        assert_eq!(
            manager.current().map(FlashMessage::display),
            Some("✓ Created account acc1".to_string())
        );

        manager.on_navigate(false);
        assert!(manager.current().is_none());
        assert_eq!(manager.history.len(), 1);
    }

    #[test]
    fn test_history_is_trimmed() {
        let mut manager = FlashManager::new();
        manager.max_history = 2;
        for i in 0..5 {
            manager.push(FlashLevel::Error, format!("failure {}", i));
        }

        assert_eq!(manager.history.len(), 2);
        assert_eq!(manager.history[0].message, "failure 4");
        assert_eq!(manager.current().map(|f| f.level), Some(FlashLevel::Error));
    }
}
