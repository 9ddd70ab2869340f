//! # Notification Sink
//!
//! Bounded, newest-first list of activity messages.
//!
//! The sink is session-local: it is never serialized and starts empty on
//! every open.

use crate::primitives::NOTIFICATION_CAPACITY;
use std::collections::VecDeque;

#[derive(Debug, Clone, Default)]
pub struct NotificationSink {
    messages: VecDeque<String>,
}

impl NotificationSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepend `message`, dropping the oldest beyond capacity.
    pub fn notify(&mut self, message: impl Into<String>) {
        self.messages.push_front(message.into());
        self.messages.truncate(NOTIFICATION_CAPACITY);
    }

    /// Messages, newest first.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.messages.iter().map(String::as_str)
    }

    #[must_use]
    pub fn to_vec(&self) -> Vec<String> {
        self.messages.iter().cloned().collect()
    }

    #[must_use]
    pub fn latest(&self) -> Option<&str> {
        self.messages.front().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_five_newest_first() {
        let mut sink = NotificationSink::new();
        for i in 0..8 {
            sink.notify(format!("message {i}"));
        }
        assert_eq!(sink.len(), NOTIFICATION_CAPACITY);
        assert_eq!(sink.latest(), Some("message 7"));
        let all: Vec<&str> = sink.iter().collect();
        assert_eq!(all.last().copied(), Some("message 3"));
    }

    #[test]
    fn clear_empties() {
        let mut sink = NotificationSink::new();
        sink.notify("one");
        sink.clear();
        assert!(sink.is_empty());
    }
}
