//! Bounded undo history
//!
//! Pushes grow from the back, overflow evicts from the front, and undo pops
//! from the back.

use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

/// Maximum number of labeling actions that can be undone
pub const MAX_HISTORY: usize = 10;

/// Binary label applied by the reviewer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    True,
    False,
}

impl Label {
    pub fn as_str(&self) -> &'static str {
        match self {
            Label::True => "true",
            Label::False => "false",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Label {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "true" => Ok(Label::True),
            "false" => Ok(Label::False),
            other => Err(Error::InvalidInput(format!(
                "Label must be \"true\" or \"false\", got {:?}",
                other
            ))),
        }
    }
}

/// One recorded labeling action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UndoEntry {
    pub path: String,
    pub label: Label,
}

/// Most recent labeling actions, oldest first
#[derive(Debug)]
pub struct UndoStack {
    entries: VecDeque<UndoEntry>,
    capacity: usize,
}

impl UndoStack {
    /// Create an empty stack holding at most [`MAX_HISTORY`] entries
    pub fn new() -> Self {
        Self::with_capacity(MAX_HISTORY)
    }

    /// Create an empty stack with a custom bound (clamped to at least 1)
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Push an action, silently evicting the oldest on overflow
    pub fn record(&mut self, path: impl Into<String>, label: Label) {
        self.entries.push_back(UndoEntry {
            path: path.into(),
            label,
        });
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    /// Push back an entry that was popped but could not be undone
    pub(crate) fn restore(&mut self, entry: UndoEntry) {
        self.record(entry.path, entry.label);
    }

    /// Remove and return the most recent action
    pub fn pop(&mut self) -> Option<UndoEntry> {
        self.entries.pop_back()
    }

    /// Most recent action without removing it
    pub fn peek(&self) -> Option<&UndoEntry> {
        self.entries.back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Entries from oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = &UndoEntry> {
        self.entries.iter()
    }
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_parsing() {
        assert_eq!("true".parse::<Label>().unwrap(), Label::True);
        assert_eq!("false".parse::<Label>().unwrap(), Label::False);
        assert!(matches!("True".parse::<Label>(), Err(Error::InvalidInput(_))));
        assert!(matches!("maybe".parse::<Label>(), Err(Error::InvalidInput(_))));
        assert_eq!(Label::True.to_string(), "true");
    }

    #[test]
    fn test_label_serde_uses_lowercase_strings() {
        assert_eq!(serde_json::to_string(&Label::False).unwrap(), "\"false\"");
        let label: Label = serde_json::from_str("\"true\"").unwrap();
        assert_eq!(label, Label::True);
    }

    #[test]
    fn test_never_exceeds_capacity() {
        let mut stack = UndoStack::new();
        for i in 0..100 {
            stack.record(format!("{}.jpg", i), Label::False);
            assert!(stack.len() <= MAX_HISTORY);
        }
        assert_eq!(stack.len(), MAX_HISTORY);
    }

    #[test]
    fn test_keeps_last_ten_in_push_order() {
        let mut stack = UndoStack::new();
        for i in 0..15 {
            let label = if i % 2 == 0 { Label::True } else { Label::False };
            stack.record(format!("{}.jpg", i), label);
        }

        let paths: Vec<&str> = stack.iter().map(|e| e.path.as_str()).collect();
        let expected: Vec<String> = (5..15).map(|i| format!("{}.jpg", i)).collect();
        assert_eq!(paths, expected);
    }

    #[test]
    fn test_pop_is_lifo() {
        let mut stack = UndoStack::new();
        stack.record("a.jpg", Label::True);
        stack.record("b.jpg", Label::False);

        assert_eq!(stack.peek().unwrap().path, "b.jpg");
        assert_eq!(
            stack.pop(),
            Some(UndoEntry { path: "b.jpg".to_string(), label: Label::False })
        );
        assert_eq!(stack.pop().unwrap().path, "a.jpg");
        assert!(stack.pop().is_none());
        assert!(stack.is_empty());
    }

    #[test]
    fn test_zero_capacity_clamped() {
        let mut stack = UndoStack::with_capacity(0);
        stack.record("a.jpg", Label::True);
        stack.record("b.jpg", Label::True);
        assert_eq!(stack.capacity(), 1);
        assert_eq!(stack.len(), 1);
        assert_eq!(stack.peek().unwrap().path, "b.jpg");
    }
}
