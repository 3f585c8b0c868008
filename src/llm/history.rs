use std::collections::VecDeque;

use super::Message;

/// Caller-owned conversation memory with a fixed number of turns.
///
/// A turn is one user message plus the assistant's reply. When full, the
/// oldest turn is dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct History {
    turns: VecDeque<(String, String)>,
    capacity: usize,
}

impl History {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            turns: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, user: impl Into<String>, assistant: impl Into<String>) {
        if self.capacity == 0 {
            return;
        }
        while self.turns.len() >= self.capacity {
            self.turns.pop_front();
        }
        self.turns.push_back((user.into(), assistant.into()));
    }

    /// Flatten the stored turns into alternating user/assistant messages.
    pub fn messages(&self) -> Vec<Message> {
        self.turns
            .iter()
            .flat_map(|(u, a)| [Message::user(u.as_str()), Message::assistant(a.as_str())])
            .collect()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }
}

impl Default for History {
    fn default() -> Self {
        Self::with_capacity(10)
    }
}
