//! Bounded undo/redo history of snapshots

use std::collections::VecDeque;

/// Maximum number of undo entries kept
pub const MAX_HISTORY: usize = 100;

/// Undo stack capped at a fixed capacity plus an unbounded redo stack
///
/// When the undo stack is full, recording drops the oldest snapshot.
#[derive(Debug, Clone)]
pub struct EditHistory<T> {
    undo: VecDeque<T>,
    redo: Vec<T>,
    capacity: usize,
}

impl<T> Default for EditHistory<T> {
    fn default() -> Self {
        Self::with_capacity(MAX_HISTORY)
    }
}

impl<T> EditHistory<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            undo: VecDeque::with_capacity(capacity),
            redo: Vec::new(),
            capacity,
        }
    }

    /// Store the state before an edit and invalidate the redo stack
    pub fn record(&mut self, before: T) {
        self.push_undo(before);
        self.redo.clear();
    }

    /// Step back: returns the previous state and keeps `current` for redo
    pub fn undo(&mut self, current: T) -> Result<T, T> {
        match self.undo.pop_back() {
            Some(previous) => {
                self.redo.push(current);
                Ok(previous)
            }
            None => Err(current),
        }
    }

    /// Step forward again after an undo
    pub fn redo(&mut self, current: T) -> Result<T, T> {
        match self.redo.pop() {
            Some(next) => {
                self.push_undo(current);
                Ok(next)
            }
            None => Err(current),
        }
    }

    fn push_undo(&mut self, state: T) {
        if self.undo.len() == self.capacity {
            self.undo.pop_front();
        }
        self.undo.push_back(state);
    }

    pub fn len(&self) -> usize {
        self.undo.len()
    }

    pub fn is_empty(&self) -> bool {
        self.undo.is_empty()
    }

    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_undo_redo_cycle() {
        let mut history = EditHistory::default();
        history.record(1);
        history.record(2);

        assert_eq!(history.undo(3), Ok(2));
        assert_eq!(history.undo(2), Ok(1));
        assert_eq!(history.undo(1), Err(1));
        assert_eq!(history.redo(1), Ok(2));
        assert_eq!(history.redo(2), Ok(3));
        assert_eq!(history.redo(3), Err(3));
    }

    #[test]
    fn test_record_clears_redo() {
        let mut history = EditHistory::default();
        history.record("a");
        assert_eq!(history.undo("b"), Ok("a"));
        assert!(history.can_redo());
        history.record("a");
        assert!(!history.can_redo());
    }

    #[test]
    fn test_capacity_drops_oldest() {
        let mut history = EditHistory::default();
        for i in 0..150 {
            history.record(i);
        }
        assert_eq!(history.len(), MAX_HISTORY);

        let mut current = 150;
        let mut steps = 0;
        while let Ok(previous) = history.undo(current) {
            current = previous;
            steps += 1;
        }
        assert_eq!(steps, MAX_HISTORY);
        assert_eq!(current, 50);
    }

    #[test]
    fn test_redo_respects_capacity() {
        let mut history = EditHistory::with_capacity(2);
        history.record(0);
        history.record(1);
        assert_eq!(history.undo(2), Ok(1));
        history.record(10);
        history.record(11);
        assert_eq!(history.len(), 2);
        assert_eq!(history.capacity(), 2);
    }
}
