//! Undo/redo management for editor operations.
//!
//! Provides:
//! - `UndoManager` trait for abstracting undo implementations
//! - `History<T>` - bounded snapshot stacks that swap state in and out

use std::mem;

/// Trait for managing undo/redo operations.
///
/// Implementations must actually perform the undo/redo, not just track state.
/// [`BlockList`](crate::blocks::BlockList) implements it over a `History` of
/// block sequences.
pub trait UndoManager {
    /// Check if undo is available.
    fn can_undo(&self) -> bool;

    /// Check if redo is available.
    fn can_redo(&self) -> bool;

    /// Perform undo. Returns true if successful.
    fn undo(&mut self) -> bool;

    /// Perform redo. Returns true if successful.
    fn redo(&mut self) -> bool;

    /// Clear all undo/redo history.
    fn clear_history(&mut self);
}

/// Snapshot history.
///
/// Callers record the state as it was *before* a modification. Undo swaps the
/// newest snapshot into the live state and keeps the replaced state for redo.
#[derive(Debug, Clone)]
pub struct History<T> {
    undo_stack: Vec<T>,
    redo_stack: Vec<T>,
    max_steps: usize,
}

impl<T> Default for History<T> {
    fn default() -> Self {
        Self::new(100)
    }
}

impl<T> History<T> {
    pub fn new(max_steps: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_steps,
        }
    }

    /// Record the state preceding an edit.
    pub fn record(&mut self, before: T) {
        // Clear redo stack on new edit
        self.redo_stack.clear();
        if self.max_steps == 0 {
            return;
        }
        self.undo_stack.push(before);
        if self.undo_stack.len() > self.max_steps {
            let excess = self.undo_stack.len() - self.max_steps;
            self.undo_stack.drain(..excess);
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo(&mut self, current: &mut T) -> bool {
        let Some(previous) = self.undo_stack.pop() else {
            return false;
        };
        self.redo_stack.push(mem::replace(current, previous));
        true
    }

    pub fn redo(&mut self, current: &mut T) -> bool {
        let Some(next) = self.redo_stack.pop() else {
            return false;
        };
        self.undo_stack.push(mem::replace(current, next));
        true
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edit(history: &mut History<String>, state: &mut String, text: &str) {
        history.record(state.clone());
        state.push_str(text);
    }

    #[test]
    fn test_undo_redo_cycle() {
        let mut history = History::new(100);
        let mut state = String::from("hello");

        edit(&mut history, &mut state, " world");
        assert!(history.can_undo());

        assert!(history.undo(&mut state));
        assert_eq!(state, "hello");
        assert!(!history.can_undo());
        assert!(history.can_redo());

        assert!(history.redo(&mut state));
        assert_eq!(state, "hello world");
        assert!(!history.can_redo());
    }

    #[test]
    fn test_new_edit_clears_redo() {
        let mut history = History::new(100);
        let mut state = String::from("abc");

        edit(&mut history, &mut state, "d");
        assert!(history.undo(&mut state));
        assert!(history.can_redo());

        edit(&mut history, &mut state, "e");
        assert!(!history.can_redo());
        assert_eq!(state, "abce");
    }

    #[test]
    fn test_max_steps() {
        let mut history = History::new(3);
        let mut state = String::new();

        for c in ["a", "b", "c", "d"] {
            edit(&mut history, &mut state, c);
        }

        assert!(history.undo(&mut state));
        assert!(history.undo(&mut state));
        assert!(history.undo(&mut state));
        assert!(!history.undo(&mut state)); // first edit was evicted
        assert_eq!(state, "a");
    }

    #[test]
    fn test_zero_depth_records_nothing() {
        let mut history = History::new(0);
        let mut state = String::new();
        edit(&mut history, &mut state, "a");
        assert!(!history.can_undo());
    }
}
