//! Input/output history for a command session

use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct HistoryRecord {
    /// Commands as typed, oldest first
    inputs: Vec<String>,
    /// Captured error output of finished commands, oldest first
    outputs: Vec<String>,
    /// Position while browsing inputs (None = not browsing)
    cursor: Option<usize>,
}

/// Append-only log of user inputs and the error output they produced.
///
/// The two logs are parallel but not the same length: `cd` never records
/// output.
#[derive(Debug, Default)]
pub struct HistoryCache {
    record: Mutex<HistoryRecord>,
}

impl HistoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HistoryRecord> {
        self.record.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record a command as entered. Ends any history browsing.
    pub fn record_input(&self, command: impl Into<String>) {
        let mut record = self.lock();
        record.inputs.push(command.into());
        record.cursor = None;
    }

    /// Record the captured output of a finished command
    pub fn record_output(&self, output: impl Into<String>) {
        self.lock().outputs.push(output.into());
    }

    pub fn inputs(&self) -> Vec<String> {
        self.lock().inputs.clone()
    }

    pub fn outputs(&self) -> Vec<String> {
        self.lock().outputs.clone()
    }

    pub fn input_count(&self) -> usize {
        self.lock().inputs.len()
    }

    pub fn output_count(&self) -> usize {
        self.lock().outputs.len()
    }

    /// Most recent input, if any
    pub fn last_input(&self) -> Option<String> {
        self.lock().inputs.last().cloned()
    }

    /// Most recent output, if any
    pub fn last_output(&self) -> Option<String> {
        self.lock().outputs.last().cloned()
    }

    /// Up to `count` inputs, newest first
    pub fn recent_inputs(&self, count: usize) -> Vec<String> {
        self.lock().inputs.iter().rev().take(count).cloned().collect()
    }

    /// Step back to an older input, wrapping from the oldest to the newest
    pub fn previous_command(&self) -> Option<String> {
        let mut record = self.lock();
        let last = record.inputs.len().checked_sub(1)?;

        let position = match record.cursor {
            None | Some(0) => last,
            Some(pos) => pos - 1,
        };
        record.cursor = Some(position);
        record.inputs.get(position).cloned()
    }

    /// Step forward to a newer input, wrapping from the newest to the oldest
    pub fn next_command(&self) -> Option<String> {
        let mut record = self.lock();
        let last = record.inputs.len().checked_sub(1)?;

        let position = match record.cursor {
            Some(pos) if pos < last => pos + 1,
            _ => 0,
        };
        record.cursor = Some(position);
        record.inputs.get(position).cloned()
    }

    /// Drop both logs
    pub fn clear(&self) {
        let mut record = self.lock();
        record.inputs.clear();
        record.outputs.clear();
        record.cursor = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logs_are_independent() {
        let history = HistoryCache::new();
        history.record_input("cd /tmp");
        history.record_input("ls");
        history.record_output("");

        assert_eq!(history.inputs(), vec!["cd /tmp", "ls"]);
        assert_eq!(history.outputs(), vec![""]);
        assert_eq!(history.last_input().as_deref(), Some("ls"));
    }

    #[test]
    fn test_clear_empties_both_logs() {
        let history = HistoryCache::new();
        history.record_input("false");
        history.record_output("oops\n");
        history.clear();

        assert_eq!(history.input_count(), 0);
        assert_eq!(history.output_count(), 0);
        assert!(history.last_input().is_none());
        assert!(history.last_output().is_none());
    }

    #[test]
    fn test_browse_back_and_forth() {
        let history = HistoryCache::new();
        history.record_input("one");
        history.record_input("two");
        history.record_input("three");

        assert_eq!(history.previous_command().as_deref(), Some("three"));
        assert_eq!(history.previous_command().as_deref(), Some("two"));
        assert_eq!(history.previous_command().as_deref(), Some("one"));
        // Wraps around to the newest
        assert_eq!(history.previous_command().as_deref(), Some("three"));

        assert_eq!(history.next_command().as_deref(), Some("one"));
        assert_eq!(history.next_command().as_deref(), Some("two"));
    }

    #[test]
    fn test_new_input_resets_browsing() {
        let history = HistoryCache::new();
        history.record_input("one");
        history.record_input("two");
        assert_eq!(history.previous_command().as_deref(), Some("two"));
        assert_eq!(history.previous_command().as_deref(), Some("one"));

        history.record_input("three");
        assert_eq!(history.previous_command().as_deref(), Some("three"));
    }

    #[test]
    fn test_browse_empty_history() {
        let history = HistoryCache::new();
        assert!(history.previous_command().is_none());
        assert!(history.next_command().is_none());
    }

    #[test]
    fn test_recent_inputs_newest_first() {
        let history = HistoryCache::new();
        for command in ["a", "b", "c"] {
            history.record_input(command);
        }

        assert_eq!(history.recent_inputs(2), vec!["c", "b"]);
        assert_eq!(history.recent_inputs(10), vec!["c", "b", "a"]);
        assert!(history.recent_inputs(0).is_empty());
    }
}
