//! # Run Pipeline
//!
//! Lifecycle of a single assistant run as reported to clients.

use std::fmt;

/// What the assistant is doing right now
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CurrentTask {
    /// No run has happened yet
    #[default]
    Initializing,
    /// Working on a query
    Processing(String),
    Completed,
    Stopped,
}

impl CurrentTask {
    pub fn is_running(&self) -> bool {
        matches!(self, CurrentTask::Processing(_))
    }

    /// Finish a run. A stop request wins over completion.
    pub fn finish(&mut self) {
        if !matches!(self, CurrentTask::Stopped) {
            *self = CurrentTask::Completed;
        }
    }
}

impl fmt::Display for CurrentTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CurrentTask::Initializing => f.write_str("Initializing..."),
            CurrentTask::Processing(query) => write!(f, "Processing query: {}", query),
            CurrentTask::Completed => f.write_str("Completed"),
            CurrentTask::Stopped => f.write_str("Stopped by user"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_strings() {
        assert_eq!(CurrentTask::default().to_string(), "Initializing...");
        assert_eq!(
            CurrentTask::Processing("cheap flights".into()).to_string(),
            "Processing query: cheap flights"
        );
        assert_eq!(CurrentTask::Stopped.to_string(), "Stopped by user");
    }

    #[test]
    fn test_only_processing_is_running() {
        assert!(CurrentTask::Processing(String::new()).is_running());
        assert!(!CurrentTask::Initializing.is_running());
        assert!(!CurrentTask::Completed.is_running());
        assert!(!CurrentTask::Stopped.is_running());
    }

    #[test]
    fn test_finish_keeps_stop() {
        let mut task = CurrentTask::Processing("x".into());
        task.finish();
        assert_eq!(task, CurrentTask::Completed);

        let mut task = CurrentTask::Stopped;
        task.finish();
        assert_eq!(task, CurrentTask::Stopped);
    }
}
