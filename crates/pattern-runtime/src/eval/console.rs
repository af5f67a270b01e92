// Console sink for script diagnostics (print, warnings, env misses)

use std::collections::VecDeque;

/// Severity level for console entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

/// A single console entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
}

/// Accumulates console output of one evaluation, evicting the oldest entry
/// once `max_entries` is reached. Every entry is also forwarded to `tracing`.
#[derive(Debug)]
pub struct Console {
    entries: VecDeque<LogEntry>,
    max_entries: usize,
}

impl Console {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            max_entries: max_entries.max(1),
        }
    }

    pub fn log(&mut self, level: LogLevel, message: impl Into<String>) {
        let message = message.into();
        match level {
            LogLevel::Debug => tracing::debug!(target: "pattern_runtime::console", "{}", message),
            LogLevel::Info => tracing::info!(target: "pattern_runtime::console", "{}", message),
            LogLevel::Warning => tracing::warn!(target: "pattern_runtime::console", "{}", message),
            LogLevel::Error => tracing::error!(target: "pattern_runtime::console", "{}", message),
        }
        if self.entries.len() >= self.max_entries {
            self.entries.pop_front();
        }
        self.entries.push_back(LogEntry { level, message });
    }

    pub fn entries(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    /// Messages logged at exactly `level`, oldest first
    pub fn messages(&self, level: LogLevel) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|e| e.level == level)
            .map(|e| e.message.as_str())
            .collect()
    }

    /// Take all entries, leaving the console empty
    pub fn drain(&mut self) -> Vec<LogEntry> {
        self.entries.drain(..).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::new(10_000)
    }
}
