use std::collections::VecDeque;
use std::time::SystemTime;

use crate::execution::CommandOutcome;
use crate::models::CommandLogEntry;

pub const DEFAULT_LOG_CAPACITY: usize = 512;
const MAX_STREAM_BYTES: usize = 128 * 1024;

/// Bounded, in-memory record of every command the session has run.
///
/// Once full, the oldest entry is evicted.
#[derive(Debug)]
pub struct CommandLog {
    entries: VecDeque<CommandLogEntry>,
    capacity: usize,
}

impl Default for CommandLog {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_LOG_CAPACITY)
    }
}

impl CommandLog {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn record(&mut self, description: &str, outcome: &CommandOutcome) -> &CommandLogEntry {
        if self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }

        self.entries.push_back(CommandLogEntry {
            description: description.to_string(),
            command_line: outcome.command_line.clone(),
            exit_code: outcome.exit_code,
            stdout: tail_window(&outcome.stdout),
            stderr: tail_window(&outcome.stderr),
            recorded_at: SystemTime::now(),
        });

        &self.entries[self.entries.len() - 1]
    }

    pub fn entries(&self) -> impl Iterator<Item = &CommandLogEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn render(&self) -> String {
        self.entries.iter().map(CommandLogEntry::render).collect()
    }
}

fn tail_window(text: &str) -> String {
    if text.len() <= MAX_STREAM_BYTES {
        return text.to_string();
    }

    let mut start = text.len() - MAX_STREAM_BYTES;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    text[start..].to_string()
}
