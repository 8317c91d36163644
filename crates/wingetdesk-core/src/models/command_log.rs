use std::time::SystemTime;

use serde::{Deserialize, Serialize};

/// A single external-command invocation as shown in the command log.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct CommandLogEntry {
    pub description: String,
    pub command_line: String,
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub recorded_at: SystemTime,
}

impl CommandLogEntry {
    pub fn render(&self) -> String {
        format!(
            "{}\nExecuting command: {}\nReturn code: {}\nStandard Output:\n{}\nStandard Error:\n{}\n",
            self.description, self.command_line, self.exit_code, self.stdout, self.stderr
        )
    }
}
