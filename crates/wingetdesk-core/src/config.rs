use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::adapters::{WINGET_COMMAND, WingetCommand};
use crate::execution::command_log::DEFAULT_LOG_CAPACITY;
use crate::models::{ActionFlags, CoreError, CoreErrorKind, CoreResult};
use crate::parsing::{
    DEFAULT_FOOTER_FRAGMENTS, DEFAULT_HEADER_TOKENS, DEFAULT_SUMMARY_PREFIXES, ListingRules,
};

/// Session settings. Every field has a default, so `{}` is a valid config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub program: PathBuf,
    pub force: bool,
    pub accept_agreements: bool,
    pub command_timeout_secs: Option<u64>,
    pub log_capacity: usize,
    pub header_tokens: Vec<String>,
    pub footer_fragments: Vec<String>,
    pub version_summary_prefixes: Vec<String>,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        let flags = ActionFlags::default();
        Self {
            program: PathBuf::from(WINGET_COMMAND),
            force: flags.force,
            accept_agreements: flags.accept_agreements,
            command_timeout_secs: None,
            log_capacity: DEFAULT_LOG_CAPACITY,
            header_tokens: owned(DEFAULT_HEADER_TOKENS),
            footer_fragments: owned(DEFAULT_FOOTER_FRAGMENTS),
            version_summary_prefixes: owned(DEFAULT_SUMMARY_PREFIXES),
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> CoreResult<Self> {
        let content = fs::read_to_string(path).map_err(|error| {
            CoreError::new(
                CoreErrorKind::Config,
                format!("failed to read config '{}': {error}", path.display()),
            )
        })?;
        Self::from_json_str(&content)
    }

    pub fn from_json_str(json: &str) -> CoreResult<Self> {
        let config: Self = serde_json::from_str(json).map_err(|error| {
            CoreError::new(CoreErrorKind::Config, format!("invalid config: {error}"))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> CoreResult<()> {
        if self.program.as_os_str().is_empty() {
            return Err(config_error("program must not be empty"));
        }
        if self.command_timeout_secs == Some(0) {
            return Err(config_error("command_timeout_secs must be greater than zero"));
        }
        if self.log_capacity == 0 {
            return Err(config_error("log_capacity must be greater than zero"));
        }
        if self.header_tokens.iter().all(|token| token.trim().is_empty()) {
            return Err(config_error("header_tokens must name at least one token"));
        }
        Ok(())
    }

    pub fn flags(&self) -> ActionFlags {
        ActionFlags {
            force: self.force,
            accept_agreements: self.accept_agreements,
        }
    }

    pub fn command_timeout(&self) -> Option<Duration> {
        self.command_timeout_secs.map(Duration::from_secs)
    }

    pub fn winget_command(&self) -> WingetCommand {
        WingetCommand::new(self.program.clone(), self.command_timeout())
    }

    pub fn listing_rules(&self) -> ListingRules {
        ListingRules {
            header_tokens: self
                .header_tokens
                .iter()
                .filter(|token| !token.trim().is_empty())
                .cloned()
                .collect(),
            footer_fragments: self.footer_fragments.clone(),
        }
    }
}

fn owned(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

fn config_error(message: &str) -> CoreError {
    CoreError::new(CoreErrorKind::Config, message)
}
