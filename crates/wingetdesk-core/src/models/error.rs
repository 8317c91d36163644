use thiserror::Error;

use crate::models::PackageAction;

pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum CoreErrorKind {
    SpawnFailure,
    Timeout,
    NonZeroExit,
    ValidationFailure,
    Config,
    Internal,
}

#[derive(Clone, Debug, Eq, PartialEq, Error)]
#[error("{kind:?}: {message}")]
pub struct CoreError {
    pub action: Option<PackageAction>,
    pub kind: CoreErrorKind,
    pub message: String,
}

impl CoreError {
    pub fn new(kind: CoreErrorKind, message: impl Into<String>) -> Self {
        Self {
            action: None,
            kind,
            message: message.into(),
        }
    }

    pub fn validation(action: PackageAction, message: impl Into<String>) -> Self {
        Self::new(CoreErrorKind::ValidationFailure, message).with_action(action)
    }

    pub fn with_action(mut self, action: PackageAction) -> Self {
        self.action = Some(action);
        self
    }
}
