use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a single fixture could not be fetched. Always local to one item.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("unexpected status {0}")]
    Status(u16),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("resource not found")]
    NotFound,
    #[error("transport error: {0}")]
    Transport(String),
}

impl FetchError {
    pub fn transport(err: impl std::fmt::Display) -> Self {
        FetchError::Transport(err.to_string())
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, FetchError::Timeout(_))
    }
}

/// Error raised by a processor. Serializes to the structure shown as the
/// "actual" side of a failed comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(rename_all = "camelCase")]
#[error("{message}")]
pub struct ProcessError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_number: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,
}

impl ProcessError {
    pub fn new(message: impl Into<String>) -> Self {
        ProcessError {
            message: message.into(),
            index: None,
            line_number: None,
            column: None,
        }
    }

    pub fn at(mut self, index: usize, line_number: usize, column: usize) -> Self {
        self.index = Some(index);
        self.line_number = Some(line_number);
        self.column = Some(column);
        self
    }
}
