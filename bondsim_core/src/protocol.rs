//! Message protocol between a run worker and whatever initiated it.
//!
//! # Message Flow
//!
//! ```text
//! Initiator                         Worker
//!     |-- start {params} ------------->|
//!     |-- pause / resume / cancel ---->|   (checked at pair boundaries)
//!     |<---------- progress {..} ------|   (pair 0, 50, 100, ... and last)
//!     |<---------- complete {summary} -|   or
//!     |<---------- error {message} ----|
//! ```
//!
//! Both directions are JSON objects tagged by `type`. Inbound messages with
//! an unknown tag are ignored rather than reported.

use crate::error::EngineError;
use crate::params::RunParams;
use crate::types::{PairResult, RunSummary};
use serde::{Deserialize, Serialize};

/// Inbound command to a run worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Command {
    /// Begin a new run, abandoning any active one
    Start { params: RunParams },
    /// Set the cooperative pause flag
    Pause,
    /// Clear the cooperative pause flag
    Resume,
    /// Set the cooperative cancel flag
    Cancel,
}

impl Command {
    /// Decodes an inbound JSON message.
    ///
    /// Returns `Ok(None)` for anything that is not one of the four commands;
    /// such messages are dropped without an error. A `start` whose params
    /// cannot be decoded is a protocol error rather than an unknown message.
    pub fn decode(json: &str) -> Result<Option<Command>, EngineError> {
        let value: serde_json::Value = match serde_json::from_str(json) {
            Ok(value) => value,
            Err(_) => return Ok(None),
        };

        match value.get("type").and_then(|tag| tag.as_str()) {
            Some("start") => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| EngineError::protocol(format!("invalid start params: {}", e))),
            Some("pause" | "resume" | "cancel") => Ok(serde_json::from_value(value).ok()),
            _ => Ok(None),
        }
    }

    /// Encodes this command as JSON.
    pub fn encode(&self) -> Result<String, EngineError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Returns the wire tag.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Start { .. } => "start",
            Command::Pause => "pause",
            Command::Resume => "resume",
            Command::Cancel => "cancel",
        }
    }
}

/// Outbound notification from a run worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Notification {
    /// Cumulative progress plus the single result of the reporting pair
    Progress {
        completed: usize,
        total: usize,
        result: PairResult,
    },
    /// Final summary; emitted once after every pair was processed
    Complete { summary: RunSummary },
    /// Unhandled failure; nothing follows it
    Error { message: String },
}

impl Notification {
    /// Creates an error notification from anything displayable.
    pub fn error(err: impl std::fmt::Display) -> Self {
        Notification::Error {
            message: err.to_string(),
        }
    }

    /// True for `complete` and `error`, after which the run emits nothing.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Notification::Complete { .. } | Notification::Error { .. })
    }

    /// Encodes this notification as JSON.
    pub fn encode(&self) -> Result<String, EngineError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decodes a notification from JSON.
    pub fn decode(json: &str) -> Result<Notification, EngineError> {
        Ok(serde_json::from_str(json)?)
    }
}
