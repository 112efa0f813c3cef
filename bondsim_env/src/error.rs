//! Error types for the BondSim environment abstraction.

use thiserror::Error;

/// Errors that can occur between an initiator and its run worker.
#[derive(Debug, Error)]
pub enum EnvError {
    /// The worker's channel is closed (terminated or never started)
    #[error("Channel closed: {0}")]
    ChannelClosed(String),
}

impl EnvError {
    /// Creates a channel-closed error.
    pub fn closed(what: impl Into<String>) -> Self {
        Self::ChannelClosed(what.into())
    }
}
