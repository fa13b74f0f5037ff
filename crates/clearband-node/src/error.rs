//! Error types for clearband-node.
//!
//! Every condition here resolves at the node boundary: validation and
//! mode-mismatch failures are returned to the caller as explicit outcomes
//! and never escape into unrelated subsystems. Nothing in this crate is
//! fatal to the process.

use clearband_grant::GrantStatus;
use clearband_radio::{ConfigError, OperationMode, RadioError};
use thiserror::Error;

/// Result type for node operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while driving a node.
#[derive(Debug, Error)]
pub enum Error {
    /// Radio creation refused: a physical parameter is nonsensical.
    /// No controller is created and no state changes.
    #[error("invalid radio configuration: {0}")]
    InvalidConfig(#[from] ConfigError),

    /// The command is not valid for the node's current operation mode.
    /// No state changes.
    #[error("command {command} not valid for operation mode {mode}")]
    InvalidCommand {
        command: &'static str,
        mode: String,
    },

    /// Radio creation is a once-per-node operation.
    #[error("node {identifier} already has a {mode} radio")]
    RadioExists {
        identifier: String,
        mode: OperationMode,
    },

    /// The hardware layer refused to create a controller.
    #[error(transparent)]
    Radio(#[from] RadioError),

    /// Heartbeat supervision may only be armed while a grant is live.
    #[error("cannot arm heartbeat supervisor while grant is {status}")]
    GrantNotLive { status: GrantStatus },
}

impl Error {
    /// Invalid-command condition for a node in `mode` (or with no radio yet).
    pub(crate) fn invalid_command(command: &'static str, mode: Option<OperationMode>) -> Self {
        Self::InvalidCommand {
            command,
            mode: mode.map_or_else(|| "unset".to_string(), |m| m.to_string()),
        }
    }
}
