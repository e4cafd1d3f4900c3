//! Error types for the custom resource framework
//!
//! Every failure a handler can hit is one of these variants. The request
//! lifecycle turns any `Err` into a FAILED response whose reason is the
//! error's `Display` output, so the messages here are what the orchestrator
//! ends up showing to the stack owner.

use crate::contract::ValidationError;
use thiserror::Error;

/// Result type alias for framework operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for custom resource handling
#[derive(Error, Debug)]
pub enum Error {
    /// Missing mandatory or unrecognized property names
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// Kerberos credentials could not be obtained
    #[error(
        "{handler} error: unable to obtain kerberos credentials. keytab: {keytab}, principal: {principal}"
    )]
    SecurityContext {
        /// Name of the handler that needed the credentials
        handler: String,
        /// Keytab path that was used
        keytab: String,
        /// Principal that was used
        principal: String,
    },

    /// A record already exists under the requested name
    #[error("DNS Entry {record} already exists.")]
    Collision {
        /// Fully qualified record name
        record: String,
    },

    /// An external command exited unsuccessfully
    ///
    /// The command's own output is the message, the orchestrator gets it
    /// verbatim as the failure reason.
    #[error("{output}")]
    ExternalCall {
        /// Command line that was run (for logging)
        command: String,
        /// Captured output of the command
        output: String,
    },

    /// `RequestType` was not Create, Update or Delete
    #[error("Unknown request type: {0}")]
    UnknownRequestType(String),

    /// No handler is registered for the `ResourceType`
    #[error("Unknown Resource Type: {0}")]
    UnknownResourceType(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors (spawning processes, reading request files)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Response delivery failed
    #[error("Callback delivery failed: {0}")]
    Callback(String),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a credential acquisition error
    pub fn security_context(
        handler: impl Into<String>,
        keytab: impl Into<String>,
        principal: impl Into<String>,
    ) -> Self {
        Self::SecurityContext {
            handler: handler.into(),
            keytab: keytab.into(),
            principal: principal.into(),
        }
    }

    /// Create a record collision error
    pub fn collision(record: impl Into<String>) -> Self {
        Self::Collision {
            record: record.into(),
        }
    }

    /// Create an external command failure
    pub fn external_call(command: impl Into<String>, output: impl Into<String>) -> Self {
        Self::ExternalCall {
            command: command.into(),
            output: output.into(),
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a callback delivery error
    pub fn callback(msg: impl Into<String>) -> Self {
        Self::Callback(msg.into())
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
