//! Error handling for Neon Garden
//!
//! Network and decode failures are contained by the worker that hits them;
//! these variants exist so that containment can log something meaningful.

use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for Neon Garden operations
pub type Result<T> = std::result::Result<T, GardenError>;

/// Main error type for Neon Garden operations
#[derive(Error, Debug)]
pub enum GardenError {
    // Protocol Errors
    #[error("Unknown command type: {tag}")]
    UnknownCommand { tag: String },

    #[error("Unknown adjustable parameter: {name}")]
    UnknownParameter { name: String },

    #[error("Invalid value for '{param}': expected {expected}")]
    InvalidParameterValue {
        param: &'static str,
        expected: &'static str,
    },

    // Layer Errors
    #[error("Layer {index} replacement rejected: {reason}")]
    LayerMismatch { index: usize, reason: String },

    // Session Errors
    #[error("Invalid role '{input}' (expected 'host' or 'client')")]
    InvalidRole { input: String },

    #[error("Invalid host address: {input}")]
    InvalidAddress { input: String },

    #[error("Unrecognised control input: {input}")]
    InvalidControl { input: String },

    // Transport Errors
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to connect to {addr}: {source}")]
    Connect {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Send to {peer} failed: {source}")]
    SendFailed {
        peer: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Not connected to a host")]
    NotConnected,

    // Configuration Errors
    #[error("Failed to read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    // Hardware Errors
    #[error("{device} input unavailable: {reason}")]
    DeviceUnavailable { device: &'static str, reason: String },

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization Errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl GardenError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            GardenError::UnknownCommand { .. } => "UNKNOWN_COMMAND",
            GardenError::UnknownParameter { .. } => "UNKNOWN_PARAMETER",
            GardenError::InvalidParameterValue { .. } => "INVALID_PARAMETER_VALUE",
            GardenError::LayerMismatch { .. } => "LAYER_MISMATCH",
            GardenError::InvalidRole { .. } => "INVALID_ROLE",
            GardenError::InvalidAddress { .. } => "INVALID_ADDRESS",
            GardenError::InvalidControl { .. } => "INVALID_CONTROL",
            GardenError::Bind { .. } => "BIND_FAILED",
            GardenError::Connect { .. } => "CONNECT_FAILED",
            GardenError::SendFailed { .. } => "SEND_FAILED",
            GardenError::NotConnected => "NOT_CONNECTED",
            GardenError::ConfigRead { .. } => "CONFIG_READ",
            GardenError::InvalidConfig { .. } => "INVALID_CONFIG",
            GardenError::DeviceUnavailable { .. } => "DEVICE_UNAVAILABLE",
            GardenError::Io(_) => "IO_ERROR",
            GardenError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Check if the session can carry on after this error.
    ///
    /// Per-message and per-peer failures are recoverable; startup failures
    /// (bad role, bad config, unbindable port) are not.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            GardenError::UnknownCommand { .. }
                | GardenError::UnknownParameter { .. }
                | GardenError::InvalidParameterValue { .. }
                | GardenError::SendFailed { .. }
                | GardenError::NotConnected
                | GardenError::InvalidControl { .. }
                | GardenError::DeviceUnavailable { .. }
                | GardenError::Serialization(_)
        )
    }

    /// Returns a user-facing recovery suggestion.
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            GardenError::InvalidRole { .. } => Some("Start again and choose 'host' or 'client'."),
            GardenError::InvalidAddress { .. } => {
                Some("Enter the host as an IPv4 address, optionally with ':port'.")
            }
            GardenError::Bind { .. } => {
                Some("Another garden may already be hosting on this machine; try --port.")
            }
            GardenError::Connect { .. } => {
                Some("Check that the host is running and reachable on the LAN.")
            }
            GardenError::ConfigRead { .. } | GardenError::InvalidConfig { .. } => {
                Some("Fix the config file or remove --config to use defaults.")
            }
            GardenError::DeviceUnavailable { .. } => {
                Some("The garden keeps running without this input.")
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = GardenError::UnknownParameter {
            name: "shimmer".to_string(),
        };
        assert_eq!(err.error_code(), "UNKNOWN_PARAMETER");
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_startup_errors_are_fatal() {
        let err = GardenError::InvalidRole {
            input: "spectator".to_string(),
        };
        assert!(!err.is_recoverable());
        assert!(err.recovery_suggestion().is_some());
        assert!(err.to_string().contains("spectator"));
    }
}
