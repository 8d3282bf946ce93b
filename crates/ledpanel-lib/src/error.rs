//! Unified error type for the ledpanel-lib crate.
//!
//! [`PanelError`] wraps the transport error ([`TransportError`]) and the
//! domain-specific error kinds (`Config`, `Color`, `Protocol`).
//! `From` impls allow `?` to propagate across module boundaries.

use std::fmt;

use crate::transport::TransportError;

/// Unified error type for ledpanel-lib operations.
#[derive(Debug)]
pub enum PanelError {
    /// WebSocket connection or send failure.
    Transport(TransportError),
    /// Standard I/O error (config persistence, image export).
    Io(std::io::Error),
    /// Configuration validation error.
    Config(String),
    /// Color parsing error.
    Color(String),
    /// Malformed inbound or outbound message.
    Protocol(String),
}

impl fmt::Display for PanelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PanelError::Transport(e) => write!(f, "{e}"),
            PanelError::Io(e) => write!(f, "I/O error: {e}"),
            PanelError::Config(e) => write!(f, "Config error: {e}"),
            PanelError::Color(e) => write!(f, "Color error: {e}"),
            PanelError::Protocol(e) => write!(f, "Protocol error: {e}"),
        }
    }
}

impl std::error::Error for PanelError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PanelError::Transport(e) => Some(e),
            PanelError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<TransportError> for PanelError {
    fn from(e: TransportError) -> Self {
        PanelError::Transport(e)
    }
}

impl From<std::io::Error> for PanelError {
    fn from(e: std::io::Error) -> Self {
        PanelError::Io(e)
    }
}

impl From<serde_json::Error> for PanelError {
    fn from(e: serde_json::Error) -> Self {
        PanelError::Protocol(e.to_string())
    }
}

/// Crate-level Result alias using [`PanelError`].
pub type Result<T> = std::result::Result<T, PanelError>;
