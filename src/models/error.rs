// Network Manager - Error Types
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Shared error types for the dispatcher.

use thiserror::Error;

use super::action::DispatcherAction;

/// Result type alias for dispatcher operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for dispatcher operations.
#[derive(Debug, Error)]
pub enum Error {
    // ========================================
    // Contract Violations
    // ========================================
    #[error("Action '{0}' requires a device")]
    MissingDevice(DispatcherAction),

    #[error("Action '{0}' requires a VPN IPv4 configuration")]
    MissingVpnIp4Config(DispatcherAction),

    #[error("Unknown dispatcher request: {0}")]
    UnknownRequest(u64),

    #[error("Dispatcher request already registered: {0}")]
    DuplicateRequest(u64),

    // ========================================
    // Transport Errors
    // ========================================
    #[error("D-Bus error: {0}")]
    Dbus(String),

    #[error("Dispatcher transport failed: {0}")]
    Transport(String),

    #[error("Dispatcher call timed out after {0} seconds")]
    Timeout(u64),

    #[error("Malformed dispatcher reply: {0}")]
    ReplyMalformed(String),

    // ========================================
    // Credential Errors
    // ========================================
    #[error("Failed to encode credential: {0}")]
    CredentialEncode(&'static str),

    /// Decoding never reports which field failed, nor any partial value.
    #[error("Failed to decode credential")]
    CredentialDecode,

    #[error("Failed to hash key: {0}")]
    KeyHash(String),

    // ========================================
    // Configuration Errors
    // ========================================
    #[error("Failed to read configuration: {0}")]
    ConfigReadFailed(String),

    #[error("Failed to parse configuration: {0}")]
    ConfigParseFailed(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // ========================================
    // System Errors
    // ========================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Check if this error is a caller contract violation.
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            Self::MissingDevice(_)
                | Self::MissingVpnIp4Config(_)
                | Self::UnknownRequest(_)
                | Self::DuplicateRequest(_)
        )
    }

    /// Check if this error came from the IPC transport.
    pub fn is_transport_failure(&self) -> bool {
        matches!(
            self,
            Self::Dbus(_) | Self::Transport(_) | Self::Timeout(_) | Self::ReplyMalformed(_)
        )
    }
}

// Convert from zbus errors
impl From<zbus::Error> for Error {
    fn from(err: zbus::Error) -> Self {
        Error::Dbus(err.to_string())
    }
}

// Convert from zvariant errors
impl From<zbus::zvariant::Error> for Error {
    fn from(err: zbus::zvariant::Error) -> Self {
        Error::ReplyMalformed(err.to_string())
    }
}

// Convert from toml parse errors
impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::ConfigParseFailed(err.to_string())
    }
}
