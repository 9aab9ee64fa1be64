// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Initialization failed: {0}")]
    Initialization(String),

    #[error("Connection failed to endpoint: {0}")]
    Connection(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("RPC error response: {0}")]
    Rpc(String),

    #[error("External API error: {provider} responded with {status}")]
    ApiCall { provider: String, status: u16 },

    #[error("Validation failed for field {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Address {0} is invalid")]
    InvalidAddress(String),

    #[error(transparent)]
    Unknown(#[from] anyhow::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err.to_string())
    }
}

/// Failure taxonomy of the swap pipeline.
///
/// Every variant is terminal for the request that produced it. Only
/// `Transient` is ever retried, and only inside the pipeline before it is
/// surfaced as `Unavailable`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SwapError {
    #[error("invalid {field}: {message}")]
    Validation { field: &'static str, message: String },

    #[error("no pool found for the requested pair")]
    NotFound,

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("transient failure: {0}")]
    Transient(String),

    #[error("service unavailable after {attempts} attempts: {last_error}")]
    Unavailable { attempts: usize, last_error: String },

    #[error("transaction rejected: {0}")]
    Rejected(String),

    #[error("broadcast outcome unknown for {tx_hash}: {reason}")]
    AmbiguousBroadcast { tx_hash: String, reason: String },

    #[error("external API error: {provider} responded with {status}")]
    Api { provider: String, status: u16 },

    #[error("internal error: {0}")]
    Internal(String),

    #[error("quote expired before signing")]
    Expired,

    #[error("swap cancelled before broadcast")]
    Cancelled,
}

impl SwapError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        SwapError::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, SwapError::Transient(_))
    }

    /// Short machine-readable tag used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            SwapError::Validation { .. } => "validation",
            SwapError::NotFound => "not_found",
            SwapError::InvalidAmount(_) => "invalid_amount",
            SwapError::Transient(_) => "transient",
            SwapError::Unavailable { .. } => "unavailable",
            SwapError::Rejected(_) => "rejected",
            SwapError::AmbiguousBroadcast { .. } => "ambiguous_broadcast",
            SwapError::Api { .. } => "api",
            SwapError::Internal(_) => "internal",
            SwapError::Expired => "expired",
            SwapError::Cancelled => "cancelled",
        }
    }
}

impl From<AppError> for SwapError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::Connection(msg) => SwapError::Transient(msg),
            AppError::ApiCall { provider, status } => SwapError::Api { provider, status },
            AppError::Validation { message, .. } => SwapError::Internal(message),
            other => SwapError::Internal(other.to_string()),
        }
    }
}

/// Failure to persist a swap after it reached the network.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("swap broadcast but history not recorded: {0}")]
pub struct RecordingWarning(pub String);
