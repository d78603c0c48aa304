//custos-common/src/error.rs
//! Standardized error types for all Custos components

use std::sync::{MutexGuard, PoisonError, RwLockReadGuard, RwLockWriteGuard};
use thiserror::Error;

/// Standard result type used throughout Custos
pub type CustosResult<T> = std::result::Result<T, CustosError>;

/// Comprehensive error type for all Custos operations
///
/// Variants fall into three classes:
/// - not-found (`UnknownAddress`, `UnknownModule`, `UnknownAccountNumber`)
/// - invalid input (`InvalidAddress`, `InvalidPermission`, `Validation`, `Config`)
/// - fatal state corruption (`Decode`, `Encode`, `TypeMismatch`, `Corruption`)
///
/// Fatal errors mean the persisted state disagrees with the program's
/// invariants. Callers must drop the enclosing store context without
/// committing it when [`CustosError::is_fatal`] returns true.
#[derive(Error, Debug)]
pub enum CustosError {
    // Not-found errors
    #[error("unknown address: account {0} does not exist")]
    UnknownAddress(String),

    #[error("unknown module account: {0}")]
    UnknownModule(String),

    #[error("no account with number {0}")]
    UnknownAccountNumber(u64),

    // Invalid input
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid module permission {0}")]
    InvalidPermission(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Config error: {0}")]
    Config(String),

    // Corruption and invariant violations
    #[error("decode error: {0}")]
    Decode(String),

    #[error("encode error: {0}")]
    Encode(String),

    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    #[error("state corruption: {0}")]
    Corruption(String),

    // Database errors
    #[error("Database error: {0}")]
    Database(#[from] rocksdb::Error),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // JSON errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),

    // External library errors
    #[error("External error: {0}")]
    External(#[from] anyhow::Error),
}

impl CustosError {
    /// Create a new unknown-address error
    pub fn unknown_address(address: impl std::fmt::Display) -> Self {
        Self::UnknownAddress(address.to_string())
    }

    /// Create a new unknown-module error
    pub fn unknown_module(name: impl Into<String>) -> Self {
        Self::UnknownModule(name.into())
    }

    /// Create a new invalid-address error
    pub fn invalid_address(msg: impl Into<String>) -> Self {
        Self::InvalidAddress(msg.into())
    }

    /// Create a new invalid-permission error
    pub fn invalid_permission(permission: impl Into<String>) -> Self {
        Self::InvalidPermission(permission.into())
    }

    /// Create a new validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a new config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new decode error
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Create a new encode error
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Create a new type mismatch error
    pub fn type_mismatch(msg: impl Into<String>) -> Self {
        Self::TypeMismatch(msg.into())
    }

    /// Create a new corruption error
    pub fn corruption(msg: impl Into<String>) -> Self {
        Self::Corruption(msg.into())
    }

    /// Create a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether this error signals persisted state that can no longer be trusted.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Decode(_)
                | Self::Encode(_)
                | Self::TypeMismatch(_)
                | Self::Corruption(_)
                | Self::Database(_)
        )
    }

    /// Whether this error reports an absent address, module or account number.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::UnknownAddress(_) | Self::UnknownModule(_) | Self::UnknownAccountNumber(_)
        )
    }
}

impl<T> From<PoisonError<RwLockReadGuard<'_, T>>> for CustosError {
    fn from(err: PoisonError<RwLockReadGuard<'_, T>>) -> Self {
        CustosError::Internal(format!("lock poisoned: {err}"))
    }
}

impl<T> From<PoisonError<RwLockWriteGuard<'_, T>>> for CustosError {
    fn from(err: PoisonError<RwLockWriteGuard<'_, T>>) -> Self {
        CustosError::Internal(format!("lock poisoned: {err}"))
    }
}

impl<T> From<PoisonError<MutexGuard<'_, T>>> for CustosError {
    fn from(err: PoisonError<MutexGuard<'_, T>>) -> Self {
        CustosError::Internal(format!("lock poisoned: {err}"))
    }
}

/// Convenience macro for creating CustosError instances
#[macro_export]
macro_rules! custos_error {
    ($variant:ident, $($arg:tt)*) => {
        $crate::error::CustosError::$variant(format!($($arg)*))
    };
}

/// Convenience macro for returning early with a CustosError
#[macro_export]
macro_rules! custos_bail {
    ($variant:ident, $($arg:tt)*) => {
        return Err($crate::custos_error!($variant, $($arg)*))
    };
}
