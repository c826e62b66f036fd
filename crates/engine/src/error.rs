//! The module contains the errors the engine can return.
//!
//! Errors are split by where they happen, so a caller can decide between a
//! retry and a user-facing message:
//!
//! - [`Validation`] and [`InvalidAmount`] are raised before any store call.
//! - [`StoreRead`] and [`StoreWrite`] wrap a failing store operation.
//! - [`AllocationConflict`] is raised when split flags change while a
//!   settlement is being allocated.
//!
//!  [`Validation`]: EngineError::Validation
//!  [`InvalidAmount`]: EngineError::InvalidAmount
//!  [`StoreRead`]: EngineError::StoreRead
//!  [`StoreWrite`]: EngineError::StoreWrite
//!  [`AllocationConflict`]: EngineError::AllocationConflict
use sea_orm::DbErr;
use thiserror::Error;

use crate::ResultEngine;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("Allocation conflict: {0}")]
    AllocationConflict(String),
    #[error("Store read failed: {0}")]
    StoreRead(#[source] DbErr),
    #[error("Store write failed: {0}")]
    StoreWrite(#[source] DbErr),
}

impl EngineError {
    /// Returns `true` when the same call may succeed if issued again.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::StoreRead(_) | Self::StoreWrite(_) | Self::AllocationConflict(_)
        )
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Validation(a), Self::Validation(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::AllocationConflict(a), Self::AllocationConflict(b)) => a == b,
            (Self::StoreRead(a), Self::StoreRead(b)) => a.to_string() == b.to_string(),
            (Self::StoreWrite(a), Self::StoreWrite(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}

/// Tags a raw store result with the side of the store it came from.
pub(crate) trait StoreResultExt<T> {
    fn on_read(self) -> ResultEngine<T>;
    fn on_write(self) -> ResultEngine<T>;
}

impl<T> StoreResultExt<T> for Result<T, DbErr> {
    fn on_read(self) -> ResultEngine<T> {
        self.map_err(EngineError::StoreRead)
    }

    fn on_write(self) -> ResultEngine<T> {
        self.map_err(EngineError::StoreWrite)
    }
}
