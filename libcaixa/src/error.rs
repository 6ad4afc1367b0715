//! Hard failures of the bookkeeping actions.
//!
//! Parse failures and lookup misses are deliberately absent: they degrade to
//! a zero amount or an untouched cell instead of an error.

use crate::lookup::ReferenceKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BookError {
    #[error("sheet `{0}' not found")]
    MissingSheet(String),

    #[error("failed to import {kind} reference data: {reason}")]
    Import { kind: ReferenceKind, reason: String },

    #[error("invalid value `{value}' for option `{key}'")]
    Option { key: String, value: String },
}
