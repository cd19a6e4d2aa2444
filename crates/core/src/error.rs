// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for tracklink-core operations.

use thiserror::Error;

/// All possible errors that can occur in tracklink-core operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("custom property slot out of range: {0}\n  hint: valid slots are 1 through 30")]
    InvalidSlot(u8),

    #[error("corrupted data: {0}")]
    CorruptedData(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for tracklink-core operations.
pub type Result<T> = std::result::Result<T, Error>;
