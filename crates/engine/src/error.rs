// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the reconciliation engine.

use thiserror::Error;

use crate::hub::HubError;
use crate::tracker::TrackerError;

/// All possible errors that can surface from an engine run.
///
/// Only two of these end a run: a Hub authentication failure and a failed
/// Tracker connectivity probe. Everything else is contained at the project
/// or artifact boundary and reported through the event log.
#[derive(Debug, Error)]
pub enum Error {
    #[error("hub authentication failed: {0}")]
    HubAuth(String),

    #[error("tracker connectivity probe failed: {0}")]
    Probe(String),

    #[error("could not connect to hub project {project_id}: {source}")]
    ProjectConnect {
        project_id: i64,
        source: HubError,
    },

    #[error("hub error: {0}")]
    Hub(#[from] HubError),

    #[error("tracker error: {0}")]
    Tracker(#[from] TrackerError),

    #[error("model error: {0}")]
    Core(#[from] tracklink_core::Error),
}

/// A specialized Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;
