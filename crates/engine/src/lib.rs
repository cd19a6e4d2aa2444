// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! tracklink-engine: bi-directional Hub/Tracker reconciliation engine.
//!
//! The engine reconciles defect and requirement state between an internal
//! project-tracking service (the Hub, an RPC API behind [`hub::HubService`])
//! and an external issue tracker (the Tracker, a REST/JSON API behind
//! [`tracker::TrackerClient`]). Each run pushes new Hub incidents into the
//! Tracker and pulls Tracker issues created or updated since the last run
//! back into the Hub.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────┐    ┌────────────┐    ┌───────────────┐
//! │  Plugin  │───►│ SyncEngine │───►│ HubService    │ (host-provided RPC)
//! │ (host)   │    │ (per run)  │    ├───────────────┤
//! └──────────┘    │            │───►│ TrackerClient │──► Transport (trait)
//!                 └────────────┘    └───────────────┘
//!                        │
//!                        ▼
//!                 transformers + mapping resolver
//! ```
//!
//! The Hub RPC stubs and the raw HTTP primitives are external collaborators;
//! both sit behind traits so every engine path is testable with mocks.

pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod eventlog;
pub mod htmltext;
pub mod hub;
pub mod jql;
pub mod mapping;
pub mod plugin;
pub mod tracker;
pub mod transform;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use config::{EngineConfig, SetupParams};
pub use engine::{RunOutcome, SyncEngine};
pub use error::{Error, Result};
pub use eventlog::{EventLog, EventSink, Severity};
pub use hub::{HubError, HubField, HubService};
pub use plugin::SyncPlugin;
pub use tracker::{HttpTransport, TrackerClient, TrackerError, Transport};
