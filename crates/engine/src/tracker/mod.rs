// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Tracker REST access.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────┐     ┌─────────────┐     ┌──────────────┐
//! │ TrackerClient │────►│  Transport  │────►│ Tracker REST │
//! │ (typed calls) │◄────│   (trait)   │◄────│  /rest/api/2 │
//! └───────────────┘     └─────────────┘     └──────────────┘
//!         │
//!         ▼
//!   fields (metadata-driven payload shaping + reconstruction)
//! ```
//!
//! The transport trait carries raw JSON; the client owns the typed wrappers
//! and pagination; `fields` owns the dynamic-field validator.

mod client;
pub mod fields;
mod transport;

pub use client::{TrackerClient, TrackerError, TrackerResult, SEARCH_PAGE_SIZE};
pub use transport::{HttpTransport, Transport, TransportError, TransportResult};


#[cfg(test)]
mod client_tests;
