// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Persisted identity mappings between Hub numeric ids and Tracker keys.
//!
//! Mapping tables are owned by the Hub; the engine reads them at phase
//! boundaries, buffers additions in memory, and flushes at checkpoints.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The Hub artifact families that participate in the sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Incident,
    Requirement,
    Release,
}

impl ArtifactKind {
    /// Returns the string representation used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactKind::Incident => "incident",
            ArtifactKind::Requirement => "requirement",
            ArtifactKind::Release => "release",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The namespace a mapping entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MappingScope {
    /// Hub project id to Tracker project key.
    Project,
    /// Hub user id to Tracker login.
    User,
    /// Hub artifact id to Tracker key (issues) or version id (releases).
    Artifact(ArtifactKind),
    /// Hub custom-property slot to Tracker custom-field id or sentinel.
    CustomProperty,
    /// Hub list-option id to Tracker option name or id.
    CustomPropertyValue,
}

impl fmt::Display for MappingScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MappingScope::Project => write!(f, "project"),
            MappingScope::User => write!(f, "user"),
            MappingScope::Artifact(kind) => write!(f, "artifact/{}", kind),
            MappingScope::CustomProperty => write!(f, "custom_property"),
            MappingScope::CustomPropertyValue => write!(f, "custom_property_value"),
        }
    }
}

/// One persisted link between an internal Hub id and an external Tracker key.
///
/// `(scope, hub_project_id, internal_id)` uniquely identifies the primary
/// entry; non-primary entries are alias keys that resolve on external-key
/// lookups only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mapping {
    pub scope: MappingScope,
    /// Project the mapping is scoped to; `None` for system-global scopes.
    pub hub_project_id: Option<i64>,
    pub internal_id: i64,
    pub external_key: String,
    pub primary: bool,
}

impl Mapping {
    /// Creates a primary mapping entry.
    pub fn new(
        scope: MappingScope,
        hub_project_id: Option<i64>,
        internal_id: i64,
        external_key: impl Into<String>,
    ) -> Self {
        Mapping {
            scope,
            hub_project_id,
            internal_id,
            external_key: external_key.into(),
            primary: true,
        }
    }

    /// Creates a non-primary alias entry for the same internal id.
    pub fn alias(
        scope: MappingScope,
        hub_project_id: Option<i64>,
        internal_id: i64,
        external_key: impl Into<String>,
    ) -> Self {
        Mapping {
            primary: false,
            ..Mapping::new(scope, hub_project_id, internal_id, external_key)
        }
    }

    /// True when this mapping is visible within the given project scope.
    pub fn in_project(&self, hub_project_id: Option<i64>) -> bool {
        self.hub_project_id == hub_project_id
    }
}

#[cfg(test)]
#[path = "mapping_tests.rs"]
mod tests;
