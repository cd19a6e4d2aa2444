// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Tracker-side issue model.
//!
//! Issues are identified by a human-readable key (`PROJ-N`). The Tracker
//! serializes numeric ids as decimal strings; [`NamedId`] keeps that wire
//! convention. Descriptions are plain text on this side of the sync.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::value::TypedValue;

/// An id/name pair as the Tracker serializes enumerated resources.
///
/// Either half may be absent; create payloads send whichever is known.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NamedId {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl NamedId {
    /// Creates a `NamedId` carrying only an id.
    pub fn from_id(id: impl Into<String>) -> Self {
        NamedId {
            id: Some(id.into()),
            name: None,
        }
    }

    /// Creates a `NamedId` carrying only a name.
    pub fn from_name(name: impl Into<String>) -> Self {
        NamedId {
            id: None,
            name: Some(name.into()),
        }
    }

    /// The id parsed as an integer, when present and numeric.
    pub fn id_as_i64(&self) -> Option<i64> {
        self.id.as_deref().and_then(|s| s.parse().ok())
    }

    /// Best-effort display label: name, falling back to id.
    pub fn label(&self) -> Option<&str> {
        self.name.as_deref().or(self.id.as_deref())
    }
}

/// A Tracker project summary row.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TrackerProject {
    #[serde(default)]
    pub id: Option<String>,
    pub key: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// A Tracker version (release) row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerVersion {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub released: bool,
    #[serde(default)]
    pub archived: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<NaiveDate>,
}

/// A comment on a Tracker issue.
///
/// De-duplication across the sync boundary compares `body` only.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackerComment {
    pub author: Option<String>,
    pub update_author: Option<String>,
    pub body: String,
    pub created: Option<DateTime<Utc>>,
}

impl TrackerComment {
    /// First available author: `author`, falling back to `update_author`.
    pub fn effective_author(&self) -> Option<&str> {
        self.author.as_deref().or(self.update_author.as_deref())
    }
}

/// An attachment row on a Tracker issue.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TrackerAttachment {
    #[serde(default)]
    pub id: Option<String>,
    pub filename: String,
    /// Download URL.
    #[serde(default, rename = "content")]
    pub content_url: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
}

/// A fully materialized Tracker issue.
///
/// Assembled field by field from the wire response; custom-field values are
/// reconstructed dynamically against the create-metadata, so this struct is
/// not itself a serde wire shape.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackerIssue {
    /// `None` until the Tracker assigns a key on create.
    pub key: Option<String>,
    pub project_key: String,
    pub issue_type: NamedId,
    pub status: Option<NamedId>,
    pub priority: Option<NamedId>,
    pub resolution: Option<NamedId>,
    /// Reporter login.
    pub reporter: Option<String>,
    /// Assignee login.
    pub assignee: Option<String>,
    pub summary: String,
    /// Plain text body.
    pub description: Option<String>,
    pub environment: Option<String>,
    pub created: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
    pub due_date: Option<NaiveDate>,
    pub resolution_date: Option<DateTime<Utc>>,
    /// Affected versions.
    pub versions: Vec<TrackerVersion>,
    pub fix_versions: Vec<TrackerVersion>,
    pub components: Vec<NamedId>,
    pub attachments: Vec<TrackerAttachment>,
    pub comments: Vec<TrackerComment>,
    /// Typed values keyed by numeric custom-field id.
    pub custom_fields: BTreeMap<i64, TypedValue>,
    pub security_level_id: Option<i64>,
}

impl TrackerIssue {
    /// Creates an empty issue bound to a project.
    pub fn new(project_key: impl Into<String>) -> Self {
        TrackerIssue {
            project_key: project_key.into(),
            ..TrackerIssue::default()
        }
    }

    /// The issue type id, when numeric.
    pub fn issue_type_id(&self) -> Option<i64> {
        self.issue_type.id_as_i64()
    }

    /// The issue key, or an empty string for not-yet-created issues.
    pub fn key_or_empty(&self) -> &str {
        self.key.as_deref().unwrap_or("")
    }
}
