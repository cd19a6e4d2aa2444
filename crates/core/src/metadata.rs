// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! The Tracker's create-metadata: which fields and options are valid when
//! creating an issue of a given type in a given project.
//!
//! The engine uses the metadata three ways: to enforce required fields, to
//! drop fields the target issue type does not expose, and to translate
//! select-option values between name and id.

use serde::Deserialize;
use std::collections::BTreeMap;

/// Key prefix the Tracker uses for custom fields.
pub const CUSTOM_FIELD_PREFIX: &str = "customfield_";

/// Builds the wire key for a numeric custom-field id.
pub fn custom_field_key(id: i64) -> String {
    format!("{}{}", CUSTOM_FIELD_PREFIX, id)
}

/// Extracts the numeric id from a `customfield_NNN` wire key.
pub fn custom_field_id(key: &str) -> Option<i64> {
    key.strip_prefix(CUSTOM_FIELD_PREFIX)?.parse().ok()
}

/// One allowed option of a select field. Depending on the field type the
/// label rides in `value` or `name`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AllowedValue {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl AllowedValue {
    /// The option label: `value`, falling back to `name`.
    pub fn label(&self) -> Option<&str> {
        self.value.as_deref().or(self.name.as_deref())
    }
}

/// Metadata for one field of an issue type.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MetaField {
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "allowedValues")]
    pub allowed_values: Vec<AllowedValue>,
}

impl MetaField {
    /// Resolves an option label to its id, case-insensitively.
    pub fn option_id_by_label(&self, label: &str) -> Option<&str> {
        self.allowed_values
            .iter()
            .find(|v| v.label().is_some_and(|l| l.eq_ignore_ascii_case(label)))
            .and_then(|v| v.id.as_deref())
    }

    /// Resolves an option id to its label.
    pub fn option_label_by_id(&self, id: &str) -> Option<&str> {
        self.allowed_values
            .iter()
            .find(|v| v.id.as_deref() == Some(id))
            .and_then(|v| v.label())
    }

    /// True when the given token matches an allowed option id.
    pub fn has_option_id(&self, id: &str) -> bool {
        self.allowed_values.iter().any(|v| v.id.as_deref() == Some(id))
    }
}

/// Metadata for one issue type within a project.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MetaIssueType {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub fields: BTreeMap<String, MetaField>,
}

impl MetaIssueType {
    /// Looks up a field declaration by wire key.
    pub fn field(&self, key: &str) -> Option<&MetaField> {
        self.fields.get(key)
    }

    /// True when the issue type declares the given field.
    pub fn has_field(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }
}

/// Metadata for one project.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MetaProject {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub issuetypes: Vec<MetaIssueType>,
}

/// The full create-metadata document.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CreateMeta {
    #[serde(default)]
    pub projects: Vec<MetaProject>,
}

impl CreateMeta {
    /// Locates the metadata node for a `(project, issue type)` pair.
    ///
    /// The project is matched by key (case-insensitive) or by id.
    pub fn issue_type_node(&self, project: &str, issue_type_id: &str) -> Option<&MetaIssueType> {
        self.projects
            .iter()
            .find(|p| {
                p.key.as_deref().is_some_and(|k| k.eq_ignore_ascii_case(project))
                    || p.id.as_deref() == Some(project)
            })?
            .issuetypes
            .iter()
            .find(|t| t.id == issue_type_id)
    }
}

#[cfg(test)]
#[path = "metadata_tests.rs"]
mod tests;
