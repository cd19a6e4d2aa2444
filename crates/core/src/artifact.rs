// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Hub-side artifact model.
//!
//! The Hub exposes a closed schema: incidents and requirements with fixed
//! standard fields plus thirty typed custom-property slots, releases with a
//! short version number, and documents that are either stored files or URL
//! links. Descriptions are HTML on this side of the sync.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::value::TypedValue;

/// Highest valid custom-property slot number.
pub const MAX_CUSTOM_SLOT: u8 = 30;

/// A defect artifact on the Hub side.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HubIncident {
    /// `None` until the Hub assigns an id on create.
    pub id: Option<i64>,
    pub project_id: i64,
    pub name: String,
    /// HTML body.
    pub description: String,
    pub status_id: Option<i64>,
    pub type_id: Option<i64>,
    pub priority_id: Option<i64>,
    pub severity_id: Option<i64>,
    pub opener_id: Option<i64>,
    pub owner_id: Option<i64>,
    pub creation_date: Option<DateTime<Utc>>,
    pub start_date: Option<DateTime<Utc>>,
    pub closed_date: Option<DateTime<Utc>>,
    pub detected_release_id: Option<i64>,
    pub resolved_release_id: Option<i64>,
    pub component_ids: Vec<i64>,
    /// Typed values keyed by slot number (1..=30).
    pub custom_properties: BTreeMap<u8, TypedValue>,
}

impl HubIncident {
    /// Sets a custom-property slot, validating the slot range.
    pub fn set_custom_property(&mut self, slot: u8, value: TypedValue) -> Result<()> {
        if slot == 0 || slot > MAX_CUSTOM_SLOT {
            return Err(Error::InvalidSlot(slot));
        }
        self.custom_properties.insert(slot, value);
        Ok(())
    }

    /// Reads a custom-property slot.
    pub fn custom_property(&self, slot: u8) -> Option<&TypedValue> {
        self.custom_properties.get(&slot)
    }
}

/// A requirement artifact on the Hub side.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HubRequirement {
    pub id: Option<i64>,
    pub project_id: i64,
    pub name: String,
    /// HTML body.
    pub description: String,
    pub author_id: Option<i64>,
    pub owner_id: Option<i64>,
    pub status_id: Option<i64>,
    pub requirement_type_id: Option<i64>,
    pub importance_id: Option<i64>,
    pub release_id: Option<i64>,
    pub creation_date: Option<DateTime<Utc>>,
    pub custom_properties: BTreeMap<u8, TypedValue>,
}

impl HubRequirement {
    /// Sets a custom-property slot, validating the slot range.
    pub fn set_custom_property(&mut self, slot: u8, value: TypedValue) -> Result<()> {
        if slot == 0 || slot > MAX_CUSTOM_SLOT {
            return Err(Error::InvalidSlot(slot));
        }
        self.custom_properties.insert(slot, value);
        Ok(())
    }
}

/// A release on the Hub side, mirrored to Tracker versions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HubRelease {
    pub id: Option<i64>,
    pub project_id: i64,
    pub name: String,
    /// Short identifier; the Hub caps this at ten characters.
    pub version_number: String,
    pub active: bool,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub release_status_id: Option<i64>,
    pub release_type_id: Option<i64>,
}

/// A discussion entry on a Hub artifact.
///
/// De-duplication across the sync boundary compares `text` only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HubComment {
    pub artifact_id: i64,
    pub author_id: Option<i64>,
    pub text: String,
    pub created: Option<DateTime<Utc>>,
}

/// What a Hub document record points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    /// Bytes stored by the Hub.
    File,
    /// External link recorded as a document row.
    Url,
}

/// An attachment or URL link recorded against a Hub artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HubDocument {
    pub id: Option<i64>,
    pub kind: DocumentKind,
    /// Filename for stored files, full URL for links.
    pub filename_or_url: String,
    pub description: Option<String>,
}

/// The artifact families an incident association can point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssociationKind {
    Incident,
    Requirement,
    TestRun,
}

impl AssociationKind {
    /// Returns the label used in link titles and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            AssociationKind::Incident => "incident",
            AssociationKind::Requirement => "requirement",
            AssociationKind::TestRun => "test run",
        }
    }
}

/// A directed association recorded on a Hub incident.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HubAssociation {
    pub dest_kind: AssociationKind,
    pub dest_id: i64,
    pub comment: Option<String>,
}

/// A Hub user record, used by the auto-map resolver path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HubUser {
    pub id: i64,
    pub login: String,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub active: bool,
}

/// The declared type of a Hub custom-property slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomPropertyKind {
    Text,
    Integer,
    Decimal,
    Boolean,
    Date,
    List,
    MultiList,
    User,
}

impl CustomPropertyKind {
    /// True for the scalar kinds (everything but list, multi-list, user).
    pub fn is_scalar(&self) -> bool {
        !matches!(
            self,
            CustomPropertyKind::List | CustomPropertyKind::MultiList | CustomPropertyKind::User
        )
    }
}

/// One option of a Hub custom list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomListOption {
    pub id: i64,
    pub name: String,
}

/// A Hub custom list definition; option order is the admin-configured order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomList {
    pub id: i64,
    pub options: Vec<CustomListOption>,
}

impl CustomList {
    /// Finds an option by its id.
    pub fn option_by_id(&self, id: i64) -> Option<&CustomListOption> {
        self.options.iter().find(|o| o.id == id)
    }
}

/// One entry of the Hub's custom-property catalog, fetched each run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomPropertyDefinition {
    /// Slot number (1..=30).
    pub number: u8,
    pub name: String,
    pub kind: CustomPropertyKind,
    /// Present for `List` and `MultiList` kinds.
    pub list: Option<CustomList>,
}
