// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! tracklink-core: Shared data model for the tracklink synchronization engine
//!
//! This crate provides the entities exchanged between the two sides of the
//! sync: Hub artifacts (incidents, requirements, releases), Tracker issues,
//! identity mappings, typed custom values, and the Tracker's create-metadata.
//! It performs no I/O; the engine crate owns all transport concerns.

pub mod artifact;
pub mod error;
pub mod issue;
pub mod mapping;
pub mod metadata;
pub mod value;

pub use artifact::{
    AssociationKind, CustomList, CustomListOption, CustomPropertyDefinition, CustomPropertyKind,
    DocumentKind, HubAssociation, HubComment, HubDocument, HubIncident, HubRelease, HubRequirement,
    HubUser,
};
pub use error::{Error, Result};
pub use issue::{
    NamedId, TrackerAttachment, TrackerComment, TrackerIssue, TrackerProject, TrackerVersion,
};
pub use mapping::{ArtifactKind, Mapping, MappingScope};
pub use metadata::{AllowedValue, CreateMeta, MetaField, MetaIssueType, MetaProject};
pub use value::TypedValue;
