// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! The Hub RPC boundary.
//!
//! The Hub is the internal project-tracking service that owns the mapping
//! tables and the canonical artifact identities. Its RPC stubs are provided
//! by the host; the engine talks to them through [`HubService`]. Sessions
//! are stateful and scoped to one connected project at a time, and may
//! expire server-side; the engine re-authenticates before each major phase.

use chrono::{DateTime, Utc};
use std::fmt;
use thiserror::Error;

use tracklink_core::artifact::AssociationKind;
use tracklink_core::{
    ArtifactKind, CustomPropertyDefinition, HubAssociation, HubComment, HubDocument, HubIncident,
    HubRelease, HubRequirement, HubUser, Mapping, MappingScope,
};

/// One field-level message of a Hub validation fault.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldMessage {
    pub field: String,
    pub message: String,
}

impl fmt::Display for FieldMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Error type for Hub operations.
#[derive(Debug, Error)]
pub enum HubError {
    /// Credentials rejected.
    #[error("authentication rejected: {0}")]
    Auth(String),

    /// The server-side session timed out or was dropped.
    #[error("session expired: {0}")]
    Session(String),

    /// The requested artifact or project does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The Hub rejected a write with field-level messages.
    #[error("validation fault: {summary}")]
    Validation {
        summary: String,
        messages: Vec<FieldMessage>,
    },

    /// Transport or serialization failure inside the RPC stubs.
    #[error("hub transport error: {0}")]
    Transport(String),
}

impl HubError {
    /// Formats a validation fault as one structured log entry.
    pub fn validation_log_entry(summary: &str, messages: &[FieldMessage]) -> String {
        let mut entry = format!("validation fault: {}", summary);
        for m in messages {
            entry.push_str(&format!("\n  {}", m));
        }
        entry
    }
}

/// Result type for Hub operations.
pub type HubResult<T> = Result<T, HubError>;

/// The standard Hub fields whose enumerated values have their own mapping
/// tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HubField {
    IncidentStatus,
    IncidentType,
    IncidentPriority,
    IncidentSeverity,
    RequirementStatus,
    RequirementType,
    RequirementImportance,
    Component,
}

/// The Hub RPC surface the engine depends on.
///
/// Implementations are session-stateful: `authenticate` establishes the
/// session, `connect_project` scopes it, and every subsequent call operates
/// within that scope. All mutations are visible immediately to later reads
/// within the same session.
pub trait HubService {
    // Session lifecycle.
    fn authenticate(&mut self) -> HubResult<()>;
    fn connect_project(&mut self, project_id: i64) -> HubResult<()>;
    fn disconnect(&mut self);

    // Mapping store access, scoped by the engine's data-sync-system id.
    fn project_mappings(&mut self) -> HubResult<Vec<Mapping>>;
    fn user_mappings(&mut self) -> HubResult<Vec<Mapping>>;
    /// Artifact mappings for the connected project.
    fn artifact_mappings(&mut self, kind: ArtifactKind) -> HubResult<Vec<Mapping>>;
    /// Enumerated-value mappings for one standard field of the connected
    /// project.
    fn field_value_mappings(&mut self, field: HubField) -> HubResult<Vec<Mapping>>;
    /// The custom-property catalog for one artifact family, fetched fresh
    /// each run.
    fn custom_property_definitions(
        &mut self,
        kind: ArtifactKind,
    ) -> HubResult<Vec<CustomPropertyDefinition>>;
    /// Custom-property slot mappings for one artifact family.
    fn custom_property_mappings(&mut self, kind: ArtifactKind) -> HubResult<Vec<Mapping>>;
    /// Option-value mappings for one custom-property slot.
    fn custom_property_value_mappings(
        &mut self,
        kind: ArtifactKind,
        property_number: u8,
    ) -> HubResult<Vec<Mapping>>;
    fn add_mappings(&mut self, scope: MappingScope, mappings: &[Mapping]) -> HubResult<()>;
    fn remove_mappings(&mut self, scope: MappingScope, mappings: &[Mapping]) -> HubResult<()>;

    // Incidents.
    /// One page of the connected project's incidents, sorted by name
    /// ascending with an empty filter set.
    fn incidents_page(&mut self, start: usize, count: usize) -> HubResult<Vec<HubIncident>>;
    /// One page of incidents created at or after `since`.
    fn incidents_page_since(
        &mut self,
        since: DateTime<Utc>,
        start: usize,
        count: usize,
    ) -> HubResult<Vec<HubIncident>>;
    fn incident_by_id(&mut self, id: i64) -> HubResult<HubIncident>;
    fn create_incident(&mut self, incident: &HubIncident) -> HubResult<HubIncident>;
    fn update_incident(&mut self, incident: &HubIncident) -> HubResult<()>;

    // Requirements.
    fn requirement_by_id(&mut self, id: i64) -> HubResult<HubRequirement>;
    fn create_requirement(&mut self, requirement: &HubRequirement) -> HubResult<HubRequirement>;
    fn update_requirement(&mut self, requirement: &HubRequirement) -> HubResult<()>;

    // Releases.
    fn releases(&mut self) -> HubResult<Vec<HubRelease>>;
    fn create_release(&mut self, release: &HubRelease) -> HubResult<HubRelease>;

    // Comments and documents.
    fn comments(&mut self, kind: ArtifactKind, artifact_id: i64) -> HubResult<Vec<HubComment>>;
    fn add_comments(&mut self, kind: ArtifactKind, comments: &[HubComment]) -> HubResult<()>;
    fn documents(&mut self, kind: ArtifactKind, artifact_id: i64) -> HubResult<Vec<HubDocument>>;
    fn document_bytes(&mut self, document_id: i64) -> HubResult<Vec<u8>>;
    fn add_file_document(
        &mut self,
        kind: ArtifactKind,
        artifact_id: i64,
        filename: &str,
        data: &[u8],
    ) -> HubResult<()>;
    fn add_url_document(
        &mut self,
        kind: ArtifactKind,
        artifact_id: i64,
        url: &str,
        name: &str,
    ) -> HubResult<()>;

    // Associations.
    fn incident_associations(&mut self, incident_id: i64) -> HubResult<Vec<HubAssociation>>;

    // User directory, used by the auto-map resolver path.
    fn user_by_id(&mut self, id: i64) -> HubResult<Option<HubUser>>;
    fn user_by_login(&mut self, login: &str) -> HubResult<Option<HubUser>>;

    /// Resolves the browser URL of an artifact, substituting the Hub's
    /// web-server URL placeholder. Takes the association target enum so
    /// test-run URLs are expressible alongside incidents and requirements.
    fn artifact_url(
        &mut self,
        target: AssociationKind,
        project_id: i64,
        artifact_id: i64,
    ) -> HubResult<String>;
}
