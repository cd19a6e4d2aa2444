// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers: an in-memory Hub with canned tables and full call
//! recording.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};

use tracklink_core::artifact::AssociationKind;
use tracklink_core::{
    ArtifactKind, CustomPropertyDefinition, HubAssociation, HubComment, HubDocument, HubIncident,
    HubRelease, HubRequirement, HubUser, Mapping, MappingScope,
};

use crate::eventlog::{EventSink, Severity};
use crate::hub::{FieldMessage, HubError, HubField, HubResult, HubService};

/// Sink that records every entry, for asserting on log output.
pub struct CapturingSink {
    entries: Arc<Mutex<Vec<(Severity, String)>>>,
}

impl CapturingSink {
    pub fn new() -> (Self, Arc<Mutex<Vec<(Severity, String)>>>) {
        let entries = Arc::new(Mutex::new(Vec::new()));
        (
            CapturingSink {
                entries: Arc::clone(&entries),
            },
            entries,
        )
    }
}

impl EventSink for CapturingSink {
    fn write(&self, severity: Severity, message: &str) {
        self.entries
            .lock()
            .unwrap()
            .push((severity, message.to_string()));
    }
}

/// In-memory Hub double. Canned tables seed the reads; every mutation is
/// recorded and, for mappings, folded back into the backing table so a
/// second run observes flushed state.
#[derive(Default)]
pub struct MockHub {
    // Canned state.
    pub project_mappings: Vec<Mapping>,
    pub user_mappings: Vec<Mapping>,
    pub users: Vec<HubUser>,
    pub incidents: Vec<HubIncident>,
    pub requirements: Vec<HubRequirement>,
    pub incident_mappings: Vec<Mapping>,
    pub requirement_mappings: Vec<Mapping>,
    pub release_mappings: Vec<Mapping>,
    pub field_mappings: HashMap<HubField, Vec<Mapping>>,
    pub incident_props: Vec<CustomPropertyDefinition>,
    pub requirement_props: Vec<CustomPropertyDefinition>,
    pub incident_prop_mappings: Vec<Mapping>,
    pub requirement_prop_mappings: Vec<Mapping>,
    pub value_mappings: HashMap<(ArtifactKind, u8), Vec<Mapping>>,
    pub releases: Vec<HubRelease>,
    pub comments: HashMap<(ArtifactKind, i64), Vec<HubComment>>,
    pub documents: HashMap<(ArtifactKind, i64), Vec<HubDocument>>,
    pub document_data: HashMap<i64, Vec<u8>>,
    pub associations: HashMap<i64, Vec<HubAssociation>>,
    pub base_web_url: String,

    // Behavior switches.
    pub fail_auth: bool,
    pub fail_connect: Vec<i64>,
    /// When set, artifact creates fail with a typed validation fault.
    pub fail_create_validation: bool,

    // Recordings.
    pub auth_count: usize,
    pub connects: Vec<i64>,
    pub disconnected: bool,
    pub created_incidents: Vec<HubIncident>,
    pub updated_incidents: Vec<HubIncident>,
    pub created_requirements: Vec<HubRequirement>,
    pub updated_requirements: Vec<HubRequirement>,
    pub created_releases: Vec<HubRelease>,
    pub added_comments: Vec<(ArtifactKind, HubComment)>,
    pub added_url_documents: Vec<(ArtifactKind, i64, String, String)>,
    pub added_file_documents: Vec<(ArtifactKind, i64, String, usize)>,
    pub added_mappings: Vec<(MappingScope, Vec<Mapping>)>,
    pub removed_mappings: Vec<(MappingScope, Vec<Mapping>)>,

    next_id: i64,
}

impl MockHub {
    pub fn new() -> Self {
        MockHub {
            base_web_url: "https://hub.example.com".to_string(),
            next_id: 1000,
            ..MockHub::default()
        }
    }

    fn assign_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn validation_fault() -> HubError {
        HubError::Validation {
            summary: "artifact rejected".into(),
            messages: vec![
                FieldMessage {
                    field: "Name".into(),
                    message: "is required".into(),
                },
                FieldMessage {
                    field: "OwnerId".into(),
                    message: "unknown user".into(),
                },
            ],
        }
    }
}

impl HubService for MockHub {
    fn authenticate(&mut self) -> HubResult<()> {
        if self.fail_auth {
            return Err(HubError::Auth("mock auth failure".into()));
        }
        self.auth_count += 1;
        Ok(())
    }

    fn connect_project(&mut self, project_id: i64) -> HubResult<()> {
        if self.fail_connect.contains(&project_id) {
            return Err(HubError::NotFound(format!("project {}", project_id)));
        }
        self.connects.push(project_id);
        Ok(())
    }

    fn disconnect(&mut self) {
        self.disconnected = true;
    }

    fn project_mappings(&mut self) -> HubResult<Vec<Mapping>> {
        Ok(self.project_mappings.clone())
    }

    fn user_mappings(&mut self) -> HubResult<Vec<Mapping>> {
        Ok(self.user_mappings.clone())
    }

    fn artifact_mappings(&mut self, kind: ArtifactKind) -> HubResult<Vec<Mapping>> {
        Ok(match kind {
            ArtifactKind::Incident => self.incident_mappings.clone(),
            ArtifactKind::Requirement => self.requirement_mappings.clone(),
            ArtifactKind::Release => self.release_mappings.clone(),
        })
    }

    fn field_value_mappings(&mut self, field: HubField) -> HubResult<Vec<Mapping>> {
        Ok(self.field_mappings.get(&field).cloned().unwrap_or_default())
    }

    fn custom_property_definitions(
        &mut self,
        kind: ArtifactKind,
    ) -> HubResult<Vec<CustomPropertyDefinition>> {
        Ok(match kind {
            ArtifactKind::Incident => self.incident_props.clone(),
            _ => self.requirement_props.clone(),
        })
    }

    fn custom_property_mappings(&mut self, kind: ArtifactKind) -> HubResult<Vec<Mapping>> {
        Ok(match kind {
            ArtifactKind::Incident => self.incident_prop_mappings.clone(),
            _ => self.requirement_prop_mappings.clone(),
        })
    }

    fn custom_property_value_mappings(
        &mut self,
        kind: ArtifactKind,
        property_number: u8,
    ) -> HubResult<Vec<Mapping>> {
        Ok(self
            .value_mappings
            .get(&(kind, property_number))
            .cloned()
            .unwrap_or_default())
    }

    fn add_mappings(&mut self, scope: MappingScope, mappings: &[Mapping]) -> HubResult<()> {
        self.added_mappings.push((scope, mappings.to_vec()));
        // Fold into the backing tables so a later run sees flushed state.
        let backing = match scope {
            MappingScope::Artifact(ArtifactKind::Incident) => &mut self.incident_mappings,
            MappingScope::Artifact(ArtifactKind::Requirement) => &mut self.requirement_mappings,
            MappingScope::Artifact(ArtifactKind::Release) => &mut self.release_mappings,
            MappingScope::User => &mut self.user_mappings,
            MappingScope::Project => &mut self.project_mappings,
            _ => return Ok(()),
        };
        backing.extend(mappings.iter().cloned());
        Ok(())
    }

    fn remove_mappings(&mut self, scope: MappingScope, mappings: &[Mapping]) -> HubResult<()> {
        self.removed_mappings.push((scope, mappings.to_vec()));
        Ok(())
    }

    fn incidents_page(&mut self, start: usize, count: usize) -> HubResult<Vec<HubIncident>> {
        Ok(self
            .incidents
            .iter()
            .skip(start)
            .take(count)
            .cloned()
            .collect())
    }

    fn incidents_page_since(
        &mut self,
        since: DateTime<Utc>,
        start: usize,
        count: usize,
    ) -> HubResult<Vec<HubIncident>> {
        Ok(self
            .incidents
            .iter()
            .filter(|i| i.creation_date.is_some_and(|c| c >= since))
            .skip(start)
            .take(count)
            .cloned()
            .collect())
    }

    fn incident_by_id(&mut self, id: i64) -> HubResult<HubIncident> {
        self.incidents
            .iter()
            .chain(self.created_incidents.iter())
            .find(|i| i.id == Some(id))
            .cloned()
            .ok_or_else(|| HubError::NotFound(format!("incident {}", id)))
    }

    fn create_incident(&mut self, incident: &HubIncident) -> HubResult<HubIncident> {
        if self.fail_create_validation {
            return Err(Self::validation_fault());
        }
        let mut created = incident.clone();
        created.id = Some(self.assign_id());
        self.created_incidents.push(created.clone());
        Ok(created)
    }

    fn update_incident(&mut self, incident: &HubIncident) -> HubResult<()> {
        self.updated_incidents.push(incident.clone());
        Ok(())
    }

    fn requirement_by_id(&mut self, id: i64) -> HubResult<HubRequirement> {
        self.requirements
            .iter()
            .chain(self.created_requirements.iter())
            .find(|r| r.id == Some(id))
            .cloned()
            .ok_or_else(|| HubError::NotFound(format!("requirement {}", id)))
    }

    fn create_requirement(&mut self, requirement: &HubRequirement) -> HubResult<HubRequirement> {
        if self.fail_create_validation {
            return Err(Self::validation_fault());
        }
        let mut created = requirement.clone();
        created.id = Some(self.assign_id());
        self.created_requirements.push(created.clone());
        Ok(created)
    }

    fn update_requirement(&mut self, requirement: &HubRequirement) -> HubResult<()> {
        self.updated_requirements.push(requirement.clone());
        Ok(())
    }

    fn releases(&mut self) -> HubResult<Vec<HubRelease>> {
        Ok(self.releases.clone())
    }

    fn create_release(&mut self, release: &HubRelease) -> HubResult<HubRelease> {
        let mut created = release.clone();
        created.id = Some(self.assign_id());
        self.created_releases.push(created.clone());
        Ok(created)
    }

    fn comments(&mut self, kind: ArtifactKind, artifact_id: i64) -> HubResult<Vec<HubComment>> {
        Ok(self
            .comments
            .get(&(kind, artifact_id))
            .cloned()
            .unwrap_or_default())
    }

    fn add_comments(&mut self, kind: ArtifactKind, comments: &[HubComment]) -> HubResult<()> {
        for comment in comments {
            self.added_comments.push((kind, comment.clone()));
        }
        Ok(())
    }

    fn documents(&mut self, kind: ArtifactKind, artifact_id: i64) -> HubResult<Vec<HubDocument>> {
        Ok(self
            .documents
            .get(&(kind, artifact_id))
            .cloned()
            .unwrap_or_default())
    }

    fn document_bytes(&mut self, document_id: i64) -> HubResult<Vec<u8>> {
        self.document_data
            .get(&document_id)
            .cloned()
            .ok_or_else(|| HubError::NotFound(format!("document {}", document_id)))
    }

    fn add_file_document(
        &mut self,
        kind: ArtifactKind,
        artifact_id: i64,
        filename: &str,
        data: &[u8],
    ) -> HubResult<()> {
        self.added_file_documents
            .push((kind, artifact_id, filename.to_string(), data.len()));
        Ok(())
    }

    fn add_url_document(
        &mut self,
        kind: ArtifactKind,
        artifact_id: i64,
        url: &str,
        name: &str,
    ) -> HubResult<()> {
        self.added_url_documents
            .push((kind, artifact_id, url.to_string(), name.to_string()));
        Ok(())
    }

    fn incident_associations(&mut self, incident_id: i64) -> HubResult<Vec<HubAssociation>> {
        Ok(self
            .associations
            .get(&incident_id)
            .cloned()
            .unwrap_or_default())
    }

    fn user_by_id(&mut self, id: i64) -> HubResult<Option<HubUser>> {
        Ok(self.users.iter().find(|u| u.id == id).cloned())
    }

    fn user_by_login(&mut self, login: &str) -> HubResult<Option<HubUser>> {
        Ok(self.users.iter().find(|u| u.login == login).cloned())
    }

    fn artifact_url(
        &mut self,
        target: AssociationKind,
        project_id: i64,
        artifact_id: i64,
    ) -> HubResult<String> {
        Ok(format!(
            "{}/{}/{}/{}",
            self.base_web_url,
            target.as_str().replace(' ', "-"),
            project_id,
            artifact_id
        ))
    }
}
