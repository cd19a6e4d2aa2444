// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Per-project sync state: every mapping table, catalog, and resolver one
//! project pair needs for a push/pull cycle.
//!
//! Tables are loaded right after the project connect, reloaded between the
//! two phases, and flushed at the end-of-project checkpoint. All
//! per-project mappings carry `hub_project_id = Some(project_id)`; the user
//! table is system-global.

use std::collections::BTreeMap;

use tracklink_core::{ArtifactKind, CustomPropertyDefinition, CustomPropertyKind, MappingScope};

use crate::config::EngineConfig;
use crate::hub::{HubField, HubResult, HubService};
use crate::mapping::{MappingTable, UserResolver};

/// Everything the engine holds for one connected project.
pub struct ProjectContext {
    pub project_id: i64,
    /// Default Tracker project key (uppercased), overridable per incident.
    pub default_key: String,

    pub incidents: MappingTable,
    pub requirements: MappingTable,
    pub releases: MappingTable,

    pub statuses: MappingTable,
    pub priorities: MappingTable,
    pub severities: MappingTable,
    pub incident_types: MappingTable,
    pub requirement_statuses: MappingTable,
    pub requirement_types: MappingTable,
    pub importances: MappingTable,
    pub components: MappingTable,

    pub users: UserResolver,

    pub incident_props: Vec<CustomPropertyDefinition>,
    pub requirement_props: Vec<CustomPropertyDefinition>,
    pub incident_prop_mappings: MappingTable,
    pub requirement_prop_mappings: MappingTable,
    /// Option-value tables keyed by custom-property slot.
    pub incident_value_mappings: BTreeMap<u8, MappingTable>,
    pub requirement_value_mappings: BTreeMap<u8, MappingTable>,
}

impl ProjectContext {
    /// Loads every table for a freshly connected project.
    pub fn load(
        hub: &mut dyn HubService,
        config: &EngineConfig,
        project_id: i64,
        default_key: &str,
    ) -> HubResult<Self> {
        let user_table = if config.auto_map_users {
            MappingTable::new(MappingScope::User)
        } else {
            MappingTable::load(MappingScope::User, hub.user_mappings()?)
        };

        let incident_props = hub.custom_property_definitions(ArtifactKind::Incident)?;
        let requirement_props = hub.custom_property_definitions(ArtifactKind::Requirement)?;
        let incident_value_mappings =
            load_value_tables(hub, ArtifactKind::Incident, &incident_props)?;
        let requirement_value_mappings =
            load_value_tables(hub, ArtifactKind::Requirement, &requirement_props)?;

        Ok(ProjectContext {
            project_id,
            default_key: default_key.to_uppercase(),
            incidents: MappingTable::load(
                MappingScope::Artifact(ArtifactKind::Incident),
                hub.artifact_mappings(ArtifactKind::Incident)?,
            ),
            requirements: MappingTable::load(
                MappingScope::Artifact(ArtifactKind::Requirement),
                hub.artifact_mappings(ArtifactKind::Requirement)?,
            ),
            releases: MappingTable::load(
                MappingScope::Artifact(ArtifactKind::Release),
                hub.artifact_mappings(ArtifactKind::Release)?,
            ),
            statuses: field_table(hub, HubField::IncidentStatus)?,
            priorities: field_table(hub, HubField::IncidentPriority)?,
            severities: field_table(hub, HubField::IncidentSeverity)?,
            incident_types: field_table(hub, HubField::IncidentType)?,
            requirement_statuses: field_table(hub, HubField::RequirementStatus)?,
            requirement_types: field_table(hub, HubField::RequirementType)?,
            importances: field_table(hub, HubField::RequirementImportance)?,
            components: field_table(hub, HubField::Component)?,
            users: UserResolver::new(user_table, config.auto_map_users),
            incident_props,
            requirement_props,
            incident_prop_mappings: MappingTable::load(
                MappingScope::CustomProperty,
                hub.custom_property_mappings(ArtifactKind::Incident)?,
            ),
            requirement_prop_mappings: MappingTable::load(
                MappingScope::CustomProperty,
                hub.custom_property_mappings(ArtifactKind::Requirement)?,
            ),
            incident_value_mappings,
            requirement_value_mappings,
        })
    }

    /// The project scope passed to mapping lookups.
    pub fn scope(&self) -> Option<i64> {
        Some(self.project_id)
    }

    /// Re-reads the artifact mapping tables between the push and pull
    /// phases. In-run additions stay visible.
    pub fn reload_artifact_mappings(&mut self, hub: &mut dyn HubService) -> HubResult<()> {
        self.incidents
            .reload(hub.artifact_mappings(ArtifactKind::Incident)?);
        self.requirements
            .reload(hub.artifact_mappings(ArtifactKind::Requirement)?);
        self.releases
            .reload(hub.artifact_mappings(ArtifactKind::Release)?);
        Ok(())
    }

    /// End-of-project checkpoint: flushes buffered mapping changes.
    ///
    /// Release mappings for auto-provisioned versions are only persisted
    /// when the engine option says so; otherwise the buffered entries are
    /// dropped and the same version is re-probed on the next run.
    pub fn flush(&mut self, hub: &mut dyn HubService, persist_releases: bool) -> HubResult<()> {
        self.incidents.flush(hub)?;
        self.requirements.flush(hub)?;
        if persist_releases {
            self.releases.flush(hub)?;
        } else {
            let dropped = self.releases.take_added();
            if !dropped.is_empty() {
                tracing::debug!(count = dropped.len(), "release mappings not persisted");
            }
            let removed = self.releases.take_removed();
            if !removed.is_empty() {
                hub.remove_mappings(MappingScope::Artifact(ArtifactKind::Release), &removed)?;
            }
        }
        Ok(())
    }
}

fn field_table(hub: &mut dyn HubService, field: HubField) -> HubResult<MappingTable> {
    Ok(MappingTable::load(
        MappingScope::CustomPropertyValue,
        hub.field_value_mappings(field)?,
    ))
}

fn load_value_tables(
    hub: &mut dyn HubService,
    kind: ArtifactKind,
    definitions: &[CustomPropertyDefinition],
) -> HubResult<BTreeMap<u8, MappingTable>> {
    let mut tables = BTreeMap::new();
    for def in definitions {
        if matches!(
            def.kind,
            CustomPropertyKind::List | CustomPropertyKind::MultiList
        ) {
            tables.insert(
                def.number,
                MappingTable::load(
                    MappingScope::CustomPropertyValue,
                    hub.custom_property_value_mappings(kind, def.number)?,
                ),
            );
        }
    }
    Ok(tables)
}
