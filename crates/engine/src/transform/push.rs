// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Hub → Tracker artifact transformer.
//!
//! Builds a Tracker issue from a Hub incident, creates it, buffers the
//! artifact mapping, and records the cross-system links, attachments, and
//! associations. Link and attachment failures degrade to warnings; the
//! created issue stands either way.

use tracklink_core::artifact::{AssociationKind, DocumentKind};
use tracklink_core::{
    ArtifactKind, CreateMeta, HubIncident, Mapping, MappingScope, NamedId, TrackerIssue,
    TrackerVersion,
};

use crate::config::EngineConfig;
use crate::context::ProjectContext;
use crate::error::Result;
use crate::eventlog::EventLog;
use crate::htmltext::html_to_text;
use crate::hub::HubService;
use crate::tracker::{TrackerClient, Transport};
use crate::transform::value::{self, ValueTables, SENTINEL_ISSUE_KEY};

/// What one push attempt did.
#[derive(Debug, PartialEq, Eq)]
pub enum PushOutcome {
    Created { key: String },
    Skipped,
}

/// Pushes one Hub incident into the Tracker.
///
/// The caller has already applied the gating properties, resolved the
/// target project key, and checked the artifact mapping for idempotency.
#[allow(clippy::too_many_arguments)]
pub fn push_incident<T: Transport>(
    config: &EngineConfig,
    log: &EventLog,
    hub: &mut dyn HubService,
    tracker: &mut TrackerClient<T>,
    ctx: &mut ProjectContext,
    meta: &CreateMeta,
    tracker_components: &[NamedId],
    project_key: &str,
    incident: &HubIncident,
) -> Result<PushOutcome> {
    let Some(incident_id) = incident.id else {
        return Ok(PushOutcome::Skipped);
    };

    let Some(issue) = build_issue(
        config,
        log,
        hub,
        tracker,
        ctx,
        tracker_components,
        project_key,
        incident,
    )?
    else {
        return Ok(PushOutcome::Skipped);
    };

    let key = tracker.create_issue(&issue, meta)?;
    log.trace(&format!("created tracker issue {} for incident {}", key, incident_id));

    ctx.incidents.add(Mapping::new(
        MappingScope::Artifact(ArtifactKind::Incident),
        Some(ctx.project_id),
        incident_id,
        key.clone(),
    ));

    link_both_ways(log, hub, tracker, ctx.project_id, incident, incident_id, &key);
    copy_attachments(log, hub, tracker, incident_id, &key);
    link_associations(config, log, hub, tracker, ctx, incident_id, &key);
    write_back_issue_key(log, hub, ctx, incident, &key);

    Ok(PushOutcome::Created { key })
}

/// Builds the Tracker issue payload for an incident. Returns `None` when a
/// critical mapping (the issue type) is missing.
#[allow(clippy::too_many_arguments)]
fn build_issue<T: Transport>(
    config: &EngineConfig,
    log: &EventLog,
    hub: &mut dyn HubService,
    tracker: &mut TrackerClient<T>,
    ctx: &mut ProjectContext,
    tracker_components: &[NamedId],
    project_key: &str,
    incident: &HubIncident,
) -> Result<Option<TrackerIssue>> {
    let scope = ctx.scope();

    let issue_type = incident
        .type_id
        .and_then(|id| ctx.incident_types.by_internal_id(scope, id))
        .map(|m| NamedId::from_id(m.external_key.clone()));
    let Some(issue_type) = issue_type else {
        log.warn(&format!(
            "no issue-type mapping for incident type {:?}; skipping incident {:?}",
            incident.type_id, incident.id
        ));
        return Ok(None);
    };

    let mut issue = TrackerIssue::new(project_key);
    issue.issue_type = issue_type;
    issue.summary = incident.name.clone();
    issue.description = Some(html_to_text(&incident.description));

    issue.priority = incident
        .priority_id
        .and_then(|id| ctx.priorities.by_internal_id(scope, id))
        .map(|m| NamedId::from_id(m.external_key.clone()));
    if incident.priority_id.is_some() && issue.priority.is_none() {
        log.warn(&format!(
            "no priority mapping for hub priority {:?}",
            incident.priority_id
        ));
    }

    if let Some(opener) = incident.opener_id {
        match ctx.users.by_internal_id(hub, opener) {
            Ok(Some(m)) => issue.reporter = Some(m.external_key),
            Ok(None) => log.warn(&format!("no user mapping for opener {}", opener)),
            Err(e) => log.warn(&format!("user lookup failed for opener {}: {}", opener, e)),
        }
    }
    if let Some(owner) = incident.owner_id {
        match ctx.users.by_internal_id(hub, owner) {
            Ok(Some(m)) => issue.assignee = Some(m.external_key),
            Ok(None) => log.warn(&format!("no user mapping for owner {}", owner)),
            Err(e) => log.warn(&format!("user lookup failed for owner {}: {}", owner, e)),
        }
    }

    issue.due_date = incident.start_date.map(|d| d.date_naive());

    for component_id in &incident.component_ids {
        match ctx.components.by_internal_id(scope, *component_id) {
            Some(m) => issue.components.push(NamedId::from_name(m.external_key.clone())),
            None => log.warn(&format!("no component mapping for {}", component_id)),
        }
    }

    if let Some(release_id) = incident.detected_release_id {
        if let Some(version) = resolve_version(log, hub, tracker, ctx, project_key, release_id)? {
            issue.versions.push(version);
        }
    }
    if let Some(release_id) = incident.resolved_release_id {
        if let Some(version) = resolve_version(log, hub, tracker, ctx, project_key, release_id)? {
            issue.fix_versions.push(version);
        }
    }

    let ProjectContext {
        ref incident_props,
        ref incident_prop_mappings,
        ref incident_value_mappings,
        ref users,
        project_id,
        ..
    } = *ctx;
    let tables = ValueTables {
        definitions: incident_props,
        prop_mappings: incident_prop_mappings,
        value_mappings: incident_value_mappings,
        project: Some(project_id),
    };
    value::push_custom_properties(
        &tables,
        users,
        hub,
        tracker_components,
        config.use_security_level,
        log,
        incident,
        &mut issue,
    );

    Ok(Some(issue))
}

/// Resolves a Hub release to a Tracker version reference, provisioning the
/// version when no mapping exists yet.
fn resolve_version<T: Transport>(
    log: &EventLog,
    hub: &mut dyn HubService,
    tracker: &mut TrackerClient<T>,
    ctx: &mut ProjectContext,
    project_key: &str,
    release_id: i64,
) -> Result<Option<TrackerVersion>> {
    let scope = ctx.scope();
    if let Some(mapping) = ctx.releases.by_internal_id(scope, release_id) {
        return Ok(Some(TrackerVersion {
            id: Some(mapping.external_key.clone()),
            ..TrackerVersion::default()
        }));
    }

    let releases = hub.releases()?;
    let Some(release) = releases.iter().find(|r| r.id == Some(release_id)) else {
        log.warn(&format!("hub release {} not found", release_id));
        return Ok(None);
    };

    // Without a persisted mapping the version may exist from an earlier
    // run; probe by name before creating.
    let existing = tracker
        .versions(project_key)?
        .into_iter()
        .find(|v| v.name.eq_ignore_ascii_case(&release.version_number));
    let stored = match existing {
        Some(version) => version,
        None => {
            let version = TrackerVersion {
                name: release.version_number.clone(),
                released: false,
                archived: false,
                release_date: release.end_date.map(|d| d.date_naive()),
                ..TrackerVersion::default()
            };
            let created = tracker.create_version(project_key, &version)?;
            log.trace(&format!(
                "provisioned tracker version {:?} for release {}",
                created.id, release_id
            ));
            created
        }
    };
    if let Some(version_id) = &stored.id {
        ctx.releases.add(Mapping::new(
            MappingScope::Artifact(ArtifactKind::Release),
            Some(ctx.project_id),
            release_id,
            version_id.clone(),
        ));
    }
    Ok(Some(stored))
}

/// Two independent one-way links: a Tracker web link back to the Hub
/// artifact, and a Hub URL document pointing at the new issue. Each
/// tolerates failure on its own.
fn link_both_ways<T: Transport>(
    log: &EventLog,
    hub: &mut dyn HubService,
    tracker: &mut TrackerClient<T>,
    project_id: i64,
    incident: &HubIncident,
    incident_id: i64,
    key: &str,
) {
    match hub.artifact_url(AssociationKind::Incident, project_id, incident_id) {
        Ok(url) => {
            if let Err(e) = tracker.add_web_link(key, &url, &incident.name) {
                log.warn(&format!("web link on {} failed: {}", key, e));
            }
        }
        Err(e) => log.warn(&format!("could not resolve hub url for incident {}: {}", incident_id, e)),
    }

    let browse = tracker.browse_url(key);
    if let Err(e) = hub.add_url_document(
        ArtifactKind::Incident,
        incident_id,
        &browse,
        &format!("Tracker issue {}", key),
    ) {
        log.warn(&format!("hub url document for {} failed: {}", key, e));
    }
}

/// Uploads the incident's stored documents as issue attachments; URL
/// documents become web links.
fn copy_attachments<T: Transport>(
    log: &EventLog,
    hub: &mut dyn HubService,
    tracker: &mut TrackerClient<T>,
    incident_id: i64,
    key: &str,
) {
    let documents = match hub.documents(ArtifactKind::Incident, incident_id) {
        Ok(docs) => docs,
        Err(e) => {
            log.warn(&format!("could not list documents for incident {}: {}", incident_id, e));
            return;
        }
    };
    for doc in documents {
        let result = match doc.kind {
            DocumentKind::File => doc
                .id
                .ok_or_else(|| "document has no id".to_string())
                .and_then(|id| hub.document_bytes(id).map_err(|e| e.to_string()))
                .and_then(|bytes| {
                    tracker
                        .add_attachment(key, &doc.filename_or_url, bytes)
                        .map_err(|e| e.to_string())
                }),
            DocumentKind::Url => tracker
                .add_web_link(
                    key,
                    &doc.filename_or_url,
                    doc.description.as_deref().unwrap_or(&doc.filename_or_url),
                )
                .map_err(|e| e.to_string()),
        };
        if let Err(e) = result {
            log.warn(&format!(
                "attachment transfer '{}' to {} failed: {}",
                doc.filename_or_url, key, e
            ));
        }
    }
}

/// Incident-to-incident associations become issue links of the configured
/// type; requirement and test-run associations become web links to the Hub.
fn link_associations<T: Transport>(
    config: &EngineConfig,
    log: &EventLog,
    hub: &mut dyn HubService,
    tracker: &mut TrackerClient<T>,
    ctx: &ProjectContext,
    incident_id: i64,
    key: &str,
) {
    let associations = match hub.incident_associations(incident_id) {
        Ok(list) => list,
        Err(e) => {
            log.warn(&format!(
                "could not list associations for incident {}: {}",
                incident_id, e
            ));
            return;
        }
    };
    for assoc in associations {
        match assoc.dest_kind {
            AssociationKind::Incident => {
                let Some(dest_key) = ctx
                    .incidents
                    .by_internal_id(ctx.scope(), assoc.dest_id)
                    .map(|m| m.external_key.clone())
                else {
                    continue;
                };
                if let Err(e) = tracker.add_issue_link(
                    &config.incident_link_type,
                    key,
                    &dest_key,
                    assoc.comment.as_deref(),
                ) {
                    log.warn(&format!("issue link {} -> {} failed: {}", key, assoc.dest_id, e));
                }
            }
            AssociationKind::Requirement | AssociationKind::TestRun => {
                match hub.artifact_url(assoc.dest_kind, ctx.project_id, assoc.dest_id) {
                    Ok(url) => {
                        let label = format!("{} {}", assoc.dest_kind.as_str(), assoc.dest_id);
                        if let Err(e) = tracker.add_web_link(key, &url, &label) {
                            log.warn(&format!("web link {} -> {} failed: {}", key, url, e));
                        }
                    }
                    Err(e) => log.warn(&format!(
                        "could not resolve hub url for association {}: {}",
                        assoc.dest_id, e
                    )),
                }
            }
        }
    }
}

/// Writes the assigned Tracker key into the slot mapped to the issue-key
/// sentinel, when the catalog declares one.
fn write_back_issue_key(
    log: &EventLog,
    hub: &mut dyn HubService,
    ctx: &ProjectContext,
    incident: &HubIncident,
    key: &str,
) {
    let slot = ctx
        .incident_prop_mappings
        .entries()
        .iter()
        .find(|m| m.external_key == SENTINEL_ISSUE_KEY)
        .and_then(|m| u8::try_from(m.internal_id).ok());
    let Some(slot) = slot else {
        return;
    };

    let mut updated = incident.clone();
    if updated
        .set_custom_property(slot, tracklink_core::TypedValue::Text(key.to_string()))
        .is_err()
    {
        log.warn(&format!("issue-key slot {} is out of range", slot));
        return;
    }
    if let Err(e) = hub.update_incident(&updated) {
        log.warn(&format!(
            "could not write issue key {} back onto incident {:?}: {}",
            key, incident.id, e
        ));
    }
}
