// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Tracker → Hub artifact transformer.
//!
//! Routes each pulled issue into a Hub incident or requirement, creating
//! the artifact when no mapping exists (unless the engine is restricted to
//! the Hub→Tracker flow) and updating it in place otherwise. Comments
//! de-duplicate on body; releases auto-provision; attachments re-upload as
//! Hub documents.

use chrono::{DateTime, Duration, Utc};

use tracklink_core::artifact::AssociationKind;
use tracklink_core::{
    ArtifactKind, HubComment, HubIncident, HubRelease, HubRequirement, Mapping, MappingScope,
    TrackerIssue, TrackerVersion, TypedValue,
};

use crate::config::EngineConfig;
use crate::context::ProjectContext;
use crate::error::Result;
use crate::eventlog::EventLog;
use crate::htmltext::text_to_html;
use crate::hub::{HubError, HubService};
use crate::tracker::{TrackerClient, Transport};
use crate::transform::value::{self, ValueTables};

/// What one pull attempt did.
#[derive(Debug, PartialEq, Eq)]
pub enum PullOutcome {
    Created(i64),
    Updated(i64),
    Skipped,
}

/// Name stub for artifacts created from an issue with an empty summary.
const NAME_STUB: &str = "Untitled";
/// Description stub for artifacts created from an issue with no body.
const DESCRIPTION_STUB: &str = "No description provided.";

/// Fallback requirement status: Requested.
const DEFAULT_REQUIREMENT_STATUS_ID: i64 = 1;
/// Fallback requirement type: User Story.
const DEFAULT_REQUIREMENT_TYPE_ID: i64 = 4;

/// The Hub caps version numbers at ten characters.
const VERSION_NUMBER_MAX_CHARS: usize = 10;
/// Planned release status.
const RELEASE_STATUS_PLANNED: i64 = 1;
/// Major release type.
const RELEASE_TYPE_MAJOR: i64 = 1;

/// Pulls one Tracker issue into a Hub incident.
pub fn pull_incident<T: Transport>(
    config: &EngineConfig,
    log: &EventLog,
    hub: &mut dyn HubService,
    tracker: &mut TrackerClient<T>,
    ctx: &mut ProjectContext,
    issue: &TrackerIssue,
    now: DateTime<Utc>,
) -> Result<PullOutcome> {
    let Some(key) = issue.key.clone() else {
        return Ok(PullOutcome::Skipped);
    };
    let scope = ctx.scope();

    let mapping = ctx.incidents.by_external_key(scope, &key, false).cloned();
    let (mut incident, is_new) = match mapping {
        Some(m) => match hub.incident_by_id(m.internal_id) {
            Ok(existing) => (existing, false),
            Err(HubError::NotFound(_)) => {
                log.warn(&format!(
                    "incident {} mapped to {} no longer exists; mapping queued for removal",
                    m.internal_id, key
                ));
                ctx.incidents.mark_removed(m);
                return Ok(PullOutcome::Skipped);
            }
            Err(e) => return Err(e.into()),
        },
        None => {
            if config.only_create_new_in_tracker {
                log.trace(&format!("skipping unmapped issue {} (tracker-only creation)", key));
                return Ok(PullOutcome::Skipped);
            }
            let incident = HubIncident {
                project_id: ctx.project_id,
                creation_date: issue.created.or(Some(now)),
                ..HubIncident::default()
            };
            (incident, true)
        }
    };

    if !issue.summary.is_empty() {
        incident.name = issue.summary.clone();
    } else if is_new {
        incident.name = NAME_STUB.to_string();
    }
    match issue.description.as_deref() {
        Some(text) if !text.is_empty() => incident.description = text_to_html(text),
        _ if is_new => incident.description = text_to_html(DESCRIPTION_STUB),
        _ => {}
    }

    // A missing issue-type mapping skips creation entirely; updates keep
    // the existing type.
    let type_mapping = issue
        .issue_type
        .id
        .as_deref()
        .and_then(|id| ctx.incident_types.by_external_key(scope, id, false));
    match type_mapping {
        Some(m) => incident.type_id = Some(m.internal_id),
        None if is_new => {
            log.warn(&format!(
                "no incident-type mapping for tracker type {:?}; skipping issue {}",
                issue.issue_type.id, key
            ));
            return Ok(PullOutcome::Skipped);
        }
        None => log.warn(&format!(
            "no incident-type mapping for tracker type {:?} on issue {}",
            issue.issue_type.id, key
        )),
    }

    apply_enum(
        log,
        &ctx.statuses,
        scope,
        issue.status.as_ref().and_then(|s| s.id.as_deref()),
        &mut incident.status_id,
        "status",
        &key,
    );
    apply_enum(
        log,
        &ctx.priorities,
        scope,
        issue.priority.as_ref().and_then(|p| p.id.as_deref()),
        &mut incident.priority_id,
        "priority",
        &key,
    );

    if let Some(field_id) = config.severity_custom_field_id {
        apply_severity(log, ctx, scope, issue, field_id, &mut incident, &key);
    }

    if let Some(assignee) = &issue.assignee {
        match ctx.users.by_external_key(hub, assignee) {
            Ok(Some(m)) => incident.owner_id = Some(m.internal_id),
            Ok(None) => log.warn(&format!("no user mapping for assignee '{}'", assignee)),
            Err(e) => log.warn(&format!("user lookup failed for '{}': {}", assignee, e)),
        }
    }
    if let Some(reporter) = &issue.reporter {
        match ctx.users.by_external_key(hub, reporter) {
            Ok(Some(m)) => incident.opener_id = Some(m.internal_id),
            Ok(None) => log.warn(&format!("no user mapping for reporter '{}'", reporter)),
            Err(e) => log.warn(&format!("user lookup failed for '{}': {}", reporter, e)),
        }
    }

    if let Some(due) = issue.due_date {
        incident.start_date = due
            .and_hms_opt(0, 0, 0)
            .map(|naive| DateTime::from_naive_utc_and_offset(naive, Utc));
    }
    incident.closed_date = issue.resolution_date;

    incident.component_ids.clear();
    for component in &issue.components {
        let Some(name) = component.label() else {
            continue;
        };
        match ctx.components.by_external_key(scope, name, false) {
            Some(m) => incident.component_ids.push(m.internal_id),
            None => log.warn(&format!("no component mapping for '{}'", name)),
        }
    }

    if let Some(version) = issue.versions.first() {
        incident.detected_release_id = resolve_release(log, hub, ctx, version, now)?;
    }
    if let Some(version) = issue.fix_versions.first() {
        incident.resolved_release_id = resolve_release(log, hub, ctx, version, now)?;
    }

    let slots = {
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
        value::pull_custom_properties(&tables, users, hub, log, issue)
    };
    incident.custom_properties.extend(slots);

    let incident_id = if is_new {
        let created = hub.create_incident(&incident)?;
        let Some(id) = created.id else {
            return Err(HubError::Transport("incident create returned no id".into()).into());
        };
        ctx.incidents.add(Mapping::new(
            MappingScope::Artifact(ArtifactKind::Incident),
            Some(ctx.project_id),
            id,
            key.clone(),
        ));
        link_both_ways(
            log,
            hub,
            tracker,
            ArtifactKind::Incident,
            AssociationKind::Incident,
            ctx.project_id,
            id,
            &incident.name,
            &key,
        );
        id
    } else {
        hub.update_incident(&incident)?;
        incident.id.unwrap_or_default()
    };

    copy_comments(log, hub, ctx, ArtifactKind::Incident, incident_id, issue)?;
    copy_attachments(log, hub, tracker, ArtifactKind::Incident, incident_id, issue);

    if is_new {
        Ok(PullOutcome::Created(incident_id))
    } else {
        Ok(PullOutcome::Updated(incident_id))
    }
}

/// Pulls one Tracker issue into a Hub requirement.
pub fn pull_requirement<T: Transport>(
    config: &EngineConfig,
    log: &EventLog,
    hub: &mut dyn HubService,
    tracker: &mut TrackerClient<T>,
    ctx: &mut ProjectContext,
    issue: &TrackerIssue,
    now: DateTime<Utc>,
) -> Result<PullOutcome> {
    let Some(key) = issue.key.clone() else {
        return Ok(PullOutcome::Skipped);
    };
    let scope = ctx.scope();

    let mapping = ctx.requirements.by_external_key(scope, &key, false).cloned();
    let (mut requirement, is_new) = match mapping {
        Some(m) => match hub.requirement_by_id(m.internal_id) {
            Ok(existing) => (existing, false),
            Err(HubError::NotFound(_)) => {
                log.warn(&format!(
                    "requirement {} mapped to {} no longer exists; mapping queued for removal",
                    m.internal_id, key
                ));
                ctx.requirements.mark_removed(m);
                return Ok(PullOutcome::Skipped);
            }
            Err(e) => return Err(e.into()),
        },
        None => {
            if config.only_create_new_in_tracker {
                log.trace(&format!("skipping unmapped issue {} (tracker-only creation)", key));
                return Ok(PullOutcome::Skipped);
            }
            let requirement = HubRequirement {
                project_id: ctx.project_id,
                creation_date: issue.created.or(Some(now)),
                ..HubRequirement::default()
            };
            (requirement, true)
        }
    };

    if !issue.summary.is_empty() {
        requirement.name = issue.summary.clone();
    } else if is_new {
        requirement.name = NAME_STUB.to_string();
    }
    match issue.description.as_deref() {
        Some(text) if !text.is_empty() => requirement.description = text_to_html(text),
        _ if is_new => requirement.description = text_to_html(DESCRIPTION_STUB),
        _ => {}
    }

    let type_mapping = issue
        .issue_type
        .id
        .as_deref()
        .and_then(|id| ctx.requirement_types.by_external_key(scope, id, false));
    match type_mapping {
        Some(m) => requirement.requirement_type_id = Some(m.internal_id),
        None if is_new => {
            log.warn(&format!(
                "no requirement-type mapping for tracker type {:?} on {}; defaulting to {}",
                issue.issue_type.id, key, DEFAULT_REQUIREMENT_TYPE_ID
            ));
            requirement.requirement_type_id = Some(DEFAULT_REQUIREMENT_TYPE_ID);
        }
        None => log.warn(&format!(
            "no requirement-type mapping for tracker type {:?} on issue {}",
            issue.issue_type.id, key
        )),
    }

    let status_mapping = issue
        .status
        .as_ref()
        .and_then(|s| s.id.as_deref())
        .and_then(|id| ctx.requirement_statuses.by_external_key(scope, id, false));
    match status_mapping {
        Some(m) => requirement.status_id = Some(m.internal_id),
        None if is_new => {
            log.warn(&format!(
                "no requirement-status mapping for tracker status {:?} on {}; defaulting to {}",
                issue.status.as_ref().and_then(|s| s.id.as_deref()),
                key,
                DEFAULT_REQUIREMENT_STATUS_ID
            ));
            requirement.status_id = Some(DEFAULT_REQUIREMENT_STATUS_ID);
        }
        None => log.warn(&format!("no requirement-status mapping on issue {}", key)),
    }

    apply_enum(
        log,
        &ctx.importances,
        scope,
        issue.priority.as_ref().and_then(|p| p.id.as_deref()),
        &mut requirement.importance_id,
        "importance",
        &key,
    );

    if let Some(assignee) = &issue.assignee {
        match ctx.users.by_external_key(hub, assignee) {
            Ok(Some(m)) => requirement.owner_id = Some(m.internal_id),
            Ok(None) => log.warn(&format!("no user mapping for assignee '{}'", assignee)),
            Err(e) => log.warn(&format!("user lookup failed for '{}': {}", assignee, e)),
        }
    }
    if let Some(reporter) = &issue.reporter {
        match ctx.users.by_external_key(hub, reporter) {
            Ok(Some(m)) => requirement.author_id = Some(m.internal_id),
            Ok(None) => log.warn(&format!("no user mapping for reporter '{}'", reporter)),
            Err(e) => log.warn(&format!("user lookup failed for '{}': {}", reporter, e)),
        }
    }

    if let Some(version) = issue.fix_versions.first() {
        requirement.release_id = resolve_release(log, hub, ctx, version, now)?;
    }

    let slots = {
        let ProjectContext {
            ref requirement_props,
            ref requirement_prop_mappings,
            ref requirement_value_mappings,
            ref users,
            project_id,
            ..
        } = *ctx;
        let tables = ValueTables {
            definitions: requirement_props,
            prop_mappings: requirement_prop_mappings,
            value_mappings: requirement_value_mappings,
            project: Some(project_id),
        };
        value::pull_custom_properties(&tables, users, hub, log, issue)
    };
    requirement.custom_properties.extend(slots);

    let requirement_id = if is_new {
        let created = hub.create_requirement(&requirement)?;
        let Some(id) = created.id else {
            return Err(HubError::Transport("requirement create returned no id".into()).into());
        };
        ctx.requirements.add(Mapping::new(
            MappingScope::Artifact(ArtifactKind::Requirement),
            Some(ctx.project_id),
            id,
            key.clone(),
        ));
        link_both_ways(
            log,
            hub,
            tracker,
            ArtifactKind::Requirement,
            AssociationKind::Requirement,
            ctx.project_id,
            id,
            &requirement.name,
            &key,
        );
        id
    } else {
        hub.update_requirement(&requirement)?;
        requirement.id.unwrap_or_default()
    };

    copy_comments(log, hub, ctx, ArtifactKind::Requirement, requirement_id, issue)?;
    copy_attachments(log, hub, tracker, ArtifactKind::Requirement, requirement_id, issue);

    if is_new {
        Ok(PullOutcome::Created(requirement_id))
    } else {
        Ok(PullOutcome::Updated(requirement_id))
    }
}

/// Maps one enumerated Tracker id through its table, warning when the
/// mapping is missing and leaving the target untouched.
fn apply_enum(
    log: &EventLog,
    table: &crate::mapping::MappingTable,
    scope: Option<i64>,
    external_id: Option<&str>,
    target: &mut Option<i64>,
    field_name: &str,
    key: &str,
) {
    let Some(external_id) = external_id else {
        return;
    };
    match table.by_external_key(scope, external_id, false) {
        Some(m) => *target = Some(m.internal_id),
        None => log.warn(&format!(
            "no {} mapping for tracker id {} on issue {}",
            field_name, external_id, key
        )),
    }
}

/// Mirrors the configured Tracker severity custom field into the Hub's
/// native severity. Only the first value of a multi-valued field is
/// consulted.
fn apply_severity(
    log: &EventLog,
    ctx: &ProjectContext,
    scope: Option<i64>,
    issue: &TrackerIssue,
    field_id: i64,
    incident: &mut HubIncident,
    key: &str,
) {
    let Some(raw) = issue.custom_fields.get(&field_id) else {
        return;
    };
    let token = match raw {
        TypedValue::List(name) | TypedValue::Text(name) => Some(name.clone()),
        TypedValue::MultiList(names) => names.first().cloned(),
        _ => None,
    };
    let Some(token) = token else {
        log.warn(&format!(
            "severity custom field {} on {} has unusable type {}",
            field_id,
            key,
            raw.type_name()
        ));
        return;
    };
    match ctx.severities.by_external_key(scope, &token, false) {
        Some(m) => incident.severity_id = Some(m.internal_id),
        None => log.warn(&format!("no severity mapping for '{}' on issue {}", token, key)),
    }
}

/// Resolves a Tracker version to a Hub release id, provisioning the
/// release when no mapping exists.
///
/// Provisioned releases mirror the version's release date as the
/// `[date - 1 day, date]` window, or `[today, today + 5 days]` when the
/// version carries none.
fn resolve_release(
    log: &EventLog,
    hub: &mut dyn HubService,
    ctx: &mut ProjectContext,
    version: &TrackerVersion,
    now: DateTime<Utc>,
) -> Result<Option<i64>> {
    let scope = ctx.scope();
    let Some(version_id) = version.id.clone() else {
        return Ok(None);
    };
    if let Some(mapping) = ctx.releases.by_external_key(scope, &version_id, false) {
        return Ok(Some(mapping.internal_id));
    }

    // Without a persisted mapping the release may exist from an earlier
    // run; probe by version number before creating.
    let version_number = truncate_chars(&version.name, VERSION_NUMBER_MAX_CHARS);
    if let Some(existing) = hub
        .releases()?
        .into_iter()
        .find(|r| r.version_number.eq_ignore_ascii_case(&version_number))
    {
        if let Some(existing_id) = existing.id {
            ctx.releases.add(Mapping::new(
                MappingScope::Artifact(ArtifactKind::Release),
                Some(ctx.project_id),
                existing_id,
                version_id,
            ));
            return Ok(Some(existing_id));
        }
    }

    let (start_date, end_date) = match version.release_date {
        Some(date) => {
            let end = date
                .and_hms_opt(0, 0, 0)
                .map(|naive| DateTime::from_naive_utc_and_offset(naive, Utc));
            (end.map(|e| e - Duration::days(1)), end)
        }
        None => (Some(now), Some(now + Duration::days(5))),
    };

    let release = HubRelease {
        id: None,
        project_id: ctx.project_id,
        name: version.name.clone(),
        version_number,
        active: true,
        start_date,
        end_date,
        release_status_id: Some(RELEASE_STATUS_PLANNED),
        release_type_id: Some(RELEASE_TYPE_MAJOR),
    };
    let created = hub.create_release(&release)?;
    let Some(release_id) = created.id else {
        log.warn(&format!("release create for version '{}' returned no id", version.name));
        return Ok(None);
    };
    log.trace(&format!(
        "provisioned hub release {} for tracker version {}",
        release_id, version_id
    ));
    ctx.releases.add(Mapping::new(
        MappingScope::Artifact(ArtifactKind::Release),
        Some(ctx.project_id),
        release_id,
        version_id,
    ));
    Ok(Some(release_id))
}

/// Copies issue comments the artifact does not already have, comparing on
/// body only. The first available author wins; comments whose author does
/// not resolve are written without one, so the Hub attributes them to the
/// sync session.
fn copy_comments(
    log: &EventLog,
    hub: &mut dyn HubService,
    ctx: &ProjectContext,
    kind: ArtifactKind,
    artifact_id: i64,
    issue: &TrackerIssue,
) -> Result<()> {
    if issue.comments.is_empty() {
        return Ok(());
    }
    let existing = hub.comments(kind, artifact_id)?;
    let mut seen: Vec<String> = existing.into_iter().map(|c| c.text).collect();

    let mut new_comments = Vec::new();
    for comment in &issue.comments {
        if seen.iter().any(|body| body == &comment.body) {
            continue;
        }
        seen.push(comment.body.clone());

        let author_id = match comment.effective_author() {
            Some(login) => match ctx.users.by_external_key(hub, login) {
                Ok(Some(m)) => Some(m.internal_id),
                Ok(None) => {
                    log.warn(&format!("no user mapping for comment author '{}'", login));
                    None
                }
                Err(e) => {
                    log.warn(&format!("user lookup failed for '{}': {}", login, e));
                    None
                }
            },
            None => None,
        };

        new_comments.push(HubComment {
            artifact_id,
            author_id,
            text: comment.body.clone(),
            created: comment.created,
        });
    }

    if !new_comments.is_empty() {
        hub.add_comments(kind, &new_comments)?;
    }
    Ok(())
}

/// Re-uploads issue attachments as Hub documents, skipping filenames the
/// artifact already carries. Transfer failures degrade to warnings.
fn copy_attachments<T: Transport>(
    log: &EventLog,
    hub: &mut dyn HubService,
    tracker: &mut TrackerClient<T>,
    kind: ArtifactKind,
    artifact_id: i64,
    issue: &TrackerIssue,
) {
    if issue.attachments.is_empty() {
        return;
    }
    let existing: Vec<String> = match hub.documents(kind, artifact_id) {
        Ok(docs) => docs.into_iter().map(|d| d.filename_or_url).collect(),
        Err(e) => {
            log.warn(&format!("could not list documents for {} {}: {}", kind, artifact_id, e));
            return;
        }
    };

    for attachment in &issue.attachments {
        if existing.iter().any(|name| name == &attachment.filename) {
            continue;
        }
        let Some(url) = &attachment.content_url else {
            continue;
        };
        let result = tracker
            .download_attachment(url)
            .map_err(|e| e.to_string())
            .and_then(|bytes| {
                hub.add_file_document(kind, artifact_id, &attachment.filename, &bytes)
                    .map_err(|e| e.to_string())
            });
        if let Err(e) = result {
            log.warn(&format!(
                "attachment transfer '{}' to {} {} failed: {}",
                attachment.filename, kind, artifact_id, e
            ));
        }
    }
}

/// Records the two independent cross-system links for a newly created
/// artifact.
#[allow(clippy::too_many_arguments)]
fn link_both_ways<T: Transport>(
    log: &EventLog,
    hub: &mut dyn HubService,
    tracker: &mut TrackerClient<T>,
    kind: ArtifactKind,
    target: AssociationKind,
    project_id: i64,
    artifact_id: i64,
    name: &str,
    key: &str,
) {
    match hub.artifact_url(target, project_id, artifact_id) {
        Ok(url) => {
            if let Err(e) = tracker.add_web_link(key, &url, name) {
                log.warn(&format!("web link on {} failed: {}", key, e));
            }
        }
        Err(e) => log.warn(&format!(
            "could not resolve hub url for {} {}: {}",
            kind, artifact_id, e
        )),
    }
    let browse = tracker.browse_url(key);
    if let Err(e) = hub.add_url_document(kind, artifact_id, &browse, &format!("Tracker issue {}", key)) {
        log.warn(&format!("hub url document for {} failed: {}", key, e));
    }
}

/// Truncates to a character budget without splitting a code point.
fn truncate_chars(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}
