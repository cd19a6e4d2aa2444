// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! The reconciliation engine: per-project orchestration of the push and
//! pull phases.
//!
//! One `execute` call walks every configured project pair through:
//!
//! ```text
//! AUTHENTICATE_HUB → PROBE_TRACKER → LOAD_GLOBAL_MAPPINGS
//!   → per project: CONNECT → LOAD_MAPPINGS
//!       → PUSH → REAUTH → RELOAD_ARTIFACT_MAPPINGS
//!       → PULL → REAUTH → FLUSH_MAPPINGS
//! → DONE
//! ```
//!
//! Every artifact is processed inside its own failure boundary: one bad
//! record logs and the run continues. A failed project connect skips that
//! pair; a failed re-authentication ends the run.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use tracklink_core::artifact::CustomPropertyKind;
use tracklink_core::{CreateMeta, HubIncident, NamedId, TrackerProject};

use crate::config::EngineConfig;
use crate::context::ProjectContext;
use crate::error::{Error, Result};
use crate::eventlog::EventLog;
use crate::hub::{HubError, HubService};
use crate::jql;
use crate::tracker::{TrackerClient, TrackerError, Transport};
use crate::transform::pull::{self, PullOutcome};
use crate::transform::push::{self, PushOutcome};

/// Batch size for paging Hub incidents during the push phase.
pub const HUB_PAGE_SIZE: usize = 15;

/// 1950-01-01T00:00:00Z, the horizon used when the host supplies no
/// last-sync timestamp.
const DEFAULT_HORIZON_SECS: i64 = -631_152_000;

/// Option label that opts an incident into the push phase.
const SYNC_FLAG_YES: &str = "Y";

/// Result of one engine run. Warnings surface only through the event log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Success,
    Error,
}

/// One reconciliation run over all configured project pairs.
pub struct SyncEngine<'a, T: Transport> {
    config: &'a EngineConfig,
    log: &'a EventLog,
    hub: &'a mut dyn HubService,
    tracker: &'a mut TrackerClient<T>,
}

impl<'a, T: Transport> SyncEngine<'a, T> {
    pub fn new(
        config: &'a EngineConfig,
        log: &'a EventLog,
        hub: &'a mut dyn HubService,
        tracker: &'a mut TrackerClient<T>,
    ) -> Self {
        SyncEngine {
            config,
            log,
            hub,
            tracker,
        }
    }

    /// Runs one full cycle. `last_sync_at` bounds the pull window; `now`
    /// is the host's clock reading for this invocation.
    pub fn execute(&mut self, last_sync_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> RunOutcome {
        let horizon = last_sync_at.unwrap_or_else(default_horizon);
        match self.run(horizon, now) {
            Ok(()) => RunOutcome::Success,
            Err(e) => {
                self.log.error(&format!("sync run failed: {}", e));
                RunOutcome::Error
            }
        }
    }

    fn run(&mut self, horizon: DateTime<Utc>, now: DateTime<Utc>) -> Result<()> {
        self.hub
            .authenticate()
            .map_err(|e| Error::HubAuth(e.to_string()))?;

        let permissions = self
            .tracker
            .my_permissions()
            .map_err(|e| Error::Probe(e.to_string()))?;
        self.log
            .trace(&format!("tracker permissions probe: {}", permissions));

        let project_mappings = self.hub.project_mappings()?;
        let tracker_projects = self.tracker.projects()?;
        self.log.trace(&format!(
            "{} project pair(s), {} tracker project(s) visible",
            project_mappings.len(),
            tracker_projects.len()
        ));

        for pair in project_mappings {
            let project_id = pair.internal_id;
            match self.sync_project(project_id, &pair.external_key, &tracker_projects, horizon, now)
            {
                Ok(()) => {}
                Err(Error::ProjectConnect { project_id, source }) => {
                    self.log
                        .error(&format!("skipping project {}: {}", project_id, source));
                }
                Err(Error::HubAuth(reason)) => return Err(Error::HubAuth(reason)),
                Err(e) => {
                    self.log
                        .error(&format!("project {} failed: {}", project_id, e));
                }
            }
        }
        Ok(())
    }

    fn sync_project(
        &mut self,
        project_id: i64,
        default_key: &str,
        tracker_projects: &[TrackerProject],
        horizon: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<()> {
        self.hub
            .connect_project(project_id)
            .map_err(|source| Error::ProjectConnect { project_id, source })?;
        let mut ctx = ProjectContext::load(&mut *self.hub, self.config, project_id, default_key)?;

        self.push_phase(&mut ctx, tracker_projects, horizon)?;
        self.reauth(project_id)?;
        ctx.reload_artifact_mappings(&mut *self.hub)?;

        self.pull_phase(&mut ctx, horizon, now)?;
        self.reauth(project_id)?;

        ctx.flush(
            &mut *self.hub,
            self.config.persist_auto_created_release_mappings,
        )?;
        Ok(())
    }

    /// Re-authenticates and reconnects between phases; sessions time out
    /// server-side during long phases. A failure here ends the run.
    fn reauth(&mut self, project_id: i64) -> Result<()> {
        self.hub
            .authenticate()
            .map_err(|e| Error::HubAuth(e.to_string()))?;
        self.hub
            .connect_project(project_id)
            .map_err(|e| Error::HubAuth(e.to_string()))?;
        Ok(())
    }

    // -- push phase ------------------------------------------------------

    fn push_phase(
        &mut self,
        ctx: &mut ProjectContext,
        tracker_projects: &[TrackerProject],
        horizon: DateTime<Utc>,
    ) -> Result<()> {
        self.log
            .trace(&format!("push phase: project {}", ctx.project_id));
        let mut metas: BTreeMap<String, CreateMeta> = BTreeMap::new();
        let mut components: BTreeMap<String, Vec<NamedId>> = BTreeMap::new();

        let mut start = 0usize;
        loop {
            let page = if self.config.push_window_filter {
                self.hub.incidents_page_since(horizon, start, HUB_PAGE_SIZE)?
            } else {
                self.hub.incidents_page(start, HUB_PAGE_SIZE)?
            };
            let batch = page.len();
            for incident in &page {
                if let Err(e) =
                    self.push_one(ctx, tracker_projects, &mut metas, &mut components, incident)
                {
                    self.log
                        .error(&artifact_failure("incident", &format!("{:?}", incident.id), &e));
                }
            }
            if batch < HUB_PAGE_SIZE {
                break;
            }
            start += batch;
        }
        Ok(())
    }

    fn push_one(
        &mut self,
        ctx: &mut ProjectContext,
        tracker_projects: &[TrackerProject],
        metas: &mut BTreeMap<String, CreateMeta>,
        components: &mut BTreeMap<String, Vec<NamedId>>,
        incident: &HubIncident,
    ) -> Result<()> {
        let Some(incident_id) = incident.id else {
            return Ok(());
        };

        if !gate_allows(ctx, &self.config.sync_flag_property, incident) {
            self.log
                .trace(&format!("incident {} not opted in; skipping", incident_id));
            return Ok(());
        }

        let project_key = project_key_override(ctx, &self.config.project_key_property, incident)
            .unwrap_or_else(|| ctx.default_key.clone());
        if !tracker_projects
            .iter()
            .any(|p| p.key.eq_ignore_ascii_case(&project_key))
        {
            self.log.warn(&format!(
                "unknown tracker project '{}' for incident {}; skipping",
                project_key, incident_id
            ));
            return Ok(());
        }

        // Already mirrored, either persisted or earlier in this run.
        if ctx
            .incidents
            .by_internal_id(ctx.scope(), incident_id)
            .is_some()
        {
            return Ok(());
        }

        if !metas.contains_key(&project_key) {
            metas.insert(
                project_key.clone(),
                self.tracker.create_metadata(Some(&project_key))?,
            );
            components.insert(project_key.clone(), self.tracker.components(&project_key)?);
        }
        let meta = &metas[&project_key];
        let catalog = &components[&project_key];

        match push::push_incident(
            self.config,
            self.log,
            &mut *self.hub,
            &mut *self.tracker,
            ctx,
            meta,
            catalog,
            &project_key,
            incident,
        )? {
            PushOutcome::Created { key } => {
                self.log
                    .trace(&format!("incident {} pushed as {}", incident_id, key));
            }
            PushOutcome::Skipped => {}
        }
        Ok(())
    }

    // -- pull phase ------------------------------------------------------

    fn pull_phase(
        &mut self,
        ctx: &mut ProjectContext,
        horizon: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let query = jql::pull_clause(
            &ctx.default_key,
            horizon,
            self.config.tracker_timezone_offset_hours,
        );
        self.log.trace(&format!("pull phase: {}", query));

        // Two-phase fetch: keys first, then each record in full, so the
        // search responses stay small.
        let keys = self.tracker.search_keys(&query)?;
        if keys.is_empty() {
            return Ok(());
        }
        let meta = self.tracker.create_metadata(Some(&ctx.default_key))?;

        for key in keys {
            if let Err(e) = self.pull_one(ctx, &meta, &key, now) {
                self.log.error(&artifact_failure("issue", &key, &e));
            }
        }
        Ok(())
    }

    fn pull_one(
        &mut self,
        ctx: &mut ProjectContext,
        meta: &CreateMeta,
        key: &str,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let issue = self.tracker.issue_by_key(key, meta)?;
        let type_id = issue.issue_type_id().unwrap_or_default();

        let outcome = if self.config.requirement_issue_types.contains(&type_id) {
            pull::pull_requirement(
                self.config,
                self.log,
                &mut *self.hub,
                &mut *self.tracker,
                ctx,
                &issue,
                now,
            )?
        } else {
            pull::pull_incident(
                self.config,
                self.log,
                &mut *self.hub,
                &mut *self.tracker,
                ctx,
                &issue,
                now,
            )?
        };

        match outcome {
            PullOutcome::Created(id) => {
                self.log
                    .trace(&format!("issue {} created hub artifact {}", key, id));
            }
            PullOutcome::Updated(id) => {
                self.log
                    .trace(&format!("issue {} updated hub artifact {}", key, id));
            }
            PullOutcome::Skipped => {}
        }
        Ok(())
    }
}

/// Checks the list-typed opt-in property. The incident is pushed only
/// when the flag's current option is named "Y"; any other option, or no
/// value, opts it out. Projects whose catalog has no such property are not
/// gated at all.
fn gate_allows(ctx: &ProjectContext, flag_property: &str, incident: &HubIncident) -> bool {
    let Some(def) = ctx.incident_props.iter().find(|d| {
        d.kind == CustomPropertyKind::List && d.name.eq_ignore_ascii_case(flag_property)
    }) else {
        return true;
    };
    let Some(list) = &def.list else {
        return false;
    };
    let Some(tracklink_core::TypedValue::List(raw)) = incident.custom_properties.get(&def.number)
    else {
        return false;
    };
    let Ok(option_id) = raw.parse::<i64>() else {
        return false;
    };
    list.option_by_id(option_id)
        .is_some_and(|option| option.name.eq_ignore_ascii_case(SYNC_FLAG_YES))
}

/// Reads the text-typed per-incident project-key override, uppercased.
fn project_key_override(
    ctx: &ProjectContext,
    key_property: &str,
    incident: &HubIncident,
) -> Option<String> {
    let def = ctx.incident_props.iter().find(|d| {
        d.kind == CustomPropertyKind::Text && d.name.eq_ignore_ascii_case(key_property)
    })?;
    let value = incident.custom_properties.get(&def.number)?;
    let text = value.as_text()?.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_uppercase())
    }
}

/// Formats a per-artifact failure. Validation faults get their structured
/// field messages; everything else logs the error chain.
fn artifact_failure(kind: &str, ident: &str, error: &Error) -> String {
    match error {
        Error::Hub(HubError::Validation { summary, messages }) => {
            format!(
                "{} {}: {}",
                kind,
                ident,
                HubError::validation_log_entry(summary, messages)
            )
        }
        Error::Tracker(TrackerError::MissingRequired {
            field,
            project_key,
            issue_type_id,
        }) => format!(
            "{} {}: validation failed\n  {}: required by issue type {} in project {}",
            kind, ident, field, issue_type_id, project_key
        ),
        other => format!("processing {} {} failed: {}", kind, ident, other),
    }
}

fn default_horizon() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(DEFAULT_HORIZON_SECS, 0).unwrap_or_default()
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
