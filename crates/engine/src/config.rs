// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Engine configuration.
//!
//! The host hands the engine its settings through the plugin `setup` call:
//! connection credentials for both systems, the local timezone offset, the
//! user auto-map policy, and five free-form custom options. Everything else
//! is a named toggle with a default.

use std::collections::BTreeSet;

/// Connection settings for one side of the sync.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub base_url: String,
    pub login: String,
    pub password: String,
}

/// The raw parameters of the host `setup` call.
///
/// `custom01..custom05` are interpreted by [`EngineConfig::from_setup`]:
///
/// | Option   | Meaning                                                        |
/// |----------|----------------------------------------------------------------|
/// | custom01 | Tracker custom-field id mirrored into the Hub severity field.  |
/// | custom02 | `"true"` enables Tracker security-level propagation.           |
/// | custom03 | `"true"` restricts new artifacts to the Hub→Tracker flow only. |
/// | custom04 | Comma-separated Tracker issue-type ids pulled as requirements. |
/// | custom05 | Tracker issue-link type used for incident associations.        |
#[derive(Debug, Clone, Default)]
pub struct SetupParams {
    pub system_id: i64,
    pub trace_logging: bool,
    pub hub_base_url: String,
    pub hub_login: String,
    pub hub_password: String,
    pub tracker_base_url: String,
    pub tracker_login: String,
    pub tracker_password: String,
    pub offset_hours: i32,
    pub auto_map_users: bool,
    pub custom01: Option<String>,
    pub custom02: Option<String>,
    pub custom03: Option<String>,
    pub custom04: Option<String>,
    pub custom05: Option<String>,
}

/// Default issue-link type for incident-to-incident associations.
pub const DEFAULT_INCIDENT_LINK_TYPE: &str = "Relates";

/// Default name of the list-typed gating property that opts an incident
/// into the push phase.
pub const DEFAULT_SYNC_FLAG_PROPERTY: &str = "Sync to Tracker";

/// Default name of the text-typed property that overrides the target
/// Tracker project for one incident.
pub const DEFAULT_PROJECT_KEY_PROPERTY: &str = "Tracker Project Key";

/// Fully resolved engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// The Hub-side identity of this sync plugin, scoping its mappings.
    pub system_id: i64,
    pub hub: Credentials,
    pub tracker: Credentials,
    /// Host-local offset applied when formatting the pull time window.
    pub local_offset_hours: i32,
    /// Bypass the user mapping table and resolve users against the Hub.
    pub auto_map_users: bool,
    pub trace_logging: bool,

    /// Tracker custom-field id mirrored into the Hub severity field.
    pub severity_custom_field_id: Option<i64>,
    /// Propagate the Tracker security level from the mapped custom slot.
    pub use_security_level: bool,
    /// When set, the pull phase updates existing Hub artifacts but never
    /// creates new ones.
    pub only_create_new_in_tracker: bool,
    /// Tracker issue-type ids routed to the requirement transformer.
    pub requirement_issue_types: BTreeSet<i64>,
    /// Issue-link type name for incident-to-incident associations.
    pub incident_link_type: String,

    /// Restrict the push scan to incidents created since the last sync
    /// instead of visiting every incident and filtering by mapping.
    pub push_window_filter: bool,
    /// Persist mappings for auto-provisioned releases and versions.
    pub persist_auto_created_release_mappings: bool,
    /// Offset applied to the pull window; the Tracker evaluates the JQL
    /// timestamp in its configured user timezone, which is not discoverable
    /// through the API.
    pub tracker_timezone_offset_hours: i32,
    /// Name of the list-typed gating property read during the push phase.
    pub sync_flag_property: String,
    /// Name of the text-typed per-incident project-key override property.
    pub project_key_property: String,
    /// Accept self-signed Tracker certificates. Disables certificate
    /// verification for this engine instance; only enable against servers
    /// you control.
    pub accept_invalid_certs: bool,
    /// Single-sign-on mode: send no Authorization header and let the
    /// ambient environment supply the Tracker identity.
    pub use_integrated_auth: bool,
}

impl EngineConfig {
    /// Builds the configuration from the host `setup` parameters.
    pub fn from_setup(params: &SetupParams) -> Self {
        EngineConfig {
            system_id: params.system_id,
            hub: Credentials {
                base_url: params.hub_base_url.clone(),
                login: params.hub_login.clone(),
                password: params.hub_password.clone(),
            },
            tracker: Credentials {
                base_url: params.tracker_base_url.clone(),
                login: params.tracker_login.clone(),
                password: params.tracker_password.clone(),
            },
            local_offset_hours: params.offset_hours,
            auto_map_users: params.auto_map_users,
            trace_logging: params.trace_logging,
            severity_custom_field_id: parse_field_id(params.custom01.as_deref()),
            use_security_level: parse_flag(params.custom02.as_deref()),
            only_create_new_in_tracker: parse_flag(params.custom03.as_deref()),
            requirement_issue_types: parse_id_list(params.custom04.as_deref()),
            incident_link_type: parse_link_type(params.custom05.as_deref()),
            push_window_filter: false,
            persist_auto_created_release_mappings: false,
            tracker_timezone_offset_hours: params.offset_hours,
            sync_flag_property: DEFAULT_SYNC_FLAG_PROPERTY.to_string(),
            project_key_property: DEFAULT_PROJECT_KEY_PROPERTY.to_string(),
            accept_invalid_certs: false,
            use_integrated_auth: false,
        }
    }
}

/// `"true"` (any casing) turns the flag on; everything else is off.
fn parse_flag(raw: Option<&str>) -> bool {
    raw.is_some_and(|s| s.trim().eq_ignore_ascii_case("true"))
}

/// Parses a decimal custom-field id; admins sometimes enter `10401.0`.
fn parse_field_id(raw: Option<&str>) -> Option<i64> {
    let s = raw?.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(id) = s.parse::<i64>() {
        return Some(id);
    }
    let as_decimal: f64 = s.parse().ok()?;
    if as_decimal.fract() == 0.0 && as_decimal >= 0.0 {
        Some(as_decimal as i64)
    } else {
        None
    }
}

/// Parses a comma-separated list of numeric ids, ignoring blanks.
fn parse_id_list(raw: Option<&str>) -> BTreeSet<i64> {
    raw.map(|s| {
        s.split(',')
            .filter_map(|part| part.trim().parse().ok())
            .collect()
    })
    .unwrap_or_default()
}

fn parse_link_type(raw: Option<&str>) -> String {
    match raw.map(str::trim) {
        Some(s) if !s.is_empty() => s.to_string(),
        _ => DEFAULT_INCIDENT_LINK_TYPE.to_string(),
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
