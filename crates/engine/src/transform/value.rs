// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Per-field value conversion between Hub custom-property slots and
//! Tracker fields.
//!
//! Slot mappings carry either a numeric Tracker custom-field id or one of
//! five sentinel keys that select a standard-field branch instead:
//! `Environment`, `Component`, `Resolution`, `SecurityLevel`, and
//! `JiraIssueKey`. Option values translate through the per-slot value
//! mapping tables; users go through the resolver chokepoint.

use std::collections::BTreeMap;

use tracklink_core::value::parse_timestamp;
use tracklink_core::{
    CustomPropertyDefinition, CustomPropertyKind, HubIncident, NamedId, TrackerIssue, TypedValue,
};

use crate::eventlog::EventLog;
use crate::hub::HubService;
use crate::mapping::{MappingTable, UserResolver};

/// Sentinel: Tracker free-text environment field.
pub const SENTINEL_ENVIRONMENT: &str = "Environment";
/// Sentinel: Tracker components list, matched by option name.
pub const SENTINEL_COMPONENT: &str = "Component";
/// Sentinel: Tracker resolution, a single-select id.
pub const SENTINEL_RESOLUTION: &str = "Resolution";
/// Sentinel: Tracker security level; push-only, behind an engine option.
pub const SENTINEL_SECURITY_LEVEL: &str = "SecurityLevel";
/// Sentinel: Hub slot that receives the Tracker-assigned key after create.
pub const SENTINEL_ISSUE_KEY: &str = "JiraIssueKey";

/// The mapping tables one direction of value conversion reads.
pub struct ValueTables<'a> {
    pub definitions: &'a [CustomPropertyDefinition],
    pub prop_mappings: &'a MappingTable,
    /// Option-value tables keyed by slot number.
    pub value_mappings: &'a BTreeMap<u8, MappingTable>,
    pub project: Option<i64>,
}

impl<'a> ValueTables<'a> {
    fn definition(&self, slot: u8) -> Option<&CustomPropertyDefinition> {
        self.definitions.iter().find(|d| d.number == slot)
    }

    fn value_table(&self, slot: u8) -> Option<&MappingTable> {
        self.value_mappings.get(&slot)
    }
}

/// Converts pulled Tracker values into Hub custom-property slots.
///
/// Returns the slot values to merge into the artifact; slots whose source
/// value is absent or unmappable are left out.
pub fn pull_custom_properties(
    tables: &ValueTables<'_>,
    users: &UserResolver,
    hub: &mut dyn HubService,
    log: &EventLog,
    issue: &TrackerIssue,
) -> BTreeMap<u8, TypedValue> {
    let mut slots = BTreeMap::new();
    for mapping in tables.prop_mappings.entries() {
        let Ok(slot) = u8::try_from(mapping.internal_id) else {
            continue;
        };
        let Some(def) = tables.definition(slot) else {
            continue;
        };
        let external = mapping.external_key.as_str();
        let value = match def.kind {
            CustomPropertyKind::List => pull_list(tables, log, issue, slot, external),
            CustomPropertyKind::MultiList => pull_multi_list(tables, log, issue, slot, external),
            CustomPropertyKind::User => pull_user(users, hub, log, issue, external),
            _ => pull_scalar(def, log, issue, external),
        };
        if let Some(value) = value {
            slots.insert(slot, value);
        }
    }
    slots
}

fn pull_list(
    tables: &ValueTables<'_>,
    log: &EventLog,
    issue: &TrackerIssue,
    slot: u8,
    external: &str,
) -> Option<TypedValue> {
    match external {
        SENTINEL_RESOLUTION => {
            let resolution_id = issue.resolution.as_ref()?.id.clone()?;
            match tables
                .value_table(slot)
                .and_then(|t| t.by_external_key(tables.project, &resolution_id, false))
            {
                Some(m) => Some(TypedValue::List(m.internal_id.to_string())),
                None => {
                    log.warn(&format!(
                        "no option mapping for resolution {} on slot {}",
                        resolution_id, slot
                    ));
                    None
                }
            }
        }
        // Security levels only flow Hub-ward through the native field.
        SENTINEL_SECURITY_LEVEL => None,
        _ => {
            let field_id: i64 = external.parse().ok()?;
            let token = match issue.custom_fields.get(&field_id)? {
                TypedValue::List(name) => name.clone(),
                TypedValue::Text(text) => text.clone(),
                other => {
                    log.warn(&format!(
                        "custom field {} is {} where a list was expected",
                        field_id,
                        other.type_name()
                    ));
                    return None;
                }
            };
            match tables
                .value_table(slot)
                .and_then(|t| t.by_external_key(tables.project, &token, false))
            {
                Some(m) => Some(TypedValue::List(m.internal_id.to_string())),
                None => {
                    log.warn(&format!(
                        "no option mapping for '{}' on slot {}",
                        token, slot
                    ));
                    None
                }
            }
        }
    }
}

fn pull_multi_list(
    tables: &ValueTables<'_>,
    log: &EventLog,
    issue: &TrackerIssue,
    slot: u8,
    external: &str,
) -> Option<TypedValue> {
    let tokens: Vec<String> = match external {
        SENTINEL_COMPONENT => issue
            .components
            .iter()
            .filter_map(NamedId::label)
            .map(String::from)
            .collect(),
        _ => {
            let field_id: i64 = external.parse().ok()?;
            match issue.custom_fields.get(&field_id)? {
                TypedValue::MultiList(names) => names.clone(),
                TypedValue::List(name) => vec![name.clone()],
                other => {
                    log.warn(&format!(
                        "custom field {} is {} where a multi-list was expected",
                        field_id,
                        other.type_name()
                    ));
                    return None;
                }
            }
        }
    };

    let mut mapped = Vec::new();
    for token in tokens {
        match tables
            .value_table(slot)
            .and_then(|t| t.by_external_key(tables.project, &token, false))
        {
            Some(m) => mapped.push(m.internal_id.to_string()),
            None => log.warn(&format!("no option mapping for '{}' on slot {}", token, slot)),
        }
    }
    if mapped.is_empty() {
        None
    } else {
        Some(TypedValue::MultiList(mapped))
    }
}

fn pull_user(
    users: &UserResolver,
    hub: &mut dyn HubService,
    log: &EventLog,
    issue: &TrackerIssue,
    external: &str,
) -> Option<TypedValue> {
    let field_id: i64 = external.parse().ok()?;
    let login = match issue.custom_fields.get(&field_id)? {
        TypedValue::User(login) => login.clone(),
        TypedValue::Text(text) => text.clone(),
        other => {
            log.warn(&format!(
                "custom field {} is {} where a user was expected",
                field_id,
                other.type_name()
            ));
            return None;
        }
    };
    match users.by_external_key(hub, &login) {
        Ok(Some(mapping)) => Some(TypedValue::User(mapping.internal_id.to_string())),
        Ok(None) => {
            log.warn(&format!("no user mapping for login '{}'", login));
            None
        }
        Err(e) => {
            log.warn(&format!("user lookup failed for '{}': {}", login, e));
            None
        }
    }
}

fn pull_scalar(
    def: &CustomPropertyDefinition,
    log: &EventLog,
    issue: &TrackerIssue,
    external: &str,
) -> Option<TypedValue> {
    match external {
        SENTINEL_ENVIRONMENT => issue.environment.clone().map(TypedValue::Text),
        SENTINEL_ISSUE_KEY => issue.key.clone().map(TypedValue::Text),
        _ => {
            let field_id: i64 = external.parse().ok()?;
            let value = issue.custom_fields.get(&field_id)?;
            match value {
                TypedValue::Boolean(_)
                | TypedValue::Date(_)
                | TypedValue::Decimal(_)
                | TypedValue::Integer(_) => Some(value.clone()),
                TypedValue::Text(text) => coerce_text(def.kind, text).or_else(|| {
                    log.warn(&format!(
                        "could not parse '{}' as {:?} for slot {}",
                        text, def.kind, def.number
                    ));
                    None
                }),
                other => Some(TypedValue::Text(other.to_display_string())),
            }
        }
    }
}

/// Coerces a text token into the slot's declared scalar type. Dates are
/// normalized to UTC.
fn coerce_text(kind: CustomPropertyKind, text: &str) -> Option<TypedValue> {
    let trimmed = text.trim();
    match kind {
        CustomPropertyKind::Boolean => match trimmed.to_ascii_lowercase().as_str() {
            "true" => Some(TypedValue::Boolean(true)),
            "false" => Some(TypedValue::Boolean(false)),
            _ => None,
        },
        CustomPropertyKind::Integer => trimmed.parse().ok().map(TypedValue::Integer),
        CustomPropertyKind::Decimal => trimmed.parse().ok().map(TypedValue::Decimal),
        CustomPropertyKind::Date => parse_timestamp(trimmed).map(TypedValue::Date),
        _ => Some(TypedValue::Text(text.to_string())),
    }
}

/// Converts Hub custom-property slots onto a Tracker issue being built.
///
/// Sentinel-mapped slots land in the corresponding standard fields; the
/// rest go into the issue's custom-field map for the metadata shaping pass
/// to gate and translate.
#[allow(clippy::too_many_arguments)]
pub fn push_custom_properties(
    tables: &ValueTables<'_>,
    users: &UserResolver,
    hub: &mut dyn HubService,
    tracker_components: &[NamedId],
    use_security_level: bool,
    log: &EventLog,
    incident: &HubIncident,
    issue: &mut TrackerIssue,
) {
    for mapping in tables.prop_mappings.entries() {
        let Ok(slot) = u8::try_from(mapping.internal_id) else {
            continue;
        };
        let Some(def) = tables.definition(slot) else {
            continue;
        };
        let Some(value) = incident.custom_properties.get(&slot) else {
            continue;
        };
        let external = mapping.external_key.as_str();
        match def.kind {
            CustomPropertyKind::List => {
                push_list(tables, tracker_components, use_security_level, log, slot, external, value, issue);
            }
            CustomPropertyKind::MultiList => {
                push_multi_list(tables, tracker_components, log, slot, external, value, issue);
            }
            CustomPropertyKind::User => {
                push_user(users, hub, log, external, value, issue);
            }
            _ => push_scalar(log, external, value, issue),
        }
    }
}

/// Resolves a Hub option id through the slot's value-mapping table.
fn mapped_option<'a>(
    tables: &'a ValueTables<'_>,
    slot: u8,
    value: &TypedValue,
) -> Option<&'a str> {
    let option_id: i64 = value.as_list()?.parse().ok()?;
    tables
        .value_table(slot)?
        .by_internal_id(tables.project, option_id)
        .map(|m| m.external_key.as_str())
}

#[allow(clippy::too_many_arguments)]
fn push_list(
    tables: &ValueTables<'_>,
    tracker_components: &[NamedId],
    use_security_level: bool,
    log: &EventLog,
    slot: u8,
    external: &str,
    value: &TypedValue,
    issue: &mut TrackerIssue,
) {
    let Some(mapped) = mapped_option(tables, slot, value) else {
        log.warn(&format!("no option mapping for slot {} value {}", slot, value));
        return;
    };
    let mapped = mapped.to_string();
    match external {
        SENTINEL_COMPONENT => {
            // The standard components list wins when it set anything.
            if issue.components.is_empty() {
                if let Some(component) = component_by_name(tracker_components, &mapped) {
                    issue.components.push(component);
                } else {
                    log.warn(&format!("tracker has no component named '{}'", mapped));
                }
            }
        }
        SENTINEL_RESOLUTION => {
            issue.resolution = Some(NamedId::from_id(mapped));
        }
        SENTINEL_SECURITY_LEVEL => {
            if use_security_level {
                match mapped.parse() {
                    Ok(level) => issue.security_level_id = Some(level),
                    Err(_) => log.warn(&format!(
                        "security level mapping '{}' is not numeric",
                        mapped
                    )),
                }
            }
        }
        _ => {
            if let Ok(field_id) = external.parse::<i64>() {
                issue.custom_fields.insert(field_id, TypedValue::List(mapped));
            }
        }
    }
}

fn push_multi_list(
    tables: &ValueTables<'_>,
    tracker_components: &[NamedId],
    log: &EventLog,
    slot: u8,
    external: &str,
    value: &TypedValue,
    issue: &mut TrackerIssue,
) {
    let TypedValue::MultiList(option_ids) = value else {
        return;
    };
    let mut mapped = Vec::new();
    for raw in option_ids {
        let Ok(option_id) = raw.parse::<i64>() else {
            continue;
        };
        match tables
            .value_table(slot)
            .and_then(|t| t.by_internal_id(tables.project, option_id))
        {
            Some(m) => mapped.push(m.external_key.clone()),
            None => log.warn(&format!(
                "no option mapping for slot {} option {}",
                slot, option_id
            )),
        }
    }
    if mapped.is_empty() {
        return;
    }
    match external {
        SENTINEL_COMPONENT => {
            for name in mapped {
                let already = issue
                    .components
                    .iter()
                    .any(|c| c.label().is_some_and(|l| l.eq_ignore_ascii_case(&name)));
                if already {
                    continue;
                }
                match component_by_name(tracker_components, &name) {
                    Some(component) => issue.components.push(component),
                    None => log.warn(&format!("tracker has no component named '{}'", name)),
                }
            }
        }
        _ => {
            if let Ok(field_id) = external.parse::<i64>() {
                issue
                    .custom_fields
                    .insert(field_id, TypedValue::MultiList(mapped));
            }
        }
    }
}

fn push_user(
    users: &UserResolver,
    hub: &mut dyn HubService,
    log: &EventLog,
    external: &str,
    value: &TypedValue,
    issue: &mut TrackerIssue,
) {
    let Ok(field_id) = external.parse::<i64>() else {
        return;
    };
    let TypedValue::User(raw) = value else {
        return;
    };
    let Ok(user_id) = raw.parse::<i64>() else {
        return;
    };
    match users.by_internal_id(hub, user_id) {
        Ok(Some(mapping)) => {
            issue
                .custom_fields
                .insert(field_id, TypedValue::User(mapping.external_key));
        }
        Ok(None) => log.warn(&format!("no user mapping for hub user {}", user_id)),
        Err(e) => log.warn(&format!("user lookup failed for {}: {}", user_id, e)),
    }
}

fn push_scalar(log: &EventLog, external: &str, value: &TypedValue, issue: &mut TrackerIssue) {
    match external {
        SENTINEL_ENVIRONMENT => {
            issue.environment = Some(value.to_display_string());
        }
        // Written back onto the incident after create, never pushed out.
        SENTINEL_ISSUE_KEY => {}
        _ => match external.parse::<i64>() {
            Ok(field_id) => {
                issue.custom_fields.insert(field_id, value.clone());
            }
            Err(_) => log.warn(&format!("unrecognized custom-property key '{}'", external)),
        },
    }
}

fn component_by_name(catalog: &[NamedId], name: &str) -> Option<NamedId> {
    catalog
        .iter()
        .find(|c| c.name.as_deref().is_some_and(|n| n.eq_ignore_ascii_case(name)))
        .cloned()
}
