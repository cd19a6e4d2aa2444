// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::*;
use yare::parameterized;

fn params_with(
    c1: Option<&str>,
    c2: Option<&str>,
    c3: Option<&str>,
    c4: Option<&str>,
    c5: Option<&str>,
) -> SetupParams {
    SetupParams {
        system_id: 3,
        offset_hours: -5,
        custom01: c1.map(String::from),
        custom02: c2.map(String::from),
        custom03: c3.map(String::from),
        custom04: c4.map(String::from),
        custom05: c5.map(String::from),
        ..SetupParams::default()
    }
}

#[parameterized(
    plain = { "10401", Some(10401) },
    trailing_decimal = { "10401.0", Some(10401) },
    padded = { " 10401 ", Some(10401) },
    empty = { "", None },
    fractional = { "104.5", None },
    garbage = { "abc", None },
)]
fn severity_field_id_parsing(raw: &str, expected: Option<i64>) {
    let config = EngineConfig::from_setup(&params_with(Some(raw), None, None, None, None));
    assert_eq!(config.severity_custom_field_id, expected);
}

#[parameterized(
    lowercase = { "true", true },
    uppercase = { "TRUE", true },
    mixed = { "True", true },
    falsy = { "false", false },
    garbage = { "yes", false },
    empty = { "", false },
)]
fn flag_parsing(raw: &str, expected: bool) {
    let config = EngineConfig::from_setup(&params_with(None, Some(raw), Some(raw), None, None));
    assert_eq!(config.use_security_level, expected);
    assert_eq!(config.only_create_new_in_tracker, expected);
}

#[test]
fn requirement_issue_types_from_comma_list() {
    let config =
        EngineConfig::from_setup(&params_with(None, None, None, Some("7, 12,,x, 7"), None));
    let types: Vec<i64> = config.requirement_issue_types.into_iter().collect();
    assert_eq!(types, vec![7, 12]);
}

#[test]
fn link_type_defaults_when_blank() {
    let config = EngineConfig::from_setup(&params_with(None, None, None, None, Some("  ")));
    assert_eq!(config.incident_link_type, DEFAULT_INCIDENT_LINK_TYPE);

    let config = EngineConfig::from_setup(&params_with(None, None, None, None, Some("Blocks")));
    assert_eq!(config.incident_link_type, "Blocks");
}

#[test]
fn offsets_and_defaults_carry_through() {
    let config = EngineConfig::from_setup(&params_with(None, None, None, None, None));
    assert_eq!(config.system_id, 3);
    assert_eq!(config.local_offset_hours, -5);
    assert_eq!(config.tracker_timezone_offset_hours, -5);
    assert!(!config.push_window_filter);
    assert!(!config.persist_auto_created_release_mappings);
    assert!(!config.accept_invalid_certs);
    assert_eq!(config.sync_flag_property, DEFAULT_SYNC_FLAG_PROPERTY);
    assert_eq!(config.project_key_property, DEFAULT_PROJECT_KEY_PROPERTY);
}
