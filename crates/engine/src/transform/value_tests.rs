// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Tests for the value transformer branches in both directions.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::collections::BTreeMap;

use tracklink_core::{
    CustomList, CustomListOption, CustomPropertyDefinition, CustomPropertyKind, HubIncident,
    HubUser, Mapping, MappingScope, NamedId, TrackerIssue, TypedValue,
};

use super::value::*;
use crate::eventlog::EventLog;
use crate::mapping::{MappingTable, UserResolver};
use crate::test_helpers::MockHub;

const PROJECT: i64 = 7;

fn definition(slot: u8, kind: CustomPropertyKind) -> CustomPropertyDefinition {
    CustomPropertyDefinition {
        number: slot,
        name: format!("Prop {}", slot),
        kind,
        list: match kind {
            CustomPropertyKind::List | CustomPropertyKind::MultiList => Some(CustomList {
                id: 900,
                options: vec![
                    CustomListOption { id: 1, name: "One".into() },
                    CustomListOption { id: 2, name: "Two".into() },
                ],
            }),
            _ => None,
        },
    }
}

fn prop_mapping(slot: u8, external: &str) -> Mapping {
    Mapping::new(MappingScope::CustomProperty, Some(PROJECT), i64::from(slot), external)
}

fn value_mapping(internal: i64, external: &str) -> Mapping {
    Mapping::new(MappingScope::CustomPropertyValue, Some(PROJECT), internal, external)
}

struct Fixture {
    definitions: Vec<CustomPropertyDefinition>,
    prop_mappings: MappingTable,
    value_mappings: BTreeMap<u8, MappingTable>,
    users: UserResolver,
    hub: MockHub,
    log: EventLog,
}

impl Fixture {
    fn new(
        definitions: Vec<CustomPropertyDefinition>,
        prop_mappings: Vec<Mapping>,
        value_mappings: Vec<(u8, Vec<Mapping>)>,
    ) -> Self {
        let mut hub = MockHub::new();
        hub.users.push(HubUser {
            id: 5,
            login: "alice".into(),
            full_name: None,
            email: None,
            active: true,
        });
        Fixture {
            definitions,
            prop_mappings: MappingTable::load(MappingScope::CustomProperty, prop_mappings),
            value_mappings: value_mappings
                .into_iter()
                .map(|(slot, rows)| {
                    (slot, MappingTable::load(MappingScope::CustomPropertyValue, rows))
                })
                .collect(),
            users: UserResolver::new(MappingTable::new(MappingScope::User), true),
            hub,
            log: EventLog::disabled(),
        }
    }

    fn tables(&self) -> ValueTables<'_> {
        ValueTables {
            definitions: &self.definitions,
            prop_mappings: &self.prop_mappings,
            value_mappings: &self.value_mappings,
            project: Some(PROJECT),
        }
    }

    fn pull(&mut self, issue: &TrackerIssue) -> BTreeMap<u8, TypedValue> {
        let Fixture {
            definitions,
            prop_mappings,
            value_mappings,
            users,
            hub,
            log,
        } = self;
        let tables = ValueTables {
            definitions,
            prop_mappings,
            value_mappings,
            project: Some(PROJECT),
        };
        pull_custom_properties(&tables, users, hub, log, issue)
    }
}

// -- pulled branches -----------------------------------------------------

#[test]
fn pull_resolution_sentinel_maps_by_id() {
    let mut fx = Fixture::new(
        vec![definition(1, CustomPropertyKind::List)],
        vec![prop_mapping(1, SENTINEL_RESOLUTION)],
        vec![(1, vec![value_mapping(11, "10100")])],
    );
    let mut issue = TrackerIssue::new("DEMO");
    issue.resolution = Some(NamedId::from_id("10100"));

    let slots = fx.pull(&issue);
    assert_eq!(slots[&1], TypedValue::List("11".into()));
}

#[test]
fn pull_security_level_is_ignored_inbound() {
    let mut fx = Fixture::new(
        vec![definition(1, CustomPropertyKind::List)],
        vec![prop_mapping(1, SENTINEL_SECURITY_LEVEL)],
        vec![(1, vec![value_mapping(11, "200")])],
    );
    let mut issue = TrackerIssue::new("DEMO");
    issue.security_level_id = Some(200);

    assert!(fx.pull(&issue).is_empty());
}

#[test]
fn pull_list_maps_option_name_through_value_table() {
    let mut fx = Fixture::new(
        vec![definition(2, CustomPropertyKind::List)],
        vec![prop_mapping(2, "20010")],
        vec![(2, vec![value_mapping(1, "Vanilla")])],
    );
    let mut issue = TrackerIssue::new("DEMO");
    issue.custom_fields.insert(20010, TypedValue::List("Vanilla".into()));

    let slots = fx.pull(&issue);
    assert_eq!(slots[&2], TypedValue::List("1".into()));
}

#[test]
fn pull_list_unmapped_option_is_absent() {
    let mut fx = Fixture::new(
        vec![definition(2, CustomPropertyKind::List)],
        vec![prop_mapping(2, "20010")],
        vec![(2, vec![])],
    );
    let mut issue = TrackerIssue::new("DEMO");
    issue.custom_fields.insert(20010, TypedValue::List("Vanilla".into()));

    assert!(fx.pull(&issue).is_empty());
}

#[test]
fn pull_component_sentinel_reads_components_by_name() {
    let mut fx = Fixture::new(
        vec![definition(3, CustomPropertyKind::MultiList)],
        vec![prop_mapping(3, SENTINEL_COMPONENT)],
        vec![(3, vec![value_mapping(1, "backend"), value_mapping(2, "frontend")])],
    );
    let mut issue = TrackerIssue::new("DEMO");
    issue.components.push(NamedId::from_name("backend"));
    issue.components.push(NamedId::from_name("frontend"));
    issue.components.push(NamedId::from_name("unmapped"));

    let slots = fx.pull(&issue);
    assert_eq!(slots[&3], TypedValue::MultiList(vec!["1".into(), "2".into()]));
}

#[test]
fn pull_multi_list_maps_each_name() {
    let mut fx = Fixture::new(
        vec![definition(3, CustomPropertyKind::MultiList)],
        vec![prop_mapping(3, "20020")],
        vec![(3, vec![value_mapping(1, "One"), value_mapping(2, "Two")])],
    );
    let mut issue = TrackerIssue::new("DEMO");
    issue.custom_fields.insert(
        20020,
        TypedValue::MultiList(vec!["One".into(), "Two".into()]),
    );

    let slots = fx.pull(&issue);
    assert_eq!(slots[&3], TypedValue::MultiList(vec!["1".into(), "2".into()]));
}

#[test]
fn pull_user_resolves_login_to_hub_id() {
    let mut fx = Fixture::new(
        vec![definition(4, CustomPropertyKind::User)],
        vec![prop_mapping(4, "20030")],
        vec![],
    );
    let mut issue = TrackerIssue::new("DEMO");
    issue.custom_fields.insert(20030, TypedValue::User("alice".into()));

    let slots = fx.pull(&issue);
    assert_eq!(slots[&4], TypedValue::User("5".into()));
}

#[test]
fn pull_environment_and_issue_key_sentinels() {
    let mut fx = Fixture::new(
        vec![
            definition(5, CustomPropertyKind::Text),
            definition(6, CustomPropertyKind::Text),
        ],
        vec![
            prop_mapping(5, SENTINEL_ENVIRONMENT),
            prop_mapping(6, SENTINEL_ISSUE_KEY),
        ],
        vec![],
    );
    let mut issue = TrackerIssue::new("DEMO");
    issue.key = Some("DEMO-12".into());
    issue.environment = Some("staging".into());

    let slots = fx.pull(&issue);
    assert_eq!(slots[&5], TypedValue::Text("staging".into()));
    assert_eq!(slots[&6], TypedValue::Text("DEMO-12".into()));
}

#[test]
fn pull_scalar_copies_native_types_directly() {
    let mut fx = Fixture::new(
        vec![definition(7, CustomPropertyKind::Text)],
        vec![prop_mapping(7, "20040")],
        vec![],
    );
    let mut issue = TrackerIssue::new("DEMO");
    issue.custom_fields.insert(20040, TypedValue::Integer(99));

    let slots = fx.pull(&issue);
    assert_eq!(slots[&7], TypedValue::Integer(99));
}

#[test]
fn pull_scalar_coerces_text_into_declared_type() {
    let mut fx = Fixture::new(
        vec![
            definition(8, CustomPropertyKind::Integer),
            definition(9, CustomPropertyKind::Boolean),
            definition(10, CustomPropertyKind::Date),
            definition(11, CustomPropertyKind::Decimal),
        ],
        vec![
            prop_mapping(8, "20051"),
            prop_mapping(9, "20052"),
            prop_mapping(10, "20053"),
            prop_mapping(11, "20054"),
        ],
        vec![],
    );
    let mut issue = TrackerIssue::new("DEMO");
    issue.custom_fields.insert(20051, TypedValue::Text(" 42 ".into()));
    issue.custom_fields.insert(20052, TypedValue::Text("TRUE".into()));
    issue.custom_fields.insert(20053, TypedValue::Text("2024-07-15".into()));
    issue.custom_fields.insert(20054, TypedValue::Text("2.5".into()));

    let slots = fx.pull(&issue);
    assert_eq!(slots[&8], TypedValue::Integer(42));
    assert_eq!(slots[&9], TypedValue::Boolean(true));
    assert!(matches!(slots[&10], TypedValue::Date(_)));
    assert_eq!(slots[&11], TypedValue::Decimal(2.5));
}

#[test]
fn pull_scalar_unparseable_text_is_absent() {
    let mut fx = Fixture::new(
        vec![definition(8, CustomPropertyKind::Integer)],
        vec![prop_mapping(8, "20051")],
        vec![],
    );
    let mut issue = TrackerIssue::new("DEMO");
    issue.custom_fields.insert(20051, TypedValue::Text("not a number".into()));

    assert!(fx.pull(&issue).is_empty());
}

#[test]
fn pull_scalar_flattens_foreign_shapes_to_text() {
    let mut fx = Fixture::new(
        vec![definition(7, CustomPropertyKind::Text)],
        vec![prop_mapping(7, "20040")],
        vec![],
    );
    let mut issue = TrackerIssue::new("DEMO");
    issue.custom_fields.insert(
        20040,
        TypedValue::MultiList(vec!["a".into(), "b".into()]),
    );

    let slots = fx.pull(&issue);
    assert_eq!(slots[&7], TypedValue::Text("a, b".into()));
}

// -- pushed branches -----------------------------------------------------

fn incident_with(slot: u8, value: TypedValue) -> HubIncident {
    let mut incident = HubIncident {
        id: Some(42),
        project_id: PROJECT,
        ..HubIncident::default()
    };
    incident.set_custom_property(slot, value).unwrap();
    incident
}

fn push(fx: &mut Fixture, incident: &HubIncident, issue: &mut TrackerIssue, security: bool) {
    let Fixture {
        definitions,
        prop_mappings,
        value_mappings,
        users,
        hub,
        log,
    } = fx;
    let tables = ValueTables {
        definitions,
        prop_mappings,
        value_mappings,
        project: Some(PROJECT),
    };
    let catalog = vec![
        NamedId {
            id: Some("400".into()),
            name: Some("backend".into()),
        },
        NamedId {
            id: Some("401".into()),
            name: Some("frontend".into()),
        },
    ];
    push_custom_properties(
        &tables,
        users,
        hub,
        &catalog,
        security,
        log,
        incident,
        issue,
    );
}

#[test]
fn push_component_sentinel_respects_standard_list() {
    let mut fx = Fixture::new(
        vec![definition(1, CustomPropertyKind::List)],
        vec![prop_mapping(1, SENTINEL_COMPONENT)],
        vec![(1, vec![value_mapping(1, "backend")])],
    );
    let incident = incident_with(1, TypedValue::List("1".into()));

    let mut issue = TrackerIssue::new("DEMO");
    push(&mut fx, &incident, &mut issue, false);
    assert_eq!(issue.components.len(), 1);
    assert_eq!(issue.components[0].id.as_deref(), Some("400"));

    // Already populated by the standard components list: left alone.
    let mut issue = TrackerIssue::new("DEMO");
    issue.components.push(NamedId::from_name("frontend"));
    push(&mut fx, &incident, &mut issue, false);
    assert_eq!(issue.components.len(), 1);
    assert_eq!(issue.components[0].name.as_deref(), Some("frontend"));
}

#[test]
fn push_resolution_sentinel_sets_resolution_id() {
    let mut fx = Fixture::new(
        vec![definition(1, CustomPropertyKind::List)],
        vec![prop_mapping(1, SENTINEL_RESOLUTION)],
        vec![(1, vec![value_mapping(1, "10100")])],
    );
    let incident = incident_with(1, TypedValue::List("1".into()));
    let mut issue = TrackerIssue::new("DEMO");

    push(&mut fx, &incident, &mut issue, false);
    assert_eq!(issue.resolution.unwrap().id.as_deref(), Some("10100"));
}

#[test]
fn push_security_level_gated_by_option() {
    let mut fx = Fixture::new(
        vec![definition(1, CustomPropertyKind::List)],
        vec![prop_mapping(1, SENTINEL_SECURITY_LEVEL)],
        vec![(1, vec![value_mapping(1, "200")])],
    );
    let incident = incident_with(1, TypedValue::List("1".into()));

    let mut issue = TrackerIssue::new("DEMO");
    push(&mut fx, &incident, &mut issue, false);
    assert!(issue.security_level_id.is_none());

    let mut issue = TrackerIssue::new("DEMO");
    push(&mut fx, &incident, &mut issue, true);
    assert_eq!(issue.security_level_id, Some(200));
}

#[test]
fn push_list_lands_in_custom_fields_as_option_name() {
    let mut fx = Fixture::new(
        vec![definition(2, CustomPropertyKind::List)],
        vec![prop_mapping(2, "20010")],
        vec![(2, vec![value_mapping(1, "Vanilla")])],
    );
    let incident = incident_with(2, TypedValue::List("1".into()));
    let mut issue = TrackerIssue::new("DEMO");

    push(&mut fx, &incident, &mut issue, false);
    assert_eq!(issue.custom_fields[&20010], TypedValue::List("Vanilla".into()));
}

#[test]
fn push_multi_list_component_merges_without_duplicates() {
    let mut fx = Fixture::new(
        vec![definition(3, CustomPropertyKind::MultiList)],
        vec![prop_mapping(3, SENTINEL_COMPONENT)],
        vec![(3, vec![value_mapping(1, "backend"), value_mapping(2, "frontend")])],
    );
    let incident = incident_with(3, TypedValue::MultiList(vec!["1".into(), "2".into()]));
    let mut issue = TrackerIssue::new("DEMO");
    issue.components.push(NamedId::from_name("backend"));

    push(&mut fx, &incident, &mut issue, false);
    assert_eq!(issue.components.len(), 2);
    assert_eq!(issue.components[1].name.as_deref(), Some("frontend"));
}

#[test]
fn push_user_resolves_hub_id_to_login() {
    let mut fx = Fixture::new(
        vec![definition(4, CustomPropertyKind::User)],
        vec![prop_mapping(4, "20030")],
        vec![],
    );
    let incident = incident_with(4, TypedValue::User("5".into()));
    let mut issue = TrackerIssue::new("DEMO");

    push(&mut fx, &incident, &mut issue, false);
    assert_eq!(issue.custom_fields[&20030], TypedValue::User("alice".into()));
}

#[test]
fn push_environment_sentinel_and_raw_scalar() {
    let mut fx = Fixture::new(
        vec![
            definition(5, CustomPropertyKind::Text),
            definition(7, CustomPropertyKind::Integer),
        ],
        vec![prop_mapping(5, SENTINEL_ENVIRONMENT), prop_mapping(7, "20040")],
        vec![],
    );
    let mut incident = incident_with(5, TypedValue::Text("staging".into()));
    incident.set_custom_property(7, TypedValue::Integer(99)).unwrap();
    let mut issue = TrackerIssue::new("DEMO");

    push(&mut fx, &incident, &mut issue, false);
    assert_eq!(issue.environment.as_deref(), Some("staging"));
    assert_eq!(issue.custom_fields[&20040], TypedValue::Integer(99));
}

#[test]
fn push_issue_key_sentinel_is_never_pushed() {
    let mut fx = Fixture::new(
        vec![definition(6, CustomPropertyKind::Text)],
        vec![prop_mapping(6, SENTINEL_ISSUE_KEY)],
        vec![],
    );
    let incident = incident_with(6, TypedValue::Text("DEMO-1".into()));
    let mut issue = TrackerIssue::new("DEMO");

    push(&mut fx, &incident, &mut issue, false);
    assert!(issue.custom_fields.is_empty());
    assert!(issue.environment.is_none());
}

#[test]
fn tables_helper_exposes_definitions() {
    let fx = Fixture::new(vec![definition(1, CustomPropertyKind::List)], vec![], vec![]);
    let tables = fx.tables();
    assert_eq!(tables.definitions.len(), 1);
}
