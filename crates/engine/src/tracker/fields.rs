// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! The dynamic-field validator: metadata-driven payload shaping and inbound
//! custom-field reconstruction.
//!
//! Create payloads are built in two passes: the typed issue is first
//! projected onto a free-form field tree, then the tree is reconciled
//! against the create-metadata. Required fields are enforced, unknown
//! fields dropped (`issuetype` always survives), custom fields appended
//! only when the target issue type declares them, and select options
//! translated through the metadata's allowed-values table.

use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

use tracklink_core::metadata::{custom_field_id, custom_field_key, CUSTOM_FIELD_PREFIX};
use tracklink_core::value::parse_timestamp;
use tracklink_core::{CreateMeta, MetaField, MetaIssueType, TrackerIssue, TypedValue};

use super::client::{TrackerError, TrackerResult};

/// Pass 1: projects the typed issue onto a free-form field tree.
///
/// Everything the issue carries lands in the tree; pass 2 decides what the
/// target issue type actually accepts.
pub fn project_issue_tree(issue: &TrackerIssue) -> Map<String, Value> {
    let mut tree = Map::new();
    tree.insert("project".into(), json!({ "key": issue.project_key }));
    tree.insert("summary".into(), Value::String(issue.summary.clone()));
    tree.insert("issuetype".into(), named_value(&issue.issue_type));

    if let Some(description) = &issue.description {
        tree.insert("description".into(), Value::String(description.clone()));
    }
    if let Some(environment) = &issue.environment {
        tree.insert("environment".into(), Value::String(environment.clone()));
    }
    if let Some(reporter) = &issue.reporter {
        tree.insert("reporter".into(), json!({ "name": reporter }));
    }
    if let Some(assignee) = &issue.assignee {
        tree.insert("assignee".into(), json!({ "name": assignee }));
    }
    if let Some(priority) = &issue.priority {
        tree.insert("priority".into(), named_value(priority));
    }
    if let Some(resolution) = &issue.resolution {
        tree.insert("resolution".into(), named_value(resolution));
    }
    if let Some(due) = issue.due_date {
        tree.insert("duedate".into(), Value::String(due.format("%Y-%m-%d").to_string()));
    }
    if let Some(level) = issue.security_level_id {
        tree.insert("security".into(), json!({ "id": level.to_string() }));
    }
    if !issue.versions.is_empty() {
        tree.insert("versions".into(), version_refs(&issue.versions));
    }
    if !issue.fix_versions.is_empty() {
        tree.insert("fixVersions".into(), version_refs(&issue.fix_versions));
    }
    if !issue.components.is_empty() {
        let refs: Vec<Value> = issue.components.iter().map(named_value).collect();
        tree.insert("components".into(), Value::Array(refs));
    }
    tree
}

/// Pass 2: reconciles the field tree against the create-metadata and
/// appends the custom-field map, yielding the final create payload.
///
/// When no metadata node exists for the `(project, issue type)` pair,
/// validation is skipped and custom fields are appended untranslated.
pub fn shape_create_payload(issue: &TrackerIssue, meta: &CreateMeta) -> TrackerResult<Value> {
    let mut tree = project_issue_tree(issue);
    let issue_type_id = issue.issue_type.id.clone().unwrap_or_default();

    match meta.issue_type_node(&issue.project_key, &issue_type_id) {
        Some(node) => {
            for (key, field) in &node.fields {
                if field.required
                    && !key.starts_with(CUSTOM_FIELD_PREFIX)
                    && !tree.contains_key(key.as_str())
                {
                    return Err(TrackerError::MissingRequired {
                        field: key.clone(),
                        project_key: issue.project_key.clone(),
                        issue_type_id,
                    });
                }
            }
            tree.retain(|key, _| key == "issuetype" || node.has_field(key));
            for (id, value) in &issue.custom_fields {
                let key = custom_field_key(*id);
                let Some(field) = node.field(&key) else {
                    continue;
                };
                if let Some(encoded) = encode_custom_value(value, field) {
                    tree.insert(key, encoded);
                }
            }
        }
        None => {
            for (id, value) in &issue.custom_fields {
                if let Some(encoded) = encode_custom_value_untranslated(value) {
                    tree.insert(custom_field_key(*id), encoded);
                }
            }
        }
    }

    Ok(json!({ "fields": Value::Object(tree) }))
}

/// Reconstructs the typed custom-field map from a fetched issue's raw
/// `fields` object, classifying each `customfield_*` value by its JSON
/// shape. Null, missing, and unrecognized shapes become absent values.
pub fn reconstruct_custom_fields(
    fields: &Map<String, Value>,
    node: Option<&MetaIssueType>,
) -> BTreeMap<i64, TypedValue> {
    let mut custom = BTreeMap::new();
    for (key, value) in fields {
        if !key.starts_with(CUSTOM_FIELD_PREFIX) {
            continue;
        }
        let Some(id) = custom_field_id(key) else {
            continue;
        };
        let field_meta = node.and_then(|n| n.field(key));
        match classify_value(value, field_meta) {
            Some(typed) => {
                custom.insert(id, typed);
            }
            None => {
                if !value.is_null() {
                    tracing::warn!(field = key.as_str(), "unrecognized custom-field shape");
                }
            }
        }
    }
    custom
}

fn classify_value(value: &Value, field: Option<&MetaField>) -> Option<TypedValue> {
    match value {
        Value::Bool(b) => Some(TypedValue::Boolean(*b)),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(TypedValue::Integer(i))
            } else {
                n.as_f64().map(TypedValue::Decimal)
            }
        }
        Value::String(s) => match parse_timestamp(s) {
            Some(ts) => Some(TypedValue::Date(ts)),
            None => Some(TypedValue::Text(s.clone())),
        },
        Value::Array(items) => {
            let names: Vec<String> = items
                .iter()
                .filter_map(|item| option_label(item, field))
                .collect();
            if names.is_empty() {
                None
            } else {
                Some(TypedValue::MultiList(names))
            }
        }
        Value::Object(obj) => {
            if obj.contains_key("id") {
                option_label(value, field).map(TypedValue::List)
            } else if let Some(name) = obj.get("name").and_then(Value::as_str) {
                Some(TypedValue::User(name.to_string()))
            } else {
                None
            }
        }
        Value::Null => None,
    }
}

/// Resolves one option object to its display name: the metadata lookup by
/// id first, then the object's own `value`/`name`.
fn option_label(item: &Value, field: Option<&MetaField>) -> Option<String> {
    let obj = item.as_object()?;
    if let Some(id) = obj.get("id").and_then(Value::as_str) {
        if let Some(label) = field.and_then(|f| f.option_label_by_id(id)) {
            return Some(label.to_string());
        }
    }
    obj.get("value")
        .or_else(|| obj.get("name"))
        .and_then(Value::as_str)
        .map(String::from)
}

/// Encodes a custom value for create, translating select options through
/// the metadata. Option mismatches are dropped silently.
fn encode_custom_value(value: &TypedValue, field: &MetaField) -> Option<Value> {
    match value {
        TypedValue::Text(s) => Some(Value::String(s.clone())),
        TypedValue::Integer(n) => Some(json!(n)),
        TypedValue::Decimal(d) => Some(json!(d)),
        TypedValue::Boolean(b) => Some(Value::Bool(*b)),
        TypedValue::Date(ts) => Some(Value::String(ts.to_rfc3339())),
        TypedValue::User(login) => Some(json!({ "name": login })),
        TypedValue::List(token) => option_ref(token, field),
        TypedValue::MultiList(tokens) => {
            let refs: Vec<Value> = tokens
                .iter()
                .filter_map(|token| option_ref(token, field))
                .collect();
            if refs.is_empty() {
                None
            } else {
                Some(Value::Array(refs))
            }
        }
    }
}

/// Encodes a custom value without metadata (validation skipped).
fn encode_custom_value_untranslated(value: &TypedValue) -> Option<Value> {
    match value {
        TypedValue::List(token) => Some(bare_option_ref(token)),
        TypedValue::MultiList(tokens) => {
            Some(Value::Array(tokens.iter().map(|t| bare_option_ref(t)).collect()))
        }
        other => encode_custom_value(other, &MetaField::default()),
    }
}

/// Resolves an option token (name or id) to an `{ "id": ... }` reference.
fn option_ref(token: &str, field: &MetaField) -> Option<Value> {
    if let Some(id) = field.option_id_by_label(token) {
        return Some(json!({ "id": id }));
    }
    if field.has_option_id(token) {
        return Some(json!({ "id": token }));
    }
    None
}

fn bare_option_ref(token: &str) -> Value {
    if token.chars().all(|c| c.is_ascii_digit()) && !token.is_empty() {
        json!({ "id": token })
    } else {
        json!({ "value": token })
    }
}

fn named_value(named: &tracklink_core::NamedId) -> Value {
    serde_json::to_value(named).unwrap_or(Value::Null)
}

fn version_refs(versions: &[tracklink_core::TrackerVersion]) -> Value {
    let refs: Vec<Value> = versions
        .iter()
        .map(|v| match &v.id {
            Some(id) => json!({ "id": id }),
            None => json!({ "name": v.name }),
        })
        .collect();
    Value::Array(refs)
}
