// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Tests for the typed Tracker client against the mock transport.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use serde_json::json;

use tracklink_core::{NamedId, TrackerIssue, TypedValue};

use super::client::{TrackerClient, TrackerError, SEARCH_PAGE_SIZE};
use super::transport_tests::MockTransport;

const BASE: &str = "https://tracker.example.com";

fn client_with(transport: MockTransport) -> TrackerClient<MockTransport> {
    TrackerClient::with_transport(transport, BASE)
}

#[test]
fn browse_url_strips_trailing_slash() {
    let client = TrackerClient::with_transport(MockTransport::new(), "https://t.example.com/");
    assert_eq!(client.browse_url("DEMO-7"), "https://t.example.com/browse/DEMO-7");
}

#[test]
fn permissions_probe_accepts_populated_document() {
    let mut transport = MockTransport::new();
    transport.stub("GET", "mypermissions", json!({ "permissions": { "BROWSE": {} } }));
    let mut client = client_with(transport);
    assert!(client.my_permissions().is_ok());
}

#[test]
fn permissions_probe_rejects_empty_document() {
    let mut transport = MockTransport::new();
    transport.stub("GET", "mypermissions", json!({}));
    let mut client = client_with(transport);
    assert!(matches!(client.my_permissions(), Err(TrackerError::Probe(_))));
}

#[test]
fn search_pages_until_short_batch() {
    let mut transport = MockTransport::new();
    let full_page: Vec<_> = (0..SEARCH_PAGE_SIZE)
        .map(|i| json!({ "key": format!("DEMO-{}", i) }))
        .collect();
    transport.stub("POST", "search", json!({ "issues": full_page }));
    transport.stub("POST", "search", json!({ "issues": [ { "key": "DEMO-900" } ] }));
    let log = transport.request_log();

    let mut client = client_with(transport);
    let keys = client.search_keys("project = 'DEMO'").unwrap();

    assert_eq!(keys.len(), SEARCH_PAGE_SIZE + 1);
    assert_eq!(keys[0], "DEMO-0");
    assert_eq!(keys[SEARCH_PAGE_SIZE], "DEMO-900");

    let log = log.lock().unwrap();
    assert_eq!(log.len(), 2);
    assert_eq!(log[0].body["startAt"], 0);
    assert_eq!(log[1].body["startAt"], SEARCH_PAGE_SIZE);
    assert_eq!(log[0].body["fields"], json!(["key"]));
}

#[test]
fn create_issue_posts_shaped_payload_and_returns_key() {
    let mut transport = MockTransport::new();
    transport.stub("POST", "issue/", json!({ "id": "10500", "key": "DEMO-42" }));
    let log = transport.request_log();

    let meta = serde_json::from_value(json!({
        "projects": [{ "key": "DEMO", "issuetypes": [{
            "id": "10001",
            "fields": {
                "project": { "required": true },
                "summary": { "required": true },
                "issuetype": { "required": true },
                "reporter": {}
            }
        }]}]
    }))
    .unwrap();

    let mut issue = TrackerIssue::new("DEMO");
    issue.summary = "Crash on login".into();
    issue.issue_type = NamedId::from_id("10001");
    issue.reporter = Some("alice".into());
    issue.environment = Some("dropped".into());

    let mut client = client_with(transport);
    let key = client.create_issue(&issue, &meta).unwrap();
    assert_eq!(key, "DEMO-42");

    let log = log.lock().unwrap();
    let fields = log[0].body["fields"].as_object().unwrap();
    assert_eq!(fields["project"]["key"], "DEMO");
    assert_eq!(fields["summary"], "Crash on login");
    assert_eq!(fields["issuetype"]["id"], "10001");
    assert_eq!(fields["reporter"]["name"], "alice");
    assert!(fields.get("environment").is_none());
}

#[test]
fn issue_by_key_parses_full_record() {
    let mut transport = MockTransport::new();
    transport.stub(
        "GET",
        "issue/DEMO-11",
        json!({
            "key": "DEMO-11",
            "fields": {
                "project": { "key": "DEMO" },
                "issuetype": { "id": "7", "name": "Story" },
                "status": { "id": "3", "name": "In Progress" },
                "priority": { "id": "2", "name": "High" },
                "reporter": { "name": "alice" },
                "assignee": { "name": "bob" },
                "summary": "Sync me",
                "description": "plain body",
                "created": "2024-07-15T08:00:00.000+0000",
                "updated": "2024-07-15T11:30:00.000+0000",
                "duedate": "2024-08-01",
                "fixVersions": [
                    { "id": "9001", "name": "2024.07", "releaseDate": "2024-07-15" }
                ],
                "components": [ { "id": "400", "name": "backend" } ],
                "attachment": [
                    { "id": "600", "filename": "log.txt", "content": "https://tracker.example.com/att/600", "size": 12 }
                ],
                "comment": { "comments": [
                    { "author": { "name": "alice" }, "body": "fixed", "created": "2024-07-15T09:00:00.000+0000" },
                    { "updateAuthor": { "name": "bob" }, "body": "verified" }
                ]},
                "security": { "id": "200" },
                "customfield_20011": "free text"
            }
        }),
    );

    let mut client = client_with(transport);
    let issue = client.issue_by_key("DEMO-11", &Default::default()).unwrap();

    assert_eq!(issue.key.as_deref(), Some("DEMO-11"));
    assert_eq!(issue.project_key, "DEMO");
    assert_eq!(issue.issue_type_id(), Some(7));
    assert_eq!(issue.status.as_ref().unwrap().id.as_deref(), Some("3"));
    assert_eq!(issue.reporter.as_deref(), Some("alice"));
    assert_eq!(issue.assignee.as_deref(), Some("bob"));
    assert_eq!(issue.summary, "Sync me");
    assert_eq!(issue.due_date.unwrap().to_string(), "2024-08-01");
    assert_eq!(issue.fix_versions.len(), 1);
    assert_eq!(issue.fix_versions[0].id.as_deref(), Some("9001"));
    assert_eq!(
        issue.fix_versions[0].release_date.unwrap().to_string(),
        "2024-07-15"
    );
    assert_eq!(issue.components[0].name.as_deref(), Some("backend"));
    assert_eq!(issue.attachments[0].filename, "log.txt");
    assert_eq!(issue.comments.len(), 2);
    assert_eq!(issue.comments[1].effective_author(), Some("bob"));
    assert_eq!(issue.security_level_id, Some(200));
    assert_eq!(issue.custom_fields[&20011], TypedValue::Text("free text".into()));
}

#[test]
fn versions_parse_release_dates() {
    let mut transport = MockTransport::new();
    transport.stub(
        "GET",
        "project/DEMO/versions",
        json!([
            { "id": "9001", "name": "2024.07", "released": true, "releaseDate": "2024-07-15" },
            { "id": "9002", "name": "2024.08" }
        ]),
    );

    let mut client = client_with(transport);
    let versions = client.versions("DEMO").unwrap();
    assert_eq!(versions.len(), 2);
    assert!(versions[0].released);
    assert_eq!(versions[0].release_date.unwrap().to_string(), "2024-07-15");
    assert!(versions[1].release_date.is_none());
}

#[test]
fn create_version_sends_release_date() {
    let mut transport = MockTransport::new();
    transport.stub(
        "POST",
        "version",
        json!({ "id": "9100", "name": "2024.07", "released": false, "archived": false }),
    );
    let log = transport.request_log();

    let mut client = client_with(transport);
    let version = tracklink_core::TrackerVersion {
        name: "2024.07".into(),
        release_date: tracklink_core::value::parse_date("2024-07-15"),
        ..Default::default()
    };
    let stored = client.create_version("DEMO", &version).unwrap();
    assert_eq!(stored.id.as_deref(), Some("9100"));

    let log = log.lock().unwrap();
    assert_eq!(log[0].body["project"], "DEMO");
    assert_eq!(log[0].body["releaseDate"], "2024-07-15");
}

#[test]
fn issue_link_carries_optional_comment() {
    let mut transport = MockTransport::new();
    transport.stub("POST", "issueLink", json!(null));
    let log = transport.request_log();

    let mut client = client_with(transport);
    client
        .add_issue_link("Relates", "DEMO-1", "DEMO-2", Some("paired"))
        .unwrap();

    let log = log.lock().unwrap();
    assert_eq!(log[0].body["type"]["name"], "Relates");
    assert_eq!(log[0].body["inwardIssue"]["key"], "DEMO-1");
    assert_eq!(log[0].body["outwardIssue"]["key"], "DEMO-2");
    assert_eq!(log[0].body["comment"]["body"], "paired");
}
