// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Typed wrappers over the Tracker REST resources the engine uses.
//!
//! The client owns pagination, response parsing, and the create-payload
//! validation in [`super::fields`]. It is generic over the transport so
//! every wrapper is testable against a mock.

use chrono::{DateTime, Utc};
use serde_json::{json, Map, Value};

use tracklink_core::value::{parse_date, parse_timestamp};
use tracklink_core::{
    CreateMeta, NamedId, TrackerAttachment, TrackerComment, TrackerIssue, TrackerProject,
    TrackerVersion,
};

use super::fields;
use super::transport::{HttpTransport, Transport, TransportError};
use crate::config::EngineConfig;

/// Page size for issue searches; the engine pages until a batch comes back
/// short.
pub const SEARCH_PAGE_SIZE: usize = 100;

/// Error type for Tracker client operations.
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    /// Transport-level failure.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The create-metadata requires a field the payload does not carry.
    #[error("required field '{field}' missing for issue type {issue_type_id} in project {project_key}")]
    MissingRequired {
        field: String,
        project_key: String,
        issue_type_id: String,
    },

    /// The permissions probe returned nothing usable.
    #[error("connectivity probe failed: {0}")]
    Probe(String),

    /// Response did not match the expected shape.
    #[error("malformed tracker response: {0}")]
    Malformed(String),
}

/// Result type for Tracker client operations.
pub type TrackerResult<T> = Result<T, TrackerError>;

/// Typed Tracker REST client.
pub struct TrackerClient<T: Transport = HttpTransport> {
    transport: T,
    base_url: String,
}

impl TrackerClient<HttpTransport> {
    /// Connects a client from the engine configuration.
    pub fn connect(config: &EngineConfig) -> Self {
        let transport = if config.use_integrated_auth {
            HttpTransport::integrated(&config.tracker.base_url, config.accept_invalid_certs)
        } else {
            HttpTransport::new(
                &config.tracker.base_url,
                &config.tracker.login,
                &config.tracker.password,
                config.accept_invalid_certs,
            )
        };
        TrackerClient::with_transport(transport, &config.tracker.base_url)
    }
}

impl<T: Transport> TrackerClient<T> {
    /// Creates a client over a custom transport (used in tests).
    pub fn with_transport(transport: T, base_url: &str) -> Self {
        TrackerClient {
            transport,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// The browser URL for an issue key.
    pub fn browse_url(&self, key: &str) -> String {
        format!("{}/browse/{}", self.base_url, key)
    }

    /// Connectivity and authorization probe.
    ///
    /// An empty permissions document means the credentials reached the
    /// server but carry no grants, which the engine treats the same as a
    /// failed connection.
    pub fn my_permissions(&mut self) -> TrackerResult<Value> {
        let value = self.transport.get("mypermissions", &[])?;
        match &value {
            Value::Object(map) if !map.is_empty() => Ok(value),
            _ => Err(TrackerError::Probe("empty permissions response".into())),
        }
    }

    /// Fetches the field catalog, optionally narrowed to one project.
    pub fn create_metadata(&mut self, project_key: Option<&str>) -> TrackerResult<CreateMeta> {
        let mut query = vec![("expand", "projects.issuetypes.fields".to_string())];
        if let Some(key) = project_key {
            query.push(("projectKeys", key.to_string()));
        }
        let value = self.transport.get("issue/createmeta", &query)?;
        serde_json::from_value(value).map_err(|e| TrackerError::Malformed(e.to_string()))
    }

    /// Lists all projects visible to the sync user.
    pub fn projects(&mut self) -> TrackerResult<Vec<TrackerProject>> {
        let value = self.transport.get("project", &[])?;
        serde_json::from_value(value).map_err(|e| TrackerError::Malformed(e.to_string()))
    }

    /// Lists a project's versions.
    pub fn versions(&mut self, project_key: &str) -> TrackerResult<Vec<TrackerVersion>> {
        let value = self
            .transport
            .get(&format!("project/{}/versions", project_key), &[])?;
        serde_json::from_value(value).map_err(|e| TrackerError::Malformed(e.to_string()))
    }

    /// Lists a project's components.
    pub fn components(&mut self, project_key: &str) -> TrackerResult<Vec<NamedId>> {
        let value = self
            .transport
            .get(&format!("project/{}/components", project_key), &[])?;
        serde_json::from_value(value).map_err(|e| TrackerError::Malformed(e.to_string()))
    }

    /// Runs a paginated search, accumulating issue keys only.
    ///
    /// Keys come back in the order the JQL's `order by` dictates; full
    /// issues are re-fetched one by one to keep search payloads small.
    pub fn search_keys(&mut self, jql: &str) -> TrackerResult<Vec<String>> {
        let mut keys = Vec::new();
        let mut start_at = 0usize;
        loop {
            let body = json!({
                "jql": jql,
                "startAt": start_at,
                "maxResults": SEARCH_PAGE_SIZE,
                "fields": ["key"],
            });
            let value = self.transport.post("search", &body)?;
            let issues = value
                .get("issues")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default();
            let batch = issues.len();
            for issue in &issues {
                if let Some(key) = issue.get("key").and_then(Value::as_str) {
                    keys.push(key.to_string());
                }
            }
            if batch < SEARCH_PAGE_SIZE {
                break;
            }
            start_at += batch;
        }
        Ok(keys)
    }

    /// Fetches one issue with comments, attachments, and custom fields
    /// reconstructed against the create-metadata.
    pub fn issue_by_key(&mut self, key: &str, meta: &CreateMeta) -> TrackerResult<TrackerIssue> {
        let value = self.transport.get(&format!("issue/{}", key), &[])?;
        let fields = value
            .get("fields")
            .and_then(Value::as_object)
            .ok_or_else(|| TrackerError::Malformed(format!("issue {} has no fields", key)))?;

        let project_key = fields
            .get("project")
            .and_then(|p| p.get("key"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let issue_type = named_id(fields.get("issuetype")).unwrap_or_default();
        let node = issue_type
            .id
            .as_deref()
            .and_then(|id| meta.issue_type_node(&project_key, id));

        let mut issue = TrackerIssue::new(project_key);
        issue.key = Some(key.to_string());
        issue.issue_type = issue_type;
        issue.status = named_id(fields.get("status"));
        issue.priority = named_id(fields.get("priority"));
        issue.resolution = named_id(fields.get("resolution"));
        issue.reporter = person_name(fields.get("reporter"));
        issue.assignee = person_name(fields.get("assignee"));
        issue.summary = str_field(fields, "summary").unwrap_or_default();
        issue.description = str_field(fields, "description");
        issue.environment = str_field(fields, "environment");
        issue.created = time_field(fields, "created");
        issue.updated = time_field(fields, "updated");
        issue.due_date = str_field(fields, "duedate").and_then(|s| parse_date(&s));
        issue.resolution_date = time_field(fields, "resolutiondate");
        issue.versions = version_list(fields.get("versions"));
        issue.fix_versions = version_list(fields.get("fixVersions"));
        issue.components = component_list(fields.get("components"));
        issue.attachments = attachment_list(fields.get("attachment"));
        issue.comments = comment_list(fields.get("comment"));
        issue.security_level_id = fields
            .get("security")
            .and_then(|s| s.get("id"))
            .and_then(Value::as_str)
            .and_then(|s| s.parse().ok());
        issue.custom_fields = fields::reconstruct_custom_fields(fields, node);
        Ok(issue)
    }

    /// Creates an issue, validating the payload against the metadata.
    /// Returns the assigned key.
    pub fn create_issue(&mut self, issue: &TrackerIssue, meta: &CreateMeta) -> TrackerResult<String> {
        let payload = fields::shape_create_payload(issue, meta)?;
        let value = self.transport.post("issue/", &payload)?;
        value
            .get("key")
            .and_then(Value::as_str)
            .map(String::from)
            .ok_or_else(|| TrackerError::Malformed("issue create returned no key".into()))
    }

    /// Uploads one file attachment onto an issue.
    pub fn add_attachment(
        &mut self,
        key: &str,
        filename: &str,
        data: Vec<u8>,
    ) -> TrackerResult<()> {
        self.transport
            .upload(&format!("issue/{}/attachments", key), filename, data)?;
        Ok(())
    }

    /// Records a remote web link on an issue.
    pub fn add_web_link(&mut self, key: &str, url: &str, title: &str) -> TrackerResult<()> {
        let body = json!({ "object": { "url": url, "title": title } });
        self.transport
            .post(&format!("issue/{}/remotelink", key), &body)?;
        Ok(())
    }

    /// Links two issues with the given link type.
    pub fn add_issue_link(
        &mut self,
        link_type: &str,
        inward_key: &str,
        outward_key: &str,
        comment: Option<&str>,
    ) -> TrackerResult<()> {
        let mut body = json!({
            "type": { "name": link_type },
            "inwardIssue": { "key": inward_key },
            "outwardIssue": { "key": outward_key },
        });
        if let Some(text) = comment {
            body["comment"] = json!({ "body": text });
        }
        self.transport.post("issueLink", &body)?;
        Ok(())
    }

    /// Creates a project version, returning the stored row.
    pub fn create_version(
        &mut self,
        project_key: &str,
        version: &TrackerVersion,
    ) -> TrackerResult<TrackerVersion> {
        let mut body = json!({
            "name": version.name,
            "project": project_key,
            "released": version.released,
            "archived": version.archived,
        });
        if let Some(date) = version.release_date {
            body["releaseDate"] = Value::String(date.format("%Y-%m-%d").to_string());
        }
        let value = self.transport.post("version", &body)?;
        serde_json::from_value(value).map_err(|e| TrackerError::Malformed(e.to_string()))
    }

    /// Downloads attachment content from its absolute URL.
    pub fn download_attachment(&mut self, url: &str) -> TrackerResult<Vec<u8>> {
        Ok(self.transport.download(url)?)
    }
}

fn named_id(value: Option<&Value>) -> Option<NamedId> {
    value
        .filter(|v| v.is_object())
        .and_then(|v| serde_json::from_value(v.clone()).ok())
}

fn person_name(value: Option<&Value>) -> Option<String> {
    value
        .and_then(|v| v.get("name"))
        .and_then(Value::as_str)
        .map(String::from)
}

fn str_field(fields: &Map<String, Value>, key: &str) -> Option<String> {
    fields.get(key).and_then(Value::as_str).map(String::from)
}

fn time_field(fields: &Map<String, Value>, key: &str) -> Option<DateTime<Utc>> {
    fields
        .get(key)
        .and_then(Value::as_str)
        .and_then(parse_timestamp)
}

fn version_list(value: Option<&Value>) -> Vec<TrackerVersion> {
    value
        .and_then(|v| serde_json::from_value(v.clone()).ok())
        .unwrap_or_default()
}

fn component_list(value: Option<&Value>) -> Vec<NamedId> {
    value
        .and_then(|v| serde_json::from_value(v.clone()).ok())
        .unwrap_or_default()
}

fn attachment_list(value: Option<&Value>) -> Vec<TrackerAttachment> {
    value
        .and_then(|v| serde_json::from_value(v.clone()).ok())
        .unwrap_or_default()
}

fn comment_list(value: Option<&Value>) -> Vec<TrackerComment> {
    let Some(comments) = value
        .and_then(|v| v.get("comments"))
        .and_then(Value::as_array)
    else {
        return Vec::new();
    };
    comments
        .iter()
        .filter_map(|c| {
            let body = c.get("body").and_then(Value::as_str)?;
            Some(TrackerComment {
                author: person_name(c.get("author")),
                update_author: person_name(c.get("updateAuthor")),
                body: body.to_string(),
                created: c
                    .get("created")
                    .and_then(Value::as_str)
                    .and_then(parse_timestamp),
            })
        })
        .collect()
}
