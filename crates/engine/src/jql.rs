// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! JQL assembly for the pull-phase time window.
//!
//! The Tracker evaluates bare JQL timestamps in its user's timezone, so the
//! UTC horizon is shifted by the configured offset before formatting.

use chrono::{DateTime, Duration, Utc};

/// The timestamp format the Tracker's query language accepts.
const JQL_TIME_FORMAT: &str = "%Y/%m/%d %H:%M";

/// Formats a UTC horizon for a JQL comparison in the given offset.
pub fn format_horizon(since: DateTime<Utc>, offset_hours: i32) -> String {
    let shifted = since + Duration::hours(i64::from(offset_hours));
    shifted.format(JQL_TIME_FORMAT).to_string()
}

/// Builds the pull-phase search clause for one project.
pub fn pull_clause(project_key: &str, since: DateTime<Utc>, offset_hours: i32) -> String {
    format!(
        "project = '{}' and updated >= '{}' order by updated asc",
        project_key,
        format_horizon(since, offset_hours)
    )
}

#[cfg(test)]
#[path = "jql_tests.rs"]
mod tests;
