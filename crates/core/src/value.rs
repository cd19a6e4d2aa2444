// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Dynamically typed custom values exchanged between the Hub and the Tracker.
//!
//! The Hub exposes a closed typed schema (slots 1..30 per artifact); the
//! Tracker exposes arbitrary numeric custom-field ids. [`TypedValue`] is the
//! common currency both transformers speak.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A dynamically typed custom value. Exactly one branch is populated.
///
/// `List` and `User` carry either an option/login name or a decimal id,
/// depending on which side of the sync the value is bound for: the Hub
/// stores option and user ids, the Tracker stores option names and logins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum TypedValue {
    Text(String),
    Integer(i64),
    Decimal(f64),
    Boolean(bool),
    Date(DateTime<Utc>),
    List(String),
    MultiList(Vec<String>),
    User(String),
}

impl TypedValue {
    /// Returns the variant name used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            TypedValue::Text(_) => "text",
            TypedValue::Integer(_) => "integer",
            TypedValue::Decimal(_) => "decimal",
            TypedValue::Boolean(_) => "boolean",
            TypedValue::Date(_) => "date",
            TypedValue::List(_) => "list",
            TypedValue::MultiList(_) => "multi_list",
            TypedValue::User(_) => "user",
        }
    }

    /// Returns the text payload when this is a `Text` value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            TypedValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Returns the single list token when this is a `List` value.
    pub fn as_list(&self) -> Option<&str> {
        match self {
            TypedValue::List(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Flattens any variant into a display string.
    ///
    /// Used when a value must be carried across as plain text because the
    /// receiving slot cannot represent it natively.
    pub fn to_display_string(&self) -> String {
        match self {
            TypedValue::Text(s) | TypedValue::List(s) | TypedValue::User(s) => s.clone(),
            TypedValue::Integer(n) => n.to_string(),
            TypedValue::Decimal(d) => d.to_string(),
            TypedValue::Boolean(b) => b.to_string(),
            TypedValue::Date(d) => d.to_rfc3339(),
            TypedValue::MultiList(items) => items.join(", "),
        }
    }
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_display_string())
    }
}

/// Parse a timestamp string in any of the formats the Tracker emits.
///
/// Accepts RFC 3339, the Tracker's `2024-07-15T10:00:00.000+0000` shape,
/// naive datetimes (assumed UTC), and bare dates (midnight UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%d %H:%M:%S%.f %z"] {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        let naive = date.and_hms_opt(0, 0, 0)?;
        return Some(Utc.from_utc_datetime(&naive));
    }
    None
}

/// Parse a date-only string (`2024-07-15`).
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

#[cfg(test)]
#[path = "value_tests.rs"]
mod tests;
