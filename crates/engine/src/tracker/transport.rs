// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Transport abstraction for Tracker REST communication.
//!
//! Provides a trait-based transport layer that enables:
//! - Real HTTP connections for production
//! - Mock transports for unit testing
//!
//! The real transport speaks HTTP Basic auth, accepts self-signed
//! certificates when the engine instance opts in, and latches the first TLS
//! protocol version that succeeds against the server process-wide.

use std::sync::OnceLock;

use serde_json::Value;

/// Error type for transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Connection could not be established on any supported TLS version.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Request-level network failure.
    #[error("network error: {0}")]
    Network(String),

    /// Non-success HTTP status.
    #[error("http {status}: {body}")]
    Http { status: u16, body: String },

    /// Response body was not the JSON the caller expected.
    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Transport trait for Tracker REST communication.
///
/// Paths are relative to the REST base (`/rest/api/2/`); bodies and
/// responses are raw JSON trees. `download` fetches an absolute URL, used
/// for attachment content links.
pub trait Transport {
    fn get(&mut self, path: &str, query: &[(&str, String)]) -> TransportResult<Value>;
    fn post(&mut self, path: &str, body: &Value) -> TransportResult<Value>;
    /// Multipart upload of one file under the form field `file`.
    fn upload(&mut self, path: &str, filename: &str, data: Vec<u8>) -> TransportResult<Value>;
    fn download(&mut self, url: &str) -> TransportResult<Vec<u8>>;
}

/// REST base path prepended to every relative request.
const REST_BASE: &str = "/rest/api/2/";

/// The TLS protocol ladder, newest first. The first version that reaches
/// the server is latched process-wide; older SSL revisions are not
/// expressible in the TLS stack and are omitted from the ladder.
const TLS_LADDER: [reqwest::tls::Version; 3] = [
    reqwest::tls::Version::TLS_1_2,
    reqwest::tls::Version::TLS_1_1,
    reqwest::tls::Version::TLS_1_0,
];

/// Process-wide latch: init once, read many.
static TLS_PROTOCOL: OnceLock<reqwest::tls::Version> = OnceLock::new();

/// Blocking HTTP transport over reqwest.
pub struct HttpTransport {
    base_url: String,
    /// Basic-auth credentials; `None` in integrated single-sign-on mode,
    /// where the ambient environment supplies the identity.
    auth: Option<(String, String)>,
    accept_invalid_certs: bool,
    client: Option<reqwest::blocking::Client>,
}

impl HttpTransport {
    /// Creates a transport for the given Tracker base URL.
    pub fn new(
        base_url: &str,
        login: &str,
        password: &str,
        accept_invalid_certs: bool,
    ) -> Self {
        HttpTransport {
            base_url: base_url.trim_end_matches('/').to_string(),
            auth: Some((login.to_string(), password.to_string())),
            accept_invalid_certs,
            client: None,
        }
    }

    /// Creates a transport that sends no Authorization header, for
    /// single-sign-on environments.
    pub fn integrated(base_url: &str, accept_invalid_certs: bool) -> Self {
        HttpTransport {
            base_url: base_url.trim_end_matches('/').to_string(),
            auth: None,
            accept_invalid_certs,
            client: None,
        }
    }

    fn build_client(
        &self,
        version: reqwest::tls::Version,
    ) -> TransportResult<reqwest::blocking::Client> {
        reqwest::blocking::Client::builder()
            .min_tls_version(version)
            .danger_accept_invalid_certs(self.accept_invalid_certs)
            .build()
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))
    }

    fn rest_url(&self, path: &str) -> String {
        format!("{}{}{}", self.base_url, REST_BASE, path.trim_start_matches('/'))
    }

    /// Runs one request, negotiating the TLS version on first use.
    ///
    /// An HTTP response of any status proves the protocol works, so the
    /// version latches before status handling.
    fn execute<F>(&mut self, send: F) -> TransportResult<reqwest::blocking::Response>
    where
        F: Fn(
            &reqwest::blocking::Client,
        ) -> Result<reqwest::blocking::Response, reqwest::Error>,
    {
        if let Some(client) = &self.client {
            return send(client).map_err(|e| TransportError::Network(e.to_string()));
        }

        let latched = TLS_PROTOCOL.get().copied();
        let ladder: Vec<reqwest::tls::Version> = match latched {
            Some(v) => vec![v],
            None => TLS_LADDER.to_vec(),
        };

        let mut last_error = None;
        for version in ladder {
            let client = self.build_client(version)?;
            match send(&client) {
                Ok(response) => {
                    let _ = TLS_PROTOCOL.set(version);
                    tracing::debug!(?version, "tracker TLS protocol negotiated");
                    self.client = Some(client);
                    return Ok(response);
                }
                Err(e) if e.is_connect() || e.is_request() => {
                    last_error = Some(e.to_string());
                    continue;
                }
                Err(e) => return Err(TransportError::Network(e.to_string())),
            }
        }
        Err(TransportError::ConnectionFailed(
            last_error.unwrap_or_else(|| "no TLS protocol accepted".to_string()),
        ))
    }

    fn read_json(response: reqwest::blocking::Response) -> TransportResult<Value> {
        let status = response.status();
        let body = response
            .text()
            .map_err(|e| TransportError::Network(e.to_string()))?;
        if !status.is_success() {
            return Err(TransportError::Http {
                status: status.as_u16(),
                body,
            });
        }
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body).map_err(|e| TransportError::Malformed(e.to_string()))
    }
}

/// Applies the optional Basic-auth credentials to a request.
fn with_auth(
    builder: reqwest::blocking::RequestBuilder,
    auth: &Option<(String, String)>,
) -> reqwest::blocking::RequestBuilder {
    match auth {
        Some((login, password)) => builder.basic_auth(login, Some(password)),
        None => builder,
    }
}

impl Transport for HttpTransport {
    fn get(&mut self, path: &str, query: &[(&str, String)]) -> TransportResult<Value> {
        let url = self.rest_url(path);
        let auth = self.auth.clone();
        let response = self.execute(|client| {
            with_auth(client.get(&url).query(query), &auth)
                .header("Content-Type", "application/json")
                .send()
        })?;
        Self::read_json(response)
    }

    fn post(&mut self, path: &str, body: &Value) -> TransportResult<Value> {
        let url = self.rest_url(path);
        let auth = self.auth.clone();
        let response = self.execute(|client| {
            with_auth(client.post(&url), &auth)
                .header("Content-Type", "application/json")
                .json(body)
                .send()
        })?;
        Self::read_json(response)
    }

    fn upload(&mut self, path: &str, filename: &str, data: Vec<u8>) -> TransportResult<Value> {
        let url = self.rest_url(path);
        let auth = self.auth.clone();
        let filename = filename.to_string();
        let response = self.execute(move |client| {
            let part = reqwest::blocking::multipart::Part::bytes(data.clone())
                .file_name(filename.clone());
            let form = reqwest::blocking::multipart::Form::new().part("file", part);
            with_auth(client.post(&url), &auth)
                .header("X-Atlassian-Token", "nocheck")
                .multipart(form)
                .send()
        })?;
        Self::read_json(response)
    }

    fn download(&mut self, url: &str) -> TransportResult<Vec<u8>> {
        let url = url.to_string();
        let auth = self.auth.clone();
        let response = self.execute(|client| with_auth(client.get(&url), &auth).send())?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Http {
                status: status.as_u16(),
                body: String::new(),
            });
        }
        let bytes = response
            .bytes()
            .map_err(|e| TransportError::Network(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}
