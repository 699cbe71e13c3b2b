//! HTTP client for the query backend.
//!
//! Every backend endpoint answers with the same envelope:
//! `{ "success": bool, "error"?: string, ...payload }`. This module owns the
//! transport and the envelope rules; `query`, `compare` and `stats` decode
//! their own payloads on top of it.

pub mod compare;
pub mod query;
pub mod stats;

use reqwest::StatusCode;
use serde::Serialize;
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::error::ConsoleError;

pub use stats::StatsSource;

/// Envelope fields left over after `success`/`error` were checked.
pub(crate) type Payload = Map<String, Value>;

#[derive(Debug, Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: Url,
}

impl BackendClient {
    /// `timeout` of `None` leaves the transport default in place.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, ConsoleError> {
        let mut base_url = Url::parse(base_url)?;
        // Relative joins must append to the configured path, not replace it.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let mut builder = reqwest::Client::builder().pool_max_idle_per_host(4);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| ConsoleError::Transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub(crate) fn endpoint(&self, path: &str) -> Result<Url, ConsoleError> {
        Ok(self.base_url.join(path)?)
    }

    pub(crate) async fn post_envelope<B: Serialize + ?Sized>(
        &self,
        url: Url,
        body: &B,
    ) -> Result<Payload, ConsoleError> {
        debug!("POST {}", url);
        let resp = self
            .http
            .post(url.clone())
            .json(body)
            .send()
            .await
            .map_err(|e| transport_error(&url, e))?;
        read_envelope(&url, resp).await
    }

    pub(crate) async fn get_envelope(&self, url: Url) -> Result<Payload, ConsoleError> {
        debug!("GET {}", url);
        let resp = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|e| transport_error(&url, e))?;
        read_envelope(&url, resp).await
    }

    /// GET for endpoints that do not use the success envelope.
    pub(crate) async fn get_json(&self, url: Url) -> Result<Value, ConsoleError> {
        debug!("GET {}", url);
        let resp = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|e| transport_error(&url, e))?;

        if !resp.status().is_success() {
            warn!("Backend {} answered {}", url, resp.status());
            return Err(ConsoleError::connection());
        }

        resp.json().await.map_err(|e| transport_error(&url, e))
    }
}

fn transport_error(url: &Url, e: reqwest::Error) -> ConsoleError {
    if e.is_connect() {
        warn!("Cannot connect to backend at {}: {}", url, e);
    } else if e.is_timeout() {
        warn!("Backend request to {} timed out: {}", url, e);
    } else {
        warn!("Backend request to {} failed: {}", url, e);
    }
    ConsoleError::connection()
}

async fn read_envelope(url: &Url, resp: reqwest::Response) -> Result<Payload, ConsoleError> {
    let status = resp.status();
    let bytes = resp.bytes().await.map_err(|e| transport_error(url, e))?;
    decode_envelope(status, &bytes).inspect_err(|e| {
        debug!("Backend {} rejected with {} ({})", url, status, e);
    })
}

/// Applies the envelope rules to a raw response.
///
/// * non-2xx with an `error` string: backend error with that message
/// * non-2xx without one, or an unparseable body: connection error
/// * 2xx with `success: false`: backend error, `error` or "Unknown error"
pub(crate) fn decode_envelope(status: StatusCode, body: &[u8]) -> Result<Payload, ConsoleError> {
    let parsed: Option<Payload> = serde_json::from_slice(body).ok();

    let Some(mut envelope) = parsed else {
        if status.is_success() {
            warn!("Backend returned a body that is not a JSON object");
        }
        return Err(ConsoleError::connection());
    };

    let message = envelope
        .get("error")
        .and_then(Value::as_str)
        .map(str::to_string)
        .filter(|m| !m.trim().is_empty());

    if !status.is_success() {
        return match message {
            Some(m) => Err(ConsoleError::Backend(m)),
            None => Err(ConsoleError::connection()),
        };
    }

    let success = envelope
        .remove("success")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);
    if !success {
        return Err(ConsoleError::backend(message.as_deref()));
    }

    envelope.remove("error");
    Ok(envelope)
}
