use std::future::Future;

use serde_json::Value;
use tracing::warn;

use super::{BackendClient, Payload};
use crate::error::ConsoleError;
use crate::model::{BackendHealth, OptimizationSnapshot, QueryBody};

/// Anything the stats poller can pull a snapshot from.
pub trait StatsSource: Send + Sync + 'static {
    fn fetch_stats(&self) -> impl Future<Output = Result<OptimizationSnapshot, ConsoleError>> + Send;
}

impl StatsSource for BackendClient {
    /// `GET /optimization/stats`.
    async fn fetch_stats(&self) -> Result<OptimizationSnapshot, ConsoleError> {
        let url = self.endpoint("optimization/stats")?;
        let payload = self.get_envelope(url).await?;
        decode_stats_payload(payload)
    }
}

impl BackendClient {
    /// `GET /health` on the backend.
    pub async fn health(&self) -> Result<BackendHealth, ConsoleError> {
        let url = self.endpoint("health")?;
        let value = self.get_json(url).await?;
        serde_json::from_value(value).map_err(|e| {
            warn!("Malformed backend health response: {}", e);
            ConsoleError::connection()
        })
    }

    /// `POST /query/update-stats`: runs one optimized query server-side so
    /// the counters move. Returns the backend's message.
    pub async fn update_stats(&self, document: &str, path: &str) -> Result<String, ConsoleError> {
        if document.trim().is_empty() || path.trim().is_empty() {
            return Err(ConsoleError::InvalidRequest(
                "document and query are both required".to_string(),
            ));
        }

        let url = self.endpoint("query/update-stats")?;
        let body = QueryBody {
            json: document,
            query: path,
        };
        let payload = self.post_envelope(url, &body).await?;

        Ok(payload
            .get("data")
            .and_then(|d| d.get("message"))
            .and_then(Value::as_str)
            .unwrap_or("Stats updated")
            .to_string())
    }
}

pub(crate) fn decode_stats_payload(mut payload: Payload) -> Result<OptimizationSnapshot, ConsoleError> {
    let data = match payload.remove("data") {
        Some(Value::Null) | None => return Ok(OptimizationSnapshot::default()),
        Some(data) => data,
    };

    serde_json::from_value(data).map_err(|e| {
        warn!("Malformed optimization stats payload: {}", e);
        ConsoleError::connection()
    })
}
