use serde_json::Value;
use tracing::info;

use super::{BackendClient, Payload};
use crate::error::ConsoleError;
use crate::model::{
    OptimizationStats, QueryBody, QueryMode, QueryReport, QueryRequest, WireOutcome,
};

/// Single-engine queries. Holds nothing between calls.
pub struct QueryClient<'a> {
    backend: &'a BackendClient,
}

impl<'a> QueryClient<'a> {
    pub fn new(backend: &'a BackendClient) -> Self {
        Self { backend }
    }

    /// `POST /query?library={engine}` (or `/query/optimized`).
    ///
    /// The document is sent as-is; the backend decides whether it is valid.
    pub async fn query(&self, request: &QueryRequest) -> Result<QueryReport, ConsoleError> {
        if request.path.trim().is_empty() {
            return Err(ConsoleError::InvalidRequest("query path is empty".to_string()));
        }

        let route = match request.mode {
            QueryMode::Standard => "query",
            QueryMode::Optimized => "query/optimized",
        };
        let mut url = self.backend.endpoint(route)?;
        url.query_pairs_mut()
            .append_pair("library", request.engine.as_str());

        let body = QueryBody {
            json: &request.document,
            query: &request.path,
        };
        let payload = self.backend.post_envelope(url, &body).await?;
        let report = decode_query_payload(payload)?;

        info!(
            "Query '{}' on {} -> found={} total={}",
            request.path,
            request.engine,
            report.outcome.is_found(),
            report.outcome.performance().total_time
        );
        Ok(report)
    }
}

/// Turns `{ data, optimization_stats? }` into one merged report.
pub(crate) fn decode_query_payload(mut payload: Payload) -> Result<QueryReport, ConsoleError> {
    let data = payload.remove("data").ok_or_else(ConsoleError::connection)?;
    let wire: WireOutcome = serde_json::from_value(data).map_err(|e| {
        tracing::warn!("Malformed query payload: {}", e);
        ConsoleError::connection()
    })?;

    if let Some(err) = wire.error.as_deref().filter(|e| !e.is_empty()) {
        return Err(ConsoleError::Backend(err.to_string()));
    }

    Ok(QueryReport {
        outcome: wire.into_outcome(),
        optimization_stats: decode_optional_stats(payload.remove("optimization_stats")),
    })
}

/// The sibling stats block is best-effort: a malformed one is dropped
/// rather than failing a query that otherwise succeeded.
pub(crate) fn decode_optional_stats(value: Option<Value>) -> Option<OptimizationStats> {
    match value {
        None | Some(Value::Null) => None,
        Some(v) => match serde_json::from_value(v) {
            Ok(stats) => Some(stats),
            Err(e) => {
                tracing::debug!("Ignoring malformed optimization_stats: {}", e);
                None
            }
        },
    }
}
