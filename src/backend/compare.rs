use serde_json::Value;
use tracing::{info, warn};

use super::query::decode_optional_stats;
use super::{BackendClient, Payload};
use crate::error::ConsoleError;
use crate::model::{ComparisonResult, EngineId, QueryBody, QueryMode, WireOutcome};

/// Fan-out queries. The backend runs every registered engine; no engine is
/// named in the request.
pub struct ComparisonClient<'a> {
    backend: &'a BackendClient,
}

impl<'a> ComparisonClient<'a> {
    pub fn new(backend: &'a BackendClient) -> Self {
        Self { backend }
    }

    /// `POST /query/compare` (or `/query/optimized/compare`).
    ///
    /// All-or-nothing: any per-engine failure rejects the whole comparison.
    pub async fn compare(
        &self,
        document: &str,
        path: &str,
        mode: QueryMode,
    ) -> Result<ComparisonResult, ConsoleError> {
        if path.trim().is_empty() {
            return Err(ConsoleError::InvalidRequest("query path is empty".to_string()));
        }

        let route = match mode {
            QueryMode::Standard => "query/compare",
            QueryMode::Optimized => "query/optimized/compare",
        };
        let url = self.backend.endpoint(route)?;
        let body = QueryBody {
            json: document,
            query: path,
        };

        let payload = self.backend.post_envelope(url, &body).await?;
        let result = decode_comparison_payload(payload)?;

        info!(
            "Comparison '{}' across {} engines",
            path,
            result.len()
        );
        Ok(result)
    }
}

pub(crate) fn decode_comparison_payload(mut payload: Payload) -> Result<ComparisonResult, ConsoleError> {
    let Some(Value::Object(results)) = payload.remove("results") else {
        warn!("Comparison response has no results map");
        return Err(ConsoleError::connection());
    };

    let mut comparison = ComparisonResult::default();
    for (engine, entry) in results {
        let wire: WireOutcome = serde_json::from_value(entry).map_err(|e| {
            warn!("Malformed comparison entry for {}: {}", engine, e);
            ConsoleError::connection()
        })?;

        if let Some(err) = wire.error.as_deref().filter(|e| !e.is_empty()) {
            return Err(ConsoleError::Backend(format!("{}: {}", engine, err)));
        }

        comparison.insert(EngineId::new(engine), wire.into_outcome());
    }

    comparison.optimization_stats = decode_optional_stats(payload.remove("optimization_stats"));
    Ok(comparison)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(v: Value) -> Payload {
        match v {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_keeps_backend_order() {
        let result = decode_comparison_payload(payload(json!({
            "results": {
                "standard": {"found": true, "value": "es", "performance": {}},
                "fastjson": {"found": true, "value": "es", "performance": {}},
                "json-iterator": {"found": true, "value": "es", "performance": {}}
            }
        })))
        .unwrap();

        let order: Vec<&str> = result.engines().map(|e| e.as_str()).collect();
        assert_eq!(order, vec!["standard", "fastjson", "json-iterator"]);
    }

    #[test]
    fn test_engine_error_rejects_everything() {
        let err = decode_comparison_payload(payload(json!({
            "results": {
                "standard": {"found": true, "value": 1, "performance": {}},
                "fastjson": {"found": false, "error": "cannot parse JSON", "performance": {}}
            }
        })))
        .unwrap_err();
        assert_eq!(err.to_string(), "fastjson: cannot parse JSON");
    }

    #[test]
    fn test_missing_results_is_malformed() {
        let err = decode_comparison_payload(payload(json!({"data": {}}))).unwrap_err();
        assert!(matches!(err, ConsoleError::Transport(_)));
    }
}
