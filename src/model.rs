use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

pub use crate::duration::ReportedDuration;

// --- Engines ---

/// Opaque engine identifier forwarded to the backend as `?library=`.
///
/// The set is open: anything the backend registers is accepted. The three
/// built-in ids only matter for display labels.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EngineId(String);

impl EngineId {
    pub const STANDARD: &'static str = "standard";
    pub const JSON_ITERATOR: &'static str = "json-iterator";
    pub const FASTJSON: &'static str = "fastjson";

    pub fn new(id: impl Into<String>) -> Self {
        EngineId(id.into())
    }

    pub fn standard() -> Self {
        EngineId::new(Self::STANDARD)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn label(&self) -> &str {
        match self.0.as_str() {
            Self::STANDARD => "Standard Library",
            Self::JSON_ITERATOR => "json-iterator/go",
            Self::FASTJSON => "valyala/fastjson",
            other => other,
        }
    }
}

impl Default for EngineId {
    fn default() -> Self {
        EngineId::standard()
    }
}

impl fmt::Display for EngineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EngineId {
    fn from(s: &str) -> Self {
        EngineId::new(s)
    }
}

/// Engines offered by default when nothing else is configured.
pub fn default_engines() -> Vec<EngineId> {
    vec![
        EngineId::new(EngineId::STANDARD),
        EngineId::new(EngineId::JSON_ITERATOR),
        EngineId::new(EngineId::FASTJSON),
    ]
}

// --- Requests ---

/// Which backend endpoint family a query goes to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryMode {
    #[default]
    Standard,
    Optimized,
}

#[derive(Debug, Clone)]
pub struct QueryRequest {
    /// Raw JSON text. Not parsed here; the backend validates it.
    pub document: String,
    /// Dot-delimited path, e.g. `data.users.0.name`.
    pub path: String,
    pub engine: EngineId,
    pub mode: QueryMode,
}

impl QueryRequest {
    pub fn new(document: impl Into<String>, path: impl Into<String>, engine: EngineId) -> Self {
        Self {
            document: document.into(),
            path: path.into(),
            engine,
            mode: QueryMode::Standard,
        }
    }

    pub fn optimized(mut self) -> Self {
        self.mode = QueryMode::Optimized;
        self
    }
}

/// Wire body shared by every POST the backend accepts.
#[derive(Debug, Serialize)]
pub(crate) struct QueryBody<'a> {
    pub json: &'a str,
    pub query: &'a str,
}

// --- Outcomes ---

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    #[serde(default)]
    pub library_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub parse_time: ReportedDuration,
    #[serde(default, deserialize_with = "null_as_default")]
    pub query_time: ReportedDuration,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_time: ReportedDuration,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_usage: Option<i64>,
}

/// Result of one query against one engine.
///
/// `value()` is `None` exactly when `found()` is false. A found JSON `null`
/// is `Some(Value::Null)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryOutcome {
    found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    path: Vec<String>,
    performance: PerformanceMetrics,
}

impl QueryOutcome {
    pub fn found(value: Value, performance: PerformanceMetrics) -> Self {
        Self {
            found: true,
            value: Some(value),
            path: Vec::new(),
            performance,
        }
    }

    pub fn not_found(performance: PerformanceMetrics) -> Self {
        Self {
            found: false,
            value: None,
            path: Vec::new(),
            performance,
        }
    }

    pub fn with_path(mut self, path: Vec<String>) -> Self {
        self.path = path;
        self
    }

    pub fn is_found(&self) -> bool {
        self.found
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    pub fn path(&self) -> &[String] {
        &self.path
    }

    pub fn performance(&self) -> &PerformanceMetrics {
        &self.performance
    }
}

/// Outcome as the backend encodes it inside `data` or `results[engine]`.
#[derive(Debug, Deserialize)]
pub(crate) struct WireOutcome {
    #[serde(default)]
    pub found: bool,
    #[serde(default)]
    pub value: Value,
    #[serde(default)]
    pub path: Option<Vec<String>>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub performance: PerformanceMetrics,
}

impl WireOutcome {
    pub fn into_outcome(self) -> QueryOutcome {
        let outcome = if self.found {
            QueryOutcome::found(self.value, self.performance)
        } else {
            QueryOutcome::not_found(self.performance)
        };
        outcome.with_path(self.path.unwrap_or_default())
    }
}

/// A single-engine query result merged with the optimizer counters the
/// backend attached to the same response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryReport {
    #[serde(flatten)]
    pub outcome: QueryOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optimization_stats: Option<OptimizationStats>,
}

// --- Comparisons ---

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineComparison {
    pub engine: EngineId,
    pub outcome: QueryOutcome,
}

/// Outcomes keyed by engine, in the order the backend listed them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ComparisonResult {
    entries: Vec<EngineComparison>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optimization_stats: Option<OptimizationStats>,
}

impl ComparisonResult {
    /// Inserts or replaces the outcome for `engine`, keeping keys unique.
    pub fn insert(&mut self, engine: EngineId, outcome: QueryOutcome) {
        match self.entries.iter_mut().find(|e| e.engine == engine) {
            Some(existing) => existing.outcome = outcome,
            None => self.entries.push(EngineComparison { engine, outcome }),
        }
    }

    pub fn get(&self, engine: &str) -> Option<&QueryOutcome> {
        self.entries
            .iter()
            .find(|e| e.engine.as_str() == engine)
            .map(|e| &e.outcome)
    }

    pub fn engines(&self) -> impl Iterator<Item = &EngineId> {
        self.entries.iter().map(|e| &e.engine)
    }

    pub fn iter(&self) -> impl Iterator<Item = &EngineComparison> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// --- Optimizer statistics ---

/// Reads an explicit `null` the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Counters from the optimized engine. Field names follow the backend's
/// exported Go struct fields; every field defaults to zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct OptimizationStats {
    #[serde(deserialize_with = "null_as_default")]
    pub total_queries: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub optimized_queries: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub cache_hits: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub average_optimization_time: ReportedDuration,
    #[serde(deserialize_with = "null_as_default")]
    pub total_optimization_time: ReportedDuration,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct OptimizerStats {
    #[serde(deserialize_with = "null_as_default")]
    pub total_queries: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub cache_hits: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub optimizations: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub average_time: ReportedDuration,
    #[serde(deserialize_with = "null_as_default")]
    pub total_time: ReportedDuration,
}

/// Point-in-time copy of both counter sets. Replaced wholesale on every poll.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizationSnapshot {
    #[serde(deserialize_with = "null_as_default")]
    pub optimization_stats: OptimizationStats,
    #[serde(deserialize_with = "null_as_default")]
    pub optimizer_stats: OptimizerStats,
}

// --- Backend health ---

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendHealth {
    pub status: String,
    pub message: String,
    pub time: String,
}
