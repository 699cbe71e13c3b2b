//! Presenter-ready, immutable views.
//!
//! Each duration carries the raw backend value next to its formatted string.
//! Per-query timings use [`format_duration`]; every optimizer counter timing
//! uses [`format_aggregate_duration`], including the stats block attached to
//! a single query response.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::duration::{format_aggregate_duration, format_duration, ReportedDuration};
use crate::model::{
    ComparisonResult, OptimizationSnapshot, OptimizationStats, OptimizerStats,
    PerformanceMetrics, QueryOutcome, QueryReport,
};
use crate::poller::{PollPhase, PollerStatus};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DurationView {
    pub raw: ReportedDuration,
    pub formatted: String,
}

impl DurationView {
    pub fn per_query(raw: &ReportedDuration) -> Self {
        Self {
            raw: raw.clone(),
            formatted: format_duration(raw),
        }
    }

    pub fn aggregate(raw: &ReportedDuration) -> Self {
        Self {
            raw: raw.clone(),
            formatted: format_aggregate_duration(Some(raw)),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PerformanceView {
    pub library_type: String,
    pub parse_time: DurationView,
    pub query_time: DurationView,
    pub total_time: DurationView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_usage: Option<i64>,
}

impl From<&PerformanceMetrics> for PerformanceView {
    fn from(p: &PerformanceMetrics) -> Self {
        Self {
            library_type: p.library_type.clone(),
            parse_time: DurationView::per_query(&p.parse_time),
            query_time: DurationView::per_query(&p.query_time),
            total_time: DurationView::per_query(&p.total_time),
            memory_usage: p.memory_usage,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct QueryView {
    pub found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<String>,
    pub performance: PerformanceView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optimization_stats: Option<OptimizationStatsView>,
}

impl QueryView {
    fn from_outcome(outcome: &QueryOutcome, stats: Option<&OptimizationStats>) -> Self {
        Self {
            found: outcome.is_found(),
            value: outcome.value().cloned(),
            path: outcome.path().to_vec(),
            performance: outcome.performance().into(),
            optimization_stats: stats.map(OptimizationStatsView::per_query),
        }
    }
}

impl From<&QueryReport> for QueryView {
    fn from(report: &QueryReport) -> Self {
        QueryView::from_outcome(&report.outcome, report.optimization_stats.as_ref())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EngineResultView {
    pub engine: String,
    pub label: String,
    #[serde(flatten)]
    pub result: QueryView,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComparisonView {
    pub results: Vec<EngineResultView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optimization_stats: Option<OptimizationStatsView>,
}

impl From<&ComparisonResult> for ComparisonView {
    fn from(comparison: &ComparisonResult) -> Self {
        Self {
            results: comparison
                .iter()
                .map(|entry| EngineResultView {
                    engine: entry.engine.to_string(),
                    label: entry.engine.label().to_string(),
                    result: QueryView::from_outcome(&entry.outcome, None),
                })
                .collect(),
            optimization_stats: comparison
                .optimization_stats
                .as_ref()
                .map(OptimizationStatsView::per_query),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OptimizationStatsView {
    pub total_queries: i64,
    pub optimized_queries: i64,
    pub cache_hits: i64,
    pub average_optimization_time: DurationView,
    pub total_optimization_time: DurationView,
}

impl OptimizationStatsView {
    /// Counters attached to a query or comparison response. Rendered with
    /// the same ns/μs/ms rule as the query's own timings.
    pub fn per_query(s: &OptimizationStats) -> Self {
        Self::with_formatter(s, DurationView::per_query)
    }

    fn with_formatter(s: &OptimizationStats, format: fn(&ReportedDuration) -> DurationView) -> Self {
        Self {
            total_queries: s.total_queries,
            optimized_queries: s.optimized_queries,
            cache_hits: s.cache_hits,
            average_optimization_time: format(&s.average_optimization_time),
            total_optimization_time: format(&s.total_optimization_time),
        }
    }
}

/// Polled snapshot counters use the aggregate μs/ms/s rule.
impl From<&OptimizationStats> for OptimizationStatsView {
    fn from(s: &OptimizationStats) -> Self {
        Self::with_formatter(s, DurationView::aggregate)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OptimizerStatsView {
    pub total_queries: i64,
    pub cache_hits: i64,
    pub optimizations: i64,
    pub average_time: DurationView,
    pub total_time: DurationView,
}

impl From<&OptimizerStats> for OptimizerStatsView {
    fn from(s: &OptimizerStats) -> Self {
        Self {
            total_queries: s.total_queries,
            cache_hits: s.cache_hits,
            optimizations: s.optimizations,
            average_time: DurationView::aggregate(&s.average_time),
            total_time: DurationView::aggregate(&s.total_time),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StatsView {
    pub optimization_stats: OptimizationStatsView,
    pub optimizer_stats: OptimizerStatsView,
}

impl From<&OptimizationSnapshot> for StatsView {
    fn from(s: &OptimizationSnapshot) -> Self {
        Self {
            optimization_stats: (&s.optimization_stats).into(),
            optimizer_stats: (&s.optimizer_stats).into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PollerView {
    pub phase: PollPhase,
    pub stats: Option<StatsView>,
    pub last_error: Option<String>,
    pub fetch_count: u64,
    pub last_success_at: Option<DateTime<Utc>>,
    pub last_attempt_at: Option<DateTime<Utc>>,
}

impl From<&PollerStatus> for PollerView {
    fn from(s: &PollerStatus) -> Self {
        Self {
            phase: s.phase,
            stats: s.snapshot.as_deref().map(StatsView::from),
            last_error: s.last_error.clone(),
            fetch_count: s.fetch_count,
            last_success_at: s.last_success_at,
            last_attempt_at: s.last_attempt_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn report_with_stats(stats: OptimizationStats) -> QueryReport {
        QueryReport {
            outcome: QueryOutcome::found(json!("es"), PerformanceMetrics::default()),
            optimization_stats: Some(stats),
        }
    }

    #[test]
    fn test_query_attached_stats_use_per_query_units() {
        let report = report_with_stats(OptimizationStats {
            average_optimization_time: ReportedDuration::Nanos(500),
            total_optimization_time: ReportedDuration::Nanos(1_500_000_000),
            ..Default::default()
        });

        let view = QueryView::from(&report);
        let stats = view.optimization_stats.expect("stats block");
        assert_eq!(stats.average_optimization_time.formatted, "500ns");
        assert_eq!(stats.total_optimization_time.formatted, "1500.00ms");
    }

    #[test]
    fn test_polled_snapshot_uses_aggregate_units() {
        let snapshot = OptimizationSnapshot {
            optimization_stats: OptimizationStats {
                average_optimization_time: ReportedDuration::Nanos(500),
                total_optimization_time: ReportedDuration::Nanos(1_500_000_000),
                ..Default::default()
            },
            optimizer_stats: OptimizerStats {
                average_time: ReportedDuration::Nanos(2_000_000),
                total_time: ReportedDuration::Nanos(3_000_000_000),
                ..Default::default()
            },
        };

        let view = StatsView::from(&snapshot);
        assert_eq!(view.optimization_stats.average_optimization_time.formatted, "0.50μs");
        assert_eq!(view.optimization_stats.total_optimization_time.formatted, "1.50s");
        assert_eq!(view.optimizer_stats.average_time.formatted, "2.00ms");
        assert_eq!(view.optimizer_stats.total_time.formatted, "3.00s");
    }

    #[test]
    fn test_optimizer_total_time_decodes_and_defaults() {
        let stats: OptimizerStats =
            serde_json::from_value(json!({"TotalQueries": 4, "TotalTime": 8000})).unwrap();
        assert_eq!(stats.total_time, ReportedDuration::Nanos(8000));

        let stats: OptimizerStats = serde_json::from_value(json!({"TotalTime": null})).unwrap();
        assert_eq!(stats.total_time, ReportedDuration::Nanos(0));
    }
}
