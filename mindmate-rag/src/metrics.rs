//! Timer-based instrumentation around pipeline stages.

use std::collections::HashMap;
use std::path::Path;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::Result;

/// Number of recent records averaged by [`MetricsTracker::summary`].
pub const DEFAULT_AVERAGE_WINDOW: usize = 10;

/// Measurements for one handled query. Durations are in seconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PerformanceMetrics {
    pub timestamp: DateTime<Utc>,
    pub query_processing_time: f64,
    pub document_retrieval_time: f64,
    pub response_generation_time: f64,
    pub total_response_time: f64,
    pub documents_retrieved: usize,
    pub documents_used: usize,
    /// Characters of query plus retrieved content.
    pub context_length: usize,
    pub query_length: usize,
    pub response_length: usize,
    pub similarity_scores: Vec<f32>,
}

/// Aggregate view over the recorded history.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MetricsSummary {
    pub total_queries_processed: usize,
    pub average_response_time: f64,
    pub average_documents_retrieved: f64,
    pub recent_performance: Option<PerformanceMetrics>,
    pub tracking_since: Option<DateTime<Utc>>,
}

/// Named stopwatches plus an append-only history of [`PerformanceMetrics`].
#[derive(Debug, Default)]
pub struct MetricsTracker {
    timers: HashMap<String, Instant>,
    history: Vec<PerformanceMetrics>,
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

impl MetricsTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or restart) the timer called `name`.
    pub fn start_timer(&mut self, name: &str) {
        self.timers.insert(name.to_string(), Instant::now());
        debug!(timer = name, "started timer");
    }

    /// Stop the timer called `name` and return the elapsed seconds.
    ///
    /// Stopping a timer that was never started logs a warning and returns 0.
    pub fn stop_timer(&mut self, name: &str) -> f64 {
        let Some(started) = self.timers.remove(name) else {
            warn!(timer = name, "timer stopped without being started");
            return 0.0;
        };
        let elapsed = started.elapsed().as_secs_f64();
        debug!(timer = name, elapsed, "stopped timer");
        elapsed
    }

    pub fn record(&mut self, metrics: PerformanceMetrics) {
        debug!(
            total_response_time = metrics.total_response_time,
            documents_retrieved = metrics.documents_retrieved,
            "recorded metrics"
        );
        self.history.push(metrics);
    }

    pub fn latest(&self) -> Option<&PerformanceMetrics> {
        self.history.last()
    }

    /// Average the last `last_n` records (all of them if fewer).
    ///
    /// Durations are averaged exactly; counts are averaged then truncated.
    /// Similarity scores from every record in the window are concatenated.
    pub fn average(&self, last_n: usize) -> Option<PerformanceMetrics> {
        let start = self.history.len().saturating_sub(last_n);
        let recent = &self.history[start..];
        if recent.is_empty() {
            return None;
        }

        let n = recent.len() as f64;
        let mean = |f: fn(&PerformanceMetrics) -> f64| recent.iter().map(f).sum::<f64>() / n;
        let mean_count = |f: fn(&PerformanceMetrics) -> usize| {
            (recent.iter().map(f).sum::<usize>() as f64 / n) as usize
        };

        Some(PerformanceMetrics {
            timestamp: Utc::now(),
            query_processing_time: mean(|m| m.query_processing_time),
            document_retrieval_time: mean(|m| m.document_retrieval_time),
            response_generation_time: mean(|m| m.response_generation_time),
            total_response_time: mean(|m| m.total_response_time),
            documents_retrieved: mean_count(|m| m.documents_retrieved),
            documents_used: mean_count(|m| m.documents_used),
            context_length: mean_count(|m| m.context_length),
            query_length: mean_count(|m| m.query_length),
            response_length: mean_count(|m| m.response_length),
            similarity_scores: recent
                .iter()
                .flat_map(|m| m.similarity_scores.iter().copied())
                .collect(),
        })
    }

    pub fn summary(&self) -> MetricsSummary {
        let total = self.history.len();
        if total == 0 {
            return MetricsSummary {
                total_queries_processed: 0,
                average_response_time: 0.0,
                average_documents_retrieved: 0.0,
                recent_performance: None,
                tracking_since: None,
            };
        }

        let n = total as f64;
        let response_time = self.history.iter().map(|m| m.total_response_time).sum::<f64>() / n;
        let retrieved = self.history.iter().map(|m| m.documents_retrieved).sum::<usize>() as f64 / n;

        MetricsSummary {
            total_queries_processed: total,
            average_response_time: round_to(response_time, 4),
            average_documents_retrieved: round_to(retrieved, 2),
            recent_performance: self.average(DEFAULT_AVERAGE_WINDOW),
            tracking_since: self.history.first().map(|m| m.timestamp),
        }
    }

    /// The full recorded history, oldest first.
    pub fn history(&self) -> &[PerformanceMetrics] {
        &self.history
    }

    /// Drop all records and running timers.
    pub fn clear(&mut self) {
        self.history.clear();
        self.timers.clear();
        debug!("cleared metrics");
    }

    /// Write the full history to `path` as a pretty-printed JSON array.
    pub fn export(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(&self.history)?;
        std::fs::write(path, json)?;
        info!(records = self.history.len(), path = %path.display(), "exported metrics");
        Ok(())
    }
}
