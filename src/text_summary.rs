//! Text summary builders for CLI output.
//!
//! This module formats human-readable lines for the run, status and prices
//! commands. JSON mode bypasses it entirely.

use crate::config::TimeRange;
use crate::metrics;
use crate::model::{HistoricalSeries, RunRecord, ServiceStatus};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// Pre-formatted lines for text output.
pub(crate) struct TextSummary {
    pub lines: Vec<String>,
}

fn fmt_time(time: OffsetDateTime) -> String {
    time.format(&Rfc3339).unwrap_or_else(|_| time.to_string())
}

/// Build a text summary of a completed (or partially completed) run.
pub(crate) fn build_run_summary(record: &RunRecord) -> TextSummary {
    let mut lines = Vec::new();
    let snapshot = &record.snapshot;

    lines.push(format!("State: {}", snapshot.state));
    if let Some(comments) = record.comments.as_deref() {
        if !comments.trim().is_empty() {
            lines.push(format!("Comments: {}", comments));
        }
    }

    if let Some(dataset) = snapshot.dataset.as_ref() {
        lines.push(format!(
            "Dataset: {} rows x {} columns ({:.1} KB)",
            dataset.row_count, dataset.column_count, dataset.size_kb
        ));
        if !dataset.is_valid {
            lines.push(format!(
                "Dataset warning: validation failed (missing {})",
                dataset.undetected_columns().join(", ")
            ));
        }
    }

    if let Some(prediction) = snapshot.prediction.as_ref() {
        lines.push(format!(
            "Forecast: {} points, mae {:.2}, r2 {:.3}",
            prediction.horizon(),
            prediction.metrics.mae,
            prediction.metrics.r2
        ));
        let models: Vec<String> = record
            .prediction_config
            .models
            .iter()
            .map(|m| m.to_string())
            .collect();
        lines.push(format!("Models: {}", models.join(", ")));

        let prices: Vec<f64> = prediction.points.iter().map(|p| p.predicted_price).collect();
        if let Some((mean, min, max, stddev)) = metrics::compute_series_stats(&prices) {
            lines.push(format!(
                "Predicted price: avg {:.2} min {:.2} max {:.2} stddev {:.2}",
                mean, min, max, stddev
            ));
        }
        let bounds: Vec<(f64, f64)> = prediction
            .points
            .iter()
            .map(|p| (p.confidence_lower, p.confidence_upper))
            .collect();
        if let Some(width) = metrics::compute_band_width(&bounds) {
            lines.push(format!("Confidence band: avg width {:.2}", width));
        }
        if let Some(ensemble) = prediction.ensemble.as_ref() {
            lines.push(format!(
                "Ensemble: {} ({})",
                ensemble.selected_models.join("+"),
                ensemble.weight_method.as_deref().unwrap_or("-")
            ));
        }
        if let Some(validation) = prediction.validation.as_ref() {
            lines.push(format!(
                "Validation: mae {:.2} rmse {:.2} r2 {:.3} mape {:.1}%",
                validation.mae, validation.rmse, validation.r2, validation.mape
            ));
        }
    }

    if let Some(strategy) = snapshot.optimization.as_ref() {
        lines.push(format!(
            "Bid: {:.2} at {:.1} MW, expected revenue {:.0}",
            strategy.optimal_price, strategy.optimal_power, strategy.expected_revenue
        ));
        lines.push(format!(
            "Convergence: {}/{} points ({:.1}%)",
            strategy.convergence.converged_points,
            strategy.convergence.total_points,
            strategy.convergence.rate() * 100.0
        ));
        if let Some(method) = strategy.method.as_deref() {
            lines.push(format!("Method: {}", method));
        }
    }

    TextSummary { lines }
}

/// Build a text summary of the service's dataset and algorithm status.
pub(crate) fn build_status_summary(status: &ServiceStatus) -> TextSummary {
    let mut lines = Vec::new();

    let frequency = status.data_frequency.as_deref().unwrap_or("-");
    let source = status.data_source.as_deref().unwrap_or("-");
    lines.push(format!(
        "Records: {} ({} / {})",
        status.record_count, frequency, source
    ));
    if let Some(range) = status.time_range.as_ref() {
        lines.push(format!(
            "Time range: {} to {}",
            fmt_time(range.start),
            fmt_time(range.end)
        ));
    }
    if !status.monthly_distribution.is_empty() {
        let months: Vec<String> = status
            .monthly_distribution
            .iter()
            .map(|(month, count)| format!("{} {}", month, count))
            .collect();
        lines.push(format!("Monthly records: {}", months.join(", ")));
    }
    lines.push(format!(
        "Accuracy validation: {}",
        if status.can_validate_accuracy {
            "available"
        } else {
            "not available"
        }
    ));
    if let Some(algorithms) = status.algorithms.as_ref() {
        if let Some(ensemble) = algorithms.ensemble.as_ref() {
            let method = ensemble.selection_method.as_deref().unwrap_or("-");
            match ensemble.top_k {
                Some(k) => lines.push(format!("Ensemble selection: {} (top {})", method, k)),
                None => lines.push(format!("Ensemble selection: {}", method)),
            }
        }
        if let Some(optimizer) = algorithms.optimizer.as_ref() {
            if let Some(iterations) = optimizer.max_iterations {
                lines.push(format!("Optimizer: up to {} iterations", iterations));
            }
        }
    }

    TextSummary { lines }
}

/// Build a text summary of a historical price window. Falls back to
/// client-side statistics when the service omits its own.
pub(crate) fn build_prices_summary(series: &HistoricalSeries, range: TimeRange) -> TextSummary {
    let mut lines = Vec::new();

    lines.push(format!("Points: {} over {}", series.points.len(), range));
    match series.statistics.as_ref() {
        Some(stats) => lines.push(format!(
            "Realtime price: avg {:.2} volatility {:.2} ({} records)",
            stats.avg_price, stats.volatility, stats.count
        )),
        None => {
            let prices: Vec<f64> = series.points.iter().map(|p| p.realtime_price).collect();
            if let Some((mean, min, max, stddev)) = metrics::compute_series_stats(&prices) {
                lines.push(format!(
                    "Realtime price: avg {:.2} min {:.2} max {:.2} stddev {:.2}",
                    mean, min, max, stddev
                ));
            }
        }
    }
    if let Some(accuracy) = series.accuracy.as_ref() {
        let mut line = format!(
            "Forecast accuracy: mae {:.2} r2 {:.3}",
            accuracy.mae, accuracy.r2
        );
        if let Some(rmse) = accuracy.rmse {
            line.push_str(&format!(" rmse {:.2}", rmse));
        }
        if let Some(mape) = accuracy.mape {
            line.push_str(&format!(" mape {:.1}%", mape));
        }
        lines.push(line);
    }
    if let Some(predictions) = series.predictions.as_ref() {
        lines.push(format!("Aligned forecast: {} points", predictions.len()));
    }

    TextSummary { lines }
}
