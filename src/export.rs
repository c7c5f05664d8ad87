//! CSV rendering of cached workflow results.
//!
//! Pure text generation: callers decide where the bytes go. Each producer
//! turns one cached result into uniform rows; `to_csv` renders them.

use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::error::ExportError;
use crate::model::{HistoricalSeries, OptimizationResult, PredictionPoint};

/// One export row: field names paired with already-stringified values,
/// in the order they will be written.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(&'static str, String)>,
}

impl Record {
    pub fn push(&mut self, name: &'static str, value: String) {
        self.fields.push((name, value));
    }

    fn names(&self) -> Vec<&'static str> {
        self.fields.iter().map(|(name, _)| *name).collect()
    }
}

/// Render records as CSV text. The first record fixes the header and column
/// order; any later record with a different field sequence is rejected.
/// Rows are joined with `\n` and the text carries no trailing newline.
pub fn to_csv(rows: &[Record]) -> Result<String, ExportError> {
    let first = rows.first().ok_or(ExportError::Empty)?;
    let expected = first.names();

    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(join_line(expected.iter().copied()));
    for (row, record) in rows.iter().enumerate() {
        let found = record.names();
        if found != expected {
            return Err(ExportError::ShapeMismatch {
                row,
                expected: expected.join(","),
                found: found.join(","),
            });
        }
        lines.push(join_line(record.fields.iter().map(|(_, value)| value.as_str())));
    }
    Ok(lines.join("\n"))
}

fn join_line<'a>(fields: impl Iterator<Item = &'a str>) -> String {
    fields.map(csv_field).collect::<Vec<_>>().join(",")
}

/// Quote a field only when it needs it; embedded quotes are doubled.
fn csv_field(raw: &str) -> String {
    if raw.chars().any(|c| matches!(c, ',' | '"' | '\n' | '\r')) {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw.to_string()
    }
}

fn format_time(time: OffsetDateTime) -> String {
    time.format(&Rfc3339).unwrap_or_else(|_| time.to_string())
}

/// Rows for a forecast: one per prediction point.
pub fn prediction_rows(points: &[PredictionPoint]) -> Vec<Record> {
    points
        .iter()
        .map(|point| {
            let mut row = Record::default();
            row.push("time", format_time(point.time));
            row.push("predicted_price", point.predicted_price.to_string());
            row.push("confidence_lower", point.confidence_lower.to_string());
            row.push("confidence_upper", point.confidence_upper.to_string());
            row.push("models_used", point.models_used.join(","));
            row
        })
        .collect()
}

/// Rows for a historical series. Optional columns appear when any point
/// carries them; the aligned forecast column appears when the service
/// returned one, matched to the price rows by position.
pub fn historical_rows(series: &HistoricalSeries) -> Vec<Record> {
    let has_dayahead = series.points.iter().any(|p| p.dayahead_price.is_some());
    let has_load = series.points.iter().any(|p| p.system_load.is_some());
    let has_renewables = series.points.iter().any(|p| p.renewable_output.is_some());
    let aligned = series.predictions.as_deref();

    series
        .points
        .iter()
        .enumerate()
        .map(|(i, point)| {
            let mut row = Record::default();
            row.push("time", format_time(point.time));
            row.push("realtime_price", point.realtime_price.to_string());
            if has_dayahead {
                row.push("dayahead_price", optional_number(point.dayahead_price));
            }
            if has_load {
                row.push("system_load", optional_number(point.system_load));
            }
            if has_renewables {
                row.push("renewable_output", optional_number(point.renewable_output));
            }
            if let Some(aligned) = aligned {
                let predicted = aligned.get(i).map(|p| p.predicted_price);
                row.push("predicted_price", optional_number(predicted));
            }
            row
        })
        .collect()
}

fn optional_number(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Rows for a bidding schedule: each forecast point paired with the single
/// optimal bid the service produced for the horizon. The spread column is
/// the forecast price minus the bid price.
pub fn schedule_rows(
    points: &[PredictionPoint],
    strategy: &OptimizationResult,
) -> Vec<Record> {
    points
        .iter()
        .map(|point| {
            let mut row = Record::default();
            row.push("time", format_time(point.time));
            row.push("predicted_price", point.predicted_price.to_string());
            row.push("bid_price", strategy.optimal_price.to_string());
            row.push("bid_power", strategy.optimal_power.to_string());
            row.push(
                "expected_spread",
                (point.predicted_price - strategy.optimal_price).to_string(),
            );
            row
        })
        .collect()
}
