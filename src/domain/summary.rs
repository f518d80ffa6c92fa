// Dashboard summary - headline figures shown above the widget grid
use super::record::{Record, Value};
use serde::Serialize;

const VALUE_FIELD_CANDIDATES: [&str; 4] = ["totalAmount", "totalValue", "amount", "value"];
const STATUS_FIELDS: [&str; 2] = ["status", "orderStatus"];
const COMPLETED_STATUSES: [&str; 5] = ["complete", "completed", "delivered", "closed", "done"];
const PENDING_STATUSES: [&str; 1] = ["pending"];
const IN_PROGRESS_STATUSES: [&str; 4] = ["in progress", "in_progress", "in-progress", "processing"];

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_records: usize,
    pub value_field: Option<String>,
    pub total_value: f64,
    pub average_value: f64,
    /// Percentage of records whose status reads as finished.
    pub completion_rate: Option<f64>,
    pub completed_count: usize,
    pub pending_count: usize,
    pub in_progress_count: usize,
}

#[derive(Debug, Default)]
struct StatusCounts {
    completed: usize,
    pending: usize,
    in_progress: usize,
}

pub fn summarize(records: &[Record]) -> DashboardSummary {
    let Some(first) = records.first() else {
        return DashboardSummary::default();
    };

    let value_field = infer_value_field(first);
    let values: Vec<f64> = value_field
        .as_deref()
        .map(|field| records.iter().filter_map(|r| r.get_number(field)).collect())
        .unwrap_or_default();
    let total_value: f64 = values.iter().sum();
    let average_value = if values.is_empty() {
        0.0
    } else {
        total_value / values.len() as f64
    };

    let status_field = STATUS_FIELDS.iter().find(|field| first.get(field).is_some());
    let counts = status_field
        .map(|field| count_statuses(records, field))
        .unwrap_or_default();
    let completion_rate =
        status_field.map(|_| counts.completed as f64 / records.len() as f64 * 100.0);

    DashboardSummary {
        total_records: records.len(),
        value_field,
        total_value,
        average_value,
        completion_rate,
        completed_count: counts.completed,
        pending_count: counts.pending,
        in_progress_count: counts.in_progress,
    }
}

fn infer_value_field(first: &Record) -> Option<String> {
    VALUE_FIELD_CANDIDATES
        .iter()
        .find(|field| first.get(field).is_some())
        .map(|field| field.to_string())
        .or_else(|| {
            first
                .fields()
                .find(|(_, value)| matches!(value, Value::Number(_)))
                .map(|(name, _)| name.clone())
        })
}

/// Status matching ignores case and surrounding whitespace.
fn count_statuses(records: &[Record], status_field: &str) -> StatusCounts {
    let mut counts = StatusCounts::default();
    for status in records.iter().filter_map(|r| r.get_string(status_field)) {
        let status = status.trim().to_lowercase();
        let status = status.as_str();
        if COMPLETED_STATUSES.contains(&status) {
            counts.completed += 1;
        } else if PENDING_STATUSES.contains(&status) {
            counts.pending += 1;
        } else if IN_PROGRESS_STATUSES.contains(&status) {
            counts.in_progress += 1;
        }
    }
    counts
}
