// Aggregation engine - KPI, cartesian, pie and table transforms over records
//
// Every transform skips records whose relevant field is absent or cannot be
// coerced, and never fails on data.
use super::format::{self, MISSING};
use super::record::{Record, Value};
use super::settings::{
    Aggregation, CartesianKind, CartesianSettings, DataFormat, KpiSettings, PieSettings,
    TableFilter, TableSettings,
};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;

pub const UNKNOWN_LABEL: &str = "Unknown";
pub const PIE_COLORS: [&str; 4] = ["#22c55e", "#0ea5e9", "#f97316", "#6366f1"];

/// Reduces `metric` over the records. `None` means there was nothing to
/// aggregate, which is distinct from a computed zero.
///
/// - `Count` counts records, whether or not the metric is numeric.
/// - `Sum` and `Average` fall back to `0` when no value is numeric.
/// - `Min` and `Max` return `None` when no value is numeric.
pub fn aggregate_kpi(records: &[Record], settings: &KpiSettings) -> Option<f64> {
    if records.is_empty() {
        return None;
    }

    let values: Vec<f64> = records
        .iter()
        .filter_map(|r| r.get_number(&settings.metric))
        .collect();

    if values.len() < records.len() {
        tracing::debug!(
            "KPI {}: {} of {} records have no numeric value",
            settings.metric,
            records.len() - values.len(),
            records.len()
        );
    }

    let sum: f64 = values.iter().sum();
    match settings.aggregation {
        Aggregation::Count => Some(records.len() as f64),
        Aggregation::Sum => Some(sum),
        Aggregation::Average if values.is_empty() => Some(0.0),
        Aggregation::Average => Some(sum / values.len() as f64),
        Aggregation::Min => values.iter().copied().reduce(f64::min),
        Aggregation::Max => values.iter().copied().reduce(f64::max),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartesianPoint {
    pub x: String,
    pub y: f64,
    /// 1-based position, only set for scatter plots.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xi: Option<usize>,
}

/// Sums `y_field` per distinct `x_field` value in first-seen order.
pub fn aggregate_cartesian(
    records: &[Record],
    settings: &CartesianSettings,
    kind: CartesianKind,
) -> Vec<CartesianPoint> {
    let mut points: Vec<CartesianPoint> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for record in records {
        let Some(y) = record.get_number(&settings.y_field) else {
            continue;
        };
        let x = group_key(record, &settings.x_field);

        match index.get(&x) {
            Some(&i) => points[i].y += y,
            None => {
                index.insert(x.clone(), points.len());
                points.push(CartesianPoint { x, y, xi: None });
            }
        }
    }

    if kind == CartesianKind::Scatter {
        for (i, point) in points.iter_mut().enumerate() {
            point.xi = Some(i + 1);
        }
    }

    points
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieSlice {
    pub name: String,
    pub count: usize,
    pub color: String,
}

/// Counts records per distinct `chart_data_field` value in first-seen order.
pub fn aggregate_pie(records: &[Record], settings: &PieSettings) -> Vec<PieSlice> {
    let mut slices: Vec<PieSlice> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for record in records {
        let name = group_key(record, &settings.chart_data_field);
        match index.get(&name) {
            Some(&i) => slices[i].count += 1,
            None => {
                index.insert(name.clone(), slices.len());
                let color = PIE_COLORS[slices.len() % PIE_COLORS.len()].to_string();
                slices.push(PieSlice {
                    name,
                    count: 1,
                    color,
                });
            }
        }
    }

    slices
}

fn group_key(record: &Record, field: &str) -> String {
    record
        .get_string(field)
        .unwrap_or_else(|| UNKNOWN_LABEL.to_string())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableColumn {
    pub field: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableView {
    pub columns: Vec<TableColumn>,
    pub rows: Vec<Vec<String>>,
    pub total_rows: usize,
    pub page_size: usize,
    pub font_size: u32,
    pub header_background: String,
    pub enable_filter: bool,
}

impl TableView {
    pub fn page_count(&self) -> usize {
        if self.page_size == 0 {
            return 1;
        }
        self.rows.len().div_ceil(self.page_size).max(1)
    }

    /// Rows of the zero-based page `n`; empty past the last page.
    pub fn page(&self, n: usize) -> &[Vec<String>] {
        if self.page_size == 0 {
            return if n == 0 { &self.rows } else { &[] };
        }
        let start = n.saturating_mul(self.page_size).min(self.rows.len());
        let end = start.saturating_add(self.page_size).min(self.rows.len());
        &self.rows[start..end]
    }
}

/// Projects the configured columns out of each record after applying the
/// table's filters and sort. Without `sort_by` the record order is kept.
pub fn build_table(records: &[Record], settings: &TableSettings) -> TableView {
    let columns = settings.distinct_columns();

    let mut selected: Vec<&Record> = records
        .iter()
        .filter(|record| settings.filters.iter().all(|f| matches_filter(record, f)))
        .collect();

    if let Some(sort) = settings
        .sort_by
        .as_deref()
        .and_then(|s| SortSpec::parse(s, &columns))
    {
        selected.sort_by(|a, b| sort.compare(a, b));
    }

    let rows: Vec<Vec<String>> = selected
        .iter()
        .map(|record| {
            columns
                .iter()
                .map(|column| format_cell(column, record.get(column)))
                .collect()
        })
        .collect();

    TableView {
        columns: columns
            .iter()
            .map(|field| TableColumn {
                field: field.clone(),
                label: format::field_label(field),
            })
            .collect(),
        total_rows: rows.len(),
        rows,
        page_size: settings.pagination_size as usize,
        font_size: settings.font_size,
        header_background: settings.header_background.clone(),
        enable_filter: settings.enable_filter,
    }
}

fn format_cell(field: &str, value: Option<&Value>) -> String {
    let Some(value) = value.filter(|v| **v != Value::Null) else {
        return MISSING.to_string();
    };

    if format::is_currency_field(field) {
        return format::format_number(value.as_number(), DataFormat::Currency, 2);
    }
    if format::is_date_field(field) {
        if let Some(date) = value.as_date() {
            return format::format_date(date);
        }
    }
    value
        .as_display_string()
        .unwrap_or_else(|| MISSING.to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FilterOperator {
    Equals,
    NotEquals,
    Contains,
    GreaterThan,
    GreaterOrEqual,
    LessThan,
    LessOrEqual,
}

impl FilterOperator {
    fn parse(op: &str) -> Option<Self> {
        match op.trim() {
            "equals" | "eq" | "=" | "==" => Some(Self::Equals),
            "notEquals" | "neq" | "!=" => Some(Self::NotEquals),
            "contains" => Some(Self::Contains),
            "gt" | ">" => Some(Self::GreaterThan),
            "gte" | ">=" => Some(Self::GreaterOrEqual),
            "lt" | "<" => Some(Self::LessThan),
            "lte" | "<=" => Some(Self::LessOrEqual),
            _ => None,
        }
    }
}

fn matches_filter(record: &Record, filter: &TableFilter) -> bool {
    let Some(op) = FilterOperator::parse(&filter.operator) else {
        tracing::warn!(
            "Ignoring table filter on {} with unknown operator {:?}",
            filter.field,
            filter.operator
        );
        return true;
    };

    let Some(value) = record.get(&filter.field).filter(|v| **v != Value::Null) else {
        return op == FilterOperator::NotEquals;
    };

    let target = Value::Text(filter.value.clone());
    let ordering = compare_present(value, &target);
    let text = value.as_display_string().unwrap_or_default().to_lowercase();
    let needle = filter.value.to_lowercase();

    match op {
        FilterOperator::Equals => ordering == Ordering::Equal || text == needle,
        FilterOperator::NotEquals => ordering != Ordering::Equal && text != needle,
        FilterOperator::Contains => text.contains(&needle),
        FilterOperator::GreaterThan => ordering == Ordering::Greater,
        FilterOperator::GreaterOrEqual => ordering != Ordering::Less,
        FilterOperator::LessThan => ordering == Ordering::Less,
        FilterOperator::LessOrEqual => ordering != Ordering::Greater,
    }
}

/// Numbers compare numerically, then dates chronologically, then strings.
fn compare_present(a: &Value, b: &Value) -> Ordering {
    if let (Some(x), Some(y)) = (a.as_number(), b.as_number()) {
        return x.partial_cmp(&y).unwrap_or(Ordering::Equal);
    }
    if let (Some(x), Some(y)) = (a.as_date(), b.as_date()) {
        return x.cmp(&y);
    }
    a.as_display_string().cmp(&b.as_display_string())
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct SortSpec {
    field: String,
    descending: bool,
}

impl SortSpec {
    /// Accepts `field`, `field_asc`, `field_desc`, or a bare `ascending` /
    /// `descending` which sorts by the first column.
    fn parse(token: &str, columns: &[String]) -> Option<Self> {
        let token = token.trim();
        let (field, descending) = match token {
            "" => return None,
            "ascending" | "asc" => (columns.first()?.clone(), false),
            "descending" | "desc" => (columns.first()?.clone(), true),
            _ => {
                if let Some(field) = token.strip_suffix("_desc") {
                    (field.to_string(), true)
                } else if let Some(field) = token.strip_suffix("_asc") {
                    (field.to_string(), false)
                } else {
                    (token.to_string(), false)
                }
            }
        };
        Some(Self { field, descending })
    }

    /// Missing values always sort last.
    fn compare(&self, a: &Record, b: &Record) -> Ordering {
        let present = |r: &Record| r.get(&self.field).filter(|v| **v != Value::Null).cloned();
        match (present(a), present(b)) {
            (Some(x), Some(y)) => {
                let ord = compare_present(&x, &y);
                if self.descending { ord.reverse() } else { ord }
            }
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }
}
