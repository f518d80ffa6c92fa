// Renderer dispatch - turns a widget plus filtered records into display-ready output
use super::aggregation::{
    aggregate_cartesian, aggregate_kpi, aggregate_pie, build_table, CartesianPoint, PieSlice,
    TableView,
};
use super::dashboard::Dashboard;
use super::date_range::{filter_records, DateRange};
use super::format::{field_label, format_number};
use super::record::Record;
use super::settings::{Aggregation, CartesianKind, WidgetSettings, WidgetType};
use super::summary::{summarize, DashboardSummary};
use super::widget::{LayoutRect, Widget};
use chrono::{DateTime, FixedOffset};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KpiOutput {
    pub value: f64,
    pub display: String,
    pub metric_label: String,
    pub aggregation: Aggregation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartesianOutput {
    pub chart: CartesianKind,
    pub points: Vec<CartesianPoint>,
    pub color: String,
    pub show_legend: bool,
    pub show_data_label: bool,
    pub y_label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PieOutput {
    pub slices: Vec<PieSlice>,
    pub show_legend: bool,
}

/// What a widget shows. `NoData` is reported instead of an empty chart or a
/// fabricated zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum WidgetOutput {
    NoData,
    Kpi(KpiOutput),
    Cartesian(CartesianOutput),
    Pie(PieOutput),
    Table(TableView),
}

impl WidgetOutput {
    pub fn is_no_data(&self) -> bool {
        matches!(self, WidgetOutput::NoData)
    }
}

/// Records are expected to be date-filtered already.
pub fn render_widget(widget: &Widget, records: &[Record]) -> WidgetOutput {
    match &widget.settings {
        WidgetSettings::Kpi(settings) => match aggregate_kpi(records, settings) {
            Some(value) => WidgetOutput::Kpi(KpiOutput {
                value,
                display: format_number(Some(value), settings.data_format, settings.decimal_precision),
                metric_label: field_label(&settings.metric),
                aggregation: settings.aggregation,
            }),
            None => WidgetOutput::NoData,
        },
        WidgetSettings::Cartesian(kind, settings) => {
            let points = aggregate_cartesian(records, settings, *kind);
            if points.is_empty() {
                return WidgetOutput::NoData;
            }
            WidgetOutput::Cartesian(CartesianOutput {
                chart: *kind,
                points,
                color: settings.chart_color.clone(),
                show_legend: settings.show_legend,
                show_data_label: settings.show_data_label,
                y_label: field_label(&settings.y_field),
            })
        }
        WidgetSettings::Pie(settings) => {
            let slices = aggregate_pie(records, settings);
            if slices.is_empty() {
                return WidgetOutput::NoData;
            }
            WidgetOutput::Pie(PieOutput {
                slices,
                show_legend: settings.show_legend,
            })
        }
        WidgetSettings::Table(settings) => {
            let view = build_table(records, settings);
            if view.rows.is_empty() {
                return WidgetOutput::NoData;
            }
            WidgetOutput::Table(view)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedWidget {
    pub widget_id: String,
    #[serde(rename = "type")]
    pub widget_type: WidgetType,
    pub title: String,
    pub description: String,
    pub layout: LayoutRect,
    pub output: WidgetOutput,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedDashboard {
    pub name: String,
    pub date_range: DateRange,
    pub record_count: usize,
    pub summary: DashboardSummary,
    pub widgets: Vec<RenderedWidget>,
}

/// Filters once by the dashboard's date range, then renders every widget in
/// list order against the same filtered rows.
pub fn render_dashboard(
    dashboard: &Dashboard,
    records: &[Record],
    date_field: &str,
    now: DateTime<FixedOffset>,
) -> RenderedDashboard {
    let filtered = filter_records(records, dashboard.date_range, date_field, now);

    let widgets = dashboard
        .widgets
        .iter()
        .map(|widget| RenderedWidget {
            widget_id: widget.widget_id.clone(),
            widget_type: widget.widget_type(),
            title: widget.title.clone(),
            description: widget.description.clone(),
            layout: widget.layout,
            output: render_widget(widget, &filtered),
        })
        .collect();

    RenderedDashboard {
        name: dashboard.name.clone(),
        date_range: dashboard.date_range,
        record_count: filtered.len(),
        summary: summarize(&filtered),
        widgets,
    }
}
