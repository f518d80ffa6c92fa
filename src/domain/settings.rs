// Widget settings - one settings shape per widget family, keyed by widget type
use super::error::{InvalidSettings, UnknownToken};
use super::format::MAX_DECIMALS;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_CHART_COLOR: &str = "#22c55e";
pub const DEFAULT_HEADER_BACKGROUND: &str = "#54bd95";
pub const DEFAULT_METRIC: &str = "totalAmount";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WidgetType {
    Kpi,
    Bar,
    Line,
    Area,
    Scatter,
    Pie,
    Table,
}

impl WidgetType {
    pub const ALL: [WidgetType; 7] = [
        WidgetType::Kpi,
        WidgetType::Bar,
        WidgetType::Line,
        WidgetType::Area,
        WidgetType::Scatter,
        WidgetType::Pie,
        WidgetType::Table,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WidgetType::Kpi => "kpi",
            WidgetType::Bar => "bar",
            WidgetType::Line => "line",
            WidgetType::Area => "area",
            WidgetType::Scatter => "scatter",
            WidgetType::Pie => "pie",
            WidgetType::Table => "table",
        }
    }

    pub fn cartesian_kind(&self) -> Option<CartesianKind> {
        match self {
            WidgetType::Bar => Some(CartesianKind::Bar),
            WidgetType::Line => Some(CartesianKind::Line),
            WidgetType::Area => Some(CartesianKind::Area),
            WidgetType::Scatter => Some(CartesianKind::Scatter),
            WidgetType::Kpi | WidgetType::Pie | WidgetType::Table => None,
        }
    }
}

impl fmt::Display for WidgetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WidgetType {
    type Err = UnknownToken;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WidgetType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownToken::new("widget type", s))
    }
}

/// The chart families that plot grouped Y values against an X category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CartesianKind {
    Bar,
    Line,
    Area,
    Scatter,
}

impl CartesianKind {
    pub fn widget_type(&self) -> WidgetType {
        match self {
            CartesianKind::Bar => WidgetType::Bar,
            CartesianKind::Line => WidgetType::Line,
            CartesianKind::Area => WidgetType::Area,
            CartesianKind::Scatter => WidgetType::Scatter,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Aggregation {
    #[default]
    Sum,
    Average,
    Count,
    Min,
    Max,
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Aggregation::Sum => "Sum",
            Aggregation::Average => "Average",
            Aggregation::Count => "Count",
            Aggregation::Min => "Min",
            Aggregation::Max => "Max",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DataFormat {
    #[default]
    Number,
    Currency,
    Percentage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct KpiSettings {
    #[serde(alias = "metricField")]
    pub metric: String,
    pub aggregation: Aggregation,
    pub data_format: DataFormat,
    pub decimal_precision: u32,
}

impl Default for KpiSettings {
    fn default() -> Self {
        Self {
            metric: DEFAULT_METRIC.to_string(),
            aggregation: Aggregation::Sum,
            data_format: DataFormat::Number,
            decimal_precision: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CartesianSettings {
    pub x_field: String,
    pub y_field: String,
    pub chart_color: String,
    pub show_legend: bool,
    pub show_data_label: bool,
}

impl Default for CartesianSettings {
    fn default() -> Self {
        Self {
            x_field: "product".to_string(),
            y_field: DEFAULT_METRIC.to_string(),
            chart_color: DEFAULT_CHART_COLOR.to_string(),
            show_legend: true,
            show_data_label: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PieSettings {
    #[serde(alias = "groupByField")]
    pub chart_data_field: String,
    pub chart_color: String,
    pub show_legend: bool,
}

impl Default for PieSettings {
    fn default() -> Self {
        Self {
            chart_data_field: "status".to_string(),
            chart_color: DEFAULT_CHART_COLOR.to_string(),
            show_legend: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableFilter {
    pub field: String,
    pub operator: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TableSettings {
    pub columns: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,
    pub pagination_size: u32,
    pub enable_filter: bool,
    pub font_size: u32,
    pub header_background: String,
    pub filters: Vec<TableFilter>,
}

impl Default for TableSettings {
    fn default() -> Self {
        Self {
            columns: ["firstName", "lastName", "product", "status", "totalAmount"]
                .into_iter()
                .map(String::from)
                .collect(),
            sort_by: None,
            pagination_size: 25,
            enable_filter: false,
            font_size: 14,
            header_background: DEFAULT_HEADER_BACKGROUND.to_string(),
            filters: Vec::new(),
        }
    }
}

impl TableSettings {
    /// Configured columns with repeats dropped, first occurrence wins.
    pub fn distinct_columns(&self) -> Vec<String> {
        let mut seen = Vec::with_capacity(self.columns.len());
        for column in &self.columns {
            if !seen.contains(column) {
                seen.push(column.clone());
            }
        }
        seen
    }
}

/// Settings for one widget. The variant determines the widget type, so a
/// widget's type and its settings shape can never disagree.
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetSettings {
    Kpi(KpiSettings),
    Cartesian(CartesianKind, CartesianSettings),
    Pie(PieSettings),
    Table(TableSettings),
}

impl WidgetSettings {
    pub fn defaults_for(widget_type: WidgetType) -> Self {
        if let Some(kind) = widget_type.cartesian_kind() {
            return WidgetSettings::Cartesian(kind, CartesianSettings::default());
        }
        match widget_type {
            WidgetType::Kpi => WidgetSettings::Kpi(KpiSettings::default()),
            WidgetType::Pie => WidgetSettings::Pie(PieSettings::default()),
            _ => WidgetSettings::Table(TableSettings::default()),
        }
    }

    /// Decodes a loosely-typed settings bag for the given widget type.
    /// `null` yields the defaults; keys belonging to other widget types are ignored.
    pub fn from_value(
        widget_type: WidgetType,
        value: serde_json::Value,
    ) -> Result<Self, InvalidSettings> {
        if value.is_null() {
            return Ok(Self::defaults_for(widget_type));
        }
        if let Some(kind) = widget_type.cartesian_kind() {
            return Ok(WidgetSettings::Cartesian(kind, decode(widget_type, value)?));
        }

        let settings = match widget_type {
            WidgetType::Kpi => {
                let mut kpi: KpiSettings = decode(widget_type, value)?;
                kpi.decimal_precision = kpi.decimal_precision.min(MAX_DECIMALS);
                WidgetSettings::Kpi(kpi)
            }
            WidgetType::Pie => WidgetSettings::Pie(decode(widget_type, value)?),
            _ => WidgetSettings::Table(decode(widget_type, value)?),
        };
        Ok(settings)
    }

    pub fn widget_type(&self) -> WidgetType {
        match self {
            WidgetSettings::Kpi(_) => WidgetType::Kpi,
            WidgetSettings::Cartesian(kind, _) => kind.widget_type(),
            WidgetSettings::Pie(_) => WidgetType::Pie,
            WidgetSettings::Table(_) => WidgetType::Table,
        }
    }
}

fn decode<T: DeserializeOwned>(
    widget_type: WidgetType,
    value: serde_json::Value,
) -> Result<T, InvalidSettings> {
    serde_json::from_value(value).map_err(|source| InvalidSettings {
        widget_type: widget_type.to_string(),
        source,
    })
}

impl Serialize for WidgetSettings {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            WidgetSettings::Kpi(s) => s.serialize(serializer),
            WidgetSettings::Cartesian(_, s) => s.serialize(serializer),
            WidgetSettings::Pie(s) => s.serialize(serializer),
            WidgetSettings::Table(s) => s.serialize(serializer),
        }
    }
}
