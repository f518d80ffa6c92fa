// Dashboard domain model - the persisted widget set of one dataset
use super::date_range::DateRange;
use super::widget::Widget;
use serde::{Deserialize, Serialize};

pub const DEFAULT_DASHBOARD_NAME: &str = "Default Dashboard";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default, alias = "dateRangeFilter")]
    pub date_range: DateRange,
    #[serde(default)]
    pub widgets: Vec<Widget>,
}

fn default_name() -> String {
    DEFAULT_DASHBOARD_NAME.to_string()
}

impl Default for Dashboard {
    fn default() -> Self {
        Self {
            name: default_name(),
            date_range: DateRange::All,
            widgets: Vec::new(),
        }
    }
}

/// Whole-dashboard save. Absent fields keep their stored value and a blank
/// name is ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardUpdate {
    pub name: Option<String>,
    #[serde(alias = "dateRangeFilter")]
    pub date_range: Option<DateRange>,
    pub widgets: Option<Vec<Widget>>,
}

impl Dashboard {
    pub fn with_widgets(&self, widgets: Vec<Widget>) -> Self {
        Self {
            widgets,
            ..self.clone()
        }
    }

    pub fn updated(&self, update: DashboardUpdate) -> Self {
        let name = match update.name {
            Some(name) if !name.trim().is_empty() => name.trim().to_string(),
            _ => self.name.clone(),
        };

        Self {
            name,
            date_range: update.date_range.unwrap_or(self.date_range),
            widgets: update.widgets.unwrap_or_else(|| self.widgets.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults_when_fields_missing() {
        let dashboard: Dashboard = serde_json::from_value(json!({})).unwrap();
        assert_eq!(dashboard, Dashboard::default());
        assert_eq!(dashboard.name, "Default Dashboard");
    }

    #[test]
    fn test_legacy_range_key() {
        let dashboard: Dashboard =
            serde_json::from_value(json!({"name": "Ops", "dateRangeFilter": "last30"})).unwrap();
        assert_eq!(dashboard.date_range, DateRange::Last30);
    }

    #[test]
    fn test_update_keeps_absent_fields() {
        let dashboard = Dashboard {
            name: "Ops".to_string(),
            date_range: DateRange::Today,
            widgets: Vec::new(),
        };

        let renamed = dashboard.updated(DashboardUpdate {
            name: Some("  ".to_string()),
            date_range: Some(DateRange::Last90),
            widgets: None,
        });
        assert_eq!(renamed.name, "Ops");
        assert_eq!(renamed.date_range, DateRange::Last90);

        let renamed = dashboard.updated(DashboardUpdate {
            name: Some("Sales".to_string()),
            ..DashboardUpdate::default()
        });
        assert_eq!(renamed.name, "Sales");
        assert_eq!(renamed.date_range, DateRange::Today);
    }
}
