// Dashboard service - Use cases for editing and rendering a dataset's dashboard
use crate::application::clock::Clock;
use crate::application::dashboard_repository::DashboardRepository;
use crate::application::dataset_repository::DatasetRepository;
use crate::domain::dashboard::{Dashboard, DashboardUpdate};
use crate::domain::date_range::DateRange;
use crate::domain::error::InvalidSettings;
use crate::domain::layout::{self, GridCell, LayoutItem, GRID_COLUMNS};
use crate::domain::palette::{Archetype, Palette};
use crate::domain::renderer::{render_dashboard, RenderedDashboard};
use crate::domain::settings::{WidgetSettings, WidgetType};
use crate::domain::widget::{self, LayoutPatch, Widget, WidgetPatch};
use crate::infrastructure::config::EngineConfig;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("dataset not found: {0}")]
    DatasetNotFound(String),
    #[error("no palette entry for {0}")]
    UnknownArchetype(String),
    #[error(transparent)]
    InvalidSettings(#[from] InvalidSettings),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Which palette entry to instantiate. `label` wins over `type` when both are given.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewWidget {
    #[serde(rename = "type")]
    pub widget_type: Option<WidgetType>,
    pub label: Option<String>,
}

/// Settings-panel changes as they arrive over the wire. The settings bag is
/// decoded against the target widget's own type.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WidgetChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub layout: Option<LayoutPatch>,
    pub settings: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridView {
    pub columns: u32,
    pub rows: u32,
    pub items: Vec<LayoutItem>,
    pub free_cells: Vec<GridCell>,
}

#[derive(Clone)]
pub struct DashboardService {
    dashboards: Arc<dyn DashboardRepository>,
    datasets: Arc<dyn DatasetRepository>,
    clock: Arc<dyn Clock>,
    palette: Arc<Palette>,
    engine: EngineConfig,
    /// One edit lock per dataset, held from load to save.
    edit_locks: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl DashboardService {
    pub fn new(
        dashboards: Arc<dyn DashboardRepository>,
        datasets: Arc<dyn DatasetRepository>,
        clock: Arc<dyn Clock>,
        palette: Arc<Palette>,
        engine: EngineConfig,
    ) -> Self {
        Self {
            dashboards,
            datasets,
            clock,
            palette,
            engine,
            edit_locks: Arc::default(),
        }
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Stored dashboard, or a fresh default one for a dataset that has none yet.
    pub async fn get_dashboard(&self, dataset_id: &str) -> Result<Dashboard, DashboardError> {
        self.ensure_dataset(dataset_id).await?;
        self.load_or_default(dataset_id).await
    }

    pub async fn save_dashboard(
        &self,
        dataset_id: &str,
        update: DashboardUpdate,
    ) -> Result<Dashboard, DashboardError> {
        let (_guard, current) = self.begin_edit(dataset_id).await?;
        self.store(dataset_id, current.updated(update)).await
    }

    pub async fn add_widget(
        &self,
        dataset_id: &str,
        request: &NewWidget,
    ) -> Result<Widget, DashboardError> {
        let archetype = self.resolve_archetype(request)?;
        let (_guard, current) = self.begin_edit(dataset_id).await?;

        let (widgets, created) = widget::add_widget(&current.widgets, archetype);
        tracing::debug!(
            "Adding {} widget {} at {:?}",
            created.widget_type(),
            created.widget_id,
            created.layout
        );

        self.store(dataset_id, current.with_widgets(widgets)).await?;
        Ok(created)
    }

    /// Unknown widget ids leave the dashboard unchanged.
    pub async fn update_widget(
        &self,
        dataset_id: &str,
        widget_id: &str,
        changes: WidgetChanges,
    ) -> Result<Dashboard, DashboardError> {
        let (_guard, current) = self.begin_edit(dataset_id).await?;
        let Some(target) = widget::find_widget(&current.widgets, widget_id) else {
            tracing::debug!("Ignoring update for unknown widget {}", widget_id);
            return Ok(current);
        };

        let settings = changes
            .settings
            .map(|bag| WidgetSettings::from_value(target.widget_type(), bag))
            .transpose()?;

        let patch = WidgetPatch {
            title: changes.title,
            description: changes.description,
            layout: changes.layout,
            settings,
        };

        let widgets = widget::update_widget(&current.widgets, widget_id, &patch);
        self.store(dataset_id, current.with_widgets(widgets)).await
    }

    pub async fn delete_widget(
        &self,
        dataset_id: &str,
        widget_id: &str,
    ) -> Result<Dashboard, DashboardError> {
        let (_guard, current) = self.begin_edit(dataset_id).await?;
        if widget::find_widget(&current.widgets, widget_id).is_none() {
            tracing::debug!("Ignoring delete for unknown widget {}", widget_id);
            return Ok(current);
        }

        let widgets = widget::delete_widget(&current.widgets, widget_id);
        self.store(dataset_id, current.with_widgets(widgets)).await
    }

    pub async fn apply_layout(
        &self,
        dataset_id: &str,
        items: &[LayoutItem],
    ) -> Result<Dashboard, DashboardError> {
        let (_guard, current) = self.begin_edit(dataset_id).await?;
        let widgets = layout::apply_layout_change(&current.widgets, items);
        if widgets == current.widgets {
            return Ok(current);
        }
        self.store(dataset_id, current.with_widgets(widgets)).await
    }

    /// Renders against the full dataset. `range` overrides the stored range
    /// for this call only.
    pub async fn render(
        &self,
        dataset_id: &str,
        range: Option<DateRange>,
    ) -> Result<RenderedDashboard, DashboardError> {
        let dataset = self
            .datasets
            .load_dataset(dataset_id)
            .await
            .with_context(|| format!("loading dataset {}", dataset_id))?
            .ok_or_else(|| DashboardError::DatasetNotFound(dataset_id.to_string()))?;

        let mut dashboard = self.load_or_default(dataset_id).await?;
        if let Some(range) = range {
            dashboard.date_range = range;
        }

        Ok(render_dashboard(
            &dashboard,
            &dataset.records,
            &self.engine.date_field,
            self.clock.now(),
        ))
    }

    pub async fn grid(&self, dataset_id: &str) -> Result<GridView, DashboardError> {
        let dashboard = self.get_dashboard(dataset_id).await?;
        Ok(GridView {
            columns: GRID_COLUMNS,
            rows: self.engine.grid_rows,
            items: layout::layout_items(&dashboard.widgets),
            free_cells: layout::free_cells(&dashboard.widgets, self.engine.grid_rows),
        })
    }

    fn resolve_archetype(&self, request: &NewWidget) -> Result<&Archetype, DashboardError> {
        if let Some(label) = request.label.as_deref() {
            return self
                .palette
                .find_by_label(label)
                .ok_or_else(|| DashboardError::UnknownArchetype(label.to_string()));
        }

        let widget_type = request
            .widget_type
            .ok_or_else(|| DashboardError::UnknownArchetype("an empty request".to_string()))?;
        self.palette
            .find_by_type(widget_type)
            .ok_or_else(|| DashboardError::UnknownArchetype(widget_type.to_string()))
    }

    async fn ensure_dataset(&self, dataset_id: &str) -> Result<(), DashboardError> {
        let exists = self
            .datasets
            .load_dataset(dataset_id)
            .await
            .with_context(|| format!("loading dataset {}", dataset_id))?
            .is_some();

        if exists {
            Ok(())
        } else {
            Err(DashboardError::DatasetNotFound(dataset_id.to_string()))
        }
    }

    /// Loads the dashboard for a read-modify-write cycle. Edits to the same
    /// dataset are serialized until the returned guard is dropped.
    async fn begin_edit(
        &self,
        dataset_id: &str,
    ) -> Result<(OwnedMutexGuard<()>, Dashboard), DashboardError> {
        self.ensure_dataset(dataset_id).await?;

        let lock = {
            let mut locks = self.edit_locks.lock().await;
            Arc::clone(locks.entry(dataset_id.to_string()).or_default())
        };
        let guard = lock.lock_owned().await;

        let current = self.load_or_default(dataset_id).await?;
        Ok((guard, current))
    }

    async fn load_or_default(&self, dataset_id: &str) -> Result<Dashboard, DashboardError> {
        let stored = self
            .dashboards
            .load_dashboard(dataset_id)
            .await
            .with_context(|| format!("loading dashboard {}", dataset_id))?;

        Ok(stored.unwrap_or_else(|| Dashboard {
            date_range: self.engine.default_range,
            ..Dashboard::default()
        }))
    }

    async fn store(&self, dataset_id: &str, dashboard: Dashboard) -> Result<Dashboard, DashboardError> {
        self.dashboards
            .save_dashboard(dataset_id, &dashboard)
            .await
            .with_context(|| format!("saving dashboard {}", dataset_id))?;

        tracing::info!(
            "Saved dashboard {} with {} widgets",
            dataset_id,
            dashboard.widgets.len()
        );
        Ok(dashboard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::clock::FixedClock;
    use crate::domain::dataset::Dataset;
    use crate::domain::record::Record;
    use crate::domain::renderer::WidgetOutput;
    use crate::infrastructure::config::builtin_palette;
    use crate::infrastructure::json_file_repository::JsonFileRepository;
    use crate::infrastructure::memory_repository::MemoryRepository;
    use chrono::{DateTime, Utc};
    use serde_json::json;

    async fn service() -> DashboardService {
        let repository = Arc::new(MemoryRepository::new());
        let records = vec![
            Record::new()
                .with("product", "A")
                .with("status", "Pending")
                .with("totalAmount", 5.0)
                .with("orderDate", "2024-06-14"),
            Record::new()
                .with("product", "B")
                .with("status", "Completed")
                .with("totalAmount", 7.0)
                .with("orderDate", "2023-01-01"),
        ];
        let dataset = Dataset::from_records("orders".to_string(), "Orders".to_string(), records, Utc::now());
        repository.save_dataset(&dataset).await.unwrap();

        let now = DateTime::parse_from_rfc3339("2024-06-15T12:00:00+00:00").unwrap();
        DashboardService::new(
            repository.clone(),
            repository,
            Arc::new(FixedClock(now)),
            Arc::new(builtin_palette().unwrap()),
            EngineConfig::default(),
        )
    }

    fn by_type(widget_type: WidgetType) -> NewWidget {
        NewWidget {
            widget_type: Some(widget_type),
            label: None,
        }
    }

    #[tokio::test]
    async fn test_default_dashboard_for_new_dataset() {
        let service = service().await;
        let dashboard = service.get_dashboard("orders").await.unwrap();
        assert_eq!(dashboard, Dashboard::default());

        let missing = service.get_dashboard("nope").await;
        assert!(matches!(missing, Err(DashboardError::DatasetNotFound(_))));
    }

    #[tokio::test]
    async fn test_add_update_delete_persist() {
        let service = service().await;

        let bar = service.add_widget("orders", &by_type(WidgetType::Bar)).await.unwrap();
        assert_eq!(bar.title, "Monthly Revenue by Category");
        let kpi = service
            .add_widget(
                "orders",
                &NewWidget {
                    widget_type: None,
                    label: Some("kpi value".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!((kpi.layout.x, kpi.layout.y), (5, 5));

        let changes = WidgetChanges {
            title: Some("Revenue".to_string()),
            settings: Some(json!({"xField": "status", "chartColor": "#000000"})),
            ..WidgetChanges::default()
        };
        let updated = service.update_widget("orders", &bar.widget_id, changes).await.unwrap();
        let stored = widget::find_widget(&updated.widgets, &bar.widget_id).unwrap();
        assert_eq!(stored.title, "Revenue");
        assert!(matches!(&stored.settings, WidgetSettings::Cartesian(_, s) if s.x_field == "status"));

        let after_delete = service.delete_widget("orders", &kpi.widget_id).await.unwrap();
        assert_eq!(after_delete.widgets.len(), 1);

        let reloaded = service.get_dashboard("orders").await.unwrap();
        assert_eq!(reloaded, after_delete);
    }

    #[tokio::test]
    async fn test_unknown_widget_is_noop() {
        let service = service().await;
        service.add_widget("orders", &by_type(WidgetType::Pie)).await.unwrap();
        let before = service.get_dashboard("orders").await.unwrap();

        let after = service.delete_widget("orders", "missing").await.unwrap();
        assert_eq!(after, before);
        let after = service
            .update_widget("orders", "missing", WidgetChanges::default())
            .await
            .unwrap();
        assert_eq!(after, before);
    }

    #[tokio::test]
    async fn test_invalid_settings_rejected() {
        let service = service().await;
        let kpi = service.add_widget("orders", &by_type(WidgetType::Kpi)).await.unwrap();

        let changes = WidgetChanges {
            settings: Some(json!({"aggregation": "Median"})),
            ..WidgetChanges::default()
        };
        let result = service.update_widget("orders", &kpi.widget_id, changes).await;
        assert!(matches!(result, Err(DashboardError::InvalidSettings(_))));
    }

    #[tokio::test]
    async fn test_render_uses_stored_range_and_override() {
        let service = service().await;
        service.add_widget("orders", &by_type(WidgetType::Pie)).await.unwrap();
        service
            .save_dashboard(
                "orders",
                DashboardUpdate {
                    date_range: Some(DateRange::Last7),
                    ..DashboardUpdate::default()
                },
            )
            .await
            .unwrap();

        let rendered = service.render("orders", None).await.unwrap();
        assert_eq!(rendered.record_count, 1);
        match &rendered.widgets[0].output {
            WidgetOutput::Pie(pie) => assert_eq!(pie.slices.len(), 1),
            other => panic!("unexpected output: {:?}", other),
        }

        let everything = service.render("orders", Some(DateRange::All)).await.unwrap();
        assert_eq!(everything.record_count, 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_concurrent_adds_are_all_kept() {
        let dir = tempfile::tempdir().unwrap();
        let repository = Arc::new(JsonFileRepository::open(dir.path()).await.unwrap());
        let records = vec![Record::new().with("totalAmount", 5.0)];
        let dataset = Dataset::from_records("orders".to_string(), "Orders".to_string(), records, Utc::now());
        repository.save_dataset(&dataset).await.unwrap();

        let now = DateTime::parse_from_rfc3339("2024-06-15T12:00:00+00:00").unwrap();
        let service = DashboardService::new(
            repository.clone(),
            repository,
            Arc::new(FixedClock(now)),
            Arc::new(builtin_palette().unwrap()),
            EngineConfig::default(),
        );

        let tasks: Vec<_> = (0..50)
            .map(|_| {
                let service = service.clone();
                tokio::spawn(async move { service.add_widget("orders", &by_type(WidgetType::Kpi)).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let stored = service.get_dashboard("orders").await.unwrap();
        assert_eq!(stored.widgets.len(), 50);
    }

    #[tokio::test]
    async fn test_layout_and_grid() {
        let service = service().await;
        let widget = service.add_widget("orders", &by_type(WidgetType::Table)).await.unwrap();

        let items = vec![LayoutItem {
            i: widget.widget_id.clone(),
            x: 2,
            y: 1,
            w: 4,
            h: 4,
        }];
        service.apply_layout("orders", &items).await.unwrap();

        let grid = service.grid("orders").await.unwrap();
        assert_eq!(grid.items, items);
        assert_eq!(grid.free_cells.len(), (32 * 12 - 16) as usize);
    }
}
