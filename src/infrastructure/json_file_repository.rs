// JSON file repository implementation - one document per dataset and per dashboard
use crate::application::dashboard_repository::DashboardRepository;
use crate::application::dataset_repository::DatasetRepository;
use crate::domain::dashboard::Dashboard;
use crate::domain::dataset::{Dataset, DatasetInfo};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

const DATASETS_DIR: &str = "datasets";
const DASHBOARDS_DIR: &str = "dashboards";

/// Stores `<data_dir>/datasets/<id>.json` and `<data_dir>/dashboards/<id>.json`.
/// Writes go through a temp file and a rename so readers never see a partial document.
#[derive(Debug)]
pub struct JsonFileRepository {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileRepository {
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        for dir in [DATASETS_DIR, DASHBOARDS_DIR] {
            let path = root.join(dir);
            tokio::fs::create_dir_all(&path)
                .await
                .with_context(|| format!("Failed to create {}", path.display()))?;
        }

        tracing::info!("Using JSON storage at {}", root.display());
        Ok(Self {
            root,
            write_lock: Mutex::new(()),
        })
    }

    fn document_path(&self, dir: &str, id: &str) -> Result<PathBuf> {
        let valid = !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            anyhow::bail!("Invalid document id {:?}", id);
        }
        Ok(self.root.join(dir).join(format!("{}.json", id)))
    }

    async fn read_document<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e).with_context(|| format!("Failed to read {}", path.display())),
        };

        let value = serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(Some(value))
    }

    async fn write_document<T: Serialize>(&self, path: &Path, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(value).context("Failed to serialize document")?;
        let tmp = path.with_extension("json.tmp");

        let _guard = self.write_lock.lock().await;
        tokio::fs::write(&tmp, &bytes)
            .await
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        tokio::fs::rename(&tmp, path)
            .await
            .with_context(|| format!("Failed to replace {}", path.display()))?;

        tracing::debug!("Wrote {} bytes to {}", bytes.len(), path.display());
        Ok(())
    }
}

#[async_trait]
impl DatasetRepository for JsonFileRepository {
    async fn list_datasets(&self) -> Result<Vec<DatasetInfo>> {
        let dir = self.root.join(DATASETS_DIR);
        let mut entries = tokio::fs::read_dir(&dir)
            .await
            .with_context(|| format!("Failed to list {}", dir.display()))?;

        let mut infos = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match Self::read_document::<Dataset>(&path).await {
                Ok(Some(dataset)) => infos.push(dataset.info),
                Ok(None) => {}
                Err(e) => tracing::warn!("Skipping unreadable dataset {}: {:#}", path.display(), e),
            }
        }

        infos.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(infos)
    }

    async fn load_dataset(&self, id: &str) -> Result<Option<Dataset>> {
        let path = match self.document_path(DATASETS_DIR, id) {
            Ok(path) => path,
            Err(_) => return Ok(None),
        };
        Self::read_document(&path).await
    }

    async fn save_dataset(&self, dataset: &Dataset) -> Result<()> {
        let path = self.document_path(DATASETS_DIR, &dataset.info.id)?;
        self.write_document(&path, dataset).await
    }
}

#[async_trait]
impl DashboardRepository for JsonFileRepository {
    async fn load_dashboard(&self, dataset_id: &str) -> Result<Option<Dashboard>> {
        let path = match self.document_path(DASHBOARDS_DIR, dataset_id) {
            Ok(path) => path,
            Err(_) => return Ok(None),
        };
        Self::read_document(&path).await
    }

    async fn save_dashboard(&self, dataset_id: &str, dashboard: &Dashboard) -> Result<()> {
        let path = self.document_path(DASHBOARDS_DIR, dataset_id)?;
        self.write_document(&path, dashboard).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::date_range::DateRange;
    use crate::domain::palette::{Archetype, PaletteGroup, WidgetSize};
    use crate::domain::record::Record;
    use crate::domain::settings::{WidgetSettings, WidgetType};
    use crate::domain::widget::add_widget;
    use chrono::{TimeZone, Utc};

    fn archetype(widget_type: WidgetType) -> Archetype {
        Archetype {
            label: widget_type.to_string(),
            default_title: String::new(),
            widget_type,
            group: PaletteGroup::Charts,
            description: String::new(),
            default_size: WidgetSize { w: 5, h: 5 },
            default_settings: WidgetSettings::defaults_for(widget_type),
        }
    }

    #[tokio::test]
    async fn test_dashboard_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let repository = JsonFileRepository::open(dir.path()).await.unwrap();

        let mut widgets = Vec::new();
        for widget_type in WidgetType::ALL {
            widgets = add_widget(&widgets, &archetype(widget_type)).0;
        }
        let dashboard = Dashboard {
            name: "Sales".to_string(),
            date_range: DateRange::Last30,
            widgets,
        };

        assert!(repository.load_dashboard("ds-1").await.unwrap().is_none());
        repository.save_dashboard("ds-1", &dashboard).await.unwrap();

        let reopened = JsonFileRepository::open(dir.path()).await.unwrap();
        assert_eq!(reopened.load_dashboard("ds-1").await.unwrap(), Some(dashboard));
        assert!(!dir.path().join("dashboards/ds-1.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_datasets_listed_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let repository = JsonFileRepository::open(dir.path()).await.unwrap();

        for (id, day) in [("old", 1), ("new", 2)] {
            let created = Utc.with_ymd_and_hms(2024, 3, day, 0, 0, 0).unwrap();
            let records = vec![Record::new().with("totalAmount", 4.5).with("product", "Router")];
            let dataset = Dataset::from_records(id.to_string(), id.to_uppercase(), records, created);
            repository.save_dataset(&dataset).await.unwrap();
        }
        std::fs::write(dir.path().join("datasets/notes.txt"), "ignored").unwrap();

        let ids: Vec<_> = repository
            .list_datasets()
            .await
            .unwrap()
            .into_iter()
            .map(|info| info.id)
            .collect();
        assert_eq!(ids, vec!["new", "old"]);

        let loaded = repository.load_dataset("old").await.unwrap().unwrap();
        assert_eq!(loaded.records[0].get_number("totalAmount"), Some(4.5));
    }

    #[tokio::test]
    async fn test_rejects_path_like_ids() {
        let dir = tempfile::tempdir().unwrap();
        let repository = JsonFileRepository::open(dir.path()).await.unwrap();

        assert!(repository.load_dashboard("../etc/passwd").await.unwrap().is_none());
        assert!(repository
            .save_dashboard("../escape", &Dashboard::default())
            .await
            .is_err());
    }
}
