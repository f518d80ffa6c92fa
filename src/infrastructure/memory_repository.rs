// In-memory repository - process-local storage for tests and throwaway sessions
use crate::application::dashboard_repository::DashboardRepository;
use crate::application::dataset_repository::DatasetRepository;
use crate::domain::dashboard::Dashboard;
use crate::domain::dataset::{Dataset, DatasetInfo};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Default)]
pub struct MemoryRepository {
    datasets: RwLock<HashMap<String, Dataset>>,
    dashboards: RwLock<HashMap<String, Dashboard>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DatasetRepository for MemoryRepository {
    async fn list_datasets(&self) -> anyhow::Result<Vec<DatasetInfo>> {
        let datasets = self.datasets.read().await;
        let mut infos: Vec<DatasetInfo> = datasets.values().map(|d| d.info.clone()).collect();
        infos.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(infos)
    }

    async fn load_dataset(&self, id: &str) -> anyhow::Result<Option<Dataset>> {
        Ok(self.datasets.read().await.get(id).cloned())
    }

    async fn save_dataset(&self, dataset: &Dataset) -> anyhow::Result<()> {
        self.datasets
            .write()
            .await
            .insert(dataset.info.id.clone(), dataset.clone());
        Ok(())
    }
}

#[async_trait]
impl DashboardRepository for MemoryRepository {
    async fn load_dashboard(&self, dataset_id: &str) -> anyhow::Result<Option<Dashboard>> {
        Ok(self.dashboards.read().await.get(dataset_id).cloned())
    }

    async fn save_dashboard(&self, dataset_id: &str, dashboard: &Dashboard) -> anyhow::Result<()> {
        self.dashboards
            .write()
            .await
            .insert(dataset_id.to_string(), dashboard.clone());
        Ok(())
    }
}
