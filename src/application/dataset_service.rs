// Dataset service - Use cases for ingesting and browsing uploaded rows
use crate::application::clock::Clock;
use crate::application::dataset_repository::DatasetRepository;
use crate::domain::dataset::{Dataset, DatasetInfo};
use crate::domain::record::Record;
use anyhow::Context;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone)]
pub struct DatasetService {
    repository: Arc<dyn DatasetRepository>,
    clock: Arc<dyn Clock>,
}

impl DatasetService {
    pub fn new(repository: Arc<dyn DatasetRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    pub async fn list_datasets(&self) -> anyhow::Result<Vec<DatasetInfo>> {
        self.repository.list_datasets().await
    }

    pub async fn create_dataset(&self, name: &str, records: Vec<Record>) -> anyhow::Result<DatasetInfo> {
        let name = name.trim();
        if name.is_empty() {
            anyhow::bail!("dataset name must not be empty");
        }

        let dataset = Dataset::from_records(
            Uuid::new_v4().to_string(),
            name.to_string(),
            records,
            self.clock.now_utc(),
        );

        self.repository
            .save_dataset(&dataset)
            .await
            .with_context(|| format!("saving dataset {}", name))?;

        tracing::info!(
            "Stored dataset {} ({}) with {} rows and {} fields",
            dataset.info.id,
            dataset.info.name,
            dataset.info.row_count,
            dataset.info.fields.len()
        );
        Ok(dataset.info)
    }

    pub async fn get_dataset(&self, id: &str) -> anyhow::Result<Option<Dataset>> {
        self.repository.load_dataset(id).await
    }
}
