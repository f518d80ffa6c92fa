// Repository trait for uploaded datasets
use crate::domain::dataset::{Dataset, DatasetInfo};
use async_trait::async_trait;

#[async_trait]
pub trait DatasetRepository: Send + Sync {
    /// Metadata of every stored dataset, newest first
    async fn list_datasets(&self) -> anyhow::Result<Vec<DatasetInfo>>;

    async fn load_dataset(&self, id: &str) -> anyhow::Result<Option<Dataset>>;

    async fn save_dataset(&self, dataset: &Dataset) -> anyhow::Result<()>;
}
