// Repository trait for dashboard persistence
use crate::domain::dashboard::Dashboard;
use async_trait::async_trait;

#[async_trait]
pub trait DashboardRepository: Send + Sync {
    /// Stored dashboard for a dataset, `None` if it was never saved
    async fn load_dashboard(&self, dataset_id: &str) -> anyhow::Result<Option<Dashboard>>;

    /// Replace the whole dashboard of a dataset
    async fn save_dashboard(&self, dataset_id: &str, dashboard: &Dashboard) -> anyhow::Result<()>;
}
