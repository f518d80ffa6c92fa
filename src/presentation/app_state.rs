// Application state for HTTP handlers
use crate::application::dashboard_service::DashboardService;
use crate::application::dataset_service::DatasetService;

#[derive(Clone)]
pub struct AppState {
    pub dashboard_service: DashboardService,
    pub dataset_service: DatasetService,
}
