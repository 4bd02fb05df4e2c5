// Application state for HTTP handlers
use crate::application::dashboard_service::DashboardRegistry;
use crate::application::dataset_service::DatasetRegistry;
use crate::application::gateway::DataAccessGateway;
use crate::application::upload_service::UploadService;

#[derive(Clone)]
pub struct AppState {
    pub datasets: DatasetRegistry,
    pub dashboards: DashboardRegistry,
    pub gateway: DataAccessGateway,
    pub uploads: UploadService,
}
