use crate::config::DashboardConfig;
use crate::services::data_source::DataServiceClient;
use axum::extract::FromRef;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: DashboardConfig,
    pub data: Arc<DataServiceClient>,
}

impl FromRef<AppState> for Arc<DataServiceClient> {
    fn from_ref(state: &AppState) -> Arc<DataServiceClient> {
        state.data.clone()
    }
}
