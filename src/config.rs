use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub data_service_url: String,
    pub data_service_key: String,
    pub fetch_page_size: usize,
}

impl DashboardConfig {
    pub fn from_env() -> Result<Self> {
        let data_service_url = std::env::var("KPI_DATA_SERVICE_URL")
            .ok()
            .map(|value| value.trim().trim_end_matches('/').to_string())
            .filter(|value| !value.is_empty())
            .context("KPI_DATA_SERVICE_URL must be set to the data service base URL")?;
        let data_service_key = std::env::var("KPI_DATA_SERVICE_KEY")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .context("KPI_DATA_SERVICE_KEY must be set to the data service API key")?;
        let fetch_page_size = env_u64("KPI_FETCH_PAGE_SIZE", 1000).clamp(1, 10_000) as usize;

        Ok(Self {
            data_service_url,
            data_service_key,
            fetch_page_size,
        })
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|value| value.trim().parse::<u64>().ok())
        .unwrap_or(default)
}
