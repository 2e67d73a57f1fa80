//! HTTP client for the row-oriented data service.
//!
//! The service speaks a PostgREST-style dialect: tables are path segments,
//! column predicates are query parameters (`col=eq.value`), and result
//! windows are requested with `Range` headers. Responses larger than one
//! page are fetched window by window until a short page arrives.

use anyhow::{Context, Result};
use reqwest::Client;
use serde_json::Value as JsonValue;

use crate::config::DashboardConfig;

pub struct DataServiceClient {
    http: Client,
    base_url: String,
    api_key: String,
    page_size: usize,
}

impl DataServiceClient {
    pub fn new(http: Client, config: &DashboardConfig) -> Self {
        Self {
            http,
            base_url: config.data_service_url.clone(),
            api_key: config.data_service_key.clone(),
            page_size: config.fetch_page_size,
        }
    }

    /// Every row of `table` matching `predicates`, projected to `select`.
    /// Any window failing mid-way fails the whole fetch; a partial result
    /// would silently skew every aggregate built on top of it.
    pub async fn fetch_all(
        &self,
        table: &str,
        select: &str,
        predicates: &[(String, String)],
    ) -> Result<Vec<JsonValue>> {
        let url = format!("{}/rest/v1/{table}", self.base_url);
        let mut rows: Vec<JsonValue> = Vec::new();
        let mut offset = 0usize;

        loop {
            let mut query: Vec<(&str, &str)> = vec![("select", select)];
            for (column, predicate) in predicates {
                query.push((column.as_str(), predicate.as_str()));
            }

            let page: Vec<JsonValue> = self
                .http
                .get(&url)
                .query(&query)
                .header("apikey", &self.api_key)
                .header("Authorization", format!("Bearer {}", self.api_key))
                .header("Range-Unit", "items")
                .header("Range", format!("{offset}-{}", offset + self.page_size - 1))
                .send()
                .await?
                .error_for_status()?
                .json()
                .await
                .with_context(|| format!("Failed to decode {table} page at offset {offset}"))?;

            let short_page = page.len() < self.page_size;
            rows.extend(page);
            if short_page {
                break;
            }
            offset += self.page_size;
        }

        tracing::debug!(table, rows = rows.len(), "fetched data service table");
        Ok(rows)
    }

    /// First row of `table`, or `None` when the table is empty.
    pub async fn fetch_first(&self, table: &str, select: &str) -> Result<Option<JsonValue>> {
        let url = format!("{}/rest/v1/{table}", self.base_url);
        let page: Vec<JsonValue> = self
            .http
            .get(&url)
            .query(&[("select", select), ("limit", "1")])
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .with_context(|| format!("Failed to decode {table} response"))?;

        Ok(page.into_iter().next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer, page_size: usize) -> DataServiceClient {
        DataServiceClient::new(
            Client::new(),
            &DashboardConfig {
                data_service_url: server.uri(),
                data_service_key: "test-key".to_string(),
                fetch_page_size: page_size,
            },
        )
    }

    fn rows(n: usize) -> Vec<JsonValue> {
        (0..n).map(|i| json!({ "id": i })).collect()
    }

    #[tokio::test]
    async fn fetch_all_pages_until_a_short_page() {
        let server = MockServer::start().await;
        for (range, count) in [("0-999", 1000), ("1000-1999", 1000), ("2000-2999", 500)] {
            Mock::given(method("GET"))
                .and(path("/rest/v1/v_dashboard_base"))
                .and(header("Range", range))
                .and(header("apikey", "test-key"))
                .and(query_param("select", "*"))
                .respond_with(ResponseTemplate::new(200).set_body_json(rows(count)))
                .expect(1)
                .mount(&server)
                .await;
        }

        let client = client_for(&server, 1000);
        let fetched = client
            .fetch_all("v_dashboard_base", "*", &[])
            .await
            .unwrap();
        assert_eq!(fetched.len(), 2500);
    }

    #[tokio::test]
    async fn fetch_all_forwards_column_predicates() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/v_dashboard_base"))
            .and(query_param("brand", "eq.novac"))
            .and(query_param("started_at", "gte.2026-01-01"))
            .respond_with(ResponseTemplate::new(200).set_body_json(rows(2)))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, 1000);
        let predicates = vec![
            ("brand".to_string(), "eq.novac".to_string()),
            ("started_at".to_string(), "gte.2026-01-01".to_string()),
        ];
        let fetched = client
            .fetch_all("v_dashboard_base", "*", &predicates)
            .await
            .unwrap();
        assert_eq!(fetched.len(), 2);
    }

    #[tokio::test]
    async fn fetch_all_fails_when_any_window_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/v_dashboard_base"))
            .and(header("Range", "0-999"))
            .respond_with(ResponseTemplate::new(200).set_body_json(rows(1000)))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/v_dashboard_base"))
            .and(header("Range", "1000-1999"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = client_for(&server, 1000);
        let result = client.fetch_all("v_dashboard_base", "*", &[]).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn fetch_first_returns_none_on_empty_table() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/ailean_pricing"))
            .and(query_param("limit", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(rows(0)))
            .mount(&server)
            .await;

        let client = client_for(&server, 1000);
        let first = client.fetch_first("ailean_pricing", "*").await.unwrap();
        assert!(first.is_none());
    }
}
