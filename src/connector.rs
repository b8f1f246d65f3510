use crate::config::Config;
use crate::error::{Result, SplitterError};
use crate::types::{BaseConnector, CellValue, FieldMeta, TableMeta};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, instrument};

/// REST connector to the hosted base platform.
///
/// Auth is a bearer personal token plus an optional app token header; every
/// endpoint speaks JSON. Non-2xx responses surface as
/// [`SplitterError::Api`] with the status and a body snippet.
pub struct HttpConnector {
    client: reqwest::Client,
    base_url: String,
    personal_token: String,
    app_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ItemsResponse<T> {
    items: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct RecordEntry {
    record_id: String,
    #[serde(default)]
    fields: serde_json::Map<String, CellValue>,
}

#[derive(Debug, Deserialize)]
struct CreatedRecord {
    record_id: String,
}

impl HttpConnector {
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.base.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base.url.trim_end_matches('/').to_string(),
            personal_token: config.personal_token()?,
            app_token: config.base.app_token.clone(),
        })
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self
            .client
            .request(method, url)
            .bearer_auth(&self.personal_token);
        if let Some(app_token) = &self.app_token {
            req = req.header("X-App-Token", app_token);
        }
        req
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let snippet: String = body.chars().take(200).collect();
        Err(SplitterError::Api {
            message: format!("host returned {status}: {snippet}"),
        })
    }

    /// Fetches a table's records once; record order is the host's
    /// iteration order.
    async fn fetch_records(&self, table_id: &str) -> Result<Vec<RecordEntry>> {
        let response = self
            .request(reqwest::Method::GET, &format!("/tables/{table_id}/records"))
            .send()
            .await?;
        let response = Self::check_status(response).await?;
        let parsed: ItemsResponse<RecordEntry> = response.json().await?;
        debug!("Fetched {} records from table {}", parsed.items.len(), table_id);
        Ok(parsed.items)
    }
}

#[async_trait::async_trait]
impl BaseConnector for HttpConnector {
    #[instrument(skip(self))]
    async fn get_table_meta_list(&self) -> Result<Vec<TableMeta>> {
        let response = self.request(reqwest::Method::GET, "/tables").send().await?;
        let response = Self::check_status(response).await?;
        let parsed: ItemsResponse<TableMeta> = response.json().await?;
        Ok(parsed.items)
    }

    #[instrument(skip(self))]
    async fn get_field_meta_list(&self, table_id: &str) -> Result<Vec<FieldMeta>> {
        let response = self
            .request(reqwest::Method::GET, &format!("/tables/{table_id}/fields"))
            .send()
            .await?;
        let response = Self::check_status(response).await?;
        let parsed: ItemsResponse<FieldMeta> = response.json().await?;
        Ok(parsed.items)
    }

    #[instrument(skip(self))]
    async fn get_record_id_list(&self, table_id: &str) -> Result<Vec<String>> {
        let records = self.fetch_records(table_id).await?;
        Ok(records.into_iter().map(|r| r.record_id).collect())
    }

    #[instrument(skip(self))]
    async fn get_cell_value(
        &self,
        table_id: &str,
        field_id: &str,
        record_id: &str,
    ) -> Result<CellValue> {
        let response = self
            .request(
                reqwest::Method::GET,
                &format!("/tables/{table_id}/records/{record_id}"),
            )
            .send()
            .await?;
        let response = Self::check_status(response).await?;
        let mut record: RecordEntry = response.json().await?;
        // Absent cells are simply missing from the field map.
        Ok(record.fields.remove(field_id).unwrap_or(CellValue::Null))
    }

    #[instrument(skip(self, value))]
    async fn add_record(&self, table_id: &str, field_id: &str, value: &str) -> Result<String> {
        let body = json!({ "fields": { field_id: value } });
        let response = self
            .request(reqwest::Method::POST, &format!("/tables/{table_id}/records"))
            .json(&body)
            .send()
            .await?;
        let response = Self::check_status(response).await?;
        let created: CreatedRecord = response.json().await?;
        Ok(created.record_id)
    }
}
