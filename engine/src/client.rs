use std::time::Duration;

use common::{CdfConfig, DataSet, ExistingGroup, NewGroup, ServiceAccount};
use log::debug;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("client configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("CDF API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),
}

/// Operations the reconciler and reporter need from the target system.
#[allow(async_fn_in_trait)]
pub trait TargetClient {
    async fn list_groups(&self, all: bool) -> Result<Vec<ExistingGroup>, ClientError>;
    async fn create_group(&self, group: &NewGroup) -> Result<ExistingGroup, ClientError>;
    async fn delete_group(&self, id: i64) -> Result<(), ClientError>;
    async fn retrieve_dataset(&self, id: i64) -> Result<Option<DataSet>, ClientError>;
    async fn list_service_accounts(&self) -> Result<Vec<ServiceAccount>, ClientError>;
}

#[derive(Deserialize)]
struct Items<T> {
    items: Vec<T>,
}

#[derive(Serialize)]
struct ItemsRequest<'a, T> {
    items: &'a [T],
}

#[derive(Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    message: String,
}

#[derive(Clone)]
pub struct CdfClient {
    client: Client,
    base_url: String,
    project: String,
    api_key: String,
}

impl CdfClient {
    pub fn new(config: &CdfConfig) -> Result<Self, ClientError> {
        let project = config
            .project
            .clone()
            .ok_or_else(|| ClientError::Config("no CDF project configured".into()))?;
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| ClientError::Config("no CDF api key configured".into()))?;

        Ok(Self {
            client: Client::builder()
                .timeout(Duration::from_secs(config.timeout_secs))
                .user_agent(concat!("cdf-iam/", env!("CARGO_PKG_VERSION")))
                .build()?,
            base_url: config.base_url(),
            project,
            api_key,
        })
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1/projects/{}/{}", self.base_url, self.project, path)
    }

    async fn send(&self, request: RequestBuilder) -> Result<reqwest::Response, ClientError> {
        let response = request.header("api-key", &self.api_key).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorEnvelope>(&body)
            .map(|envelope| envelope.error.message)
            .unwrap_or(body);
        Err(ClientError::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn send_items<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<Vec<T>, ClientError> {
        let response = self.send(request).await?;
        let items: Items<T> = response.json().await?;
        Ok(items.items)
    }
}

impl TargetClient for CdfClient {
    async fn list_groups(&self, all: bool) -> Result<Vec<ExistingGroup>, ClientError> {
        let request = self
            .client
            .get(self.url("groups"))
            .query(&[("all", all)]);
        let groups: Vec<ExistingGroup> = self.send_items(request).await?;
        debug!("Listed {} groups in {}", groups.len(), self.project);
        Ok(groups)
    }

    async fn create_group(&self, group: &NewGroup) -> Result<ExistingGroup, ClientError> {
        let request = self
            .client
            .post(self.url("groups"))
            .json(&ItemsRequest { items: std::slice::from_ref(group) });
        let mut created: Vec<ExistingGroup> = self.send_items(request).await?;
        created.pop().ok_or_else(|| {
            let message = format!("no group returned when creating {}", group.name);
            ClientError::UnexpectedResponse(message)
        })
    }

    async fn delete_group(&self, id: i64) -> Result<(), ClientError> {
        let request = self
            .client
            .post(self.url("groups/delete"))
            .json(&json!({ "items": [id] }));
        self.send(request).await?;
        Ok(())
    }

    async fn retrieve_dataset(&self, id: i64) -> Result<Option<DataSet>, ClientError> {
        let request = self
            .client
            .post(self.url("datasets/byids"))
            .json(&json!({ "items": [{ "id": id }], "ignoreUnknownIds": true }));
        let mut found: Vec<DataSet> = self.send_items(request).await?;
        Ok(found.pop())
    }

    async fn list_service_accounts(&self) -> Result<Vec<ServiceAccount>, ClientError> {
        let request = self.client.get(self.url("serviceaccounts"));
        self.send_items(request).await
    }
}
