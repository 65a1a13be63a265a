//! # Persistence Gateway
//!
//! HTTP client for the page service. Loading and saving live here;
//! generation (the `PUT` endpoints) shares the same client and credential
//! handling.
//!
//! ## Endpoints
//!
//! ```text
//! GET   /pages/{pageId}                          → page record
//! PATCH /components/{id}/code?modified_code=...  → {ok}
//! PATCH /components/{id}/data?prop_data_type=... → {modified_data}
//! PUT   /components/{id}/code                    → {modified_code, summary}
//! PUT   /components/{id}/data                    → {data, summary}
//! ```
//!
//! Every request carries a bearer token from the [`SessionStore`].
//! Nothing is retried; a failed save leaves the page dirty.

use crate::config::Config;
use crate::credentials::{EnvSessionStore, SessionStore};
use crate::error::{GatewayError, GatewayResult};
use crate::generation::{
    CodeEditRequest, CodeEditResponse, DataEditRequest, DataEditResponse, GenerationService,
};
use async_trait::async_trait;
use livecanvas_editor::{parse_data_context, EditSession, Page};
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// A page as stored remotely
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRecord {
    pub component_source: String,
    /// Object or JSON string
    #[serde(default)]
    pub data_context: Value,
    #[serde(default)]
    pub component_id: Option<String>,
    #[serde(default)]
    pub slide_id: Option<String>,
}

impl PageRecord {
    pub fn into_page(self, page_id: impl Into<String>) -> Page {
        let data = match self.data_context {
            Value::String(text) => parse_data_context(&text),
            Value::Object(_) => self.data_context,
            Value::Null => parse_data_context("{}"),
            other => parse_data_context(&other.to_string()),
        };
        Page::new(page_id, self.component_source, data)
            .with_remote_ids(self.component_id, self.slide_id)
    }
}

#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    async fn load_page(&self, page_id: &str) -> GatewayResult<PageRecord>;

    async fn save_code(&self, component_id: &str, code: &str) -> GatewayResult<()>;

    /// Returns the data as stored
    async fn save_data(&self, component_id: &str, data: &Value) -> GatewayResult<Value>;
}

/// What an explicit save pushed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveSummary {
    pub code: bool,
    pub data: bool,
}

/// Fetch a page and turn it into an editable [`Page`]
pub async fn open_page(gateway: &dyn PersistenceGateway, page_id: &str) -> GatewayResult<Page> {
    let record = gateway.load_page(page_id).await?;
    tracing::info!(page_id, component_id = ?record.component_id, "page fetched");
    Ok(record.into_page(page_id))
}

/// Push the current page's unsaved source and data.
///
/// The page is marked saved only when every call succeeded; on failure it
/// stays dirty and the caller decides whether to try again.
pub async fn save_page(
    gateway: &dyn PersistenceGateway,
    session: &mut EditSession,
) -> GatewayResult<SaveSummary> {
    let page = session.page()?;
    let component_id = page
        .component_id
        .clone()
        .ok_or_else(|| GatewayError::MissingComponentId(page.id.clone()))?;

    let mut summary = SaveSummary::default();
    if page.source_changed() {
        gateway.save_code(&component_id, &page.source).await?;
        summary.code = true;
    }
    if page.data_changed() {
        gateway.save_data(&component_id, &page.data).await?;
        summary.data = true;
    }

    session.mark_saved();
    tracing::info!(%component_id, code = summary.code, data = summary.data, "page saved");
    Ok(summary)
}

#[derive(Debug, Deserialize)]
struct SaveCodeResponse {
    #[serde(default = "default_ok")]
    ok: bool,
}

fn default_ok() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct SaveDataResponse {
    #[serde(default)]
    modified_data: Value,
}

#[derive(Debug, Serialize)]
struct CodeGenerationBody<'a> {
    user_request: &'a str,
    preserve_functionality: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    attachment: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct CodeGenerationReply {
    modified_code: String,
    #[serde(default)]
    summary: String,
}

#[derive(Debug, Serialize)]
struct DataGenerationBody<'a> {
    code: &'a str,
    prop_data_type: &'a str,
    user_request: &'a str,
    allow_key_changes: bool,
}

#[derive(Debug, Deserialize)]
struct DataGenerationReply {
    data: Value,
    #[serde(default)]
    summary: String,
}

/// Data returned by the service must be an object (or a JSON string of one)
pub fn data_object(value: Value) -> GatewayResult<Value> {
    match value {
        Value::Object(_) => Ok(value),
        Value::String(text) => match serde_json::from_str::<Value>(&text) {
            Ok(parsed @ Value::Object(_)) => Ok(parsed),
            _ => Err(GatewayError::InvalidResponse(
                "data is not a JSON object".to_string(),
            )),
        },
        _ => Err(GatewayError::InvalidResponse(
            "data is not a JSON object".to_string(),
        )),
    }
}

pub struct HttpGateway {
    client: Client,
    base_url: String,
    session: Arc<dyn SessionStore>,
}

impl HttpGateway {
    pub fn new(
        base_url: impl Into<String>,
        session: Arc<dyn SessionStore>,
        timeout: Duration,
    ) -> GatewayResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url, session))
    }

    pub fn with_client(
        client: Client,
        base_url: impl Into<String>,
        session: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session,
        }
    }

    /// Gateway configured from `livecanvas.config.json`
    pub fn from_config(config: &Config) -> GatewayResult<Self> {
        Self::new(
            config.api_base_url.clone(),
            Arc::new(EnvSessionStore::new(config.token_env.clone())),
            config.request_timeout(),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        build: impl FnOnce(reqwest::RequestBuilder) -> reqwest::RequestBuilder,
    ) -> GatewayResult<T> {
        let token = self.session.token().await?;
        let request = build(self.client.request(method.clone(), self.url(path))).bearer_auth(token);
        let response = request.send().await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            tracing::error!(%method, path, status = status.as_u16(), "service call failed");
            return Err(GatewayError::Status {
                method: method.to_string(),
                path: path.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body)
            .map_err(|err| GatewayError::InvalidResponse(format!("{} {}: {}", method, path, err)))
    }
}

#[async_trait]
impl PersistenceGateway for HttpGateway {
    #[tracing::instrument(skip(self))]
    async fn load_page(&self, page_id: &str) -> GatewayResult<PageRecord> {
        self.call(Method::GET, &format!("/pages/{}", page_id), |r| r)
            .await
    }

    #[tracing::instrument(skip(self, code))]
    async fn save_code(&self, component_id: &str, code: &str) -> GatewayResult<()> {
        let path = format!("/components/{}/code", component_id);
        let reply: SaveCodeResponse = self
            .call(Method::PATCH, &path, |r| r.query(&[("modified_code", code)]))
            .await?;
        if !reply.ok {
            return Err(GatewayError::InvalidResponse(format!(
                "PATCH {}: save rejected",
                path
            )));
        }
        Ok(())
    }

    #[tracing::instrument(skip(self, data))]
    async fn save_data(&self, component_id: &str, data: &Value) -> GatewayResult<Value> {
        let path = format!("/components/{}/data", component_id);
        let encoded = data.to_string();
        let reply: SaveDataResponse = self
            .call(Method::PATCH, &path, |r| {
                r.query(&[("prop_data_type", encoded.as_str())])
            })
            .await?;
        Ok(reply.modified_data)
    }
}

#[async_trait]
impl GenerationService for HttpGateway {
    #[tracing::instrument(skip_all, fields(component_id = %request.component_id))]
    async fn edit_code(&self, request: CodeEditRequest) -> GatewayResult<CodeEditResponse> {
        let path = format!("/components/{}/code", request.component_id);
        let body = CodeGenerationBody {
            user_request: &request.natural_language_request,
            preserve_functionality: request.preserve_functionality,
            attachment: request.attachment.as_deref(),
        };
        let reply: CodeGenerationReply = self
            .call(Method::PUT, &path, |r| r.json(&body))
            .await?;
        Ok(CodeEditResponse {
            modified_source: reply.modified_code,
            summary: reply.summary,
        })
    }

    #[tracing::instrument(skip_all, fields(component_id = %request.component_id))]
    async fn edit_data(&self, request: DataEditRequest) -> GatewayResult<DataEditResponse> {
        let path = format!("/components/{}/data", request.component_id);
        let body = DataGenerationBody {
            code: &request.current_source,
            prop_data_type: &request.current_data_schema,
            user_request: &request.natural_language_request,
            allow_key_changes: request.allow_key_changes,
        };
        let reply: DataGenerationReply = self
            .call(Method::PUT, &path, |r| r.json(&body))
            .await?;
        Ok(DataEditResponse {
            modified_data: data_object(reply.data)?,
            summary: reply.summary,
        })
    }
}
