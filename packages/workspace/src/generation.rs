//! Generation service contract.
//!
//! Code mode rewrites the component source; data mode rewrites the data
//! context. The two request shapes never share a response type so a
//! result can only ever land on the side it was asked for.

use crate::error::GatewayResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeEditRequest {
    /// Remote component the request is about
    pub component_id: String,
    pub current_source: String,
    pub natural_language_request: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<String>,
    pub preserve_functionality: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeEditResponse {
    pub modified_source: String,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataEditRequest {
    pub component_id: String,
    pub current_source: String,
    /// Current data context, serialized
    pub current_data_schema: String,
    pub natural_language_request: String,
    pub allow_key_changes: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataEditResponse {
    pub modified_data: Value,
    pub summary: String,
}

#[async_trait]
pub trait GenerationService: Send + Sync {
    async fn edit_code(&self, request: CodeEditRequest) -> GatewayResult<CodeEditResponse>;

    async fn edit_data(&self, request: DataEditRequest) -> GatewayResult<DataEditResponse>;
}
