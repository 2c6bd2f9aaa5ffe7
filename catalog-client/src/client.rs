//! REST client for the catalog BFF.
//!
//! Every successful response is a `{ "data": ... }` envelope; failures carry
//! `{ "error": { "code", "message" } }`. Both are decoded here so callers only
//! ever see `Result<T, ClientError>`.

use async_trait::async_trait;
use catalog_core::config::ApiConfig;
use catalog_core::filter::FilterOptionsCatalog;
use catalog_core::query::{PARAM_SOURCE, PARAM_SOURCE_LABEL, QueryParams};
use catalog_core::types::{
    CatalogModelList, CatalogSourceConfig, CatalogSourceConfigList, CatalogSourceConfigPatch,
    CatalogSourceList, McpServerList,
};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

use crate::error::{ClientError, Result};

/// Catalog operations used by front ends. Implemented by [`CatalogClient`]
/// and by in-memory fakes in tests.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    /// List models. The params must scope the request to a source or a
    /// source label.
    async fn list_models(&self, params: &QueryParams) -> Result<CatalogModelList>;

    /// Filter domains for the model list, optionally for one source.
    async fn filter_options(&self, source: Option<&str>) -> Result<FilterOptionsCatalog>;

    async fn list_sources(&self) -> Result<CatalogSourceList>;

    async fn list_source_configs(&self) -> Result<CatalogSourceConfigList>;

    async fn get_source_config(&self, id: &str) -> Result<CatalogSourceConfig>;

    async fn create_source_config(&self, config: &CatalogSourceConfig) -> Result<CatalogSourceConfig>;

    async fn update_source_config(
        &self,
        id: &str,
        patch: &CatalogSourceConfigPatch,
    ) -> Result<CatalogSourceConfig>;

    async fn delete_source_config(&self, id: &str) -> Result<()>;

    async fn list_mcp_servers(&self, params: &QueryParams) -> Result<McpServerList>;

    async fn mcp_filter_options(&self) -> Result<FilterOptionsCatalog>;
}

#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: String,
    message: String,
}

/// Decode a `{ "data": T }` body.
pub fn decode_envelope<T: DeserializeOwned>(body: &str) -> Result<T> {
    serde_json::from_str::<Envelope<T>>(body)
        .map(|envelope| envelope.data)
        .map_err(|e| ClientError::decode(e.to_string()))
}

/// Build the error for a non-2xx response, preferring the BFF error message.
pub fn api_error(status: u16, body: &str) -> ClientError {
    let message = match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) if envelope.error.code.is_empty() => envelope.error.message,
        Ok(envelope) => format!("{} ({})", envelope.error.message, envelope.error.code),
        Err(_) if body.trim().is_empty() => format!("HTTP {status}"),
        Err(_) => body.trim().to_string(),
    };
    ClientError::Api { status, message }
}

/// HTTP client for the catalog BFF.
#[derive(Clone)]
pub struct CatalogClient {
    http: reqwest::Client,
    base_url: Url,
    token: Option<String>,
}

impl std::fmt::Debug for CatalogClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogClient")
            .field("base_url", &self.base_url.as_str())
            .field("authenticated", &self.token.is_some())
            .finish()
    }
}

impl CatalogClient {
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> Result<Self> {
        let invalid = |message: String| ClientError::InvalidBaseUrl {
            url: base_url.to_string(),
            message,
        };
        let parsed = Url::parse(base_url).map_err(|e| invalid(e.to_string()))?;
        if parsed.cannot_be_a_base() || !matches!(parsed.scheme(), "http" | "https") {
            return Err(invalid("expected an http(s) URL".to_string()));
        }

        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: parsed,
            token,
        })
    }

    /// Client for the configured BFF, reading the token from `token_env`.
    pub fn from_config(api: &ApiConfig) -> Result<Self> {
        Self::new(
            &api.base_url,
            api.token(),
            Duration::from_secs(api.timeout_secs),
        )
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `{base}/<segments...>?<params>`. Segments are percent-encoded.
    pub fn endpoint(&self, segments: &[&str], params: Option<&QueryParams>) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ClientError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                message: "cannot be a base".to_string(),
            })?
            .pop_if_empty()
            .extend(segments);
        if let Some(params) = params.filter(|p| !p.is_empty()) {
            url.query_pairs_mut().extend_pairs(params.iter());
        }
        Ok(url)
    }

    fn request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        tracing::info!(%method, %url, "Catalog request");
        let builder = self.http.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, builder: reqwest::RequestBuilder) -> Result<String> {
        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;
        tracing::debug!(status = status.as_u16(), bytes = body.len(), "Catalog response");
        if !status.is_success() {
            let err = api_error(status.as_u16(), &body);
            tracing::warn!(error = %err, "Catalog request failed");
            return Err(err);
        }
        Ok(body)
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        let body = self.send(self.request(reqwest::Method::GET, url)).await?;
        decode_envelope(&body)
    }
}

#[async_trait]
impl CatalogApi for CatalogClient {
    async fn list_models(&self, params: &QueryParams) -> Result<CatalogModelList> {
        if !params.contains(PARAM_SOURCE) && !params.contains(PARAM_SOURCE_LABEL) {
            return Err(ClientError::NotReady {
                what: "source or source label",
            });
        }
        self.get(self.endpoint(&["models"], Some(params))?).await
    }

    async fn filter_options(&self, source: Option<&str>) -> Result<FilterOptionsCatalog> {
        let mut params = QueryParams::new();
        if let Some(source) = source {
            params.insert(PARAM_SOURCE, source);
        }
        self.get(self.endpoint(&["models", "filter_options"], Some(&params))?)
            .await
    }

    async fn list_sources(&self) -> Result<CatalogSourceList> {
        self.get(self.endpoint(&["sources"], None)?).await
    }

    async fn list_source_configs(&self) -> Result<CatalogSourceConfigList> {
        self.get(self.endpoint(&["source_configs"], None)?).await
    }

    async fn get_source_config(&self, id: &str) -> Result<CatalogSourceConfig> {
        if id.is_empty() {
            return Err(ClientError::NotReady { what: "source id" });
        }
        self.get(self.endpoint(&["source_configs", id], None)?).await
    }

    async fn create_source_config(&self, config: &CatalogSourceConfig) -> Result<CatalogSourceConfig> {
        let url = self.endpoint(&["source_configs"], None)?;
        let body = self
            .send(
                self.request(reqwest::Method::POST, url)
                    .json(&serde_json::json!({ "data": config })),
            )
            .await?;
        decode_envelope(&body)
    }

    async fn update_source_config(
        &self,
        id: &str,
        patch: &CatalogSourceConfigPatch,
    ) -> Result<CatalogSourceConfig> {
        if id.is_empty() {
            return Err(ClientError::NotReady { what: "source id" });
        }
        let url = self.endpoint(&["source_configs", id], None)?;
        let body = self
            .send(
                self.request(reqwest::Method::PATCH, url)
                    .json(&serde_json::json!({ "data": patch })),
            )
            .await?;
        decode_envelope(&body)
    }

    async fn delete_source_config(&self, id: &str) -> Result<()> {
        if id.is_empty() {
            return Err(ClientError::NotReady { what: "source id" });
        }
        let url = self.endpoint(&["source_configs", id], None)?;
        self.send(self.request(reqwest::Method::DELETE, url)).await?;
        Ok(())
    }

    async fn list_mcp_servers(&self, params: &QueryParams) -> Result<McpServerList> {
        self.get(self.endpoint(&["mcp_servers"], Some(params))?).await
    }

    async fn mcp_filter_options(&self) -> Result<FilterOptionsCatalog> {
        self.get(self.endpoint(&["mcp_servers", "filter_options"], None)?)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn client() -> CatalogClient {
        CatalogClient::new(
            "http://localhost:4000/api/v1/model_catalog",
            None,
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn test_endpoint_appends_segments() {
        let url = client().endpoint(&["models", "filter_options"], None).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:4000/api/v1/model_catalog/models/filter_options"
        );
    }

    #[test]
    fn test_endpoint_with_trailing_slash_base() {
        let client =
            CatalogClient::new("http://bff/api/v1/model_catalog/", None, Duration::from_secs(5))
                .unwrap();
        let url = client.endpoint(&["sources"], None).unwrap();
        assert_eq!(url.as_str(), "http://bff/api/v1/model_catalog/sources");
    }

    #[test]
    fn test_endpoint_escapes_ids_and_params() {
        let mut params = QueryParams::new();
        params.insert("provider", "Red Hat");
        params.insert("max_latency", "300");
        let url = client()
            .endpoint(&["source_configs", "my source/1"], Some(&params))
            .unwrap();
        assert_eq!(url.path(), "/api/v1/model_catalog/source_configs/my%20source%2F1");
        assert_eq!(url.query(), Some("max_latency=300&provider=Red+Hat"));
    }

    #[test]
    fn test_empty_params_leave_no_query() {
        let url = client()
            .endpoint(&["mcp_servers"], Some(&QueryParams::new()))
            .unwrap();
        assert_eq!(url.query(), None);
    }

    #[test]
    fn test_invalid_base_url() {
        let err = CatalogClient::new("not a url", None, Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, ClientError::InvalidBaseUrl { .. }));
        let err = CatalogClient::new("mailto:ops@example.com", None, Duration::from_secs(1))
            .unwrap_err();
        assert!(matches!(err, ClientError::InvalidBaseUrl { .. }));
    }

    #[test]
    fn test_decode_envelope() {
        let list: CatalogSourceList =
            decode_envelope(r#"{"data": {"items": [{"id": "hf", "name": "Hugging Face"}], "size": 1}}"#)
                .unwrap();
        assert_eq!(list.items[0].id, "hf");
    }

    #[test]
    fn test_bare_body_is_decode_error() {
        let err = decode_envelope::<CatalogSourceList>(r#"{"items": []}"#).unwrap_err();
        assert!(matches!(err, ClientError::Decode { .. }));
        let err = decode_envelope::<CatalogSourceList>("<html>").unwrap_err();
        assert!(matches!(err, ClientError::Decode { .. }));
    }

    #[test]
    fn test_api_error_prefers_bff_message() {
        let err = api_error(
            404,
            r#"{"error": {"code": "404", "message": "catalog source not found"}}"#,
        );
        assert_eq!(err.to_string(), "API error (404): catalog source not found (404)");

        let err = api_error(502, "");
        assert_eq!(err.to_string(), "API error (502): HTTP 502");

        let err = api_error(500, "upstream exploded\n");
        assert_eq!(err.to_string(), "API error (500): upstream exploded");
    }

    #[tokio::test]
    async fn test_list_models_requires_scope() {
        let err = client().list_models(&QueryParams::new()).await.unwrap_err();
        assert!(matches!(err, ClientError::NotReady { .. }));
    }

    #[tokio::test]
    async fn test_empty_id_is_not_ready() {
        let err = client().delete_source_config("").await.unwrap_err();
        assert!(matches!(err, ClientError::NotReady { what: "source id" }));
    }
}
