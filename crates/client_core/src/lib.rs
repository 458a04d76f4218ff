//! HTTP client for the product catalog REST API.
//!
//! Every endpoint except health answers with a `{success, ...payload}`
//! envelope. Non-2xx statuses and `success: false` bodies both surface as
//! [`ClientError::Api`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use shared::{
    domain::{ProductDetail, ProductId, SearchQuery},
    error::ApiError,
    protocol::{
        ErrorEnvelope, HealthResponse, MutationResponse, ProductFields, ProductListQuery,
        ProductPage, ProductResponse, SearchRequest, SearchResponse, Statistics,
        StatisticsResponse,
    },
};
use tracing::{debug, warn};
use url::Url;

pub mod error;
pub use error::{ClientError, ClientResult};

const HEALTH_PATH: &str = "api/health";
const STATS_PATH: &str = "api/stats";
const SEARCH_PATH: &str = "api/search";
const PRODUCTS_PATH: &str = "api/products";

#[async_trait]
pub trait CatalogApi: Send + Sync {
    async fn health(&self) -> ClientResult<HealthResponse>;
    async fn stats(&self) -> ClientResult<Statistics>;
    async fn search(&self, query: &SearchQuery) -> ClientResult<SearchResponse>;
    async fn list_products(&self, query: &ProductListQuery) -> ClientResult<ProductPage>;
    async fn get_product(&self, id: ProductId) -> ClientResult<ProductDetail>;
    async fn create_product(&self, fields: &ProductFields) -> ClientResult<MutationResponse>;
    async fn update_product(
        &self,
        id: ProductId,
        fields: &ProductFields,
    ) -> ClientResult<MutationResponse>;
    async fn delete_product(&self, id: ProductId) -> ClientResult<MutationResponse>;
}

pub struct HttpCatalogApi {
    http: Client,
    base_url: Url,
}

impl HttpCatalogApi {
    pub fn new(base_url: &str) -> ClientResult<Self> {
        Self::with_timeout(base_url, None)
    }

    /// `timeout` bounds each whole request; `None` waits indefinitely.
    pub fn with_timeout(base_url: &str, timeout: Option<Duration>) -> ClientResult<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            base_url: normalize_base_url(base_url)?,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> ClientResult<Url> {
        Ok(self.base_url.join(path)?)
    }

    fn product_endpoint(&self, id: ProductId) -> ClientResult<Url> {
        self.endpoint(&format!("{PRODUCTS_PATH}/{id}"))
    }

    async fn send(&self, request: RequestBuilder) -> ClientResult<Value> {
        let request = request.build()?;
        debug!(method = %request.method(), url = %request.url(), "catalog api request");
        let response = self.http.execute(request).await?;
        read_body(response).await
    }

    async fn send_enveloped<T: DeserializeOwned>(&self, request: RequestBuilder) -> ClientResult<T> {
        let body = self.send(request).await?;
        decode_envelope(body)
    }
}

#[async_trait]
impl CatalogApi for HttpCatalogApi {
    async fn health(&self) -> ClientResult<HealthResponse> {
        let body = self.send(self.http.get(self.endpoint(HEALTH_PATH)?)).await?;
        Ok(serde_json::from_value(body)?)
    }

    async fn stats(&self) -> ClientResult<Statistics> {
        let response: StatisticsResponse = self
            .send_enveloped(self.http.get(self.endpoint(STATS_PATH)?))
            .await?;
        Ok(response.statistics)
    }

    async fn search(&self, query: &SearchQuery) -> ClientResult<SearchResponse> {
        let body = SearchRequest {
            query: query.text().to_string(),
            method: query.method(),
            top_k: query.top_k(),
        };
        self.send_enveloped(self.http.post(self.endpoint(SEARCH_PATH)?).json(&body))
            .await
    }

    async fn list_products(&self, query: &ProductListQuery) -> ClientResult<ProductPage> {
        self.send_enveloped(self.http.get(self.endpoint(PRODUCTS_PATH)?).query(query))
            .await
    }

    async fn get_product(&self, id: ProductId) -> ClientResult<ProductDetail> {
        let response: ProductResponse = self
            .send_enveloped(self.http.get(self.product_endpoint(id)?))
            .await?;
        Ok(response.product)
    }

    async fn create_product(&self, fields: &ProductFields) -> ClientResult<MutationResponse> {
        self.send_enveloped(self.http.post(self.endpoint(PRODUCTS_PATH)?).json(fields))
            .await
    }

    async fn update_product(
        &self,
        id: ProductId,
        fields: &ProductFields,
    ) -> ClientResult<MutationResponse> {
        self.send_enveloped(self.http.put(self.product_endpoint(id)?).json(fields))
            .await
    }

    async fn delete_product(&self, id: ProductId) -> ClientResult<MutationResponse> {
        self.send_enveloped(self.http.delete(self.product_endpoint(id)?))
            .await
    }
}

/// Parses the configured API root and makes sure relative endpoint paths are
/// joined beneath it rather than replacing its last segment.
pub fn normalize_base_url(raw: &str) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(raw.trim())?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

async fn read_body(response: Response) -> ClientResult<Value> {
    let status = response.status();
    let bytes = response.bytes().await?;

    if !status.is_success() {
        let message = serde_json::from_slice::<ErrorEnvelope>(&bytes)
            .ok()
            .and_then(|envelope| envelope.message());
        warn!(status = status.as_u16(), "catalog api returned error status");
        return Err(ApiError::from_status(status.as_u16(), message).into());
    }

    Ok(serde_json::from_slice(&bytes)?)
}

fn decode_envelope<T: DeserializeOwned>(body: Value) -> ClientResult<T> {
    let success = body
        .get("success")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    if !success {
        let envelope: ErrorEnvelope = serde_json::from_value(body).unwrap_or_default();
        return Err(ApiError::rejected(envelope.message()).into());
    }
    Ok(serde_json::from_value(body)?)
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
