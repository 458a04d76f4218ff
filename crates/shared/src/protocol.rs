use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    domain::{PaginationState, ProductDetail, ProductId, ProductSummary, SearchMethod},
    error::ValidationError,
};

/// Body of `POST /api/search`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    pub method: SearchMethod,
    pub top_k: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<ProductSummary>,
    #[serde(default)]
    pub total_results: u64,
    #[serde(default)]
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<SearchMethod>,
}

/// Query string of `GET /api/products`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductListQuery {
    pub page: u32,
    pub limit: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProductPage {
    #[serde(default)]
    pub products: Vec<ProductSummary>,
    pub pagination: PaginationState,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProductResponse {
    pub product: ProductDetail,
}

/// Editable product columns; body of create and update calls.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductFields {
    pub name: String,
    pub brand: String,
    #[serde(default)]
    pub ingredients: String,
    #[serde(default)]
    pub categories: String,
    #[serde(default)]
    pub manufacturer: String,
    #[serde(rename = "manufacturerNumber", default)]
    pub manufacturer_number: String,
}

impl ProductFields {
    /// Trims every column and requires a name and a brand.
    pub fn normalized(&self) -> Result<Self, ValidationError> {
        let fields = Self {
            name: self.name.trim().to_string(),
            brand: self.brand.trim().to_string(),
            ingredients: self.ingredients.trim().to_string(),
            categories: self.categories.trim().to_string(),
            manufacturer: self.manufacturer.trim().to_string(),
            manufacturer_number: self.manufacturer_number.trim().to_string(),
        };
        if fields.name.is_empty() || fields.brand.is_empty() {
            return Err(ValidationError::MissingRequiredFields);
        }
        Ok(fields)
    }
}

impl From<&ProductDetail> for ProductFields {
    fn from(detail: &ProductDetail) -> Self {
        Self {
            name: detail.summary.name.clone(),
            brand: detail.summary.brand.clone(),
            ingredients: detail.summary.ingredients.clone().unwrap_or_default(),
            categories: detail.summary.categories.clone(),
            manufacturer: detail.summary.manufacturer.clone(),
            manufacturer_number: detail.manufacturer_number.clone(),
        }
    }
}

/// Payload of create/update/delete responses.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MutationResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<ProductId>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Statistics {
    #[serde(default)]
    pub total_products: u64,
    #[serde(default)]
    pub total_vectors: Option<u64>,
    #[serde(default)]
    pub vector_dimension: Option<u64>,
    #[serde(default)]
    pub top_brands: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StatisticsResponse {
    pub statistics: Statistics,
}

/// `GET /api/health` is the one endpoint without a `success` envelope.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl HealthResponse {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

/// Error body shape shared by every endpoint.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ErrorEnvelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
}

impl ErrorEnvelope {
    /// Folds `details` into the error text, e.g. `Validation failed: name is required`.
    pub fn message(&self) -> Option<String> {
        let error = self.error.as_deref()?.trim();
        if self.details.is_empty() {
            return Some(error.to_string());
        }
        Some(format!("{error}: {}", self.details.join("; ")))
    }
}
