use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(raw: &str) -> Result<Self, Self::Err> {
                raw.trim().parse::<i64>().map($name)
            }
        }
    };
}

id_newtype!(ProductId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMethod {
    Exact,
    Semantic,
    #[default]
    Hybrid,
    BiEncoder,
}

impl SearchMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchMethod::Exact => "exact",
            SearchMethod::Semantic => "semantic",
            SearchMethod::Hybrid => "hybrid",
            SearchMethod::BiEncoder => "bi_encoder",
        }
    }
}

impl fmt::Display for SearchMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchMethod {
    type Err = ValidationError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "exact" => Ok(SearchMethod::Exact),
            "semantic" => Ok(SearchMethod::Semantic),
            "hybrid" => Ok(SearchMethod::Hybrid),
            "bi_encoder" | "biencoder" => Ok(SearchMethod::BiEncoder),
            other => Err(ValidationError::UnknownSearchMethod(other.to_string())),
        }
    }
}

/// Product card data as returned by listing and search endpoints.
///
/// The backend fills missing text columns with empty strings, so every text
/// field defaults to `""` rather than failing the whole page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSummary {
    pub id: ProductId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub categories: String,
    #[serde(default)]
    pub manufacturer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingredients: Option<String>,
    /// Relevance in `[0, 1]`; only present on search results.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub summary: ProductSummary,
    #[serde(rename = "manufacturerNumber", default)]
    pub manufacturer_number: String,
}

impl ProductDetail {
    pub fn id(&self) -> ProductId {
        self.summary.id
    }
}

#[derive(Debug, Clone, Deserialize)]
struct PaginationWire {
    page: u32,
    #[serde(default)]
    total_pages: u32,
    #[serde(default)]
    total_count: u64,
}

/// Browse pagination. The prev/next flags are derived from `page` and
/// `total_pages` instead of trusting the server's copies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "PaginationWire")]
pub struct PaginationState {
    pub page: u32,
    pub total_pages: u32,
    pub total_count: u64,
    pub has_prev: bool,
    pub has_next: bool,
}

impl PaginationState {
    pub fn new(page: u32, total_pages: u32, total_count: u64) -> Self {
        let page = page.max(1);
        Self {
            page,
            total_pages,
            total_count,
            has_prev: page > 1,
            has_next: page < total_pages,
        }
    }

    /// A single page needs no pagination control.
    pub fn is_paginated(&self) -> bool {
        self.total_pages > 1
    }
}

impl From<PaginationWire> for PaginationState {
    fn from(wire: PaginationWire) -> Self {
        Self::new(wire.page, wire.total_pages, wire.total_count)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    text: String,
    method: SearchMethod,
    top_k: u32,
}

impl SearchQuery {
    pub fn new(
        text: &str,
        method: SearchMethod,
        top_k: u32,
    ) -> Result<Self, ValidationError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ValidationError::EmptyQuery);
        }
        if top_k == 0 {
            return Err(ValidationError::InvalidTopK);
        }
        Ok(Self {
            text: text.to_string(),
            method,
            top_k,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn method(&self) -> SearchMethod {
        self.method
    }

    pub fn top_k(&self) -> u32 {
        self.top_k
    }
}
