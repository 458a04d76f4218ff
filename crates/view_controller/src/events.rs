//! User-facing notices and error classification for controller actions.

use client_core::ClientError;
use shared::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A transient message for the user ("toast").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Info, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Success, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Error, message)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    Validation,
    Api,
    Transport,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    Search,
    Browse,
    Detail,
    LoadProduct,
    SaveProduct,
    DeleteProduct,
    Statistics,
}

impl UiErrorContext {
    fn failure_prefix(self) -> &'static str {
        match self {
            UiErrorContext::Search => "Search failed",
            UiErrorContext::Browse => "Failed to load products",
            UiErrorContext::Detail => "Failed to load product details",
            UiErrorContext::LoadProduct => "Failed to load product data",
            UiErrorContext::SaveProduct => "Failed to save product",
            UiErrorContext::DeleteProduct => "Failed to delete product",
            UiErrorContext::Statistics => "Failed to load statistics",
        }
    }
}

pub fn classify_transport_failure(err: &ClientError) -> String {
    if err.is_timeout() {
        "Request timed out; check the server and retry.".to_string()
    } else if err.is_connect() {
        "Server unreachable; check the API URL and retry.".to_string()
    } else {
        format!("Network error: {err}")
    }
}

/// A failed controller action. By the time callers see one, the matching
/// notice has already been handed to the renderer.
#[derive(Debug, Clone)]
pub struct UiError {
    category: UiErrorCategory,
    context: UiErrorContext,
    message: String,
}

impl UiError {
    pub fn validation(context: UiErrorContext, err: &ValidationError) -> Self {
        Self {
            category: UiErrorCategory::Validation,
            context,
            message: err.to_string(),
        }
    }

    pub fn from_client_error(context: UiErrorContext, err: &ClientError) -> Self {
        let (category, message) = match err {
            ClientError::Transport(_) => {
                (UiErrorCategory::Transport, classify_transport_failure(err))
            }
            ClientError::Api(api) => (UiErrorCategory::Api, api.message.clone()),
            ClientError::Decode(decode) => (
                UiErrorCategory::Api,
                format!("Unexpected response from server: {decode}"),
            ),
            ClientError::InvalidUrl(url) => {
                (UiErrorCategory::Validation, format!("Invalid API url: {url}"))
            }
        };
        Self {
            category,
            context,
            message,
        }
    }

    pub fn category(&self) -> UiErrorCategory {
        self.category
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Validation problems are shown as-is; failed calls get a context prefix.
    pub fn notice(&self) -> Notice {
        match self.category {
            UiErrorCategory::Validation => Notice::warning(self.message.clone()),
            UiErrorCategory::Api | UiErrorCategory::Transport => Notice::error(format!(
                "{}: {}",
                self.context.failure_prefix(),
                self.message
            )),
        }
    }
}
