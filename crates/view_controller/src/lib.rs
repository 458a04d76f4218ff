//! Search-and-browse view controller for the product catalog.
//!
//! One [`ViewController`] owns the page state for a session: the current
//! search results, the browse page and its filter text, the detail overlay
//! and the edit form. Every backend failure is turned into a notice on the
//! [`Renderer`] and reported back as a [`UiError`]; nothing here retries.

use std::{sync::Arc, time::Duration};

use client_core::CatalogApi;
use shared::{
    domain::{PaginationState, ProductDetail, ProductId, ProductSummary, SearchMethod, SearchQuery},
    error::ValidationError,
    protocol::{ProductFields, ProductListQuery, Statistics},
};
use tokio::time::Instant;
use tracing::{debug, info, warn};

pub mod debounce;
pub mod events;
pub mod render;

use debounce::Debouncer;
use events::{Notice, UiError, UiErrorContext};
use render::{ApiStatus, BrowseView, FormMode, PaginationView, Renderer, SearchResultsView};

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const DEFAULT_FILTER_DEBOUNCE: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerOptions {
    pub page_size: u32,
    pub filter_debounce: Duration,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            filter_debounce: DEFAULT_FILTER_DEBOUNCE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    Idle,
    Searching,
    ShowingSearchResults,
    BrowseLoading,
    ShowingBrowse,
    ErrorIdle,
    ShowingDetail,
}

/// What to show in the detail overlay.
#[derive(Debug, Clone)]
pub enum DetailTarget {
    Loaded(ProductDetail),
    ById(ProductId),
}

impl From<ProductDetail> for DetailTarget {
    fn from(detail: ProductDetail) -> Self {
        DetailTarget::Loaded(detail)
    }
}

impl From<ProductId> for DetailTarget {
    fn from(id: ProductId) -> Self {
        DetailTarget::ById(id)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletedSearch {
    pub query: String,
    pub total_results: u64,
    pub elapsed: Duration,
}

pub struct ViewController<R: Renderer> {
    api: Arc<dyn CatalogApi>,
    renderer: R,
    options: ControllerOptions,
    mode: ViewMode,
    current_page: u32,
    filter_text: String,
    filter_debounce: Debouncer<String>,
    search_results: Vec<ProductSummary>,
    last_search: Option<CompletedSearch>,
    products: Vec<ProductSummary>,
    pagination: Option<PaginationState>,
    detail: Option<ProductDetail>,
    form: Option<FormMode>,
    statistics: Option<Statistics>,
    api_status: Option<ApiStatus>,
}

impl<R: Renderer> ViewController<R> {
    pub fn new(api: Arc<dyn CatalogApi>, renderer: R, options: ControllerOptions) -> Self {
        Self {
            api,
            renderer,
            options,
            mode: ViewMode::Idle,
            current_page: 1,
            filter_text: String::new(),
            filter_debounce: Debouncer::new(options.filter_debounce),
            search_results: Vec::new(),
            last_search: None,
            products: Vec::new(),
            pagination: None,
            detail: None,
            form: None,
            statistics: None,
            api_status: None,
        }
    }

    /// The visible mode; the detail overlay masks the mode underneath it.
    pub fn view_mode(&self) -> ViewMode {
        if self.detail.is_some() {
            ViewMode::ShowingDetail
        } else {
            self.mode
        }
    }

    pub fn underlying_mode(&self) -> ViewMode {
        self.mode
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn filter_text(&self) -> &str {
        &self.filter_text
    }

    pub fn search_results(&self) -> &[ProductSummary] {
        &self.search_results
    }

    pub fn last_search(&self) -> Option<&CompletedSearch> {
        self.last_search.as_ref()
    }

    pub fn products(&self) -> &[ProductSummary] {
        &self.products
    }

    pub fn pagination(&self) -> Option<&PaginationState> {
        self.pagination.as_ref()
    }

    pub fn detail(&self) -> Option<&ProductDetail> {
        self.detail.as_ref()
    }

    pub fn form_mode(&self) -> Option<FormMode> {
        self.form
    }

    pub fn editing_id(&self) -> Option<ProductId> {
        self.form.and_then(|mode| mode.editing_id())
    }

    pub fn statistics(&self) -> Option<&Statistics> {
        self.statistics.as_ref()
    }

    pub fn api_status(&self) -> Option<ApiStatus> {
        self.api_status
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    /// Startup sequence: health indicator, statistics, then a greeting.
    pub async fn initialize(&mut self) {
        self.check_health().await;
        let _ = self.refresh_statistics().await;
        self.renderer
            .notify(Notice::success("Application initialized successfully!"));
    }

    pub async fn check_health(&mut self) -> ApiStatus {
        let status = match self.api.health().await {
            Ok(health) if health.is_healthy() => ApiStatus::Online,
            Ok(health) => {
                warn!(status = %health.status, "catalog api reported unhealthy status");
                ApiStatus::Offline
            }
            Err(err) => {
                warn!(error = %err, "catalog api health check failed");
                ApiStatus::Offline
            }
        };
        self.api_status = Some(status);
        self.renderer.render_health(status);
        status
    }

    pub async fn refresh_statistics(&mut self) -> Result<(), UiError> {
        match self.api.stats().await {
            Ok(stats) => {
                self.renderer.render_statistics(Some(&stats));
                self.statistics = Some(stats);
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "failed to load catalog statistics");
                self.statistics = None;
                self.renderer.render_statistics(None);
                Err(UiError::from_client_error(UiErrorContext::Statistics, &err))
            }
        }
    }

    pub async fn submit_search(
        &mut self,
        text: &str,
        method: SearchMethod,
        top_k: u32,
    ) -> Result<(), UiError> {
        let query = match SearchQuery::new(text, method, top_k) {
            Ok(query) => query,
            Err(err) => {
                self.renderer.focus_search_input();
                return Err(self.reject(UiErrorContext::Search, &err));
            }
        };

        self.mode = ViewMode::Searching;
        self.renderer.set_loading(true);
        let started = Instant::now();
        let result = self.api.search(&query).await;
        self.renderer.set_loading(false);

        match result {
            Ok(response) => {
                let elapsed = started.elapsed();
                info!(
                    query = query.text(),
                    method = %query.method(),
                    results = response.results.len(),
                    ?elapsed,
                    "search completed"
                );
                self.search_results = response.results;
                let completed = CompletedSearch {
                    query: if response.query.is_empty() {
                        query.text().to_string()
                    } else {
                        response.query
                    },
                    total_results: response.total_results,
                    elapsed,
                };
                self.renderer.render_search_results(&SearchResultsView {
                    query: &completed.query,
                    total_results: completed.total_results,
                    results: &self.search_results,
                    elapsed,
                });
                self.last_search = Some(completed);
                self.mode = ViewMode::ShowingSearchResults;
                self.renderer.notify(Notice::info(format!(
                    "Found {} results",
                    self.search_results.len()
                )));
                Ok(())
            }
            Err(err) => {
                self.search_results.clear();
                self.last_search = None;
                self.mode = ViewMode::ErrorIdle;
                self.renderer.clear_search_results();
                Err(self.surface(UiErrorContext::Search, &err))
            }
        }
    }

    /// Drops the current result set, e.g. once the search input is emptied.
    pub fn clear_search_results(&mut self) {
        self.search_results.clear();
        self.last_search = None;
        if matches!(
            self.mode,
            ViewMode::ShowingSearchResults | ViewMode::ErrorIdle
        ) {
            self.mode = ViewMode::Idle;
        }
        self.renderer.clear_search_results();
        debug!("search results cleared");
    }

    /// Fetches one browse page. Only `page >= 1` is checked here; the server
    /// clamps anything past the last page.
    pub async fn load_browse_page(&mut self, page: u32, filter_text: &str) -> Result<(), UiError> {
        if page < 1 {
            return Err(self.reject(
                UiErrorContext::Browse,
                &ValidationError::PageOutOfRange(i64::from(page)),
            ));
        }
        self.fetch_browse_page(page, filter_text).await
    }

    async fn fetch_browse_page(&mut self, page: u32, filter_text: &str) -> Result<(), UiError> {
        let filter = filter_text.trim();
        let query = ProductListQuery {
            page,
            limit: self.options.page_size,
            search: (!filter.is_empty()).then(|| filter.to_string()),
        };

        let prior_mode = self.mode;
        self.mode = ViewMode::BrowseLoading;
        self.renderer.set_loading(true);
        let result = self.api.list_products(&query).await;
        self.renderer.set_loading(false);

        match result {
            Ok(product_page) => {
                info!(
                    page,
                    filter = filter,
                    products = product_page.products.len(),
                    total_pages = product_page.pagination.total_pages,
                    "browse page loaded"
                );
                self.products = product_page.products;
                self.pagination = Some(product_page.pagination);
                self.current_page = page;
                self.mode = ViewMode::ShowingBrowse;
                self.renderer.render_browse(&BrowseView {
                    products: &self.products,
                    pagination: PaginationView::from(&product_page.pagination),
                });
                self.renderer.notify(Notice::success(format!(
                    "Loaded {} products",
                    self.products.len()
                )));
                Ok(())
            }
            Err(err) => {
                self.mode = prior_mode;
                Err(self.surface(UiErrorContext::Browse, &err))
            }
        }
    }

    /// Records the filter text and (re)arms the debounce window.
    pub fn on_filter_input(&mut self, text: &str) {
        self.filter_text = text.to_string();
        let deadline = self
            .filter_debounce
            .schedule(text.trim().to_string(), Instant::now());
        debug!(filter = text, ?deadline, "filter input scheduled");
    }

    pub fn filter_deadline(&self) -> Option<Instant> {
        self.filter_debounce.deadline()
    }

    /// Runs the debounced browse load if its window has elapsed by `now`.
    pub async fn flush_due_filter(&mut self, now: Instant) -> Option<Result<(), UiError>> {
        let text = self.filter_debounce.take_due(now)?;
        Some(self.load_browse_page(1, &text).await)
    }

    /// Sleeps until the pending filter is due, then runs it.
    pub async fn run_pending_filter(&mut self) -> Option<Result<(), UiError>> {
        let deadline = self.filter_debounce.deadline()?;
        tokio::time::sleep_until(deadline).await;
        self.flush_due_filter(Instant::now()).await
    }

    /// Moves `delta` pages from the current one. No bounds check: the request
    /// is sent even for pages before the first, and the server clamps it.
    pub async fn change_page(&mut self, delta: i64) -> Result<(), UiError> {
        let requested = i64::from(self.current_page).saturating_add(delta);
        let page = u32::try_from(requested.max(0)).unwrap_or(u32::MAX);
        let filter = self.filter_text.clone();
        self.fetch_browse_page(page, &filter).await
    }

    pub async fn open_detail(&mut self, target: impl Into<DetailTarget>) -> Result<(), UiError> {
        let detail = match target.into() {
            DetailTarget::Loaded(detail) => detail,
            DetailTarget::ById(id) => {
                self.renderer.set_loading(true);
                let result = self.api.get_product(id).await;
                self.renderer.set_loading(false);
                match result {
                    Ok(detail) => detail,
                    Err(err) => return Err(self.surface(UiErrorContext::Detail, &err)),
                }
            }
        };

        debug!(product_id = %detail.id(), "opening product detail");
        self.renderer.render_detail(&detail);
        self.detail = Some(detail);
        Ok(())
    }

    /// Returns `false` when no overlay was open.
    pub fn close_detail(&mut self) -> bool {
        if self.detail.take().is_none() {
            return false;
        }
        self.renderer.hide_detail();
        true
    }

    pub fn open_create_form(&mut self) {
        self.form = Some(FormMode::Create);
        self.renderer.open_form(FormMode::Create);
    }

    /// Opens the form in edit mode and fills it from the server copy. The
    /// form stays open (empty) when the product cannot be loaded.
    pub async fn open_edit_form(&mut self, id: ProductId) -> Result<(), UiError> {
        let mode = FormMode::Edit(id);
        self.form = Some(mode);
        self.renderer.open_form(mode);

        self.renderer.set_loading(true);
        let result = self.api.get_product(id).await;
        self.renderer.set_loading(false);

        match result {
            Ok(detail) => {
                self.renderer.populate_form(&ProductFields::from(&detail));
                Ok(())
            }
            Err(err) => Err(self.surface(UiErrorContext::LoadProduct, &err)),
        }
    }

    pub fn close_form(&mut self) {
        if self.form.take().is_some() {
            self.renderer.close_form();
        }
    }

    /// Creates (`editing_id == None`) or updates a product, then reloads the
    /// current browse page and the statistics.
    pub async fn submit_product_form(
        &mut self,
        form: &ProductFields,
        editing_id: Option<ProductId>,
    ) -> Result<(), UiError> {
        let fields = match form.normalized() {
            Ok(fields) => fields,
            Err(err) => return Err(self.reject(UiErrorContext::SaveProduct, &err)),
        };

        self.renderer.set_loading(true);
        let result = match editing_id {
            Some(id) => self.api.update_product(id, &fields).await,
            None => self.api.create_product(&fields).await,
        };
        self.renderer.set_loading(false);

        if let Err(err) = result {
            return Err(self.surface(UiErrorContext::SaveProduct, &err));
        }

        let action = if editing_id.is_some() { "updated" } else { "added" };
        info!(?editing_id, name = %fields.name, "product {}", action);
        self.renderer
            .notify(Notice::success(format!("Product {action} successfully!")));
        self.form = None;
        self.renderer.close_form();

        self.reload_after_mutation().await;
        Ok(())
    }

    /// Asks for confirmation first; `Ok(false)` means the user declined and
    /// nothing was sent.
    pub async fn delete_product(&mut self, id: ProductId, name: &str) -> Result<bool, UiError> {
        let prompt = format!(
            "Are you sure you want to delete \"{name}\"?\n\nThis action cannot be undone."
        );
        if !self.renderer.confirm(&prompt) {
            debug!(product_id = %id, "delete cancelled by user");
            return Ok(false);
        }

        self.renderer.set_loading(true);
        let result = self.api.delete_product(id).await;
        self.renderer.set_loading(false);

        if let Err(err) = result {
            return Err(self.surface(UiErrorContext::DeleteProduct, &err));
        }

        info!(product_id = %id, "product deleted");
        self.renderer
            .notify(Notice::success("Product deleted successfully!"));
        if self.detail.as_ref().is_some_and(|detail| detail.id() == id) {
            self.close_detail();
        }

        self.reload_after_mutation().await;
        Ok(true)
    }

    async fn reload_after_mutation(&mut self) {
        let filter = self.filter_text.clone();
        let _ = self.fetch_browse_page(self.current_page, &filter).await;
        let _ = self.refresh_statistics().await;
    }

    fn reject(&mut self, context: UiErrorContext, err: &ValidationError) -> UiError {
        let ui_error = UiError::validation(context, err);
        debug!(?context, error = %err, "rejected invalid input");
        self.renderer.notify(ui_error.notice());
        ui_error
    }

    fn surface(&mut self, context: UiErrorContext, err: &client_core::ClientError) -> UiError {
        let ui_error = UiError::from_client_error(context, err);
        warn!(?context, error = %err, "catalog request failed");
        self.renderer.notify(ui_error.notice());
        ui_error
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
