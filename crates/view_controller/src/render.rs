//! Presentation boundary. The controller hands structured view-models to a
//! [`Renderer`]; drawing them never fails.

use std::time::Duration;

use shared::{
    domain::{PaginationState, ProductDetail, ProductId, ProductSummary},
    protocol::{ProductFields, Statistics},
};

use crate::events::Notice;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiStatus {
    Online,
    Offline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit(ProductId),
}

impl FormMode {
    pub fn editing_id(&self) -> Option<ProductId> {
        match self {
            FormMode::Create => None,
            FormMode::Edit(id) => Some(*id),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SearchResultsView<'a> {
    pub query: &'a str,
    pub total_results: u64,
    pub results: &'a [ProductSummary],
    pub elapsed: Duration,
}

impl SearchResultsView<'_> {
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationView {
    pub label: String,
    pub visible: bool,
    pub prev_enabled: bool,
    pub next_enabled: bool,
}

impl From<&PaginationState> for PaginationView {
    fn from(state: &PaginationState) -> Self {
        Self {
            label: format!(
                "Page {} of {} ({} total)",
                state.page, state.total_pages, state.total_count
            ),
            visible: state.is_paginated(),
            prev_enabled: state.has_prev,
            next_enabled: state.has_next,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BrowseView<'a> {
    pub products: &'a [ProductSummary],
    pub pagination: PaginationView,
}

pub trait Renderer {
    fn set_loading(&mut self, visible: bool);
    fn notify(&mut self, notice: Notice);
    fn render_health(&mut self, status: ApiStatus);
    /// `None` means the statistics could not be loaded.
    fn render_statistics(&mut self, stats: Option<&Statistics>);
    fn render_search_results(&mut self, view: &SearchResultsView<'_>);
    fn clear_search_results(&mut self);
    fn focus_search_input(&mut self);
    fn render_browse(&mut self, view: &BrowseView<'_>);
    fn render_detail(&mut self, product: &ProductDetail);
    fn hide_detail(&mut self);
    fn open_form(&mut self, mode: FormMode);
    fn populate_form(&mut self, fields: &ProductFields);
    /// Hides the edit overlay and resets its fields.
    fn close_form(&mut self);
    /// Blocks until the user accepts or declines.
    fn confirm(&mut self, prompt: &str) -> bool;
}
