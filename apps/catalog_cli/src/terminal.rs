//! Line-oriented [`Renderer`] for the interactive shell and one-shot commands.

use std::{
    fmt::Display,
    io::{self, BufRead, Write},
};

use chrono::Local;
use shared::{
    domain::{ProductDetail, ProductSummary},
    protocol::{ProductFields, Statistics},
};
use tracing::debug;
use view_controller::{
    events::{Notice, NoticeLevel},
    render::{ApiStatus, BrowseView, FormMode, Renderer, SearchResultsView},
};

const INGREDIENTS_PREVIEW_CHARS: usize = 100;

/// Where confirmation answers come from.
pub trait LineSource {
    /// `Ok(None)` at end of input.
    fn next_line(&mut self) -> io::Result<Option<String>>;
}

impl LineSource for io::Stdin {
    fn next_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        match self.read_line(&mut line)? {
            0 => Ok(None),
            _ => Ok(Some(line)),
        }
    }
}

impl<T: AsRef<[u8]>> LineSource for io::Cursor<T> {
    fn next_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        match self.read_line(&mut line)? {
            0 => Ok(None),
            _ => Ok(Some(line)),
        }
    }
}

pub fn or_na(value: &str) -> &str {
    if value.trim().is_empty() {
        "N/A"
    } else {
        value
    }
}

pub fn truncate_text(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// Relevance score in `[0, 1]` as a percentage with one decimal.
pub fn format_score(score: f64) -> String {
    format!("{:.1}%", score * 100.0)
}

pub fn results_header(view: &SearchResultsView<'_>) -> String {
    format!(
        "{} results for \"{}\" ({:.2}s)",
        view.total_results,
        view.query,
        view.elapsed.as_secs_f64()
    )
}

pub fn format_notice(notice: &Notice, timestamp: &str) -> String {
    let tag = match notice.level {
        NoticeLevel::Info => "info",
        NoticeLevel::Success => " ok ",
        NoticeLevel::Warning => "warn",
        NoticeLevel::Error => "FAIL",
    };
    format!("[{timestamp}] [{tag}] {}", notice.message)
}

pub struct TerminalRenderer<W: Write, I: LineSource> {
    out: W,
    input: I,
    loading: bool,
    listed: Vec<ProductSummary>,
    listed_from_search: bool,
    form_mode: Option<FormMode>,
    form_draft: Option<ProductFields>,
}

impl TerminalRenderer<io::Stdout, io::Stdin> {
    pub fn stdio() -> Self {
        Self::new(io::stdout(), io::stdin())
    }
}

impl<W: Write, I: LineSource> TerminalRenderer<W, I> {
    pub fn new(out: W, input: I) -> Self {
        Self {
            out,
            input,
            loading: false,
            listed: Vec::new(),
            listed_from_search: false,
            form_mode: None,
            form_draft: None,
        }
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    /// Products from the last rendered list are addressed as `#1`, `#2`, ...
    pub fn listed_product(&self, position: usize) -> Option<&ProductSummary> {
        position.checked_sub(1).and_then(|index| self.listed.get(index))
    }

    pub fn form_mode(&self) -> Option<FormMode> {
        self.form_mode
    }

    pub fn form_draft(&self) -> Option<&ProductFields> {
        self.form_draft.as_ref()
    }

    pub fn form_draft_mut(&mut self) -> Option<&mut ProductFields> {
        self.form_draft.as_mut()
    }

    pub fn line(&mut self, text: impl Display) {
        if let Err(err) = writeln!(self.out, "{text}") {
            debug!(error = %err, "terminal write failed");
        }
    }

    /// Writes `text` without a newline and flushes.
    pub fn prompt(&mut self, text: &str) {
        if let Err(err) = write!(self.out, "{text}").and_then(|_| self.out.flush()) {
            debug!(error = %err, "terminal write failed");
        }
    }

    pub fn render_form(&mut self) {
        let Some(fields) = self.form_draft.clone() else {
            self.line("No product form is open.");
            return;
        };
        for (label, value) in [
            ("name *", &fields.name),
            ("brand *", &fields.brand),
            ("ingredients", &fields.ingredients),
            ("categories", &fields.categories),
            ("manufacturer", &fields.manufacturer),
            ("manufacturer_number", &fields.manufacturer_number),
        ] {
            self.line(format_args!("  {label:<20} {value}"));
        }
    }

    fn render_listing_entry(&mut self, position: usize, product: &ProductSummary) {
        match product.score {
            Some(score) => self.line(format_args!(
                "#{position:<3} {} ({})",
                or_na(&product.name),
                format_score(score)
            )),
            None => self.line(format_args!("#{position:<3} {}", or_na(&product.name))),
        }
        self.line(format_args!(
            "     Brand: {} | Categories: {} | Manufacturer: {}",
            or_na(&product.brand),
            or_na(&product.categories),
            or_na(&product.manufacturer)
        ));
        if let Some(ingredients) = product
            .ingredients
            .as_deref()
            .filter(|text| !text.trim().is_empty())
        {
            self.line(format_args!(
                "     Ingredients: {}",
                truncate_text(ingredients, INGREDIENTS_PREVIEW_CHARS)
            ));
        }
        self.line(format_args!("     id: {}", product.id));
    }
}

impl<W: Write, I: LineSource> Renderer for TerminalRenderer<W, I> {
    fn set_loading(&mut self, visible: bool) {
        if visible && !self.loading {
            self.line("Loading...");
        }
        self.loading = visible;
    }

    fn notify(&mut self, notice: Notice) {
        let timestamp = Local::now().format("%H:%M:%S").to_string();
        self.line(format_notice(&notice, &timestamp));
    }

    fn render_health(&mut self, status: ApiStatus) {
        match status {
            ApiStatus::Online => self.line("API: Online"),
            ApiStatus::Offline => self.line("API: Offline"),
        }
    }

    fn render_statistics(&mut self, stats: Option<&Statistics>) {
        let Some(stats) = stats else {
            self.line("Total products: Error");
            return;
        };
        self.line(format_args!("Total products: {}", stats.total_products));
        if let Some(vectors) = stats.total_vectors {
            self.line(format_args!("Indexed vectors: {vectors}"));
        }
        if let Some(dimension) = stats.vector_dimension {
            self.line(format_args!("Vector dimension: {dimension}"));
        }
        if !stats.top_brands.is_empty() {
            let mut brands: Vec<_> = stats.top_brands.iter().collect();
            brands.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
            self.line("Top brands:");
            for (brand, count) in brands {
                self.line(format_args!("  {brand} ({count})"));
            }
        }
    }

    fn render_search_results(&mut self, view: &SearchResultsView<'_>) {
        self.listed = view.results.to_vec();
        self.listed_from_search = true;
        self.line(results_header(view));
        if view.is_empty() {
            self.line("No results found. Try a different query or search method.");
            return;
        }
        for (index, product) in view.results.iter().enumerate() {
            self.render_listing_entry(index + 1, product);
        }
    }

    fn clear_search_results(&mut self) {
        if self.listed_from_search {
            self.listed.clear();
            self.listed_from_search = false;
        }
    }

    fn focus_search_input(&mut self) {
        self.line("Usage: search <text>");
    }

    fn render_browse(&mut self, view: &BrowseView<'_>) {
        self.listed = view.products.to_vec();
        self.listed_from_search = false;
        if view.products.is_empty() {
            self.line("No products found.");
        }
        for (index, product) in view.products.iter().enumerate() {
            self.render_listing_entry(index + 1, product);
        }
        if view.pagination.visible {
            let prev = if view.pagination.prev_enabled { "prev" } else { "----" };
            let next = if view.pagination.next_enabled { "next" } else { "----" };
            self.line(format_args!("{}  [{prev}] [{next}]", view.pagination.label));
        }
    }

    fn render_detail(&mut self, product: &ProductDetail) {
        let summary = &product.summary;
        self.line(format_args!("== {} ==", or_na(&summary.name)));
        for (label, value) in [
            ("Name", summary.name.as_str()),
            ("Brand", summary.brand.as_str()),
            ("Categories", summary.categories.as_str()),
            ("Manufacturer", summary.manufacturer.as_str()),
            ("Manufacturer Code", product.manufacturer_number.as_str()),
        ] {
            self.line(format_args!("{label:<18} {}", or_na(value)));
        }
        if let Some(ingredients) = summary
            .ingredients
            .as_deref()
            .filter(|text| !text.trim().is_empty())
        {
            self.line("Ingredients:");
            self.line(format_args!("  {ingredients}"));
        }
        if let Some(score) = summary.score {
            self.line(format_args!("Search relevance: {} match", format_score(score)));
        }
        self.line(format_args!("id: {}  (close, edit {0}, delete {0})", summary.id));
    }

    fn hide_detail(&mut self) {}

    fn open_form(&mut self, mode: FormMode) {
        self.form_mode = Some(mode);
        self.form_draft = Some(ProductFields::default());
        match mode {
            FormMode::Create => self.line("Add Product"),
            FormMode::Edit(id) => self.line(format_args!("Edit Product {id}")),
        }
        self.line("Use `set <field> <value>`, then `save` or `cancel`.");
    }

    fn populate_form(&mut self, fields: &ProductFields) {
        self.form_draft = Some(fields.clone());
        self.render_form();
    }

    fn close_form(&mut self) {
        self.form_mode = None;
        self.form_draft = None;
    }

    fn confirm(&mut self, prompt: &str) -> bool {
        if let Err(err) = write!(self.out, "{prompt} [y/N] ").and_then(|_| self.out.flush()) {
            debug!(error = %err, "terminal write failed");
        }
        match self.input.next_line() {
            Ok(Some(answer)) => matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
            Ok(None) => false,
            Err(err) => {
                debug!(error = %err, "failed to read confirmation");
                false
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/terminal_tests.rs"]
mod tests;
