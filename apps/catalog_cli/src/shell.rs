//! Interactive shell: parses one command per line and drives the controller.
//!
//! Stdin is read on a dedicated thread. The thread waits for an ack before
//! each read, so a running command (e.g. a delete confirmation) can read the
//! terminal directly without racing it.

use std::{
    io::{self, Write},
    str::FromStr,
    thread,
};

use crossbeam_channel::{Receiver, Sender};
use shared::{
    domain::{ProductId, SearchMethod},
    protocol::ProductFields,
};
use tokio::{sync::mpsc, time::Instant};
use tracing::{debug, info};
use view_controller::{
    events::Notice,
    render::{FormMode, Renderer},
    ViewController,
};

use crate::terminal::{LineSource, TerminalRenderer};

pub const HELP: &str = "\
Search
  search <text>          run a search with the current method and top-k
  method <m>             exact | semantic | hybrid | bi_encoder
  topk <n>               number of search results to request
  clear                  drop the current search results
Browse
  browse [page]          load a page of the product list (default 1)
  filter <text>          filter the product list (applied after a pause)
  next | prev            move one page
Products
  open <id|#n>           show product details (#n refers to the last list)
  close                  close the product details
  add                    open an empty product form
  edit <id|#n>           open the product form for an existing product
  set <field> <value>    name, brand, ingredients, categories,
                         manufacturer, manufacturer_number
  save | cancel          submit or discard the product form
  delete <id|#n>         delete a product after confirmation
Other
  stats | health | help | quit";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown command `{0}`; type `help` for a list")]
    Unknown(String),
    #[error("usage: {0}")]
    Usage(&'static str),
    #[error("invalid {what} `{value}`")]
    InvalidValue { what: &'static str, value: String },
}

/// A product addressed by id or by its position in the last rendered list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductRef {
    Id(ProductId),
    Listed(usize),
}

impl FromStr for ProductRef {
    type Err = CommandError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let raw = raw.trim();
        let invalid = || CommandError::InvalidValue {
            what: "product reference",
            value: raw.to_string(),
        };
        match raw.strip_prefix('#') {
            Some(position) => match position.parse::<usize>() {
                Ok(position) if position >= 1 => Ok(ProductRef::Listed(position)),
                _ => Err(invalid()),
            },
            None => raw.parse().map(ProductRef::Id).map_err(|_| invalid()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Name,
    Brand,
    Ingredients,
    Categories,
    Manufacturer,
    ManufacturerNumber,
}

impl FormField {
    pub fn apply(self, fields: &mut ProductFields, value: &str) {
        let slot = match self {
            FormField::Name => &mut fields.name,
            FormField::Brand => &mut fields.brand,
            FormField::Ingredients => &mut fields.ingredients,
            FormField::Categories => &mut fields.categories,
            FormField::Manufacturer => &mut fields.manufacturer,
            FormField::ManufacturerNumber => &mut fields.manufacturer_number,
        };
        *slot = value.to_string();
    }
}

impl FromStr for FormField {
    type Err = CommandError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.to_ascii_lowercase().replace('-', "_").as_str() {
            "name" => Ok(FormField::Name),
            "brand" => Ok(FormField::Brand),
            "ingredients" => Ok(FormField::Ingredients),
            "categories" => Ok(FormField::Categories),
            "manufacturer" => Ok(FormField::Manufacturer),
            "manufacturer_number" | "manufacturernumber" | "code" => {
                Ok(FormField::ManufacturerNumber)
            }
            _ => Err(CommandError::InvalidValue {
                what: "field",
                value: raw.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ShellCommand {
    Search(String),
    Method(SearchMethod),
    TopK(u32),
    Clear,
    Browse(u32),
    Filter(String),
    Next,
    Prev,
    Open(ProductRef),
    Close,
    Add,
    Edit(ProductRef),
    Set(FormField, String),
    Save,
    Cancel,
    Delete(ProductRef),
    Stats,
    Health,
    Help,
    Quit,
}

/// `Ok(None)` for a blank line.
pub fn parse_command(line: &str) -> Result<Option<ShellCommand>, CommandError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let command = match word.to_ascii_lowercase().as_str() {
        "search" | "s" => ShellCommand::Search(rest.to_string()),
        "method" => ShellCommand::Method(rest.parse().map_err(|_| CommandError::InvalidValue {
            what: "search method",
            value: rest.to_string(),
        })?),
        "topk" | "top_k" => match rest.parse::<u32>() {
            Ok(top_k) if top_k > 0 => ShellCommand::TopK(top_k),
            _ => return Err(CommandError::Usage("topk <n>  (n >= 1)")),
        },
        "clear" => ShellCommand::Clear,
        "browse" | "b" => {
            if rest.is_empty() {
                ShellCommand::Browse(1)
            } else {
                let page = rest.parse().map_err(|_| CommandError::InvalidValue {
                    what: "page",
                    value: rest.to_string(),
                })?;
                ShellCommand::Browse(page)
            }
        }
        "filter" | "f" => ShellCommand::Filter(rest.to_string()),
        "next" | "n" => ShellCommand::Next,
        "prev" | "p" => ShellCommand::Prev,
        "open" | "show" => ShellCommand::Open(required(rest, "open <id|#n>")?.parse()?),
        "close" => ShellCommand::Close,
        "add" | "new" => ShellCommand::Add,
        "edit" => ShellCommand::Edit(required(rest, "edit <id|#n>")?.parse()?),
        "set" => {
            let usage = "set <field> <value>";
            let (field, value) = required(rest, usage)?
                .split_once(char::is_whitespace)
                .map(|(field, value)| (field, value.trim()))
                .unwrap_or((rest, ""));
            ShellCommand::Set(field.parse()?, value.to_string())
        }
        "save" => ShellCommand::Save,
        "cancel" => ShellCommand::Cancel,
        "delete" | "rm" => ShellCommand::Delete(required(rest, "delete <id|#n>")?.parse()?),
        "stats" => ShellCommand::Stats,
        "health" => ShellCommand::Health,
        "help" | "?" => ShellCommand::Help,
        "quit" | "exit" | "q" => ShellCommand::Quit,
        _ => return Err(CommandError::Unknown(word.to_string())),
    };
    Ok(Some(command))
}

fn required<'a>(rest: &'a str, usage: &'static str) -> Result<&'a str, CommandError> {
    if rest.is_empty() {
        Err(CommandError::Usage(usage))
    } else {
        Ok(rest)
    }
}

/// Search preferences that persist between shell commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShellState {
    pub method: SearchMethod,
    pub top_k: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

type Controller<W, I> = ViewController<TerminalRenderer<W, I>>;

/// Reads stdin lines on a background thread, one line per ack.
pub fn spawn_stdin_reader() -> (mpsc::UnboundedReceiver<String>, Sender<()>) {
    let (line_tx, line_rx) = mpsc::unbounded_channel();
    let (ack_tx, ack_rx) = crossbeam_channel::bounded::<()>(1);
    thread::spawn(move || read_stdin_lines(ack_rx, line_tx));
    (line_rx, ack_tx)
}

fn read_stdin_lines(ack_rx: Receiver<()>, line_tx: mpsc::UnboundedSender<String>) {
    let stdin = io::stdin();
    while ack_rx.recv().is_ok() {
        let mut line = String::new();
        match stdin.read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {
                if line_tx.send(line).is_err() {
                    break;
                }
            }
            Err(err) => {
                debug!(error = %err, "stdin read failed");
                break;
            }
        }
    }
}

async fn filter_due(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

pub async fn run<W: Write, I: LineSource>(
    controller: &mut Controller<W, I>,
    mut state: ShellState,
    mut lines: mpsc::UnboundedReceiver<String>,
    ack: Sender<()>,
) {
    controller.initialize().await;
    controller
        .renderer_mut()
        .line("Type `help` for commands, `quit` to exit.");

    loop {
        controller.renderer_mut().prompt("catalog> ");
        if ack.send(()).is_err() {
            break;
        }

        let line = loop {
            tokio::select! {
                line = lines.recv() => break line,
                _ = filter_due(controller.filter_deadline()) => {
                    controller.renderer_mut().line("");
                    let _ = controller.flush_due_filter(Instant::now()).await;
                    controller.renderer_mut().prompt("catalog> ");
                }
            }
        };
        let Some(line) = line else {
            controller.renderer_mut().line("");
            break;
        };

        let command = match parse_command(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(err) => {
                controller.renderer_mut().notify(Notice::warning(err.to_string()));
                continue;
            }
        };
        if execute(controller, &mut state, command).await == Flow::Quit {
            break;
        }
    }

    // a filter typed right before quitting is dropped
    if controller.filter_deadline().is_some() {
        debug!("discarding pending filter on exit");
    }
    info!("shell closed");
}

pub async fn execute<W: Write, I: LineSource>(
    controller: &mut Controller<W, I>,
    state: &mut ShellState,
    command: ShellCommand,
) -> Flow {
    match command {
        ShellCommand::Search(text) => {
            let _ = controller.submit_search(&text, state.method, state.top_k).await;
        }
        ShellCommand::Method(method) => {
            state.method = method;
            controller
                .renderer_mut()
                .notify(Notice::info(format!("Search method set to {method}")));
        }
        ShellCommand::TopK(top_k) => {
            state.top_k = top_k;
            controller
                .renderer_mut()
                .notify(Notice::info(format!("Top-k set to {top_k}")));
        }
        ShellCommand::Clear => controller.clear_search_results(),
        ShellCommand::Browse(page) => {
            let filter = controller.filter_text().to_string();
            let _ = controller.load_browse_page(page, &filter).await;
        }
        ShellCommand::Filter(text) => controller.on_filter_input(&text),
        ShellCommand::Next => {
            let _ = controller.change_page(1).await;
        }
        ShellCommand::Prev => {
            let _ = controller.change_page(-1).await;
        }
        ShellCommand::Open(target) => {
            if let Some(id) = resolve(controller, target) {
                let _ = controller.open_detail(id).await;
            }
        }
        ShellCommand::Close => {
            controller.close_detail();
        }
        ShellCommand::Add => controller.open_create_form(),
        ShellCommand::Edit(target) => {
            if let Some(id) = resolve(controller, target) {
                let _ = controller.open_edit_form(id).await;
            }
        }
        ShellCommand::Set(field, value) => {
            let renderer = controller.renderer_mut();
            match renderer.form_draft_mut() {
                Some(draft) => {
                    field.apply(draft, &value);
                    renderer.render_form();
                }
                None => renderer.notify(Notice::warning(
                    "No product form is open; use `add` or `edit <id>` first",
                )),
            }
        }
        ShellCommand::Save => {
            let draft = controller.renderer().form_draft().cloned();
            match draft {
                Some(draft) => {
                    let editing_id = controller.editing_id();
                    let _ = controller.submit_product_form(&draft, editing_id).await;
                }
                None => controller.renderer_mut().notify(Notice::warning(
                    "No product form is open; use `add` or `edit <id>` first",
                )),
            }
        }
        ShellCommand::Cancel => controller.close_form(),
        ShellCommand::Delete(target) => {
            if let Some(id) = resolve(controller, target) {
                let name = product_name(controller, id);
                let _ = controller.delete_product(id, &name).await;
            }
        }
        ShellCommand::Stats => {
            let _ = controller.refresh_statistics().await;
        }
        ShellCommand::Health => {
            controller.check_health().await;
        }
        ShellCommand::Help => controller.renderer_mut().line(HELP),
        ShellCommand::Quit => return Flow::Quit,
    }
    Flow::Continue
}

fn resolve<W: Write, I: LineSource>(
    controller: &mut Controller<W, I>,
    target: ProductRef,
) -> Option<ProductId> {
    match target {
        ProductRef::Id(id) => Some(id),
        ProductRef::Listed(position) => {
            let id = controller
                .renderer()
                .listed_product(position)
                .map(|product| product.id);
            if id.is_none() {
                controller.renderer_mut().notify(Notice::warning(format!(
                    "No product #{position} in the last list"
                )));
            }
            id
        }
    }
}

/// Display name for the delete prompt: search results, then the browse
/// page, the open detail and the edit form.
fn product_name<W: Write, I: LineSource>(controller: &Controller<W, I>, id: ProductId) -> String {
    let listed = controller
        .search_results()
        .iter()
        .chain(controller.products())
        .find(|product| product.id == id)
        .map(|product| product.name.clone());
    let shown = controller
        .detail()
        .filter(|detail| detail.id() == id)
        .map(|detail| detail.summary.name.clone());
    let form = match controller.form_mode() {
        Some(FormMode::Edit(editing)) if editing == id => controller
            .renderer()
            .form_draft()
            .map(|draft| draft.name.clone()),
        _ => None,
    };
    listed
        .or(shown)
        .or(form)
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| format!("product {id}"))
}

#[cfg(test)]
#[path = "tests/shell_tests.rs"]
mod tests;
