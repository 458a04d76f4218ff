use std::{path::PathBuf, process::ExitCode, sync::Arc};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use client_core::HttpCatalogApi;
use shared::domain::{ProductId, SearchMethod};
use tracing::info;
use tracing_subscriber::EnvFilter;
use view_controller::{render::ApiStatus, ControllerOptions, ViewController};

mod config;
mod shell;
mod terminal;

use config::{load_settings, Settings};
use shell::ShellState;
use terminal::TerminalRenderer;

#[derive(Parser, Debug)]
#[command(name = "catalog", version, about = "Search and manage the product catalog")]
struct Args {
    /// TOML settings file (default: <config dir>/catalog/catalog.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Base URL of the catalog API
    #[arg(long, global = true)]
    api_url: Option<String>,
    /// exact | semantic | hybrid | bi_encoder
    #[arg(long, global = true)]
    method: Option<SearchMethod>,
    #[arg(long, global = true)]
    top_k: Option<u32>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check whether the API is reachable and healthy
    Health,
    /// Print catalog statistics
    Stats,
    /// Run a single search
    Search {
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },
    /// Print one page of the product list
    Browse {
        #[arg(default_value_t = 1)]
        page: u32,
        #[arg(long, default_value = "")]
        filter: String,
    },
    /// Print one product
    Show { id: ProductId },
    /// Interactive shell (default)
    Shell,
}

fn apply_overrides(settings: &mut Settings, args: &Args) {
    if let Some(url) = &args.api_url {
        settings.api_base_url = url.clone();
    }
    if let Some(method) = args.method {
        settings.search_method = method;
    }
    if let Some(top_k) = args.top_k {
        settings.top_k = top_k;
    }
}

fn exit_code(ok: bool) -> ExitCode {
    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();
    let mut settings = load_settings(args.config.as_deref())?;
    apply_overrides(&mut settings, &args);

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.log_filter))
        .context("invalid log filter")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let api = HttpCatalogApi::with_timeout(&settings.api_base_url, settings.request_timeout())
        .with_context(|| format!("invalid API url '{}'", settings.api_base_url))?;
    info!(api = %api.base_url(), method = %settings.search_method, "catalog client ready");

    let options = ControllerOptions {
        page_size: settings.page_size,
        filter_debounce: settings.filter_debounce(),
    };
    let mut controller = ViewController::new(Arc::new(api), TerminalRenderer::stdio(), options);

    let code = match args.command.unwrap_or(Command::Shell) {
        Command::Health => exit_code(controller.check_health().await == ApiStatus::Online),
        Command::Stats => exit_code(controller.refresh_statistics().await.is_ok()),
        Command::Search { query } => exit_code(
            controller
                .submit_search(&query.join(" "), settings.search_method, settings.top_k)
                .await
                .is_ok(),
        ),
        Command::Browse { page, filter } => {
            exit_code(controller.load_browse_page(page, &filter).await.is_ok())
        }
        Command::Show { id } => exit_code(controller.open_detail(id).await.is_ok()),
        Command::Shell => {
            let state = ShellState {
                method: settings.search_method,
                top_k: settings.top_k,
            };
            let (lines, ack) = shell::spawn_stdin_reader();
            shell::run(&mut controller, state, lines, ack).await;
            ExitCode::SUCCESS
        }
    };
    Ok(code)
}
