use super::*;
use std::{
    io::Cursor,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use client_core::{CatalogApi, ClientError, ClientResult, HttpCatalogApi};
use shared::{
    domain::{PaginationState, ProductDetail, ProductSummary, SearchQuery},
    error::ApiError,
    protocol::{
        HealthResponse, MutationResponse, ProductListQuery, ProductPage, SearchResponse,
        Statistics,
    },
};
use view_controller::ControllerOptions;

type TestController = Controller<Vec<u8>, Cursor<Vec<u8>>>;

fn parse(line: &str) -> ShellCommand {
    parse_command(line)
        .expect("parses")
        .expect("not blank")
}

// Nothing in these tests reaches the network.
fn offline_controller() -> TestController {
    let api = HttpCatalogApi::new("http://127.0.0.1:9").expect("valid url");
    ViewController::new(
        Arc::new(api),
        TerminalRenderer::new(Vec::new(), Cursor::new(Vec::new())),
        ControllerOptions::default(),
    )
}

/// Answers health and statistics, records list queries, rejects the rest.
#[derive(Default)]
struct ListRecordingApi {
    list_queries: Mutex<Vec<ProductListQuery>>,
    products: Vec<ProductSummary>,
}

impl ListRecordingApi {
    fn list_queries(&self) -> Vec<ProductListQuery> {
        self.list_queries.lock().expect("queries").clone()
    }
}

fn rejected<T>() -> ClientResult<T> {
    Err(ClientError::Api(ApiError::rejected(None)))
}

#[async_trait]
impl CatalogApi for ListRecordingApi {
    async fn health(&self) -> ClientResult<HealthResponse> {
        Ok(HealthResponse {
            status: "healthy".into(),
            timestamp: None,
        })
    }

    async fn stats(&self) -> ClientResult<Statistics> {
        Ok(Statistics::default())
    }

    async fn search(&self, _query: &SearchQuery) -> ClientResult<SearchResponse> {
        rejected()
    }

    async fn list_products(&self, query: &ProductListQuery) -> ClientResult<ProductPage> {
        self.list_queries.lock().expect("queries").push(query.clone());
        Ok(ProductPage {
            products: self.products.clone(),
            pagination: PaginationState::new(query.page, 1, 0),
        })
    }

    async fn get_product(&self, _id: ProductId) -> ClientResult<ProductDetail> {
        rejected()
    }

    async fn create_product(&self, _fields: &ProductFields) -> ClientResult<MutationResponse> {
        rejected()
    }

    async fn update_product(
        &self,
        _id: ProductId,
        _fields: &ProductFields,
    ) -> ClientResult<MutationResponse> {
        rejected()
    }

    async fn delete_product(&self, _id: ProductId) -> ClientResult<MutationResponse> {
        rejected()
    }
}

fn output(controller: &TestController) -> String {
    String::from_utf8_lossy(controller.renderer().output()).into_owned()
}

fn state() -> ShellState {
    ShellState {
        method: SearchMethod::Hybrid,
        top_k: 10,
    }
}

#[test]
fn search_keeps_the_rest_of_the_line() {
    assert_eq!(
        parse("search   organic  juice "),
        ShellCommand::Search("organic  juice".into())
    );
    assert_eq!(parse("search"), ShellCommand::Search(String::new()));
}

#[test]
fn blank_lines_are_skipped() {
    assert_eq!(parse_command("   \n"), Ok(None));
}

#[test]
fn browse_defaults_to_first_page() {
    assert_eq!(parse("browse"), ShellCommand::Browse(1));
    assert_eq!(parse("BROWSE 4"), ShellCommand::Browse(4));
    assert!(matches!(
        parse_command("browse two"),
        Err(CommandError::InvalidValue { what: "page", .. })
    ));
}

#[test]
fn product_references_accept_ids_and_list_positions() {
    assert_eq!(parse("open 42"), ShellCommand::Open(ProductRef::Id(ProductId(42))));
    assert_eq!(parse("delete #3"), ShellCommand::Delete(ProductRef::Listed(3)));
    assert_eq!(parse("edit  7 "), ShellCommand::Edit(ProductRef::Id(ProductId(7))));
    assert!(parse_command("open #0").is_err());
    assert!(parse_command("open milk").is_err());
    assert_eq!(
        parse_command("delete"),
        Err(CommandError::Usage("delete <id|#n>"))
    );
}

#[test]
fn method_and_topk_are_validated() {
    assert_eq!(parse("method bi-encoder"), ShellCommand::Method(SearchMethod::BiEncoder));
    assert!(parse_command("method psychic").is_err());
    assert_eq!(parse("topk 25"), ShellCommand::TopK(25));
    assert!(parse_command("topk 0").is_err());
}

#[test]
fn set_splits_field_from_value() {
    assert_eq!(
        parse("set name  Organic Oat Milk"),
        ShellCommand::Set(FormField::Name, "Organic Oat Milk".into())
    );
    assert_eq!(
        parse("set manufacturer-number OM-1"),
        ShellCommand::Set(FormField::ManufacturerNumber, "OM-1".into())
    );
    assert_eq!(parse("set brand"), ShellCommand::Set(FormField::Brand, String::new()));
    assert!(parse_command("set colour red").is_err());
}

#[test]
fn unknown_commands_name_the_word() {
    let err = parse_command("frobnicate now").expect_err("unknown");
    assert_eq!(err, CommandError::Unknown("frobnicate".into()));
    assert!(err.to_string().contains("help"));
}

#[tokio::test]
async fn set_edits_the_open_form_draft() {
    let mut controller = offline_controller();
    let mut state = state();

    execute(&mut controller, &mut state, ShellCommand::Add).await;
    execute(
        &mut controller,
        &mut state,
        ShellCommand::Set(FormField::Name, "Oat Milk".into()),
    )
    .await;

    let draft = controller.renderer().form_draft().expect("form open");
    assert_eq!(draft.name, "Oat Milk");
    assert_eq!(controller.form_mode(), Some(FormMode::Create));

    execute(&mut controller, &mut state, ShellCommand::Cancel).await;
    assert!(controller.renderer().form_draft().is_none());
    assert_eq!(controller.form_mode(), None);
}

#[tokio::test]
async fn set_without_open_form_warns() {
    let mut controller = offline_controller();
    let mut state = state();

    execute(
        &mut controller,
        &mut state,
        ShellCommand::Set(FormField::Brand, "Oatly".into()),
    )
    .await;

    assert!(output(&controller).contains("No product form is open"));
}

#[tokio::test]
async fn save_with_blank_required_fields_is_rejected_locally() {
    let mut controller = offline_controller();
    let mut state = state();

    execute(&mut controller, &mut state, ShellCommand::Add).await;
    execute(&mut controller, &mut state, ShellCommand::Save).await;

    assert!(output(&controller).contains("Please fill in all required fields"));
    assert_eq!(controller.form_mode(), Some(FormMode::Create));
}

#[tokio::test]
async fn list_position_outside_last_list_is_reported() {
    let mut controller = offline_controller();
    let mut state = state();

    execute(
        &mut controller,
        &mut state,
        ShellCommand::Open(ProductRef::Listed(3)),
    )
    .await;

    assert!(output(&controller).contains("No product #3 in the last list"));
    assert!(controller.detail().is_none());
}

#[tokio::test]
async fn method_and_topk_update_shell_state() {
    let mut controller = offline_controller();
    let mut state = state();

    execute(
        &mut controller,
        &mut state,
        ShellCommand::Method(SearchMethod::Exact),
    )
    .await;
    execute(&mut controller, &mut state, ShellCommand::TopK(3)).await;

    assert_eq!(
        state,
        ShellState {
            method: SearchMethod::Exact,
            top_k: 3,
        }
    );
    assert_eq!(
        execute(&mut controller, &mut state, ShellCommand::Quit).await,
        Flow::Quit
    );
}

#[tokio::test]
async fn empty_search_is_rejected_without_a_request() {
    let mut controller = offline_controller();
    let mut state = state();

    execute(&mut controller, &mut state, ShellCommand::Search("  ".into())).await;

    let out = output(&controller);
    assert!(out.contains("Usage: search <text>"));
    assert!(out.contains("Please enter a search query"));
    assert!(!out.contains("Loading..."));
}

#[tokio::test(start_paused = true)]
async fn typed_filter_burst_reaches_the_server_once() {
    let api = Arc::new(ListRecordingApi::default());
    let mut controller = ViewController::new(
        api.clone(),
        TerminalRenderer::new(Vec::new(), Cursor::new(Vec::new())),
        ControllerOptions::default(),
    );
    let (line_tx, lines) = mpsc::unbounded_channel();
    let (ack, _ack_rx) = crossbeam_channel::unbounded();

    let typist = tokio::spawn(async move {
        for line in ["filter o\n", "filter or\n", "filter org\n", "filter organic\n"] {
            line_tx.send(line.to_string()).expect("shell running");
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        tokio::time::sleep(Duration::from_millis(1000)).await;
        line_tx.send("quit\n".to_string()).expect("shell running");
    });

    run(&mut controller, state(), lines, ack).await;
    typist.await.expect("typist finished");

    assert_eq!(
        api.list_queries(),
        vec![ProductListQuery {
            page: 1,
            limit: ControllerOptions::default().page_size,
            search: Some("organic".into()),
        }]
    );
    assert_eq!(controller.filter_text(), "organic");
}

#[tokio::test]
async fn delete_prompt_names_the_product_from_the_browse_page() {
    let api = Arc::new(ListRecordingApi {
        products: vec![ProductSummary {
            id: ProductId(7),
            name: "Oat Milk".into(),
            brand: "Oatly".into(),
            categories: String::new(),
            manufacturer: String::new(),
            ingredients: None,
            score: None,
        }],
        ..Default::default()
    });
    let mut controller: TestController = ViewController::new(
        api,
        TerminalRenderer::new(Vec::new(), Cursor::new(b"n\n".to_vec())),
        ControllerOptions::default(),
    );
    let mut state = state();

    execute(&mut controller, &mut state, ShellCommand::Browse(1)).await;
    execute(
        &mut controller,
        &mut state,
        ShellCommand::Delete(ProductRef::Id(ProductId(7))),
    )
    .await;

    assert!(output(&controller).contains("delete \"Oat Milk\"?"));
    assert_eq!(controller.products().len(), 1);
}
