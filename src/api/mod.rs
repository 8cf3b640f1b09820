use std::collections::BTreeMap;
use std::net::SocketAddr;

use axum::{
    Router,
    extract::{Json, Query},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use clap::Parser;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

use crate::core::{SimulationParameters, YearPoint, project};
use crate::store::{self, ParamsDocument};

const INDEX_HTML: &str = include_str!("../../web/index.html");
const STYLES_CSS: &str = include_str!("../../web/styles.css");
const APP_JS: &str = include_str!("../../web/app.js");

/// Fixed divisor for reporting the corpus in crores (1 Cr = 1e7).
pub const CRORE: f64 = 1e7;

// Collection bounds, matching the UI sliders. Percent values clamp into
// these ranges before the /100 conversion; ages clamp into theirs.
const SALARY_GROWTH_PCT: (f64, f64) = (0.0, 15.0);
const PRE_RETIREMENT_GROWTH_PCT: (f64, f64) = (5.0, 15.0);
const POST_RETIREMENT_GROWTH_PCT: (f64, f64) = (3.0, 12.0);
const INFLATION_PCT: (f64, f64) = (2.0, 10.0);
const CURRENT_AGE_RANGE: (u32, u32) = (20, 50);
const RETIREMENT_AGE_RANGE: (u32, u32) = (40, 70);
const LIFE_EXPECTANCY_RANGE: (u32, u32) = (70, 100);

#[derive(Parser, Debug)]
#[command(
    name = "fincast",
    about = "Year-by-year corpus projection for retirement planning"
)]
pub struct Cli {
    #[arg(
        long,
        exclusive = true,
        help = "Run a saved parameter document instead of flags"
    )]
    params: Option<String>,
    #[arg(long, default_value_t = 10_000_000.0, help = "Corpus at current age")]
    starting_corpus: f64,
    #[arg(long, default_value_t = 3_000_000.0, help = "Annual salary at current age")]
    salary: f64,
    #[arg(
        long,
        default_value_t = 6.0,
        help = "Annual salary growth in percent, e.g. 6"
    )]
    salary_growth_rate: f64,
    #[arg(
        long,
        default_value_t = 10.0,
        help = "Investment growth up to retirement in percent"
    )]
    pre_retirement_investment_growth_rate: f64,
    #[arg(
        long,
        default_value_t = 7.0,
        help = "Investment growth after retirement in percent"
    )]
    post_retirement_investment_growth_rate: f64,
    #[arg(
        long,
        default_value_t = 5.0,
        help = "Expected annual inflation in percent"
    )]
    inflation_rate: f64,
    #[arg(
        long,
        default_value_t = 1_000_000.0,
        help = "Annual expenses up to retirement in today's money"
    )]
    pre_retirement_expenses: f64,
    #[arg(
        long,
        default_value_t = 1_000_000.0,
        help = "Annual expenses after retirement in today's money"
    )]
    post_retirement_expenses: f64,
    #[arg(long, default_value_t = 55)]
    retirement_age: u32,
    #[arg(long, default_value_t = 27)]
    current_age: u32,
    #[arg(long, default_value_t = 85)]
    life_expectancy: u32,
    #[arg(
        long,
        default_value = "",
        help = "One-off expenses as \"age1:amount1, age2:amount2\" in today's money"
    )]
    extra_expenses: String,
    #[arg(long, help = "Report nominal values instead of today's money")]
    nominal: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProjectPayload {
    starting_corpus: Option<f64>,
    salary: Option<f64>,
    salary_growth_rate: Option<f64>,
    pre_retirement_investment_growth_rate: Option<f64>,
    post_retirement_investment_growth_rate: Option<f64>,
    inflation_rate: Option<f64>,
    pre_retirement_expenses: Option<f64>,
    post_retirement_expenses: Option<f64>,
    retirement_age: Option<u32>,
    current_age: Option<u32>,
    life_expectancy: Option<u32>,
    extra_expenses: Option<String>,
    adjust_for_inflation: Option<bool>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProjectResponse {
    retirement_age: u32,
    adjust_for_inflation: bool,
    warnings: Vec<String>,
    points: Vec<YearPoint>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SaveRequest {
    filename: String,
    #[serde(default)]
    params: ProjectPayload,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SaveResponse {
    saved_as: Option<String>,
    warnings: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct LoadQuery {
    file: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LoadResponse {
    params: ParamsDocument,
    warnings: Vec<String>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

pub fn run_projection(cli: Cli) {
    let (params, warnings) = build_params(cli);
    for warning in &warnings {
        warn!("{warning}");
    }

    let result = project(&params);
    let label = if params.adjust_for_inflation {
        "Real Value"
    } else {
        "Nominal Value"
    };

    println!("Financial Planning Simulation [{label}]");
    println!("{:>4}  {:>18}  {:>12}", "Age", "Corpus", "Corpus (Cr)");
    for point in &result.points {
        let marker = if point.age == params.retirement_age {
            "  <- retirement"
        } else {
            ""
        };
        println!(
            "{:>4}  {:>18.2}  {:>12.4}{marker}",
            point.age,
            point.corpus,
            point.corpus / CRORE
        );
    }

    if let Some(final_corpus) = result.final_corpus() {
        println!();
        println!(
            "Corpus at {}: {:.2} ({:.4} Cr)",
            params.life_expectancy,
            final_corpus,
            final_corpus / CRORE
        );
    }
}

fn build_params(cli: Cli) -> (SimulationParameters, Vec<String>) {
    let mut warnings = Vec::new();

    let cli = match cli.params.as_deref() {
        Some(path) => {
            let (document, warning) = store::load_params(path);
            warnings.extend(warning);
            cli_from_document(&document)
        }
        None => cli,
    };

    let (extra_expenses, warning) = parse_extra_expenses(&cli.extra_expenses);
    warnings.extend(warning);

    let params = SimulationParameters {
        starting_corpus: cli.starting_corpus.max(0.0),
        salary: cli.salary.max(0.0),
        salary_growth_rate: clamp_pct(cli.salary_growth_rate, SALARY_GROWTH_PCT) / 100.0,
        pre_retirement_investment_growth_rate: clamp_pct(
            cli.pre_retirement_investment_growth_rate,
            PRE_RETIREMENT_GROWTH_PCT,
        ) / 100.0,
        post_retirement_investment_growth_rate: clamp_pct(
            cli.post_retirement_investment_growth_rate,
            POST_RETIREMENT_GROWTH_PCT,
        ) / 100.0,
        inflation_rate: clamp_pct(cli.inflation_rate, INFLATION_PCT) / 100.0,
        pre_retirement_expenses: cli.pre_retirement_expenses.max(0.0),
        post_retirement_expenses: cli.post_retirement_expenses.max(0.0),
        retirement_age: clamp_age(cli.retirement_age, RETIREMENT_AGE_RANGE),
        current_age: clamp_age(cli.current_age, CURRENT_AGE_RANGE),
        life_expectancy: clamp_age(cli.life_expectancy, LIFE_EXPECTANCY_RANGE),
        extra_expenses,
        adjust_for_inflation: !cli.nominal,
    };

    (params, warnings)
}

fn params_from_payload(payload: ProjectPayload) -> (SimulationParameters, Vec<String>) {
    build_params(cli_from_document(&document_from_payload(payload)))
}

fn document_from_payload(payload: ProjectPayload) -> ParamsDocument {
    let mut document = ParamsDocument::default();
    if let Some(v) = payload.starting_corpus {
        document.starting_corpus = v;
    }
    if let Some(v) = payload.salary {
        document.salary = v;
    }
    if let Some(v) = payload.salary_growth_rate {
        document.salary_growth_rate = v;
    }
    if let Some(v) = payload.pre_retirement_investment_growth_rate {
        document.pre_retirement_investment_growth_rate = v;
    }
    if let Some(v) = payload.post_retirement_investment_growth_rate {
        document.post_retirement_investment_growth_rate = v;
    }
    if let Some(v) = payload.inflation_rate {
        document.inflation_rate = v;
    }
    if let Some(v) = payload.pre_retirement_expenses {
        document.pre_retirement_expenses = v;
    }
    if let Some(v) = payload.post_retirement_expenses {
        document.post_retirement_expenses = v;
    }
    if let Some(v) = payload.retirement_age {
        document.retirement_age = v;
    }
    if let Some(v) = payload.current_age {
        document.current_age = v;
    }
    if let Some(v) = payload.life_expectancy {
        document.life_expectancy = v;
    }
    if let Some(v) = payload.extra_expenses {
        document.extra_expenses = v;
    }
    if let Some(v) = payload.adjust_for_inflation {
        document.adjust_for_inflation = v;
    }
    document
}

fn cli_from_document(document: &ParamsDocument) -> Cli {
    Cli {
        params: None,
        starting_corpus: document.starting_corpus,
        salary: document.salary,
        salary_growth_rate: document.salary_growth_rate,
        pre_retirement_investment_growth_rate: document.pre_retirement_investment_growth_rate,
        post_retirement_investment_growth_rate: document.post_retirement_investment_growth_rate,
        inflation_rate: document.inflation_rate,
        pre_retirement_expenses: document.pre_retirement_expenses,
        post_retirement_expenses: document.post_retirement_expenses,
        retirement_age: document.retirement_age,
        current_age: document.current_age,
        life_expectancy: document.life_expectancy,
        extra_expenses: document.extra_expenses.clone(),
        nominal: !document.adjust_for_inflation,
    }
}

#[cfg(test)]
fn default_cli() -> Cli {
    cli_from_document(&ParamsDocument::default())
}

/// Parses `"age1:amount1, age2:amount2"`. A malformed item stops the scan
/// with a warning, keeping the entries already parsed; it never errors.
pub fn parse_extra_expenses(text: &str) -> (BTreeMap<u32, f64>, Option<String>) {
    let mut expenses = BTreeMap::new();
    if text.trim().is_empty() {
        return (expenses, None);
    }

    for item in text.split(',') {
        let Some((age, amount)) = parse_extra_expense_item(item) else {
            return (
                expenses,
                Some(
                    "Invalid format for extra expenses. Use: age1:amount1, age2:amount2"
                        .to_string(),
                ),
            );
        };
        expenses.insert(age, amount);
    }

    (expenses, None)
}

fn parse_extra_expense_item(item: &str) -> Option<(u32, f64)> {
    let (age, amount) = item.split_once(':')?;
    let age: f64 = age.trim().parse().ok()?;
    let amount: f64 = amount.trim().parse().ok()?;
    Some((age as u32, amount.max(0.0)))
}

fn clamp_pct(value: f64, bounds: (f64, f64)) -> f64 {
    value.clamp(bounds.0, bounds.1)
}

fn clamp_age(value: u32, bounds: (u32, u32)) -> u32 {
    value.clamp(bounds.0, bounds.1)
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = Router::new()
        .route("/", get(index_handler))
        .route("/index.html", get(index_handler))
        .route("/styles.css", get(styles_handler))
        .route("/app.js", get(app_js_handler))
        .route(
            "/api/project",
            get(project_get_handler).post(project_post_handler),
        )
        .route("/api/params/save", post(save_params_handler))
        .route("/api/params/load", get(load_params_handler))
        .fallback(not_found_handler);

    let listener = TcpListener::bind(addr).await?;
    info!("HTTP API listening on http://{addr}");
    println!("Financial planning simulator on http://127.0.0.1:{port}/");

    axum::serve(listener, app).await
}

async fn index_handler() -> impl IntoResponse {
    with_cache_control(Html(INDEX_HTML))
}

async fn styles_handler() -> impl IntoResponse {
    with_cache_control((
        [(header::CONTENT_TYPE, "text/css; charset=utf-8")],
        STYLES_CSS,
    ))
}

async fn app_js_handler() -> impl IntoResponse {
    with_cache_control((
        [(
            header::CONTENT_TYPE,
            "application/javascript; charset=utf-8",
        )],
        APP_JS,
    ))
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn project_get_handler(Query(payload): Query<ProjectPayload>) -> Response {
    project_handler_impl(payload).await
}

async fn project_post_handler(Json(payload): Json<ProjectPayload>) -> Response {
    project_handler_impl(payload).await
}

async fn project_handler_impl(payload: ProjectPayload) -> Response {
    let (params, warnings) = params_from_payload(payload);
    for warning in &warnings {
        warn!("{warning}");
    }

    let result = project(&params);
    json_response(
        StatusCode::OK,
        ProjectResponse {
            retirement_age: params.retirement_age,
            adjust_for_inflation: params.adjust_for_inflation,
            warnings,
            points: result.points,
        },
    )
}

async fn save_params_handler(Json(request): Json<SaveRequest>) -> Response {
    let document = document_from_payload(request.params);
    match store::save_params(&request.filename, &document) {
        Ok(path) => json_response(
            StatusCode::OK,
            SaveResponse {
                saved_as: Some(path.display().to_string()),
                warnings: Vec::new(),
            },
        ),
        Err(e) => {
            let warning = format!("Could not save parameters to {}: {e}", request.filename);
            warn!("{warning}");
            json_response(
                StatusCode::OK,
                SaveResponse {
                    saved_as: None,
                    warnings: vec![warning],
                },
            )
        }
    }
}

async fn load_params_handler(Query(query): Query<LoadQuery>) -> Response {
    let (params, warning) = store::load_params(&query.file);
    let warnings: Vec<String> = warning.into_iter().collect();
    for warning in &warnings {
        warn!("{warning}");
    }
    json_response(StatusCode::OK, LoadResponse { params, warnings })
}

fn with_cache_control<R: IntoResponse>(response: R) -> Response {
    let mut response = response.into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        "no-store".parse().expect("valid header"),
    );
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        "no-store".parse().expect("valid header"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}
