use axum::{
    Router,
    extract::{
        Json, Query,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::chart::{
    Annotation, ChartKind, annotations, format_dollars, format_percent, render_all, render_svg,
};
use crate::core::{
    AccumulationPlan, DISCLAIMER, FINAL_YEAR, ScenarioInputs, ScenarioResult, TaxDeferredSource,
    YearRow, run_scenario,
};

const INDEX_HTML: &str = include_str!("../../web/index.html");
const STYLES_CSS: &str = include_str!("../../web/styles.css");
const APP_JS: &str = include_str!("../../web/app.js");

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliBalanceMode {
    /// Grow the 401k from annual contributions
    Calculator,
    /// Use a known 401k balance
    Manual,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ApiBalanceMode {
    #[serde(alias = "calc", alias = "preloaded")]
    Calculator,
    Manual,
}

impl From<ApiBalanceMode> for CliBalanceMode {
    fn from(value: ApiBalanceMode) -> Self {
        match value {
            ApiBalanceMode::Calculator => CliBalanceMode::Calculator,
            ApiBalanceMode::Manual => CliBalanceMode::Manual,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SimulatePayload {
    balance_mode: Option<ApiBalanceMode>,
    accumulation_return: Option<f64>,
    contribution_years: Option<u32>,
    annual_contribution: Option<f64>,
    manual_balance: Option<f64>,

    other_assets: Option<f64>,
    annual_spending: Option<f64>,
    tax_deferred_portion: Option<f64>,
    retirement_return: Option<f64>,
    inflation: Option<f64>,
}

#[derive(Parser, Debug)]
#[command(
    name = "retire",
    about = "Retirement asset depletion estimator (401k + other assets, federal brackets)"
)]
struct Cli {
    #[arg(
        long,
        value_enum,
        default_value_t = CliBalanceMode::Calculator,
        help = "How the 401k balance at retirement is obtained"
    )]
    balance_mode: CliBalanceMode,
    #[arg(
        long,
        default_value_t = 1.06,
        help = "401k compounded return factor while contributing, e.g. 1.06 for 6%"
    )]
    accumulation_return: f64,
    #[arg(
        long,
        default_value_t = 25,
        help = "Number of years contributing to the 401k (0-50)"
    )]
    contribution_years: u32,
    #[arg(
        long,
        default_value_t = 30000.0,
        help = "Annual 401k contribution before retirement"
    )]
    annual_contribution: f64,
    #[arg(
        long,
        default_value_t = 500000.0,
        help = "Current 401k balance, used when --balance-mode=manual"
    )]
    manual_balance: f64,
    #[arg(
        long,
        default_value_t = 2000000.0,
        help = "Other assets at retirement excluding the 401k"
    )]
    other_assets: f64,
    #[arg(
        long,
        default_value_t = 100000.0,
        help = "Annual retirement spending in today's money"
    )]
    annual_spending: f64,
    #[arg(
        long,
        default_value_t = 0.5,
        help = "Share of spending drawn from the 401k (0-1)"
    )]
    tax_deferred_portion: f64,
    #[arg(
        long,
        default_value_t = 1.06,
        help = "Return factor on all assets during retirement, e.g. 1.06 for 6%"
    )]
    retirement_return: f64,
    #[arg(
        long,
        default_value_t = 1.03,
        help = "Inflation factor applied to spending, e.g. 1.03 for 3%"
    )]
    inflation: f64,
    #[arg(long, help = "Write the three charts as SVG files into this directory")]
    svg_dir: Option<PathBuf>,
    #[arg(long, default_value_t = false, help = "Print the JSON response instead of a table")]
    json: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ChartResponse {
    kind: ChartKind,
    title: &'static str,
    annotations: Vec<Annotation>,
    svg: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SimulateResponse {
    tax_deferred_balance: f64,
    tax_deferred_balance_display: String,
    years_simulated: usize,
    phase_a_years: usize,
    years: Vec<YearRow>,
    charts: Vec<ChartResponse>,
    disclaimer: &'static str,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

/// Growth factors above this (100% a year) are rejected.
const MAX_GROWTH_FACTOR: f64 = 2.0;

fn validate_factor(name: &str, value: f64) -> Result<(), String> {
    if !value.is_finite() || value <= 0.0 || value > MAX_GROWTH_FACTOR {
        return Err(format!(
            "{name} must be a growth factor in (0, {MAX_GROWTH_FACTOR}], e.g. 1.06"
        ));
    }
    Ok(())
}

fn build_inputs(cli: &Cli) -> Result<ScenarioInputs, String> {
    if cli.contribution_years > FINAL_YEAR {
        return Err(format!("--contribution-years must be between 0 and {FINAL_YEAR}"));
    }

    if !cli.annual_contribution.is_finite() || cli.annual_contribution < 0.0 {
        return Err("--annual-contribution must be >= 0".to_string());
    }

    if !cli.manual_balance.is_finite() {
        return Err("--manual-balance must be a finite amount".to_string());
    }

    if !cli.other_assets.is_finite() {
        return Err("--other-assets must be a finite amount".to_string());
    }

    if !cli.annual_spending.is_finite() || cli.annual_spending < 0.0 {
        return Err("--annual-spending must be >= 0".to_string());
    }

    if !(0.0..=1.0).contains(&cli.tax_deferred_portion) {
        return Err("--tax-deferred-portion must be between 0 and 1".to_string());
    }

    validate_factor("--accumulation-return", cli.accumulation_return)?;
    validate_factor("--retirement-return", cli.retirement_return)?;
    validate_factor("--inflation", cli.inflation)?;

    let tax_deferred = match cli.balance_mode {
        CliBalanceMode::Calculator => TaxDeferredSource::Accumulate(AccumulationPlan {
            return_factor: cli.accumulation_return,
            contribution_years: cli.contribution_years,
            annual_contribution: cli.annual_contribution,
        }),
        CliBalanceMode::Manual => TaxDeferredSource::Manual(cli.manual_balance),
    };

    Ok(ScenarioInputs {
        tax_deferred,
        other_assets: cli.other_assets,
        annual_spending: cli.annual_spending,
        tax_deferred_portion: cli.tax_deferred_portion,
        retirement_return: cli.retirement_return,
        inflation: cli.inflation,
    })
}

pub fn run_cli<I, T>(args: I) -> Result<(), String>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::parse_from(args);
    let inputs = build_inputs(&cli)?;
    let result = run_scenario(&inputs).map_err(|e| e.to_string())?;

    if let Some(dir) = &cli.svg_dir {
        write_svg_charts(dir, &result)?;
    }

    if cli.json {
        let response = build_simulate_response(&result);
        let json = serde_json::to_string_pretty(&response)
            .map_err(|e| format!("Failed to serialize response: {e}"))?;
        println!("{json}");
    } else {
        print!("{}", render_report(&result));
    }
    Ok(())
}

fn write_svg_charts(dir: &Path, result: &ScenarioResult) -> Result<(), String> {
    fs::create_dir_all(dir).map_err(|e| format!("Failed to create {}: {e}", dir.display()))?;
    for (kind, svg) in render_all(&result.series) {
        let path = dir.join(kind.file_name());
        fs::write(&path, svg)
            .map_err(|e| format!("Failed to write {}: {e}", path.display()))?;
        info!(path = %path.display(), "chart written");
    }
    Ok(())
}

fn balance_line(result: &ScenarioResult) -> String {
    format!(
        "Total Amount of 401k: {}",
        format_dollars(result.tax_deferred_at_retirement)
    )
}

fn render_report(result: &ScenarioResult) -> String {
    let mut out = String::new();
    out.push_str(&balance_line(result));
    out.push_str("\n\n");
    out.push_str(&format!(
        "{:>4}  {:>16}  {:>8}  {:>14}\n",
        "Year", "Total Assets", "Tax Rate", "Spending"
    ));
    for row in result.series.rows() {
        let tax_rate = row.tax_rate.map(format_percent).unwrap_or_else(|| "-".to_string());
        out.push_str(&format!(
            "{:>4}  {:>16}  {:>8}  {:>14}\n",
            row.year,
            format_dollars(row.total_assets),
            tax_rate,
            format_dollars(row.spending)
        ));
    }
    out.push('\n');
    out.push_str(DISCLAIMER);
    out.push('\n');
    out
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = Router::new()
        .route("/", get(index_handler))
        .route("/index.html", get(index_handler))
        .route("/styles.css", get(styles_handler))
        .route("/app.js", get(app_js_handler))
        .route(
            "/api/simulate",
            get(simulate_get_handler).post(simulate_post_handler),
        )
        .fallback(not_found_handler);

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "retirement estimator listening");
    info!("Local access: http://127.0.0.1:{port}/");

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

async fn simulate_get_handler(
    payload: Result<Query<SimulatePayload>, QueryRejection>,
) -> Response {
    match payload {
        Ok(Query(payload)) => simulate_handler_impl(payload).await,
        Err(e) => malformed_payload_response(&format!("Invalid API query string: {e}")),
    }
}

async fn simulate_post_handler(
    payload: Result<Json<SimulatePayload>, JsonRejection>,
) -> Response {
    match payload {
        Ok(Json(payload)) => simulate_handler_impl(payload).await,
        Err(e) => malformed_payload_response(&format!("Invalid API JSON payload: {e}")),
    }
}

fn malformed_payload_response(msg: &str) -> Response {
    warn!(error = %msg, "malformed simulate request");
    error_response(StatusCode::BAD_REQUEST, msg)
}

async fn simulate_handler_impl(payload: SimulatePayload) -> Response {
    let inputs = match inputs_from_payload(payload) {
        Ok(inputs) => inputs,
        Err(msg) => {
            warn!(error = %msg, "rejected simulate request");
            return error_response(StatusCode::BAD_REQUEST, &msg);
        }
    };

    match run_scenario(&inputs) {
        Ok(result) => json_response(StatusCode::OK, build_simulate_response(&result)),
        Err(e) => {
            warn!(error = %e, "simulation failed");
            error_response(StatusCode::UNPROCESSABLE_ENTITY, &e.to_string())
        }
    }
}

fn with_cache_control<R: IntoResponse>(response: R) -> Response {
    let mut response = response.into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    with_cache_control((status, Json(body)))
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
fn inputs_from_json(json: &str) -> Result<ScenarioInputs, String> {
    let payload = serde_json::from_str::<SimulatePayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    inputs_from_payload(payload)
}

fn inputs_from_payload(payload: SimulatePayload) -> Result<ScenarioInputs, String> {
    let mut cli = default_cli_for_api();

    if let Some(v) = payload.balance_mode {
        cli.balance_mode = v.into();
    }
    if let Some(v) = payload.accumulation_return {
        cli.accumulation_return = v;
    }
    if let Some(v) = payload.contribution_years {
        cli.contribution_years = v;
    }
    if let Some(v) = payload.annual_contribution {
        cli.annual_contribution = v;
    }
    if let Some(v) = payload.manual_balance {
        cli.manual_balance = v;
    }

    if let Some(v) = payload.other_assets {
        cli.other_assets = v;
    }
    if let Some(v) = payload.annual_spending {
        cli.annual_spending = v;
    }
    if let Some(v) = payload.tax_deferred_portion {
        cli.tax_deferred_portion = v;
    }
    if let Some(v) = payload.retirement_return {
        cli.retirement_return = v;
    }
    if let Some(v) = payload.inflation {
        cli.inflation = v;
    }

    build_inputs(&cli)
}

fn default_cli_for_api() -> Cli {
    Cli {
        balance_mode: CliBalanceMode::Calculator,
        accumulation_return: 1.06,
        contribution_years: 25,
        annual_contribution: 30_000.0,
        manual_balance: 500_000.0,
        other_assets: 2_000_000.0,
        annual_spending: 100_000.0,
        tax_deferred_portion: 0.5,
        retirement_return: 1.06,
        inflation: 1.03,
        svg_dir: None,
        json: false,
    }
}

fn build_simulate_response(result: &ScenarioResult) -> SimulateResponse {
    let series = &result.series;
    let charts = ChartKind::ALL
        .iter()
        .map(|&kind| ChartResponse {
            kind,
            title: kind.title(),
            annotations: annotations(kind, &kind.values(series)),
            svg: render_svg(kind, series),
        })
        .collect();

    SimulateResponse {
        tax_deferred_balance: result.tax_deferred_at_retirement,
        tax_deferred_balance_display: format_dollars(result.tax_deferred_at_retirement),
        years_simulated: series.len(),
        phase_a_years: series.phase_a_years(),
        years: series.rows(),
        charts,
        disclaimer: DISCLAIMER,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::extract::{FromRequest, FromRequestParts};
    use axum::http::Request;

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn sample_cli() -> Cli {
        default_cli_for_api()
    }

    #[test]
    fn cli_flag_defaults_match_api_defaults() {
        let parsed = Cli::try_parse_from(["retire"]).expect("defaults parse");
        let defaults = default_cli_for_api();
        assert_eq!(parsed.balance_mode, defaults.balance_mode);
        assert_eq!(parsed.contribution_years, defaults.contribution_years);
        assert_approx(parsed.accumulation_return, defaults.accumulation_return);
        assert_approx(parsed.annual_contribution, defaults.annual_contribution);
        assert_approx(parsed.manual_balance, defaults.manual_balance);
        assert_approx(parsed.other_assets, defaults.other_assets);
        assert_approx(parsed.annual_spending, defaults.annual_spending);
        assert_approx(parsed.tax_deferred_portion, defaults.tax_deferred_portion);
        assert_approx(parsed.retirement_return, defaults.retirement_return);
        assert_approx(parsed.inflation, defaults.inflation);
    }

    #[test]
    fn cli_parses_manual_mode_flags() {
        let cli = Cli::try_parse_from([
            "retire",
            "--balance-mode",
            "manual",
            "--manual-balance",
            "750000",
            "--tax-deferred-portion",
            "0.25",
        ])
        .expect("flags parse");
        let inputs = build_inputs(&cli).expect("valid inputs");
        assert_eq!(inputs.tax_deferred, TaxDeferredSource::Manual(750_000.0));
        assert_approx(inputs.tax_deferred_portion, 0.25);
    }

    #[test]
    fn build_inputs_uses_accumulation_plan_in_calculator_mode() {
        let inputs = build_inputs(&sample_cli()).expect("valid inputs");
        assert_eq!(
            inputs.tax_deferred,
            TaxDeferredSource::Accumulate(AccumulationPlan {
                return_factor: 1.06,
                contribution_years: 25,
                annual_contribution: 30_000.0,
            })
        );
    }

    #[test]
    fn build_inputs_rejects_portion_outside_unit_interval() {
        let mut cli = sample_cli();
        cli.tax_deferred_portion = 1.5;
        let err = build_inputs(&cli).expect_err("must reject portion > 1");
        assert!(err.contains("--tax-deferred-portion"));

        cli.tax_deferred_portion = -0.1;
        let err = build_inputs(&cli).expect_err("must reject negative portion");
        assert!(err.contains("--tax-deferred-portion"));
    }

    #[test]
    fn build_inputs_rejects_too_many_contribution_years() {
        let mut cli = sample_cli();
        cli.contribution_years = 51;
        let err = build_inputs(&cli).expect_err("must reject > 50 years");
        assert!(err.contains("--contribution-years"));
    }

    #[test]
    fn build_inputs_rejects_negative_spending() {
        let mut cli = sample_cli();
        cli.annual_spending = -1.0;
        let err = build_inputs(&cli).expect_err("must reject negative spending");
        assert!(err.contains("--annual-spending"));
    }

    #[test]
    fn build_inputs_rejects_non_positive_factors() {
        let mut cli = sample_cli();
        cli.inflation = 0.0;
        let err = build_inputs(&cli).expect_err("must reject zero inflation factor");
        assert!(err.contains("--inflation"));

        let mut cli = sample_cli();
        cli.retirement_return = f64::NAN;
        let err = build_inputs(&cli).expect_err("must reject NaN return factor");
        assert!(err.contains("--retirement-return"));
    }

    #[test]
    fn build_inputs_rejects_runaway_factors() {
        let mut cli = sample_cli();
        cli.inflation = 1e10;
        let err = build_inputs(&cli).expect_err("must reject extreme inflation factor");
        assert!(err.contains("--inflation"));

        let mut cli = sample_cli();
        cli.accumulation_return = MAX_GROWTH_FACTOR;
        assert!(build_inputs(&cli).is_ok());
        cli.accumulation_return = MAX_GROWTH_FACTOR + 0.01;
        let err = build_inputs(&cli).expect_err("must reject factor above the cap");
        assert!(err.contains("--accumulation-return"));
    }

    #[test]
    fn inputs_from_json_parses_web_keys() {
        let json = r#"{
          "balanceMode": "manual",
          "manualBalance": 640000,
          "otherAssets": 1500000,
          "annualSpending": 90000,
          "taxDeferredPortion": 0.4,
          "retirementReturn": 1.05,
          "inflation": 1.025
        }"#;
        let inputs = inputs_from_json(json).expect("json should parse");

        assert_eq!(inputs.tax_deferred, TaxDeferredSource::Manual(640_000.0));
        assert_approx(inputs.other_assets, 1_500_000.0);
        assert_approx(inputs.annual_spending, 90_000.0);
        assert_approx(inputs.tax_deferred_portion, 0.4);
        assert_approx(inputs.retirement_return, 1.05);
        assert_approx(inputs.inflation, 1.025);
    }

    #[test]
    fn inputs_from_json_defaults_missing_keys() {
        let inputs = inputs_from_json(r#"{"contributionYears": 10}"#).expect("json should parse");
        assert_eq!(
            inputs.tax_deferred,
            TaxDeferredSource::Accumulate(AccumulationPlan {
                return_factor: 1.06,
                contribution_years: 10,
                annual_contribution: 30_000.0,
            })
        );
        assert_approx(inputs.other_assets, 2_000_000.0);
    }

    #[test]
    fn inputs_from_json_reports_validation_errors() {
        let err = inputs_from_json(r#"{"taxDeferredPortion": 2}"#).expect_err("must reject");
        assert!(err.contains("--tax-deferred-portion"));
    }

    #[test]
    fn simulate_response_serialization_contains_expected_fields() {
        let inputs = build_inputs(&sample_cli()).expect("valid inputs");
        let result = run_scenario(&inputs).expect("valid scenario");
        let response = build_simulate_response(&result);
        assert_eq!(response.years.len(), result.series.len());
        assert_eq!(response.charts.len(), 3);
        assert_eq!(response.tax_deferred_balance_display, "$1,744,691");

        let json = serde_json::to_string(&response).expect("response should serialize");
        assert!(json.contains("\"taxDeferredBalance\""));
        assert!(json.contains("\"taxDeferredBalanceDisplay\""));
        assert!(json.contains("\"yearsSimulated\""));
        assert!(json.contains("\"phaseAYears\""));
        assert!(json.contains("\"totalAssets\""));
        assert!(json.contains("\"taxRate\""));
        assert!(json.contains("\"annotations\""));
        assert!(json.contains("\"svg\""));
        assert!(json.contains("\"disclaimer\""));
    }

    #[test]
    fn report_lists_balance_rows_and_disclaimer() {
        let mut cli = sample_cli();
        cli.balance_mode = CliBalanceMode::Manual;
        cli.manual_balance = 100_000.0;
        let inputs = build_inputs(&cli).expect("valid inputs");
        let result = run_scenario(&inputs).expect("valid scenario");
        let report = render_report(&result);

        assert!(report.starts_with("Total Amount of 401k: $100,000\n"));
        assert!(report.contains("$103,000"));
        assert!(report.trim_end().ends_with(DISCLAIMER));
        let data_rows = report.lines().filter(|line| {
            line.trim_start()
                .split_whitespace()
                .next()
                .is_some_and(|first| first.parse::<u32>().is_ok())
        });
        assert_eq!(data_rows.count(), result.series.len());
    }

    #[test]
    fn svg_charts_are_written_to_directory() {
        let dir = std::env::temp_dir().join(format!("retire-charts-{}", std::process::id()));
        let inputs = build_inputs(&sample_cli()).expect("valid inputs");
        let result = run_scenario(&inputs).expect("valid scenario");
        write_svg_charts(&dir, &result).expect("charts written");
        for kind in ChartKind::ALL {
            let svg = fs::read_to_string(dir.join(kind.file_name())).expect("chart exists");
            assert!(svg.contains(kind.title()));
        }
        fs::remove_dir_all(&dir).expect("cleanup");
    }

    #[test]
    fn every_form_field_carries_help_text() {
        for name in [
            "accumulationReturn",
            "contributionYears",
            "annualContribution",
            "manualBalance",
            "otherAssets",
            "annualSpending",
            "taxDeferredPortion",
            "retirementReturn",
            "inflation",
        ] {
            let start = INDEX_HTML
                .find(&format!("name=\"{name}\""))
                .unwrap_or_else(|| panic!("missing input {name}"));
            let tag_end = start + INDEX_HTML[start..].find('>').expect("input tag closes");
            assert!(
                INDEX_HTML[start..tag_end].contains("title=\""),
                "{name} has no help text"
            );
        }
    }

    async fn assert_json_bad_request(response: Response, expected_prefix: &str) {
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response
                .headers()
                .get(header::CACHE_CONTROL)
                .and_then(|v| v.to_str().ok()),
            Some("no-store")
        );
        assert!(
            response
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .is_some_and(|v| v.starts_with("application/json"))
        );
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should be readable");
        let json: serde_json::Value = serde_json::from_slice(&body).expect("body is JSON");
        let error = json["error"].as_str().expect("error field is a string");
        assert!(error.starts_with(expected_prefix), "unexpected error: {error}");
    }

    fn post_request(body: &'static str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/simulate")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .expect("valid request")
    }

    #[tokio::test]
    async fn post_with_unknown_balance_mode_returns_json_400() {
        let payload = Json::<SimulatePayload>::from_request(
            post_request(r#"{"balanceMode":"guess"}"#),
            &(),
        )
        .await;
        assert!(payload.is_err());
        let response = simulate_post_handler(payload).await;
        assert_json_bad_request(response, "Invalid API JSON payload").await;
    }

    #[tokio::test]
    async fn post_with_broken_json_returns_json_400() {
        let payload = Json::<SimulatePayload>::from_request(post_request("{not json"), &()).await;
        let response = simulate_post_handler(payload).await;
        assert_json_bad_request(response, "Invalid API JSON payload").await;
    }

    #[tokio::test]
    async fn get_with_negative_years_returns_json_400() {
        let request = Request::builder()
            .uri("/api/simulate?contributionYears=-1")
            .body(Body::empty())
            .expect("valid request");
        let (mut parts, _) = request.into_parts();
        let payload = Query::<SimulatePayload>::from_request_parts(&mut parts, &()).await;
        assert!(payload.is_err());
        let response = simulate_get_handler(payload).await;
        assert_json_bad_request(response, "Invalid API query string").await;
    }

    #[tokio::test]
    async fn post_with_out_of_range_portion_returns_json_400() {
        let payload = Json::<SimulatePayload>::from_request(
            post_request(r#"{"taxDeferredPortion":2}"#),
            &(),
        )
        .await;
        let response = simulate_post_handler(payload).await;
        assert_json_bad_request(response, "--tax-deferred-portion").await;
    }

    #[tokio::test]
    async fn get_with_valid_query_returns_series() {
        let request = Request::builder()
            .uri("/api/simulate?balanceMode=manual&manualBalance=250000")
            .body(Body::empty())
            .expect("valid request");
        let (mut parts, _) = request.into_parts();
        let payload = Query::<SimulatePayload>::from_request_parts(&mut parts, &()).await;
        let response = simulate_get_handler(payload).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should be readable");
        let json: serde_json::Value = serde_json::from_slice(&body).expect("body is JSON");
        assert_eq!(json["taxDeferredBalanceDisplay"], "$250,000");
    }
}
