use axum::{
    Router,
    extract::{Json, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use clap::{Args, Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::core::report::{BreakdownSlice, TierDetail, format_money, profit_breakdown, tier_details};
use crate::core::{
    AccountTier, CalcError, CalculationRecord, CompoundingEngine, DailySimulationResult,
    DepositRange, PlanCatalog, ReinvestSplit,
};

pub const DEFAULT_PORT: u16 = 8080;

#[derive(Parser, Debug)]
#[command(
    name = "matrix-calc",
    about = "Tiered deposit calculator with daily compounding of cash and equity profit"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a single calculation and print the result
    Calc(CalcArgs),
    /// Serve the JSON API
    Serve {
        #[arg(default_value_t = DEFAULT_PORT)]
        port: u16,
    },
}

#[derive(Args, Debug, Clone)]
pub struct CalcArgs {
    #[arg(long, allow_negative_numbers = true, help = "One-time deposit amount")]
    pub deposit: f64,
    #[arg(
        long,
        default_value_t = false,
        help = "Reinvest all daily profit instead of the tier's default split"
    )]
    pub reinvest: bool,
    #[arg(long, default_value_t = false, help = "List every field of the account tier")]
    pub details: bool,
    #[arg(long, default_value_t = false, help = "Print the day-by-day schedule")]
    pub schedule: bool,
    #[arg(long, default_value_t = false, help = "Print the result as JSON")]
    pub json: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct CalculatePayload {
    deposit: Option<f64>,
    reinvest: Option<bool>,
    include_schedule: Option<bool>,
}

#[derive(Copy, Clone, Debug, PartialEq)]
struct CalcRequest {
    deposit: f64,
    reinvest: bool,
    include_schedule: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CalculateResponse {
    account_type: &'static str,
    duration_months: u32,
    duration_days: usize,
    deposit_amount: f64,
    bonus_amount: f64,
    total_investment: f64,
    split: ReinvestSplit,
    cash_profit: f64,
    equity_profit: f64,
    total_profit: f64,
    first_cash_withdrawal_day: Option<usize>,
    tier: AccountTier,
    tier_details: Vec<TierDetail>,
    breakdown: Vec<BreakdownSlice>,
    #[serde(skip_serializing_if = "Option::is_none")]
    schedule: Option<DailySimulationResult>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TiersResponse {
    total_range: DepositRange,
    total_range_label: String,
    tiers: Vec<AccountTier>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HistoryResponse {
    count: usize,
    current: Option<CalculateResponse>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Clone, Default)]
struct AppState {
    engine: Arc<Mutex<CompoundingEngine>>,
}

fn build_request(
    catalog: &PlanCatalog,
    deposit: f64,
    reinvest: bool,
    include_schedule: bool,
) -> Result<CalcRequest, CalcError> {
    let deposit = catalog.validate_deposit(deposit)?;
    Ok(CalcRequest {
        deposit,
        reinvest,
        include_schedule,
    })
}

fn api_request_from_payload(
    catalog: &PlanCatalog,
    payload: CalculatePayload,
) -> Result<CalcRequest, String> {
    let Some(deposit) = payload.deposit else {
        return Err("deposit is required".to_string());
    };
    build_request(
        catalog,
        deposit,
        payload.reinvest.unwrap_or(false),
        payload.include_schedule.unwrap_or(false),
    )
    .map_err(|e| e.to_string())
}

fn build_calculate_response(
    record: &CalculationRecord,
    include_schedule: bool,
) -> CalculateResponse {
    CalculateResponse {
        account_type: record.tier.name,
        duration_months: record.tier.duration_months,
        duration_days: record.simulation.days(),
        deposit_amount: record.position.deposit_amount,
        bonus_amount: record.position.bonus_amount,
        total_investment: record.position.total_investment(),
        split: record.split,
        cash_profit: record.total_cash_profit(),
        equity_profit: record.total_equity_profit(),
        total_profit: record.total_profit(),
        first_cash_withdrawal_day: record.simulation.first_withdrawable_day(),
        tier: record.tier,
        tier_details: tier_details(&record.tier),
        breakdown: profit_breakdown(record),
        schedule: include_schedule.then(|| record.simulation.clone()),
    }
}

fn build_tiers_response(catalog: &PlanCatalog) -> TiersResponse {
    let total_range = catalog.total_range();
    TiersResponse {
        total_range,
        total_range_label: total_range.to_string(),
        tiers: catalog.tiers().to_vec(),
    }
}

fn status_for(err: &CalcError) -> StatusCode {
    match err {
        CalcError::InvalidArgument { .. } | CalcError::OutOfRange { .. } => {
            StatusCode::BAD_REQUEST
        }
        CalcError::NoMatchingTier { .. } => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

pub fn run_calc(args: &CalcArgs) -> Result<String, String> {
    let mut engine = CompoundingEngine::default();
    let request = build_request(engine.catalog(), args.deposit, args.reinvest, args.schedule)
        .map_err(|e| e.to_string())?;
    let record = engine
        .simulate(request.deposit, request.reinvest)
        .map_err(|e| e.to_string())?;

    if args.json {
        let response = build_calculate_response(&record, request.include_schedule);
        return serde_json::to_string_pretty(&response)
            .map_err(|e| format!("Failed to serialize result: {e}"));
    }

    let mut out = render_summary(&record);
    if args.details {
        out.push('\n');
        out.push_str(&render_details(&record.tier));
    }
    if request.include_schedule {
        out.push('\n');
        out.push_str(&render_schedule(&record.simulation));
    }
    Ok(out)
}

fn render_summary(record: &CalculationRecord) -> String {
    let rows = [
        ("Account type", record.tier.name.to_string()),
        ("Duration", format!("{} months", record.tier.duration_months)),
        ("Initial investment", format_money(record.position.deposit_amount)),
        ("Bonus", format_money(record.position.bonus_amount)),
        ("Total investment", format_money(record.position.total_investment())),
        ("Compound ratio", record.split.to_string()),
        ("Cash profit", format_money(record.total_cash_profit())),
        ("Equity profit", format_money(record.total_equity_profit())),
        ("Total profit", format_money(record.total_profit())),
    ];

    let mut out = String::new();
    for (label, value) in rows {
        let _ = writeln!(out, "{:<20}{value}", format!("{label}:"));
    }
    match record.simulation.first_withdrawable_day() {
        Some(day) => {
            let _ = writeln!(out, "{:<20}day {day}", "Cash withdrawable:");
        }
        None => {
            let _ = writeln!(out, "{:<20}never", "Cash withdrawable:");
        }
    }
    out
}

fn render_details(tier: &AccountTier) -> String {
    let mut out = String::new();
    for detail in tier_details(tier) {
        let _ = writeln!(out, "{:<20}{}", detail.label, detail.value);
    }
    out
}

fn render_schedule(simulation: &DailySimulationResult) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>5} {:>14} {:>14} {:>16} {:>16}",
        "day", "cash", "equity", "cash balance", "equity balance"
    );
    for day in 0..simulation.days() {
        let _ = writeln!(
            out,
            "{:>5} {:>14.2} {:>14.2} {:>16.2} {:>16.2}",
            day + 1,
            simulation.cash_additions[day],
            simulation.equity_additions[day],
            simulation.cash_balances[day],
            simulation.equity_balances[day],
        );
    }
    out
}

fn app(state: AppState) -> Router {
    Router::new()
        .route("/api/tiers", get(tiers_handler))
        .route(
            "/api/calculate",
            get(calculate_get_handler).post(calculate_post_handler),
        )
        .route("/api/history", get(history_handler))
        .fallback(not_found_handler)
        .with_state(state)
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "matrix calculator API listening");
    info!("Local access: http://127.0.0.1:{port}/api/tiers");

    axum::serve(listener, app(AppState::default())).await
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn tiers_handler(State(state): State<AppState>) -> Response {
    let Ok(engine) = state.engine.lock() else {
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error");
    };
    json_response(StatusCode::OK, build_tiers_response(engine.catalog()))
}

async fn history_handler(State(state): State<AppState>) -> Response {
    let Ok(engine) = state.engine.lock() else {
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error");
    };
    let response = HistoryResponse {
        count: engine.history().len(),
        current: engine
            .current_calculation()
            .map(|record| build_calculate_response(record, false)),
    };
    json_response(StatusCode::OK, response)
}

async fn calculate_get_handler(
    State(state): State<AppState>,
    Query(payload): Query<CalculatePayload>,
) -> Response {
    calculate_handler_impl(&state, payload)
}

async fn calculate_post_handler(
    State(state): State<AppState>,
    Json(payload): Json<CalculatePayload>,
) -> Response {
    calculate_handler_impl(&state, payload)
}

fn calculate_handler_impl(state: &AppState, payload: CalculatePayload) -> Response {
    let Ok(mut engine) = state.engine.lock() else {
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error");
    };

    let request = match api_request_from_payload(engine.catalog(), payload) {
        Ok(request) => request,
        Err(msg) => {
            warn!(%msg, "rejected calculation request");
            return error_response(StatusCode::BAD_REQUEST, &msg);
        }
    };

    match engine.simulate(request.deposit, request.reinvest) {
        Ok(record) => json_response(
            StatusCode::OK,
            build_calculate_response(&record, request.include_schedule),
        ),
        Err(err) => {
            warn!(%err, "calculation failed");
            error_response(status_for(&err), &err.to_string())
        }
    }
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
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

#[cfg(test)]
fn api_request_from_json(json: &str) -> Result<CalcRequest, String> {
    let payload = serde_json::from_str::<CalculatePayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    api_request_from_payload(&PlanCatalog::standard(), payload)
}
