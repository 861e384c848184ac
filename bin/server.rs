// TON City - Web Server
// Read-only REST API over the local snapshot store and the formula modules

use anyhow::{Context, Result};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use chrono::Utc;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use tower_http::cors::CorsLayer;
use tracing_subscriber::EnvFilter;
use ton_city::{
    daily_withdrawal_rate, first_treasury_snapshot_time, get_all_plots, get_plot_by_coords,
    get_all_businesses, get_businesses_by_owner, get_plots_by_owner, latest_treasury_snapshot, revenue_report, setup_database, tax_tier,
    Business, BusinessType, EconomyConfig, IncomeBreakdown, IncomeTableRow, Plot, PlotStatus,
    TaxTier, Zone,
};

/// Shared application state
#[derive(Clone)]
struct AppState {
    db: Arc<Mutex<Connection>>,
    config: Arc<EconomyConfig>,
}

impl AppState {
    fn db(&self) -> Result<MutexGuard<'_, Connection>, ApiError> {
        self.db
            .lock()
            .map_err(|_| ApiError::internal("database lock poisoned"))
    }
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        tracing::error!(error = %e, "request failed");
        Self::internal(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(self.message),
        };
        (self.status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

/// Plot response (stored snapshot plus derived quote)
#[derive(Serialize)]
struct PlotResponse {
    x: i32,
    y: i32,
    zone: Zone,
    price: f64,
    owner: Option<String>,
    business_id: Option<String>,
    #[serde(flatten)]
    status: PlotStatus,
}

impl PlotResponse {
    fn from_plot(plot: &Plot, config: &EconomyConfig, viewer: Option<&str>) -> Self {
        let quote = plot.quote(&config.grid);
        Self {
            x: plot.x,
            y: plot.y,
            zone: quote.zone,
            price: quote.price,
            owner: plot.owner.clone(),
            business_id: plot.business_id.clone(),
            status: plot.status_for(viewer),
        }
    }
}

#[derive(Deserialize)]
struct ViewerQuery {
    viewer: Option<String>,
}

/// Business snapshot with its income at the current level and connections
#[derive(Serialize)]
struct BusinessResponse {
    #[serde(flatten)]
    business: Business,
    daily_income: f64,
    breakdown: IncomeBreakdown,
}

#[derive(Deserialize)]
struct OwnerQuery {
    owner: Option<String>,
}

#[derive(Deserialize)]
struct IncomeTableQuery {
    business: Option<String>,
}

#[derive(Serialize)]
struct IncomeTableResponse {
    business_type: BusinessType,
    tax_rate: f64,
    rows: Vec<IncomeTableRow>,
}

#[derive(Serialize)]
struct TaxResponse {
    market_share: f64,
    tier: TaxTier,
    label: &'static str,
    rate: f64,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/plots - All stored plots
async fn get_plots(
    State(state): State<AppState>,
    Query(query): Query<ViewerQuery>,
) -> ApiResult<Vec<PlotResponse>> {
    let plots = get_all_plots(&*state.db()?)?;

    let response = plots
        .iter()
        .map(|p| PlotResponse::from_plot(p, &state.config, query.viewer.as_deref()))
        .collect();

    Ok(Json(ApiResponse::ok(response)))
}

/// GET /api/plots/coords/:x/:y - One plot; unknown cells are quoted as available
async fn get_plot(
    State(state): State<AppState>,
    Path((x, y)): Path<(i32, i32)>,
    Query(query): Query<ViewerQuery>,
) -> ApiResult<PlotResponse> {
    if !state.config.grid.contains(x, y) {
        return Err(ApiError::new(
            StatusCode::NOT_FOUND,
            format!("Plot ({}, {}) is outside the grid", x, y),
        ));
    }

    let plot = get_plot_by_coords(&*state.db()?, x, y)?
        .unwrap_or_else(|| Plot::new(x, y, &state.config.grid));

    Ok(Json(ApiResponse::ok(PlotResponse::from_plot(
        &plot,
        &state.config,
        query.viewer.as_deref(),
    ))))
}

/// GET /api/plots/owner/:wallet - Plots owned by a wallet
async fn get_owner_plots(
    State(state): State<AppState>,
    Path(wallet): Path<String>,
) -> ApiResult<Vec<PlotResponse>> {
    // Decode URL-encoded wallet address
    let wallet = urlencoding::decode(&wallet)
        .map_err(|_| ApiError::new(StatusCode::BAD_REQUEST, "Invalid wallet encoding"))?
        .into_owned();

    let plots = get_plots_by_owner(&*state.db()?, &wallet)?;

    let response = plots
        .iter()
        .map(|p| PlotResponse::from_plot(p, &state.config, Some(&wallet)))
        .collect();

    Ok(Json(ApiResponse::ok(response)))
}

/// GET /api/businesses?owner=<wallet> - Stored businesses with their daily income
async fn get_businesses(
    State(state): State<AppState>,
    Query(query): Query<OwnerQuery>,
) -> ApiResult<Vec<BusinessResponse>> {
    let businesses = match query.owner.as_deref() {
        Some(owner) => get_businesses_by_owner(&*state.db()?, owner)?,
        None => get_all_businesses(&*state.db()?)?,
    };

    let model = state.config.income_model();
    let response = businesses
        .into_iter()
        .map(|business| BusinessResponse {
            daily_income: business.daily_income(&model),
            breakdown: business.breakdown(&model),
            business,
        })
        .collect();

    Ok(Json(ApiResponse::ok(response)))
}

/// GET /api/stats/income-table?business=<type>
async fn get_income_table(
    State(state): State<AppState>,
    Query(query): Query<IncomeTableQuery>,
) -> ApiResult<IncomeTableResponse> {
    let raw = query
        .business
        .ok_or_else(|| ApiError::new(StatusCode::BAD_REQUEST, "Missing business parameter"))?;

    let business_type: BusinessType = raw
        .parse()
        .map_err(|e: anyhow::Error| ApiError::new(StatusCode::BAD_REQUEST, e.to_string()))?;

    let model = state.config.income_model();

    Ok(Json(ApiResponse::ok(IncomeTableResponse {
        business_type,
        tax_rate: model.tax_rate,
        rows: model.income_table(business_type),
    })))
}

/// GET /api/tax/:share - Tax tier for a seller's market share (percent)
async fn get_tax(Path(share): Path<f64>) -> ApiResult<TaxResponse> {
    if !share.is_finite() {
        return Err(ApiError::new(StatusCode::BAD_REQUEST, "Market share must be a number"));
    }

    let tier = tax_tier(share);

    Ok(Json(ApiResponse::ok(TaxResponse {
        market_share: share,
        tier,
        label: tier.label(),
        rate: tier.rate(),
    })))
}

/// GET /api/admin/treasury-health - Assessment of the latest treasury snapshot
async fn get_treasury_health(State(state): State<AppState>) -> ApiResult<ton_city::TreasuryHealth> {
    let conn = state.db()?;

    let (_, stats) = latest_treasury_snapshot(&conn)?
        .ok_or_else(|| ApiError::new(StatusCode::NOT_FOUND, "No treasury snapshot recorded"))?;

    let now = Utc::now();
    let avg = daily_withdrawal_rate(&stats, first_treasury_snapshot_time(&conn)?, now);

    let health = state.config.treasury_engine().assess(&stats, Some(avg));

    Ok(Json(ApiResponse::ok(health)))
}

/// GET /api/admin/revenue-stats - Revenue breakdown of the latest treasury snapshot
async fn get_revenue_stats(State(state): State<AppState>) -> ApiResult<ton_city::RevenueReport> {
    let (_, stats) = latest_treasury_snapshot(&*state.db()?)?
        .ok_or_else(|| ApiError::new(StatusCode::NOT_FOUND, "No treasury snapshot recorded"))?;

    Ok(Json(ApiResponse::ok(revenue_report(&stats))))
}

// ============================================================================
// Main Server
// ============================================================================

fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/plots", get(get_plots))
        .route("/plots/coords/:x/:y", get(get_plot))
        .route("/plots/owner/:wallet", get(get_owner_plots))
        .route("/businesses", get(get_businesses))
        .route("/stats/income-table", get(get_income_table))
        .route("/tax/:share", get(get_tax))
        .route("/admin/treasury-health", get(get_treasury_health))
        .route("/admin/revenue-stats", get(get_revenue_stats))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = EconomyConfig::from_env()?;

    // Open database
    let db_path = std::env::var("TON_CITY_DB").unwrap_or_else(|_| "ton_city.db".to_string());
    let conn = Connection::open(&db_path)
        .with_context(|| format!("Failed to open database {}", db_path))?;
    setup_database(&conn)?;
    tracing::info!(path = %db_path, "database opened");

    // Create shared state
    let state = AppState {
        db: Arc::new(Mutex::new(conn)),
        config: Arc::new(config),
    };

    let app = build_router(state);

    // Start server
    let addr = std::env::var("TON_CITY_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    tracing::info!(%addr, "server running");

    axum::serve(listener, app)
        .await
        .context("Server error")?;

    Ok(())
}
