// TON City economy - Core Library
// Exposes all modules for use in CLI, API server, and tests

pub mod units;
pub mod projection;
pub mod pricing;
pub mod income;
pub mod tax;
pub mod treasury;
pub mod entities;
pub mod schema;         // Fail-closed snapshot validation
pub mod session;
pub mod config;
pub mod db;

// Re-export commonly used types
pub use units::{nano_to_ton, round_ton, ton_to_nano, NANOS_PER_TON};
pub use projection::{
    depth_sort, project, unproject,
    Camera, GridPoint, ScreenPoint, TileSize,
};
pub use pricing::{
    distance_from_center, plot_price, price_intensity, quote_plot, zone_for,
    GridConfig, PlotQuote, Zone,
};
pub use income::{
    connection_multiplier, daily_income,
    Accrual, ConnectionBonus, IncomeBreakdown, IncomeModel, IncomeTableRow, LevelCurve,
    BASE_TAX_RATE,
};
pub use tax::{
    market_share, tax_rate, tax_tier,
    FeeSchedule, TaxTier, WithdrawalError, WithdrawalQuote,
};
pub use treasury::{
    average_daily_withdrawals, daily_withdrawal_rate, revenue_report, treasury_health,
    DEFAULT_DAYS_ACTIVE, HealthLevel, RevenueReport, TreasuryEngine, TreasuryHealth, TreasuryStats, TreasuryThresholds,
};
pub use entities::{Business, BusinessType, Plot, PlotIndex, PlotStatus, User};
pub use schema::{SchemaValidator, ValidationError, ValidationResult};
pub use session::Session;
pub use config::EconomyConfig;
pub use db::{
    Event,
    setup_database, load_plots_csv, insert_plots, get_all_plots, get_plot_by_coords,
    get_plots_by_owner, record_purchase, count_plots,
    insert_businesses, get_all_businesses, get_businesses_by_owner,
    insert_treasury_snapshot, latest_treasury_snapshot, first_treasury_snapshot_time,
    insert_event, get_events_for_entity,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
