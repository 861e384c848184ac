// 🏛️ Treasury Health - advisory risk level over aggregate ledger totals
//
//   totalIncome = plot_sales + building_sales + total_tax + withdrawal_fees
//   netTreasury = totalIncome + deposits - withdrawals
//   available   = netTreasury - pending_withdrawals
//
// The level only colors the admin view. It never blocks a withdrawal.

use crate::units::non_negative;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// TREASURY STATS (backend snapshot)
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreasuryStats {
    pub plot_sales_income: f64,
    pub building_sales_income: f64,
    pub total_tax: f64,
    pub withdrawal_fees: f64,
    pub total_deposits: f64,
    pub total_withdrawals: f64,
    pub pending_withdrawals_amount: f64,

    // Counters shown next to the revenue lines
    pub total_plot_sales: u64,
    pub total_buildings_sold: u64,
    pub deposits_count: u64,
    pub withdrawals_count: u64,

    /// Days since the first backend transaction
    pub days_active: Option<u32>,
}

/// Averaging window when the backend reports no active period
pub const DEFAULT_DAYS_ACTIVE: u32 = 30;

impl TreasuryStats {
    /// Copy with every amount forced to a finite, non-negative value
    pub fn sanitized(&self) -> TreasuryStats {
        TreasuryStats {
            plot_sales_income: non_negative(self.plot_sales_income),
            building_sales_income: non_negative(self.building_sales_income),
            total_tax: non_negative(self.total_tax),
            withdrawal_fees: non_negative(self.withdrawal_fees),
            total_deposits: non_negative(self.total_deposits),
            total_withdrawals: non_negative(self.total_withdrawals),
            pending_withdrawals_amount: non_negative(self.pending_withdrawals_amount),
            ..self.clone()
        }
    }

    pub fn total_income(&self) -> f64 {
        self.plot_sales_income + self.building_sales_income + self.total_tax + self.withdrawal_fees
    }

    pub fn net_treasury(&self) -> f64 {
        self.total_income() + self.total_deposits - self.total_withdrawals
    }

    /// Lifetime withdrawals spread over `days_active` (0 counts as the default window)
    pub fn average_daily_withdrawals(&self) -> Option<f64> {
        self.days_active.map(|days| {
            let days = if days == 0 { DEFAULT_DAYS_ACTIVE } else { days };
            non_negative(self.total_withdrawals) / days as f64
        })
    }

    pub fn available(&self) -> f64 {
        self.net_treasury() - self.pending_withdrawals_amount
    }
}

// ============================================================================
// HEALTH LEVEL
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthLevel {
    Healthy,
    Caution,
    Warning,
    Critical,
}

impl HealthLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthLevel::Healthy => "healthy",
            HealthLevel::Caution => "caution",
            HealthLevel::Warning => "warning",
            HealthLevel::Critical => "critical",
        }
    }
}

impl fmt::Display for HealthLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreasuryThresholds {
    /// available below withdrawals × warning_ratio → warning
    pub warning_ratio: f64,

    /// available below withdrawals × caution_ratio → caution
    pub caution_ratio: f64,

    /// Runway is only worth showing below this many days
    pub runway_display_days: i64,

    /// Floor for the daily withdrawal rate in the runway division
    pub epsilon: f64,
}

impl Default for TreasuryThresholds {
    fn default() -> Self {
        TreasuryThresholds {
            warning_ratio: 0.10,
            caution_ratio: 0.30,
            runway_display_days: 30,
            epsilon: 1e-9,
        }
    }
}

// ============================================================================
// HEALTH REPORT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreasuryHealth {
    pub total_income: f64,
    pub net_treasury: f64,
    pub available: f64,
    pub level: HealthLevel,

    /// Whole days until `available` runs out at the average withdrawal rate
    pub runway_days: Option<i64>,

    /// Whether the runway belongs on screen
    pub show_runway: bool,
}

impl TreasuryHealth {
    pub fn is_healthy(&self) -> bool {
        self.level == HealthLevel::Healthy
    }

    pub fn summary(&self) -> String {
        let mut s = format!(
            "Treasury {}: income {:.2} TON, net {:.2} TON, available {:.2} TON",
            self.level, self.total_income, self.net_treasury, self.available
        );
        if let (true, Some(days)) = (self.show_runway, self.runway_days) {
            s.push_str(&format!(", runway {} days", days));
        }
        s
    }
}

// ============================================================================
// TREASURY ENGINE
// ============================================================================

pub struct TreasuryEngine {
    pub thresholds: TreasuryThresholds,
}

impl TreasuryEngine {
    pub fn new() -> Self {
        TreasuryEngine {
            thresholds: TreasuryThresholds::default(),
        }
    }

    pub fn with_thresholds(thresholds: TreasuryThresholds) -> Self {
        TreasuryEngine { thresholds }
    }

    pub fn classify(&self, available: f64, total_withdrawals: f64) -> HealthLevel {
        if available < 0.0 {
            HealthLevel::Critical
        } else if available < total_withdrawals * self.thresholds.warning_ratio {
            HealthLevel::Warning
        } else if available < total_withdrawals * self.thresholds.caution_ratio {
            HealthLevel::Caution
        } else {
            HealthLevel::Healthy
        }
    }

    /// Floor of available / max(epsilon, avg_daily_withdrawals); 0 when nothing is left
    pub fn runway_days(&self, available: f64, avg_daily_withdrawals: f64) -> i64 {
        if available <= 0.0 {
            return 0;
        }
        let rate = non_negative(avg_daily_withdrawals).max(self.thresholds.epsilon);
        let days = (available / rate).floor();

        if days >= i64::MAX as f64 {
            i64::MAX
        } else {
            days as i64
        }
    }

    /// Assess a snapshot. `avg_daily_withdrawals` enables the runway estimate.
    pub fn assess(&self, stats: &TreasuryStats, avg_daily_withdrawals: Option<f64>) -> TreasuryHealth {
        let stats = stats.sanitized();

        let total_income = stats.total_income();
        let net_treasury = stats.net_treasury();
        let available = stats.available();
        let level = self.classify(available, stats.total_withdrawals);

        let runway_days = avg_daily_withdrawals.map(|rate| self.runway_days(available, rate));
        let show_runway = level != HealthLevel::Healthy
            && runway_days.is_some_and(|d| d < self.thresholds.runway_display_days);

        TreasuryHealth {
            total_income,
            net_treasury,
            available,
            level,
            runway_days,
            show_runway,
        }
    }
}

impl Default for TreasuryEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Classify with default thresholds and no runway
pub fn treasury_health(stats: &TreasuryStats) -> TreasuryHealth {
    TreasuryEngine::new().assess(stats, None)
}

/// Daily withdrawal rate for the runway estimate.
///
/// Uses the backend's `days_active` when present. Otherwise local snapshot
/// history is used once it spans a full day, and the default window before that.
pub fn daily_withdrawal_rate(
    stats: &TreasuryStats,
    history_since: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> f64 {
    if let Some(avg) = stats.average_daily_withdrawals() {
        return avg;
    }

    match history_since {
        Some(since) if now - since >= Duration::days(1) => {
            average_daily_withdrawals(stats.total_withdrawals, since, now)
        }
        _ => non_negative(stats.total_withdrawals) / DEFAULT_DAYS_ACTIVE as f64,
    }
}

/// Average daily withdrawals since launch (at least one day elapsed)
pub fn average_daily_withdrawals(total_withdrawals: f64, launched_at: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let days = ((now - launched_at).num_seconds() as f64 / 86_400.0).max(1.0);
    non_negative(total_withdrawals) / days
}

// ============================================================================
// REVENUE BREAKDOWN
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevenueSource {
    PlotSales,
    BuildingSales,
    Taxes,
    WithdrawalFees,
}

impl RevenueSource {
    pub fn label(&self) -> &'static str {
        match self {
            RevenueSource::PlotSales => "Plot sales",
            RevenueSource::BuildingSales => "Building sales",
            RevenueSource::Taxes => "Taxes",
            RevenueSource::WithdrawalFees => "Withdrawal fees",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueLine {
    pub source: RevenueSource,
    pub amount: f64,
    /// Number of transactions behind the amount (taxes have none)
    pub count: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueReport {
    pub lines: Vec<RevenueLine>,
    pub total_revenue: f64,
    pub total_deposits: f64,
    pub deposits_count: u64,
    pub average_deposit: f64,
}

pub fn revenue_report(stats: &TreasuryStats) -> RevenueReport {
    let stats = stats.sanitized();

    let lines = vec![
        RevenueLine {
            source: RevenueSource::PlotSales,
            amount: stats.plot_sales_income,
            count: Some(stats.total_plot_sales),
        },
        RevenueLine {
            source: RevenueSource::BuildingSales,
            amount: stats.building_sales_income,
            count: Some(stats.total_buildings_sold),
        },
        RevenueLine {
            source: RevenueSource::Taxes,
            amount: stats.total_tax,
            count: None,
        },
        RevenueLine {
            source: RevenueSource::WithdrawalFees,
            amount: stats.withdrawal_fees,
            count: Some(stats.withdrawals_count),
        },
    ];

    let total_revenue = lines.iter().map(|l| l.amount).sum();
    let average_deposit = if stats.deposits_count > 0 {
        stats.total_deposits / stats.deposits_count as f64
    } else {
        0.0
    };

    RevenueReport {
        lines,
        total_revenue,
        total_deposits: stats.total_deposits,
        deposits_count: stats.deposits_count,
        average_deposit,
    }
}
