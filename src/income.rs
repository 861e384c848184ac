// 💰 Income Formula - daily business income
//
//   daily_income = base_income * level_multiplier(level) * (1 + 0.2 * connections)
//
// connections is clamped to [0, 5], so the bonus tops out at +100%.
// The level curve belongs to the backend; `LevelCurve::default()` is the
// table the game currently ships and can be replaced wholesale.

use crate::entities::BusinessType;
use crate::units::{non_negative, round_ton};
use anyhow::{bail, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Tax rate of the lowest progressive tier
pub const BASE_TAX_RATE: f64 = 0.13;

// ============================================================================
// LEVEL CURVE
// ============================================================================

/// Income multiplier per business level (index 0 = level 1)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct LevelCurve {
    multipliers: Vec<f64>,
}

impl Default for LevelCurve {
    fn default() -> Self {
        LevelCurve {
            multipliers: vec![1.0, 1.2, 1.5, 1.8, 2.2, 2.7, 3.3, 4.0, 5.0, 6.5],
        }
    }
}

impl LevelCurve {
    /// Build a curve; multipliers must be finite, positive and non-decreasing
    pub fn new(multipliers: Vec<f64>) -> Result<Self> {
        if multipliers.is_empty() {
            bail!("Level curve must define at least one level");
        }

        for (i, m) in multipliers.iter().enumerate() {
            if !m.is_finite() || *m <= 0.0 {
                bail!("Level {} multiplier must be positive, got {}", i + 1, m);
            }
        }

        if multipliers.windows(2).any(|w| w[1] < w[0]) {
            bail!("Level curve must be non-decreasing");
        }

        Ok(LevelCurve { multipliers })
    }

    /// Build from a backend `{level: multiplier}` map (levels 1..=n, no gaps)
    pub fn from_levels(levels: &BTreeMap<u32, f64>) -> Result<Self> {
        for (expected, level) in (1u32..).zip(levels.keys()) {
            if *level != expected {
                bail!("Level curve has a gap: expected level {}, found {}", expected, level);
            }
        }
        LevelCurve::new(levels.values().copied().collect())
    }

    pub fn max_level(&self) -> u32 {
        self.multipliers.len() as u32
    }

    /// Multiplier for `level`, clamped into [1, max_level]
    pub fn multiplier(&self, level: i64) -> f64 {
        let max = self.multipliers.len() as i64;
        let clamped = level.clamp(1, max);

        if clamped != level {
            tracing::warn!(level, clamped, "business level out of range, clamping");
        }

        self.multipliers[(clamped - 1) as usize]
    }
}

impl TryFrom<Vec<f64>> for LevelCurve {
    type Error = anyhow::Error;

    fn try_from(multipliers: Vec<f64>) -> Result<Self> {
        LevelCurve::new(multipliers)
    }
}

impl From<LevelCurve> for Vec<f64> {
    fn from(curve: LevelCurve) -> Self {
        curve.multipliers
    }
}

// ============================================================================
// CONNECTION BONUS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionBonus {
    /// Bonus per connected neighbour (0.2 = +20%)
    pub per_connection: f64,

    pub max_connections: u32,
}

impl Default for ConnectionBonus {
    fn default() -> Self {
        ConnectionBonus {
            per_connection: 0.2,
            max_connections: 5,
        }
    }
}

impl ConnectionBonus {
    pub fn clamp(&self, connections: i64) -> u32 {
        connections.clamp(0, self.max_connections as i64) as u32
    }

    /// 1.0 at zero connections, monotonic up to the cap
    pub fn multiplier(&self, connections: i64) -> f64 {
        1.0 + self.per_connection * self.clamp(connections) as f64
    }
}

/// Connection multiplier with the game's default bonus
pub fn connection_multiplier(connections: i64) -> f64 {
    ConnectionBonus::default().multiplier(connections)
}

/// Daily income with the default level curve and connection bonus
pub fn daily_income(base_income: f64, level: i64, connections: i64) -> f64 {
    IncomeModel::default().daily_income(base_income, level, connections)
}

// ============================================================================
// BREAKDOWN & ACCRUAL
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IncomeBreakdown {
    pub gross: f64,
    pub operating_cost: f64,
    pub tax: f64,
    pub net: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Accrual {
    pub days: f64,
    pub gross: f64,
    pub tax: f64,
    pub net: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeTableRow {
    pub level: u32,
    pub multiplier: f64,
    pub gross: f64,
    pub operating_cost: f64,
    pub net: f64,
}

// ============================================================================
// INCOME MODEL
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeModel {
    pub levels: LevelCurve,
    pub connections: ConnectionBonus,
    pub tax_rate: f64,
}

impl Default for IncomeModel {
    fn default() -> Self {
        IncomeModel {
            levels: LevelCurve::default(),
            connections: ConnectionBonus::default(),
            tax_rate: BASE_TAX_RATE,
        }
    }
}

impl IncomeModel {
    pub fn new(levels: LevelCurve, connections: ConnectionBonus, tax_rate: f64) -> Self {
        IncomeModel {
            levels,
            connections,
            tax_rate,
        }
    }

    /// Gross daily income; malformed base income degrades to 0
    pub fn daily_income(&self, base_income: f64, level: i64, connections: i64) -> f64 {
        non_negative(base_income)
            * self.levels.multiplier(level)
            * self.connections.multiplier(connections)
    }

    /// Gross / operating cost / tax / net for one day of a catalog business
    pub fn breakdown(&self, business_type: BusinessType, level: i64, connections: i64) -> IncomeBreakdown {
        self.breakdown_with(
            business_type.base_income(),
            business_type.operating_cost(),
            level,
            connections,
        )
    }

    pub fn breakdown_with(
        &self,
        base_income: f64,
        operating_cost: f64,
        level: i64,
        connections: i64,
    ) -> IncomeBreakdown {
        let level_mult = self.levels.multiplier(level);
        let gross = self.daily_income(base_income, level, connections);
        let operating = non_negative(operating_cost) * level_mult;

        // No tax on a loss
        let profit = gross - operating;
        let rate = self.tax_rate.clamp(0.0, 1.0);
        let tax = profit.max(0.0) * rate;

        IncomeBreakdown {
            gross: round_ton(gross),
            operating_cost: round_ton(operating),
            tax: round_ton(tax),
            net: round_ton(profit - tax),
        }
    }

    /// Scale a daily breakdown by time elapsed since the last collection.
    ///
    /// Returns `None` when less than an hour has passed.
    pub fn accrue(
        &self,
        daily: &IncomeBreakdown,
        last_collection: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Option<Accrual> {
        let elapsed = now - last_collection;
        if elapsed < Duration::hours(1) {
            return None;
        }

        let days = elapsed.num_seconds() as f64 / 86_400.0;

        Some(Accrual {
            days,
            gross: daily.gross * days,
            tax: daily.tax * days,
            net: daily.net * days,
        })
    }

    /// One row per level at zero connections
    pub fn income_table(&self, business_type: BusinessType) -> Vec<IncomeTableRow> {
        (1..=self.levels.max_level())
            .map(|level| {
                let b = self.breakdown(business_type, level as i64, 0);
                IncomeTableRow {
                    level,
                    multiplier: self.levels.multiplier(level as i64),
                    gross: b.gross,
                    operating_cost: b.operating_cost,
                    net: b.net,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    #[test]
    fn test_no_connections_no_bonus() {
        assert_eq!(daily_income(10.0, 1, 0), 10.0);
        assert_eq!(connection_multiplier(0), 1.0);
    }

    #[test]
    fn test_five_connections_double_income() {
        assert_eq!(daily_income(10.0, 1, 5), 20.0);
    }

    #[test]
    fn test_connections_are_capped() {
        assert_eq!(daily_income(10.0, 1, 6), daily_income(10.0, 1, 5));
        assert_eq!(daily_income(10.0, 1, 100), 20.0);
        assert_eq!(daily_income(10.0, 1, -3), 10.0);
    }

    #[test]
    fn test_level_multiplier_applies() {
        assert_eq!(daily_income(10.0, 3, 0), 15.0);
        assert_eq!(daily_income(10.0, 10, 0), 65.0);
    }

    #[test]
    fn test_level_is_clamped() {
        let curve = LevelCurve::default();
        assert_eq!(curve.multiplier(0), 1.0);
        assert_eq!(curve.multiplier(-5), 1.0);
        assert_eq!(curve.multiplier(11), 6.5);
    }

    #[test]
    fn test_malformed_base_income_degrades_to_zero() {
        assert_eq!(daily_income(f64::NAN, 1, 2), 0.0);
        assert_eq!(daily_income(-4.0, 1, 2), 0.0);
    }

    #[test]
    fn test_level_curve_validation() {
        assert!(LevelCurve::new(vec![]).is_err());
        assert!(LevelCurve::new(vec![1.0, 0.9]).is_err());
        assert!(LevelCurve::new(vec![1.0, f64::NAN]).is_err());
        assert!(LevelCurve::new(vec![1.0, 1.0, 2.0]).is_ok());
    }

    #[test]
    fn test_level_curve_from_backend_levels() {
        let mut levels = BTreeMap::new();
        levels.insert(1, 1.0);
        levels.insert(2, 1.4);
        levels.insert(3, 2.0);

        let curve = LevelCurve::from_levels(&levels).unwrap();
        assert_eq!(curve.max_level(), 3);
        assert_eq!(curve.multiplier(2), 1.4);

        levels.insert(5, 3.0);
        assert!(LevelCurve::from_levels(&levels).is_err());
    }

    #[test]
    fn test_level_curve_json() {
        let curve: LevelCurve = serde_json::from_str("[1.0, 2.0]").unwrap();
        assert_eq!(curve.max_level(), 2);
        assert!(serde_json::from_str::<LevelCurve>("[2.0, 1.0]").is_err());
    }

    #[test]
    fn test_breakdown_for_farm() {
        let model = IncomeModel::default();
        let b = model.breakdown(BusinessType::Farm, 1, 0);

        // gross 2.4, operating 0.3, profit 2.1, tax 0.273
        assert_eq!(b.gross, 2.4);
        assert_eq!(b.operating_cost, 0.3);
        assert_eq!(b.tax, 0.27);
        assert_eq!(b.net, 1.83);
    }

    #[test]
    fn test_breakdown_loss_is_untaxed() {
        let model = IncomeModel::default();
        let b = model.breakdown_with(1.0, 3.0, 1, 0);

        assert_eq!(b.tax, 0.0);
        assert_eq!(b.net, -2.0);
    }

    #[test]
    fn test_accrual_skips_short_intervals() {
        let model = IncomeModel::default();
        let daily = model.breakdown(BusinessType::Shop, 1, 0);
        let last = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();

        assert!(model.accrue(&daily, last, last + Duration::minutes(59)).is_none());
        assert!(model.accrue(&daily, last, last - Duration::hours(3)).is_none());
    }

    #[test]
    fn test_accrual_scales_by_days() {
        let model = IncomeModel::default();
        let daily = model.breakdown(BusinessType::Shop, 1, 0);
        let last = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();

        let accrual = model.accrue(&daily, last, last + Duration::hours(36)).unwrap();

        assert_eq!(accrual.days, 1.5);
        assert!((accrual.gross - daily.gross * 1.5).abs() < 1e-9);
        assert!((accrual.net - daily.net * 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_income_table_has_row_per_level() {
        let model = IncomeModel::default();
        let table = model.income_table(BusinessType::Exchange);

        assert_eq!(table.len(), 10);
        assert_eq!(table[0].level, 1);
        assert_eq!(table[0].gross, 20.0);
        assert_eq!(table[9].gross, 130.0);
        assert!(table.windows(2).all(|w| w[1].net >= w[0].net));
    }

    proptest! {
        #[test]
        fn prop_income_monotonic_in_connections(
            base in 0.0f64..1000.0,
            level in 1i64..=10,
            c in 0i64..10,
        ) {
            prop_assert!(daily_income(base, level, c + 1) >= daily_income(base, level, c));
        }

        #[test]
        fn prop_net_plus_tax_matches_profit(level in 1i64..=10, c in 0i64..=5, i in 0usize..22) {
            let model = IncomeModel::default();
            let b = model.breakdown(BusinessType::ALL[i], level, c);

            prop_assert!((b.net + b.tax - (b.gross - b.operating_cost)).abs() <= 0.02);
        }
    }
}
