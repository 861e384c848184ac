// 🏭 Business Entity - structures built on owned plots
//
// The backend owns every business; this is a read-only snapshot. Base income
// and operating cost default to the game's catalog when the payload omits
// them.

use crate::income::{IncomeBreakdown, IncomeModel};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// BUSINESS TYPE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BusinessType {
    Farm,
    PowerPlant,
    Quarry,
    OilRig,
    Mine,
    Factory,
    ConstructionCompany,
    Refinery,
    SteelMill,
    TextileFactory,
    Shop,
    Restaurant,
    Hotel,
    Hospital,
    University,
    LogisticsCenter,
    GasStation,
    Bank,
    Exchange,
    TechHub,
    DataCenter,
    Insurance,
}

impl BusinessType {
    pub const ALL: [BusinessType; 22] = [
        BusinessType::Farm,
        BusinessType::PowerPlant,
        BusinessType::Quarry,
        BusinessType::OilRig,
        BusinessType::Mine,
        BusinessType::Factory,
        BusinessType::ConstructionCompany,
        BusinessType::Refinery,
        BusinessType::SteelMill,
        BusinessType::TextileFactory,
        BusinessType::Shop,
        BusinessType::Restaurant,
        BusinessType::Hotel,
        BusinessType::Hospital,
        BusinessType::University,
        BusinessType::LogisticsCenter,
        BusinessType::GasStation,
        BusinessType::Bank,
        BusinessType::Exchange,
        BusinessType::TechHub,
        BusinessType::DataCenter,
        BusinessType::Insurance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BusinessType::Farm => "farm",
            BusinessType::PowerPlant => "power_plant",
            BusinessType::Quarry => "quarry",
            BusinessType::OilRig => "oil_rig",
            BusinessType::Mine => "mine",
            BusinessType::Factory => "factory",
            BusinessType::ConstructionCompany => "construction_company",
            BusinessType::Refinery => "refinery",
            BusinessType::SteelMill => "steel_mill",
            BusinessType::TextileFactory => "textile_factory",
            BusinessType::Shop => "shop",
            BusinessType::Restaurant => "restaurant",
            BusinessType::Hotel => "hotel",
            BusinessType::Hospital => "hospital",
            BusinessType::University => "university",
            BusinessType::LogisticsCenter => "logistics_center",
            BusinessType::GasStation => "gas_station",
            BusinessType::Bank => "bank",
            BusinessType::Exchange => "exchange",
            BusinessType::TechHub => "tech_hub",
            BusinessType::DataCenter => "data_center",
            BusinessType::Insurance => "insurance",
        }
    }

    /// Daily base income at level 1 with no connections (TON)
    pub fn base_income(&self) -> f64 {
        match self {
            BusinessType::Farm => 2.4,
            BusinessType::PowerPlant => 2.4,
            BusinessType::Quarry => 6.0,
            BusinessType::OilRig => 8.0,
            BusinessType::Mine => 7.0,
            BusinessType::Factory => 2.88,
            BusinessType::ConstructionCompany => 5.0,
            BusinessType::Refinery => 10.0,
            BusinessType::SteelMill => 9.0,
            BusinessType::TextileFactory => 4.0,
            BusinessType::Shop => 4.8,
            BusinessType::Restaurant => 5.4,
            BusinessType::Hotel => 8.0,
            BusinessType::Hospital => 12.0,
            BusinessType::University => 10.0,
            BusinessType::LogisticsCenter => 6.0,
            BusinessType::GasStation => 4.0,
            BusinessType::Bank => 4.5,
            BusinessType::Exchange => 20.0,
            BusinessType::TechHub => 15.0,
            BusinessType::DataCenter => 18.0,
            BusinessType::Insurance => 6.0,
        }
    }

    /// Daily operating cost at level 1 (TON), scales with the level multiplier
    pub fn operating_cost(&self) -> f64 {
        match self {
            BusinessType::Farm => 0.3,
            BusinessType::PowerPlant => 0.8,
            BusinessType::Quarry => 1.5,
            BusinessType::OilRig => 2.0,
            BusinessType::Mine => 1.8,
            BusinessType::Factory => 1.44,
            BusinessType::ConstructionCompany => 1.0,
            BusinessType::Refinery => 3.0,
            BusinessType::SteelMill => 2.5,
            BusinessType::TextileFactory => 1.2,
            BusinessType::Shop => 0.5,
            BusinessType::Restaurant => 0.86,
            BusinessType::Hotel => 2.0,
            BusinessType::Hospital => 4.0,
            BusinessType::University => 3.0,
            BusinessType::LogisticsCenter => 1.5,
            BusinessType::GasStation => 1.0,
            BusinessType::Bank => 0.6,
            BusinessType::Exchange => 3.0,
            BusinessType::TechHub => 4.0,
            BusinessType::DataCenter => 6.0,
            BusinessType::Insurance => 1.0,
        }
    }
}

impl fmt::Display for BusinessType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BusinessType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace([' ', '-'], "_");

        BusinessType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == wanted)
            .ok_or_else(|| anyhow::anyhow!("Unknown business type: {}", s))
    }
}

// ============================================================================
// BUSINESS ENTITY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Business {
    pub id: String,

    pub business_type: BusinessType,

    #[serde(default = "default_level")]
    pub level: i64,

    /// Server-supplied daily base income; catalog value when absent
    #[serde(default)]
    pub base_income: Option<f64>,

    /// Number of connected neighbours (bonus capped at 5)
    #[serde(default)]
    pub connections: i64,

    pub owner: String,

    #[serde(default)]
    pub plot_x: i32,

    #[serde(default)]
    pub plot_y: i32,
}

fn default_level() -> i64 {
    1
}

impl Business {
    pub fn new(id: &str, business_type: BusinessType, owner: &str, plot_x: i32, plot_y: i32) -> Self {
        Business {
            id: id.to_string(),
            business_type,
            level: 1,
            base_income: None,
            connections: 0,
            owner: owner.to_string(),
            plot_x,
            plot_y,
        }
    }

    pub fn effective_base_income(&self) -> f64 {
        self.base_income
            .unwrap_or_else(|| self.business_type.base_income())
    }

    pub fn daily_income(&self, model: &IncomeModel) -> f64 {
        model.daily_income(self.effective_base_income(), self.level, self.connections)
    }

    /// One day of this business: gross, operating cost, tax, net
    pub fn breakdown(&self, model: &IncomeModel) -> IncomeBreakdown {
        model.breakdown_with(
            self.effective_base_income(),
            self.business_type.operating_cost(),
            self.level,
            self.connections,
        )
    }
}
