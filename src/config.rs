// ⚙️ Economy configuration - every tunable constant in one place
// Missing JSON fields fall back to the game's defaults.

use crate::income::{ConnectionBonus, IncomeModel, LevelCurve, BASE_TAX_RATE};
use crate::pricing::GridConfig;
use crate::projection::TileSize;
use crate::schema::SchemaValidator;
use crate::tax::FeeSchedule;
use crate::treasury::{TreasuryEngine, TreasuryThresholds};
use anyhow::{bail, Context as AnyhowContext, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyConfig {
    pub grid: GridConfig,
    pub tile: TileSize,
    pub levels: LevelCurve,
    pub connections: ConnectionBonus,
    pub base_tax_rate: f64,
    pub fees: FeeSchedule,
    pub treasury: TreasuryThresholds,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        EconomyConfig {
            grid: GridConfig::default(),
            tile: TileSize::default(),
            levels: LevelCurve::default(),
            connections: ConnectionBonus::default(),
            base_tax_rate: BASE_TAX_RATE,
            fees: FeeSchedule::default(),
            treasury: TreasuryThresholds::default(),
        }
    }
}

impl EconomyConfig {
    /// Load config from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        let config: EconomyConfig = serde_json::from_str(&content)
            .context("Failed to parse config JSON")?;

        config.validate()?;
        Ok(config)
    }

    /// `TON_CITY_CONFIG` when set, defaults otherwise
    pub fn from_env() -> Result<Self> {
        match std::env::var("TON_CITY_CONFIG") {
            Ok(path) if !path.is_empty() => {
                tracing::info!(%path, "loading economy config");
                Self::from_file(path)
            }
            _ => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.grid.size == 0 {
            bail!("grid.size must be > 0");
        }
        if !(self.grid.min_price.is_finite() && self.grid.max_price.is_finite())
            || self.grid.min_price < 0.0
            || self.grid.max_price < self.grid.min_price
        {
            bail!(
                "grid prices must satisfy 0 <= min_price <= max_price, got {} / {}",
                self.grid.min_price,
                self.grid.max_price
            );
        }
        if !(self.tile.width > 0.0 && self.tile.height > 0.0) {
            bail!("tile width and height must be > 0");
        }
        if !(0.0..=1.0).contains(&self.base_tax_rate) {
            bail!("base_tax_rate must be within [0, 1], got {}", self.base_tax_rate);
        }
        if !(self.connections.per_connection >= 0.0 && self.connections.per_connection.is_finite()) {
            bail!("connections.per_connection must be >= 0");
        }
        Ok(())
    }

    pub fn income_model(&self) -> IncomeModel {
        IncomeModel::new(self.levels.clone(), self.connections, self.base_tax_rate)
    }

    pub fn treasury_engine(&self) -> TreasuryEngine {
        TreasuryEngine::with_thresholds(self.treasury)
    }

    pub fn validator(&self) -> SchemaValidator {
        SchemaValidator::new(self.grid, self.connections)
    }
}
