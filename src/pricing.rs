// 🏷️ Pricing Function - plot price from distance to the map center
//
//   distance    = |(x, y) - (cx, cy)|
//   maxDistance = |(0, 0) - (cx, cy)|
//   price       = minPrice + (maxPrice - minPrice) * (1 - distance / maxDistance)
//
// Pure and deterministic: the same (x, y) always yields the same price.

use crate::units::round_ton;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// GRID CONFIG
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Side length of the square land grid
    pub size: u32,

    /// Price at the furthest corner (TON)
    pub min_price: f64,

    /// Price at the center (TON)
    pub max_price: f64,
}

impl Default for GridConfig {
    fn default() -> Self {
        GridConfig {
            size: 100,
            min_price: 10.0,
            max_price: 100.0,
        }
    }
}

impl GridConfig {
    pub fn center(&self) -> (f64, f64) {
        let c = (self.size / 2) as f64;
        (c, c)
    }

    /// Corner-to-center distance, the worst case
    pub fn max_distance(&self) -> f64 {
        let (cx, cy) = self.center();
        cx.hypot(cy)
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as u32) < self.size && (y as u32) < self.size
    }

    pub fn plot_count(&self) -> u64 {
        self.size as u64 * self.size as u64
    }
}

// ============================================================================
// ZONES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Zone {
    Center,
    Business,
    Residential,
    Industrial,
    Outskirts,
}

impl Zone {
    pub const ALL: [Zone; 5] = [
        Zone::Center,
        Zone::Business,
        Zone::Residential,
        Zone::Industrial,
        Zone::Outskirts,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Zone::Center => "center",
            Zone::Business => "business",
            Zone::Residential => "residential",
            Zone::Industrial => "industrial",
            Zone::Outskirts => "outskirts",
        }
    }

    /// Headline price quoted for the zone in the game's guide (TON)
    pub fn list_price(&self) -> f64 {
        match self {
            Zone::Center => 100.0,
            Zone::Business => 50.0,
            Zone::Residential => 25.0,
            Zone::Industrial => 15.0,
            Zone::Outskirts => 10.0,
        }
    }

    /// Upper bound of normalized distance (distance / maxDistance) for the zone
    fn max_normalized_distance(&self) -> f64 {
        match self {
            Zone::Center => 0.10,
            Zone::Business => 0.30,
            Zone::Residential => 0.55,
            Zone::Industrial => 0.80,
            Zone::Outskirts => f64::INFINITY,
        }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Zone {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Zone::ALL
            .iter()
            .copied()
            .find(|z| z.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| anyhow::anyhow!("Unknown zone: {}", s))
    }
}

// ============================================================================
// PRICE
// ============================================================================

pub fn distance_from_center(x: i32, y: i32, grid: &GridConfig) -> f64 {
    let (cx, cy) = grid.center();
    (x as f64 - cx).hypot(y as f64 - cy)
}

/// distance / maxDistance, or `None` for a degenerate grid
fn normalized_distance(x: i32, y: i32, grid: &GridConfig) -> Option<f64> {
    let max_distance = grid.max_distance();
    if max_distance <= 0.0 || !max_distance.is_finite() {
        return None;
    }
    Some(distance_from_center(x, y, grid) / max_distance)
}

/// Price of the plot at (x, y) in TON, rounded to 2 decimals.
///
/// Coordinates outside the grid (or a zero-size grid) price at 0.0.
pub fn plot_price(x: i32, y: i32, grid: &GridConfig) -> f64 {
    if !grid.contains(x, y) {
        tracing::warn!(x, y, size = grid.size, "price requested for plot outside grid");
        return 0.0;
    }

    let Some(d) = normalized_distance(x, y, grid) else {
        tracing::warn!(size = grid.size, "degenerate grid, pricing at 0");
        return 0.0;
    };

    let price = grid.min_price + (grid.max_price - grid.min_price) * (1.0 - d);
    round_ton(price)
}

pub fn zone_for(x: i32, y: i32, grid: &GridConfig) -> Zone {
    let d = normalized_distance(x, y, grid).unwrap_or(f64::INFINITY);

    Zone::ALL
        .iter()
        .copied()
        .find(|zone| d <= zone.max_normalized_distance())
        .unwrap_or(Zone::Outskirts)
}

/// Position of `price` between min and max price, in [0, 1] (map tint)
pub fn price_intensity(price: f64, grid: &GridConfig) -> f64 {
    let span = grid.max_price - grid.min_price;
    if span <= 0.0 || !price.is_finite() {
        return 0.0;
    }
    ((price - grid.min_price) / span).clamp(0.0, 1.0)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotQuote {
    pub x: i32,
    pub y: i32,
    pub price: f64,
    pub zone: Zone,
    pub intensity: f64,
}

pub fn quote_plot(x: i32, y: i32, grid: &GridConfig) -> PlotQuote {
    let price = plot_price(x, y, grid);

    PlotQuote {
        x,
        y,
        price,
        zone: zone_for(x, y, grid),
        intensity: price_intensity(price, grid),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 0.01
    }

    #[test]
    fn test_center_price_is_max() {
        let grid = GridConfig::default();
        assert!(approx(plot_price(50, 50, &grid), 100.0));
    }

    #[test]
    fn test_corner_price_is_min() {
        let grid = GridConfig::default();
        assert!(approx(plot_price(0, 0, &grid), 10.0));
    }

    #[test]
    fn test_price_is_deterministic() {
        let grid = GridConfig::default();
        assert_eq!(plot_price(17, 83, &grid), plot_price(17, 83, &grid));
    }

    #[test]
    fn test_known_price() {
        let grid = GridConfig::default();
        // distance 10, maxDistance 70.71 → 10 + 90 * (1 - 0.1414) = 87.27
        assert_eq!(plot_price(60, 50, &grid), 87.27);
    }

    #[test]
    fn test_out_of_grid_prices_at_zero() {
        let grid = GridConfig::default();
        assert_eq!(plot_price(-1, 10, &grid), 0.0);
        assert_eq!(plot_price(10, 100, &grid), 0.0);
    }

    #[test]
    fn test_degenerate_grid_prices_at_zero() {
        let grid = GridConfig {
            size: 1,
            ..GridConfig::default()
        };
        assert_eq!(plot_price(0, 0, &grid), 0.0);
    }

    #[test]
    fn test_zones() {
        let grid = GridConfig::default();

        assert_eq!(zone_for(50, 50, &grid), Zone::Center);
        assert_eq!(zone_for(60, 60, &grid), Zone::Business);
        assert_eq!(zone_for(70, 70, &grid), Zone::Residential);
        assert_eq!(zone_for(80, 80, &grid), Zone::Industrial);
        assert_eq!(zone_for(0, 0, &grid), Zone::Outskirts);
    }

    #[test]
    fn test_zone_parsing() {
        assert_eq!("center".parse::<Zone>().unwrap(), Zone::Center);
        assert_eq!(" Outskirts ".parse::<Zone>().unwrap(), Zone::Outskirts);
        assert!("downtown".parse::<Zone>().is_err());
    }

    #[test]
    fn test_price_intensity() {
        let grid = GridConfig::default();
        assert_eq!(price_intensity(100.0, &grid), 1.0);
        assert_eq!(price_intensity(10.0, &grid), 0.0);
        assert_eq!(price_intensity(55.0, &grid), 0.5);
        assert_eq!(price_intensity(500.0, &grid), 1.0);
    }

    #[test]
    fn test_quote_plot() {
        let quote = quote_plot(50, 50, &GridConfig::default());
        assert_eq!(quote.zone, Zone::Center);
        assert_eq!(quote.price, 100.0);
        assert_eq!(quote.intensity, 1.0);
    }

    proptest! {
        #[test]
        fn prop_price_non_increasing_with_distance(
            x1 in 0i32..100, y1 in 0i32..100,
            x2 in 0i32..100, y2 in 0i32..100,
        ) {
            let grid = GridConfig::default();
            let d1 = distance_from_center(x1, y1, &grid);
            let d2 = distance_from_center(x2, y2, &grid);
            let (p1, p2) = (plot_price(x1, y1, &grid), plot_price(x2, y2, &grid));

            if d1 < d2 {
                prop_assert!(p1 >= p2);
            }
        }

        #[test]
        fn prop_price_within_bounds(x in 0i32..100, y in 0i32..100) {
            let grid = GridConfig::default();
            let price = plot_price(x, y, &grid);

            prop_assert!(price >= grid.min_price && price <= grid.max_price);
        }
    }
}
