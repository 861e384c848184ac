// 🟩 Plot Entity - one cell of the land grid
//
// Ownership is exclusive: a plot has one owner or none. A business can only
// stand on an owned plot.

use crate::pricing::{quote_plot, GridConfig, PlotQuote, Zone};
use crate::projection::GridPoint;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plot {
    pub x: i32,
    pub y: i32,

    #[serde(default)]
    pub owner: Option<String>,

    #[serde(default)]
    pub business_id: Option<String>,

    pub zone: Zone,

    /// Server-quoted price; derived from the position when absent
    #[serde(default)]
    pub price: Option<f64>,
}

impl Plot {
    /// Unowned plot with the zone derived from its position
    pub fn new(x: i32, y: i32, grid: &GridConfig) -> Self {
        let quote = quote_plot(x, y, grid);
        Plot {
            x,
            y,
            owner: None,
            business_id: None,
            zone: quote.zone,
            price: None,
        }
    }

    pub fn position(&self) -> GridPoint {
        GridPoint::new(self.x, self.y)
    }

    pub fn is_available(&self) -> bool {
        self.owner.is_none()
    }

    pub fn has_business(&self) -> bool {
        self.business_id.is_some()
    }

    pub fn quote(&self, grid: &GridConfig) -> PlotQuote {
        let mut quote = quote_plot(self.x, self.y, grid);
        if let Some(price) = self.price.filter(|p| p.is_finite() && *p >= 0.0) {
            quote.price = price;
        }
        quote
    }

    /// Derived state of the plot as seen by `viewer` (a wallet address or user id)
    pub fn status_for(&self, viewer: Option<&str>) -> PlotStatus {
        match (&self.owner, viewer) {
            (None, _) => PlotStatus::Available,
            (Some(owner), Some(v)) if owner == v => PlotStatus::OwnedByViewer {
                has_business: self.has_business(),
            },
            (Some(_), _) => PlotStatus::OwnedByOther {
                has_business: self.has_business(),
            },
        }
    }
}

// ============================================================================
// PLOT STATUS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PlotStatus {
    Available,
    OwnedByViewer { has_business: bool },
    OwnedByOther { has_business: bool },
}

impl PlotStatus {
    pub fn is_owned(&self) -> bool {
        !matches!(self, PlotStatus::Available)
    }

    pub fn label(&self) -> &'static str {
        match self {
            PlotStatus::Available => "available",
            PlotStatus::OwnedByViewer { has_business: true } => "yours (built)",
            PlotStatus::OwnedByViewer { has_business: false } => "yours",
            PlotStatus::OwnedByOther { has_business: true } => "owned (built)",
            PlotStatus::OwnedByOther { has_business: false } => "owned",
        }
    }
}

// ============================================================================
// PLOT INDEX
// ============================================================================

/// Coordinate lookup over a plot snapshot. Missing cells are unowned.
#[derive(Debug, Clone, Default)]
pub struct PlotIndex {
    plots: HashMap<GridPoint, Plot>,
}

impl PlotIndex {
    pub fn new(plots: Vec<Plot>) -> Self {
        PlotIndex {
            plots: plots.into_iter().map(|p| (p.position(), p)).collect(),
        }
    }

    pub fn get(&self, x: i32, y: i32) -> Option<&Plot> {
        self.plots.get(&GridPoint::new(x, y))
    }

    pub fn status_at(&self, x: i32, y: i32, viewer: Option<&str>) -> PlotStatus {
        self.get(x, y)
            .map(|p| p.status_for(viewer))
            .unwrap_or(PlotStatus::Available)
    }

    pub fn owned_by<'a>(&'a self, owner: &'a str) -> impl Iterator<Item = &'a Plot> + 'a {
        self.plots
            .values()
            .filter(move |p| p.owner.as_deref() == Some(owner))
    }

    pub fn owned_count(&self) -> usize {
        self.plots.values().filter(|p| !p.is_available()).count()
    }

    pub fn len(&self) -> usize {
        self.plots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_plot_is_available() {
        let plot = Plot::new(50, 50, &GridConfig::default());

        assert!(plot.is_available());
        assert_eq!(plot.zone, Zone::Center);
        assert_eq!(plot.status_for(Some("EQviewer")), PlotStatus::Available);
    }

    #[test]
    fn test_status_reflects_owner() {
        let mut plot = Plot::new(10, 10, &GridConfig::default());
        plot.owner = Some("EQalice".to_string());

        assert_eq!(
            plot.status_for(Some("EQalice")),
            PlotStatus::OwnedByViewer { has_business: false }
        );
        assert_eq!(
            plot.status_for(Some("EQbob")),
            PlotStatus::OwnedByOther { has_business: false }
        );
        assert_eq!(
            plot.status_for(None),
            PlotStatus::OwnedByOther { has_business: false }
        );

        plot.business_id = Some("biz-1".to_string());
        assert_eq!(plot.status_for(Some("EQalice")).label(), "yours (built)");
    }

    #[test]
    fn test_quote_prefers_server_price() {
        let grid = GridConfig::default();
        let mut plot = Plot::new(50, 50, &grid);
        assert_eq!(plot.quote(&grid).price, 100.0);

        plot.price = Some(120.0);
        assert_eq!(plot.quote(&grid).price, 120.0);

        plot.price = Some(f64::NAN);
        assert_eq!(plot.quote(&grid).price, 100.0);
    }

    #[test]
    fn test_index_lookup() {
        let grid = GridConfig::default();
        let mut owned = Plot::new(1, 2, &grid);
        owned.owner = Some("EQalice".to_string());

        let index = PlotIndex::new(vec![owned, Plot::new(3, 4, &grid)]);

        assert_eq!(index.len(), 2);
        assert_eq!(index.owned_count(), 1);
        assert_eq!(index.owned_by("EQalice").count(), 1);
        assert!(index.status_at(1, 2, Some("EQalice")).is_owned());
        assert_eq!(index.status_at(99, 99, None), PlotStatus::Available);
    }

    #[test]
    fn test_status_json_shape() {
        let json = serde_json::to_value(PlotStatus::OwnedByViewer { has_business: true }).unwrap();
        assert_eq!(json["status"], "owned_by_viewer");
        assert_eq!(json["has_business"], true);
    }
}
