// 📐 Shape Layer - Snapshot Validation
// Backend payloads are decoded into typed snapshots and checked against the
// grid and formula invariants. Any violation rejects the whole payload.

use crate::entities::{Business, Plot, User};
use crate::income::ConnectionBonus;
use crate::pricing::GridConfig;
use crate::treasury::TreasuryStats;
use anyhow::{anyhow, Context as AnyhowContext, Result};
use serde::de::DeserializeOwned;

// ============================================================================
// VALIDATION ERROR
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
    pub context: String,
}

impl ValidationError {
    fn new(context: &str, field: &str, message: String) -> Self {
        ValidationError {
            field: field.to_string(),
            message,
            context: context.to_string(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.context, self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

pub type ValidationResult = Result<(), Vec<ValidationError>>;

fn finish(errors: Vec<ValidationError>) -> ValidationResult {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_amount(errors: &mut Vec<ValidationError>, context: &str, field: &str, value: f64) {
    if !value.is_finite() || value < 0.0 {
        errors.push(ValidationError::new(
            context,
            field,
            format!("Must be a finite amount >= 0, got {}", value),
        ));
    }
}

// ============================================================================
// SCHEMA VALIDATOR
// ============================================================================

pub struct SchemaValidator {
    grid: GridConfig,
    connections: ConnectionBonus,
}

impl SchemaValidator {
    pub fn new(grid: GridConfig, connections: ConnectionBonus) -> Self {
        SchemaValidator { grid, connections }
    }

    pub fn validate_plot(&self, plot: &Plot) -> ValidationResult {
        let mut errors = Vec::new();

        if !self.grid.contains(plot.x, plot.y) {
            errors.push(ValidationError::new(
                "Plot",
                "x,y",
                format!(
                    "({}, {}) is outside the {}x{} grid",
                    plot.x, plot.y, self.grid.size, self.grid.size
                ),
            ));
        }

        if plot.owner.as_deref().is_some_and(|o| o.trim().is_empty()) {
            errors.push(ValidationError::new("Plot", "owner", "Owner id is empty".to_string()));
        }

        if plot.has_business() && plot.is_available() {
            errors.push(ValidationError::new(
                "Plot",
                "business_id",
                "Business on an unowned plot".to_string(),
            ));
        }

        if let Some(price) = plot.price {
            check_amount(&mut errors, "Plot", "price", price);
        }

        finish(errors)
    }

    pub fn validate_business(&self, business: &Business) -> ValidationResult {
        let mut errors = Vec::new();

        if business.id.is_empty() {
            errors.push(ValidationError::new("Business", "id", "Required field is empty".to_string()));
        }

        if business.owner.is_empty() {
            errors.push(ValidationError::new("Business", "owner", "Required field is empty".to_string()));
        }

        if business.level < 1 {
            errors.push(ValidationError::new(
                "Business",
                "level",
                format!("Must be >= 1, got {}", business.level),
            ));
        }

        let max = self.connections.max_connections as i64;
        if business.connections < 0 || business.connections > max {
            errors.push(ValidationError::new(
                "Business",
                "connections",
                format!("Must be between 0 and {}, got {}", max, business.connections),
            ));
        }

        if let Some(base) = business.base_income {
            check_amount(&mut errors, "Business", "base_income", base);
        }

        if !self.grid.contains(business.plot_x, business.plot_y) {
            errors.push(ValidationError::new(
                "Business",
                "plot_x,plot_y",
                format!("({}, {}) is outside the grid", business.plot_x, business.plot_y),
            ));
        }

        finish(errors)
    }

    pub fn validate_user(&self, user: &User) -> ValidationResult {
        let mut errors = Vec::new();

        if user.id.is_empty() {
            errors.push(ValidationError::new("User", "id", "Required field is empty".to_string()));
        }

        check_amount(&mut errors, "User", "balance", user.balance);

        finish(errors)
    }

    pub fn validate_treasury(&self, stats: &TreasuryStats) -> ValidationResult {
        let mut errors = Vec::new();

        let fields = [
            ("plot_sales_income", stats.plot_sales_income),
            ("building_sales_income", stats.building_sales_income),
            ("total_tax", stats.total_tax),
            ("withdrawal_fees", stats.withdrawal_fees),
            ("total_deposits", stats.total_deposits),
            ("total_withdrawals", stats.total_withdrawals),
            ("pending_withdrawals_amount", stats.pending_withdrawals_amount),
        ];

        for (field, value) in fields {
            check_amount(&mut errors, "TreasuryStats", field, value);
        }

        finish(errors)
    }

    /// Plots must also be unique per coordinate
    pub fn validate_plots(&self, plots: &[Plot]) -> ValidationResult {
        let mut errors = Vec::new();
        let mut seen = std::collections::HashSet::new();

        for plot in plots {
            if let Err(mut e) = self.validate_plot(plot) {
                errors.append(&mut e);
            }
            if !seen.insert((plot.x, plot.y)) {
                errors.push(ValidationError::new(
                    "Plot",
                    "x,y",
                    format!("Duplicate plot at ({}, {})", plot.x, plot.y),
                ));
            }
        }

        finish(errors)
    }

    // ------------------------------------------------------------------------
    // Fail-closed decoding
    // ------------------------------------------------------------------------

    pub fn decode_plots(&self, json: &str) -> Result<Vec<Plot>> {
        let plots: Vec<Plot> = decode(json, "plots")?;
        self.validate_plots(&plots).map_err(|e| rejected("plots", e))?;
        Ok(plots)
    }

    pub fn decode_businesses(&self, json: &str) -> Result<Vec<Business>> {
        let businesses: Vec<Business> = decode(json, "businesses")?;
        for business in &businesses {
            self.validate_business(business).map_err(|e| rejected("businesses", e))?;
        }
        Ok(businesses)
    }

    pub fn decode_user(&self, json: &str) -> Result<User> {
        let user: User = decode(json, "user")?;
        self.validate_user(&user).map_err(|e| rejected("user", e))?;
        Ok(user)
    }

    pub fn decode_treasury(&self, json: &str) -> Result<TreasuryStats> {
        let stats: TreasuryStats = decode(json, "treasury stats")?;
        self.validate_treasury(&stats).map_err(|e| rejected("treasury stats", e))?;
        Ok(stats)
    }
}

impl Default for SchemaValidator {
    fn default() -> Self {
        Self::new(GridConfig::default(), ConnectionBonus::default())
    }
}

fn decode<T: DeserializeOwned>(json: &str, what: &str) -> Result<T> {
    serde_json::from_str(json).with_context(|| format!("Malformed {} payload", what))
}

fn rejected(what: &str, errors: Vec<ValidationError>) -> anyhow::Error {
    let details: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
    tracing::warn!(payload = what, errors = errors.len(), "rejecting snapshot");
    anyhow!("Rejected {} payload: {}", what, details.join("; "))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::BusinessType;

    #[test]
    fn test_valid_plot_passes() {
        let plot = Plot::new(5, 5, &GridConfig::default());
        assert!(SchemaValidator::default().validate_plot(&plot).is_ok());
    }

    #[test]
    fn test_plot_outside_grid_rejected() {
        let mut plot = Plot::new(5, 5, &GridConfig::default());
        plot.x = 100;

        let errors = SchemaValidator::default().validate_plot(&plot).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "x,y");
    }

    #[test]
    fn test_business_on_unowned_plot_rejected() {
        let mut plot = Plot::new(5, 5, &GridConfig::default());
        plot.business_id = Some("b1".to_string());

        assert!(SchemaValidator::default().validate_plot(&plot).is_err());
    }

    #[test]
    fn test_business_connections_out_of_range() {
        let mut business = Business::new("b1", BusinessType::Mine, "EQowner", 1, 1);
        business.connections = 7;

        let errors = SchemaValidator::default().validate_business(&business).unwrap_err();
        assert_eq!(errors[0].field, "connections");
        assert_eq!(errors[0].to_string(), "[Business] connections: Must be between 0 and 5, got 7");
    }

    #[test]
    fn test_business_level_must_be_positive() {
        let mut business = Business::new("b1", BusinessType::Mine, "EQowner", 1, 1);
        business.level = 0;

        assert!(SchemaValidator::default().validate_business(&business).is_err());
    }

    #[test]
    fn test_decode_plots_fails_closed() {
        let validator = SchemaValidator::default();

        let good = r#"[{"x": 1, "y": 2, "zone": "outskirts"}, {"x": 50, "y": 50, "zone": "center", "owner": "EQa"}]"#;
        assert_eq!(validator.decode_plots(good).unwrap().len(), 2);

        // One bad plot rejects the whole payload
        let bad = r#"[{"x": 1, "y": 2, "zone": "outskirts"}, {"x": 500, "y": 50, "zone": "center"}]"#;
        let err = validator.decode_plots(bad).unwrap_err();
        assert!(err.to_string().contains("Rejected plots payload"));

        let duplicate = r#"[{"x": 1, "y": 2, "zone": "outskirts"}, {"x": 1, "y": 2, "zone": "outskirts"}]"#;
        assert!(validator.decode_plots(duplicate).is_err());
    }

    #[test]
    fn test_decode_type_mismatch_fails() {
        let validator = SchemaValidator::default();

        assert!(validator.decode_plots(r#"[{"x": "one", "y": 2, "zone": "center"}]"#).is_err());
        assert!(validator.decode_plots(r#"[{"x": 1, "y": 2, "zone": "downtown"}]"#).is_err());
        assert!(validator.decode_user(r#"{"balance": 5.0}"#).is_err());
    }

    #[test]
    fn test_decode_user_negative_balance() {
        let validator = SchemaValidator::default();
        assert!(validator.decode_user(r#"{"id": "u1", "balance": -1.0}"#).is_err());
        assert!(validator.decode_user(r#"{"id": "u1", "balance": 12.5}"#).is_ok());
    }

    #[test]
    fn test_decode_treasury() {
        let validator = SchemaValidator::default();

        let stats = validator
            .decode_treasury(r#"{"plot_sales_income": 100.0, "total_deposits": 50.0, "extra": 1}"#)
            .unwrap();
        assert_eq!(stats.plot_sales_income, 100.0);
        assert_eq!(stats.total_withdrawals, 0.0);

        assert!(validator.decode_treasury(r#"{"total_tax": -3.0}"#).is_err());
    }

    #[test]
    fn test_decode_businesses() {
        let validator = SchemaValidator::default();

        let json = r#"[{"id": "b1", "business_type": "farm", "owner": "EQa", "connections": 2, "plot_x": 3, "plot_y": 4}]"#;
        let businesses = validator.decode_businesses(json).unwrap();
        assert_eq!(businesses[0].connections, 2);

        let bad = r#"[{"id": "b1", "business_type": "farm", "owner": "EQa", "connections": 9}]"#;
        assert!(validator.decode_businesses(bad).is_err());
    }
}
