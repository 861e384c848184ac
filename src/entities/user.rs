// 👤 User Entity - a player's balance and holdings

use crate::entities::Business;
use crate::income::IncomeModel;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,

    #[serde(default)]
    pub wallet_address: Option<String>,

    /// In-game balance (TON)
    #[serde(default)]
    pub balance: f64,

    #[serde(default)]
    pub plots_owned: Vec<String>,

    #[serde(default)]
    pub businesses_owned: Vec<String>,
}

impl User {
    pub fn new(id: &str) -> Self {
        User {
            id: id.to_string(),
            wallet_address: None,
            balance: 0.0,
            plots_owned: Vec::new(),
            businesses_owned: Vec::new(),
        }
    }

    /// Identity used for ownership checks: wallet when connected, else id
    pub fn owner_key(&self) -> &str {
        self.wallet_address.as_deref().unwrap_or(&self.id)
    }

    pub fn owns_business(&self, business_id: &str) -> bool {
        self.businesses_owned.iter().any(|b| b == business_id)
    }

    /// Gross daily income across the user's businesses in `businesses`
    pub fn portfolio_income(&self, businesses: &[Business], model: &IncomeModel) -> f64 {
        businesses
            .iter()
            .filter(|b| self.owns_business(&b.id))
            .map(|b| b.daily_income(model))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::BusinessType;

    #[test]
    fn test_owner_key_prefers_wallet() {
        let mut user = User::new("user-1");
        assert_eq!(user.owner_key(), "user-1");

        user.wallet_address = Some("EQwallet".to_string());
        assert_eq!(user.owner_key(), "EQwallet");
    }

    #[test]
    fn test_portfolio_income_counts_only_owned() {
        let mut user = User::new("user-1");
        user.businesses_owned = vec!["a".to_string(), "b".to_string()];

        let mut a = Business::new("a", BusinessType::Farm, "user-1", 0, 0);
        a.base_income = Some(10.0);
        let mut b = Business::new("b", BusinessType::Farm, "user-1", 0, 1);
        b.base_income = Some(10.0);
        b.connections = 5;
        let mut c = Business::new("c", BusinessType::Farm, "someone", 0, 2);
        c.base_income = Some(1000.0);

        let total = user.portfolio_income(&[a, b, c], &IncomeModel::default());
        assert_eq!(total, 30.0);
    }
}
