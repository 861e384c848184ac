// 🧾 Tax Tiers - progressive income tax by market share, plus flat fees
//
//   s ≤ 15%        → 13%
//   15% < s ≤ 20%  → 18%
//   20% < s ≤ 25%  → 25%
//   s > 25%        → 35%
//
// Ties stay in the lower tier: only a strict `>` advances.

use crate::units::round_ton;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// PROGRESSIVE TIERS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaxTier {
    Base,
    Elevated,
    High,
    Maximum,
}

impl TaxTier {
    pub const ALL: [TaxTier; 4] = [TaxTier::Base, TaxTier::Elevated, TaxTier::High, TaxTier::Maximum];

    pub fn rate(&self) -> f64 {
        match self {
            TaxTier::Base => 0.13,
            TaxTier::Elevated => 0.18,
            TaxTier::High => 0.25,
            TaxTier::Maximum => 0.35,
        }
    }

    /// Inclusive upper bound of market share (percent), `None` for the top tier
    pub fn max_share(&self) -> Option<f64> {
        match self {
            TaxTier::Base => Some(15.0),
            TaxTier::Elevated => Some(20.0),
            TaxTier::High => Some(25.0),
            TaxTier::Maximum => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TaxTier::Base => "Base",
            TaxTier::Elevated => ">15% market",
            TaxTier::High => ">20% market",
            TaxTier::Maximum => ">25% market",
        }
    }
}

impl fmt::Display for TaxTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:.0}%)", self.label(), self.rate() * 100.0)
    }
}

/// Tier for a seller's trailing market share, in percent.
///
/// A non-finite share falls back to the base tier.
pub fn tax_tier(market_share: f64) -> TaxTier {
    if !market_share.is_finite() {
        tracing::warn!(market_share, "non-finite market share, using base tax tier");
        return TaxTier::Base;
    }

    TaxTier::ALL
        .iter()
        .copied()
        .find(|tier| match tier.max_share() {
            Some(max) => market_share <= max,
            None => true,
        })
        .unwrap_or(TaxTier::Maximum)
}

pub fn tax_rate(market_share: f64) -> f64 {
    tax_tier(market_share).rate()
}

/// Seller volume as a percentage of total volume (0 when there is no volume)
pub fn market_share(seller_volume: f64, total_volume: f64) -> f64 {
    if !(seller_volume.is_finite() && total_volume.is_finite()) || total_volume <= 0.0 {
        return 0.0;
    }
    (seller_volume.max(0.0) / total_volume * 100.0).min(100.0)
}

// ============================================================================
// FEE SCHEDULE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeeSchedule {
    pub plot_resale: f64,
    pub resource_trade: f64,
    pub rental: f64,
    pub withdrawal: f64,
    /// Flat chain fee per withdrawal (TON)
    pub network_fee: f64,
    pub min_withdrawal: f64,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        FeeSchedule {
            plot_resale: 0.15,
            resource_trade: 0.05,
            rental: 0.10,
            withdrawal: 0.03,
            network_fee: 0.01,
            min_withdrawal: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WithdrawalQuote {
    pub amount: f64,
    pub commission: f64,
    pub network_fee: f64,
    pub payout: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WithdrawalError {
    InvalidAmount(f64),
    BelowMinimum { amount: f64, minimum: f64 },
}

impl fmt::Display for WithdrawalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WithdrawalError::InvalidAmount(amount) => write!(f, "Invalid withdrawal amount: {}", amount),
            WithdrawalError::BelowMinimum { amount, minimum } => {
                write!(f, "Withdrawal of {:.2} TON is below the {:.2} TON minimum", amount, minimum)
            }
        }
    }
}

impl std::error::Error for WithdrawalError {}

impl FeeSchedule {
    pub fn resale_fee(&self, sale_price: f64) -> f64 {
        fee(sale_price, self.plot_resale)
    }

    pub fn trade_fee(&self, trade_total: f64) -> f64 {
        fee(trade_total, self.resource_trade)
    }

    pub fn rental_fee(&self, rent: f64) -> f64 {
        fee(rent, self.rental)
    }

    /// What the player receives for a withdrawal request of `amount` TON
    pub fn quote_withdrawal(&self, amount: f64) -> Result<WithdrawalQuote, WithdrawalError> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(WithdrawalError::InvalidAmount(amount));
        }
        if amount < self.min_withdrawal {
            return Err(WithdrawalError::BelowMinimum {
                amount,
                minimum: self.min_withdrawal,
            });
        }

        let commission = fee(amount, self.withdrawal);
        let payout = round_ton((amount - commission - self.network_fee).max(0.0));

        Ok(WithdrawalQuote {
            amount,
            commission,
            network_fee: self.network_fee,
            payout,
        })
    }
}

fn fee(amount: f64, rate: f64) -> f64 {
    if !amount.is_finite() || amount <= 0.0 {
        return 0.0;
    }
    round_ton(amount * rate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(tax_rate(15.0), 0.13);
        assert_eq!(tax_rate(15.01), 0.18);
        assert_eq!(tax_rate(20.0), 0.18);
        assert_eq!(tax_rate(20.01), 0.25);
        assert_eq!(tax_rate(25.0), 0.25);
        assert_eq!(tax_rate(25.01), 0.35);
    }

    #[test]
    fn test_tier_extremes() {
        assert_eq!(tax_tier(0.0), TaxTier::Base);
        assert_eq!(tax_tier(-10.0), TaxTier::Base);
        assert_eq!(tax_tier(100.0), TaxTier::Maximum);
        assert_eq!(tax_tier(f64::NAN), TaxTier::Base);
    }

    #[test]
    fn test_market_share() {
        assert_eq!(market_share(15.0, 100.0), 15.0);
        assert_eq!(market_share(5.0, 0.0), 0.0);
        assert_eq!(market_share(500.0, 100.0), 100.0);
    }

    #[test]
    fn test_flat_fees() {
        let fees = FeeSchedule::default();
        assert_eq!(fees.resale_fee(100.0), 15.0);
        assert_eq!(fees.trade_fee(40.0), 2.0);
        assert_eq!(fees.rental_fee(12.0), 1.2);
        assert_eq!(fees.trade_fee(-1.0), 0.0);
    }

    #[test]
    fn test_withdrawal_quote() {
        let quote = FeeSchedule::default().quote_withdrawal(100.0).unwrap();

        assert_eq!(quote.commission, 3.0);
        assert_eq!(quote.network_fee, 0.01);
        assert_eq!(quote.payout, 96.99);
    }

    #[test]
    fn test_withdrawal_below_minimum() {
        let fees = FeeSchedule::default();

        assert!(matches!(
            fees.quote_withdrawal(0.5),
            Err(WithdrawalError::BelowMinimum { .. })
        ));
        assert!(matches!(
            fees.quote_withdrawal(f64::NAN),
            Err(WithdrawalError::InvalidAmount(_))
        ));
        assert!(fees.quote_withdrawal(1.0).is_ok());
    }

    #[test]
    fn test_tier_display() {
        assert_eq!(TaxTier::High.to_string(), ">20% market (25%)");
    }
}
