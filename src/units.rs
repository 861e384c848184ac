// 💎 TON units - nanoton conversion and display rounding
// 1 TON = 1_000_000_000 nanotons. The chain only speaks nanotons.

/// Nanotons per TON
pub const NANOS_PER_TON: u64 = 1_000_000_000;

/// Convert TON to nanotons, flooring any sub-nano remainder.
///
/// Negative or non-finite amounts convert to 0.
pub fn ton_to_nano(ton: f64) -> u64 {
    if !ton.is_finite() || ton <= 0.0 {
        return 0;
    }
    (ton * NANOS_PER_TON as f64).floor() as u64
}

pub fn nano_to_ton(nano: u64) -> f64 {
    nano as f64 / NANOS_PER_TON as f64
}

/// Round an amount to 2 decimals (what every price label shows)
pub fn round_ton(amount: f64) -> f64 {
    if !amount.is_finite() {
        return 0.0;
    }
    (amount * 100.0).round() / 100.0
}

/// Replace NaN / infinities / negatives with 0.0
pub(crate) fn non_negative(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ton_to_nano_floors() {
        assert_eq!(ton_to_nano(1.0), 1_000_000_000);
        assert_eq!(ton_to_nano(0.5), 500_000_000);
        assert_eq!(ton_to_nano(0.0000000019), 1);
    }

    #[test]
    fn test_invalid_amounts_convert_to_zero() {
        assert_eq!(ton_to_nano(-3.0), 0);
        assert_eq!(ton_to_nano(f64::NAN), 0);
        assert_eq!(ton_to_nano(f64::INFINITY), 0);
    }

    #[test]
    fn test_nano_to_ton() {
        assert_eq!(nano_to_ton(2_500_000_000), 2.5);
        assert_eq!(nano_to_ton(0), 0.0);
    }

    #[test]
    fn test_round_ton() {
        assert_eq!(round_ton(12.345_6), 12.35);
        assert_eq!(round_ton(99.994), 99.99);
        assert_eq!(round_ton(f64::NAN), 0.0);
    }
}
