use crate::error::StrategyError;

/// Whole shares purchasable with `cash` at `price`.
pub fn shares_affordable(cash: f64, price: f64) -> Result<u64, StrategyError> {
    if !cash.is_finite() || cash < 0.0 {
        return Err(StrategyError::InvalidCash(cash));
    }
    if !price.is_finite() || price <= 0.0 {
        return Err(StrategyError::NonPositivePrice(price));
    }

    Ok((cash / price).floor() as u64)
}

/// Cash value of a holding at `price`.
pub fn liquidation_value(shares: u64, price: f64) -> Result<f64, StrategyError> {
    if !price.is_finite() || price <= 0.0 {
        return Err(StrategyError::NonPositivePrice(price));
    }

    Ok(shares as f64 * price)
}

#[cfg(test)]
mod tests {
    use super::{liquidation_value, shares_affordable};
    use crate::StrategyError;

    #[test]
    fn buys_whole_shares_only() {
        assert_eq!(shares_affordable(50_000.0, 100.0), Ok(500));
        assert_eq!(shares_affordable(50_000.0, 75.5), Ok(662));
        assert_eq!(shares_affordable(99.0, 100.0), Ok(0));
    }

    #[test]
    fn rejects_non_positive_price() {
        assert_eq!(
            shares_affordable(100.0, 0.0),
            Err(StrategyError::NonPositivePrice(0.0))
        );
        assert_eq!(
            liquidation_value(10, -1.0),
            Err(StrategyError::NonPositivePrice(-1.0))
        );
    }

    #[test]
    fn rejects_negative_cash() {
        assert_eq!(
            shares_affordable(-1.0, 10.0),
            Err(StrategyError::InvalidCash(-1.0))
        );
    }

    #[test]
    fn liquidation_values_holding_at_price() {
        assert_eq!(liquidation_value(500, 120.0), Ok(60_000.0));
        assert_eq!(liquidation_value(0, 120.0), Ok(0.0));
    }
}
