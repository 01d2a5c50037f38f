//! Wei cost estimation for batches of uniform transactions.

use alloy::primitives::U256;

/// Worst-case wei cost of `count` transactions at `gas_price`, each burning
/// up to `gas_per_tx` gas. Computed in 256-bit arithmetic; realistic wei
/// totals overflow u64 long before they overflow U256.
pub fn estimate(gas_price: u128, gas_per_tx: u64, count: u64) -> U256 {
    U256::from(gas_price) * U256::from(gas_per_tx) * U256::from(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multiplies_price_gas_and_count() {
        assert_eq!(estimate(2, 3, 4), U256::from(24));
        assert_eq!(estimate(0, 21_000, 100), U256::ZERO);
        assert_eq!(estimate(1_000_000_000, 21_000, 0), U256::ZERO);
    }

    #[test]
    fn survives_totals_past_u64() {
        // 1000 transfers at 1 ETH/gas: 2.1e25 wei, far beyond u64::MAX
        let total = estimate(1_000_000_000_000_000_000, 21_000, 1_000);
        assert_eq!(
            total,
            U256::from_str_radix("21000000000000000000000000", 10).unwrap()
        );
        assert!(total > U256::from(u64::MAX));
    }
}
