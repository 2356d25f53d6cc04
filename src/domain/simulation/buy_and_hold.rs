/// Balance path of buying at the first price and holding to the end.
///
/// Fewer than two prices yield just the initial balance.
pub fn buy_and_hold(prices: &[f64], initial_balance: f64) -> Vec<f64> {
    if prices.len() < 2 {
        return vec![initial_balance];
    }
    let entry = prices[0];
    if !entry.is_finite() || entry <= 0.0 {
        return vec![initial_balance; prices.len()];
    }
    let units = initial_balance / entry;
    prices.iter().map(|p| units * p).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracks_price_ratio() {
        let path = buy_and_hold(&[100.0, 110.0, 90.0], 1000.0);
        assert_eq!(path.len(), 3);
        assert!((path[0] - 1000.0).abs() < 1e-9);
        assert!((path[1] - 1100.0).abs() < 1e-9);
        assert!((path[2] - 900.0).abs() < 1e-9);
    }

    #[test]
    fn test_short_series() {
        assert_eq!(buy_and_hold(&[], 500.0), vec![500.0]);
        assert_eq!(buy_and_hold(&[42.0], 500.0), vec![500.0]);
    }

    #[test]
    fn test_unusable_entry_price_stays_flat() {
        assert_eq!(buy_and_hold(&[0.0, 5.0], 100.0), vec![100.0, 100.0]);
    }
}
