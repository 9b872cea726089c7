//! Pricing and aggregation rules.
//!
//! One canonical rule for monetary totals, shared by wizard step data
//! (selections not yet persisted) and persisted component selections.
//!
//! Currency is carried per line item as a label only. Totals are a plain
//! numeric sum regardless of currency; no conversion or normalisation is
//! performed.

use serde::Serialize;

use crate::configuration::ConfigurationStatus;

/// Largest amount a `NUMERIC(12,2)` money column holds.
pub const MAX_AMOUNT: f64 = 9_999_999_999.99;

/// Anything that contributes `price * quantity` to a total.
pub trait LineItem {
    /// Unit price; `None` means free/unknown and contributes nothing.
    fn unit_price(&self) -> Option<f64>;

    /// Number of units. Always > 0 once validated.
    fn quantity(&self) -> i32;

    /// `price * quantity`, or `0.0` when the price is unknown.
    fn line_total(&self) -> f64 {
        line_total(self.unit_price(), self.quantity())
    }
}

/// `price * quantity`, or `0.0` for a null price.
pub fn line_total(price: Option<f64>, quantity: i32) -> f64 {
    match price {
        Some(p) => p * f64::from(quantity),
        None => 0.0,
    }
}

/// Sum of [`LineItem::line_total`] over `items`, rounded to cents.
pub fn configuration_total<'a, T, I>(items: I) -> f64
where
    T: LineItem + 'a,
    I: IntoIterator<Item = &'a T>,
{
    round_cents(items.into_iter().map(|item| item.line_total()).sum())
}

/// A bare `(price, quantity)` pair, as read back from aggregate queries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricedQuantity {
    pub price: Option<f64>,
    pub quantity: i32,
}

impl LineItem for PricedQuantity {
    fn unit_price(&self) -> Option<f64> {
        self.price
    }

    fn quantity(&self) -> i32 {
        self.quantity
    }
}

/// Round a monetary amount to cents, the precision money is stored at.
pub fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Whether `amount` can be stored in a money column.
pub fn fits_amount(amount: f64) -> bool {
    amount.is_finite() && amount <= MAX_AMOUNT
}

/// Format an amount with its currency label, e.g. `"USD 12.50"`.
///
/// Returns `"N/A"` when the amount is unknown.
pub fn format_with_currency(amount: Option<f64>, currency: &str) -> String {
    match amount {
        Some(a) => format!("{currency} {a:.2}"),
        None => "N/A".to_string(),
    }
}

// ---------------------------------------------------------------------------
// User-level aggregation
// ---------------------------------------------------------------------------

/// Configuration statistics for a user's dashboard and configuration index.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConfigurationStats {
    pub configuration_count: i64,
    pub completed_count: i64,
    /// Draft plus in-progress configurations.
    pub active_count: i64,
    /// Number of component selection rows across all configurations.
    pub total_components: i64,
    /// Sum of line totals across every selection the user owns.
    pub total_value: f64,
}

impl ConfigurationStats {
    /// Tally statistics from the statuses of a user's configurations and
    /// every line item across them.
    pub fn tally<'a, T, I>(statuses: &[ConfigurationStatus], items: I) -> Self
    where
        T: LineItem + 'a,
        I: IntoIterator<Item = &'a T>,
    {
        let mut total_components = 0_i64;
        let mut total_value = 0.0;
        for item in items {
            total_components += 1;
            total_value += item.line_total();
        }

        Self {
            configuration_count: statuses.len() as i64,
            completed_count: statuses
                .iter()
                .filter(|s| **s == ConfigurationStatus::Completed)
                .count() as i64,
            active_count: statuses.iter().filter(|s| s.is_active()).count() as i64,
            total_components,
            total_value: round_cents(total_value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(price: Option<f64>, quantity: i32) -> PricedQuantity {
        PricedQuantity { price, quantity }
    }

    #[test]
    fn line_total_multiplies_price_by_quantity() {
        assert_eq!(line_total(Some(12.5), 2), 25.0);
        assert_eq!(item(Some(100.0), 3).line_total(), 300.0);
    }

    #[test]
    fn line_total_of_null_price_is_zero() {
        assert_eq!(line_total(None, 7), 0.0);
    }

    #[test]
    fn configuration_total_ignores_null_prices() {
        let items = [item(Some(12.5), 2), item(None, 3)];
        assert_eq!(configuration_total(&items), 25.0);
    }

    #[test]
    fn configuration_total_of_nothing_is_zero() {
        let items: Vec<PricedQuantity> = Vec::new();
        assert_eq!(configuration_total(&items), 0.0);
    }

    #[test]
    fn round_cents_rounds_half_away() {
        assert_eq!(round_cents(10.005_1), 10.01);
        assert_eq!(round_cents(3.0), 3.0);
    }

    #[test]
    fn configuration_total_is_rounded_to_cents() {
        let items = [item(Some(0.1), 3), item(Some(0.2), 1)];
        assert_eq!(configuration_total(&items), 0.5);
    }

    #[test]
    fn amounts_beyond_numeric_12_2_do_not_fit() {
        assert!(fits_amount(MAX_AMOUNT));
        assert!(!fits_amount(1e10));
        assert!(!fits_amount(f64::INFINITY));
    }

    #[test]
    fn format_with_currency_handles_null() {
        assert_eq!(format_with_currency(Some(12.5), "USD"), "USD 12.50");
        assert_eq!(format_with_currency(None, "EUR"), "N/A");
    }

    #[test]
    fn tally_counts_statuses_and_sums_value() {
        let statuses = [
            ConfigurationStatus::Draft,
            ConfigurationStatus::InProgress,
            ConfigurationStatus::Completed,
            ConfigurationStatus::Completed,
        ];
        let items = [item(Some(10.0), 2), item(None, 1), item(Some(5.0), 1)];
        let stats = ConfigurationStats::tally(&statuses, &items);

        assert_eq!(stats.configuration_count, 4);
        assert_eq!(stats.completed_count, 2);
        assert_eq!(stats.active_count, 2);
        assert_eq!(stats.total_components, 3);
        assert_eq!(stats.total_value, 25.0);
    }

    #[test]
    fn tally_sums_mixed_currencies_naively() {
        // Currency labels never enter the computation.
        let items = [item(Some(1.0), 1), item(Some(2.0), 1)];
        let stats = ConfigurationStats::tally(&[], &items);
        assert_eq!(stats.total_value, 3.0);
        assert_eq!(stats.configuration_count, 0);
    }
}
