//! Cost derivation for energy readings

use crate::shared::{round_f64, to_decimal};

/// Flat per-kWh tariff applied to every reading.
#[derive(Debug, Clone, PartialEq)]
pub struct Pricing {
    pub rate_per_kwh: f64,
    pub currency: String,
}

impl Pricing {
    pub fn new(rate_per_kwh: f64, currency: impl Into<String>) -> Self {
        Self {
            rate_per_kwh,
            currency: currency.into(),
        }
    }

    /// Cost of `consumption_kwh`, rounded to six decimal places.
    pub fn cost_of(&self, consumption_kwh: f64) -> f64 {
        round_f64(
            to_decimal(consumption_kwh).saturating_mul(to_decimal(self.rate_per_kwh)),
            6,
        )
    }
}

impl Default for Pricing {
    fn default() -> Self {
        Self::new(0.15, "USD")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cost_is_consumption_times_rate() {
        let pricing = Pricing::new(0.2, "USD");
        assert_eq!(pricing.cost_of(10.0), 2.0);
        assert_eq!(pricing.cost_of(15.0), 3.0);
        assert_eq!(pricing.cost_of(0.0), 0.0);
    }

    #[test]
    fn largest_accepted_reading_is_priced() {
        let pricing = Pricing::new(0.2, "USD");
        assert_eq!(pricing.cost_of(crate::domain::MAX_MEASUREMENT), 200_000_000.0);
    }

    #[test]
    fn cost_has_no_binary_float_noise() {
        let pricing = Pricing::new(0.1, "USD");
        assert_eq!(pricing.cost_of(3.0), 0.3);
    }
}
