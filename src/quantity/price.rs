//! Energy prices in the two units the system deals with.

use crate::quantity::percent::Percent;

quantity!(
    /// Wholesale day-ahead price, as published by the market and stored in the database.
    MegawattHourPrice, suffix: "€/MWh", precision: 2
);

quantity!(
    /// Consumer-facing price: cents per kilowatt-hour including VAT.
    KilowattHourCents, suffix: "¢/kWh", precision: 2
);

impl MegawattHourPrice {
    /// Convert to cents per kilowatt-hour with the VAT applied, without rounding.
    pub fn to_cents_per_kwh(self, vat: Percent) -> KilowattHourCents {
        KilowattHourCents(self.0 / 1000.0 * (1.0 + vat.to_proportion()) * 100.0)
    }
}

impl KilowattHourCents {
    /// Round to whole hundredths, the precision at which prices are compared.
    #[must_use]
    pub fn round(self) -> Self {
        Self((self.0 * 100.0).round() / 100.0)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn test_to_cents_per_kwh() {
        let price = MegawattHourPrice(50.0).to_cents_per_kwh(Percent(25.5));
        assert_abs_diff_eq!(price.0, 6.275, epsilon = 1e-9);
    }

    #[test]
    fn test_to_cents_per_kwh_zero_vat() {
        let price = MegawattHourPrice(123.4).to_cents_per_kwh(Percent(0.0));
        assert_abs_diff_eq!(price.0, 12.34, epsilon = 1e-9);
    }

    #[test]
    fn test_negative_price() {
        let price = MegawattHourPrice(-10.0).to_cents_per_kwh(Percent(24.0)).round();
        assert_eq!(price, KilowattHourCents(-1.24));
    }

    #[test]
    fn test_round() {
        assert_eq!(KilowattHourCents(7.894_999).round(), KilowattHourCents(7.89));
        assert_eq!(KilowattHourCents(7.895_001).round(), KilowattHourCents(7.9));
    }

    #[test]
    fn test_display() {
        assert_eq!(KilowattHourCents(7.9).to_string(), "7.90 ¢/kWh");
        assert_eq!(MegawattHourPrice(50.0).to_string(), "50.00 €/MWh");
    }
}
