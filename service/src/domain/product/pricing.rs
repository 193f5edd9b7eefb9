//! [`Pricing`] of a [`Product`].

use common::{money::Currency, Money, Percent};
use rust_decimal::Decimal;

use crate::domain::rental::{self, Period, Quantity, Unit};

use super::Product;

/// Tiered rental rates of a [`Product`].
///
/// A missing rate tier prices as zero.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Pricing {
    /// [`Currency`] the rates are expressed in.
    pub currency: Currency,

    /// Rate per started hour.
    pub hourly: Option<Decimal>,

    /// Rate per started day.
    pub daily: Option<Decimal>,

    /// Rate per started week.
    pub weekly: Option<Decimal>,
}

impl Pricing {
    /// Returns the rate of the provided [`Unit`].
    #[must_use]
    pub fn rate(&self, unit: Unit) -> Money {
        let amount = match unit {
            Unit::Hour => self.hourly,
            Unit::Day => self.daily,
            Unit::Week => self.weekly,
        };
        Money {
            amount: amount.unwrap_or_default(),
            currency: self.currency,
        }
    }

    /// Computes the late return fee of the provided [`Quantity`] returned
    /// `late_days` later than expected.
    ///
    /// Every late day of every unit is charged with the provided `rate` of the
    /// daily rate.
    #[must_use]
    pub fn late_fee(
        &self,
        rate: Percent,
        late_days: u32,
        quantity: Quantity,
    ) -> Money {
        Money {
            amount: rate.of(self.rate(Unit::Day).amount),
            currency: self.currency,
        } * quantity.get()
            * late_days
    }
}

impl Product {
    /// Prices the provided [`Quantity`] of this [`Product`] rented for the
    /// provided [`Period`].
    #[must_use]
    pub fn price(&self, quantity: Quantity, period: Period) -> rental::Item {
        let duration = rental::Duration::billable(&period);
        let price_per_unit = self.pricing.rate(duration.unit);
        rental::Item {
            product_id: self.id,
            vendor_id: self.vendor_id,
            quantity,
            period,
            duration,
            price_per_unit,
            total_price: (price_per_unit * quantity.get() * duration.value)
                .round(),
        }
    }
}

#[cfg(test)]
mod spec {
    use common::{money::Currency, DateTime, Money, Percent};
    use rust_decimal::Decimal;

    use crate::domain::{
        product::{self, Pricing},
        rental::{Duration, Period, Quantity, Unit},
        user, Product,
    };

    fn period(start: &str, end: &str) -> Period {
        Period::new(
            DateTime::from_rfc3339(start).unwrap().coerce(),
            DateTime::from_rfc3339(end).unwrap().coerce(),
        )
        .unwrap()
    }

    fn inr(amount: u32) -> Money {
        Money {
            amount: Decimal::from(amount),
            currency: Currency::Inr,
        }
    }

    fn product(pricing: Pricing) -> Product {
        Product {
            id: product::Id::new(),
            name: product::Name::new("Generator").unwrap(),
            vendor_id: user::Id::new(),
            quantity_on_hand: 10,
            pricing,
            reservations: vec![],
        }
    }

    fn tiered() -> Pricing {
        Pricing {
            currency: Currency::Inr,
            hourly: Some(Decimal::from(50)),
            daily: Some(Decimal::from(100)),
            weekly: Some(Decimal::from(500)),
        }
    }

    #[test]
    fn prices_by_billable_bucket() {
        let p = product(tiered());
        let two = Quantity::new(2).unwrap();

        let hourly =
            p.price(two, period("2024-01-01T00:00:00Z", "2024-01-01T12:00:00Z"));
        assert_eq!(
            hourly.duration,
            Duration {
                value: 12,
                unit: Unit::Hour,
            },
        );
        assert_eq!(hourly.price_per_unit, inr(50));
        assert_eq!(hourly.total_price, inr(1200));

        let daily =
            p.price(two, period("2024-01-01T00:00:00Z", "2024-01-04T00:00:00Z"));
        assert_eq!(daily.price_per_unit, inr(100));
        assert_eq!(daily.total_price, inr(600));

        let weekly =
            p.price(two, period("2024-01-01T00:00:00Z", "2024-01-10T00:00:00Z"));
        assert_eq!(weekly.price_per_unit, inr(500));
        assert_eq!(weekly.total_price, inr(2000));
    }

    #[test]
    fn missing_tier_prices_as_zero() {
        let p = product(Pricing {
            weekly: None,
            ..tiered()
        });

        let item = p.price(
            Quantity::new(1).unwrap(),
            period("2024-01-01T00:00:00Z", "2024-01-15T00:00:00Z"),
        );
        assert!(item.total_price.is_zero());
    }

    #[test]
    fn pricing_is_pure() {
        let p = product(tiered());
        let window = period("2024-01-01T00:00:00Z", "2024-01-03T06:00:00Z");
        let quantity = Quantity::new(3).unwrap();

        assert_eq!(p.price(quantity, window), p.price(quantity, window));
    }

    #[test]
    fn charges_share_of_daily_rate_per_late_day() {
        let ten = "10".parse::<Percent>().unwrap();

        assert_eq!(
            tiered().late_fee(ten, 3, Quantity::new(2).unwrap()),
            inr(60),
        );
        assert!(tiered()
            .late_fee(ten, 0, Quantity::new(2).unwrap())
            .is_zero());
    }
}
