//! [`Product`] availability checks.

use crate::domain::rental::{Period, Quantity};

use super::Product;

/// Availability of a [`Product`] for some [`Period`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Availability {
    /// Indicates whether the requested [`Quantity`] can be reserved.
    pub is_available: bool,

    /// Number of units not reserved for the [`Period`].
    pub free_quantity: u32,
}

impl Product {
    /// Returns the number of units reserved for any time within the provided
    /// [`Period`].
    #[must_use]
    pub fn reserved_quantity(&self, period: &Period) -> u64 {
        self.reservations
            .iter()
            .filter(|r| period.overlaps(&r.period))
            .map(|r| u64::from(r.quantity.get()))
            .sum()
    }

    /// Checks whether the provided [`Quantity`] of this [`Product`] is free
    /// for the provided [`Period`].
    #[must_use]
    pub fn availability(
        &self,
        quantity: Quantity,
        period: &Period,
    ) -> Availability {
        let free = u64::from(self.quantity_on_hand)
            .saturating_sub(self.reserved_quantity(period));
        Availability {
            is_available: free >= u64::from(quantity.get()),
            free_quantity: u32::try_from(free).unwrap_or(u32::MAX),
        }
    }

    /// Indicates whether the provided [`Quantity`] of this [`Product`] is free
    /// for the provided [`Period`].
    #[must_use]
    pub fn is_available(&self, quantity: Quantity, period: &Period) -> bool {
        self.availability(quantity, period).is_available
    }
}

#[cfg(test)]
mod spec {
    use common::{money::Currency, DateTime};

    use crate::domain::{
        order,
        product::{self, Pricing, Reservation},
        rental::{Period, Quantity},
        user, Product,
    };

    fn period(start: &str, end: &str) -> Period {
        Period::new(
            DateTime::from_rfc3339(start).unwrap().coerce(),
            DateTime::from_rfc3339(end).unwrap().coerce(),
        )
        .unwrap()
    }

    fn quantity(n: u32) -> Quantity {
        Quantity::new(n).unwrap()
    }

    fn product(on_hand: u32, reserved: &[(u32, &str, &str)]) -> Product {
        let id = product::Id::new();
        Product {
            id,
            name: product::Name::new("Excavator").unwrap(),
            vendor_id: user::Id::new(),
            quantity_on_hand: on_hand,
            pricing: Pricing {
                currency: Currency::Inr,
                hourly: None,
                daily: None,
                weekly: None,
            },
            reservations: reserved
                .iter()
                .map(|(q, start, end)| Reservation {
                    product_id: id,
                    order_id: order::Id::new(),
                    quantity: quantity(*q),
                    period: period(start, end),
                })
                .collect(),
        }
    }

    #[test]
    fn available_without_reservations() {
        let p = product(5, &[]);
        let window = period("2024-03-01T00:00:00Z", "2024-03-03T00:00:00Z");

        assert!(p.is_available(quantity(5), &window));
        assert!(!p.is_available(quantity(6), &window));
    }

    #[test]
    fn fully_reserved_window_is_unavailable() {
        let p = product(
            5,
            &[(5, "2024-03-01T00:00:00Z", "2024-03-03T00:00:00Z")],
        );
        let window = period("2024-03-01T00:00:00Z", "2024-03-03T00:00:00Z");

        let availability = p.availability(quantity(1), &window);
        assert!(!availability.is_available);
        assert_eq!(availability.free_quantity, 0);
    }

    #[test]
    fn touching_reservation_counts_as_overlapping() {
        let p = product(
            1,
            &[(1, "2024-01-01T00:00:00Z", "2024-01-05T00:00:00Z")],
        );

        assert!(!p.is_available(
            quantity(1),
            &period("2024-01-05T00:00:00Z", "2024-01-10T00:00:00Z"),
        ));
        assert!(p.is_available(
            quantity(1),
            &period("2024-01-06T00:00:00Z", "2024-01-10T00:00:00Z"),
        ));
    }

    #[test]
    fn sums_only_overlapping_reservations() {
        let p = product(
            10,
            &[
                (3, "2024-01-01T00:00:00Z", "2024-01-05T00:00:00Z"),
                (4, "2024-01-04T00:00:00Z", "2024-01-08T00:00:00Z"),
                (2, "2024-02-01T00:00:00Z", "2024-02-05T00:00:00Z"),
            ],
        );
        let window = period("2024-01-03T00:00:00Z", "2024-01-06T00:00:00Z");

        assert_eq!(p.reserved_quantity(&window), 7);
        assert!(p.is_available(quantity(3), &window));
        assert!(!p.is_available(quantity(4), &window));
    }

    #[test]
    fn zero_length_window_is_still_checked() {
        let p = product(
            2,
            &[(2, "2024-01-01T00:00:00Z", "2024-01-05T00:00:00Z")],
        );
        let instant = period("2024-01-03T00:00:00Z", "2024-01-03T00:00:00Z");

        assert!(!p.is_available(quantity(1), &instant));
    }

    #[test]
    fn over_reserved_product_has_no_free_units() {
        let p = product(
            1,
            &[
                (1, "2024-01-01T00:00:00Z", "2024-01-05T00:00:00Z"),
                (1, "2024-01-02T00:00:00Z", "2024-01-03T00:00:00Z"),
            ],
        );
        let window = period("2024-01-01T00:00:00Z", "2024-01-05T00:00:00Z");

        assert_eq!(p.availability(quantity(1), &window).free_quantity, 0);
    }
}
