//! Rental building blocks shared by quotations, orders and invoices.

use std::time;

use common::{
    define_kind, money::Currency, unit, DateTime, DateTimeOf, Money, Percent,
};
use derive_more::{AsRef, Display, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use rust_decimal::Decimal;

use crate::domain::{product, user};
#[cfg(doc)]
use crate::domain::{Order, Product, Quotation};

/// Length of an hour.
const HOUR: time::Duration = time::Duration::from_secs(60 * 60);

/// Length of a day.
const DAY: time::Duration = time::Duration::from_secs(24 * 60 * 60);

/// Number of days in a week.
const DAYS_IN_WEEK: u32 = 7;

/// Window of time a [`Product`] is rented for.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Period {
    /// [`DateTime`] when the rental starts.
    start: StartDateTime,

    /// [`DateTime`] when the rental ends.
    end: EndDateTime,
}

impl Period {
    /// Creates a new [`Period`] if it doesn't end before it starts.
    #[must_use]
    pub fn new(start: StartDateTime, end: EndDateTime) -> Option<Self> {
        (start.coerce::<()>() <= end.coerce()).then_some(Self { start, end })
    }

    /// Returns [`DateTime`] when this [`Period`] starts.
    #[must_use]
    pub fn start(&self) -> StartDateTime {
        self.start
    }

    /// Returns [`DateTime`] when this [`Period`] ends.
    #[must_use]
    pub fn end(&self) -> EndDateTime {
        self.end
    }

    /// Returns the length of this [`Period`].
    #[must_use]
    pub fn length(&self) -> time::Duration {
        self.end.elapsed_since(self.start).unwrap_or_default()
    }

    /// Indicates whether this [`Period`] has zero length.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.length().is_zero()
    }

    /// Indicates whether this [`Period`] overlaps the `other` one.
    ///
    /// Boundaries are inclusive: a [`Period`] ending exactly when the `other`
    /// one starts overlaps it.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        let (start, end) = (self.start.coerce::<()>(), self.end.coerce::<()>());
        let (other_start, other_end) =
            (other.start.coerce::<()>(), other.end.coerce::<()>());

        let contains = |at: DateTime| other_start <= at && at <= other_end;

        contains(start)
            || contains(end)
            || (start <= other_start && end >= other_end)
    }

    /// Formats this [`Period`] as a human-readable `{start} - {end}` range of
    /// calendar dates.
    #[must_use]
    pub fn to_date_range(&self) -> String {
        format!(
            "{} - {}",
            self.start.to_date_string(),
            self.end.to_date_string(),
        )
    }
}

/// [`DateTime`] when a [`Period`] starts.
pub type StartDateTime = DateTimeOf<(Period, unit::Start)>;

/// [`DateTime`] when a [`Period`] ends.
pub type EndDateTime = DateTimeOf<(Period, unit::End)>;

define_kind! {
    #[doc = "Unit a rental [`Duration`] is billed in."]
    enum Unit {
        #[doc = "Billed per started hour."]
        Hour = 1,

        #[doc = "Billed per started day."]
        Day = 2,

        #[doc = "Billed per started week."]
        Week = 3,
    }
}

/// Billable duration of a rental [`Period`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Duration {
    /// Number of [`Unit`]s.
    pub value: u32,

    /// [`Unit`] of this [`Duration`].
    pub unit: Unit,
}

impl Duration {
    /// Selects the billable [`Duration`] of the provided [`Period`].
    ///
    /// A [`Period`] shorter than a day is billed in started hours, one shorter
    /// than a week (in started days) is billed in started days, and anything
    /// longer is billed in started weeks.
    #[must_use]
    pub fn billable(period: &Period) -> Self {
        let length = period.length();
        if length < DAY {
            return Self {
                value: ceil_div(length, HOUR),
                unit: Unit::Hour,
            };
        }

        let days = started_days(length);
        if days < DAYS_IN_WEEK {
            Self {
                value: days,
                unit: Unit::Day,
            }
        } else {
            Self {
                value: days.div_ceil(DAYS_IN_WEEK),
                unit: Unit::Week,
            }
        }
    }
}

/// Returns the number of days started within the provided `elapsed` time.
#[must_use]
pub fn started_days(elapsed: time::Duration) -> u32 {
    ceil_div(elapsed, DAY)
}

/// Divides the provided `length` by the `unit`, rounding up.
fn ceil_div(length: time::Duration, unit: time::Duration) -> u32 {
    u32::try_from(length.as_nanos().div_ceil(unit.as_nanos()))
        .unwrap_or(u32::MAX)
}

/// Number of [`Product`] units being rented.
#[derive(Clone, Copy, Debug, Display, Eq, Into, Ord, PartialEq, PartialOrd)]
pub struct Quantity(u32);

impl Quantity {
    /// Creates a new [`Quantity`] if the provided `value` is positive.
    #[must_use]
    pub const fn new(value: u32) -> Option<Self> {
        if value == 0 {
            None
        } else {
            Some(Self(value))
        }
    }

    /// Returns the number of units.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl From<Quantity> for Decimal {
    fn from(quantity: Quantity) -> Self {
        Self::from(quantity.0)
    }
}

/// Priced rental line of a [`Quotation`] or an [`Order`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Item {
    /// ID of the rented [`Product`].
    pub product_id: product::Id,

    /// ID of the vendor owning the rented [`Product`].
    pub vendor_id: user::Id,

    /// [`Quantity`] of the rented [`Product`].
    pub quantity: Quantity,

    /// [`Period`] the [`Product`] is rented for.
    pub period: Period,

    /// Billable [`Duration`] of the [`Period`].
    pub duration: Duration,

    /// Price of a single [`Unit`] of a single [`Product`].
    pub price_per_unit: Money,

    /// Total price of this [`Item`].
    pub total_price: Money,
}

/// Aggregated amounts of a [`Quotation`], an [`Order`] or an invoice.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Totals {
    /// Sum of all item prices.
    pub subtotal: Money,

    /// Tax rate applied to the [`Totals::subtotal`].
    pub tax_rate: Percent,

    /// Tax charged upon the [`Totals::subtotal`].
    pub tax_amount: Money,

    /// Amount to be paid.
    pub total_amount: Money,
}

impl Totals {
    /// Computes [`Totals`] of the provided `subtotal` taxed with the provided
    /// `tax_rate`.
    #[must_use]
    pub fn compute(subtotal: Money, tax_rate: Percent) -> Self {
        let subtotal = subtotal.round();
        let tax_amount = subtotal.percent(tax_rate);
        Self {
            subtotal,
            tax_rate,
            tax_amount,
            total_amount: Money {
                amount: subtotal.amount + tax_amount.amount,
                currency: subtotal.currency,
            },
        }
    }
}

/// Commercial terms of the marketplace.
#[derive(Clone, Copy, Debug)]
pub struct Terms {
    /// [`Currency`] every [`Product`] is priced in.
    pub currency: Currency,

    /// Tax rate applied to [`Quotation`]s.
    pub tax_rate: Percent,

    /// Time a [`Quotation`] stays valid after its creation.
    pub quotation_validity: time::Duration,

    /// Time an invoice is due in after its creation.
    pub invoice_due: time::Duration,

    /// Share of the daily rate charged per unit for every day of a late
    /// return.
    pub late_fee_rate: Percent,
}

impl Default for Terms {
    fn default() -> Self {
        #[expect(unsafe_code, reason = "constants are within range")]
        let (tax_rate, late_fee_rate) = unsafe {
            (
                Percent::new_unchecked(Decimal::from(18)),
                Percent::new_unchecked(Decimal::TEN),
            )
        };
        Self {
            currency: Currency::Inr,
            tax_rate,
            quotation_validity: 7 * DAY,
            invoice_due: 7 * DAY,
            late_fee_rate,
        }
    }
}

/// Free-form notes attached to a rental document.
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Notes(String);

impl Notes {
    /// Creates new [`Notes`] if the provided `notes` are valid.
    #[must_use]
    pub fn new(notes: impl Into<String>) -> Option<Self> {
        let notes = notes.into();
        Self::check(&notes).then_some(Self(notes))
    }

    /// Checks whether the provided `notes` are valid [`Notes`].
    fn check(notes: impl AsRef<str>) -> bool {
        let notes = notes.as_ref();
        !notes.trim().is_empty() && notes.len() <= 4096
    }
}

impl FromStr for Notes {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Notes`")
    }
}

#[cfg(test)]
mod spec {
    use std::time;

    use common::DateTime;

    use super::{started_days, Duration, Period, Unit};

    fn period(start: &str, end: &str) -> Period {
        Period::new(
            DateTime::from_rfc3339(start).unwrap().coerce(),
            DateTime::from_rfc3339(end).unwrap().coerce(),
        )
        .unwrap()
    }

    fn billable(start: &str, end: &str) -> Duration {
        Duration::billable(&period(start, end))
    }

    #[test]
    fn rejects_reversed_period() {
        assert!(Period::new(
            DateTime::from_rfc3339("2024-01-02T00:00:00Z").unwrap().coerce(),
            DateTime::from_rfc3339("2024-01-01T00:00:00Z").unwrap().coerce(),
        )
        .is_none());
        assert!(period("2024-01-01T00:00:00Z", "2024-01-01T00:00:00Z")
            .is_empty());
    }

    #[test]
    fn overlapping_includes_boundaries() {
        let reserved = period("2024-01-01T00:00:00Z", "2024-01-05T00:00:00Z");

        for (start, end, overlaps) in [
            ("2024-01-05T00:00:00Z", "2024-01-10T00:00:00Z", true),
            ("2023-12-25T00:00:00Z", "2024-01-01T00:00:00Z", true),
            ("2024-01-02T00:00:00Z", "2024-01-03T00:00:00Z", true),
            ("2023-12-01T00:00:00Z", "2024-02-01T00:00:00Z", true),
            ("2024-01-05T00:00:01Z", "2024-01-10T00:00:00Z", false),
            ("2023-12-01T00:00:00Z", "2023-12-31T23:59:59Z", false),
        ] {
            assert_eq!(
                period(start, end).overlaps(&reserved),
                overlaps,
                "[{start}, {end}]",
            );
        }
    }

    #[test]
    fn bills_short_periods_hourly() {
        assert_eq!(
            billable("2024-01-01T00:00:00Z", "2024-01-01T12:00:00Z"),
            Duration {
                value: 12,
                unit: Unit::Hour,
            },
        );
        assert_eq!(
            billable("2024-01-01T00:00:00Z", "2024-01-01T23:00:00Z"),
            Duration {
                value: 23,
                unit: Unit::Hour,
            },
        );
        assert_eq!(
            billable("2024-01-01T00:00:00Z", "2024-01-01T00:30:00Z"),
            Duration {
                value: 1,
                unit: Unit::Hour,
            },
        );
    }

    #[test]
    fn bills_medium_periods_daily() {
        assert_eq!(
            billable("2024-01-01T00:00:00Z", "2024-01-02T00:00:00Z"),
            Duration {
                value: 1,
                unit: Unit::Day,
            },
        );
        assert_eq!(
            billable("2024-01-01T00:00:00Z", "2024-01-04T00:00:00Z"),
            Duration {
                value: 3,
                unit: Unit::Day,
            },
        );
        assert_eq!(
            billable("2024-01-01T00:00:00Z", "2024-01-07T00:00:00Z"),
            Duration {
                value: 6,
                unit: Unit::Day,
            },
        );
    }

    #[test]
    fn bills_long_periods_weekly() {
        assert_eq!(
            billable("2024-01-01T00:00:00Z", "2024-01-08T00:00:00Z"),
            Duration {
                value: 1,
                unit: Unit::Week,
            },
        );
        assert_eq!(
            billable("2024-01-01T00:00:00Z", "2024-01-10T00:00:00Z"),
            Duration {
                value: 2,
                unit: Unit::Week,
            },
        );
    }

    #[test]
    fn counts_started_days() {
        assert_eq!(started_days(time::Duration::ZERO), 0);
        assert_eq!(started_days(time::Duration::from_secs(1)), 1);
        assert_eq!(started_days(time::Duration::from_secs(3 * 86_400)), 3);
        assert_eq!(started_days(time::Duration::from_secs(3 * 86_400 + 1)), 4);
    }

    #[test]
    fn formats_date_range() {
        assert_eq!(
            period("2024-01-01T10:00:00Z", "2024-01-10T18:00:00Z")
                .to_date_range(),
            "2024-01-01 - 2024-01-10",
        );
    }
}
