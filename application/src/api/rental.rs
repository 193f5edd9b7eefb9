//! Rental building blocks shared by quotations, orders and invoices.

use common::{DateTime, Money};
use derive_more::{AsRef, Display, From, Into};
use juniper::{graphql_object, GraphQLEnum, GraphQLScalar};
use service::domain::rental;

use crate::{
    api::{product, scalar, user},
    define_error, Context,
};

/// Window of time a product is rented for.
#[derive(Clone, Copy, Debug, From, Into)]
pub struct Period(rental::Period);

impl Period {
    /// Creates a new [`Period`] out of the provided bounds.
    ///
    /// # Errors
    ///
    /// Errors if the [`Period`] ends before it starts.
    pub fn new(start: DateTime, end: DateTime) -> Result<Self, InputError> {
        rental::Period::new(start.coerce(), end.coerce())
            .map(Self)
            .ok_or(InputError::InvalidPeriod)
    }
}

/// Window of time a product is rented for.
#[graphql_object(name = "RentalPeriod", context = Context)]
impl Period {
    /// `DateTime` when the rental starts.
    #[must_use]
    pub fn start_date(&self) -> DateTime {
        self.0.start().coerce()
    }

    /// `DateTime` when the rental ends.
    #[must_use]
    pub fn end_date(&self) -> DateTime {
        self.0.end().coerce()
    }
}

/// Parses a rental [`rental::Quantity`] out of the provided GraphQL integer.
///
/// # Errors
///
/// Errors if the provided `value` is not positive.
pub fn quantity(value: i32) -> Result<rental::Quantity, InputError> {
    u32::try_from(value)
        .ok()
        .and_then(rental::Quantity::new)
        .ok_or(InputError::InvalidQuantity)
}

/// Converts the provided counter into a GraphQL integer, saturating it.
pub(crate) fn int(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

/// Unit a rental duration is billed in.
#[derive(Clone, Copy, Debug, GraphQLEnum)]
#[graphql(name = "RentalUnit")]
pub enum Unit {
    /// Billed per started hour.
    Hour,

    /// Billed per started day.
    Day,

    /// Billed per started week.
    Week,
}

impl From<rental::Unit> for Unit {
    fn from(unit: rental::Unit) -> Self {
        use rental::Unit as U;
        match unit {
            U::Hour => Self::Hour,
            U::Day => Self::Day,
            U::Week => Self::Week,
        }
    }
}

/// Billable duration of a rental period.
#[derive(Clone, Copy, Debug, From)]
pub struct Duration(rental::Duration);

/// Billable duration of a rental period.
#[graphql_object(name = "RentalDuration", context = Context)]
impl Duration {
    /// Number of billed units.
    #[must_use]
    pub fn value(&self) -> i32 {
        int(self.0.value)
    }

    /// Unit this duration is billed in.
    #[must_use]
    pub fn unit(&self) -> Unit {
        self.0.unit.into()
    }
}

/// Priced rental line.
#[derive(Clone, Debug, From)]
pub struct Item(rental::Item);

/// Priced rental line.
#[graphql_object(name = "RentalItem", context = Context)]
impl Item {
    /// ID of the rented product.
    #[must_use]
    pub fn product_id(&self) -> product::Id {
        self.0.product_id.into()
    }

    /// ID of the vendor owning the rented product.
    #[must_use]
    pub fn vendor_id(&self) -> user::Id {
        self.0.vendor_id.into()
    }

    /// Number of rented units.
    #[must_use]
    pub fn quantity(&self) -> i32 {
        int(self.0.quantity.get())
    }

    /// Rental period of this line.
    #[must_use]
    pub fn period(&self) -> Period {
        self.0.period.into()
    }

    /// Billable duration of the rental period.
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.0.duration.into()
    }

    /// Price of a single unit for the whole billable duration.
    #[must_use]
    pub fn price_per_unit(&self) -> Money {
        self.0.price_per_unit
    }

    /// Total price of this line.
    #[must_use]
    pub fn total_price(&self) -> Money {
        self.0.total_price
    }
}

/// Free-form notes attached to a rental document.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(name = "Notes", with = scalar::Via::<rental::Notes>)]
pub struct Notes(rental::Notes);

define_error! {
    enum InputError {
        #[code = "INVALID_QUANTITY"]
        #[status = BAD_REQUEST]
        #[message = "Quantity must be a positive number"]
        InvalidQuantity,

        #[code = "INVALID_PERIOD"]
        #[status = BAD_REQUEST]
        #[message = "Rental period must not end before it starts"]
        InvalidPeriod,
    }
}
