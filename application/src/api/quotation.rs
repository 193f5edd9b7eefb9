//! [`Quotation`]-related definitions.

use common::{DateTime, Money, Percent};
use derive_more::{Display, From, Into};
use juniper::{graphql_object, GraphQLEnum, GraphQLInputObject, GraphQLScalar};
use service::domain::{self, quotation};
use uuid::Uuid;

use crate::{
    api::{product, rental, user},
    define_error, Context,
};

/// A priced, time-limited offer of rental items.
#[derive(Clone, Debug, From, Into)]
pub struct Quotation(domain::Quotation);

/// A priced, time-limited offer of rental items.
#[graphql_object(context = Context)]
impl Quotation {
    /// Unique identifier of this `Quotation`.
    #[must_use]
    pub fn id(&self) -> Id {
        self.0.id.into()
    }

    /// Human-readable number of this `Quotation`.
    #[must_use]
    pub fn number(&self) -> String {
        self.0.number.to_string()
    }

    /// ID of the customer this `Quotation` is made for.
    #[must_use]
    pub fn customer_id(&self) -> user::Id {
        self.0.customer_id.into()
    }

    /// Priced items of this `Quotation`.
    #[must_use]
    pub fn items(&self) -> Vec<rental::Item> {
        self.0.items.iter().cloned().map(Into::into).collect()
    }

    /// Sum of all the item prices.
    #[must_use]
    pub fn subtotal(&self) -> Money {
        self.0.totals.subtotal
    }

    /// Tax rate this `Quotation` was priced with.
    #[must_use]
    pub fn tax_rate(&self) -> Percent {
        self.0.totals.tax_rate
    }

    /// Tax charged on top of the subtotal.
    #[must_use]
    pub fn tax_amount(&self) -> Money {
        self.0.totals.tax_amount
    }

    /// Total amount to be paid.
    #[must_use]
    pub fn total_amount(&self) -> Money {
        self.0.totals.total_amount
    }

    /// Status of this `Quotation`.
    #[must_use]
    pub fn status(&self) -> Status {
        self.0.status.into()
    }

    /// Notes of the customer.
    #[must_use]
    pub fn notes(&self) -> Option<rental::Notes> {
        self.0.notes.clone().map(Into::into)
    }

    /// `DateTime` this `Quotation` stays valid until.
    #[must_use]
    pub fn valid_until(&self) -> DateTime {
        self.0.valid_until.coerce()
    }

    /// `DateTime` when this `Quotation` was created.
    #[must_use]
    pub fn created_at(&self) -> DateTime {
        self.0.created_at.coerce()
    }

    /// `DateTime` when this `Quotation` was updated last time.
    #[must_use]
    pub fn updated_at(&self) -> DateTime {
        self.0.updated_at.coerce()
    }
}

/// Unique identifier of a `Quotation`.
#[derive(Clone, Copy, Debug, Display, Into, From, GraphQLScalar)]
#[from(quotation::Id)]
#[into(quotation::Id)]
#[graphql(name = "QuotationId", transparent)]
pub struct Id(Uuid);

/// Status of a `Quotation`.
#[derive(Clone, Copy, Debug, GraphQLEnum)]
#[graphql(name = "QuotationStatus")]
pub enum Status {
    /// Being prepared, editable.
    Draft,

    /// Sent to the customer.
    Sent,

    /// Accepted by the customer.
    Confirmed,

    /// Not accepted in time.
    Expired,

    /// Withdrawn.
    Cancelled,
}

impl From<quotation::Status> for Status {
    fn from(status: quotation::Status) -> Self {
        use quotation::Status as S;
        match status {
            S::Draft => Self::Draft,
            S::Sent => Self::Sent,
            S::Confirmed => Self::Confirmed,
            S::Expired => Self::Expired,
            S::Cancelled => Self::Cancelled,
        }
    }
}

impl From<Status> for quotation::Status {
    fn from(status: Status) -> Self {
        match status {
            Status::Draft => Self::Draft,
            Status::Sent => Self::Sent,
            Status::Confirmed => Self::Confirmed,
            Status::Expired => Self::Expired,
            Status::Cancelled => Self::Cancelled,
        }
    }
}

/// Requested item of a `Quotation`.
#[derive(Clone, Copy, Debug, GraphQLInputObject)]
#[graphql(name = "QuotationItemInput")]
pub struct ItemInput {
    /// ID of the requested product.
    pub product_id: product::Id,

    /// Requested number of units.
    pub quantity: i32,

    /// `DateTime` when the rental starts.
    pub start_date: DateTime,

    /// `DateTime` when the rental ends.
    pub end_date: DateTime,
}

impl TryFrom<ItemInput> for quotation::Request {
    type Error = rental::InputError;

    fn try_from(input: ItemInput) -> Result<Self, Self::Error> {
        let ItemInput {
            product_id,
            quantity,
            start_date,
            end_date,
        } = input;

        Ok(Self {
            product_id: product_id.into(),
            quantity: rental::quantity(quantity)?,
            period: rental::Period::new(start_date, end_date)?.into(),
        })
    }
}

define_error! {
    enum QuotationError {
        #[code = "QUOTATION_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Quotation` with the provided ID does not exist"]
        NotExists,

        #[code = "QUOTATION_FORBIDDEN"]
        #[status = FORBIDDEN]
        #[message = "Authenticated user takes no part in the `Quotation`"]
        NotPermitted,
    }
}
