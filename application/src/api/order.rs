//! [`Order`]-related definitions.

use common::{DateTime, Money, Percent};
use derive_more::{AsRef, Display, From, Into};
use juniper::{graphql_object, GraphQLEnum, GraphQLScalar};
use service::{
    domain::{self, order},
    query::{self, VisibleQueryError},
    Query as _,
};
use uuid::Uuid;

use crate::{
    api::{self, invoice, quotation, rental, scalar, user},
    define_error, Context, Error,
};

/// A rental order placed from a confirmed `Quotation`.
#[derive(Clone, Debug, From, Into)]
pub struct Order(domain::Order);

/// A rental order placed from a confirmed `Quotation`.
#[graphql_object(context = Context)]
impl Order {
    /// Unique identifier of this `Order`.
    #[must_use]
    pub fn id(&self) -> Id {
        self.0.id.into()
    }

    /// Human-readable number of this `Order`.
    #[must_use]
    pub fn number(&self) -> String {
        self.0.number.to_string()
    }

    /// ID of the `Quotation` this `Order` was placed from.
    #[must_use]
    pub fn quotation_id(&self) -> Option<quotation::Id> {
        self.0.quotation_id.map(Into::into)
    }

    /// ID of the renting customer.
    #[must_use]
    pub fn customer_id(&self) -> user::Id {
        self.0.customer_id.into()
    }

    /// ID of the vendor fulfilling this `Order`.
    #[must_use]
    pub fn vendor_id(&self) -> user::Id {
        self.0.vendor_id.into()
    }

    /// Rented items of this `Order`.
    #[must_use]
    pub fn items(&self) -> Vec<Item> {
        self.0.items.iter().cloned().map(Into::into).collect()
    }

    /// Sum of all the item prices.
    #[must_use]
    pub fn subtotal(&self) -> Money {
        self.0.totals.subtotal
    }

    /// Tax rate this `Order` was priced with.
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

    /// Refundable security deposit held for this `Order`.
    #[must_use]
    pub fn security_deposit(&self) -> Money {
        self.0.security_deposit
    }

    /// Fee charged for returning the items late.
    #[must_use]
    pub fn late_return_fee(&self) -> Money {
        self.0.late_return_fee
    }

    /// Status of this `Order`.
    #[must_use]
    pub fn status(&self) -> Status {
        self.0.status.into()
    }

    /// Payment status of this `Order`, derived from its `Invoice`.
    #[must_use]
    pub fn payment_status(&self) -> PaymentStatus {
        self.0.payment_status.into()
    }

    /// Address this `Order` is shipped to.
    #[must_use]
    pub fn shipping_address(&self) -> Option<ShippingAddress> {
        self.0.shipping_address.clone().map(Into::into)
    }

    /// Notes of the customer.
    #[must_use]
    pub fn notes(&self) -> Option<rental::Notes> {
        self.0.notes.clone().map(Into::into)
    }

    /// `DateTime` when the items were picked up.
    #[must_use]
    pub fn pickup_date(&self) -> Option<DateTime> {
        self.0.pickup_date.map(|d| d.coerce())
    }

    /// `DateTime` the items are expected back at.
    #[must_use]
    pub fn return_date(&self) -> Option<DateTime> {
        self.0.return_date.map(|d| d.coerce())
    }

    /// `DateTime` when the items were actually returned.
    #[must_use]
    pub fn actual_return_date(&self) -> Option<DateTime> {
        self.0.actual_return_date.map(|d| d.coerce())
    }

    /// `DateTime` when this `Order` was created.
    #[must_use]
    pub fn created_at(&self) -> DateTime {
        self.0.created_at.coerce()
    }

    /// `DateTime` when this `Order` was updated last time.
    #[must_use]
    pub fn updated_at(&self) -> DateTime {
        self.0.updated_at.coerce()
    }

    /// `Invoice` issued for this `Order`, if any.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Order.invoice",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn invoice(
        &self,
        ctx: &Context,
    ) -> Result<Option<invoice::Invoice>, Error> {
        let actor = ctx.current_actor().await?;
        match ctx
            .service()
            .execute(query::invoice::ByOrderId::by(self.0.id, actor))
            .await
        {
            Ok(invoice) => Ok(Some(invoice.into())),
            Err(e) if matches!(e.as_ref(), VisibleQueryError::NotExists(_)) => {
                Ok(None)
            }
            Err(e) => Err(api::visibility_error(
                e,
                invoice::InvoiceError::NotExists,
                invoice::InvoiceError::NotPermitted,
            ))
            .map_err(ctx.error()),
        }
    }
}

/// Unique identifier of an `Order`.
#[derive(Clone, Copy, Debug, Display, Into, From, GraphQLScalar)]
#[from(order::Id)]
#[into(order::Id)]
#[graphql(name = "OrderId", transparent)]
pub struct Id(Uuid);

/// Rented item of an `Order`.
#[derive(Clone, Debug, From)]
pub struct Item(order::Item);

/// Rented item of an `Order`.
#[graphql_object(name = "OrderItem", context = Context)]
impl Item {
    /// Priced rental line of this `OrderItem`.
    #[must_use]
    pub fn line(&self) -> rental::Item {
        self.0.line.clone().into()
    }

    /// Status of this `OrderItem`.
    #[must_use]
    pub fn status(&self) -> ItemStatus {
        self.0.status.into()
    }
}

/// Address an `Order` is shipped to.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "ShippingAddress",
    with = scalar::Via::<order::ShippingAddress>,
)]
pub struct ShippingAddress(order::ShippingAddress);

/// Status of an `Order`.
#[derive(Clone, Copy, Debug, GraphQLEnum)]
#[graphql(name = "OrderStatus")]
pub enum Status {
    /// Being prepared.
    Draft,

    /// Accepted, with the items reserved.
    Confirmed,

    /// Being prepared for a pickup.
    Processing,

    /// Picked up by the customer.
    PickedUp,

    /// In use by the customer.
    Active,

    /// Returned by the customer.
    Completed,

    /// Cancelled, with the reservations released.
    Cancelled,
}

impl From<order::Status> for Status {
    fn from(status: order::Status) -> Self {
        use order::Status as S;
        match status {
            S::Draft => Self::Draft,
            S::Confirmed => Self::Confirmed,
            S::Processing => Self::Processing,
            S::PickedUp => Self::PickedUp,
            S::Active => Self::Active,
            S::Completed => Self::Completed,
            S::Cancelled => Self::Cancelled,
        }
    }
}

impl From<Status> for order::Status {
    fn from(status: Status) -> Self {
        match status {
            Status::Draft => Self::Draft,
            Status::Confirmed => Self::Confirmed,
            Status::Processing => Self::Processing,
            Status::PickedUp => Self::PickedUp,
            Status::Active => Self::Active,
            Status::Completed => Self::Completed,
            Status::Cancelled => Self::Cancelled,
        }
    }
}

/// Status of an `OrderItem`.
#[derive(Clone, Copy, Debug, GraphQLEnum)]
#[graphql(name = "OrderItemStatus")]
pub enum ItemStatus {
    /// Waiting for a pickup.
    Pending,

    /// Picked up from the vendor.
    PickedUp,

    /// In use by the customer.
    WithCustomer,

    /// Returned to the vendor.
    Returned,

    /// Not returned in time.
    Late,
}

impl From<order::ItemStatus> for ItemStatus {
    fn from(status: order::ItemStatus) -> Self {
        use order::ItemStatus as S;
        match status {
            S::Pending => Self::Pending,
            S::PickedUp => Self::PickedUp,
            S::WithCustomer => Self::WithCustomer,
            S::Returned => Self::Returned,
            S::Late => Self::Late,
        }
    }
}

/// Payment status of an `Order`.
#[derive(Clone, Copy, Debug, GraphQLEnum)]
#[graphql(name = "OrderPaymentStatus")]
pub enum PaymentStatus {
    /// Nothing is paid yet.
    Pending,

    /// Paid partially.
    Partial,

    /// Paid in full.
    Paid,
}

impl From<order::PaymentStatus> for PaymentStatus {
    fn from(status: order::PaymentStatus) -> Self {
        use order::PaymentStatus as S;
        match status {
            S::Pending => Self::Pending,
            S::Partial => Self::Partial,
            S::Paid => Self::Paid,
        }
    }
}

define_error! {
    enum OrderError {
        #[code = "ORDER_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Order` with the provided ID does not exist"]
        NotExists,

        #[code = "ORDER_FORBIDDEN"]
        #[status = FORBIDDEN]
        #[message = "Authenticated user is not permitted to act on the \
                     `Order`"]
        NotPermitted,
    }
}
