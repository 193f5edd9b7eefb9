//! [`Pickup`]-related definitions.

use common::DateTime;
use derive_more::{Display, From, Into};
use juniper::{graphql_object, GraphQLEnum, GraphQLScalar};
use service::domain::{self, pickup};
use uuid::Uuid;

use crate::{
    api::{order, product, rental, user},
    define_error, Context,
};

/// A hand-over of `Order` items to the customer.
#[derive(Clone, Debug, From, Into)]
pub struct Pickup(domain::Pickup);

/// A hand-over of `Order` items to the customer.
#[graphql_object(context = Context)]
impl Pickup {
    /// Unique identifier of this `Pickup`.
    #[must_use]
    pub fn id(&self) -> Id {
        self.0.id.into()
    }

    /// Human-readable number of this `Pickup`.
    #[must_use]
    pub fn number(&self) -> String {
        self.0.number.to_string()
    }

    /// ID of the `Order` being picked up.
    #[must_use]
    pub fn order_id(&self) -> order::Id {
        self.0.order_id.into()
    }

    /// ID of the customer picking up the `Order`.
    #[must_use]
    pub fn customer_id(&self) -> user::Id {
        self.0.customer_id.into()
    }

    /// ID of the vendor handing over the `Order`.
    #[must_use]
    pub fn vendor_id(&self) -> user::Id {
        self.0.vendor_id.into()
    }

    /// Handed over items.
    #[must_use]
    pub fn items(&self) -> Vec<Item> {
        self.0.items.iter().copied().map(Into::into).collect()
    }

    /// Status of this `Pickup`.
    #[must_use]
    pub fn status(&self) -> Status {
        self.0.status.into()
    }

    /// `DateTime` this `Pickup` is scheduled at.
    #[must_use]
    pub fn scheduled_date(&self) -> DateTime {
        self.0.scheduled_at.coerce()
    }

    /// `DateTime` when the items were actually picked up.
    #[must_use]
    pub fn actual_pickup_date(&self) -> Option<DateTime> {
        self.0.picked_up_at.map(|d| d.coerce())
    }

    /// Instructions for the customer.
    #[must_use]
    pub fn instructions(&self) -> Option<rental::Notes> {
        self.0.instructions.clone().map(Into::into)
    }

    /// `DateTime` when this `Pickup` was created.
    #[must_use]
    pub fn created_at(&self) -> DateTime {
        self.0.created_at.coerce()
    }
}

/// Unique identifier of a `Pickup`.
#[derive(Clone, Copy, Debug, Display, Into, From, GraphQLScalar)]
#[from(pickup::Id)]
#[into(pickup::Id)]
#[graphql(name = "PickupId", transparent)]
pub struct Id(Uuid);

/// Handed over product of a `Pickup`.
#[derive(Clone, Copy, Debug, From)]
pub struct Item(pickup::Item);

/// Handed over product of a `Pickup`.
#[graphql_object(name = "PickupItem", context = Context)]
impl Item {
    /// ID of the handed over product.
    #[must_use]
    pub fn product_id(&self) -> product::Id {
        self.0.product_id.into()
    }

    /// Number of handed over units.
    #[must_use]
    pub fn quantity(&self) -> i32 {
        rental::int(self.0.quantity.get())
    }

    /// Condition of the product at the hand-over.
    #[must_use]
    pub fn condition(&self) -> Condition {
        self.0.condition.into()
    }
}

/// Condition of a product handed over by a `Pickup`.
#[derive(Clone, Copy, Debug, GraphQLEnum)]
#[graphql(name = "PickupItemCondition")]
pub enum Condition {
    /// Like new.
    Excellent,

    /// Regular wear.
    Good,

    /// Noticeable wear.
    Fair,

    /// Damaged.
    Damaged,
}

impl From<pickup::Condition> for Condition {
    fn from(condition: pickup::Condition) -> Self {
        use pickup::Condition as C;
        match condition {
            C::Excellent => Self::Excellent,
            C::Good => Self::Good,
            C::Fair => Self::Fair,
            C::Damaged => Self::Damaged,
        }
    }
}

/// Status of a `Pickup`.
#[derive(Clone, Copy, Debug, GraphQLEnum)]
#[graphql(name = "PickupStatus")]
pub enum Status {
    /// Waiting for the customer.
    Scheduled,

    /// Items are handed over.
    Completed,

    /// Not going to happen.
    Cancelled,
}

impl From<pickup::Status> for Status {
    fn from(status: pickup::Status) -> Self {
        use pickup::Status as S;
        match status {
            S::Scheduled => Self::Scheduled,
            S::Completed => Self::Completed,
            S::Cancelled => Self::Cancelled,
        }
    }
}

define_error! {
    enum PickupError {
        #[code = "PICKUP_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Pickup` with the provided ID does not exist"]
        NotExists,

        #[code = "PICKUP_FORBIDDEN"]
        #[status = FORBIDDEN]
        #[message = "Authenticated user is not permitted to act on the \
                     `Pickup`"]
        NotPermitted,
    }
}
