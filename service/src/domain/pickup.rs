//! [`Pickup`] definitions.

use common::{define_kind, unit, DateTimeOf};
#[cfg(doc)]
use common::DateTime;
use derive_more::{Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    access::{Scope, Visible},
    fsm::Transition,
    order, product,
    rental::{Notes, Quantity},
    sequence,
    user, Order,
};
#[cfg(doc)]
use crate::domain::Product;

/// Hand-over of [`Order`] items to the customer.
#[derive(Clone, Debug)]
pub struct Pickup {
    /// ID of this [`Pickup`].
    pub id: Id,

    /// Human-readable number of this [`Pickup`].
    pub number: sequence::Number,

    /// ID of the [`Order`] being picked up.
    pub order_id: order::Id,

    /// ID of the customer picking up the [`Order`].
    pub customer_id: user::Id,

    /// ID of the vendor handing over the [`Order`].
    pub vendor_id: user::Id,

    /// Handed over [`Item`]s.
    pub items: Vec<Item>,

    /// [`Status`] of this [`Pickup`].
    pub status: Status,

    /// [`DateTime`] this [`Pickup`] is scheduled at.
    pub scheduled_at: ScheduleDateTime,

    /// [`DateTime`] when the [`Item`]s were actually picked up.
    pub picked_up_at: Option<CompletionDateTime>,

    /// Instructions for the customer.
    pub instructions: Option<Notes>,

    /// [`DateTime`] when this [`Pickup`] was created.
    pub created_at: CreationDateTime,
}

impl Item {
    /// Lists all the items of the provided [`Order`] as handed over in the
    /// [`Condition::Good`].
    #[must_use]
    pub fn all_of(order: &Order) -> Vec<Self> {
        order
            .items
            .iter()
            .map(|i| Self {
                product_id: i.product_id,
                quantity: i.quantity,
                condition: Condition::Good,
            })
            .collect()
    }
}

impl Visible for Pickup {
    fn is_in(&self, scope: Scope) -> bool {
        scope.covers(self.customer_id, self.vendor_id)
    }
}

/// ID of a [`Pickup`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    PartialEq,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Handed over [`Product`] of a [`Pickup`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Item {
    /// ID of the handed over [`Product`].
    pub product_id: product::Id,

    /// Handed over [`Quantity`].
    pub quantity: Quantity,

    /// [`Condition`] of the [`Product`] at the hand-over.
    pub condition: Condition,
}

define_kind! {
    #[doc = "Condition of a [`Product`] handed over by a [`Pickup`]."]
    enum Condition {
        #[doc = "Like new."]
        Excellent = 1,

        #[doc = "Regular wear."]
        Good = 2,

        #[doc = "Noticeable wear."]
        Fair = 3,

        #[doc = "Damaged."]
        Damaged = 4,
    }
}

define_kind! {
    #[doc = "Status of a [`Pickup`]."]
    enum Status {
        #[doc = "Waiting for the customer."]
        Scheduled = 1,

        #[doc = "Items are handed over."]
        Completed = 2,

        #[doc = "Not going to happen."]
        Cancelled = 3,
    }
}

impl Transition for Status {
    fn allows(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Scheduled, Self::Completed | Self::Cancelled),
        )
    }
}

/// [`DateTime`] when a [`Pickup`] was created.
pub type CreationDateTime = DateTimeOf<(Pickup, unit::Creation)>;

/// [`DateTime`] a [`Pickup`] is scheduled at.
pub type ScheduleDateTime = DateTimeOf<(Pickup, unit::Start)>;

/// [`DateTime`] when a [`Pickup`] was completed.
pub type CompletionDateTime = DateTimeOf<(Pickup, unit::Completion)>;

#[cfg(test)]
mod spec {
    use crate::domain::fsm::Transition as _;

    use super::Status;

    #[test]
    fn completes_or_cancels_only_once() {
        assert!(Status::Scheduled.allows(Status::Completed));
        assert!(Status::Scheduled.allows(Status::Cancelled));
        assert!(!Status::Completed.allows(Status::Cancelled));
        assert!(!Status::Cancelled.allows(Status::Completed));
        assert!(!Status::Scheduled.allows(Status::Scheduled));
    }
}
