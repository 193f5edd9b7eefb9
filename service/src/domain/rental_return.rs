//! [`Return`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{define_kind, unit, DateTimeOf, Money};
use derive_more::{Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    access::{Scope, Visible},
    fsm::Transition,
    order, product,
    rental::{self, Notes, Quantity},
    sequence,
    user,
};
#[cfg(doc)]
use crate::domain::{Order, Product};

/// Return of rented [`Order`] items back to the vendor.
#[derive(Clone, Debug)]
pub struct Return {
    /// ID of this [`Return`].
    pub id: Id,

    /// Human-readable number of this [`Return`].
    pub number: sequence::Number,

    /// ID of the returned [`Order`].
    pub order_id: order::Id,

    /// ID of the customer returning the [`Order`].
    pub customer_id: user::Id,

    /// ID of the vendor receiving the [`Order`].
    pub vendor_id: user::Id,

    /// Returned [`Item`]s.
    pub items: Vec<Item>,

    /// [`DateTime`] the [`Item`]s were expected to be returned at.
    pub expected_at: ExpectationDateTime,

    /// [`DateTime`] when the [`Item`]s were returned.
    pub returned_at: ReturnDateTime,

    /// Number of started days the [`Item`]s were returned late.
    pub late_days: u32,

    /// Fee charged for the late return.
    pub late_return_fee: Money,

    /// Sum of damage fees of all the [`Item`]s.
    pub total_damage_fee: Money,

    /// [`Status`] of this [`Return`].
    pub status: Status,

    /// [`DateTime`] when this [`Return`] was completed.
    pub completed_at: Option<CompletionDateTime>,

    /// [`DateTime`] when this [`Return`] was created.
    pub created_at: CreationDateTime,
}

impl Return {
    /// Indicates whether the [`Item`]s were returned late.
    #[must_use]
    pub fn is_late(&self) -> bool {
        self.late_days > 0
    }
}

impl Visible for Return {
    fn is_in(&self, scope: Scope) -> bool {
        scope.covers(self.customer_id, self.vendor_id)
    }
}

/// Returns the number of started days between the `expected` and the actual
/// `returned` [`DateTime`]s.
///
/// Returns in time are never late.
#[must_use]
pub fn late_days(expected: ExpectationDateTime, returned: ReturnDateTime) -> u32 {
    returned
        .elapsed_since(expected)
        .map_or(0, rental::started_days)
}

/// ID of a [`Return`].
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

/// Returned [`Product`] of a [`Return`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Item {
    /// ID of the returned [`Product`].
    pub product_id: product::Id,

    /// Returned [`Quantity`].
    pub quantity: Quantity,

    /// [`Condition`] of the [`Product`] on return.
    pub condition: Condition,

    /// Fee charged for a damage of the [`Product`].
    pub damage_fee: Money,

    /// Description of the damage.
    pub damage_notes: Option<Notes>,
}

define_kind! {
    #[doc = "Condition of a [`Product`] on a [`Return`]."]
    enum Condition {
        #[doc = "Like new."]
        Excellent = 1,

        #[doc = "Regular wear."]
        Good = 2,

        #[doc = "Noticeable wear."]
        Fair = 3,

        #[doc = "Damaged."]
        Damaged = 4,

        #[doc = "Not returned at all."]
        Lost = 5,
    }
}

define_kind! {
    #[doc = "Status of a [`Return`]."]
    enum Status {
        #[doc = "Waiting for the customer."]
        Scheduled = 1,

        #[doc = "Items are being inspected."]
        Processing = 2,

        #[doc = "Items are accepted back."]
        Completed = 3,
    }
}

impl Transition for Status {
    fn allows(self, next: Self) -> bool {
        use Status as S;

        matches!(
            (self, next),
            (S::Scheduled, S::Processing | S::Completed)
                | (S::Processing, S::Completed),
        )
    }
}

/// [`DateTime`] when a [`Return`] was created.
pub type CreationDateTime = DateTimeOf<(Return, unit::Creation)>;

/// [`DateTime`] the [`Item`]s of a [`Return`] were expected at.
pub type ExpectationDateTime = DateTimeOf<(Return, unit::Expiration)>;

/// [`DateTime`] when the [`Item`]s of a [`Return`] were returned.
pub type ReturnDateTime = DateTimeOf<(Return, unit::End)>;

/// [`DateTime`] when a [`Return`] was completed.
pub type CompletionDateTime = DateTimeOf<(Return, unit::Completion)>;

#[cfg(test)]
mod spec {
    use common::DateTime;

    use crate::domain::fsm::Transition as _;

    use super::{late_days, Status};

    fn at(s: &str) -> DateTime {
        DateTime::from_rfc3339(s).unwrap()
    }

    #[test]
    fn counts_started_late_days() {
        let expected = at("2024-01-10T00:00:00Z").coerce();

        assert_eq!(late_days(expected, at("2024-01-13T00:00:00Z").coerce()), 3);
        assert_eq!(late_days(expected, at("2024-01-10T00:00:01Z").coerce()), 1);
        assert_eq!(late_days(expected, at("2024-01-10T00:00:00Z").coerce()), 0);
        assert_eq!(late_days(expected, at("2024-01-09T00:00:00Z").coerce()), 0);
    }

    #[test]
    fn follows_transition_table() {
        assert!(Status::Scheduled.allows(Status::Processing));
        assert!(Status::Scheduled.allows(Status::Completed));
        assert!(Status::Processing.allows(Status::Completed));
        assert!(!Status::Completed.allows(Status::Processing));
        assert!(!Status::Processing.allows(Status::Scheduled));
    }
}
