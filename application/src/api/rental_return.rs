//! [`Return`]-related definitions.

use common::{DateTime, Money};
use derive_more::{Display, From, Into};
use juniper::{graphql_object, GraphQLEnum, GraphQLInputObject, GraphQLScalar};
use service::domain::{self, rental_return};
use uuid::Uuid;

use crate::{
    api::{order, product, rental, user},
    define_error, Context,
};

/// A return of rented `Order` items back to the vendor.
#[derive(Clone, Debug, From, Into)]
pub struct Return(domain::Return);

/// A return of rented `Order` items back to the vendor.
#[graphql_object(context = Context)]
impl Return {
    /// Unique identifier of this `Return`.
    #[must_use]
    pub fn id(&self) -> Id {
        self.0.id.into()
    }

    /// Human-readable number of this `Return`.
    #[must_use]
    pub fn number(&self) -> String {
        self.0.number.to_string()
    }

    /// ID of the `Order` being returned.
    #[must_use]
    pub fn order_id(&self) -> order::Id {
        self.0.order_id.into()
    }

    /// ID of the customer returning the `Order`.
    #[must_use]
    pub fn customer_id(&self) -> user::Id {
        self.0.customer_id.into()
    }

    /// ID of the vendor accepting the `Order` back.
    #[must_use]
    pub fn vendor_id(&self) -> user::Id {
        self.0.vendor_id.into()
    }

    /// Returned items.
    #[must_use]
    pub fn items(&self) -> Vec<Item> {
        self.0.items.iter().cloned().map(Into::into).collect()
    }

    /// `DateTime` the items were expected back at.
    #[must_use]
    pub fn expected_return_date(&self) -> DateTime {
        self.0.expected_at.coerce()
    }

    /// `DateTime` when the items were actually returned.
    #[must_use]
    pub fn actual_return_date(&self) -> DateTime {
        self.0.returned_at.coerce()
    }

    /// Indicator whether the items were returned late.
    #[must_use]
    pub fn is_late(&self) -> bool {
        self.0.is_late()
    }

    /// Number of started days the items were returned late for.
    #[must_use]
    pub fn late_days(&self) -> i32 {
        rental::int(self.0.late_days)
    }

    /// Fee charged for returning the items late.
    #[must_use]
    pub fn late_return_fee(&self) -> Money {
        self.0.late_return_fee
    }

    /// Fee charged for all the damaged items.
    #[must_use]
    pub fn total_damage_fee(&self) -> Money {
        self.0.total_damage_fee
    }

    /// Status of this `Return`.
    #[must_use]
    pub fn status(&self) -> Status {
        self.0.status.into()
    }

    /// `DateTime` when the inspection of the items was completed.
    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime> {
        self.0.completed_at.map(|d| d.coerce())
    }

    /// `DateTime` when this `Return` was created.
    #[must_use]
    pub fn created_at(&self) -> DateTime {
        self.0.created_at.coerce()
    }
}

/// Unique identifier of a `Return`.
#[derive(Clone, Copy, Debug, Display, Into, From, GraphQLScalar)]
#[from(rental_return::Id)]
#[into(rental_return::Id)]
#[graphql(name = "ReturnId", transparent)]
pub struct Id(Uuid);

/// Returned product of a `Return`.
#[derive(Clone, Debug, From)]
pub struct Item(rental_return::Item);

/// Returned product of a `Return`.
#[graphql_object(name = "ReturnItem", context = Context)]
impl Item {
    /// ID of the returned product.
    #[must_use]
    pub fn product_id(&self) -> product::Id {
        self.0.product_id.into()
    }

    /// Number of returned units.
    #[must_use]
    pub fn quantity(&self) -> i32 {
        rental::int(self.0.quantity.get())
    }

    /// Condition of the product on return.
    #[must_use]
    pub fn condition_on_return(&self) -> Condition {
        self.0.condition.into()
    }

    /// Fee charged for a damage of the product.
    #[must_use]
    pub fn damage_fee(&self) -> Money {
        self.0.damage_fee
    }

    /// Description of the damage.
    #[must_use]
    pub fn damage_notes(&self) -> Option<rental::Notes> {
        self.0.damage_notes.clone().map(Into::into)
    }
}

/// Returned product of a `Return`, as inspected by the vendor.
#[derive(Clone, Debug, GraphQLInputObject)]
#[graphql(name = "ReturnItemInput")]
pub struct ItemInput {
    /// ID of the returned product.
    pub product_id: product::Id,

    /// Number of returned units.
    pub quantity: i32,

    /// Condition of the product on return.
    pub condition_on_return: Condition,

    /// Fee charged for a damage of the product, zero if omitted.
    pub damage_fee: Option<Money>,

    /// Description of the damage.
    pub damage_notes: Option<rental::Notes>,
}

impl ItemInput {
    /// Converts this [`ItemInput`] into a [`rental_return::Item`], using the
    /// provided zero [`Money`] for an omitted damage fee.
    ///
    /// # Errors
    ///
    /// Errors if the quantity is not positive.
    pub fn into_item(
        self,
        zero: Money,
    ) -> Result<rental_return::Item, rental::InputError> {
        let Self {
            product_id,
            quantity,
            condition_on_return,
            damage_fee,
            damage_notes,
        } = self;

        Ok(rental_return::Item {
            product_id: product_id.into(),
            quantity: rental::quantity(quantity)?,
            condition: condition_on_return.into(),
            damage_fee: damage_fee.unwrap_or(zero),
            damage_notes: damage_notes.map(Into::into),
        })
    }
}

/// Condition of a product on a `Return`.
#[derive(Clone, Copy, Debug, GraphQLEnum)]
#[graphql(name = "ReturnItemCondition")]
pub enum Condition {
    /// Like new.
    Excellent,

    /// Regular wear.
    Good,

    /// Noticeable wear.
    Fair,

    /// Damaged.
    Damaged,

    /// Not returned at all.
    Lost,
}

impl From<rental_return::Condition> for Condition {
    fn from(condition: rental_return::Condition) -> Self {
        use rental_return::Condition as C;
        match condition {
            C::Excellent => Self::Excellent,
            C::Good => Self::Good,
            C::Fair => Self::Fair,
            C::Damaged => Self::Damaged,
            C::Lost => Self::Lost,
        }
    }
}

impl From<Condition> for rental_return::Condition {
    fn from(condition: Condition) -> Self {
        match condition {
            Condition::Excellent => Self::Excellent,
            Condition::Good => Self::Good,
            Condition::Fair => Self::Fair,
            Condition::Damaged => Self::Damaged,
            Condition::Lost => Self::Lost,
        }
    }
}

/// Status of a `Return`.
#[derive(Clone, Copy, Debug, GraphQLEnum)]
#[graphql(name = "ReturnStatus")]
pub enum Status {
    /// Waiting for the customer.
    Scheduled,

    /// Items are being inspected.
    Processing,

    /// Items are accepted back.
    Completed,
}

impl From<rental_return::Status> for Status {
    fn from(status: rental_return::Status) -> Self {
        use rental_return::Status as S;
        match status {
            S::Scheduled => Self::Scheduled,
            S::Processing => Self::Processing,
            S::Completed => Self::Completed,
        }
    }
}

define_error! {
    enum ReturnError {
        #[code = "RETURN_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Return` with the provided ID does not exist"]
        NotExists,

        #[code = "RETURN_FORBIDDEN"]
        #[status = FORBIDDEN]
        #[message = "Authenticated user is not permitted to act on the \
                     `Return`"]
        NotPermitted,
    }
}
