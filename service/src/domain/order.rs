//! [`Order`] definitions.

use std::collections::HashMap;

use common::{define_kind, unit, DateTime, DateTimeOf, Money, Percent};
use derive_more::{AsRef, Deref, DerefMut, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    access::{Scope, Visible},
    fsm::Transition,
    product, quotation,
    rental::{self, Notes, Totals},
    sequence,
    user,
    Product,
};
#[cfg(doc)]
use crate::domain::{product::Reservation, Quotation};

/// Rental order placed from a confirmed [`Quotation`].
#[derive(Clone, Debug)]
pub struct Order {
    /// ID of this [`Order`].
    pub id: Id,

    /// Human-readable number of this [`Order`].
    pub number: sequence::Number,

    /// ID of the [`Quotation`] this [`Order`] was placed from.
    pub quotation_id: Option<quotation::Id>,

    /// ID of the customer who placed this [`Order`].
    pub customer_id: user::Id,

    /// ID of the vendor fulfilling this [`Order`].
    pub vendor_id: user::Id,

    /// [`Item`]s of this [`Order`].
    pub items: Vec<Item>,

    /// [`Totals`] copied from the [`Quotation`].
    pub totals: Totals,

    /// Refundable deposit held for this [`Order`].
    pub security_deposit: Money,

    /// [`Status`] of this [`Order`].
    pub status: Status,

    /// [`PaymentStatus`] of this [`Order`], driven by its invoice.
    pub payment_status: PaymentStatus,

    /// [`ShippingAddress`] of this [`Order`].
    pub shipping_address: Option<ShippingAddress>,

    /// [`Notes`] of this [`Order`].
    pub notes: Option<Notes>,

    /// [`DateTime`] when the [`Item`]s were picked up.
    pub pickup_date: Option<PickupDateTime>,

    /// [`DateTime`] when the [`Item`]s are expected to be returned.
    pub return_date: Option<ReturnDateTime>,

    /// [`DateTime`] when the [`Item`]s were actually returned.
    pub actual_return_date: Option<ActualReturnDateTime>,

    /// Fee charged for returning the [`Item`]s late.
    pub late_return_fee: Money,

    /// [`DateTime`] when this [`Order`] was created.
    pub created_at: CreationDateTime,

    /// [`DateTime`] when this [`Order`] was updated last time.
    pub updated_at: UpdateDateTime,
}

impl Order {
    /// Returns the [`DateTime`] the [`Item`]s are expected to be returned at,
    /// being the end of the first [`Item`]'s rental period.
    #[must_use]
    pub fn expected_return(&self) -> Option<rental::EndDateTime> {
        self.items.first().map(|i| i.period.end())
    }

    /// Marks all the [`Item`]s of this [`Order`] as picked up by the customer.
    pub fn hand_over(&mut self, at: DateTime) {
        _ = self.pickup_date.replace(at.coerce());
        for item in &mut self.items {
            item.status = ItemStatus::WithCustomer;
        }
    }

    /// Computes the fee of returning all the [`Item`]s of this [`Order`]
    /// `late_days` later than expected.
    ///
    /// [`Item`]s of unknown [`Product`]s are not charged.
    #[must_use]
    pub fn late_return_fee(
        &self,
        products: &HashMap<product::Id, Product>,
        rate: Percent,
        late_days: u32,
    ) -> Money {
        let currency = self.totals.total_amount.currency;
        Money::sum(
            currency,
            self.items.iter().filter_map(|i| {
                products.get(&i.product_id).map(|p| {
                    p.pricing.late_fee(rate, late_days, i.quantity)
                })
            }),
        )
        .unwrap_or(Money::zero(currency))
        .round()
    }
}

impl Visible for Order {
    fn is_in(&self, scope: Scope) -> bool {
        scope.covers(self.customer_id, self.vendor_id)
    }
}

/// ID of an [`Order`].
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

/// Rental line of an [`Order`].
#[derive(Clone, Debug, Deref, DerefMut, Eq, PartialEq)]
pub struct Item {
    /// Priced rental line copied from the [`Quotation`].
    #[deref]
    #[deref_mut]
    pub line: rental::Item,

    /// [`ItemStatus`] of this [`Item`].
    pub status: ItemStatus,
}

define_kind! {
    #[doc = "Status of an [`Order`]."]
    enum Status {
        #[doc = "Being prepared."]
        Draft = 1,

        #[doc = "Accepted, with [`Reservation`]s made."]
        Confirmed = 2,

        #[doc = "Being prepared for a pickup."]
        Processing = 3,

        #[doc = "Picked up by the customer."]
        PickedUp = 4,

        #[doc = "In use by the customer."]
        Active = 5,

        #[doc = "Returned by the customer."]
        Completed = 6,

        #[doc = "Cancelled, with [`Reservation`]s released."]
        Cancelled = 7,
    }
}

impl Status {
    /// Indicates whether the rented [`Item`]s are with the customer.
    #[must_use]
    pub const fn is_in_progress(self) -> bool {
        matches!(self, Self::PickedUp | Self::Active)
    }

    /// Indicates whether this [`Status`] is final.
    #[must_use]
    pub const fn is_closed(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Indicates whether an [`Order`] may be directly set to this [`Status`].
    ///
    /// Cancellation and completion have their own operations.
    #[must_use]
    pub const fn is_settable(self) -> bool {
        matches!(
            self,
            Self::Confirmed | Self::Processing | Self::PickedUp | Self::Active,
        )
    }
}

impl Transition for Status {
    fn allows(self, next: Self) -> bool {
        use Status as S;

        match self {
            S::Draft => matches!(next, S::Confirmed | S::Cancelled),
            S::Confirmed => {
                matches!(next, S::Processing | S::PickedUp | S::Cancelled)
            }
            S::Processing => matches!(next, S::PickedUp | S::Cancelled),
            S::PickedUp => matches!(next, S::Active | S::Completed),
            S::Active => matches!(next, S::Completed),
            S::Completed | S::Cancelled => false,
        }
    }
}

define_kind! {
    #[doc = "Status of an [`Order`] [`Item`]."]
    enum ItemStatus {
        #[doc = "Waiting for a pickup."]
        Pending = 1,

        #[doc = "Picked up from the vendor."]
        PickedUp = 2,

        #[doc = "In use by the customer."]
        WithCustomer = 3,

        #[doc = "Returned to the vendor."]
        Returned = 4,

        #[doc = "Not returned in time."]
        Late = 5,
    }
}

define_kind! {
    #[doc = "Payment status of an [`Order`]."]
    enum PaymentStatus {
        #[doc = "Nothing is paid yet."]
        Pending = 1,

        #[doc = "Paid partially."]
        Partial = 2,

        #[doc = "Paid in full."]
        Paid = 3,
    }
}

/// Address an [`Order`] is shipped to.
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct ShippingAddress(String);

impl ShippingAddress {
    /// Creates a new [`ShippingAddress`] if the given `address` is valid.
    #[must_use]
    pub fn new(address: impl Into<String>) -> Option<Self> {
        let address = address.into();
        Self::check(&address).then_some(Self(address))
    }

    /// Checks whether the given `address` is a valid [`ShippingAddress`].
    fn check(address: impl AsRef<str>) -> bool {
        let address = address.as_ref();
        address.trim() == address
            && !address.is_empty()
            && address.len() <= 1024
    }
}

impl FromStr for ShippingAddress {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `ShippingAddress`")
    }
}

/// [`DateTime`] when an [`Order`] was created.
pub type CreationDateTime = DateTimeOf<(Order, unit::Creation)>;

/// [`DateTime`] when an [`Order`] was updated.
pub type UpdateDateTime = DateTimeOf<(Order, unit::Update)>;

/// [`DateTime`] when [`Order`] [`Item`]s were picked up.
pub type PickupDateTime = DateTimeOf<(Order, unit::Start)>;

/// [`DateTime`] when [`Order`] [`Item`]s are expected to be returned.
pub type ReturnDateTime = DateTimeOf<(Order, unit::End)>;

/// [`DateTime`] when [`Order`] [`Item`]s were actually returned.
pub type ActualReturnDateTime = DateTimeOf<(Order, unit::Completion)>;

#[cfg(test)]
mod spec {
    use std::{collections::HashMap, str::FromStr as _};

    use common::{money::Currency, DateTime, Money, Percent};
    use rust_decimal::Decimal;

    use crate::domain::{
        fsm::Transition as _,
        product::{self, Pricing},
        rental::{self, Period, Quantity, Totals},
        sequence, user, Product,
    };

    use super::{Id, Item, ItemStatus, Order, PaymentStatus, Status};

    fn inr(amount: u32) -> Money {
        Money {
            amount: Decimal::from(amount),
            currency: Currency::Inr,
        }
    }

    fn product(daily: u32) -> Product {
        Product {
            id: product::Id::new(),
            name: product::Name::new("Crane").unwrap(),
            vendor_id: user::Id::new(),
            quantity_on_hand: 3,
            pricing: Pricing {
                currency: Currency::Inr,
                hourly: None,
                daily: Some(Decimal::from(daily)),
                weekly: None,
            },
            reservations: vec![],
        }
    }

    fn order(products: &[(&Product, u32)]) -> Order {
        let period = Period::new(
            DateTime::from_rfc3339("2024-01-01T00:00:00Z").unwrap().coerce(),
            DateTime::from_rfc3339("2024-01-10T00:00:00Z").unwrap().coerce(),
        )
        .unwrap();
        let now = DateTime::now();
        Order {
            id: Id::new(),
            number: sequence::Kind::Order.number(1),
            quotation_id: None,
            customer_id: user::Id::new(),
            vendor_id: products[0].0.vendor_id,
            items: products
                .iter()
                .map(|(p, q)| Item {
                    line: p.price(Quantity::new(*q).unwrap(), period),
                    status: ItemStatus::Pending,
                })
                .collect(),
            totals: Totals::compute(
                inr(0),
                Percent::from_str("18").unwrap(),
            ),
            security_deposit: inr(0),
            status: Status::Confirmed,
            payment_status: PaymentStatus::Pending,
            shipping_address: None,
            notes: None,
            pickup_date: None,
            return_date: None,
            actual_return_date: None,
            late_return_fee: inr(0),
            created_at: now.coerce(),
            updated_at: now.coerce(),
        }
    }

    #[test]
    fn charges_late_fee_for_every_item() {
        let (a, b) = (product(100), product(250));
        let o = order(&[(&a, 2), (&b, 1)]);
        let products = HashMap::from([(a.id, a.clone()), (b.id, b.clone())]);
        let ten = Percent::from_str("10").unwrap();

        assert_eq!(o.late_return_fee(&products, ten, 3), inr(135));
        assert!(o.late_return_fee(&products, ten, 0).is_zero());
        assert_eq!(
            o.late_return_fee(&HashMap::from([(a.id, a)]), ten, 3),
            inr(60),
        );
    }

    #[test]
    fn expects_return_at_first_item_end() {
        let o = order(&[(&product(100), 1)]);

        assert_eq!(
            o.expected_return().map(|at| at.to_rfc3339()),
            Some("2024-01-10T00:00:00Z".into()),
        );
    }

    #[test]
    fn hands_over_all_items() {
        let p = product(100);
        let mut o = order(&[(&p, 1), (&p, 2)]);
        let now = DateTime::now();

        o.hand_over(now);

        assert_eq!(o.pickup_date, Some(now.coerce()));
        assert!(o.items.iter().all(|i| i.status == ItemStatus::WithCustomer));
    }

    #[test]
    fn follows_transition_table() {
        use Status as S;

        assert!(S::Confirmed.allows(S::PickedUp));
        assert!(S::Processing.allows(S::Cancelled));
        assert!(S::PickedUp.allows(S::Completed));
        assert!(!S::PickedUp.allows(S::Cancelled));
        assert!(!S::Active.allows(S::Cancelled));
        assert!(!S::Completed.allows(S::Active));
        assert!(!S::Draft.allows(S::PickedUp));

        assert!(S::Active.is_in_progress());
        assert!(S::Cancelled.is_closed());
        assert!(!S::Cancelled.is_settable());
        assert!(!S::Completed.is_settable());
    }

    #[test]
    fn keeps_rental_line_accessible() {
        let p = product(100);
        let o = order(&[(&p, 2)]);
        let item: &rental::Item = &o.items[0];

        assert_eq!(item.product_id, p.id);
        assert_eq!(o.items[0].quantity.get(), 2);
    }
}
