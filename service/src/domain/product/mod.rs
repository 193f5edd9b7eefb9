//! [`Product`] definitions.

mod availability;
mod pricing;

use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    order,
    rental::{Period, Quantity},
    user,
};
#[cfg(doc)]
use crate::domain::Order;

pub use self::{availability::Availability, pricing::Pricing};

/// Rentable product of the catalog.
///
/// Master data of a [`Product`] is owned by the catalog, only its
/// [`Reservation`]s are managed here.
#[derive(Clone, Debug)]
pub struct Product {
    /// ID of this [`Product`].
    pub id: Id,

    /// [`Name`] of this [`Product`].
    pub name: Name,

    /// ID of the vendor owning this [`Product`].
    pub vendor_id: user::Id,

    /// Total number of units of this [`Product`] in the fleet.
    pub quantity_on_hand: u32,

    /// [`Pricing`] of this [`Product`].
    pub pricing: Pricing,

    /// [`Reservation`]s of this [`Product`].
    pub reservations: Vec<Reservation>,
}

/// ID of a [`Product`].
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
    Ord,
    PartialEq,
    PartialOrd,
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

/// Name of a [`Product`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Name(String);

impl Name {
    /// Creates a new [`Name`].
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `name` is not empty.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Creates a new [`Name`] if the given `name` is valid.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Option<Self> {
        let name = name.into();
        Self::check(&name).then_some(Self(name))
    }

    /// Checks whether the given `name` is a valid [`Name`].
    fn check(name: impl AsRef<str>) -> bool {
        let name = name.as_ref();
        name.trim() == name && !name.is_empty() && name.len() <= 512
    }
}

impl FromStr for Name {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Name`")
    }
}

/// [`Quantity`] of a [`Product`] committed to an [`Order`] for a [`Period`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Reservation {
    /// ID of the reserved [`Product`].
    pub product_id: Id,

    /// ID of the [`Order`] holding this [`Reservation`].
    pub order_id: order::Id,

    /// Reserved [`Quantity`].
    pub quantity: Quantity,

    /// Reserved [`Period`].
    pub period: Period,
}
