//! User identity definitions.
//!
//! Users are owned by an external identity service, so only their identity
//! and [`Role`] are known here.

pub mod session;

use derive_more::{Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use strum::EnumString;
use uuid::Uuid;

pub use self::session::Session;

/// ID of a user.
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

/// Role of a user on the marketplace.
#[derive(
    Clone,
    Copy,
    Debug,
    Deserialize,
    EnumString,
    Eq,
    Hash,
    PartialEq,
    Serialize,
    strum::Display,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Rents products.
    Customer,

    /// Owns products and fulfills orders for them.
    Vendor,

    /// Manages the whole marketplace.
    Admin,
}

/// User acting upon the marketplace.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Actor {
    /// ID of the acting user.
    pub id: Id,

    /// [`Role`] the user acts in.
    pub role: Role,
}

impl Actor {
    /// Indicates whether this [`Actor`] is an administrator.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Indicates whether this [`Actor`] is the provided customer.
    #[must_use]
    pub fn is_customer(&self, customer_id: Id) -> bool {
        self.role == Role::Customer && self.id == customer_id
    }

    /// Indicates whether this [`Actor`] is the provided customer or an
    /// administrator.
    #[must_use]
    pub fn is_customer_or_admin(&self, customer_id: Id) -> bool {
        self.is_admin() || self.is_customer(customer_id)
    }

    /// Indicates whether this [`Actor`] is the provided vendor or an
    /// administrator.
    #[must_use]
    pub fn is_vendor_or_admin(&self, vendor_id: Id) -> bool {
        self.is_admin() || (self.role == Role::Vendor && self.id == vendor_id)
    }

    /// Indicates whether this [`Actor`] participates in a deal between the
    /// provided customer and vendor, or is an administrator.
    #[must_use]
    pub fn participates(&self, customer_id: Id, vendor_id: Id) -> bool {
        self.is_customer_or_admin(customer_id)
            || self.is_vendor_or_admin(vendor_id)
    }
}

impl From<Session> for Actor {
    fn from(session: Session) -> Self {
        Self {
            id: session.user_id,
            role: session.role,
        }
    }
}

#[cfg(test)]
mod spec {
    use super::{Actor, Id, Role};

    #[test]
    fn checks_participation() {
        let (customer, vendor) = (Id::new(), Id::new());

        let as_customer = Actor {
            id: customer,
            role: Role::Customer,
        };
        assert!(as_customer.participates(customer, vendor));
        assert!(!as_customer.is_vendor_or_admin(vendor));

        let as_vendor = Actor {
            id: vendor,
            role: Role::Vendor,
        };
        assert!(as_vendor.participates(customer, vendor));
        assert!(!as_vendor.is_customer_or_admin(customer));

        let stranger = Actor {
            id: Id::new(),
            role: Role::Customer,
        };
        assert!(!stranger.participates(customer, vendor));

        let admin = Actor {
            id: Id::new(),
            role: Role::Admin,
        };
        assert!(admin.participates(customer, vendor));
        assert!(!admin.is_customer(customer));
    }

    #[test]
    fn vendor_cannot_act_as_customer_with_same_id() {
        let id = Id::new();
        let actor = Actor {
            id,
            role: Role::Vendor,
        };
        assert!(!actor.is_customer_or_admin(id));
    }
}
