//! User identity definitions.

use common::DateTime;
use derive_more::{Display, From, Into};
use juniper::{graphql_object, GraphQLEnum, GraphQLScalar};
use service::domain;
use uuid::Uuid;

use crate::{Context, Session};

/// Unique identifier of a user.
#[derive(Clone, Copy, Debug, Display, Into, From, GraphQLScalar)]
#[from(domain::user::Id)]
#[into(domain::user::Id)]
#[graphql(name = "UserId", transparent)]
pub struct Id(Uuid);

/// Role of a user on the marketplace.
#[derive(Clone, Copy, Debug, GraphQLEnum)]
#[graphql(name = "UserRole")]
pub enum Role {
    /// Rents products.
    Customer,

    /// Owns products and fulfills orders for them.
    Vendor,

    /// Manages the whole marketplace.
    Admin,
}

impl From<domain::user::Role> for Role {
    fn from(role: domain::user::Role) -> Self {
        use domain::user::Role as R;
        match role {
            R::Customer => Self::Customer,
            R::Vendor => Self::Vendor,
            R::Admin => Self::Admin,
        }
    }
}

/// User authenticated by the current request.
#[derive(Clone, Debug, From)]
pub struct Viewer(Session);

/// User authenticated by the current request.
#[graphql_object(context = Context)]
impl Viewer {
    /// Unique identifier of this `Viewer`.
    #[must_use]
    pub fn id(&self) -> Id {
        self.0.actor.id.into()
    }

    /// Role this `Viewer` acts in.
    #[must_use]
    pub fn role(&self) -> Role {
        self.0.actor.role.into()
    }

    /// `DateTime` when the session of this `Viewer` expires.
    #[must_use]
    pub fn session_expires_at(&self) -> DateTime {
        self.0.expires_at
    }
}
