//! Access rules of entities.

use crate::domain::user::{self, Actor, Role};

/// Part of the marketplace an [`Actor`] may see.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Scope {
    /// Everything.
    All,

    /// Deals of the customer with the provided ID.
    Customer(user::Id),

    /// Deals of the vendor with the provided ID.
    Vendor(user::Id),
}

impl Scope {
    /// Indicates whether this [`Scope`] covers a deal between the provided
    /// customer and vendor.
    #[must_use]
    pub fn covers(self, customer_id: user::Id, vendor_id: user::Id) -> bool {
        match self {
            Self::All => true,
            Self::Customer(id) => id == customer_id,
            Self::Vendor(id) => id == vendor_id,
        }
    }
}

impl From<&Actor> for Scope {
    fn from(actor: &Actor) -> Self {
        match actor.role {
            Role::Admin => Self::All,
            Role::Customer => Self::Customer(actor.id),
            Role::Vendor => Self::Vendor(actor.id),
        }
    }
}

/// Entity which may be seen only within some [`Scope`]s.
pub trait Visible {
    /// Indicates whether this entity lies within the provided [`Scope`].
    fn is_in(&self, scope: Scope) -> bool;

    /// Indicates whether the provided [`Actor`] may see this entity.
    fn is_visible_to(&self, actor: &Actor) -> bool {
        self.is_in(actor.into())
    }
}

#[cfg(test)]
mod spec {
    use crate::domain::user::{self, Actor, Role};

    use super::Scope;

    #[test]
    fn scopes_actors_by_role() {
        let id = user::Id::new();

        for (role, scope) in [
            (Role::Admin, Scope::All),
            (Role::Customer, Scope::Customer(id)),
            (Role::Vendor, Scope::Vendor(id)),
        ] {
            assert_eq!(Scope::from(&Actor { id, role }), scope);
        }
    }

    #[test]
    fn covers_only_own_deals() {
        let (customer, vendor) = (user::Id::new(), user::Id::new());

        assert!(Scope::All.covers(customer, vendor));
        assert!(Scope::Customer(customer).covers(customer, vendor));
        assert!(Scope::Vendor(vendor).covers(customer, vendor));
        assert!(!Scope::Customer(vendor).covers(customer, vendor));
        assert!(!Scope::Vendor(customer).covers(customer, vendor));
    }
}
