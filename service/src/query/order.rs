//! [`Query`] collection related to [`Order`]s.

use common::operations::By;

use crate::domain::{access::Scope, order, Order};
#[cfg(doc)]
use crate::{domain::user::Actor, Query};

use super::{DatabaseQuery, VisibleQuery};

/// Queries an [`Order`] by its [`order::Id`] for an [`Actor`].
pub type ById = VisibleQuery<Order, order::Id>;

/// Queries a list of [`Order`]s within a [`Scope`], newest first.
pub type List = DatabaseQuery<By<Vec<Order>, Scope>>;
