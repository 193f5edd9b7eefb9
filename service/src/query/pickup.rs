//! [`Query`] collection related to [`Pickup`]s.

use common::operations::By;

use crate::domain::{access::Scope, pickup, Pickup};
#[cfg(doc)]
use crate::{domain::user::Actor, Query};

use super::{DatabaseQuery, VisibleQuery};

/// Queries a [`Pickup`] by its [`pickup::Id`] for an [`Actor`].
pub type ById = VisibleQuery<Pickup, pickup::Id>;

/// Queries a list of [`Pickup`]s within a [`Scope`], newest first.
pub type List = DatabaseQuery<By<Vec<Pickup>, Scope>>;
