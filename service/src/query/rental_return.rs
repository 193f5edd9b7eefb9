//! [`Query`] collection related to [`Return`]s.

use common::operations::By;

use crate::domain::{access::Scope, rental_return, Return};
#[cfg(doc)]
use crate::{domain::user::Actor, Query};

use super::{DatabaseQuery, VisibleQuery};

/// Queries a [`Return`] by its [`rental_return::Id`] for an [`Actor`].
pub type ById = VisibleQuery<Return, rental_return::Id>;

/// Queries a list of [`Return`]s within a [`Scope`], newest first.
pub type List = DatabaseQuery<By<Vec<Return>, Scope>>;
