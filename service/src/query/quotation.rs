//! [`Query`] collection related to [`Quotation`]s.

use common::operations::By;

use crate::domain::{access::Scope, quotation, Quotation};
#[cfg(doc)]
use crate::{domain::user::Actor, Query};

use super::{DatabaseQuery, VisibleQuery};

/// Queries a [`Quotation`] by its [`quotation::Id`] for an [`Actor`].
pub type ById = VisibleQuery<Quotation, quotation::Id>;

/// Queries a list of [`Quotation`]s within a [`Scope`], newest first.
pub type List = DatabaseQuery<By<Vec<Quotation>, Scope>>;
