//! [`Quotation`]-related read definitions.

use common::DateTime;

#[cfg(doc)]
use crate::domain::Quotation;

/// Selector of [`Quotation`]s, still awaiting for a customer, whose validity
/// is over at the provided [`DateTime`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Outdated(pub DateTime);
