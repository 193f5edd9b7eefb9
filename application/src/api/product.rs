//! Product-related definitions.

use derive_more::{Display, From, Into};
use juniper::{graphql_object, GraphQLScalar};
use service::domain::product;
use uuid::Uuid;

use crate::{api::rental, Context};

/// Unique identifier of a product.
#[derive(Clone, Copy, Debug, Display, Into, From, GraphQLScalar)]
#[from(product::Id)]
#[into(product::Id)]
#[graphql(name = "ProductId", transparent)]
pub struct Id(Uuid);

/// Availability of a product for a rental period.
#[derive(Clone, Copy, Debug, From)]
pub struct Availability(product::Availability);

/// Availability of a product for a rental period.
#[graphql_object(name = "ProductAvailability", context = Context)]
impl Availability {
    /// Indicator whether the requested quantity can be reserved.
    #[must_use]
    pub fn available(&self) -> bool {
        self.0.is_available
    }

    /// Number of units not reserved for the requested period.
    #[must_use]
    pub fn free_quantity(&self) -> i32 {
        rental::int(self.0.free_quantity)
    }
}
