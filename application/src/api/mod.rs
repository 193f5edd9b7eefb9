//! GraphQL API definitions.

pub mod invoice;
mod mutation;
pub mod order;
pub mod pickup;
pub mod product;
mod query;
pub mod quotation;
pub mod rental;
pub mod rental_return;
pub mod scalar;
mod subscription;
pub mod user;

use std::fmt;

use service::query::VisibleQueryError;
use tracerr::Traced;

use crate::Error;

pub use self::{
    invoice::Invoice, mutation::Mutation, order::Order, pickup::Pickup,
    query::Query, quotation::Quotation, rental_return::Return,
    subscription::Subscription, user::Viewer,
};

/// GraphQL schema.
pub type Schema = juniper::RootNode<'static, Query, Mutation, Subscription>;

/// Converts the provided [`VisibleQueryError`] into an [`Error`] of the
/// queried entity.
pub(crate) fn visibility_error<B: fmt::Display>(
    e: Traced<VisibleQueryError<B>>,
    not_exists: impl Into<Error>,
    not_permitted: impl Into<Error>,
) -> Error {
    let mut error = match e.as_ref() {
        VisibleQueryError::Db(_) => return Error::internal(&e),
        VisibleQueryError::NotExists(_) => not_exists.into(),
        VisibleQueryError::NotPermitted(_) => not_permitted.into(),
    };
    error.backtrace = Some(e.trace().clone());
    error
}

#[cfg(test)]
mod spec {
    use service::query::VisibleQueryError;

    use crate::api::order::OrderError;

    use super::visibility_error;

    #[test]
    fn maps_visibility_to_entity_errors() {
        let err = visibility_error(
            tracerr::new!(VisibleQueryError::NotExists("ORD000001")),
            OrderError::NotExists,
            OrderError::NotPermitted,
        );
        assert_eq!(err.code, "ORDER_NOT_EXISTS");
        assert_eq!(err.status_code, http::StatusCode::NOT_FOUND);
        assert!(err.backtrace.is_some());

        let err = visibility_error(
            tracerr::new!(VisibleQueryError::NotPermitted("ORD000001")),
            OrderError::NotExists,
            OrderError::NotPermitted,
        );
        assert_eq!(err.code, "ORDER_FORBIDDEN");
        assert_eq!(err.status_code, http::StatusCode::FORBIDDEN);
    }
}
