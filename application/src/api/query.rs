//! GraphQL [`Query`]s definitions.

use common::DateTime;
use juniper::graphql_object;
use service::{domain::access::Scope, query, Query as _};

use crate::{api, define_error, AsError, Context, Error};

/// Root of all GraphQL queries.
#[derive(Clone, Copy, Debug)]
pub struct Query;

impl Query {
    /// Name of the [`tracing::Span`] for the queries.
    pub(crate) const SPAN_NAME: &'static str = "GraphQL query";
}

#[graphql_object(context = Context)]
impl Query {
    /// Returns the currently authenticated user.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `AUTHORIZATION_REQUIRED` - the request is not authenticated.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "me",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn me(ctx: &Context) -> Result<api::Viewer, Error> {
        ctx.current_session().await.map(Into::into)
    }

    /// Returns the `Quotation` with the specified ID.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `QUOTATION_NOT_EXISTS` - the `Quotation` with the specified ID does
    ///                            not exist;
    /// - `QUOTATION_FORBIDDEN` - the current user takes no part in the
    ///                           `Quotation`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "quotation",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn quotation(
        id: api::quotation::Id,
        ctx: &Context,
    ) -> Result<api::Quotation, Error> {
        use api::quotation::QuotationError as E;

        let actor = ctx.current_actor().await?;
        ctx.service()
            .execute(query::quotation::ById::by(id.into(), actor))
            .await
            .map_err(|e| api::visibility_error(e, E::NotExists, E::NotPermitted))
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Lists all the `Quotation`s visible to the current user, newest first.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "quotations",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn quotations(
        ctx: &Context,
    ) -> Result<Vec<api::Quotation>, Error> {
        let actor = ctx.current_actor().await?;
        ctx.service()
            .execute(query::quotation::List::by(Scope::from(&actor)))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|list| list.into_iter().map(Into::into).collect())
    }

    /// Returns the `Order` with the specified ID.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `ORDER_NOT_EXISTS` - the `Order` with the specified ID does not
    ///                        exist;
    /// - `ORDER_FORBIDDEN` - the current user takes no part in the `Order`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "order",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn order(
        id: api::order::Id,
        ctx: &Context,
    ) -> Result<api::Order, Error> {
        use api::order::OrderError as E;

        let actor = ctx.current_actor().await?;
        ctx.service()
            .execute(query::order::ById::by(id.into(), actor))
            .await
            .map_err(|e| api::visibility_error(e, E::NotExists, E::NotPermitted))
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Lists all the `Order`s visible to the current user, newest first.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "orders",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn orders(ctx: &Context) -> Result<Vec<api::Order>, Error> {
        let actor = ctx.current_actor().await?;
        ctx.service()
            .execute(query::order::List::by(Scope::from(&actor)))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|list| list.into_iter().map(Into::into).collect())
    }

    /// Returns the `Pickup` with the specified ID.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `PICKUP_NOT_EXISTS` - the `Pickup` with the specified ID does not
    ///                         exist;
    /// - `PICKUP_FORBIDDEN` - the current user takes no part in the `Pickup`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "pickup",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn pickup(
        id: api::pickup::Id,
        ctx: &Context,
    ) -> Result<api::Pickup, Error> {
        use api::pickup::PickupError as E;

        let actor = ctx.current_actor().await?;
        ctx.service()
            .execute(query::pickup::ById::by(id.into(), actor))
            .await
            .map_err(|e| api::visibility_error(e, E::NotExists, E::NotPermitted))
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Lists all the `Pickup`s visible to the current user, newest first.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "pickups",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn pickups(ctx: &Context) -> Result<Vec<api::Pickup>, Error> {
        let actor = ctx.current_actor().await?;
        ctx.service()
            .execute(query::pickup::List::by(Scope::from(&actor)))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|list| list.into_iter().map(Into::into).collect())
    }

    /// Returns the `Return` with the specified ID.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `RETURN_NOT_EXISTS` - the `Return` with the specified ID does not
    ///                         exist;
    /// - `RETURN_FORBIDDEN` - the current user takes no part in the `Return`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "rentalReturn",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn rental_return(
        id: api::rental_return::Id,
        ctx: &Context,
    ) -> Result<api::Return, Error> {
        use api::rental_return::ReturnError as E;

        let actor = ctx.current_actor().await?;
        ctx.service()
            .execute(query::rental_return::ById::by(id.into(), actor))
            .await
            .map_err(|e| api::visibility_error(e, E::NotExists, E::NotPermitted))
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Lists all the `Return`s visible to the current user, newest first.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "rentalReturns",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn rental_returns(
        ctx: &Context,
    ) -> Result<Vec<api::Return>, Error> {
        let actor = ctx.current_actor().await?;
        ctx.service()
            .execute(query::rental_return::List::by(Scope::from(&actor)))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|list| list.into_iter().map(Into::into).collect())
    }

    /// Returns the `Invoice` with the specified ID.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `INVOICE_NOT_EXISTS` - the `Invoice` with the specified ID does not
    ///                          exist;
    /// - `INVOICE_FORBIDDEN` - the current user takes no part in the
    ///                         `Invoice`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "invoice",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn invoice(
        id: api::invoice::Id,
        ctx: &Context,
    ) -> Result<api::Invoice, Error> {
        use api::invoice::InvoiceError as E;

        let actor = ctx.current_actor().await?;
        ctx.service()
            .execute(query::invoice::ById::by(id.into(), actor))
            .await
            .map_err(|e| api::visibility_error(e, E::NotExists, E::NotPermitted))
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Returns the `Invoice` issued for the `Order` with the specified ID.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `INVOICE_NOT_EXISTS` - the `Order` with the specified ID is not
    ///                          invoiced;
    /// - `INVOICE_FORBIDDEN` - the current user takes no part in the
    ///                         `Invoice`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "invoiceByOrder",
            order_id = %order_id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn invoice_by_order(
        order_id: api::order::Id,
        ctx: &Context,
    ) -> Result<api::Invoice, Error> {
        use api::invoice::InvoiceError as E;

        let actor = ctx.current_actor().await?;
        ctx.service()
            .execute(query::invoice::ByOrderId::by(order_id.into(), actor))
            .await
            .map_err(|e| api::visibility_error(e, E::NotExists, E::NotPermitted))
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Lists all the `Invoice`s visible to the current user, newest first.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "invoices",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn invoices(ctx: &Context) -> Result<Vec<api::Invoice>, Error> {
        let actor = ctx.current_actor().await?;
        ctx.service()
            .execute(query::invoice::List::by(Scope::from(&actor)))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|list| list.into_iter().map(Into::into).collect())
    }

    /// Checks whether the requested quantity of a product is free for the
    /// specified rental period.
    ///
    /// The answer is advisory: the capacity is checked again on ordering.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `PRODUCT_NOT_EXISTS` - the product with the specified ID does not
    ///                          exist;
    /// - `INVALID_QUANTITY` - the quantity is not positive;
    /// - `INVALID_PERIOD` - the period ends before it starts.
    #[tracing::instrument(
        skip_all,
        fields(
            end_date = ?end_date,
            gql.name = "checkAvailability",
            otel.name = Self::SPAN_NAME,
            product_id = %product_id,
            quantity = %quantity,
            start_date = ?start_date,
        ),
    )]
    pub async fn check_availability(
        product_id: api::product::Id,
        quantity: i32,
        start_date: DateTime,
        end_date: DateTime,
        ctx: &Context,
    ) -> Result<api::product::Availability, Error> {
        let _ = ctx.current_actor().await?;

        let quantity = api::rental::quantity(quantity)
            .map_err(Into::into)
            .map_err(ctx.error())?;
        let period = api::rental::Period::new(start_date, end_date)
            .map_err(Into::into)
            .map_err(ctx.error())?;

        ctx.service()
            .execute(query::product::CheckAvailability {
                product_id: product_id.into(),
                quantity,
                period: period.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }
}

impl AsError for query::product::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        Some(match self {
            Self::Db(e) => return e.try_as_error(),
            Self::ProductNotExists(_) => ProductError::NotExists.into(),
        })
    }
}

define_error! {
    enum ProductError {
        #[code = "PRODUCT_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "Product with the specified ID does not exist"]
        NotExists,
    }
}
