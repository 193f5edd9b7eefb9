//! GraphQL [`Mutation`]s definitions.

use common::{DateTime, Money};
use juniper::graphql_object;
use service::{
    command,
    domain::quotation::{self, PricingError},
    Command as _,
};

use crate::{api, define_error, AsError, Context, Error};

/// Root of all GraphQL mutations.
#[derive(Clone, Copy, Debug)]
pub struct Mutation;

impl Mutation {
    /// Name of the [`tracing::Span`] for the mutations.
    const SPAN_NAME: &'static str = "GraphQL mutation";
}

#[graphql_object(context = Context)]
impl Mutation {
    /// Creates a new draft `Quotation` of the requested items for the current
    /// customer.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `NOT_CUSTOMER` - the current user is not a customer;
    /// - `NO_ITEMS` - no items are requested;
    /// - `PRODUCT_NOT_EXISTS` - a requested product does not exist;
    /// - `PRODUCT_NOT_AVAILABLE` - a requested quantity is not free for the
    ///                             requested period;
    /// - `INVALID_QUANTITY`, `INVALID_PERIOD` - an item input is malformed.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "createQuotation",
            items = items.len(),
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn create_quotation(
        items: Vec<api::quotation::ItemInput>,
        notes: Option<api::rental::Notes>,
        ctx: &Context,
    ) -> Result<api::Quotation, Error> {
        let actor = ctx.current_actor().await?;
        let requests = items
            .into_iter()
            .map(quotation::Request::try_from)
            .collect::<Result<Vec<_>, _>>()
            .map_err(Error::from)
            .map_err(ctx.error())?;

        ctx.service()
            .execute(command::CreateQuotation {
                actor,
                requests,
                notes: notes.map(Into::into),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Replaces the items or the notes of a draft `Quotation`, repricing it.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `QUOTATION_NOT_EXISTS` - the `Quotation` does not exist;
    /// - `NOT_QUOTATION_OWNER` - the current user doesn't own the `Quotation`;
    /// - `QUOTATION_NOT_EDITABLE` - the `Quotation` is not a draft anymore;
    /// - `NO_ITEMS`, `PRODUCT_NOT_EXISTS`, `PRODUCT_NOT_AVAILABLE` - the
    ///   requested items cannot be priced.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "updateQuotation",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn update_quotation(
        id: api::quotation::Id,
        items: Option<Vec<api::quotation::ItemInput>>,
        notes: Option<api::rental::Notes>,
        ctx: &Context,
    ) -> Result<api::Quotation, Error> {
        let actor = ctx.current_actor().await?;
        let requests = items
            .map(|items| {
                items
                    .into_iter()
                    .map(quotation::Request::try_from)
                    .collect::<Result<Vec<_>, _>>()
            })
            .transpose()
            .map_err(Error::from)
            .map_err(ctx.error())?;

        ctx.service()
            .execute(command::UpdateQuotation {
                quotation_id: id.into(),
                actor,
                requests,
                notes: notes.map(Into::into),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Moves a `Quotation` into the provided status.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `QUOTATION_NOT_EXISTS` - the `Quotation` does not exist;
    /// - `QUOTATION_FORBIDDEN` - the current user takes no part in the
    ///                           `Quotation`;
    /// - `UNSETTABLE_STATUS` - the status has its own dedicated mutation;
    /// - `INVALID_STATUS_TRANSITION` - the `Quotation` cannot move into the
    ///                                 status.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "updateQuotationStatus",
            id = %id,
            otel.name = Self::SPAN_NAME,
            status = ?status,
        ),
    )]
    pub async fn update_quotation_status(
        id: api::quotation::Id,
        status: api::quotation::Status,
        ctx: &Context,
    ) -> Result<api::Quotation, Error> {
        let actor = ctx.current_actor().await?;
        ctx.service()
            .execute(command::UpdateQuotationStatus {
                quotation_id: id.into(),
                actor,
                status: status.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Confirms a `Quotation` by its customer.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `QUOTATION_NOT_EXISTS` - the `Quotation` does not exist;
    /// - `NOT_QUOTATION_OWNER` - the current user doesn't own the `Quotation`;
    /// - `QUOTATION_CONFIRMED` - the `Quotation` is confirmed already;
    /// - `QUOTATION_EXPIRED` - the `Quotation` validity is over.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "confirmQuotation",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn confirm_quotation(
        id: api::quotation::Id,
        ctx: &Context,
    ) -> Result<api::Quotation, Error> {
        let actor = ctx.current_actor().await?;
        ctx.service()
            .execute(command::ConfirmQuotation {
                quotation_id: id.into(),
                actor,
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Deletes a `Quotation` that never made it into an `Order`.
    ///
    /// Returns the ID of the deleted `Quotation`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `QUOTATION_NOT_EXISTS` - the `Quotation` does not exist;
    /// - `NOT_QUOTATION_OWNER` - the current user doesn't own the `Quotation`;
    /// - `QUOTATION_NOT_DELETABLE` - the `Quotation` is sent or confirmed.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "deleteQuotation",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn delete_quotation(
        id: api::quotation::Id,
        ctx: &Context,
    ) -> Result<api::quotation::Id, Error> {
        let actor = ctx.current_actor().await?;
        ctx.service()
            .execute(command::DeleteQuotation {
                quotation_id: id.into(),
                actor,
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|()| id)
    }

    /// Places a new `Order` from a confirmed `Quotation`, reserving its
    /// items.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `QUOTATION_NOT_EXISTS` - the `Quotation` does not exist;
    /// - `NOT_QUOTATION_OWNER` - the current user doesn't own the `Quotation`;
    /// - `QUOTATION_NOT_CONFIRMED` - the `Quotation` is not confirmed;
    /// - `QUOTATION_ORDERED` - the `Quotation` is ordered already;
    /// - `PRODUCT_NOT_AVAILABLE` - an item is not free anymore;
    /// - `INVALID_SECURITY_DEPOSIT` - the deposit is negative or expressed in
    ///                                another currency.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "createOrder",
            otel.name = Self::SPAN_NAME,
            quotation_id = %quotation_id,
            security_deposit = ?security_deposit.map(|m| m.to_string()),
        ),
    )]
    pub async fn create_order(
        quotation_id: api::quotation::Id,
        shipping_address: Option<api::order::ShippingAddress>,
        notes: Option<api::rental::Notes>,
        security_deposit: Option<Money>,
        ctx: &Context,
    ) -> Result<api::Order, Error> {
        let actor = ctx.current_actor().await?;
        ctx.service()
            .execute(command::CreateOrder {
                quotation_id: quotation_id.into(),
                actor,
                shipping_address: shipping_address.map(Into::into),
                notes: notes.map(Into::into),
                security_deposit,
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Moves an `Order` into the provided status.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `ORDER_NOT_EXISTS` - the `Order` does not exist;
    /// - `ORDER_FORBIDDEN` - the current user is not the vendor of the
    ///                       `Order`;
    /// - `UNSETTABLE_STATUS` - the status has its own dedicated mutation;
    /// - `INVALID_STATUS_TRANSITION` - the `Order` cannot move into the
    ///                                 status.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "updateOrderStatus",
            id = %id,
            otel.name = Self::SPAN_NAME,
            status = ?status,
        ),
    )]
    pub async fn update_order_status(
        id: api::order::Id,
        status: api::order::Status,
        ctx: &Context,
    ) -> Result<api::Order, Error> {
        let actor = ctx.current_actor().await?;
        ctx.service()
            .execute(command::UpdateOrderStatus {
                order_id: id.into(),
                actor,
                status: status.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Cancels an `Order`, releasing its reservations.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `ORDER_NOT_EXISTS` - the `Order` does not exist;
    /// - `ORDER_FORBIDDEN` - the current user takes no part in the `Order`;
    /// - `ORDER_IN_PROGRESS` - the items are with the customer already;
    /// - `ORDER_CLOSED` - the `Order` is completed or cancelled already.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "cancelOrder",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn cancel_order(
        id: api::order::Id,
        ctx: &Context,
    ) -> Result<api::Order, Error> {
        let actor = ctx.current_actor().await?;
        ctx.service()
            .execute(command::CancelOrder {
                order_id: id.into(),
                actor,
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Schedules a new `Pickup` of the `Order` items.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `ORDER_NOT_EXISTS` - the `Order` does not exist;
    /// - `ORDER_FORBIDDEN` - the current user is not the vendor of the
    ///                       `Order`;
    /// - `ORDER_IN_PROGRESS` - the items are picked up already;
    /// - `ORDER_CLOSED` - the `Order` is completed or cancelled already.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "createPickup",
            order_id = %order_id,
            otel.name = Self::SPAN_NAME,
            scheduled_date = ?scheduled_date,
        ),
    )]
    pub async fn create_pickup(
        order_id: api::order::Id,
        scheduled_date: DateTime,
        instructions: Option<api::rental::Notes>,
        ctx: &Context,
    ) -> Result<api::Pickup, Error> {
        let actor = ctx.current_actor().await?;
        ctx.service()
            .execute(command::CreatePickup {
                order_id: order_id.into(),
                actor,
                scheduled_at: scheduled_date.coerce(),
                instructions: instructions.map(Into::into),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Completes a `Pickup`, handing the items over to the customer.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `PICKUP_NOT_EXISTS` - the `Pickup` does not exist;
    /// - `PICKUP_FORBIDDEN` - the current user is not the vendor of the
    ///                        `Pickup`;
    /// - `PICKUP_NOT_SCHEDULED` - the `Pickup` is completed or cancelled
    ///                            already;
    /// - `INVALID_STATUS_TRANSITION` - the `Order` cannot be picked up.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "completePickup",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn complete_pickup(
        id: api::pickup::Id,
        ctx: &Context,
    ) -> Result<api::Pickup, Error> {
        let actor = ctx.current_actor().await?;
        ctx.service()
            .execute(command::CompletePickup {
                pickup_id: id.into(),
                actor,
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Cancels a scheduled `Pickup`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `PICKUP_NOT_EXISTS` - the `Pickup` does not exist;
    /// - `PICKUP_FORBIDDEN` - the current user is not the vendor of the
    ///                        `Pickup`;
    /// - `INVALID_STATUS_TRANSITION` - the `Pickup` is not scheduled.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "cancelPickup",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn cancel_pickup(
        id: api::pickup::Id,
        ctx: &Context,
    ) -> Result<api::Pickup, Error> {
        let actor = ctx.current_actor().await?;
        ctx.service()
            .execute(command::CancelPickup {
                pickup_id: id.into(),
                actor,
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Returns the `Order` items back to the vendor, charging late and damage
    /// fees.
    ///
    /// All the `Order` items are accepted in a good condition, if no `items`
    /// are provided.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `ORDER_NOT_EXISTS` - the `Order` does not exist;
    /// - `ORDER_FORBIDDEN` - the current user takes no part in the `Order`;
    /// - `ORDER_NOT_IN_PROGRESS` - the items are not with the customer;
    /// - `PRODUCT_NOT_ORDERED` - a returned product is not a part of the
    ///                           `Order`;
    /// - `INVALID_DAMAGE_FEE` - a damage fee is negative or expressed in
    ///                          another currency.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "createReturn",
            items = ?items.as_ref().map(Vec::len),
            order_id = %order_id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn create_return(
        order_id: api::order::Id,
        items: Option<Vec<api::rental_return::ItemInput>>,
        ctx: &Context,
    ) -> Result<api::Return, Error> {
        let actor = ctx.current_actor().await?;
        let zero = Money::zero(ctx.service().config().terms.currency);
        let items = items
            .map(|items| {
                items
                    .into_iter()
                    .map(|i| i.into_item(zero))
                    .collect::<Result<Vec<_>, _>>()
            })
            .transpose()
            .map_err(Error::from)
            .map_err(ctx.error())?;

        ctx.service()
            .execute(command::CreateReturn {
                order_id: order_id.into(),
                actor,
                items,
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Completes the inspection of a `Return`, closing its `Order`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `RETURN_NOT_EXISTS` - the `Return` does not exist;
    /// - `RETURN_FORBIDDEN` - the current user is not the vendor of the
    ///                        `Return`;
    /// - `INVALID_STATUS_TRANSITION` - the `Return` is completed already.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "completeReturn",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn complete_return(
        id: api::rental_return::Id,
        ctx: &Context,
    ) -> Result<api::Return, Error> {
        let actor = ctx.current_actor().await?;
        ctx.service()
            .execute(command::CompleteReturn {
                return_id: id.into(),
                actor,
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Issues a new `Invoice` for an `Order`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `ORDER_NOT_EXISTS` - the `Order` does not exist;
    /// - `ORDER_FORBIDDEN` - the current user is not the vendor of the
    ///                       `Order`;
    /// - `ORDER_CANCELLED` - the `Order` is cancelled;
    /// - `ORDER_INVOICED` - the `Order` is invoiced already.
    #[tracing::instrument(
        skip_all,
        fields(
            due_date = ?due_date,
            gql.name = "createInvoice",
            order_id = %order_id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn create_invoice(
        order_id: api::order::Id,
        due_date: Option<DateTime>,
        notes: Option<api::rental::Notes>,
        ctx: &Context,
    ) -> Result<api::Invoice, Error> {
        let actor = ctx.current_actor().await?;
        ctx.service()
            .execute(command::CreateInvoice {
                order_id: order_id.into(),
                actor,
                due_at: due_date.map(DateTime::coerce),
                notes: notes.map(Into::into),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Records a payment in the `Invoice` ledger.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `INVOICE_NOT_EXISTS` - the `Invoice` does not exist;
    /// - `INVOICE_FORBIDDEN` - the current user takes no part in the
    ///                         `Invoice`;
    /// - `INVOICE_CLOSED` - the `Invoice` is paid or cancelled already;
    /// - `INVALID_PAYMENT_AMOUNT` - the amount is not positive or expressed
    ///                              in another currency.
    #[tracing::instrument(
        skip_all,
        fields(
            amount = %amount,
            gql.name = "addInvoicePayment",
            id = %id,
            method = ?method,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn add_invoice_payment(
        id: api::invoice::Id,
        amount: Money,
        method: api::invoice::PaymentMethod,
        transaction_id: Option<api::invoice::TransactionId>,
        notes: Option<api::rental::Notes>,
        ctx: &Context,
    ) -> Result<api::Invoice, Error> {
        let actor = ctx.current_actor().await?;
        ctx.service()
            .execute(command::AddInvoicePayment {
                invoice_id: id.into(),
                actor,
                amount,
                method: method.into(),
                transaction_id: transaction_id.map(Into::into),
                notes: notes.map(Into::into),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Moves an `Invoice` into the provided status.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `INVOICE_NOT_EXISTS` - the `Invoice` does not exist;
    /// - `INVOICE_FORBIDDEN` - the current user is not the vendor of the
    ///                         `Invoice`;
    /// - `UNSETTABLE_STATUS` - the status is derived from the payments;
    /// - `INVALID_STATUS_TRANSITION` - the `Invoice` cannot move into the
    ///                                 status.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "updateInvoiceStatus",
            id = %id,
            otel.name = Self::SPAN_NAME,
            status = ?status,
        ),
    )]
    pub async fn update_invoice_status(
        id: api::invoice::Id,
        status: api::invoice::Status,
        ctx: &Context,
    ) -> Result<api::Invoice, Error> {
        let actor = ctx.current_actor().await?;
        ctx.service()
            .execute(command::UpdateInvoiceStatus {
                invoice_id: id.into(),
                actor,
                status: status.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }
}

define_error! {
    enum StatusError {
        #[code = "INVALID_STATUS_TRANSITION"]
        #[status = CONFLICT]
        #[message = "Status cannot be changed into the requested one"]
        InvalidTransition,

        #[code = "UNSETTABLE_STATUS"]
        #[status = BAD_REQUEST]
        #[message = "Requested status cannot be set directly"]
        Unsettable,
    }
}

define_error! {
    enum QuotationOwnerError {
        #[code = "NOT_QUOTATION_OWNER"]
        #[status = FORBIDDEN]
        #[message = "Authenticated user doesn't own the `Quotation`"]
        NotOwner,
    }
}

define_error! {
    enum RequestError {
        #[code = "NO_ITEMS"]
        #[status = BAD_REQUEST]
        #[message = "At least one item must be requested"]
        NoItems,

        #[code = "PRODUCT_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "Requested product does not exist"]
        ProductNotExists,

        #[code = "INVALID_PERIOD"]
        #[status = BAD_REQUEST]
        #[message = "Rental period must not be empty"]
        InvalidPeriod,

        #[code = "CURRENCY_MISMATCH"]
        #[status = BAD_REQUEST]
        #[message = "Requested product is priced in another currency"]
        CurrencyMismatch,

        #[code = "PRODUCT_NOT_AVAILABLE"]
        #[status = CONFLICT]
        #[message = "Requested quantity of the product is not available for \
                     the requested period"]
        NotAvailable,
    }
}

impl AsError for PricingError {
    fn try_as_error(&self) -> Option<Error> {
        Some(match self {
            Self::NoItems => RequestError::NoItems.into(),
            Self::ProductNotExists(_) => RequestError::ProductNotExists.into(),
            Self::InvalidPeriod(_) => RequestError::InvalidPeriod.into(),
            Self::CurrencyMismatch(_) => RequestError::CurrencyMismatch.into(),
            Self::NotAvailable { .. } => Error {
                message: self.to_string(),
                ..Error::from(RequestError::NotAvailable)
            },
        })
    }
}

impl AsError for command::create_quotation::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "NOT_CUSTOMER"]
                #[status = FORBIDDEN]
                #[message = "Authenticated user must be a customer"]
                NotCustomer,
            }
        }

        Some(match self {
            Self::Db(e) => return e.try_as_error(),
            Self::NotCustomer(_) => Error::NotCustomer.into(),
            Self::Pricing(e) => return e.try_as_error(),
        })
    }
}

impl AsError for command::update_quotation::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        use api::quotation::QuotationError;

        define_error! {
            enum Error {
                #[code = "QUOTATION_NOT_EDITABLE"]
                #[status = CONFLICT]
                #[message = "`Quotation` is not a draft anymore"]
                QuotationNotEditable,
            }
        }

        Some(match self {
            Self::Db(e) => return e.try_as_error(),
            Self::NotOwner(_) => QuotationOwnerError::NotOwner.into(),
            Self::Pricing(e) => return e.try_as_error(),
            Self::QuotationNotEditable(..) => {
                Error::QuotationNotEditable.into()
            }
            Self::QuotationNotExists(_) => QuotationError::NotExists.into(),
        })
    }
}

impl AsError for command::update_quotation_status::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        use api::quotation::QuotationError;

        Some(match self {
            Self::Db(e) => return e.try_as_error(),
            Self::InvalidTransition(_) => StatusError::InvalidTransition.into(),
            Self::NotPermitted(_) => QuotationError::NotPermitted.into(),
            Self::QuotationNotExists(_) => QuotationError::NotExists.into(),
            Self::UnsettableStatus(_) => StatusError::Unsettable.into(),
        })
    }
}

impl AsError for command::confirm_quotation::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        use api::quotation::QuotationError;

        define_error! {
            enum Error {
                #[code = "QUOTATION_CONFIRMED"]
                #[status = CONFLICT]
                #[message = "`Quotation` is confirmed already"]
                AlreadyConfirmed,

                #[code = "QUOTATION_EXPIRED"]
                #[status = GONE]
                #[message = "`Quotation` validity is over"]
                QuotationExpired,
            }
        }

        Some(match self {
            Self::AlreadyConfirmed(_) => Error::AlreadyConfirmed.into(),
            Self::Db(e) => return e.try_as_error(),
            Self::InvalidTransition(_) => StatusError::InvalidTransition.into(),
            Self::NotOwner(_) => QuotationOwnerError::NotOwner.into(),
            Self::QuotationExpired(_) => Error::QuotationExpired.into(),
            Self::QuotationNotExists(_) => QuotationError::NotExists.into(),
        })
    }
}

impl AsError for command::delete_quotation::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        use api::quotation::QuotationError;

        define_error! {
            enum Error {
                #[code = "QUOTATION_NOT_DELETABLE"]
                #[status = CONFLICT]
                #[message = "`Quotation` is sent or confirmed, so cannot be \
                             deleted"]
                QuotationNotDeletable,
            }
        }

        Some(match self {
            Self::Db(e) => return e.try_as_error(),
            Self::NotOwner(_) => QuotationOwnerError::NotOwner.into(),
            Self::QuotationNotDeletable(..) => {
                Error::QuotationNotDeletable.into()
            }
            Self::QuotationNotExists(_) => QuotationError::NotExists.into(),
        })
    }
}

impl AsError for command::create_order::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        use api::quotation::QuotationError;

        define_error! {
            enum Error {
                #[code = "INVALID_SECURITY_DEPOSIT"]
                #[status = BAD_REQUEST]
                #[message = "Security deposit must be non-negative and \
                             expressed in the marketplace currency"]
                InvalidDeposit,

                #[code = "NO_ITEMS"]
                #[status = BAD_REQUEST]
                #[message = "`Quotation` has no items to order"]
                NoItems,

                #[code = "QUOTATION_NOT_CONFIRMED"]
                #[status = CONFLICT]
                #[message = "`Quotation` must be confirmed to be ordered"]
                QuotationNotConfirmed,

                #[code = "QUOTATION_ORDERED"]
                #[status = CONFLICT]
                #[message = "`Quotation` is ordered already"]
                QuotationAlreadyOrdered,
            }
        }

        Some(match self {
            Self::CurrencyMismatch(_) | Self::NegativeDeposit(_) => {
                Error::InvalidDeposit.into()
            }
            Self::Db(e) => return e.try_as_error(),
            Self::NoItems(_) => Error::NoItems.into(),
            Self::NotAvailable { .. } => crate::Error {
                message: self.to_string(),
                ..crate::Error::from(RequestError::NotAvailable)
            },
            Self::NotOwner(_) => QuotationOwnerError::NotOwner.into(),
            Self::ProductNotExists(_) => RequestError::ProductNotExists.into(),
            Self::QuotationAlreadyOrdered(_) => {
                Error::QuotationAlreadyOrdered.into()
            }
            Self::QuotationNotConfirmed(..) => {
                Error::QuotationNotConfirmed.into()
            }
            Self::QuotationNotExists(_) => QuotationError::NotExists.into(),
        })
    }
}

impl AsError for command::update_order_status::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        use api::order::OrderError;

        Some(match self {
            Self::Db(e) => return e.try_as_error(),
            Self::InvalidTransition(_) => StatusError::InvalidTransition.into(),
            Self::NotPermitted(_) => OrderError::NotPermitted.into(),
            Self::OrderNotExists(_) => OrderError::NotExists.into(),
            Self::UnsettableStatus(_) => StatusError::Unsettable.into(),
        })
    }
}

define_error! {
    enum OrderStateError {
        #[code = "ORDER_CLOSED"]
        #[status = CONFLICT]
        #[message = "`Order` is completed or cancelled already"]
        Closed,

        #[code = "ORDER_IN_PROGRESS"]
        #[status = CONFLICT]
        #[message = "`Order` items are with the customer already"]
        InProgress,

        #[code = "ORDER_NOT_IN_PROGRESS"]
        #[status = CONFLICT]
        #[message = "`Order` items are not with the customer"]
        NotInProgress,
    }
}

impl AsError for command::cancel_order::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        use api::order::OrderError;

        Some(match self {
            Self::Db(e) => return e.try_as_error(),
            Self::InvalidTransition(_) => StatusError::InvalidTransition.into(),
            Self::NotPermitted(_) => OrderError::NotPermitted.into(),
            Self::OrderClosed(..) => OrderStateError::Closed.into(),
            Self::OrderInProgress(_) => OrderStateError::InProgress.into(),
            Self::OrderNotExists(_) => OrderError::NotExists.into(),
        })
    }
}

impl AsError for command::create_pickup::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        use api::order::OrderError;

        Some(match self {
            Self::Db(e) => return e.try_as_error(),
            Self::NotPermitted(_) => OrderError::NotPermitted.into(),
            Self::OrderClosed(..) => OrderStateError::Closed.into(),
            Self::OrderInProgress(_) => OrderStateError::InProgress.into(),
            Self::OrderNotExists(_) => OrderError::NotExists.into(),
        })
    }
}

impl AsError for command::complete_pickup::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        use api::{order::OrderError, pickup::PickupError};

        define_error! {
            enum Error {
                #[code = "PICKUP_NOT_SCHEDULED"]
                #[status = CONFLICT]
                #[message = "`Pickup` is completed or cancelled already"]
                PickupNotScheduled,
            }
        }

        Some(match self {
            Self::Db(e) => return e.try_as_error(),
            Self::InvalidTransition(_) => StatusError::InvalidTransition.into(),
            Self::NotPermitted(_) => PickupError::NotPermitted.into(),
            Self::OrderNotExists(_) => OrderError::NotExists.into(),
            Self::PickupNotExists(_) => PickupError::NotExists.into(),
            Self::PickupNotScheduled(..) => Error::PickupNotScheduled.into(),
        })
    }
}

impl AsError for command::cancel_pickup::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        use api::pickup::PickupError;

        Some(match self {
            Self::Db(e) => return e.try_as_error(),
            Self::InvalidTransition(_) => StatusError::InvalidTransition.into(),
            Self::NotPermitted(_) => PickupError::NotPermitted.into(),
            Self::PickupNotExists(_) => PickupError::NotExists.into(),
        })
    }
}

impl AsError for command::create_return::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        use api::order::OrderError;

        define_error! {
            enum Error {
                #[code = "INVALID_DAMAGE_FEE"]
                #[status = BAD_REQUEST]
                #[message = "Damage fee must be non-negative and expressed in \
                             the marketplace currency"]
                InvalidDamageFee,

                #[code = "NO_ITEMS"]
                #[status = BAD_REQUEST]
                #[message = "`Order` has no items to return"]
                NoItems,

                #[code = "PRODUCT_NOT_ORDERED"]
                #[status = BAD_REQUEST]
                #[message = "Returned product is not a part of the `Order`"]
                ProductNotOrdered,
            }
        }

        Some(match self {
            Self::CurrencyMismatch(_) | Self::NegativeDamageFee(_) => {
                Error::InvalidDamageFee.into()
            }
            Self::Db(e) => return e.try_as_error(),
            Self::InvalidTransition(_) => StatusError::InvalidTransition.into(),
            Self::NoItems(_) => Error::NoItems.into(),
            Self::NotPermitted(_) => OrderError::NotPermitted.into(),
            Self::OrderNotExists(_) => OrderError::NotExists.into(),
            Self::OrderNotInProgress(..) => {
                OrderStateError::NotInProgress.into()
            }
            Self::ProductNotOrdered(_) => Error::ProductNotOrdered.into(),
        })
    }
}

impl AsError for command::complete_return::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        use api::rental_return::ReturnError;

        Some(match self {
            Self::Db(e) => return e.try_as_error(),
            Self::InvalidTransition(_) => StatusError::InvalidTransition.into(),
            Self::NotPermitted(_) => ReturnError::NotPermitted.into(),
            Self::ReturnNotExists(_) => ReturnError::NotExists.into(),
        })
    }
}

impl AsError for command::create_invoice::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        use api::order::OrderError;

        define_error! {
            enum Error {
                #[code = "ORDER_CANCELLED"]
                #[status = CONFLICT]
                #[message = "Cancelled `Order` cannot be invoiced"]
                OrderCancelled,

                #[code = "ORDER_INVOICED"]
                #[status = CONFLICT]
                #[message = "`Order` is invoiced already"]
                AlreadyInvoiced,
            }
        }

        Some(match self {
            Self::AlreadyInvoiced(_) => Error::AlreadyInvoiced.into(),
            Self::Db(e) => return e.try_as_error(),
            Self::NotPermitted(_) => OrderError::NotPermitted.into(),
            Self::OrderCancelled(_) => Error::OrderCancelled.into(),
            Self::OrderNotExists(_) => OrderError::NotExists.into(),
            Self::ProductNotExists(_) => return None,
        })
    }
}

impl AsError for command::add_invoice_payment::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        use api::invoice::InvoiceError;
        use service::domain::invoice::PaymentError;

        define_error! {
            enum Error {
                #[code = "INVOICE_CLOSED"]
                #[status = CONFLICT]
                #[message = "`Invoice` is paid or cancelled already"]
                InvoiceClosed,

                #[code = "INVALID_PAYMENT_AMOUNT"]
                #[status = BAD_REQUEST]
                #[message = "Payment amount must be positive and expressed in \
                             the `Invoice` currency"]
                InvalidAmount,
            }
        }

        Some(match self {
            Self::Db(e) => return e.try_as_error(),
            Self::InvoiceNotExists(_) => InvoiceError::NotExists.into(),
            Self::NotPermitted(_) => InvoiceError::NotPermitted.into(),
            Self::OrderNotExists(_) => return None,
            Self::Payment(PaymentError::InvoiceClosed) => {
                Error::InvoiceClosed.into()
            }
            Self::Payment(
                PaymentError::CurrencyMismatch
                | PaymentError::NonPositiveAmount,
            ) => Error::InvalidAmount.into(),
        })
    }
}

impl AsError for command::update_invoice_status::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        use api::invoice::InvoiceError;

        Some(match self {
            Self::Db(e) => return e.try_as_error(),
            Self::InvalidTransition(_) => StatusError::InvalidTransition.into(),
            Self::InvoiceNotExists(_) => InvoiceError::NotExists.into(),
            Self::NotPermitted(_) => InvoiceError::NotPermitted.into(),
            Self::UnsettableStatus(_) => StatusError::Unsettable.into(),
        })
    }
}
