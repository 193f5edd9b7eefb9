//! [`Invoice`]-related definitions.

use common::{DateTime, Money, Percent};
use derive_more::{AsRef, Display, From, Into};
use juniper::{graphql_object, GraphQLEnum, GraphQLScalar};
use service::domain::{self, invoice};
use uuid::Uuid;

use crate::{
    api::{order, product, rental, scalar, user},
    define_error, Context,
};

/// A bill of an `Order` along with the ledger of its payments.
#[derive(Clone, Debug, From, Into)]
pub struct Invoice(domain::Invoice);

/// A bill of an `Order` along with the ledger of its payments.
#[graphql_object(context = Context)]
impl Invoice {
    /// Unique identifier of this `Invoice`.
    #[must_use]
    pub fn id(&self) -> Id {
        self.0.id.into()
    }

    /// Human-readable number of this `Invoice`.
    #[must_use]
    pub fn number(&self) -> String {
        self.0.number.to_string()
    }

    /// ID of the invoiced `Order`.
    #[must_use]
    pub fn order_id(&self) -> order::Id {
        self.0.order_id.into()
    }

    /// ID of the billed customer.
    #[must_use]
    pub fn customer_id(&self) -> user::Id {
        self.0.customer_id.into()
    }

    /// ID of the billing vendor.
    #[must_use]
    pub fn vendor_id(&self) -> user::Id {
        self.0.vendor_id.into()
    }

    /// Invoiced items.
    #[must_use]
    pub fn items(&self) -> Vec<Item> {
        self.0.items.iter().cloned().map(Into::into).collect()
    }

    /// Sum of all the item prices.
    #[must_use]
    pub fn subtotal(&self) -> Money {
        self.0.totals.subtotal
    }

    /// Tax rate copied from the `Order`.
    #[must_use]
    pub fn tax_rate(&self) -> Percent {
        self.0.totals.tax_rate
    }

    /// Tax charged on top of the subtotal.
    #[must_use]
    pub fn tax_amount(&self) -> Money {
        self.0.totals.tax_amount
    }

    /// Total amount to be paid.
    #[must_use]
    pub fn total_amount(&self) -> Money {
        self.0.totals.total_amount
    }

    /// Security deposit copied from the `Order`.
    #[must_use]
    pub fn security_deposit(&self) -> Money {
        self.0.security_deposit
    }

    /// Late return fee copied from the `Order`.
    #[must_use]
    pub fn late_return_fee(&self) -> Money {
        self.0.late_return_fee
    }

    /// Sum of all the payments.
    #[must_use]
    pub fn paid_amount(&self) -> Money {
        self.0.paid_amount
    }

    /// Amount still to be paid.
    #[must_use]
    pub fn balance_amount(&self) -> Money {
        self.0.balance_amount
    }

    /// Status of this `Invoice`.
    #[must_use]
    pub fn status(&self) -> Status {
        self.0.status.into()
    }

    /// Payments recorded in this `Invoice`, oldest first.
    #[must_use]
    pub fn payments(&self) -> Vec<Payment> {
        self.0.payments.iter().cloned().map(Into::into).collect()
    }

    /// `DateTime` this `Invoice` should be paid until.
    #[must_use]
    pub fn due_date(&self) -> DateTime {
        self.0.due_at.coerce()
    }

    /// `DateTime` when this `Invoice` was issued.
    #[must_use]
    pub fn issued_at(&self) -> DateTime {
        self.0.issued_at.coerce()
    }

    /// Notes of this `Invoice`.
    #[must_use]
    pub fn notes(&self) -> Option<rental::Notes> {
        self.0.notes.clone().map(Into::into)
    }

    /// `DateTime` when this `Invoice` was created.
    #[must_use]
    pub fn created_at(&self) -> DateTime {
        self.0.created_at.coerce()
    }

    /// `DateTime` when this `Invoice` was updated last time.
    #[must_use]
    pub fn updated_at(&self) -> DateTime {
        self.0.updated_at.coerce()
    }
}

/// Unique identifier of an `Invoice`.
#[derive(Clone, Copy, Debug, Display, Into, From, GraphQLScalar)]
#[from(invoice::Id)]
#[into(invoice::Id)]
#[graphql(name = "InvoiceId", transparent)]
pub struct Id(Uuid);

/// Invoiced line of an `Invoice`.
#[derive(Clone, Debug, From)]
pub struct Item(invoice::Item);

/// Invoiced line of an `Invoice`.
#[graphql_object(name = "InvoiceItem", context = Context)]
impl Item {
    /// ID of the invoiced product.
    #[must_use]
    pub fn product_id(&self) -> product::Id {
        self.0.product_id.into()
    }

    /// Name of the invoiced product at the invoicing time.
    #[must_use]
    pub fn product_name(&self) -> String {
        self.0.product_name.to_string()
    }

    /// Number of invoiced units.
    #[must_use]
    pub fn quantity(&self) -> i32 {
        rental::int(self.0.quantity.get())
    }

    /// Human-readable rental period, like `01 Mar 2024 - 03 Mar 2024`.
    #[must_use]
    pub fn rental_period(&self) -> String {
        self.0.rental_period()
    }

    /// Billed duration.
    #[must_use]
    pub fn duration(&self) -> rental::Duration {
        self.0.duration.into()
    }

    /// Price of a single unit for the whole billed duration.
    #[must_use]
    pub fn price_per_unit(&self) -> Money {
        self.0.price_per_unit
    }

    /// Total price of this line.
    #[must_use]
    pub fn total_price(&self) -> Money {
        self.0.total_price
    }
}

/// Payment recorded in an `Invoice` ledger.
#[derive(Clone, Debug, From)]
pub struct Payment(invoice::Payment);

/// Payment recorded in an `Invoice` ledger.
#[graphql_object(name = "InvoicePayment", context = Context)]
impl Payment {
    /// Paid amount.
    #[must_use]
    pub fn amount(&self) -> Money {
        self.0.amount
    }

    /// Method used for the payment.
    #[must_use]
    pub fn method(&self) -> PaymentMethod {
        self.0.method.into()
    }

    /// ID of the transaction in an external payment system.
    #[must_use]
    pub fn transaction_id(&self) -> Option<TransactionId> {
        self.0.transaction_id.clone().map(Into::into)
    }

    /// `DateTime` when this payment was recorded.
    #[must_use]
    pub fn paid_at(&self) -> DateTime {
        self.0.paid_at.coerce()
    }

    /// Notes of this payment.
    #[must_use]
    pub fn notes(&self) -> Option<rental::Notes> {
        self.0.notes.clone().map(Into::into)
    }
}

/// ID of a transaction in an external payment system.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "TransactionId",
    with = scalar::Via::<invoice::TransactionId>,
)]
pub struct TransactionId(invoice::TransactionId);

/// Method of an `Invoice` payment.
#[derive(Clone, Copy, Debug, GraphQLEnum)]
#[graphql(name = "PaymentMethod")]
pub enum PaymentMethod {
    /// Cash.
    Cash,

    /// Debit or credit card.
    Card,

    /// Unified Payments Interface.
    Upi,

    /// Online payment system.
    Online,

    /// Bank transfer.
    BankTransfer,
}

impl From<invoice::PaymentMethod> for PaymentMethod {
    fn from(method: invoice::PaymentMethod) -> Self {
        use invoice::PaymentMethod as M;
        match method {
            M::Cash => Self::Cash,
            M::Card => Self::Card,
            M::Upi => Self::Upi,
            M::Online => Self::Online,
            M::BankTransfer => Self::BankTransfer,
        }
    }
}

impl From<PaymentMethod> for invoice::PaymentMethod {
    fn from(method: PaymentMethod) -> Self {
        match method {
            PaymentMethod::Cash => Self::Cash,
            PaymentMethod::Card => Self::Card,
            PaymentMethod::Upi => Self::Upi,
            PaymentMethod::Online => Self::Online,
            PaymentMethod::BankTransfer => Self::BankTransfer,
        }
    }
}

/// Status of an `Invoice`.
#[derive(Clone, Copy, Debug, GraphQLEnum)]
#[graphql(name = "InvoiceStatus")]
pub enum Status {
    /// Being prepared.
    Draft,

    /// Sent to the customer.
    Sent,

    /// Paid partially.
    Partial,

    /// Paid in full.
    Paid,

    /// Withdrawn.
    Cancelled,
}

impl From<invoice::Status> for Status {
    fn from(status: invoice::Status) -> Self {
        use invoice::Status as S;
        match status {
            S::Draft => Self::Draft,
            S::Sent => Self::Sent,
            S::Partial => Self::Partial,
            S::Paid => Self::Paid,
            S::Cancelled => Self::Cancelled,
        }
    }
}

impl From<Status> for invoice::Status {
    fn from(status: Status) -> Self {
        match status {
            Status::Draft => Self::Draft,
            Status::Sent => Self::Sent,
            Status::Partial => Self::Partial,
            Status::Paid => Self::Paid,
            Status::Cancelled => Self::Cancelled,
        }
    }
}

define_error! {
    enum InvoiceError {
        #[code = "INVOICE_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Invoice` with the provided ID does not exist"]
        NotExists,

        #[code = "INVOICE_FORBIDDEN"]
        #[status = FORBIDDEN]
        #[message = "Authenticated user is not permitted to act on the \
                     `Invoice`"]
        NotPermitted,
    }
}
