//! [`Invoice`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{define_kind, unit, DateTimeOf, Money};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    access::{Scope, Visible},
    fsm::Transition,
    order, product,
    rental::{self, Notes, Period, Quantity, Totals},
    sequence,
    user,
};
#[cfg(doc)]
use crate::domain::{Order, Product};

/// Bill of an [`Order`] along with the ledger of its [`Payment`]s.
#[derive(Clone, Debug)]
pub struct Invoice {
    /// ID of this [`Invoice`].
    pub id: Id,

    /// Human-readable number of this [`Invoice`].
    pub number: sequence::Number,

    /// ID of the invoiced [`Order`].
    pub order_id: order::Id,

    /// ID of the billed customer.
    pub customer_id: user::Id,

    /// ID of the billing vendor.
    pub vendor_id: user::Id,

    /// Invoiced [`Item`]s.
    pub items: Vec<Item>,

    /// [`Totals`] copied from the [`Order`].
    pub totals: Totals,

    /// Security deposit copied from the [`Order`].
    pub security_deposit: Money,

    /// Late return fee copied from the [`Order`].
    pub late_return_fee: Money,

    /// Sum of all the [`Payment`]s.
    pub paid_amount: Money,

    /// Amount still to be paid.
    pub balance_amount: Money,

    /// [`Status`] of this [`Invoice`].
    pub status: Status,

    /// Append-only list of [`Payment`]s.
    pub payments: Vec<Payment>,

    /// [`DateTime`] this [`Invoice`] should be paid until.
    pub due_at: DueDateTime,

    /// [`DateTime`] when this [`Invoice`] was issued.
    pub issued_at: IssueDateTime,

    /// [`Notes`] of this [`Invoice`].
    pub notes: Option<Notes>,

    /// [`DateTime`] when this [`Invoice`] was created.
    pub created_at: CreationDateTime,

    /// [`DateTime`] when this [`Invoice`] was updated last time.
    pub updated_at: UpdateDateTime,
}

impl Invoice {
    /// Records the provided [`Payment`] in the ledger of this [`Invoice`],
    /// recomputing its balance and [`Status`].
    ///
    /// # Errors
    ///
    /// - If this [`Invoice`] is paid or cancelled already.
    /// - If the [`Payment`] amount is not positive.
    /// - If the [`Payment`] is made in another currency.
    pub fn record_payment(
        &mut self,
        payment: Payment,
    ) -> Result<(), PaymentError> {
        if matches!(self.status, Status::Paid | Status::Cancelled) {
            return Err(PaymentError::InvoiceClosed);
        }
        if !payment.amount.is_positive() {
            return Err(PaymentError::NonPositiveAmount);
        }
        let paid_amount = self
            .paid_amount
            .checked_add(payment.amount)
            .ok_or(PaymentError::CurrencyMismatch)?;
        let balance_amount = self
            .totals
            .total_amount
            .checked_sub(paid_amount)
            .ok_or(PaymentError::CurrencyMismatch)?
            .clamp_to_zero();

        self.status = if balance_amount.is_zero() {
            Status::Paid
        } else {
            Status::Partial
        };
        self.paid_amount = paid_amount;
        self.balance_amount = balance_amount;
        self.updated_at = payment.paid_at.coerce();
        self.payments.push(payment);

        Ok(())
    }

    /// Returns the [`order::PaymentStatus`] matching the ledger of this
    /// [`Invoice`].
    #[must_use]
    pub fn order_payment_status(&self) -> order::PaymentStatus {
        if self.status == Status::Paid {
            order::PaymentStatus::Paid
        } else if self.paid_amount.is_positive() {
            order::PaymentStatus::Partial
        } else {
            order::PaymentStatus::Pending
        }
    }
}

impl Visible for Invoice {
    fn is_in(&self, scope: Scope) -> bool {
        scope.covers(self.customer_id, self.vendor_id)
    }
}

/// ID of an [`Invoice`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    PartialEq,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Invoiced line of an [`Invoice`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Item {
    /// ID of the invoiced [`Product`].
    pub product_id: product::Id,

    /// Name of the invoiced [`Product`] at the invoicing time.
    pub product_name: product::Name,

    /// Invoiced [`Quantity`].
    pub quantity: Quantity,

    /// Rental [`Period`].
    pub period: Period,

    /// Billed [`rental::Duration`].
    pub duration: rental::Duration,

    /// Price of a single unit of the [`rental::Duration`].
    pub price_per_unit: Money,

    /// Total price of this [`Item`].
    pub total_price: Money,
}

impl Item {
    /// Creates a new [`Item`] out of the provided rental line.
    #[must_use]
    pub fn new(line: &rental::Item, product_name: product::Name) -> Self {
        Self {
            product_id: line.product_id,
            product_name,
            quantity: line.quantity,
            period: line.period,
            duration: line.duration,
            price_per_unit: line.price_per_unit,
            total_price: line.total_price,
        }
    }

    /// Returns the human-readable rental period of this [`Item`].
    #[must_use]
    pub fn rental_period(&self) -> String {
        self.period.to_date_range()
    }
}

/// Payment recorded in an [`Invoice`] ledger.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Payment {
    /// ID of this [`Payment`].
    pub id: PaymentId,

    /// Paid amount.
    pub amount: Money,

    /// [`PaymentMethod`] used.
    pub method: PaymentMethod,

    /// ID of the transaction in an external payment system.
    pub transaction_id: Option<TransactionId>,

    /// [`DateTime`] when this [`Payment`] was recorded.
    pub paid_at: PaymentDateTime,

    /// [`Notes`] of this [`Payment`].
    pub notes: Option<Notes>,
}

/// ID of a [`Payment`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    PartialEq,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct PaymentId(Uuid);

impl PaymentId {
    /// Creates a new random [`PaymentId`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// ID of a transaction in an external payment system.
#[derive(AsRef, Clone, Debug, Display, Eq, Into, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct TransactionId(String);

impl TransactionId {
    /// Creates a new [`TransactionId`] if the provided one is not blank.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Option<Self> {
        let id = id.into();
        (!id.trim().is_empty()).then_some(Self(id))
    }
}

impl FromStr for TransactionId {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("blank `TransactionId`")
    }
}

define_kind! {
    #[doc = "Method of a [`Payment`]."]
    enum PaymentMethod {
        #[doc = "Cash."]
        Cash = 1,

        #[doc = "Debit or credit card."]
        Card = 2,

        #[doc = "Unified Payments Interface."]
        Upi = 3,

        #[doc = "Online payment system."]
        Online = 4,

        #[doc = "Bank transfer."]
        BankTransfer = 5,
    }
}

define_kind! {
    #[doc = "Status of an [`Invoice`]."]
    enum Status {
        #[doc = "Being prepared."]
        Draft = 1,

        #[doc = "Sent to the customer."]
        Sent = 2,

        #[doc = "Paid partially."]
        Partial = 3,

        #[doc = "Paid in full."]
        Paid = 4,

        #[doc = "Withdrawn."]
        Cancelled = 5,
    }
}

impl Transition for Status {
    fn allows(self, next: Self) -> bool {
        use Status as S;

        match self {
            S::Draft => {
                matches!(next, S::Sent | S::Partial | S::Paid | S::Cancelled)
            }
            S::Sent => matches!(next, S::Partial | S::Paid | S::Cancelled),
            S::Partial => matches!(next, S::Partial | S::Paid),
            S::Paid | S::Cancelled => false,
        }
    }
}

/// Error of recording a [`Payment`].
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum PaymentError {
    /// [`Invoice`] is paid or cancelled already.
    #[display("`Invoice` is closed for payments")]
    InvoiceClosed,

    /// [`Payment`] amount is zero or negative.
    #[display("`Payment` amount must be positive")]
    NonPositiveAmount,

    /// [`Payment`] is made in another currency.
    #[display("`Payment` currency mismatches the `Invoice` one")]
    CurrencyMismatch,
}

/// [`DateTime`] when an [`Invoice`] was created.
pub type CreationDateTime = DateTimeOf<(Invoice, unit::Creation)>;

/// [`DateTime`] when an [`Invoice`] was updated.
pub type UpdateDateTime = DateTimeOf<(Invoice, unit::Update)>;

/// [`DateTime`] an [`Invoice`] should be paid until.
pub type DueDateTime = DateTimeOf<(Invoice, unit::Expiration)>;

/// [`DateTime`] when an [`Invoice`] was issued.
pub type IssueDateTime = DateTimeOf<(Invoice, unit::Start)>;

/// [`DateTime`] when a [`Payment`] was recorded.
pub type PaymentDateTime = DateTimeOf<(Payment, unit::Creation)>;

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use common::{money::Currency, DateTime, Money, Percent};
    use rust_decimal::Decimal;

    use crate::domain::{
        fsm::Transition as _, order, rental::Totals, sequence, user,
    };

    use super::{
        Id, Invoice, Payment, PaymentError, PaymentId, PaymentMethod, Status,
    };

    fn inr(amount: &str) -> Money {
        Money {
            amount: Decimal::from_str(amount).unwrap(),
            currency: Currency::Inr,
        }
    }

    fn invoice(subtotal: &str) -> Invoice {
        let now = DateTime::now();
        let totals = Totals::compute(
            inr(subtotal),
            Percent::from_str("18").unwrap(),
        );
        Invoice {
            id: Id::new(),
            number: sequence::Kind::Invoice.number(1),
            order_id: order::Id::new(),
            customer_id: user::Id::new(),
            vendor_id: user::Id::new(),
            items: vec![],
            totals,
            security_deposit: inr("0"),
            late_return_fee: inr("0"),
            paid_amount: inr("0"),
            balance_amount: totals.total_amount,
            status: Status::Draft,
            payments: vec![],
            due_at: now.coerce(),
            issued_at: now.coerce(),
            notes: None,
            created_at: now.coerce(),
            updated_at: now.coerce(),
        }
    }

    fn payment(amount: Money) -> Payment {
        Payment {
            id: PaymentId::new(),
            amount,
            method: PaymentMethod::Upi,
            transaction_id: None,
            paid_at: DateTime::now().coerce(),
            notes: None,
        }
    }

    #[test]
    fn accumulates_partial_payments() {
        let mut inv = invoice("1000");
        assert_eq!(inv.totals.total_amount, inr("1180"));

        inv.record_payment(payment(inr("300"))).unwrap();
        inv.record_payment(payment(inr("400.50"))).unwrap();

        assert_eq!(inv.paid_amount, inr("700.50"));
        assert_eq!(inv.balance_amount, inr("479.50"));
        assert_eq!(inv.status, Status::Partial);
        assert_eq!(inv.payments.len(), 2);
        assert_eq!(inv.order_payment_status(), order::PaymentStatus::Partial);
    }

    #[test]
    fn becomes_paid_once_balance_is_covered() {
        let mut inv = invoice("1000");
        inv.record_payment(payment(inr("1180"))).unwrap();

        assert!(inv.balance_amount.is_zero());
        assert_eq!(inv.status, Status::Paid);
        assert_eq!(inv.order_payment_status(), order::PaymentStatus::Paid);
    }

    #[test]
    fn clamps_overpaid_balance_to_zero() {
        let mut inv = invoice("100");
        inv.record_payment(payment(inr("500"))).unwrap();

        assert_eq!(inv.paid_amount, inr("500"));
        assert_eq!(inv.balance_amount, inr("0"));
        assert_eq!(inv.status, Status::Paid);
    }

    #[test]
    fn rejects_invalid_payments() {
        let mut inv = invoice("100");

        assert_eq!(
            inv.record_payment(payment(inr("0"))),
            Err(PaymentError::NonPositiveAmount),
        );
        assert_eq!(
            inv.record_payment(payment(Money {
                amount: Decimal::ONE,
                currency: Currency::Usd,
            })),
            Err(PaymentError::CurrencyMismatch),
        );
        assert!(inv.payments.is_empty());

        inv.status = Status::Cancelled;
        assert_eq!(
            inv.record_payment(payment(inr("10"))),
            Err(PaymentError::InvoiceClosed),
        );
        assert_eq!(inv.order_payment_status(), order::PaymentStatus::Pending);
    }

    #[test]
    fn follows_transition_table() {
        use Status as S;

        assert!(S::Draft.allows(S::Sent));
        assert!(S::Sent.allows(S::Cancelled));
        assert!(S::Partial.allows(S::Partial));
        assert!(!S::Partial.allows(S::Cancelled));
        assert!(!S::Paid.allows(S::Sent));
        assert!(!S::Cancelled.allows(S::Draft));
    }
}
