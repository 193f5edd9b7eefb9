//! [`Command`] for recording a [`Payment`] of an [`Invoice`].

use common::{
    operations::{By, Commit, Lock, Select, Transact, Transacted, Update},
    DateTime, Money,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        invoice::{
            self, Payment, PaymentError, PaymentId, PaymentMethod,
            TransactionId,
        },
        order,
        rental::Notes,
        user::Actor,
        Invoice, Order,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for recording a [`Payment`] in an [`Invoice`] ledger.
///
/// The [`order::PaymentStatus`] of the invoiced [`Order`] follows the
/// ledger.
#[derive(Clone, Debug)]
pub struct AddInvoicePayment {
    /// ID of the paid [`Invoice`].
    pub invoice_id: invoice::Id,

    /// [`Actor`] recording the [`Payment`].
    pub actor: Actor,

    /// Paid amount.
    pub amount: Money,

    /// [`PaymentMethod`] used.
    pub method: PaymentMethod,

    /// ID of the transaction in an external payment system.
    pub transaction_id: Option<TransactionId>,

    /// [`Notes`] of the [`Payment`].
    pub notes: Option<Notes>,
}

impl<Db> Command<AddInvoicePayment> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Select<By<Option<Invoice>, invoice::Id>>,
            Ok = Option<Invoice>,
            Err = Traced<database::Error>,
        > + Database<
            Lock<By<Invoice, invoice::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Order>, order::Id>>,
            Ok = Option<Order>,
            Err = Traced<database::Error>,
        > + Database<Lock<By<Order, order::Id>>, Err = Traced<database::Error>>
        + Database<Update<Invoice>, Err = Traced<database::Error>>
        + Database<Update<Order>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Invoice;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: AddInvoicePayment,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let AddInvoicePayment {
            invoice_id,
            actor,
            amount,
            method,
            transaction_id,
            notes,
        } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Lock(By::<Invoice, _>::new(invoice_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        let mut invoice = tx
            .execute(Select(By::<Option<Invoice>, _>::new(invoice_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::InvoiceNotExists(invoice_id))
            .map_err(tracerr::wrap!())?;
        if !actor.participates(invoice.customer_id, invoice.vendor_id) {
            return Err(tracerr::new!(E::NotPermitted(invoice_id)));
        }

        invoice
            .record_payment(Payment {
                id: PaymentId::new(),
                amount,
                method,
                transaction_id,
                paid_at: DateTime::now().coerce(),
                notes,
            })
            .map_err(tracerr::from_and_wrap!(=> E))?;

        let order_id = invoice.order_id;
        tx.execute(Lock(By::<Order, _>::new(order_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        let mut order = tx
            .execute(Select(By::<Option<Order>, _>::new(order_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::OrderNotExists(order_id))
            .map_err(tracerr::wrap!())?;
        order.payment_status = invoice.order_payment_status();
        order.updated_at = invoice.updated_at.coerce();

        tx.execute(Update(invoice.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Update(order))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(invoice)
    }
}

/// Error of [`AddInvoicePayment`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Payment`] cannot be recorded.
    #[display("`Payment` is rejected: {_0}")]
    Payment(#[error(not(source))] PaymentError),

    /// [`Invoice`] with the provided ID does not exist.
    #[display("`Invoice(id: {_0})` does not exist")]
    #[from(ignore)]
    InvoiceNotExists(#[error(not(source))] invoice::Id),

    /// [`Order`] of the [`Invoice`] does not exist.
    #[display("`Order(id: {_0})` does not exist")]
    #[from(ignore)]
    OrderNotExists(#[error(not(source))] order::Id),

    /// [`Actor`] takes no part in the [`Invoice`].
    #[display("`Invoice(id: {_0})` cannot be paid by the user")]
    #[from(ignore)]
    NotPermitted(#[error(not(source))] invoice::Id),
}

#[cfg(test)]
mod spec {
    use common::operations::{By, Select};

    use crate::{
        command::CreateInvoice,
        domain::{
            invoice::{PaymentError, PaymentMethod, Status, TransactionId},
            order::PaymentStatus,
            Invoice, Order,
        },
        infra::{Database as _, Memory},
        testing, Command as _, Service,
    };

    use super::{AddInvoicePayment, ExecutionError};

    async fn invoice(svc: &Service<Memory>) -> Invoice {
        let vendor = testing::vendor();
        let drill = testing::product(svc, vendor.id, 5, 100).await;
        let window =
            testing::period("2024-03-01T00:00:00Z", "2024-03-03T00:00:00Z");
        let order =
            testing::order(svc, testing::customer(), &[(&drill, 2, window)])
                .await;
        svc.execute(CreateInvoice {
            order_id: order.id,
            actor: vendor,
            due_at: None,
            notes: None,
        })
        .await
        .unwrap()
    }

    fn pay(invoice: &Invoice, amount: &str) -> AddInvoicePayment {
        AddInvoicePayment {
            invoice_id: invoice.id,
            actor: testing::admin(),
            amount: testing::inr(amount),
            method: PaymentMethod::Upi,
            transaction_id: TransactionId::new("txn-42"),
            notes: None,
        }
    }

    async fn order_of(svc: &Service<Memory>, invoice: &Invoice) -> Order {
        svc.database()
            .execute(Select(By::<Option<Order>, _>::new(invoice.order_id)))
            .await
            .unwrap()
            .unwrap()
    }

    #[tokio::test]
    async fn cascades_ledger_into_order() {
        let svc = testing::service();
        let inv = invoice(&svc).await;
        assert_eq!(inv.totals.total_amount, testing::inr("472"));

        let inv = svc.execute(pay(&inv, "200")).await.unwrap();
        assert_eq!(inv.status, Status::Partial);
        assert_eq!(inv.balance_amount, testing::inr("272"));
        assert_eq!(
            order_of(&svc, &inv).await.payment_status,
            PaymentStatus::Partial,
        );

        let inv = svc.execute(pay(&inv, "272")).await.unwrap();
        assert_eq!(inv.status, Status::Paid);
        assert!(inv.balance_amount.is_zero());
        assert_eq!(inv.payments.len(), 2);
        assert_eq!(
            order_of(&svc, &inv).await.payment_status,
            PaymentStatus::Paid,
        );

        let err = svc.execute(pay(&inv, "1")).await.unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::Payment(PaymentError::InvoiceClosed),
        ));
    }

    #[tokio::test]
    async fn rejects_non_positive_amount_and_outsiders() {
        let svc = testing::service();
        let inv = invoice(&svc).await;

        let err = svc.execute(pay(&inv, "0")).await.unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::Payment(PaymentError::NonPositiveAmount),
        ));

        let err = svc
            .execute(AddInvoicePayment {
                actor: testing::customer(),
                ..pay(&inv, "10")
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::NotPermitted(_)));

        assert_eq!(
            order_of(&svc, &inv).await.payment_status,
            PaymentStatus::Pending,
        );
    }
}
