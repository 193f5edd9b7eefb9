//! [`Command`] for invoicing an [`Order`].

use std::collections::HashMap;

use common::{
    operations::{By, Commit, Insert, Lock, Next, Select, Transact, Transacted},
    DateTime, Money,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        invoice, order, product,
        rental::Notes,
        sequence,
        user::Actor,
        Invoice, Order, Product,
    },
    infra::{database::{self, INVOICE_ORDER_UNIQUE}, Database},
    Service,
};

use super::Command;

/// [`Command`] for issuing the single [`Invoice`] of an [`Order`].
#[derive(Clone, Debug)]
pub struct CreateInvoice {
    /// ID of the [`Order`] to invoice.
    pub order_id: order::Id,

    /// [`Actor`] issuing the [`Invoice`].
    pub actor: Actor,

    /// [`DateTime`] the [`Invoice`] should be paid until.
    ///
    /// Configured payment term from now, if [`None`].
    pub due_at: Option<invoice::DueDateTime>,

    /// [`Notes`] of the [`Invoice`].
    pub notes: Option<Notes>,
}

impl<Db> Command<CreateInvoice> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Select<By<Option<Order>, order::Id>>,
            Ok = Option<Order>,
            Err = Traced<database::Error>,
        > + Database<Lock<By<Order, order::Id>>, Err = Traced<database::Error>>
        + Database<
            Select<By<Option<Invoice>, order::Id>>,
            Ok = Option<Invoice>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<HashMap<product::Id, Product>, Vec<product::Id>>>,
            Ok = HashMap<product::Id, Product>,
            Err = Traced<database::Error>,
        > + Database<
            Next<sequence::Kind>,
            Ok = sequence::Number,
            Err = Traced<database::Error>,
        > + Database<Insert<Invoice>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Invoice;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CreateInvoice,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateInvoice {
            order_id,
            actor,
            due_at,
            notes,
        } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Lock(By::<Order, _>::new(order_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        let order = tx
            .execute(Select(By::<Option<Order>, _>::new(order_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::OrderNotExists(order_id))
            .map_err(tracerr::wrap!())?;
        if !actor.is_vendor_or_admin(order.vendor_id) {
            return Err(tracerr::new!(E::NotPermitted(order_id)));
        }
        if order.status == order::Status::Cancelled {
            return Err(tracerr::new!(E::OrderCancelled(order_id)));
        }
        if tx
            .execute(Select(By::<Option<Invoice>, _>::new(order_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .is_some()
        {
            return Err(tracerr::new!(E::AlreadyInvoiced(order_id)));
        }

        let products = tx
            .execute(Select(By::new(
                order.items.iter().map(|i| i.product_id).collect::<Vec<_>>(),
            )))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        let items = order
            .items
            .iter()
            .map(|i| {
                products
                    .get(&i.product_id)
                    .map(|p| invoice::Item::new(i, p.name.clone()))
                    .ok_or(E::ProductNotExists(i.product_id))
            })
            .collect::<Result<Vec<_>, _>>()
            .map_err(tracerr::wrap!())?;

        let number = tx
            .execute(Next(sequence::Kind::Invoice))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let now = DateTime::now();
        let currency = order.totals.total_amount.currency;
        let invoice = Invoice {
            id: invoice::Id::new(),
            number,
            order_id,
            customer_id: order.customer_id,
            vendor_id: order.vendor_id,
            items,
            totals: order.totals,
            security_deposit: order.security_deposit,
            late_return_fee: order.late_return_fee,
            paid_amount: Money::zero(currency),
            balance_amount: order.totals.total_amount,
            status: invoice::Status::Draft,
            payments: vec![],
            due_at: due_at.unwrap_or_else(|| {
                (now + self.config().terms.invoice_due).coerce()
            }),
            issued_at: now.coerce(),
            notes,
            created_at: now.coerce(),
            updated_at: now.coerce(),
        };
        let inserted = tx.execute(Insert(invoice.clone())).await;
        if let Err(e) = &inserted {
            if e.as_ref().is_unique_violation(Some(INVOICE_ORDER_UNIQUE)) {
                return Err(tracerr::new!(E::AlreadyInvoiced(order_id)));
            }
        }
        inserted.map_err(tracerr::map_from_and_wrap!(=> E)).map(drop)?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(invoice)
    }
}

/// Error of [`CreateInvoice`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Order`] with the provided ID does not exist.
    #[display("`Order(id: {_0})` does not exist")]
    #[from(ignore)]
    OrderNotExists(#[error(not(source))] order::Id),

    /// [`Actor`] is not the vendor of the [`Order`].
    #[display("`Order(id: {_0})` cannot be invoiced by the user")]
    #[from(ignore)]
    NotPermitted(#[error(not(source))] order::Id),

    /// [`Order`] is cancelled.
    #[display("`Order(id: {_0})` is cancelled")]
    #[from(ignore)]
    OrderCancelled(#[error(not(source))] order::Id),

    /// [`Order`] is invoiced already.
    #[display("`Order(id: {_0})` is invoiced already")]
    #[from(ignore)]
    AlreadyInvoiced(#[error(not(source))] order::Id),

    /// Invoiced [`Product`] does not exist.
    #[display("`Product(id: {_0})` does not exist")]
    #[from(ignore)]
    ProductNotExists(#[error(not(source))] product::Id),
}

#[cfg(test)]
mod spec {
    use common::DateTime;

    use crate::{
        command::CancelOrder,
        domain::invoice::Status,
        testing, Command as _,
    };

    use super::{CreateInvoice, ExecutionError};

    #[tokio::test]
    async fn copies_order_totals() {
        let svc = testing::service();
        let vendor = testing::vendor();
        let customer = testing::customer();
        let drill = testing::product(&svc, vendor.id, 5, 100).await;
        let window =
            testing::period("2024-03-01T00:00:00Z", "2024-03-03T00:00:00Z");
        let order =
            testing::order(&svc, customer, &[(&drill, 2, window)]).await;

        let invoice = svc
            .execute(CreateInvoice {
                order_id: order.id,
                actor: vendor,
                due_at: None,
                notes: None,
            })
            .await
            .unwrap();

        assert_eq!(invoice.number.to_string(), "INV000001");
        assert_eq!(invoice.status, Status::Draft);
        assert_eq!(invoice.totals, order.totals);
        assert_eq!(invoice.totals.total_amount, testing::inr("472"));
        assert_eq!(invoice.balance_amount, invoice.totals.total_amount);
        assert!(invoice.paid_amount.is_zero());
        let (due, issued): (DateTime, DateTime) =
            (invoice.due_at.coerce(), invoice.issued_at.coerce());
        assert!(due > issued);
        assert_eq!(invoice.items.len(), 1);
        assert_eq!(invoice.items[0].product_name, drill.name);
        assert_eq!(invoice.items[0].rental_period(), "2024-03-01 - 2024-03-03");
    }

    #[tokio::test]
    async fn invoices_order_once() {
        let svc = testing::service();
        let vendor = testing::vendor();
        let customer = testing::customer();
        let drill = testing::product(&svc, vendor.id, 5, 100).await;
        let window =
            testing::period("2024-03-01T00:00:00Z", "2024-03-03T00:00:00Z");
        let order =
            testing::order(&svc, customer, &[(&drill, 1, window)]).await;
        let create = || CreateInvoice {
            order_id: order.id,
            actor: vendor,
            due_at: None,
            notes: None,
        };

        let err = svc
            .execute(CreateInvoice {
                actor: customer,
                ..create()
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::NotPermitted(_)));

        _ = svc.execute(create()).await.unwrap();
        let err = svc.execute(create()).await.unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::AlreadyInvoiced(_)));
    }

    #[tokio::test]
    async fn rejects_cancelled_order() {
        let svc = testing::service();
        let vendor = testing::vendor();
        let customer = testing::customer();
        let drill = testing::product(&svc, vendor.id, 5, 100).await;
        let window =
            testing::period("2024-03-01T00:00:00Z", "2024-03-03T00:00:00Z");
        let order =
            testing::order(&svc, customer, &[(&drill, 1, window)]).await;
        _ = svc
            .execute(CancelOrder {
                order_id: order.id,
                actor: customer,
            })
            .await
            .unwrap();

        let err = svc
            .execute(CreateInvoice {
                order_id: order.id,
                actor: vendor,
                due_at: None,
                notes: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::OrderCancelled(_)));
    }
}
