//! [`Command`] for changing an [`Invoice`] [`Status`].

use common::{
    operations::{By, Commit, Lock, Select, Transact, Transacted, Update},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        fsm::{InvalidTransition, Transition as _},
        invoice::{self, Status},
        user::Actor,
        Invoice,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for sending or cancelling an [`Invoice`] by its vendor.
///
/// Payment [`Status`]es follow the ledger and cannot be set this way.
#[derive(Clone, Copy, Debug)]
pub struct UpdateInvoiceStatus {
    /// ID of the [`Invoice`] to update.
    pub invoice_id: invoice::Id,

    /// [`Actor`] updating the [`Invoice`].
    pub actor: Actor,

    /// New [`Status`] of the [`Invoice`].
    pub status: Status,
}

impl<Db> Command<UpdateInvoiceStatus> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Select<By<Option<Invoice>, invoice::Id>>,
            Ok = Option<Invoice>,
            Err = Traced<database::Error>,
        > + Database<
            Lock<By<Invoice, invoice::Id>>,
            Err = Traced<database::Error>,
        > + Database<Update<Invoice>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Invoice;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: UpdateInvoiceStatus,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let UpdateInvoiceStatus {
            invoice_id,
            actor,
            status,
        } = cmd;

        if !matches!(status, Status::Sent | Status::Cancelled) {
            return Err(tracerr::new!(E::UnsettableStatus(status)));
        }

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Lock(By::new(invoice_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        let mut invoice = tx
            .execute(Select(By::<Option<Invoice>, _>::new(invoice_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::InvoiceNotExists(invoice_id))
            .map_err(tracerr::wrap!())?;
        if !actor.is_vendor_or_admin(invoice.vendor_id) {
            return Err(tracerr::new!(E::NotPermitted(invoice_id)));
        }

        invoice.status = invoice
            .status
            .advance(status)
            .map_err(tracerr::from_and_wrap!(=> E))?;
        invoice.updated_at = DateTime::now().coerce();

        tx.execute(Update(invoice.clone()))
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

/// Error of [`UpdateInvoiceStatus`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Status`] transition is not allowed.
    #[display("Invalid `Invoice` status change: {_0}")]
    InvalidTransition(#[error(not(source))] InvalidTransition<Status>),

    /// [`Status`] is derived from the [`Invoice`] ledger.
    #[display("`Invoice` cannot be set to `{_0}` directly")]
    #[from(ignore)]
    UnsettableStatus(#[error(not(source))] Status),

    /// [`Invoice`] with the provided ID does not exist.
    #[display("`Invoice(id: {_0})` does not exist")]
    #[from(ignore)]
    InvoiceNotExists(#[error(not(source))] invoice::Id),

    /// [`Actor`] is not the vendor of the [`Invoice`].
    #[display("`Invoice(id: {_0})` cannot be updated by the user")]
    #[from(ignore)]
    NotPermitted(#[error(not(source))] invoice::Id),
}

#[cfg(test)]
mod spec {
    use crate::{
        command::CreateInvoice, domain::invoice::Status, testing,
        Command as _,
    };

    use super::{ExecutionError, UpdateInvoiceStatus};

    #[tokio::test]
    async fn sends_and_cancels_only() {
        let svc = testing::service();
        let vendor = testing::vendor();
        let customer = testing::customer();
        let drill = testing::product(&svc, vendor.id, 5, 100).await;
        let window =
            testing::period("2024-03-01T00:00:00Z", "2024-03-03T00:00:00Z");
        let order =
            testing::order(&svc, customer, &[(&drill, 1, window)]).await;
        let invoice = svc
            .execute(CreateInvoice {
                order_id: order.id,
                actor: vendor,
                due_at: None,
                notes: None,
            })
            .await
            .unwrap();
        let set = |actor, status| UpdateInvoiceStatus {
            invoice_id: invoice.id,
            actor,
            status,
        };

        let err = svc.execute(set(vendor, Status::Paid)).await.unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::UnsettableStatus(_)));

        let err = svc.execute(set(customer, Status::Sent)).await.unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::NotPermitted(_)));

        for status in [Status::Sent, Status::Cancelled] {
            let invoice = svc.execute(set(vendor, status)).await.unwrap();
            assert_eq!(invoice.status, status);
        }

        let err = svc.execute(set(vendor, Status::Sent)).await.unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::InvalidTransition(_)));
    }
}
