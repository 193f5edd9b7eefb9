//! [`Command`] for deleting a [`Quotation`].

use common::operations::{
    By, Commit, Delete, Lock, Select, Transact, Transacted,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{quotation, user::Actor, Quotation},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for deleting a [`Quotation`] which hasn't led anywhere.
///
/// Only [`quotation::Status::Draft`], [`quotation::Status::Cancelled`] and
/// [`quotation::Status::Expired`] [`Quotation`]s may be deleted.
#[derive(Clone, Copy, Debug)]
pub struct DeleteQuotation {
    /// ID of the [`Quotation`] to delete.
    pub quotation_id: quotation::Id,

    /// [`Actor`] deleting the [`Quotation`].
    pub actor: Actor,
}

impl<Db> Command<DeleteQuotation> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Select<By<Option<Quotation>, quotation::Id>>,
            Ok = Option<Quotation>,
            Err = Traced<database::Error>,
        > + Database<
            Lock<By<Quotation, quotation::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Delete<By<Quotation, quotation::Id>>,
            Err = Traced<database::Error>,
        > + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: DeleteQuotation,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let DeleteQuotation {
            quotation_id,
            actor,
        } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Lock(By::new(quotation_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        let quotation = tx
            .execute(Select(By::<Option<Quotation>, _>::new(quotation_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::QuotationNotExists(quotation_id))
            .map_err(tracerr::wrap!())?;
        if !actor.is_customer_or_admin(quotation.customer_id) {
            return Err(tracerr::new!(E::NotOwner(quotation_id)));
        }
        if !quotation.is_deletable() {
            return Err(tracerr::new!(E::QuotationNotDeletable(
                quotation_id,
                quotation.status,
            )));
        }

        tx.execute(Delete(By::new(quotation_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)
    }
}

/// Error of [`DeleteQuotation`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Quotation`] with the provided ID does not exist.
    #[display("`Quotation(id: {_0})` does not exist")]
    #[from(ignore)]
    QuotationNotExists(#[error(not(source))] quotation::Id),

    /// [`Actor`] doesn't own the [`Quotation`].
    #[display("`Quotation(id: {_0})` is not owned by the user")]
    #[from(ignore)]
    NotOwner(#[error(not(source))] quotation::Id),

    /// [`Quotation`] is in a [`quotation::Status`] forbidding deletion.
    #[display("`Quotation(id: {_0})` is `{_1}` and cannot be deleted")]
    #[from(ignore)]
    QuotationNotDeletable(
        #[error(not(source))] quotation::Id,
        #[error(not(source))] quotation::Status,
    ),
}

#[cfg(test)]
mod spec {
    use common::operations::{By, Select};

    use crate::{
        command::ConfirmQuotation,
        domain::{quotation::Status, Quotation},
        infra::Database as _,
        testing, Command as _,
    };

    use super::{DeleteQuotation, ExecutionError};

    #[tokio::test]
    async fn deletes_own_draft() {
        let svc = testing::service();
        let vendor = testing::vendor();
        let customer = testing::customer();
        let drill = testing::product(&svc, vendor.id, 5, 100).await;
        let window =
            testing::period("2024-03-01T00:00:00Z", "2024-03-03T00:00:00Z");
        let q = testing::quotation(&svc, customer, &[(&drill, 1, window)]).await;

        let err = svc
            .execute(DeleteQuotation {
                quotation_id: q.id,
                actor: vendor,
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::NotOwner(_)));

        svc.execute(DeleteQuotation {
            quotation_id: q.id,
            actor: customer,
        })
        .await
        .unwrap();
        assert!(svc
            .database()
            .execute(Select(By::<Option<Quotation>, _>::new(q.id)))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn keeps_confirmed_quotation() {
        let svc = testing::service();
        let vendor = testing::vendor();
        let customer = testing::customer();
        let drill = testing::product(&svc, vendor.id, 5, 100).await;
        let window =
            testing::period("2024-03-01T00:00:00Z", "2024-03-03T00:00:00Z");
        let q = testing::quotation(&svc, customer, &[(&drill, 1, window)]).await;
        _ = svc
            .execute(ConfirmQuotation {
                quotation_id: q.id,
                actor: customer,
            })
            .await
            .unwrap();

        let err = svc
            .execute(DeleteQuotation {
                quotation_id: q.id,
                actor: testing::admin(),
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::QuotationNotDeletable(_, Status::Confirmed),
        ));
    }
}
