//! [`Command`] for confirming a [`Quotation`].

use common::{
    operations::{By, Commit, Lock, Select, Transact, Transacted, Update},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        fsm::{InvalidTransition, Transition as _},
        quotation,
        user::Actor,
        Quotation,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for accepting a [`Quotation`] by its customer.
///
/// An outdated [`Quotation`] is expired instead.
#[derive(Clone, Copy, Debug)]
pub struct ConfirmQuotation {
    /// ID of the [`Quotation`] to confirm.
    pub quotation_id: quotation::Id,

    /// [`Actor`] confirming the [`Quotation`].
    pub actor: Actor,
}

impl<Db> Command<ConfirmQuotation> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Select<By<Option<Quotation>, quotation::Id>>,
            Ok = Option<Quotation>,
            Err = Traced<database::Error>,
        > + Database<
            Lock<By<Quotation, quotation::Id>>,
            Err = Traced<database::Error>,
        > + Database<Update<Quotation>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Quotation;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: ConfirmQuotation,
    ) -> Result<Self::Ok, Self::Err> {
        use quotation::Status as S;
        use ExecutionError as E;

        let ConfirmQuotation {
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
        let mut quotation = tx
            .execute(Select(By::<Option<Quotation>, _>::new(quotation_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::QuotationNotExists(quotation_id))
            .map_err(tracerr::wrap!())?;
        if !actor.is_customer_or_admin(quotation.customer_id) {
            return Err(tracerr::new!(E::NotOwner(quotation_id)));
        }
        if quotation.status == S::Confirmed {
            return Err(tracerr::new!(E::AlreadyConfirmed(quotation_id)));
        }

        let now = DateTime::now();
        if quotation.status == S::Expired {
            return Err(tracerr::new!(E::QuotationExpired(quotation_id)));
        }
        if quotation.is_outdated_at(now) && quotation.status.allows(S::Expired)
        {
            quotation.status = S::Expired;
            quotation.updated_at = now.coerce();
            tx.execute(Update(quotation))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))
                .map(drop)?;
            tx.execute(Commit)
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))
                .map(drop)?;
            return Err(tracerr::new!(E::QuotationExpired(quotation_id)));
        }

        quotation.status = quotation
            .status
            .advance(S::Confirmed)
            .map_err(tracerr::from_and_wrap!(=> E))?;
        quotation.updated_at = now.coerce();

        tx.execute(Update(quotation.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(quotation)
    }
}

/// Error of [`ConfirmQuotation`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`quotation::Status`] transition is not allowed.
    #[display("Invalid `Quotation` status change: {_0}")]
    InvalidTransition(
        #[error(not(source))] InvalidTransition<quotation::Status>,
    ),

    /// [`Quotation`] with the provided ID does not exist.
    #[display("`Quotation(id: {_0})` does not exist")]
    #[from(ignore)]
    QuotationNotExists(#[error(not(source))] quotation::Id),

    /// [`Actor`] doesn't own the [`Quotation`].
    #[display("`Quotation(id: {_0})` is not owned by the user")]
    #[from(ignore)]
    NotOwner(#[error(not(source))] quotation::Id),

    /// [`Quotation`] is confirmed already.
    #[display("`Quotation(id: {_0})` is confirmed already")]
    #[from(ignore)]
    AlreadyConfirmed(#[error(not(source))] quotation::Id),

    /// [`Quotation`] validity is over, so it has been expired.
    #[display("`Quotation(id: {_0})` has expired")]
    #[from(ignore)]
    QuotationExpired(#[error(not(source))] quotation::Id),
}

#[cfg(test)]
mod spec {
    use std::time;

    use common::{
        operations::{By, Select, Update},
        DateTime,
    };

    use crate::{
        domain::{quotation::Status, Quotation},
        infra::Database as _,
        testing, Command as _,
    };

    use super::{ConfirmQuotation, ExecutionError};

    #[tokio::test]
    async fn confirms_once() {
        let svc = testing::service();
        let vendor = testing::vendor();
        let customer = testing::customer();
        let drill = testing::product(&svc, vendor.id, 5, 100).await;
        let window =
            testing::period("2024-03-01T00:00:00Z", "2024-03-03T00:00:00Z");
        let q = testing::quotation(&svc, customer, &[(&drill, 1, window)]).await;
        let cmd = ConfirmQuotation {
            quotation_id: q.id,
            actor: customer,
        };

        assert_eq!(svc.execute(cmd).await.unwrap().status, Status::Confirmed);

        let err = svc.execute(cmd).await.unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::AlreadyConfirmed(_)));
    }

    #[tokio::test]
    async fn allows_owner_only() {
        let svc = testing::service();
        let vendor = testing::vendor();
        let customer = testing::customer();
        let drill = testing::product(&svc, vendor.id, 5, 100).await;
        let window =
            testing::period("2024-03-01T00:00:00Z", "2024-03-03T00:00:00Z");
        let q = testing::quotation(&svc, customer, &[(&drill, 1, window)]).await;

        for actor in [vendor, testing::customer()] {
            let err = svc
                .execute(ConfirmQuotation {
                    quotation_id: q.id,
                    actor,
                })
                .await
                .unwrap_err();
            assert!(matches!(err.as_ref(), ExecutionError::NotOwner(_)));
        }
    }

    #[tokio::test]
    async fn expires_outdated_quotation() {
        let svc = testing::service();
        let vendor = testing::vendor();
        let customer = testing::customer();
        let drill = testing::product(&svc, vendor.id, 5, 100).await;
        let window =
            testing::period("2024-03-01T00:00:00Z", "2024-03-03T00:00:00Z");
        let mut q =
            testing::quotation(&svc, customer, &[(&drill, 1, window)]).await;
        q.valid_until =
            (DateTime::now() - time::Duration::from_secs(1)).coerce();
        svc.database().execute(Update(q.clone())).await.unwrap();

        let err = svc
            .execute(ConfirmQuotation {
                quotation_id: q.id,
                actor: customer,
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::QuotationExpired(_)));

        let stored = svc
            .database()
            .execute(Select(By::<Option<Quotation>, _>::new(q.id)))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, Status::Expired);
    }

    #[tokio::test]
    async fn rejects_already_expired_quotation() {
        let svc = testing::service();
        let vendor = testing::vendor();
        let customer = testing::customer();
        let drill = testing::product(&svc, vendor.id, 5, 100).await;
        let window =
            testing::period("2024-03-01T00:00:00Z", "2024-03-03T00:00:00Z");
        let mut q =
            testing::quotation(&svc, customer, &[(&drill, 1, window)]).await;
        q.valid_until =
            (DateTime::now() - time::Duration::from_secs(1)).coerce();
        q.status = Status::Expired;
        svc.database().execute(Update(q.clone())).await.unwrap();

        let err = svc
            .execute(ConfirmQuotation {
                quotation_id: q.id,
                actor: customer,
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::QuotationExpired(_)));
    }
}
