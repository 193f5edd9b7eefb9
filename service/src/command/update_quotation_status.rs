//! [`Command`] for changing [`quotation::Status`] of a [`Quotation`].

use common::{
    operations::{By, Commit, Lock, Select, Transact, Transacted, Update},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        access::Visible as _,
        fsm::{InvalidTransition, Transition as _},
        quotation,
        user::Actor,
        Quotation,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for moving a [`Quotation`] between [`quotation::Status::Draft`],
/// [`quotation::Status::Sent`] and [`quotation::Status::Cancelled`].
///
/// [`quotation::Status::Confirmed`] is reached via [`ConfirmQuotation`], and
/// [`quotation::Status::Expired`] via expiration only.
///
/// [`ConfirmQuotation`]: super::ConfirmQuotation
#[derive(Clone, Copy, Debug)]
pub struct UpdateQuotationStatus {
    /// ID of the [`Quotation`] to update.
    pub quotation_id: quotation::Id,

    /// [`Actor`] performing the update.
    pub actor: Actor,

    /// New [`quotation::Status`].
    pub status: quotation::Status,
}

impl<Db> Command<UpdateQuotationStatus> for Service<Db>
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
        cmd: UpdateQuotationStatus,
    ) -> Result<Self::Ok, Self::Err> {
        use quotation::Status as S;
        use ExecutionError as E;

        let UpdateQuotationStatus {
            quotation_id,
            actor,
            status,
        } = cmd;

        if !matches!(status, S::Draft | S::Sent | S::Cancelled) {
            return Err(tracerr::new!(E::UnsettableStatus(status)));
        }

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
        if !quotation.is_visible_to(&actor) {
            return Err(tracerr::new!(E::NotPermitted(quotation_id)));
        }

        quotation.status = quotation
            .status
            .advance(status)
            .map_err(tracerr::from_and_wrap!(=> E))?;
        quotation.updated_at = DateTime::now().coerce();

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

/// Error of [`UpdateQuotationStatus`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`quotation::Status`] cannot be set directly.
    #[display("`{_0}` status cannot be set directly")]
    #[from(ignore)]
    UnsettableStatus(#[error(not(source))] quotation::Status),

    /// [`quotation::Status`] transition is not allowed.
    #[display("Invalid `Quotation` status change: {_0}")]
    InvalidTransition(
        #[error(not(source))] InvalidTransition<quotation::Status>,
    ),

    /// [`Quotation`] with the provided ID does not exist.
    #[display("`Quotation(id: {_0})` does not exist")]
    #[from(ignore)]
    QuotationNotExists(#[error(not(source))] quotation::Id),

    /// [`Actor`] is not allowed to access the [`Quotation`].
    #[display("`Quotation(id: {_0})` is not accessible by the user")]
    #[from(ignore)]
    NotPermitted(#[error(not(source))] quotation::Id),
}

#[cfg(test)]
mod spec {
    use crate::{domain::quotation::Status, testing, Command as _};

    use super::{ExecutionError, UpdateQuotationStatus};

    #[tokio::test]
    async fn moves_along_transition_table() {
        let svc = testing::service();
        let vendor = testing::vendor();
        let customer = testing::customer();
        let drill = testing::product(&svc, vendor.id, 5, 100).await;
        let window =
            testing::period("2024-03-01T00:00:00Z", "2024-03-03T00:00:00Z");
        let q = testing::quotation(&svc, customer, &[(&drill, 1, window)]).await;

        for (actor, status) in [
            (vendor, Status::Sent),
            (customer, Status::Draft),
            (customer, Status::Cancelled),
        ] {
            let updated = svc
                .execute(UpdateQuotationStatus {
                    quotation_id: q.id,
                    actor,
                    status,
                })
                .await
                .unwrap();
            assert_eq!(updated.status, status);
        }

        let err = svc
            .execute(UpdateQuotationStatus {
                quotation_id: q.id,
                actor: customer,
                status: Status::Draft,
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::InvalidTransition(_)));
    }

    #[tokio::test]
    async fn rejects_derived_statuses_and_strangers() {
        let svc = testing::service();
        let vendor = testing::vendor();
        let customer = testing::customer();
        let drill = testing::product(&svc, vendor.id, 5, 100).await;
        let window =
            testing::period("2024-03-01T00:00:00Z", "2024-03-03T00:00:00Z");
        let q = testing::quotation(&svc, customer, &[(&drill, 1, window)]).await;

        for status in [Status::Confirmed, Status::Expired] {
            let err = svc
                .execute(UpdateQuotationStatus {
                    quotation_id: q.id,
                    actor: customer,
                    status,
                })
                .await
                .unwrap_err();
            assert!(matches!(
                err.as_ref(),
                ExecutionError::UnsettableStatus(_),
            ));
        }

        let err = svc
            .execute(UpdateQuotationStatus {
                quotation_id: q.id,
                actor: testing::vendor(),
                status: Status::Sent,
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::NotPermitted(_)));
    }
}
