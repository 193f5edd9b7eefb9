//! [`Command`] for cancelling a [`Pickup`].

use common::operations::{By, Commit, Lock, Select, Transact, Transacted, Update};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        fsm::{InvalidTransition, Transition as _},
        pickup::{self, Status},
        user::Actor,
        Pickup,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for cancelling a scheduled [`Pickup`].
#[derive(Clone, Copy, Debug)]
pub struct CancelPickup {
    /// ID of the [`Pickup`] to cancel.
    pub pickup_id: pickup::Id,

    /// [`Actor`] cancelling the [`Pickup`].
    pub actor: Actor,
}

impl<Db> Command<CancelPickup> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Select<By<Option<Pickup>, pickup::Id>>,
            Ok = Option<Pickup>,
            Err = Traced<database::Error>,
        > + Database<
            Lock<By<Pickup, pickup::Id>>,
            Err = Traced<database::Error>,
        > + Database<Update<Pickup>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Pickup;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CancelPickup) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CancelPickup { pickup_id, actor } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Lock(By::new(pickup_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        let mut pickup = tx
            .execute(Select(By::<Option<Pickup>, _>::new(pickup_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::PickupNotExists(pickup_id))
            .map_err(tracerr::wrap!())?;
        if !actor.is_vendor_or_admin(pickup.vendor_id) {
            return Err(tracerr::new!(E::NotPermitted(pickup_id)));
        }

        pickup.status = pickup
            .status
            .advance(Status::Cancelled)
            .map_err(tracerr::from_and_wrap!(=> E))?;

        tx.execute(Update(pickup.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(pickup)
    }
}

/// Error of [`CancelPickup`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Status`] transition is not allowed.
    #[display("Invalid `Pickup` status change: {_0}")]
    InvalidTransition(#[error(not(source))] InvalidTransition<Status>),

    /// [`Pickup`] with the provided ID does not exist.
    #[display("`Pickup(id: {_0})` does not exist")]
    #[from(ignore)]
    PickupNotExists(#[error(not(source))] pickup::Id),

    /// [`Actor`] is not the vendor of the [`Pickup`].
    #[display("`Pickup(id: {_0})` cannot be cancelled by the user")]
    #[from(ignore)]
    NotPermitted(#[error(not(source))] pickup::Id),
}

#[cfg(test)]
mod spec {
    use common::DateTime;

    use crate::{
        command::{complete_pickup, CompletePickup, CreatePickup},
        domain::pickup::Status,
        testing, Command as _,
    };

    use super::{CancelPickup, ExecutionError};

    #[tokio::test]
    async fn cancels_scheduled_pickup_once() {
        let svc = testing::service();
        let vendor = testing::vendor();
        let customer = testing::customer();
        let drill = testing::product(&svc, vendor.id, 5, 100).await;
        let window =
            testing::period("2024-03-01T00:00:00Z", "2024-03-03T00:00:00Z");
        let order =
            testing::order(&svc, customer, &[(&drill, 1, window)]).await;
        let pickup = svc
            .execute(CreatePickup {
                order_id: order.id,
                actor: vendor,
                scheduled_at: DateTime::now().coerce(),
                instructions: None,
            })
            .await
            .unwrap();
        let cancel = CancelPickup {
            pickup_id: pickup.id,
            actor: vendor,
        };

        assert_eq!(
            svc.execute(cancel).await.unwrap().status,
            Status::Cancelled,
        );

        let err = svc.execute(cancel).await.unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::InvalidTransition(_)));

        let err = svc
            .execute(CompletePickup {
                pickup_id: pickup.id,
                actor: vendor,
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            complete_pickup::ExecutionError::PickupNotScheduled(
                _,
                Status::Cancelled,
            ),
        ));
    }
}
