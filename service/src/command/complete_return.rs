//! [`Command`] for completing a [`Return`].

use common::{
    operations::{By, Commit, Lock, Select, Transact, Transacted, Update},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        fsm::{InvalidTransition, Transition as _},
        rental_return::{self, Status},
        user::Actor,
        Return,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for completing an inspection of the [`Return`]ed items.
#[derive(Clone, Copy, Debug)]
pub struct CompleteReturn {
    /// ID of the [`Return`] to complete.
    pub return_id: rental_return::Id,

    /// [`Actor`] completing the [`Return`].
    pub actor: Actor,
}

impl<Db> Command<CompleteReturn> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Select<By<Option<Return>, rental_return::Id>>,
            Ok = Option<Return>,
            Err = Traced<database::Error>,
        > + Database<
            Lock<By<Return, rental_return::Id>>,
            Err = Traced<database::Error>,
        > + Database<Update<Return>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Return;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CompleteReturn,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CompleteReturn { return_id, actor } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Lock(By::new(return_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        let mut ret = tx
            .execute(Select(By::<Option<Return>, _>::new(return_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::ReturnNotExists(return_id))
            .map_err(tracerr::wrap!())?;
        if !actor.is_vendor_or_admin(ret.vendor_id) {
            return Err(tracerr::new!(E::NotPermitted(return_id)));
        }

        ret.status = ret
            .status
            .advance(Status::Completed)
            .map_err(tracerr::from_and_wrap!(=> E))?;
        ret.completed_at = Some(DateTime::now().coerce());

        tx.execute(Update(ret.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(ret)
    }
}

/// Error of [`CompleteReturn`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Status`] transition is not allowed.
    #[display("Invalid `Return` status change: {_0}")]
    InvalidTransition(#[error(not(source))] InvalidTransition<Status>),

    /// [`Return`] with the provided ID does not exist.
    #[display("`Return(id: {_0})` does not exist")]
    #[from(ignore)]
    ReturnNotExists(#[error(not(source))] rental_return::Id),

    /// [`Actor`] is not the vendor of the [`Return`].
    #[display("`Return(id: {_0})` cannot be completed by the user")]
    #[from(ignore)]
    NotPermitted(#[error(not(source))] rental_return::Id),
}

#[cfg(test)]
mod spec {
    use crate::{
        command::{CreateReturn, UpdateOrderStatus},
        domain::{order, rental_return::Status},
        testing, Command as _,
    };

    use super::{CompleteReturn, ExecutionError};

    #[tokio::test]
    async fn completes_inspection_once() {
        let svc = testing::service();
        let vendor = testing::vendor();
        let customer = testing::customer();
        let drill = testing::product(&svc, vendor.id, 5, 100).await;
        let window =
            testing::period("2999-03-01T00:00:00Z", "2999-03-03T00:00:00Z");
        let order =
            testing::order(&svc, customer, &[(&drill, 1, window)]).await;
        _ = svc
            .execute(UpdateOrderStatus {
                order_id: order.id,
                actor: vendor,
                status: order::Status::PickedUp,
            })
            .await
            .unwrap();
        let ret = svc
            .execute(CreateReturn {
                order_id: order.id,
                actor: vendor,
                items: None,
            })
            .await
            .unwrap();

        let err = svc
            .execute(CompleteReturn {
                return_id: ret.id,
                actor: customer,
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::NotPermitted(_)));

        let complete = CompleteReturn {
            return_id: ret.id,
            actor: vendor,
        };
        let ret = svc.execute(complete).await.unwrap();
        assert_eq!(ret.status, Status::Completed);
        assert!(ret.completed_at.is_some());

        let err = svc.execute(complete).await.unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::InvalidTransition(_)));
    }
}
