//! [`Command`] for cancelling an [`Order`].

use common::{
    operations::{
        By, Commit, Delete, Lock, Select, Transact, Transacted, Update,
    },
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        fsm::{InvalidTransition, Transition as _},
        order::{self, Status},
        product::Reservation,
        user::Actor,
        Order,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for cancelling an [`Order`] not handed over yet, releasing all
/// its [`Reservation`]s.
#[derive(Clone, Copy, Debug)]
pub struct CancelOrder {
    /// ID of the [`Order`] to cancel.
    pub order_id: order::Id,

    /// [`Actor`] cancelling the [`Order`].
    pub actor: Actor,
}

impl<Db> Command<CancelOrder> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Select<By<Option<Order>, order::Id>>,
            Ok = Option<Order>,
            Err = Traced<database::Error>,
        > + Database<Lock<By<Order, order::Id>>, Err = Traced<database::Error>>
        + Database<
            Delete<By<Reservation, order::Id>>,
            Err = Traced<database::Error>,
        > + Database<Update<Order>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Order;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CancelOrder) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CancelOrder { order_id, actor } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Lock(By::new(order_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        let mut order = tx
            .execute(Select(By::<Option<Order>, _>::new(order_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::OrderNotExists(order_id))
            .map_err(tracerr::wrap!())?;
        if !actor.participates(order.customer_id, order.vendor_id) {
            return Err(tracerr::new!(E::NotPermitted(order_id)));
        }
        if order.status.is_in_progress() {
            return Err(tracerr::new!(E::OrderInProgress(order_id)));
        }
        if order.status.is_closed() {
            return Err(tracerr::new!(E::OrderClosed(order_id, order.status)));
        }

        order.status = order
            .status
            .advance(Status::Cancelled)
            .map_err(tracerr::from_and_wrap!(=> E))?;
        order.updated_at = DateTime::now().coerce();

        tx.execute(Delete(By::<Reservation, _>::new(order_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Update(order.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(order)
    }
}

/// Error of [`CancelOrder`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Status`] transition is not allowed.
    #[display("Invalid `Order` status change: {_0}")]
    InvalidTransition(#[error(not(source))] InvalidTransition<Status>),

    /// [`Order`] with the provided ID does not exist.
    #[display("`Order(id: {_0})` does not exist")]
    #[from(ignore)]
    OrderNotExists(#[error(not(source))] order::Id),

    /// [`Actor`] takes no part in the [`Order`].
    #[display("`Order(id: {_0})` cannot be cancelled by the user")]
    #[from(ignore)]
    NotPermitted(#[error(not(source))] order::Id),

    /// [`Order`] items are with the customer already.
    #[display("`Order(id: {_0})` is in progress")]
    #[from(ignore)]
    OrderInProgress(#[error(not(source))] order::Id),

    /// [`Order`] is completed or cancelled already.
    #[display("`Order(id: {_0})` is `{_1}` already")]
    #[from(ignore)]
    OrderClosed(#[error(not(source))] order::Id, #[error(not(source))] Status),
}

#[cfg(test)]
mod spec {
    use common::operations::{By, Select};

    use crate::{
        command::UpdateOrderStatus,
        domain::{order::Status, Product},
        infra::Database as _,
        testing, Command as _,
    };

    use super::{CancelOrder, ExecutionError};

    #[tokio::test]
    async fn releases_reservations() {
        let svc = testing::service();
        let vendor = testing::vendor();
        let customer = testing::customer();
        let drill = testing::product(&svc, vendor.id, 5, 100).await;
        let saw = testing::product(&svc, vendor.id, 2, 50).await;
        let window =
            testing::period("2024-03-01T00:00:00Z", "2024-03-03T00:00:00Z");
        let order = testing::order(
            &svc,
            customer,
            &[(&drill, 5, window), (&saw, 1, window)],
        )
        .await;

        let order = svc
            .execute(CancelOrder {
                order_id: order.id,
                actor: customer,
            })
            .await
            .unwrap();
        assert_eq!(order.status, Status::Cancelled);

        for id in [drill.id, saw.id] {
            let product = svc
                .database()
                .execute(Select(By::<Option<Product>, _>::new(id)))
                .await
                .unwrap()
                .unwrap();
            assert!(product.reservations.is_empty());
        }

        let err = svc
            .execute(CancelOrder {
                order_id: order.id,
                actor: customer,
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::OrderClosed(..)));
    }

    #[tokio::test]
    async fn rejects_picked_up_order() {
        let svc = testing::service();
        let vendor = testing::vendor();
        let customer = testing::customer();
        let drill = testing::product(&svc, vendor.id, 5, 100).await;
        let window =
            testing::period("2024-03-01T00:00:00Z", "2024-03-03T00:00:00Z");
        let order =
            testing::order(&svc, customer, &[(&drill, 1, window)]).await;
        _ = svc
            .execute(UpdateOrderStatus {
                order_id: order.id,
                actor: vendor,
                status: Status::PickedUp,
            })
            .await
            .unwrap();

        let err = svc
            .execute(CancelOrder {
                order_id: order.id,
                actor: vendor,
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::OrderInProgress(_)));

        let product = svc
            .database()
            .execute(Select(By::<Option<Product>, _>::new(drill.id)))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(product.reservations.len(), 1);
    }

    #[tokio::test]
    async fn rejects_outsiders() {
        let svc = testing::service();
        let vendor = testing::vendor();
        let customer = testing::customer();
        let drill = testing::product(&svc, vendor.id, 5, 100).await;
        let window =
            testing::period("2024-03-01T00:00:00Z", "2024-03-03T00:00:00Z");
        let order =
            testing::order(&svc, customer, &[(&drill, 1, window)]).await;

        for actor in [testing::customer(), testing::vendor()] {
            let err = svc
                .execute(CancelOrder {
                    order_id: order.id,
                    actor,
                })
                .await
                .unwrap_err();
            assert!(matches!(err.as_ref(), ExecutionError::NotPermitted(_)));
        }
    }
}
