//! [`Command`] for changing an [`Order`] [`Status`].

use common::{
    operations::{
        By, Commit, Insert, Lock, Next, Select, Transact, Transacted, Update,
    },
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        fsm::{InvalidTransition, Transition as _},
        order::{self, Status},
        pickup, sequence,
        user::Actor,
        Order, Pickup,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for moving an [`Order`] along its fulfillment by its vendor.
///
/// Moving an [`Order`] to [`Status::PickedUp`] records a completed
/// [`Pickup`] of all its items.
#[derive(Clone, Copy, Debug)]
pub struct UpdateOrderStatus {
    /// ID of the [`Order`] to update.
    pub order_id: order::Id,

    /// [`Actor`] updating the [`Order`].
    pub actor: Actor,

    /// New [`Status`] of the [`Order`].
    pub status: Status,
}

impl<Db> Command<UpdateOrderStatus> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Select<By<Option<Order>, order::Id>>,
            Ok = Option<Order>,
            Err = Traced<database::Error>,
        > + Database<Lock<By<Order, order::Id>>, Err = Traced<database::Error>>
        + Database<
            Next<sequence::Kind>,
            Ok = sequence::Number,
            Err = Traced<database::Error>,
        > + Database<Insert<Pickup>, Err = Traced<database::Error>>
        + Database<Update<Order>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Order;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: UpdateOrderStatus,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let UpdateOrderStatus {
            order_id,
            actor,
            status,
        } = cmd;

        if !status.is_settable() {
            return Err(tracerr::new!(E::UnsettableStatus(status)));
        }

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
        if !actor.is_vendor_or_admin(order.vendor_id) {
            return Err(tracerr::new!(E::NotPermitted(order_id)));
        }

        order.status = order
            .status
            .advance(status)
            .map_err(tracerr::from_and_wrap!(=> E))?;
        let now = DateTime::now();
        order.updated_at = now.coerce();

        if status == Status::PickedUp {
            order.hand_over(now);

            let number = tx
                .execute(Next(sequence::Kind::Pickup))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;
            let pickup = Pickup {
                id: pickup::Id::new(),
                number,
                order_id,
                customer_id: order.customer_id,
                vendor_id: order.vendor_id,
                items: pickup::Item::all_of(&order),
                status: pickup::Status::Completed,
                scheduled_at: now.coerce(),
                picked_up_at: Some(now.coerce()),
                instructions: None,
                created_at: now.coerce(),
            };
            tx.execute(Insert(pickup))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))
                .map(drop)?;
        }

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

/// Error of [`UpdateOrderStatus`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Status`] transition is not allowed.
    #[display("Invalid `Order` status change: {_0}")]
    InvalidTransition(#[error(not(source))] InvalidTransition<Status>),

    /// [`Status`] has its own dedicated operation.
    #[display("`Order` cannot be set to `{_0}` directly")]
    #[from(ignore)]
    UnsettableStatus(#[error(not(source))] Status),

    /// [`Order`] with the provided ID does not exist.
    #[display("`Order(id: {_0})` does not exist")]
    #[from(ignore)]
    OrderNotExists(#[error(not(source))] order::Id),

    /// [`Actor`] is not the vendor of the [`Order`].
    #[display("`Order(id: {_0})` cannot be updated by the user")]
    #[from(ignore)]
    NotPermitted(#[error(not(source))] order::Id),
}

#[cfg(test)]
mod spec {
    use common::operations::{By, Select};

    use crate::{
        domain::{
            access::Scope,
            order::{ItemStatus, Status},
            pickup, Pickup,
        },
        infra::Database as _,
        testing, Command as _,
    };

    use super::{ExecutionError, UpdateOrderStatus};

    #[tokio::test]
    async fn records_pickup_when_picked_up() {
        let svc = testing::service();
        let vendor = testing::vendor();
        let customer = testing::customer();
        let drill = testing::product(&svc, vendor.id, 5, 100).await;
        let window =
            testing::period("2024-03-01T00:00:00Z", "2024-03-03T00:00:00Z");
        let order =
            testing::order(&svc, customer, &[(&drill, 2, window)]).await;

        let order = svc
            .execute(UpdateOrderStatus {
                order_id: order.id,
                actor: vendor,
                status: Status::PickedUp,
            })
            .await
            .unwrap();

        assert_eq!(order.status, Status::PickedUp);
        assert!(order.pickup_date.is_some());
        assert!(order
            .items
            .iter()
            .all(|i| i.status == ItemStatus::WithCustomer));

        let pickups = svc
            .database()
            .execute(Select(By::<Vec<Pickup>, _>::new(Scope::All)))
            .await
            .unwrap();
        assert_eq!(pickups.len(), 1);
        assert_eq!(pickups[0].order_id, order.id);
        assert_eq!(pickups[0].number.to_string(), "PK000001");
        assert_eq!(pickups[0].status, pickup::Status::Completed);
        assert_eq!(pickups[0].items[0].condition, pickup::Condition::Good);
        assert_eq!(pickups[0].items[0].quantity.get(), 2);
    }

    #[tokio::test]
    async fn follows_order_transitions() {
        let svc = testing::service();
        let vendor = testing::vendor();
        let customer = testing::customer();
        let drill = testing::product(&svc, vendor.id, 5, 100).await;
        let window =
            testing::period("2024-03-01T00:00:00Z", "2024-03-03T00:00:00Z");
        let order =
            testing::order(&svc, customer, &[(&drill, 1, window)]).await;
        let set = |status| UpdateOrderStatus {
            order_id: order.id,
            actor: vendor,
            status,
        };

        let err = svc.execute(set(Status::Active)).await.unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::InvalidTransition(_)));

        let err = svc.execute(set(Status::Completed)).await.unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::UnsettableStatus(_)));

        for status in [Status::Processing, Status::PickedUp, Status::Active] {
            assert_eq!(svc.execute(set(status)).await.unwrap().status, status);
        }
    }

    #[tokio::test]
    async fn allows_order_vendor_or_admin_only() {
        let svc = testing::service();
        let vendor = testing::vendor();
        let customer = testing::customer();
        let drill = testing::product(&svc, vendor.id, 5, 100).await;
        let window =
            testing::period("2024-03-01T00:00:00Z", "2024-03-03T00:00:00Z");
        let order =
            testing::order(&svc, customer, &[(&drill, 1, window)]).await;

        for actor in [customer, testing::vendor()] {
            let err = svc
                .execute(UpdateOrderStatus {
                    order_id: order.id,
                    actor,
                    status: Status::Processing,
                })
                .await
                .unwrap_err();
            assert!(matches!(err.as_ref(), ExecutionError::NotPermitted(_)));
        }

        let order = svc
            .execute(UpdateOrderStatus {
                order_id: order.id,
                actor: testing::admin(),
                status: Status::Processing,
            })
            .await
            .unwrap();
        assert_eq!(order.status, Status::Processing);
    }
}
