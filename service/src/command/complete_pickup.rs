//! [`Command`] for completing a [`Pickup`].

use common::{
    operations::{By, Commit, Lock, Select, Transact, Transacted, Update},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        fsm::{InvalidTransition, Transition as _},
        order, pickup,
        user::Actor,
        Order, Pickup,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for completing a scheduled [`Pickup`], handing over the
/// [`Order`] items to its customer.
#[derive(Clone, Copy, Debug)]
pub struct CompletePickup {
    /// ID of the [`Pickup`] to complete.
    pub pickup_id: pickup::Id,

    /// [`Actor`] handing over the items.
    pub actor: Actor,
}

impl<Db> Command<CompletePickup> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Select<By<Option<Pickup>, pickup::Id>>,
            Ok = Option<Pickup>,
            Err = Traced<database::Error>,
        > + Database<
            Lock<By<Pickup, pickup::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Order>, order::Id>>,
            Ok = Option<Order>,
            Err = Traced<database::Error>,
        > + Database<Lock<By<Order, order::Id>>, Err = Traced<database::Error>>
        + Database<Update<Pickup>, Err = Traced<database::Error>>
        + Database<Update<Order>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Pickup;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CompletePickup,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CompletePickup { pickup_id, actor } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Lock(By::<Pickup, _>::new(pickup_id)))
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
        if pickup.status != pickup::Status::Scheduled {
            return Err(tracerr::new!(E::PickupNotScheduled(
                pickup_id,
                pickup.status,
            )));
        }

        let order_id = pickup.order_id;
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

        order.status = order
            .status
            .advance(order::Status::PickedUp)
            .map_err(tracerr::from_and_wrap!(=> E))?;
        let now = DateTime::now();
        order.hand_over(now);
        order.updated_at = now.coerce();

        pickup.status = pickup::Status::Completed;
        pickup.picked_up_at = Some(now.coerce());

        tx.execute(Update(pickup.clone()))
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

        Ok(pickup)
    }
}

/// Error of [`CompletePickup`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Order`] cannot be picked up in its [`order::Status`].
    #[display("Invalid `Order` status change: {_0}")]
    InvalidTransition(
        #[error(not(source))] InvalidTransition<order::Status>,
    ),

    /// [`Pickup`] with the provided ID does not exist.
    #[display("`Pickup(id: {_0})` does not exist")]
    #[from(ignore)]
    PickupNotExists(#[error(not(source))] pickup::Id),

    /// [`Order`] of the [`Pickup`] does not exist.
    #[display("`Order(id: {_0})` does not exist")]
    #[from(ignore)]
    OrderNotExists(#[error(not(source))] order::Id),

    /// [`Actor`] is not the vendor of the [`Pickup`].
    #[display("`Pickup(id: {_0})` cannot be completed by the user")]
    #[from(ignore)]
    NotPermitted(#[error(not(source))] pickup::Id),

    /// [`Pickup`] is completed or cancelled already.
    #[display("`Pickup(id: {_0})` is `{_1}` already")]
    #[from(ignore)]
    PickupNotScheduled(
        #[error(not(source))] pickup::Id,
        #[error(not(source))] pickup::Status,
    ),
}

#[cfg(test)]
mod spec {
    use common::{
        operations::{By, Select},
        DateTime,
    };

    use crate::{
        command::CreatePickup,
        domain::{
            order::{self, ItemStatus},
            pickup, Order,
        },
        infra::Database as _,
        testing, Command as _,
    };

    use super::{CompletePickup, ExecutionError};

    #[tokio::test]
    async fn hands_order_over() {
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
        let complete = CompletePickup {
            pickup_id: pickup.id,
            actor: vendor,
        };

        let pickup = svc.execute(complete).await.unwrap();
        assert_eq!(pickup.status, pickup::Status::Completed);
        assert!(pickup.picked_up_at.is_some());

        let order = svc
            .database()
            .execute(Select(By::<Option<Order>, _>::new(order.id)))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(order.status, order::Status::PickedUp);
        assert!(order.pickup_date.is_some());
        assert!(order
            .items
            .iter()
            .all(|i| i.status == ItemStatus::WithCustomer));

        let err = svc.execute(complete).await.unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::PickupNotScheduled(..),
        ));
    }

    #[tokio::test]
    async fn allows_pickup_vendor_only() {
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

        let err = svc
            .execute(CompletePickup {
                pickup_id: pickup.id,
                actor: customer,
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::NotPermitted(_)));
    }
}
