//! [`Command`] for scheduling a [`Pickup`] of an [`Order`].

use common::{
    operations::{By, Commit, Insert, Lock, Next, Select, Transact, Transacted},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        order, pickup,
        rental::Notes,
        sequence,
        user::Actor,
        Order, Pickup,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for scheduling a [`Pickup`] of all the items of an [`Order`].
#[derive(Clone, Debug)]
pub struct CreatePickup {
    /// ID of the [`Order`] to be picked up.
    pub order_id: order::Id,

    /// [`Actor`] scheduling the [`Pickup`].
    pub actor: Actor,

    /// [`DateTime`] the [`Pickup`] is scheduled at.
    pub scheduled_at: pickup::ScheduleDateTime,

    /// Instructions for the customer.
    pub instructions: Option<Notes>,
}

impl<Db> Command<CreatePickup> for Service<Db>
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
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Pickup;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreatePickup) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreatePickup {
            order_id,
            actor,
            scheduled_at,
            instructions,
        } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Lock(By::new(order_id)))
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
        if order.status.is_closed() {
            return Err(tracerr::new!(E::OrderClosed(order_id, order.status)));
        }
        if order.status.is_in_progress() {
            return Err(tracerr::new!(E::OrderInProgress(order_id)));
        }

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
            status: pickup::Status::Scheduled,
            scheduled_at,
            picked_up_at: None,
            instructions,
            created_at: DateTime::now().coerce(),
        };
        tx.execute(Insert(pickup.clone()))
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

/// Error of [`CreatePickup`] [`Command`] execution.
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
    #[display("`Order(id: {_0})` cannot be handed over by the user")]
    #[from(ignore)]
    NotPermitted(#[error(not(source))] order::Id),

    /// [`Order`] is completed or cancelled already.
    #[display("`Order(id: {_0})` is `{_1}` already")]
    #[from(ignore)]
    OrderClosed(
        #[error(not(source))] order::Id,
        #[error(not(source))] order::Status,
    ),

    /// [`Order`] items are with the customer already.
    #[display("`Order(id: {_0})` is picked up already")]
    #[from(ignore)]
    OrderInProgress(#[error(not(source))] order::Id),
}

#[cfg(test)]
mod spec {
    use common::DateTime;

    use crate::{
        command::CancelOrder,
        domain::{pickup, user::Actor, Order},
        testing, Command as _,
    };

    use super::{CreatePickup, ExecutionError};

    fn schedule(order: &Order, actor: Actor) -> CreatePickup {
        CreatePickup {
            order_id: order.id,
            actor,
            scheduled_at: DateTime::from_rfc3339("2024-03-01T09:00:00Z")
                .unwrap()
                .coerce(),
            instructions: None,
        }
    }

    #[tokio::test]
    async fn schedules_all_order_items() {
        let svc = testing::service();
        let vendor = testing::vendor();
        let customer = testing::customer();
        let drill = testing::product(&svc, vendor.id, 5, 100).await;
        let saw = testing::product(&svc, vendor.id, 5, 50).await;
        let window =
            testing::period("2024-03-01T00:00:00Z", "2024-03-03T00:00:00Z");
        let order = testing::order(
            &svc,
            customer,
            &[(&drill, 2, window), (&saw, 1, window)],
        )
        .await;

        let pickup = svc.execute(schedule(&order, vendor)).await.unwrap();

        assert_eq!(pickup.number.to_string(), "PK000001");
        assert_eq!(pickup.status, pickup::Status::Scheduled);
        assert_eq!(pickup.customer_id, customer.id);
        assert!(pickup.picked_up_at.is_none());
        assert_eq!(pickup.items.len(), 2);
        assert!(pickup
            .items
            .iter()
            .all(|i| i.condition == pickup::Condition::Good));
    }

    #[tokio::test]
    async fn rejects_cancelled_order_and_outsiders() {
        let svc = testing::service();
        let vendor = testing::vendor();
        let customer = testing::customer();
        let drill = testing::product(&svc, vendor.id, 5, 100).await;
        let window =
            testing::period("2024-03-01T00:00:00Z", "2024-03-03T00:00:00Z");
        let order =
            testing::order(&svc, customer, &[(&drill, 1, window)]).await;

        let err = svc.execute(schedule(&order, customer)).await.unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::NotPermitted(_)));

        _ = svc
            .execute(CancelOrder {
                order_id: order.id,
                actor: customer,
            })
            .await
            .unwrap();
        let err = svc.execute(schedule(&order, vendor)).await.unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::OrderClosed(..)));
    }
}
