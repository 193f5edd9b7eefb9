//! [`Command`] for returning rented [`Order`] items.

use std::collections::HashMap;

use common::{
    operations::{
        By, Commit, Delete, Insert, Lock, Next, Select, Transact, Transacted,
        Update,
    },
    DateTime, Money,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        fsm::{InvalidTransition, Transition as _},
        order,
        product::{self, Reservation},
        rental_return::{self, Condition},
        sequence,
        user::Actor,
        Order, Product, Return,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for accepting the rented items of an [`Order`] back.
///
/// Completes the [`Order`], charging it for a late return, and releases all
/// its [`Reservation`]s.
#[derive(Clone, Debug)]
pub struct CreateReturn {
    /// ID of the [`Order`] being returned.
    pub order_id: order::Id,

    /// [`Actor`] returning the items or accepting them back.
    pub actor: Actor,

    /// Inspected [`rental_return::Item`]s.
    ///
    /// All the [`Order`] items in a [`Condition::Good`] if [`None`].
    pub items: Option<Vec<rental_return::Item>>,
}

impl<Db> Command<CreateReturn> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Select<By<Option<Order>, order::Id>>,
            Ok = Option<Order>,
            Err = Traced<database::Error>,
        > + Database<Lock<By<Order, order::Id>>, Err = Traced<database::Error>>
        + Database<
            Select<By<HashMap<product::Id, Product>, Vec<product::Id>>>,
            Ok = HashMap<product::Id, Product>,
            Err = Traced<database::Error>,
        > + Database<
            Next<sequence::Kind>,
            Ok = sequence::Number,
            Err = Traced<database::Error>,
        > + Database<
            Delete<By<Reservation, order::Id>>,
            Err = Traced<database::Error>,
        > + Database<Insert<Return>, Err = Traced<database::Error>>
        + Database<Update<Order>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Return;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreateReturn) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateReturn {
            order_id,
            actor,
            items,
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
        let mut order = tx
            .execute(Select(By::<Option<Order>, _>::new(order_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::OrderNotExists(order_id))
            .map_err(tracerr::wrap!())?;
        if !actor.participates(order.customer_id, order.vendor_id) {
            return Err(tracerr::new!(E::NotPermitted(order_id)));
        }
        if !order.status.is_in_progress() {
            return Err(tracerr::new!(E::OrderNotInProgress(
                order_id,
                order.status,
            )));
        }
        let expected_at = order
            .expected_return()
            .ok_or(E::NoItems(order_id))
            .map_err(tracerr::wrap!())?
            .coerce();

        let currency = order.totals.total_amount.currency;
        let items = if let Some(items) = items {
            for i in &items {
                if !order.items.iter().any(|o| o.product_id == i.product_id) {
                    return Err(tracerr::new!(E::ProductNotOrdered(
                        i.product_id
                    )));
                }
                if i.damage_fee.currency != currency {
                    return Err(tracerr::new!(E::CurrencyMismatch(
                        i.damage_fee
                    )));
                }
                if !(i.damage_fee.is_zero() || i.damage_fee.is_positive()) {
                    return Err(tracerr::new!(E::NegativeDamageFee(
                        i.damage_fee
                    )));
                }
            }
            items
        } else {
            order
                .items
                .iter()
                .map(|i| rental_return::Item {
                    product_id: i.product_id,
                    quantity: i.quantity,
                    condition: Condition::Good,
                    damage_fee: Money::zero(currency),
                    damage_notes: None,
                })
                .collect()
        };
        let total_damage_fee =
            Money::sum(currency, items.iter().map(|i| i.damage_fee))
                .ok_or(E::CurrencyMismatch(Money::zero(currency)))
                .map_err(tracerr::wrap!())?;

        let now = DateTime::now();
        let returned_at = now.coerce();
        let late_days = rental_return::late_days(expected_at, returned_at);
        let late_return_fee = if late_days > 0 {
            let products = tx
                .execute(Select(By::new(
                    order.items.iter().map(|i| i.product_id).collect::<Vec<_>>(),
                )))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;
            order.late_return_fee(
                &products,
                self.config().terms.late_fee_rate,
                late_days,
            )
        } else {
            Money::zero(currency)
        };

        order.status = order
            .status
            .advance(order::Status::Completed)
            .map_err(tracerr::from_and_wrap!(=> E))?;
        order.actual_return_date = Some(now.coerce());
        order.late_return_fee = late_return_fee;
        order.updated_at = now.coerce();
        for item in &mut order.items {
            item.status = order::ItemStatus::Returned;
        }

        let number = tx
            .execute(Next(sequence::Kind::Return))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        let ret = Return {
            id: rental_return::Id::new(),
            number,
            order_id,
            customer_id: order.customer_id,
            vendor_id: order.vendor_id,
            items,
            expected_at,
            returned_at,
            late_days,
            late_return_fee,
            total_damage_fee,
            status: rental_return::Status::Processing,
            completed_at: None,
            created_at: now.coerce(),
        };

        tx.execute(Insert(ret.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Update(order))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Delete(By::<Reservation, _>::new(order_id)))
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

/// Error of [`CreateReturn`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`order::Status`] transition is not allowed.
    #[display("Invalid `Order` status change: {_0}")]
    InvalidTransition(
        #[error(not(source))] InvalidTransition<order::Status>,
    ),

    /// [`Order`] with the provided ID does not exist.
    #[display("`Order(id: {_0})` does not exist")]
    #[from(ignore)]
    OrderNotExists(#[error(not(source))] order::Id),

    /// [`Actor`] takes no part in the [`Order`].
    #[display("`Order(id: {_0})` cannot be returned to the user")]
    #[from(ignore)]
    NotPermitted(#[error(not(source))] order::Id),

    /// [`Order`] items are not with the customer.
    #[display("`Order(id: {_0})` is `{_1}`, not in progress")]
    #[from(ignore)]
    OrderNotInProgress(
        #[error(not(source))] order::Id,
        #[error(not(source))] order::Status,
    ),

    /// [`Order`] has no items to return.
    #[display("`Order(id: {_0})` has no items")]
    #[from(ignore)]
    NoItems(#[error(not(source))] order::Id),

    /// Returned [`Product`] is not a part of the [`Order`].
    #[display("`Product(id: {_0})` is not ordered")]
    #[from(ignore)]
    ProductNotOrdered(#[error(not(source))] product::Id),

    /// Damage fee is expressed in another currency.
    #[display("Damage fee `{_0}` is in another currency")]
    #[from(ignore)]
    CurrencyMismatch(#[error(not(source))] Money),

    /// Damage fee is negative.
    #[display("Damage fee `{_0}` is negative")]
    #[from(ignore)]
    NegativeDamageFee(#[error(not(source))] Money),
}

#[cfg(test)]
mod spec {
    use common::{
        money::Currency,
        operations::{By, Select},
        Money,
    };

    use crate::{
        command::UpdateOrderStatus,
        domain::{
            order::{self, ItemStatus},
            rental::Quantity,
            rental_return::{self, Condition, Status},
            user::{Actor, Role},
            Order, Product,
        },
        infra::{Database as _, Memory},
        testing, Command as _, Service,
    };

    use super::{CreateReturn, ExecutionError};

    async fn picked_up(
        svc: &Service<Memory>,
        vendor: Actor,
        start: &str,
        end: &str,
    ) -> (Order, Product) {
        let drill = testing::product(svc, vendor.id, 5, 100).await;
        let order = testing::order(
            svc,
            testing::customer(),
            &[(&drill, 2, testing::period(start, end))],
        )
        .await;
        let order = svc
            .execute(UpdateOrderStatus {
                order_id: order.id,
                actor: vendor,
                status: order::Status::PickedUp,
            })
            .await
            .unwrap();
        (order, drill)
    }

    #[tokio::test]
    async fn completes_order_in_time() {
        let svc = testing::service();
        let vendor = testing::vendor();
        let (order, drill) = picked_up(
            &svc,
            vendor,
            "2999-01-01T00:00:00Z",
            "2999-01-03T00:00:00Z",
        )
        .await;

        let ret = svc
            .execute(CreateReturn {
                order_id: order.id,
                actor: vendor,
                items: None,
            })
            .await
            .unwrap();

        assert_eq!(ret.number.to_string(), "RT000001");
        assert_eq!(ret.status, Status::Processing);
        assert!(!ret.is_late());
        assert!(ret.late_return_fee.is_zero());
        assert!(ret.total_damage_fee.is_zero());
        assert_eq!(ret.items.len(), 1);
        assert_eq!(ret.items[0].condition, Condition::Good);

        let order = svc
            .database()
            .execute(Select(By::<Option<Order>, _>::new(order.id)))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(order.status, order::Status::Completed);
        assert!(order.actual_return_date.is_some());
        assert!(order.late_return_fee.is_zero());
        assert!(order.items.iter().all(|i| i.status == ItemStatus::Returned));

        let product = svc
            .database()
            .execute(Select(By::<Option<Product>, _>::new(drill.id)))
            .await
            .unwrap()
            .unwrap();
        assert!(product.reservations.is_empty());
    }

    #[tokio::test]
    async fn charges_late_return() {
        let svc = testing::service();
        let vendor = testing::vendor();
        let (order, _) = picked_up(
            &svc,
            vendor,
            "2024-01-08T00:00:00Z",
            "2024-01-10T00:00:00Z",
        )
        .await;

        let ret = svc
            .execute(CreateReturn {
                order_id: order.id,
                actor: vendor,
                items: None,
            })
            .await
            .unwrap();

        // 10% of the daily rate of 100 for each of 2 units.
        assert!(ret.is_late());
        assert_eq!(ret.late_return_fee, testing::inr("20") * ret.late_days);

        let order = svc
            .database()
            .execute(Select(By::<Option<Order>, _>::new(order.id)))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(order.late_return_fee, ret.late_return_fee);
    }

    #[tokio::test]
    async fn sums_damage_fees() {
        let svc = testing::service();
        let vendor = testing::vendor();
        let (order, drill) = picked_up(
            &svc,
            vendor,
            "2999-01-01T00:00:00Z",
            "2999-01-03T00:00:00Z",
        )
        .await;
        let item = |condition, fee: &str| rental_return::Item {
            product_id: drill.id,
            quantity: Quantity::new(1).unwrap(),
            condition,
            damage_fee: testing::inr(fee),
            damage_notes: None,
        };

        let err = svc
            .execute(CreateReturn {
                order_id: order.id,
                actor: vendor,
                items: Some(vec![rental_return::Item {
                    damage_fee: Money {
                        amount: 10.into(),
                        currency: Currency::Usd,
                    },
                    ..item(Condition::Damaged, "0")
                }]),
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::CurrencyMismatch(_)));

        let ret = svc
            .execute(CreateReturn {
                order_id: order.id,
                actor: vendor,
                items: Some(vec![
                    item(Condition::Damaged, "250.50"),
                    item(Condition::Lost, "1000"),
                ]),
            })
            .await
            .unwrap();
        assert_eq!(ret.total_damage_fee, testing::inr("1250.50"));
    }

    #[tokio::test]
    async fn requires_order_in_progress() {
        let svc = testing::service();
        let vendor = testing::vendor();
        let drill = testing::product(&svc, vendor.id, 5, 100).await;
        let window =
            testing::period("2024-03-01T00:00:00Z", "2024-03-03T00:00:00Z");
        let order =
            testing::order(&svc, testing::customer(), &[(&drill, 1, window)])
                .await;

        let err = svc
            .execute(CreateReturn {
                order_id: order.id,
                actor: vendor,
                items: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::OrderNotInProgress(_, order::Status::Confirmed),
        ));
    }

    #[tokio::test]
    async fn allows_order_participants_only() {
        let svc = testing::service();
        let vendor = testing::vendor();
        let (order, _) = picked_up(
            &svc,
            vendor,
            "2999-01-01T00:00:00Z",
            "2999-01-03T00:00:00Z",
        )
        .await;

        for actor in [testing::customer(), testing::vendor()] {
            let err = svc
                .execute(CreateReturn {
                    order_id: order.id,
                    actor,
                    items: None,
                })
                .await
                .unwrap_err();
            assert!(matches!(err.as_ref(), ExecutionError::NotPermitted(_)));
        }

        let ret = svc
            .execute(CreateReturn {
                order_id: order.id,
                actor: Actor {
                    id: order.customer_id,
                    role: Role::Customer,
                },
                items: None,
            })
            .await
            .unwrap();
        assert_eq!(ret.customer_id, order.customer_id);
        assert_eq!(ret.status, Status::Processing);
    }
}
