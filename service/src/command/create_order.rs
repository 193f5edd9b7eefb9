//! [`Command`] for creating a new [`Order`] out of a confirmed [`Quotation`].

use std::collections::{BTreeSet, HashMap};

use common::{
    operations::{
        By, Commit, Insert, Lock, Next, Select, Transact, Transacted,
    },
    DateTime, Money,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        order::{self, ShippingAddress},
        product::{self, Reservation},
        quotation,
        rental::Notes,
        sequence,
        user::Actor,
        Order, Product, Quotation,
    },
    infra::{database::{self, ORDER_QUOTATION_UNIQUE}, Database},
    Service,
};

use super::Command;

/// [`Command`] for creating a new [`Order`] out of a confirmed [`Quotation`],
/// reserving its items.
#[derive(Clone, Debug)]
pub struct CreateOrder {
    /// ID of the confirmed [`Quotation`] to order.
    pub quotation_id: quotation::Id,

    /// Customer placing the [`Order`].
    pub actor: Actor,

    /// [`ShippingAddress`] of the [`Order`].
    pub shipping_address: Option<ShippingAddress>,

    /// [`Notes`] of the customer.
    pub notes: Option<Notes>,

    /// Refundable security deposit, if any.
    pub security_deposit: Option<Money>,
}

impl<Db> Command<CreateOrder> for Service<Db>
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
            Select<By<Option<Order>, quotation::Id>>,
            Ok = Option<Order>,
            Err = Traced<database::Error>,
        > + Database<
            Lock<By<Product, product::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<HashMap<product::Id, Product>, Vec<product::Id>>>,
            Ok = HashMap<product::Id, Product>,
            Err = Traced<database::Error>,
        > + Database<
            Next<sequence::Kind>,
            Ok = sequence::Number,
            Err = Traced<database::Error>,
        > + Database<Insert<Order>, Err = Traced<database::Error>>
        + Database<Insert<Reservation>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Order;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreateOrder) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateOrder {
            quotation_id,
            actor,
            shipping_address,
            notes,
            security_deposit,
        } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent orders of the same `Quotation`.
        tx.execute(Lock(By::<Quotation, _>::new(quotation_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        let quotation = tx
            .execute(Select(By::<Option<Quotation>, _>::new(quotation_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::QuotationNotExists(quotation_id))
            .map_err(tracerr::wrap!())?;
        if !actor.is_customer(quotation.customer_id) {
            return Err(tracerr::new!(E::NotOwner(quotation_id)));
        }
        if quotation.status != quotation::Status::Confirmed {
            return Err(tracerr::new!(E::QuotationNotConfirmed(
                quotation_id,
                quotation.status,
            )));
        }
        if tx
            .execute(Select(By::<Option<Order>, _>::new(quotation_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .is_some()
        {
            return Err(tracerr::new!(E::QuotationAlreadyOrdered(
                quotation_id
            )));
        }

        let currency = quotation.totals.total_amount.currency;
        let security_deposit =
            security_deposit.unwrap_or(Money::zero(currency));
        if security_deposit.currency != currency {
            return Err(tracerr::new!(E::CurrencyMismatch(security_deposit)));
        }
        if !(security_deposit.is_zero() || security_deposit.is_positive()) {
            return Err(tracerr::new!(E::NegativeDeposit(security_deposit)));
        }
        let vendor_id = quotation
            .vendor_id()
            .ok_or(E::NoItems(quotation_id))
            .map_err(tracerr::wrap!())?;

        // Locks are taken in ascending order to avoid deadlocks.
        let product_ids = quotation
            .items
            .iter()
            .map(|i| i.product_id)
            .collect::<BTreeSet<_>>();
        for id in &product_ids {
            tx.execute(Lock(By::<Product, _>::new(*id)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))
                .map(drop)?;
        }
        let mut products = tx
            .execute(Select(By::new(
                product_ids.into_iter().collect::<Vec<_>>(),
            )))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let order_id = order::Id::new();
        let mut reservations = Vec::with_capacity(quotation.items.len());
        for item in &quotation.items {
            let product = products
                .get_mut(&item.product_id)
                .ok_or(E::ProductNotExists(item.product_id))
                .map_err(tracerr::wrap!())?;
            if !product.is_available(item.quantity, &item.period) {
                return Err(tracerr::new!(E::NotAvailable {
                    product_id: product.id,
                    name: product.name.clone(),
                }));
            }
            let reservation = Reservation {
                product_id: product.id,
                order_id,
                quantity: item.quantity,
                period: item.period,
            };
            product.reservations.push(reservation);
            reservations.push(reservation);
        }

        let number = tx
            .execute(Next(sequence::Kind::Order))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let now = DateTime::now();
        let order = Order {
            id: order_id,
            number,
            quotation_id: Some(quotation_id),
            customer_id: quotation.customer_id,
            vendor_id,
            return_date: quotation
                .items
                .first()
                .map(|i| i.period.end().coerce()),
            items: quotation
                .items
                .into_iter()
                .map(|line| order::Item {
                    line,
                    status: order::ItemStatus::Pending,
                })
                .collect(),
            totals: quotation.totals,
            security_deposit,
            status: order::Status::Confirmed,
            payment_status: order::PaymentStatus::Pending,
            shipping_address,
            notes,
            pickup_date: None,
            actual_return_date: None,
            late_return_fee: Money::zero(currency),
            created_at: now.coerce(),
            updated_at: now.coerce(),
        };
        let inserted = tx.execute(Insert(order.clone())).await;
        if let Err(e) = &inserted {
            if e.as_ref().is_unique_violation(Some(ORDER_QUOTATION_UNIQUE)) {
                return Err(tracerr::new!(E::QuotationAlreadyOrdered(
                    quotation_id
                )));
            }
        }
        inserted.map_err(tracerr::map_from_and_wrap!(=> E)).map(drop)?;

        for reservation in reservations {
            tx.execute(Insert(reservation))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))
                .map(drop)?;
        }

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(order)
    }
}

/// Error of [`CreateOrder`] [`Command`] execution.
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

    /// [`Quotation`] is not confirmed.
    #[display("`Quotation(id: {_0})` is `{_1}`, not confirmed")]
    #[from(ignore)]
    QuotationNotConfirmed(
        #[error(not(source))] quotation::Id,
        #[error(not(source))] quotation::Status,
    ),

    /// [`Quotation`] has been ordered already.
    #[display("`Quotation(id: {_0})` is ordered already")]
    #[from(ignore)]
    QuotationAlreadyOrdered(#[error(not(source))] quotation::Id),

    /// [`Quotation`] has no items.
    #[display("`Quotation(id: {_0})` has no items")]
    #[from(ignore)]
    NoItems(#[error(not(source))] quotation::Id),

    /// Security deposit is expressed in another currency.
    #[display("Security deposit `{_0}` is in another currency")]
    #[from(ignore)]
    CurrencyMismatch(#[error(not(source))] Money),

    /// Security deposit is negative.
    #[display("Security deposit `{_0}` is negative")]
    #[from(ignore)]
    NegativeDeposit(#[error(not(source))] Money),

    /// Ordered [`Product`] does not exist.
    #[display("`Product(id: {_0})` does not exist")]
    #[from(ignore)]
    ProductNotExists(#[error(not(source))] product::Id),

    /// Ordered [`Product`] is not available anymore.
    #[display("`Product(id: {product_id})` \"{name}\" is not available")]
    #[from(ignore)]
    NotAvailable {
        /// ID of the unavailable [`Product`].
        #[error(not(source))]
        product_id: product::Id,

        /// Name of the unavailable [`Product`].
        #[error(not(source))]
        name: product::Name,
    },
}

#[cfg(test)]
mod spec {
    use common::{
        money::Currency,
        operations::{By, Select},
        Money,
    };

    use crate::{
        command::{ConfirmQuotation, CreateQuotation},
        domain::{
            order::{ItemStatus, PaymentStatus, Status},
            product::Availability,
            quotation::{self, Request},
            rental::Quantity,
            user::Actor,
            Product,
        },
        infra::Database as _,
        testing, Command as _,
    };

    use super::{CreateOrder, ExecutionError};

    fn create(quotation_id: quotation::Id, actor: Actor) -> CreateOrder {
        CreateOrder {
            quotation_id,
            actor,
            shipping_address: None,
            notes: None,
            security_deposit: None,
        }
    }

    #[tokio::test]
    async fn reserves_ordered_items() {
        let svc = testing::service();
        let vendor = testing::vendor();
        let customer = testing::customer();
        let drill = testing::product(&svc, vendor.id, 5, 100).await;
        let window =
            testing::period("2024-03-01T00:00:00Z", "2024-03-03T00:00:00Z");

        let order =
            testing::order(&svc, customer, &[(&drill, 5, window)]).await;

        assert_eq!(order.number.to_string(), "ORD000001");
        assert_eq!(order.status, Status::Confirmed);
        assert_eq!(order.payment_status, PaymentStatus::Pending);
        assert_eq!(order.vendor_id, vendor.id);
        assert_eq!(order.customer_id, customer.id);
        assert_eq!(order.return_date, Some(window.end().coerce()));
        assert!(order.security_deposit.is_zero());
        assert!(order.items.iter().all(|i| i.status == ItemStatus::Pending));

        let stored = svc
            .database()
            .execute(Select(By::<Option<Product>, _>::new(drill.id)))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.reservations.len(), 1);
        assert_eq!(stored.reservations[0].order_id, order.id);
        assert_eq!(
            stored.availability(Quantity::new(1).unwrap(), &window),
            Availability {
                is_available: false,
                free_quantity: 0,
            },
        );
    }

    #[tokio::test]
    async fn rechecks_availability_of_confirmed_quotations() {
        let svc = testing::service();
        let vendor = testing::vendor();
        let (first, second) = (testing::customer(), testing::customer());
        let drill = testing::product(&svc, vendor.id, 5, 100).await;
        let window =
            testing::period("2024-03-01T00:00:00Z", "2024-03-03T00:00:00Z");

        let mut quotations = vec![];
        for (customer, quantity) in [(first, 5), (second, 1)] {
            let q = svc
                .execute(CreateQuotation {
                    actor: customer,
                    requests: vec![Request {
                        product_id: drill.id,
                        quantity: Quantity::new(quantity).unwrap(),
                        period: window,
                    }],
                    notes: None,
                })
                .await
                .unwrap();
            _ = svc
                .execute(ConfirmQuotation {
                    quotation_id: q.id,
                    actor: customer,
                })
                .await
                .unwrap();
            quotations.push((q.id, customer));
        }

        _ = svc
            .execute(create(quotations[0].0, quotations[0].1))
            .await
            .unwrap();
        let err = svc
            .execute(create(quotations[1].0, quotations[1].1))
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::NotAvailable { product_id, .. }
                if *product_id == drill.id,
        ));
    }

    #[tokio::test]
    async fn orders_confirmed_quotation_once() {
        let svc = testing::service();
        let vendor = testing::vendor();
        let customer = testing::customer();
        let drill = testing::product(&svc, vendor.id, 5, 100).await;
        let window =
            testing::period("2024-03-01T00:00:00Z", "2024-03-03T00:00:00Z");
        let q = testing::quotation(&svc, customer, &[(&drill, 1, window)]).await;

        let err = svc.execute(create(q.id, customer)).await.unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::QuotationNotConfirmed(..),
        ));

        _ = svc
            .execute(ConfirmQuotation {
                quotation_id: q.id,
                actor: customer,
            })
            .await
            .unwrap();
        for actor in [testing::customer(), testing::admin()] {
            let err = svc.execute(create(q.id, actor)).await.unwrap_err();
            assert!(matches!(err.as_ref(), ExecutionError::NotOwner(_)));
        }

        _ = svc.execute(create(q.id, customer)).await.unwrap();
        let err = svc.execute(create(q.id, customer)).await.unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::QuotationAlreadyOrdered(_),
        ));
    }

    #[tokio::test]
    async fn keeps_deposit_in_quotation_currency() {
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
            .execute(CreateOrder {
                security_deposit: Some(Money {
                    amount: 500.into(),
                    currency: Currency::Usd,
                }),
                ..create(q.id, customer)
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::CurrencyMismatch(_)));

        let order = svc
            .execute(CreateOrder {
                security_deposit: Some(testing::inr("500")),
                ..create(q.id, customer)
            })
            .await
            .unwrap();
        assert_eq!(order.security_deposit, testing::inr("500"));
    }
}
