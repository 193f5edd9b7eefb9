//! [`Memory`] [`Database`] implementations.

use std::collections::HashMap;

use common::operations::{By, Delete, Insert, Lock, Next, Select, Update};
use tracerr::Traced;

use crate::{
    domain::{
        access::{Scope, Visible as _},
        invoice, order, pickup,
        product::{self, Reservation},
        quotation, rental_return, sequence, Invoice, Order, Pickup, Product,
        Quotation, Return,
    },
    infra::{
        database::{self, INVOICE_ORDER_UNIQUE, ORDER_QUOTATION_UNIQUE},
        Database,
    },
    read,
};

use super::{Error, Memory, Storage};

/// Implements common [`Database`] operations for an entity stored in the
/// provided [`State`] table.
///
/// [`State`]: super::State
macro_rules! impl_entity {
    ($entity:ident, $module:ident, $table:ident) => {
        impl<S: Storage> Database<Select<By<Option<$entity>, $module::Id>>>
            for Memory<S>
        {
            type Ok = Option<$entity>;
            type Err = Traced<database::Error>;

            async fn execute(
                &self,
                Select(by): Select<By<Option<$entity>, $module::Id>>,
            ) -> Result<Self::Ok, Self::Err> {
                let id = by.into_inner();
                Ok(self.read(|s| s.$table.get(&id).cloned()).await)
            }
        }

        impl<S: Storage> Database<Lock<By<$entity, $module::Id>>>
            for Memory<S>
        {
            type Ok = ();
            type Err = Traced<database::Error>;

            async fn execute(
                &self,
                _: Lock<By<$entity, $module::Id>>,
            ) -> Result<Self::Ok, Self::Err> {
                // `Tx` holds the whole `State` exclusively already.
                Ok(())
            }
        }

        impl<S: Storage> Database<Select<By<Vec<$entity>, Scope>>>
            for Memory<S>
        {
            type Ok = Vec<$entity>;
            type Err = Traced<database::Error>;

            async fn execute(
                &self,
                Select(by): Select<By<Vec<$entity>, Scope>>,
            ) -> Result<Self::Ok, Self::Err> {
                let scope = by.into_inner();
                let mut list = self
                    .read(|s| {
                        s.$table
                            .values()
                            .filter(|e| e.is_in(scope))
                            .cloned()
                            .collect::<Vec<_>>()
                    })
                    .await;
                list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
                Ok(list)
            }
        }

        impl<S> Database<Insert<$entity>> for Memory<S>
        where
            Self:
                Database<Update<$entity>, Ok = (), Err = Traced<database::Error>>,
        {
            type Ok = ();
            type Err = Traced<database::Error>;

            async fn execute(
                &self,
                Insert(entity): Insert<$entity>,
            ) -> Result<Self::Ok, Self::Err> {
                self.execute(Update(entity)).await.map_err(tracerr::wrap!())
            }
        }
    };
}

impl_entity!(Quotation, quotation, quotations);
impl_entity!(Order, order, orders);
impl_entity!(Pickup, pickup, pickups);
impl_entity!(Return, rental_return, returns);
impl_entity!(Invoice, invoice, invoices);

impl<S, IDs> Database<Select<By<HashMap<product::Id, Product>, IDs>>>
    for Memory<S>
where
    S: Storage,
    IDs: AsRef<[product::Id]>,
{
    type Ok = HashMap<product::Id, Product>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<HashMap<product::Id, Product>, IDs>>,
    ) -> Result<Self::Ok, Self::Err> {
        let ids = by.into_inner();
        Ok(self
            .read(|s| {
                ids.as_ref()
                    .iter()
                    .filter_map(|id| s.products.get(id))
                    .map(|p| (p.id, p.clone()))
                    .collect()
            })
            .await)
    }
}

impl<S: Storage> Database<Select<By<Option<Product>, product::Id>>>
    for Memory<S>
{
    type Ok = Option<Product>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Product>, product::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self.read(|s| s.products.get(&id).cloned()).await)
    }
}

impl<S: Storage> Database<Lock<By<Product, product::Id>>> for Memory<S> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Lock<By<Product, product::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // `Tx` holds the whole `State` exclusively already.
        Ok(())
    }
}

impl<S: Storage> Database<Insert<Product>> for Memory<S> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(product): Insert<Product>,
    ) -> Result<Self::Ok, Self::Err> {
        self.write(|s| drop(s.products.insert(product.id, product)))
            .await;
        Ok(())
    }
}

impl<S: Storage> Database<Insert<Reservation>> for Memory<S> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(reservation): Insert<Reservation>,
    ) -> Result<Self::Ok, Self::Err> {
        self.write(|s| {
            if let Some(p) = s.products.get_mut(&reservation.product_id) {
                p.reservations.push(reservation);
            }
        })
        .await;
        Ok(())
    }
}

impl<S: Storage> Database<Delete<By<Reservation, order::Id>>> for Memory<S> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Reservation, order::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let order_id = by.into_inner();
        self.write(|s| {
            for p in s.products.values_mut() {
                p.reservations.retain(|r| r.order_id != order_id);
            }
        })
        .await;
        Ok(())
    }
}

impl<S: Storage> Database<Update<Quotation>> for Memory<S> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(quotation): Update<Quotation>,
    ) -> Result<Self::Ok, Self::Err> {
        self.write(|s| drop(s.quotations.insert(quotation.id, quotation)))
            .await;
        Ok(())
    }
}

impl<S: Storage> Database<Delete<By<Quotation, quotation::Id>>> for Memory<S> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Quotation, quotation::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        self.write(|s| drop(s.quotations.remove(&id))).await;
        Ok(())
    }
}

impl<S: Storage>
    Database<Update<By<Vec<quotation::Id>, read::quotation::Outdated>>>
    for Memory<S>
{
    type Ok = Vec<quotation::Id>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(by): Update<By<Vec<quotation::Id>, read::quotation::Outdated>>,
    ) -> Result<Self::Ok, Self::Err> {
        let read::quotation::Outdated(now) = by.into_inner();
        Ok(self
            .write(|s| {
                s.quotations
                    .values_mut()
                    .filter(|q| {
                        matches!(
                            q.status,
                            quotation::Status::Draft | quotation::Status::Sent,
                        ) && q.is_outdated_at(now)
                    })
                    .map(|q| {
                        q.status = quotation::Status::Expired;
                        q.updated_at = now.coerce();
                        q.id
                    })
                    .collect()
            })
            .await)
    }
}

impl<S: Storage> Database<Select<By<Option<Order>, quotation::Id>>>
    for Memory<S>
{
    type Ok = Option<Order>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Order>, quotation::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let quotation_id = by.into_inner();
        Ok(self
            .read(|s| {
                s.orders
                    .values()
                    .find(|o| o.quotation_id == Some(quotation_id))
                    .cloned()
            })
            .await)
    }
}

impl<S: Storage> Database<Update<Order>> for Memory<S> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(order): Update<Order>,
    ) -> Result<Self::Ok, Self::Err> {
        self.write(|s| {
            let duplicated = order.quotation_id.is_some()
                && s.orders.values().any(|o| {
                    o.id != order.id && o.quotation_id == order.quotation_id
                });
            if duplicated {
                return Err(tracerr::new!(Error::UniqueViolation(
                    ORDER_QUOTATION_UNIQUE
                )));
            }
            drop(s.orders.insert(order.id, order));
            Ok(())
        })
        .await
        .map_err(tracerr::map_from_and_wrap!())
    }
}

impl<S: Storage> Database<Update<Pickup>> for Memory<S> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(pickup): Update<Pickup>,
    ) -> Result<Self::Ok, Self::Err> {
        self.write(|s| drop(s.pickups.insert(pickup.id, pickup))).await;
        Ok(())
    }
}

impl<S: Storage> Database<Update<Return>> for Memory<S> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(ret): Update<Return>,
    ) -> Result<Self::Ok, Self::Err> {
        self.write(|s| drop(s.returns.insert(ret.id, ret))).await;
        Ok(())
    }
}

impl<S: Storage> Database<Select<By<Option<Invoice>, order::Id>>>
    for Memory<S>
{
    type Ok = Option<Invoice>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Invoice>, order::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let order_id = by.into_inner();
        Ok(self
            .read(|s| {
                s.invoices.values().find(|i| i.order_id == order_id).cloned()
            })
            .await)
    }
}

impl<S: Storage> Database<Update<Invoice>> for Memory<S> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(invoice): Update<Invoice>,
    ) -> Result<Self::Ok, Self::Err> {
        self.write(|s| {
            if s
                .invoices
                .values()
                .any(|i| i.id != invoice.id && i.order_id == invoice.order_id)
            {
                return Err(tracerr::new!(Error::UniqueViolation(
                    INVOICE_ORDER_UNIQUE
                )));
            }
            drop(s.invoices.insert(invoice.id, invoice));
            Ok(())
        })
        .await
        .map_err(tracerr::map_from_and_wrap!())
    }
}

impl<S: Storage> Database<Next<sequence::Kind>> for Memory<S> {
    type Ok = sequence::Number;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Next(kind): Next<sequence::Kind>,
    ) -> Result<Self::Ok, Self::Err> {
        let value = self
            .write(|s| {
                let last = s.sequences.entry(kind.u8()).or_default();
                *last += 1;
                *last
            })
            .await;
        Ok(kind.number(value))
    }
}
