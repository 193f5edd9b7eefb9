//! [`Product`]-related [`Database`] implementations.

use std::collections::HashMap;

use common::operations::{By, Delete, Insert, Lock, Select};
use tracerr::Traced;

use crate::{
    domain::{
        order,
        product::{self, Pricing, Reservation},
        Product,
    },
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

use super::{period, quantity, quantity_param};

impl<C, IDs> Database<Select<By<HashMap<product::Id, Product>, IDs>>>
    for Postgres<C>
where
    C: Connection,
    IDs: AsRef<[product::Id]>,
{
    type Ok = HashMap<product::Id, Product>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<HashMap<product::Id, Product>, IDs>>,
    ) -> Result<Self::Ok, Self::Err> {
        let ids = by.into_inner();
        // Avoid subtle change for SQL.
        let ids: &[product::Id] = ids.as_ref();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let limit = i32::try_from(ids.len()).unwrap();

        const SQL: &str = "\
            SELECT id, name, vendor_id, quantity_on_hand, \
                   currency, hourly_rate, daily_rate, weekly_rate \
            FROM products \
            WHERE id IN (SELECT unnest($1::UUID[]) LIMIT $2::INT4) \
            LIMIT $2::INT4";
        let mut products = self
            .query(SQL, &[&ids, &limit])
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| {
                let id = row.get("id");
                (
                    id,
                    Product {
                        id,
                        name: row.get("name"),
                        vendor_id: row.get("vendor_id"),
                        quantity_on_hand: u32::try_from(
                            row.get::<_, i64>("quantity_on_hand"),
                        )
                        .expect("`quantity_on_hand` overflow"),
                        pricing: Pricing {
                            currency: row.get("currency"),
                            hourly: row.get("hourly_rate"),
                            daily: row.get("daily_rate"),
                            weekly: row.get("weekly_rate"),
                        },
                        reservations: vec![],
                    },
                )
            })
            .collect::<HashMap<_, _>>();

        const RESERVATIONS_SQL: &str = "\
            SELECT product_id, order_id, quantity, start_at, end_at \
            FROM reservations \
            WHERE product_id = ANY($1::UUID[]) \
            ORDER BY start_at";
        for row in self
            .query(RESERVATIONS_SQL, &[&ids])
            .await
            .map_err(tracerr::wrap!())?
        {
            let product_id = row.get("product_id");
            if let Some(p) = products.get_mut(&product_id) {
                p.reservations.push(Reservation {
                    product_id,
                    order_id: row.get("order_id"),
                    quantity: quantity(&row),
                    period: period(&row),
                });
            }
        }

        Ok(products)
    }
}

impl<C> Database<Select<By<Option<Product>, product::Id>>> for Postgres<C>
where
    C: Connection,
    Self: Database<
        Select<By<HashMap<product::Id, Product>, [product::Id; 1]>>,
        Ok = HashMap<product::Id, Product>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Option<Product>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Product>, product::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self
            .execute(Select(By::new([id])))
            .await
            .map_err(tracerr::wrap!())?
            .remove(&id))
    }
}

impl<C> Database<Lock<By<Product, product::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Product, product::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: product::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id \
            FROM products \
            WHERE id = $1::UUID \
            FOR UPDATE";
        self.query(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Insert<Product>> for Postgres<C>
where
    C: Connection,
    Self: Database<Insert<Reservation>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(product): Insert<Product>,
    ) -> Result<Self::Ok, Self::Err> {
        let Product {
            id,
            name,
            vendor_id,
            quantity_on_hand,
            pricing:
                Pricing {
                    currency,
                    hourly,
                    daily,
                    weekly,
                },
            reservations,
        } = product;

        let quantity_on_hand = i64::from(quantity_on_hand);

        const SQL: &str = "\
            INSERT INTO products (\
                id, name, vendor_id, quantity_on_hand, \
                currency, hourly_rate, daily_rate, weekly_rate\
            ) VALUES (\
                $1::UUID, $2::VARCHAR, $3::UUID, $4::INT8, \
                $5::INT2, $6::NUMERIC, $7::NUMERIC, $8::NUMERIC\
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET name = EXCLUDED.name, \
                vendor_id = EXCLUDED.vendor_id, \
                quantity_on_hand = EXCLUDED.quantity_on_hand, \
                currency = EXCLUDED.currency, \
                hourly_rate = EXCLUDED.hourly_rate, \
                daily_rate = EXCLUDED.daily_rate, \
                weekly_rate = EXCLUDED.weekly_rate";
        _ = self
            .exec(
                SQL,
                &[
                    &id,
                    &name,
                    &vendor_id,
                    &quantity_on_hand,
                    &currency,
                    &hourly,
                    &daily,
                    &weekly,
                ],
            )
            .await
            .map_err(tracerr::wrap!())?;

        const DELETE_SQL: &str = "\
            DELETE FROM reservations \
            WHERE product_id = $1::UUID";
        _ = self
            .exec(DELETE_SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())?;

        for r in reservations {
            self.execute(Insert(r)).await.map_err(tracerr::wrap!())?;
        }
        Ok(())
    }
}

impl<C> Database<Insert<Reservation>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(reservation): Insert<Reservation>,
    ) -> Result<Self::Ok, Self::Err> {
        let Reservation {
            product_id,
            order_id,
            quantity,
            period,
        } = reservation;

        const SQL: &str = "\
            INSERT INTO reservations (\
                product_id, order_id, quantity, start_at, end_at\
            ) VALUES (\
                $1::UUID, $2::UUID, $3::INT8, \
                $4::TIMESTAMPTZ, $5::TIMESTAMPTZ\
            )";
        self.exec(
            SQL,
            &[
                &product_id,
                &order_id,
                &quantity_param(quantity),
                &period.start(),
                &period.end(),
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Delete<By<Reservation, order::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Reservation, order::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let order_id: order::Id = by.into_inner();

        const SQL: &str = "\
            DELETE FROM reservations \
            WHERE order_id = $1::UUID";
        self.exec(SQL, &[&order_id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}
