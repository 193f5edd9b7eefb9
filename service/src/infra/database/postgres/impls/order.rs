//! [`Order`]-related [`Database`] implementations.

use std::collections::HashMap;

use common::operations::{By, Insert, Lock, Select, Update};
use postgres_types::ToSql;
use tracerr::Traced;

use crate::{
    domain::{
        access::Scope,
        order, quotation,
        rental::{self, Totals},
        Order,
    },
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

use super::{
    money, position_param, quantity_param, rental_item, scope_condition,
    totals,
};

impl<C, IDs> Database<Select<By<HashMap<order::Id, Order>, IDs>>>
    for Postgres<C>
where
    C: Connection,
    IDs: AsRef<[order::Id]>,
{
    type Ok = HashMap<order::Id, Order>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<HashMap<order::Id, Order>, IDs>>,
    ) -> Result<Self::Ok, Self::Err> {
        let ids = by.into_inner();
        // Avoid subtle change for SQL.
        let ids: &[order::Id] = ids.as_ref();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let limit = i32::try_from(ids.len()).unwrap();

        const SQL: &str = "\
            SELECT id, number, quotation_id, customer_id, vendor_id, \
                   currency, subtotal, tax_rate, tax_amount, total_amount, \
                   security_deposit, status, payment_status, \
                   shipping_address, notes, \
                   pickup_at, return_at, actual_return_at, late_return_fee, \
                   created_at, updated_at \
            FROM orders \
            WHERE id IN (SELECT unnest($1::UUID[]) LIMIT $2::INT4) \
            LIMIT $2::INT4";
        let mut orders = self
            .query(SQL, &[&ids, &limit])
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| {
                let id = row.get("id");
                let currency = row.get("currency");
                (
                    id,
                    Order {
                        id,
                        number: row.get("number"),
                        quotation_id: row.get("quotation_id"),
                        customer_id: row.get("customer_id"),
                        vendor_id: row.get("vendor_id"),
                        items: vec![],
                        totals: totals(&row),
                        security_deposit: money(
                            &row,
                            "security_deposit",
                            currency,
                        ),
                        status: row.get("status"),
                        payment_status: row.get("payment_status"),
                        shipping_address: row.get("shipping_address"),
                        notes: row.get("notes"),
                        pickup_date: row.get("pickup_at"),
                        return_date: row.get("return_at"),
                        actual_return_date: row.get("actual_return_at"),
                        late_return_fee: money(
                            &row,
                            "late_return_fee",
                            currency,
                        ),
                        created_at: row.get("created_at"),
                        updated_at: row.get("updated_at"),
                    },
                )
            })
            .collect::<HashMap<_, _>>();

        const ITEMS_SQL: &str = "\
            SELECT order_id, product_id, vendor_id, quantity, \
                   start_at, end_at, duration_value, duration_unit, \
                   price_per_unit, total_price, status \
            FROM order_items \
            WHERE order_id = ANY($1::UUID[]) \
            ORDER BY order_id, position";
        for row in self
            .query(ITEMS_SQL, &[&ids])
            .await
            .map_err(tracerr::wrap!())?
        {
            let id = row.get::<_, order::Id>("order_id");
            if let Some(o) = orders.get_mut(&id) {
                let currency = o.totals.subtotal.currency;
                o.items.push(order::Item {
                    line: rental_item(&row, currency),
                    status: row.get("status"),
                });
            }
        }

        Ok(orders)
    }
}

impl<C> Database<Select<By<Option<Order>, order::Id>>> for Postgres<C>
where
    C: Connection,
    Self: Database<
        Select<By<HashMap<order::Id, Order>, [order::Id; 1]>>,
        Ok = HashMap<order::Id, Order>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Option<Order>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Order>, order::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self
            .execute(Select(By::new([id])))
            .await
            .map_err(tracerr::wrap!())?
            .remove(&id))
    }
}

impl<C> Database<Select<By<Option<Order>, quotation::Id>>> for Postgres<C>
where
    C: Connection,
    Self: Database<
        Select<By<Option<Order>, order::Id>>,
        Ok = Option<Order>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Option<Order>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Order>, quotation::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let quotation_id: quotation::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id \
            FROM orders \
            WHERE quotation_id = $1::UUID \
            LIMIT 1";
        let Some(row) = self
            .query_opt(SQL, &[&quotation_id])
            .await
            .map_err(tracerr::wrap!())?
        else {
            return Ok(None);
        };

        self.execute(Select(By::<Option<Order>, order::Id>::new(
            row.get("id"),
        )))
        .await
        .map_err(tracerr::wrap!())
    }
}

impl<C> Database<Select<By<Vec<Order>, Scope>>> for Postgres<C>
where
    C: Connection,
    Self: Database<
        Select<By<HashMap<order::Id, Order>, Vec<order::Id>>>,
        Ok = HashMap<order::Id, Order>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Vec<Order>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Order>, Scope>>,
    ) -> Result<Self::Ok, Self::Err> {
        let (condition, user_id) = scope_condition(by.into_inner());
        let ps: Vec<&(dyn ToSql + Sync)> =
            user_id.iter().map(|id| -> &(dyn ToSql + Sync) { id }).collect();

        let sql = format!(
            "SELECT id \
             FROM orders \
             WHERE {condition} \
             ORDER BY created_at DESC, id DESC",
        );
        let ids = self
            .query(&sql, ps.as_slice())
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| row.get("id"))
            .collect::<Vec<order::Id>>();

        let mut orders = self
            .execute(Select(By::new(ids.clone())))
            .await
            .map_err(tracerr::wrap!())?;
        Ok(ids.iter().filter_map(|id| orders.remove(id)).collect())
    }
}

impl<C> Database<Lock<By<Order, order::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Order, order::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: order::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id \
            FROM orders \
            WHERE id = $1::UUID \
            FOR UPDATE";
        self.query(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Insert<Order>> for Postgres<C>
where
    C: Connection,
    Self: Database<Update<Order>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(order): Insert<Order>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(order)).await.map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<Order>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(order): Update<Order>,
    ) -> Result<Self::Ok, Self::Err> {
        let Order {
            id,
            number,
            quotation_id,
            customer_id,
            vendor_id,
            items,
            totals:
                Totals {
                    subtotal,
                    tax_rate,
                    tax_amount,
                    total_amount,
                },
            security_deposit,
            status,
            payment_status,
            shipping_address,
            notes,
            pickup_date,
            return_date,
            actual_return_date,
            late_return_fee,
            created_at,
            updated_at,
        } = order;

        const SQL: &str = "\
            INSERT INTO orders (\
                id, number, quotation_id, customer_id, vendor_id, \
                currency, subtotal, tax_rate, tax_amount, total_amount, \
                security_deposit, status, payment_status, \
                shipping_address, notes, \
                pickup_at, return_at, actual_return_at, late_return_fee, \
                created_at, updated_at\
            ) VALUES (\
                $1::UUID, $2::VARCHAR, $3::UUID, $4::UUID, $5::UUID, \
                $6::INT2, $7::NUMERIC, $8::NUMERIC, $9::NUMERIC, \
                $10::NUMERIC, \
                $11::NUMERIC, $12::INT2, $13::INT2, \
                $14::VARCHAR, $15::VARCHAR, \
                $16::TIMESTAMPTZ, $17::TIMESTAMPTZ, $18::TIMESTAMPTZ, \
                $19::NUMERIC, \
                $20::TIMESTAMPTZ, $21::TIMESTAMPTZ\
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET number = EXCLUDED.number, \
                quotation_id = EXCLUDED.quotation_id, \
                customer_id = EXCLUDED.customer_id, \
                vendor_id = EXCLUDED.vendor_id, \
                currency = EXCLUDED.currency, \
                subtotal = EXCLUDED.subtotal, \
                tax_rate = EXCLUDED.tax_rate, \
                tax_amount = EXCLUDED.tax_amount, \
                total_amount = EXCLUDED.total_amount, \
                security_deposit = EXCLUDED.security_deposit, \
                status = EXCLUDED.status, \
                payment_status = EXCLUDED.payment_status, \
                shipping_address = EXCLUDED.shipping_address, \
                notes = EXCLUDED.notes, \
                pickup_at = EXCLUDED.pickup_at, \
                return_at = EXCLUDED.return_at, \
                actual_return_at = EXCLUDED.actual_return_at, \
                late_return_fee = EXCLUDED.late_return_fee, \
                created_at = EXCLUDED.created_at, \
                updated_at = EXCLUDED.updated_at";
        _ = self
            .exec(
                SQL,
                &[
                    &id,
                    &number,
                    &quotation_id,
                    &customer_id,
                    &vendor_id,
                    &subtotal.currency,
                    &subtotal.amount,
                    &tax_rate,
                    &tax_amount.amount,
                    &total_amount.amount,
                    &security_deposit.amount,
                    &status,
                    &payment_status,
                    &shipping_address,
                    &notes,
                    &pickup_date,
                    &return_date,
                    &actual_return_date,
                    &late_return_fee.amount,
                    &created_at,
                    &updated_at,
                ],
            )
            .await
            .map_err(tracerr::wrap!())?;

        const DELETE_ITEMS_SQL: &str = "\
            DELETE FROM order_items \
            WHERE order_id = $1::UUID";
        _ = self
            .exec(DELETE_ITEMS_SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())?;

        const ITEM_SQL: &str = "\
            INSERT INTO order_items (\
                order_id, position, product_id, vendor_id, quantity, \
                start_at, end_at, duration_value, duration_unit, \
                price_per_unit, total_price, status\
            ) VALUES (\
                $1::UUID, $2::INT4, $3::UUID, $4::UUID, $5::INT8, \
                $6::TIMESTAMPTZ, $7::TIMESTAMPTZ, $8::INT8, $9::INT2, \
                $10::NUMERIC, $11::NUMERIC, $12::INT2\
            )";
        for (position, item) in items.iter().enumerate() {
            let order::Item {
                line:
                    rental::Item {
                        product_id,
                        vendor_id,
                        quantity,
                        period,
                        duration,
                        price_per_unit,
                        total_price,
                    },
                status,
            } = item;
            _ = self
                .exec(
                    ITEM_SQL,
                    &[
                        &id,
                        &position_param(position),
                        product_id,
                        vendor_id,
                        &quantity_param(*quantity),
                        &period.start(),
                        &period.end(),
                        &i64::from(duration.value),
                        &duration.unit,
                        &price_per_unit.amount,
                        &total_price.amount,
                        status,
                    ],
                )
                .await
                .map_err(tracerr::wrap!())?;
        }

        Ok(())
    }
}
