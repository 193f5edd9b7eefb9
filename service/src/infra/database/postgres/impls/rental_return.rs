//! [`Return`]-related [`Database`] implementations.

use std::collections::HashMap;

use common::operations::{By, Insert, Lock, Select, Update};
use postgres_types::ToSql;
use tracerr::Traced;

use crate::{
    domain::{access::Scope, rental_return, Return},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

use super::{money, position_param, quantity, quantity_param, scope_condition};

impl<C, IDs> Database<Select<By<HashMap<rental_return::Id, Return>, IDs>>>
    for Postgres<C>
where
    C: Connection,
    IDs: AsRef<[rental_return::Id]>,
{
    type Ok = HashMap<rental_return::Id, Return>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<HashMap<rental_return::Id, Return>, IDs>>,
    ) -> Result<Self::Ok, Self::Err> {
        let ids = by.into_inner();
        // Avoid subtle change for SQL.
        let ids: &[rental_return::Id] = ids.as_ref();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let limit = i32::try_from(ids.len()).unwrap();

        const SQL: &str = "\
            SELECT id, number, order_id, customer_id, vendor_id, currency, \
                   expected_at, returned_at, late_days, \
                   late_return_fee, total_damage_fee, \
                   status, completed_at, created_at \
            FROM returns \
            WHERE id IN (SELECT unnest($1::UUID[]) LIMIT $2::INT4) \
            LIMIT $2::INT4";
        let mut returns = self
            .query(SQL, &[&ids, &limit])
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| {
                let id = row.get("id");
                let currency = row.get("currency");
                (
                    id,
                    Return {
                        id,
                        number: row.get("number"),
                        order_id: row.get("order_id"),
                        customer_id: row.get("customer_id"),
                        vendor_id: row.get("vendor_id"),
                        items: vec![],
                        expected_at: row.get("expected_at"),
                        returned_at: row.get("returned_at"),
                        late_days: u32::try_from(row.get::<_, i64>("late_days"))
                            .expect("`late_days` overflow"),
                        late_return_fee: money(
                            &row,
                            "late_return_fee",
                            currency,
                        ),
                        total_damage_fee: money(
                            &row,
                            "total_damage_fee",
                            currency,
                        ),
                        status: row.get("status"),
                        completed_at: row.get("completed_at"),
                        created_at: row.get("created_at"),
                    },
                )
            })
            .collect::<HashMap<_, _>>();

        const ITEMS_SQL: &str = "\
            SELECT return_id, product_id, quantity, condition, \
                   damage_fee, damage_notes \
            FROM return_items \
            WHERE return_id = ANY($1::UUID[]) \
            ORDER BY return_id, position";
        for row in self
            .query(ITEMS_SQL, &[&ids])
            .await
            .map_err(tracerr::wrap!())?
        {
            let id = row.get::<_, rental_return::Id>("return_id");
            if let Some(r) = returns.get_mut(&id) {
                let currency = r.late_return_fee.currency;
                r.items.push(rental_return::Item {
                    product_id: row.get("product_id"),
                    quantity: quantity(&row),
                    condition: row.get("condition"),
                    damage_fee: money(&row, "damage_fee", currency),
                    damage_notes: row.get("damage_notes"),
                });
            }
        }

        Ok(returns)
    }
}

impl<C> Database<Select<By<Option<Return>, rental_return::Id>>> for Postgres<C>
where
    C: Connection,
    Self: Database<
        Select<
            By<HashMap<rental_return::Id, Return>, [rental_return::Id; 1]>,
        >,
        Ok = HashMap<rental_return::Id, Return>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Option<Return>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Return>, rental_return::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self
            .execute(Select(By::new([id])))
            .await
            .map_err(tracerr::wrap!())?
            .remove(&id))
    }
}

impl<C> Database<Select<By<Vec<Return>, Scope>>> for Postgres<C>
where
    C: Connection,
    Self: Database<
        Select<By<HashMap<rental_return::Id, Return>, Vec<rental_return::Id>>>,
        Ok = HashMap<rental_return::Id, Return>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Vec<Return>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Return>, Scope>>,
    ) -> Result<Self::Ok, Self::Err> {
        let (condition, user_id) = scope_condition(by.into_inner());
        let ps: Vec<&(dyn ToSql + Sync)> =
            user_id.iter().map(|id| -> &(dyn ToSql + Sync) { id }).collect();

        let sql = format!(
            "SELECT id \
             FROM returns \
             WHERE {condition} \
             ORDER BY created_at DESC, id DESC",
        );
        let ids = self
            .query(&sql, ps.as_slice())
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| row.get("id"))
            .collect::<Vec<rental_return::Id>>();

        let mut returns = self
            .execute(Select(By::new(ids.clone())))
            .await
            .map_err(tracerr::wrap!())?;
        Ok(ids.iter().filter_map(|id| returns.remove(id)).collect())
    }
}

impl<C> Database<Lock<By<Return, rental_return::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Return, rental_return::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: rental_return::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id \
            FROM returns \
            WHERE id = $1::UUID \
            FOR UPDATE";
        self.query(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Insert<Return>> for Postgres<C>
where
    C: Connection,
    Self: Database<Update<Return>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(ret): Insert<Return>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(ret)).await.map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<Return>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(ret): Update<Return>,
    ) -> Result<Self::Ok, Self::Err> {
        let Return {
            id,
            number,
            order_id,
            customer_id,
            vendor_id,
            items,
            expected_at,
            returned_at,
            late_days,
            late_return_fee,
            total_damage_fee,
            status,
            completed_at,
            created_at,
        } = ret;

        const SQL: &str = "\
            INSERT INTO returns (\
                id, number, order_id, customer_id, vendor_id, currency, \
                expected_at, returned_at, late_days, \
                late_return_fee, total_damage_fee, \
                status, completed_at, created_at\
            ) VALUES (\
                $1::UUID, $2::VARCHAR, $3::UUID, $4::UUID, $5::UUID, \
                $6::INT2, \
                $7::TIMESTAMPTZ, $8::TIMESTAMPTZ, $9::INT8, \
                $10::NUMERIC, $11::NUMERIC, \
                $12::INT2, $13::TIMESTAMPTZ, $14::TIMESTAMPTZ\
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET number = EXCLUDED.number, \
                order_id = EXCLUDED.order_id, \
                customer_id = EXCLUDED.customer_id, \
                vendor_id = EXCLUDED.vendor_id, \
                currency = EXCLUDED.currency, \
                expected_at = EXCLUDED.expected_at, \
                returned_at = EXCLUDED.returned_at, \
                late_days = EXCLUDED.late_days, \
                late_return_fee = EXCLUDED.late_return_fee, \
                total_damage_fee = EXCLUDED.total_damage_fee, \
                status = EXCLUDED.status, \
                completed_at = EXCLUDED.completed_at, \
                created_at = EXCLUDED.created_at";
        _ = self
            .exec(
                SQL,
                &[
                    &id,
                    &number,
                    &order_id,
                    &customer_id,
                    &vendor_id,
                    &late_return_fee.currency,
                    &expected_at,
                    &returned_at,
                    &i64::from(late_days),
                    &late_return_fee.amount,
                    &total_damage_fee.amount,
                    &status,
                    &completed_at,
                    &created_at,
                ],
            )
            .await
            .map_err(tracerr::wrap!())?;

        const DELETE_ITEMS_SQL: &str = "\
            DELETE FROM return_items \
            WHERE return_id = $1::UUID";
        _ = self
            .exec(DELETE_ITEMS_SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())?;

        const ITEM_SQL: &str = "\
            INSERT INTO return_items (\
                return_id, position, product_id, quantity, condition, \
                damage_fee, damage_notes\
            ) VALUES (\
                $1::UUID, $2::INT4, $3::UUID, $4::INT8, $5::INT2, \
                $6::NUMERIC, $7::VARCHAR\
            )";
        for (position, item) in items.iter().enumerate() {
            _ = self
                .exec(
                    ITEM_SQL,
                    &[
                        &id,
                        &position_param(position),
                        &item.product_id,
                        &quantity_param(item.quantity),
                        &item.condition,
                        &item.damage_fee.amount,
                        &item.damage_notes,
                    ],
                )
                .await
                .map_err(tracerr::wrap!())?;
        }

        Ok(())
    }
}
