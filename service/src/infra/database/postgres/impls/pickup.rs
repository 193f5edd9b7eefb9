//! [`Pickup`]-related [`Database`] implementations.

use std::collections::HashMap;

use common::operations::{By, Insert, Lock, Select, Update};
use postgres_types::ToSql;
use tracerr::Traced;

use crate::{
    domain::{access::Scope, pickup, Pickup},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

use super::{position_param, quantity, quantity_param, scope_condition};

impl<C, IDs> Database<Select<By<HashMap<pickup::Id, Pickup>, IDs>>>
    for Postgres<C>
where
    C: Connection,
    IDs: AsRef<[pickup::Id]>,
{
    type Ok = HashMap<pickup::Id, Pickup>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<HashMap<pickup::Id, Pickup>, IDs>>,
    ) -> Result<Self::Ok, Self::Err> {
        let ids = by.into_inner();
        // Avoid subtle change for SQL.
        let ids: &[pickup::Id] = ids.as_ref();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let limit = i32::try_from(ids.len()).unwrap();

        const SQL: &str = "\
            SELECT id, number, order_id, customer_id, vendor_id, status, \
                   scheduled_at, picked_up_at, instructions, created_at \
            FROM pickups \
            WHERE id IN (SELECT unnest($1::UUID[]) LIMIT $2::INT4) \
            LIMIT $2::INT4";
        let mut pickups = self
            .query(SQL, &[&ids, &limit])
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| {
                let id = row.get("id");
                (
                    id,
                    Pickup {
                        id,
                        number: row.get("number"),
                        order_id: row.get("order_id"),
                        customer_id: row.get("customer_id"),
                        vendor_id: row.get("vendor_id"),
                        items: vec![],
                        status: row.get("status"),
                        scheduled_at: row.get("scheduled_at"),
                        picked_up_at: row.get("picked_up_at"),
                        instructions: row.get("instructions"),
                        created_at: row.get("created_at"),
                    },
                )
            })
            .collect::<HashMap<_, _>>();

        const ITEMS_SQL: &str = "\
            SELECT pickup_id, product_id, quantity, condition \
            FROM pickup_items \
            WHERE pickup_id = ANY($1::UUID[]) \
            ORDER BY pickup_id, position";
        for row in self
            .query(ITEMS_SQL, &[&ids])
            .await
            .map_err(tracerr::wrap!())?
        {
            let id = row.get::<_, pickup::Id>("pickup_id");
            if let Some(p) = pickups.get_mut(&id) {
                p.items.push(pickup::Item {
                    product_id: row.get("product_id"),
                    quantity: quantity(&row),
                    condition: row.get("condition"),
                });
            }
        }

        Ok(pickups)
    }
}

impl<C> Database<Select<By<Option<Pickup>, pickup::Id>>> for Postgres<C>
where
    C: Connection,
    Self: Database<
        Select<By<HashMap<pickup::Id, Pickup>, [pickup::Id; 1]>>,
        Ok = HashMap<pickup::Id, Pickup>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Option<Pickup>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Pickup>, pickup::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self
            .execute(Select(By::new([id])))
            .await
            .map_err(tracerr::wrap!())?
            .remove(&id))
    }
}

impl<C> Database<Select<By<Vec<Pickup>, Scope>>> for Postgres<C>
where
    C: Connection,
    Self: Database<
        Select<By<HashMap<pickup::Id, Pickup>, Vec<pickup::Id>>>,
        Ok = HashMap<pickup::Id, Pickup>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Vec<Pickup>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Pickup>, Scope>>,
    ) -> Result<Self::Ok, Self::Err> {
        let (condition, user_id) = scope_condition(by.into_inner());
        let ps: Vec<&(dyn ToSql + Sync)> =
            user_id.iter().map(|id| -> &(dyn ToSql + Sync) { id }).collect();

        let sql = format!(
            "SELECT id \
             FROM pickups \
             WHERE {condition} \
             ORDER BY created_at DESC, id DESC",
        );
        let ids = self
            .query(&sql, ps.as_slice())
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| row.get("id"))
            .collect::<Vec<pickup::Id>>();

        let mut pickups = self
            .execute(Select(By::new(ids.clone())))
            .await
            .map_err(tracerr::wrap!())?;
        Ok(ids.iter().filter_map(|id| pickups.remove(id)).collect())
    }
}

impl<C> Database<Lock<By<Pickup, pickup::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Pickup, pickup::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: pickup::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id \
            FROM pickups \
            WHERE id = $1::UUID \
            FOR UPDATE";
        self.query(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Insert<Pickup>> for Postgres<C>
where
    C: Connection,
    Self: Database<Update<Pickup>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(pickup): Insert<Pickup>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(pickup)).await.map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<Pickup>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(pickup): Update<Pickup>,
    ) -> Result<Self::Ok, Self::Err> {
        let Pickup {
            id,
            number,
            order_id,
            customer_id,
            vendor_id,
            items,
            status,
            scheduled_at,
            picked_up_at,
            instructions,
            created_at,
        } = pickup;

        const SQL: &str = "\
            INSERT INTO pickups (\
                id, number, order_id, customer_id, vendor_id, status, \
                scheduled_at, picked_up_at, instructions, created_at\
            ) VALUES (\
                $1::UUID, $2::VARCHAR, $3::UUID, $4::UUID, $5::UUID, \
                $6::INT2, \
                $7::TIMESTAMPTZ, $8::TIMESTAMPTZ, $9::VARCHAR, \
                $10::TIMESTAMPTZ\
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET number = EXCLUDED.number, \
                order_id = EXCLUDED.order_id, \
                customer_id = EXCLUDED.customer_id, \
                vendor_id = EXCLUDED.vendor_id, \
                status = EXCLUDED.status, \
                scheduled_at = EXCLUDED.scheduled_at, \
                picked_up_at = EXCLUDED.picked_up_at, \
                instructions = EXCLUDED.instructions, \
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
                    &status,
                    &scheduled_at,
                    &picked_up_at,
                    &instructions,
                    &created_at,
                ],
            )
            .await
            .map_err(tracerr::wrap!())?;

        const DELETE_ITEMS_SQL: &str = "\
            DELETE FROM pickup_items \
            WHERE pickup_id = $1::UUID";
        _ = self
            .exec(DELETE_ITEMS_SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())?;

        const ITEM_SQL: &str = "\
            INSERT INTO pickup_items (\
                pickup_id, position, product_id, quantity, condition\
            ) VALUES (\
                $1::UUID, $2::INT4, $3::UUID, $4::INT8, $5::INT2\
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
                    ],
                )
                .await
                .map_err(tracerr::wrap!())?;
        }

        Ok(())
    }
}
