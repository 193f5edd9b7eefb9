//! [`Quotation`]-related [`Database`] implementations.

use std::collections::HashMap;

use common::operations::{By, Delete, Insert, Lock, Select, Update};
use postgres_types::ToSql;
use tracerr::Traced;

use crate::{
    domain::{
        access::Scope,
        quotation,
        rental::{self, Totals},
        Quotation,
    },
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read,
};

use super::{position_param, quantity_param, rental_item, totals};

impl<C, IDs> Database<Select<By<HashMap<quotation::Id, Quotation>, IDs>>>
    for Postgres<C>
where
    C: Connection,
    IDs: AsRef<[quotation::Id]>,
{
    type Ok = HashMap<quotation::Id, Quotation>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<HashMap<quotation::Id, Quotation>, IDs>>,
    ) -> Result<Self::Ok, Self::Err> {
        let ids = by.into_inner();
        // Avoid subtle change for SQL.
        let ids: &[quotation::Id] = ids.as_ref();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let limit = i32::try_from(ids.len()).unwrap();

        const SQL: &str = "\
            SELECT id, number, customer_id, \
                   currency, subtotal, tax_rate, tax_amount, total_amount, \
                   status, notes, valid_until, created_at, updated_at \
            FROM quotations \
            WHERE id IN (SELECT unnest($1::UUID[]) LIMIT $2::INT4) \
            LIMIT $2::INT4";
        let mut quotations = self
            .query(SQL, &[&ids, &limit])
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| {
                let id = row.get("id");
                (
                    id,
                    Quotation {
                        id,
                        number: row.get("number"),
                        customer_id: row.get("customer_id"),
                        items: vec![],
                        totals: totals(&row),
                        status: row.get("status"),
                        notes: row.get("notes"),
                        valid_until: row.get("valid_until"),
                        created_at: row.get("created_at"),
                        updated_at: row.get("updated_at"),
                    },
                )
            })
            .collect::<HashMap<_, _>>();

        const ITEMS_SQL: &str = "\
            SELECT quotation_id, product_id, vendor_id, quantity, \
                   start_at, end_at, duration_value, duration_unit, \
                   price_per_unit, total_price \
            FROM quotation_items \
            WHERE quotation_id = ANY($1::UUID[]) \
            ORDER BY quotation_id, position";
        for row in self
            .query(ITEMS_SQL, &[&ids])
            .await
            .map_err(tracerr::wrap!())?
        {
            let id = row.get::<_, quotation::Id>("quotation_id");
            if let Some(q) = quotations.get_mut(&id) {
                let currency = q.totals.subtotal.currency;
                q.items.push(rental_item(&row, currency));
            }
        }

        Ok(quotations)
    }
}

impl<C> Database<Select<By<Option<Quotation>, quotation::Id>>> for Postgres<C>
where
    C: Connection,
    Self: Database<
        Select<By<HashMap<quotation::Id, Quotation>, [quotation::Id; 1]>>,
        Ok = HashMap<quotation::Id, Quotation>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Option<Quotation>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Quotation>, quotation::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self
            .execute(Select(By::new([id])))
            .await
            .map_err(tracerr::wrap!())?
            .remove(&id))
    }
}

impl<C> Database<Select<By<Vec<Quotation>, Scope>>> for Postgres<C>
where
    C: Connection,
    Self: Database<
        Select<By<HashMap<quotation::Id, Quotation>, Vec<quotation::Id>>>,
        Ok = HashMap<quotation::Id, Quotation>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Vec<Quotation>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Quotation>, Scope>>,
    ) -> Result<Self::Ok, Self::Err> {
        let (condition, user_id) = match by.into_inner() {
            Scope::All => ("true", None),
            Scope::Customer(id) => ("customer_id = $1::UUID", Some(id)),
            Scope::Vendor(id) => (
                "EXISTS (SELECT 1 \
                         FROM quotation_items \
                         WHERE quotation_id = quotations.id \
                           AND vendor_id = $1::UUID)",
                Some(id),
            ),
        };
        let ps: Vec<&(dyn ToSql + Sync)> =
            user_id.iter().map(|id| -> &(dyn ToSql + Sync) { id }).collect();

        let sql = format!(
            "SELECT id \
             FROM quotations \
             WHERE {condition} \
             ORDER BY created_at DESC, id DESC",
        );
        let ids = self
            .query(&sql, ps.as_slice())
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| row.get("id"))
            .collect::<Vec<quotation::Id>>();

        let mut quotations = self
            .execute(Select(By::new(ids.clone())))
            .await
            .map_err(tracerr::wrap!())?;
        Ok(ids.iter().filter_map(|id| quotations.remove(id)).collect())
    }
}

impl<C> Database<Lock<By<Quotation, quotation::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Quotation, quotation::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: quotation::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id \
            FROM quotations \
            WHERE id = $1::UUID \
            FOR UPDATE";
        self.query(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Insert<Quotation>> for Postgres<C>
where
    C: Connection,
    Self: Database<Update<Quotation>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(quotation): Insert<Quotation>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(quotation))
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<Quotation>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(quotation): Update<Quotation>,
    ) -> Result<Self::Ok, Self::Err> {
        let Quotation {
            id,
            number,
            customer_id,
            items,
            totals:
                Totals {
                    subtotal,
                    tax_rate,
                    tax_amount,
                    total_amount,
                },
            status,
            notes,
            valid_until,
            created_at,
            updated_at,
        } = quotation;

        const SQL: &str = "\
            INSERT INTO quotations (\
                id, number, customer_id, \
                currency, subtotal, tax_rate, tax_amount, total_amount, \
                status, notes, valid_until, created_at, updated_at\
            ) VALUES (\
                $1::UUID, $2::VARCHAR, $3::UUID, \
                $4::INT2, $5::NUMERIC, $6::NUMERIC, $7::NUMERIC, $8::NUMERIC, \
                $9::INT2, $10::VARCHAR, \
                $11::TIMESTAMPTZ, $12::TIMESTAMPTZ, $13::TIMESTAMPTZ\
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET number = EXCLUDED.number, \
                customer_id = EXCLUDED.customer_id, \
                currency = EXCLUDED.currency, \
                subtotal = EXCLUDED.subtotal, \
                tax_rate = EXCLUDED.tax_rate, \
                tax_amount = EXCLUDED.tax_amount, \
                total_amount = EXCLUDED.total_amount, \
                status = EXCLUDED.status, \
                notes = EXCLUDED.notes, \
                valid_until = EXCLUDED.valid_until, \
                created_at = EXCLUDED.created_at, \
                updated_at = EXCLUDED.updated_at";
        _ = self
            .exec(
                SQL,
                &[
                    &id,
                    &number,
                    &customer_id,
                    &subtotal.currency,
                    &subtotal.amount,
                    &tax_rate,
                    &tax_amount.amount,
                    &total_amount.amount,
                    &status,
                    &notes,
                    &valid_until,
                    &created_at,
                    &updated_at,
                ],
            )
            .await
            .map_err(tracerr::wrap!())?;

        const DELETE_ITEMS_SQL: &str = "\
            DELETE FROM quotation_items \
            WHERE quotation_id = $1::UUID";
        _ = self
            .exec(DELETE_ITEMS_SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())?;

        const ITEM_SQL: &str = "\
            INSERT INTO quotation_items (\
                quotation_id, position, product_id, vendor_id, quantity, \
                start_at, end_at, duration_value, duration_unit, \
                price_per_unit, total_price\
            ) VALUES (\
                $1::UUID, $2::INT4, $3::UUID, $4::UUID, $5::INT8, \
                $6::TIMESTAMPTZ, $7::TIMESTAMPTZ, $8::INT8, $9::INT2, \
                $10::NUMERIC, $11::NUMERIC\
            )";
        for (position, item) in items.iter().enumerate() {
            let rental::Item {
                product_id,
                vendor_id,
                quantity,
                period,
                duration,
                price_per_unit,
                total_price,
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
                    ],
                )
                .await
                .map_err(tracerr::wrap!())?;
        }

        Ok(())
    }
}

impl<C> Database<Delete<By<Quotation, quotation::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Quotation, quotation::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: quotation::Id = by.into_inner();

        const SQL: &str = "\
            DELETE FROM quotations \
            WHERE id = $1::UUID";
        self.exec(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Update<By<Vec<quotation::Id>, read::quotation::Outdated>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<quotation::Id>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(by): Update<By<Vec<quotation::Id>, read::quotation::Outdated>>,
    ) -> Result<Self::Ok, Self::Err> {
        let read::quotation::Outdated(now) = by.into_inner();

        const SQL: &str = "\
            UPDATE quotations \
            SET status = $1::INT2, \
                updated_at = $2::TIMESTAMPTZ \
            WHERE status IN ($3::INT2, $4::INT2) \
              AND valid_until < $2::TIMESTAMPTZ \
            RETURNING id";
        Ok(self
            .query(
                SQL,
                &[
                    &quotation::Status::Expired,
                    &now,
                    &quotation::Status::Draft,
                    &quotation::Status::Sent,
                ],
            )
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| row.get("id"))
            .collect())
    }
}
