//! [`Invoice`]-related [`Database`] implementations.

use std::collections::HashMap;

use common::operations::{By, Insert, Lock, Select, Update};
use postgres_types::ToSql;
use tracerr::Traced;

use crate::{
    domain::{
        access::Scope,
        invoice, order,
        rental::{self, Totals},
        Invoice,
    },
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

use super::{
    money, period, position_param, quantity, quantity_param, scope_condition,
    totals,
};

impl<C, IDs> Database<Select<By<HashMap<invoice::Id, Invoice>, IDs>>>
    for Postgres<C>
where
    C: Connection,
    IDs: AsRef<[invoice::Id]>,
{
    type Ok = HashMap<invoice::Id, Invoice>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<HashMap<invoice::Id, Invoice>, IDs>>,
    ) -> Result<Self::Ok, Self::Err> {
        let ids = by.into_inner();
        // Avoid subtle change for SQL.
        let ids: &[invoice::Id] = ids.as_ref();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let limit = i32::try_from(ids.len()).unwrap();

        const SQL: &str = "\
            SELECT id, number, order_id, customer_id, vendor_id, \
                   currency, subtotal, tax_rate, tax_amount, total_amount, \
                   security_deposit, late_return_fee, \
                   paid_amount, balance_amount, status, \
                   due_at, issued_at, notes, created_at, updated_at \
            FROM invoices \
            WHERE id IN (SELECT unnest($1::UUID[]) LIMIT $2::INT4) \
            LIMIT $2::INT4";
        let mut invoices = self
            .query(SQL, &[&ids, &limit])
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| {
                let id = row.get("id");
                let currency = row.get("currency");
                (
                    id,
                    Invoice {
                        id,
                        number: row.get("number"),
                        order_id: row.get("order_id"),
                        customer_id: row.get("customer_id"),
                        vendor_id: row.get("vendor_id"),
                        items: vec![],
                        totals: totals(&row),
                        security_deposit: money(
                            &row,
                            "security_deposit",
                            currency,
                        ),
                        late_return_fee: money(
                            &row,
                            "late_return_fee",
                            currency,
                        ),
                        paid_amount: money(&row, "paid_amount", currency),
                        balance_amount: money(
                            &row,
                            "balance_amount",
                            currency,
                        ),
                        status: row.get("status"),
                        payments: vec![],
                        due_at: row.get("due_at"),
                        issued_at: row.get("issued_at"),
                        notes: row.get("notes"),
                        created_at: row.get("created_at"),
                        updated_at: row.get("updated_at"),
                    },
                )
            })
            .collect::<HashMap<_, _>>();

        const ITEMS_SQL: &str = "\
            SELECT invoice_id, product_id, product_name, quantity, \
                   start_at, end_at, duration_value, duration_unit, \
                   price_per_unit, total_price \
            FROM invoice_items \
            WHERE invoice_id = ANY($1::UUID[]) \
            ORDER BY invoice_id, position";
        for row in self
            .query(ITEMS_SQL, &[&ids])
            .await
            .map_err(tracerr::wrap!())?
        {
            let id = row.get::<_, invoice::Id>("invoice_id");
            if let Some(i) = invoices.get_mut(&id) {
                let currency = i.totals.subtotal.currency;
                i.items.push(invoice::Item {
                    product_id: row.get("product_id"),
                    product_name: row.get("product_name"),
                    quantity: quantity(&row),
                    period: period(&row),
                    duration: rental::Duration {
                        value: u32::try_from(
                            row.get::<_, i64>("duration_value"),
                        )
                        .expect("`duration_value` overflow"),
                        unit: row.get("duration_unit"),
                    },
                    price_per_unit: money(&row, "price_per_unit", currency),
                    total_price: money(&row, "total_price", currency),
                });
            }
        }

        const PAYMENTS_SQL: &str = "\
            SELECT id, invoice_id, amount, method, transaction_id, \
                   paid_at, notes \
            FROM invoice_payments \
            WHERE invoice_id = ANY($1::UUID[]) \
            ORDER BY invoice_id, paid_at, id";
        for row in self
            .query(PAYMENTS_SQL, &[&ids])
            .await
            .map_err(tracerr::wrap!())?
        {
            let id = row.get::<_, invoice::Id>("invoice_id");
            if let Some(i) = invoices.get_mut(&id) {
                let currency = i.totals.subtotal.currency;
                i.payments.push(invoice::Payment {
                    id: row.get("id"),
                    amount: money(&row, "amount", currency),
                    method: row.get("method"),
                    transaction_id: row.get("transaction_id"),
                    paid_at: row.get("paid_at"),
                    notes: row.get("notes"),
                });
            }
        }

        Ok(invoices)
    }
}

impl<C> Database<Select<By<Option<Invoice>, invoice::Id>>> for Postgres<C>
where
    C: Connection,
    Self: Database<
        Select<By<HashMap<invoice::Id, Invoice>, [invoice::Id; 1]>>,
        Ok = HashMap<invoice::Id, Invoice>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Option<Invoice>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Invoice>, invoice::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self
            .execute(Select(By::new([id])))
            .await
            .map_err(tracerr::wrap!())?
            .remove(&id))
    }
}

impl<C> Database<Select<By<Option<Invoice>, order::Id>>> for Postgres<C>
where
    C: Connection,
    Self: Database<
        Select<By<Option<Invoice>, invoice::Id>>,
        Ok = Option<Invoice>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Option<Invoice>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Invoice>, order::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let order_id: order::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id \
            FROM invoices \
            WHERE order_id = $1::UUID";
        let Some(id) = self
            .query_opt(SQL, &[&order_id])
            .await
            .map_err(tracerr::wrap!())?
            .map(|row| row.get::<_, invoice::Id>("id"))
        else {
            return Ok(None);
        };

        self.execute(Select(By::<Option<Invoice>, _>::new(id)))
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<C> Database<Select<By<Vec<Invoice>, Scope>>> for Postgres<C>
where
    C: Connection,
    Self: Database<
        Select<By<HashMap<invoice::Id, Invoice>, Vec<invoice::Id>>>,
        Ok = HashMap<invoice::Id, Invoice>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Vec<Invoice>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Invoice>, Scope>>,
    ) -> Result<Self::Ok, Self::Err> {
        let (condition, user_id) = scope_condition(by.into_inner());
        let ps: Vec<&(dyn ToSql + Sync)> =
            user_id.iter().map(|id| -> &(dyn ToSql + Sync) { id }).collect();

        let sql = format!(
            "SELECT id \
             FROM invoices \
             WHERE {condition} \
             ORDER BY created_at DESC, id DESC",
        );
        let ids = self
            .query(&sql, ps.as_slice())
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| row.get("id"))
            .collect::<Vec<invoice::Id>>();

        let mut invoices = self
            .execute(Select(By::new(ids.clone())))
            .await
            .map_err(tracerr::wrap!())?;
        Ok(ids.iter().filter_map(|id| invoices.remove(id)).collect())
    }
}

impl<C> Database<Lock<By<Invoice, invoice::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Invoice, invoice::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: invoice::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id \
            FROM invoices \
            WHERE id = $1::UUID \
            FOR UPDATE";
        self.query(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Insert<Invoice>> for Postgres<C>
where
    C: Connection,
    Self: Database<Update<Invoice>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(invoice): Insert<Invoice>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(invoice)).await.map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<Invoice>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(invoice): Update<Invoice>,
    ) -> Result<Self::Ok, Self::Err> {
        let Invoice {
            id,
            number,
            order_id,
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
            late_return_fee,
            paid_amount,
            balance_amount,
            status,
            payments,
            due_at,
            issued_at,
            notes,
            created_at,
            updated_at,
        } = invoice;

        const SQL: &str = "\
            INSERT INTO invoices (\
                id, number, order_id, customer_id, vendor_id, \
                currency, subtotal, tax_rate, tax_amount, total_amount, \
                security_deposit, late_return_fee, \
                paid_amount, balance_amount, status, \
                due_at, issued_at, notes, created_at, updated_at\
            ) VALUES (\
                $1::UUID, $2::VARCHAR, $3::UUID, $4::UUID, $5::UUID, \
                $6::INT2, $7::NUMERIC, $8::NUMERIC, $9::NUMERIC, \
                $10::NUMERIC, \
                $11::NUMERIC, $12::NUMERIC, \
                $13::NUMERIC, $14::NUMERIC, $15::INT2, \
                $16::TIMESTAMPTZ, $17::TIMESTAMPTZ, $18::VARCHAR, \
                $19::TIMESTAMPTZ, $20::TIMESTAMPTZ\
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET number = EXCLUDED.number, \
                customer_id = EXCLUDED.customer_id, \
                vendor_id = EXCLUDED.vendor_id, \
                currency = EXCLUDED.currency, \
                subtotal = EXCLUDED.subtotal, \
                tax_rate = EXCLUDED.tax_rate, \
                tax_amount = EXCLUDED.tax_amount, \
                total_amount = EXCLUDED.total_amount, \
                security_deposit = EXCLUDED.security_deposit, \
                late_return_fee = EXCLUDED.late_return_fee, \
                paid_amount = EXCLUDED.paid_amount, \
                balance_amount = EXCLUDED.balance_amount, \
                status = EXCLUDED.status, \
                due_at = EXCLUDED.due_at, \
                issued_at = EXCLUDED.issued_at, \
                notes = EXCLUDED.notes, \
                created_at = EXCLUDED.created_at, \
                updated_at = EXCLUDED.updated_at";
        _ = self
            .exec(
                SQL,
                &[
                    &id,
                    &number,
                    &order_id,
                    &customer_id,
                    &vendor_id,
                    &subtotal.currency,
                    &subtotal.amount,
                    &tax_rate,
                    &tax_amount.amount,
                    &total_amount.amount,
                    &security_deposit.amount,
                    &late_return_fee.amount,
                    &paid_amount.amount,
                    &balance_amount.amount,
                    &status,
                    &due_at,
                    &issued_at,
                    &notes,
                    &created_at,
                    &updated_at,
                ],
            )
            .await
            .map_err(tracerr::wrap!())?;

        const DELETE_ITEMS_SQL: &str = "\
            DELETE FROM invoice_items \
            WHERE invoice_id = $1::UUID";
        _ = self
            .exec(DELETE_ITEMS_SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())?;

        const ITEM_SQL: &str = "\
            INSERT INTO invoice_items (\
                invoice_id, position, product_id, product_name, quantity, \
                start_at, end_at, duration_value, duration_unit, \
                price_per_unit, total_price\
            ) VALUES (\
                $1::UUID, $2::INT4, $3::UUID, $4::VARCHAR, $5::INT8, \
                $6::TIMESTAMPTZ, $7::TIMESTAMPTZ, $8::INT8, $9::INT2, \
                $10::NUMERIC, $11::NUMERIC\
            )";
        for (position, item) in items.iter().enumerate() {
            _ = self
                .exec(
                    ITEM_SQL,
                    &[
                        &id,
                        &position_param(position),
                        &item.product_id,
                        &item.product_name,
                        &quantity_param(item.quantity),
                        &item.period.start(),
                        &item.period.end(),
                        &i64::from(item.duration.value),
                        &item.duration.unit,
                        &item.price_per_unit.amount,
                        &item.total_price.amount,
                    ],
                )
                .await
                .map_err(tracerr::wrap!())?;
        }

        // Payments ledger is append-only.
        const PAYMENT_SQL: &str = "\
            INSERT INTO invoice_payments (\
                id, invoice_id, amount, method, transaction_id, \
                paid_at, notes\
            ) VALUES (\
                $1::UUID, $2::UUID, $3::NUMERIC, $4::INT2, $5::VARCHAR, \
                $6::TIMESTAMPTZ, $7::VARCHAR\
            ) \
            ON CONFLICT (id) DO NOTHING";
        for payment in &payments {
            _ = self
                .exec(
                    PAYMENT_SQL,
                    &[
                        &payment.id,
                        &id,
                        &payment.amount.amount,
                        &payment.method,
                        &payment.transaction_id,
                        &payment.paid_at,
                        &payment.notes,
                    ],
                )
                .await
                .map_err(tracerr::wrap!())?;
        }

        Ok(())
    }
}
