//! [`Database`] implementations.

#![allow(
    clippy::items_after_statements,
    reason = "`const SQL` after statements"
)]
#![allow(clippy::too_many_lines, reason = "SQL-related code a bit verbose")]

mod invoice;
mod order;
mod pickup;
mod product;
mod quotation;
mod rental_return;
mod sequence;

use async_trait::async_trait;
use common::{
    money::Currency,
    operations::{Commit, Transact},
    Money,
};
use refinery_core::{
    traits::r#async::{AsyncQuery, AsyncTransaction},
    AsyncMigrate, Migration,
};
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{
        access::Scope,
        rental::{self, Period, Quantity, Totals},
        user,
    },
    infra::{database, postgres, Database},
};

use super::{NonTx, Postgres, Tx};

impl Database<Transact> for Postgres<NonTx> {
    type Ok = Postgres<Tx>;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        Ok(Postgres(Tx::from_non_tx(self.0.clone())))
    }
}

impl Database<Transact> for Postgres<Tx> {
    type Ok = Self;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        Ok(self.clone())
    }
}

impl Database<Commit> for Postgres<Tx> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Commit) -> Result<Self::Ok, Self::Err> {
        self.commit().await.map_err(tracerr::wrap!())
    }
}

#[async_trait]
impl AsyncTransaction for Postgres {
    type Error = Traced<database::Error>;

    async fn execute(
        &mut self,
        queries: &[&str],
    ) -> Result<usize, Self::Error> {
        let mut conn = self
            .0
            .pool
            .get()
            .await
            .map_err(tracerr::from_and_wrap!(=> postgres::Error))
            .map_err(tracerr::map_from)?;
        AsyncTransaction::execute(&mut **conn, queries)
            .await
            .map_err(tracerr::from_and_wrap!(=> postgres::Error))
            .map_err(tracerr::map_from)
    }
}

#[async_trait]
impl AsyncQuery<Vec<Migration>> for Postgres {
    async fn query(
        &mut self,
        query: &str,
    ) -> Result<Vec<Migration>, <Self as AsyncTransaction>::Error> {
        let mut conn = self
            .0
            .pool
            .get()
            .await
            .map_err(tracerr::from_and_wrap!(=> postgres::Error))
            .map_err(tracerr::map_from)?;
        AsyncQuery::query(&mut **conn, query)
            .await
            .map_err(tracerr::from_and_wrap!(=> postgres::Error))
            .map_err(tracerr::map_from)
    }
}

impl AsyncMigrate for Postgres {}

/// Returns SQL condition restricting `customer_id` and `vendor_id` columns to
/// the provided [`Scope`], along with the ID to be bound as `$1`.
fn scope_condition(scope: Scope) -> (&'static str, Option<user::Id>) {
    match scope {
        Scope::All => ("true", None),
        Scope::Customer(id) => ("customer_id = $1::UUID", Some(id)),
        Scope::Vendor(id) => ("vendor_id = $1::UUID", Some(id)),
    }
}

/// Decodes [`Money`] from the provided `column` of the `row`.
fn money(row: &Row, column: &str, currency: Currency) -> Money {
    Money {
        amount: row.get(column),
        currency,
    }
}

/// Decodes [`Totals`] from the provided `row` of a document.
fn totals(row: &Row) -> Totals {
    let currency = row.get("currency");
    Totals {
        subtotal: money(row, "subtotal", currency),
        tax_rate: row.get("tax_rate"),
        tax_amount: money(row, "tax_amount", currency),
        total_amount: money(row, "total_amount", currency),
    }
}

/// Decodes [`Quantity`] from the provided `row`.
fn quantity(row: &Row) -> Quantity {
    u32::try_from(row.get::<_, i64>("quantity"))
        .ok()
        .and_then(Quantity::new)
        .expect("`quantity` overflow")
}

/// Encodes the provided [`Quantity`] for storing.
fn quantity_param(quantity: Quantity) -> i64 {
    i64::from(quantity.get())
}

/// Decodes [`Period`] from `start_at` and `end_at` columns of the `row`.
fn period(row: &Row) -> Period {
    Period::new(row.get("start_at"), row.get("end_at"))
        .expect("`end_at` precedes `start_at`")
}

/// Encodes the provided item `position` for storing.
fn position_param(position: usize) -> i32 {
    i32::try_from(position).expect("`position` overflow")
}

/// Decodes a [`rental::Item`] from the provided `row` of an items table.
fn rental_item(row: &Row, currency: Currency) -> rental::Item {
    rental::Item {
        product_id: row.get("product_id"),
        vendor_id: row.get("vendor_id"),
        quantity: quantity(row),
        period: period(row),
        duration: rental::Duration {
            value: u32::try_from(row.get::<_, i64>("duration_value"))
                .expect("`duration_value` overflow"),
            unit: row.get("duration_unit"),
        },
        price_per_unit: money(row, "price_per_unit", currency),
        total_price: money(row, "total_price", currency),
    }
}
