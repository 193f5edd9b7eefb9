//! [`sequence::Number`]-related [`Database`] implementations.

use common::operations::Next;
use tracerr::Traced;

use crate::{
    domain::sequence,
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

impl<C> Database<Next<sequence::Kind>> for Postgres<C>
where
    C: Connection,
{
    type Ok = sequence::Number;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Next(kind): Next<sequence::Kind>,
    ) -> Result<Self::Ok, Self::Err> {
        const SQL: &str = "\
            INSERT INTO sequences (kind, value) \
            VALUES ($1::INT2, 1) \
            ON CONFLICT (kind) DO UPDATE \
            SET value = sequences.value + 1 \
            RETURNING value";
        let row = self
            .query_one(SQL, &[&kind])
            .await
            .map_err(tracerr::wrap!())?;
        let value = u64::try_from(row.get::<_, i64>("value"))
            .expect("`value` overflow");
        Ok(kind.number(value))
    }
}
