//! In-memory [`Database`] implementation.
//!
//! Keeps the whole marketplace in a single process-local [`State`]. A
//! [`Tx`] holds the [`State`] exclusively from its first operation until it's
//! committed or dropped, working upon a copy which replaces the [`State`] on
//! commit only.

mod impls;

use std::{collections::HashMap, future::Future, sync::Arc};

use common::operations::{Commit, Transact};
use derive_more::{Deref, Display, Error as StdError};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracerr::Traced;

use crate::domain::{
    invoice, order, pickup, product, quotation, rental_return, Invoice, Order,
    Pickup, Product, Quotation, Return,
};
#[cfg(doc)]
use crate::domain::sequence;
use crate::infra::{database, Database};

/// In-memory [`Database`] client.
#[derive(Clone, Debug, Default, Deref)]
pub struct Memory<T = NonTx>(T);

impl Memory {
    /// Creates a new empty [`Memory`] client.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Whole data of a [`Memory`] database.
#[derive(Clone, Debug, Default)]
pub struct State {
    /// [`Product`]s along with their reservations.
    products: HashMap<product::Id, Product>,

    /// Stored [`Quotation`]s.
    quotations: HashMap<quotation::Id, Quotation>,

    /// Stored [`Order`]s.
    orders: HashMap<order::Id, Order>,

    /// Stored [`Pickup`]s.
    pickups: HashMap<pickup::Id, Pickup>,

    /// Stored [`Return`]s.
    returns: HashMap<rental_return::Id, Return>,

    /// Stored [`Invoice`]s.
    invoices: HashMap<invoice::Id, Invoice>,

    /// Last issued values of [`sequence::Kind`]s, by their [`u8`]
    /// representation.
    sequences: HashMap<u8, u64>,
}

/// Storage of a [`State`].
pub trait Storage {
    /// Reads the [`State`] with the provided function.
    fn read<R>(&self, f: impl FnOnce(&State) -> R) -> impl Future<Output = R>;

    /// Modifies the [`State`] with the provided function.
    fn write<R>(
        &self,
        f: impl FnOnce(&mut State) -> R,
    ) -> impl Future<Output = R>;
}

/// Non-transactional [`Memory`] client, applying every write immediately.
#[derive(Clone, Debug, Default)]
pub struct NonTx {
    /// Shared [`State`].
    state: Arc<Mutex<State>>,
}

impl Storage for NonTx {
    async fn read<R>(&self, f: impl FnOnce(&State) -> R) -> R {
        f(&*self.state.lock().await)
    }

    async fn write<R>(&self, f: impl FnOnce(&mut State) -> R) -> R {
        f(&mut *self.state.lock().await)
    }
}

/// Transactional [`Memory`] client.
#[derive(Clone, Debug)]
pub struct Tx {
    /// Shared [`State`] to be locked by this [`Tx`].
    state: Arc<Mutex<State>>,

    /// Lazily acquired [`Working`] copy.
    working: Arc<Mutex<Option<Working>>>,
}

/// Exclusively held [`State`] along with its working copy.
#[derive(Debug)]
struct Working {
    /// Guard of the shared [`State`].
    guard: OwnedMutexGuard<State>,

    /// Copy of the [`State`] being modified.
    copy: State,
}

impl Tx {
    /// Creates a new [`Tx`] client upon the [`State`] of the provided
    /// [`NonTx`] client.
    #[must_use]
    pub fn from_non_tx(client: &NonTx) -> Self {
        Self {
            state: Arc::clone(&client.state),
            working: Arc::new(Mutex::new(None)),
        }
    }

    /// Commits this [`Tx`] client.
    ///
    /// Next operation of this [`Tx`] client starts a new transaction.
    pub async fn commit(&self) {
        if let Some(Working { mut guard, copy }) =
            self.working.lock().await.take()
        {
            *guard = copy;
        }
    }
}

impl Storage for Tx {
    async fn read<R>(&self, f: impl FnOnce(&State) -> R) -> R {
        self.write(|s| f(s)).await
    }

    async fn write<R>(&self, f: impl FnOnce(&mut State) -> R) -> R {
        let mut working = self.working.lock().await;
        let current = if let Some(w) = working.take() {
            w
        } else {
            let guard = Arc::clone(&self.state).lock_owned().await;
            Working {
                copy: guard.clone(),
                guard,
            }
        };
        f(&mut working.insert(current).copy)
    }
}

/// [`Memory`] database error.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq, StdError)]
pub enum Error {
    /// Unique constraint is violated.
    #[display("unique constraint `{_0}` is violated")]
    UniqueViolation(#[error(not(source))] &'static str),
}

impl Error {
    /// Checks if the error is a unique violation of the specified constraint.
    #[must_use]
    pub fn is_unique_violation(&self, constraint: Option<&str>) -> bool {
        match self {
            Self::UniqueViolation(c) => constraint.map_or(true, |x| x == *c),
        }
    }
}

impl Database<Transact> for Memory<NonTx> {
    type Ok = Memory<Tx>;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        Ok(Memory(Tx::from_non_tx(&self.0)))
    }
}

impl Database<Transact> for Memory<Tx> {
    type Ok = Self;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        Ok(self.clone())
    }
}

impl Database<Commit> for Memory<Tx> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Commit) -> Result<Self::Ok, Self::Err> {
        self.commit().await;
        Ok(())
    }
}

#[cfg(test)]
mod spec {
    use common::operations::{Commit, Transact};

    use crate::infra::Database as _;

    use super::{Memory, Storage as _};

    #[tokio::test]
    async fn applies_transaction_on_commit_only() {
        let db = Memory::new();

        let tx = db.execute(Transact).await.unwrap();
        _ = tx.write(|s| s.sequences.insert(1, 10)).await;
        drop(tx);
        assert!(db.read(|s| s.sequences.is_empty()).await);

        let tx = db.execute(Transact).await.unwrap();
        _ = tx.write(|s| s.sequences.insert(1, 20)).await;
        tx.execute(Commit).await.unwrap();
        assert_eq!(db.read(|s| s.sequences.get(&1).copied()).await, Some(20));
    }
}
