//! [`Query`] definition.

pub mod invoice;
pub mod order;
pub mod pickup;
pub mod product;
pub mod quotation;
pub mod rental_return;

use std::{fmt, marker::PhantomData};

use common::operations::{By, Select};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{access::Visible, user::Actor},
    infra::{database, Database},
    Service,
};

/// [`Query`] of the [`Service`].
pub use common::Handler as Query;

/// [`Query`] [`Select`]ing a `T`ype from a [`Database`].
#[derive(Clone, Copy, Debug)]
#[expect(clippy::module_name_repetitions, reason = "more readable")]
pub struct DatabaseQuery<T>(T);

impl<W, B> DatabaseQuery<By<W, B>> {
    /// Creates a new [`DatabaseQuery`] selecting a `W` by the provided `B`.
    #[must_use]
    pub fn by(by: B) -> Self {
        Self(By::new(by))
    }
}

impl<Db, W, B> Query<DatabaseQuery<By<W, B>>> for Service<Db>
where
    Db: Database<Select<By<W, B>>, Ok = W, Err = Traced<database::Error>>,
{
    type Ok = W;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        DatabaseQuery(by): DatabaseQuery<By<W, B>>,
    ) -> Result<Self::Ok, Self::Err> {
        self.database()
            .execute(Select(by))
            .await
            .map_err(tracerr::wrap!())
    }
}

/// [`Query`] [`Select`]ing a single `W` by the provided `B` on behalf
/// of an [`Actor`], who must be allowed to see it.
#[derive(Debug)]
pub struct VisibleQuery<W, B> {
    /// Selector of the entity.
    by: B,

    /// [`Actor`] the entity is selected for.
    actor: Actor,

    /// Type of the selected `W`.
    _entity: PhantomData<fn() -> W>,
}

impl<W, B: Clone> Clone for VisibleQuery<W, B> {
    fn clone(&self) -> Self {
        Self {
            by: self.by.clone(),
            actor: self.actor,
            _entity: PhantomData,
        }
    }
}

impl<W, B: Copy> Copy for VisibleQuery<W, B> {}

impl<W, B> VisibleQuery<W, B> {
    /// Creates a new [`VisibleQuery`] selecting a `W` by the provided
    /// `B` for the provided [`Actor`].
    #[must_use]
    pub fn by(by: B, actor: Actor) -> Self {
        Self {
            by,
            actor,
            _entity: PhantomData,
        }
    }
}

impl<Db, W, B> Query<VisibleQuery<W, B>> for Service<Db>
where
    Db: Database<
        Select<By<Option<W>, B>>,
        Ok = Option<W>,
        Err = Traced<database::Error>,
    >,
    W: Visible,
    B: Clone + fmt::Display,
{
    type Ok = W;
    type Err = Traced<VisibleQueryError<B>>;

    async fn execute(
        &self,
        query: VisibleQuery<W, B>,
    ) -> Result<Self::Ok, Self::Err> {
        use VisibleQueryError as E;

        let VisibleQuery { by, actor, .. } = query;

        let entity = self
            .database()
            .execute(Select(By::new(by.clone())))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E<B>))?
            .ok_or_else(|| E::NotExists(by.clone()))
            .map_err(tracerr::wrap!())?;
        if !entity.is_visible_to(&actor) {
            return Err(tracerr::new!(E::NotPermitted(by)));
        }

        Ok(entity)
    }
}

/// Error of [`VisibleQuery`] execution.
#[derive(Debug, Display, Error, From)]
pub enum VisibleQueryError<B: fmt::Display> {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// Entity selected by the provided `B` does not exist.
    #[display("Entity `{_0}` does not exist")]
    #[from(ignore)]
    NotExists(#[error(not(source))] B),

    /// [`Actor`] is not allowed to see the entity.
    #[display("Entity `{_0}` is not visible to the user")]
    #[from(ignore)]
    NotPermitted(#[error(not(source))] B),
}
