//! [`Query`] collection related to [`Product`]s.

use common::operations::{By, Select};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        product::{self, Availability},
        rental::{Period, Quantity},
        Product,
    },
    infra::{database, Database},
    Query, Service,
};

use super::DatabaseQuery;

/// Queries a [`Product`] by its [`product::Id`].
pub type ById = DatabaseQuery<By<Option<Product>, product::Id>>;

/// [`Query`] checking whether a [`Quantity`] of a [`Product`] is free for
/// a [`Period`].
///
/// The answer is advisory: capacity is checked again when ordering.
#[derive(Clone, Copy, Debug)]
pub struct CheckAvailability {
    /// ID of the [`Product`] to check.
    pub product_id: product::Id,

    /// Requested [`Quantity`].
    pub quantity: Quantity,

    /// Requested [`Period`].
    pub period: Period,
}

impl<Db> Query<CheckAvailability> for Service<Db>
where
    Db: Database<
        Select<By<Option<Product>, product::Id>>,
        Ok = Option<Product>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Availability;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        query: CheckAvailability,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CheckAvailability {
            product_id,
            quantity,
            period,
        } = query;

        let product = self
            .database()
            .execute(Select(By::new(product_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::ProductNotExists(product_id))
            .map_err(tracerr::wrap!())?;

        Ok(product.availability(quantity, &period))
    }
}

/// Error of [`CheckAvailability`] [`Query`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Product`] with the provided ID does not exist.
    #[display("`Product(id: {_0})` does not exist")]
    #[from(ignore)]
    ProductNotExists(#[error(not(source))] product::Id),
}

#[cfg(test)]
mod spec {
    use crate::{
        domain::{
            product::{self, Availability},
            rental::Quantity,
        },
        testing, Query as _,
    };

    use super::{CheckAvailability, ExecutionError};

    #[tokio::test]
    async fn sees_committed_reservations() {
        let svc = testing::service();
        let vendor = testing::vendor();
        let drill = testing::product(&svc, vendor.id, 5, 100).await;
        let window =
            testing::period("2024-03-01T00:00:00Z", "2024-03-03T00:00:00Z");
        let check = |quantity| CheckAvailability {
            product_id: drill.id,
            quantity: Quantity::new(quantity).unwrap(),
            period: window,
        };

        assert_eq!(
            svc.execute(check(5)).await.unwrap(),
            Availability {
                is_available: true,
                free_quantity: 5,
            },
        );

        _ = testing::order(&svc, testing::customer(), &[(&drill, 5, window)])
            .await;

        assert!(!svc.execute(check(1)).await.unwrap().is_available);

        let touching =
            testing::period("2024-03-03T00:00:00Z", "2024-03-05T00:00:00Z");
        assert!(
            !svc.execute(CheckAvailability {
                period: touching,
                ..check(1)
            })
            .await
            .unwrap()
            .is_available,
        );

        let later =
            testing::period("2024-03-04T00:00:00Z", "2024-03-05T00:00:00Z");
        assert!(
            svc.execute(CheckAvailability {
                period: later,
                ..check(5)
            })
            .await
            .unwrap()
            .is_available,
        );
    }

    #[tokio::test]
    async fn rejects_unknown_product() {
        let svc = testing::service();

        let err = svc
            .execute(CheckAvailability {
                product_id: product::Id::new(),
                quantity: Quantity::new(1).unwrap(),
                period: testing::period(
                    "2024-03-01T00:00:00Z",
                    "2024-03-03T00:00:00Z",
                ),
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::ProductNotExists(_)));
    }
}
