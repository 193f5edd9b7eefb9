//! [`ExpireQuotations`] [`Task`].

use std::{convert::Infallible, error::Error, time};

use common::{
    operations::{By, Perform, Start, Update},
    DateTime,
};
use tokio::time::interval;
use tracerr::Traced;
use tracing as log;

#[cfg(doc)]
use crate::domain::Quotation;
use crate::{
    domain::quotation,
    infra::{database, Database},
    read, Service,
};

use super::Task;

/// Configuration for [`ExpireQuotations`] [`Task`].
#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// Interval between outdated [`Quotation`]s sweeps.
    pub interval: time::Duration,
}

/// [`Task`] marking outdated [`Quotation`]s as [`quotation::Status::Expired`].
#[derive(Clone, Copy, Debug)]
pub struct ExpireQuotations<S> {
    /// [`Service`] instance.
    service: S,
}

impl<Db> Task<Start<By<ExpireQuotations<Self>, Config>>> for Service<Db>
where
    ExpireQuotations<Service<Db>>: Task<Perform<()>, Ok = usize, Err: Error>
        + Send
        + Sync
        + 'static,
    Self: Clone,
{
    type Ok = ();
    type Err = Infallible;

    async fn execute(
        &self,
        Start(by): Start<By<ExpireQuotations<Self>, Config>>,
    ) -> Result<Self::Ok, Self::Err> {
        let config = by.into_inner();
        let task = ExpireQuotations {
            service: self.clone(),
        };

        let mut interval = interval(config.interval);
        loop {
            let _ = interval.tick().await;
            match task.execute(Perform(())).await {
                Ok(0) => {}
                Ok(n) => log::info!("{n} outdated `Quotation`s expired"),
                Err(e) => {
                    log::error!("`task::ExpireQuotations` failed: {e}");
                }
            }
        }
    }
}

impl<Db> Task<Perform<()>> for ExpireQuotations<Service<Db>>
where
    Db: Database<
        Update<By<Vec<quotation::Id>, read::quotation::Outdated>>,
        Ok = Vec<quotation::Id>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = usize;
    type Err = ExecutionError;

    async fn execute(&self, _: Perform<()>) -> Result<Self::Ok, Self::Err> {
        let expired = self
            .service
            .database()
            .execute(Update(By::new(read::quotation::Outdated(
                DateTime::now(),
            ))))
            .await
            .map_err(tracerr::map_from_and_wrap!())?;
        for id in &expired {
            log::debug!("`Quotation(id: {id})` expired");
        }
        Ok(expired.len())
    }
}

/// Error of [`ExpireQuotations`] execution.
pub type ExecutionError = Traced<database::Error>;

#[cfg(test)]
mod spec {
    use common::{
        operations::{By, Perform, Select, Update},
        DateTime,
    };

    use crate::{
        domain::{quotation, Quotation},
        infra::Database as _,
        testing, Task as _,
    };

    use super::ExpireQuotations;

    #[tokio::test]
    async fn expires_only_outdated_pending_quotations() {
        let svc = testing::service();
        let vendor = testing::vendor();
        let customer = testing::customer();
        let product = testing::product(&svc, vendor.id, 5, 100).await;
        let window =
            testing::period("2024-03-01T00:00:00Z", "2024-03-03T00:00:00Z");

        let mut ids = vec![];
        for status in [
            quotation::Status::Draft,
            quotation::Status::Sent,
            quotation::Status::Confirmed,
        ] {
            let mut q =
                testing::quotation(&svc, customer, &[(&product, 1, window)])
                    .await;
            q.status = status;
            q.valid_until = (DateTime::now()
                - std::time::Duration::from_secs(60))
            .coerce();
            svc.database().execute(Update(q.clone())).await.unwrap();
            ids.push(q.id);
        }
        let fresh =
            testing::quotation(&svc, customer, &[(&product, 1, window)]).await;

        let task = ExpireQuotations {
            service: svc.clone(),
        };
        assert_eq!(task.execute(Perform(())).await.unwrap(), 2);
        assert_eq!(task.execute(Perform(())).await.unwrap(), 0);

        let status = |id| {
            let svc = svc.clone();
            async move {
                svc.database()
                    .execute(Select(By::<Option<Quotation>, _>::new(id)))
                    .await
                    .unwrap()
                    .unwrap()
                    .status
            }
        };
        assert_eq!(status(ids[0]).await, quotation::Status::Expired);
        assert_eq!(status(ids[1]).await, quotation::Status::Expired);
        assert_eq!(status(ids[2]).await, quotation::Status::Confirmed);
        assert_eq!(status(fresh.id).await, quotation::Status::Draft);
    }
}
