//! [`Command`] for updating a draft [`Quotation`].

use std::collections::HashMap;

use common::{
    operations::{By, Commit, Lock, Select, Transact, Transacted, Update},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        product,
        quotation::{self, PricingError, Request},
        rental::Notes,
        user::Actor,
        Product, Quotation,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for re-pricing and annotating a draft [`Quotation`].
#[derive(Clone, Debug)]
pub struct UpdateQuotation {
    /// ID of the [`Quotation`] to update.
    pub quotation_id: quotation::Id,

    /// [`Actor`] performing the update.
    pub actor: Actor,

    /// New requested items, if they should be replaced.
    pub requests: Option<Vec<Request>>,

    /// New [`Notes`], if they should be replaced.
    pub notes: Option<Notes>,
}

impl<Db> Command<UpdateQuotation> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>
        + Database<
            Select<By<Option<Quotation>, quotation::Id>>,
            Ok = Option<Quotation>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<HashMap<product::Id, Product>, Vec<product::Id>>>,
            Ok = HashMap<product::Id, Product>,
            Err = Traced<database::Error>,
        >,
    Transacted<Db>: Database<
            Select<By<Option<Quotation>, quotation::Id>>,
            Ok = Option<Quotation>,
            Err = Traced<database::Error>,
        > + Database<
            Lock<By<Quotation, quotation::Id>>,
            Err = Traced<database::Error>,
        > + Database<Update<Quotation>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Quotation;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: UpdateQuotation,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let UpdateQuotation {
            quotation_id,
            actor,
            requests,
            notes,
        } = cmd;

        let quotation = self
            .database()
            .execute(Select(By::<Option<Quotation>, _>::new(quotation_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::QuotationNotExists(quotation_id))
            .map_err(tracerr::wrap!())?;
        if !actor.is_customer_or_admin(quotation.customer_id) {
            return Err(tracerr::new!(E::NotOwner(quotation_id)));
        }

        let priced = if let Some(requests) = &requests {
            let products = self
                .database()
                .execute(Select(By::new(
                    requests.iter().map(|r| r.product_id).collect::<Vec<_>>(),
                )))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;
            Some(
                quotation::price(requests, &products, &self.config.terms)
                    .map_err(tracerr::from_and_wrap!(=> E))?,
            )
        } else {
            None
        };

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Lock(By::new(quotation_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        let mut quotation = tx
            .execute(Select(By::<Option<Quotation>, _>::new(quotation_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::QuotationNotExists(quotation_id))
            .map_err(tracerr::wrap!())?;
        if quotation.status != quotation::Status::Draft {
            return Err(tracerr::new!(E::QuotationNotEditable(
                quotation_id,
                quotation.status,
            )));
        }

        if let Some((items, totals)) = priced {
            quotation.items = items;
            quotation.totals = totals;
        }
        if notes.is_some() {
            quotation.notes = notes;
        }
        quotation.updated_at = DateTime::now().coerce();

        tx.execute(Update(quotation.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(quotation)
    }
}

/// Error of [`UpdateQuotation`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// Requested items cannot be priced.
    #[display("Failed to price the requested items: {_0}")]
    Pricing(#[error(not(source))] PricingError),

    /// [`Quotation`] with the provided ID does not exist.
    #[display("`Quotation(id: {_0})` does not exist")]
    #[from(ignore)]
    QuotationNotExists(#[error(not(source))] quotation::Id),

    /// [`Actor`] doesn't own the [`Quotation`].
    #[display("`Quotation(id: {_0})` is not owned by the user")]
    #[from(ignore)]
    NotOwner(#[error(not(source))] quotation::Id),

    /// [`Quotation`] is not a draft anymore.
    #[display("`Quotation(id: {_0})` is `{_1}` and cannot be edited")]
    #[from(ignore)]
    QuotationNotEditable(
        #[error(not(source))] quotation::Id,
        #[error(not(source))] quotation::Status,
    ),
}

#[cfg(test)]
mod spec {
    use crate::{
        command::UpdateQuotationStatus,
        domain::{
            quotation::{self, Request},
            rental::{Notes, Quantity},
        },
        testing, Command as _,
    };

    use super::{ExecutionError, UpdateQuotation};

    #[tokio::test]
    async fn reprices_draft() {
        let svc = testing::service();
        let vendor = testing::vendor();
        let customer = testing::customer();
        let drill = testing::product(&svc, vendor.id, 5, 100).await;
        let window =
            testing::period("2024-03-01T00:00:00Z", "2024-03-03T00:00:00Z");
        let q = testing::quotation(&svc, customer, &[(&drill, 1, window)]).await;

        let updated = svc
            .execute(UpdateQuotation {
                quotation_id: q.id,
                actor: customer,
                requests: Some(vec![Request {
                    product_id: drill.id,
                    quantity: Quantity::new(3).unwrap(),
                    period: window,
                }]),
                notes: Notes::new("Need it early"),
            })
            .await
            .unwrap();

        assert_eq!(updated.number, q.number);
        assert_eq!(updated.totals.subtotal, testing::inr("600"));
        assert_eq!(updated.totals.total_amount, testing::inr("708"));
        assert_eq!(updated.notes, Notes::new("Need it early"));
    }

    #[tokio::test]
    async fn edits_only_own_drafts() {
        let svc = testing::service();
        let vendor = testing::vendor();
        let customer = testing::customer();
        let drill = testing::product(&svc, vendor.id, 5, 100).await;
        let window =
            testing::period("2024-03-01T00:00:00Z", "2024-03-03T00:00:00Z");
        let q = testing::quotation(&svc, customer, &[(&drill, 1, window)]).await;

        let err = svc
            .execute(UpdateQuotation {
                quotation_id: q.id,
                actor: testing::customer(),
                requests: None,
                notes: Notes::new("Mine now"),
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::NotOwner(_)));

        _ = svc
            .execute(UpdateQuotationStatus {
                quotation_id: q.id,
                actor: vendor,
                status: quotation::Status::Sent,
            })
            .await
            .unwrap();
        let err = svc
            .execute(UpdateQuotation {
                quotation_id: q.id,
                actor: testing::admin(),
                requests: None,
                notes: Notes::new("Too late"),
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::QuotationNotEditable(_, quotation::Status::Sent),
        ));
    }
}
