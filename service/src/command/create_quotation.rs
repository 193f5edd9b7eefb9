//! [`Command`] for creating a new [`Quotation`].

use std::collections::HashMap;

use common::{
    operations::{By, Commit, Insert, Next, Select, Transact, Transacted},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        product,
        quotation::{self, PricingError, Request},
        rental::Notes,
        sequence,
        user::{Actor, Role},
        Product, Quotation,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for creating a new [`Quotation`] of the requested items.
#[derive(Clone, Debug)]
pub struct CreateQuotation {
    /// Customer requesting the [`Quotation`].
    pub actor: Actor,

    /// Requested items.
    pub requests: Vec<Request>,

    /// [`Notes`] of the customer.
    pub notes: Option<Notes>,
}

impl<Db> Command<CreateQuotation> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>
        + Database<
            Select<By<HashMap<product::Id, Product>, Vec<product::Id>>>,
            Ok = HashMap<product::Id, Product>,
            Err = Traced<database::Error>,
        >,
    Transacted<Db>: Database<
            Next<sequence::Kind>,
            Ok = sequence::Number,
            Err = Traced<database::Error>,
        > + Database<Insert<Quotation>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Quotation;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CreateQuotation,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateQuotation {
            actor,
            requests,
            notes,
        } = cmd;

        if actor.role != Role::Customer {
            return Err(tracerr::new!(E::NotCustomer(actor)));
        }

        let products = self
            .database()
            .execute(Select(By::new(
                requests.iter().map(|r| r.product_id).collect::<Vec<_>>(),
            )))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        let (items, totals) =
            quotation::price(&requests, &products, &self.config.terms)
                .map_err(tracerr::from_and_wrap!(=> E))?;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let number = tx
            .execute(Next(sequence::Kind::Quotation))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let now = DateTime::now();
        let quotation = Quotation {
            id: quotation::Id::new(),
            number,
            customer_id: actor.id,
            items,
            totals,
            status: quotation::Status::Draft,
            notes,
            valid_until: (now + self.config.terms.quotation_validity).coerce(),
            created_at: now.coerce(),
            updated_at: now.coerce(),
        };
        tx.execute(Insert(quotation.clone()))
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

/// Error of [`CreateQuotation`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// Requested items cannot be priced.
    #[display("Failed to price the requested items: {_0}")]
    Pricing(#[error(not(source))] PricingError),

    /// [`Actor`] is not a customer.
    #[display("`User(id: {})` is not a customer", _0.id)]
    #[from(ignore)]
    NotCustomer(#[error(not(source))] Actor),
}

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use common::{operations::Insert, DateTime, Percent};

    use crate::{
        domain::{
            order,
            product::Reservation,
            quotation::{self, PricingError, Request},
            rental::{Notes, Quantity},
        },
        infra::Database as _,
        testing, Command as _,
    };

    use super::{CreateQuotation, ExecutionError};

    #[tokio::test]
    async fn prices_and_numbers_quotations() {
        let svc = testing::service();
        let vendor = testing::vendor();
        let customer = testing::customer();
        let (drill, saw) = (
            testing::product(&svc, vendor.id, 5, 100).await,
            testing::product(&svc, vendor.id, 2, 333).await,
        );
        let window =
            testing::period("2024-03-01T00:00:00Z", "2024-03-03T00:00:00Z");

        let first = svc
            .execute(CreateQuotation {
                actor: customer,
                requests: vec![
                    Request {
                        product_id: drill.id,
                        quantity: Quantity::new(2).unwrap(),
                        period: window,
                    },
                    Request {
                        product_id: saw.id,
                        quantity: Quantity::new(1).unwrap(),
                        period: window,
                    },
                ],
                notes: Notes::new("Deliver to the back gate"),
            })
            .await
            .unwrap();
        let second =
            testing::quotation(&svc, customer, &[(&drill, 1, window)]).await;

        assert_eq!(first.number.to_string(), "QT000001");
        assert_eq!(second.number.to_string(), "QT000002");
        assert_eq!(first.status, quotation::Status::Draft);
        assert_eq!(first.customer_id, customer.id);
        assert_eq!(first.vendor_id(), Some(vendor.id));
        assert_eq!(first.totals.subtotal, testing::inr("1066"));
        assert_eq!(first.totals.tax_rate, Percent::from_str("18").unwrap());
        assert_eq!(first.totals.total_amount, testing::inr("1257.88"));
        assert!(!first.is_outdated_at(DateTime::now()));
    }

    #[tokio::test]
    async fn rejects_unavailable_items_by_name() {
        let svc = testing::service();
        let vendor = testing::vendor();
        let mut crane = testing::product(&svc, vendor.id, 5, 100).await;
        let window =
            testing::period("2024-03-01T00:00:00Z", "2024-03-03T00:00:00Z");
        crane.reservations.push(Reservation {
            product_id: crane.id,
            order_id: order::Id::new(),
            quantity: Quantity::new(5).unwrap(),
            period: testing::period(
                "2024-02-25T00:00:00Z",
                "2024-03-01T00:00:00Z",
            ),
        });
        svc.database()
            .execute(Insert(crane.clone()))
            .await
            .unwrap();

        let err = svc
            .execute(CreateQuotation {
                actor: testing::customer(),
                requests: vec![Request {
                    product_id: crane.id,
                    quantity: Quantity::new(1).unwrap(),
                    period: window,
                }],
                notes: None,
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::Pricing(PricingError::NotAvailable { name, .. })
                if name == &crane.name,
        ));
    }

    #[tokio::test]
    async fn allows_customers_only() {
        let svc = testing::service();
        let vendor = testing::vendor();
        let drill = testing::product(&svc, vendor.id, 5, 100).await;

        let err = svc
            .execute(CreateQuotation {
                actor: vendor,
                requests: vec![Request {
                    product_id: drill.id,
                    quantity: Quantity::new(1).unwrap(),
                    period: testing::period(
                        "2024-03-01T00:00:00Z",
                        "2024-03-02T00:00:00Z",
                    ),
                }],
                notes: None,
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::NotCustomer(_)));
    }

    #[tokio::test]
    async fn rejects_empty_requests() {
        let svc = testing::service();

        let err = svc
            .execute(CreateQuotation {
                actor: testing::customer(),
                requests: vec![],
                notes: None,
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::Pricing(PricingError::NoItems),
        ));
    }
}
