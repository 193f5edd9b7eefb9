//! [`Query`] collection related to [`Invoice`]s.

use common::operations::By;

use crate::domain::{access::Scope, invoice, order, Invoice};
#[cfg(doc)]
use crate::{
    domain::{user::Actor, Order},
    Query,
};

use super::{DatabaseQuery, VisibleQuery};

/// Queries an [`Invoice`] by its [`invoice::Id`] for an [`Actor`].
pub type ById = VisibleQuery<Invoice, invoice::Id>;

/// Queries an [`Invoice`] of an [`Order`] for an [`Actor`].
pub type ByOrderId = VisibleQuery<Invoice, order::Id>;

/// Queries a list of [`Invoice`]s within a [`Scope`], newest first.
pub type List = DatabaseQuery<By<Vec<Invoice>, Scope>>;

#[cfg(test)]
mod spec {
    use crate::{
        command::CreateInvoice,
        domain::{access::Scope, order},
        query::{invoice, VisibleQueryError},
        testing, Query as _,
    };

    #[tokio::test]
    async fn shows_invoice_to_its_parties_only() {
        let svc = testing::service();
        let vendor = testing::vendor();
        let customer = testing::customer();
        let drill = testing::product(&svc, vendor.id, 5, 100).await;
        let window =
            testing::period("2024-03-01T00:00:00Z", "2024-03-03T00:00:00Z");
        let order =
            testing::order(&svc, customer, &[(&drill, 1, window)]).await;
        let created = svc
            .execute(CreateInvoice {
                order_id: order.id,
                actor: vendor,
                due_at: None,
                notes: None,
            })
            .await
            .unwrap();

        for actor in [customer, vendor, testing::admin()] {
            let found = svc
                .execute(invoice::ByOrderId::by(order.id, actor))
                .await
                .unwrap();
            assert_eq!(found.id, created.id);
        }

        let err = svc
            .execute(invoice::ById::by(created.id, testing::customer()))
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), VisibleQueryError::NotPermitted(_)));

        let err = svc
            .execute(invoice::ByOrderId::by(order::Id::new(), customer))
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), VisibleQueryError::NotExists(_)));

        let listed = svc
            .execute(invoice::List::by(Scope::Vendor(testing::vendor().id)))
            .await
            .unwrap();
        assert!(listed.is_empty());
    }
}
