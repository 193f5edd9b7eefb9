//! Fixtures for exercising [`Command`]s and [`Query`]s upon a [`Memory`]
//! database.
//!
//! [`Command`]: crate::Command
//! [`Query`]: crate::Query

use std::{str::FromStr as _, time};

use common::{money::Currency, operations::Insert, DateTime, Money};
use rust_decimal::Decimal;

use crate::{
    command::{ConfirmQuotation, CreateOrder, CreateQuotation},
    domain::{
        product::{self, Pricing},
        quotation,
        rental::{Period, Quantity, Terms},
        user::{self, Actor, Role},
        Order, Product, Quotation,
    },
    infra::{Database as _, Memory},
    task, Command as _, Config, Service,
};

/// Secret the [JWT]s are signed with.
///
/// [JWT]: https://datatracker.ietf.org/doc/html/rfc7519
pub(crate) const JWT_SECRET: &[u8] = b"rental-marketplace";

/// Creates a new [`Service`] upon an empty [`Memory`] database.
pub(crate) fn service() -> Service<Memory> {
    Service {
        config: Config {
            jwt_decoding_key: jsonwebtoken::DecodingKey::from_secret(
                JWT_SECRET,
            ),
            terms: Terms::default(),
            expire_quotations: task::expire_quotations::Config {
                interval: time::Duration::from_secs(60),
            },
        },
        database: Memory::new(),
    }
}

fn actor(role: Role) -> Actor {
    Actor {
        id: user::Id::new(),
        role,
    }
}

/// Creates a new random customer [`Actor`].
pub(crate) fn customer() -> Actor {
    actor(Role::Customer)
}

/// Creates a new random vendor [`Actor`].
pub(crate) fn vendor() -> Actor {
    actor(Role::Vendor)
}

/// Creates a new random admin [`Actor`].
pub(crate) fn admin() -> Actor {
    actor(Role::Admin)
}

/// Parses a [`Period`] out of the provided RFC 3339 bounds.
pub(crate) fn period(start: &str, end: &str) -> Period {
    Period::new(
        DateTime::from_rfc3339(start).unwrap().coerce(),
        DateTime::from_rfc3339(end).unwrap().coerce(),
    )
    .unwrap()
}

/// Parses [`Money`] in the default [`Currency`].
pub(crate) fn inr(amount: &str) -> Money {
    Money {
        amount: Decimal::from_str(amount).unwrap(),
        currency: Currency::Inr,
    }
}

/// Stores a new [`Product`] of the provided vendor rented daily.
pub(crate) async fn product(
    svc: &Service<Memory>,
    vendor_id: user::Id,
    quantity_on_hand: u32,
    daily: u32,
) -> Product {
    let product = Product {
        id: product::Id::new(),
        name: product::Name::new(format!("Tool #{daily}")).unwrap(),
        vendor_id,
        quantity_on_hand,
        pricing: Pricing {
            currency: Currency::Inr,
            hourly: None,
            daily: Some(Decimal::from(daily)),
            weekly: None,
        },
        reservations: vec![],
    };
    svc.database().execute(Insert(product.clone())).await.unwrap();
    product
}

/// Creates a new draft [`Quotation`] of the provided items.
pub(crate) async fn quotation(
    svc: &Service<Memory>,
    customer: Actor,
    items: &[(&Product, u32, Period)],
) -> Quotation {
    svc.execute(CreateQuotation {
        actor: customer,
        requests: items
            .iter()
            .map(|(p, q, period)| quotation::Request {
                product_id: p.id,
                quantity: Quantity::new(*q).unwrap(),
                period: *period,
            })
            .collect(),
        notes: None,
    })
    .await
    .unwrap()
}

/// Creates a new confirmed [`Order`] of the provided items.
pub(crate) async fn order(
    svc: &Service<Memory>,
    customer: Actor,
    items: &[(&Product, u32, Period)],
) -> Order {
    let q = quotation(svc, customer, items).await;
    _ = svc
        .execute(ConfirmQuotation {
            quotation_id: q.id,
            actor: customer,
        })
        .await
        .unwrap();
    svc.execute(CreateOrder {
        quotation_id: q.id,
        actor: customer,
        shipping_address: None,
        notes: None,
        security_deposit: None,
    })
    .await
    .unwrap()
}
