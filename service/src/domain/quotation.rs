//! [`Quotation`] definitions.

use std::collections::HashMap;

use common::{define_kind, unit, DateTime, DateTimeOf, Money};
use derive_more::{Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    access::{Scope, Visible},
    fsm::Transition,
    product,
    rental::{self, Notes, Period, Quantity, Terms, Totals},
    sequence,
    user,
    Product,
};

/// Priced, time-limited offer of rental [`rental::Item`]s.
#[derive(Clone, Debug)]
pub struct Quotation {
    /// ID of this [`Quotation`].
    pub id: Id,

    /// Human-readable number of this [`Quotation`].
    pub number: sequence::Number,

    /// ID of the customer this [`Quotation`] is made for.
    pub customer_id: user::Id,

    /// Priced items of this [`Quotation`].
    pub items: Vec<rental::Item>,

    /// [`Totals`] of this [`Quotation`], frozen at pricing time.
    pub totals: Totals,

    /// [`Status`] of this [`Quotation`].
    pub status: Status,

    /// [`Notes`] of the customer.
    pub notes: Option<Notes>,

    /// [`DateTime`] this [`Quotation`] stays valid until.
    pub valid_until: ValidityDateTime,

    /// [`DateTime`] when this [`Quotation`] was created.
    pub created_at: CreationDateTime,

    /// [`DateTime`] when this [`Quotation`] was updated last time.
    pub updated_at: UpdateDateTime,
}

impl Quotation {
    /// Indicates whether this [`Quotation`] is not valid anymore at the
    /// provided [`DateTime`].
    #[must_use]
    pub fn is_outdated_at(&self, now: DateTime) -> bool {
        now > self.valid_until.coerce()
    }

    /// Returns ID of the vendor of this [`Quotation`], being the vendor of its
    /// first item.
    #[must_use]
    pub fn vendor_id(&self) -> Option<user::Id> {
        self.items.first().map(|i| i.vendor_id)
    }

    /// Indicates whether this [`Quotation`] may be deleted.
    #[must_use]
    pub fn is_deletable(&self) -> bool {
        matches!(
            self.status,
            Status::Draft | Status::Cancelled | Status::Expired,
        )
    }
}

impl Visible for Quotation {
    fn is_in(&self, scope: Scope) -> bool {
        match scope {
            Scope::All => true,
            Scope::Customer(id) => id == self.customer_id,
            Scope::Vendor(id) => self.items.iter().any(|i| i.vendor_id == id),
        }
    }
}

/// ID of a [`Quotation`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    PartialEq,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

define_kind! {
    #[doc = "Status of a [`Quotation`]."]
    enum Status {
        #[doc = "Being prepared, editable."]
        Draft = 1,

        #[doc = "Sent to the customer."]
        Sent = 2,

        #[doc = "Accepted by the customer."]
        Confirmed = 3,

        #[doc = "Not accepted in time."]
        Expired = 4,

        #[doc = "Withdrawn."]
        Cancelled = 5,
    }
}

impl Transition for Status {
    fn allows(self, next: Self) -> bool {
        use Status as S;

        match self {
            S::Draft => matches!(
                next,
                S::Sent | S::Confirmed | S::Expired | S::Cancelled,
            ),
            S::Sent => matches!(
                next,
                S::Draft | S::Confirmed | S::Expired | S::Cancelled,
            ),
            S::Confirmed | S::Expired | S::Cancelled => false,
        }
    }
}

/// Requested, not yet priced, item of a [`Quotation`].
#[derive(Clone, Copy, Debug)]
pub struct Request {
    /// ID of the requested [`Product`].
    pub product_id: product::Id,

    /// Requested [`Quantity`].
    pub quantity: Quantity,

    /// Requested rental [`Period`].
    pub period: Period,
}

/// Prices the provided [`Request`]s against the provided [`Product`]s.
///
/// Every [`Request`] must be available and priced in the [`Terms`]
/// currency.
///
/// # Errors
///
/// If any of the [`Request`]s cannot be priced.
pub fn price(
    requests: &[Request],
    products: &HashMap<product::Id, Product>,
    terms: &Terms,
) -> Result<(Vec<rental::Item>, Totals), PricingError> {
    use PricingError as E;

    if requests.is_empty() {
        return Err(E::NoItems);
    }

    let items = requests
        .iter()
        .map(|r| {
            let product = products
                .get(&r.product_id)
                .ok_or(E::ProductNotExists(r.product_id))?;
            if r.period.is_empty() {
                return Err(E::InvalidPeriod(r.product_id));
            }
            if product.pricing.currency != terms.currency {
                return Err(E::CurrencyMismatch(r.product_id));
            }
            if !product.is_available(r.quantity, &r.period) {
                return Err(E::NotAvailable {
                    product_id: product.id,
                    name: product.name.clone(),
                });
            }
            Ok(product.price(r.quantity, r.period))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let subtotal =
        Money::sum(terms.currency, items.iter().map(|i| i.total_price))
            .ok_or(E::CurrencyMismatch(requests[0].product_id))?;

    Ok((items, Totals::compute(subtotal, terms.tax_rate)))
}

/// Error of pricing [`Request`]s.
#[derive(Clone, Debug, Display, Eq, PartialEq)]
pub enum PricingError {
    /// No [`Request`]s were provided.
    #[display("no items requested")]
    NoItems,

    /// Requested [`Product`] does not exist.
    #[display("`Product(id: {_0})` does not exist")]
    ProductNotExists(product::Id),

    /// Requested [`Period`] has zero length.
    #[display("empty rental period requested for `Product(id: {_0})`")]
    InvalidPeriod(product::Id),

    /// Requested [`Product`] is priced in another currency.
    #[display("`Product(id: {_0})` is priced in another currency")]
    CurrencyMismatch(product::Id),

    /// Requested [`Quantity`] of the [`Product`] is not available.
    #[display("`Product(id: {product_id})` \"{name}\" is not available")]
    NotAvailable {
        /// ID of the unavailable [`Product`].
        product_id: product::Id,

        /// Name of the unavailable [`Product`].
        name: product::Name,
    },
}

/// [`DateTime`] when a [`Quotation`] was created.
pub type CreationDateTime = DateTimeOf<(Quotation, unit::Creation)>;

/// [`DateTime`] when a [`Quotation`] was updated.
pub type UpdateDateTime = DateTimeOf<(Quotation, unit::Update)>;

/// [`DateTime`] a [`Quotation`] is valid until.
pub type ValidityDateTime = DateTimeOf<(Quotation, unit::Expiration)>;

#[cfg(test)]
mod spec {
    use std::{collections::HashMap, str::FromStr as _};

    use common::{money::Currency, DateTime, Money, Percent};
    use rust_decimal::Decimal;

    use crate::domain::{
        fsm::Transition as _,
        order,
        product::{self, Pricing, Reservation},
        rental::{Period, Quantity, Terms},
        user, Product,
    };

    use super::{price, PricingError, Request, Status};

    fn period(start: &str, end: &str) -> Period {
        Period::new(
            DateTime::from_rfc3339(start).unwrap().coerce(),
            DateTime::from_rfc3339(end).unwrap().coerce(),
        )
        .unwrap()
    }

    fn product(currency: Currency, daily: u32) -> Product {
        Product {
            id: product::Id::new(),
            name: product::Name::new("Scaffolding").unwrap(),
            vendor_id: user::Id::new(),
            quantity_on_hand: 5,
            pricing: Pricing {
                currency,
                hourly: None,
                daily: Some(Decimal::from(daily)),
                weekly: None,
            },
            reservations: vec![],
        }
    }

    fn catalog(products: &[&Product]) -> HashMap<product::Id, Product> {
        products.iter().map(|p| (p.id, (*p).clone())).collect()
    }

    fn request(product: &Product, quantity: u32) -> Request {
        Request {
            product_id: product.id,
            quantity: Quantity::new(quantity).unwrap(),
            period: period("2024-03-01T00:00:00Z", "2024-03-03T00:00:00Z"),
        }
    }

    #[test]
    fn totals_include_default_tax() {
        let (a, b) = (product(Currency::Inr, 100), product(Currency::Inr, 333));
        let (items, totals) = price(
            &[request(&a, 2), request(&b, 1)],
            &catalog(&[&a, &b]),
            &Terms::default(),
        )
        .unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(totals.subtotal.amount, Decimal::from(1066));
        assert_eq!(totals.tax_rate, Percent::from_str("18").unwrap());
        assert_eq!(
            totals.tax_amount.amount,
            Decimal::from_str("191.88").unwrap(),
        );
        assert_eq!(
            totals.total_amount,
            Money {
                amount: Decimal::from_str("1257.88").unwrap(),
                currency: Currency::Inr,
            },
        );
    }

    #[test]
    fn rejects_unavailable_products_by_name() {
        let mut p = product(Currency::Inr, 100);
        p.reservations.push(Reservation {
            product_id: p.id,
            order_id: order::Id::new(),
            quantity: Quantity::new(5).unwrap(),
            period: period("2024-03-02T00:00:00Z", "2024-03-05T00:00:00Z"),
        });

        assert_eq!(
            price(&[request(&p, 1)], &catalog(&[&p]), &Terms::default()),
            Err(PricingError::NotAvailable {
                product_id: p.id,
                name: p.name.clone(),
            }),
        );
    }

    #[test]
    fn rejects_invalid_requests() {
        let inr = product(Currency::Inr, 100);
        let usd = product(Currency::Usd, 100);
        let terms = Terms::default();

        assert_eq!(
            price(&[], &catalog(&[&inr]), &terms),
            Err(PricingError::NoItems),
        );
        assert_eq!(
            price(&[request(&usd, 1)], &catalog(&[&inr, &usd]), &terms),
            Err(PricingError::CurrencyMismatch(usd.id)),
        );
        assert_eq!(
            price(&[request(&inr, 1)], &HashMap::new(), &terms),
            Err(PricingError::ProductNotExists(inr.id)),
        );

        let instant = Request {
            period: period("2024-03-01T00:00:00Z", "2024-03-01T00:00:00Z"),
            ..request(&inr, 1)
        };
        assert_eq!(
            price(&[instant], &catalog(&[&inr]), &terms),
            Err(PricingError::InvalidPeriod(inr.id)),
        );
    }

    #[test]
    fn follows_transition_table() {
        use Status as S;

        assert!(S::Draft.allows(S::Sent));
        assert!(S::Sent.allows(S::Draft));
        assert!(S::Sent.allows(S::Confirmed));
        assert!(S::Draft.allows(S::Expired));
        assert!(!S::Confirmed.allows(S::Cancelled));
        assert!(!S::Expired.allows(S::Draft));
        assert!(!S::Cancelled.allows(S::Sent));
        assert!(!S::Draft.allows(S::Draft));

        let err = S::Confirmed.advance(S::Draft).unwrap_err();
        assert_eq!(
            err.to_string(),
            "cannot transition from `CONFIRMED` to `DRAFT`",
        );
    }
}
