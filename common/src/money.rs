//! [`Money`]-related definitions.

use std::{fmt, ops, str::FromStr};

use rust_decimal::{prelude::ToPrimitive as _, Decimal, RoundingStrategy};

use crate::{define_kind, Percent};

/// Amount of money in some [`Currency`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Money {
    /// Amount of this [`Money`].
    pub amount: Decimal,

    /// [`Currency`] of this amount.
    pub currency: Currency,
}

impl Money {
    /// Number of minor units digits every [`Currency`] is rounded to.
    pub const MINOR_UNITS: u32 = 2;

    /// Creates a zero [`Money`] amount in the provided [`Currency`].
    #[must_use]
    pub const fn zero(currency: Currency) -> Self {
        Self {
            amount: Decimal::ZERO,
            currency,
        }
    }

    /// Indicates whether this [`Money`] amount is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    /// Indicates whether this [`Money`] amount is strictly greater than zero.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.amount > Decimal::ZERO
    }

    /// Rounds this [`Money`] to the smallest currency unit.
    #[must_use]
    pub fn round(self) -> Self {
        Self {
            amount: self.amount.round_dp_with_strategy(
                Self::MINOR_UNITS,
                RoundingStrategy::MidpointAwayFromZero,
            ),
            currency: self.currency,
        }
    }

    /// Adds the provided [`Money`] to this one.
    ///
    /// [`None`] is returned if [`Currency`]s mismatch or the sum overflows.
    #[must_use]
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        (self.currency == rhs.currency).then_some(())?;
        Some(Self {
            amount: self.amount.checked_add(rhs.amount)?,
            currency: self.currency,
        })
    }

    /// Subtracts the provided [`Money`] from this one.
    ///
    /// [`None`] is returned if [`Currency`]s mismatch or the difference
    /// overflows.
    #[must_use]
    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        (self.currency == rhs.currency).then_some(())?;
        Some(Self {
            amount: self.amount.checked_sub(rhs.amount)?,
            currency: self.currency,
        })
    }

    /// Returns the provided [`Percent`] of this [`Money`], rounded to the
    /// smallest currency unit.
    #[must_use]
    pub fn percent(self, percent: Percent) -> Self {
        Self {
            amount: percent.of(self.amount),
            currency: self.currency,
        }
        .round()
    }

    /// Sums up the provided [`Money`] amounts, all expected to be in the
    /// provided [`Currency`].
    ///
    /// [`None`] is returned if any of the amounts is in another [`Currency`].
    pub fn sum(
        currency: Currency,
        amounts: impl IntoIterator<Item = Self>,
    ) -> Option<Self> {
        amounts
            .into_iter()
            .try_fold(Self::zero(currency), Self::checked_add)
    }

    /// Returns the greater of this [`Money`] and zero.
    #[must_use]
    pub fn clamp_to_zero(self) -> Self {
        Self {
            amount: self.amount.max(Decimal::ZERO),
            currency: self.currency,
        }
    }
}

impl ops::Mul<Decimal> for Money {
    type Output = Self;

    fn mul(self, rhs: Decimal) -> Self::Output {
        Self {
            amount: self.amount * rhs,
            currency: self.currency,
        }
    }
}

impl ops::Mul<u32> for Money {
    type Output = Self;

    fn mul(self, rhs: u32) -> Self::Output {
        self * Decimal::from(rhs)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self { amount, currency } = self;
        if amount.is_integer() {
            write!(f, "{}{currency}", amount.to_i128().expect("integer"))
        } else {
            write!(f, "{}{currency}", amount.normalize())
        }
    }
}

impl FromStr for Money {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() < 4 {
            return Err("too short");
        }

        let (amount, currency) = s.split_at(s.len() - 3);
        let amount = Decimal::from_str(amount).map_err(|_| "invalid amount")?;
        let currency =
            Currency::from_str(currency).map_err(|_| "invalid currency")?;

        Ok(Self { amount, currency })
    }
}

define_kind! {
    #[doc = "Currency of a [`Money`] amount."]
    enum Currency {
        #[doc = "US Dollar."]
        Usd = 1,

        #[doc = "Euro."]
        Eur = 2,

        #[doc = "Indian Rupee."]
        Inr = 3,
    }
}

#[cfg(feature = "juniper")]
mod juniper {
    //! Module providing integration with [`juniper`] crate.

    use std::str::FromStr as _;

    use juniper::{graphql_scalar, InputValue, ScalarValue, Value};

    /// Money in `{major}.{minor}{currency}` format, where:
    /// - `major` is an integer;
    /// - `minor` is an optional integer;
    /// - `currency` is a three-letter currency code.
    #[graphql_scalar(with = Self, parse_token(String))]
    type Money = super::Money;

    impl Money {
        fn to_output<S: ScalarValue>(m: &Money) -> Value<S> {
            Value::scalar(m.to_string())
        }

        fn from_input<S: ScalarValue>(
            input: &InputValue<S>,
        ) -> Result<Self, String> {
            input
                .as_string_value()
                .ok_or_else(|| {
                    format!(
                        "Cannot parse `Money` input scalar from \
                         non-string value: {input}",
                    )
                })
                .and_then(|s| {
                    Self::from_str(s).map_err(|e| {
                        format!("Cannot parse `Money` input scalar: {e}")
                    })
                })
        }
    }
}

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use rust_decimal::Decimal;

    use crate::Percent;

    use super::{Currency, Money};

    fn decimal(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn inr(s: &str) -> Money {
        Money {
            amount: decimal(s),
            currency: Currency::Inr,
        }
    }

    #[test]
    fn from_str() {
        assert_eq!(
            Money::from_str("123.45USD").unwrap(),
            Money {
                amount: decimal("123.45"),
                currency: Currency::Usd,
            },
        );
        assert_eq!(Money::from_str("123.45INR").unwrap(), inr("123.45"));

        assert!(Money::from_str("123.45").is_err());
        assert!(Money::from_str("123.45Us").is_err());
        assert!(Money::from_str("123.45Usdollar").is_err());

        assert!(Money::from_str("123.00USD").is_ok());
        assert!(Money::from_str("123USD").is_ok());
    }

    #[test]
    fn to_string() {
        assert_eq!(inr("123.45").to_string(), "123.45INR");
        assert_eq!(inr("123.00").to_string(), "123INR");
        assert_eq!(inr("123.50").to_string(), "123.5INR");
        assert_eq!(
            Money {
                amount: decimal("7"),
                currency: Currency::Eur,
            }
            .to_string(),
            "7EUR",
        );
    }

    #[test]
    fn adds_same_currency_only() {
        assert_eq!(
            inr("10.25").checked_add(inr("0.75")),
            Some(inr("11.00")),
        );
        assert_eq!(
            inr("10").checked_add(Money {
                amount: decimal("1"),
                currency: Currency::Usd,
            }),
            None,
        );
        assert_eq!(inr("10").checked_sub(inr("12.5")), Some(inr("-2.5")));
    }

    #[test]
    fn sums_amounts() {
        assert_eq!(
            Money::sum(Currency::Inr, [inr("1"), inr("2.5"), inr("3")]),
            Some(inr("6.5")),
        );
        assert_eq!(
            Money::sum(Currency::Inr, []),
            Some(Money::zero(Currency::Inr)),
        );
        assert_eq!(Money::sum(Currency::Usd, [inr("1")]), None);
    }

    #[test]
    fn takes_percent_rounded_to_minor_units() {
        let eighteen = Percent::new(decimal("18")).unwrap();
        assert_eq!(inr("1000").percent(eighteen), inr("180"));
        assert_eq!(inr("33.33").percent(eighteen), inr("6.00"));
        assert_eq!(inr("0.25").percent(eighteen), inr("0.05"));
    }

    #[test]
    fn multiplies() {
        assert_eq!(inr("12.5") * 4, inr("50"));
        assert_eq!(inr("100") * decimal("0.1"), inr("10"));
    }

    #[test]
    fn clamps_to_zero() {
        assert_eq!(inr("-3").clamp_to_zero(), inr("0"));
        assert_eq!(inr("3").clamp_to_zero(), inr("3"));
    }
}
