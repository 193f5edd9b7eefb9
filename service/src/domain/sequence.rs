//! Human-readable document numbering.

use common::define_kind;
use derive_more::{AsRef, Display};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};

define_kind! {
    #[doc = "Kind of a numbered document."]
    enum Kind {
        #[doc = "Quotation, numbered as `QT000001`."]
        Quotation = 1,

        #[doc = "Order, numbered as `ORD000001`."]
        Order = 2,

        #[doc = "Pickup, numbered as `PK000001`."]
        Pickup = 3,

        #[doc = "Return, numbered as `RT000001`."]
        Return = 4,

        #[doc = "Invoice, numbered as `INV000001`."]
        Invoice = 5,
    }
}

impl Kind {
    /// Returns the prefix of a [`Number`] of this [`Kind`].
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Quotation => "QT",
            Self::Order => "ORD",
            Self::Pickup => "PK",
            Self::Return => "RT",
            Self::Invoice => "INV",
        }
    }

    /// Formats the provided sequence `value` as a [`Number`] of this [`Kind`].
    #[must_use]
    pub fn number(self, value: u64) -> Number {
        Number(format!("{}{value:06}", self.prefix()))
    }
}

/// Human-readable number of a document.
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Number(String);

impl Number {
    /// Creates a new [`Number`] without checking its format.
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `number` was produced by
    /// [`Kind::number()`].
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(number: impl Into<String>) -> Self {
        Self(number.into())
    }
}

#[cfg(test)]
mod spec {
    use super::Kind;

    #[test]
    fn pads_numbers() {
        assert_eq!(Kind::Quotation.number(1).to_string(), "QT000001");
        assert_eq!(Kind::Order.number(42).to_string(), "ORD000042");
        assert_eq!(Kind::Pickup.number(999_999).to_string(), "PK999999");
        assert_eq!(Kind::Return.number(7).to_string(), "RT000007");
        assert_eq!(Kind::Invoice.number(1_234_567).to_string(), "INV1234567");
    }
}
