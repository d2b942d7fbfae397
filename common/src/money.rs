//! [`Money`]-related definitions.

use std::{fmt, str::FromStr};

#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use rust_decimal::Decimal;

use crate::Percent;

/// Non-negative amount of money.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Money(Decimal);

impl Money {
    /// Zero amount of [`Money`].
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Creates a new [`Money`] if the provided `amount` is not negative.
    #[must_use]
    pub fn new(amount: Decimal) -> Option<Self> {
        if amount.is_zero() {
            return Some(Self::ZERO);
        }
        (!amount.is_sign_negative()).then_some(Self(amount))
    }

    /// Returns the [`Decimal`] amount of this [`Money`].
    #[must_use]
    pub const fn amount(self) -> Decimal {
        self.0
    }

    /// Adds the `other` [`Money`] to this one.
    ///
    /// [`None`] is returned on overflow.
    #[must_use]
    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    /// Returns this [`Money`] increased by the provided flat `rate`.
    ///
    /// For example, `1000` with a `20%` rate becomes `1200`.
    ///
    /// [`None`] is returned on overflow.
    #[must_use]
    pub fn with_return(self, rate: Percent) -> Option<Self> {
        let multiplier = Decimal::ONE.checked_add(rate.fraction())?;
        self.0.checked_mul(multiplier).map(Self)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

impl FromStr for Money {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let amount = Decimal::from_str(s).map_err(|_| "invalid amount")?;
        Self::new(amount).ok_or("negative amount")
    }
}

impl TryFrom<Decimal> for Money {
    type Error = &'static str;

    fn try_from(amount: Decimal) -> Result<Self, Self::Error> {
        Self::new(amount).ok_or("negative amount")
    }
}

impl From<Money> for Decimal {
    fn from(money: Money) -> Self {
        money.0
    }
}

#[cfg(feature = "juniper")]
mod juniper {
    //! Module providing integration with [`juniper`] crate.

    use std::str::FromStr as _;

    use juniper::{graphql_scalar, InputValue, ScalarValue, Value};

    /// Non-negative decimal amount of money, formatted as a string without
    /// trailing zeros (e.g. `"1200"` or `"10.5"`).
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

    use super::Money;

    fn money(s: &str) -> Money {
        Money::from_str(s).unwrap()
    }

    fn percent(s: &str) -> Percent {
        Percent::from_str(s).unwrap()
    }

    #[test]
    fn rejects_negative_amounts() {
        assert!(Money::from_str("-0.01").is_err());
        assert!(Money::new(Decimal::NEGATIVE_ONE).is_none());
        assert!(Money::from_str("abc").is_err());

        assert_eq!(money("0"), Money::ZERO);
        assert_eq!(money("-0"), Money::ZERO);
        assert!(Money::from_str("12.34").is_ok());
    }

    #[test]
    fn displays_without_trailing_zeros() {
        assert_eq!(money("1200.00").to_string(), "1200");
        assert_eq!(money("10.50").to_string(), "10.5");
        assert_eq!(money("0.000").to_string(), "0");
    }

    #[test]
    fn applies_flat_return() {
        assert_eq!(
            money("1000").with_return(percent("20")),
            Some(money("1200")),
        );
        assert_eq!(
            money("500").with_return(percent("20")),
            Some(money("600")),
        );
        assert_eq!(
            money("123.45").with_return(percent("20")),
            Some(money("148.14")),
        );
        assert_eq!(
            money("1000").with_return(percent("0")),
            Some(money("1000")),
        );
        assert_eq!(money("0").with_return(percent("20")), Some(Money::ZERO));
    }

    #[test]
    fn detects_overflow() {
        let max = Money::new(Decimal::MAX).unwrap();

        assert_eq!(max.checked_add(money("1")), None);
        assert_eq!(max.with_return(percent("20")), None);
        assert_eq!(money("1").checked_add(money("2.5")), Some(money("3.5")));
    }
}
