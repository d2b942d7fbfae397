//! [`Percent`]-related definitions.

use std::str::FromStr;

use derive_more::Display;
use rust_decimal::Decimal;

/// Decimal percentage in the `[0; 100]` range.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub struct Percent(Decimal);

impl Percent {
    /// Creates a new [`Percent`] if the provided value lies within the
    /// `[0; 100]` range.
    #[must_use]
    pub fn new(val: Decimal) -> Option<Self> {
        (val >= Decimal::ZERO && val <= Decimal::ONE_HUNDRED)
            .then_some(Self(val))
    }

    /// Creates a new [`Percent`] out of the whole number of percents,
    /// saturating at `100`.
    #[must_use]
    pub fn whole(val: u8) -> Self {
        Self(Decimal::from(val.min(100)))
    }

    /// Returns this [`Percent`] as a fraction of one (e.g. `0.2` for `20%`).
    #[must_use]
    pub fn fraction(self) -> Decimal {
        self.0 / Decimal::ONE_HUNDRED
    }
}

impl FromStr for Percent {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s.trim_end_matches('%'))
            .ok()
            .and_then(Self::new)
            .ok_or("invalid percent value")
    }
}

#[cfg(feature = "serde")]
mod serde {
    //! Module providing integration with [`serde`] crate.

    use std::{fmt, str::FromStr as _};

    use rust_decimal::Decimal;
    use serde::{
        de::{self, Visitor},
        Deserialize, Deserializer,
    };

    use super::Percent;

    impl<'de> Deserialize<'de> for Percent {
        fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where
            D: Deserializer<'de>,
        {
            deserializer.deserialize_any(PercentVisitor)
        }
    }

    /// [`Visitor`] accepting a [`Percent`] either as a number or as a string.
    struct PercentVisitor;

    impl PercentVisitor {
        /// Validates the provided [`Decimal`] as a [`Percent`].
        fn percent<E: de::Error>(val: Decimal) -> Result<Percent, E> {
            Percent::new(val).ok_or_else(|| {
                E::custom(format!("percent `{val}` is out of `[0; 100]` range"))
            })
        }
    }

    impl Visitor<'_> for PercentVisitor {
        type Value = Percent;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a number of percents within `[0; 100]` range")
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
            Self::percent(Decimal::from(v))
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
            Self::percent(Decimal::from(v))
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
            Decimal::try_from(v).map_err(E::custom).and_then(Self::percent)
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            Percent::from_str(v).map_err(E::custom)
        }
    }
}

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use rust_decimal::Decimal;

    use super::Percent;

    #[test]
    fn checks_range() {
        assert!(Percent::new(Decimal::NEGATIVE_ONE).is_none());
        assert!(Percent::new(Decimal::ONE_HUNDRED + Decimal::ONE).is_none());
        assert!(Percent::new(Decimal::ZERO).is_some());
        assert!(Percent::new(Decimal::ONE_HUNDRED).is_some());

        assert_eq!(Percent::whole(250), Percent::whole(100));
    }

    #[test]
    fn parses_with_optional_sign() {
        assert_eq!(Percent::from_str("20").unwrap(), Percent::whole(20));
        assert_eq!(Percent::from_str("20%").unwrap(), Percent::whole(20));
        assert!(Percent::from_str("12.5").is_ok());
        assert!(Percent::from_str("101").is_err());
        assert!(Percent::from_str("twenty").is_err());
    }

    #[test]
    fn converts_to_fraction() {
        assert_eq!(
            Percent::whole(20).fraction(),
            Decimal::from_str("0.2").unwrap(),
        );
        assert_eq!(
            Percent::from_str("12.5").unwrap().fraction(),
            Decimal::from_str("0.125").unwrap(),
        );
        assert_eq!(Percent::whole(0).fraction(), Decimal::ZERO);
    }
}
