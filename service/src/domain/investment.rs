//! [`Investment`] definitions.

use std::time::Duration;

#[cfg(doc)]
use common::DateTime;
use common::{define_kind, unit, DateTimeOf, Money};
use derive_more::{Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::user;
#[cfg(doc)]
use crate::domain::User;

/// Fixed-term investment of a [`User`].
#[derive(Clone, Debug)]
pub struct Investment {
    /// ID of this [`Investment`].
    pub id: Id,

    /// ID of the [`User`] owning this [`Investment`].
    pub user_id: user::Id,

    /// Invested principal.
    pub amount: Money,

    /// [`DateTime`] when this [`Investment`] started.
    pub started_at: StartDateTime,

    /// Number of days after [`Investment::started_at`] this [`Investment`]
    /// matures.
    pub duration: Days,

    /// [`Status`] of this [`Investment`].
    pub status: Status,

    /// [`DateTime`] when this [`Investment`] was completed, if it was.
    pub completed_at: Option<CompletionDateTime>,

    /// Amount credited to the [`User`] on completion, if completed.
    pub payout: Option<Money>,
}

impl Investment {
    /// Length of a single day of [`Investment::duration`].
    pub const DAY: Duration = Duration::from_secs(24 * 60 * 60);

    /// Returns [`DateTime`] when this [`Investment`] matures.
    ///
    /// [`None`] is returned if the maturity date is not representable, so
    /// such an [`Investment`] never matures.
    #[must_use]
    pub fn matures_at(&self) -> Option<MaturityDateTime> {
        self.started_at
            .checked_add(Self::DAY * u32::from(self.duration))
            .map(|at| at.coerce())
    }

    /// Indicates whether this [`Investment`] has reached its maturity date at
    /// the provided moment.
    #[must_use]
    pub fn is_matured<Of: ?Sized>(&self, now: DateTimeOf<Of>) -> bool {
        let now: MaturityDateTime = now.coerce();
        self.matures_at().is_some_and(|at| now >= at)
    }

    /// Indicates whether this [`Investment`] is still [`Status::Active`].
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == Status::Active
    }
}

/// ID of an [`Investment`].
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

/// Number of days an [`Investment`] lasts.
pub type Days = u16;

define_kind! {
    #[doc = "Status of an [`Investment`]."]
    enum Status {
        #[doc = "[`Investment`] is running and wasn't paid out yet."]
        Active = 1,

        #[doc = "[`Investment`] matured and was paid out."]
        Completed = 2,
    }
}

/// Settlement of a matured [`Investment`].
///
/// Applying it transitions the [`Investment`] from [`Status::Active`] to
/// [`Status::Completed`], but only if it's still [`Status::Active`].
#[derive(Clone, Copy, Debug)]
pub struct Completion {
    /// ID of the [`Investment`] being completed.
    pub investment_id: Id,

    /// [`DateTime`] of the completion.
    pub completed_at: CompletionDateTime,

    /// Amount credited to the owning [`User`].
    pub payout: Money,
}

/// [`DateTime`] when an [`Investment`] started.
pub type StartDateTime = DateTimeOf<(Investment, unit::Start)>;

/// [`DateTime`] when an [`Investment`] matures.
pub type MaturityDateTime = DateTimeOf<(Investment, unit::Expiration)>;

/// [`DateTime`] when an [`Investment`] was completed.
pub type CompletionDateTime = DateTimeOf<(Investment, unit::Completion)>;

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use common::{DateTime, Money};

    use crate::domain::user;

    use super::{Days, Id, Investment, Status};

    fn investment(started_days_ago: u32, duration: Days) -> Investment {
        Investment {
            id: Id::new(),
            user_id: user::Id::new(),
            amount: Money::from_str("1000").unwrap(),
            started_at: (DateTime::now()
                - Investment::DAY * started_days_ago)
                .coerce(),
            duration,
            status: Status::Active,
            completed_at: None,
            payout: None,
        }
    }

    #[test]
    fn matures_after_duration() {
        let inv = investment(40, 30);

        assert_eq!(
            inv.matures_at(),
            Some((inv.started_at + Investment::DAY * 30).coerce()),
        );
        assert!(inv.is_matured(DateTime::now()));
    }

    #[test]
    fn not_matured_before_duration() {
        let inv = investment(10, 30);

        assert!(!inv.is_matured(DateTime::now()));
    }

    #[test]
    fn matures_exactly_at_maturity_date() {
        let inv = investment(0, 30);
        let at = inv.matures_at().unwrap();

        assert!(inv.is_matured(at));
        assert!(!inv.is_matured(at - std::time::Duration::from_micros(1)));
    }

    #[test]
    fn zero_duration_matures_immediately() {
        let inv = investment(0, 0);

        assert!(inv.is_matured(inv.started_at));
    }

    #[test]
    fn unrepresentable_maturity_never_matures() {
        let mut inv = investment(0, Days::MAX);
        inv.started_at =
            DateTime::from_rfc3339("9999-06-01T00:00:00Z").unwrap().coerce();

        assert_eq!(inv.matures_at(), None);
        assert!(!inv.is_matured(
            DateTime::from_rfc3339("9999-12-31T23:59:59Z").unwrap(),
        ));
    }

    #[test]
    fn status_is_persisted_as_u8() {
        assert_eq!(Status::Active.u8(), 1);
        assert_eq!(Status::Completed.u8(), 2);
        assert_eq!(Status::try_from(2_u8), Ok(Status::Completed));
        assert_eq!(Status::try_from(3_u8), Err(3));
    }

    #[test]
    fn status_has_screaming_name() {
        assert_eq!(Status::Completed.to_string(), "COMPLETED");
        assert_eq!(Status::from_str("ACTIVE"), Ok(Status::Active));
        assert!(Status::from_str("active").is_err());
    }
}
