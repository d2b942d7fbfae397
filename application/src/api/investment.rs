//! [`Investment`]-related definitions.

use common::{DateTime, Money};
use derive_more::{Display, From, Into};
use juniper::{graphql_object, GraphQLEnum, GraphQLScalar};
use service::domain;
use uuid::Uuid;

use crate::Context;

/// Fixed-term [`Investment`] of a `User`.
#[derive(Clone, Debug, From)]
pub struct Investment(domain::Investment);

/// Fixed-term investment of a `User`.
#[graphql_object(context = Context)]
impl Investment {
    /// Unique identifier of this `Investment`.
    pub fn id(&self) -> Id {
        self.0.id.into()
    }

    /// Invested principal.
    pub fn amount(&self) -> Money {
        self.0.amount
    }

    /// `DateTime` when this `Investment` started.
    pub fn started_at(&self) -> DateTime {
        self.0.started_at.coerce()
    }

    /// Number of days this `Investment` lasts.
    pub fn duration_days(&self) -> i32 {
        self.0.duration.into()
    }

    /// `DateTime` when this `Investment` matures.
    ///
    /// `null` if the maturity date is too far in the future to be
    /// represented.
    pub fn matures_at(&self) -> Option<DateTime> {
        self.0.matures_at().map(|at| at.coerce())
    }

    /// Current status of this `Investment`.
    pub fn status(&self) -> Status {
        self.0.status.into()
    }

    /// `DateTime` when this `Investment` was completed.
    ///
    /// `null` if it's still active.
    pub fn completed_at(&self) -> Option<DateTime> {
        self.0.completed_at.map(|at| at.coerce())
    }

    /// Amount credited to the owning `User` on completion.
    ///
    /// `null` if it's still active.
    pub fn payout(&self) -> Option<Money> {
        self.0.payout
    }
}

/// Unique identifier of an `Investment`.
#[derive(
    Clone, Copy, Debug, Display, Eq, From, GraphQLScalar, Into, PartialEq,
)]
#[from(domain::investment::Id)]
#[into(domain::investment::Id)]
#[graphql(name = "InvestmentId", transparent)]
pub struct Id(Uuid);

/// Status of an `Investment`.
#[derive(Clone, Copy, Debug, Eq, GraphQLEnum, PartialEq)]
#[graphql(name = "InvestmentStatus")]
pub enum Status {
    /// `Investment` is running and wasn't paid out yet.
    Active,

    /// `Investment` matured and was paid out.
    Completed,
}

impl From<domain::investment::Status> for Status {
    fn from(status: domain::investment::Status) -> Self {
        use domain::investment::Status as S;

        match status {
            S::Active => Self::Active,
            S::Completed => Self::Completed,
        }
    }
}
