//! [`Query`] collection related to multiple [`Investment`]s.

use common::operations::By;

use crate::domain::{investment, user, Investment};
#[cfg(doc)]
use crate::{domain::User, Query};

use super::DatabaseQuery;

/// Queries all the [`Investment`]s of a [`User`], the most recently started
/// first.
pub type ByUser = DatabaseQuery<By<Vec<Investment>, user::Id>>;

/// Queries all the [`Investment`]s having the provided [`investment::Status`].
pub type ByStatus = DatabaseQuery<By<Vec<Investment>, investment::Status>>;

/// Queries all the [`investment::Status::Active`] [`Investment`]s.
#[must_use]
pub fn active() -> ByStatus {
    ByStatus::by(investment::Status::Active)
}
