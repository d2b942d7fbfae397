//! [`Query`] collection related to a single [`User`].

use common::operations::By;

#[cfg(doc)]
use crate::Query;
use crate::domain::{user, User};

use super::DatabaseQuery;

/// Queries a [`User`] along with its current balance by its [`user::Id`].
///
/// Resolves to [`None`] if no such [`User`] exists.
pub type ById = DatabaseQuery<By<Option<User>, user::Id>>;
