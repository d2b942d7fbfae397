//! [`Command`] definition.

pub mod authorize_user_session;
pub mod mature_investments;

/// [`Command`] of the [`Service`].
///
/// [`Service`]: crate::Service
pub use common::Handler as Command;

pub use self::{
    authorize_user_session::AuthorizeUserSession,
    mature_investments::MatureInvestments,
};
