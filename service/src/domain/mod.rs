//! Domain definitions.

pub mod investment;
pub mod user;

pub use self::{investment::Investment, user::User};
