//! GraphQL API definitions.

pub mod investment;
mod mutation;
mod query;
pub mod user;

use juniper::EmptySubscription;

use crate::{define_error, Context};

pub use self::{
    investment::Investment,
    mutation::Mutation,
    query::Query,
    user::{User, UserError},
};

/// GraphQL schema.
pub type Schema =
    juniper::RootNode<'static, Query, Mutation, EmptySubscription<Context>>;

/// Creates a new [`Schema`].
#[must_use]
pub fn schema() -> Schema {
    Schema::new(Query, Mutation, EmptySubscription::new())
}

define_error! {
    enum PrivilegeError {
        #[code = "NOT_ADMIN"]
        #[status = FORBIDDEN]
        #[message = "Authenticated `User` must be an administrator"]
        Admin,
    }
}
