//! [`User`]-related definitions.

use common::{DateTime, Money};
use derive_more::{Display, From, Into};
use juniper::{graphql_object, GraphQLEnum, GraphQLScalar};
use service::{domain, query, Query as _};
use uuid::Uuid;

use crate::{api, define_error, AsError, Context, Error};

/// A [`User`] of the bank.
#[derive(Clone, Debug, From)]
pub struct User(domain::User);

/// A `User` of the bank.
#[graphql_object(context = Context)]
impl User {
    /// Unique identifier of this `User`.
    pub fn id(&self) -> Id {
        self.0.id.into()
    }

    /// Current balance of this `User`.
    pub fn balance(&self) -> Money {
        self.0.balance
    }

    /// Role of this `User`.
    pub fn role(&self) -> Role {
        self.0.role.into()
    }

    /// `DateTime` when this `User` was created.
    pub fn created_at(&self) -> DateTime {
        self.0.created_at.coerce()
    }

    /// All the `Investment`s of this `User`, the most recently started first.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "User.investments",
            otel.name = api::Query::SPAN_NAME,
            user.id = %self.0.id,
        ),
    )]
    pub async fn investments(
        &self,
        ctx: &Context,
    ) -> Result<Vec<api::Investment>, Error> {
        Ok(ctx
            .service()
            .execute(query::investments::ByUser::by(self.0.id))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .into_iter()
            .map(Into::into)
            .collect())
    }
}

/// Unique identifier of a `User`.
#[derive(
    Clone, Copy, Debug, Display, Eq, From, GraphQLScalar, Into, PartialEq,
)]
#[from(domain::user::Id)]
#[into(domain::user::Id)]
#[graphql(name = "UserId", transparent)]
pub struct Id(Uuid);

/// Role of a `User`.
#[derive(Clone, Copy, Debug, Eq, GraphQLEnum, PartialEq)]
#[graphql(name = "UserRole")]
pub enum Role {
    /// Regular bank customer.
    Customer,

    /// Staff member allowed to run back-office operations.
    Admin,
}

impl From<domain::user::Role> for Role {
    fn from(role: domain::user::Role) -> Self {
        use domain::user::Role as R;

        match role {
            R::Customer => Self::Customer,
            R::Admin => Self::Admin,
        }
    }
}

define_error! {
    enum UserError {
        #[code = "USER_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`User` does not exist"]
        NotExists,
    }
}
