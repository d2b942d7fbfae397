//! GraphQL [`Mutation`]s definitions.

use juniper::graphql_object;
use service::{command, Command as _};

use crate::{define_error, AsError, Context, Error};

/// Root of all GraphQL mutations.
#[derive(Clone, Copy, Debug)]
pub struct Mutation;

impl Mutation {
    /// Name of the [`tracing::Span`] for the mutations.
    const SPAN_NAME: &'static str = "GraphQL mutation";
}

#[graphql_object(context = Context)]
impl Mutation {
    /// Settles all the `Investment`s which reached their maturity date,
    /// crediting their `User`s.
    ///
    /// Returns the number of `Investment`s settled by this call. Settling is
    /// idempotent: an `Investment` is never paid out twice, even if this
    /// mutation is run concurrently.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `AUTHORIZATION_REQUIRED` - no valid access token is provided;
    /// - `NOT_ADMIN` - the current `User` is not an administrator;
    /// - `SWEEP_TIMEOUT` - settling didn't finish in time, and should be
    ///                     retried.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "matureInvestments",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn mature_investments(ctx: &Context) -> Result<i32, Error> {
        _ = ctx
            .current_session()
            .await?
            .ensure_admin()
            .map_err(ctx.error())?;

        let settled = ctx
            .service()
            .execute(command::MatureInvestments)
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?;
        i32::try_from(settled)
            .map_err(AsError::into_error)
            .map_err(ctx.error())
    }
}

impl AsError for command::mature_investments::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::Timeout(_) => Some(SweepError::Timeout.into()),
            Self::PayoutOverflow(_) | Self::UserNotExists(_) => None,
        }
    }
}

define_error! {
    enum SweepError {
        #[code = "SWEEP_TIMEOUT"]
        #[status = SERVICE_UNAVAILABLE]
        #[message = "Settling matured `Investment`s timed out"]
        Timeout,
    }
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use service::{
        command::mature_investments::ExecutionError,
        domain::{investment, user},
    };

    use crate::AsError as _;

    #[test]
    fn maps_timeout_to_sweep_timeout() {
        let err = ExecutionError::Timeout(Duration::from_secs(1)).as_error();

        assert_eq!(err.code, "SWEEP_TIMEOUT");
        assert_eq!(err.status_code, http::StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn hides_settlement_failures_details() {
        for err in [
            ExecutionError::UserNotExists(user::Id::new()),
            ExecutionError::PayoutOverflow(investment::Id::new()),
        ] {
            assert!(err.try_as_error().is_none());

            let err = err.as_error();
            assert_eq!(err.code, "INTERNAL_SERVER_ERROR");
            assert_eq!(
                err.status_code,
                http::StatusCode::INTERNAL_SERVER_ERROR,
            );
            assert_eq!(err.message, "Internal server error");
        }
    }
}
