//! [`Command`] for authorizing a [`User`] [`Session`].

use common::operations::{By, Select};
use derive_more::{Display, Error, From};
use jsonwebtoken::Validation;
use tracerr::Traced;

use crate::{
    domain::{
        user::{self, session, Session},
        User,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for authorizing a [`User`] [`Session`] by its
/// [`session::Token`].
#[derive(Clone, Debug, From)]
pub struct AuthorizeUserSession {
    /// [`Session`] token to authorize.
    pub token: session::Token,
}

/// Successfully authorized [`Session`] along with its [`User`].
#[derive(Clone, Debug)]
pub struct Output {
    /// Decoded [`Session`].
    pub session: Session,

    /// [`User`] the [`Session`] belongs to.
    pub user: User,
}

impl<Db> Command<AuthorizeUserSession> for Service<Db>
where
    Db: Database<
        Select<By<Option<User>, user::Id>>,
        Ok = Option<User>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Output;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: AuthorizeUserSession,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let AuthorizeUserSession { token } = cmd;

        let session = jsonwebtoken::decode::<Session>(
            token.as_ref(),
            &self.config().jwt_decoding_key,
            &Validation::default(),
        )
        .map_err(tracerr::from_and_wrap!(=> E))?
        .claims;

        let user = self
            .database()
            .execute(Select(By::new(session.user_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::UserNotExists(session.user_id))
            .map_err(tracerr::wrap!())?;

        Ok(Output { session, user })
    }
}

/// Error of [`AuthorizeUserSession`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`jsonwebtoken`] decoding error.
    #[display("Failed to decode a JSON Web Token: {_0}")]
    JsonWebTokenDecodeError(jsonwebtoken::errors::Error),

    /// [`User`] the [`Session`] belongs to does not exist.
    #[display("`User(id: {_0})` does not exist")]
    #[from(ignore)]
    UserNotExists(#[error(not(source))] user::Id),
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use common::DateTime;
    use jsonwebtoken::{EncodingKey, Header};

    use crate::{
        command::Command as _,
        domain::user::{self, session, Role, Session},
        fixture,
    };

    use super::{AuthorizeUserSession, ExecutionError};

    fn encode(session: &Session, secret: &[u8]) -> session::Token {
        jsonwebtoken::encode(
            &Header::default(),
            session,
            &EncodingKey::from_secret(secret),
        )
        .unwrap()
        .parse()
        .unwrap()
    }

    fn token(user_id: user::Id, valid_for: Duration) -> session::Token {
        encode(
            &Session {
                user_id,
                expires_at: (DateTime::now() + valid_for).coerce(),
            },
            fixture::JWT_SECRET,
        )
    }

    #[tokio::test]
    async fn authorizes_existing_user() {
        let svc = fixture::service();
        let user = fixture::user(&svc, Role::Admin).await;

        let out = svc
            .execute(AuthorizeUserSession {
                token: token(user.id, Duration::from_secs(60)),
            })
            .await
            .unwrap();

        assert_eq!(out.session.user_id, user.id);
        assert_eq!(out.user.id, user.id);
        assert!(out.user.is_admin());
    }

    #[tokio::test]
    async fn rejects_unknown_user() {
        let svc = fixture::service();
        let unknown = user::Id::new();

        let err = svc
            .execute(AuthorizeUserSession {
                token: token(unknown, Duration::from_secs(60)),
            })
            .await
            .unwrap_err();

        assert!(
            matches!(
                err.as_ref(),
                ExecutionError::UserNotExists(id) if *id == unknown,
            ),
            "unexpected error: {err}",
        );
    }

    #[tokio::test]
    async fn rejects_expired_token() {
        let svc = fixture::service();
        let user = fixture::user(&svc, Role::Customer).await;

        let expired = encode(
            &Session {
                user_id: user.id,
                expires_at: (DateTime::now() - Duration::from_secs(3600))
                    .coerce(),
            },
            fixture::JWT_SECRET,
        );
        let err = svc
            .execute(AuthorizeUserSession { token: expired })
            .await
            .unwrap_err();

        assert!(
            matches!(err.as_ref(), ExecutionError::JsonWebTokenDecodeError(_)),
            "unexpected error: {err}",
        );
    }

    #[tokio::test]
    async fn rejects_foreign_signature() {
        let svc = fixture::service();
        let user = fixture::user(&svc, Role::Customer).await;

        let forged = encode(
            &Session {
                user_id: user.id,
                expires_at: (DateTime::now() + Duration::from_secs(60))
                    .coerce(),
            },
            b"another-secret",
        );
        let err = svc
            .execute(AuthorizeUserSession { token: forged })
            .await
            .unwrap_err();

        assert!(
            matches!(err.as_ref(), ExecutionError::JsonWebTokenDecodeError(_)),
            "unexpected error: {err}",
        );
    }
}
