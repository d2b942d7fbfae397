//! Helpers for testing the [`Service`] against the [`Memory`] database.

use std::{str::FromStr as _, time::Duration};

use common::{operations::Insert, DateTime, Money, Percent};

use crate::{
    command,
    domain::{
        investment::{self, Days},
        user::{self, Role},
        Investment, User,
    },
    infra::{Database as _, Memory},
    task, Config, Service,
};

/// Secret the test [JWT]s are signed with.
///
/// [JWT]: https://datatracker.ietf.org/doc/html/rfc7519
pub(crate) const JWT_SECRET: &[u8] = b"test-secret";

/// Returns the default [`Config`] for tests.
pub(crate) fn config() -> Config {
    Config {
        jwt_decoding_key: jsonwebtoken::DecodingKey::from_secret(JWT_SECRET),
        mature_investments: command::mature_investments::Config {
            return_rate: Percent::whole(20),
            timeout: Duration::from_secs(5),
        },
        tasks: task::Config {
            mature_investments: task::mature_investments::Config {
                interval: Duration::from_secs(60 * 60),
            },
        },
    }
}

/// Creates a new [`Service`] with the default [`config()`] and an empty
/// [`Memory`] database.
pub(crate) fn service() -> Service<Memory> {
    service_with(config())
}

/// Creates a new [`Service`] with the provided [`Config`] and an empty
/// [`Memory`] database, without running any background tasks.
pub(crate) fn service_with(config: Config) -> Service<Memory> {
    Service {
        config,
        database: Memory::new(),
    }
}

/// Stores a new [`User`] with the provided [`Role`] and a zero balance.
pub(crate) async fn user(svc: &Service<Memory>, role: Role) -> User {
    let user = User {
        id: user::Id::new(),
        balance: Money::ZERO,
        role,
        created_at: DateTime::now().coerce(),
    };
    svc.database().execute(Insert(user.clone())).await.unwrap();
    user
}

/// Stores a new active [`Investment`] of the provided `amount`, started the
/// provided number of days ago.
pub(crate) async fn investment(
    svc: &Service<Memory>,
    user_id: user::Id,
    amount: &str,
    started_days_ago: u32,
    duration: Days,
) -> Investment {
    let investment = Investment {
        id: investment::Id::new(),
        user_id,
        amount: Money::from_str(amount).unwrap(),
        started_at: (DateTime::now() - Investment::DAY * started_days_ago)
            .coerce(),
        duration,
        status: investment::Status::Active,
        completed_at: None,
        payout: None,
    };
    svc.database()
        .execute(Insert(investment.clone()))
        .await
        .unwrap();
    investment
}

/// Parses the provided string as [`Money`].
pub(crate) fn money(amount: &str) -> Money {
    Money::from_str(amount).unwrap()
}
