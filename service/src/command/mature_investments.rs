//! [`Command`] for settling matured [`Investment`]s.

use std::time::Duration;

use common::{
    operations::{By, Commit, Lock, Select, Transact, Transacted, Update},
    DateTime, Percent,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

#[cfg(doc)]
use crate::domain::User;
use crate::{
    domain::{investment, user, Investment},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for settling all the [`Investment`]s which reached their
/// maturity date.
///
/// Every matured [`investment::Status::Active`] [`Investment`] is marked as
/// [`investment::Status::Completed`], and its owning [`User`] is credited with
/// the [`Investment::amount`] increased by the [`Config::return_rate`]. Both
/// happen in a single transaction, and only if the [`Investment`] is still
/// active at that point, so no [`Investment`] is ever paid out twice.
///
/// Returns the number of [`Investment`]s settled by this invocation.
#[derive(Clone, Copy, Debug, Default)]
pub struct MatureInvestments;

/// Configuration of the [`MatureInvestments`] [`Command`].
#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// Flat return credited on top of an [`Investment::amount`].
    pub return_rate: Percent,

    /// Maximum duration of a single [`MatureInvestments`] execution.
    pub timeout: Duration,
}

impl<Db> Command<MatureInvestments> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>
        + Database<
            Select<By<Vec<Investment>, investment::Status>>,
            Ok = Vec<Investment>,
            Err = Traced<database::Error>,
        >,
    Transacted<Db>: Database<
            Lock<By<Investment, investment::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Update<investment::Completion>,
            Ok = bool,
            Err = Traced<database::Error>,
        > + Database<
            Update<user::Credit>,
            Ok = bool,
            Err = Traced<database::Error>,
        > + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = usize;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        _: MatureInvestments,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let Config {
            return_rate,
            timeout,
        } = self.config().mature_investments;

        let sweep = async {
            let now = DateTime::now();
            let matured = self
                .database()
                .execute(Select(By::<Vec<Investment>, _>::new(
                    investment::Status::Active,
                )))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?
                .into_iter()
                .filter(|i| i.is_matured(now));

            let mut settled: usize = 0;
            for investment in matured {
                let id = investment.id;
                let is_settled = async {
                    let payout = investment
                        .amount
                        .with_return(return_rate)
                        .ok_or(E::PayoutOverflow(id))
                        .map_err(tracerr::wrap!())?;

                    let tx = self
                        .database()
                        .execute(Transact)
                        .await
                        .map_err(tracerr::map_from_and_wrap!(=> E))?;

                    // Avoid concurrent settlements of the same `Investment`.
                    tx.execute(Lock(By::<Investment, _>::new(id)))
                        .await
                        .map_err(tracerr::map_from_and_wrap!(=> E))
                        .map(drop)?;

                    let is_completed = tx
                        .execute(Update(investment::Completion {
                            investment_id: id,
                            completed_at: DateTime::now().coerce(),
                            payout,
                        }))
                        .await
                        .map_err(tracerr::map_from_and_wrap!(=> E))?;
                    if !is_completed {
                        return Ok(false);
                    }

                    let user_id = investment.user_id;
                    let is_credited = tx
                        .execute(Update(user::Credit {
                            user_id,
                            amount: payout,
                        }))
                        .await
                        .map_err(tracerr::map_from_and_wrap!(=> E))?;
                    if !is_credited {
                        return Err(tracerr::new!(E::UserNotExists(user_id)));
                    }

                    tx.execute(Commit)
                        .await
                        .map_err(tracerr::map_from_and_wrap!(=> E))
                        .map(drop)?;

                    log::info!(
                        "`Investment(id: {id})` matured, \
                         `User(id: {user_id})` credited with {payout}",
                    );
                    Ok::<_, Traced<E>>(true)
                }
                .await
                .inspect_err(|e| {
                    log::error!("failed to mature `Investment(id: {id})`: {e}");
                })?;

                if is_settled {
                    settled += 1;
                } else {
                    log::debug!(
                        "`Investment(id: {id})` is already completed, skipping",
                    );
                }
            }
            Ok::<_, Traced<E>>(settled)
        };

        tokio::time::timeout(timeout, sweep).await.map_err(|_| {
            log::error!(
                "`command::MatureInvestments` timed out after {timeout:?}",
            );
            tracerr::new!(E::Timeout(timeout))
        })?
    }
}

/// Error of [`MatureInvestments`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// Payout of the [`Investment`] doesn't fit into `Money`.
    #[display("Payout of `Investment(id: {_0})` overflows")]
    #[from(ignore)]
    PayoutOverflow(#[error(not(source))] investment::Id),

    /// [`MatureInvestments`] didn't finish in time.
    #[display("Settling matured `Investment`s timed out after {_0:?}")]
    #[from(ignore)]
    Timeout(#[error(not(source))] Duration),

    /// [`User`] owning the [`Investment`] does not exist.
    #[display("`User(id: {_0})` does not exist")]
    #[from(ignore)]
    UserNotExists(#[error(not(source))] user::Id),
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use common::{
        operations::{By, Commit, Insert, Lock, Transact, Update},
        DateTime, Money, Percent,
    };

    use crate::{
        command::Command as _,
        domain::{investment, user, user::Role, Investment},
        fixture::{self, money},
        infra::{database, memory, Memory},
        query, Service,
    };

    use super::{ExecutionError, MatureInvestments};

    async fn balance(svc: &Service<Memory>, user_id: user::Id) -> Money {
        svc.execute(query::user::ById::by(user_id))
            .await
            .unwrap()
            .unwrap()
            .balance
    }

    async fn reload(svc: &Service<Memory>, inv: &Investment) -> Investment {
        svc.execute(query::investments::ByUser::by(inv.user_id))
            .await
            .unwrap()
            .into_iter()
            .find(|i| i.id == inv.id)
            .unwrap()
    }

    #[tokio::test]
    async fn settles_matured_investment() {
        let svc = fixture::service();
        let user = fixture::user(&svc, Role::Customer).await;
        let inv = fixture::investment(&svc, user.id, "1000", 40, 30).await;

        let settled = svc.execute(MatureInvestments).await.unwrap();

        assert_eq!(settled, 1);
        let inv = reload(&svc, &inv).await;
        assert_eq!(inv.status, investment::Status::Completed);
        assert_eq!(inv.payout, Some(money("1200")));
        assert!(inv.completed_at.is_some());
        assert_eq!(balance(&svc, user.id).await, money("1200"));
    }

    #[tokio::test]
    async fn leaves_not_matured_investment_untouched() {
        let svc = fixture::service();
        let user = fixture::user(&svc, Role::Customer).await;
        let inv = fixture::investment(&svc, user.id, "500", 10, 30).await;

        let settled = svc.execute(MatureInvestments).await.unwrap();

        assert_eq!(settled, 0);
        let inv = reload(&svc, &inv).await;
        assert_eq!(inv.status, investment::Status::Active);
        assert_eq!(inv.completed_at, None);
        assert_eq!(inv.payout, None);
        assert_eq!(balance(&svc, user.id).await, Money::ZERO);
    }

    #[tokio::test]
    async fn never_settles_twice() {
        let svc = fixture::service();
        let user = fixture::user(&svc, Role::Customer).await;
        drop(fixture::investment(&svc, user.id, "1000", 40, 30).await);

        assert_eq!(svc.execute(MatureInvestments).await.unwrap(), 1);
        assert_eq!(svc.execute(MatureInvestments).await.unwrap(), 0);
        assert_eq!(svc.execute(MatureInvestments).await.unwrap(), 0);

        assert_eq!(balance(&svc, user.id).await, money("1200"));
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_sweeps_credit_once() {
        let svc = fixture::service();
        let user = fixture::user(&svc, Role::Customer).await;
        let inv = fixture::investment(&svc, user.id, "1000", 40, 30).await;

        // Both sweeps list the `Investment` as active before any of them
        // commits, so the second one settles against a stale snapshot.
        svc.database().set_latency(Duration::from_millis(10));
        let (first, second) = tokio::join!(
            svc.execute(MatureInvestments),
            svc.execute(MatureInvestments),
        );
        svc.database().set_latency(Duration::ZERO);

        let (first, second) = (first.unwrap(), second.unwrap());
        assert_eq!(first + second, 1);
        assert_eq!(balance(&svc, user.id).await, money("1200"));
        assert_eq!(reload(&svc, &inv).await.payout, Some(money("1200")));
    }

    #[tokio::test]
    async fn refuses_to_complete_investment_twice() {
        let svc = fixture::service();
        let user = fixture::user(&svc, Role::Customer).await;
        let inv = fixture::investment(&svc, user.id, "1000", 40, 30).await;

        let tx = svc.database().execute(Transact).await.unwrap();
        tx.execute(Lock(By::<Investment, _>::new(inv.id)))
            .await
            .unwrap();
        let is_completed = tx
            .execute(Update(investment::Completion {
                investment_id: inv.id,
                completed_at: DateTime::now().coerce(),
                payout: money("1200"),
            }))
            .await
            .unwrap();
        assert!(is_completed);
        tx.execute(Commit).await.unwrap();

        // Settlement of a sweep which listed the `Investment` while active.
        let tx = svc.database().execute(Transact).await.unwrap();
        let is_completed = tx
            .execute(Update(investment::Completion {
                investment_id: inv.id,
                completed_at: DateTime::now().coerce(),
                payout: money("1200"),
            }))
            .await
            .unwrap();
        assert!(!is_completed);
    }

    #[tokio::test]
    async fn never_reprocesses_completed_investment() {
        let svc = fixture::service();
        let user = fixture::user(&svc, Role::Customer).await;
        let completed_at = (DateTime::now() - Investment::DAY * 5).coerce();
        let inv = Investment {
            status: investment::Status::Completed,
            completed_at: Some(completed_at),
            payout: Some(money("1200")),
            ..fixture::investment(&svc, user.id, "1000", 400, 30).await
        };
        svc.database().execute(Insert(inv.clone())).await.unwrap();

        assert!(inv.is_matured(DateTime::now()));
        assert_eq!(svc.execute(MatureInvestments).await.unwrap(), 0);

        let stored = reload(&svc, &inv).await;
        assert_eq!(stored.status, investment::Status::Completed);
        assert_eq!(stored.completed_at, Some(completed_at));
        assert_eq!(stored.payout, Some(money("1200")));
        assert_eq!(balance(&svc, user.id).await, Money::ZERO);
    }

    #[tokio::test]
    async fn settles_only_matured_among_many() {
        let svc = fixture::service();
        let alice = fixture::user(&svc, Role::Customer).await;
        let bob = fixture::user(&svc, Role::Customer).await;
        drop(fixture::investment(&svc, alice.id, "1000", 40, 30).await);
        drop(fixture::investment(&svc, alice.id, "250.50", 7, 7).await);
        drop(fixture::investment(&svc, alice.id, "300", 1, 90).await);
        drop(fixture::investment(&svc, bob.id, "10", 365, 365).await);
        drop(fixture::investment(&svc, bob.id, "99", 0, 0).await);

        let settled = svc.execute(MatureInvestments).await.unwrap();

        assert_eq!(settled, 4);
        assert_eq!(balance(&svc, alice.id).await, money("1500.60"));
        assert_eq!(balance(&svc, bob.id).await, money("130.80"));
        let active = svc
            .execute(query::investments::active())
            .await
            .unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].amount, money("300"));
    }

    #[tokio::test]
    async fn honours_configured_return_rate() {
        let mut config = fixture::config();
        config.mature_investments.return_rate = Percent::whole(5);
        let svc = fixture::service_with(config);
        let user = fixture::user(&svc, Role::Customer).await;
        drop(fixture::investment(&svc, user.id, "1000", 40, 30).await);

        assert_eq!(svc.execute(MatureInvestments).await.unwrap(), 1);

        assert_eq!(balance(&svc, user.id).await, money("1050"));
    }

    #[tokio::test]
    async fn fails_when_database_is_unavailable() {
        let svc = fixture::service();
        let user = fixture::user(&svc, Role::Customer).await;
        let inv = fixture::investment(&svc, user.id, "1000", 40, 30).await;

        svc.database().set_available(false);
        let err = svc.execute(MatureInvestments).await.unwrap_err();

        assert!(
            matches!(
                err.as_ref(),
                ExecutionError::Db(database::Error::Memory(
                    memory::Error::Unavailable,
                )),
            ),
            "unexpected error: {err}",
        );

        svc.database().set_available(true);
        assert_eq!(reload(&svc, &inv).await.status, investment::Status::Active);
        assert_eq!(svc.execute(MatureInvestments).await.unwrap(), 1);
        assert_eq!(balance(&svc, user.id).await, money("1200"));
    }

    #[tokio::test]
    async fn rolls_back_when_owner_is_missing() {
        let svc = fixture::service();
        let orphan = user::Id::new();
        let inv = fixture::investment(&svc, orphan, "1000", 40, 30).await;

        let err = svc.execute(MatureInvestments).await.unwrap_err();

        assert!(
            matches!(
                err.as_ref(),
                ExecutionError::UserNotExists(id) if *id == orphan,
            ),
            "unexpected error: {err}",
        );
        let inv = reload(&svc, &inv).await;
        assert_eq!(inv.status, investment::Status::Active);
        assert_eq!(inv.payout, None);
    }

    #[tokio::test]
    async fn times_out_on_stalled_database() {
        let mut config = fixture::config();
        config.mature_investments.timeout = Duration::from_millis(50);
        let svc = fixture::service_with(config);
        let user = fixture::user(&svc, Role::Customer).await;
        let inv = fixture::investment(&svc, user.id, "1000", 40, 30).await;

        svc.database().set_latency(Duration::from_millis(500));
        let err = svc.execute(MatureInvestments).await.unwrap_err();

        assert!(
            matches!(err.as_ref(), ExecutionError::Timeout(_)),
            "unexpected error: {err}",
        );

        svc.database().set_latency(Duration::ZERO);
        assert_eq!(reload(&svc, &inv).await.status, investment::Status::Active);
        assert_eq!(balance(&svc, user.id).await, Money::ZERO);
    }
}
