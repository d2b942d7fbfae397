//! [`MatureInvestments`] [`Task`].

use std::{convert::Infallible, error::Error, time};

use common::operations::{By, Perform, Start};
use tokio::time::{interval, MissedTickBehavior};
use tracing as log;

#[cfg(doc)]
use crate::domain::Investment;
use crate::{command, Command, Service};

use super::Task;

/// Configuration for [`MatureInvestments`] [`Task`].
#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// Interval between [`Investment`]s maturity sweeps.
    pub interval: time::Duration,
}

/// [`Task`] periodically settling matured [`Investment`]s.
#[derive(Clone, Copy, Debug)]
pub struct MatureInvestments<S> {
    /// [`Config`] of this [`Task`].
    config: Config,

    /// [`Service`] instance.
    service: S,
}

impl<Db> Task<Start<By<MatureInvestments<Self>, Config>>> for Service<Db>
where
    MatureInvestments<Service<Db>>: Task<Perform<()>, Ok = usize, Err: Error>,
    Self: Clone,
{
    type Ok = ();
    type Err = Infallible;

    async fn execute(
        &self,
        Start(by): Start<By<MatureInvestments<Self>, Config>>,
    ) -> Result<Self::Ok, Self::Err> {
        let config = by.into_inner();
        let task = MatureInvestments {
            config,
            service: self.clone(),
        };

        let mut interval = interval(task.config.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            let _ = interval.tick().await;
            match task.execute(Perform(())).await {
                Ok(0) => log::debug!("`task::MatureInvestments`: nothing to do"),
                Ok(n) => log::info!(
                    "`task::MatureInvestments` settled {n} `Investment`(s)",
                ),
                Err(e) => log::error!("`task::MatureInvestments` failed: {e}"),
            }
        }
    }
}

impl<Db> Task<Perform<()>> for MatureInvestments<Service<Db>>
where
    Service<Db>: Command<command::MatureInvestments, Ok = usize>,
{
    type Ok = usize;
    type Err = <Service<Db> as Command<command::MatureInvestments>>::Err;

    async fn execute(&self, _: Perform<()>) -> Result<Self::Ok, Self::Err> {
        self.service.execute(command::MatureInvestments).await
    }
}

#[cfg(test)]
mod spec {
    use std::{future::IntoFuture as _, time::Duration};

    use common::Money;

    use crate::{
        domain::{investment, user::Role},
        fixture::{self, money},
        infra::Memory,
        query, Query as _, Service,
    };

    #[tokio::test(start_paused = true)]
    async fn keeps_sweeping_after_failure() {
        let mut config = fixture::config();
        config.tasks.mature_investments.interval = Duration::from_secs(60);
        let (svc, background) = Service::new(config, Memory::new());
        let user = fixture::user(&svc, Role::Customer).await;
        let inv = fixture::investment(&svc, user.id, "1000", 40, 30).await;

        // The first tick fires immediately and hits the unavailable store.
        svc.database().set_available(false);

        let check = async {
            tokio::time::sleep(Duration::from_secs(30)).await;
            svc.database().set_available(true);

            let stored = svc
                .execute(query::investments::ByUser::by(user.id))
                .await
                .unwrap();
            assert_eq!(stored[0].id, inv.id);
            assert_eq!(stored[0].status, investment::Status::Active);
            let owner = svc
                .execute(query::user::ById::by(user.id))
                .await
                .unwrap()
                .unwrap();
            assert_eq!(owner.balance, Money::ZERO);

            tokio::time::sleep(Duration::from_secs(60)).await;

            let stored = svc
                .execute(query::investments::ByUser::by(user.id))
                .await
                .unwrap();
            assert_eq!(stored[0].status, investment::Status::Completed);
            let owner = svc
                .execute(query::user::ById::by(user.id))
                .await
                .unwrap()
                .unwrap();
            assert_eq!(owner.balance, money("1200"));
        };

        tokio::select! {
            biased;

            res = background.into_future() => {
                panic!("background stopped unexpectedly: {res:?}");
            }
            () = check => {}
        }
    }
}
