//! [`Database`] implementations.

use std::cmp::Reverse;

use common::operations::{By, Commit, Insert, Lock, Select, Transact, Update};
use tracerr::Traced;

use crate::{
    domain::{investment, user, Investment, User},
    infra::{database, Database},
};

use super::{Connection, Error, Memory, NonTx, Tx};

impl Database<Transact> for Memory<NonTx> {
    type Ok = Memory<Tx>;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        Tx::begin(&self.0)
            .await
            .map(Memory)
            .map_err(tracerr::wrap!())
    }
}

impl Database<Transact> for Memory<Tx> {
    type Ok = Self;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        Ok(self.clone())
    }
}

impl Database<Commit> for Memory<Tx> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Commit) -> Result<Self::Ok, Self::Err> {
        self.0.commit().await.map_err(tracerr::wrap!())
    }
}

impl<C: Connection> Database<Insert<User>> for Memory<C> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(user): Insert<User>,
    ) -> Result<Self::Ok, Self::Err> {
        self.0
            .with_state(|s| drop(s.users.insert(user.id, user)))
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<C: Connection> Database<Select<By<Option<User>, user::Id>>> for Memory<C> {
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        self.0
            .with_state(|s| s.users.get(&id).cloned())
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<C: Connection> Database<Update<user::Credit>> for Memory<C> {
    type Ok = bool;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(credit): Update<user::Credit>,
    ) -> Result<Self::Ok, Self::Err> {
        let user::Credit { user_id, amount } = credit;
        self.0
            .with_state(|s| -> Result<_, Error> {
                let Some(user) = s.users.get_mut(&user_id) else {
                    return Ok(false);
                };
                user.balance = user
                    .balance
                    .checked_add(amount)
                    .ok_or(Error::BalanceOverflow(user_id))?;
                Ok(true)
            })
            .await
            .map_err(tracerr::wrap!())?
            .map_err(tracerr::from_and_wrap!(=> database::Error))
    }
}

impl<C: Connection> Database<Insert<Investment>> for Memory<C> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(investment): Insert<Investment>,
    ) -> Result<Self::Ok, Self::Err> {
        self.0
            .with_state(|s| {
                drop(s.investments.insert(investment.id, investment));
            })
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<C: Connection> Database<Select<By<Vec<Investment>, investment::Status>>>
    for Memory<C>
{
    type Ok = Vec<Investment>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Investment>, investment::Status>>,
    ) -> Result<Self::Ok, Self::Err> {
        let status = by.into_inner();
        self.0
            .with_state(|s| {
                let mut found = s
                    .investments
                    .values()
                    .filter(|i| i.status == status)
                    .cloned()
                    .collect::<Vec<_>>();
                found.sort_by_key(|i| i.started_at);
                found
            })
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<C: Connection> Database<Select<By<Vec<Investment>, user::Id>>>
    for Memory<C>
{
    type Ok = Vec<Investment>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Investment>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let user_id = by.into_inner();
        self.0
            .with_state(|s| {
                let mut found = s
                    .investments
                    .values()
                    .filter(|i| i.user_id == user_id)
                    .cloned()
                    .collect::<Vec<_>>();
                found.sort_by_key(|i| Reverse(i.started_at));
                found
            })
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<C: Connection> Database<Lock<By<Investment, investment::Id>>>
    for Memory<C>
{
    type Ok = ();
    type Err = Traced<database::Error>;

    /// Every [`Tx`] already owns the whole state exclusively, so only the
    /// availability is checked here.
    async fn execute(
        &self,
        _: Lock<By<Investment, investment::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        self.0.with_state(|_| ()).await.map_err(tracerr::wrap!())
    }
}

impl<C: Connection> Database<Update<investment::Completion>> for Memory<C> {
    type Ok = bool;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(completion): Update<investment::Completion>,
    ) -> Result<Self::Ok, Self::Err> {
        let investment::Completion {
            investment_id,
            completed_at,
            payout,
        } = completion;
        self.0
            .with_state(|s| {
                let Some(investment) = s
                    .investments
                    .get_mut(&investment_id)
                    .filter(|i| i.is_active())
                else {
                    return false;
                };
                investment.status = investment::Status::Completed;
                investment.completed_at = Some(completed_at);
                investment.payout = Some(payout);
                true
            })
            .await
            .map_err(tracerr::wrap!())
    }
}
