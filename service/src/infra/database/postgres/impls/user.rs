//! [`User`]-related [`Database`] implementations.

use common::operations::{By, Select, Update};
use tracerr::Traced;

use crate::{
    domain::{user, User},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

impl<C> Database<Select<By<Option<User>, user::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: user::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id, balance, role, created_at \
            FROM users \
            WHERE id = $1::UUID";
        Ok(self
            .query_opt(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .map(|row| User {
                id: row.get("id"),
                balance: row.get("balance"),
                role: row.get("role"),
                created_at: row.get("created_at"),
            }))
    }
}

impl<C> Database<Update<user::Credit>> for Postgres<C>
where
    C: Connection,
{
    type Ok = bool;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(credit): Update<user::Credit>,
    ) -> Result<Self::Ok, Self::Err> {
        let user::Credit { user_id, amount } = credit;

        const SQL: &str = "\
            UPDATE users \
            SET balance = balance + $2::NUMERIC \
            WHERE id = $1::UUID";
        self.exec(SQL, &[&user_id, &amount])
            .await
            .map_err(tracerr::wrap!())
            .map(|updated| updated > 0)
    }
}
