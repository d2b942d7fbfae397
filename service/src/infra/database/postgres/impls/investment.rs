//! [`Investment`]-related [`Database`] implementations.

use common::operations::{By, Lock, Select, Update};
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{investment, user, Investment},
    infra::{
        database::{
            self,
            postgres::{self, Connection},
            Postgres,
        },
        Database,
    },
};

/// Columns of the `investments` table, in the order [`from_row()`] expects.
const COLUMNS: &str = "\
    id, user_id, amount, started_at, duration, \
    status, completed_at, payout";

/// Reads an [`Investment`] from the provided [`Row`].
///
/// # Errors
///
/// If the stored `duration` doesn't fit into [`investment::Days`].
fn from_row(row: &Row) -> Result<Investment, Traced<database::Error>> {
    let duration = investment::Days::try_from(row.get::<_, i32>("duration"))
        .map_err(|_| {
            tracerr::new!(database::Error::from(postgres::Error::OutOfRange(
                "investments.duration",
            )))
        })?;
    Ok(Investment {
        id: row.get("id"),
        user_id: row.get("user_id"),
        amount: row.get("amount"),
        started_at: row.get("started_at"),
        duration,
        status: row.get("status"),
        completed_at: row.get("completed_at"),
        payout: row.get("payout"),
    })
}

impl<C> Database<Select<By<Vec<Investment>, investment::Status>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Investment>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Investment>, investment::Status>>,
    ) -> Result<Self::Ok, Self::Err> {
        let status = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM investments \
             WHERE status = $1::INT2 \
             ORDER BY started_at ASC",
        );
        self.query(sql.as_str(), &[&status])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(from_row)
            .collect()
    }
}

impl<C> Database<Select<By<Vec<Investment>, user::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Investment>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Investment>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let user_id = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM investments \
             WHERE user_id = $1::UUID \
             ORDER BY started_at DESC",
        );
        self.query(sql.as_str(), &[&user_id])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(from_row)
            .collect()
    }
}

impl<C> Database<Lock<By<Investment, investment::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Investment, investment::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        const SQL: &str = "\
            SELECT id \
            FROM investments \
            WHERE id = $1::UUID \
            FOR UPDATE";
        self.query_opt(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Update<investment::Completion>> for Postgres<C>
where
    C: Connection,
{
    type Ok = bool;
    type Err = Traced<database::Error>;

    /// Completes the [`Investment`] only if it's still active, returning
    /// whether it was.
    async fn execute(
        &self,
        Update(completion): Update<investment::Completion>,
    ) -> Result<Self::Ok, Self::Err> {
        let investment::Completion {
            investment_id,
            completed_at,
            payout,
        } = completion;

        const SQL: &str = "\
            UPDATE investments \
            SET status = $2::INT2, \
                completed_at = $3::TIMESTAMPTZ, \
                payout = $4::NUMERIC \
            WHERE id = $1::UUID \
              AND status = $5::INT2";
        self.exec(
            SQL,
            &[
                &investment_id,
                &investment::Status::Completed,
                &completed_at,
                &payout,
                &investment::Status::Active,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(|updated| updated > 0)
    }
}
