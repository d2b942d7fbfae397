//! [`Query`] definition.

pub mod investments;
pub mod user;

use common::operations::{By, Select};
use tracerr::Traced;

use crate::{
    infra::{database, Database},
    Service,
};

/// [`Query`] of the [`Service`].
pub use common::Handler as Query;

/// [`Query`] [`Select`]ing a `T`ype from a [`Database`].
#[derive(Clone, Copy, Debug)]
#[expect(clippy::module_name_repetitions, reason = "more readable")]
pub struct DatabaseQuery<T>(T);

impl<W, B> DatabaseQuery<By<W, B>> {
    /// Creates a new [`DatabaseQuery`] selecting a `W` by the provided `B`.
    #[must_use]
    pub fn by(by: B) -> Self {
        Self(By::new(by))
    }
}

impl<Db, W, B> Query<DatabaseQuery<By<W, B>>> for Service<Db>
where
    Db: Database<Select<By<W, B>>, Ok = W, Err = Traced<database::Error>>,
{
    type Ok = W;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        DatabaseQuery(by): DatabaseQuery<By<W, B>>,
    ) -> Result<Self::Ok, Self::Err> {
        self.database()
            .execute(Select(by))
            .await
            .map_err(tracerr::wrap!())
    }
}

#[cfg(test)]
mod spec {
    use crate::{
        domain::user::{self, Role},
        fixture, query, Query as _,
    };

    #[tokio::test]
    async fn lists_user_investments_newest_first() {
        let svc = fixture::service();
        let user = fixture::user(&svc, Role::Customer).await;
        let other = fixture::user(&svc, Role::Customer).await;
        let oldest = fixture::investment(&svc, user.id, "100", 30, 10).await;
        let newest = fixture::investment(&svc, user.id, "200", 1, 10).await;
        let middle = fixture::investment(&svc, user.id, "300", 10, 10).await;
        drop(fixture::investment(&svc, other.id, "400", 5, 10).await);

        let ids = svc
            .execute(query::investments::ByUser::by(user.id))
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.id)
            .collect::<Vec<_>>();

        assert_eq!(ids, [newest.id, middle.id, oldest.id]);
    }

    #[tokio::test]
    async fn finds_user_by_id() {
        let svc = fixture::service();
        let user = fixture::user(&svc, Role::Admin).await;

        let found = svc
            .execute(query::user::ById::by(user.id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, user.id);
        assert_eq!(found.role, Role::Admin);

        let missing = svc
            .execute(query::user::ById::by(user::Id::new()))
            .await
            .unwrap();
        assert!(missing.is_none());
    }
}
