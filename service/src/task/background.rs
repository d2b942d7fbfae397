//! Background environment for running [`Task`]s.

use std::{
    error::Error,
    future::{Future, IntoFuture},
};

use derive_more::{Display, Error as StdError};
use futures::{
    future::{self, LocalBoxFuture},
    FutureExt as _, TryFutureExt as _,
};
use tokio::task;

#[cfg(doc)]
use crate::Task;

/// Type-erased error of a [`Task`].
type BoxedError = Box<dyn Error + 'static>;

/// Background environment for running [`Task`]s.
///
/// Nothing is run until this [`Background`] is awaited.
#[derive(Debug, Default)]
pub struct Background {
    /// Local set of [`Task`]s.
    set: task::LocalSet,

    /// Handles of the spawned [`Task`]s, along with their names.
    handles: Vec<(&'static str, task::JoinHandle<Result<(), BoxedError>>)>,
}

impl Background {
    /// Spawns a new named [`Task`] inside this [`Background`] environment.
    pub fn spawn<F, E>(&mut self, name: &'static str, future: F)
    where
        F: Future<Output = Result<(), E>> + 'static,
        E: Error + 'static,
    {
        let handle = self
            .set
            .spawn_local(future.map_err(|e| BoxedError::from(Box::new(e))));
        self.handles.push((name, handle));
    }
}

impl IntoFuture for Background {
    type Output = Result<(), Failure>;
    type IntoFuture = LocalBoxFuture<'static, Self::Output>;

    fn into_future(self) -> Self::IntoFuture {
        let Self { set, handles } = self;
        let tasks = handles.into_iter().map(|(name, handle)| {
            handle
                .map(move |res| match res {
                    Ok(Ok(())) => Ok(()),
                    Ok(Err(cause)) => Err(Failure { task: name, cause }),
                    Err(e) => Err(Failure {
                        task: name,
                        cause: BoxedError::from(Box::new(e)),
                    }),
                })
                .boxed_local()
        });
        future::try_join_all(
            [set.map(Ok).boxed_local()].into_iter().chain(tasks),
        )
        .map_ok(drop)
        .boxed_local()
    }
}

/// Failure of a [`Task`] running in a [`Background`] environment.
#[derive(Debug, Display, StdError)]
#[display("`{task}` task failed: {cause}")]
pub struct Failure {
    /// Name of the failed [`Task`].
    #[error(not(source))]
    pub task: &'static str,

    /// Error the [`Task`] failed with.
    #[error(not(source))]
    pub cause: BoxedError,
}

#[cfg(test)]
mod spec {
    use std::{future::IntoFuture as _, io};

    use super::Background;

    #[tokio::test]
    async fn completes_when_all_tasks_complete() {
        let mut bg = Background::default();
        bg.spawn("first", async { Ok::<_, io::Error>(()) });
        bg.spawn("second", async { Ok::<_, io::Error>(()) });

        assert!(bg.into_future().await.is_ok());
    }

    #[tokio::test]
    async fn reports_failed_task_by_name() {
        let mut bg = Background::default();
        bg.spawn("healthy", async { Ok::<_, io::Error>(()) });
        bg.spawn("broken", async { Err(io::Error::other("boom")) });

        let failure = bg.into_future().await.unwrap_err();

        assert_eq!(failure.task, "broken");
        assert_eq!(failure.to_string(), "`broken` task failed: boom");
    }
}
