//! In-memory [`Database`] implementation.
//!
//! Keeps the whole state behind a single asynchronous mutex, so transactions
//! are fully serialized. Mostly useful for tests and local experiments.

mod impls;

use std::{
    collections::HashMap,
    fmt,
    future::Future,
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use derive_more::{Display, Error as StdError};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracerr::Traced;

use crate::{
    domain::{investment, user, Investment, User},
    infra::database,
};
#[cfg(doc)]
use crate::infra::Database;

/// In-memory [`Database`] client.
#[derive(Clone, Debug)]
pub struct Memory<T = NonTx>(T);

impl Memory {
    /// Creates a new empty [`Memory`] client.
    #[must_use]
    pub fn new() -> Self {
        Self(NonTx {
            state: Arc::new(Mutex::new(State::default())),
            health: Arc::new(Health {
                available: AtomicBool::new(true),
                latency_ms: AtomicU64::new(0),
            }),
        })
    }

    /// Makes this [`Memory`] client (and all its clones) fail every operation
    /// with an [`Error::Unavailable`], or brings it back.
    pub fn set_available(&self, available: bool) {
        self.0.health.available.store(available, Ordering::SeqCst);
    }

    /// Delays every subsequent operation by the provided `latency`.
    pub fn set_latency(&self, latency: Duration) {
        self.0.health.latency_ms.store(
            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
            Ordering::SeqCst,
        );
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

/// Stored data.
#[derive(Clone, Debug, Default)]
pub struct State {
    /// Stored [`User`]s.
    users: HashMap<user::Id, User>,

    /// Stored [`Investment`]s.
    investments: HashMap<investment::Id, Investment>,
}

/// Simulated health of a [`Memory`] client.
#[derive(Debug)]
struct Health {
    /// Indicator whether operations are allowed to succeed.
    available: AtomicBool,

    /// Artificial delay of every operation, in milliseconds.
    latency_ms: AtomicU64,
}

impl Health {
    /// Simulates the round trip of a single operation.
    async fn round_trip(&self) -> Result<(), Traced<database::Error>> {
        let latency = self.latency_ms.load(Ordering::SeqCst);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(tracerr::new!(Error::Unavailable)).map_err(tracerr::map_from)
        }
    }
}

/// Non-transactional [`Memory`] client.
#[derive(Clone, Debug)]
pub struct NonTx {
    /// Shared [`State`].
    state: Arc<Mutex<State>>,

    /// Shared [`Health`].
    health: Arc<Health>,
}

/// Transactional [`Memory`] client.
///
/// Holds the [`State`] lock for its whole lifetime. Changes are staged on a
/// copy and written back on commit only, so dropping an uncommitted [`Tx`]
/// rolls it back.
#[derive(Clone)]
pub struct Tx {
    /// Shared [`Health`].
    health: Arc<Health>,

    /// Open transaction, if not committed yet.
    inner: Arc<Mutex<Option<Staged>>>,
}

impl fmt::Debug for Tx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tx")
            .field("health", &self.health)
            .finish_non_exhaustive()
    }
}

/// [`State`] changes staged by an open [`Tx`].
struct Staged {
    /// Exclusive access to the committed [`State`].
    guard: OwnedMutexGuard<State>,

    /// Working copy of the [`State`].
    state: State,
}

impl Tx {
    /// Opens a new [`Tx`] over the provided [`NonTx`] client, waiting for
    /// other transactions to finish.
    async fn begin(client: &NonTx) -> Result<Self, Traced<database::Error>> {
        client.health.round_trip().await.map_err(tracerr::wrap!())?;

        let guard = Arc::clone(&client.state).lock_owned().await;
        let state = guard.clone();
        Ok(Self {
            health: Arc::clone(&client.health),
            inner: Arc::new(Mutex::new(Some(Staged { guard, state }))),
        })
    }

    /// Commits this [`Tx`].
    ///
    /// # Errors
    ///
    /// If this [`Tx`] was committed already or the client is unavailable.
    async fn commit(&self) -> Result<(), Traced<database::Error>> {
        self.health.round_trip().await.map_err(tracerr::wrap!())?;

        let Staged { mut guard, state } =
            self.inner.lock().await.take().ok_or_else(|| {
                tracerr::new!(database::Error::from(Error::TxClosed))
            })?;
        *guard = state;
        Ok(())
    }
}

/// Generic [`Memory`] connection.
pub trait Connection {
    /// Applies the provided function to the [`State`] visible through this
    /// [`Connection`].
    ///
    /// # Errors
    ///
    /// If the client is unavailable or the transaction is closed.
    fn with_state<F, R>(
        &self,
        f: F,
    ) -> impl Future<Output = Result<R, Traced<database::Error>>>
    where
        F: FnOnce(&mut State) -> R;
}

impl Connection for NonTx {
    async fn with_state<F, R>(&self, f: F) -> Result<R, Traced<database::Error>>
    where
        F: FnOnce(&mut State) -> R,
    {
        self.health.round_trip().await.map_err(tracerr::wrap!())?;

        Ok(f(&mut *self.state.lock().await))
    }
}

impl Connection for Tx {
    async fn with_state<F, R>(&self, f: F) -> Result<R, Traced<database::Error>>
    where
        F: FnOnce(&mut State) -> R,
    {
        self.health.round_trip().await.map_err(tracerr::wrap!())?;

        let mut inner = self.inner.lock().await;
        let staged = inner.as_mut().ok_or_else(|| {
            tracerr::new!(database::Error::from(Error::TxClosed))
        })?;
        Ok(f(&mut staged.state))
    }
}

/// [`Memory`] database [`Error`].
#[derive(Clone, Copy, Debug, Display, StdError)]
pub enum Error {
    /// Client is switched to the unavailable mode.
    #[display("`Memory` database is unavailable")]
    Unavailable,

    /// Operation was issued on an already committed transaction.
    #[display("`Memory` transaction is already closed")]
    TxClosed,

    /// Balance of a [`User`] cannot hold the credited amount.
    #[display("`User(id: {_0})` balance overflow")]
    BalanceOverflow(#[error(not(source))] user::Id),
}
