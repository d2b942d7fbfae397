//! [`Handler`] abstraction.

use std::future::Future;

/// Asynchronous handler of `Args`.
///
/// Commands, queries, tasks and database operations are all expressed as
/// implementations of this trait, parametrized by the operation they handle.
pub trait Handler<Args = ()> {
    /// Type of a successful result.
    type Ok;

    /// Type of an error.
    type Err;

    /// Handles the provided `args`.
    fn execute(
        &self,
        args: Args,
    ) -> impl Future<Output = Result<Self::Ok, Self::Err>>;
}
