//! Background [`Task`]s definitions.

pub mod background;
pub mod mature_investments;

pub use common::Handler as Task;

pub use self::{
    background::Background, mature_investments::MatureInvestments,
};

/// Configuration of all the [`Task`]s run by the [`Service`].
///
/// [`Service`]: crate::Service
#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// [`MatureInvestments`] configuration.
    pub mature_investments: mature_investments::Config,
}
