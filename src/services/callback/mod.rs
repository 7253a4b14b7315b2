//! Callback dispatch for observed deposits.

mod dispatcher;
mod error;

pub use dispatcher::{CallbackDispatcher, CallbackDispatcherTrait};
pub use error::CallbackError;
