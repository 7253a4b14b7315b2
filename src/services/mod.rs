//! Core services of the wallet gateway.
//!
//! - `ledger`: adapters, node clients and transports
//! - `withdrawal`: UTXO withdrawal pipeline
//! - `observer`: scheduled change observation and the durable stores
//! - `callback`: deposit notifications

pub mod callback;
pub mod ledger;
pub mod observer;
pub mod withdrawal;
