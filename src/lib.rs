//! Ledger-agnostic wallet gateway.
//!
//! Exposes one wallet contract (accounts, balances, history, withdrawals and address
//! validation) over several independent ledgers, and keeps a local view of each ledger
//! current through scheduled change observers that notify an external callback endpoint.
//!
//! # Layout
//! - `bootstrap`: startup wiring, adapter registry and shutdown handles
//! - `models`: configuration, normalized wallet types and native ledger payloads
//! - `repositories`: configuration-backed ledger repository
//! - `services`: ledger adapters, withdrawal pipeline, change observer and callbacks
//! - `utils`: logging, HTTP retry, amount and address helpers

pub mod bootstrap;
pub mod models;
pub mod repositories;
pub mod services;
pub mod utils;
