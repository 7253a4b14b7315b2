//! UTXO withdrawal orchestration.
//!
//! Account-based ledgers withdraw with a single signed transfer inside their adapter and
//! never come through here.

mod fee;
mod pipeline;
mod selection;

pub use fee::{absolute_fee, estimate_vsize, fee_rate};
pub use pipeline::{UtxoWithdrawal, WithdrawalStage, DEFAULT_LABEL_ALIAS};
pub use selection::{candidates, select_inputs, Selection, SenderFilter};
