//! Amount helpers.
//!
//! Every ledger amount travels as a `Decimal` in display units. Conversion to integer
//! base units (satoshi, wei, drops, sun) happens only at the RPC boundary.

use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

/// Rounds to the given number of decimal places, half away from zero
pub fn round_to_precision(amount: Decimal, precision: u32) -> Decimal {
	amount.round_dp_with_strategy(precision, RoundingStrategy::MidpointAwayFromZero)
}

/// Converts a display amount into integer base units, dropping sub-unit dust
pub fn to_base_units(amount: Decimal, decimals: u32) -> Result<u128, String> {
	if amount.is_sign_negative() {
		return Err(format!("Negative amount: {}", amount));
	}
	let mut scaled = amount.round_dp_with_strategy(decimals, RoundingStrategy::ToZero);
	scaled.rescale(decimals);
	if scaled.scale() != decimals {
		return Err(format!(
			"Amount {} cannot be represented with {} decimals",
			amount, decimals
		));
	}
	u128::try_from(scaled.mantissa()).map_err(|e| e.to_string())
}

/// Converts integer base units (any decimal string) into a display amount
pub fn from_base_units(value: impl ToString, decimals: u32) -> Result<Decimal, String> {
	let digits = value.to_string();
	let mut amount = Decimal::from_str(&digits).map_err(|e| format!("{}: {}", digits, e))?;
	amount.set_scale(decimals).map_err(|e| e.to_string())?;
	Ok(amount.normalize())
}
