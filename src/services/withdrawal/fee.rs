//! Fee rate lookup and absolute fee estimation.

use rust_decimal::Decimal;

use crate::{
	models::{Priority, UtxoSettings},
	services::ledger::UtxoClientTrait,
	utils::amount::round_to_precision,
};

/// Estimated virtual size of a P2PKH style transaction in bytes
pub fn estimate_vsize(inputs: usize, outputs: usize) -> u64 {
	10 + 148 * inputs as u64 + 34 * outputs as u64
}

/// Fee for `vsize` bytes at `rate` coin per kvB
pub fn absolute_fee(rate: Decimal, vsize: u64, precision: u32) -> Decimal {
	round_to_precision(rate * Decimal::from(vsize) / Decimal::from(1000u64), precision)
}

/// Fee rate per kvB for a priority
///
/// Falls back to the flat rate when smart fees are off, the node has no estimate or the
/// estimate call fails.
pub async fn fee_rate(
	client: &dyn UtxoClientTrait,
	settings: &UtxoSettings,
	priority: Priority,
) -> Decimal {
	if !settings.use_smart_fee {
		return settings.flat_fee_rate;
	}

	let target = settings.confirmation_targets.get(priority);
	match client.estimate_smart_fee(target).await {
		Ok(estimate) => match estimate.feerate {
			Some(rate) if rate > Decimal::ZERO => rate,
			_ => {
				log::debug!(
					"No fee estimate for target {} ({:?}), using flat rate",
					target,
					estimate.errors
				);
				settings.flat_fee_rate
			}
		},
		Err(e) => {
			log::warn!("Fee estimation failed, using flat rate: {}", e);
			settings.flat_fee_rate
		}
	}
}
