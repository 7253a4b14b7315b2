use proptest::{prelude::*, test_runner::Config};
use rust_decimal::Decimal;
use wallet_gateway::{
	services::withdrawal::{absolute_fee, estimate_vsize},
	utils::amount::{from_base_units, round_to_precision, to_base_units},
};

proptest! {
	#![proptest_config(Config {
		failure_persistence: None,
		..Config::default()
	})]

	#[test]
	fn test_base_units_survive_display_conversion(units in any::<u64>(), decimals in 0u32..=18) {
		let display = from_base_units(units, decimals).unwrap();
		prop_assert_eq!(to_base_units(display, decimals).unwrap(), units as u128);
	}

	#[test]
	fn test_dust_below_precision_is_dropped(units in 0u64..1_000_000_000, dust in 1i64..10) {
		let amount = Decimal::new(units as i64, 6) + Decimal::new(dust, 7);
		prop_assert_eq!(to_base_units(amount, 6).unwrap(), units as u128);
	}

	#[test]
	fn test_rounding_is_idempotent(mantissa in any::<i64>(), scale in 0u32..=16, precision in 0u32..=10) {
		let once = round_to_precision(Decimal::new(mantissa, scale), precision);
		prop_assert!(once.scale() <= scale);
		prop_assert_eq!(round_to_precision(once, precision), once);
	}

	#[test]
	fn test_fee_grows_with_inputs(inputs in 1usize..50, outputs in 1usize..4, rate_sats in 1i64..100_000) {
		let rate = Decimal::new(rate_sats, 8);
		let smaller = absolute_fee(rate, estimate_vsize(inputs, outputs), 8);
		let larger = absolute_fee(rate, estimate_vsize(inputs + 1, outputs), 8);
		prop_assert!(smaller >= Decimal::ZERO);
		prop_assert!(larger >= smaller);
	}
}
