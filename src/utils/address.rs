//! Local address format checks for ledgers whose addresses describe themselves.

use alloy::primitives::Address;
use regex::Regex;
use sha2::{Digest, Sha256};
use std::str::FromStr;

fn checksum(payload: &[u8]) -> [u8; 4] {
	let digest = Sha256::digest(Sha256::digest(payload));
	[digest[0], digest[1], digest[2], digest[3]]
}

/// Classic XRP address: base58check, account id version byte 0
pub fn is_valid_xrp_address(value: &str) -> bool {
	if !value.starts_with('r') || !(25..=35).contains(&value.len()) {
		return false;
	}
	let decoded = bs58::decode(value)
		.with_alphabet(bs58::Alphabet::RIPPLE)
		.into_vec();
	match decoded {
		Ok(decoded) if decoded.len() == 25 && decoded[0] == 0 => {
			decoded[21..] == checksum(&decoded[..21])
		}
		_ => false,
	}
}

const TRON_ADDRESS_VERSION: u8 = 0x41;

/// TRC10 assets are named by a numeric id, TRC20 tokens by their contract address
pub fn is_trc10_asset_id(value: &str) -> bool {
	!value.is_empty() && value.chars().all(|c| c.is_ascii_digit())
}

/// Contract-level address behind a base58 TRON address
pub fn tron_address_to_evm(value: &str) -> Option<Address> {
	let decoded = bs58::decode(value).into_vec().ok()?;
	if decoded.len() != 25 || decoded[0] != TRON_ADDRESS_VERSION {
		return None;
	}
	if decoded[21..] != checksum(&decoded[..21]) {
		return None;
	}
	Some(Address::from_slice(&decoded[1..21]))
}

/// Base58 TRON address of a contract-level address
pub fn tron_address_from_evm(address: &Address) -> String {
	let mut payload = Vec::with_capacity(25);
	payload.push(TRON_ADDRESS_VERSION);
	payload.extend_from_slice(address.as_slice());
	let check = checksum(&payload);
	payload.extend_from_slice(&check);
	bs58::encode(payload).into_string()
}

/// Hex EVM address; mixed-case input must carry a valid EIP-55 checksum
pub fn is_valid_evm_address(value: &str) -> bool {
	let Some(hex_part) = value.strip_prefix("0x") else {
		return false;
	};
	if hex_part.len() != 40 {
		return false;
	}
	let mixed_case = hex_part.chars().any(|c| c.is_ascii_lowercase())
		&& hex_part.chars().any(|c| c.is_ascii_uppercase());
	if mixed_case {
		Address::parse_checksummed(value, None).is_ok()
	} else {
		Address::from_str(value).is_ok()
	}
}

/// EOSIO account name grammar
pub fn is_valid_eosio_name(value: &str) -> bool {
	Regex::new(r"^[a-z1-5.]{1,12}$")
		.map(|re| re.is_match(value))
		.unwrap_or(false)
}
