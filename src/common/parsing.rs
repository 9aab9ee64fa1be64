// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use alloy::primitives::utils::{ParseUnits, format_units, parse_units};
use alloy::primitives::{Address, U256};
use std::str::FromStr;

pub fn strip_0x(s: &str) -> &str {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}

/// Parse a 20-byte hex address. Case (and therefore checksum) is ignored.
pub fn parse_address_hex(s: &str) -> Option<Address> {
    let body = strip_0x(s.trim());
    if body.len() != 40 || !body.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    Address::from_str(body).ok()
}

/// Parse a user-entered decimal amount into base units.
///
/// Rejects empty, negative, zero and malformed input as well as amounts with
/// more fractional digits than `decimals`.
pub fn parse_amount(raw: &str, decimals: u8) -> Result<U256, String> {
    let text = raw.trim();
    if text.is_empty() {
        return Err("amount is empty".into());
    }
    if text.starts_with('-') {
        return Err("amount must be positive".into());
    }
    if !text.chars().all(|c| c.is_ascii_digit() || c == '.') || text == "." {
        return Err(format!("`{text}` is not a decimal number"));
    }
    let value = match parse_units(text, decimals) {
        Ok(ParseUnits::U256(v)) => v,
        Ok(ParseUnits::I256(_)) => return Err("amount must be positive".into()),
        Err(e) => return Err(format!("`{text}` is not a valid amount: {e}")),
    };
    if value.is_zero() {
        return Err("amount must be greater than zero".into());
    }
    Ok(value)
}

/// Render base units with at most `precision` fractional digits (truncated).
pub fn format_amount(value: U256, decimals: u8, precision: usize) -> String {
    let full = format_units(value, decimals).unwrap_or_else(|_| value.to_string());
    match full.split_once('.') {
        Some((whole, frac)) => {
            let frac: String = frac.chars().take(precision).collect();
            if precision == 0 {
                whole.to_string()
            } else {
                format!("{whole}.{frac:0<precision$}")
            }
        }
        None if precision == 0 => full,
        None => format!("{full}.{}", "0".repeat(precision)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_parser_is_case_insensitive() {
        let lower = parse_address_hex("0xe0590015a873bf326bd645c3e1266d4db41c4e6b");
        let upper = parse_address_hex("0XE0590015A873BF326BD645C3E1266D4DB41C4E6B");
        assert!(lower.is_some());
        assert_eq!(lower, upper);
    }

    #[test]
    fn address_parser_rejects_wrong_length() {
        assert_eq!(parse_address_hex("0x1234"), None);
        assert_eq!(parse_address_hex("not-an-address"), None);
        assert_eq!(
            parse_address_hex("0xzz590015a873bf326bd645c3e1266d4db41c4e6b"),
            None
        );
    }

    #[test]
    fn amounts_parse_to_base_units() {
        assert_eq!(
            parse_amount("10", 18).unwrap(),
            U256::from(10u64) * U256::from(10u64).pow(U256::from(18u64))
        );
        assert_eq!(parse_amount(" 0.5 ", 6).unwrap(), U256::from(500_000u64));
    }

    #[test]
    fn amounts_reject_zero_negative_and_garbage() {
        assert!(parse_amount("0", 18).is_err());
        assert!(parse_amount("0.000", 18).is_err());
        assert!(parse_amount("-1", 18).is_err());
        assert!(parse_amount("1e5", 18).is_err());
        assert!(parse_amount("", 18).is_err());
        assert!(parse_amount("0.0000001", 6).is_err());
    }

    #[test]
    fn format_truncates_to_precision() {
        let v = parse_amount("1.23456789", 18).unwrap();
        assert_eq!(format_amount(v, 18, 6), "1.234567");
        assert_eq!(format_amount(U256::ZERO, 18, 2), "0.00");
        assert_eq!(format_amount(U256::from(5u64), 0, 2), "5.00");
    }
}
