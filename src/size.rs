//! Byte size arguments: `4096`, `0x1000`, `64k`, `512M`, `2g`, ...

use crate::config::{GIB, KIB, MIB, PIB, TIB};

pub fn parse_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    let (digits, multiplier) = match s.char_indices().last() {
        Some((i, c)) if c.is_ascii_alphabetic() && !is_hex(s) => (&s[..i], suffix(c)?),
        _ => (s, 1),
    };

    let value = if let Some(hex) = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        u64::from_str_radix(hex, 16)
    } else {
        digits.parse::<u64>()
    }
    .map_err(|e| format!("invalid size '{s}': {e}"))?;

    value
        .checked_mul(multiplier)
        .ok_or_else(|| format!("size '{s}' is too large"))
}

/// A bare hex literal such as `0x1b` ends in a letter but has no suffix.
fn is_hex(s: &str) -> bool {
    (s.starts_with("0x") || s.starts_with("0X"))
        && s[2..].chars().all(|c| c.is_ascii_hexdigit())
}

fn suffix(c: char) -> Result<u64, String> {
    match c.to_ascii_lowercase() {
        'k' => Ok(KIB),
        'm' => Ok(MIB),
        'g' => Ok(GIB),
        't' => Ok(TIB),
        'p' => Ok(PIB),
        other => Err(format!("unknown size suffix '{other}'")),
    }
}
