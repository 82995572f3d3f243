//! Input field parsing.
//!
//! Converts the fixed-width field selected by a data edit back into a
//! typed value, honoring the BLANK= interpretation, the DECIMAL= mode,
//! and the scale factor.

use super::EditModes;
use super::edit::IntBase;
use crate::iostat::IoError;
use crate::options::{BlankMode, DecimalMode};

fn conversion_error(field: &[u8]) -> IoError {
    IoError::Conversion(String::from_utf8_lossy(field).into_owned())
}

/// Strip or zero the blanks of a numeric field per BLANK=.
/// Leading blanks are always insignificant.
fn normalize_blanks(field: &[u8], mode: BlankMode) -> Vec<u8> {
    let body: &[u8] = {
        let start = field.iter().position(|b| *b != b' ').unwrap_or(field.len());
        &field[start..]
    };
    body.iter()
        .filter_map(|&b| match b {
            b' ' => match mode {
                BlankMode::Null => None,
                BlankMode::Zero => Some(b'0'),
            },
            _ => Some(b),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Integer fields
// ---------------------------------------------------------------------------

pub fn parse_integer(field: &[u8], base: IntBase, modes: &EditModes) -> Result<i64, IoError> {
    let body = normalize_blanks(field, modes.blank);
    if body.is_empty() {
        return Ok(0);
    }

    let (negative, digits) = match body[0] {
        b'-' if matches!(base, IntBase::Decimal) => (true, &body[1..]),
        b'+' if matches!(base, IntBase::Decimal) => (false, &body[1..]),
        _ => (false, &body[..]),
    };
    if digits.is_empty() {
        return Err(conversion_error(field));
    }

    let radix = base.radix();
    let mut value: u64 = 0;
    for &b in digits {
        let d = (b as char).to_digit(radix).ok_or_else(|| conversion_error(field))?;
        value = value
            .checked_mul(radix as u64)
            .and_then(|v| v.checked_add(d as u64))
            .ok_or_else(|| conversion_error(field))?;
    }

    if matches!(base, IntBase::Decimal) {
        if negative {
            if value > i64::MIN.unsigned_abs() {
                return Err(conversion_error(field));
            }
            Ok((value as i64).wrapping_neg())
        } else if value > i64::MAX as u64 {
            Err(conversion_error(field))
        } else {
            Ok(value as i64)
        }
    } else {
        // B/O/Z fields load the bit pattern.
        Ok(value as i64)
    }
}

// ---------------------------------------------------------------------------
// Real fields
// ---------------------------------------------------------------------------

/// Fw.d / Ew.d / Dw.d / Gw.d input.
///
/// A field without an explicit decimal point places the rightmost
/// `frac` digits after an implied point; the scale factor divides such
/// a value by 10^k unless the field carries its own exponent.
pub fn parse_real(field: &[u8], frac: u32, modes: &EditModes) -> Result<f64, IoError> {
    let mut body = normalize_blanks(field, modes.blank);
    if body.is_empty() {
        return Ok(0.0);
    }
    if modes.decimal == DecimalMode::Comma {
        for b in body.iter_mut() {
            if *b == b',' {
                *b = b'.';
            }
        }
    }

    let mut pos = 0;
    let negative = match body.first() {
        Some(b'-') => {
            pos += 1;
            true
        }
        Some(b'+') => {
            pos += 1;
            false
        }
        _ => false,
    };

    let digit_start = pos;
    let mut mantissa: f64 = 0.0;
    let mut seen_point = false;
    let mut frac_digits: i32 = 0;
    let mut any_digit = false;
    while pos < body.len() {
        match body[pos] {
            b'0'..=b'9' => {
                mantissa = mantissa * 10.0 + (body[pos] - b'0') as f64;
                if seen_point {
                    frac_digits += 1;
                }
                any_digit = true;
                pos += 1;
            }
            b'.' if !seen_point => {
                seen_point = true;
                pos += 1;
            }
            _ => break,
        }
    }
    if !any_digit && !(seen_point && pos > digit_start) {
        return Err(conversion_error(field));
    }

    // Exponent part: E/D letter with optional sign, or a bare signed
    // integer ("1.5+3" means 1.5e3).
    let mut exponent: i32 = 0;
    let mut has_exponent = false;
    if pos < body.len() {
        let mut epos = pos;
        if matches!(body[epos], b'E' | b'e' | b'D' | b'd') {
            epos += 1;
        } else if !matches!(body[epos], b'+' | b'-') {
            return Err(conversion_error(field));
        }
        let exp_negative = match body.get(epos) {
            Some(b'-') => {
                epos += 1;
                true
            }
            Some(b'+') => {
                epos += 1;
                false
            }
            _ => false,
        };
        let mut exp_value: i32 = 0;
        let mut exp_digits = 0;
        while epos < body.len() && body[epos].is_ascii_digit() {
            exp_value = exp_value.saturating_mul(10) + (body[epos] - b'0') as i32;
            epos += 1;
            exp_digits += 1;
        }
        if exp_digits == 0 || epos != body.len() {
            return Err(conversion_error(field));
        }
        exponent = if exp_negative { -exp_value } else { exp_value };
        has_exponent = true;
    }

    if !seen_point {
        // Implied decimal point: rightmost `frac` digits are fraction.
        frac_digits = frac as i32;
    }
    let mut value = mantissa * 10f64.powi(exponent - frac_digits);
    if !has_exponent {
        // kP divides exponent-free input by 10^k.
        value /= 10f64.powi(modes.scale);
    }
    Ok(if negative { -value } else { value })
}

// ---------------------------------------------------------------------------
// Logical and character fields
// ---------------------------------------------------------------------------

/// Lw input: optional '.', then T or F decides; the rest is ignored.
pub fn parse_logical(field: &[u8]) -> Result<bool, IoError> {
    let body = normalize_blanks(field, BlankMode::Null);
    let mut pos = 0;
    if body.first() == Some(&b'.') {
        pos = 1;
    }
    match body.get(pos).map(|b| b.to_ascii_uppercase()) {
        Some(b'T') => Ok(true),
        Some(b'F') => Ok(false),
        _ => Err(conversion_error(field)),
    }
}

/// A / Aw input into an item of `item_len` bytes.
///
/// A field wider than the item keeps its rightmost characters; a
/// narrower field is left-justified and blank padded.
pub fn parse_character(field: &[u8], item_len: usize) -> Vec<u8> {
    let mut out;
    if field.len() >= item_len {
        out = field[field.len() - item_len..].to_vec();
    } else {
        out = field.to_vec();
        out.resize(item_len, b' ');
    }
    out
}
