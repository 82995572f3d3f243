//! Output field editing.
//!
//! Renders one typed value into the fixed-width field its data edit
//! describes. A value that cannot be represented in the field width
//! fills the field with asterisks; width 0 (I0, G0) means "minimal
//! width". All rendering is bounded by the field width plus a small
//! constant.

use super::EditModes;
use super::edit::{IntBase, RealForm};
use crate::options::{DecimalMode, RoundMode};

/// Asterisk fill for a value that does not fit its field.
fn stars(width: u32) -> Vec<u8> {
    vec![b'*'; width as usize]
}

/// Right-justify `body` in `width` columns, or star-fill on overflow.
/// Width 0 returns the body unchanged.
fn fit(body: Vec<u8>, width: u32) -> Vec<u8> {
    if width == 0 {
        return body;
    }
    let w = width as usize;
    if body.len() > w {
        return stars(width);
    }
    let mut out = vec![b' '; w - body.len()];
    out.extend_from_slice(&body);
    out
}

fn sign_prefix(negative: bool, modes: &EditModes) -> &'static [u8] {
    if negative {
        b"-"
    } else if modes.sign.emit_plus() {
        b"+"
    } else {
        b""
    }
}

fn apply_decimal_mode(body: &mut [u8], modes: &EditModes) {
    if modes.decimal == DecimalMode::Comma {
        for b in body.iter_mut() {
            if *b == b'.' {
                *b = b',';
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Integer editing (Iw[.m], Bw, Ow, Zw)
// ---------------------------------------------------------------------------

/// Render digits of `value` in `radix` into the tail of `buf`,
/// returning the digit count. Non-decimal radixes edit the two's
/// complement bit pattern.
fn render_digits(value: u64, radix: u64, buf: &mut [u8; 64]) -> usize {
    if value == 0 {
        buf[63] = b'0';
        return 1;
    }
    let mut v = value;
    let mut pos = 64;
    while v > 0 && pos > 0 {
        pos -= 1;
        let digit = (v % radix) as u8;
        buf[pos] = if digit < 10 {
            b'0' + digit
        } else {
            b'A' + (digit - 10)
        };
        v /= radix;
    }
    64 - pos
}

pub fn edit_integer(
    value: i64,
    width: u32,
    min_digits: u32,
    base: IntBase,
    modes: &EditModes,
) -> Vec<u8> {
    let decimal = matches!(base, IntBase::Decimal);
    let magnitude = if decimal {
        value.unsigned_abs()
    } else {
        value as u64
    };

    let mut digits = [0u8; 64];
    let count = render_digits(magnitude, base.radix() as u64, &mut digits);
    let digit_slice = &digits[64 - count..];

    let mut body = Vec::with_capacity(count + 2);
    if decimal {
        body.extend_from_slice(sign_prefix(value < 0, modes));
    }
    // Iw.m zero-fill floor; m = 0 with value 0 still prints one '0'.
    for _ in count..(min_digits as usize) {
        body.push(b'0');
    }
    body.extend_from_slice(digit_slice);
    fit(body, width)
}

// ---------------------------------------------------------------------------
// Real editing (Fw.d, Ew.d[Ee], Dw.d, Gw.d, ENw.d, ESw.d)
// ---------------------------------------------------------------------------

/// Decimal rounding honoring the ROUND= mode. `format!` rounds to
/// nearest; the directed modes pre-shift through floor/ceil/trunc.
fn round_decimal(value: f64, frac: u32, mode: RoundMode) -> f64 {
    let factor = 10f64.powi(frac as i32);
    let shifted = value * factor;
    if !shifted.is_finite() {
        return value;
    }
    let rounded = match mode {
        RoundMode::Up => shifted.ceil(),
        RoundMode::Down => shifted.floor(),
        RoundMode::Zero => shifted.trunc(),
        RoundMode::Nearest | RoundMode::Compatible | RoundMode::ProcessorDefined => {
            shifted.round()
        }
    };
    rounded / factor
}

fn nonfinite_body(value: f64) -> Option<Vec<u8>> {
    if value.is_nan() {
        return Some(b"NaN".to_vec());
    }
    if value.is_infinite() {
        return Some(if value > 0.0 {
            b"Inf".to_vec()
        } else {
            b"-Inf".to_vec()
        });
    }
    None
}

/// Fixed-point body: [sign]digits.digits with `frac` fraction digits.
fn f_body(value: f64, frac: u32, modes: &EditModes) -> Vec<u8> {
    // kP multiplies an F-edited value by 10^k on output.
    let scaled = value * 10f64.powi(modes.scale);
    let rounded = round_decimal(scaled.abs(), frac, modes.round);
    let mut body = sign_prefix(value.is_sign_negative(), modes).to_vec();
    body.extend_from_slice(format!("{:.*}", frac as usize, rounded).as_bytes());
    body
}

/// Split Rust's `{:e}` rendering into (mantissa digits, exponent).
/// The mantissa digits come back without a decimal point; the implied
/// point sits after the first digit.
fn decompose(value: f64, sig_digits: u32) -> (Vec<u8>, i32) {
    let prec = sig_digits.saturating_sub(1) as usize;
    let text = format!("{:.*e}", prec, value);
    let (mantissa, exp) = text.split_once('e').expect("exponential form");
    let digits: Vec<u8> = mantissa
        .bytes()
        .filter(|b| b.is_ascii_digit())
        .collect();
    (digits, exp.parse::<i32>().expect("exponent digits") + 1)
}

/// Exponent field: letter, sign, digits. When the exponent needs more
/// digits than the field allows and no Ee was given, the letter is
/// dropped; if it still does not fit the caller star-fills.
fn exponent_field(exp: i32, letter: u8, explicit: Option<u32>) -> Option<Vec<u8>> {
    let digits = exp.unsigned_abs().to_string();
    let want = explicit.unwrap_or(2) as usize;
    if digits.len() > want {
        if explicit.is_some() {
            return None;
        }
        if digits.len() > 3 {
            return None;
        }
        // Letterless three-digit exponent.
        let mut out = Vec::new();
        out.push(if exp < 0 { b'-' } else { b'+' });
        out.extend_from_slice(digits.as_bytes());
        return Some(out);
    }
    let mut out = vec![letter];
    out.push(if exp < 0 { b'-' } else { b'+' });
    for _ in digits.len()..want {
        out.push(b'0');
    }
    out.extend_from_slice(digits.as_bytes());
    Some(out)
}

/// E/D editing: 0.ddd mantissa convention, shifted by the scale factor.
fn e_body(value: f64, frac: u32, exponent: Option<u32>, letter: u8, modes: &EditModes) -> Option<Vec<u8>> {
    let mut body = sign_prefix(value.is_sign_negative(), modes).to_vec();
    if value == 0.0 {
        body.push(b'0');
        body.push(b'.');
        body.extend(std::iter::repeat_n(b'0', frac as usize));
        body.extend_from_slice(&exponent_field(0, letter, exponent)?);
        return Some(body);
    }

    let k = modes.scale;
    // kP moves k digits across the point: -d < k <= 0 keeps 0.00ddd,
    // 0 < k < d+2 puts k digits before the point.
    let sig = if k <= 0 {
        frac.saturating_add_signed(k)
    } else {
        frac + 1
    };
    if sig == 0 {
        return None;
    }
    let (digits, exp10) = decompose(value.abs(), sig);
    let exp = exp10 - k;

    if k <= 0 {
        body.push(b'0');
        body.push(b'.');
        body.extend(std::iter::repeat_n(b'0', (-k) as usize));
        body.extend_from_slice(&digits);
    } else {
        let int_digits = (k as usize).min(digits.len());
        body.extend_from_slice(&digits[..int_digits]);
        body.push(b'.');
        body.extend_from_slice(&digits[int_digits..]);
    }
    body.extend_from_slice(&exponent_field(exp, letter, exponent)?);
    Some(body)
}

/// ES editing: one significant digit before the point.
fn es_body(value: f64, frac: u32, exponent: Option<u32>, modes: &EditModes) -> Option<Vec<u8>> {
    let mut body = sign_prefix(value.is_sign_negative(), modes).to_vec();
    let (digits, exp10) = if value == 0.0 {
        (vec![b'0'; frac as usize + 1], 1)
    } else {
        decompose(value.abs(), frac + 1)
    };
    body.push(digits[0]);
    body.push(b'.');
    body.extend_from_slice(&digits[1..]);
    body.extend_from_slice(&exponent_field(exp10 - 1, b'E', exponent)?);
    Some(body)
}

/// Digits before the point that bring the exponent to a multiple of 3.
fn engineering_split(exp10: i32) -> usize {
    (exp10 - (exp10 - 1).div_euclid(3) * 3) as usize // 1..=3
}

/// EN editing: exponent a multiple of three, 1-3 digits before the point.
fn en_body(value: f64, frac: u32, exponent: Option<u32>, modes: &EditModes) -> Option<Vec<u8>> {
    let mut body = sign_prefix(value.is_sign_negative(), modes).to_vec();
    if value == 0.0 {
        body.extend_from_slice(b"0.");
        body.extend(std::iter::repeat_n(b'0', frac as usize));
        body.extend_from_slice(&exponent_field(0, b'E', exponent)?);
        return Some(body);
    }
    let mag = value.abs();
    let (_, mut exp10) = decompose(mag, frac + 3);
    let mut before = engineering_split(exp10);
    let (mut digits, exp10r) = decompose(mag, frac + before as u32);
    if exp10r != exp10 {
        // Rounding bumped the magnitude to the next power of ten.
        exp10 = exp10r;
        before = engineering_split(exp10);
        digits = decompose(mag, frac + before as u32).0;
    } else {
        exp10 = exp10r;
    }
    body.extend_from_slice(&digits[..before]);
    body.push(b'.');
    body.extend_from_slice(&digits[before..]);
    body.extend_from_slice(&exponent_field(exp10 - before as i32, b'E', exponent)?);
    Some(body)
}

/// G editing: F-like within range with trailing blanks, E-like outside.
fn g_body(value: f64, width: u32, frac: u32, exponent: Option<u32>, modes: &EditModes) -> Vec<u8> {
    if width == 0 {
        // G0: minimal-width, processor-chosen form.
        let mut body = sign_prefix(value.is_sign_negative(), modes).to_vec();
        body.extend_from_slice(format!("{}", value.abs()).as_bytes());
        apply_decimal_mode(&mut body, modes);
        return body;
    }
    let pad = exponent.map(|e| e as usize + 2).unwrap_or(4);
    let mag = value.abs();
    let in_range = value == 0.0 || (0.1 <= mag && mag < 10f64.powi(frac as i32));
    if in_range {
        let exp10 = if value == 0.0 {
            1
        } else {
            decompose(mag, frac).1
        };
        let dec = (frac as i32 - exp10).max(0) as u32;
        let no_scale = EditModes { scale: 0, ..*modes };
        let mut body = f_body(value, dec, &no_scale);
        body.extend(std::iter::repeat_n(b' ', pad));
        apply_decimal_mode(&mut body, modes);
        fit(body, width)
    } else {
        edit_real(value, width, frac, exponent, RealForm::E, modes)
    }
}

pub fn edit_real(
    value: f64,
    width: u32,
    frac: u32,
    exponent: Option<u32>,
    form: RealForm,
    modes: &EditModes,
) -> Vec<u8> {
    if let Some(body) = nonfinite_body(value) {
        return fit(body, width);
    }
    if matches!(form, RealForm::G) {
        return g_body(value, width, frac, exponent, modes);
    }
    let body = match form {
        RealForm::F => Some(f_body(value, frac, modes)),
        RealForm::E => e_body(value, frac, exponent, b'E', modes),
        RealForm::D => e_body(value, frac, exponent, b'D', modes),
        RealForm::Es => es_body(value, frac, exponent, modes),
        RealForm::En => en_body(value, frac, exponent, modes),
        RealForm::G => unreachable!(),
    };
    match body {
        Some(mut body) => {
            apply_decimal_mode(&mut body, modes);
            fit(body, width)
        }
        None => stars(width),
    }
}

// ---------------------------------------------------------------------------
// Logical and character editing
// ---------------------------------------------------------------------------

pub fn edit_logical(value: bool, width: u32) -> Vec<u8> {
    fit(vec![if value { b'T' } else { b'F' }], width.max(1))
}

/// A / Aw editing: right-justified when the field is wider than the
/// item, leftmost characters when narrower.
pub fn edit_character(value: &[u8], width: Option<u32>) -> Vec<u8> {
    match width {
        None => value.to_vec(),
        Some(w) => {
            let w = w as usize;
            if value.len() >= w {
                value[..w].to_vec()
            } else {
                let mut out = vec![b' '; w - value.len()];
                out.extend_from_slice(value);
                out
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::SignMode;

    fn modes() -> EditModes {
        EditModes::default()
    }

    #[test]
    fn test_integer_right_justified() {
        assert_eq!(edit_integer(42, 5, 0, IntBase::Decimal, &modes()), b"   42");
    }

    #[test]
    fn test_integer_negative() {
        assert_eq!(edit_integer(-7, 4, 0, IntBase::Decimal, &modes()), b"  -7");
    }

    #[test]
    fn test_integer_overflow_stars() {
        assert_eq!(edit_integer(123456, 3, 0, IntBase::Decimal, &modes()), b"***");
    }

    #[test]
    fn test_integer_min_digits() {
        assert_eq!(edit_integer(5, 6, 3, IntBase::Decimal, &modes()), b"   005");
    }

    #[test]
    fn test_integer_zero_width_is_minimal() {
        assert_eq!(edit_integer(-30, 0, 0, IntBase::Decimal, &modes()), b"-30");
    }

    #[test]
    fn test_integer_sign_plus_mode() {
        let m = EditModes {
            sign: SignMode::Plus,
            ..modes()
        };
        assert_eq!(edit_integer(9, 4, 0, IntBase::Decimal, &m), b"  +9");
    }

    #[test]
    fn test_hex_octal_binary_use_bit_pattern() {
        assert_eq!(edit_integer(255, 4, 0, IntBase::Hex, &modes()), b"  FF");
        assert_eq!(edit_integer(8, 4, 0, IntBase::Octal, &modes()), b"  10");
        assert_eq!(edit_integer(5, 5, 0, IntBase::Binary, &modes()), b"  101");
        // Negative values edit the two's complement representation.
        assert_eq!(
            edit_integer(-1, 16, 0, IntBase::Hex, &modes()),
            b"FFFFFFFFFFFFFFFF"
        );
    }

    #[test]
    fn test_f_editing() {
        assert_eq!(edit_real(3.14159, 8, 2, None, RealForm::F, &modes()), b"    3.14");
        assert_eq!(edit_real(-0.5, 6, 1, None, RealForm::F, &modes()), b"  -0.5");
    }

    #[test]
    fn test_f_overflow_stars() {
        assert_eq!(edit_real(12345.0, 4, 2, None, RealForm::F, &modes()), b"****");
    }

    #[test]
    fn test_f_scale_factor() {
        let m = EditModes { scale: 2, ..modes() };
        // 2P multiplies by 100 on output.
        assert_eq!(edit_real(0.125, 8, 1, None, RealForm::F, &m), b"    12.5");
    }

    #[test]
    fn test_f_round_modes() {
        let up = EditModes {
            round: crate::options::RoundMode::Up,
            ..modes()
        };
        let down = EditModes {
            round: crate::options::RoundMode::Down,
            ..modes()
        };
        assert_eq!(edit_real(1.21, 6, 1, None, RealForm::F, &up), b"   1.3");
        assert_eq!(edit_real(1.29, 6, 1, None, RealForm::F, &down), b"   1.2");
    }

    #[test]
    fn test_e_editing() {
        assert_eq!(
            edit_real(31.4, 12, 4, None, RealForm::E, &modes()),
            b"  0.3140E+02"
        );
    }

    #[test]
    fn test_e_editing_negative_exponent() {
        assert_eq!(
            edit_real(0.00123, 12, 3, None, RealForm::E, &modes()),
            b"   0.123E-02"
        );
    }

    #[test]
    fn test_d_editing_uses_d_letter() {
        assert_eq!(
            edit_real(31.4, 12, 4, None, RealForm::D, &modes()),
            b"  0.3140D+02"
        );
    }

    #[test]
    fn test_e_explicit_exponent_width() {
        assert_eq!(
            edit_real(31.4, 13, 4, Some(3), RealForm::E, &modes()),
            b" 0.3140E+002"
        );
    }

    #[test]
    fn test_es_editing() {
        assert_eq!(
            edit_real(31.4, 11, 3, None, RealForm::Es, &modes()),
            b"  3.140E+01"
        );
    }

    #[test]
    fn test_en_editing_multiple_of_three() {
        assert_eq!(
            edit_real(31400.0, 12, 3, None, RealForm::En, &modes()),
            b"  31.400E+03"
        );
    }

    #[test]
    fn test_g_in_range_is_f_like() {
        let out = edit_real(3.5, 12, 4, None, RealForm::G, &modes());
        assert_eq!(out, b"   3.500    ");
    }

    #[test]
    fn test_g_out_of_range_is_e_like() {
        let out = edit_real(3.5e9, 12, 4, None, RealForm::G, &modes());
        assert_eq!(out, b"  0.3500E+10");
    }

    #[test]
    fn test_decimal_comma_mode() {
        let m = EditModes {
            decimal: crate::options::DecimalMode::Comma,
            ..modes()
        };
        assert_eq!(edit_real(1.5, 6, 1, None, RealForm::F, &m), b"   1,5");
    }

    #[test]
    fn test_zero_value_e_editing() {
        assert_eq!(
            edit_real(0.0, 12, 4, None, RealForm::E, &modes()),
            b"  0.0000E+00"
        );
    }

    #[test]
    fn test_logical_editing() {
        assert_eq!(edit_logical(true, 3), b"  T");
        assert_eq!(edit_logical(false, 1), b"F");
    }

    #[test]
    fn test_character_editing() {
        assert_eq!(edit_character(b"hi", None), b"hi");
        assert_eq!(edit_character(b"hi", Some(5)), b"   hi");
        assert_eq!(edit_character(b"hello", Some(3)), b"hel");
    }

    #[test]
    fn test_nan_and_inf() {
        assert_eq!(edit_real(f64::NAN, 5, 2, None, RealForm::F, &modes()), b"  NaN");
        assert_eq!(
            edit_real(f64::NEG_INFINITY, 6, 2, None, RealForm::E, &modes()),
            b"  -Inf"
        );
    }
}
