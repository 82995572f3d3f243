//! List-directed editing.
//!
//! Output side: renders each value in its processor-chosen form, with a
//! single blank separating consecutive values in a record. Input side:
//! a resumable scanner that tokenizes value sequences with `r*c`
//! repetition, null values, comma/blank separators, and the slash
//! terminator, continuing across record boundaries.

use crate::format::EditModes;
use crate::format::input as field_input;
use crate::iostat::IoError;
use crate::options::{DecimalMode, DelimMode};

// ---------------------------------------------------------------------------
// Output rendering
// ---------------------------------------------------------------------------

pub fn render_integer(value: i64) -> Vec<u8> {
    value.to_string().into_bytes()
}

/// Reals keep the shortest representation that still reads back
/// exactly, always carrying a decimal symbol.
pub fn render_real(value: f64, decimal: DecimalMode) -> Vec<u8> {
    let mut text = if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        if value > 0.0 { "Inf".into() } else { "-Inf".into() }
    } else {
        let t = format!("{value}");
        if t.bytes().any(|b| b == b'.' || b == b'e') {
            t
        } else {
            format!("{t}.")
        }
    };
    if decimal == DecimalMode::Comma {
        text = text.replace('.', ",");
    }
    text.into_bytes()
}

pub fn render_logical(value: bool) -> Vec<u8> {
    vec![if value { b'T' } else { b'F' }]
}

/// Complex values render as "(re,im)"; under DECIMAL='COMMA' the part
/// separator becomes ';'.
pub fn render_complex(re: f64, im: f64, decimal: DecimalMode) -> Vec<u8> {
    let sep = if decimal == DecimalMode::Comma { b';' } else { b',' };
    let mut out = vec![b'('];
    out.extend_from_slice(&render_real(re, decimal));
    out.push(sep);
    out.extend_from_slice(&render_real(im, decimal));
    out.push(b')');
    out
}

/// Character values are emitted raw under DELIM='NONE', otherwise
/// delimited with embedded delimiters doubled.
pub fn render_character(value: &[u8], delim: DelimMode) -> Vec<u8> {
    let quote = match delim {
        DelimMode::None => return value.to_vec(),
        DelimMode::Apostrophe => b'\'',
        DelimMode::Quote => b'"',
    };
    let mut out = vec![quote];
    for &b in value {
        out.push(b);
        if b == quote {
            out.push(quote);
        }
    }
    out.push(quote);
    out
}

// ---------------------------------------------------------------------------
// Input scanning
// ---------------------------------------------------------------------------

/// One step of list-directed scanning.
#[derive(Debug, PartialEq, Eq)]
pub enum ListScan {
    /// `repeat` copies of a value (None = null value, item unchanged).
    Item(u32, Option<Vec<u8>>),
    /// The current record is exhausted; refill and call again.
    NeedRecord,
    /// A slash terminated the list; every remaining item is null.
    Done,
}

/// Resumable list-directed tokenizer.
///
/// Carries separator state and any partially scanned quoted string
/// across record boundaries.
#[derive(Debug, Default)]
pub struct ListScanner {
    /// A value was returned and its trailing separator not yet eaten.
    after_value: bool,
    terminated: bool,
    /// Open quoted string: (quote byte, collected text, repeat count).
    open_quote: Option<(u8, Vec<u8>, u32)>,
}

impl ListScanner {
    /// Scan the next item from `record` starting at `*pos`.
    pub fn scan(
        &mut self,
        record: &[u8],
        pos: &mut usize,
        decimal: DecimalMode,
    ) -> Result<ListScan, IoError> {
        if self.terminated {
            return Ok(ListScan::Done);
        }
        let separator = if decimal == DecimalMode::Comma { b';' } else { b',' };

        // Resume an unfinished quoted string first.
        if let Some((quote, mut text, repeat)) = self.open_quote.take() {
            match scan_quote_body(record, pos, quote, &mut text) {
                QuoteScan::Closed => {
                    self.after_value = true;
                    return Ok(ListScan::Item(repeat, Some(text)));
                }
                QuoteScan::Open => {
                    self.open_quote = Some((quote, text, repeat));
                    return Ok(ListScan::NeedRecord);
                }
            }
        }

        skip_blanks(record, pos);
        if self.after_value {
            // Eat one trailing separator if present.
            if *pos < record.len() && record[*pos] == separator {
                *pos += 1;
                skip_blanks(record, pos);
            }
            self.after_value = false;
        }
        if *pos >= record.len() {
            return Ok(ListScan::NeedRecord);
        }

        match record[*pos] {
            b'/' => {
                self.terminated = true;
                *pos += 1;
                Ok(ListScan::Done)
            }
            b if b == separator => {
                // Two separators in a row: a null value.
                self.after_value = true;
                Ok(ListScan::Item(1, None))
            }
            _ => self.scan_value(record, pos, separator),
        }
    }

    fn scan_value(
        &mut self,
        record: &[u8],
        pos: &mut usize,
        separator: u8,
    ) -> Result<ListScan, IoError> {
        // Optional r* repeat prefix.
        let mut repeat: u32 = 1;
        let mark = *pos;
        let mut digits = 0usize;
        while *pos < record.len() && record[*pos].is_ascii_digit() {
            *pos += 1;
            digits += 1;
        }
        if digits > 0 && *pos < record.len() && record[*pos] == b'*' {
            repeat = std::str::from_utf8(&record[mark..mark + digits])
                .ok()
                .and_then(|s| s.parse().ok())
                .ok_or_else(|| IoError::Conversion("repeat count".into()))?;
            *pos += 1;
            // "r*" followed by a separator or record end is a repeated null.
            if *pos >= record.len()
                || record[*pos] == b' '
                || record[*pos] == separator
                || record[*pos] == b'/'
            {
                self.after_value = true;
                return Ok(ListScan::Item(repeat, None));
            }
        } else {
            *pos = mark;
        }

        match record[*pos] {
            quote @ (b'\'' | b'"') => {
                *pos += 1;
                let mut text = Vec::new();
                match scan_quote_body(record, pos, quote, &mut text) {
                    QuoteScan::Closed => {
                        self.after_value = true;
                        Ok(ListScan::Item(repeat, Some(text)))
                    }
                    QuoteScan::Open => {
                        self.open_quote = Some((quote, text, repeat));
                        Ok(ListScan::NeedRecord)
                    }
                }
            }
            b'(' => {
                // Complex value: everything through the closing paren.
                let start = *pos;
                while *pos < record.len() && record[*pos] != b')' {
                    *pos += 1;
                }
                if *pos >= record.len() {
                    return Err(IoError::Conversion(
                        String::from_utf8_lossy(&record[start..]).into_owned(),
                    ));
                }
                *pos += 1;
                self.after_value = true;
                Ok(ListScan::Item(repeat, Some(record[start..*pos].to_vec())))
            }
            _ => {
                let start = *pos;
                while *pos < record.len() {
                    let b = record[*pos];
                    if b == b' ' || b == separator || b == b'/' {
                        break;
                    }
                    *pos += 1;
                }
                self.after_value = true;
                Ok(ListScan::Item(repeat, Some(record[start..*pos].to_vec())))
            }
        }
    }
}

enum QuoteScan {
    Closed,
    Open,
}

fn scan_quote_body(record: &[u8], pos: &mut usize, quote: u8, text: &mut Vec<u8>) -> QuoteScan {
    while *pos < record.len() {
        let b = record[*pos];
        *pos += 1;
        if b == quote {
            if *pos < record.len() && record[*pos] == quote {
                *pos += 1;
                text.push(quote);
            } else {
                return QuoteScan::Closed;
            }
        } else {
            text.push(b);
        }
    }
    QuoteScan::Open
}

fn skip_blanks(record: &[u8], pos: &mut usize) {
    while *pos < record.len() && record[*pos] == b' ' {
        *pos += 1;
    }
}

// ---------------------------------------------------------------------------
// Token conversion
// ---------------------------------------------------------------------------

pub fn token_to_integer(token: &[u8]) -> Result<i64, IoError> {
    std::str::from_utf8(token)
        .ok()
        .and_then(|s| s.trim().parse::<i64>().ok())
        .ok_or_else(|| IoError::Conversion(String::from_utf8_lossy(token).into_owned()))
}

pub fn token_to_real(token: &[u8], decimal: DecimalMode) -> Result<f64, IoError> {
    let modes = EditModes {
        decimal,
        ..EditModes::default()
    };
    field_input::parse_real(token, 0, &modes)
}

pub fn token_to_logical(token: &[u8]) -> Result<bool, IoError> {
    field_input::parse_logical(token)
}

/// "(re,im)" (or "(re;im)" under DECIMAL='COMMA') into its parts.
pub fn token_to_complex(token: &[u8], decimal: DecimalMode) -> Result<(f64, f64), IoError> {
    let err = || IoError::Conversion(String::from_utf8_lossy(token).into_owned());
    let inner = token
        .strip_prefix(b"(")
        .and_then(|t| t.strip_suffix(b")"))
        .ok_or_else(err)?;
    let sep = if decimal == DecimalMode::Comma { b';' } else { b',' };
    let split = inner.iter().position(|b| *b == sep).ok_or_else(err)?;
    let re = token_to_real(&inner[..split], decimal)?;
    let im = token_to_real(&inner[split + 1..], decimal)?;
    Ok((re, im))
}
