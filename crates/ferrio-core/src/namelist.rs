//! Namelist group transfers.
//!
//! A namelist group is metadata supplied by an external collaborator:
//! the group name and the ordered item names. Output renders
//! `&group item=value ... /`; input parses the same surface and hands
//! values out by item name, so items absent from the input are left
//! unchanged.

use std::collections::{HashMap, VecDeque};

use crate::iostat::IoError;

/// Group metadata: name plus item names in declaration order.
#[derive(Debug, Clone)]
pub struct NamelistGroup {
    pub name: String,
    pub items: Vec<String>,
}

impl NamelistGroup {
    pub fn new(name: impl Into<String>, items: Vec<String>) -> Self {
        Self {
            name: name.into(),
            items,
        }
    }
}

/// Parsed input values per (lower-cased) item name. None entries are
/// null values: the corresponding element stays unchanged.
pub type NamelistValues = HashMap<String, VecDeque<Option<Vec<u8>>>>;

#[derive(Debug, PartialEq, Eq)]
enum Tok {
    Chunk(Vec<u8>),
    Quoted(Vec<u8>),
    Equals,
    Slash,
}

fn lex(text: &[u8]) -> Result<Vec<Tok>, IoError> {
    let mut toks = Vec::new();
    let mut pos = 0;
    while pos < text.len() {
        match text[pos] {
            b' ' | b',' | b'\n' | b'\r' | b'\t' => pos += 1,
            b'=' => {
                toks.push(Tok::Equals);
                pos += 1;
            }
            b'/' => {
                toks.push(Tok::Slash);
                pos += 1;
            }
            quote @ (b'\'' | b'"') => {
                pos += 1;
                let mut body = Vec::new();
                loop {
                    if pos >= text.len() {
                        return Err(IoError::NamelistSyntax("unterminated string".into()));
                    }
                    let b = text[pos];
                    pos += 1;
                    if b == quote {
                        if text.get(pos) == Some(&quote) {
                            body.push(quote);
                            pos += 1;
                        } else {
                            break;
                        }
                    } else {
                        body.push(b);
                    }
                }
                toks.push(Tok::Quoted(body));
            }
            b'(' => {
                let start = pos;
                while pos < text.len() && text[pos] != b')' {
                    pos += 1;
                }
                if pos >= text.len() {
                    return Err(IoError::NamelistSyntax("unterminated complex value".into()));
                }
                pos += 1;
                toks.push(Tok::Chunk(text[start..pos].to_vec()));
            }
            _ => {
                let start = pos;
                while pos < text.len()
                    && !matches!(
                        text[pos],
                        b' ' | b',' | b'\n' | b'\r' | b'\t' | b'=' | b'/' | b'\'' | b'"'
                    )
                {
                    pos += 1;
                }
                toks.push(Tok::Chunk(text[start..pos].to_vec()));
            }
        }
    }
    Ok(toks)
}

fn expand_chunk(chunk: &[u8], out: &mut VecDeque<Option<Vec<u8>>>) -> Result<(), IoError> {
    // r*c repetition; bare "r*" is r null values.
    if let Some(star) = chunk.iter().position(|b| *b == b'*') {
        let prefix = &chunk[..star];
        if !prefix.is_empty() && prefix.iter().all(u8::is_ascii_digit) {
            let repeat: u32 = std::str::from_utf8(prefix)
                .ok()
                .and_then(|s| s.parse().ok())
                .ok_or_else(|| IoError::NamelistSyntax("bad repeat count".into()))?;
            let value = &chunk[star + 1..];
            for _ in 0..repeat {
                out.push_back(if value.is_empty() {
                    None
                } else {
                    Some(value.to_vec())
                });
            }
            return Ok(());
        }
    }
    out.push_back(Some(chunk.to_vec()));
    Ok(())
}

/// Parse namelist input text for `group`.
///
/// The text is everything between the statement's first record and the
/// terminating slash, concatenated.
pub fn parse_input(text: &[u8], group: &NamelistGroup) -> Result<NamelistValues, IoError> {
    let amp = text
        .iter()
        .position(|b| *b == b'&')
        .ok_or_else(|| IoError::NamelistSyntax("missing &group header".into()))?;
    let toks = lex(&text[amp + 1..])?;

    let mut iter = toks.into_iter().peekable();
    let name = match iter.next() {
        Some(Tok::Chunk(c)) => String::from_utf8_lossy(&c).to_lowercase(),
        _ => return Err(IoError::NamelistSyntax("missing group name".into())),
    };
    if !name.eq_ignore_ascii_case(&group.name) {
        return Err(IoError::NamelistSyntax(format!(
            "group '{name}' does not match '{}'",
            group.name.to_lowercase()
        )));
    }

    let mut values: NamelistValues = HashMap::new();
    let mut current: Option<String> = None;
    let mut terminated = false;
    while let Some(tok) = iter.next() {
        match tok {
            Tok::Slash => {
                terminated = true;
                break;
            }
            Tok::Chunk(chunk) => {
                if matches!(iter.peek(), Some(Tok::Equals)) {
                    iter.next();
                    let item = String::from_utf8_lossy(&chunk).to_lowercase();
                    if !group.items.iter().any(|i| i.eq_ignore_ascii_case(&item)) {
                        return Err(IoError::NamelistSyntax(format!(
                            "'{item}' is not in group '{}'",
                            group.name.to_lowercase()
                        )));
                    }
                    values.entry(item.clone()).or_default();
                    current = Some(item);
                } else {
                    let item = current
                        .as_ref()
                        .ok_or_else(|| IoError::NamelistSyntax("value before item name".into()))?;
                    expand_chunk(&chunk, values.get_mut(item).expect("current item"))?;
                }
            }
            Tok::Quoted(body) => {
                let item = current
                    .as_ref()
                    .ok_or_else(|| IoError::NamelistSyntax("value before item name".into()))?;
                values
                    .get_mut(item)
                    .expect("current item")
                    .push_back(Some(body));
            }
            Tok::Equals => {
                return Err(IoError::NamelistSyntax("unexpected '='".into()));
            }
        }
    }
    if !terminated {
        return Err(IoError::NamelistSyntax("missing terminating '/'".into()));
    }
    Ok(values)
}
