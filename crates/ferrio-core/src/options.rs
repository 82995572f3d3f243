//! Control-list option storage.
//!
//! Holds the per-statement settings named in a READ/WRITE control list
//! (ADVANCE=, BLANK=, DECIMAL=, DELIM=, PAD=, POS=, REC=, ROUND=,
//! SIGN=). Pure value storage with keyword validation; the statement
//! decides when mutation is still legal.
//!
//! Keyword matching is case-insensitive and ignores surrounding blanks,
//! matching how the values arrive from character expressions.

use crate::iostat::IoError;

/// ADVANCE=: whether the statement terminates its final record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Advance {
    #[default]
    Yes,
    No,
}

/// BLANK=: interpretation of blanks inside numeric input fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BlankMode {
    /// Blanks are ignored (BLANK='NULL').
    #[default]
    Null,
    /// Blanks are treated as zeros (BLANK='ZERO').
    Zero,
}

/// DECIMAL=: decimal symbol in real editing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DecimalMode {
    #[default]
    Point,
    Comma,
}

/// DELIM=: delimiter for character values in list-directed and
/// namelist output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DelimMode {
    #[default]
    None,
    Apostrophe,
    Quote,
}

/// PAD=: blank padding of short input records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PadMode {
    #[default]
    Yes,
    No,
}

/// ROUND=: rounding mode for real editing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RoundMode {
    Up,
    Down,
    Zero,
    #[default]
    Nearest,
    Compatible,
    ProcessorDefined,
}

/// SIGN=: plus-sign emission in numeric output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SignMode {
    Plus,
    Suppress,
    #[default]
    ProcessorDefined,
}

impl SignMode {
    /// Whether a non-negative value gets an explicit '+'.
    pub fn emit_plus(self) -> bool {
        matches!(self, SignMode::Plus)
    }
}

/// The full option set for one statement. Last writer wins per keyword.
#[derive(Debug, Clone, Default)]
pub struct OptionSet {
    pub advance: Advance,
    pub blank: BlankMode,
    pub decimal: DecimalMode,
    pub delim: DelimMode,
    pub pad: PadMode,
    pub round: RoundMode,
    pub sign: SignMode,
    /// POS= stream position (1-based), if given.
    pub pos: Option<i64>,
    /// REC= direct-access record number (1-based), if given.
    pub rec: Option<i64>,
}

fn keyword(value: &[u8]) -> String {
    String::from_utf8_lossy(value)
        .trim_matches(' ')
        .to_ascii_uppercase()
}

fn invalid(kw: &'static str, value: &[u8]) -> IoError {
    IoError::InvalidOptionValue {
        keyword: kw,
        value: keyword(value),
    }
}

macro_rules! match_keyword {
    ($kw:literal, $value:expr, { $($text:literal => $out:expr),+ $(,)? }) => {{
        let k = keyword($value);
        match k.as_str() {
            $($text => Ok($out),)+
            _ => Err(invalid($kw, $value)),
        }
    }};
}

impl OptionSet {
    pub fn set_advance(&mut self, value: &[u8]) -> Result<(), IoError> {
        self.advance = match_keyword!("ADVANCE", value, {
            "YES" => Advance::Yes,
            "NO" => Advance::No,
        })?;
        Ok(())
    }

    pub fn set_blank(&mut self, value: &[u8]) -> Result<(), IoError> {
        self.blank = match_keyword!("BLANK", value, {
            "NULL" => BlankMode::Null,
            "ZERO" => BlankMode::Zero,
        })?;
        Ok(())
    }

    pub fn set_decimal(&mut self, value: &[u8]) -> Result<(), IoError> {
        self.decimal = match_keyword!("DECIMAL", value, {
            "POINT" => DecimalMode::Point,
            "COMMA" => DecimalMode::Comma,
        })?;
        Ok(())
    }

    pub fn set_delim(&mut self, value: &[u8]) -> Result<(), IoError> {
        self.delim = match_keyword!("DELIM", value, {
            "NONE" => DelimMode::None,
            "APOSTROPHE" => DelimMode::Apostrophe,
            "QUOTE" => DelimMode::Quote,
        })?;
        Ok(())
    }

    pub fn set_pad(&mut self, value: &[u8]) -> Result<(), IoError> {
        self.pad = match_keyword!("PAD", value, {
            "YES" => PadMode::Yes,
            "NO" => PadMode::No,
        })?;
        Ok(())
    }

    pub fn set_round(&mut self, value: &[u8]) -> Result<(), IoError> {
        self.round = match_keyword!("ROUND", value, {
            "UP" => RoundMode::Up,
            "DOWN" => RoundMode::Down,
            "ZERO" => RoundMode::Zero,
            "NEAREST" => RoundMode::Nearest,
            "COMPATIBLE" => RoundMode::Compatible,
            "PROCESSOR_DEFINED" => RoundMode::ProcessorDefined,
        })?;
        Ok(())
    }

    pub fn set_sign(&mut self, value: &[u8]) -> Result<(), IoError> {
        self.sign = match_keyword!("SIGN", value, {
            "PLUS" => SignMode::Plus,
            "SUPPRESS" => SignMode::Suppress,
            "PROCESSOR_DEFINED" => SignMode::ProcessorDefined,
        })?;
        Ok(())
    }

    pub fn set_pos(&mut self, value: i64) -> Result<(), IoError> {
        if value < 1 {
            return Err(IoError::BadRecordNumber(value));
        }
        self.pos = Some(value);
        Ok(())
    }

    pub fn set_rec(&mut self, value: i64) -> Result<(), IoError> {
        if value < 1 {
            return Err(IoError::BadRecordNumber(value));
        }
        self.rec = Some(value);
        Ok(())
    }
}
