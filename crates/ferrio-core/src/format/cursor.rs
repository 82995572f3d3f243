//! Format interpreter.
//!
//! Walks a format specification lazily (pull model): the statement asks
//! for the next data edit each time a value is transferred, and control
//! edits encountered on the way are applied through the [`ControlSink`]
//! the statement provides. Formats are not expanded eagerly: repeat
//! counts and nested groups make the expanded stream unbounded, and one
//! cursor instance is reused across every transfer call of a statement.
//!
//! Group nesting uses an explicit stack recording the resume position
//! and remaining repeat count per open group. The stack depth is
//! bounded by the scratch area supplied at Begin; exceeding the bound
//! is a reported error, never unbounded growth.
//!
//! Reaching the end of the format with items still pending re-enters
//! the format from its start (reversion) after terminating the current
//! record. A format with no data edits at all cannot make progress and
//! is an error.

use super::edit::{ControlEdit, DataEdit, IntBase, RealForm};
use crate::iostat::IoError;
use crate::options::{BlankMode, DecimalMode, RoundMode, SignMode};

/// Nesting depth used when the caller supplies no scratch region.
pub const DEFAULT_MAX_NESTING: usize = 16;

/// Depth bound implied by a borrowed scratch region of `bytes` bytes.
///
/// The region is sized by the contract formula `32 + 8 * maxDepth`;
/// zero means "no scratch supplied".
pub fn nesting_bound(bytes: usize) -> usize {
    if bytes == 0 {
        DEFAULT_MAX_NESTING
    } else {
        bytes.saturating_sub(32) / 8
    }
}

/// Receiver for control-edit side effects.
///
/// Implemented by the statement: positioning and record control touch
/// its record assembly state, mode edits touch its transient edit modes.
pub trait ControlSink {
    fn literal(&mut self, text: &[u8]) -> Result<(), IoError>;
    fn end_record(&mut self) -> Result<(), IoError>;
    /// Move to an absolute 1-based column.
    fn column(&mut self, col: u32) -> Result<(), IoError>;
    /// Move left (negative) or right (positive) by `delta` columns.
    fn relative(&mut self, delta: i32) -> Result<(), IoError>;
    fn scale(&mut self, k: i32);
    fn sign(&mut self, mode: SignMode);
    fn blank(&mut self, mode: BlankMode);
    fn decimal(&mut self, mode: DecimalMode);
    fn round(&mut self, mode: RoundMode);
}

/// One open parenthesis group.
#[derive(Debug, Clone, Copy)]
struct Group {
    /// Byte position just after the '(' to resume at on repeat.
    resume: usize,
    /// Remaining passes, including the current one.
    remaining: u32,
}

/// Interpreter progress for one statement's format.
#[derive(Debug)]
pub struct FormatCursor {
    fmt: Vec<u8>,
    pos: usize,
    stack: Vec<Group>,
    max_depth: usize,
    /// Data edit currently being repeated, with visits left.
    current: Option<(DataEdit, u32)>,
    /// A data edit was yielded since the last (re)entry of the format.
    yielded_since_entry: bool,
    reversions: u32,
}

impl FormatCursor {
    pub fn new(fmt: &[u8], max_depth: usize) -> Self {
        Self {
            fmt: fmt.to_vec(),
            pos: 0,
            stack: Vec::new(),
            max_depth,
            current: None,
            yielded_since_entry: false,
            reversions: 0,
        }
    }

    /// Times the format has been re-entered from its start.
    pub fn reversions(&self) -> u32 {
        self.reversions
    }

    /// Yield the next data edit, applying intervening control edits.
    pub fn next_data_edit(&mut self, sink: &mut dyn ControlSink) -> Result<DataEdit, IoError> {
        loop {
            if let Some((edit, left)) = self.current {
                if left > 1 {
                    self.current = Some((edit, left - 1));
                } else {
                    self.current = None;
                }
                self.yielded_since_entry = true;
                return Ok(edit);
            }
            match self.step()? {
                Step::Data(edit, repeat) => {
                    self.current = Some((edit, repeat));
                }
                Step::Control(edit) => apply_control(&edit, sink)?,
                Step::EndOfFormat => {
                    if !self.yielded_since_entry {
                        return Err(IoError::FormatNoDataEdits);
                    }
                    // Reversion terminates the current record and
                    // re-enters the format from the start.
                    sink.end_record()?;
                    self.pos = 0;
                    self.reversions += 1;
                    self.yielded_since_entry = false;
                }
            }
        }
    }

    /// Run out the remaining control edits at statement end.
    ///
    /// Stops at the first data edit (no value remains to satisfy it)
    /// or at the top-level end of the format; never reverts.
    pub fn finish(&mut self, sink: &mut dyn ControlSink) -> Result<(), IoError> {
        if self.current.is_some() {
            return Ok(());
        }
        loop {
            match self.step()? {
                Step::Data(..) | Step::EndOfFormat => return Ok(()),
                Step::Control(edit) => apply_control(&edit, sink)?,
            }
        }
    }

    // -----------------------------------------------------------------------
    // Token scanning
    // -----------------------------------------------------------------------

    fn step(&mut self) -> Result<Step, IoError> {
        self.skip_separators();
        let Some(b) = self.peek() else {
            if self.stack.is_empty() {
                return Ok(Step::EndOfFormat);
            }
            return Err(IoError::FormatSyntax(self.pos));
        };

        match b {
            b'(' => {
                self.pos += 1;
                self.push_group(1)?;
                self.step_again()
            }
            b')' => {
                self.pos += 1;
                let Some(top) = self.stack.last_mut() else {
                    return Err(IoError::FormatSyntax(self.pos - 1));
                };
                if top.remaining > 1 {
                    top.remaining -= 1;
                    self.pos = top.resume;
                } else {
                    self.stack.pop();
                }
                self.step_again()
            }
            b'/' => {
                self.pos += 1;
                Ok(Step::Control(ControlEdit::Slash(1)))
            }
            b':' => {
                // Pull model: the cursor only advances while another
                // item exists, so the colon never terminates here.
                self.pos += 1;
                self.step_again()
            }
            b'\'' | b'"' => {
                let text = self.scan_quoted(b)?;
                Ok(Step::Control(ControlEdit::Literal(text)))
            }
            b'+' | b'-' => {
                let k = self.scan_signed()?;
                self.expect_letter(b'P')?;
                Ok(Step::Control(ControlEdit::Scale(k)))
            }
            b'0'..=b'9' => {
                let n = self.scan_unsigned()?;
                match self.peek() {
                    Some(b'(') => {
                        self.pos += 1;
                        self.push_group(n.max(1))?;
                        self.step_again()
                    }
                    Some(b'X') | Some(b'x') => {
                        self.pos += 1;
                        Ok(Step::Control(ControlEdit::Relative(n as i32)))
                    }
                    Some(b'P') | Some(b'p') => {
                        self.pos += 1;
                        Ok(Step::Control(ControlEdit::Scale(n as i32)))
                    }
                    Some(b'H') | Some(b'h') => {
                        self.pos += 1;
                        let text = self.take_bytes(n as usize)?;
                        Ok(Step::Control(ControlEdit::Literal(text)))
                    }
                    Some(b'/') => {
                        self.pos += 1;
                        Ok(Step::Control(ControlEdit::Slash(n.max(1))))
                    }
                    _ => {
                        let edit = self.scan_data_edit()?;
                        Ok(Step::Data(edit, n.max(1)))
                    }
                }
            }
            _ => {
                if let Some(control) = self.try_scan_control_mnemonic()? {
                    Ok(Step::Control(control))
                } else {
                    let edit = self.scan_data_edit()?;
                    Ok(Step::Data(edit, 1))
                }
            }
        }
    }

    // '(' / ')' / ':' handling recurses one token deeper; groups cannot
    // produce a value themselves.
    fn step_again(&mut self) -> Result<Step, IoError> {
        self.step()
    }

    fn push_group(&mut self, repeat: u32) -> Result<(), IoError> {
        if self.stack.len() >= self.max_depth {
            return Err(IoError::FormatNestingOverflow);
        }
        self.stack.push(Group {
            resume: self.pos,
            remaining: repeat,
        });
        Ok(())
    }

    /// Two-letter mode mnemonics and positioning edits that start with
    /// a letter also used by data edits (B, D, S, R, T).
    fn try_scan_control_mnemonic(&mut self) -> Result<Option<ControlEdit>, IoError> {
        let b0 = self.peek().map(|b| b.to_ascii_uppercase());
        let b1 = self.peek_at(1).map(|b| b.to_ascii_uppercase());
        let control = match (b0, b1) {
            (Some(b'B'), Some(b'N')) => Some((2, ControlEdit::Blank(BlankMode::Null))),
            (Some(b'B'), Some(b'Z')) => Some((2, ControlEdit::Blank(BlankMode::Zero))),
            (Some(b'D'), Some(b'C')) => Some((2, ControlEdit::Decimal(DecimalMode::Comma))),
            (Some(b'D'), Some(b'P')) => Some((2, ControlEdit::Decimal(DecimalMode::Point))),
            (Some(b'S'), Some(b'P')) => Some((2, ControlEdit::Sign(SignMode::Plus))),
            (Some(b'S'), Some(b'S')) => Some((2, ControlEdit::Sign(SignMode::Suppress))),
            (Some(b'R'), Some(b'U')) => Some((2, ControlEdit::Round(RoundMode::Up))),
            (Some(b'R'), Some(b'D')) => Some((2, ControlEdit::Round(RoundMode::Down))),
            (Some(b'R'), Some(b'Z')) => Some((2, ControlEdit::Round(RoundMode::Zero))),
            (Some(b'R'), Some(b'N')) => Some((2, ControlEdit::Round(RoundMode::Nearest))),
            (Some(b'R'), Some(b'C')) => Some((2, ControlEdit::Round(RoundMode::Compatible))),
            (Some(b'R'), Some(b'P')) => Some((2, ControlEdit::Round(RoundMode::ProcessorDefined))),
            _ => None,
        };
        if let Some((consumed, control)) = control {
            self.pos += consumed;
            return Ok(Some(control));
        }

        match (b0, b1) {
            // S alone (not SP/SS) restores default sign handling.
            (Some(b'S'), next) if !matches!(next, Some(b'P') | Some(b'S')) => {
                self.pos += 1;
                Ok(Some(ControlEdit::Sign(SignMode::ProcessorDefined)))
            }
            (Some(b'T'), Some(b'L')) => {
                self.pos += 2;
                let n = self.scan_unsigned()?;
                Ok(Some(ControlEdit::Relative(-(n as i32))))
            }
            (Some(b'T'), Some(b'R')) => {
                self.pos += 2;
                let n = self.scan_unsigned()?;
                Ok(Some(ControlEdit::Relative(n as i32)))
            }
            (Some(b'T'), _) => {
                self.pos += 1;
                let n = self.scan_unsigned()?;
                Ok(Some(ControlEdit::Column(n)))
            }
            _ => Ok(None),
        }
    }

    fn scan_data_edit(&mut self) -> Result<DataEdit, IoError> {
        let at = self.pos;
        let Some(b) = self.peek() else {
            return Err(IoError::FormatSyntax(at));
        };
        match b.to_ascii_uppercase() {
            b'I' => {
                self.pos += 1;
                let (width, min_digits) = self.scan_width_dot_m()?;
                Ok(DataEdit::Integer {
                    width,
                    min_digits,
                    base: IntBase::Decimal,
                })
            }
            b'B' => {
                self.pos += 1;
                let (width, min_digits) = self.scan_width_dot_m()?;
                Ok(DataEdit::Integer {
                    width,
                    min_digits,
                    base: IntBase::Binary,
                })
            }
            b'O' => {
                self.pos += 1;
                let (width, min_digits) = self.scan_width_dot_m()?;
                Ok(DataEdit::Integer {
                    width,
                    min_digits,
                    base: IntBase::Octal,
                })
            }
            b'Z' => {
                self.pos += 1;
                let (width, min_digits) = self.scan_width_dot_m()?;
                Ok(DataEdit::Integer {
                    width,
                    min_digits,
                    base: IntBase::Hex,
                })
            }
            b'F' => {
                self.pos += 1;
                let (width, frac) = self.scan_width_dot_d()?;
                Ok(DataEdit::Real {
                    width,
                    frac,
                    exponent: None,
                    form: RealForm::F,
                })
            }
            b'D' => {
                self.pos += 1;
                let (width, frac) = self.scan_width_dot_d()?;
                Ok(DataEdit::Real {
                    width,
                    frac,
                    exponent: None,
                    form: RealForm::D,
                })
            }
            b'E' => {
                self.pos += 1;
                let form = match self.peek().map(|c| c.to_ascii_uppercase()) {
                    Some(b'N') => {
                        self.pos += 1;
                        RealForm::En
                    }
                    Some(b'S') => {
                        self.pos += 1;
                        RealForm::Es
                    }
                    _ => RealForm::E,
                };
                let (width, frac) = self.scan_width_dot_d()?;
                let exponent = self.scan_opt_exponent()?;
                Ok(DataEdit::Real {
                    width,
                    frac,
                    exponent,
                    form,
                })
            }
            b'G' => {
                self.pos += 1;
                let (width, frac) = self.scan_width_dot_d_opt()?;
                let exponent = self.scan_opt_exponent()?;
                Ok(DataEdit::Real {
                    width,
                    frac,
                    exponent,
                    form: RealForm::G,
                })
            }
            b'L' => {
                self.pos += 1;
                let width = self.scan_unsigned()?;
                Ok(DataEdit::Logical { width })
            }
            b'A' => {
                self.pos += 1;
                let width = match self.peek() {
                    Some(c) if c.is_ascii_digit() => Some(self.scan_unsigned()?),
                    _ => None,
                };
                Ok(DataEdit::Character { width })
            }
            _ => Err(IoError::FormatSyntax(at)),
        }
    }

    /// `w[.m]` with a required width.
    fn scan_width_dot_m(&mut self) -> Result<(u32, u32), IoError> {
        let width = self.scan_unsigned()?;
        if self.peek() == Some(b'.') {
            self.pos += 1;
            Ok((width, self.scan_unsigned()?))
        } else {
            Ok((width, 0))
        }
    }

    /// `w.d` with both parts required.
    fn scan_width_dot_d(&mut self) -> Result<(u32, u32), IoError> {
        let width = self.scan_unsigned()?;
        if self.peek() != Some(b'.') {
            return Err(IoError::FormatSyntax(self.pos));
        }
        self.pos += 1;
        Ok((width, self.scan_unsigned()?))
    }

    /// `w[.d]`; G0 omits the fraction part.
    fn scan_width_dot_d_opt(&mut self) -> Result<(u32, u32), IoError> {
        let width = self.scan_unsigned()?;
        if self.peek() == Some(b'.') {
            self.pos += 1;
            Ok((width, self.scan_unsigned()?))
        } else {
            Ok((width, 0))
        }
    }

    /// Optional `Ee` exponent-width suffix.
    fn scan_opt_exponent(&mut self) -> Result<Option<u32>, IoError> {
        if matches!(self.peek(), Some(b'E') | Some(b'e'))
            && self.peek_at(1).is_some_and(|c| c.is_ascii_digit())
        {
            self.pos += 1;
            return Ok(Some(self.scan_unsigned()?));
        }
        Ok(None)
    }

    fn scan_unsigned(&mut self) -> Result<u32, IoError> {
        let start = self.pos;
        let mut value: u32 = 0;
        while let Some(b) = self.peek() {
            if !b.is_ascii_digit() {
                break;
            }
            value = value.saturating_mul(10).saturating_add((b - b'0') as u32);
            self.pos += 1;
        }
        if self.pos == start {
            return Err(IoError::FormatSyntax(start));
        }
        Ok(value)
    }

    fn scan_signed(&mut self) -> Result<i32, IoError> {
        let negative = match self.peek() {
            Some(b'-') => {
                self.pos += 1;
                true
            }
            Some(b'+') => {
                self.pos += 1;
                false
            }
            _ => false,
        };
        let n = self.scan_unsigned()? as i32;
        Ok(if negative { -n } else { n })
    }

    fn expect_letter(&mut self, letter: u8) -> Result<(), IoError> {
        if self.peek().map(|b| b.to_ascii_uppercase()) == Some(letter) {
            self.pos += 1;
            Ok(())
        } else {
            Err(IoError::FormatSyntax(self.pos))
        }
    }

    fn scan_quoted(&mut self, quote: u8) -> Result<Vec<u8>, IoError> {
        let start = self.pos;
        self.pos += 1;
        let mut text = Vec::new();
        while let Some(b) = self.peek() {
            self.pos += 1;
            if b == quote {
                // Doubled quote is a literal quote character.
                if self.peek() == Some(quote) {
                    self.pos += 1;
                    text.push(quote);
                } else {
                    return Ok(text);
                }
            } else {
                text.push(b);
            }
        }
        Err(IoError::FormatSyntax(start))
    }

    fn take_bytes(&mut self, n: usize) -> Result<Vec<u8>, IoError> {
        if self.pos + n > self.fmt.len() {
            return Err(IoError::FormatSyntax(self.pos));
        }
        let text = self.fmt[self.pos..self.pos + n].to_vec();
        self.pos += n;
        Ok(text)
    }

    fn skip_separators(&mut self) {
        while matches!(self.peek(), Some(b' ') | Some(b'\t') | Some(b',')) {
            self.pos += 1;
        }
    }

    fn peek(&self) -> Option<u8> {
        self.fmt.get(self.pos).copied()
    }

    fn peek_at(&self, ahead: usize) -> Option<u8> {
        self.fmt.get(self.pos + ahead).copied()
    }
}

enum Step {
    Data(DataEdit, u32),
    Control(ControlEdit),
    EndOfFormat,
}

fn apply_control(edit: &ControlEdit, sink: &mut dyn ControlSink) -> Result<(), IoError> {
    match edit {
        ControlEdit::Literal(text) => sink.literal(text),
        ControlEdit::Slash(n) => {
            for _ in 0..*n {
                sink.end_record()?;
            }
            Ok(())
        }
        ControlEdit::Column(col) => sink.column(*col),
        ControlEdit::Relative(delta) => sink.relative(*delta),
        ControlEdit::Scale(k) => {
            sink.scale(*k);
            Ok(())
        }
        ControlEdit::Sign(m) => {
            sink.sign(*m);
            Ok(())
        }
        ControlEdit::Blank(m) => {
            sink.blank(*m);
            Ok(())
        }
        ControlEdit::Decimal(m) => {
            sink.decimal(*m);
            Ok(())
        }
        ControlEdit::Round(m) => {
            sink.round(*m);
            Ok(())
        }
        ControlEdit::Colon => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Sink that records control effects for assertions.
    #[derive(Default)]
    struct TestSink {
        literals: Vec<Vec<u8>>,
        records_ended: u32,
        moves: Vec<i32>,
        columns: Vec<u32>,
        scale: i32,
    }

    impl ControlSink for TestSink {
        fn literal(&mut self, text: &[u8]) -> Result<(), IoError> {
            self.literals.push(text.to_vec());
            Ok(())
        }
        fn end_record(&mut self) -> Result<(), IoError> {
            self.records_ended += 1;
            Ok(())
        }
        fn column(&mut self, col: u32) -> Result<(), IoError> {
            self.columns.push(col);
            Ok(())
        }
        fn relative(&mut self, delta: i32) -> Result<(), IoError> {
            self.moves.push(delta);
            Ok(())
        }
        fn scale(&mut self, k: i32) {
            self.scale = k;
        }
        fn sign(&mut self, _mode: SignMode) {}
        fn blank(&mut self, _mode: BlankMode) {}
        fn decimal(&mut self, _mode: DecimalMode) {}
        fn round(&mut self, _mode: RoundMode) {}
    }

    fn cursor(fmt: &str) -> FormatCursor {
        FormatCursor::new(fmt.as_bytes(), DEFAULT_MAX_NESTING)
    }

    #[test]
    fn test_simple_integer_edit() {
        let mut c = cursor("(I5)");
        let mut s = TestSink::default();
        let e = c.next_data_edit(&mut s).unwrap();
        assert_eq!(
            e,
            DataEdit::Integer {
                width: 5,
                min_digits: 0,
                base: IntBase::Decimal
            }
        );
    }

    #[test]
    fn test_repeat_count_on_data_edit() {
        let mut c = cursor("(3I2)");
        let mut s = TestSink::default();
        for _ in 0..3 {
            let e = c.next_data_edit(&mut s).unwrap();
            assert!(matches!(e, DataEdit::Integer { width: 2, .. }));
        }
        assert_eq!(c.reversions(), 0);
    }

    #[test]
    fn test_group_repeat() {
        let mut c = cursor("(2(I1,F4.1))");
        let mut s = TestSink::default();
        let kinds: Vec<bool> = (0..4)
            .map(|_| matches!(c.next_data_edit(&mut s).unwrap(), DataEdit::Integer { .. }))
            .collect();
        assert_eq!(kinds, vec![true, false, true, false]);
    }

    #[test]
    fn test_reversion_counts() {
        // One data edit, three items: the format re-enters twice.
        let mut c = cursor("(I5)");
        let mut s = TestSink::default();
        for _ in 0..3 {
            c.next_data_edit(&mut s).unwrap();
        }
        assert_eq!(c.reversions(), 2);
        assert_eq!(s.records_ended, 2);
    }

    #[test]
    fn test_no_data_edits_is_error() {
        let mut c = cursor("(1X)");
        let mut s = TestSink::default();
        assert_eq!(
            c.next_data_edit(&mut s).unwrap_err(),
            IoError::FormatNoDataEdits
        );
    }

    #[test]
    fn test_literal_and_spacing_side_effects() {
        let mut c = cursor("('abc',2X,I3)");
        let mut s = TestSink::default();
        c.next_data_edit(&mut s).unwrap();
        assert_eq!(s.literals, vec![b"abc".to_vec()]);
        assert_eq!(s.moves, vec![2]);
    }

    #[test]
    fn test_hollerith_literal() {
        let mut c = cursor("(3Hend,I1)");
        let mut s = TestSink::default();
        c.next_data_edit(&mut s).unwrap();
        assert_eq!(s.literals, vec![b"end".to_vec()]);
    }

    #[test]
    fn test_doubled_quote_escape() {
        let mut c = cursor("('it''s',I1)");
        let mut s = TestSink::default();
        c.next_data_edit(&mut s).unwrap();
        assert_eq!(s.literals, vec![b"it's".to_vec()]);
    }

    #[test]
    fn test_slash_ends_record() {
        let mut c = cursor("(I2//I2)");
        let mut s = TestSink::default();
        c.next_data_edit(&mut s).unwrap();
        c.next_data_edit(&mut s).unwrap();
        assert_eq!(s.records_ended, 2);
    }

    #[test]
    fn test_tab_and_tl_tr() {
        let mut c = cursor("(T10,TL3,TR2,I1)");
        let mut s = TestSink::default();
        c.next_data_edit(&mut s).unwrap();
        assert_eq!(s.columns, vec![10]);
        assert_eq!(s.moves, vec![-3, 2]);
    }

    #[test]
    fn test_scale_factor_signed() {
        let mut c = cursor("(-2P,F8.2)");
        let mut s = TestSink::default();
        c.next_data_edit(&mut s).unwrap();
        assert_eq!(s.scale, -2);
    }

    #[test]
    fn test_mode_mnemonics_not_data_edits() {
        // BN/BZ and DC must not be parsed as Bw / Dw.d edits.
        let mut c = cursor("(BZ,DC,SP,RU,I4)");
        let mut s = TestSink::default();
        let e = c.next_data_edit(&mut s).unwrap();
        assert!(matches!(e, DataEdit::Integer { width: 4, .. }));
    }

    #[test]
    fn test_real_forms() {
        let mut c = cursor("(F8.3,E12.4,ES10.2E3,D14.6,G0)");
        let mut s = TestSink::default();
        let forms: Vec<RealForm> = (0..5)
            .map(|_| match c.next_data_edit(&mut s).unwrap() {
                DataEdit::Real { form, .. } => form,
                other => panic!("expected real edit, got {other:?}"),
            })
            .collect();
        assert_eq!(
            forms,
            vec![RealForm::F, RealForm::E, RealForm::Es, RealForm::D, RealForm::G]
        );
    }

    #[test]
    fn test_exponent_width_suffix() {
        let mut c = cursor("(E12.4E3)");
        let mut s = TestSink::default();
        match c.next_data_edit(&mut s).unwrap() {
            DataEdit::Real { exponent, .. } => assert_eq!(exponent, Some(3)),
            other => panic!("expected real edit, got {other:?}"),
        }
    }

    #[test]
    fn test_nesting_exactly_at_bound() {
        let mut c = FormatCursor::new(b"(((I1)))", 3);
        let mut s = TestSink::default();
        assert!(c.next_data_edit(&mut s).is_ok());
    }

    #[test]
    fn test_nesting_beyond_bound() {
        let mut c = FormatCursor::new(b"((((I1))))", 3);
        let mut s = TestSink::default();
        assert_eq!(
            c.next_data_edit(&mut s).unwrap_err(),
            IoError::FormatNestingOverflow
        );
    }

    #[test]
    fn test_nesting_bound_formula() {
        assert_eq!(nesting_bound(0), DEFAULT_MAX_NESTING);
        assert_eq!(nesting_bound(32), 0);
        assert_eq!(nesting_bound(32 + 8 * 3), 3);
    }

    #[test]
    fn test_unbalanced_parens_is_syntax_error() {
        let mut c = cursor("((I5)");
        let mut s = TestSink::default();
        c.next_data_edit(&mut s).unwrap();
        // Second pull hits end of format inside an open group.
        assert!(matches!(
            c.next_data_edit(&mut s),
            Err(IoError::FormatSyntax(_))
        ));
    }

    #[test]
    fn test_missing_width_is_syntax_error() {
        let mut c = cursor("(I)");
        let mut s = TestSink::default();
        assert!(matches!(
            c.next_data_edit(&mut s),
            Err(IoError::FormatSyntax(_))
        ));
    }

    #[test]
    fn test_finish_applies_trailing_controls() {
        let mut c = cursor("(I2,' done')");
        let mut s = TestSink::default();
        c.next_data_edit(&mut s).unwrap();
        c.finish(&mut s).unwrap();
        assert_eq!(s.literals, vec![b" done".to_vec()]);
    }

    #[test]
    fn test_finish_stops_at_data_edit() {
        let mut c = cursor("(I2,I2)");
        let mut s = TestSink::default();
        c.next_data_edit(&mut s).unwrap();
        c.finish(&mut s).unwrap();
        assert_eq!(s.records_ended, 0);
    }
}
