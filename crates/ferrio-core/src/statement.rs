//! The data transfer statement state machine.
//!
//! One `IoStatement` lives for exactly one READ/WRITE/PRINT statement:
//! a Begin call constructs it, Set calls adjust the control list until
//! the first transfer freezes it, transfer calls move typed items
//! while driving the format cursor, inquiry calls read the condition
//! back, and `end` finalizes the statement.
//!
//! Every transfer entry point returns a success flag. Once the
//! condition leaves Normal the remaining transfer calls are no-ops
//! returning false; the caller is expected to proceed to inquiry and
//! `end`. Option and binding errors are captured the same way rather
//! than reported synchronously, so generated code can always run the
//! full call sequence.

use crate::condition::{Classification, Condition};
use crate::format::cursor::ControlSink;
use crate::format::{DataEdit, EditModes, FormatCursor, IntBase, RealForm, input, nesting_bound, output};
use crate::internal::InternalFile;
use crate::iostat::IoError;
use crate::list::{self, ListScan, ListScanner};
use crate::namelist::{NamelistGroup, NamelistValues};
use crate::options::{Advance, OptionSet, PadMode};
use crate::unit::{self, SharedConnection};

/// Transfer direction, fixed at Begin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Output,
    Input,
}

/// Transfer mode, fixed at Begin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    ListDirected,
    Formatted,
    Unformatted,
    Namelist,
}

/// Where the statement transfers to or from.
pub enum Locus {
    External(i32),
    Internal(InternalFile),
}

enum Target {
    External { unit: i32, conn: SharedConnection },
    Internal(InternalFile),
    /// Binding failed; the condition already carries the error.
    Unbound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Configuring,
    Transferring,
}

/// Why a transfer stopped mid-item.
enum Halt {
    Error(IoError),
    End,
    Eor,
}

impl From<IoError> for Halt {
    fn from(e: IoError) -> Self {
        Halt::Error(e)
    }
}

type TResult<T> = Result<T, Halt>;

/// Statement outcome handed back by `end`.
#[derive(Debug)]
pub struct EndSummary {
    pub iostat: i32,
    /// Finished internal-file records for the ABI copy-back (output
    /// statements over an internal target only).
    pub internal: Option<InternalFile>,
}

/// End was called on an uninspected non-Normal condition: a caller
/// defect. The ABI layer escalates this to the fatal diagnostic path.
#[derive(Debug)]
pub struct UnhandledCondition {
    pub iostat: i32,
    pub message: String,
}

/// State machine for one I/O statement.
pub struct IoStatement {
    direction: Direction,
    mode: Mode,
    target: Target,
    options: OptionSet,
    modes: EditModes,
    cursor: Option<FormatCursor>,
    condition: Condition,
    phase: Phase,

    // Output record assembly: `record` is the open record, `col` the
    // 0-based column the next bytes land at (T edits move it).
    record: Vec<u8>,
    col: usize,
    list_first: bool,

    // Input state.
    in_record: Option<Vec<u8>>,
    in_pos: usize,
    scanner: ListScanner,
    pending_list: Option<(u32, Option<Vec<u8>>)>,
    pending_halt: Option<HaltKind>,

    // Namelist state.
    group: Option<NamelistGroup>,
    nl_values: Option<NamelistValues>,
    nl_item: usize,
    nl_current: Option<String>,
    /// Inside an explicitly opened item (array transfer): scalar
    /// transfer calls supply values without advancing the item.
    nl_in_item: bool,

    transfer_bytes: usize,
}

#[derive(Debug, Clone, Copy)]
enum HaltKind {
    End,
}

impl IoStatement {
    // -----------------------------------------------------------------------
    // Construction
    // -----------------------------------------------------------------------

    /// Begin a statement. A locus that cannot be bound or a missing
    /// format still yields a statement; the error is on its condition.
    pub fn begin(
        direction: Direction,
        mode: Mode,
        locus: Locus,
        format: Option<&[u8]>,
        scratch_bytes: usize,
    ) -> Self {
        let mut st = Self::empty(direction, mode);
        st.bind(locus);
        if mode == Mode::Formatted {
            match format {
                Some(f) => {
                    st.cursor = Some(FormatCursor::new(f, nesting_bound(scratch_bytes)));
                }
                None => st.condition.post_error(IoError::FormatSyntax(0)),
            }
        }
        st
    }

    /// Begin a namelist statement on an external unit.
    pub fn begin_namelist(direction: Direction, unit: i32, group: NamelistGroup) -> Self {
        let mut st = Self::empty(direction, Mode::Namelist);
        st.group = Some(group);
        st.bind(Locus::External(unit));
        st
    }

    /// A completed statement representing an asynchronous wait result.
    pub fn wait_result(result: Result<usize, IoError>) -> Self {
        let mut st = Self::empty(Direction::Output, Mode::Unformatted);
        st.phase = Phase::Transferring;
        match result {
            Ok(bytes) => st.transfer_bytes = bytes,
            Err(e) => st.condition.post_error(e),
        }
        st
    }

    fn empty(direction: Direction, mode: Mode) -> Self {
        Self {
            direction,
            mode,
            target: Target::Unbound,
            options: OptionSet::default(),
            modes: EditModes::default(),
            cursor: None,
            condition: Condition::default(),
            phase: Phase::Configuring,
            record: Vec::new(),
            col: 0,
            list_first: true,
            in_record: None,
            in_pos: 0,
            scanner: ListScanner::default(),
            pending_list: None,
            pending_halt: None,
            group: None,
            nl_values: None,
            nl_item: 0,
            nl_current: None,
            nl_in_item: false,
            transfer_bytes: 0,
        }
    }

    fn bind(&mut self, locus: Locus) {
        match locus {
            Locus::External(u) => {
                let need_write = self.direction == Direction::Output;
                match unit::resolve(u, need_write, !need_write) {
                    Ok(conn) => {
                        if conn.lock().has_pending_async() {
                            self.condition.post_error(IoError::UnitBusy(u));
                        }
                        self.target = Target::External { unit: u, conn };
                    }
                    Err(e) => self.condition.post_error(e),
                }
            }
            Locus::Internal(f) => self.target = Target::Internal(f),
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Unit number for an external statement, None otherwise.
    pub fn external_unit(&self) -> Option<i32> {
        match &self.target {
            Target::External { unit, .. } => Some(*unit),
            _ => None,
        }
    }

    /// Current position: (record number, column), both 1-based.
    pub fn position(&self) -> (i64, usize) {
        let record = match &self.target {
            Target::External { conn, .. } => conn.lock().record(),
            _ => 1,
        };
        let col = match self.direction {
            Direction::Output => self.col,
            Direction::Input => self.in_pos,
        };
        (record, col + 1)
    }

    // -----------------------------------------------------------------------
    // Control list
    // -----------------------------------------------------------------------

    fn set_option(&mut self, set: impl FnOnce(&mut OptionSet) -> Result<(), IoError>) {
        if self.phase == Phase::Transferring {
            self.condition.post_error(IoError::OptionAfterTransfer);
            return;
        }
        if let Err(e) = set(&mut self.options) {
            self.condition.post_error(e);
        }
    }

    pub fn set_advance(&mut self, v: &[u8]) {
        self.set_option(|o| o.set_advance(v));
    }

    pub fn set_blank(&mut self, v: &[u8]) {
        self.set_option(|o| o.set_blank(v));
    }

    pub fn set_decimal(&mut self, v: &[u8]) {
        self.set_option(|o| o.set_decimal(v));
    }

    pub fn set_delim(&mut self, v: &[u8]) {
        self.set_option(|o| o.set_delim(v));
    }

    pub fn set_pad(&mut self, v: &[u8]) {
        self.set_option(|o| o.set_pad(v));
    }

    pub fn set_round(&mut self, v: &[u8]) {
        self.set_option(|o| o.set_round(v));
    }

    pub fn set_sign(&mut self, v: &[u8]) {
        self.set_option(|o| o.set_sign(v));
    }

    pub fn set_pos(&mut self, v: i64) {
        self.set_option(|o| o.set_pos(v));
    }

    pub fn set_rec(&mut self, v: i64) {
        self.set_option(|o| o.set_rec(v));
    }

    /// The frozen option set (tests and the harness read it back).
    pub fn options(&self) -> &OptionSet {
        &self.options
    }

    // -----------------------------------------------------------------------
    // Transfer plumbing
    // -----------------------------------------------------------------------

    /// Common prelude: refuse after a non-Normal condition, freeze the
    /// options on the first transfer.
    fn start_transfer(&mut self) -> bool {
        if !self.condition.ok() {
            return false;
        }
        if self.phase == Phase::Configuring {
            self.phase = Phase::Transferring;
            self.modes = EditModes::from_options(&self.options);
            if let Err(e) = self.apply_positioning() {
                self.condition.post_error(e);
                return false;
            }
            if self.mode == Mode::Namelist && self.direction == Direction::Output {
                if let Err(e) = self.namelist_header() {
                    self.condition.post_error(e);
                    return false;
                }
            }
        }
        true
    }

    fn apply_positioning(&mut self) -> Result<(), IoError> {
        let target_record = self.options.rec.or(self.options.pos);
        if let (Some(rec), Target::External { conn, .. }) = (target_record, &self.target) {
            let mut c = conn.lock();
            if c.record_has_pending_async(rec) {
                return Err(IoError::RecordBusy(rec));
            }
            c.seek_record(rec)?;
        }
        Ok(())
    }

    fn finish_transfer(&mut self, result: TResult<()>) -> bool {
        match result {
            Ok(()) => true,
            Err(halt) => {
                self.post_halt(halt);
                false
            }
        }
    }

    /// Record an error raised outside the safe engine (the ABI layer
    /// uses this for descriptor and pointer validation failures).
    pub fn post_error(&mut self, error: IoError) {
        self.condition.post_error(error);
    }

    fn post_halt(&mut self, halt: Halt) {
        match halt {
            Halt::Error(e) => self.condition.post_error(e),
            Halt::End => self.condition.post_end(),
            Halt::Eor => self.condition.post_eor(),
        }
    }

    fn next_edit(&mut self) -> TResult<DataEdit> {
        let mut cursor = self
            .cursor
            .take()
            .ok_or(IoError::FormatSyntax(0))?;
        let result = cursor.next_data_edit(self);
        self.cursor = Some(cursor);
        let edit = result?;
        // A slash edit may have run into end-of-file on input.
        if let Some(HaltKind::End) = self.pending_halt.take() {
            return Err(Halt::End);
        }
        Ok(edit)
    }

    // -----------------------------------------------------------------------
    // Output record assembly
    // -----------------------------------------------------------------------

    /// Place bytes at the current column, extending with blanks as
    /// needed (T edits may have moved the column backwards).
    fn put_bytes(&mut self, bytes: &[u8]) -> Result<(), IoError> {
        let end = self.col + bytes.len();
        if let Target::Internal(f) = &self.target {
            if end > f.record_len() {
                return Err(IoError::RecordOverflow);
            }
        }
        if self.record.len() < end {
            self.record.resize(end, b' ');
        }
        self.record[self.col..end].copy_from_slice(bytes);
        self.col = end;
        Ok(())
    }

    fn put_field(&mut self, bytes: &[u8]) -> Result<(), IoError> {
        self.put_bytes(bytes)?;
        self.transfer_bytes += bytes.len();
        Ok(())
    }

    /// Terminate the open output record.
    fn flush_record(&mut self) -> Result<(), IoError> {
        let content = std::mem::take(&mut self.record);
        self.col = 0;
        self.list_first = true;
        match &mut self.target {
            Target::External { conn, .. } => {
                let mut c = conn.lock();
                c.write(&content)?;
                c.end_record()
            }
            Target::Internal(f) => f.put_record(&content),
            Target::Unbound => Ok(()),
        }
    }

    /// List-directed value emission: one blank between values.
    fn list_emit(&mut self, text: &[u8]) -> Result<(), IoError> {
        if !self.list_first {
            self.put_bytes(b" ")?;
        }
        self.list_first = false;
        self.put_field(text)
    }

    // -----------------------------------------------------------------------
    // Input record handling
    // -----------------------------------------------------------------------

    fn advance_input_record(&mut self) -> TResult<()> {
        let next = match &mut self.target {
            Target::External { conn, .. } => conn.lock().read_record()?,
            Target::Internal(f) => f.take_record(),
            Target::Unbound => None,
        };
        match next {
            Some(r) => {
                self.in_record = Some(r);
                self.in_pos = 0;
                Ok(())
            }
            None => Err(Halt::End),
        }
    }

    fn ensure_input_record(&mut self) -> TResult<()> {
        if self.in_record.is_none() {
            self.advance_input_record()?;
        }
        Ok(())
    }

    /// Extract a fixed-width field for a formatted data edit.
    fn take_field(&mut self, width: usize) -> TResult<Vec<u8>> {
        self.ensure_input_record()?;
        let record = self.in_record.as_ref().expect("input record");
        let avail = record.len().saturating_sub(self.in_pos);
        if avail >= width {
            let field = record[self.in_pos..self.in_pos + width].to_vec();
            self.in_pos += width;
            self.transfer_bytes += width;
            return Ok(field);
        }
        let nonadvancing = self.options.advance == Advance::No;
        if self.options.pad == PadMode::Yes && !(nonadvancing && avail == 0) {
            let mut field = record[self.in_pos..].to_vec();
            self.in_pos = record.len();
            self.transfer_bytes += field.len();
            field.resize(width, b' ');
            return Ok(field);
        }
        if nonadvancing {
            return Err(Halt::Eor);
        }
        Err(Halt::Error(IoError::ShortRecord))
    }

    /// Raw bytes for unformatted input; the record must hold them all.
    fn take_raw(&mut self, len: usize) -> TResult<Vec<u8>> {
        self.ensure_input_record()?;
        let record = self.in_record.as_ref().expect("input record");
        let avail = record.len().saturating_sub(self.in_pos);
        if avail < len {
            return Err(Halt::Error(IoError::ShortRecord));
        }
        let bytes = record[self.in_pos..self.in_pos + len].to_vec();
        self.in_pos += len;
        self.transfer_bytes += len;
        Ok(bytes)
    }

    /// Next list-directed value token; None is a null value (the item
    /// stays unchanged).
    fn list_take(&mut self) -> TResult<Option<Vec<u8>>> {
        if let Some((left, value)) = self.pending_list.take() {
            if left > 1 {
                self.pending_list = Some((left - 1, value.clone()));
            }
            return Ok(value);
        }
        loop {
            self.ensure_input_record()?;
            let record = self.in_record.take().expect("input record");
            let mut scanner = std::mem::take(&mut self.scanner);
            let mut pos = self.in_pos;
            let step = scanner.scan(&record, &mut pos, self.modes.decimal);
            self.scanner = scanner;
            self.in_pos = pos;
            self.in_record = Some(record);
            match step? {
                ListScan::Item(repeat, value) => {
                    if repeat > 1 {
                        self.pending_list = Some((repeat - 1, value.clone()));
                    }
                    if let Some(v) = &value {
                        self.transfer_bytes += v.len();
                    }
                    return Ok(value);
                }
                ListScan::NeedRecord => {
                    self.advance_input_record()?;
                }
                ListScan::Done => return Ok(None),
            }
        }
    }

    // -----------------------------------------------------------------------
    // Namelist plumbing
    // -----------------------------------------------------------------------

    fn namelist_header(&mut self) -> Result<(), IoError> {
        let name = self
            .group
            .as_ref()
            .map(|g| g.name.to_lowercase())
            .unwrap_or_default();
        self.put_bytes(b"&")?;
        self.put_bytes(name.as_bytes())
    }

    /// Open the next group item explicitly (array transfers): the
    /// following scalar transfer calls supply that item's values
    /// until `namelist_close_item`. Output emits " name="; input
    /// selects which parsed values the next takes come from.
    pub fn namelist_open_item(&mut self) -> bool {
        if !self.start_transfer() {
            return false;
        }
        let result = self.namelist_next_item_inner();
        let ok = self.finish_transfer(result);
        self.nl_in_item = ok;
        ok
    }

    /// Close an explicitly opened item.
    pub fn namelist_close_item(&mut self) {
        self.nl_in_item = false;
    }

    fn namelist_next_item_inner(&mut self) -> TResult<()> {
        let (name, count) = match self.group.as_ref() {
            Some(g) => (
                g.items.get(self.nl_item).map(|s| s.to_lowercase()),
                g.items.len(),
            ),
            None => (None, 0),
        };
        let Some(name) = name else {
            return Err(Halt::Error(IoError::NamelistSyntax(format!(
                "more transfers than the group's {count} items"
            ))));
        };
        self.nl_item += 1;
        if self.direction == Direction::Output {
            self.put_bytes(b" ")?;
            self.put_bytes(name.as_bytes())?;
            self.put_bytes(b"=")?;
        } else {
            self.namelist_load()?;
        }
        self.nl_current = Some(name);
        Ok(())
    }

    /// Read records until the terminating slash and parse the group.
    fn namelist_load(&mut self) -> TResult<()> {
        if self.nl_values.is_some() {
            return Ok(());
        }
        let group = self
            .group
            .clone()
            .ok_or_else(|| IoError::NamelistSyntax("no group metadata".into()))?;
        let mut text = Vec::new();
        loop {
            self.advance_input_record()?;
            let record = self.in_record.take().expect("input record");
            text.extend_from_slice(&record);
            text.push(b' ');
            if let Some(amp) = text.iter().position(|b| *b == b'&') {
                if text[amp..].iter().any(|b| *b == b'/') {
                    break;
                }
            }
        }
        self.nl_values = Some(crate::namelist::parse_input(&text, &group)?);
        Ok(())
    }

    /// Next input value for the current namelist item.
    fn namelist_take(&mut self) -> TResult<Option<Vec<u8>>> {
        let name = self
            .nl_current
            .clone()
            .ok_or_else(|| IoError::NamelistSyntax("value taken before item".into()))?;
        let value = self
            .nl_values
            .as_mut()
            .and_then(|v| v.get_mut(&name))
            .and_then(|q| q.pop_front())
            .unwrap_or(None);
        if let Some(v) = &value {
            self.transfer_bytes += v.len();
        }
        Ok(value)
    }

    /// Emit one value of the current namelist output item.
    fn namelist_emit(&mut self, text: &[u8]) -> Result<(), IoError> {
        // Values after the first within one item are blank separated.
        if self.nl_current.is_none() {
            return Err(IoError::NamelistSyntax("value before item".into()));
        }
        if self.record.last() != Some(&b'=') {
            self.put_bytes(b" ")?;
        }
        self.put_field(text)
    }

    fn namelist_scalar_emit(&mut self, text: &[u8]) -> TResult<()> {
        if !self.nl_in_item {
            self.namelist_next_item_inner()?;
        }
        self.namelist_emit(text)?;
        Ok(())
    }

    fn namelist_scalar_take(&mut self) -> TResult<Option<Vec<u8>>> {
        if !self.nl_in_item {
            self.namelist_next_item_inner()?;
        }
        self.namelist_take()
    }

    // -----------------------------------------------------------------------
    // Output transfers
    // -----------------------------------------------------------------------

    pub fn output_integer(&mut self, value: i64) -> bool {
        if !self.start_transfer() {
            return false;
        }
        let result = match self.mode {
            Mode::ListDirected => self.list_emit(&list::render_integer(value)).map_err(Halt::from),
            Mode::Namelist => self.namelist_scalar_emit(&list::render_integer(value)),
            Mode::Unformatted => self.put_field(&value.to_le_bytes()).map_err(Halt::from),
            Mode::Formatted => self.formatted_output_integer(value),
        };
        self.finish_transfer(result)
    }

    fn formatted_output_integer(&mut self, value: i64) -> TResult<()> {
        let edit = self.next_edit()?;
        let field = match edit {
            DataEdit::Integer {
                width,
                min_digits,
                base,
            } => output::edit_integer(value, width, min_digits, base, &self.modes),
            DataEdit::Real {
                width,
                form: RealForm::G,
                ..
            } => output::edit_integer(value, width, 0, IntBase::Decimal, &self.modes),
            _ => return Err(Halt::Error(IoError::FormatItemMismatch)),
        };
        self.put_field(&field)?;
        Ok(())
    }

    pub fn output_real32(&mut self, value: f32) -> bool {
        if !self.start_transfer() {
            return false;
        }
        let result = match self.mode {
            Mode::Unformatted => self.put_field(&value.to_le_bytes()).map_err(Halt::from),
            _ => self.output_real_common(value as f64),
        };
        self.finish_transfer(result)
    }

    pub fn output_real64(&mut self, value: f64) -> bool {
        if !self.start_transfer() {
            return false;
        }
        let result = match self.mode {
            Mode::Unformatted => self.put_field(&value.to_le_bytes()).map_err(Halt::from),
            _ => self.output_real_common(value),
        };
        self.finish_transfer(result)
    }

    fn output_real_common(&mut self, value: f64) -> TResult<()> {
        match self.mode {
            Mode::ListDirected => {
                let text = list::render_real(value, self.modes.decimal);
                self.list_emit(&text)?;
                Ok(())
            }
            Mode::Namelist => {
                let text = list::render_real(value, self.modes.decimal);
                self.namelist_scalar_emit(&text)
            }
            Mode::Formatted => {
                let field = self.real_field(value)?;
                self.put_field(&field)?;
                Ok(())
            }
            Mode::Unformatted => unreachable!("raw path handled by caller"),
        }
    }

    fn real_field(&mut self, value: f64) -> TResult<Vec<u8>> {
        let edit = self.next_edit()?;
        match edit {
            DataEdit::Real {
                width,
                frac,
                exponent,
                form,
            } => Ok(output::edit_real(value, width, frac, exponent, form, &self.modes)),
            _ => Err(Halt::Error(IoError::FormatItemMismatch)),
        }
    }

    pub fn output_complex32(&mut self, re: f32, im: f32) -> bool {
        self.output_complex_common(re as f64, im as f64, true)
    }

    pub fn output_complex64(&mut self, re: f64, im: f64) -> bool {
        self.output_complex_common(re, im, false)
    }

    fn output_complex_common(&mut self, re: f64, im: f64, narrow: bool) -> bool {
        if !self.start_transfer() {
            return false;
        }
        let result: TResult<()> = (|| {
            match self.mode {
                Mode::ListDirected => {
                    let text = list::render_complex(re, im, self.modes.decimal);
                    self.list_emit(&text)?;
                }
                Mode::Namelist => {
                    let text = list::render_complex(re, im, self.modes.decimal);
                    self.namelist_scalar_emit(&text)?;
                }
                Mode::Unformatted => {
                    if narrow {
                        self.put_field(&(re as f32).to_le_bytes())?;
                        self.put_field(&(im as f32).to_le_bytes())?;
                    } else {
                        self.put_field(&re.to_le_bytes())?;
                        self.put_field(&im.to_le_bytes())?;
                    }
                }
                Mode::Formatted => {
                    // A complex item consumes two real data edits.
                    let re_field = self.real_field(re)?;
                    self.put_field(&re_field)?;
                    let im_field = self.real_field(im)?;
                    self.put_field(&im_field)?;
                }
            }
            Ok(())
        })();
        self.finish_transfer(result)
    }

    pub fn output_logical(&mut self, value: bool) -> bool {
        if !self.start_transfer() {
            return false;
        }
        let result: TResult<()> = (|| {
            match self.mode {
                Mode::ListDirected => self.list_emit(&list::render_logical(value))?,
                Mode::Namelist => self.namelist_scalar_emit(&list::render_logical(value))?,
                Mode::Unformatted => self.put_field(&(value as i32).to_le_bytes())?,
                Mode::Formatted => {
                    let edit = self.next_edit()?;
                    let field = match edit {
                        DataEdit::Logical { width } => output::edit_logical(value, width),
                        DataEdit::Real {
                            width,
                            form: RealForm::G,
                            ..
                        } => output::edit_logical(value, width),
                        _ => return Err(Halt::Error(IoError::FormatItemMismatch)),
                    };
                    self.put_field(&field)?;
                }
            }
            Ok(())
        })();
        self.finish_transfer(result)
    }

    pub fn output_character(&mut self, value: &[u8]) -> bool {
        if !self.start_transfer() {
            return false;
        }
        let result: TResult<()> = (|| {
            match self.mode {
                Mode::ListDirected => {
                    let text = list::render_character(value, self.options.delim);
                    self.list_emit(&text)?;
                }
                Mode::Namelist => {
                    let text = list::render_character(value, self.options.delim);
                    self.namelist_scalar_emit(&text)?;
                }
                Mode::Unformatted => self.put_field(value)?,
                Mode::Formatted => {
                    let edit = self.next_edit()?;
                    let field = match edit {
                        DataEdit::Character { width } => output::edit_character(value, width),
                        _ => return Err(Halt::Error(IoError::FormatItemMismatch)),
                    };
                    self.put_field(&field)?;
                }
            }
            Ok(())
        })();
        self.finish_transfer(result)
    }

    /// Raw contiguous block for unformatted statements.
    pub fn output_block(&mut self, bytes: &[u8]) -> bool {
        if !self.start_transfer() {
            return false;
        }
        if self.mode != Mode::Unformatted {
            self.condition.post_error(IoError::FormatItemMismatch);
            return false;
        }
        let result = self.put_field(bytes).map_err(Halt::from);
        self.finish_transfer(result)
    }

    // -----------------------------------------------------------------------
    // Input transfers
    // -----------------------------------------------------------------------

    pub fn input_integer(&mut self, value: &mut i64) -> bool {
        if !self.start_transfer() {
            return false;
        }
        let result: TResult<()> = (|| {
            match self.mode {
                Mode::ListDirected => {
                    if let Some(token) = self.list_take()? {
                        *value = list::token_to_integer(&token)?;
                    }
                }
                Mode::Namelist => {
                    if let Some(token) = self.namelist_scalar_take()? {
                        *value = list::token_to_integer(&token)?;
                    }
                }
                Mode::Unformatted => {
                    let bytes = self.take_raw(8)?;
                    *value = i64::from_le_bytes(bytes.try_into().expect("8 bytes"));
                }
                Mode::Formatted => {
                    let edit = self.next_edit()?;
                    match edit {
                        DataEdit::Integer { width, base, .. } => {
                            let field = self.take_field(width as usize)?;
                            *value = input::parse_integer(&field, base, &self.modes)?;
                        }
                        DataEdit::Real {
                            width,
                            form: RealForm::G,
                            ..
                        } => {
                            let field = self.take_field(width as usize)?;
                            *value = input::parse_integer(&field, IntBase::Decimal, &self.modes)?;
                        }
                        _ => return Err(Halt::Error(IoError::FormatItemMismatch)),
                    }
                }
            }
            Ok(())
        })();
        self.finish_transfer(result)
    }

    pub fn input_real32(&mut self, value: &mut f32) -> bool {
        if !self.start_transfer() {
            return false;
        }
        let result: TResult<()> = (|| {
            if self.mode == Mode::Unformatted {
                let bytes = self.take_raw(4)?;
                *value = f32::from_le_bytes(bytes.try_into().expect("4 bytes"));
                return Ok(());
            }
            let mut wide = *value as f64;
            self.input_real_common(&mut wide)?;
            *value = wide as f32;
            Ok(())
        })();
        self.finish_transfer(result)
    }

    pub fn input_real64(&mut self, value: &mut f64) -> bool {
        if !self.start_transfer() {
            return false;
        }
        let result: TResult<()> = (|| {
            if self.mode == Mode::Unformatted {
                let bytes = self.take_raw(8)?;
                *value = f64::from_le_bytes(bytes.try_into().expect("8 bytes"));
                return Ok(());
            }
            self.input_real_common(value)
        })();
        self.finish_transfer(result)
    }

    fn input_real_common(&mut self, value: &mut f64) -> TResult<()> {
        match self.mode {
            Mode::ListDirected => {
                if let Some(token) = self.list_take()? {
                    *value = list::token_to_real(&token, self.modes.decimal)?;
                }
            }
            Mode::Namelist => {
                if let Some(token) = self.namelist_scalar_take()? {
                    *value = list::token_to_real(&token, self.modes.decimal)?;
                }
            }
            Mode::Formatted => {
                let edit = self.next_edit()?;
                match edit {
                    DataEdit::Real { width, frac, .. } => {
                        let field = self.take_field(width as usize)?;
                        *value = input::parse_real(&field, frac, &self.modes)?;
                    }
                    _ => return Err(Halt::Error(IoError::FormatItemMismatch)),
                }
            }
            Mode::Unformatted => unreachable!("raw path handled by caller"),
        }
        Ok(())
    }

    pub fn input_complex64(&mut self, re: &mut f64, im: &mut f64) -> bool {
        if !self.start_transfer() {
            return false;
        }
        let result: TResult<()> = (|| {
            match self.mode {
                Mode::ListDirected => {
                    if let Some(token) = self.list_take()? {
                        let (r, i) = list::token_to_complex(&token, self.modes.decimal)?;
                        *re = r;
                        *im = i;
                    }
                }
                Mode::Namelist => {
                    if let Some(token) = self.namelist_scalar_take()? {
                        let (r, i) = list::token_to_complex(&token, self.modes.decimal)?;
                        *re = r;
                        *im = i;
                    }
                }
                Mode::Unformatted => {
                    let bytes = self.take_raw(16)?;
                    *re = f64::from_le_bytes(bytes[..8].try_into().expect("8 bytes"));
                    *im = f64::from_le_bytes(bytes[8..].try_into().expect("8 bytes"));
                }
                Mode::Formatted => {
                    *re = self.formatted_input_real()?;
                    *im = self.formatted_input_real()?;
                }
            }
            Ok(())
        })();
        self.finish_transfer(result)
    }

    pub fn input_complex32(&mut self, re: &mut f32, im: &mut f32) -> bool {
        if !self.start_transfer() {
            return false;
        }
        let result: TResult<()> = (|| {
            if self.mode == Mode::Unformatted {
                let bytes = self.take_raw(8)?;
                *re = f32::from_le_bytes(bytes[..4].try_into().expect("4 bytes"));
                *im = f32::from_le_bytes(bytes[4..].try_into().expect("4 bytes"));
                return Ok(());
            }
            let (mut r, mut i) = (*re as f64, *im as f64);
            match self.mode {
                Mode::ListDirected => {
                    if let Some(token) = self.list_take()? {
                        (r, i) = list::token_to_complex(&token, self.modes.decimal)?;
                    }
                }
                Mode::Namelist => {
                    if let Some(token) = self.namelist_scalar_take()? {
                        (r, i) = list::token_to_complex(&token, self.modes.decimal)?;
                    }
                }
                Mode::Formatted => {
                    r = self.formatted_input_real()?;
                    i = self.formatted_input_real()?;
                }
                Mode::Unformatted => unreachable!(),
            }
            *re = r as f32;
            *im = i as f32;
            Ok(())
        })();
        self.finish_transfer(result)
    }

    fn formatted_input_real(&mut self) -> TResult<f64> {
        let edit = self.next_edit()?;
        match edit {
            DataEdit::Real { width, frac, .. } => {
                let field = self.take_field(width as usize)?;
                Ok(input::parse_real(&field, frac, &self.modes)?)
            }
            _ => Err(Halt::Error(IoError::FormatItemMismatch)),
        }
    }

    pub fn input_logical(&mut self, value: &mut bool) -> bool {
        if !self.start_transfer() {
            return false;
        }
        let result: TResult<()> = (|| {
            match self.mode {
                Mode::ListDirected => {
                    if let Some(token) = self.list_take()? {
                        *value = list::token_to_logical(&token)?;
                    }
                }
                Mode::Namelist => {
                    if let Some(token) = self.namelist_scalar_take()? {
                        *value = list::token_to_logical(&token)?;
                    }
                }
                Mode::Unformatted => {
                    let bytes = self.take_raw(4)?;
                    *value = i32::from_le_bytes(bytes.try_into().expect("4 bytes")) != 0;
                }
                Mode::Formatted => {
                    let edit = self.next_edit()?;
                    match edit {
                        DataEdit::Logical { width }
                        | DataEdit::Real {
                            width,
                            form: RealForm::G,
                            ..
                        } => {
                            let field = self.take_field(width as usize)?;
                            *value = input::parse_logical(&field)?;
                        }
                        _ => return Err(Halt::Error(IoError::FormatItemMismatch)),
                    }
                }
            }
            Ok(())
        })();
        self.finish_transfer(result)
    }

    pub fn input_character(&mut self, value: &mut [u8]) -> bool {
        if !self.start_transfer() {
            return false;
        }
        let result: TResult<()> = (|| {
            match self.mode {
                Mode::ListDirected => {
                    if let Some(token) = self.list_take()? {
                        let fitted = input::parse_character(&token, value.len());
                        value.copy_from_slice(&fitted);
                    }
                }
                Mode::Namelist => {
                    if let Some(token) = self.namelist_scalar_take()? {
                        let fitted = input::parse_character(&token, value.len());
                        value.copy_from_slice(&fitted);
                    }
                }
                Mode::Unformatted => {
                    let bytes = self.take_raw(value.len())?;
                    value.copy_from_slice(&bytes);
                }
                Mode::Formatted => {
                    let edit = self.next_edit()?;
                    match edit {
                        DataEdit::Character { width } => {
                            let w = width.map(|w| w as usize).unwrap_or(value.len());
                            let field = self.take_field(w)?;
                            let fitted = input::parse_character(&field, value.len());
                            value.copy_from_slice(&fitted);
                        }
                        _ => return Err(Halt::Error(IoError::FormatItemMismatch)),
                    }
                }
            }
            Ok(())
        })();
        self.finish_transfer(result)
    }

    /// Raw contiguous block for unformatted statements.
    pub fn input_block(&mut self, buffer: &mut [u8]) -> bool {
        if !self.start_transfer() {
            return false;
        }
        if self.mode != Mode::Unformatted {
            self.condition.post_error(IoError::FormatItemMismatch);
            return false;
        }
        let result: TResult<()> = (|| {
            let bytes = self.take_raw(buffer.len())?;
            buffer.copy_from_slice(&bytes);
            Ok(())
        })();
        self.finish_transfer(result)
    }

    // -----------------------------------------------------------------------
    // Inquiries
    // -----------------------------------------------------------------------

    pub fn iostat(&mut self) -> i32 {
        self.condition.iostat()
    }

    pub fn iomsg(&mut self) -> String {
        self.condition.message()
    }

    pub fn status_text(&mut self) -> &'static str {
        self.condition.status_text()
    }

    pub fn size(&mut self) -> usize {
        self.condition.mark_inspected();
        self.transfer_bytes
    }

    pub fn is_end(&mut self) -> bool {
        self.condition.is_end()
    }

    pub fn is_err(&mut self) -> bool {
        self.condition.is_err()
    }

    pub fn is_eor(&mut self) -> bool {
        self.condition.is_eor()
    }

    // -----------------------------------------------------------------------
    // End
    // -----------------------------------------------------------------------

    /// Finalize the statement.
    ///
    /// A non-Normal condition that was never inspected is a caller
    /// defect (the compiled code lacked the END=/ERR=/EOR=/IOSTAT=
    /// handling the condition demanded); the caller escalates it to
    /// the fatal diagnostic path.
    pub fn end(mut self) -> Result<EndSummary, UnhandledCondition> {
        if self.condition.classification() != Classification::Normal
            && !self.condition.inspected()
        {
            return Err(UnhandledCondition {
                iostat: self.condition.iostat(),
                message: self.condition.message(),
            });
        }

        if self.condition.ok() && self.direction == Direction::Output {
            if let Err(e) = self.finalize_output() {
                self.condition.post_error(e);
                self.condition.mark_inspected();
            }
        }

        let iostat = self.condition.iostat();
        let internal = match (self.direction, self.target) {
            (Direction::Output, Target::Internal(f)) => Some(f),
            _ => None,
        };
        Ok(EndSummary { iostat, internal })
    }

    fn finalize_output(&mut self) -> Result<(), IoError> {
        // A statement with no items still executes: the format runs to
        // its first data edit, a namelist still writes its frame, and
        // an advancing statement still terminates its record.
        self.start_transfer();
        if !self.condition.ok() {
            return Ok(());
        }
        if self.mode == Mode::Formatted {
            let mut cursor = self.cursor.take().ok_or(IoError::FormatSyntax(0))?;
            let result = cursor.finish(self);
            self.cursor = Some(cursor);
            result?;
        }
        if self.mode == Mode::Namelist {
            self.put_bytes(b" /")?;
        }
        if self.options.advance == Advance::Yes {
            self.flush_record()
        } else {
            // Nonadvancing: leave the record open on the device.
            let content = std::mem::take(&mut self.record);
            self.col = 0;
            match &mut self.target {
                Target::External { conn, .. } => conn.lock().write(&content),
                Target::Internal(f) => f.put_record(&content),
                Target::Unbound => Ok(()),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Control edit side effects
// ---------------------------------------------------------------------------

impl ControlSink for IoStatement {
    fn literal(&mut self, text: &[u8]) -> Result<(), IoError> {
        match self.direction {
            Direction::Output => self.put_bytes(text),
            // Literal edits are output-only; on input they skip their
            // width, which is how column alignment uses them.
            Direction::Input => {
                self.in_pos += text.len();
                Ok(())
            }
        }
    }

    fn end_record(&mut self) -> Result<(), IoError> {
        match self.direction {
            Direction::Output => self.flush_record(),
            Direction::Input => {
                match self.advance_input_record() {
                    Ok(()) => Ok(()),
                    Err(Halt::End) => {
                        self.pending_halt = Some(HaltKind::End);
                        Ok(())
                    }
                    Err(Halt::Eor) => Ok(()),
                    Err(Halt::Error(e)) => Err(e),
                }
            }
        }
    }

    fn column(&mut self, col: u32) -> Result<(), IoError> {
        let target = (col.max(1) - 1) as usize;
        match self.direction {
            Direction::Output => self.col = target,
            Direction::Input => self.in_pos = target,
        }
        Ok(())
    }

    fn relative(&mut self, delta: i32) -> Result<(), IoError> {
        match self.direction {
            Direction::Output => {
                self.col = add_clamped(self.col, delta);
                // nX past the current end pads with blanks on emit.
            }
            Direction::Input => self.in_pos = add_clamped(self.in_pos, delta),
        }
        Ok(())
    }

    fn scale(&mut self, k: i32) {
        self.modes.scale = k;
    }

    fn sign(&mut self, mode: crate::options::SignMode) {
        self.modes.sign = mode;
    }

    fn blank(&mut self, mode: crate::options::BlankMode) {
        self.modes.blank = mode;
    }

    fn decimal(&mut self, mode: crate::options::DecimalMode) {
        self.modes.decimal = mode;
    }

    fn round(&mut self, mode: crate::options::RoundMode) {
        self.modes.round = mode;
    }
}

fn add_clamped(base: usize, delta: i32) -> usize {
    if delta >= 0 {
        base.saturating_add(delta as usize)
    } else {
        base.saturating_sub(delta.unsigned_abs() as usize)
    }
}
