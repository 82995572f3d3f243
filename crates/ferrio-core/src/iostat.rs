//! Status code definitions.
//!
//! Every statement finishes with an IOSTAT value: 0 for success, -1 for
//! end-of-file, -2 for end-of-record, and a positive code for errors.
//! The positive codes are stable across releases; condition-handling in
//! generated code compares against them directly.

use thiserror::Error;

/// Successful completion.
pub const IOSTAT_OK: i32 = 0;
/// An input statement ran out of records.
pub const IOSTAT_END: i32 = -1;
/// A nonadvancing read stopped at a record boundary before satisfying
/// all requested items.
pub const IOSTAT_EOR: i32 = -2;

pub const IOSTAT_INVALID_OPTION: i32 = 101;
pub const IOSTAT_OPTION_AFTER_TRANSFER: i32 = 102;
pub const IOSTAT_UNIT_NOT_CONNECTED: i32 = 103;
pub const IOSTAT_DIRECTION_MISMATCH: i32 = 104;
pub const IOSTAT_BAD_INTERNAL_TARGET: i32 = 105;
pub const IOSTAT_FORMAT_SYNTAX: i32 = 201;
pub const IOSTAT_FORMAT_NESTING: i32 = 202;
pub const IOSTAT_FORMAT_NO_DATA_EDITS: i32 = 203;
pub const IOSTAT_FORMAT_ITEM_MISMATCH: i32 = 204;
pub const IOSTAT_RECORD_OVERFLOW: i32 = 301;
pub const IOSTAT_CONVERSION: i32 = 302;
pub const IOSTAT_BAD_RECORD_NUMBER: i32 = 303;
pub const IOSTAT_NAMELIST_SYNTAX: i32 = 304;
pub const IOSTAT_SHORT_RECORD: i32 = 305;
pub const IOSTAT_DEVICE_FAILURE: i32 = 306;
pub const IOSTAT_ASYNC_NOT_DIRECT: i32 = 401;
pub const IOSTAT_ASYNC_ID_INVALID: i32 = 402;
pub const IOSTAT_UNIT_BUSY: i32 = 403;
pub const IOSTAT_RECORD_BUSY: i32 = 404;

/// Error conditions a statement can accumulate.
///
/// The Display text is the IOMSG message for the condition; it is only
/// rendered when an inquiry asks for it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IoError {
    #[error("invalid {keyword}= value '{value}'")]
    InvalidOptionValue { keyword: &'static str, value: String },
    #[error("control-list option set after data transfer began")]
    OptionAfterTransfer,
    #[error("unit {0} is not connected")]
    UnitNotConnected(i32),
    #[error("data transfer direction is incompatible with the unit")]
    DirectionMismatch,
    #[error("internal target is null or malformed")]
    BadInternalTarget,
    #[error("format syntax error at offset {0}")]
    FormatSyntax(usize),
    #[error("format group nesting exceeds the available interpreter stack")]
    FormatNestingOverflow,
    #[error("format contains no data edit descriptors")]
    FormatNoDataEdits,
    #[error("data edit descriptor does not match the transferred item type")]
    FormatItemMismatch,
    #[error("output exceeds the record length")]
    RecordOverflow,
    #[error("invalid input field '{0}'")]
    Conversion(String),
    #[error("record number {0} is not positive or unit is not direct access")]
    BadRecordNumber(i64),
    #[error("namelist input syntax error: {0}")]
    NamelistSyntax(String),
    #[error("input record ends before the data edit field")]
    ShortRecord,
    #[error("device transfer failed (errno {0})")]
    DeviceFailure(i32),
    #[error("asynchronous transfer requires an unformatted direct-access unit")]
    AsyncNotDirect,
    #[error("no outstanding asynchronous transfer with id {0}")]
    AsyncIdInvalid(i32),
    #[error("unit {0} has unwaited asynchronous transfers outstanding")]
    UnitBusy(i32),
    #[error("record {0} has an unwaited asynchronous transfer outstanding")]
    RecordBusy(i64),
}

impl IoError {
    /// The stable IOSTAT code for this error.
    pub fn iostat(&self) -> i32 {
        match self {
            IoError::InvalidOptionValue { .. } => IOSTAT_INVALID_OPTION,
            IoError::OptionAfterTransfer => IOSTAT_OPTION_AFTER_TRANSFER,
            IoError::UnitNotConnected(_) => IOSTAT_UNIT_NOT_CONNECTED,
            IoError::DirectionMismatch => IOSTAT_DIRECTION_MISMATCH,
            IoError::BadInternalTarget => IOSTAT_BAD_INTERNAL_TARGET,
            IoError::FormatSyntax(_) => IOSTAT_FORMAT_SYNTAX,
            IoError::FormatNestingOverflow => IOSTAT_FORMAT_NESTING,
            IoError::FormatNoDataEdits => IOSTAT_FORMAT_NO_DATA_EDITS,
            IoError::FormatItemMismatch => IOSTAT_FORMAT_ITEM_MISMATCH,
            IoError::RecordOverflow => IOSTAT_RECORD_OVERFLOW,
            IoError::Conversion(_) => IOSTAT_CONVERSION,
            IoError::BadRecordNumber(_) => IOSTAT_BAD_RECORD_NUMBER,
            IoError::NamelistSyntax(_) => IOSTAT_NAMELIST_SYNTAX,
            IoError::ShortRecord => IOSTAT_SHORT_RECORD,
            IoError::DeviceFailure(_) => IOSTAT_DEVICE_FAILURE,
            IoError::AsyncNotDirect => IOSTAT_ASYNC_NOT_DIRECT,
            IoError::AsyncIdInvalid(_) => IOSTAT_ASYNC_ID_INVALID,
            IoError::UnitBusy(_) => IOSTAT_UNIT_BUSY,
            IoError::RecordBusy(_) => IOSTAT_RECORD_BUSY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(IoError::OptionAfterTransfer.iostat(), 102);
        assert_eq!(IoError::FormatNoDataEdits.iostat(), 203);
        assert_eq!(IoError::AsyncIdInvalid(3).iostat(), 402);
    }

    #[test]
    fn test_message_names_the_keyword() {
        let e = IoError::InvalidOptionValue {
            keyword: "SIGN",
            value: "MAYBE".into(),
        };
        assert_eq!(e.to_string(), "invalid SIGN= value 'MAYBE'");
    }

    #[test]
    fn test_end_and_eor_are_negative() {
        assert!(IOSTAT_END < 0);
        assert!(IOSTAT_EOR < 0);
        assert_ne!(IOSTAT_END, IOSTAT_EOR);
    }
}
