//! Statement condition reporting.
//!
//! Each statement carries exactly one condition: a classification, a
//! numeric status code, and a lazily rendered message. Inquiry calls
//! mark the condition inspected; the End call refuses to let an
//! uninspected non-Normal condition pass silently.
//!
//! Once the condition leaves Normal, data-edit consumption halts for
//! the rest of the statement: transfer calls become no-ops returning
//! false. The first non-Normal transition wins; later errors do not
//! overwrite it.

use crate::iostat::{self, IoError};

/// Outcome classification of a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Normal,
    EndOfFile,
    EndOfRecord,
    Error,
}

/// Condition state owned by one statement.
#[derive(Debug, Clone)]
pub struct Condition {
    class: Classification,
    error: Option<IoError>,
    inspected: bool,
}

impl Default for Condition {
    fn default() -> Self {
        Self {
            class: Classification::Normal,
            error: None,
            inspected: false,
        }
    }
}

impl Condition {
    /// True while the statement may keep transferring items.
    pub fn ok(&self) -> bool {
        self.class == Classification::Normal
    }

    /// Current classification without marking the condition inspected.
    pub fn classification(&self) -> Classification {
        self.class
    }

    /// Record an error. The first non-Normal transition is kept.
    pub fn post_error(&mut self, error: IoError) {
        if self.class == Classification::Normal {
            self.class = Classification::Error;
            self.error = Some(error);
        }
    }

    /// Record end-of-file.
    pub fn post_end(&mut self) {
        if self.class == Classification::Normal {
            self.class = Classification::EndOfFile;
        }
    }

    /// Record end-of-record (nonadvancing input stopped at a boundary).
    pub fn post_eor(&mut self) {
        if self.class == Classification::Normal {
            self.class = Classification::EndOfRecord;
        }
    }

    /// Whether any inquiry has observed this condition.
    pub fn inspected(&self) -> bool {
        self.inspected
    }

    /// Mark the condition inspected (inquiries that do not read the
    /// classification itself, like GetSIZE, still count).
    pub fn mark_inspected(&mut self) {
        self.inspected = true;
    }

    // -----------------------------------------------------------------------
    // Inquiries. Each marks the condition inspected and is otherwise
    // side-effect-free and idempotent.
    // -----------------------------------------------------------------------

    /// Numeric IOSTAT value.
    pub fn iostat(&mut self) -> i32 {
        self.inspected = true;
        match self.class {
            Classification::Normal => iostat::IOSTAT_OK,
            Classification::EndOfFile => iostat::IOSTAT_END,
            Classification::EndOfRecord => iostat::IOSTAT_EOR,
            Classification::Error => self
                .error
                .as_ref()
                .map(IoError::iostat)
                .unwrap_or(iostat::IOSTAT_CONVERSION),
        }
    }

    /// IOMSG text. Rendered on demand; empty for a Normal condition.
    pub fn message(&mut self) -> String {
        self.inspected = true;
        match self.class {
            Classification::Normal => String::new(),
            Classification::EndOfFile => "end of file".into(),
            Classification::EndOfRecord => "end of record".into(),
            Classification::Error => self
                .error
                .as_ref()
                .map(|e| e.to_string())
                .unwrap_or_else(|| "I/O error".into()),
        }
    }

    /// Short status keyword for the classification.
    pub fn status_text(&mut self) -> &'static str {
        self.inspected = true;
        match self.class {
            Classification::Normal => "OK",
            Classification::EndOfFile => "END",
            Classification::EndOfRecord => "EOR",
            Classification::Error => "ERROR",
        }
    }

    /// END= predicate.
    pub fn is_end(&mut self) -> bool {
        self.inspected = true;
        self.class == Classification::EndOfFile
    }

    /// ERR= predicate.
    pub fn is_err(&mut self) -> bool {
        self.inspected = true;
        self.class == Classification::Error
    }

    /// EOR= predicate.
    pub fn is_eor(&mut self) -> bool {
        self.inspected = true;
        self.class == Classification::EndOfRecord
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normal_needs_no_inspection() {
        let c = Condition::default();
        assert!(c.ok());
        assert!(!c.inspected());
    }

    #[test]
    fn test_first_error_wins() {
        let mut c = Condition::default();
        c.post_error(IoError::OptionAfterTransfer);
        c.post_error(IoError::FormatNoDataEdits);
        assert_eq!(c.iostat(), iostat::IOSTAT_OPTION_AFTER_TRANSFER);
    }

    #[test]
    fn test_end_does_not_replace_error() {
        let mut c = Condition::default();
        c.post_error(IoError::DirectionMismatch);
        c.post_end();
        assert!(c.is_err());
        assert!(!c.is_end());
    }

    #[test]
    fn test_inquiry_marks_inspected_and_is_idempotent() {
        let mut c = Condition::default();
        c.post_end();
        assert!(!c.inspected());
        assert_eq!(c.iostat(), iostat::IOSTAT_END);
        assert!(c.inspected());
        assert_eq!(c.iostat(), iostat::IOSTAT_END);
        assert!(c.is_end());
        assert!(!c.is_eor());
    }

    #[test]
    fn test_message_is_lazy_and_descriptive() {
        let mut c = Condition::default();
        c.post_error(IoError::UnitNotConnected(9));
        assert_eq!(c.message(), "unit 9 is not connected");
        assert_eq!(c.status_text(), "ERROR");
    }

    #[test]
    fn test_eor_classification() {
        let mut c = Condition::default();
        c.post_eor();
        assert_eq!(c.iostat(), iostat::IOSTAT_EOR);
        assert!(c.is_eor());
        assert_eq!(c.message(), "end of record");
    }
}
