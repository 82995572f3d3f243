//! # ferrio-core
//!
//! Safe Rust engine for the data transfer statements of a compiled
//! language (READ, WRITE, PRINT). The ABI crate layers the extern "C"
//! entry points generated code calls over the types here; everything
//! raw-pointer-shaped stays on that side of the boundary.
//!
//! A statement is driven incrementally: begin, zero or more option
//! setters, one or more typed transfers, inquiries, end. See
//! [`statement::IoStatement`] for the state machine and
//! [`format::FormatCursor`] for format interpretation.

#![deny(unsafe_code)]

pub mod async_io;
pub mod condition;
pub mod descriptor;
pub mod format;
pub mod internal;
pub mod iostat;
pub mod list;
pub mod namelist;
pub mod options;
pub mod statement;
pub mod unit;

pub use condition::{Classification, Condition};
pub use internal::InternalFile;
pub use iostat::IoError;
pub use namelist::NamelistGroup;
pub use statement::{Direction, EndSummary, IoStatement, Locus, Mode, UnhandledCondition};
