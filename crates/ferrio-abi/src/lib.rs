// All extern "C" ABI exports accept raw pointers from generated code;
// the entry points validate what they can and capture the rest on the
// statement condition, so per-function safety docs would be redundant
// boilerplate.
#![allow(clippy::missing_safety_doc)]
//! # ferrio-abi
//!
//! ABI-compatible extern "C" boundary for the ferrio I/O runtime.
//!
//! This crate produces the runtime library compiled code links against.
//! Each data transfer statement is lowered by the compiler into a call
//! sequence over an opaque cookie:
//!
//! ```text
//! PRINT *, 666
//!   ->  let cookie = FerrioBeginExternalListOutput(FERRIO_DEFAULT_UNIT);
//!       FerrioOutputInteger64(cookie, 666);
//!       FerrioEndIOStatement(cookie, ptr::null(), 0);
//! ```
//!
//! # Architecture
//!
//! ```text
//! generated code -> ABI entry (this crate) -> safe engine (ferrio-core) -> device
//! ```
//!
//! The cookie registry maps opaque handles to live statement state;
//! raw pointer access (internal buffers, descriptors, IOMSG copies)
//! happens here, never in ferrio-core.

pub mod cookie;
pub mod crash;
pub mod device;
pub mod util;

pub mod async_abi;
pub mod begin_abi;
pub mod inquiry_abi;
pub mod option_abi;
pub mod transfer_abi;

/// READ(*) / WRITE(*) / PRINT with no explicit unit.
pub const FERRIO_DEFAULT_UNIT: i32 = ferrio_core::unit::DEFAULT_UNIT;
