//! Asynchronous transfer entry points.
//!
//! Begin returns an opaque id immediately; the matching wait returns a
//! cookie carrying the completion condition. Invalid combinations
//! (formatted units, sequential units, busy records) surface on the
//! waited-on cookie, preserving the uniform completion-inspection
//! path.

use std::ffi::{c_char, c_int};

use ferrio_core::async_io::tracker;

use crate::cookie::{self, Cookie};
use crate::util;

#[unsafe(export_name = "FerrioBeginAsynchronousOutput")]
pub unsafe extern "C" fn begin_asynchronous_output(
    unit: c_int,
    record: i64,
    buffer: *const c_char,
    len: usize,
) -> c_int {
    let data = unsafe { util::bytes_from(buffer, len) };
    tracker().begin_output(unit, record, data)
}

#[unsafe(export_name = "FerrioBeginAsynchronousInput")]
pub unsafe extern "C" fn begin_asynchronous_input(
    unit: c_int,
    record: i64,
    buffer: *mut c_char,
    len: usize,
) -> c_int {
    let data = unsafe { util::bytes_from_mut(buffer, len) };
    tracker().begin_input(unit, record, data)
}

#[unsafe(export_name = "FerrioWaitForAsynchronousIO")]
pub extern "C" fn wait_for_asynchronous_io(unit: c_int, id: c_int) -> Cookie {
    cookie::register(tracker().wait(unit, id), None)
}
