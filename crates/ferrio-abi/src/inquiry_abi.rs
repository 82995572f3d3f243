//! Result extraction and statement termination.
//!
//! Inquiries are idempotent and side-effect-free beyond marking the
//! condition inspected. EndIOStatement is the only call that
//! invalidates a cookie; calling it on an uninspected non-Normal
//! condition is a caller defect and takes the fatal diagnostic path.

use std::ffi::{c_char, c_int};

use crate::cookie::{Cookie, CopyBack};
use crate::{cookie, crash, util};

#[unsafe(export_name = "FerrioGetIOSTAT")]
pub extern "C" fn get_iostat(cookie: Cookie) -> c_int {
    cookie::with(cookie, |slot| slot.stmt.iostat()).unwrap_or(0)
}

#[unsafe(export_name = "FerrioGetIOMSG")]
pub unsafe extern "C" fn get_iomsg(cookie: Cookie, buffer: *mut c_char, len: usize) {
    if let Some(msg) = cookie::with(cookie, |slot| slot.stmt.iomsg()) {
        unsafe { util::copy_padded(msg.as_bytes(), buffer, len) };
    }
}

#[unsafe(export_name = "FerrioGetSTATUS")]
pub unsafe extern "C" fn get_status(cookie: Cookie, buffer: *mut c_char, len: usize) {
    if let Some(text) = cookie::with(cookie, |slot| slot.stmt.status_text()) {
        unsafe { util::copy_padded(text.as_bytes(), buffer, len) };
    }
}

#[unsafe(export_name = "FerrioGetSIZE")]
pub extern "C" fn get_size(cookie: Cookie) -> usize {
    cookie::with(cookie, |slot| slot.stmt.size()).unwrap_or(0)
}

#[unsafe(export_name = "FerrioIsEND")]
pub extern "C" fn is_end(cookie: Cookie) -> bool {
    cookie::with(cookie, |slot| slot.stmt.is_end()).unwrap_or(false)
}

#[unsafe(export_name = "FerrioIsERR")]
pub extern "C" fn is_err(cookie: Cookie) -> bool {
    cookie::with(cookie, |slot| slot.stmt.is_err()).unwrap_or(false)
}

#[unsafe(export_name = "FerrioIsEOR")]
pub extern "C" fn is_eor(cookie: Cookie) -> bool {
    cookie::with(cookie, |slot| slot.stmt.is_eor()).unwrap_or(false)
}

/// Finalize the statement and invalidate the cookie. Returns the final
/// IOSTAT value. The optional source location feeds the fatal
/// diagnostic only.
#[unsafe(export_name = "FerrioEndIOStatement")]
pub unsafe extern "C" fn end_io_statement(
    cookie: Cookie,
    source_file: *const c_char,
    source_line: c_int,
) -> c_int {
    let Some(slot) = cookie::take(cookie) else {
        return 0;
    };
    match slot.stmt.end() {
        Ok(summary) => {
            if let (Some(copy_back), Some(file)) = (slot.copy_back, summary.internal) {
                match copy_back {
                    CopyBack::Flat { base, len } => {
                        let flat = file.into_flat();
                        let n = flat.len().min(len);
                        unsafe {
                            std::ptr::copy_nonoverlapping(flat.as_ptr(), base as *mut u8, n);
                        }
                    }
                    CopyBack::Array(desc) => {
                        for (off, record) in desc.element_offsets().zip(file.records()) {
                            let p = (desc.base as isize + off) as *mut u8;
                            let n = record.len().min(desc.elem_bytes);
                            unsafe { std::ptr::copy_nonoverlapping(record.as_ptr(), p, n) };
                        }
                    }
                }
            }
            summary.iostat
        }
        Err(defect) => crash::fatal(&defect, source_file, source_line),
    }
}
