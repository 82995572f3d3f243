//! Fatal diagnostic path.
//!
//! EndIOStatement escalates here when a non-Normal condition was never
//! inspected: the compiled code did not implement the END=/ERR=/EOR=/
//! IOSTAT= handling the condition demanded. Terminating loudly is
//! deliberate; the alternative is silently swallowed I/O errors.

use std::ffi::{CStr, c_char, c_int};

use ferrio_core::UnhandledCondition;

pub fn fatal(defect: &UnhandledCondition, source_file: *const c_char, source_line: c_int) -> ! {
    eprintln!(
        "ferrio: fatal: I/O condition (IOSTAT={}) was never inspected before EndIOStatement: {}",
        defect.iostat, defect.message
    );
    if !source_file.is_null() {
        let file = unsafe { CStr::from_ptr(source_file) }.to_string_lossy();
        eprintln!("ferrio: at {file}:{source_line}");
    }
    std::process::abort();
}
