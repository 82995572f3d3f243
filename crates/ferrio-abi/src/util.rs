//! Pointer/slice helpers shared by the ABI entry points.

use std::ffi::c_char;

/// Borrow caller bytes; a null pointer reads as empty.
pub unsafe fn bytes_from(ptr: *const c_char, len: usize) -> &'static [u8] {
    if ptr.is_null() || len == 0 {
        return &[];
    }
    unsafe { std::slice::from_raw_parts(ptr.cast::<u8>(), len) }
}

/// Borrow caller bytes mutably; a null pointer reads as empty.
pub unsafe fn bytes_from_mut(ptr: *mut c_char, len: usize) -> &'static mut [u8] {
    if ptr.is_null() || len == 0 {
        return &mut [];
    }
    unsafe { std::slice::from_raw_parts_mut(ptr.cast::<u8>(), len) }
}

/// Copy `text` into a caller buffer, blank-padding the remainder
/// (character assignment semantics for IOMSG=/STATUS inquiries).
pub unsafe fn copy_padded(text: &[u8], ptr: *mut c_char, len: usize) {
    if ptr.is_null() || len == 0 {
        return;
    }
    let out = unsafe { std::slice::from_raw_parts_mut(ptr.cast::<u8>(), len) };
    let n = text.len().min(len);
    out[..n].copy_from_slice(&text[..n]);
    for b in &mut out[n..] {
        *b = b' ';
    }
}
