//! Data item transfer entry points.
//!
//! Every transfer returns a success flag: true means keep going,
//! false means stop issuing transfers for this statement and proceed
//! to inquiry/End. Typed Input entry points take an out-pointer and
//! leave the target untouched when no value was assigned (null values
//! in list-directed and namelist input).

use std::ffi::c_char;

use ferrio_core::Mode;
use ferrio_core::descriptor::{Descriptor, TypeCode};
use ferrio_core::iostat::IoError;

use crate::cookie::Cookie;
use crate::{cookie, util};

// ---------------------------------------------------------------------------
// Typed scalars
// ---------------------------------------------------------------------------

#[unsafe(export_name = "FerrioOutputInteger64")]
pub extern "C" fn output_integer64(cookie: Cookie, value: i64) -> bool {
    cookie::with(cookie, |slot| slot.stmt.output_integer(value)).unwrap_or(false)
}

#[unsafe(export_name = "FerrioInputInteger64")]
pub unsafe extern "C" fn input_integer64(cookie: Cookie, value: *mut i64) -> bool {
    if value.is_null() {
        return false;
    }
    cookie::with(cookie, |slot| slot.stmt.input_integer(unsafe { &mut *value }))
        .unwrap_or(false)
}

#[unsafe(export_name = "FerrioOutputReal32")]
pub extern "C" fn output_real32(cookie: Cookie, value: f32) -> bool {
    cookie::with(cookie, |slot| slot.stmt.output_real32(value)).unwrap_or(false)
}

#[unsafe(export_name = "FerrioInputReal32")]
pub unsafe extern "C" fn input_real32(cookie: Cookie, value: *mut f32) -> bool {
    if value.is_null() {
        return false;
    }
    cookie::with(cookie, |slot| slot.stmt.input_real32(unsafe { &mut *value })).unwrap_or(false)
}

#[unsafe(export_name = "FerrioOutputReal64")]
pub extern "C" fn output_real64(cookie: Cookie, value: f64) -> bool {
    cookie::with(cookie, |slot| slot.stmt.output_real64(value)).unwrap_or(false)
}

#[unsafe(export_name = "FerrioInputReal64")]
pub unsafe extern "C" fn input_real64(cookie: Cookie, value: *mut f64) -> bool {
    if value.is_null() {
        return false;
    }
    cookie::with(cookie, |slot| slot.stmt.input_real64(unsafe { &mut *value })).unwrap_or(false)
}

#[unsafe(export_name = "FerrioOutputComplex32")]
pub extern "C" fn output_complex32(cookie: Cookie, re: f32, im: f32) -> bool {
    cookie::with(cookie, |slot| slot.stmt.output_complex32(re, im)).unwrap_or(false)
}

#[unsafe(export_name = "FerrioInputComplex32")]
pub unsafe extern "C" fn input_complex32(cookie: Cookie, re: *mut f32, im: *mut f32) -> bool {
    if re.is_null() || im.is_null() {
        return false;
    }
    cookie::with(cookie, |slot| {
        slot.stmt.input_complex32(unsafe { &mut *re }, unsafe { &mut *im })
    })
    .unwrap_or(false)
}

#[unsafe(export_name = "FerrioOutputComplex64")]
pub extern "C" fn output_complex64(cookie: Cookie, re: f64, im: f64) -> bool {
    cookie::with(cookie, |slot| slot.stmt.output_complex64(re, im)).unwrap_or(false)
}

#[unsafe(export_name = "FerrioInputComplex64")]
pub unsafe extern "C" fn input_complex64(cookie: Cookie, re: *mut f64, im: *mut f64) -> bool {
    if re.is_null() || im.is_null() {
        return false;
    }
    cookie::with(cookie, |slot| {
        slot.stmt.input_complex64(unsafe { &mut *re }, unsafe { &mut *im })
    })
    .unwrap_or(false)
}

#[unsafe(export_name = "FerrioOutputLogical")]
pub extern "C" fn output_logical(cookie: Cookie, value: bool) -> bool {
    cookie::with(cookie, |slot| slot.stmt.output_logical(value)).unwrap_or(false)
}

#[unsafe(export_name = "FerrioInputLogical")]
pub unsafe extern "C" fn input_logical(cookie: Cookie, value: *mut bool) -> bool {
    if value.is_null() {
        return false;
    }
    cookie::with(cookie, |slot| slot.stmt.input_logical(unsafe { &mut *value })).unwrap_or(false)
}

#[unsafe(export_name = "FerrioOutputAscii")]
pub unsafe extern "C" fn output_ascii(cookie: Cookie, text: *const c_char, len: usize) -> bool {
    let text = unsafe { util::bytes_from(text, len) };
    cookie::with(cookie, |slot| slot.stmt.output_character(text)).unwrap_or(false)
}

#[unsafe(export_name = "FerrioInputAscii")]
pub unsafe extern "C" fn input_ascii(cookie: Cookie, text: *mut c_char, len: usize) -> bool {
    let text = unsafe { util::bytes_from_mut(text, len) };
    cookie::with(cookie, |slot| slot.stmt.input_character(text)).unwrap_or(false)
}

// ---------------------------------------------------------------------------
// Raw blocks (unformatted statements)
// ---------------------------------------------------------------------------

#[unsafe(export_name = "FerrioOutputUnformattedBlock")]
pub unsafe extern "C" fn output_unformatted_block(
    cookie: Cookie,
    data: *const c_char,
    len: usize,
) -> bool {
    let data = unsafe { util::bytes_from(data, len) };
    cookie::with(cookie, |slot| slot.stmt.output_block(data)).unwrap_or(false)
}

#[unsafe(export_name = "FerrioInputUnformattedBlock")]
pub unsafe extern "C" fn input_unformatted_block(
    cookie: Cookie,
    data: *mut c_char,
    len: usize,
) -> bool {
    let data = unsafe { util::bytes_from_mut(data, len) };
    cookie::with(cookie, |slot| slot.stmt.input_block(data)).unwrap_or(false)
}

// ---------------------------------------------------------------------------
// Descriptor transfers (array-shaped and non-default-width data)
// ---------------------------------------------------------------------------

unsafe fn read_element<const N: usize>(addr: *const u8) -> [u8; N] {
    let mut out = [0u8; N];
    unsafe { std::ptr::copy_nonoverlapping(addr, out.as_mut_ptr(), N) };
    out
}

#[unsafe(export_name = "FerrioOutputDescriptor")]
pub unsafe extern "C" fn output_descriptor(cookie: Cookie, desc: *const Descriptor) -> bool {
    cookie::with(cookie, |slot| {
        if desc.is_null() {
            slot.stmt.post_error(IoError::BadInternalTarget);
            return false;
        }
        let d = unsafe { *desc };
        let Some(tc) = d.type_code() else {
            slot.stmt.post_error(IoError::BadInternalTarget);
            return false;
        };
        let namelist = slot.stmt.mode() == Mode::Namelist;
        if namelist && !slot.stmt.namelist_open_item() {
            return false;
        }
        let mut ok = true;
        for off in d.element_offsets() {
            let p = (d.base as isize + off) as *const u8;
            ok = match tc {
                TypeCode::Integer64 => {
                    let v = i64::from_le_bytes(unsafe { read_element::<8>(p) });
                    slot.stmt.output_integer(v)
                }
                TypeCode::Real32 => {
                    let v = f32::from_le_bytes(unsafe { read_element::<4>(p) });
                    slot.stmt.output_real32(v)
                }
                TypeCode::Real64 => {
                    let v = f64::from_le_bytes(unsafe { read_element::<8>(p) });
                    slot.stmt.output_real64(v)
                }
                TypeCode::Complex32 => {
                    let re = f32::from_le_bytes(unsafe { read_element::<4>(p) });
                    let im = f32::from_le_bytes(unsafe { read_element::<4>(p.wrapping_add(4)) });
                    slot.stmt.output_complex32(re, im)
                }
                TypeCode::Complex64 => {
                    let re = f64::from_le_bytes(unsafe { read_element::<8>(p) });
                    let im = f64::from_le_bytes(unsafe { read_element::<8>(p.wrapping_add(8)) });
                    slot.stmt.output_complex64(re, im)
                }
                TypeCode::Logical => {
                    let v = i32::from_le_bytes(unsafe { read_element::<4>(p) });
                    slot.stmt.output_logical(v != 0)
                }
                TypeCode::Character => {
                    let text = unsafe { std::slice::from_raw_parts(p, d.elem_bytes) };
                    slot.stmt.output_character(text)
                }
            };
            if !ok {
                break;
            }
        }
        if namelist {
            slot.stmt.namelist_close_item();
        }
        ok
    })
    .unwrap_or(false)
}

#[unsafe(export_name = "FerrioInputDescriptor")]
pub unsafe extern "C" fn input_descriptor(cookie: Cookie, desc: *const Descriptor) -> bool {
    cookie::with(cookie, |slot| {
        if desc.is_null() {
            slot.stmt.post_error(IoError::BadInternalTarget);
            return false;
        }
        let d = unsafe { *desc };
        let Some(tc) = d.type_code() else {
            slot.stmt.post_error(IoError::BadInternalTarget);
            return false;
        };
        let namelist = slot.stmt.mode() == Mode::Namelist;
        if namelist && !slot.stmt.namelist_open_item() {
            return false;
        }
        let mut ok = true;
        for off in d.element_offsets() {
            let p = (d.base as isize + off) as *mut u8;
            ok = match tc {
                TypeCode::Integer64 => {
                    let mut v = i64::from_le_bytes(unsafe { read_element::<8>(p) });
                    let ok = slot.stmt.input_integer(&mut v);
                    if ok {
                        unsafe { std::ptr::copy_nonoverlapping(v.to_le_bytes().as_ptr(), p, 8) };
                    }
                    ok
                }
                TypeCode::Real32 => {
                    let mut v = f32::from_le_bytes(unsafe { read_element::<4>(p) });
                    let ok = slot.stmt.input_real32(&mut v);
                    if ok {
                        unsafe { std::ptr::copy_nonoverlapping(v.to_le_bytes().as_ptr(), p, 4) };
                    }
                    ok
                }
                TypeCode::Real64 => {
                    let mut v = f64::from_le_bytes(unsafe { read_element::<8>(p) });
                    let ok = slot.stmt.input_real64(&mut v);
                    if ok {
                        unsafe { std::ptr::copy_nonoverlapping(v.to_le_bytes().as_ptr(), p, 8) };
                    }
                    ok
                }
                TypeCode::Complex32 => {
                    let mut re = f32::from_le_bytes(unsafe { read_element::<4>(p) });
                    let mut im = f32::from_le_bytes(unsafe { read_element::<4>(p.wrapping_add(4)) });
                    let ok = slot.stmt.input_complex32(&mut re, &mut im);
                    if ok {
                        unsafe {
                            std::ptr::copy_nonoverlapping(re.to_le_bytes().as_ptr(), p, 4);
                            std::ptr::copy_nonoverlapping(
                                im.to_le_bytes().as_ptr(),
                                p.wrapping_add(4),
                                4,
                            );
                        }
                    }
                    ok
                }
                TypeCode::Complex64 => {
                    let mut re = f64::from_le_bytes(unsafe { read_element::<8>(p) });
                    let mut im = f64::from_le_bytes(unsafe { read_element::<8>(p.wrapping_add(8)) });
                    let ok = slot.stmt.input_complex64(&mut re, &mut im);
                    if ok {
                        unsafe {
                            std::ptr::copy_nonoverlapping(re.to_le_bytes().as_ptr(), p, 8);
                            std::ptr::copy_nonoverlapping(
                                im.to_le_bytes().as_ptr(),
                                p.wrapping_add(8),
                                8,
                            );
                        }
                    }
                    ok
                }
                TypeCode::Logical => {
                    let mut v = i32::from_le_bytes(unsafe { read_element::<4>(p) }) != 0;
                    let ok = slot.stmt.input_logical(&mut v);
                    if ok {
                        let raw = (v as i32).to_le_bytes();
                        unsafe { std::ptr::copy_nonoverlapping(raw.as_ptr(), p, 4) };
                    }
                    ok
                }
                TypeCode::Character => {
                    let text = unsafe { std::slice::from_raw_parts_mut(p, d.elem_bytes) };
                    slot.stmt.input_character(text)
                }
            };
            if !ok {
                break;
            }
        }
        if namelist {
            slot.stmt.namelist_close_item();
        }
        ok
    })
    .unwrap_or(false)
}
