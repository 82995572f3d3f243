//! Control-list option entry points.
//!
//! Setters never fail synchronously: an invalid keyword or a setter
//! issued after the first transfer is captured on the cookie's
//! condition, so a single inspect/End after the whole Set sequence
//! detects any misconfiguration.

use std::ffi::c_char;

use crate::cookie::Cookie;
use crate::{cookie, util};

macro_rules! string_option {
    ($export:literal, $fn_name:ident, $setter:ident) => {
        #[unsafe(export_name = $export)]
        pub unsafe extern "C" fn $fn_name(cookie: Cookie, value: *const c_char, len: usize) {
            let value = unsafe { util::bytes_from(value, len) };
            cookie::with(cookie, |slot| slot.stmt.$setter(value));
        }
    };
}

string_option!("FerrioSetADVANCE", set_advance, set_advance);
string_option!("FerrioSetBLANK", set_blank, set_blank);
string_option!("FerrioSetDECIMAL", set_decimal, set_decimal);
string_option!("FerrioSetDELIM", set_delim, set_delim);
string_option!("FerrioSetPAD", set_pad, set_pad);
string_option!("FerrioSetROUND", set_round, set_round);
string_option!("FerrioSetSIGN", set_sign, set_sign);

#[unsafe(export_name = "FerrioSetPOS")]
pub extern "C" fn set_pos(cookie: Cookie, value: i64) {
    cookie::with(cookie, |slot| slot.stmt.set_pos(value));
}

#[unsafe(export_name = "FerrioSetREC")]
pub extern "C" fn set_rec(cookie: Cookie, value: i64) {
    cookie::with(cookie, |slot| slot.stmt.set_rec(value));
}
