//! Integration test: the extern "C" statement surface.
//!
//! Drives the ABI the way lowered code would: opaque cookies, raw
//! buffers, descriptors, and the inquiry/End protocol. Every sequence
//! here follows the contract (inspect before End on any non-Normal
//! condition), so the fatal path is never taken.
//!
//! Run: cargo test -p ferrio-abi --test abi_surface_test

#![allow(unsafe_code)]

use std::ffi::c_char;
use std::ptr;

use ferrio_abi::begin_abi::{self, NamelistGroupRef};
use ferrio_abi::{async_abi, inquiry_abi, option_abi, transfer_abi};
use ferrio_core::descriptor::{Descriptor, TypeCode};
use ferrio_core::iostat;
use ferrio_core::unit::{Connection, registry};

fn end(cookie: usize) -> i32 {
    unsafe { inquiry_abi::end_io_statement(cookie, ptr::null(), 0) }
}

// ---------------------------------------------------------------------
// Internal statements through raw buffers
// ---------------------------------------------------------------------

#[test]
fn internal_formatted_output_copies_back_blank_padded() {
    let mut buffer = [b'?'; 12];
    let cookie = unsafe {
        begin_abi::begin_internal_formatted_output(
            buffer.as_mut_ptr().cast::<c_char>(),
            buffer.len(),
            b"(I4)".as_ptr().cast(),
            4,
            ptr::null_mut(),
            0,
        )
    };
    assert!(transfer_abi::output_integer64(cookie, -77));
    assert_eq!(end(cookie), iostat::IOSTAT_OK);
    assert_eq!(&buffer, b" -77        ");
}

#[test]
fn internal_list_input_reads_scalar_record() {
    let buffer = b"  19 7.5";
    let cookie = unsafe {
        begin_abi::begin_internal_list_input(
            buffer.as_ptr().cast::<c_char>(),
            buffer.len(),
            ptr::null_mut(),
            0,
        )
    };
    let mut n = 0i64;
    let mut x = 0f64;
    assert!(unsafe { transfer_abi::input_integer64(cookie, &mut n) });
    assert!(unsafe { transfer_abi::input_real64(cookie, &mut x) });
    assert_eq!((n, x), (19, 7.5));
    assert_eq!(end(cookie), iostat::IOSTAT_OK);
}

#[test]
fn null_internal_buffer_reports_error_cookie() {
    let cookie = unsafe {
        begin_abi::begin_internal_list_output(ptr::null_mut(), 0, ptr::null_mut(), 0)
    };
    assert!(!transfer_abi::output_integer64(cookie, 1));
    assert_eq!(
        inquiry_abi::get_iostat(cookie),
        iostat::IOSTAT_BAD_INTERNAL_TARGET
    );
    end(cookie);
}

// ---------------------------------------------------------------------
// Descriptor transfers
// ---------------------------------------------------------------------

#[test]
fn descriptor_output_walks_strided_elements() {
    registry().connect(301, Connection::memory());
    let cookie = begin_abi::begin_external_list_output(301);

    // Every second element of [10, 0, 20, 0, 30].
    let data: [i64; 5] = [10, 0, 20, 0, 30];
    let desc = Descriptor::vector(data.as_ptr() as usize, TypeCode::Integer64, 8, 3, 16);
    assert!(unsafe { transfer_abi::output_descriptor(cookie, &desc) });
    assert_eq!(end(cookie), iostat::IOSTAT_OK);

    let records = registry().lookup(301).unwrap().lock().memory_records();
    assert_eq!(records, vec![b"10 20 30".to_vec()]);
}

#[test]
fn descriptor_input_fills_elements() {
    registry().connect(
        302,
        Connection::memory_with_records(vec![b"1.5 2.5 3.5".to_vec()]),
    );
    let cookie = begin_abi::begin_external_list_input(302);

    let mut data = [0f64; 3];
    let desc = Descriptor::vector(data.as_mut_ptr() as usize, TypeCode::Real64, 8, 3, 8);
    assert!(unsafe { transfer_abi::input_descriptor(cookie, &desc) });
    assert_eq!(end(cookie), iostat::IOSTAT_OK);
    assert_eq!(data, [1.5, 2.5, 3.5]);
}

// ---------------------------------------------------------------------
// Options and inquiries over the ABI
// ---------------------------------------------------------------------

#[test]
fn invalid_option_surfaces_through_iomsg() {
    registry().connect(303, Connection::memory());
    let cookie = begin_abi::begin_external_list_output(303);
    unsafe { option_abi::set_sign(cookie, b"SOMETIMES".as_ptr().cast(), 9) };
    assert!(!transfer_abi::output_integer64(cookie, 1));
    assert_eq!(inquiry_abi::get_iostat(cookie), iostat::IOSTAT_INVALID_OPTION);

    let mut msg = [0u8; 40];
    unsafe { inquiry_abi::get_iomsg(cookie, msg.as_mut_ptr().cast(), msg.len()) };
    let text = String::from_utf8_lossy(&msg);
    assert!(text.contains("SIGN"), "message was: {text}");

    let mut status = [0u8; 8];
    unsafe { inquiry_abi::get_status(cookie, status.as_mut_ptr().cast(), status.len()) };
    assert_eq!(&status, b"ERROR   ");
    end(cookie);
}

#[test]
fn get_size_counts_formatted_bytes() {
    registry().connect(304, Connection::memory());
    let cookie = unsafe {
        begin_abi::begin_external_formatted_output(304, b"(I6,I6)".as_ptr().cast(), 7)
    };
    assert!(transfer_abi::output_integer64(cookie, 1));
    assert!(transfer_abi::output_integer64(cookie, 2));
    assert_eq!(inquiry_abi::get_size(cookie), 12);
    assert_eq!(end(cookie), iostat::IOSTAT_OK);
}

#[test]
fn predicates_dispatch_end_condition() {
    registry().connect(305, Connection::memory_with_records(vec![]));
    let cookie = begin_abi::begin_external_list_input(305);
    let mut v = 0i64;
    assert!(!unsafe { transfer_abi::input_integer64(cookie, &mut v) });
    assert!(inquiry_abi::is_end(cookie));
    assert!(!inquiry_abi::is_err(cookie));
    assert!(!inquiry_abi::is_eor(cookie));
    assert_eq!(end(cookie), iostat::IOSTAT_END);
}

#[test]
fn stale_cookie_is_inert() {
    registry().connect(306, Connection::memory());
    let cookie = begin_abi::begin_external_list_output(306);
    assert_eq!(end(cookie), iostat::IOSTAT_OK);
    // The cookie is dead: every call is a refused no-op.
    assert!(!transfer_abi::output_integer64(cookie, 1));
    assert!(!inquiry_abi::is_err(cookie));
    assert_eq!(end(cookie), 0);
}

// ---------------------------------------------------------------------
// Asynchronous entry points
// ---------------------------------------------------------------------

#[test]
fn asynchronous_output_wait_inspect() {
    registry().connect(307, Connection::memory_direct());
    let id = unsafe {
        async_abi::begin_asynchronous_output(307, 2, b"block".as_ptr().cast(), 5)
    };
    let cookie = async_abi::wait_for_asynchronous_io(307, id);
    assert_eq!(inquiry_abi::get_iostat(cookie), iostat::IOSTAT_OK);
    assert_eq!(inquiry_abi::get_size(cookie), 5);
    assert_eq!(end(cookie), iostat::IOSTAT_OK);

    let mut back = [0u8; 5];
    let id = unsafe {
        async_abi::begin_asynchronous_input(307, 2, back.as_mut_ptr().cast(), back.len())
    };
    let cookie = async_abi::wait_for_asynchronous_io(307, id);
    assert_eq!(inquiry_abi::get_iostat(cookie), iostat::IOSTAT_OK);
    assert_eq!(&back, b"block");
    assert_eq!(end(cookie), iostat::IOSTAT_OK);
}

#[test]
fn double_wait_is_an_error_condition() {
    registry().connect(308, Connection::memory_direct());
    let id = unsafe { async_abi::begin_asynchronous_output(308, 1, b"x".as_ptr().cast(), 1) };
    let first = async_abi::wait_for_asynchronous_io(308, id);
    assert_eq!(inquiry_abi::get_iostat(first), iostat::IOSTAT_OK);
    assert_eq!(end(first), iostat::IOSTAT_OK);

    let second = async_abi::wait_for_asynchronous_io(308, id);
    assert!(inquiry_abi::is_err(second));
    assert_eq!(
        inquiry_abi::get_iostat(second),
        iostat::IOSTAT_ASYNC_ID_INVALID
    );
    assert_eq!(end(second), iostat::IOSTAT_ASYNC_ID_INVALID);
}

// ---------------------------------------------------------------------
// Namelist over the ABI
// ---------------------------------------------------------------------

#[test]
fn namelist_output_through_group_ref() {
    registry().connect(309, Connection::memory());
    let names: [&[u8]; 2] = [b"n", b"x"];
    let ptrs: Vec<*const c_char> = names.iter().map(|n| n.as_ptr().cast()).collect();
    let lens: Vec<usize> = names.iter().map(|n| n.len()).collect();
    let group = NamelistGroupRef {
        name: b"cfg".as_ptr().cast(),
        name_len: 3,
        item_names: ptrs.as_ptr(),
        item_name_lens: lens.as_ptr(),
        item_count: 2,
    };
    let cookie = unsafe { begin_abi::begin_namelist_output(309, &group) };
    assert!(transfer_abi::output_integer64(cookie, 5));
    assert!(transfer_abi::output_real64(cookie, 0.5));
    assert_eq!(end(cookie), iostat::IOSTAT_OK);

    let records = registry().lookup(309).unwrap().lock().memory_records();
    assert_eq!(records, vec![b"&cfg n=5 x=0.5 /".to_vec()]);
}
