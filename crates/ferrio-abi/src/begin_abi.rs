//! Begin entry points: one per (direction × mode × locus) combination.
//!
//! Every Begin returns a cookie, never a null handle: a locus that
//! cannot be bound yields a statement already carrying an Error
//! condition, so generated code follows one uniform
//! transfer/inquiry/End path regardless.
//!
//! The optional scratch region for internal statements is caller
//! memory sized `32 + 8 * maxNestingDepth`; only its length matters to
//! the safe engine (it bounds the format nesting stack) and no
//! reference to it survives past End.

use std::ffi::{c_char, c_int, c_void};

use ferrio_core::descriptor::{Descriptor, TypeCode};
use ferrio_core::unit::registry;
use ferrio_core::{Direction, InternalFile, IoError, IoStatement, Locus, Mode, NamelistGroup};

use crate::cookie::{Cookie, CopyBack, register};
use crate::{FERRIO_DEFAULT_UNIT, device, util};

/// Preconnected units: 6 is the default output stream, 5 the default
/// input stream; the * unit maps onto them by direction.
fn resolve_unit(unit: c_int, direction: Direction) -> i32 {
    let unit = if unit == FERRIO_DEFAULT_UNIT {
        match direction {
            Direction::Output => 6,
            Direction::Input => 5,
        }
    } else {
        unit
    };
    match unit {
        5 => {
            registry().ensure(5, device::default_input);
        }
        6 => {
            registry().ensure(6, device::default_output);
        }
        _ => {}
    }
    unit
}

fn begin_external(
    direction: Direction,
    mode: Mode,
    unit: c_int,
    format: Option<&[u8]>,
    scratch_len: usize,
) -> Cookie {
    let unit = resolve_unit(unit, direction);
    let stmt = IoStatement::begin(direction, mode, Locus::External(unit), format, scratch_len);
    register(stmt, None)
}

// ---------------------------------------------------------------------------
// External units
// ---------------------------------------------------------------------------

#[unsafe(export_name = "FerrioBeginExternalListOutput")]
pub extern "C" fn begin_external_list_output(unit: c_int) -> Cookie {
    begin_external(Direction::Output, Mode::ListDirected, unit, None, 0)
}

#[unsafe(export_name = "FerrioBeginExternalListInput")]
pub extern "C" fn begin_external_list_input(unit: c_int) -> Cookie {
    begin_external(Direction::Input, Mode::ListDirected, unit, None, 0)
}

#[unsafe(export_name = "FerrioBeginExternalFormattedOutput")]
pub unsafe extern "C" fn begin_external_formatted_output(
    unit: c_int,
    format: *const c_char,
    format_len: usize,
) -> Cookie {
    let fmt = unsafe { util::bytes_from(format, format_len) };
    begin_external(Direction::Output, Mode::Formatted, unit, Some(fmt), 0)
}

#[unsafe(export_name = "FerrioBeginExternalFormattedInput")]
pub unsafe extern "C" fn begin_external_formatted_input(
    unit: c_int,
    format: *const c_char,
    format_len: usize,
) -> Cookie {
    let fmt = unsafe { util::bytes_from(format, format_len) };
    begin_external(Direction::Input, Mode::Formatted, unit, Some(fmt), 0)
}

#[unsafe(export_name = "FerrioBeginUnformattedOutput")]
pub extern "C" fn begin_unformatted_output(unit: c_int) -> Cookie {
    begin_external(Direction::Output, Mode::Unformatted, unit, None, 0)
}

#[unsafe(export_name = "FerrioBeginUnformattedInput")]
pub extern "C" fn begin_unformatted_input(unit: c_int) -> Cookie {
    begin_external(Direction::Input, Mode::Unformatted, unit, None, 0)
}

// ---------------------------------------------------------------------------
// Internal buffers (default-width character scalar: one record)
// ---------------------------------------------------------------------------

fn begin_internal_output(
    mode: Mode,
    internal: *mut c_char,
    internal_len: usize,
    format: Option<&[u8]>,
    scratch_len: usize,
) -> Cookie {
    if internal.is_null() {
        let mut stmt = IoStatement::begin(
            Direction::Output,
            mode,
            Locus::Internal(InternalFile::for_output(0, 0)),
            format,
            scratch_len,
        );
        stmt.post_error(IoError::BadInternalTarget);
        return register(stmt, None);
    }
    let file = InternalFile::for_output(internal_len, 1);
    let stmt = IoStatement::begin(
        Direction::Output,
        mode,
        Locus::Internal(file),
        format,
        scratch_len,
    );
    register(
        stmt,
        Some(CopyBack::Flat {
            base: internal as usize,
            len: internal_len,
        }),
    )
}

unsafe fn begin_internal_input(
    mode: Mode,
    internal: *const c_char,
    internal_len: usize,
    format: Option<&[u8]>,
    scratch_len: usize,
) -> Cookie {
    if internal.is_null() {
        let mut stmt = IoStatement::begin(
            Direction::Input,
            mode,
            Locus::Internal(InternalFile::for_input(Vec::new())),
            format,
            scratch_len,
        );
        stmt.post_error(IoError::BadInternalTarget);
        return register(stmt, None);
    }
    let bytes = unsafe { util::bytes_from(internal, internal_len) };
    let file = InternalFile::from_flat(bytes, internal_len);
    let stmt = IoStatement::begin(
        Direction::Input,
        mode,
        Locus::Internal(file),
        format,
        scratch_len,
    );
    register(stmt, None)
}

#[unsafe(export_name = "FerrioBeginInternalListOutput")]
pub unsafe extern "C" fn begin_internal_list_output(
    internal: *mut c_char,
    internal_len: usize,
    _scratch: *mut c_void,
    scratch_len: usize,
) -> Cookie {
    begin_internal_output(Mode::ListDirected, internal, internal_len, None, scratch_len)
}

#[unsafe(export_name = "FerrioBeginInternalListInput")]
pub unsafe extern "C" fn begin_internal_list_input(
    internal: *const c_char,
    internal_len: usize,
    _scratch: *mut c_void,
    scratch_len: usize,
) -> Cookie {
    unsafe { begin_internal_input(Mode::ListDirected, internal, internal_len, None, scratch_len) }
}

#[unsafe(export_name = "FerrioBeginInternalFormattedOutput")]
pub unsafe extern "C" fn begin_internal_formatted_output(
    internal: *mut c_char,
    internal_len: usize,
    format: *const c_char,
    format_len: usize,
    _scratch: *mut c_void,
    scratch_len: usize,
) -> Cookie {
    let fmt = unsafe { util::bytes_from(format, format_len) };
    begin_internal_output(
        Mode::Formatted,
        internal,
        internal_len,
        Some(fmt),
        scratch_len,
    )
}

#[unsafe(export_name = "FerrioBeginInternalFormattedInput")]
pub unsafe extern "C" fn begin_internal_formatted_input(
    internal: *const c_char,
    internal_len: usize,
    format: *const c_char,
    format_len: usize,
    _scratch: *mut c_void,
    scratch_len: usize,
) -> Cookie {
    let fmt = unsafe { util::bytes_from(format, format_len) };
    unsafe {
        begin_internal_input(
            Mode::Formatted,
            internal,
            internal_len,
            Some(fmt),
            scratch_len,
        )
    }
}

// ---------------------------------------------------------------------------
// Internal array targets (one record per descriptor element)
// ---------------------------------------------------------------------------

unsafe fn begin_internal_array(
    direction: Direction,
    mode: Mode,
    desc: *const Descriptor,
    format: Option<&[u8]>,
    scratch_len: usize,
) -> Cookie {
    let bad = |dir: Direction| {
        let mut stmt = IoStatement::begin(
            dir,
            mode,
            Locus::Internal(InternalFile::for_input(Vec::new())),
            format,
            scratch_len,
        );
        stmt.post_error(IoError::BadInternalTarget);
        register(stmt, None)
    };
    if desc.is_null() {
        return bad(direction);
    }
    let d = unsafe { *desc };
    if d.base == 0 || d.type_code() != Some(TypeCode::Character) {
        return bad(direction);
    }

    match direction {
        Direction::Output => {
            let file = InternalFile::for_output(d.elem_bytes, d.element_count());
            let stmt = IoStatement::begin(direction, mode, Locus::Internal(file), format, scratch_len);
            register(stmt, Some(CopyBack::Array(d)))
        }
        Direction::Input => {
            let records = d
                .element_offsets()
                .map(|off| {
                    let p = (d.base as isize + off) as *const u8;
                    unsafe { std::slice::from_raw_parts(p, d.elem_bytes) }.to_vec()
                })
                .collect();
            let file = InternalFile::for_input(records);
            let stmt = IoStatement::begin(direction, mode, Locus::Internal(file), format, scratch_len);
            register(stmt, None)
        }
    }
}

#[unsafe(export_name = "FerrioBeginInternalArrayListOutput")]
pub unsafe extern "C" fn begin_internal_array_list_output(
    desc: *const Descriptor,
    _scratch: *mut c_void,
    scratch_len: usize,
) -> Cookie {
    unsafe { begin_internal_array(Direction::Output, Mode::ListDirected, desc, None, scratch_len) }
}

#[unsafe(export_name = "FerrioBeginInternalArrayListInput")]
pub unsafe extern "C" fn begin_internal_array_list_input(
    desc: *const Descriptor,
    _scratch: *mut c_void,
    scratch_len: usize,
) -> Cookie {
    unsafe { begin_internal_array(Direction::Input, Mode::ListDirected, desc, None, scratch_len) }
}

#[unsafe(export_name = "FerrioBeginInternalArrayFormattedOutput")]
pub unsafe extern "C" fn begin_internal_array_formatted_output(
    desc: *const Descriptor,
    format: *const c_char,
    format_len: usize,
    _scratch: *mut c_void,
    scratch_len: usize,
) -> Cookie {
    let fmt = unsafe { util::bytes_from(format, format_len) };
    unsafe {
        begin_internal_array(
            Direction::Output,
            Mode::Formatted,
            desc,
            Some(fmt),
            scratch_len,
        )
    }
}

#[unsafe(export_name = "FerrioBeginInternalArrayFormattedInput")]
pub unsafe extern "C" fn begin_internal_array_formatted_input(
    desc: *const Descriptor,
    format: *const c_char,
    format_len: usize,
    _scratch: *mut c_void,
    scratch_len: usize,
) -> Cookie {
    let fmt = unsafe { util::bytes_from(format, format_len) };
    unsafe {
        begin_internal_array(
            Direction::Input,
            Mode::Formatted,
            desc,
            Some(fmt),
            scratch_len,
        )
    }
}

// ---------------------------------------------------------------------------
// Namelist
// ---------------------------------------------------------------------------

/// Namelist group metadata as the compiler lays it out.
#[repr(C)]
pub struct NamelistGroupRef {
    pub name: *const c_char,
    pub name_len: usize,
    pub item_names: *const *const c_char,
    pub item_name_lens: *const usize,
    pub item_count: usize,
}

unsafe fn convert_group(group: *const NamelistGroupRef) -> Option<NamelistGroup> {
    if group.is_null() {
        return None;
    }
    let g = unsafe { &*group };
    if g.name.is_null() || (g.item_count > 0 && (g.item_names.is_null() || g.item_name_lens.is_null()))
    {
        return None;
    }
    let name = String::from_utf8_lossy(unsafe { util::bytes_from(g.name, g.name_len) }).into_owned();
    let mut items = Vec::with_capacity(g.item_count);
    for i in 0..g.item_count {
        let ptr = unsafe { *g.item_names.add(i) };
        let len = unsafe { *g.item_name_lens.add(i) };
        if ptr.is_null() {
            return None;
        }
        items.push(String::from_utf8_lossy(unsafe { util::bytes_from(ptr, len) }).into_owned());
    }
    Some(NamelistGroup::new(name, items))
}

unsafe fn begin_namelist(direction: Direction, unit: c_int, group: *const NamelistGroupRef) -> Cookie {
    let unit = resolve_unit(unit, direction);
    let stmt = match unsafe { convert_group(group) } {
        Some(g) => IoStatement::begin_namelist(direction, unit, g),
        None => {
            let mut stmt =
                IoStatement::begin_namelist(direction, unit, NamelistGroup::new("", Vec::new()));
            stmt.post_error(IoError::NamelistSyntax("missing group metadata".into()));
            stmt
        }
    };
    register(stmt, None)
}

#[unsafe(export_name = "FerrioBeginNamelistOutput")]
pub unsafe extern "C" fn begin_namelist_output(
    unit: c_int,
    group: *const NamelistGroupRef,
) -> Cookie {
    unsafe { begin_namelist(Direction::Output, unit, group) }
}

#[unsafe(export_name = "FerrioBeginNamelistInput")]
pub unsafe extern "C" fn begin_namelist_input(
    unit: c_int,
    group: *const NamelistGroupRef,
) -> Cookie {
    unsafe { begin_namelist(Direction::Input, unit, group) }
}
