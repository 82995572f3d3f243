//! Conformance scenarios.
//!
//! Each scenario drives the runtime the way generated code would and
//! checks an externally visible guarantee of the statement contract.
//! Scenario unit numbers live in the 900 range so they never collide
//! with other suites sharing the process-wide registry.

use std::sync::{Mutex, MutexGuard};

use ferrio_core::format::nesting_bound;
use ferrio_core::unit::{Connection, registry};
use ferrio_core::{Direction, InternalFile, IoStatement, Locus, Mode, iostat};

/// One conformance scenario.
pub struct Scenario {
    pub name: &'static str,
    pub contract: &'static str,
    pub run: fn() -> Result<(), String>,
}

/// Scenarios share fixed unit numbers on the process-wide registry;
/// hold this guard while executing them.
pub fn serial_guard() -> MutexGuard<'static, ()> {
    static LOCK: Mutex<()> = Mutex::new(());
    LOCK.lock().unwrap_or_else(|e| e.into_inner())
}

fn check(cond: bool, what: &str) -> Result<(), String> {
    if cond {
        Ok(())
    } else {
        Err(format!("check failed: {what}"))
    }
}

fn records(unit: i32) -> Vec<Vec<u8>> {
    registry()
        .lookup(unit)
        .map(|c| c.lock().memory_records())
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Scenario bodies
// ---------------------------------------------------------------------------

fn begin_end_without_transfers() -> Result<(), String> {
    registry().connect(901, Connection::memory());
    let st = IoStatement::begin(
        Direction::Output,
        Mode::ListDirected,
        Locus::External(901),
        None,
        0,
    );
    // Normal conditions need no inspection before End.
    let summary = st.end().map_err(|d| format!("end escalated: {}", d.message))?;
    check(summary.iostat == iostat::IOSTAT_OK, "iostat is 0")
}

fn options_last_writer_then_freeze() -> Result<(), String> {
    registry().connect(902, Connection::memory());
    let mut st = IoStatement::begin(
        Direction::Output,
        Mode::ListDirected,
        Locus::External(902),
        None,
        0,
    );
    st.set_sign(b"SUPPRESS");
    st.set_sign(b"PLUS");
    check(st.options().sign.emit_plus(), "last SIGN= value wins")?;
    check(st.output_integer(1), "first transfer accepted")?;
    st.set_sign(b"SUPPRESS");
    check(
        st.iostat() == iostat::IOSTAT_OPTION_AFTER_TRANSFER,
        "late mutation reports 102",
    )?;
    check(st.options().sign.emit_plus(), "stored value unchanged")?;
    st.end().map_err(|d| d.message)?;
    Ok(())
}

fn format_reversion_and_empty_format() -> Result<(), String> {
    registry().connect(903, Connection::memory());
    let mut st = IoStatement::begin(
        Direction::Output,
        Mode::Formatted,
        Locus::External(903),
        Some(b"(I3)"),
        0,
    );
    for v in [1, 2, 3] {
        check(st.output_integer(v), "transfer under reversion")?;
    }
    st.end().map_err(|d| d.message)?;
    check(records(903).len() == 3, "two reversions closed two records")?;

    registry().connect(913, Connection::memory());
    let mut st = IoStatement::begin(
        Direction::Output,
        Mode::Formatted,
        Locus::External(913),
        Some(b"(1X)"),
        0,
    );
    check(!st.output_integer(1), "no-data-edit format fails")?;
    check(
        st.iostat() == iostat::IOSTAT_FORMAT_NO_DATA_EDITS,
        "iostat 203",
    )?;
    st.end().map_err(|d| d.message)?;
    Ok(())
}

fn unformatted_internal_round_trip() -> Result<(), String> {
    let file = InternalFile::for_output(80, 1);
    let mut st = IoStatement::begin(
        Direction::Output,
        Mode::Unformatted,
        Locus::Internal(file),
        None,
        0,
    );
    check(st.output_integer(-99), "write integer")?;
    check(st.output_real64(2.5), "write real")?;
    check(st.output_character(b"abc"), "write text")?;
    let flat = st
        .end()
        .map_err(|d| d.message)?
        .internal
        .ok_or("missing internal records")?
        .into_flat();

    let mut st = IoStatement::begin(
        Direction::Input,
        Mode::Unformatted,
        Locus::Internal(InternalFile::from_flat(&flat, 80)),
        None,
        0,
    );
    let mut i = 0i64;
    let mut r = 0f64;
    let mut s = [0u8; 3];
    check(st.input_integer(&mut i), "read integer")?;
    check(st.input_real64(&mut r), "read real")?;
    check(st.input_character(&mut s), "read text")?;
    st.end().map_err(|d| d.message)?;
    check(i == -99 && r == 2.5 && &s == b"abc", "values round-trip exactly")
}

fn nesting_depth_boundary() -> Result<(), String> {
    registry().connect(905, Connection::memory());
    let scratch = 32 + 8 * 3;
    check(nesting_bound(scratch) == 3, "scratch formula")?;

    let mut at_bound = IoStatement::begin(
        Direction::Output,
        Mode::Formatted,
        Locus::External(905),
        Some(b"(((I1)))"),
        scratch,
    );
    check(at_bound.output_integer(1), "depth exactly at the bound")?;
    at_bound.end().map_err(|d| d.message)?;

    let mut beyond = IoStatement::begin(
        Direction::Output,
        Mode::Formatted,
        Locus::External(905),
        Some(b"((((I1))))"),
        scratch,
    );
    check(!beyond.output_integer(1), "one group deeper fails")?;
    check(
        beyond.iostat() == iostat::IOSTAT_FORMAT_NESTING,
        "iostat 202",
    )?;
    beyond.end().map_err(|d| d.message)?;
    Ok(())
}

fn list_output_single_integer() -> Result<(), String> {
    registry().connect(906, Connection::memory());
    let mut st = IoStatement::begin(
        Direction::Output,
        Mode::ListDirected,
        Locus::External(906),
        None,
        0,
    );
    check(st.output_integer(666), "transfer")?;
    check(st.iostat() == iostat::IOSTAT_OK, "iostat 0 after inspect")?;
    st.end().map_err(|d| d.message)?;
    // Indistinguishable from writing the text "666" plus a record
    // terminator.
    check(records(906) == vec![b"666".to_vec()], "external effect is '666'")
}

fn async_records_and_double_wait() -> Result<(), String> {
    use ferrio_core::async_io::tracker;
    registry().connect(907, Connection::memory_direct());
    let a = tracker().begin_output(907, 4, b"aaaa");
    let b = tracker().begin_output(907, 9, b"bbbb");
    let mut st_a = tracker().wait(907, a);
    check(st_a.iostat() == iostat::IOSTAT_OK, "first record accepted")?;
    st_a.end().map_err(|d| d.message)?;
    let mut st_b = tracker().wait(907, b);
    check(
        st_b.iostat() == iostat::IOSTAT_OK,
        "different record does not conflict",
    )?;
    st_b.end().map_err(|d| d.message)?;

    let mut again = tracker().wait(907, b);
    check(
        again.iostat() == iostat::IOSTAT_ASYNC_ID_INVALID,
        "second wait reports an error, not a crash",
    )?;
    again.end().map_err(|d| d.message)?;
    Ok(())
}

fn inquiry_idempotence() -> Result<(), String> {
    registry().connect(908, Connection::memory_with_records(vec![]));
    let mut st = IoStatement::begin(
        Direction::Input,
        Mode::ListDirected,
        Locus::External(908),
        None,
        0,
    );
    let mut v = 0i64;
    check(!st.input_integer(&mut v), "read past end fails")?;
    for _ in 0..3 {
        check(st.iostat() == iostat::IOSTAT_END, "iostat stable")?;
        check(st.is_end() && !st.is_err() && !st.is_eor(), "predicates stable")?;
    }
    st.end().map_err(|d| d.message)?;
    Ok(())
}

/// The built-in conformance scenario set.
pub fn scenarios() -> Vec<Scenario> {
    vec![
        Scenario {
            name: "begin_end_without_transfers",
            contract: "lifecycle",
            run: begin_end_without_transfers,
        },
        Scenario {
            name: "options_last_writer_then_freeze",
            contract: "options",
            run: options_last_writer_then_freeze,
        },
        Scenario {
            name: "format_reversion_and_empty_format",
            contract: "format-reversion",
            run: format_reversion_and_empty_format,
        },
        Scenario {
            name: "unformatted_internal_round_trip",
            contract: "round-trip",
            run: unformatted_internal_round_trip,
        },
        Scenario {
            name: "nesting_depth_boundary",
            contract: "format-nesting",
            run: nesting_depth_boundary,
        },
        Scenario {
            name: "list_output_single_integer",
            contract: "list-output",
            run: list_output_single_integer,
        },
        Scenario {
            name: "async_records_and_double_wait",
            contract: "async",
            run: async_records_and_double_wait,
        },
        Scenario {
            name: "inquiry_idempotence",
            contract: "inquiry",
            run: inquiry_idempotence,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_scenario_passes() {
        let _guard = serial_guard();
        for s in scenarios() {
            if let Err(e) = (s.run)() {
                panic!("{} ({}): {e}", s.name, s.contract);
            }
        }
    }

    #[test]
    fn test_scenario_names_unique() {
        let mut names: Vec<_> = scenarios().iter().map(|s| s.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), scenarios().len());
    }
}
