//! Integration test: statement lifecycle contract.
//!
//! Exercises whole statements end-to-end across modules: format
//! interpretation driving record assembly, option semantics, condition
//! classification, internal files, and direct access.
//!
//! Run: cargo test -p ferrio-core --test statement_contract_test

use ferrio_core::unit::{Connection, registry};
use ferrio_core::{Direction, InternalFile, IoStatement, Locus, Mode, NamelistGroup, iostat};

fn records(unit: i32) -> Vec<Vec<u8>> {
    registry().lookup(unit).unwrap().lock().memory_records()
}

fn string_records(unit: i32) -> Vec<String> {
    records(unit)
        .into_iter()
        .map(|r| String::from_utf8_lossy(&r).into_owned())
        .collect()
}

// ---------------------------------------------------------------------
// Formatted output: modes and control edits
// ---------------------------------------------------------------------

#[test]
fn formatted_output_with_sign_and_scale_modes() {
    registry().connect(601, Connection::memory());
    let mut st = IoStatement::begin(
        Direction::Output,
        Mode::Formatted,
        Locus::External(601),
        Some(b"(SP,I5,2P,F8.1)"),
        0,
    );
    assert!(st.output_integer(42));
    assert!(st.output_real64(0.125));
    st.end().unwrap();
    // SP forces the plus on both fields; 2P scales the F value by 100.
    assert_eq!(string_records(601), vec!["  +42   +12.5"]);
}

#[test]
fn formatted_output_multi_record_statement() {
    registry().connect(602, Connection::memory());
    let mut st = IoStatement::begin(
        Direction::Output,
        Mode::Formatted,
        Locus::External(602),
        Some(b"('hdr'/I4,1X,I4)"),
        0,
    );
    assert!(st.output_integer(12));
    assert!(st.output_integer(34));
    st.end().unwrap();
    assert_eq!(string_records(602), vec!["hdr", "  12   34"]);
}

#[test]
fn formatted_output_tab_edits_overwrite() {
    registry().connect(603, Connection::memory());
    let mut st = IoStatement::begin(
        Direction::Output,
        Mode::Formatted,
        Locus::External(603),
        Some(b"('0123456789',T3,A)"),
        0,
    );
    assert!(st.output_character(b"XX"));
    st.end().unwrap();
    assert_eq!(string_records(603), vec!["01XX456789"]);
}

// ---------------------------------------------------------------------
// Formatted input: blanks, implied decimal, slash
// ---------------------------------------------------------------------

#[test]
fn formatted_input_blank_zero_and_implied_decimal() {
    registry().connect(604, Connection::memory_with_records(vec![b"1 2  314".to_vec()]));
    let mut st = IoStatement::begin(
        Direction::Input,
        Mode::Formatted,
        Locus::External(604),
        Some(b"(BZ,I3,F5.2)"),
        0,
    );
    let mut n = 0i64;
    let mut x = 0f64;
    assert!(st.input_integer(&mut n));
    assert!(st.input_real64(&mut x));
    // BZ: '1 2' reads 102; ' 314' with implied point reads 3.14.
    assert_eq!(n, 102);
    assert_eq!(x, 3.14);
    st.end().unwrap();
}

#[test]
fn formatted_input_slash_advances_record() {
    registry().connect(
        605,
        Connection::memory_with_records(vec![b"11".to_vec(), b"22".to_vec()]),
    );
    let mut st = IoStatement::begin(
        Direction::Input,
        Mode::Formatted,
        Locus::External(605),
        Some(b"(I2/I2)"),
        0,
    );
    let mut a = 0i64;
    let mut b = 0i64;
    assert!(st.input_integer(&mut a));
    assert!(st.input_integer(&mut b));
    assert_eq!((a, b), (11, 22));
    st.end().unwrap();
}

#[test]
fn formatted_input_pad_fills_short_record() {
    registry().connect(606, Connection::memory_with_records(vec![b"7".to_vec()]));
    let mut st = IoStatement::begin(
        Direction::Input,
        Mode::Formatted,
        Locus::External(606),
        Some(b"(I5)"),
        0,
    );
    let mut v = 0i64;
    // PAD='YES' is the default: the field is blank extended.
    assert!(st.input_integer(&mut v));
    assert_eq!(v, 7);
    st.end().unwrap();
}

// ---------------------------------------------------------------------
// List-directed across records, character delimiters
// ---------------------------------------------------------------------

#[test]
fn list_input_spans_records() {
    registry().connect(
        607,
        Connection::memory_with_records(vec![b"1, 2,".to_vec(), b"3".to_vec()]),
    );
    let mut st = IoStatement::begin(
        Direction::Input,
        Mode::ListDirected,
        Locus::External(607),
        None,
        0,
    );
    let mut out = [0i64; 3];
    for v in out.iter_mut() {
        assert!(st.input_integer(v));
    }
    assert_eq!(out, [1, 2, 3]);
    st.end().unwrap();
}

#[test]
fn list_output_character_delimiters() {
    registry().connect(608, Connection::memory());
    let mut st = IoStatement::begin(
        Direction::Output,
        Mode::ListDirected,
        Locus::External(608),
        None,
        0,
    );
    st.set_delim(b"APOSTROPHE");
    assert!(st.output_character(b"don't"));
    st.end().unwrap();
    assert_eq!(string_records(608), vec!["'don''t'"]);
}

#[test]
fn list_input_quoted_strings_and_logicals() {
    registry().connect(
        609,
        Connection::memory_with_records(vec![b"'hi there' T (1.5,2.5)".to_vec()]),
    );
    let mut st = IoStatement::begin(
        Direction::Input,
        Mode::ListDirected,
        Locus::External(609),
        None,
        0,
    );
    let mut text = [b' '; 8];
    let mut flag = false;
    let (mut re, mut im) = (0f64, 0f64);
    assert!(st.input_character(&mut text));
    assert!(st.input_logical(&mut flag));
    assert!(st.input_complex64(&mut re, &mut im));
    assert_eq!(&text, b"hi there");
    assert!(flag);
    assert_eq!((re, im), (1.5, 2.5));
    st.end().unwrap();
}

// ---------------------------------------------------------------------
// Internal files
// ---------------------------------------------------------------------

#[test]
fn internal_list_output_fits_record() {
    let file = InternalFile::for_output(16, 1);
    let mut st = IoStatement::begin(
        Direction::Output,
        Mode::ListDirected,
        Locus::Internal(file),
        None,
        0,
    );
    assert!(st.output_integer(7));
    assert!(st.output_integer(-3));
    let out = st.end().unwrap().internal.unwrap();
    assert_eq!(out.records()[0], b"7 -3            ");
}

#[test]
fn internal_formatted_input_scalar_record() {
    let file = InternalFile::from_flat(b"  42", 4);
    let mut st = IoStatement::begin(
        Direction::Input,
        Mode::Formatted,
        Locus::Internal(file),
        Some(b"(I4)"),
        0,
    );
    let mut v = 0i64;
    assert!(st.input_integer(&mut v));
    assert_eq!(v, 42);
    st.end().unwrap();
}

// ---------------------------------------------------------------------
// Direct access
// ---------------------------------------------------------------------

#[test]
fn direct_access_write_then_read_by_record() {
    registry().connect(610, Connection::memory_direct());
    for (rec, text) in [(2i64, b"beta" as &[u8]), (1, b"alfa")] {
        let mut st = IoStatement::begin(
            Direction::Output,
            Mode::Unformatted,
            Locus::External(610),
            None,
            0,
        );
        st.set_rec(rec);
        assert!(st.output_block(text));
        st.end().unwrap();
    }

    let mut st = IoStatement::begin(
        Direction::Input,
        Mode::Unformatted,
        Locus::External(610),
        None,
        0,
    );
    st.set_rec(2);
    let mut buf = [0u8; 4];
    assert!(st.input_block(&mut buf));
    assert_eq!(&buf, b"beta");
    st.end().unwrap();
}

// ---------------------------------------------------------------------
// Namelist round trip through an external unit
// ---------------------------------------------------------------------

#[test]
fn namelist_output_then_input_round_trip() {
    registry().connect(611, Connection::memory());
    let group = || NamelistGroup::new("state", vec!["count".into(), "ratio".into()]);

    let mut out = IoStatement::begin_namelist(Direction::Output, 611, group());
    assert!(out.output_integer(12));
    assert!(out.output_real64(0.75));
    out.end().unwrap();
    assert_eq!(string_records(611), vec!["&state count=12 ratio=0.75 /"]);

    registry().connect(612, Connection::memory_with_records(records(611)));
    let mut inp = IoStatement::begin_namelist(Direction::Input, 612, group());
    let mut count = 0i64;
    let mut ratio = 0f64;
    assert!(inp.input_integer(&mut count));
    assert!(inp.input_real64(&mut ratio));
    assert_eq!((count, ratio), (12, 0.75));
    inp.end().unwrap();
}

// ---------------------------------------------------------------------
// Condition protocol
// ---------------------------------------------------------------------

#[test]
fn error_then_inspect_then_end_is_clean() {
    registry().connect(613, Connection::memory());
    let mut st = IoStatement::begin(
        Direction::Output,
        Mode::Formatted,
        Locus::External(613),
        Some(b"(Q9)"),
        0,
    );
    assert!(!st.output_integer(1));
    // Subsequent transfers stay refused without changing the code.
    assert!(!st.output_integer(2));
    assert_eq!(st.iostat(), iostat::IOSTAT_FORMAT_SYNTAX);
    assert!(!st.iomsg().is_empty());
    let summary = st.end().unwrap();
    assert_eq!(summary.iostat, iostat::IOSTAT_FORMAT_SYNTAX);
}

#[test]
fn size_reflects_nonadvancing_partial_read() {
    registry().connect(614, Connection::memory_with_records(vec![b"abcdef".to_vec()]));
    let mut st = IoStatement::begin(
        Direction::Input,
        Mode::Formatted,
        Locus::External(614),
        Some(b"(A4)"),
        0,
    );
    st.set_advance(b"NO");
    let mut buf = [0u8; 4];
    assert!(st.input_character(&mut buf));
    assert_eq!(&buf, b"abcd");
    assert_eq!(st.size(), 4);
    st.end().unwrap();
}
