//! Whole-statement transfer throughput.

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use ferrio_core::unit::{Connection, registry};
use ferrio_core::{Direction, InternalFile, IoStatement, Locus, Mode};

fn bench_list_output(c: &mut Criterion) {
    registry().connect(9901, Connection::memory());
    c.bench_function("list_output_10_ints", |b| {
        b.iter(|| {
            let mut st = IoStatement::begin(
                Direction::Output,
                Mode::ListDirected,
                Locus::External(9901),
                None,
                0,
            );
            for v in 0..10 {
                st.output_integer(black_box(v));
            }
            st.end().unwrap();
        })
    });
}

fn bench_formatted_output(c: &mut Criterion) {
    registry().connect(9902, Connection::memory());
    c.bench_function("formatted_output_reals", |b| {
        b.iter(|| {
            let mut st = IoStatement::begin(
                Direction::Output,
                Mode::Formatted,
                Locus::External(9902),
                Some(b"(5F12.4)"),
                0,
            );
            for v in 0..5 {
                st.output_real64(black_box(v as f64 * 1.5));
            }
            st.end().unwrap();
        })
    });
}

fn bench_unformatted_round_trip(c: &mut Criterion) {
    c.bench_function("unformatted_internal_round_trip", |b| {
        b.iter(|| {
            let mut st = IoStatement::begin(
                Direction::Output,
                Mode::Unformatted,
                Locus::Internal(InternalFile::for_output(256, 1)),
                None,
                0,
            );
            for v in 0..16 {
                st.output_integer(black_box(v));
            }
            let flat = st.end().unwrap().internal.unwrap().into_flat();

            let mut st = IoStatement::begin(
                Direction::Input,
                Mode::Unformatted,
                Locus::Internal(InternalFile::from_flat(&flat, 256)),
                None,
                0,
            );
            let mut out = 0i64;
            for _ in 0..16 {
                st.input_integer(&mut out);
            }
            st.end().unwrap();
        })
    });
}

criterion_group!(
    benches,
    bench_list_output,
    bench_formatted_output,
    bench_unformatted_round_trip
);
criterion_main!(benches);
