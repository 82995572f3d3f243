//! Format interpreter throughput.

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use ferrio_core::format::cursor::{ControlSink, DEFAULT_MAX_NESTING, FormatCursor};
use ferrio_core::iostat::IoError;
use ferrio_core::options::{BlankMode, DecimalMode, RoundMode, SignMode};

/// Sink that swallows control effects.
struct NullSink;

impl ControlSink for NullSink {
    fn literal(&mut self, _text: &[u8]) -> Result<(), IoError> {
        Ok(())
    }
    fn end_record(&mut self) -> Result<(), IoError> {
        Ok(())
    }
    fn column(&mut self, _col: u32) -> Result<(), IoError> {
        Ok(())
    }
    fn relative(&mut self, _delta: i32) -> Result<(), IoError> {
        Ok(())
    }
    fn scale(&mut self, _k: i32) {}
    fn sign(&mut self, _mode: SignMode) {}
    fn blank(&mut self, _mode: BlankMode) {}
    fn decimal(&mut self, _mode: DecimalMode) {}
    fn round(&mut self, _mode: RoundMode) {}
}

fn bench_simple_format(c: &mut Criterion) {
    c.bench_function("cursor_simple_ints", |b| {
        b.iter(|| {
            let mut cursor = FormatCursor::new(black_box(b"(10I5)"), DEFAULT_MAX_NESTING);
            let mut sink = NullSink;
            for _ in 0..10 {
                cursor.next_data_edit(&mut sink).unwrap();
            }
        })
    });
}

fn bench_nested_groups(c: &mut Criterion) {
    c.bench_function("cursor_nested_groups", |b| {
        b.iter(|| {
            let mut cursor = FormatCursor::new(
                black_box(b"(2(I2,2(F6.2,1X),'sep'),E12.4)"),
                DEFAULT_MAX_NESTING,
            );
            let mut sink = NullSink;
            for _ in 0..11 {
                cursor.next_data_edit(&mut sink).unwrap();
            }
        })
    });
}

fn bench_reversion(c: &mut Criterion) {
    c.bench_function("cursor_reversion", |b| {
        b.iter(|| {
            let mut cursor = FormatCursor::new(black_box(b"(I6)"), DEFAULT_MAX_NESTING);
            let mut sink = NullSink;
            for _ in 0..100 {
                cursor.next_data_edit(&mut sink).unwrap();
            }
        })
    });
}

criterion_group!(
    benches,
    bench_simple_format,
    bench_nested_groups,
    bench_reversion
);
criterion_main!(benches);
