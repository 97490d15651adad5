use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tui_tpad::core::{resolve_cells, PadSession, PadSnapshot};
use tui_tpad::types::Rotation;

fn bench_resolve_cells(c: &mut Criterion) {
    c.bench_function("resolve_cells", |b| {
        b.iter(|| resolve_cells(black_box(3), black_box(4), black_box(Rotation::R90)))
    });
}

fn bench_place_undo_cycle(c: &mut Criterion) {
    let mut session = PadSession::new(8);

    c.bench_function("place_undo_cycle", |b| {
        b.iter(|| {
            session.place(black_box(3), black_box(4));
            session.undo();
        })
    });
}

fn bench_rejected_place(c: &mut Criterion) {
    let mut session = PadSession::new(8);
    session.place(3, 4);

    c.bench_function("rejected_place", |b| {
        b.iter(|| session.place(black_box(3), black_box(4)))
    });
}

fn bench_snapshot_copy(c: &mut Criterion) {
    let mut session = PadSession::new(8);
    session.place(0, 1);
    session.place(4, 4);
    let mut snapshot = PadSnapshot::default();

    c.bench_function("snapshot_copy", |b| {
        b.iter(|| snapshot.copy_from(black_box(&session)))
    });
}

fn bench_history_truncation(c: &mut Criterion) {
    c.bench_function("history_truncation", |b| {
        b.iter(|| {
            let mut session = PadSession::new(8);
            session.place(0, 1);
            session.place(4, 4);
            session.undo();
            session.undo();
            session.place(2, 5);
        })
    });
}

criterion_group!(
    benches,
    bench_resolve_cells,
    bench_place_undo_cycle,
    bench_rejected_place,
    bench_snapshot_copy,
    bench_history_truncation
);
criterion_main!(benches);
