use ceremony_script_engine::{
    ContentSynchronizer, EditorSurface, FormatCommand, FormattingController, SelectionOffsets,
    capture_offsets, restore_offsets,
};
use criterion::{Criterion, criterion_group, criterion_main};

/// Roughly `paragraphs * 120` characters of mixed formatting
fn generate_script(paragraphs: usize) -> String {
    let base = "Dearly <b>beloved</b>, we are gathered here <i>today</i> to celebrate \
                <span style=\"color: #aa0000\">Sam and Alex</span>.<br>\
                <ul><li>Reading</li><li>Vows</li></ul>";
    base.repeat(paragraphs)
}

fn bench_selection(c: &mut Criterion) {
    let mut group = c.benchmark_group("selection");
    group.sample_size(20);

    let mut surface = EditorSurface::from_markup(&generate_script(60));
    let len = surface.document().char_len();
    let offsets = SelectionOffsets::new(len / 3, len / 2);
    restore_offsets(&mut surface, offsets);

    group.bench_function("capture", |b| {
        b.iter(|| std::hint::black_box(capture_offsets(std::hint::black_box(&surface))));
    });

    group.bench_function("restore", |b| {
        let mut s = surface.clone();
        b.iter(|| {
            restore_offsets(&mut s, std::hint::black_box(offsets));
            std::hint::black_box(&s);
        });
    });

    group.bench_function("toggle_bold", |b| {
        let mut s = surface.clone();
        let mut sync = ContentSynchronizer::new(s.content());
        let mut controller = FormattingController::default();
        b.iter(|| {
            std::hint::black_box(controller.apply_format(&mut s, &mut sync, FormatCommand::Bold));
        });
    });

    group.finish();
}

criterion_group!(benches, bench_selection);
criterion_main!(benches);
