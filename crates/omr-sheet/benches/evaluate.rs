use criterion::{black_box, criterion_group, criterion_main, Criterion};
use omr_core::{binarize, BinarizeParams, PixelImageView};
use omr_markers::MarkerDetector;
use omr_sheet::{
    generate_layout, render_sheet, AnswerKey, FormConfig, OmrParams, RectifyParams,
    RenderParams, SheetMarks, SheetReader,
};

fn fixture() -> (SheetReader, image::RgbImage, AnswerKey) {
    let layout = generate_layout(&FormConfig::default());
    let key: AnswerKey = layout
        .questions
        .iter()
        .map(|q| (q.number, char::from(b'A' + ((q.number - 1) % 5) as u8)))
        .collect();
    let sheet = render_sheet(
        &layout,
        &SheetMarks::from_key(&key).with_student_no("0123456789"),
        &RectifyParams::default(),
        &RenderParams::default(),
    );
    (SheetReader::new(layout, OmrParams::default()), sheet, key)
}

fn bench_binarize(c: &mut Criterion) {
    let (_, sheet, _) = fixture();
    let gray = PixelImageView::from(&sheet).to_gray();
    let params = BinarizeParams::default();
    c.bench_function("binarize_700x1100", |b| {
        b.iter(|| black_box(binarize(black_box(&gray.view()), &params)))
    });
}

fn bench_markers(c: &mut Criterion) {
    let (_, sheet, _) = fixture();
    let gray = PixelImageView::from(&sheet).to_gray();
    let binary = binarize(&gray.view(), &BinarizeParams::default());
    let detector = MarkerDetector::default();
    c.bench_function("detect_markers_700x1100", |b| {
        b.iter(|| {
            let det = detector
                .detect(black_box(&binary))
                .expect("rendered sheet has markers");
            black_box(det)
        })
    });
}

fn bench_evaluate(c: &mut Criterion) {
    let (reader, sheet, key) = fixture();
    let view = PixelImageView::from(&sheet);
    c.bench_function("evaluate_sheet_30q", |b| {
        b.iter(|| {
            let res = reader
                .evaluate(black_box(&view), Some(&key))
                .expect("rendered sheet evaluates");
            black_box(res)
        })
    });
}

criterion_group!(hotpaths, bench_binarize, bench_markers, bench_evaluate);
criterion_main!(hotpaths);
