//! Benchmarks for encsniff.
//!
//! Run with:
//!     cargo bench

use std::io::Cursor;
use std::sync::mpsc;

use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};

use encsniff::{CandidateClassifier, ClassifierSession, DetectConfig, Detector, InlineExecutor};

fn sample(encoding: &'static encoding_rs::Encoding, size: usize) -> Vec<u8> {
    let text = "日本語のテキストです。カタカナとひらがな、漢字。 plain ascii too.\n";
    let (bytes, _, _) = encoding.encode(text);
    bytes.iter().copied().cycle().take(size).collect()
}

fn bench_classifier(c: &mut Criterion) {
    let mut group = c.benchmark_group("classifier");

    for size in [64 * 1024, 1024 * 1024] {
        let ascii: Vec<u8> = (0..size).map(|i| b' ' + (i % 90) as u8).collect();
        let utf8 = sample(encoding_rs::UTF_8, size);
        let sjis = sample(encoding_rs::SHIFT_JIS, size);

        group.throughput(Throughput::Bytes(size as u64));
        for (name, data) in [("ascii", &ascii), ("utf8", &utf8), ("sjis", &sjis)] {
            group.bench_with_input(format!("{}_{}kb", name, size / 1024), data, |b, data| {
                b.iter(|| {
                    let mut session = ClassifierSession::new(CandidateClassifier::new());
                    session.analyze(black_box(data));
                    black_box(session.finish())
                });
            });
        }
    }

    group.finish();
}

fn bench_high_water_marks(c: &mut Criterion) {
    let mut group = c.benchmark_group("high_water_mark");
    let size = 1024 * 1024; // 1 MB
    let data = sample(encoding_rs::EUC_JP, size);
    group.throughput(Throughput::Bytes(size as u64));

    for hwm in [4 * 1024, 64 * 1024, 1024 * 1024] {
        let detector = Detector::new(DetectConfig::new(hwm).unwrap()).unwrap();

        group.bench_function(format!("bytes_{}kb", hwm / 1024), |b| {
            b.iter(|| black_box(detector.detect_bytes(black_box(&data))));
        });

        group.bench_function(format!("pipeline_{}kb", hwm / 1024), |b| {
            b.iter(|| {
                let (tx, rx) = mpsc::channel();
                detector.detect_reader(
                    Cursor::new(data.clone()),
                    InlineExecutor,
                    InlineExecutor,
                    move |result| {
                        tx.send(result).ok();
                    },
                );
                black_box(rx.recv().ok())
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_classifier, bench_high_water_marks);
criterion_main!(benches);
