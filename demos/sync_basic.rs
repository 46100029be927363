//! Basic synchronous detection of in-memory data.
//!
//! Run with:
//!     cargo run --example sync_basic

use encsniff::{CandidateClassifier, ClassifierSession, DetectConfig, Detector};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let detector = Detector::new(DetectConfig::default())?;

    let samples: Vec<(&str, Vec<u8>)> = vec![
        ("ascii", b"hello, world\n".to_vec()),
        ("utf-8", "naïve café".as_bytes().to_vec()),
        ("shift_jis", encoding_rs::SHIFT_JIS.encode("日本語のテキスト").0.into_owned()),
        ("euc-jp", encoding_rs::EUC_JP.encode("日本語のテキスト").0.into_owned()),
        ("binary", vec![0x00, 0x01, 0x02, 0xff]),
        ("empty", Vec::new()),
    ];

    for (label, data) in &samples {
        println!("{:>10}: {:?}", label, detector.detect_bytes(data));
    }

    // Feeding a session by hand, the way a network handler would
    let mut session = ClassifierSession::new(CandidateClassifier::new());
    let data = encoding_rs::SHIFT_JIS.encode("カタカナとひらがな").0;
    for piece in data.chunks(3) {
        session.analyze(piece);
    }
    println!(
        "\nsession: {:?} after {} bytes",
        session.finish(),
        session.bytes_analyzed()
    );

    Ok(())
}
