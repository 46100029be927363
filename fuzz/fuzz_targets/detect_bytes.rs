#![no_main]

use libfuzzer_sys::fuzz_target;
use encsniff::{CandidateClassifier, ClassifierSession, DetectConfig, Detector};

fuzz_target!(|data: Vec<u8>| {
    let reference = {
        let mut session = ClassifierSession::new(CandidateClassifier::new());
        session.analyze(&data);
        session.finish()
    };

    // Verify: verdict does not depend on slice size
    for hwm in [1, 3, 64, 4096] {
        let detector = Detector::new(DetectConfig::new(hwm).unwrap()).unwrap();
        assert_eq!(detector.detect_bytes(&data), reference);
    }

    // Verify: reset leaves no trace of the previous input
    let mut session = ClassifierSession::new(CandidateClassifier::new());
    session.analyze(&data);
    session.finish();
    session.reset();
    session.analyze(b"plain");
    assert_eq!(session.finish().as_deref(), Some("ASCII"));

    // Verify: names are never empty
    if let Some(name) = reference {
        assert!(!name.is_empty());
    }
});
