#![no_main]

use std::io::Cursor;
use std::sync::mpsc;

use libfuzzer_sys::fuzz_target;
use encsniff::{DetectConfig, Detector, InlineExecutor, SerialExecutor};

fuzz_target!(|input: (u8, Vec<u8>)| {
    let (hwm, data) = input;
    let config = DetectConfig::new(usize::from(hwm).max(1)).unwrap();
    let detector = Detector::new(config).unwrap();
    let expected = detector.detect_bytes(&data);

    // Inline: completes before detect_reader returns
    let (tx, rx) = mpsc::channel();
    detector.detect_reader(
        Cursor::new(data.clone()),
        InlineExecutor,
        InlineExecutor,
        move |result| tx.send(result).unwrap(),
    );
    assert_eq!(rx.try_recv().unwrap(), expected);
    assert!(rx.try_recv().is_err());

    // Serial: exactly one callback, even when cancelled early
    let (tx, rx) = mpsc::channel();
    let token = detector.detect_reader(
        Cursor::new(data),
        SerialExecutor::new("fuzz-analysis").unwrap(),
        InlineExecutor,
        move |result| tx.send(result).unwrap(),
    );
    if hwm % 2 == 1 {
        token.cancel();
    }
    let result = rx.recv().unwrap();
    if hwm % 2 == 0 {
        assert_eq!(result, expected);
    }
    assert!(rx.recv().is_err());
});
