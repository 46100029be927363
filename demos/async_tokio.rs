//! Run several detections on a tokio runtime.
//!
//! The runtime handle serves as both executors: reads go to the blocking
//! pool, callbacks report back through oneshot channels.
//!
//! Run with:
//!     cargo run --example async_tokio --features tokio

use std::io::Cursor;

use encsniff::{DetectConfig, Detector};
use tokio::runtime::Handle;
use tokio::sync::oneshot;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let detector = Detector::new(DetectConfig::new(4 * 1024)?)?;
    let handle = Handle::current();

    let inputs: Vec<(&str, Vec<u8>)> = vec![
        ("utf-8", "日本語のテキスト".repeat(10_000).into_bytes()),
        ("gb18030", encoding_rs::GB18030.encode(&"中文文本".repeat(10_000)).0.into_owned()),
        ("euc-kr", encoding_rs::EUC_KR.encode(&"한국어 텍스트".repeat(10_000)).0.into_owned()),
    ];

    let mut pending = Vec::new();
    for (label, data) in inputs {
        let (tx, rx) = oneshot::channel();
        let token = detector.detect_reader(
            Cursor::new(data),
            handle.clone(),
            handle.clone(),
            move |result| {
                let _ = tx.send(result);
            },
        );
        pending.push((label, token, rx));
    }

    // A pre-cancelled token still yields exactly one (best-effort) result
    let (tx, rx) = oneshot::channel();
    let token = detector.detect_reader(
        Cursor::new(vec![b'a'; 1 << 20]),
        handle.clone(),
        handle.clone(),
        move |result| {
            let _ = tx.send(result);
        },
    );
    token.cancel();
    pending.push(("cancelled", token, rx));

    for (label, _token, rx) in pending {
        let result = rx.await?;
        println!("{:>10}: {:?}", label, result);
    }

    Ok(())
}
