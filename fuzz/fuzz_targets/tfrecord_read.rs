//! Fuzz target for the TFRecord reader and record decoder.
//!
//! Corrupt framing must surface as an error, never as a panic or an
//! unbounded allocation loop.

#![no_main]

use libfuzzer_sys::fuzz_target;
use voc2tfrecord::tfrecord::{decode_record, TfRecordReader};

fuzz_target!(|data: &[u8]| {
    for payload in TfRecordReader::new("<fuzz>", data) {
        match payload {
            Ok(payload) => {
                let _ = decode_record(&payload);
            }
            Err(_) => break,
        }
    }
});
