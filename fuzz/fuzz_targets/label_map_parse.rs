//! Fuzz target for label map parsing.

#![no_main]

use libfuzzer_sys::fuzz_target;
use voc2tfrecord::label_map::LabelMap;

fuzz_target!(|data: &[u8]| {
    if data.len() > 1024 * 1024 {
        return;
    }

    let text = String::from_utf8_lossy(data);
    let (map, _) = LabelMap::parse(&text);
    for (name, id) in map.iter() {
        assert!(!name.is_empty());
        assert!(id > 0);
    }
});
