#![allow(dead_code)]

use std::collections::BTreeMap;

use proptest::prelude::*;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};
use voc2tfrecord::ir::{BBoxXYXY, ImageAnnotationGroup, ObjectAnnotation, Pixel};

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

/// A label name as it might appear in a label map.
pub fn arb_label_name() -> impl Strategy<Value = String> {
    proptest::string::string_regex("[a-z][a-z0-9_]{0,11}").expect("valid label regex")
}

/// Unique label names with positive ids.
pub fn arb_label_entries(max: usize) -> impl Strategy<Value = BTreeMap<String, i64>> {
    proptest::collection::btree_map(arb_label_name(), 1i64..10_000, 0..=max)
}

#[derive(Clone, Copy, Debug)]
pub enum Quote {
    Double,
    Single,
    None,
}

pub fn arb_quote() -> impl Strategy<Value = Quote> {
    prop_oneof![Just(Quote::Double), Just(Quote::Single), Just(Quote::None)]
}

/// Render entries as `item { name: ... id: ... }` blocks.
pub fn render_label_map(entries: &[(String, i64, Quote)]) -> String {
    let mut text = String::new();
    for (name, id, quote) in entries {
        let name = match quote {
            Quote::Double => format!("\"{name}\""),
            Quote::Single => format!("'{name}'"),
            Quote::None => name.clone(),
        };
        text.push_str(&format!("item {{\n  name: {name}\n  id: {id}\n}}\n\n"));
    }
    text
}

/// A group whose boxes lie inside the image.
pub fn arb_group(max_objects: usize) -> impl Strategy<Value = ImageAnnotationGroup> {
    (
        proptest::string::string_regex("[a-z0-9_]{1,12}\\.jpg").expect("valid filename regex"),
        1u32..4096,
        1u32..4096,
    )
        .prop_flat_map(move |(filename, width, height)| {
            let object = (
                prop_oneof![Just("cat".to_string()), Just("dog".to_string()), arb_label_name()],
                0..=i64::from(width),
                0..=i64::from(width),
                0..=i64::from(height),
                0..=i64::from(height),
            )
                .prop_map(|(label, x1, x2, y1, y2)| {
                    ObjectAnnotation::new(
                        label,
                        BBoxXYXY::<Pixel>::from_xyxy(x1.min(x2), y1.min(y2), x1.max(x2), y1.max(y2)),
                    )
                });
            proptest::collection::vec(object, 0..=max_objects).prop_map(move |objects| {
                ImageAnnotationGroup::new(filename.clone(), width, height).with_objects(objects)
            })
        })
}
