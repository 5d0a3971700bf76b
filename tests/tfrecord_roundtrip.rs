//! End-to-end tests: annotation directory in, TFRecord file out, decoded back.

use std::fs;

use voc2tfrecord::conversion::convert;
use voc2tfrecord::ir::io_voc_xml::GroupingPolicy;
use voc2tfrecord::ir::{BBoxXYXY, Normalized};
use voc2tfrecord::tfrecord::{decode_record, read_tfrecord_file, DecodedRecord, UNRESOLVED_LABEL_ID};
use voc2tfrecord::{ConvertConfig, ConvertError};

mod common;

fn read_records(path: &std::path::Path) -> Vec<DecodedRecord> {
    read_tfrecord_file(path)
        .expect("read tfrecord")
        .iter()
        .map(|payload| decode_record(payload).expect("decode record"))
        .collect()
}

#[test]
fn single_object_is_normalized_and_labeled() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let dir = temp.path();
    let labels = dir.join("label_map.pbtxt");
    let output = dir.join("train.record");
    common::write_label_map(&labels);
    common::write_voc(dir, "a.xml", "a.jpg", 100, 200, &[("cat", [10, 20, 50, 80])]);
    common::write_image(dir, "a.jpg");

    let report = convert(&ConvertConfig::new(dir, &labels, &output)).expect("convert");
    assert_eq!(report.output.records, 1);

    let records = read_records(&output);
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.filename, "a.jpg");
    assert_eq!(record.source_id, "a.jpg");
    assert_eq!((record.width, record.height), (100, 200));
    assert_eq!(record.format, b"jpg");
    assert_eq!(record.image, common::image_bytes("a.jpg"));
    assert_eq!(
        record.boxes,
        vec![BBoxXYXY::<Normalized>::from_xyxy(0.1, 0.1, 0.5, 0.4)]
    );
    assert_eq!(record.class_text, vec!["cat"]);
    assert_eq!(record.class_label, vec![1]);
}

#[test]
fn every_object_of_an_image_is_encoded() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let dir = temp.path();
    let labels = dir.join("label_map.pbtxt");
    let output = dir.join("train.record");
    common::write_label_map(&labels);
    common::write_voc(
        dir,
        "multi.xml",
        "multi.jpg",
        64,
        32,
        &[("cat", [0, 0, 32, 16]), ("dog", [32, 16, 64, 32])],
    );
    common::write_image(dir, "multi.jpg");

    convert(&ConvertConfig::new(dir, &labels, &output)).expect("convert");

    let records = read_records(&output);
    assert_eq!(records[0].class_label, vec![1, 2]);
    assert_eq!(records[0].boxes[1].xmin, 0.5);
    assert_eq!(records[0].boxes[1].ymax, 1.0);
}

#[test]
fn records_follow_filename_order_and_count_distinct_images() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let dir = temp.path();
    let labels = dir.join("label_map.pbtxt");
    let output = dir.join("train.record");
    common::write_label_map(&labels);
    common::write_voc(dir, "1.xml", "zebra.jpg", 10, 10, &[("dog", [1, 1, 2, 2])]);
    common::write_voc(dir, "2.xml", "apple.jpg", 10, 10, &[]);
    common::write_voc(dir, "3.xml", "mango.jpg", 10, 10, &[("cat", [1, 1, 9, 9])]);
    common::write_voc(dir, "4.xml", "zebra.jpg", 10, 10, &[("cat", [3, 3, 4, 4])]);
    for name in ["zebra.jpg", "apple.jpg", "mango.jpg"] {
        common::write_image(dir, name);
    }

    let report = convert(&ConvertConfig::new(dir, &labels, &output)).expect("convert");
    assert_eq!(report.input.xml_files, 4);
    assert_eq!(report.input.images, 3);

    let records = read_records(&output);
    let names: Vec<_> = records.iter().map(|r| r.filename.as_str()).collect();
    assert_eq!(names, vec!["apple.jpg", "mango.jpg", "zebra.jpg"]);
    assert!(records[0].boxes.is_empty());
}

#[test]
fn duplicate_filenames_follow_grouping_policy() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let dir = temp.path();
    let labels = dir.join("label_map.pbtxt");
    common::write_label_map(&labels);
    common::write_voc(dir, "b1.xml", "b.jpg", 20, 20, &[("cat", [0, 0, 10, 10])]);
    common::write_voc(dir, "b2.xml", "b.jpg", 20, 20, &[("dog", [10, 10, 20, 20])]);
    common::write_image(dir, "b.jpg");

    let union_out = dir.join("union.record");
    convert(&ConvertConfig::new(dir, &labels, &union_out)).expect("convert union");
    let union = read_records(&union_out);
    assert_eq!(union.len(), 1);
    assert_eq!(union[0].class_text, vec!["cat", "dog"]);

    let first_out = dir.join("first.record");
    let mut config = ConvertConfig::new(dir, &labels, &first_out);
    config.policy = GroupingPolicy::FirstFile;
    convert(&config).expect("convert first-file");
    let first = read_records(&first_out);
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].class_text, vec!["cat"]);
}

#[test]
fn unknown_label_is_written_with_marker_id() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let dir = temp.path();
    let labels = dir.join("label_map.pbtxt");
    let output = dir.join("train.record");
    common::write_label_map(&labels);
    common::write_voc(
        dir,
        "a.xml",
        "a.jpg",
        10,
        10,
        &[("horse", [1, 1, 2, 2]), ("dog", [2, 2, 3, 3])],
    );
    common::write_image(dir, "a.jpg");

    let report = convert(&ConvertConfig::new(dir, &labels, &output)).expect("convert");
    assert_eq!(report.output.unresolved_objects, 1);
    assert_eq!(report.warning_count(), 1);

    let records = read_records(&output);
    assert_eq!(records[0].class_label, vec![UNRESOLVED_LABEL_ID, 2]);
    assert_eq!(records[0].class_text, vec!["horse", "dog"]);
}

#[test]
fn empty_directory_is_no_input_and_writes_nothing() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let ann_dir = temp.path().join("annotations");
    fs::create_dir_all(&ann_dir).expect("create annotations dir");
    let labels = temp.path().join("label_map.pbtxt");
    let output = temp.path().join("train.record");
    common::write_label_map(&labels);

    let err = convert(&ConvertConfig::new(&ann_dir, &labels, &output)).unwrap_err();
    assert!(matches!(err, ConvertError::NoInput { .. }));
    assert!(!output.exists());
}

#[test]
fn empty_label_map_writes_nothing() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let dir = temp.path();
    let labels = dir.join("label_map.pbtxt");
    let output = dir.join("train.record");
    fs::write(&labels, "item {\n  name: \"cat\"\n}\n").expect("write labels");
    common::write_voc(dir, "a.xml", "a.jpg", 10, 10, &[("cat", [1, 1, 2, 2])]);
    common::write_image(dir, "a.jpg");

    let err = convert(&ConvertConfig::new(dir, &labels, &output)).unwrap_err();
    assert!(matches!(err, ConvertError::LabelMapEmpty { .. }));
    assert!(!output.exists());
}

#[test]
fn malformed_file_is_skipped_or_fatal_in_strict_mode() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let dir = temp.path();
    let labels = dir.join("label_map.pbtxt");
    let output = dir.join("train.record");
    common::write_label_map(&labels);
    common::write_voc(dir, "good.xml", "a.jpg", 10, 10, &[("cat", [1, 1, 2, 2])]);
    fs::write(
        dir.join("broken.xml"),
        common::voc_xml("b.jpg", 10, 10, &[("cat", [1, 1, 2, 2])]).replace("<ymax>2</ymax>", ""),
    )
    .expect("write broken xml");
    common::write_image(dir, "a.jpg");

    let report = convert(&ConvertConfig::new(dir, &labels, &output)).expect("lenient convert");
    assert_eq!(report.input.skipped_files, 1);
    assert_eq!(report.output.records, 1);

    let strict_out = dir.join("strict.record");
    let mut config = ConvertConfig::new(dir, &labels, &strict_out);
    config.strict = true;
    let err = convert(&config).unwrap_err();
    assert!(matches!(err, ConvertError::VocXmlParse { .. }));
    assert!(!strict_out.exists());
}

#[test]
fn images_can_live_in_a_separate_directory() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let ann_dir = temp.path().join("annotations");
    let img_dir = temp.path().join("images");
    fs::create_dir_all(&ann_dir).expect("create annotations dir");
    fs::create_dir_all(&img_dir).expect("create images dir");
    let labels = temp.path().join("label_map.pbtxt");
    let output = temp.path().join("train.record");
    common::write_label_map(&labels);
    common::write_voc(&ann_dir, "a.xml", "a.jpg", 10, 10, &[("cat", [1, 1, 2, 2])]);
    common::write_image(&img_dir, "a.jpg");

    let mut config = ConvertConfig::new(&ann_dir, &labels, &output);
    config.image_dir = Some(img_dir);
    convert(&config).expect("convert");
    assert_eq!(read_records(&output)[0].image, common::image_bytes("a.jpg"));
}

#[test]
fn output_is_truncated_on_rerun() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let dir = temp.path();
    let labels = dir.join("label_map.pbtxt");
    let output = dir.join("train.record");
    common::write_label_map(&labels);
    common::write_voc(dir, "a.xml", "a.jpg", 10, 10, &[("cat", [1, 1, 2, 2])]);
    common::write_image(dir, "a.jpg");

    let config = ConvertConfig::new(dir, &labels, &output);
    convert(&config).expect("first run");
    let first = fs::read(&output).expect("read first");
    convert(&config).expect("second run");
    let second = fs::read(&output).expect("read second");
    assert_eq!(first, second);
}
