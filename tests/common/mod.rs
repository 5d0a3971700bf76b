#![allow(dead_code)]

use std::fs;
use std::path::Path;

pub const LABEL_MAP: &str = r#"item {
  name: "cat"
  id: 1
}

item {
  name: "dog"
  id: 2
}
"#;

/// Render a VOC XML document. Objects are `(label, [xmin, ymin, xmax, ymax])`.
pub fn voc_xml(filename: &str, width: u32, height: u32, objects: &[(&str, [i64; 4])]) -> String {
    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<annotation>\n");
    xml.push_str("  <folder>images</folder>\n");
    xml.push_str(&format!("  <filename>{filename}</filename>\n"));
    xml.push_str(&format!(
        "  <size>\n    <width>{width}</width>\n    <height>{height}</height>\n    <depth>3</depth>\n  </size>\n"
    ));
    for (name, [xmin, ymin, xmax, ymax]) in objects {
        xml.push_str(&format!(
            "  <object>\n    <name>{name}</name>\n    <pose>Unspecified</pose>\n    <truncated>0</truncated>\n    <difficult>0</difficult>\n    <bndbox>\n      <xmin>{xmin}</xmin>\n      <ymin>{ymin}</ymin>\n      <xmax>{xmax}</xmax>\n      <ymax>{ymax}</ymax>\n    </bndbox>\n  </object>\n"
        ));
    }
    xml.push_str("</annotation>\n");
    xml
}

pub fn write_voc(dir: &Path, xml_name: &str, filename: &str, width: u32, height: u32, objects: &[(&str, [i64; 4])]) {
    fs::write(dir.join(xml_name), voc_xml(filename, width, height, objects)).expect("write xml");
}

/// Deterministic fake image bytes; the converter never decodes them.
pub fn image_bytes(filename: &str) -> Vec<u8> {
    let mut bytes = vec![0xff, 0xd8, 0xff, 0xe0];
    bytes.extend_from_slice(filename.as_bytes());
    bytes.extend_from_slice(&[0xff, 0xd9]);
    bytes
}

pub fn write_image(dir: &Path, filename: &str) {
    fs::write(dir.join(filename), image_bytes(filename)).expect("write image");
}

pub fn write_label_map(path: &Path) {
    fs::write(path, LABEL_MAP).expect("write label map");
}
