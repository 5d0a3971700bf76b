//! Turning annotation groups into serialized `tf.train.Example` records.
//!
//! Feature keys follow the TensorFlow Object Detection API, so the output can
//! be fed straight into its input pipelines.

use std::collections::BTreeMap;

use prost::Message;
use tracing::warn;

use super::example::{Example, Feature, Features};
use crate::ir::{BBoxXYXY, ImageAnnotationGroup, Normalized};
use crate::label_map::LabelMap;

pub const KEY_HEIGHT: &str = "image/height";
pub const KEY_WIDTH: &str = "image/width";
pub const KEY_FILENAME: &str = "image/filename";
pub const KEY_SOURCE_ID: &str = "image/source_id";
pub const KEY_ENCODED: &str = "image/encoded";
pub const KEY_FORMAT: &str = "image/format";
pub const KEY_BBOX_XMIN: &str = "image/object/bbox/xmin";
pub const KEY_BBOX_XMAX: &str = "image/object/bbox/xmax";
pub const KEY_BBOX_YMIN: &str = "image/object/bbox/ymin";
pub const KEY_BBOX_YMAX: &str = "image/object/bbox/ymax";
pub const KEY_CLASS_TEXT: &str = "image/object/class/text";
pub const KEY_CLASS_LABEL: &str = "image/object/class/label";

/// Value of `image/format` for every record. The image bytes are never
/// inspected.
pub const IMAGE_FORMAT: &[u8] = b"jpg";

/// Class id written for a label that is not in the label map.
///
/// Label map ids are always positive, so this cannot collide with a real id.
pub const UNRESOLVED_LABEL_ID: i64 = -1;

/// One serialized `tf.train.Example`, ready to be framed into a container.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedRecord {
    bytes: Vec<u8>,
    /// Number of objects encoded into the record.
    pub objects: usize,
    /// Labels that were not found in the label map, one entry per object.
    pub unresolved: Vec<String>,
}

impl EncodedRecord {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Encode every object of `group` together with the raw image bytes.
pub fn encode_group(
    group: &ImageAnnotationGroup,
    label_map: &LabelMap,
    image_bytes: Vec<u8>,
) -> EncodedRecord {
    let count = group.objects.len();
    let mut xmins = Vec::with_capacity(count);
    let mut xmaxs = Vec::with_capacity(count);
    let mut ymins = Vec::with_capacity(count);
    let mut ymaxs = Vec::with_capacity(count);
    let mut class_text = Vec::with_capacity(count);
    let mut class_label = Vec::with_capacity(count);
    let mut unresolved = Vec::new();

    for object in &group.objects {
        let bbox = object.bbox.to_normalized(group.width, group.height);
        xmins.push(bbox.xmin);
        xmaxs.push(bbox.xmax);
        ymins.push(bbox.ymin);
        ymaxs.push(bbox.ymax);

        class_text.push(object.label.as_bytes().to_vec());
        let id = match label_map.lookup(&object.label) {
            Some(id) => id,
            None => {
                warn!(filename = %group.filename, label = %object.label, "label not found in label map");
                unresolved.push(object.label.clone());
                UNRESOLVED_LABEL_ID
            }
        };
        class_label.push(id);
    }

    let filename = group.filename.as_bytes().to_vec();

    let mut feature = BTreeMap::new();
    feature.insert(KEY_HEIGHT.to_string(), Feature::int64(i64::from(group.height)));
    feature.insert(KEY_WIDTH.to_string(), Feature::int64(i64::from(group.width)));
    feature.insert(KEY_FILENAME.to_string(), Feature::bytes(filename.clone()));
    feature.insert(KEY_SOURCE_ID.to_string(), Feature::bytes(filename));
    feature.insert(KEY_ENCODED.to_string(), Feature::bytes(image_bytes));
    feature.insert(KEY_FORMAT.to_string(), Feature::bytes(IMAGE_FORMAT));
    feature.insert(KEY_BBOX_XMIN.to_string(), Feature::float_list(xmins));
    feature.insert(KEY_BBOX_XMAX.to_string(), Feature::float_list(xmaxs));
    feature.insert(KEY_BBOX_YMIN.to_string(), Feature::float_list(ymins));
    feature.insert(KEY_BBOX_YMAX.to_string(), Feature::float_list(ymaxs));
    feature.insert(KEY_CLASS_TEXT.to_string(), Feature::bytes_list(class_text));
    feature.insert(KEY_CLASS_LABEL.to_string(), Feature::int64_list(class_label));

    let example = Example {
        features: Some(Features { feature }),
    };

    EncodedRecord {
        bytes: example.encode_to_vec(),
        objects: count,
        unresolved,
    }
}

/// A record read back from a container, with typed fields.
#[derive(Clone, Debug, PartialEq)]
pub struct DecodedRecord {
    pub filename: String,
    pub source_id: String,
    pub width: u32,
    pub height: u32,
    pub format: Vec<u8>,
    pub image: Vec<u8>,
    pub boxes: Vec<BBoxXYXY<Normalized>>,
    pub class_text: Vec<String>,
    pub class_label: Vec<i64>,
}

/// Decode a record payload produced by [`encode_group`].
///
/// The error is a human-readable description; the container reader attaches
/// the file path and offset.
pub fn decode_record(payload: &[u8]) -> Result<DecodedRecord, String> {
    let example = Example::decode(payload).map_err(|err| err.to_string())?;
    let features = example
        .features
        .ok_or_else(|| "record has no features".to_string())?
        .feature;

    let bytes_feature = |key: &str| -> Result<Vec<Vec<u8>>, String> {
        features
            .get(key)
            .and_then(Feature::as_bytes_list)
            .map(<[Vec<u8>]>::to_vec)
            .ok_or_else(|| format!("missing bytes feature '{key}'"))
    };
    let single_bytes = |key: &str| -> Result<Vec<u8>, String> {
        bytes_feature(key)?
            .into_iter()
            .next()
            .ok_or_else(|| format!("empty bytes feature '{key}'"))
    };
    let float_feature = |key: &str| -> Result<Vec<f32>, String> {
        features
            .get(key)
            .and_then(Feature::as_float_list)
            .map(<[f32]>::to_vec)
            .ok_or_else(|| format!("missing float feature '{key}'"))
    };
    let int_feature = |key: &str| -> Result<Vec<i64>, String> {
        features
            .get(key)
            .and_then(Feature::as_int64_list)
            .map(<[i64]>::to_vec)
            .ok_or_else(|| format!("missing int64 feature '{key}'"))
    };
    let dimension = |key: &str| -> Result<u32, String> {
        let value = int_feature(key)?
            .first()
            .copied()
            .ok_or_else(|| format!("empty int64 feature '{key}'"))?;
        u32::try_from(value).map_err(|_| format!("'{key}' value {value} out of range"))
    };
    let utf8 = |key: &str, raw: Vec<u8>| -> Result<String, String> {
        String::from_utf8(raw).map_err(|_| format!("'{key}' is not valid UTF-8"))
    };

    let xmins = float_feature(KEY_BBOX_XMIN)?;
    let xmaxs = float_feature(KEY_BBOX_XMAX)?;
    let ymins = float_feature(KEY_BBOX_YMIN)?;
    let ymaxs = float_feature(KEY_BBOX_YMAX)?;
    let class_text = bytes_feature(KEY_CLASS_TEXT)?
        .into_iter()
        .map(|raw| utf8(KEY_CLASS_TEXT, raw))
        .collect::<Result<Vec<_>, _>>()?;
    let class_label = int_feature(KEY_CLASS_LABEL)?;

    let count = xmins.len();
    if [xmaxs.len(), ymins.len(), ymaxs.len(), class_text.len(), class_label.len()]
        .iter()
        .any(|len| *len != count)
    {
        return Err("per-object feature lists have different lengths".to_string());
    }

    let boxes = (0..count)
        .map(|i| BBoxXYXY::<Normalized>::from_xyxy(xmins[i], ymins[i], xmaxs[i], ymaxs[i]))
        .collect();

    Ok(DecodedRecord {
        filename: utf8(KEY_FILENAME, single_bytes(KEY_FILENAME)?)?,
        source_id: utf8(KEY_SOURCE_ID, single_bytes(KEY_SOURCE_ID)?)?,
        width: dimension(KEY_WIDTH)?,
        height: dimension(KEY_HEIGHT)?,
        format: single_bytes(KEY_FORMAT)?,
        image: single_bytes(KEY_ENCODED)?,
        boxes,
        class_text,
        class_label,
    })
}
