//! TFRecord output: `tf.train.Example` encoding and container framing.

pub mod container;
pub mod encode;
pub mod example;

pub use container::{masked_crc32c, read_tfrecord_file, TfRecordReader, TfRecordWriter};
pub use encode::{decode_record, encode_group, DecodedRecord, EncodedRecord, UNRESOLVED_LABEL_ID};
