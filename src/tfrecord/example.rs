//! `tf.train.Example` protobuf messages.
//!
//! Field numbers match TensorFlow's `example.proto` and `feature.proto`.
//! The feature map is a `BTreeMap` so the same record always serializes to
//! the same bytes.

use std::collections::BTreeMap;

#[derive(Clone, PartialEq, prost::Message)]
pub struct BytesList {
    #[prost(bytes = "vec", repeated, tag = "1")]
    pub value: Vec<Vec<u8>>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct FloatList {
    #[prost(float, repeated, tag = "1")]
    pub value: Vec<f32>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Int64List {
    #[prost(int64, repeated, tag = "1")]
    pub value: Vec<i64>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Feature {
    #[prost(oneof = "feature::Kind", tags = "1, 2, 3")]
    pub kind: Option<feature::Kind>,
}

pub mod feature {
    #[derive(Clone, PartialEq, prost::Oneof)]
    pub enum Kind {
        #[prost(message, tag = "1")]
        BytesList(super::BytesList),
        #[prost(message, tag = "2")]
        FloatList(super::FloatList),
        #[prost(message, tag = "3")]
        Int64List(super::Int64List),
    }
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Features {
    #[prost(btree_map = "string, message", tag = "1")]
    pub feature: BTreeMap<String, Feature>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Example {
    #[prost(message, optional, tag = "1")]
    pub features: Option<Features>,
}

impl Feature {
    pub fn bytes(value: impl Into<Vec<u8>>) -> Self {
        Self::bytes_list(vec![value.into()])
    }

    pub fn bytes_list(value: Vec<Vec<u8>>) -> Self {
        Self {
            kind: Some(feature::Kind::BytesList(BytesList { value })),
        }
    }

    pub fn float_list(value: Vec<f32>) -> Self {
        Self {
            kind: Some(feature::Kind::FloatList(FloatList { value })),
        }
    }

    pub fn int64(value: i64) -> Self {
        Self::int64_list(vec![value])
    }

    pub fn int64_list(value: Vec<i64>) -> Self {
        Self {
            kind: Some(feature::Kind::Int64List(Int64List { value })),
        }
    }

    /// Returns the bytes values, or `None` if this is not a bytes feature.
    pub fn as_bytes_list(&self) -> Option<&[Vec<u8>]> {
        match &self.kind {
            Some(feature::Kind::BytesList(list)) => Some(&list.value),
            _ => None,
        }
    }

    pub fn as_float_list(&self) -> Option<&[f32]> {
        match &self.kind {
            Some(feature::Kind::FloatList(list)) => Some(&list.value),
            _ => None,
        }
    }

    pub fn as_int64_list(&self) -> Option<&[i64]> {
        match &self.kind {
            Some(feature::Kind::Int64List(list)) => Some(&list.value),
            _ => None,
        }
    }
}
