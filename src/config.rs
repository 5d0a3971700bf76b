//! Run configuration.
//!
//! Built once from command-line input and passed by reference into
//! [`crate::conversion::convert`].

use std::path::{Path, PathBuf};

use crate::error::ConvertError;
use crate::ir::io_voc_xml::{GroupOptions, GroupingPolicy};

#[derive(Clone, Debug)]
pub struct ConvertConfig {
    /// Directory holding the VOC XML files.
    pub xml_dir: PathBuf,
    /// Label map (`.pbtxt`) path.
    pub label_map: PathBuf,
    /// Output TFRecord path. Created or truncated.
    pub output: PathBuf,
    /// Directory the images are read from. Defaults to `xml_dir`.
    pub image_dir: Option<PathBuf>,
    pub policy: GroupingPolicy,
    /// Abort on the first malformed annotation file.
    pub strict: bool,
}

impl ConvertConfig {
    pub fn new(
        xml_dir: impl Into<PathBuf>,
        label_map: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
    ) -> Self {
        Self {
            xml_dir: xml_dir.into(),
            label_map: label_map.into(),
            output: output.into(),
            image_dir: None,
            policy: GroupingPolicy::default(),
            strict: false,
        }
    }

    pub fn image_dir(&self) -> &Path {
        self.image_dir.as_deref().unwrap_or(&self.xml_dir)
    }

    pub fn group_options(&self) -> GroupOptions {
        GroupOptions {
            policy: self.policy,
            strict: self.strict,
        }
    }

    /// Check that the input paths exist before anything is written.
    pub fn validate(&self) -> Result<(), ConvertError> {
        if !self.xml_dir.is_dir() {
            return Err(ConvertError::Config {
                message: format!(
                    "annotation directory {} does not exist or is not a directory",
                    self.xml_dir.display()
                ),
            });
        }
        if !self.label_map.is_file() {
            return Err(ConvertError::Config {
                message: format!("label map {} is not a file", self.label_map.display()),
            });
        }
        if let Some(image_dir) = &self.image_dir {
            if !image_dir.is_dir() {
                return Err(ConvertError::Config {
                    message: format!(
                        "image directory {} does not exist or is not a directory",
                        image_dir.display()
                    ),
                });
            }
        }
        if self.output.is_dir() {
            return Err(ConvertError::Config {
                message: format!("output path {} is a directory", self.output.display()),
            });
        }
        Ok(())
    }
}
