//! The conversion pipeline.
//!
//! Label map, then annotation grouping, then one encoded record per image,
//! appended to the output in file-name order. Everything runs sequentially
//! on the calling thread.

pub mod report;

pub use report::{
    ConversionIssue, ConversionIssueCode, ConversionReport, ConversionSeverity, InputCounts,
    OutputCounts,
};

use std::collections::BTreeMap;
use std::fs;

use tracing::{info, warn};

use crate::config::ConvertConfig;
use crate::error::ConvertError;
use crate::ir::io_voc_xml::{read_voc_groups, GroupingPolicy, VocGroups};
use crate::ir::ImageAnnotationGroup;
use crate::label_map::{read_label_map, LabelMap};
use crate::tfrecord::container::remove_partial;
use crate::tfrecord::{encode_group, TfRecordWriter};

/// Run a full conversion described by `config`.
///
/// Nothing is written when the label map is empty or no annotation files
/// are found. If a failure happens after the output was opened, the partial
/// file is removed.
pub fn convert(config: &ConvertConfig) -> Result<ConversionReport, ConvertError> {
    config.validate()?;

    let label_map = read_label_map(&config.label_map)?;
    let voc = read_voc_groups(&config.xml_dir, &config.group_options())?;

    if voc.groups.is_empty() {
        if voc.skipped.is_empty() {
            warn!(path = %config.xml_dir.display(), "no XML annotation files found");
            return Err(ConvertError::NoInput {
                path: config.xml_dir.clone(),
            });
        }
        warn!(
            path = %config.xml_dir.display(),
            skipped = voc.skipped.len(),
            "every XML annotation file failed to parse"
        );
        return Err(ConvertError::NoUsableInput {
            path: config.xml_dir.clone(),
            skipped: voc.skipped.len(),
        });
    }

    let object_count: usize = voc.groups.iter().map(|g| g.objects.len()).sum();
    info!(
        annotations = object_count,
        images = voc.groups.len(),
        "found annotations"
    );

    let mut report = ConversionReport::new(config.output.display().to_string());
    report.input = InputCounts {
        labels: label_map.len(),
        xml_files: voc.files_scanned,
        skipped_files: voc.skipped.len(),
        images: voc.groups.len(),
    };
    add_input_issues(&mut report, &voc, config.policy);

    let mut writer = TfRecordWriter::create(&config.output)?;
    let written = write_groups(&mut writer, &voc.groups, &label_map, config)
        .and_then(|output| writer.close().map(|records| (output, records)));
    match written {
        Ok((output, records)) => {
            report.output = output;
            info!(path = %config.output.display(), records, "wrote TFRecord");
        }
        Err(err) => {
            if let Err(cleanup) = remove_partial(&config.output) {
                warn!(path = %config.output.display(), error = %cleanup, "failed to remove partial output");
            }
            return Err(err);
        }
    }

    let mut unresolved: BTreeMap<String, usize> = BTreeMap::new();
    for group in &voc.groups {
        for object in &group.objects {
            if label_map.lookup(&object.label).is_none() {
                *unresolved.entry(object.label.clone()).or_default() += 1;
            }
        }
    }
    report.add_unresolved_labels(&unresolved);

    Ok(report)
}

fn write_groups(
    writer: &mut TfRecordWriter,
    groups: &[ImageAnnotationGroup],
    label_map: &LabelMap,
    config: &ConvertConfig,
) -> Result<OutputCounts, ConvertError> {
    let mut counts = OutputCounts::default();
    let image_dir = config.image_dir();

    for group in groups {
        let image_path = image_dir.join(&group.filename);
        let image_bytes = fs::read(&image_path).map_err(|source| ConvertError::MissingImage {
            path: image_path.clone(),
            source,
        })?;

        let record = encode_group(group, label_map, image_bytes);
        writer.append(&record)?;

        counts.records += 1;
        counts.objects += record.objects;
        counts.unresolved_objects += record.unresolved.len();
    }

    Ok(counts)
}

fn add_input_issues(report: &mut ConversionReport, voc: &VocGroups, policy: GroupingPolicy) {
    for skipped in &voc.skipped {
        report.add(ConversionIssue::warning(
            ConversionIssueCode::SkippedAnnotationFile,
            format!("skipped {}: {}", skipped.path.display(), skipped.reason),
        ));
    }

    let note = match policy {
        GroupingPolicy::Union => {
            "objects from annotation files naming the same image are merged into one record"
        }
        GroupingPolicy::FirstFile => {
            "only the first annotation file naming an image contributes objects"
        }
    };
    report.add(ConversionIssue::info(ConversionIssueCode::GroupingPolicy, note));
}
