//! Pascal VOC XML reader.
//!
//! Each XML file describes one image: a `<filename>`, a `<size>` block and
//! zero or more `<object>` blocks with a `<name>` and a `<bndbox>`. The
//! directory is scanned flat (non-recursive) and files are grouped by the
//! image they name.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use roxmltree::Node;
use tracing::{info, warn};
use walkdir::WalkDir;

use super::model::{ImageAnnotationGroup, ObjectAnnotation};
use super::{BBoxXYXY, Pixel};
use crate::error::ConvertError;

const VOC_XML_EXTENSION: &str = "xml";

/// How objects from several XML files naming the same image are combined.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GroupingPolicy {
    /// Concatenate objects from every file, in file order. Width and height
    /// come from the first file.
    #[default]
    Union,
    /// Keep only the first file's objects and ignore later files.
    FirstFile,
}

/// Options for [`read_voc_groups`].
#[derive(Clone, Copy, Debug, Default)]
pub struct GroupOptions {
    pub policy: GroupingPolicy,
    /// Fail on the first malformed file instead of skipping it.
    pub strict: bool,
}

/// An annotation file that was left out of the output.
#[derive(Debug)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// Result of scanning an annotation directory.
#[derive(Debug, Default)]
pub struct VocGroups {
    /// One group per distinct image file name, sorted by file name.
    pub groups: Vec<ImageAnnotationGroup>,
    /// Number of `.xml` files found at the top level of the directory.
    pub files_scanned: usize,
    /// Files that failed to parse (lenient mode only).
    pub skipped: Vec<SkippedFile>,
}

/// Read every VOC XML file in `dir` and group objects by image.
///
/// An empty directory yields an empty [`VocGroups`]; deciding whether that
/// is an error is left to the caller.
pub fn read_voc_groups(dir: &Path, opts: &GroupOptions) -> Result<VocGroups, ConvertError> {
    let xml_files = collect_xml_files(dir)?;

    let mut by_filename: BTreeMap<String, ImageAnnotationGroup> = BTreeMap::new();
    let mut skipped = Vec::new();

    for xml_path in &xml_files {
        let parsed = match parse_voc_xml(xml_path) {
            Ok(parsed) => parsed,
            Err(err) if !opts.strict => {
                warn!(path = %xml_path.display(), error = %err, "skipping malformed annotation file");
                skipped.push(SkippedFile {
                    path: xml_path.clone(),
                    reason: err.to_string(),
                });
                continue;
            }
            Err(err) => return Err(err),
        };

        match by_filename.entry(parsed.filename.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(parsed);
            }
            Entry::Occupied(mut slot) => {
                let existing = slot.get_mut();
                match opts.policy {
                    GroupingPolicy::Union => {
                        if (existing.width, existing.height) != (parsed.width, parsed.height) {
                            warn!(
                                path = %xml_path.display(),
                                filename = %parsed.filename,
                                "image size differs from the first annotation file; keeping {}x{}",
                                existing.width,
                                existing.height
                            );
                        }
                        existing.objects.extend(parsed.objects);
                    }
                    GroupingPolicy::FirstFile => {
                        warn!(
                            path = %xml_path.display(),
                            filename = %parsed.filename,
                            "image already annotated by an earlier file; ignoring"
                        );
                    }
                }
            }
        }
    }

    info!(
        path = %dir.display(),
        files = xml_files.len(),
        images = by_filename.len(),
        skipped = skipped.len(),
        "grouped annotation files"
    );

    Ok(VocGroups {
        groups: by_filename.into_values().collect(),
        files_scanned: xml_files.len(),
        skipped,
    })
}

/// Parse a single VOC XML file.
pub fn parse_voc_xml(path: &Path) -> Result<ImageAnnotationGroup, ConvertError> {
    let xml = fs::read_to_string(path).map_err(|source| ConvertError::VocXmlParse {
        path: path.to_path_buf(),
        message: source.to_string(),
    })?;
    parse_voc_xml_str(&xml, path)
}

/// Parse VOC XML from bytes.
///
/// The input must be valid UTF-8. This helper is primarily useful for
/// fuzzing parse behavior in-memory.
pub fn from_voc_xml_slice(bytes: &[u8]) -> Result<ImageAnnotationGroup, ConvertError> {
    let xml = std::str::from_utf8(bytes).map_err(|source| ConvertError::VocXmlParse {
        path: PathBuf::from("<memory>"),
        message: format!("input is not valid UTF-8: {source}"),
    })?;
    parse_voc_xml_str(xml, Path::new("<memory>"))
}

/// Parse VOC XML from a UTF-8 string. `path` is only used in error messages.
pub fn parse_voc_xml_str(xml: &str, path: &Path) -> Result<ImageAnnotationGroup, ConvertError> {
    let document =
        roxmltree::Document::parse(xml).map_err(|source| ConvertError::VocXmlParse {
            path: path.to_path_buf(),
            message: source.to_string(),
        })?;

    let annotation = document.root_element();
    if annotation.tag_name().name() != "annotation" {
        return Err(ConvertError::VocXmlParse {
            path: path.to_path_buf(),
            message: "missing <annotation> root element".to_string(),
        });
    }

    let filename = required_child_text(annotation, "filename", path, "<annotation>")?;

    let size = required_child_element(annotation, "size", path, "<annotation>")?;
    let width = parse_required_dimension(size, "width", path)?;
    let height = parse_required_dimension(size, "height", path)?;

    let mut objects = Vec::new();
    for object in annotation
        .children()
        .filter(|node| node.is_element() && node.tag_name().name() == "object")
    {
        let name = required_child_text(object, "name", path, "<object>")?;
        let bndbox = required_child_element(object, "bndbox", path, "<object>")?;

        let xmin = parse_required_i64(bndbox, "xmin", path, "<bndbox>")?;
        let ymin = parse_required_i64(bndbox, "ymin", path, "<bndbox>")?;
        let xmax = parse_required_i64(bndbox, "xmax", path, "<bndbox>")?;
        let ymax = parse_required_i64(bndbox, "ymax", path, "<bndbox>")?;

        let bbox = BBoxXYXY::<Pixel>::from_xyxy(xmin, ymin, xmax, ymax);
        if !bbox.is_ordered() {
            warn!(path = %path.display(), label = %name, ?bbox, "degenerate bounding box");
        }

        objects.push(ObjectAnnotation::new(name, bbox));
    }

    Ok(ImageAnnotationGroup::new(filename, width, height).with_objects(objects))
}

fn collect_xml_files(dir: &Path) -> Result<Vec<PathBuf>, ConvertError> {
    let mut files = Vec::new();

    for entry in fs::read_dir(dir).map_err(ConvertError::Io)? {
        let entry = entry.map_err(ConvertError::Io)?;
        let path = entry.path();
        if path.is_file() && has_xml_extension(&path) {
            files.push(path);
        }
    }

    files.sort_by_cached_key(|path| {
        path.file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| rel_string(dir, path))
    });

    let mut nested_xml = Vec::new();
    for entry in WalkDir::new(dir).follow_links(true).min_depth(2) {
        // Only used for the nested-file warning; the flat scan above is authoritative.
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!(path = %dir.display(), error = %err, "skipping unreadable entry below annotation directory");
                continue;
            }
        };

        if entry.file_type().is_file() && has_xml_extension(entry.path()) {
            nested_xml.push(entry.path().to_path_buf());
        }
    }

    if !nested_xml.is_empty() {
        nested_xml.sort_by_cached_key(|path| rel_string(dir, path));
        warn!(
            count = nested_xml.len(),
            example = %rel_string(dir, &nested_xml[0]),
            "annotation directory is scanned flat; skipping nested .xml files"
        );
    }

    Ok(files)
}

fn required_child_element<'a, 'input>(
    node: Node<'a, 'input>,
    tag: &str,
    path: &Path,
    context: &str,
) -> Result<Node<'a, 'input>, ConvertError> {
    child_element(node, tag).ok_or_else(|| ConvertError::VocXmlParse {
        path: path.to_path_buf(),
        message: format!("missing <{tag}> in {context}"),
    })
}

fn required_child_text(
    node: Node<'_, '_>,
    tag: &str,
    path: &Path,
    context: &str,
) -> Result<String, ConvertError> {
    optional_child_text(node, tag).ok_or_else(|| ConvertError::VocXmlParse {
        path: path.to_path_buf(),
        message: format!("missing <{tag}> in {context}"),
    })
}

fn parse_required_dimension(node: Node<'_, '_>, tag: &str, path: &Path) -> Result<u32, ConvertError> {
    let raw = required_child_text(node, tag, path, "<size>")?;
    match raw.parse::<u32>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(ConvertError::VocXmlParse {
            path: path.to_path_buf(),
            message: format!("invalid <{tag}> value '{raw}' in <size>; expected positive integer"),
        }),
    }
}

fn parse_required_i64(
    node: Node<'_, '_>,
    tag: &str,
    path: &Path,
    context: &str,
) -> Result<i64, ConvertError> {
    let raw = required_child_text(node, tag, path, context)?;
    raw.parse::<i64>().map_err(|_| ConvertError::VocXmlParse {
        path: path.to_path_buf(),
        message: format!("invalid <{tag}> value '{raw}' in {context}; expected integer"),
    })
}

fn child_element<'a, 'input>(node: Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|child| child.is_element() && child.tag_name().name() == tag)
}

fn optional_child_text(node: Node<'_, '_>, tag: &str) -> Option<String> {
    child_element(node, tag)
        .and_then(|child| child.text())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(ToOwned::to_owned)
}

fn has_xml_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(VOC_XML_EXTENSION))
        .unwrap_or(false)
}

fn rel_string(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.to_string_lossy().replace('\\', "/")
}
