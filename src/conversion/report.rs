//! Conversion report types.
//!
//! The report summarizes one run: what was read, what was written, and which
//! inputs were skipped or only partially resolved along the way.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// A report generated by a completed conversion.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ConversionReport {
    /// Output file the records were written to.
    pub output_path: String,
    /// Counts on the reading side.
    pub input: InputCounts,
    /// Counts on the writing side.
    pub output: OutputCounts,
    /// Issues discovered during conversion.
    pub issues: Vec<ConversionIssue>,
}

impl ConversionReport {
    pub fn new(output_path: impl Into<String>) -> Self {
        Self {
            output_path: output_path.into(),
            ..Default::default()
        }
    }

    /// Add an issue to the report.
    pub fn add(&mut self, issue: ConversionIssue) {
        self.issues.push(issue);
    }

    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == ConversionSeverity::Warning)
            .count()
    }

    pub fn info_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == ConversionSeverity::Info)
            .count()
    }

    /// Record unresolved label names, one warning per distinct name.
    pub fn add_unresolved_labels(&mut self, counts: &BTreeMap<String, usize>) {
        for (label, count) in counts {
            self.add(ConversionIssue::warning(
                ConversionIssueCode::UnresolvedLabel,
                format!(
                    "label '{}' is not in the label map ({} object(s) written with id -1)",
                    label, count
                ),
            ));
        }
    }
}

impl fmt::Display for ConversionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Successfully created TFRecord with {} example(s) at {}",
            self.output.records, self.output_path
        )?;
        writeln!(
            f,
            "  input: {} label(s), {} XML file(s), {} image(s)",
            self.input.labels, self.input.xml_files, self.input.images
        )?;
        writeln!(
            f,
            "  output: {} record(s), {} object(s)",
            self.output.records, self.output.objects
        )?;

        let warnings = self.warning_count();
        if warnings > 0 {
            writeln!(f)?;
            writeln!(f, "Warnings ({}):", warnings)?;
            for issue in self
                .issues
                .iter()
                .filter(|i| i.severity == ConversionSeverity::Warning)
            {
                writeln!(f, "  - {}", issue.message)?;
            }
        }

        let infos = self.info_count();
        if infos > 0 {
            writeln!(f)?;
            writeln!(f, "Notes ({}):", infos)?;
            for issue in self
                .issues
                .iter()
                .filter(|i| i.severity == ConversionSeverity::Info)
            {
                writeln!(f, "  - {}", issue.message)?;
            }
        }

        Ok(())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct InputCounts {
    /// Entries in the label map.
    pub labels: usize,
    /// `.xml` files found in the annotation directory.
    pub xml_files: usize,
    /// Files that failed to parse and were skipped.
    pub skipped_files: usize,
    /// Distinct image file names after grouping.
    pub images: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct OutputCounts {
    pub records: usize,
    pub objects: usize,
    /// Objects written with the unresolved label marker.
    pub unresolved_objects: usize,
}

/// A single issue discovered during conversion.
#[derive(Clone, Debug, Serialize)]
pub struct ConversionIssue {
    pub severity: ConversionSeverity,
    pub code: ConversionIssueCode,
    pub message: String,
}

impl ConversionIssue {
    /// Create a warning-level issue (some input was not carried over cleanly).
    pub fn warning(code: ConversionIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: ConversionSeverity::Warning,
            code,
            message: message.into(),
        }
    }

    /// Create an info-level issue (policy note).
    pub fn info(code: ConversionIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: ConversionSeverity::Info,
            code,
            message: message.into(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionSeverity {
    Warning,
    Info,
}

/// Stable issue codes for programmatic consumption.
///
/// These codes are part of the JSON report and should remain stable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionIssueCode {
    /// An annotation file failed to parse and was left out.
    SkippedAnnotationFile,
    /// An object label has no id in the label map.
    UnresolvedLabel,
    /// How files naming the same image were combined.
    GroupingPolicy,
}
