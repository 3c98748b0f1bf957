//! Check report types.
//!
//! Every issue has a stable code and a severity so the output can be
//! filtered or consumed by scripts.

use serde::Serialize;
use std::fmt;

/// The result of checking a built dataset.
#[derive(Clone, Debug, Default, Serialize)]
pub struct CheckReport {
    /// Label files inspected.
    pub label_files: usize,
    /// Label lines inspected.
    pub label_lines: usize,
    pub issues: Vec<CheckIssue>,
}

impl CheckReport {
    /// Creates a new empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an issue to the report.
    pub fn add(&mut self, issue: CheckIssue) {
        self.issues.push(issue);
    }

    /// Returns the number of errors in the report.
    pub fn error_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
            .count()
    }

    /// Returns the number of warnings in the report.
    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Warning)
            .count()
    }

    /// Returns true if there are no errors.
    pub fn is_ok(&self) -> bool {
        self.error_count() == 0
    }

    /// Returns true if there are no issues at all.
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    /// Returns true if any issue carries `code`.
    pub fn has(&self, code: IssueCode) -> bool {
        self.issues.iter().any(|i| i.code == code)
    }
}

impl fmt::Display for CheckReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.issues.is_empty() {
            return writeln!(
                f,
                "Check passed: {} label file(s), {} line(s), no issues found",
                self.label_files, self.label_lines
            );
        }

        writeln!(
            f,
            "Check completed with {} error(s) and {} warning(s):",
            self.error_count(),
            self.warning_count()
        )?;
        writeln!(f)?;

        for issue in &self.issues {
            writeln!(f, "  {}", issue)?;
        }

        Ok(())
    }
}

/// A single problem found in the dataset.
#[derive(Clone, Debug, Serialize)]
pub struct CheckIssue {
    pub severity: Severity,
    pub code: IssueCode,
    pub message: String,
    pub context: IssueContext,
}

impl CheckIssue {
    /// Creates a new error.
    pub fn error(code: IssueCode, message: impl Into<String>, context: IssueContext) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: message.into(),
            context,
        }
    }

    /// Creates a new warning.
    pub fn warning(code: IssueCode, message: impl Into<String>, context: IssueContext) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            message: message.into(),
            context,
        }
    }
}

impl fmt::Display for CheckIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Error => "ERROR",
            Severity::Warning => "WARN ",
        };
        write!(
            f,
            "[{}] {:?} in {}: {}",
            severity, self.code, self.context, self.message
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    Error,
}

/// Stable issue codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCode {
    // Pairing
    /// A label file has no copied image with the same stem.
    LabelWithoutImage,
    /// A copied image has no label file.
    ImageWithoutLabels,
    /// A copied image's header could not be read.
    UnreadableImage,

    // Label content
    /// A label line could not be parsed.
    MalformedLabelLine,
    /// A normalized value is non-finite or outside [0, 1].
    CoordinateOutOfRange,
    /// The same label ID appears on more than one line.
    DuplicateLabelId,
    /// A label ID is not listed in the manifest.
    UnknownLabelId,

    // Cross-artifact
    /// A manifest entry is used by no label line.
    UnusedManifestEntry,
    /// The number of crops differs from the number of label lines.
    CropCountMismatch,
}

/// Where an issue was found.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IssueContext {
    Image { file: String },
    LabelFile { file: String },
    Line { file: String, line: usize },
    Label { id: u64 },
}

impl fmt::Display for IssueContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueContext::Image { file } => write!(f, "image {}", file),
            IssueContext::LabelFile { file } => write!(f, "label file {}", file),
            IssueContext::Line { file, line } => write!(f, "{}:{}", file, line),
            IssueContext::Label { id } => write!(f, "label {}", id),
        }
    }
}
