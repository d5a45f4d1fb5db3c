// 📥 Batch Importer - Delimited patron files → Registry
//
// Line format: ID-Name-Address-Fine (split on the first 3 delimiters only)
//
// Every line is checked field by field without short-circuiting, so one
// line can report several problems. A line is admitted only when all
// checks pass. Per-line problems never abort the batch; a missing file or
// a read failure ends the import with a single ERROR diagnostic.

use crate::config::{RegistryConfig, DEFAULT_DELIMITER};
use crate::entities::{Patron, PatronRegistry};
use crate::validation::{valid_address, valid_name, FieldRules, FineCheck};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, info, warn};

// ============================================================================
// LINE ISSUES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LineIssue {
    InvalidFormat,
    InvalidId,
    DuplicateId,
    InvalidName,
    InvalidAddress,
    InvalidFine,
    FineOutOfRange,
}

impl LineIssue {
    /// Label used in diagnostic text
    pub fn label(&self) -> &'static str {
        match self {
            LineIssue::InvalidFormat => "INVALID FORMAT",
            LineIssue::InvalidId => "INVALID ID",
            LineIssue::DuplicateId => "DUPLICATE ID",
            LineIssue::InvalidName => "INVALID NAME",
            LineIssue::InvalidAddress => "INVALID ADDRESS",
            LineIssue::InvalidFine => "INVALID FINE",
            LineIssue::FineOutOfRange => "FINE OUT OF RANGE",
        }
    }
}

// ============================================================================
// IMPORT LINE (transient, one per non-blank input line)
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct LineFields {
    pub id: String,
    pub name: String,
    pub address: String,
    pub fine_text: String,
}

#[derive(Debug, Clone)]
pub struct ImportLine {
    /// 1-based, counting blank lines
    pub line_number: usize,

    /// Line text after trimming
    pub raw: String,

    /// None when the line did not split into four fields
    pub fields: Option<LineFields>,

    pub fine: Option<f64>,

    /// Empty means accepted
    pub issues: Vec<LineIssue>,
}

impl ImportLine {
    fn malformed(line_number: usize, raw: &str) -> Self {
        ImportLine {
            line_number,
            raw: raw.to_string(),
            fields: None,
            fine: None,
            issues: vec![LineIssue::InvalidFormat],
        }
    }

    pub fn is_accepted(&self) -> bool {
        self.issues.is_empty() && self.fields.is_some() && self.fine.is_some()
    }

    /// One diagnostic per failed check, in check order
    pub fn rejections(&self) -> Vec<Diagnostic> {
        self.issues
            .iter()
            .map(|issue| Diagnostic::Rejected {
                line: self.line_number,
                issue: *issue,
                value: self.offending_value(*issue).to_string(),
            })
            .collect()
    }

    fn offending_value(&self, issue: LineIssue) -> &str {
        let Some(fields) = &self.fields else {
            return &self.raw;
        };

        match issue {
            LineIssue::InvalidFormat => &self.raw,
            LineIssue::InvalidId | LineIssue::DuplicateId => &fields.id,
            LineIssue::InvalidName => &fields.name,
            LineIssue::InvalidAddress => &fields.address,
            LineIssue::InvalidFine | LineIssue::FineOutOfRange => &fields.fine_text,
        }
    }
}

// ============================================================================
// DIAGNOSTICS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    FileNotFound { path: String },
    IoFailure { message: String },
    Rejected { line: usize, issue: LineIssue, value: String },
    Added { line: usize, id: String, name: String },
}

impl Diagnostic {
    /// File-level failure that ended the import
    pub fn is_fatal(&self) -> bool {
        matches!(self, Diagnostic::FileNotFound { .. } | Diagnostic::IoFailure { .. })
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::FileNotFound { path } => write!(f, "ERROR: File not found: {}", path),
            Diagnostic::IoFailure { message } => write!(f, "ERROR: {}", message),
            Diagnostic::Rejected { line, issue, value } => {
                write!(f, "Line {}: {} -> {}", line, issue.label(), value)
            }
            Diagnostic::Added { line, id, name } => {
                write!(f, "Line {}: ADDED {} - {}", line, id, name)
            }
        }
    }
}

// ============================================================================
// IMPORT REPORT
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportReport {
    pub source: String,
    pub imported_at: DateTime<Utc>,

    /// SHA-256 of the bytes read; None if the read did not finish
    pub source_sha256: Option<String>,

    /// Last line number reached, blank lines included
    pub lines_read: usize,
    pub added: usize,
    pub rejected: usize,

    pub diagnostics: Vec<Diagnostic>,
}

impl ImportReport {
    fn new(source: &str) -> Self {
        ImportReport {
            source: source.to_string(),
            imported_at: Utc::now(),
            source_sha256: None,
            lines_read: 0,
            added: 0,
            rejected: 0,
            diagnostics: Vec::new(),
        }
    }

    /// Diagnostics rendered as plain strings, in order
    pub fn messages(&self) -> Vec<String> {
        self.diagnostics.iter().map(ToString::to_string).collect()
    }

    pub fn is_aborted(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_fatal)
    }

    pub fn summary(&self) -> String {
        let mut summary = format!(
            "{}: {} added, {} rejected ({} lines read)",
            self.source, self.added, self.rejected, self.lines_read
        );
        if self.is_aborted() {
            summary.push_str(" [aborted]");
        }
        summary
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

// ============================================================================
// IMPORTER
// ============================================================================

/// Reads delimited patron records and admits the valid ones.
///
/// The importer borrows the registry for the duration of a call and never
/// owns it.
#[derive(Debug, Clone)]
pub struct PatronImporter {
    rules: FieldRules,
    delimiter: char,
}

impl Default for PatronImporter {
    fn default() -> Self {
        PatronImporter::new(FieldRules::default(), DEFAULT_DELIMITER)
    }
}

impl PatronImporter {
    pub fn new(rules: FieldRules, delimiter: char) -> Self {
        PatronImporter { rules, delimiter }
    }

    pub fn from_config(config: &RegistryConfig) -> Self {
        PatronImporter::new(config.rules.clone(), config.delimiter)
    }

    pub fn rules(&self) -> &FieldRules {
        &self.rules
    }

    /// Import a file. Never fails: file-level errors become one diagnostic.
    pub fn import_file<P: AsRef<Path>>(
        &self,
        path: P,
        registry: &mut PatronRegistry,
    ) -> ImportReport {
        let path = path.as_ref();
        let source = path.display().to_string();

        if !path.exists() {
            warn!(path = %source, "import file not found");
            let mut report = ImportReport::new(&source);
            report.diagnostics.push(Diagnostic::FileNotFound { path: source });
            return report;
        }

        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) => {
                warn!(path = %source, error = %e, "failed to open import file");
                let mut report = ImportReport::new(&source);
                report.diagnostics.push(Diagnostic::IoFailure {
                    message: e.to_string(),
                });
                return report;
            }
        };

        // The handle drops with the reader when this call returns
        self.import_reader(BufReader::new(file), &source, registry)
    }

    /// Import from any buffered source. Blank lines are skipped silently
    /// but still count toward line numbers.
    pub fn import_reader<R: BufRead>(
        &self,
        mut reader: R,
        source: &str,
        registry: &mut PatronRegistry,
    ) -> ImportReport {
        let mut report = ImportReport::new(source);
        let mut hasher = Sha256::new();
        let mut buf = Vec::new();

        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) => break,
                Ok(_) => {}
                Err(e) => {
                    warn!(source, line = report.lines_read + 1, error = %e, "read failed mid-import");
                    report.diagnostics.push(Diagnostic::IoFailure {
                        message: e.to_string(),
                    });
                    return report;
                }
            }

            hasher.update(&buf);
            report.lines_read += 1;

            let text = String::from_utf8_lossy(&buf);
            let line = text.trim();
            if line.is_empty() {
                continue;
            }

            let parsed = self.classify_line(report.lines_read, line, registry);
            self.admit(parsed, registry, &mut report);
        }

        report.source_sha256 = Some(format!("{:x}", hasher.finalize()));
        info!(
            source,
            added = report.added,
            rejected = report.rejected,
            "import finished"
        );
        report
    }

    /// Run every field check on one trimmed, non-blank line.
    ///
    /// Duplicate ids are checked against the registry as it stands now, so
    /// earlier lines of the same import count.
    pub fn classify_line(
        &self,
        line_number: usize,
        raw: &str,
        registry: &PatronRegistry,
    ) -> ImportLine {
        let parts: Vec<&str> = raw.splitn(4, self.delimiter).collect();
        if parts.len() != 4 {
            return ImportLine::malformed(line_number, raw);
        }

        let fields = LineFields {
            id: parts[0].trim().to_string(),
            name: parts[1].trim().to_string(),
            address: parts[2].trim().to_string(),
            fine_text: parts[3].trim().to_string(),
        };
        let mut issues = Vec::new();

        if !self.rules.valid_id(&fields.id) {
            issues.push(LineIssue::InvalidId);
        } else if registry.contains(&fields.id) {
            issues.push(LineIssue::DuplicateId);
        }

        if !valid_name(&fields.name) {
            issues.push(LineIssue::InvalidName);
        }
        if !valid_address(&fields.address) {
            issues.push(LineIssue::InvalidAddress);
        }

        let fine = match self.rules.check_fine(&fields.fine_text) {
            FineCheck::Valid(v) => Some(v),
            FineCheck::Unparsable => {
                issues.push(LineIssue::InvalidFine);
                None
            }
            FineCheck::OutOfRange(_) => {
                issues.push(LineIssue::FineOutOfRange);
                None
            }
        };

        ImportLine {
            line_number,
            raw: raw.to_string(),
            fields: Some(fields),
            fine,
            issues,
        }
    }

    fn admit(&self, line: ImportLine, registry: &mut PatronRegistry, report: &mut ImportReport) {
        let accepted = if line.is_accepted() {
            line.fields.as_ref().zip(line.fine)
        } else {
            None
        };

        let Some((fields, fine)) = accepted else {
            debug!(line = line.line_number, issues = ?line.issues, "line rejected");
            report.rejected += 1;
            report.diagnostics.extend(line.rejections());
            return;
        };

        let patron = Patron::from_validated(&fields.id, &fields.name, &fields.address, fine);
        match registry.insert(patron) {
            Ok(()) => {
                report.added += 1;
                report.diagnostics.push(Diagnostic::Added {
                    line: line.line_number,
                    id: fields.id.clone(),
                    name: fields.name.clone(),
                });
            }
            Err(e) => {
                debug!(line = line.line_number, error = %e, "insert refused");
                report.rejected += 1;
                report.diagnostics.push(Diagnostic::Rejected {
                    line: line.line_number,
                    issue: LineIssue::DuplicateId,
                    value: fields.id.clone(),
                });
            }
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
