//! Source-file metadata record domain model.
//!
//! A [`MetadataRecord`] describes one source file as produced by the
//! extraction pipeline: file-level header documentation, the functions and
//! classes it declares, and bookkeeping about the file contents. Records are
//! immutable value objects keyed by `path`; an update replaces the whole
//! record for a path.
//!
//! The serde representation is the wire schema exchanged with the
//! metadata-producing collaborator (camelCase keys, every field except
//! `path` optional).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata for a single source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataRecord {
    /// Unique key: the file path
    pub path: String,

    /// Source language, e.g. `rust` or `go`
    #[serde(default)]
    pub language: Option<String>,

    /// File-level documentation header
    #[serde(default)]
    pub header: FileHeader,

    /// Free functions declared in the file
    #[serde(default)]
    pub functions: Vec<FunctionMetadata>,

    /// Classes (or structs/types) declared in the file
    #[serde(default)]
    pub classes: Vec<ClassMetadata>,

    /// File size in bytes at extraction time
    #[serde(default)]
    pub size_bytes: u64,

    /// Hash of the file contents at extraction time
    #[serde(default)]
    pub content_hash: String,

    /// Last modification time of the file
    #[serde(default)]
    pub last_modified: Option<DateTime<Utc>>,

    /// When the metadata was extracted
    #[serde(default)]
    pub extraction_timestamp: Option<DateTime<Utc>>,
}

/// File-level header documentation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileHeader {
    #[serde(default)]
    pub intent: Option<String>,

    #[serde(default)]
    pub design_principles: Vec<String>,

    #[serde(default)]
    pub constraints: Vec<String>,

    /// Paths of documentation files this source file refers to
    #[serde(default)]
    pub reference_documentation: Vec<String>,

    #[serde(default)]
    pub change_history: Vec<ChangeRecord>,
}

/// One entry of a file's change history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRecord {
    pub timestamp: DateTime<Utc>,
    pub summary: String,
    #[serde(default)]
    pub details: Vec<String>,
}

/// Documentation attached to a function or class.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocSections {
    #[serde(default)]
    pub intent: Option<String>,

    #[serde(default)]
    pub design_principles: Vec<String>,

    #[serde(default)]
    pub constraints: Vec<String>,

    #[serde(default)]
    pub reference_documentation: Vec<String>,
}

/// Inclusive 1-based line range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRange {
    pub start: u32,
    pub end: u32,
}

impl LineRange {
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    pub const fn is_valid(&self) -> bool {
        self.start <= self.end
    }
}

/// A function or method declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionMetadata {
    pub name: String,

    #[serde(default)]
    pub doc_sections: DocSections,

    #[serde(default)]
    pub parameters: Vec<String>,

    #[serde(default)]
    pub line_range: Option<LineRange>,
}

impl FunctionMetadata {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            doc_sections: DocSections::default(),
            parameters: Vec::new(),
            line_range: None,
        }
    }

    pub fn with_parameter(mut self, parameter: impl Into<String>) -> Self {
        self.parameters.push(parameter.into());
        self
    }

    pub fn with_line_range(mut self, start: u32, end: u32) -> Self {
        self.line_range = Some(LineRange::new(start, end));
        self
    }
}

/// A class declaration with its methods.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassMetadata {
    pub name: String,

    #[serde(default)]
    pub doc_sections: DocSections,

    #[serde(default)]
    pub methods: Vec<FunctionMetadata>,

    #[serde(default)]
    pub line_range: Option<LineRange>,
}

impl ClassMetadata {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            doc_sections: DocSections::default(),
            methods: Vec::new(),
            line_range: None,
        }
    }

    pub fn with_method(mut self, method: FunctionMetadata) -> Self {
        self.methods.push(method);
        self
    }

    pub fn with_line_range(mut self, start: u32, end: u32) -> Self {
        self.line_range = Some(LineRange::new(start, end));
        self
    }
}

impl MetadataRecord {
    /// Create an otherwise empty record for `path`.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            language: None,
            header: FileHeader::default(),
            functions: Vec::new(),
            classes: Vec::new(),
            size_bytes: 0,
            content_hash: String::new(),
            last_modified: None,
            extraction_timestamp: None,
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_intent(mut self, intent: impl Into<String>) -> Self {
        self.header.intent = Some(intent.into());
        self
    }

    pub fn with_reference_doc(mut self, doc_path: impl Into<String>) -> Self {
        self.header.reference_documentation.push(doc_path.into());
        self
    }

    pub fn with_function(mut self, function: FunctionMetadata) -> Self {
        self.functions.push(function);
        self
    }

    pub fn with_class(mut self, class: ClassMetadata) -> Self {
        self.classes.push(class);
        self
    }

    pub fn with_size_bytes(mut self, size_bytes: u64) -> Self {
        self.size_bytes = size_bytes;
        self
    }

    pub fn with_content_hash(mut self, hash: impl Into<String>) -> Self {
        self.content_hash = hash.into();
        self
    }

    pub fn with_extraction_timestamp(mut self, at: DateTime<Utc>) -> Self {
        self.extraction_timestamp = Some(at);
        self
    }

    /// Validate the record before it enters the cache.
    pub fn validate(&self) -> Result<(), String> {
        if self.path.trim().is_empty() {
            return Err("record path cannot be empty".to_string());
        }

        let function_ranges = self.functions.iter().filter_map(|f| f.line_range);
        let class_ranges = self.classes.iter().flat_map(|c| {
            c.line_range
                .into_iter()
                .chain(c.methods.iter().filter_map(|m| m.line_range))
        });
        if let Some(range) = function_ranges.chain(class_ranges).find(|r| !r.is_valid()) {
            return Err(format!(
                "invalid line range {}..{} in {}",
                range.start, range.end, self.path
            ));
        }

        Ok(())
    }

    /// Time used to decide whether a record changed since a sync point.
    pub fn freshness(&self) -> Option<DateTime<Utc>> {
        self.extraction_timestamp.or(self.last_modified)
    }

    /// Non-empty language value, if any.
    pub fn indexed_language(&self) -> Option<&str> {
        self.language.as_deref().filter(|l| !l.is_empty())
    }

    /// Referenced documentation paths.
    pub fn referenced_docs(&self) -> impl Iterator<Item = &str> {
        self.header
            .reference_documentation
            .iter()
            .map(String::as_str)
            .filter(|d| !d.is_empty())
    }

    /// Function names, including the names of class methods.
    pub fn function_names(&self) -> impl Iterator<Item = &str> {
        self.functions
            .iter()
            .chain(self.classes.iter().flat_map(|c| c.methods.iter()))
            .map(|f| f.name.as_str())
            .filter(|n| !n.is_empty())
    }

    pub fn class_names(&self) -> impl Iterator<Item = &str> {
        self.classes
            .iter()
            .map(|c| c.name.as_str())
            .filter(|n| !n.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_empty_path() {
        assert!(MetadataRecord::new("").validate().is_err());
        assert!(MetadataRecord::new("   ").validate().is_err());
        assert!(MetadataRecord::new("src/lib.rs").validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_inverted_line_range() {
        let method = FunctionMetadata::new("parse").with_line_range(20, 10);
        let record = MetadataRecord::new("src/lib.rs")
            .with_class(ClassMetadata::new("Parser").with_method(method));

        let err = record.validate().unwrap_err();
        assert!(err.contains("20..10"));
    }

    #[test]
    fn test_method_names_fold_into_function_names() {
        let record = MetadataRecord::new("parser.go")
            .with_function(FunctionMetadata::new("Parse"))
            .with_class(ClassMetadata::new("Lexer").with_method(FunctionMetadata::new("Next")));

        let names: Vec<&str> = record.function_names().collect();
        assert_eq!(names, vec!["Parse", "Next"]);
        assert_eq!(record.class_names().collect::<Vec<_>>(), vec!["Lexer"]);
    }

    #[test]
    fn test_empty_language_is_not_indexed() {
        let record = MetadataRecord::new("a.txt").with_language("");
        assert_eq!(record.indexed_language(), None);
    }

    #[test]
    fn test_wire_schema_parsing() {
        let json = r#"{
            "path": "pkg/parser.go",
            "language": "go",
            "header": {
                "intent": "Parse config files",
                "designPrinciples": ["no allocation in hot loop"],
                "referenceDocumentation": ["docs/parser.md"],
                "changeHistory": [
                    {
                        "timestamp": "2024-03-01T12:00:00Z",
                        "summary": "initial",
                        "details": ["added Parse"]
                    }
                ]
            },
            "functions": [
                {"name": "Parse", "parameters": ["input"], "lineRange": {"start": 10, "end": 42}}
            ],
            "classes": [
                {"name": "Parser", "methods": [{"name": "Reset"}]}
            ],
            "sizeBytes": 2048,
            "contentHash": "abc123",
            "extractionTimestamp": "2024-03-02T08:30:00Z"
        }"#;

        let record: MetadataRecord = serde_json::from_str(json).expect("wire record should parse");

        assert_eq!(record.path, "pkg/parser.go");
        assert_eq!(record.indexed_language(), Some("go"));
        assert_eq!(record.header.reference_documentation, vec!["docs/parser.md"]);
        assert_eq!(record.header.change_history[0].details, vec!["added Parse"]);
        assert_eq!(record.functions[0].line_range, Some(LineRange::new(10, 42)));
        assert_eq!(record.classes[0].methods[0].name, "Reset");
        assert_eq!(record.size_bytes, 2048);
        assert!(record.last_modified.is_none());
        assert!(record.freshness().is_some());
    }

    #[test]
    fn test_minimal_wire_record() {
        let record: MetadataRecord = serde_json::from_str(r#"{"path": "README.md"}"#).unwrap();
        assert_eq!(record, MetadataRecord::new("README.md"));
    }
}
