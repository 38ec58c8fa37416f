//! Core diagnostic types for ansible-ls.
//!
//! This crate contains pure domain types with no IO and no async. The
//! pipeline constructs [`Diagnostic`]s, the server serializes them into
//! `textDocument/publishDiagnostics` payloads.

use serde::{Serialize, Serializer};

/// Column sentinel meaning "to the end of the line".
///
/// Checker findings carry no column information, so every diagnostic spans
/// the full line: `0..END_OF_LINE`.
pub const END_OF_LINE: u32 = u32::MAX;

/// Name reported in the `source` field of every checker diagnostic.
pub const CHECKER_SOURCE: &str = "ansible-lint";

/// Checker executable used when no override is configured.
pub const DEFAULT_CHECKER: &str = "ansible-lint";

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DiagnosticSeverity {
    Error = 1,
    Warning = 2,
    Information = 3,
    Hint = 4,
}

impl DiagnosticSeverity {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Information => "info",
            Self::Hint => "hint",
        }
    }
}

// LSP encodes severity as its numeric discriminant.
impl Serialize for DiagnosticSeverity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(*self as u8)
    }
}

/// Zero-based line/character position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    /// Range covering the whole of `line`.
    #[must_use]
    pub fn full_line(line: u32) -> Self {
        Self {
            start: Position { line, character: 0 },
            end: Position {
                line,
                character: END_OF_LINE,
            },
        }
    }
}

/// A single finding reported to the client.
///
/// Fields are private; the constructors are the only construction path and
/// a diagnostic is immutable afterwards. The file it belongs to is not part
/// of the diagnostic: it is the key of the batch that carries it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    range: Range,
    severity: DiagnosticSeverity,
    source: String,
    message: String,
}

impl Diagnostic {
    #[must_use]
    pub fn new(range: Range, severity: DiagnosticSeverity, message: String) -> Self {
        Self {
            range,
            severity,
            source: CHECKER_SOURCE.to_string(),
            message,
        }
    }

    /// Full-line warning, the only shape the checker pipeline produces.
    #[must_use]
    pub fn line_warning(line: u32, message: String) -> Self {
        Self::new(Range::full_line(line), DiagnosticSeverity::Warning, message)
    }

    #[must_use]
    pub fn range(&self) -> Range {
        self.range
    }

    /// 0-indexed line number.
    #[must_use]
    pub fn line(&self) -> u32 {
        self.range.start.line
    }

    #[must_use]
    pub fn severity(&self) -> DiagnosticSeverity {
        self.severity
    }

    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Format as `uri:line: severity: [source] message` (1-indexed for display).
    #[must_use]
    pub fn display_with_uri(&self, uri: &str) -> String {
        format!(
            "{uri}:{}: {}: [{}] {}",
            u64::from(self.line()) + 1,
            self.severity.label(),
            self.source,
            self.message,
        )
    }
}
