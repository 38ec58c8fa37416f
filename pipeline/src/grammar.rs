//! Line grammar for `ansible-lint -p` output.
//!
//! Parseable output has the shape
//!
//! ```text
//! <path>:<line>: [<PREFIX>E<code>] <message>
//! ```
//!
//! where `<PREFIX>` is a run of letters (historically `ANSIBL`, so the
//! marker reads `ANSIBLE0002`) and `<code>` is three or four digits.
//! Everything after `] ` is the message. Anything that does not have this
//! shape (banners, summaries, tracebacks) is not a finding.

use std::sync::OnceLock;

use regex::Regex;

const FINDING_PATTERN: &str =
    r"^(?P<path>.*):(?P<line>[0-9]+).*[A-Za-z]*E[0-9]{3,4}\]\s(?P<message>.*)$";

fn finding_regex() -> &'static Regex {
    static FINDING: OnceLock<Regex> = OnceLock::new();
    FINDING.get_or_init(|| Regex::new(FINDING_PATTERN).expect("finding pattern is valid"))
}

/// One finding recognised in checker output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintMatch {
    pub path: String,
    /// 1-based, as printed by the checker.
    pub line: u32,
    pub message: String,
}

impl LintMatch {
    /// Editor line (0-based). A reported line 0 stays at 0.
    #[must_use]
    pub fn zero_based_line(&self) -> u32 {
        self.line.saturating_sub(1)
    }
}

/// Parse one line of checker stdout.
///
/// Returns `None` for lines that are not findings, and for findings whose
/// line number does not fit in a `u32`.
#[must_use]
pub fn parse_line(line: &str) -> Option<LintMatch> {
    let caps = finding_regex().captures(line)?;
    let line_number = caps["line"].parse::<u32>().ok()?;
    Some(LintMatch {
        path: caps["path"].to_string(),
        line: line_number,
        message: caps["message"].to_string(),
    })
}
