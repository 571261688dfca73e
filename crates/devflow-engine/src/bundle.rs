//! Parser for multi-file code bundles produced by generation stages.
//!
//! The wire format is a repeated block of `Filename: <name>` followed
//! by a fenced code block (an optional `Code:` marker and a language
//! tag on the fence are tolerated). Zero matches is not a fault: the
//! stage logs a warning and persists nothing, and the run proceeds.
//! The leniency can hide a model that stopped following the format,
//! so the warning carries the bundle length for diagnosis.

use std::sync::OnceLock;

use regex::Regex;
use tracing::warn;

/// One file extracted from a generated bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub filename: String,
    pub code: String,
}

fn block_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"(?s)Filename:\s*(?P<filename>[\w./\-]+)\s*(?:Code:)?\s*```[A-Za-z0-9_+\-]*\n(?P<code>.*?)```",
        )
        .expect("bundle pattern is valid")
    })
}

/// Extract `{filename, code}` pairs from a generated bundle, in source
/// order.
pub fn parse_code_bundle(text: &str) -> Vec<SourceFile> {
    let files: Vec<SourceFile> = block_pattern()
        .captures_iter(text)
        .map(|caps| SourceFile {
            filename: caps["filename"].trim().to_string(),
            code: caps["code"].trim().to_string(),
        })
        .collect();

    if files.is_empty() && !text.trim().is_empty() {
        warn!(
            bundle_len = text.len(),
            "Code bundle contained no well-formed file blocks"
        );
    }

    files
}
