pub mod document;
pub mod error;
pub mod parser;
pub mod report;
pub mod resolve;
pub mod types;

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

pub use document::{DocumentSummary, PadsDocument, SheetView};
pub use error::ParseError;
pub use parser::{detect_header, PadsParser};
pub use report::{CollectingReporter, LogReporter, NullReporter, Reporter, Severity};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Run the cross-section pass (pin lengths, attribute overrides, node
    /// nets) after reading. When false the document is exactly what the
    /// section parsers produced; `resolve::resolve` can be applied later.
    pub resolve_references: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            resolve_references: true,
        }
    }
}

/// Sniff the first line of `path` for a PADS Logic header without parsing
/// the rest. Unreadable files are simply not PADS files.
pub fn check_file_header(path: &Path) -> bool {
    let Ok(file) = File::open(path) else {
        return false;
    };
    let mut first = Vec::new();
    if BufReader::new(file).read_until(b'\n', &mut first).is_err() {
        return false;
    }
    detect_header(String::from_utf8_lossy(&first).trim_end()).is_some()
}

/// Read and parse a file.
pub fn parse_file(
    path: &Path,
    opts: &ParseOptions,
    reporter: &mut dyn Reporter,
) -> Result<PadsDocument, ParseError> {
    PadsParser::new(reporter, *opts).parse_file(path)
}

pub fn parse_str(
    text: &str,
    opts: &ParseOptions,
    reporter: &mut dyn Reporter,
) -> Result<PadsDocument, ParseError> {
    PadsParser::new(reporter, *opts).parse_str(text)
}

/// Parse raw bytes; invalid UTF-8 is replaced, not rejected.
pub fn parse_bytes(
    data: &[u8],
    opts: &ParseOptions,
    reporter: &mut dyn Reporter,
) -> Result<PadsDocument, ParseError> {
    PadsParser::new(reporter, *opts).parse_bytes(data)
}
