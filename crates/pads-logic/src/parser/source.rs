use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// The whole export as an ordered list of CR-stripped lines.
///
/// Owned by one parse call; sub-parsers address it by line index.
#[derive(Debug, Clone, Default)]
pub struct LineSource {
    lines: Vec<String>,
}

impl LineSource {
    pub fn from_text(text: &str) -> Self {
        Self {
            lines: text
                .split('\n')
                .map(|l| l.trim_end_matches('\r').to_string())
                .collect::<Vec<_>>(),
        }
        .without_trailing_empty()
    }

    /// Invalid UTF-8 is replaced rather than rejected; PADS exports are
    /// nominally ASCII but often carry stray Latin-1 bytes in text fields.
    pub fn from_bytes(data: &[u8]) -> Self {
        Self::from_text(&String::from_utf8_lossy(data))
    }

    pub fn from_reader<R: BufRead>(reader: R) -> std::io::Result<Self> {
        let mut lines = Vec::new();
        for line in reader.split(b'\n') {
            let bytes = line?;
            let text = String::from_utf8_lossy(&bytes);
            lines.push(text.trim_end_matches('\r').to_string());
        }
        Ok(Self { lines })
    }

    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        Self::from_reader(BufReader::new(File::open(path)?))
    }

    fn without_trailing_empty(mut self) -> Self {
        // `split` yields one empty element after a final newline.
        if self.lines.last().is_some_and(|l| l.is_empty()) {
            self.lines.pop();
        }
        self
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty() || self.lines.iter().all(|l| l.trim().is_empty())
    }

    pub fn get(&self, idx: usize) -> Option<&str> {
        self.lines.get(idx).map(|s| s.as_str())
    }

    /// Line at `idx`, or an empty string past the end.
    pub fn line(&self, idx: usize) -> &str {
        self.get(idx).unwrap_or("")
    }

    pub fn last_index(&self) -> usize {
        self.lines.len().saturating_sub(1)
    }

    pub fn is_blank(&self, idx: usize) -> bool {
        self.line(idx).trim().is_empty()
    }

    pub fn is_marker(&self, idx: usize) -> bool {
        section_name(self.line(idx)).is_some()
    }

    /// Index of the first marker at or after `from`, or `len()` if none.
    pub fn next_marker(&self, from: usize) -> usize {
        (from..self.lines.len())
            .find(|&i| self.is_marker(i))
            .unwrap_or(self.lines.len())
    }

    /// Index of the first non-blank line at or after `from`, or `len()`.
    pub fn next_content(&self, from: usize) -> usize {
        (from..self.lines.len())
            .find(|&i| !self.is_blank(i))
            .unwrap_or(self.lines.len())
    }
}

/// Section name of a `*NAME*...` marker line: the text strictly between the
/// first two `*` characters.
pub fn section_name(line: &str) -> Option<&str> {
    let rest = line.strip_prefix('*')?;
    let end = rest.find('*')?;
    let name = rest[..end].trim();
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

/// Text following the closing `*` of a marker line.
pub fn marker_payload(line: &str) -> &str {
    line.strip_prefix('*')
        .and_then(|rest| rest.find('*').map(|end| &rest[end + 1..]))
        .unwrap_or("")
        .trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crlf_is_stripped() {
        let src = LineSource::from_text("*PADS-LOGIC-V9.0*\r\n*SCH*\r\nUNITS 0\r\n");
        assert_eq!(src.len(), 3);
        assert_eq!(src.line(0), "*PADS-LOGIC-V9.0*");
        assert_eq!(src.line(2), "UNITS 0");
        assert_eq!(src.line(99), "");
    }

    #[test]
    fn test_reader_matches_text() {
        let text = "a\r\nb\n\nc";
        let from_reader = LineSource::from_reader(text.as_bytes()).unwrap();
        let from_text = LineSource::from_text(text);
        assert_eq!(from_reader.len(), 4);
        assert_eq!(from_text.len(), 4);
        assert_eq!(from_reader.line(1), "b");
        assert!(from_reader.is_blank(2));
    }

    #[test]
    fn test_section_name() {
        assert_eq!(section_name("*SCH*       GENERAL PARAMETERS"), Some("SCH"));
        assert_eq!(section_name("*OFFPAGE REFS*"), Some("OFFPAGE REFS"));
        assert_eq!(section_name("*SIGNAL* GND 0 0"), Some("SIGNAL"));
        assert_eq!(section_name("**"), None);
        assert_eq!(section_name("*no closing star"), None);
        assert_eq!(section_name("T100 0 0 0 PIN"), None);
    }

    #[test]
    fn test_marker_payload() {
        assert_eq!(marker_payload("*SHT*   2 POWER 1 MAIN"), "2 POWER 1 MAIN");
        assert_eq!(marker_payload("*END*"), "");
    }

    #[test]
    fn test_next_marker_and_content() {
        let src = LineSource::from_text("x\n\n\n*A*\ny");
        assert_eq!(src.next_marker(0), 3);
        assert_eq!(src.next_marker(4), 5);
        assert_eq!(src.next_content(1), 3);
    }
}
