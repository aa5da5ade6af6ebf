mod connection;
mod decal;
pub mod graphics;
mod nodes;
mod part;
mod parttype;
mod sch;
pub mod source;
mod text;
pub mod values;

use log::debug;

use crate::document::PadsDocument;
use crate::error::ParseError;
use crate::report::{Reporter, Severity};
use crate::resolve;
use crate::types::{Header, ProductFamily};
use crate::ParseOptions;

use self::source::{section_name, LineSource};
use self::values::{read_float, read_int};

/// Recognize a PADS Logic header line.
///
/// Accepts `*PADS-LOGIC-V<major>.<minor>*` and
/// `*PADS-POWERLOGIC-V<major>.<minor>*`, optionally followed by free text.
pub fn detect_header(line: &str) -> Option<Header> {
    let rest = line.trim_start_matches('\u{feff}').strip_prefix("*PADS-")?;

    let (family, rest) = if let Some(r) = rest.strip_prefix("POWERLOGIC-V") {
        (ProductFamily::PowerLogic, r)
    } else if let Some(r) = rest.strip_prefix("LOGIC-V") {
        (ProductFamily::Logic, r)
    } else {
        return None;
    };

    let close = rest.find('*')?;
    let version = &rest[..close];
    let (major, minor) = version.split_once('.')?;
    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(major) || !all_digits(minor) {
        return None;
    }

    Some(Header {
        family,
        version: version.to_string(),
        description: rest[close + 1..].trim().to_string(),
        valid: true,
    })
}

/// Shared state handed to every section parser.
pub(crate) struct SectionCtx<'a> {
    pub lines: &'a LineSource,
    pub reporter: &'a mut dyn Reporter,
    /// Sheet number stamped onto sheet-scoped records. Only SHT changes it.
    pub sheet: i64,
}

impl<'a> SectionCtx<'a> {
    pub fn warn(&mut self, idx: usize, msg: &str) {
        self.reporter
            .report(&format!("line {}: {msg}", idx + 1), Severity::Warning);
    }

    pub fn info(&mut self, idx: usize, msg: &str) {
        self.reporter
            .report(&format!("line {}: {msg}", idx + 1), Severity::Info);
    }

    /// Integer at `tokens[pos]`; a missing token is 0 without a warning.
    pub fn int_at(&mut self, tokens: &[&str], pos: usize, field: &str, idx: usize) -> i64 {
        match tokens.get(pos) {
            Some(tok) => read_int(tok, field, idx, self.reporter),
            None => 0,
        }
    }

    /// Float at `tokens[pos]`; a missing token is 0.0 without a warning.
    pub fn float_at(&mut self, tokens: &[&str], pos: usize, field: &str, idx: usize) -> f64 {
        match tokens.get(pos) {
            Some(tok) => read_float(tok, field, idx, self.reporter),
            None => 0.0,
        }
    }

    pub fn point_at(&mut self, tokens: &[&str], pos: usize, field: &str, idx: usize) -> [f64; 2] {
        [
            self.float_at(tokens, pos, field, idx),
            self.float_at(tokens, pos + 1, field, idx),
        ]
    }
}

/// Parser for PADS Logic ASCII schematic exports.
///
/// Each `parse_*` call starts from a fresh document; nothing carries over
/// between calls. Use one parser per thread.
pub struct PadsParser<'r> {
    reporter: &'r mut dyn Reporter,
    options: ParseOptions,
}

impl<'r> PadsParser<'r> {
    pub fn new(reporter: &'r mut dyn Reporter, options: ParseOptions) -> Self {
        Self { reporter, options }
    }

    pub fn parse_str(&mut self, text: &str) -> Result<PadsDocument, ParseError> {
        self.parse_lines(&LineSource::from_text(text))
    }

    pub fn parse_bytes(&mut self, data: &[u8]) -> Result<PadsDocument, ParseError> {
        self.parse_lines(&LineSource::from_bytes(data))
    }

    pub fn parse_file(&mut self, path: &std::path::Path) -> Result<PadsDocument, ParseError> {
        let lines = LineSource::from_path(path)?;
        self.parse_lines(&lines)
    }

    pub fn parse_lines(&mut self, lines: &LineSource) -> Result<PadsDocument, ParseError> {
        if lines.is_empty() {
            return Err(ParseError::EmptyFile);
        }
        let first = lines.line(0);
        let header = detect_header(first)
            .ok_or_else(|| ParseError::InvalidHeader(first.trim().to_string()))?;
        debug!(
            "PADS: {} version {} ({} lines)",
            header.family.as_str(),
            header.version,
            lines.len()
        );

        let mut doc = PadsDocument::new(header);
        let mut ctx = SectionCtx {
            lines,
            reporter: &mut *self.reporter,
            sheet: 1,
        };

        dispatch_sections(&mut ctx, &mut doc);

        if self.options.resolve_references {
            doc = resolve::resolve(doc);
        }
        Ok(doc)
    }
}

/// Walk the file section by section, starting after the header line.
fn dispatch_sections(ctx: &mut SectionCtx<'_>, doc: &mut PadsDocument) {
    let lines = ctx.lines;
    let mut i = 1;
    while i < lines.len() {
        let Some(name) = section_name(lines.line(i)) else {
            if !lines.is_blank(i) {
                ctx.info(i, "content outside any section, skipped");
            }
            i += 1;
            continue;
        };

        let last = match name {
            "END" => break,
            "REMARK" => i,
            "SCH" => sch::parse_sch(ctx, doc, i),
            "FIELDS" => sch::parse_fields(ctx, doc, i),
            "SHT" => sch::parse_sheet(ctx, doc, i),
            "CAE" => skip_to_next_marker(ctx, i),
            "TEXT" => text::parse_text(ctx, doc, i),
            "LINES" => text::parse_lines(ctx, doc, i),
            "CAEDECAL" => decal::parse_caedecal(ctx, doc, i),
            "PARTTYPE" => parttype::parse_parttypes(ctx, doc, i),
            "PART" => part::parse_parts(ctx, doc, i),
            "OFFPAGE REFS" => nodes::parse_offpage_refs(ctx, doc, i),
            "TIEDOTS" => nodes::parse_tiedots(ctx, doc, i),
            "CONNECTION" => connection::parse_connection(ctx, doc, i),
            "NETNAMES" => nodes::parse_netnames(ctx, doc, i),
            "CAM" | "MISC" => skip_braced(ctx, i),
            other => {
                ctx.info(i, &format!("unknown section *{other}*, skipped"));
                skip_to_next_marker(ctx, i)
            }
        };

        // A sub-parser that consumed nothing still moves the cursor forward.
        i = last.max(i) + 1;
    }
}

/// Consume everything up to (not including) the next marker.
fn skip_to_next_marker(ctx: &SectionCtx<'_>, start: usize) -> usize {
    ctx.lines.next_marker(start + 1) - 1
}

/// Skip an opaque brace-delimited section. Without any opening brace before
/// the next marker this behaves like `skip_to_next_marker`.
fn skip_braced(ctx: &mut SectionCtx<'_>, start: usize) -> usize {
    let mut depth: i64 = 0;
    let mut opened = false;
    let mut i = start + 1;

    while i < ctx.lines.len() {
        if !opened && ctx.lines.is_marker(i) {
            return i - 1;
        }
        for ch in ctx.lines.line(i).chars() {
            match ch {
                '{' => {
                    depth += 1;
                    opened = true;
                }
                '}' => depth -= 1,
                _ => {}
            }
        }
        if opened && depth <= 0 {
            return i;
        }
        i += 1;
    }

    if opened {
        ctx.warn(start, "unbalanced braces, section runs to end of file");
    }
    ctx.lines.last_index()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{CollectingReporter, NullReporter};

    fn parse(text: &str) -> Result<PadsDocument, ParseError> {
        let mut reporter = NullReporter;
        PadsParser::new(&mut reporter, ParseOptions::default()).parse_str(text)
    }

    #[test]
    fn test_detect_header_logic() {
        let h = detect_header("*PADS-LOGIC-V9.0* DESIGN EXPORT FILE FROM PADS LOGIC").unwrap();
        assert_eq!(h.family, ProductFamily::Logic);
        assert_eq!(h.version, "9.0");
        assert_eq!(h.description, "DESIGN EXPORT FILE FROM PADS LOGIC");
        assert!(h.valid);
    }

    #[test]
    fn test_detect_header_powerlogic() {
        let h = detect_header("*PADS-POWERLOGIC-V5.2*").unwrap();
        assert_eq!(h.family, ProductFamily::PowerLogic);
        assert_eq!(h.version, "5.2");
        assert!(h.description.is_empty());
    }

    #[test]
    fn test_detect_header_rejects() {
        assert!(detect_header("*PADS-PCB-V9.0*").is_none());
        assert!(detect_header("*PADS-LOGIC-V9*").is_none());
        assert!(detect_header("*PADS-LOGIC-Vx.0*").is_none());
        assert!(detect_header("PADS-LOGIC-V9.0").is_none());
        assert!(detect_header("(kicad_sch (version 20230121))").is_none());
    }

    #[test]
    fn test_empty_file_is_fatal() {
        assert!(matches!(parse(""), Err(ParseError::EmptyFile)));
        assert!(matches!(parse("\n\n  \n"), Err(ParseError::EmptyFile)));
    }

    #[test]
    fn test_bad_header_is_fatal() {
        match parse("*PADS-PCB-V9.0*\n*END*\n") {
            Err(ParseError::InvalidHeader(line)) => assert_eq!(line, "*PADS-PCB-V9.0*"),
            other => panic!("Expected InvalidHeader, got {other:?}"),
        }
    }

    #[test]
    fn test_header_and_end_only() {
        let doc = parse("*PADS-LOGIC-V9.0*\n*END*\n").unwrap();
        assert!(doc.header().valid);
        assert!(doc.symbol_defs().is_empty());
        assert!(doc.part_types().is_empty());
        assert!(doc.part_placements().is_empty());
        assert!(doc.signals().is_empty());
        assert!(doc.sheet_headers().is_empty());
        assert!(doc.off_page_connectors().is_empty());
        assert!(doc.tied_dots().is_empty());
        assert!(doc.text_items().is_empty());
        assert!(doc.lines_items().is_empty());
        assert!(doc.net_name_labels().is_empty());
        assert!(doc.sheet_numbers().is_empty());
        assert_eq!(doc.sheet_count(), 1);
    }

    #[test]
    fn test_end_stops_parsing() {
        let text = "\
*PADS-LOGIC-V9.0*
*END*
*PART*
R1 RES 0 0 0 0
";
        let doc = parse(text).unwrap();
        assert!(doc.part_placements().is_empty());
    }

    #[test]
    fn test_unknown_section_is_skipped() {
        let text = "\
*PADS-LOGIC-V9.0*
*BOGUS*   SOMETHING NEW
1 2 3
R1 RES 0 0 0 0
*PART*
R2 RES 10 20 0 0
*END*
";
        let mut reporter = CollectingReporter::new();
        let doc = PadsParser::new(&mut reporter, ParseOptions::default())
            .parse_str(text)
            .unwrap();
        assert_eq!(doc.part_placements().len(), 1);
        assert_eq!(doc.part_placements()[0].reference, "R2");
        assert!(reporter.contains("*BOGUS*"));
    }

    #[test]
    fn test_braced_section_skipped() {
        let text = "\
*PADS-LOGIC-V9.0*
*MISC*      MISCELLANEOUS PARAMETERS
LAYER MILS
{
LAYER 1
{
*NOT A MARKER INSIDE BRACES*
}
}
*PART*
R1 RES 10 20 0 0
*END*
";
        let doc = parse(text).unwrap();
        assert_eq!(doc.part_placements().len(), 1);
    }

    #[test]
    fn test_brace_free_opaque_section_stops_at_marker() {
        let text = "\
*PADS-LOGIC-V9.0*
*CAM*
nothing here
*PART*
R1 RES 10 20 0 0
*END*
";
        let doc = parse(text).unwrap();
        assert_eq!(doc.part_placements().len(), 1);
    }

    #[test]
    fn test_reparse_resets_state() {
        let mut reporter = NullReporter;
        let mut parser = PadsParser::new(&mut reporter, ParseOptions::default());
        let first = parser
            .parse_str("*PADS-LOGIC-V9.0*\n*PART*\nR1 RES 0 0 0 0\n*END*\n")
            .unwrap();
        let second = parser.parse_str("*PADS-LOGIC-V9.0*\n*END*\n").unwrap();
        assert_eq!(first.part_placements().len(), 1);
        assert!(second.part_placements().is_empty());
    }
}
