//! Symbol and pin-decal definitions (CAEDECAL).
//!
//! Two header layouts exist and exports mix them, so every record is
//! classified on its own:
//!
//! - full: `name f1 f2 height width h2 w2 num_attrs num_pieces has_polarity
//!   num_pins pin_origin_code is_pin_decal`, followed by an optional
//!   TIMESTAMP, font lines, attribute pairs, multi-line primitives, embedded
//!   text labels and `T`/`P` pin pairs;
//! - simplified: `name num_pieces num_pins gate_count`, followed by
//!   single-line primitives and single-line pins.

use super::graphics::{parse_full_primitive, parse_simple_primitive, parse_text_label, ShapeKeyword};
use super::values::{is_numeric, tokenize, unquote};
use super::SectionCtx;
use crate::document::PadsDocument;
use crate::types::*;

pub const PIN_LENGTH_SHORT: f64 = 100.0;
pub const PIN_LENGTH_LONG: f64 = 300.0;
pub const PIN_LENGTH_DEFAULT: f64 = 200.0;

/// Standard pin decals that have an inverted (`B` suffixed) variant.
const KNOWN_PIN_DECALS: &[&str] = &[
    "PIN",
    "PINSHORT",
    "PINLONG",
    "PINCLK",
    "PINCLKSHORT",
    "PINCLKLONG",
];

/// Decide the header layout of one CAEDECAL record from its token count.
pub fn classify_header(tokens: &[&str]) -> Option<RecordShape> {
    match tokens.len().saturating_sub(1) {
        n if n >= 12 => Some(RecordShape::Full),
        n if n >= 3 => Some(RecordShape::Simplified),
        _ => None,
    }
}

/// Stub length implied by a pin decal name, before cross-reference
/// resolution. An empty name means the symbol draws its own pin.
pub fn pin_length_for_decal(name: &str) -> f64 {
    let upper = name.to_ascii_uppercase();
    if upper.is_empty() {
        0.0
    } else if upper.contains("SHORT") {
        PIN_LENGTH_SHORT
    } else if upper.contains("LONG") {
        PIN_LENGTH_LONG
    } else {
        PIN_LENGTH_DEFAULT
    }
}

/// `(inverted, clock)` flags implied by a pin decal name.
pub fn pin_decal_flags(name: &str) -> (bool, bool) {
    let upper = name.to_ascii_uppercase();
    let inverted = upper
        .strip_suffix('B')
        .is_some_and(|stem| KNOWN_PIN_DECALS.contains(&stem));
    (inverted, upper.contains("CLK"))
}

/// A `T<x> ...` or `T-<x> ...` pin line.
pub fn is_pin_line(line: &str) -> bool {
    let mut chars = line.trim_start().chars();
    chars.next() == Some('T') && chars.next().is_some_and(|c| c.is_ascii_digit() || c == '-')
}

fn is_pin_detail_line(line: &str) -> bool {
    let mut chars = line.trim_start().chars();
    chars.next() == Some('P') && chars.next().is_some_and(|c| c.is_ascii_digit() || c == '-')
}

/// Embedded text positions start with two numbers.
fn is_label_position(line: &str) -> bool {
    let tokens = tokenize(line);
    tokens.len() >= 2 && is_numeric(tokens[0]) && is_numeric(tokens[1])
}

/// `*CAEDECAL*`: symbol records until the next marker.
pub(crate) fn parse_caedecal(ctx: &mut SectionCtx<'_>, doc: &mut PadsDocument, start: usize) -> usize {
    let lines = ctx.lines;
    let mut i = start + 1;

    while i < lines.len() {
        if lines.is_marker(i) {
            return i - 1;
        }
        if lines.is_blank(i) {
            i += 1;
            continue;
        }

        match parse_decal_record(ctx, i) {
            Some((symbol, last)) => {
                if doc.symbol_defs.iter().any(|s| s.name == symbol.name) {
                    ctx.warn(i, &format!("duplicate CAEDECAL '{}', first definition wins", symbol.name));
                }
                doc.symbol_defs.push(symbol);
                i = last + 1;
            }
            None => {
                ctx.warn(i, "unrecognized CAEDECAL record header, skipped");
                i += 1;
            }
        }
    }

    lines.last_index()
}

/// Parse one record starting at its header line. Returns the symbol and the
/// index of its last line, or None when the header fits neither layout.
pub(crate) fn parse_decal_record(ctx: &mut SectionCtx<'_>, idx: usize) -> Option<(SymbolDef, usize)> {
    let lines = ctx.lines;
    let tokens = tokenize(lines.line(idx));
    match classify_header(&tokens)? {
        RecordShape::Full => Some(parse_full_record(ctx, idx, &tokens)),
        RecordShape::Simplified => Some(parse_simplified_record(ctx, idx, &tokens)),
    }
}

fn parse_full_record(ctx: &mut SectionCtx<'_>, idx: usize, tokens: &[&str]) -> (SymbolDef, usize) {
    let lines = ctx.lines;
    let mut sym = SymbolDef::new(tokens[0], RecordShape::Full);
    sym.bounds = SymbolBounds {
        origin: ctx.point_at(tokens, 1, "symbol origin", idx),
        height: ctx.float_at(tokens, 3, "symbol height", idx),
        width: ctx.float_at(tokens, 4, "symbol width", idx),
        alt_height: ctx.float_at(tokens, 5, "symbol height", idx),
        alt_width: ctx.float_at(tokens, 6, "symbol width", idx),
    };
    let num_attrs = ctx.int_at(tokens, 7, "attribute count", idx).max(0);
    let num_pieces = ctx.int_at(tokens, 8, "piece count", idx).max(0);
    sym.has_polarity = ctx.int_at(tokens, 9, "polarity flag", idx) != 0;
    let num_pins = ctx.int_at(tokens, 10, "pin count", idx).max(0);
    sym.pin_origin_code = ctx.int_at(tokens, 11, "pin origin", idx);
    sym.is_pin_decal = ctx.int_at(tokens, 12, "pin decal flag", idx) != 0;

    let mut last = idx;

    if let Some(stamp) = lines.line(last + 1).trim_start().strip_prefix("TIMESTAMP") {
        sym.timestamp = Some(stamp.trim().to_string());
        last += 1;
    }

    for _ in 0..2 {
        let line = lines.line(last + 1).trim();
        if !line.starts_with('"') {
            break;
        }
        sym.fonts.push(unquote(line).to_string());
        last += 1;
    }

    for n in 0..num_attrs {
        let at = lines.next_content(last + 1);
        if at >= lines.len() || lines.is_marker(at) {
            ctx.warn(idx, &format!("'{}' declares {num_attrs} attributes, found {n}", sym.name));
            break;
        }
        let (label, end) = parse_text_label(ctx, at);
        sym.attributes.push(label);
        last = end;
    }

    for n in 0..num_pieces {
        let at = lines.next_content(last + 1);
        if at >= lines.len() || lines.is_marker(at) || is_pin_line(lines.line(at)) {
            ctx.warn(idx, &format!("'{}' declares {num_pieces} pieces, found {n}", sym.name));
            break;
        }
        let (graphic, end) = parse_full_primitive(ctx, at);
        sym.graphics.extend(graphic);
        last = end;
    }

    // Embedded labels run until a blank line, a marker or the first pin.
    loop {
        let at = last + 1;
        if at >= lines.len() || lines.is_blank(at) || lines.is_marker(at) {
            break;
        }
        let line = lines.line(at);
        if is_pin_line(line) || !is_label_position(line) {
            break;
        }
        let (label, end) = parse_text_label(ctx, at);
        sym.texts.push(label);
        last = end;
    }

    for n in 0..num_pins as usize {
        let at = lines.next_content(last + 1);
        if at >= lines.len() || !is_pin_line(lines.line(at)) {
            ctx.warn(idx, &format!("'{}' declares {num_pins} pins, found {n}", sym.name));
            break;
        }
        let mut pin = parse_pin_line(ctx, at, n);
        last = at;
        if is_pin_detail_line(lines.line(at + 1)) {
            apply_pin_details(ctx, at + 1, &mut pin);
            last = at + 1;
        }
        sym.pins.push(pin);
    }

    (sym, last)
}

fn parse_simplified_record(ctx: &mut SectionCtx<'_>, idx: usize, tokens: &[&str]) -> (SymbolDef, usize) {
    let lines = ctx.lines;
    let mut sym = SymbolDef::new(tokens[0], RecordShape::Simplified);
    let num_pieces = ctx.int_at(tokens, 1, "piece count", idx).max(0);
    let num_pins = ctx.int_at(tokens, 2, "pin count", idx).max(0);
    sym.gate_count = ctx.int_at(tokens, 3, "gate count", idx);

    let mut last = idx;

    for n in 0..num_pieces {
        let at = lines.next_content(last + 1);
        let is_piece = at < lines.len()
            && tokenize(lines.line(at))
                .first()
                .is_some_and(|t| ShapeKeyword::parse(t).is_some());
        if !is_piece {
            ctx.warn(idx, &format!("'{}' declares {num_pieces} pieces, found {n}", sym.name));
            break;
        }
        sym.graphics.extend(parse_simple_primitive(ctx, at));
        last = at;
    }

    for n in 0..num_pins as usize {
        let at = lines.next_content(last + 1);
        let line = lines.line(at);
        let is_pin = at < lines.len()
            && (is_pin_line(line) || tokenize(line).first().is_some_and(|t| is_numeric(t)));
        if !is_pin {
            ctx.warn(idx, &format!("'{}' declares {num_pins} pins, found {n}", sym.name));
            break;
        }
        sym.pins.push(parse_pin_line(ctx, at, n));
        last = at;
    }

    (sym, last)
}

/// `T<x> <y> <rot> <side> [pin_decal_name]`. The leading `T` is optional so
/// simplified records can share this decoder.
fn parse_pin_line(ctx: &mut SectionCtx<'_>, idx: usize, index: usize) -> SymbolPin {
    let lines = ctx.lines;
    let line = lines.line(idx).trim_start();
    let body = line.strip_prefix('T').unwrap_or(line);
    let tokens = tokenize(body);

    let pin_decal_name = tokens.get(4).map(|s| s.to_string()).unwrap_or_default();
    let (inverted, clock) = pin_decal_flags(&pin_decal_name);

    SymbolPin {
        number: (index + 1).to_string(),
        position: ctx.point_at(&tokens, 0, "pin position", idx),
        rotation: decode_angle(ctx.float_at(&tokens, 2, "pin rotation", idx)),
        side: ctx.int_at(&tokens, 3, "pin side", idx),
        length: pin_length_for_decal(&pin_decal_name),
        pin_decal_name,
        inverted,
        clock,
        name_hidden: false,
        flags: 0,
        number_offset: None,
        name_offset: None,
    }
}

/// `P<nx> <ny> <nrot> <njust> <mx> <my> <mrot> <mjust> <flags>`: number and
/// name label offsets plus display flags. Bit 128 hides the pin name.
fn apply_pin_details(ctx: &mut SectionCtx<'_>, idx: usize, pin: &mut SymbolPin) {
    let lines = ctx.lines;
    let line = lines.line(idx).trim_start();
    let tokens = tokenize(line.strip_prefix('P').unwrap_or(line));

    pin.number_offset = read_offset(ctx, &tokens, 0, idx);
    pin.name_offset = read_offset(ctx, &tokens, 4, idx);

    if tokens.len() > 8 {
        pin.flags = ctx.int_at(&tokens, 8, "pin flags", idx);
    }
    pin.name_hidden = pin.flags & 128 != 0;
}

fn read_offset(ctx: &mut SectionCtx<'_>, tokens: &[&str], pos: usize, idx: usize) -> Option<TextOffset> {
    if tokens.len() < pos + 4 {
        return None;
    }
    Some(TextOffset {
        position: ctx.point_at(tokens, pos, "pin label offset", idx),
        rotation: decode_angle(ctx.float_at(tokens, pos + 2, "pin label rotation", idx)),
        justification: ctx.int_at(tokens, pos + 3, "pin label justification", idx),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{CollectingReporter, NullReporter};
    use crate::{PadsParser, ParseOptions};
    use approx::assert_relative_eq;

    fn parse(text: &str) -> PadsDocument {
        let mut reporter = NullReporter;
        PadsParser::new(&mut reporter, ParseOptions::default())
            .parse_str(text)
            .unwrap()
    }

    const FULL_DECAL: &str = "\
*PADS-LOGIC-V9.0*
*CAEDECAL*  ITEMS
NAND2 0 0 400 300 100 50 2 2 0 3 0 0
TIMESTAMP 2004.12.06.15.02.21
\"Default Font\"
\"Default Font\"
0 350 0 0 100 80 \"Default Font\"
REF-DES
0 -100 0 0 100 80 \"Default Font\"
PART-TYPE
CLOSED 5 10 0
0 0
300 0
300 400
0 400
0 0
CIRCLE 2 10 0
300 180
340 220
50 200 0 0 60 50
&
T-200 300 0 2 PINB
P-60 10 0 0 40 10 0 1 0
T-200 100 0 2 PINSHORT
P-60 10 0 0 40 10 0 1 128
T500 200 2 3 PINCLK
P-60 10 0 0 40 10 0 1 0

*END*
";

    #[test]
    fn test_classify_header() {
        let full = tokenize("NAND2 0 0 400 300 100 50 2 2 0 3 0 0");
        assert_eq!(full.len(), 13);
        assert_eq!(classify_header(&full), Some(RecordShape::Full));

        let simple = tokenize("NAME 2 1 1");
        assert_eq!(classify_header(&simple), Some(RecordShape::Simplified));

        // Between the two layouts the simplified form wins.
        let mid = tokenize("NAME 1 2 3 4 5 6 7 8 9 10 11");
        assert_eq!(classify_header(&mid), Some(RecordShape::Simplified));

        assert_eq!(classify_header(&tokenize("NAME 2 1")), None);
        assert_eq!(classify_header(&[]), None);
    }

    #[test]
    fn test_full_record() {
        let doc = parse(FULL_DECAL);
        let sym = doc.symbol_def("NAND2").unwrap();
        assert_eq!(sym.shape, RecordShape::Full);
        assert_eq!(sym.timestamp.as_deref(), Some("2004.12.06.15.02.21"));
        assert_eq!(sym.fonts.len(), 2);
        assert_eq!(sym.attributes.len(), 2);
        assert_eq!(sym.attributes[1].text, "PART-TYPE");
        assert_eq!(sym.graphics.len(), 2);
        assert_eq!(sym.graphics[0].kind, GraphicKind::Rectangle);
        assert_eq!(sym.graphics[1].kind, GraphicKind::Circle);
        assert_eq!(sym.texts.len(), 1);
        assert_eq!(sym.texts[0].text, "&");
        assert_relative_eq!(sym.bounds.height, 400.0);
        assert!(!sym.is_pin_decal);

        assert_eq!(sym.pins.len(), 3);
        let p0 = &sym.pins[0];
        assert_eq!(p0.number, "1");
        assert_eq!(p0.position, [-200.0, 300.0]);
        assert!(p0.inverted);
        assert!(!p0.clock);
        assert_relative_eq!(p0.length, PIN_LENGTH_DEFAULT);
        assert!(!p0.name_hidden);

        let p1 = &sym.pins[1];
        assert_relative_eq!(p1.length, PIN_LENGTH_SHORT);
        assert!(p1.name_hidden);
        assert_eq!(p1.name_offset.unwrap().justification, 1);

        let p2 = &sym.pins[2];
        assert_eq!(p2.number, "3");
        assert!(p2.clock);
        assert!(!p2.inverted);
        assert_relative_eq!(p2.rotation, 180.0);
    }

    #[test]
    fn test_simplified_record() {
        let text = "\
*PADS-LOGIC-V9.0*
*CAEDECAL*
RES 2 1 1
OPEN 2 10 0 0 0 100 0
CLOSED 5 10 0 20 -20 80 -20 80 20 20 20 20 -20
T0 0 0 0
*END*
";
        let doc = parse(text);
        let sym = doc.symbol_def("RES").unwrap();
        assert_eq!(sym.shape, RecordShape::Simplified);
        assert_eq!(sym.gate_count, 1);
        assert_eq!(sym.graphics.len(), 2);
        assert_eq!(sym.graphics[1].kind, GraphicKind::Rectangle);
        assert_eq!(sym.pins.len(), 1);
        assert_eq!(sym.pins[0].pin_decal_name, "");
        assert_relative_eq!(sym.pins[0].length, 0.0);
        assert!(sym.attributes.is_empty());
        assert!(sym.texts.is_empty());
    }

    #[test]
    fn test_mixed_layouts_in_one_section() {
        let text = "\
*PADS-LOGIC-V9.0*
*CAEDECAL*
SMALL 1 0 1
OPEN 2 10 0 0 0 10 0

BIG 0 0 100 100 0 0 0 1 0 0 0 0
OPEN 2 10 0
0 0
100 0

TINY 2
*END*
";
        let mut reporter = CollectingReporter::new();
        let doc = PadsParser::new(&mut reporter, ParseOptions::default())
            .parse_str(text)
            .unwrap();
        assert_eq!(doc.symbol_defs().len(), 2);
        assert_eq!(doc.symbol_def("SMALL").unwrap().shape, RecordShape::Simplified);
        assert_eq!(doc.symbol_def("BIG").unwrap().shape, RecordShape::Full);
        assert!(doc.symbol_def("TINY").is_none());
        assert!(reporter.contains("unrecognized CAEDECAL"));
    }

    #[test]
    fn test_truncated_record_does_not_panic() {
        let text = "\
*PADS-LOGIC-V9.0*
*CAEDECAL*
CUT 0 0 100 100 0 0 3 4 0 5 0 0
\"Default Font\"
0 0 0 0 100 80
*PART*
R1 RES 0 0 0 0
*END*
";
        let doc = parse(text);
        let sym = doc.symbol_def("CUT").unwrap();
        assert_eq!(sym.attributes.len(), 1);
        assert!(sym.attributes[0].text.is_empty());
        assert!(sym.pins.is_empty());
        assert_eq!(doc.part_placements().len(), 1);
    }

    #[test]
    fn test_pin_decal_names() {
        assert_relative_eq!(pin_length_for_decal(""), 0.0);
        assert_relative_eq!(pin_length_for_decal("PINSHORT"), 100.0);
        assert_relative_eq!(pin_length_for_decal("PINLONGB"), 300.0);
        assert_relative_eq!(pin_length_for_decal("PIN_CUSTOM_300"), 200.0);

        assert_eq!(pin_decal_flags("PINB"), (true, false));
        assert_eq!(pin_decal_flags("PINCLKB"), (true, true));
        assert_eq!(pin_decal_flags("PINCLK"), (false, true));
        assert_eq!(pin_decal_flags("MYB"), (false, false));
    }

    #[test]
    fn test_is_pin_line() {
        assert!(is_pin_line("T-200 300 0 2 PINB"));
        assert!(is_pin_line("T0 0 0 0"));
        assert!(!is_pin_line("TIMESTAMP 2004.12.06"));
        assert!(!is_pin_line("TITLE"));
    }

    #[test]
    fn test_over_declared_piece_and_pin_counts() {
        let text = "\
*PADS-LOGIC-V9.0*
*CAEDECAL*
HUGE 0 0 100 100 0 0 0 999999999999999999 0 999999999999999999 0 0
OPEN 2 10 0
0 0
100 0
T0 0 0 0 PIN
P-60 10 0 0 40 10 0 1 0
SIMPLE 999999999999999999 999999999999999999 1
OPEN 2 10 0 0 0 10 0
T0 0 0 0
*PART*
R1 RES 0 0 0 0
*END*
";
        let mut reporter = CollectingReporter::new();
        let doc = PadsParser::new(&mut reporter, ParseOptions::default())
            .parse_str(text)
            .unwrap();
        let huge = doc.symbol_def("HUGE").unwrap();
        assert_eq!(huge.graphics.len(), 1);
        assert_eq!(huge.pins.len(), 1);
        let simple = doc.symbol_def("SIMPLE").unwrap();
        assert_eq!(simple.graphics.len(), 1);
        assert_eq!(simple.pins.len(), 1);
        assert_eq!(doc.part_placements().len(), 1);
        assert!(reporter.contains("pieces, found 1"));
        assert!(reporter.contains("pins, found 1"));
    }
}
