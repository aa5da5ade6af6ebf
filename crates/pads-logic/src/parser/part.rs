//! Part placements (PART).

use super::graphics::parse_label_position;
use super::values::{is_numeric, split_name_value, tokenize, unquote};
use super::SectionCtx;
use crate::document::PadsDocument;
use crate::types::*;

const LONG_HEADER_TOKENS: usize = 16;
const MAX_FONT_LINES: usize = 2;

/// Header shapes seen in PART records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PartHeader {
    /// `ref type x y angle mirror h1 w1 h2 w2 num_attrs num_displayed num_pins unused gate unused2`
    Long,
    /// `ref type x y angle mirror [sheet [gate]]`
    Short,
    /// `ref net_name $type x y angle mirror [variant]`
    Power,
}

fn classify_header(tokens: &[&str]) -> PartHeader {
    match tokens.get(2) {
        Some(t) if !is_numeric(t) => PartHeader::Power,
        _ if tokens.len() >= LONG_HEADER_TOKENS => PartHeader::Long,
        _ => PartHeader::Short,
    }
}

/// Gate index from a trailing `-X` or `.X` letter suffix (`U3-B` → 1).
pub fn gate_from_reference(reference: &str) -> Option<i64> {
    let (_, suffix) = reference.rsplit_once(['-', '.'])?;
    let mut chars = suffix.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_alphabetic() => {
            Some(c.to_ascii_uppercase() as i64 - 'A' as i64)
        }
        _ => None,
    }
}

/// `*PART*`: one header line per placement plus its attribute block.
pub(crate) fn parse_parts(ctx: &mut SectionCtx<'_>, doc: &mut PadsDocument, start: usize) -> usize {
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
        match parse_part_record(ctx, i) {
            Some((part, last)) => {
                doc.parts.push(part);
                i = last + 1;
            }
            None => i += 1,
        }
    }

    lines.last_index()
}

fn is_content(ctx: &SectionCtx<'_>, idx: usize) -> bool {
    idx < ctx.lines.len() && !ctx.lines.is_blank(idx) && !ctx.lines.is_marker(idx)
}

fn parse_part_record(ctx: &mut SectionCtx<'_>, idx: usize) -> Option<(PartPlacement, usize)> {
    let lines = ctx.lines;
    let tokens = tokenize(lines.line(idx));
    if tokens.len() < 6 {
        ctx.warn(idx, "part header too short, skipped");
        return None;
    }

    let shape = classify_header(&tokens);
    let mut part = match shape {
        PartHeader::Power => {
            let mut part = PartPlacement::new(tokens[0], tokens[2], ctx.sheet);
            part.is_power = true;
            part.power_net_name = Some(tokens[1].to_string());
            part.position = ctx.point_at(&tokens, 3, "position", idx);
            part.rotation = decode_angle(ctx.float_at(&tokens, 5, "rotation", idx));
            part.mirrored = ctx.int_at(&tokens, 6, "mirror", idx) != 0;
            part.gate_index = ctx.int_at(&tokens, 7, "variant index", idx);
            part
        }
        PartHeader::Long | PartHeader::Short => {
            let mut part = PartPlacement::new(tokens[0], tokens[1], ctx.sheet);
            part.position = ctx.point_at(&tokens, 2, "position", idx);
            part.rotation = decode_angle(ctx.float_at(&tokens, 4, "rotation", idx));
            part.mirrored = ctx.int_at(&tokens, 5, "mirror", idx) != 0;
            part
        }
    };

    let mut num_attrs = 0;
    let mut num_displayed = 0;
    match shape {
        PartHeader::Long => {
            part.ref_text_size = TextSize {
                height: ctx.float_at(&tokens, 6, "ref height", idx),
                width: ctx.float_at(&tokens, 7, "ref width", idx),
            };
            part.type_text_size = TextSize {
                height: ctx.float_at(&tokens, 8, "type height", idx),
                width: ctx.float_at(&tokens, 9, "type width", idx),
            };
            num_attrs = ctx.int_at(&tokens, 10, "attribute count", idx).max(0) as usize;
            num_displayed = ctx.int_at(&tokens, 11, "displayed value count", idx).max(0) as usize;
            part.declared_pins = ctx.int_at(&tokens, 12, "pin count", idx);
            part.gate_index = ctx.int_at(&tokens, 14, "gate", idx);
        }
        PartHeader::Short => {
            if tokens.len() > 6 {
                part.sheet_number = ctx.int_at(&tokens, 6, "sheet", idx);
            }
            part.gate_index = if tokens.len() > 7 {
                ctx.int_at(&tokens, 7, "gate", idx)
            } else {
                gate_from_reference(&part.reference).unwrap_or(0)
            };
        }
        PartHeader::Power => {}
    }

    let last = if num_attrs > 0 || num_displayed > 0 {
        parse_attribute_block(ctx, idx, &mut part, num_attrs, num_displayed)
    } else {
        parse_simple_attributes(ctx, idx, &mut part)
    };

    Some((part, last))
}

/// Fonts, label pairs, displayed-value overrides, then numeric pin
/// overrides. Returns the last line consumed.
fn parse_attribute_block(
    ctx: &mut SectionCtx<'_>,
    idx: usize,
    part: &mut PartPlacement,
    num_attrs: usize,
    num_displayed: usize,
) -> usize {
    let lines = ctx.lines;
    let mut last = idx;

    while part.fonts.len() < MAX_FONT_LINES && is_content(ctx, last + 1) {
        let line = lines.line(last + 1).trim();
        if !line.starts_with('"') || tokenize(line).len() != 1 {
            break;
        }
        part.fonts.push(unquote(line).to_string());
        last += 1;
    }

    for n in 0..num_attrs {
        if !is_content(ctx, last + 1) || !is_content(ctx, last + 2) {
            ctx.warn(
                idx,
                &format!("part '{}' declares {num_attrs} attributes, found {n}", part.reference),
            );
            break;
        }
        let label = parse_label_position(ctx, last + 1);
        let name = unquote(lines.line(last + 2).trim()).to_string();
        let value = match name.as_str() {
            "Ref.Des." => part.reference.clone(),
            "Part Type" => part.part_type.clone(),
            _ => String::new(),
        };
        part.attributes.push(PartAttribute {
            name,
            value,
            position: label.position,
            rotation: label.rotation,
            justification: label.justification,
            size: label.size,
            visible: true,
        });
        last += 2;
    }

    for n in 0..num_displayed {
        if !is_content(ctx, last + 1) {
            ctx.warn(
                idx,
                &format!("part '{}' declares {num_displayed} values, found {n}", part.reference),
            );
            break;
        }
        let (name, value) = split_name_value(lines.line(last + 1).trim());
        part.attr_overrides
            .insert(name.to_string(), unquote(value).to_string());
        last += 1;
    }

    while is_content(ctx, last + 1) {
        let tokens = tokenize(lines.line(last + 1));
        let Some(pin_index) = tokens.first().and_then(|t| t.parse::<i64>().ok()) else {
            break;
        };
        let at = last + 1;
        let flags = if tokens.len() > 1 {
            ctx.int_at(&tokens, 1, "pin flags", at)
        } else {
            0
        };
        let values = (2..tokens.len())
            .map(|pos| ctx.float_at(&tokens, pos, "pin value", at))
            .collect();
        part.pin_overrides.push(PinOverride {
            pin_index,
            flags,
            values,
        });
        last = at;
    }

    last
}

/// `@name value x y rot size [visible]` lines directly after the header.
fn parse_simple_attributes(ctx: &mut SectionCtx<'_>, idx: usize, part: &mut PartPlacement) -> usize {
    let lines = ctx.lines;
    let mut last = idx;

    while is_content(ctx, last + 1) {
        let at = last + 1;
        let tokens = tokenize(lines.line(at));
        let Some(name) = tokens.first().and_then(|t| t.strip_prefix('@')) else {
            break;
        };
        let size = ctx.float_at(&tokens, 5, "attribute size", at);
        part.attributes.push(PartAttribute {
            name: name.to_string(),
            value: tokens.get(1).map(|s| s.to_string()).unwrap_or_default(),
            position: ctx.point_at(&tokens, 2, "attribute position", at),
            rotation: decode_angle(ctx.float_at(&tokens, 4, "attribute rotation", at)),
            justification: 0,
            size: TextSize {
                height: size,
                width: size,
            },
            visible: tokens.len() <= 6 || ctx.int_at(&tokens, 6, "attribute visibility", at) != 0,
        });
        last = at;
    }

    last
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

    fn wrap(body: &str) -> String {
        format!("*PADS-LOGIC-V9.0*\n*PART*       ITEMS\n{body}*END*\n")
    }

    #[test]
    fn test_gate_from_reference() {
        assert_eq!(gate_from_reference("U3-B"), Some(1));
        assert_eq!(gate_from_reference("U3.a"), Some(0));
        assert_eq!(gate_from_reference("U12-D"), Some(3));
        assert_eq!(gate_from_reference("U3"), None);
        assert_eq!(gate_from_reference("U3-BB"), None);
        assert_eq!(gate_from_reference("U3-1"), None);
    }

    #[test]
    fn test_normal_part_long_header() {
        let doc = parse(&wrap("R1 RES1 100 200 0 0 1 1 1 1 1 1 3 0 0 0\n"));
        let part = doc.part_placement("R1").unwrap();
        assert!(!part.is_power);
        assert_eq!(part.part_type, "RES1");
        assert_eq!(part.position, [100.0, 200.0]);
        assert_eq!(part.declared_pins, 3);
        assert_eq!(part.gate_index, 0);
        assert!(part.power_net_name.is_none());
    }

    #[test]
    fn test_power_placement() {
        let doc = parse(&wrap("VCC1 GND $PWR_SYMS 100 200 0 0 2\n"));
        let part = doc.part_placement("VCC1").unwrap();
        assert!(part.is_power);
        assert_eq!(part.power_net_name.as_deref(), Some("GND"));
        assert_eq!(part.part_type, "$PWR_SYMS");
        assert_eq!(part.position, [100.0, 200.0]);
        assert_eq!(part.gate_index, 2);
    }

    #[test]
    fn test_gate_index_from_suffix() {
        let doc = parse(&wrap("U3-B 7400 500 600 1 1\n"));
        let part = doc.part_placement("U3-B").unwrap();
        assert_eq!(part.gate_index, 1);
        assert_relative_eq!(part.rotation, 90.0);
        assert!(part.mirrored);
    }

    #[test]
    fn test_short_header_explicit_sheet_and_gate() {
        let doc = parse(&wrap("U4-A 7400 0 0 2 0 3 2\n"));
        let part = doc.part_placement("U4-A").unwrap();
        assert_eq!(part.sheet_number, 3);
        assert_eq!(part.gate_index, 2);
        assert_relative_eq!(part.rotation, 180.0);
    }

    #[test]
    fn test_nonstandard_angle_is_literal_degrees() {
        // Accepted behavior for nonstandard exports, not a format rule.
        let doc = parse(&wrap("R9 RES 0 0 45 0\n"));
        assert_relative_eq!(doc.part_placement("R9").unwrap().rotation, 45.0);
    }

    #[test]
    fn test_attribute_block() {
        let body = "\
U1 7400 1000 2000 0 0 80 60 70 50 2 1 14 0 1 0
\"Regular <Romansim Stroke Font>\"
\"Regular <Romansim Stroke Font>\"
-50 120 0 0 80 60
Ref.Des.
-50 -120 0 0 70 50
Part Type
\"Value\" 74HC00
3 1 0.5 2
5
R2 RES 0 0 0 0
";
        let doc = parse(&wrap(body));
        assert_eq!(doc.part_placements().len(), 2);

        let part = doc.part_placement("U1").unwrap();
        assert_eq!(part.gate_index, 1);
        assert_eq!(part.fonts.len(), 2);
        assert_relative_eq!(part.ref_text_size.height, 80.0);
        assert_relative_eq!(part.type_text_size.width, 50.0);
        assert_eq!(part.attributes.len(), 2);
        assert_eq!(part.attribute("Ref.Des.").unwrap().value, "U1");
        assert_eq!(part.attribute("Part Type").unwrap().value, "7400");
        assert_eq!(part.attribute("Ref.Des.").unwrap().position, [-50.0, 120.0]);
        assert_eq!(part.attr_overrides.get("Value").map(String::as_str), Some("74HC00"));
        assert_eq!(
            part.pin_overrides,
            vec![
                PinOverride { pin_index: 3, flags: 1, values: vec![0.5, 2.0] },
                PinOverride { pin_index: 5, flags: 0, values: vec![] },
            ]
        );
    }

    #[test]
    fn test_simple_attribute_lines() {
        let body = "\
C1 CAP 300 400 0 0
@Value 10uF 20 30 0 50
@Tolerance \"10 %\" 20 -30 1 40 0
C2 CAP 0 0 0 0
";
        let doc = parse(&wrap(body));
        let part = doc.part_placement("C1").unwrap();
        assert_eq!(part.attributes.len(), 2);
        let value = part.attribute("Value").unwrap();
        assert_eq!(value.value, "10uF");
        assert!(value.visible);
        assert_relative_eq!(value.size.height, 50.0);
        let tol = part.attribute("Tolerance").unwrap();
        assert_eq!(tol.value, "10 %");
        assert!(!tol.visible);
        assert_relative_eq!(tol.rotation, 90.0);
        assert!(doc.part_placement("C2").is_some());
    }

    #[test]
    fn test_parts_stamped_with_sheet() {
        let text = "\
*PADS-LOGIC-V9.0*
*PART*
R1 RES 0 0 0 0
*SHT*   2 IO 1 MAIN
*PART*
R2 RES 0 0 0 0
R3 RES 0 0 0 0
*END*
";
        let doc = parse(text);
        assert_eq!(doc.part_placement("R1").unwrap().sheet_number, 1);
        let on_two: Vec<_> = doc.parts_on_sheet(2).iter().map(|p| p.reference.as_str()).collect();
        assert_eq!(on_two, vec!["R2", "R3"]);
    }

    #[test]
    fn test_short_header_line_reports() {
        let mut reporter = CollectingReporter::new();
        let doc = PadsParser::new(&mut reporter, ParseOptions::default())
            .parse_str(&wrap("R1 RES 0\nR2 RES 0 0 0 0\n"))
            .unwrap();
        assert_eq!(doc.part_placements().len(), 1);
        assert!(reporter.contains("part header too short"));
    }
}
