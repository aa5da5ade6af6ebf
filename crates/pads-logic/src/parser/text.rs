//! Free text (TEXT) and drawn line groups (LINES).

use super::graphics::{parse_full_primitive, parse_text_label};
use super::values::tokenize;
use super::SectionCtx;
use crate::document::PadsDocument;
use crate::types::*;

/// `*TEXT*`: two-line records until the next marker.
pub(crate) fn parse_text(ctx: &mut SectionCtx<'_>, doc: &mut PadsDocument, start: usize) -> usize {
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
        let (label, last) = parse_text_label(ctx, i);
        doc.text_items.push(TextItem {
            label,
            sheet_number: ctx.sheet,
        });
        i = last + 1;
    }

    lines.last_index()
}

/// `*LINES*`: `name LINES x y num_pieces num_texts` headers, each followed by
/// its primitives and then its text labels.
pub(crate) fn parse_lines(ctx: &mut SectionCtx<'_>, doc: &mut PadsDocument, start: usize) -> usize {
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

        let tokens = tokenize(lines.line(i));
        if tokens.len() < 5 {
            ctx.warn(i, "LINES header too short, skipped");
            i += 1;
            continue;
        }
        if tokens[1] != "LINES" {
            ctx.info(i, &format!("LINES item '{}' has type '{}'", tokens[0], tokens[1]));
        }

        let mut item = LinesItem {
            name: tokens[0].to_string(),
            origin: ctx.point_at(&tokens, 2, "origin", i),
            graphics: Vec::new(),
            texts: Vec::new(),
            sheet_number: ctx.sheet,
        };
        let num_pieces = ctx.int_at(&tokens, 4, "piece count", i).max(0);
        let num_texts = ctx.int_at(&tokens, 5, "text count", i).max(0);

        let mut last = i;
        for _ in 0..num_pieces {
            let idx = lines.next_content(last + 1);
            if idx >= lines.len() || lines.is_marker(idx) {
                ctx.warn(i, &format!("LINES item '{}' is missing pieces", item.name));
                break;
            }
            let (graphic, end) = parse_full_primitive(ctx, idx);
            item.graphics.extend(graphic);
            last = end;
        }
        for _ in 0..num_texts {
            let idx = lines.next_content(last + 1);
            if idx >= lines.len() || lines.is_marker(idx) {
                ctx.warn(i, &format!("LINES item '{}' is missing texts", item.name));
                break;
            }
            let (label, end) = parse_text_label(ctx, idx);
            item.texts.push(label);
            last = end;
        }

        doc.lines_items.push(item);
        i = last + 1;
    }

    lines.last_index()
}
