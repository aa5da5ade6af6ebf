//! Sheet-local drawing nodes: off-page connectors, tie dots and net name
//! labels. All three are one record per line.

use super::values::tokenize;
use super::SectionCtx;
use crate::document::PadsDocument;
use crate::types::*;

/// Run `record` over every content line until the next marker, skipping
/// lines with fewer than `min_tokens` tokens.
fn for_each_record<F>(ctx: &mut SectionCtx<'_>, start: usize, min_tokens: usize, what: &str, mut record: F) -> usize
where
    F: FnMut(&mut SectionCtx<'_>, &[&str], usize),
{
    let lines = ctx.lines;
    let mut i = start + 1;

    while i < lines.len() {
        if lines.is_marker(i) {
            return i - 1;
        }
        if !lines.is_blank(i) {
            let tokens = tokenize(lines.line(i));
            if tokens.len() < min_tokens {
                ctx.warn(i, &format!("{what} record too short, skipped"));
            } else {
                record(ctx, &tokens, i);
            }
        }
        i += 1;
    }

    lines.last_index()
}

/// `*OFFPAGE REFS*`: `id symbol x y angle mirror [variant]`.
pub(crate) fn parse_offpage_refs(ctx: &mut SectionCtx<'_>, doc: &mut PadsDocument, start: usize) -> usize {
    for_each_record(ctx, start, 4, "off-page connector", |ctx, tokens, idx| {
        doc.off_page_connectors.push(OffPageConnector {
            id: tokens[0].to_string(),
            symbol_name: tokens[1].to_string(),
            position: ctx.point_at(tokens, 2, "position", idx),
            rotation: decode_angle(ctx.float_at(tokens, 4, "rotation", idx)),
            mirrored: ctx.int_at(tokens, 5, "mirror", idx) != 0,
            variant_index: ctx.int_at(tokens, 6, "variant index", idx),
            sheet_number: ctx.sheet,
            net_name: None,
        });
    })
}

/// `*TIEDOTS*`: `id x y`.
pub(crate) fn parse_tiedots(ctx: &mut SectionCtx<'_>, doc: &mut PadsDocument, start: usize) -> usize {
    for_each_record(ctx, start, 3, "tie dot", |ctx, tokens, idx| {
        doc.tied_dots.push(TiedDot {
            id: tokens[0].to_string(),
            position: ctx.point_at(tokens, 1, "position", idx),
            sheet_number: ctx.sheet,
            net_name: None,
        });
    })
}

/// `*NETNAMES*`: `net x y rot just [height width]`.
pub(crate) fn parse_netnames(ctx: &mut SectionCtx<'_>, doc: &mut PadsDocument, start: usize) -> usize {
    let defaults = doc.parameters.field_sizes.net_name;
    for_each_record(ctx, start, 3, "net name", |ctx, tokens, idx| {
        let size = if tokens.len() > 6 {
            TextSize {
                height: ctx.float_at(tokens, 5, "text height", idx),
                width: ctx.float_at(tokens, 6, "text width", idx),
            }
        } else {
            defaults
        };
        doc.net_name_labels.push(NetNameLabel {
            net_name: tokens[0].to_string(),
            position: ctx.point_at(tokens, 1, "position", idx),
            rotation: decode_angle(ctx.float_at(tokens, 3, "rotation", idx)),
            justification: ctx.int_at(tokens, 4, "justification", idx),
            size,
            sheet_number: ctx.sheet,
        });
    })
}
