//! Global parameters (SCH), user fields (FIELDS) and sheet headers (SHT).

use super::source::marker_payload;
use super::values::{split_name_value, tokenize, unquote};
use super::SectionCtx;
use crate::document::PadsDocument;
use crate::types::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParamKey {
    Units,
    CurSheet,
    SheetSize,
    BorderName,
    JobName,
    Grid,
    TextSize,
    LineWidth,
    BusWidth,
    DotSize,
    RefNameSize,
    PartNameSize,
    PinNameSize,
    PinNumSize,
    NetNameSize,
}

/// Known SCH keys. Both the run-together and spaced spellings occur in the
/// wild; the longest match wins.
const PARAM_KEYS: &[(&str, ParamKey)] = &[
    ("UNITS", ParamKey::Units),
    ("CUR SHEET", ParamKey::CurSheet),
    ("CURSHEET", ParamKey::CurSheet),
    ("SHEET SIZE", ParamKey::SheetSize),
    ("SHEETSIZE", ParamKey::SheetSize),
    ("BORDER NAME", ParamKey::BorderName),
    ("BORDERNAME", ParamKey::BorderName),
    ("JOB NAME", ParamKey::JobName),
    ("JOBNAME", ParamKey::JobName),
    ("GRID", ParamKey::Grid),
    ("TEXT SIZE", ParamKey::TextSize),
    ("TEXTSIZE", ParamKey::TextSize),
    ("LINE WIDTH", ParamKey::LineWidth),
    ("LINEWIDTH", ParamKey::LineWidth),
    ("BUS WIDTH", ParamKey::BusWidth),
    ("BUSWIDTH", ParamKey::BusWidth),
    ("DOT SIZE", ParamKey::DotSize),
    ("DOTSIZE", ParamKey::DotSize),
    ("REF NAME SIZE", ParamKey::RefNameSize),
    ("REFNAMESIZE", ParamKey::RefNameSize),
    ("PART NAME SIZE", ParamKey::PartNameSize),
    ("PARTNAMESIZE", ParamKey::PartNameSize),
    ("PIN NAME SIZE", ParamKey::PinNameSize),
    ("PINNAMESIZE", ParamKey::PinNameSize),
    ("PIN NUM SIZE", ParamKey::PinNumSize),
    ("PINNUMSIZE", ParamKey::PinNumSize),
    ("NET NAME SIZE", ParamKey::NetNameSize),
    ("NETNAMESIZE", ParamKey::NetNameSize),
];

/// Find the longest known key that prefixes `line` on a word boundary.
fn match_key(line: &str) -> Option<(ParamKey, &str)> {
    PARAM_KEYS
        .iter()
        .filter(|&&(key, _)| {
            line.strip_prefix(key)
                .is_some_and(|rest| rest.is_empty() || rest.starts_with(char::is_whitespace))
        })
        .max_by_key(|&&(key, _)| key.len())
        .map(|&(key, pk)| (pk, line[key.len()..].trim()))
}

fn read_size(ctx: &mut SectionCtx<'_>, value: &str, idx: usize) -> TextSize {
    let tokens = tokenize(value);
    let height = ctx.float_at(&tokens, 0, "text height", idx);
    let width = if tokens.len() > 1 {
        ctx.float_at(&tokens, 1, "text width", idx)
    } else {
        height
    };
    TextSize { height, width }
}

/// `*SCH*`: one `KEY value` setting per line.
pub(crate) fn parse_sch(ctx: &mut SectionCtx<'_>, doc: &mut PadsDocument, start: usize) -> usize {
    let lines = ctx.lines;
    let mut i = start + 1;

    while i < lines.len() {
        if lines.is_marker(i) {
            return i - 1;
        }
        let line = lines.line(i).trim();
        if line.is_empty() {
            i += 1;
            continue;
        }

        let params = &mut doc.parameters;
        match match_key(line) {
            Some((key, value)) => {
                let tokens = tokenize(value);
                match key {
                    ParamKey::Units => {
                        params.units = Units::from_code(ctx.int_at(&tokens, 0, "UNITS", i))
                    }
                    ParamKey::CurSheet => params.cur_sheet = ctx.int_at(&tokens, 0, "CUR SHEET", i),
                    ParamKey::SheetSize => params.sheet_size = value.to_string(),
                    ParamKey::BorderName => params.border_name = unquote(value).to_string(),
                    ParamKey::JobName => params.job_name = unquote(value).to_string(),
                    ParamKey::Grid => params.grid = ctx.float_at(&tokens, 0, "GRID", i),
                    ParamKey::TextSize => params.text_size = read_size(ctx, value, i),
                    ParamKey::LineWidth => params.line_width = ctx.float_at(&tokens, 0, "LINE WIDTH", i),
                    ParamKey::BusWidth => params.bus_width = ctx.float_at(&tokens, 0, "BUS WIDTH", i),
                    ParamKey::DotSize => params.dot_size = ctx.float_at(&tokens, 0, "DOT SIZE", i),
                    ParamKey::RefNameSize => params.field_sizes.ref_name = read_size(ctx, value, i),
                    ParamKey::PartNameSize => params.field_sizes.part_name = read_size(ctx, value, i),
                    ParamKey::PinNameSize => params.field_sizes.pin_name = read_size(ctx, value, i),
                    ParamKey::PinNumSize => params.field_sizes.pin_number = read_size(ctx, value, i),
                    ParamKey::NetNameSize => params.field_sizes.net_name = read_size(ctx, value, i),
                }
            }
            None => {
                let (key, value) = split_name_value(line);
                params.extra.insert(key.to_string(), value.to_string());
            }
        }
        i += 1;
    }

    lines.last_index()
}

/// `*FIELDS*`: `"Field Name" value` per line.
pub(crate) fn parse_fields(ctx: &mut SectionCtx<'_>, doc: &mut PadsDocument, start: usize) -> usize {
    let lines = ctx.lines;
    let mut i = start + 1;

    while i < lines.len() {
        if lines.is_marker(i) {
            return i - 1;
        }
        let line = lines.line(i).trim();
        if !line.is_empty() {
            let (name, value) = split_name_value(line);
            if name.is_empty() {
                ctx.warn(i, "field without a name, skipped");
            } else {
                doc.parameters
                    .user_fields
                    .insert(name.to_string(), unquote(value).to_string());
            }
        }
        i += 1;
    }

    lines.last_index()
}

/// `*SHT* num name parent_num parent_name`: the header lives on the marker
/// line itself. Sets the sheet stamped onto everything parsed after it.
pub(crate) fn parse_sheet(ctx: &mut SectionCtx<'_>, doc: &mut PadsDocument, start: usize) -> usize {
    let lines = ctx.lines;
    let tokens = tokenize(marker_payload(lines.line(start)));

    let number = if tokens.is_empty() {
        let next = ctx.sheet + 1;
        ctx.warn(start, &format!("sheet header without a number, assuming {next}"));
        next
    } else {
        ctx.int_at(&tokens, 0, "sheet number", start)
    };

    doc.sheet_headers.push(SheetHeader {
        number,
        name: tokens.get(1).map(|s| s.to_string()).unwrap_or_default(),
        parent_number: if tokens.len() > 2 {
            ctx.int_at(&tokens, 2, "parent sheet number", start)
        } else {
            -1
        },
        parent_name: tokens.get(3).map(|s| s.to_string()).unwrap_or_default(),
    });
    ctx.sheet = number;

    start
}
