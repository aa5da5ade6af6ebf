//! Logical part definitions (PARTTYPE).
//!
//! A record is a header line followed by body lines up to the next blank
//! line or marker. Gate data comes in two layouts, chosen per record by the
//! first body line after the optional TIMESTAMP: `G:` starts the legacy
//! packed layout, anything else the `GATE`/`CONN`/`SIGPIN` keyword layout.

use super::values::{is_numeric, read_int, tokenize};
use super::SectionCtx;
use crate::document::PadsDocument;
use crate::types::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GateLayout {
    Legacy,
    Keyword,
}

fn is_block_keyword(token: &str) -> bool {
    matches!(token, "GATE" | "CONN" | "SIGPIN")
}

/// `*PARTTYPE*`: part type records until the next marker.
pub(crate) fn parse_parttypes(ctx: &mut SectionCtx<'_>, doc: &mut PadsDocument, start: usize) -> usize {
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
        let (part_type, last) = parse_parttype_record(ctx, i);
        doc.part_types.push(part_type);
        i = last + 1;
    }

    lines.last_index()
}

/// Index one past the last body line of the record whose header is at `idx`.
fn record_end(ctx: &SectionCtx<'_>, idx: usize) -> usize {
    let lines = ctx.lines;
    (idx + 1..lines.len())
        .find(|&j| lines.is_blank(j) || lines.is_marker(j))
        .unwrap_or(lines.len())
}

fn parse_parttype_record(ctx: &mut SectionCtx<'_>, idx: usize) -> (PartTypeDef, usize) {
    let lines = ctx.lines;
    let tokens = tokenize(lines.line(idx));
    let end = record_end(ctx, idx);

    let mut pt = PartTypeDef {
        name: tokens.first().map(|s| s.to_string()).unwrap_or_default(),
        category: tokens.get(1).map(|s| s.to_string()).unwrap_or_default(),
        num_physical: ctx.int_at(&tokens, 2, "gate count", idx),
        num_sigpins: ctx.int_at(&tokens, 3, "signal pin count", idx),
        num_swap_groups: ctx.int_at(&tokens, 5, "swap group count", idx),
        timestamp: None,
        gates: Vec::new(),
        special: SpecialKind::from_part_type_name(tokens.first().copied().unwrap_or("")).map(
            |kind| SpecialSymbols {
                kind,
                keyword: None,
                variants: Vec::new(),
            },
        ),
        sig_pins: Vec::new(),
        swap_lines: Vec::new(),
    };

    let mut j = idx + 1;
    if j < end {
        if let Some(stamp) = lines.line(j).trim_start().strip_prefix("TIMESTAMP") {
            pt.timestamp = Some(stamp.trim().to_string());
            j += 1;
        }
    }

    let layout = if j < end && lines.line(j).trim_start().starts_with("G:") {
        GateLayout::Legacy
    } else {
        GateLayout::Keyword
    };

    while j < end {
        let line = lines.line(j).trim();
        let tokens = tokenize(line);
        let head = tokens.first().copied().unwrap_or("");

        let last = if layout == GateLayout::Legacy && head.starts_with("G:") {
            let (gate, last) = parse_legacy_gate(ctx, j, end);
            pt.gates.push(gate);
            last
        } else if layout == GateLayout::Keyword && (head == "GATE" || head == "CONN") {
            let (gate, last) = parse_gate_block(ctx, j, end, head == "CONN");
            pt.gates.push(gate);
            last
        } else if head == "SIGPIN" {
            pt.sig_pins.push(SigPin {
                pin_number: tokens.get(1).map(|s| s.to_string()).unwrap_or_default(),
                net_name: tokens.get(2).map(|s| s.to_string()).unwrap_or_default(),
            });
            j
        } else if pt.special.as_ref().is_some_and(|s| s.keyword.is_none())
            && tokens.len() >= 2
            && !is_numeric(head)
            && is_numeric(tokens[1])
        {
            parse_special_variants(ctx, j, end, &mut pt)
        } else {
            pt.swap_lines.push(line.to_string());
            j
        };
        j = last + 1;
    }

    if let Some(special) = pt.special.as_mut() {
        if special.variants.is_empty() {
            special.variants.extend(synthesize_variant(&pt.gates));
        }
    }

    if pt.special.is_none() && pt.num_physical > 0 && pt.gates.len() as i64 != pt.num_physical {
        ctx.info(
            idx,
            &format!(
                "part type '{}' declares {} gates, found {}",
                pt.name,
                pt.num_physical,
                pt.gates.len()
            ),
        );
    }

    (pt, end.saturating_sub(1).max(idx))
}

/// Legacy special symbols carry their single variant as a one-pin gate.
fn synthesize_variant(gates: &[GateDef]) -> Option<SpecialVariant> {
    let gate = gates.first()?;
    let decal_name = gate.decal_names.first()?.clone();
    let (pin_type, net_name) = match gate.pins.first() {
        Some(pin) => (pin.pin_type.clone(), pin.name.clone()),
        None => (PinElectricalType::Undefined, String::new()),
    };
    Some(SpecialVariant {
        decal_name,
        pin_type,
        net_name,
    })
}

/// `<KEYWORD> <count>` followed by `count` lines `decal_name pin_type [net]`.
fn parse_special_variants(
    ctx: &mut SectionCtx<'_>,
    idx: usize,
    end: usize,
    pt: &mut PartTypeDef,
) -> usize {
    let lines = ctx.lines;
    let tokens = tokenize(lines.line(idx));
    let count = ctx.int_at(&tokens, 1, "variant count", idx).max(0) as usize;

    let mut variants = Vec::new();
    let mut last = idx;
    for n in 0..count {
        let at = idx + 1 + n;
        if at >= end {
            ctx.warn(idx, &format!("'{}' declares {count} variants, found {n}", pt.name));
            break;
        }
        let vt = tokenize(lines.line(at));
        variants.push(SpecialVariant {
            decal_name: vt.first().map(|s| s.to_string()).unwrap_or_default(),
            pin_type: PinElectricalType::from_code(vt.get(1).copied().unwrap_or("")),
            net_name: vt.get(2).map(|s| s.to_string()).unwrap_or_default(),
        });
        last = at;
    }

    if let Some(special) = pt.special.as_mut() {
        special.keyword = tokens.first().map(|s| s.to_string());
        special.variants = variants;
    }
    last
}

/// `GATE num_decals num_pins swap_flag` or `CONN num_decals num_pins`, then
/// one decal name per line, then one pin per line.
fn parse_gate_block(ctx: &mut SectionCtx<'_>, idx: usize, end: usize, connector: bool) -> (GateDef, usize) {
    let lines = ctx.lines;
    let tokens = tokenize(lines.line(idx));
    let num_decals = ctx.int_at(&tokens, 1, "decal count", idx).max(0) as usize;
    let num_pins = ctx.int_at(&tokens, 2, "pin count", idx).max(0) as usize;

    let mut gate = GateDef {
        swap_flag: if connector {
            0
        } else {
            ctx.int_at(&tokens, 3, "swap flag", idx)
        },
        declared_pins: num_pins as i64,
        connector,
        ..GateDef::default()
    };

    let mut last = idx;
    for _ in 0..num_decals {
        let at = last + 1;
        if at >= end {
            ctx.warn(idx, "gate block ends before its decal list");
            return (gate, last);
        }
        if let Some(name) = tokenize(lines.line(at)).first() {
            gate.decal_names.push(name.to_string());
        }
        last = at;
    }

    for n in 0..num_pins {
        let at = last + 1;
        let pt = tokenize(lines.line(at));
        if at >= end || pt.first().is_some_and(|t| is_block_keyword(t)) {
            ctx.warn(idx, &format!("gate declares {num_pins} pins, found {n}"));
            break;
        }
        let pin = if connector {
            PartTypePin {
                id: pt[0].to_string(),
                swap_group: 0,
                pin_type: PinElectricalType::from_code(pt.get(1).copied().unwrap_or("")),
                name: pt.get(2).map(|s| s.to_string()).unwrap_or_default(),
            }
        } else {
            PartTypePin {
                id: pt[0].to_string(),
                swap_group: ctx.int_at(&pt, 1, "swap group", at),
                pin_type: PinElectricalType::from_code(pt.get(2).copied().unwrap_or("")),
                name: pt.get(3).map(|s| s.to_string()).unwrap_or_default(),
            }
        };
        gate.pins.push(pin);
        last = at;
    }

    (gate, last)
}

/// `G:decal[:decal...] swap_flag num_pins`, then `id.swap.type[.name]`
/// tokens packed several per line until `num_pins` pins are read.
fn parse_legacy_gate(ctx: &mut SectionCtx<'_>, idx: usize, end: usize) -> (GateDef, usize) {
    let lines = ctx.lines;
    let tokens = tokenize(lines.line(idx));
    let decal_list = tokens[0].strip_prefix("G:").unwrap_or(tokens[0]);
    let num_pins = ctx.int_at(&tokens, 2, "pin count", idx).max(0) as usize;

    let mut gate = GateDef {
        decal_names: decal_list
            .split(':')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        swap_flag: ctx.int_at(&tokens, 1, "swap flag", idx),
        declared_pins: num_pins as i64,
        ..GateDef::default()
    };

    let mut last = idx;
    while gate.pins.len() < num_pins {
        let at = last + 1;
        if at >= end {
            break;
        }
        let pt = tokenize(lines.line(at));
        if pt.first().is_some_and(|t| t.starts_with("G:") || is_block_keyword(t)) {
            break;
        }
        for token in pt {
            gate.pins.push(parse_packed_pin(ctx, token, at));
        }
        last = at;
    }

    if gate.pins.len() != num_pins {
        ctx.warn(
            idx,
            &format!("legacy gate declares {num_pins} pins, found {}", gate.pins.len()),
        );
    }
    (gate, last)
}

/// `id.swap.type[.name]`
fn parse_packed_pin(ctx: &mut SectionCtx<'_>, token: &str, idx: usize) -> PartTypePin {
    let mut fields = token.splitn(4, '.');
    let id = fields.next().unwrap_or("").to_string();
    let swap_group = match fields.next() {
        Some(s) if !s.is_empty() => read_int(s, "swap group", idx, &mut *ctx.reporter),
        _ => 0,
    };
    let pin_type = PinElectricalType::from_code(fields.next().unwrap_or(""));
    let name = fields.next().unwrap_or("").to_string();
    PartTypePin {
        id,
        swap_group,
        pin_type,
        name,
    }
}
