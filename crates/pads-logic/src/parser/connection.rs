//! Net connectivity (CONNECTION and its SIGNAL blocks).

use super::source::{marker_payload, section_name};
use super::values::{tokenize, unquote};
use super::SectionCtx;
use crate::document::PadsDocument;
use crate::types::*;

/// Endpoints starting with this are drawing nodes (tie dots, off-page
/// connectors, bends), not component pins.
pub const NODE_ID_PREFIX: &str = "@@@";

/// `REF.PIN` endpoint split at the last dot. None for node ids and for
/// endpoints without both halves.
pub fn pin_connection_for(endpoint: &str) -> Option<PinConnection> {
    if endpoint.starts_with(NODE_ID_PREFIX) {
        return None;
    }
    let (reference, pin_number) = endpoint.rsplit_once('.')?;
    if reference.is_empty() || pin_number.is_empty() {
        return None;
    }
    Some(PinConnection {
        reference: reference.to_string(),
        pin_number: pin_number.to_string(),
    })
}

/// Append connections for every wire endpoint not already listed.
fn derive_connections(signal: &mut SchSignal) {
    for wire in &signal.wires {
        for endpoint in [&wire.endpoint_a, &wire.endpoint_b] {
            if let Some(conn) = pin_connection_for(endpoint) {
                if !signal.connections.contains(&conn) {
                    signal.connections.push(conn);
                }
            }
        }
    }
}

/// `*CONNECTION*`: a run of `*SIGNAL*` blocks. Any other marker ends it.
pub(crate) fn parse_connection(ctx: &mut SectionCtx<'_>, doc: &mut PadsDocument, start: usize) -> usize {
    let lines = ctx.lines;
    let mut i = start + 1;

    while i < lines.len() {
        if lines.is_blank(i) {
            i += 1;
            continue;
        }
        if !lines.is_marker(i) {
            ctx.warn(i, "data outside a SIGNAL block, skipped");
            i += 1;
            continue;
        }
        if section_name(lines.line(i)) != Some("SIGNAL") {
            return i - 1;
        }

        let (signal, last) = parse_signal(ctx, i);
        match doc.signals.iter_mut().find(|s| s.name == signal.name) {
            Some(existing) => {
                log::debug!("merging repeated signal block '{}'", signal.name);
                existing.wires.extend(signal.wires);
                derive_connections(existing);
            }
            None => doc.signals.push(signal),
        }
        i = last + 1;
    }

    lines.last_index()
}

fn parse_signal(ctx: &mut SectionCtx<'_>, start: usize) -> (SchSignal, usize) {
    let lines = ctx.lines;
    let tokens = tokenize(marker_payload(lines.line(start)));
    if tokens.is_empty() {
        ctx.warn(start, "SIGNAL without a net name");
    }

    let mut signal = SchSignal {
        name: tokens.first().map(|s| s.to_string()).unwrap_or_default(),
        flags1: ctx.int_at(&tokens, 1, "signal flags", start),
        flags2: ctx.int_at(&tokens, 2, "signal flags", start),
        function: None,
        wires: Vec::new(),
        connections: Vec::new(),
    };

    let mut last = start;
    if signal.flags2 == 1 {
        if let Some(rest) = lines.line(start + 1).trim_start().strip_prefix("FUNCTION") {
            signal.function = Some(unquote(rest).to_string());
            last = start + 1;
        }
    }

    let mut i = last + 1;
    while i < lines.len() && !lines.is_marker(i) {
        if lines.is_blank(i) {
            i += 1;
            continue;
        }
        let (wire, end) = parse_segment(ctx, i);
        signal.wires.push(wire);
        last = end;
        i = end + 1;
    }

    derive_connections(&mut signal);
    (signal, last)
}

/// `endpoint_a endpoint_b vertex_count flags` followed by `x y` lines.
fn parse_segment(ctx: &mut SectionCtx<'_>, idx: usize) -> (WireSegment, usize) {
    let lines = ctx.lines;
    let tokens = tokenize(lines.line(idx));
    if tokens.len() < 3 {
        ctx.warn(idx, "wire segment header too short");
    }
    let count = ctx.int_at(&tokens, 2, "vertex count", idx).max(0) as usize;

    let mut wire = WireSegment {
        endpoint_a: tokens.first().map(|s| s.to_string()).unwrap_or_default(),
        endpoint_b: tokens.get(1).map(|s| s.to_string()).unwrap_or_default(),
        flags: ctx.int_at(&tokens, 3, "segment flags", idx),
        vertices: Vec::new(),
        sheet_number: ctx.sheet,
    };

    let mut last = idx;
    for n in 0..count {
        let at = idx + 1 + n;
        if at >= lines.len() || lines.is_marker(at) || lines.is_blank(at) {
            ctx.warn(idx, &format!("segment declares {count} vertices, found {n}"));
            break;
        }
        let vt = tokenize(lines.line(at));
        wire.vertices.push(ctx.point_at(&vt, 0, "vertex", at));
        last = at;
    }

    (wire, last)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{CollectingReporter, NullReporter};
    use crate::{PadsParser, ParseOptions};

    fn parse(text: &str) -> PadsDocument {
        let mut reporter = NullReporter;
        PadsParser::new(&mut reporter, ParseOptions::default())
            .parse_str(text)
            .unwrap()
    }

    const CONNECTION_FILE: &str = "\
*PADS-LOGIC-V9.0*
*CONNECTION*
*SIGNAL* CLK 0 1
FUNCTION \"Clock input\"
U1.3 @@@D1 2 0
1000 2000
1200 2000
@@@D1 U2.12 3 0
1200 2000
1200 2500
1400 2500
@@@D1 R1.1 2 0
1200 2000
1200 1800
*SIGNAL* GND 0 0
R1.2 U1.7 2 0
0 0
0 100
*SHT*   2 IO 1 MAIN
*CONNECTION*
*SIGNAL* CLK 0 0
@@@O1 U3.1 2 0
0 0
50 0
U1.3 U3.2 2 0
0 0
0 50
*END*
";

    #[test]
    fn test_pin_connection_for() {
        assert_eq!(
            pin_connection_for("U1.3"),
            Some(PinConnection { reference: "U1".into(), pin_number: "3".into() })
        );
        assert_eq!(
            pin_connection_for("J1.A.2"),
            Some(PinConnection { reference: "J1.A".into(), pin_number: "2".into() })
        );
        assert_eq!(pin_connection_for("@@@D1"), None);
        assert_eq!(pin_connection_for("@@@O1.2"), None);
        assert_eq!(pin_connection_for("NOPIN"), None);
        assert_eq!(pin_connection_for("U1."), None);
    }

    #[test]
    fn test_signal_wires_and_function() {
        let doc = parse(CONNECTION_FILE);
        assert_eq!(doc.signals().len(), 2);
        let gnd = doc.signal("GND").unwrap();
        assert_eq!(gnd.wires.len(), 1);
        assert!(gnd.function.is_none());
        assert_eq!(gnd.wires[0].vertices, vec![[0.0, 0.0], [0.0, 100.0]]);

        let clk = doc.signal("CLK").unwrap();
        assert_eq!(clk.flags2, 1);
        assert_eq!(clk.function.as_deref(), Some("Clock input"));
        assert_eq!(clk.wires[1].vertices.len(), 3);
    }

    #[test]
    fn test_repeated_signal_blocks_merge() {
        let doc = parse(CONNECTION_FILE);
        let clk = doc.signal("CLK").unwrap();
        assert_eq!(clk.wires.len(), 5);
        assert_eq!(clk.wires[0].sheet_number, 1);
        assert_eq!(clk.wires[4].sheet_number, 2);
        let pins: Vec<String> = clk
            .connections
            .iter()
            .map(|c| format!("{}.{}", c.reference, c.pin_number))
            .collect();
        assert_eq!(pins, vec!["U1.3", "U2.12", "R1.1", "U3.1", "U3.2"]);
        assert!(clk.is_on_sheet(2));
        assert!(!doc.signal("GND").unwrap().is_on_sheet(2));
        assert_eq!(doc.signals_on_sheet(2).len(), 1);
    }

    #[test]
    fn test_other_marker_ends_connection() {
        let text = "\
*PADS-LOGIC-V9.0*
*CONNECTION*
*SIGNAL* N1 0 0
A.1 B.1 0 0
*PART*
R1 RES 0 0 0 0
*END*
";
        let doc = parse(text);
        assert_eq!(doc.signals().len(), 1);
        assert_eq!(doc.part_placements().len(), 1);
    }

    #[test]
    fn test_over_declared_vertex_count() {
        let text = "\
*PADS-LOGIC-V9.0*
*CONNECTION*
*SIGNAL* N1 0 0
A.1 B.1 999999999999999999 0
0 0
10 0
*SIGNAL* N2 0 0
C.1 D.1 2 0
0 0
0 10
*END*
";
        let mut reporter = CollectingReporter::new();
        let doc = PadsParser::new(&mut reporter, ParseOptions::default())
            .parse_str(text)
            .unwrap();
        let n1 = doc.signal("N1").unwrap();
        assert_eq!(n1.wires.len(), 1);
        assert_eq!(n1.wires[0].vertices, vec![[0.0, 0.0], [10.0, 0.0]]);
        assert_eq!(doc.signal("N2").unwrap().wires.len(), 1);
        assert!(reporter.contains("vertices, found 2"));
    }
}
