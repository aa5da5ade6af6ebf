//! Graphic primitives and positioned text shared by CAEDECAL, LINES and
//! TEXT sections.

use super::values::tokenize;
use super::SectionCtx;
use crate::types::*;

/// Primitive keywords as written in the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKeyword {
    Open,
    Closed,
    Circle,
    CopperClosed,
}

impl ShapeKeyword {
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "OPEN" => Some(ShapeKeyword::Open),
            "CLOSED" => Some(ShapeKeyword::Closed),
            "CIRCLE" => Some(ShapeKeyword::Circle),
            "COPCLS" => Some(ShapeKeyword::CopperClosed),
            _ => None,
        }
    }
}

fn push_distinct(values: &mut Vec<f64>, v: f64) {
    if !values.iter().any(|x| (x - v).abs() < 1e-9) {
        values.push(v);
    }
}

/// Min/max corners if the points span exactly two distinct X values and two
/// distinct Y values. Applying it to its own output returns the same corners.
pub fn reduce_to_rectangle(points: &[GraphicPoint]) -> Option<[Point; 2]> {
    let mut xs = Vec::new();
    let mut ys = Vec::new();
    for p in points {
        push_distinct(&mut xs, p.pos[0]);
        push_distinct(&mut ys, p.pos[1]);
        if xs.len() > 2 || ys.len() > 2 {
            return None;
        }
    }
    if xs.len() != 2 || ys.len() != 2 {
        return None;
    }
    Some([
        [xs[0].min(xs[1]), ys[0].min(ys[1])],
        [xs[0].max(xs[1]), ys[0].max(ys[1])],
    ])
}

/// Turn a keyword and raw vertex list into a classified primitive.
///
/// Closed shapes that are not axis-aligned rectangles become closed
/// polylines; two-point circles become center plus radius.
pub fn build_graphic(
    keyword: ShapeKeyword,
    width: f64,
    style: i64,
    points: Vec<GraphicPoint>,
) -> Graphic {
    let mut graphic = Graphic {
        kind: GraphicKind::Polyline,
        width,
        style,
        filled: keyword == ShapeKeyword::CopperClosed,
        closed: false,
        points,
        radius: None,
    };

    match keyword {
        ShapeKeyword::Open => {
            if graphic.points.len() == 2 {
                graphic.kind = GraphicKind::Line;
            }
        }
        ShapeKeyword::Closed | ShapeKeyword::CopperClosed => {
            if let Some([min, max]) = reduce_to_rectangle(&graphic.points) {
                graphic.kind = GraphicKind::Rectangle;
                graphic.points = vec![GraphicPoint::new(min[0], min[1]), GraphicPoint::new(max[0], max[1])];
            }
            graphic.closed = true;
        }
        ShapeKeyword::Circle => {
            let (center, radius) = match graphic.points.as_slice() {
                [a, b, ..] => {
                    let dx = b.pos[0] - a.pos[0];
                    let dy = b.pos[1] - a.pos[1];
                    (
                        [(a.pos[0] + b.pos[0]) / 2.0, (a.pos[1] + b.pos[1]) / 2.0],
                        (dx * dx + dy * dy).sqrt() / 2.0,
                    )
                }
                [a] => (a.pos, 0.0),
                [] => ([0.0, 0.0], 0.0),
            };
            graphic.kind = GraphicKind::Circle;
            graphic.closed = true;
            graphic.points = vec![GraphicPoint::new(center[0], center[1])];
            graphic.radius = Some(radius);
        }
    }

    graphic
}

/// True for lines that cannot belong to the current record's body.
fn is_record_break(ctx: &SectionCtx<'_>, idx: usize) -> bool {
    idx >= ctx.lines.len() || ctx.lines.is_marker(idx)
}

/// Parse a multi-line primitive: `KIND n width style` followed by `n`
/// vertex lines `x y [start sweep bx1 by1 bx2 by2]`.
///
/// Returns the primitive (None for an unknown keyword) and the index of the
/// last line consumed.
pub fn parse_full_primitive(ctx: &mut SectionCtx<'_>, idx: usize) -> (Option<Graphic>, usize) {
    let lines = ctx.lines;
    let tokens = tokenize(lines.line(idx));
    let keyword = tokens.first().and_then(|t| ShapeKeyword::parse(t));
    let count = ctx.int_at(&tokens, 1, "point count", idx).max(0) as usize;
    let width = ctx.float_at(&tokens, 2, "line width", idx);
    let style = ctx.int_at(&tokens, 3, "line style", idx);

    let mut points = Vec::new();
    let mut last = idx;
    for n in 0..count {
        let pidx = idx + 1 + n;
        if is_record_break(ctx, pidx) {
            ctx.warn(idx, &format!("primitive declares {count} points, found {n}"));
            break;
        }
        let pt = tokenize(lines.line(pidx));
        let pos = ctx.point_at(&pt, 0, "vertex", pidx);
        let arc = if pt.len() >= 8 {
            Some(ArcData {
                start_angle: ctx.float_at(&pt, 2, "arc start angle", pidx) / 10.0,
                sweep_angle: ctx.float_at(&pt, 3, "arc sweep angle", pidx) / 10.0,
                bbox_min: ctx.point_at(&pt, 4, "arc bounding box", pidx),
                bbox_max: ctx.point_at(&pt, 6, "arc bounding box", pidx),
            })
        } else {
            None
        };
        points.push(GraphicPoint { pos, arc });
        last = pidx;
    }

    match keyword {
        Some(kw) => (Some(build_graphic(kw, width, style, points)), last),
        None => {
            let kw = tokens.first().copied().unwrap_or("");
            ctx.warn(idx, &format!("unknown primitive '{kw}', skipped"));
            (None, last)
        }
    }
}

/// Parse a single-line primitive: `KIND n width style x1 y1 x2 y2 ...`.
pub fn parse_simple_primitive(ctx: &mut SectionCtx<'_>, idx: usize) -> Option<Graphic> {
    let lines = ctx.lines;
    let tokens = tokenize(lines.line(idx));
    let Some(keyword) = tokens.first().and_then(|t| ShapeKeyword::parse(t)) else {
        ctx.warn(idx, "expected a primitive line, skipped");
        return None;
    };
    let count = ctx.int_at(&tokens, 1, "point count", idx).max(0) as usize;
    let width = ctx.float_at(&tokens, 2, "line width", idx);
    let style = ctx.int_at(&tokens, 3, "line style", idx);

    let available = tokens.len().saturating_sub(4) / 2;
    if available < count {
        ctx.warn(idx, &format!("primitive declares {count} points, found {available}"));
    }
    let points = (0..count.min(available))
        .map(|n| {
            let [x, y] = ctx.point_at(&tokens, 4 + n * 2, "vertex", idx);
            GraphicPoint::new(x, y)
        })
        .collect();

    Some(build_graphic(keyword, width, style, points))
}

/// Parse the position line of a two-line text record:
/// `x y rot just height width [...] ["font"]`.
pub fn parse_label_position(ctx: &mut SectionCtx<'_>, idx: usize) -> TextLabel {
    let lines = ctx.lines;
    let raw = lines.line(idx);
    let tokens = tokenize(raw);
    let position = ctx.point_at(&tokens, 0, "text position", idx);
    let rotation = decode_angle(ctx.float_at(&tokens, 2, "text rotation", idx));
    let justification = ctx.int_at(&tokens, 3, "text justification", idx);
    let height = ctx.float_at(&tokens, 4, "text height", idx);
    let width = ctx.float_at(&tokens, 5, "text width", idx);
    let font = if raw.contains('"') && tokens.len() > 6 {
        tokens.last().map(|f| f.to_string())
    } else {
        None
    };

    TextLabel {
        text: String::new(),
        position,
        rotation,
        justification,
        size: TextSize { height, width },
        font,
    }
}

/// Parse a two-line text record (position line, then the text itself).
/// Returns the label and the index of the last line consumed.
pub fn parse_text_label(ctx: &mut SectionCtx<'_>, idx: usize) -> (TextLabel, usize) {
    let mut label = parse_label_position(ctx, idx);
    let text_idx = idx + 1;
    if is_record_break(ctx, text_idx) {
        ctx.warn(idx, "text record without a text line");
        return (label, idx);
    }
    label.text = ctx.lines.line(text_idx).to_string();
    (label, text_idx)
}
