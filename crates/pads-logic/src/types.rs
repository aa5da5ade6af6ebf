use serde::ser::{SerializeSeq, Serializer};
use serde::Serialize;
use std::collections::BTreeMap;

/// A coordinate pair in file units.
pub type Point = [f64; 2];

/// Round a float to N decimal places.
pub fn round_f64(v: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    (v * factor).round() / factor
}

/// Wrapper that rounds f64 to 6 decimal places on serialization.
fn serialize_f64_rounded<S: Serializer>(v: &f64, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(round_f64(*v, 6))
}

fn serialize_point<S: Serializer>(p: &Point, s: S) -> Result<S::Ok, S::Error> {
    let rounded = [round_f64(p[0], 6), round_f64(p[1], 6)];
    rounded.serialize(s)
}

fn serialize_opt_f64_rounded<S: Serializer>(v: &Option<f64>, s: S) -> Result<S::Ok, S::Error> {
    match v {
        Some(val) => s.serialize_some(&round_f64(*val, 6)),
        None => s.serialize_none(),
    }
}

fn serialize_points<S: Serializer>(points: &[Point], s: S) -> Result<S::Ok, S::Error> {
    let mut seq = s.serialize_seq(Some(points.len()))?;
    for p in points {
        seq.serialize_element(&[round_f64(p[0], 6), round_f64(p[1], 6)])?;
    }
    seq.end()
}

/// Decode a PADS rotation code into degrees.
///
/// Codes 0..=3 are quarter turns. Anything else is taken as a literal degree
/// value, which keeps nonstandard exports loadable.
pub fn decode_angle(code: f64) -> f64 {
    if code.fract() == 0.0 && (0.0..=3.0).contains(&code) {
        code * 90.0
    } else {
        code
    }
}

// ─── Header ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ProductFamily {
    Logic,
    PowerLogic,
}

impl ProductFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductFamily::Logic => "PADS-LOGIC",
            ProductFamily::PowerLogic => "PADS-POWERLOGIC",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Header {
    pub family: ProductFamily,
    pub version: String,
    pub description: String,
    pub valid: bool,
}

impl Default for Header {
    fn default() -> Self {
        Self {
            family: ProductFamily::Logic,
            version: String::new(),
            description: String::new(),
            valid: false,
        }
    }
}

// ─── Parameters ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Units {
    Mils,
    Inches,
    Metric,
    Other(i64),
}

impl Units {
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => Units::Mils,
            1 => Units::Inches,
            2 => Units::Metric,
            other => Units::Other(other),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TextSize {
    #[serde(serialize_with = "serialize_f64_rounded")]
    pub height: f64,
    #[serde(serialize_with = "serialize_f64_rounded")]
    pub width: f64,
}

/// Default text sizes per field class.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FieldTextSizes {
    pub ref_name: TextSize,
    pub part_name: TextSize,
    pub pin_name: TextSize,
    pub pin_number: TextSize,
    pub net_name: TextSize,
}

#[derive(Debug, Clone, Serialize)]
pub struct Parameters {
    pub units: Units,
    pub cur_sheet: i64,
    pub sheet_size: String,
    pub border_name: String,
    pub job_name: String,
    #[serde(serialize_with = "serialize_f64_rounded")]
    pub grid: f64,
    pub text_size: TextSize,
    #[serde(serialize_with = "serialize_f64_rounded")]
    pub line_width: f64,
    #[serde(serialize_with = "serialize_f64_rounded")]
    pub bus_width: f64,
    #[serde(serialize_with = "serialize_f64_rounded")]
    pub dot_size: f64,
    pub field_sizes: FieldTextSizes,
    /// Named user fields from the FIELDS section.
    pub user_fields: BTreeMap<String, String>,
    /// SCH keys this parser does not interpret.
    pub extra: BTreeMap<String, String>,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            units: Units::Mils,
            cur_sheet: 1,
            sheet_size: String::new(),
            border_name: String::new(),
            job_name: String::new(),
            grid: 0.0,
            text_size: TextSize::default(),
            line_width: 0.0,
            bus_width: 0.0,
            dot_size: 0.0,
            field_sizes: FieldTextSizes::default(),
            user_fields: BTreeMap::new(),
            extra: BTreeMap::new(),
        }
    }
}

// ─── Graphics ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GraphicKind {
    Line,
    Rectangle,
    Circle,
    Polyline,
}

/// Arc data attached to a vertex. Angles are in degrees.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArcData {
    #[serde(serialize_with = "serialize_f64_rounded")]
    pub start_angle: f64,
    #[serde(serialize_with = "serialize_f64_rounded")]
    pub sweep_angle: f64,
    #[serde(serialize_with = "serialize_point")]
    pub bbox_min: Point,
    #[serde(serialize_with = "serialize_point")]
    pub bbox_max: Point,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphicPoint {
    #[serde(serialize_with = "serialize_point")]
    pub pos: Point,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arc: Option<ArcData>,
}

impl GraphicPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            pos: [x, y],
            arc: None,
        }
    }
}

/// One drawn primitive of a symbol or a LINES item.
///
/// Rectangles hold their min and max corners. Circles hold a single center
/// point plus `radius`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Graphic {
    pub kind: GraphicKind,
    #[serde(serialize_with = "serialize_f64_rounded")]
    pub width: f64,
    pub style: i64,
    pub filled: bool,
    pub closed: bool,
    pub points: Vec<GraphicPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(serialize_with = "serialize_opt_f64_rounded")]
    pub radius: Option<f64>,
}

impl Graphic {
    /// Straight-line distance from the first to the last vertex.
    pub fn span_length(&self) -> Option<f64> {
        let first = self.points.first()?;
        let last = self.points.last()?;
        let dx = last.pos[0] - first.pos[0];
        let dy = last.pos[1] - first.pos[1];
        Some((dx * dx + dy * dy).sqrt())
    }
}

/// Positioned text: free text, embedded symbol labels and attribute labels.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TextLabel {
    pub text: String,
    #[serde(serialize_with = "serialize_point")]
    pub position: Point,
    #[serde(serialize_with = "serialize_f64_rounded")]
    pub rotation: f64,
    pub justification: i64,
    pub size: TextSize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font: Option<String>,
}

// ─── Symbols (CAEDECAL) ──────────────────────────────────────────────

/// Which of the two CAEDECAL header layouts a record used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordShape {
    Full,
    Simplified,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TextOffset {
    #[serde(serialize_with = "serialize_point")]
    pub position: Point,
    #[serde(serialize_with = "serialize_f64_rounded")]
    pub rotation: f64,
    pub justification: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymbolPin {
    /// Placeholder (`index + 1`); real numbering comes from the part type.
    pub number: String,
    #[serde(serialize_with = "serialize_point")]
    pub position: Point,
    #[serde(serialize_with = "serialize_f64_rounded")]
    pub rotation: f64,
    pub side: i64,
    pub pin_decal_name: String,
    /// Stub length. Rewritten by the resolver when `pin_decal_name` names a
    /// pin decal defined in the same file.
    #[serde(serialize_with = "serialize_f64_rounded")]
    pub length: f64,
    pub inverted: bool,
    pub clock: bool,
    pub name_hidden: bool,
    pub flags: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number_offset: Option<TextOffset>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_offset: Option<TextOffset>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SymbolBounds {
    #[serde(serialize_with = "serialize_point")]
    pub origin: Point,
    #[serde(serialize_with = "serialize_f64_rounded")]
    pub height: f64,
    #[serde(serialize_with = "serialize_f64_rounded")]
    pub width: f64,
    #[serde(serialize_with = "serialize_f64_rounded")]
    pub alt_height: f64,
    #[serde(serialize_with = "serialize_f64_rounded")]
    pub alt_width: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SymbolDef {
    pub name: String,
    pub shape: RecordShape,
    pub bounds: SymbolBounds,
    pub has_polarity: bool,
    pub pin_origin_code: i64,
    pub is_pin_decal: bool,
    pub gate_count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    pub fonts: Vec<String>,
    /// Attribute placeholders; `text` holds the attribute name.
    pub attributes: Vec<TextLabel>,
    pub graphics: Vec<Graphic>,
    pub texts: Vec<TextLabel>,
    pub pins: Vec<SymbolPin>,
}

impl SymbolDef {
    pub fn new(name: &str, shape: RecordShape) -> Self {
        Self {
            name: name.to_string(),
            shape,
            bounds: SymbolBounds::default(),
            has_polarity: false,
            pin_origin_code: 0,
            is_pin_decal: false,
            gate_count: 0,
            timestamp: None,
            fonts: Vec::new(),
            attributes: Vec::new(),
            graphics: Vec::new(),
            texts: Vec::new(),
            pins: Vec::new(),
        }
    }
}

// ─── Part types (PARTTYPE) ───────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum PinElectricalType {
    Source,
    Bidirectional,
    OpenCollector,
    Output,
    TriState,
    Load,
    Terminator,
    Power,
    Ground,
    Undefined,
    Unknown(String),
}

impl PinElectricalType {
    pub fn from_code(code: &str) -> Self {
        match code.to_ascii_uppercase().as_str() {
            "S" => PinElectricalType::Source,
            "B" => PinElectricalType::Bidirectional,
            "C" => PinElectricalType::OpenCollector,
            "O" => PinElectricalType::Output,
            "T" => PinElectricalType::TriState,
            "L" | "I" => PinElectricalType::Load,
            "Z" => PinElectricalType::Terminator,
            "P" => PinElectricalType::Power,
            "G" => PinElectricalType::Ground,
            "U" | "" => PinElectricalType::Undefined,
            _ => PinElectricalType::Unknown(code.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartTypePin {
    pub id: String,
    pub swap_group: i64,
    pub pin_type: PinElectricalType,
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct GateDef {
    /// Alternate symbol names for this gate, first one is the default.
    pub decal_names: Vec<String>,
    pub swap_flag: i64,
    pub declared_pins: i64,
    pub connector: bool,
    pub pins: Vec<PartTypePin>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SpecialKind {
    Ground,
    Power,
    Oscillator,
}

impl SpecialKind {
    /// Map one of the reserved part-type names to its kind.
    pub fn from_part_type_name(name: &str) -> Option<Self> {
        match name {
            "$GND_SYMS" => Some(SpecialKind::Ground),
            "$PWR_SYMS" => Some(SpecialKind::Power),
            "$OSR_SYMS" => Some(SpecialKind::Oscillator),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpecialVariant {
    pub decal_name: String,
    pub pin_type: PinElectricalType,
    pub net_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SpecialSymbols {
    pub kind: SpecialKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
    pub variants: Vec<SpecialVariant>,
}

/// Hidden power/ground pin tied to a net.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SigPin {
    pub pin_number: String,
    pub net_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PartTypeDef {
    pub name: String,
    pub category: String,
    pub num_physical: i64,
    pub num_sigpins: i64,
    pub num_swap_groups: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    pub gates: Vec<GateDef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub special: Option<SpecialSymbols>,
    pub sig_pins: Vec<SigPin>,
    /// Lines inside the record this parser does not interpret, verbatim.
    pub swap_lines: Vec<String>,
}

// ─── Part placements (PART) ──────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartAttribute {
    pub name: String,
    pub value: String,
    #[serde(serialize_with = "serialize_point")]
    pub position: Point,
    #[serde(serialize_with = "serialize_f64_rounded")]
    pub rotation: f64,
    pub justification: i64,
    pub size: TextSize,
    pub visible: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PinOverride {
    pub pin_index: i64,
    pub flags: i64,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PartPlacement {
    pub reference: String,
    /// Part type name, or the special symbol set for power placements.
    pub part_type: String,
    #[serde(serialize_with = "serialize_point")]
    pub position: Point,
    #[serde(serialize_with = "serialize_f64_rounded")]
    pub rotation: f64,
    pub mirrored: bool,
    pub sheet_number: i64,
    /// Gate index for parts, variant index for power placements.
    pub gate_index: i64,
    pub is_power: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub power_net_name: Option<String>,
    pub ref_text_size: TextSize,
    pub type_text_size: TextSize,
    pub declared_pins: i64,
    pub fonts: Vec<String>,
    pub attributes: Vec<PartAttribute>,
    pub attr_overrides: BTreeMap<String, String>,
    pub pin_overrides: Vec<PinOverride>,
}

impl PartPlacement {
    pub fn new(reference: &str, part_type: &str, sheet_number: i64) -> Self {
        Self {
            reference: reference.to_string(),
            part_type: part_type.to_string(),
            position: [0.0, 0.0],
            rotation: 0.0,
            mirrored: false,
            sheet_number,
            gate_index: 0,
            is_power: false,
            power_net_name: None,
            ref_text_size: TextSize::default(),
            type_text_size: TextSize::default(),
            declared_pins: 0,
            fonts: Vec::new(),
            attributes: Vec::new(),
            attr_overrides: BTreeMap::new(),
            pin_overrides: Vec::new(),
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&PartAttribute> {
        self.attributes.iter().find(|a| a.name == name)
    }
}

// ─── Connectivity (CONNECTION / SIGNAL) ──────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WireSegment {
    pub endpoint_a: String,
    pub endpoint_b: String,
    pub flags: i64,
    #[serde(serialize_with = "serialize_points")]
    pub vertices: Vec<Point>,
    pub sheet_number: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct PinConnection {
    pub reference: String,
    pub pin_number: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SchSignal {
    pub name: String,
    pub flags1: i64,
    pub flags2: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,
    pub wires: Vec<WireSegment>,
    pub connections: Vec<PinConnection>,
}

impl SchSignal {
    pub fn is_on_sheet(&self, sheet: i64) -> bool {
        self.wires.iter().any(|w| w.sheet_number == sheet)
    }
}

// ─── Per-sheet records ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SheetHeader {
    pub number: i64,
    pub name: String,
    pub parent_number: i64,
    pub parent_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TiedDot {
    pub id: String,
    #[serde(serialize_with = "serialize_point")]
    pub position: Point,
    pub sheet_number: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub net_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OffPageConnector {
    pub id: String,
    pub symbol_name: String,
    #[serde(serialize_with = "serialize_point")]
    pub position: Point,
    #[serde(serialize_with = "serialize_f64_rounded")]
    pub rotation: f64,
    pub mirrored: bool,
    pub variant_index: i64,
    pub sheet_number: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub net_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextItem {
    #[serde(flatten)]
    pub label: TextLabel,
    pub sheet_number: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LinesItem {
    pub name: String,
    #[serde(serialize_with = "serialize_point")]
    pub origin: Point,
    pub graphics: Vec<Graphic>,
    pub texts: Vec<TextLabel>,
    pub sheet_number: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetNameLabel {
    pub net_name: String,
    #[serde(serialize_with = "serialize_point")]
    pub position: Point,
    #[serde(serialize_with = "serialize_f64_rounded")]
    pub rotation: f64,
    pub justification: i64,
    pub size: TextSize,
    pub sheet_number: i64,
}
