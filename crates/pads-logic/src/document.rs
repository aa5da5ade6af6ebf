//! The parsed document and its read-only query API.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::error::ParseError;
use crate::types::*;

/// Everything read from one PADS Logic file.
///
/// Built by the section parsers, then handed to [`crate::resolve::resolve`]
/// for the cross-section pass. Symbols, part types and parts refer to each
/// other by name only.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PadsDocument {
    pub(crate) header: Header,
    pub(crate) parameters: Parameters,
    pub(crate) sheet_headers: Vec<SheetHeader>,
    pub(crate) symbol_defs: Vec<SymbolDef>,
    pub(crate) part_types: Vec<PartTypeDef>,
    pub(crate) parts: Vec<PartPlacement>,
    pub(crate) signals: Vec<SchSignal>,
    pub(crate) off_page_connectors: Vec<OffPageConnector>,
    pub(crate) tied_dots: Vec<TiedDot>,
    pub(crate) text_items: Vec<TextItem>,
    pub(crate) lines_items: Vec<LinesItem>,
    pub(crate) net_name_labels: Vec<NetNameLabel>,
}

/// Per-collection counts, printed by `pads-logic --summary`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentSummary {
    pub family: ProductFamily,
    pub version: String,
    pub sheets: Vec<i64>,
    pub symbol_defs: usize,
    pub pin_decals: usize,
    pub part_types: usize,
    pub parts: usize,
    pub power_symbols: usize,
    pub signals: usize,
    pub wires: usize,
    pub pin_connections: usize,
    pub off_page_connectors: usize,
    pub tied_dots: usize,
    pub text_items: usize,
    pub lines_items: usize,
    pub net_name_labels: usize,
}

/// Records belonging to one sheet.
#[derive(Debug, Clone, Serialize)]
pub struct SheetView<'a> {
    pub number: i64,
    pub header: Option<&'a SheetHeader>,
    pub parts: Vec<&'a PartPlacement>,
    pub signals: Vec<&'a SchSignal>,
    pub off_page_connectors: Vec<&'a OffPageConnector>,
    pub tied_dots: Vec<&'a TiedDot>,
    pub text_items: Vec<&'a TextItem>,
    pub net_name_labels: Vec<&'a NetNameLabel>,
}

impl PadsDocument {
    pub(crate) fn new(header: Header) -> Self {
        Self {
            header,
            ..Self::default()
        }
    }

    // ─── Collections ─────────────────────────────────────────────────

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    pub fn symbol_defs(&self) -> &[SymbolDef] {
        &self.symbol_defs
    }

    pub fn part_types(&self) -> &[PartTypeDef] {
        &self.part_types
    }

    pub fn part_placements(&self) -> &[PartPlacement] {
        &self.parts
    }

    pub fn signals(&self) -> &[SchSignal] {
        &self.signals
    }

    pub fn sheet_headers(&self) -> &[SheetHeader] {
        &self.sheet_headers
    }

    pub fn off_page_connectors(&self) -> &[OffPageConnector] {
        &self.off_page_connectors
    }

    pub fn tied_dots(&self) -> &[TiedDot] {
        &self.tied_dots
    }

    pub fn text_items(&self) -> &[TextItem] {
        &self.text_items
    }

    pub fn lines_items(&self) -> &[LinesItem] {
        &self.lines_items
    }

    pub fn net_name_labels(&self) -> &[NetNameLabel] {
        &self.net_name_labels
    }

    // ─── Lookups by name ─────────────────────────────────────────────

    /// First symbol with this name. Later duplicates are kept in
    /// [`symbol_defs`](Self::symbol_defs) but never returned here.
    pub fn symbol_def(&self, name: &str) -> Option<&SymbolDef> {
        self.symbol_defs.iter().find(|s| s.name == name)
    }

    pub fn part_type(&self, name: &str) -> Option<&PartTypeDef> {
        self.part_types.iter().find(|p| p.name == name)
    }

    pub fn part_placement(&self, reference: &str) -> Option<&PartPlacement> {
        self.parts.iter().find(|p| p.reference == reference)
    }

    pub fn signal(&self, name: &str) -> Option<&SchSignal> {
        self.signals.iter().find(|s| s.name == name)
    }

    pub fn sheet_header(&self, number: i64) -> Option<&SheetHeader> {
        self.sheet_headers.iter().find(|h| h.number == number)
    }

    /// The gate a normal placement instantiates. None for power symbols.
    pub fn gate_def(&self, placement: &PartPlacement) -> Option<&GateDef> {
        if placement.is_power {
            return None;
        }
        let index = usize::try_from(placement.gate_index).ok()?;
        self.part_type(&placement.part_type)?.gates.get(index)
    }

    /// Symbol drawn for a placement: the gate's first decal for parts, the
    /// selected variant's decal for power symbols.
    pub fn symbol_for_placement(&self, placement: &PartPlacement) -> Option<&SymbolDef> {
        let decal = if placement.is_power {
            let special = self.part_type(&placement.part_type)?.special.as_ref()?;
            let index = usize::try_from(placement.gate_index).ok()?;
            &special.variants.get(index)?.decal_name
        } else {
            self.gate_def(placement)?.decal_names.first()?
        };
        self.symbol_def(decal)
    }

    /// Logical pins of the placement's gate, in symbol pin order. Two part
    /// types sharing one symbol get different numbers from here; the shared
    /// symbol itself only carries placeholders.
    pub fn pin_numbers_for(&self, placement: &PartPlacement) -> &[PartTypePin] {
        self.gate_def(placement)
            .map(|g| g.pins.as_slice())
            .unwrap_or(&[])
    }

    // ─── Sheets ──────────────────────────────────────────────────────

    /// Every sheet number mentioned by a header or a sheet-stamped record.
    pub fn sheet_numbers(&self) -> BTreeSet<i64> {
        let mut sheets: BTreeSet<i64> = self.sheet_headers.iter().map(|h| h.number).collect();
        sheets.extend(self.parts.iter().map(|p| p.sheet_number));
        sheets.extend(
            self.signals
                .iter()
                .flat_map(|s| s.wires.iter().map(|w| w.sheet_number)),
        );
        sheets.extend(self.off_page_connectors.iter().map(|c| c.sheet_number));
        sheets.extend(self.tied_dots.iter().map(|d| d.sheet_number));
        sheets.extend(self.text_items.iter().map(|t| t.sheet_number));
        sheets.extend(self.lines_items.iter().map(|l| l.sheet_number));
        sheets.extend(self.net_name_labels.iter().map(|n| n.sheet_number));
        sheets
    }

    /// Highest sheet number, 1 when nothing is sheet-stamped.
    pub fn sheet_count(&self) -> i64 {
        self.sheet_numbers().last().copied().unwrap_or(1)
    }

    pub fn parts_on_sheet(&self, sheet: i64) -> Vec<&PartPlacement> {
        self.parts.iter().filter(|p| p.sheet_number == sheet).collect()
    }

    /// Signals with at least one wire on `sheet`.
    pub fn signals_on_sheet(&self, sheet: i64) -> Vec<&SchSignal> {
        self.signals.iter().filter(|s| s.is_on_sheet(sheet)).collect()
    }

    pub fn text_items_on_sheet(&self, sheet: i64) -> Vec<&TextItem> {
        self.text_items
            .iter()
            .filter(|t| t.sheet_number == sheet)
            .collect()
    }

    pub fn sheet_view(&self, sheet: i64) -> SheetView<'_> {
        SheetView {
            number: sheet,
            header: self.sheet_header(sheet),
            parts: self.parts_on_sheet(sheet),
            signals: self.signals_on_sheet(sheet),
            off_page_connectors: self
                .off_page_connectors
                .iter()
                .filter(|c| c.sheet_number == sheet)
                .collect(),
            tied_dots: self
                .tied_dots
                .iter()
                .filter(|d| d.sheet_number == sheet)
                .collect(),
            text_items: self.text_items_on_sheet(sheet),
            net_name_labels: self
                .net_name_labels
                .iter()
                .filter(|n| n.sheet_number == sheet)
                .collect(),
        }
    }

    // ─── Output ──────────────────────────────────────────────────────

    pub fn summary(&self) -> DocumentSummary {
        DocumentSummary {
            family: self.header.family,
            version: self.header.version.clone(),
            sheets: self.sheet_numbers().into_iter().collect(),
            symbol_defs: self.symbol_defs.len(),
            pin_decals: self.symbol_defs.iter().filter(|s| s.is_pin_decal).count(),
            part_types: self.part_types.len(),
            parts: self.parts.len(),
            power_symbols: self.parts.iter().filter(|p| p.is_power).count(),
            signals: self.signals.len(),
            wires: self.signals.iter().map(|s| s.wires.len()).sum(),
            pin_connections: self.signals.iter().map(|s| s.connections.len()).sum(),
            off_page_connectors: self.off_page_connectors.len(),
            tied_dots: self.tied_dots.len(),
            text_items: self.text_items.len(),
            lines_items: self.lines_items.len(),
            net_name_labels: self.net_name_labels.len(),
        }
    }

    pub fn to_json(&self, pretty: bool) -> Result<String, ParseError> {
        let json = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::NullReporter;
    use crate::{PadsParser, ParseOptions};

    /// Two part types share the NAND2 symbol but number its pins
    /// differently; a power symbol picks its second variant.
    const SHARED_SYMBOL_FILE: &str = "\
*PADS-LOGIC-V9.0*
*CAEDECAL*
NAND2 1 3 1
CLOSED 5 10 0 0 0 300 0 300 400 0 400 0 0
T-200 300 0 2 PIN
T-200 100 0 2 PIN
T500 200 2 3 PIN
GNDA 0 1 1
T0 0 0 0
GNDB 0 1 1
T0 0 0 0

*PARTTYPE*
7400 TTL 1 0 0 0
GATE 1 3 0
NAND2
1 0 L A
2 0 L B
3 0 O Y

74LS37 TTL 1 0 0 0
GATE 1 3 0
NAND2
4 0 L A
5 0 L B
6 0 O Y

$GND_SYMS GND 0 0 0 0
GND 2
GNDA G GND
GNDB G AGND

*PART*
U1 7400 0 0 0 0
U2 74LS37 1000 0 0 0 1
#1 AGND $GND_SYMS 0 -500 0 0 1
*SHT*   2 IO 1 MAIN
*PART*
U3-A 7400 0 0 0 0
*TEXT*
0 0 0 0 50 50
NOTE
*END*
";

    fn parse(text: &str) -> PadsDocument {
        let mut reporter = NullReporter;
        PadsParser::new(&mut reporter, ParseOptions::default())
            .parse_str(text)
            .unwrap()
    }

    fn numbers(doc: &PadsDocument, reference: &str) -> Vec<String> {
        let part = doc.part_placement(reference).unwrap();
        doc.pin_numbers_for(part).iter().map(|p| p.id.clone()).collect()
    }

    #[test]
    fn test_shared_symbol_different_pin_numbers() {
        let doc = parse(SHARED_SYMBOL_FILE);
        let u1 = doc.part_placement("U1").unwrap();
        let u2 = doc.part_placement("U2").unwrap();
        assert_eq!(doc.symbol_for_placement(u1).unwrap().name, "NAND2");
        assert_eq!(doc.symbol_for_placement(u2).unwrap().name, "NAND2");
        assert_eq!(numbers(&doc, "U1"), vec!["1", "2", "3"]);
        assert_eq!(numbers(&doc, "U2"), vec!["4", "5", "6"]);

        // The symbol keeps placeholder numbering.
        let nand = doc.symbol_def("NAND2").unwrap();
        let placeholders: Vec<&str> = nand.pins.iter().map(|p| p.number.as_str()).collect();
        assert_eq!(placeholders, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_power_symbol_variant_lookup() {
        let doc = parse(SHARED_SYMBOL_FILE);
        let gnd = doc.part_placement("#1").unwrap();
        assert!(gnd.is_power);
        assert!(doc.gate_def(gnd).is_none());
        assert!(doc.pin_numbers_for(gnd).is_empty());
        assert_eq!(doc.symbol_for_placement(gnd).unwrap().name, "GNDB");
    }

    #[test]
    fn test_missing_gate_has_no_symbol() {
        let doc = parse(SHARED_SYMBOL_FILE);
        let mut part = doc.part_placement("U1").unwrap().clone();
        part.gate_index = 5;
        assert!(doc.symbol_for_placement(&part).is_none());
        part.part_type = "NOPE".into();
        part.gate_index = 0;
        assert!(doc.gate_def(&part).is_none());
    }

    #[test]
    fn test_parts_on_sheet_matches_stamp() {
        let doc = parse(SHARED_SYMBOL_FILE);
        let sheets = doc.sheet_numbers();
        assert_eq!(sheets.iter().copied().collect::<Vec<_>>(), vec![1, 2]);
        for sheet in &sheets {
            let on_sheet = doc.parts_on_sheet(*sheet);
            let expected = doc
                .part_placements()
                .iter()
                .filter(|p| p.sheet_number == *sheet)
                .count();
            assert_eq!(on_sheet.len(), expected);
            assert!(on_sheet.iter().all(|p| p.sheet_number == *sheet));
        }
        assert_eq!(doc.parts_on_sheet(2).len(), 1);
        assert_eq!(doc.sheet_count(), 2);
        assert!(doc.parts_on_sheet(7).is_empty());
    }

    #[test]
    fn test_sheet_view() {
        let doc = parse(SHARED_SYMBOL_FILE);
        let view = doc.sheet_view(2);
        assert_eq!(view.header.map(|h| h.name.as_str()), Some("IO"));
        assert_eq!(view.parts.len(), 1);
        assert_eq!(view.parts[0].reference, "U3-A");
        assert_eq!(view.text_items.len(), 1);
        assert!(view.signals.is_empty());
    }

    #[test]
    fn test_summary() {
        let doc = parse(SHARED_SYMBOL_FILE);
        let summary = doc.summary();
        assert_eq!(summary.version, "9.0");
        assert_eq!(summary.sheets, vec![1, 2]);
        assert_eq!(summary.symbol_defs, 3);
        assert_eq!(summary.part_types, 3);
        assert_eq!(summary.parts, 4);
        assert_eq!(summary.power_symbols, 1);
        assert_eq!(summary.text_items, 1);
    }

    #[test]
    fn test_to_json() {
        let doc = parse(SHARED_SYMBOL_FILE);
        let json = doc.to_json(false).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["header"]["version"], "9.0");
        assert_eq!(value["parts"].as_array().unwrap().len(), 4);
        assert_eq!(value["symbol_defs"][0]["graphics"][0]["kind"], "rectangle");
        assert!(doc.to_json(true).unwrap().contains('\n'));
    }
}
