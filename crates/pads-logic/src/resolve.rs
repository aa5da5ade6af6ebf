//! Cross-section pass run once every section has been read.
//!
//! Section parsers only append; everything that needs data from another
//! section (a pin decal defined after the symbol using it, a wire naming a
//! tie dot) is filled in here.

use std::collections::HashMap;

use log::debug;

use crate::document::PadsDocument;
use crate::types::*;

/// Apply all cross-section fixups and return the updated document.
pub fn resolve(mut doc: PadsDocument) -> PadsDocument {
    let pins = resolve_pin_lengths(&mut doc);
    let attrs = merge_attribute_overrides(&mut doc);
    let nodes = resolve_node_nets(&mut doc);
    debug!("PADS: resolved {pins} pin lengths, {attrs} attribute values, {nodes} node nets");
    doc
}

/// Stub length drawn by a pin decal: first-to-last point of its first line
/// or polyline.
pub fn pin_decal_length(symbol: &SymbolDef) -> Option<f64> {
    symbol
        .graphics
        .iter()
        .find(|g| matches!(g.kind, GraphicKind::Line | GraphicKind::Polyline))
        .and_then(Graphic::span_length)
        .map(|len| round_f64(len, 3))
}

fn resolve_pin_lengths(doc: &mut PadsDocument) -> usize {
    let mut lengths: HashMap<String, f64> = HashMap::new();
    for symbol in doc.symbol_defs.iter().filter(|s| s.is_pin_decal) {
        if let Some(len) = pin_decal_length(symbol) {
            lengths.entry(symbol.name.clone()).or_insert(len);
        }
    }
    if lengths.is_empty() {
        return 0;
    }

    let mut updated = 0;
    for symbol in doc.symbol_defs.iter_mut().filter(|s| !s.is_pin_decal) {
        for pin in symbol.pins.iter_mut() {
            if pin.pin_decal_name.is_empty() {
                continue;
            }
            if let Some(&len) = lengths.get(&pin.pin_decal_name) {
                pin.length = len;
                updated += 1;
            }
        }
    }
    updated
}

/// Displayed-value overrides update the matching attribute, or become a
/// hidden attribute at the part origin when the part has no such label.
fn merge_attribute_overrides(doc: &mut PadsDocument) -> usize {
    let mut merged = 0;
    for part in doc.parts.iter_mut() {
        for (name, value) in &part.attr_overrides {
            match part.attributes.iter().position(|a| &a.name == name) {
                Some(i) => part.attributes[i].value = value.clone(),
                None => part.attributes.push(PartAttribute {
                    name: name.clone(),
                    value: value.clone(),
                    position: part.position,
                    rotation: 0.0,
                    justification: 0,
                    size: part.ref_text_size,
                    visible: false,
                }),
            }
            merged += 1;
        }
    }
    merged
}

/// Name off-page connectors and tie dots after the signal whose wires end
/// on them. The first signal listing a node wins.
fn resolve_node_nets(doc: &mut PadsDocument) -> usize {
    let mut nets: HashMap<&str, &str> = HashMap::new();
    for signal in &doc.signals {
        for wire in &signal.wires {
            nets.entry(wire.endpoint_a.as_str()).or_insert(signal.name.as_str());
            nets.entry(wire.endpoint_b.as_str()).or_insert(signal.name.as_str());
        }
    }

    let mut named = 0;
    for conn in doc.off_page_connectors.iter_mut() {
        if let Some(net) = nets.get(conn.id.as_str()) {
            conn.net_name = Some(net.to_string());
            named += 1;
        }
    }
    for dot in doc.tied_dots.iter_mut() {
        if let Some(net) = nets.get(dot.id.as_str()) {
            dot.net_name = Some(net.to_string());
            named += 1;
        }
    }
    named
}
