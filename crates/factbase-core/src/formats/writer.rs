//! # TA Writer
//!
//! Renders a [`TaDocument`] as Tuple-Attribute text that [`parse_document`]
//! reads back to the same document.
//!
//! [`parse_document`]: super::parser::parse_document

use super::document::{BlockTarget, TaDocument};
use super::lexer::quote;
use crate::config::FactConfig;
use crate::graph::FactGraph;
use crate::primitives::{ATTRIBUTE_HEADER, SCHEME_HEADER, TUPLE_HEADER};
use crate::types::{AttributeMap, EdgeKind, NodeKind};
use std::fmt::Write as _;

/// Timestamp layout used in the generated header comment.
const TIMESTAMP_FORMAT: &str = "%A %B %d, %Y %H:%M:%S";

/// Render `graph` with the current local time in the header.
#[must_use]
pub fn write_graph(graph: &FactGraph, config: &FactConfig) -> String {
    let generated = chrono::Local::now().format(TIMESTAMP_FORMAT).to_string();
    render(&TaDocument::from_graph(graph, config), config, &generated)
}

/// Render a document. `generated` is placed verbatim in the header comment.
#[must_use]
pub fn render(doc: &TaDocument, config: &FactConfig, generated: &str) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "// Tuple-Attribute fact base");
    let _ = writeln!(out, "// Generated on {}", generated);
    out.push('\n');

    write_scheme(&mut out, config);

    let _ = writeln!(out, "{} :", TUPLE_HEADER);
    for relation in doc.relations() {
        let name = quote(&relation.name);
        for (first, second) in &relation.pairs {
            let _ = writeln!(out, "{} {} {}", name, quote(first), quote(second));
        }
    }
    out.push('\n');

    let _ = writeln!(out, "{} :", ATTRIBUTE_HEADER);
    for block in doc.blocks() {
        match &block.target {
            BlockTarget::Entity(id) => out.push_str(&quote(id)),
            BlockTarget::Pair(source, dest) => {
                let _ = write!(out, "( {} {} )", quote(source), quote(dest));
            }
        }
        out.push_str(" { ");
        write_attributes(&mut out, &block.attributes);
        out.push_str("}\n");
    }

    out
}

fn write_scheme(out: &mut String, config: &FactConfig) {
    let _ = writeln!(out, "{} :", SCHEME_HEADER);
    let _ = writeln!(out, "// {} <id> <kind>", config.entity_relation);
    for kind in NodeKind::ALL {
        let _ = writeln!(out, "$INHERIT {} $ENTITY", kind.tag());
    }
    for kind in EdgeKind::ALL {
        let _ = writeln!(out, "{} $ENTITY $ENTITY", kind.tag());
    }
    out.push('\n');
}

fn write_attributes(out: &mut String, attributes: &AttributeMap) {
    for (key, values) in attributes.iter() {
        match values {
            [single] => {
                let _ = write!(out, "{} = {} ", quote(key), quote(single));
            }
            many => {
                let _ = write!(out, "{} = ( ", quote(key));
                for value in many {
                    let _ = write!(out, "{} ", quote(value));
                }
                out.push_str(") ");
            }
        }
    }
}
