//! Generates construction scripts from element trees.

use crate::constants::{ATOM_KEY, GX_KEY, INDENT_SIZE, KML_KEY};
use crate::namespace::NamespaceRegistry;
use crate::node::Element;

use super::{CDATA_CLOSE, CDATA_OPEN};

/// Closing lines of every script. `print(...)` is a script statement the
/// reader skips, not a library call.
const TRAILER: &str = "use kml_factory::xml::print_to_string_pretty;\nprint(print_to_string_pretty(doc))\n";

/// Writes the construction script of an element tree.
///
/// Aliases are chosen with [`NamespaceRegistry::resolve_namespace_key`], so
/// elements in an unregistered namespace fall back to the default alias.
pub struct ScriptWriter<'r> {
    registry: &'r NamespaceRegistry,
    out: String,
}

impl<'r> ScriptWriter<'r> {
    /// Creates a writer resolving aliases against `registry`.
    pub fn new(registry: &'r NamespaceRegistry) -> Self {
        ScriptWriter {
            registry,
            out: String::new(),
        }
    }

    /// Writes the complete script for `root`.
    pub fn write(mut self, root: &Element) -> String {
        self.write_header();

        self.out.push_str("doc = ");
        self.out.push_str(&self.call_head(root));
        self.out.push('\n');
        self.write_body(root, 1);
        self.out.push_str(")\n");

        self.out.push_str(TRAILER);
        self.out
    }

    fn write_header(&mut self) {
        let registry = self.registry;
        for key in [KML_KEY, ATOM_KEY, GX_KEY] {
            self.out.push_str(&format!("use kml_factory::{};\n", key));
        }
        // Keys of a custom registry get their own import
        for entry in registry.entries() {
            if ![KML_KEY, ATOM_KEY, GX_KEY].contains(&entry.key()) {
                self.out.push_str(&format!("use kml_factory::{};\n", entry.key()));
            }
        }
        self.out.push('\n');
    }

    /// `ALIAS.local(`
    fn call_head(&self, element: &Element) -> String {
        format!(
            "{}.{}(",
            self.registry.resolve_namespace_key(element.namespace()),
            element.local_name()
        )
    }

    /// Attributes, text and children of `element`, one per line.
    fn write_body(&mut self, element: &Element, depth: usize) {
        let indent = " ".repeat(depth * INDENT_SIZE);
        for (name, value) in element.attributes() {
            self.out
                .push_str(&format!("{}{}={},\n", indent, name, quote_plain(value)));
        }
        if let Some(text) = element.text() {
            self.out.push_str(&format!("{}{},\n", indent, quote(text)));
        }
        for child in element.children() {
            self.write_child(child, depth);
        }
    }

    fn write_child(&mut self, element: &Element, depth: usize) {
        let indent = " ".repeat(depth * INDENT_SIZE);
        let head = self.call_head(element);

        if element.has_children() {
            self.out.push_str(&format!("{}{}\n", indent, head));
            self.write_body(element, depth + 1);
            self.out.push_str(&format!("{}),\n", indent));
            return;
        }

        let mut line = format!("{}{}", indent, head);
        if let Some(text) = element.text() {
            line.push_str(&quote(text));
            if !element.attributes().is_empty() {
                line.push(',');
            }
        }
        for (name, value) in element.attributes() {
            line.push_str(&format!("{}={},", name, quote_plain(value)));
        }
        line.push_str("),\n");
        self.out.push_str(&line);
    }
}

/// Generates the construction script that rebuilds `root`.
pub fn write_construction_script(root: &Element, registry: &NamespaceRegistry) -> String {
    ScriptWriter::new(registry).write(root)
}

/// Quotes element text. Text that looks like markup is wrapped as CDATA
/// and emitted byte for byte.
fn quote(text: &str) -> String {
    if text.contains('<') && !text.contains(CDATA_CLOSE) {
        format!("\"{}{}{}\"", CDATA_OPEN, text, CDATA_CLOSE)
    } else {
        quote_plain(text)
    }
}

/// Quotes a string literal, escaping `\`, `"` and `<`.
///
/// `<` only reaches here when a CDATA wrapper cannot hold the text; the
/// escape keeps such a literal from being read back as CDATA.
fn quote_plain(text: &str) -> String {
    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('"');
    for c in text.chars() {
        match c {
            '\\' => quoted.push_str("\\\\"),
            '"' => quoted.push_str("\\\""),
            '<' => quoted.push_str("\\<"),
            _ => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}
