//! XML printer that serializes element trees.
//!
//! The compact form matches the canonical `tostring` output KML tooling
//! expects: no XML declaration, `<tag/>` for empty elements, and every
//! registry namespace declared on the root element.

use std::io::Write;

use quick_xml::escape::{escape, partial_escape};

use crate::namespace::NamespaceRegistry;
use crate::node::Element;

/// Options for XML printing.
#[derive(Debug, Clone, Default)]
pub struct XmlPrinterOptions {
    /// Whether to pretty-print with indentation.
    pub pretty_print: bool,
    /// Whether to emit an `<?xml ...?>` declaration.
    pub xml_declaration: bool,
}

/// XML printer that outputs element trees.
pub struct XmlPrinter<'r, W: Write> {
    writer: W,
    registry: &'r NamespaceRegistry,
    options: XmlPrinterOptions,
}

impl<'r, W: Write> XmlPrinter<'r, W> {
    /// Creates a new compact XML printer.
    pub fn new(writer: W, registry: &'r NamespaceRegistry) -> Self {
        Self::with_options(writer, registry, XmlPrinterOptions::default())
    }

    /// Creates a new XML printer with the given options.
    pub fn with_options(
        writer: W,
        registry: &'r NamespaceRegistry,
        options: XmlPrinterOptions,
    ) -> Self {
        XmlPrinter {
            writer,
            registry,
            options,
        }
    }

    /// Prints an element tree as a complete document.
    pub fn print(&mut self, root: &Element) -> std::io::Result<()> {
        if self.options.xml_declaration {
            writeln!(self.writer, "<?xml version=\"1.0\" encoding=\"UTF-8\"?>")?;
        }

        let pretty = self.options.pretty_print;
        self.print_element(root, 0, None, pretty)?;

        if pretty {
            writeln!(self.writer)?;
        }
        self.writer.flush()
    }

    /// Prints one element. `scope_default` is the in-scope default namespace
    /// URI, `None` at the document root.
    fn print_element(
        &mut self,
        element: &Element,
        depth: usize,
        scope_default: Option<&str>,
        pretty: bool,
    ) -> std::io::Result<()> {
        let registry = self.registry;
        let default_uri = registry.default_entry().uri();
        let (prefix, needed_default) = match registry.entry_for(element.namespace()) {
            Some(entry) => match entry.prefix() {
                Some(prefix) => (Some(prefix), None),
                None => (None, Some(entry.uri())),
            },
            // Unregistered namespace: bind it as the default on this element
            None => (None, element.namespace()),
        };

        let qname = match prefix {
            Some(prefix) => format!("{}:{}", prefix, element.local_name()),
            None => element.local_name().to_string(),
        };

        let mut tag = String::new();
        tag.push('<');
        tag.push_str(&qname);

        let mut in_scope = scope_default;
        if scope_default.is_none() {
            // Document root declares every registry namespace
            let root_default = needed_default.unwrap_or(default_uri);
            for entry in registry.entries() {
                match entry.prefix() {
                    Some(prefix) => {
                        tag.push_str(&format!(" xmlns:{}=\"{}\"", prefix, escape(entry.uri())));
                    }
                    None => {
                        tag.push_str(&format!(" xmlns=\"{}\"", escape(root_default)));
                    }
                }
            }
            in_scope = Some(root_default);
        } else if let Some(needed) = needed_default {
            if Some(needed) != scope_default {
                tag.push_str(&format!(" xmlns=\"{}\"", escape(needed)));
                in_scope = Some(needed);
            }
        }

        for (name, value) in element.attributes() {
            tag.push(' ');
            tag.push_str(name);
            tag.push_str("=\"");
            tag.push_str(&escape(value.as_str()));
            tag.push('"');
        }

        if pretty && depth > 0 {
            write!(self.writer, "{}", indent_str(depth))?;
        }

        if !element.has_children() && element.text().is_none() {
            write!(self.writer, "{}/>", tag)?;
            return Ok(());
        }

        write!(self.writer, "{}>", tag)?;
        if let Some(text) = element.text() {
            write!(self.writer, "{}", partial_escape(text))?;
        }

        // Mixed content keeps its exact whitespace
        let indent_children = pretty && element.text().is_none();
        for child in element.children() {
            if indent_children {
                writeln!(self.writer)?;
            }
            self.print_element(child, depth + 1, in_scope, indent_children)?;
        }
        if indent_children && element.has_children() {
            writeln!(self.writer)?;
            if depth > 0 {
                write!(self.writer, "{}", indent_str(depth))?;
            }
        }

        write!(self.writer, "</{}>", qname)
    }
}

fn indent_str(level: usize) -> String {
    " ".repeat(level * crate::constants::INDENT_SIZE)
}

/// Prints an element tree to a compact string.
pub fn print_to_string(root: &Element, registry: &NamespaceRegistry) -> std::io::Result<String> {
    let mut output = Vec::new();
    {
        let mut printer = XmlPrinter::new(&mut output, registry);
        printer.print(root)?;
    }
    Ok(String::from_utf8_lossy(&output).to_string())
}

/// Prints an element tree to a string with pretty printing.
pub fn print_to_string_pretty(
    root: &Element,
    registry: &NamespaceRegistry,
) -> std::io::Result<String> {
    let mut output = Vec::new();
    {
        let options = XmlPrinterOptions {
            pretty_print: true,
            xml_declaration: false,
        };
        let mut printer = XmlPrinter::with_options(&mut output, registry, options);
        printer.print(root)?;
    }
    Ok(String::from_utf8_lossy(&output).to_string())
}
