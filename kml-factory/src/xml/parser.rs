//! XML parser that builds element trees.
//!
//! This parser uses quick-xml's streaming API and resolves prefixes with a
//! scoped [`NamespaceContext`]. Elements in the registry's default
//! namespace come out with an unqualified [`QName`], the same shape the
//! default element maker produces.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{Error, Result};
use crate::namespace::{is_xmlns_attr, split_qname, NamespaceContext, NamespaceRegistry};
use crate::node::{Element, QName};

/// XML parser that builds element trees.
pub struct XmlParser<'r> {
    registry: &'r NamespaceRegistry,
}

impl<'r> XmlParser<'r> {
    /// Creates a new parser normalizing names against `registry`.
    pub fn new(registry: &'r NamespaceRegistry) -> Self {
        XmlParser { registry }
    }

    /// Parses XML from a string.
    pub fn parse_str(&self, xml: &str) -> Result<Element> {
        let mut reader = Reader::from_str(xml);
        // Text is kept verbatim; whitespace-only runs are dropped on flush
        reader.config_mut().trim_text_start = false;
        reader.config_mut().trim_text_end = false;
        self.parse_reader(&mut reader)
    }

    /// Parses XML from a file.
    pub fn parse_file<P: AsRef<Path>>(&self, path: P) -> Result<Element> {
        let file = File::open(path)?;
        let mut reader = Reader::from_reader(BufReader::new(file));
        reader.config_mut().trim_text_start = false;
        reader.config_mut().trim_text_end = false;
        self.parse_reader(&mut reader)
    }

    /// Parses XML from a quick-xml Reader.
    fn parse_reader<R: BufRead>(&self, reader: &mut Reader<R>) -> Result<Element> {
        let mut ctx = NamespaceContext::new();
        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;
        let mut current_text: Option<String> = None;
        let mut element_count = 0usize;
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) => {
                    flush_text(&mut stack, &mut current_text)?;
                    ctx.push_scope();
                    stack.push(self.parse_element(e, reader, &mut ctx)?);
                    element_count += 1;
                }
                Ok(Event::End(_)) => {
                    flush_text(&mut stack, &mut current_text)?;
                    let element = stack
                        .pop()
                        .ok_or_else(|| Error::Parse("unexpected end tag".to_string()))?;
                    ctx.pop_scope();
                    attach(&mut stack, &mut root, element)?;
                }
                Ok(Event::Empty(ref e)) => {
                    // Self-closing tag - handle like Start + End
                    flush_text(&mut stack, &mut current_text)?;
                    ctx.push_scope();
                    let element = self.parse_element(e, reader, &mut ctx)?;
                    ctx.pop_scope();
                    element_count += 1;
                    attach(&mut stack, &mut root, element)?;
                }
                Ok(Event::Text(e)) => {
                    let raw =
                        std::str::from_utf8(e.as_ref()).map_err(|e| Error::Parse(e.to_string()))?;
                    let text = unescape(raw).map_err(|e| Error::Parse(e.to_string()))?;
                    push_text(&mut current_text, &text);
                }
                Ok(Event::GeneralRef(e)) => {
                    let name = std::str::from_utf8(&e).map_err(|e| Error::Parse(e.to_string()))?;
                    let reference = format!("&{};", name);
                    let text = unescape(&reference).map_err(|e| Error::Parse(e.to_string()))?;
                    push_text(&mut current_text, &text);
                }
                Ok(Event::CData(ref e)) => {
                    let text = String::from_utf8_lossy(e.as_ref());
                    push_text(&mut current_text, &text);
                }
                Ok(Event::Eof) => break,
                Ok(Event::Comment(_)) | Ok(Event::Decl(_)) | Ok(Event::PI(_)) => {
                    // Comments, the XML declaration and processing instructions are not kept
                }
                Ok(Event::DocType(_)) => {
                    // Ignore DOCTYPE
                }
                Err(e) => return Err(Error::Xml(e)),
            }
            buf.clear();
        }

        if !stack.is_empty() {
            return Err(Error::Parse(format!(
                "unexpected end of document inside <{}>",
                stack.last().map(|e| e.local_name()).unwrap_or_default()
            )));
        }

        let root = root.ok_or_else(|| Error::Parse("document has no root element".to_string()))?;
        tracing::debug!(root = %root.name(), elements = element_count, "Parsed document");
        Ok(root)
    }

    /// Parses an element's name and attributes, binding its namespace
    /// declarations in the current scope of `ctx`.
    fn parse_element<R>(
        &self,
        e: &BytesStart,
        reader: &Reader<R>,
        ctx: &mut NamespaceContext,
    ) -> Result<Element> {
        let mut attributes = Vec::new();
        for attr_result in e.attributes() {
            let attr = attr_result.map_err(|e| Error::Xml(e.into()))?;
            let key = reader
                .decoder()
                .decode(attr.key.as_ref())
                .map_err(|e| Error::Parse(e.to_string()))?
                .to_string();
            let value = attr
                .unescape_value()
                .map_err(|e| Error::Parse(e.to_string()))?
                .to_string();

            if is_xmlns_attr(&key) {
                let prefix = split_qname(&key).1;
                let prefix = if key == "xmlns" { "" } else { prefix };
                ctx.bind(prefix, &value);
            } else {
                attributes.push((key, value));
            }
        }

        let qname = e.name();
        let name = reader
            .decoder()
            .decode(qname.as_ref())
            .map_err(|e| Error::Parse(e.to_string()))?;
        let (namespace, local) = ctx.resolve_element(&name)?;

        // The default namespace is implicit on elements built by the factory
        let default_uri = self.registry.default_entry().uri();
        let namespace = namespace.filter(|ns| ns != default_uri);

        let mut element = Element::new(QName::new(namespace.as_deref(), local));
        for (key, value) in attributes {
            let foreign = matches!(split_qname(&key), (Some(prefix), _) if prefix != "xml");
            if foreign {
                tracing::debug!(
                    element = %element.name(),
                    attribute = %key,
                    "Dropping namespace-qualified attribute"
                );
            } else {
                element.set_attribute(key, value);
            }
        }
        Ok(element)
    }
}

/// Accumulates a run of text between markup events.
fn push_text(current: &mut Option<String>, text: &str) {
    match current {
        Some(existing) => existing.push_str(text),
        None => *current = Some(text.to_string()),
    }
}

/// Moves accumulated text onto the open element.
///
/// Whitespace-only runs are formatting and are dropped.
fn flush_text(stack: &mut [Element], current: &mut Option<String>) -> Result<()> {
    let Some(text) = current.take() else {
        return Ok(());
    };
    if text.trim().is_empty() {
        return Ok(());
    }
    match stack.last_mut() {
        Some(parent) => {
            parent.append_text(&text);
            Ok(())
        }
        None => Err(Error::Parse("text outside the root element".to_string())),
    }
}

/// Attaches a closed element to its parent, or makes it the root.
fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => parent.push_child(element),
        None if root.is_none() => *root = Some(element),
        None => return Err(Error::Parse("multiple root elements".to_string())),
    }
    Ok(())
}

/// Parses XML from a file using the KML registry.
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Element> {
    let registry = NamespaceRegistry::kml();
    XmlParser::new(&registry).parse_file(path)
}

/// Parses XML from a string using the KML registry.
pub fn parse_str(xml: &str) -> Result<Element> {
    let registry = NamespaceRegistry::kml();
    XmlParser::new(&registry).parse_str(xml)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{ATOM_NAMESPACE, GX_NAMESPACE};

    const KML_OPEN: &str = r#"<kml xmlns:gx="http://www.google.com/kml/ext/2.2" xmlns:atom="http://www.w3.org/2005/Atom" xmlns="http://www.opengis.net/kml/2.2">"#;

    #[test]
    fn test_parse_simple_document() {
        let xml = format!("{}<Document><name>KmlFile</name></Document></kml>", KML_OPEN);
        let root = parse_str(&xml).unwrap();

        assert_eq!(root.name(), &QName::local("kml"));
        assert!(root.attributes().is_empty());
        let document = &root.children()[0];
        assert_eq!(document.local_name(), "Document");
        assert_eq!(document.find_child("name").unwrap().text(), Some("KmlFile"));
    }

    #[test]
    fn test_parse_prefixed_namespaces() {
        let xml = format!(
            r#"{}<gx:Tour/><atom:link href="http://www.harrypotter.com"/></kml>"#,
            KML_OPEN
        );
        let root = parse_str(&xml).unwrap();

        let tour = &root.children()[0];
        assert_eq!(tour.namespace(), Some(GX_NAMESPACE));
        let link = &root.children()[1];
        assert_eq!(link.namespace(), Some(ATOM_NAMESPACE));
        assert_eq!(link.attribute("href"), Some("http://www.harrypotter.com"));
    }

    #[test]
    fn test_parse_alternate_prefix() {
        let xml = r#"<k:kml xmlns:k="http://www.opengis.net/kml/2.2"><k:name>x</k:name></k:kml>"#;
        let root = parse_str(xml).unwrap();
        assert_eq!(root.name(), &QName::local("kml"));
        assert_eq!(root.children()[0].name(), &QName::local("name"));
    }

    #[test]
    fn test_whitespace_only_text_dropped() {
        let xml = format!(
            "{}\n  <Placemark>\n    <name>  Hogwarts </name>\n  </Placemark>\n</kml>\n",
            KML_OPEN
        );
        let root = parse_str(&xml).unwrap();
        assert_eq!(root.text(), None);
        let placemark = &root.children()[0];
        assert_eq!(placemark.text(), None);
        assert_eq!(placemark.children()[0].text(), Some("  Hogwarts "));
    }

    #[test]
    fn test_entities_and_cdata_become_text() {
        let xml = format!(
            "{}<description>a &lt; b &amp;&#32;<![CDATA[<b>c</b>]]></description></kml>",
            KML_OPEN
        );
        let root = parse_str(&xml).unwrap();
        assert_eq!(root.children()[0].text(), Some("a < b & <b>c</b>"));
    }

    #[test]
    fn test_namespaced_attributes_dropped() {
        let xml = r#"<kml xmlns="http://www.opengis.net/kml/2.2" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xsi:schemaLocation="x" hint="target=sky"/>"#;
        let root = parse_str(xml).unwrap();
        assert_eq!(
            root.attributes(),
            &[("hint".to_string(), "target=sky".to_string())]
        );
    }

    #[test]
    fn test_unbound_prefix_is_error() {
        let xml = r#"<kml xmlns="http://www.opengis.net/kml/2.2"><xal:Address/></kml>"#;
        assert!(matches!(parse_str(xml), Err(Error::Parse(_))));
    }

    #[test]
    fn test_no_namespace_document() {
        let xml = r#"<kml><Placemark/></kml>"#;
        let root = parse_str(xml).unwrap();
        assert_eq!(root.namespace(), None);
        assert_eq!(root.children()[0].local_name(), "Placemark");
    }

    #[test]
    fn test_malformed_documents() {
        assert!(parse_str("").is_err());
        assert!(parse_str("<kml>").is_err());
        assert!(parse_str("<kml></Document>").is_err());
    }

    #[test]
    fn test_reader_errors_keep_their_source() {
        assert!(matches!(parse_str("<kml></Document>"), Err(Error::Xml(_))));
        assert!(matches!(
            parse_str(r#"<kml hint="a" hint="b"/>"#),
            Err(Error::Xml(_))
        ));
        assert!(matches!(parse_str("<kml/><kml/>"), Err(Error::Parse(_))));
    }

    #[test]
    fn test_parse_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(
            &mut file,
            format!("{}<Folder><open>1</open></Folder></kml>", KML_OPEN).as_bytes(),
        )
        .unwrap();

        let root = parse_file(file.path()).unwrap();
        assert_eq!(root.children()[0].children()[0].text(), Some("1"));
    }
}
