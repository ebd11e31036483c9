//! Executes construction scripts.
//!
//! The reader understands the statements [`ScriptWriter`](super::ScriptWriter)
//! emits: `use` imports that bind registry keys as aliases, a single
//! `doc = ALIAS.tag(...)` assignment, and the trailing `print(...)` line.
//! Calls are evaluated through [`ElementMaker::make`], so names are checked
//! exactly as they are for hand-built trees.

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::factory::{Arg, ElementMaker};
use crate::namespace::NamespaceRegistry;
use crate::node::Element;

use super::{CDATA_CLOSE, CDATA_OPEN};

/// Executes construction scripts against a namespace registry.
pub struct ScriptReader<'r> {
    registry: &'r NamespaceRegistry,
}

impl<'r> ScriptReader<'r> {
    /// Creates a reader binding aliases from `registry`.
    pub fn new(registry: &'r NamespaceRegistry) -> Self {
        ScriptReader { registry }
    }

    /// Runs `script` and returns the tree assigned to `doc`.
    pub fn read(&self, script: &str) -> Result<Element> {
        let mut cursor = Cursor::new(script);
        let mut aliases: HashMap<&str, ElementMaker<'r>> = HashMap::new();
        let mut doc: Option<Element> = None;

        loop {
            cursor.skip_whitespace();
            if cursor.peek().is_none() {
                break;
            }
            let rest = cursor.rest();
            if rest.starts_with("//") || rest.starts_with("print") {
                cursor.skip_line();
            } else if rest.starts_with("use ") {
                let path = cursor.take_until(';')?["use".len()..].trim();
                let key = path.rsplit("::").next().unwrap_or(path);
                match ElementMaker::new(self.registry, Some(key)) {
                    Ok(maker) => {
                        tracing::trace!(alias = key, uri = maker.entry().uri(), "Bound alias");
                        aliases.insert(key, maker);
                    }
                    Err(_) => tracing::trace!(path, "Ignoring import"),
                }
            } else if rest.starts_with("doc") {
                let line = cursor.line;
                let target = cursor.token()?;
                if target != "doc" {
                    return Err(cursor.error_at(line, format!("cannot assign to '{}'", target)));
                }
                cursor.skip_whitespace();
                cursor.expect('=')?;
                cursor.skip_whitespace();
                if doc.is_some() {
                    return Err(cursor.error_at(line, "`doc` is assigned more than once"));
                }
                let call_line = cursor.line;
                let name = cursor.token()?;
                doc = Some(self.call(&mut cursor, &aliases, name, call_line)?);
            } else {
                return Err(cursor.error("expected `use`, `doc = ...` or `print(...)`"));
            }
        }

        doc.ok_or_else(|| cursor.error("script has no `doc = ...` statement"))
    }

    /// Evaluates `ALIAS.tag(...)` once `name` (the `ALIAS.tag` part) has
    /// been consumed.
    fn call<'s>(
        &self,
        cursor: &mut Cursor<'s>,
        aliases: &HashMap<&str, ElementMaker<'r>>,
        name: &'s str,
        line: usize,
    ) -> Result<Element> {
        let (alias, tag) = name
            .split_once('.')
            .ok_or_else(|| cursor.error_at(line, format!("expected a call, found '{}'", name)))?;
        let maker = aliases
            .get(alias)
            .ok_or_else(|| cursor.error_at(line, format!("unknown alias '{}'", alias)))?;
        cursor.skip_whitespace();
        cursor.expect('(')?;

        let mut args: Vec<Arg> = Vec::new();
        let mut attrs: Vec<(&str, String)> = Vec::new();
        loop {
            cursor.skip_whitespace();
            match cursor.peek() {
                None => return Err(cursor.error_at(line, format!("unclosed call to '{}'", name))),
                Some(')') => {
                    cursor.bump();
                    break;
                }
                Some('"') => args.push(Arg::Text(cursor.string()?)),
                Some(_) => {
                    let arg_line = cursor.line;
                    let token = cursor.token()?;
                    cursor.skip_whitespace();
                    if cursor.eat('=') {
                        cursor.skip_whitespace();
                        if cursor.peek() != Some('"') {
                            return Err(cursor.error(format!(
                                "attribute '{}' needs a string value",
                                token
                            )));
                        }
                        attrs.push((token, cursor.string()?));
                    } else {
                        args.push(Arg::Element(self.call(cursor, aliases, token, arg_line)?));
                    }
                }
            }

            cursor.skip_whitespace();
            if !cursor.eat(',') && cursor.peek() != Some(')') {
                return Err(cursor.error("expected ',' or ')'"));
            }
        }

        tracing::trace!(line, alias, tag, "Evaluated call");
        maker.make(tag, args, attrs).map_err(|e| Error::Script {
            line,
            message: e.to_string(),
        })
    }
}

/// Executes a construction script and returns the document it builds.
pub fn read_construction_script(script: &str, registry: &NamespaceRegistry) -> Result<Element> {
    ScriptReader::new(registry).read(script)
}

/// Position in the script text, with a 1-based line number.
struct Cursor<'s> {
    src: &'s str,
    pos: usize,
    line: usize,
}

impl<'s> Cursor<'s> {
    fn new(src: &'s str) -> Self {
        Cursor { src, pos: 0, line: 1 }
    }

    fn rest(&self) -> &'s str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    /// Skips `len` bytes, which must end on a char boundary.
    fn skip_bytes(&mut self, len: usize) {
        let skipped = &self.src[self.pos..self.pos + len];
        self.line += skipped.matches('\n').count();
        self.pos += len;
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: char) -> Result<()> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(self.error(format!("expected '{}'", expected)))
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn skip_line(&mut self) {
        while let Some(c) = self.bump() {
            if c == '\n' {
                break;
            }
        }
    }

    /// Consumes text up to and including `end`, returning the text before it.
    fn take_until(&mut self, end: char) -> Result<&'s str> {
        let line = self.line;
        let rest = self.rest();
        let len = rest
            .find(end)
            .ok_or_else(|| self.error_at(line, format!("missing '{}'", end)))?;
        self.skip_bytes(len + end.len_utf8());
        Ok(&rest[..len])
    }

    /// A run of name characters, such as `KML.Placemark` or `href`.
    fn token(&mut self) -> Result<&'s str> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_whitespace() || matches!(c, '(' | ')' | '=' | ',' | '"') {
                break;
            }
            self.bump();
        }
        if start == self.pos {
            return Err(match self.peek() {
                Some(c) => self.error(format!("unexpected '{}'", c)),
                None => self.error("unexpected end of script"),
            });
        }
        Ok(&self.src[start..self.pos])
    }

    /// A string literal. CDATA literals are taken raw; other literals decode
    /// backslash escapes.
    fn string(&mut self) -> Result<String> {
        let line = self.line;
        self.expect('"')?;

        if self.rest().starts_with(CDATA_OPEN) {
            self.skip_bytes(CDATA_OPEN.len());
            let terminator = format!("{}\"", CDATA_CLOSE);
            let rest = self.rest();
            let len = rest
                .find(&terminator)
                .ok_or_else(|| self.error_at(line, "unterminated CDATA string"))?;
            self.skip_bytes(len + terminator.len());
            return Ok(rest[..len].to_string());
        }

        let mut value = String::new();
        loop {
            match self.bump() {
                None => return Err(self.error_at(line, "unterminated string")),
                Some('"') => return Ok(value),
                Some('\\') => match self.bump() {
                    Some('\\') => value.push('\\'),
                    Some('"') => value.push('"'),
                    Some('<') => value.push('<'),
                    Some('n') => value.push('\n'),
                    Some('t') => value.push('\t'),
                    Some(c) => return Err(self.error(format!("unknown escape '\\{}'", c))),
                    None => return Err(self.error_at(line, "unterminated string")),
                },
                Some(c) => value.push(c),
            }
        }
    }

    fn error(&self, message: impl Into<String>) -> Error {
        self.error_at(self.line, message)
    }

    fn error_at(&self, line: usize, message: impl Into<String>) -> Error {
        Error::Script {
            line,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::KmlFactory;
    use crate::script::write_construction_script;
    use pretty_assertions::assert_eq;

    const HEADER: &str = "use kml_factory::KML;\nuse kml_factory::ATOM;\nuse kml_factory::GX;\n\n";

    fn read(script: &str) -> Result<Element> {
        read_construction_script(script, &NamespaceRegistry::kml())
    }

    fn script_line(result: Result<Element>) -> usize {
        match result {
            Err(Error::Script { line, .. }) => line,
            other => panic!("expected a script error, got {:?}", other),
        }
    }

    #[test]
    fn test_read_nested_calls() {
        let registry = NamespaceRegistry::kml();
        let f = KmlFactory::new(&registry).unwrap();
        let script = format!(
            "{}doc = KML.kml(\n  KML.Document(\n    ATOM.link(href=\"http://www.harrypotter.com\",),\n    KML.name(\"Hogwarts\"),\n  ),\n)\n",
            HEADER
        );

        let doc = read(&script).unwrap();
        let expected = f
            .kml
            .tag("kml")
            .child(
                f.kml
                    .tag("Document")
                    .child(f.atom.tag("link").attr("href", "http://www.harrypotter.com"))
                    .child(f.kml.tag("name").text("Hogwarts")),
            )
            .build()
            .unwrap();
        assert_eq!(doc, expected);
    }

    #[test]
    fn test_cdata_literal_is_raw() {
        let script = format!(
            "{}doc = KML.description(\"<![CDATA[<font color=\"red\">a\\b</font>]]>\")\n",
            HEADER
        );
        let doc = read(&script).unwrap();
        assert_eq!(doc.text(), Some(r#"<font color="red">a\b</font>"#));
    }

    #[test]
    fn test_escapes_decoded() {
        let script = format!(
            "{}doc = KML.Data(\"\\<a>]]>\", name=\"say \\\"hi\\\" \\\\o/\")\n",
            HEADER
        );
        let doc = read(&script).unwrap();
        assert_eq!(doc.text(), Some("<a>]]>"));
        assert_eq!(doc.attribute("name"), Some(r#"say "hi" \o/"#));
    }

    #[test]
    fn test_trailer_and_comments_ignored() {
        let script = format!(
            "// generated\n{}doc = GX.Tour()\nuse kml_factory::xml::print_to_string_pretty;\nprint(print_to_string_pretty(doc))\n",
            HEADER
        );
        let doc = read(&script).unwrap();
        assert_eq!(doc.local_name(), "Tour");
    }

    #[test]
    fn test_unknown_alias_reports_line() {
        let script = format!("{}doc = KML.kml(\n  FOO.name(\"x\"),\n)\n", HEADER);
        let result = read(&script);
        assert_eq!(script_line(result), 6);
    }

    #[test]
    fn test_alias_requires_import() {
        let result = read("use kml_factory::KML;\ndoc = GX.Tour()\n");
        assert!(matches!(result, Err(Error::Script { line: 2, message }) if message.contains("GX")));
    }

    #[test]
    fn test_invalid_tag_name_is_script_error() {
        let script = format!("{}doc = KML.kml(\n  KML.1st(),\n)\n", HEADER);
        let result = read(&script);
        assert!(
            matches!(result, Err(Error::Script { line: 6, message }) if message.contains("1st"))
        );
    }

    #[test]
    fn test_missing_doc() {
        assert!(matches!(read(HEADER), Err(Error::Script { .. })));
    }

    #[test]
    fn test_doc_assigned_twice() {
        let script = format!("{}doc = KML.kml()\ndoc = KML.kml()\n", HEADER);
        assert_eq!(script_line(read(&script)), 6);
    }

    #[test]
    fn test_syntax_errors() {
        assert_eq!(script_line(read("use kml_factory::KML;\ndoc = KML.kml(\n")), 2);
        assert_eq!(script_line(read("use kml_factory::KML;\ndoc = KML.kml(\"open)\n")), 2);
        assert_eq!(script_line(read("use kml_factory::KML;\ndoc = KML.kml(href=1)\n")), 2);
        assert_eq!(script_line(read("use kml_factory::KML;\ndoc = KML.kml(\"a\" \"b\")\n")), 2);
        assert_eq!(script_line(read("use kml_factory::KML\n")), 1);
        assert_eq!(script_line(read("let doc = 1;\n")), 1);
    }

    #[test]
    fn test_round_trip_through_writer() {
        let registry = NamespaceRegistry::kml();
        let f = KmlFactory::new(&registry).unwrap();
        let doc = f
            .kml
            .tag("kml")
            .attr("hint", "target=sky")
            .child(
                f.kml
                    .tag("Placemark")
                    .child(f.kml.tag("name").text("Line one\nline \"two\""))
                    .child(f.kml.tag("description").text("<b>bold</b> & <i>it's</i>"))
                    .child(f.kml.tag("Snippet").text("a ]]> b <c>").attr("maxLines", 2))
                    .child(f.gx.tag("Tour").child(f.gx.tag("Playlist"))),
            )
            .build()
            .unwrap();

        let script = write_construction_script(&doc, &registry);
        let rebuilt = read_construction_script(&script, &registry).unwrap();
        assert_eq!(rebuilt, doc);
    }
}
