//! Construction scripts.
//!
//! A construction script is the source text of the element-maker calls that
//! rebuild a document:
//!
//! ```text
//! use kml_factory::KML;
//! use kml_factory::ATOM;
//! use kml_factory::GX;
//!
//! doc = KML.kml(
//!   KML.Document(
//!     ATOM.link(href="http://www.harrypotter.com",),
//!     KML.name("Hogwarts"),
//!   ),
//! )
//! use kml_factory::xml::print_to_string_pretty;
//! print(print_to_string_pretty(doc))
//! ```
//!
//! [`write_construction_script`] generates one from a tree and
//! [`read_construction_script`] executes one back into a tree.
//!
//! The script is its own small call language, not Rust source, and is not
//! meant for `rustc`. Its statements, one per line:
//!
//! - `use path::KEY;` binds the alias `KEY` (the last path segment) to the
//!   element maker of that registry key. A `use` whose last segment is not
//!   a registry key, such as the `print_to_string_pretty` import, binds
//!   nothing.
//! - `doc = ALIAS.tag(args)` builds the document. Arguments are nested
//!   calls, string literals (`"..."` with backslash escapes for `\`, `"`
//!   and `<`, or raw `"<![CDATA[...]]>"`) and `name="value"` attributes.
//!   Trailing commas are allowed.
//! - `print(...)` lines are skipped by the reader. `kml run` executes a
//!   script and prints the built document.
//! - Lines starting with `//` are comments.
//!
//! ```
//! use kml_factory::{read_construction_script, NamespaceRegistry};
//!
//! let script = "use kml_factory::KML;\n\
//!               doc = KML.kml(KML.name(\"Hogwarts\", xml:lang=\"en\"),)\n\
//!               print(doc)\n";
//! let doc = read_construction_script(script, &NamespaceRegistry::kml()).unwrap();
//! assert_eq!(doc.children()[0].attribute("xml:lang"), Some("en"));
//! ```

mod reader;
mod writer;

pub use reader::{read_construction_script, ScriptReader};
pub use writer::{write_construction_script, ScriptWriter};

/// Opening marker of a raw CDATA string literal.
pub(crate) const CDATA_OPEN: &str = "<![CDATA[";

/// Closing marker of a raw CDATA string literal.
pub(crate) const CDATA_CLOSE: &str = "]]>";
