//! XML parsing and output.
//!
//! The printer produces the canonical serialization of an element tree with
//! every registry namespace declared on the root. The parser reads KML
//! documents back into the same tree shape the element makers build.

mod parser;
mod printer;

pub use parser::{parse_file, parse_str, XmlParser};
pub use printer::{print_to_string, print_to_string_pretty, XmlPrinter, XmlPrinterOptions};
