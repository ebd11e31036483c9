//! KML Factory - namespaced element construction for KML documents
//!
//! This library builds KML (Keyhole Markup Language) documents as XML
//! element trees, serializes them, validates them against the KML XML
//! schemas, and turns existing documents back into the construction
//! scripts that rebuild them.
//!
//! # Overview
//!
//! Elements are built by an [`ElementMaker`] bound to one entry of a
//! [`NamespaceRegistry`]. The KML registry has three entries:
//!
//! | key | namespace | prefix |
//! |---|---|---|
//! | `KML` (default) | `http://www.opengis.net/kml/2.2` | none |
//! | `ATOM` | `http://www.w3.org/2005/Atom` | `atom` |
//! | `GX` | `http://www.google.com/kml/ext/2.2` | `gx` |
//!
//! [`KmlFactory`] holds one maker per entry.
//!
//! # Example
//!
//! ```
//! use kml_factory::{print_to_string, KmlFactory, NamespaceRegistry};
//!
//! let registry = NamespaceRegistry::kml();
//! let KmlFactory { kml, gx, .. } = KmlFactory::new(&registry).unwrap();
//!
//! let doc = kml
//!     .tag("kml")
//!     .child(gx.tag("Tour").child(kml.tag("name").text("Tower")))
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(
//!     print_to_string(&doc, &registry).unwrap(),
//!     "<kml xmlns:gx=\"http://www.google.com/kml/ext/2.2\" \
//!      xmlns:atom=\"http://www.w3.org/2005/Atom\" \
//!      xmlns=\"http://www.opengis.net/kml/2.2\">\
//!      <gx:Tour><name>Tower</name></gx:Tour></kml>"
//! );
//! ```

pub mod constants;
pub mod error;
pub mod factory;
pub mod namespace;
pub mod node;
pub mod schema;
pub mod script;
pub mod xml;

// Re-export commonly used types
pub use constants::*;
pub use error::{Error, Result};
pub use factory::{Arg, ElementBuilder, ElementMaker, KmlFactory, NO_ARGS, NO_ATTRS};
pub use namespace::{NamespaceContext, NamespaceEntry, NamespaceRegistry};
pub use node::{Element, QName};
pub use schema::{Schema, ValidationIssue, ValidationReport, Validator, BUNDLED_SCHEMA_DIR};
pub use script::{read_construction_script, write_construction_script};
pub use xml::{
    parse_file, parse_str, print_to_string, print_to_string_pretty, XmlParser, XmlPrinter,
    XmlPrinterOptions,
};

/// Registry keys under the names construction scripts import them by.
pub use constants::{ATOM_KEY as ATOM, GX_KEY as GX, KML_KEY as KML};
