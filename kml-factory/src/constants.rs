//! Constants used throughout the KML factory.

/// OGC KML 2.2 namespace, the default namespace of every document.
pub const KML_NAMESPACE: &str = "http://www.opengis.net/kml/2.2";

/// Atom syndication namespace (`atom:` prefix).
pub const ATOM_NAMESPACE: &str = "http://www.w3.org/2005/Atom";

/// Google extensions namespace (`gx:` prefix).
pub const GX_NAMESPACE: &str = "http://www.google.com/kml/ext/2.2";

/// Symbolic key of the default KML entry.
pub const KML_KEY: &str = "KML";

/// Symbolic key of the Atom entry.
pub const ATOM_KEY: &str = "ATOM";

/// Symbolic key of the Google extensions entry.
pub const GX_KEY: &str = "GX";

/// Serialization prefix of the Atom namespace.
pub const ATOM_PREFIX: &str = "atom";

/// Serialization prefix of the Google extensions namespace.
pub const GX_PREFIX: &str = "gx";

/// Resource name of the OGC KML 2.2 schema.
pub const OGC_KML22_SCHEMA: &str = "ogckml22.xsd";

/// Resource name of the KML 2.2 schema with Google extensions.
pub const KML22_GX_SCHEMA: &str = "kml22gx.xsd";

/// Spaces per nesting level in generated scripts and pretty-printed XML.
pub const INDENT_SIZE: usize = 2;
