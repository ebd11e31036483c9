//! Document validation against the KML XML schemas.
//!
//! [`Schema`] loads one of the bundled XSD files (`ogckml22.xsd` or
//! `kml22gx.xsd`, with the Atom schema they import) into libxml2 and
//! validates documents against it, content models included. Other
//! engines plug in behind the [`Validator`] trait.
//!
//! ```
//! use kml_factory::{KmlFactory, NamespaceRegistry, Schema, Validator};
//!
//! let registry = NamespaceRegistry::kml();
//! let f = KmlFactory::new(&registry).unwrap();
//! let doc = f.kml.tag("kml").child(f.gx.tag("Tour")).build().unwrap();
//!
//! assert!(Schema::open("kml22gx.xsd").unwrap().validate(&doc));
//! assert!(!Schema::open("ogckml22.xsd").unwrap().validate(&doc));
//! ```

use std::cell::RefCell;
use std::fmt;
use std::path::Path;

use libxml::error::StructuredError;
use libxml::parser::Parser;
use libxml::schemas::{SchemaParserContext, SchemaValidationContext};

use crate::constants::{KML22_GX_SCHEMA, OGC_KML22_SCHEMA};
use crate::error::{Error, Result};
use crate::namespace::NamespaceRegistry;
use crate::node::Element;
use crate::xml::print_to_string;

/// Directory holding the schema files shipped with the crate.
pub const BUNDLED_SCHEMA_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/schemas");

/// Checks documents against a schema.
pub trait Validator {
    /// Validates `root`, collecting every problem found.
    fn validate_report(&self, root: &Element) -> ValidationReport;

    /// Returns true if `root` is valid.
    fn validate(&self, root: &Element) -> bool {
        self.validate_report(root).is_valid()
    }
}

/// One validation problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// Line in the validated XML text, when the engine reports one.
    pub line: Option<usize>,
    pub message: String,
}

impl From<&StructuredError> for ValidationIssue {
    fn from(error: &StructuredError) -> Self {
        ValidationIssue {
            line: error
                .line
                .and_then(|line| usize::try_from(line).ok())
                .filter(|line| *line > 0),
            message: error
                .message
                .as_deref()
                .unwrap_or("unknown validation error")
                .trim_end()
                .to_string(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "line {}: {}", line, self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// The outcome of validating one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    fn failed(message: String) -> Self {
        ValidationReport {
            issues: vec![ValidationIssue {
                line: None,
                message,
            }],
        }
    }
}

/// A compiled KML schema.
///
/// The libxml2 validation context is stateful, so validation borrows it
/// mutably through a `RefCell`. A `Schema` is not `Sync`.
pub struct Schema {
    name: String,
    context: RefCell<SchemaValidationContext>,
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema").field("name", &self.name).finish_non_exhaustive()
    }
}

impl Schema {
    /// Opens a bundled schema: `ogckml22.xsd` or `kml22gx.xsd`.
    pub fn open(name: &str) -> Result<Self> {
        if name != OGC_KML22_SCHEMA && name != KML22_GX_SCHEMA {
            return Err(Error::UnknownSchema(name.to_string()));
        }
        Self::open_in(BUNDLED_SCHEMA_DIR, name)
    }

    /// Opens the schema file `name` from `dir`. Imports with relative
    /// locations resolve against `dir`.
    pub fn open_in<P: AsRef<Path>>(dir: P, name: &str) -> Result<Self> {
        let path = dir.as_ref().join(name);
        if !path.is_file() {
            return Err(Error::UnknownSchema(path.display().to_string()));
        }
        let location = path
            .to_str()
            .ok_or_else(|| Error::Schema(format!("path is not UTF-8: {}", path.display())))?;

        let mut parser = SchemaParserContext::from_file(location);
        let context = SchemaValidationContext::from_parser(&mut parser)
            .map_err(|errors| Error::Schema(format!("{}: {}", name, join_messages(&errors))))?;

        tracing::debug!(schema = name, path = %path.display(), "Loaded schema");
        Ok(Schema {
            name: name.to_string(),
            context: RefCell::new(context),
        })
    }

    /// Resource name of the schema.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Validates serialized XML. Line numbers in the report refer to `xml`.
    pub fn validate_xml(&self, xml: &str) -> ValidationReport {
        let document = match Parser::default().parse_string(xml) {
            Ok(document) => document,
            Err(e) => {
                return ValidationReport::failed(format!("document is not well-formed: {:?}", e))
            }
        };

        let issues = match self.context.borrow_mut().validate_document(&document) {
            Ok(()) => Vec::new(),
            Err(errors) => errors.iter().map(ValidationIssue::from).collect(),
        };
        let report = ValidationReport { issues };
        tracing::debug!(
            schema = %self.name,
            issues = report.issues().len(),
            "Validated document"
        );
        report
    }
}

impl Validator for Schema {
    fn validate_report(&self, root: &Element) -> ValidationReport {
        // Unqualified names serialize into the KML namespace
        match print_to_string(root, &NamespaceRegistry::kml()) {
            Ok(xml) => self.validate_xml(&xml),
            Err(e) => ValidationReport::failed(format!("could not serialize document: {}", e)),
        }
    }
}

fn join_messages(errors: &[StructuredError]) -> String {
    errors
        .iter()
        .map(|e| ValidationIssue::from(e).to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::KmlFactory;
    use crate::node::QName;
    use pretty_assertions::assert_eq;

    fn open(name: &str) -> Schema {
        Schema::open(name).unwrap()
    }

    #[test]
    fn test_open_known_schemas() {
        assert_eq!(open("ogckml22.xsd").name(), "ogckml22.xsd");
        assert_eq!(open("kml22gx.xsd").name(), "kml22gx.xsd");
        assert!(matches!(
            Schema::open("kml21.xsd"),
            Err(Error::UnknownSchema(name)) if name == "kml21.xsd"
        ));
    }

    #[test]
    fn test_open_in_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            Schema::open_in(dir.path(), "ogckml22.xsd"),
            Err(Error::UnknownSchema(_))
        ));
    }

    #[test]
    fn test_open_in_broken_schema() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.xsd"), "<schema>").unwrap();
        assert!(matches!(
            Schema::open_in(dir.path(), "broken.xsd"),
            Err(Error::Schema(_))
        ));
    }

    #[test]
    fn test_empty_kml_is_valid() {
        let registry = NamespaceRegistry::kml();
        let f = KmlFactory::new(&registry).unwrap();
        let doc = f.kml.tag("kml").build().unwrap();

        for name in ["ogckml22.xsd", "kml22gx.xsd"] {
            assert!(open(name).validate(&doc));
        }
    }

    #[test]
    fn test_content_model_violations_rejected() {
        let registry = NamespaceRegistry::kml();
        let f = KmlFactory::new(&registry).unwrap();

        // Geometry may only appear inside a Placemark
        let misplaced = f
            .kml
            .tag("kml")
            .child(
                f.kml
                    .tag("Document")
                    .child(f.kml.tag("Point").child(f.kml.tag("coordinates").text("1,1"))),
            )
            .build()
            .unwrap();
        assert!(!open("kml22gx.xsd").validate(&misplaced));

        // Every name is declared, but the nesting is inside out
        let inverted = f
            .kml
            .tag("kml")
            .child(f.kml.tag("coordinates").text("1,1"))
            .child(
                f.kml
                    .tag("Point")
                    .child(f.kml.tag("Document").child(f.kml.tag("kml"))),
            )
            .build()
            .unwrap();
        assert!(!open("ogckml22.xsd").validate(&inverted));

        // Feature children out of sequence order
        let reordered = f
            .kml
            .tag("kml")
            .child(
                f.kml
                    .tag("Placemark")
                    .child(f.kml.tag("Point").child(f.kml.tag("coordinates").text("1,1")))
                    .child(f.kml.tag("name").text("late")),
            )
            .build()
            .unwrap();
        let report = open("kml22gx.xsd").validate_report(&reordered);
        assert!(!report.is_valid());
        assert!(report.issues()[0].message.contains("name"));
    }

    #[test]
    fn test_simple_type_violation_rejected() {
        let registry = NamespaceRegistry::kml();
        let f = KmlFactory::new(&registry).unwrap();
        let doc = f
            .kml
            .tag("kml")
            .child(
                f.kml
                    .tag("Placemark")
                    .child(f.kml.tag("visibility").text("maybe")),
            )
            .build()
            .unwrap();

        assert!(!open("ogckml22.xsd").validate(&doc));
    }

    #[test]
    fn test_gx_requires_extension_schema() {
        let registry = NamespaceRegistry::kml();
        let f = KmlFactory::new(&registry).unwrap();
        let doc = f
            .kml
            .tag("kml")
            .child(f.gx.tag("Tour").child(f.gx.tag("Playlist")))
            .build()
            .unwrap();

        let report = open("ogckml22.xsd").validate_report(&doc);
        assert!(!report.is_valid());
        assert!(report.issues()[0].message.contains("Tour"));
        assert!(open("kml22gx.xsd").validate(&doc));
    }

    #[test]
    fn test_atom_allowed_by_both_schemas() {
        let registry = NamespaceRegistry::kml();
        let f = KmlFactory::new(&registry).unwrap();
        let doc = f
            .kml
            .tag("kml")
            .child(
                f.kml
                    .tag("Document")
                    .child(f.atom.tag("author").child(f.atom.tag("name").text("J. K. Rowling")))
                    .child(f.atom.tag("link").attr("href", "http://www.harrypotter.com")),
            )
            .build()
            .unwrap();

        assert!(open("ogckml22.xsd").validate(&doc));
        assert!(open("kml22gx.xsd").validate(&doc));
    }

    #[test]
    fn test_undeclared_names_reported() {
        let registry = NamespaceRegistry::kml();
        let f = KmlFactory::new(&registry).unwrap();
        let doc = f
            .kml
            .tag("kml")
            .child(f.kml.tag("Placemark").attr("colour", "red"))
            .build()
            .unwrap();

        let report = open("kml22gx.xsd").validate_report(&doc);
        assert!(!report.is_valid());
        assert!(report.issues().iter().any(|i| i.message.contains("colour")));

        let doc = f
            .kml
            .tag("kml")
            .child(f.kml.tag("Placemark").child(f.kml.tag("Title")))
            .build()
            .unwrap();
        assert!(!open("kml22gx.xsd").validate(&doc));
    }

    #[test]
    fn test_foreign_namespace_rejected() {
        let mut doc = Element::new(QName::local("kml"));
        doc.push_child(Element::new(QName::new(
            Some("urn:oasis:names:tc:ciq:xsdschema:xAL:2.0"),
            "AddressDetails",
        )));

        assert!(!open("kml22gx.xsd").validate(&doc));
    }

    #[test]
    fn test_validate_xml_reports_lines() {
        let xml = "<kml xmlns=\"http://www.opengis.net/kml/2.2\">\n\
                   <Placemark>\n\
                   <bogus/>\n\
                   </Placemark>\n\
                   </kml>\n";

        let report = open("ogckml22.xsd").validate_xml(xml);
        assert_eq!(report.issues().len(), 1);
        assert_eq!(report.issues()[0].line, Some(3));
        assert!(report.issues()[0].to_string().starts_with("line 3: "));
    }

    #[test]
    fn test_validate_xml_not_well_formed() {
        let report = open("ogckml22.xsd").validate_xml("<kml");
        assert!(!report.is_valid());
    }

    #[test]
    fn test_issue_display() {
        let issue = ValidationIssue {
            line: Some(4),
            message: "Element 'Point': This element is not expected.".to_string(),
        };
        assert_eq!(
            issue.to_string(),
            "line 4: Element 'Point': This element is not expected."
        );
    }
}
