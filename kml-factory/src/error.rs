//! Error types for the KML factory.

use thiserror::Error;

/// Result type alias for KML factory operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building, parsing or scripting KML documents.
#[derive(Error, Debug)]
pub enum Error {
    /// Symbolic namespace key not present in the registry.
    #[error("Unknown namespace key: {0}")]
    UnknownNamespaceKey(String),

    /// Registry table violates its invariants.
    #[error("Invalid namespace registry: {0}")]
    InvalidRegistry(String),

    /// Tag or attribute name is not a valid XML name.
    #[error("Invalid XML name: '{0}'")]
    InvalidName(String),

    /// XML parsing error.
    #[error("XML parse error: {0}")]
    Parse(String),

    /// Construction script could not be read.
    #[error("Script error on line {line}: {message}")]
    Script { line: usize, message: String },

    /// No bundled schema with the requested resource name.
    #[error("Unknown schema: {0}")]
    UnknownSchema(String),

    /// Schema file could not be compiled.
    #[error("Schema error: {0}")]
    Schema(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// XML error from quick-xml.
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_error_display() {
        let err = Error::Script {
            line: 7,
            message: "unknown alias 'FOO'".to_string(),
        };
        assert_eq!(err.to_string(), "Script error on line 7: unknown alias 'FOO'");
    }

    #[test]
    fn test_invalid_name_display() {
        let err = Error::InvalidName("1st".to_string());
        assert_eq!(err.to_string(), "Invalid XML name: '1st'");
    }
}
