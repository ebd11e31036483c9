//! Namespace registry and prefix scoping.
//!
//! The [`NamespaceRegistry`] maps symbolic keys (`KML`, `ATOM`, `GX`) to
//! namespace URIs and serialization prefixes. Exactly one entry is the
//! default namespace; unqualified tag names belong to it.

use std::collections::HashMap;

use crate::constants::{
    ATOM_KEY, ATOM_NAMESPACE, ATOM_PREFIX, GX_KEY, GX_NAMESPACE, GX_PREFIX, KML_KEY,
    KML_NAMESPACE,
};
use crate::error::{Error, Result};
use crate::node::is_valid_ncname;

/// URI permanently bound to the `xml` prefix.
const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// One row of the namespace registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceEntry {
    key: String,
    uri: String,
    prefix: Option<String>,
}

impl NamespaceEntry {
    /// Creates an entry serialized with `prefix:`.
    pub fn prefixed(
        key: impl Into<String>,
        uri: impl Into<String>,
        prefix: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            uri: uri.into(),
            prefix: Some(prefix.into()),
        }
    }

    /// Creates the default (unprefixed) entry.
    pub fn default_namespace(key: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            uri: uri.into(),
            prefix: None,
        }
    }

    /// Symbolic key, also used as the factory alias in generated scripts.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Namespace URI.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Serialization prefix, `None` for the default namespace.
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// Returns true if this is the default namespace entry.
    pub fn is_default(&self) -> bool {
        self.prefix.is_none()
    }
}

/// Ordered table of the namespaces a document may use.
///
/// Entries are kept in the order their declarations appear on a
/// serialized root element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceRegistry {
    entries: Vec<NamespaceEntry>,
    default_index: usize,
}

impl Default for NamespaceRegistry {
    fn default() -> Self {
        Self::kml()
    }
}

impl NamespaceRegistry {
    /// Builds a registry from a custom table.
    ///
    /// Fails unless exactly one entry is the default and keys, URIs and
    /// prefixes are all unique.
    pub fn new(entries: Vec<NamespaceEntry>) -> Result<Self> {
        let defaults: Vec<usize> = entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.is_default())
            .map(|(i, _)| i)
            .collect();
        let default_index = match defaults.as_slice() {
            [index] => *index,
            [] => return Err(Error::InvalidRegistry("no default namespace".to_string())),
            _ => {
                return Err(Error::InvalidRegistry(format!(
                    "{} default namespaces",
                    defaults.len()
                )))
            }
        };

        for (i, entry) in entries.iter().enumerate() {
            if let Some(prefix) = entry.prefix() {
                if !is_valid_ncname(prefix)
                    || prefix.eq_ignore_ascii_case("xml")
                    || prefix == "xmlns"
                {
                    return Err(Error::InvalidRegistry(format!("bad prefix '{}'", prefix)));
                }
            }
            for other in &entries[i + 1..] {
                if other.key == entry.key {
                    return Err(Error::InvalidRegistry(format!("duplicate key '{}'", entry.key)));
                }
                if other.uri == entry.uri {
                    return Err(Error::InvalidRegistry(format!("duplicate URI '{}'", entry.uri)));
                }
                if other.prefix.is_some() && other.prefix == entry.prefix {
                    return Err(Error::InvalidRegistry(format!(
                        "duplicate prefix '{}'",
                        other.prefix().unwrap_or_default()
                    )));
                }
            }
        }

        Ok(Self {
            entries,
            default_index,
        })
    }

    /// The fixed KML table: `gx`, `atom`, then the default KML namespace.
    pub fn kml() -> Self {
        Self {
            entries: vec![
                NamespaceEntry::prefixed(GX_KEY, GX_NAMESPACE, GX_PREFIX),
                NamespaceEntry::prefixed(ATOM_KEY, ATOM_NAMESPACE, ATOM_PREFIX),
                NamespaceEntry::default_namespace(KML_KEY, KML_NAMESPACE),
            ],
            default_index: 2,
        }
    }

    /// All entries in declaration order.
    pub fn entries(&self) -> &[NamespaceEntry] {
        &self.entries
    }

    /// The default namespace entry.
    pub fn default_entry(&self) -> &NamespaceEntry {
        &self.entries[self.default_index]
    }

    /// Looks up an entry by symbolic key; `None` selects the default entry.
    pub fn get(&self, key: Option<&str>) -> Result<&NamespaceEntry> {
        match key {
            None => Ok(self.default_entry()),
            Some(key) => self
                .entries
                .iter()
                .find(|e| e.key == key)
                .ok_or_else(|| Error::UnknownNamespaceKey(key.to_string())),
        }
    }

    /// Finds the entry whose URI matches exactly.
    pub fn by_uri(&self, uri: &str) -> Option<&NamespaceEntry> {
        self.entries.iter().find(|e| e.uri == uri)
    }

    /// Entry for an element namespace, where `None` is the default namespace.
    pub fn entry_for(&self, namespace: Option<&str>) -> Option<&NamespaceEntry> {
        match namespace {
            None | Some("") => Some(self.default_entry()),
            Some(uri) => self.by_uri(uri),
        }
    }

    /// Resolves a namespace URI to its symbolic key.
    ///
    /// `None` and `""` resolve to the default key. A URI not in the table
    /// also falls back to the default key.
    pub fn resolve_namespace_key(&self, uri: Option<&str>) -> &str {
        match self.entry_for(uri) {
            Some(entry) => entry.key(),
            None => {
                tracing::warn!(
                    uri = uri.unwrap_or_default(),
                    fallback = self.default_entry().key(),
                    "Namespace not in registry, using default key"
                );
                self.default_entry().key()
            }
        }
    }
}

/// Tracks prefix bindings while parsing.
pub struct NamespaceContext {
    /// Stack of scopes, each containing prefix -> URI bindings.
    scopes: Vec<HashMap<String, String>>,
}

impl Default for NamespaceContext {
    fn default() -> Self {
        Self::new()
    }
}

impl NamespaceContext {
    /// Creates a new context with the `xml` prefix pre-bound.
    pub fn new() -> Self {
        let mut ctx = NamespaceContext {
            scopes: vec![HashMap::new()],
        };
        ctx.bind("xml", XML_NAMESPACE);
        ctx
    }

    /// Pushes a new scope for entering an element.
    pub fn push_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    /// Pops the current scope when leaving an element.
    pub fn pop_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    /// Binds a prefix to a URI in the current scope. `""` is the default namespace.
    pub fn bind(&mut self, prefix: &str, uri: &str) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(prefix.to_string(), uri.to_string());
        }
    }

    /// Resolves a prefix to its URI, searching from innermost scope.
    pub fn resolve(&self, prefix: &str) -> Option<&str> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(prefix))
            .map(String::as_str)
    }

    /// Returns the in-scope default namespace; `xmlns=""` undeclares it.
    pub fn default_namespace(&self) -> Option<&str> {
        self.resolve("").filter(|uri| !uri.is_empty())
    }

    /// Resolves the namespace of an element's qualified name.
    pub fn resolve_element(&self, qname: &str) -> Result<(Option<String>, String)> {
        match split_qname(qname) {
            (Some(prefix), local) => match self.resolve(prefix) {
                Some(uri) => Ok((Some(uri.to_string()), local.to_string())),
                None => Err(Error::Parse(format!("unbound prefix '{}' in <{}>", prefix, qname))),
            },
            (None, local) => Ok((self.default_namespace().map(str::to_string), local.to_string())),
        }
    }
}

/// Splits a qualified name into prefix and local name.
pub fn split_qname(qname: &str) -> (Option<&str>, &str) {
    match qname.split_once(':') {
        Some((prefix, local)) => (Some(prefix), local),
        None => (None, qname),
    }
}

/// Checks if an attribute name is a namespace declaration.
pub fn is_xmlns_attr(name: &str) -> bool {
    name == "xmlns" || name.starts_with("xmlns:")
}
