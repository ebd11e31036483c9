//! Namespace-bound element makers.
//!
//! An [`ElementMaker`] is bound to one entry of a [`NamespaceRegistry`] and
//! builds elements in that namespace. [`ElementMaker::make`] is the explicit
//! form of a `factory.tag(*children, **attrs)` call; [`ElementMaker::tag`]
//! returns an [`ElementBuilder`] for chained construction.
//!
//! ```
//! use kml_factory::{KmlFactory, NamespaceRegistry};
//!
//! let registry = NamespaceRegistry::kml();
//! let KmlFactory { kml, atom, .. } = KmlFactory::new(&registry).unwrap();
//!
//! let doc = kml
//!     .tag("kml")
//!     .child(
//!         kml.tag("Document")
//!             .child(atom.tag("link").attr("href", "http://www.harrypotter.com"))
//!             .child(kml.tag("name").text("Hogwarts")),
//!     )
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(doc.children()[0].child_count(), 2);
//! ```

use crate::constants::{ATOM_KEY, GX_KEY};
use crate::error::{Error, Result};
use crate::namespace::{NamespaceEntry, NamespaceRegistry};
use crate::node::{is_valid_ncname, Element, QName};

/// Empty positional argument list for [`ElementMaker::make`].
pub const NO_ARGS: [Arg; 0] = [];

/// Empty attribute list for [`ElementMaker::make`].
pub const NO_ATTRS: [(&str, &str); 0] = [];

/// A positional argument of an element-constructing call.
#[derive(Debug, Clone)]
pub enum Arg {
    /// Appended to the element's text content.
    Text(String),
    /// Appended as a child element.
    Element(Element),
    /// A child that is built when the parent is built.
    Builder(ElementBuilder),
}

impl From<&str> for Arg {
    fn from(text: &str) -> Self {
        Arg::Text(text.to_string())
    }
}

impl From<String> for Arg {
    fn from(text: String) -> Self {
        Arg::Text(text)
    }
}

impl From<&String> for Arg {
    fn from(text: &String) -> Self {
        Arg::Text(text.clone())
    }
}

impl From<Element> for Arg {
    fn from(element: Element) -> Self {
        Arg::Element(element)
    }
}

impl From<ElementBuilder> for Arg {
    fn from(builder: ElementBuilder) -> Self {
        Arg::Builder(builder)
    }
}

macro_rules! text_arg_from_display {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Arg {
                fn from(value: $t) -> Self {
                    Arg::Text(value.to_string())
                }
            }
        )*
    };
}

text_arg_from_display!(i8, i16, i32, i64, u8, u16, u32, u64, usize, f32, f64, bool, char);

/// Builds elements in a single namespace.
#[derive(Debug, Clone, Copy)]
pub struct ElementMaker<'r> {
    entry: &'r NamespaceEntry,
}

impl<'r> ElementMaker<'r> {
    /// Binds a maker to a registry key; `None` selects the default namespace.
    pub fn new(registry: &'r NamespaceRegistry, key: Option<&str>) -> Result<Self> {
        Ok(ElementMaker {
            entry: registry.get(key)?,
        })
    }

    /// The registry entry this maker is bound to.
    pub fn entry(&self) -> &'r NamespaceEntry {
        self.entry
    }

    /// The qualified name this maker gives to `tag`.
    pub fn qname(&self, tag: &str) -> QName {
        if self.entry.is_default() {
            QName::local(tag)
        } else {
            QName::new(Some(self.entry.uri()), tag)
        }
    }

    /// Builds one element.
    ///
    /// Text args are concatenated into the element text, element args become
    /// children in order, and each attr becomes an attribute.
    pub fn make<I, A, K, V>(&self, tag: &str, args: I, attrs: A) -> Result<Element>
    where
        I: IntoIterator,
        I::Item: Into<Arg>,
        A: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: ToString,
    {
        construct(self.qname(tag), args, attrs)
    }

    /// Starts a builder for `tag`.
    pub fn tag(&self, tag: &str) -> ElementBuilder {
        ElementBuilder {
            name: self.qname(tag),
            args: Vec::new(),
            attrs: Vec::new(),
        }
    }
}

/// Chained construction sugar over [`ElementMaker::make`].
#[derive(Debug, Clone)]
pub struct ElementBuilder {
    name: QName,
    args: Vec<Arg>,
    attrs: Vec<(String, String)>,
}

impl ElementBuilder {
    /// Appends text content.
    pub fn text(mut self, text: impl Into<Arg>) -> Self {
        self.args.push(text.into());
        self
    }

    /// Appends a child element or builder.
    pub fn child(mut self, child: impl Into<Arg>) -> Self {
        self.args.push(child.into());
        self
    }

    /// Appends any positional argument.
    pub fn arg(mut self, arg: impl Into<Arg>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Appends several positional arguments.
    pub fn args<I>(mut self, args: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Arg>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Adds an attribute.
    pub fn attr(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.attrs.push((name.into(), value.to_string()));
        self
    }

    /// Builds the element and any pending children.
    pub fn build(self) -> Result<Element> {
        construct(self.name, self.args, self.attrs)
    }
}

fn construct<I, A, K, V>(name: QName, args: I, attrs: A) -> Result<Element>
where
    I: IntoIterator,
    I::Item: Into<Arg>,
    A: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: ToString,
{
    if !is_valid_ncname(name.local_name()) {
        return Err(Error::InvalidName(name.local_name().to_string()));
    }

    let mut element = Element::new(name);
    for arg in args {
        match arg.into() {
            Arg::Text(text) => element.append_text(&text),
            Arg::Element(child) => element.push_child(child),
            Arg::Builder(builder) => element.push_child(builder.build()?),
        }
    }
    for (name, value) in attrs {
        let name = name.as_ref();
        if !is_valid_attribute_name(name) {
            return Err(Error::InvalidName(name.to_string()));
        }
        element.set_attribute(name, value.to_string());
    }

    tracing::debug!(
        tag = %element.name(),
        children = element.child_count(),
        attributes = element.attributes().len(),
        "Built element"
    );
    Ok(element)
}

/// Unqualified NCNames, plus names in the predeclared `xml:` namespace
/// such as `xml:lang`.
fn is_valid_attribute_name(name: &str) -> bool {
    match name.strip_prefix("xml:") {
        Some(local) => is_valid_ncname(local),
        None => is_valid_ncname(name) && name != "xmlns",
    }
}

/// The three pre-bound makers of a KML registry.
#[derive(Debug, Clone, Copy)]
pub struct KmlFactory<'r> {
    /// Default (OGC KML) namespace, serialized without a prefix.
    pub kml: ElementMaker<'r>,
    /// Atom namespace, serialized as `atom:`.
    pub atom: ElementMaker<'r>,
    /// Google extensions namespace, serialized as `gx:`.
    pub gx: ElementMaker<'r>,
}

impl<'r> KmlFactory<'r> {
    /// Binds the KML, ATOM and GX makers of `registry`.
    ///
    /// Fails if the registry has no `ATOM` or `GX` key.
    pub fn new(registry: &'r NamespaceRegistry) -> Result<Self> {
        Ok(KmlFactory {
            kml: ElementMaker::new(registry, None)?,
            atom: ElementMaker::new(registry, Some(ATOM_KEY))?,
            gx: ElementMaker::new(registry, Some(GX_KEY))?,
        })
    }
}
