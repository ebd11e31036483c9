//! Node structures for XML tree representation.
//!
//! A document is a tree of owned [`Element`]s. Each element carries a
//! namespace-qualified [`QName`], ordered attributes, optional text and
//! ordered children.

mod element;
mod qname;

pub use element::Element;
pub use qname::{is_valid_ncname, QName};
