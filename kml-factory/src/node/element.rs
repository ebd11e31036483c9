//! The owned element tree.

use super::QName;

/// An XML element node.
///
/// Children are owned: appending an element to a parent moves it, so every
/// element has at most one parent.
#[derive(Debug, Clone)]
pub struct Element {
    name: QName,
    /// Attributes in insertion order.
    attributes: Vec<(String, String)>,
    text: Option<String>,
    children: Vec<Element>,
}

impl Element {
    /// Creates an empty element.
    pub fn new(name: QName) -> Self {
        Element {
            name,
            attributes: Vec::new(),
            text: None,
            children: Vec::new(),
        }
    }

    /// Returns the qualified name.
    pub fn name(&self) -> &QName {
        &self.name
    }

    /// Returns the tag name without namespace.
    pub fn local_name(&self) -> &str {
        self.name.local_name()
    }

    /// Returns the namespace URI, `None` for the default namespace.
    pub fn namespace(&self) -> Option<&str> {
        self.name.namespace()
    }

    /// Returns the attributes in insertion order.
    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    /// Returns the value of an attribute.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Sets an attribute. An existing attribute keeps its position.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((name, value)),
        }
    }

    /// Removes an attribute, returning its value.
    pub fn remove_attribute(&mut self, name: &str) -> Option<String> {
        let pos = self.attributes.iter().position(|(k, _)| k == name)?;
        Some(self.attributes.remove(pos).1)
    }

    /// Returns the direct text content.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Replaces the text content.
    pub fn set_text(&mut self, text: Option<String>) {
        self.text = text;
    }

    /// Appends to the text content.
    pub fn append_text(&mut self, text: &str) {
        match &mut self.text {
            Some(existing) => existing.push_str(text),
            None => self.text = Some(text.to_string()),
        }
    }

    /// Returns the children in document order.
    pub fn children(&self) -> &[Element] {
        &self.children
    }

    /// Returns a mutable reference to the children.
    pub fn children_mut(&mut self) -> &mut Vec<Element> {
        &mut self.children
    }

    /// Returns the number of children.
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Returns true if the element has child elements.
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Appends a child, taking ownership of it.
    pub fn push_child(&mut self, child: Element) {
        self.children.push(child);
    }

    /// Detaches and returns the child at `index`.
    pub fn remove_child(&mut self, index: usize) -> Option<Element> {
        if index < self.children.len() {
            Some(self.children.remove(index))
        } else {
            None
        }
    }

    /// Returns the first child with the given local name.
    pub fn find_child(&self, local_name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.local_name() == local_name)
    }
}

impl PartialEq for Element {
    /// Attribute order is ignored; everything else is compared in order.
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.text == other.text
            && self.attributes.len() == other.attributes.len()
            && self
                .attributes
                .iter()
                .all(|(k, v)| other.attribute(k) == Some(v.as_str()))
            && self.children == other.children
    }
}

impl Eq for Element {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_attribute_replaces_in_place() {
        let mut link = Element::new(QName::local("link"));
        link.set_attribute("href", "a");
        link.set_attribute("rel", "b");
        link.set_attribute("href", "c");

        assert_eq!(
            link.attributes(),
            &[
                ("href".to_string(), "c".to_string()),
                ("rel".to_string(), "b".to_string())
            ]
        );
        assert_eq!(link.remove_attribute("href"), Some("c".to_string()));
        assert_eq!(link.attribute("href"), None);
    }

    #[test]
    fn test_append_text() {
        let mut name = Element::new(QName::local("name"));
        assert_eq!(name.text(), None);
        name.append_text("Kml");
        name.append_text("File");
        assert_eq!(name.text(), Some("KmlFile"));
    }

    #[test]
    fn test_equality_ignores_attribute_order() {
        let mut a = Element::new(QName::local("Data"));
        a.set_attribute("name", "x");
        a.set_attribute("id", "1");

        let mut b = Element::new(QName::local("Data"));
        b.set_attribute("id", "1");
        b.set_attribute("name", "x");

        assert_eq!(a, b);

        b.set_attribute("id", "2");
        assert_ne!(a, b);
    }

    #[test]
    fn test_equality_respects_child_order() {
        let mut a = Element::new(QName::local("Folder"));
        a.push_child(Element::new(QName::local("name")));
        a.push_child(Element::new(QName::local("open")));

        let mut b = Element::new(QName::local("Folder"));
        b.push_child(Element::new(QName::local("open")));
        b.push_child(Element::new(QName::local("name")));

        assert_ne!(a, b);
    }

    #[test]
    fn test_reparenting_moves_child() {
        let mut first = Element::new(QName::local("Folder"));
        first.push_child(Element::new(QName::local("Placemark")));

        let mut second = Element::new(QName::local("Document"));
        let moved = first.remove_child(0).unwrap();
        second.push_child(moved);

        assert_eq!(first.child_count(), 0);
        assert_eq!(second.child_count(), 1);
        assert!(second.find_child("Placemark").is_some());
        assert!(first.remove_child(0).is_none());
    }
}
