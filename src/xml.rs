use crate::Result;

/// Namespace of the `<xfa:data>` element inside an XFA `datasets` packet.
pub const XFA_DATA_NAMESPACE: &str = "http://www.xfa.org/schema/xfa-data/1.0/";

/// Prefix table for paths that address XFA elements, e.g. `"xfa:data/SFA289"`.
pub const XFA_NAMESPACES: &[(&str, &str)] = &[("xfa", XFA_DATA_NAMESPACE)];

// ── XmlElement ───────────────────────────────────────────────────────────────

/// An owned XML element.
///
/// Form records keep their document for their whole lifetime, so the tree
/// parsed by `roxmltree` (which borrows its input) is copied into this owned
/// shape once. Only what field lookup needs is kept: names, the leading text,
/// attributes and element children.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlElement {
    /// Namespace URI, if the element is qualified.
    pub namespace: Option<String>,

    /// Local tag name.
    pub name: String,

    /// Text before the first child element, with comments skipped.
    pub text: Option<String>,

    /// `(name, value)` pairs in document order.
    pub attributes: Vec<(String, String)>,

    /// Child elements in document order.
    pub children: Vec<XmlElement>,
}

impl XmlElement {
    /// Create an unqualified element with no content.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set the namespace URI (builder style).
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Set the text content (builder style).
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Append a child element (builder style).
    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.children.push(child);
        self
    }

    /// Parse a complete XML document and return its root element.
    ///
    /// A leading byte-order mark is ignored.
    pub fn parse(xml: &str) -> Result<Self> {
        let xml = xml.strip_prefix('\u{feff}').unwrap_or(xml);
        let document = roxmltree::Document::parse(xml)?;
        Ok(Self::from_node(document.root_element()))
    }

    fn from_node(node: roxmltree::Node<'_, '_>) -> Self {
        let tag = node.tag_name();
        Self {
            namespace: tag.namespace().map(str::to_owned),
            name: tag.name().to_owned(),
            text: leading_text(node),
            attributes: node
                .attributes()
                .map(|a| (a.name().to_owned(), a.value().to_owned()))
                .collect(),
            children: node
                .children()
                .filter(|n| n.is_element())
                .map(Self::from_node)
                .collect(),
        }
    }

    /// Returns the value of attribute `name`, if present.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    // ── Field lookup ──────────────────────────────────────────────────────────

    /// Returns the text of the first element matching `path`, or `""` when
    /// nothing matches or the match has no text.
    ///
    /// ```
    /// use insiderforms::XmlElement;
    ///
    /// let root = XmlElement::parse("<a><b><c>42</c></b></a>").unwrap();
    /// assert_eq!(root.get_text("b/c"), "42");
    /// assert_eq!(root.get_text("c"), "42");
    /// assert_eq!(root.get_text("b/missing"), "");
    /// ```
    pub fn get_text(&self, path: &str) -> &str {
        self.find(path)
            .and_then(|e| e.text.as_deref())
            .unwrap_or("")
    }

    /// [`find_ns`](Self::find_ns) without any namespace prefixes.
    pub fn find(&self, path: &str) -> Option<&XmlElement> {
        self.find_ns(path, &[])
    }

    /// Find the first element matching a slash-separated `path`.
    ///
    /// The first segment may match at any depth below `self` (but not `self`
    /// itself); each later segment must be a direct child of the previous one.
    /// Candidates are tried in document order.
    ///
    /// A segment written `prefix:name` matches the namespace that `prefix`
    /// maps to in `namespaces`; an unknown prefix matches nothing. A bare
    /// segment matches on local name alone, so it also matches namespaced
    /// elements, where strict namespace-aware matching would only accept
    /// un-namespaced ones.
    pub fn find_ns(&self, path: &str, namespaces: &[(&str, &str)]) -> Option<&XmlElement> {
        let mut steps = Vec::new();
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            match Step::parse(segment, namespaces) {
                Some(step) => steps.push(step),
                None => {
                    log::debug!("unknown namespace prefix in path '{path}'");
                    return None;
                }
            }
        }

        let (first, rest) = steps.split_first()?;
        self.descendants()
            .filter(|e| first.matches(e))
            .find_map(|e| e.follow(rest))
    }

    /// Walk `steps` along the child axis, depth-first in document order.
    fn follow(&self, steps: &[Step<'_>]) -> Option<&XmlElement> {
        match steps.split_first() {
            None => Some(self),
            Some((step, rest)) => self
                .children
                .iter()
                .filter(|c| step.matches(c))
                .find_map(|c| c.follow(rest)),
        }
    }

    /// Every element below `self`, in document order.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants {
            stack: self.children.iter().rev().collect(),
        }
    }
}

/// Pre-order iterator returned by [`XmlElement::descendants`].
pub struct Descendants<'a> {
    stack: Vec<&'a XmlElement>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a XmlElement;

    fn next(&mut self) -> Option<Self::Item> {
        let element = self.stack.pop()?;
        self.stack.extend(element.children.iter().rev());
        Some(element)
    }
}

/// Text before the first child element. Comments and processing
/// instructions are skipped, so text on either side of them is joined.
fn leading_text(node: roxmltree::Node<'_, '_>) -> Option<String> {
    let mut text: Option<String> = None;
    for child in node.children().take_while(|n| !n.is_element()) {
        if child.is_text() {
            if let Some(t) = child.text() {
                text.get_or_insert_with(String::new).push_str(t);
            }
        }
    }
    text
}

// ── Path steps ───────────────────────────────────────────────────────────────

struct Step<'a> {
    namespace: Option<&'a str>,
    name: &'a str,
}

impl<'a> Step<'a> {
    fn parse(segment: &'a str, namespaces: &[(&'a str, &'a str)]) -> Option<Self> {
        match segment.split_once(':') {
            Some((prefix, name)) => {
                let uri = namespaces
                    .iter()
                    .find(|(p, _)| *p == prefix)
                    .map(|(_, uri)| *uri)?;
                Some(Self {
                    namespace: Some(uri),
                    name,
                })
            }
            None => Some(Self {
                namespace: None,
                name: segment,
            }),
        }
    }

    fn matches(&self, element: &XmlElement) -> bool {
        if element.name != self.name {
            return false;
        }
        match self.namespace {
            Some(uri) => element.namespace.as_deref() == Some(uri),
            None => true,
        }
    }
}
