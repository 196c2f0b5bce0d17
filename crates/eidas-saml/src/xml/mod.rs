//! Minimal namespace-aware XML tree.
//!
//! Responses are parsed once into an owned element tree. The tree keeps
//! everything exclusive canonicalization needs: element and attribute
//! qualified names, resolved namespace URIs, the in-scope namespace bindings
//! of every element, and text exactly as received. Comments and processing
//! instructions are dropped. Document type declarations are rejected.

mod c14n;

pub use c14n::{canonicalize, canonicalize_with};

use std::borrow::Cow;
use std::collections::BTreeMap;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::config::XmlParserConfig;
use crate::error::{SamlError, SamlResult};

const XMLNS_NS: &str = "http://www.w3.org/2000/xmlns/";
const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

/// A parsed XML document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlDocument {
    root: XmlElement,
}

impl XmlDocument {
    /// Parses a document, enforcing the given limits.
    pub fn parse(xml: &str, config: &XmlParserConfig) -> SamlResult<Self> {
        if xml.len() > config.max_document_size {
            return Err(SamlError::Decode(format!(
                "document exceeds {} bytes",
                config.max_document_size
            )));
        }

        let mut reader = Reader::from_str(xml);
        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;

        loop {
            match reader.read_event()? {
                Event::Start(start) => {
                    if stack.len() >= config.max_depth {
                        return Err(SamlError::Decode(format!(
                            "element nesting exceeds {} levels",
                            config.max_depth
                        )));
                    }
                    ensure_single_root(&root, &stack)?;
                    let parent_scope = stack.last().map(|p| &p.in_scope);
                    stack.push(XmlElement::from_start(&start, parent_scope)?);
                }
                Event::Empty(start) => {
                    ensure_single_root(&root, &stack)?;
                    let parent_scope = stack.last().map(|p| &p.in_scope);
                    let element = XmlElement::from_start(&start, parent_scope)?;
                    attach(element, &mut stack, &mut root);
                }
                Event::End(_) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| SamlError::Decode("unbalanced end tag".to_string()))?;
                    attach(element, &mut stack, &mut root);
                }
                Event::Text(text) => {
                    let raw = normalize_line_endings(content(&text)?);
                    push_text(&mut stack, &unescape(&raw)?)?;
                }
                Event::CData(cdata) => {
                    let raw = normalize_line_endings(content(&cdata)?);
                    push_text(&mut stack, &raw)?;
                }
                Event::DocType(_) => {
                    return Err(SamlError::Decode(
                        "document type declarations are not allowed".to_string(),
                    ));
                }
                Event::Decl(_) | Event::Comment(_) | Event::PI(_) => {}
                Event::Eof => break,
            }
        }

        if !stack.is_empty() {
            return Err(SamlError::Decode("unexpected end of document".to_string()));
        }
        let root = root.ok_or_else(|| SamlError::Decode("document has no root element".to_string()))?;
        Ok(Self { root })
    }

    /// Returns the document element.
    #[must_use]
    pub const fn root(&self) -> &XmlElement {
        &self.root
    }

    /// Consumes the document and returns its root element.
    #[must_use]
    pub fn into_root(self) -> XmlElement {
        self.root
    }
}

fn ensure_single_root(root: &Option<XmlElement>, stack: &[XmlElement]) -> SamlResult<()> {
    if root.is_some() && stack.is_empty() {
        return Err(SamlError::Decode("multiple root elements".to_string()));
    }
    Ok(())
}

fn attach(element: XmlElement, stack: &mut [XmlElement], root: &mut Option<XmlElement>) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(XmlNode::Element(element)),
        None => *root = Some(element),
    }
}

fn push_text(stack: &mut [XmlElement], text: &str) -> SamlResult<()> {
    match stack.last_mut() {
        Some(parent) => {
            if let Some(XmlNode::Text(existing)) = parent.children.last_mut() {
                existing.push_str(text);
            } else {
                parent.children.push(XmlNode::Text(text.to_string()));
            }
            Ok(())
        }
        None if text.trim().is_empty() => Ok(()),
        None => Err(SamlError::Decode("text outside of the root element".to_string())),
    }
}

/// A node in the element tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNode {
    /// Child element.
    Element(XmlElement),
    /// Character data, unescaped.
    Text(String),
}

/// A non-namespace-declaration attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlAttribute {
    /// Prefix as written, if any.
    pub prefix: Option<String>,
    /// Local name.
    pub local_name: String,
    /// Namespace URI (unprefixed attributes have none).
    pub namespace: Option<String>,
    /// Unescaped value.
    pub value: String,
}

impl XmlAttribute {
    /// Returns the attribute name as written.
    #[must_use]
    pub fn qname(&self) -> String {
        qualified(self.prefix.as_deref(), &self.local_name)
    }
}

/// An element with its resolved names and in-scope namespaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement {
    prefix: Option<String>,
    local_name: String,
    namespace: Option<String>,
    attributes: Vec<XmlAttribute>,
    /// Prefix ("" for the default namespace) to URI. An empty URI undeclares
    /// the default namespace.
    in_scope: BTreeMap<String, String>,
    children: Vec<XmlNode>,
}

impl XmlElement {
    fn from_start(
        start: &BytesStart<'_>,
        parent_scope: Option<&BTreeMap<String, String>>,
    ) -> SamlResult<Self> {
        let mut in_scope = parent_scope.cloned().unwrap_or_default();
        let mut raw_attributes = Vec::new();

        for attr in start.attributes() {
            let attr = attr.map_err(|e| SamlError::Decode(format!("invalid attribute: {e}")))?;
            let key = utf8(attr.key.as_ref())?.to_string();
            let raw = normalize_attribute_value(content(&attr.value)?);
            let value = unescape(&raw)?;

            if key == "xmlns" {
                in_scope.insert(String::new(), value);
            } else if let Some(prefix) = key.strip_prefix("xmlns:") {
                if value.is_empty() {
                    return Err(SamlError::Decode(format!(
                        "prefix '{prefix}' cannot be undeclared"
                    )));
                }
                in_scope.insert(prefix.to_string(), value);
            } else {
                raw_attributes.push((key, value));
            }
        }

        let qname = start.name();
        let (prefix, local_name) = split_qname(utf8(qname.as_ref())?);
        let namespace = match prefix {
            Some(p) => Some(resolve_prefix(&in_scope, p)?),
            None => in_scope.get("").filter(|uri| !uri.is_empty()).cloned(),
        };

        let mut attributes = Vec::with_capacity(raw_attributes.len());
        for (key, value) in raw_attributes {
            let (attr_prefix, attr_local) = split_qname(&key);
            let attr_namespace = match attr_prefix {
                Some(p) => Some(resolve_prefix(&in_scope, p)?),
                None => None,
            };
            if attributes.iter().any(|a: &XmlAttribute| {
                a.local_name == attr_local && a.namespace == attr_namespace
            }) {
                return Err(SamlError::Decode(format!("duplicate attribute '{key}'")));
            }
            attributes.push(XmlAttribute {
                prefix: attr_prefix.map(String::from),
                local_name: attr_local.to_string(),
                namespace: attr_namespace,
                value,
            });
        }

        Ok(Self {
            prefix: prefix.map(String::from),
            local_name: local_name.to_string(),
            namespace,
            attributes,
            in_scope,
            children: Vec::new(),
        })
    }

    /// Returns the local name.
    #[must_use]
    pub fn local_name(&self) -> &str {
        &self.local_name
    }

    /// Returns the prefix as written.
    #[must_use]
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// Returns the namespace URI.
    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Returns the element name as written.
    #[must_use]
    pub fn qname(&self) -> String {
        qualified(self.prefix.as_deref(), &self.local_name)
    }

    /// Returns true if this element has the given namespace and local name.
    #[must_use]
    pub fn is(&self, namespace: &str, local_name: &str) -> bool {
        self.local_name == local_name && self.namespace.as_deref() == Some(namespace)
    }

    /// Returns the attributes (namespace declarations excluded).
    #[must_use]
    pub fn attributes(&self) -> &[XmlAttribute] {
        &self.attributes
    }

    /// Returns the value of an unqualified attribute.
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.namespace.is_none() && a.local_name == name)
            .map(|a| a.value.as_str())
    }

    /// Returns the value of a namespace-qualified attribute.
    #[must_use]
    pub fn attr_ns(&self, namespace: &str, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.namespace.as_deref() == Some(namespace) && a.local_name == name)
            .map(|a| a.value.as_str())
    }

    /// Returns the namespace bound to a prefix ("" for the default namespace).
    #[must_use]
    pub fn lookup_namespace(&self, prefix: &str) -> Option<&str> {
        self.in_scope
            .get(prefix)
            .map(String::as_str)
            .filter(|uri| !uri.is_empty())
    }

    pub(crate) const fn in_scope(&self) -> &BTreeMap<String, String> {
        &self.in_scope
    }

    /// Returns all child nodes.
    #[must_use]
    pub fn children(&self) -> &[XmlNode] {
        &self.children
    }

    /// Iterates over child elements.
    pub fn child_elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|node| match node {
            XmlNode::Element(el) => Some(el),
            XmlNode::Text(_) => None,
        })
    }

    /// Iterates over child elements with the given name.
    pub fn children_named<'s, 'n>(
        &'s self,
        namespace: &'n str,
        local_name: &'n str,
    ) -> impl Iterator<Item = &'s XmlElement> + 'n
    where
        's: 'n,
    {
        self.child_elements()
            .filter(move |el| el.is(namespace, local_name))
    }

    /// Returns the first child element with the given name.
    #[must_use]
    pub fn child(&self, namespace: &str, local_name: &str) -> Option<&XmlElement> {
        self.children_named(namespace, local_name).next()
    }

    /// Returns the concatenated text of the direct text children.
    #[must_use]
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|node| match node {
                XmlNode::Text(t) => Some(t.as_str()),
                XmlNode::Element(_) => None,
            })
            .collect()
    }

    /// Returns the trimmed text content.
    #[must_use]
    pub fn trimmed_text(&self) -> String {
        self.text().trim().to_string()
    }

    /// Visits this element and all descendants in document order.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a XmlElement)) {
        visit(self);
        for child in self.child_elements() {
            child.walk(visit);
        }
    }

    /// Returns a copy of this element without the child element at `index`
    /// (counted over element children only).
    #[must_use]
    pub fn without_child_element(&self, index: usize) -> Self {
        let mut copy = self.clone();
        let mut seen = 0;
        copy.children.retain(|node| match node {
            XmlNode::Element(_) => {
                let keep = seen != index;
                seen += 1;
                keep
            }
            XmlNode::Text(_) => true,
        });
        copy
    }

    /// Inserts a child element at the given element position.
    #[cfg(any(test, feature = "fixtures"))]
    pub(crate) fn insert_child_element(&mut self, index: usize, element: Self) {
        let mut seen = 0;
        let position = self
            .children
            .iter()
            .position(|node| {
                if matches!(node, XmlNode::Element(_)) {
                    if seen == index {
                        return true;
                    }
                    seen += 1;
                }
                false
            })
            .unwrap_or(self.children.len());
        self.children.insert(position, XmlNode::Element(element));
    }
}

/// Escapes a value for use inside an attribute or as character data.
#[cfg(any(test, feature = "fixtures"))]
pub(crate) fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    c14n::escape_attribute(value, &mut out);
    out
}

fn utf8(bytes: &[u8]) -> SamlResult<&str> {
    std::str::from_utf8(bytes).map_err(|e| SamlError::Decode(format!("invalid UTF-8 in name: {e}")))
}

fn content(bytes: &[u8]) -> SamlResult<&str> {
    std::str::from_utf8(bytes)
        .map_err(|e| SamlError::Decode(format!("invalid UTF-8 in content: {e}")))
}

/// Folds `\r\n` and a lone `\r` into `\n`. Runs on the raw markup, so a
/// carriage return written as `&#13;` survives.
fn normalize_line_endings(raw: &str) -> Cow<'_, str> {
    if raw.contains('\r') {
        Cow::Owned(raw.replace("\r\n", "\n").replace('\r', "\n"))
    } else {
        Cow::Borrowed(raw)
    }
}

/// Attribute value normalization without a DTD: each literal whitespace
/// character becomes a space, character references keep their value.
fn normalize_attribute_value(raw: &str) -> String {
    normalize_line_endings(raw)
        .chars()
        .map(|c| if matches!(c, '\t' | '\n') { ' ' } else { c })
        .collect()
}

fn unescape(raw: &str) -> SamlResult<String> {
    quick_xml::escape::unescape(raw)
        .map(Cow::into_owned)
        .map_err(|e| SamlError::Decode(format!("invalid reference: {e}")))
}

fn split_qname(name: &str) -> (Option<&str>, &str) {
    match name.split_once(':') {
        Some((prefix, local)) => (Some(prefix), local),
        None => (None, name),
    }
}

fn resolve_prefix(in_scope: &BTreeMap<String, String>, prefix: &str) -> SamlResult<String> {
    match prefix {
        "xml" => Ok(XML_NS.to_string()),
        "xmlns" => Ok(XMLNS_NS.to_string()),
        _ => in_scope
            .get(prefix)
            .cloned()
            .ok_or_else(|| SamlError::Decode(format!("unbound namespace prefix '{prefix}'"))),
    }
}

fn qualified(prefix: Option<&str>, local_name: &str) -> String {
    match prefix {
        Some(p) => format!("{p}:{local_name}"),
        None => local_name.to_string(),
    }
}
