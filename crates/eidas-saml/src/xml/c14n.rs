//! Exclusive XML canonicalization (without comments).
//!
//! Implements `http://www.w3.org/2001/10/xml-exc-c14n#` over the element
//! tree. A namespace declaration is emitted on an element only when its
//! prefix is visibly utilized there (element or attribute name) or listed in
//! the `InclusiveNamespaces` prefix list, and the nearest rendered ancestor
//! does not already bind it to the same URI.

use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};

use super::{XmlAttribute, XmlElement, XmlNode};

/// Canonicalizes an element subtree.
#[must_use]
pub fn canonicalize(element: &XmlElement) -> String {
    canonicalize_with(element, &[])
}

/// Canonicalizes an element subtree with an `InclusiveNamespaces` prefix list.
///
/// The token `#default` stands for the default namespace.
#[must_use]
pub fn canonicalize_with(element: &XmlElement, inclusive_prefixes: &[String]) -> String {
    let mut out = String::new();
    render(element, &BTreeMap::new(), inclusive_prefixes, &mut out);
    out
}

fn render(
    element: &XmlElement,
    rendered: &BTreeMap<String, String>,
    inclusive_prefixes: &[String],
    out: &mut String,
) {
    let in_scope = element.in_scope();

    let mut utilized: BTreeSet<&str> = BTreeSet::new();
    utilized.insert(element.prefix().unwrap_or(""));
    for attr in element.attributes() {
        if let Some(prefix) = attr.prefix.as_deref() {
            utilized.insert(prefix);
        }
    }
    for prefix in inclusive_prefixes {
        let prefix = if prefix == "#default" { "" } else { prefix.as_str() };
        if in_scope.contains_key(prefix) {
            utilized.insert(prefix);
        }
    }

    let mut emitted: BTreeMap<&str, &str> = BTreeMap::new();
    for prefix in utilized {
        if prefix == "xml" {
            continue;
        }
        let uri = in_scope.get(prefix).map_or("", String::as_str);
        let current = rendered.get(prefix).map_or("", String::as_str);
        if uri != current {
            emitted.insert(prefix, uri);
        }
    }

    let qname = element.qname();
    out.push('<');
    out.push_str(&qname);
    for (prefix, uri) in &emitted {
        if prefix.is_empty() {
            out.push_str(" xmlns=\"");
        } else {
            out.push_str(" xmlns:");
            out.push_str(prefix);
            out.push_str("=\"");
        }
        escape_attribute(uri, out);
        out.push('"');
    }

    let mut attributes: Vec<&XmlAttribute> = element.attributes().iter().collect();
    attributes.sort_by(|a, b| {
        let key_a = (a.namespace.as_deref().unwrap_or(""), a.local_name.as_str());
        let key_b = (b.namespace.as_deref().unwrap_or(""), b.local_name.as_str());
        key_a.cmp(&key_b)
    });
    for attr in attributes {
        out.push(' ');
        out.push_str(&attr.qname());
        out.push_str("=\"");
        escape_attribute(&attr.value, out);
        out.push('"');
    }
    out.push('>');

    let scope: Cow<'_, BTreeMap<String, String>> = if emitted.is_empty() {
        Cow::Borrowed(rendered)
    } else {
        let mut next = rendered.clone();
        for (prefix, uri) in &emitted {
            next.insert((*prefix).to_string(), (*uri).to_string());
        }
        Cow::Owned(next)
    };

    for child in element.children() {
        match child {
            XmlNode::Element(el) => render(el, &scope, inclusive_prefixes, out),
            XmlNode::Text(text) => escape_text(text, out),
        }
    }

    out.push_str("</");
    out.push_str(&qname);
    out.push('>');
}

fn escape_text(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\r' => out.push_str("&#xD;"),
            _ => out.push(c),
        }
    }
}

pub(super) fn escape_attribute(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '"' => out.push_str("&quot;"),
            '\t' => out.push_str("&#x9;"),
            '\n' => out.push_str("&#xA;"),
            '\r' => out.push_str("&#xD;"),
            _ => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::XmlParserConfig;
    use crate::xml::XmlDocument;

    fn root(xml: &str) -> XmlElement {
        XmlDocument::parse(xml, &XmlParserConfig::default())
            .unwrap()
            .into_root()
    }

    #[test]
    fn drops_unused_namespaces_and_sorts_attributes() {
        let el = root(r#"<a xmlns:unused="urn:u" xmlns:p="urn:p"><p:b z="1" a="2"/></a>"#);
        assert_eq!(canonicalize(&el), r#"<a><p:b xmlns:p="urn:p" a="2" z="1"></p:b></a>"#);
    }

    #[test]
    fn subtree_carries_ancestor_namespaces() {
        let el = root(r#"<r xmlns:s="urn:s"><s:x><s:y/></s:x></r>"#);
        let x = el.child_elements().next().unwrap();
        assert_eq!(canonicalize(x), r#"<s:x xmlns:s="urn:s"><s:y></s:y></s:x>"#);
    }

    #[test]
    fn default_namespace_undeclaration() {
        let el = root(r#"<a xmlns="urn:d"><b xmlns=""/></a>"#);
        assert_eq!(canonicalize(&el), r#"<a xmlns="urn:d"><b xmlns=""></b></a>"#);

        let b = el.child_elements().next().unwrap();
        assert_eq!(canonicalize(b), "<b></b>");
    }

    #[test]
    fn escapes_text_and_attributes() {
        let el = root("<a t=\"&lt;&quot;&#9;&gt;\">&amp;&gt;&#13;\"</a>");
        assert_eq!(canonicalize(&el), "<a t=\"&lt;&quot;&#x9;>\">&amp;&gt;&#xD;\"</a>");
    }

    #[test]
    fn literal_whitespace_in_attributes_becomes_spaces() {
        let el = root("<a t=\"x\ny\tz\" u=\"1\r\n2\"/>");
        assert_eq!(canonicalize(&el), r#"<a t="x y z" u="1 2"></a>"#);

        let el = root(r#"<a t="x&#10;y&#9;z&#13;"/>"#);
        assert_eq!(canonicalize(&el), r#"<a t="x&#xA;y&#x9;z&#xD;"></a>"#);
    }

    #[test]
    fn line_endings_are_normalized_before_references() {
        assert_eq!(canonicalize(&root("<a>x\ry</a>")), "<a>x\ny</a>");
        assert_eq!(canonicalize(&root("<a>x\r\ny</a>")), "<a>x\ny</a>");
        assert_eq!(canonicalize(&root("<a>x&#13;\ny</a>")), "<a>x&#xD;\ny</a>");
        assert_eq!(canonicalize(&root("<a><![CDATA[x\r\ny\r]]></a>")), "<a>x\ny\n</a>");
    }

    #[test]
    fn inclusive_prefix_list() {
        let el = root(r#"<r xmlns:xs="urn:xs" xmlns:s="urn:s"><s:x/></r>"#);
        let x = el.child_elements().next().unwrap();
        assert_eq!(
            canonicalize_with(x, &["xs".to_string(), "missing".to_string()]),
            r#"<s:x xmlns:s="urn:s" xmlns:xs="urn:xs"></s:x>"#
        );
    }

    #[test]
    fn attributes_sorted_by_namespace_uri_then_name() {
        let el = root(r#"<a xmlns:b="urn:b" xmlns:c="urn:a" b:x="1" c:y="2" z="3"/>"#);
        assert_eq!(
            canonicalize(&el),
            r#"<a xmlns:b="urn:b" xmlns:c="urn:a" z="3" c:y="2" b:x="1"></a>"#
        );
    }

    #[test]
    fn drops_comments_and_keeps_whitespace() {
        let el = root("<a>\n  <!-- note --><b/>\n</a>");
        assert_eq!(canonicalize(&el), "<a>\n  <b></b>\n</a>");
    }

    #[test]
    fn canonical_form_is_stable() {
        let xml = r#"<s:A xmlns:s="urn:s" xmlns:x="urn:x" ID="_1"><s:B x:t="v">t</s:B><C xmlns="urn:c"><D/></C></s:A>"#;
        let once = canonicalize(&root(xml));
        let twice = canonicalize(&root(&once));
        assert_eq!(once, twice);
    }
}
