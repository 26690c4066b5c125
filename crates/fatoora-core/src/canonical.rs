//! Exclusive XML canonicalization (without comments).
//!
//! This module implements the subset of Exclusive XML Canonicalization 1.0
//! needed for invoice hashing:
//! - No XML declaration; comments and processing instructions are dropped
//! - Whitespace-only text nodes are dropped
//! - A namespace declaration is emitted only on an element that visibly uses
//!   the prefix, and only if no output ancestor already declared it
//! - Namespace declarations are sorted by prefix (default first), attributes
//!   by namespace URI then local name
//! - Empty elements are written as start/end tag pairs
//!
//! The canonical form is the only thing ever hashed, so two documents that
//! differ only in formatting, attribute order or declaration placement hash
//! identically.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::CoreError;
use crate::xml::{is_xml_whitespace, Element, Node};

/// The namespace bound to the reserved `xml` prefix.
const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

type Bindings = BTreeMap<String, String>;

/// Canonicalize an in-memory tree.
pub fn canonicalize(root: &Element) -> Result<Vec<u8>, CoreError> {
    let mut out = Vec::new();
    render_element(root, &Bindings::new(), &Bindings::new(), &mut out)?;
    Ok(out)
}

/// Parse serialized XML and canonicalize it.
pub fn canonicalize_bytes(xml: &[u8]) -> Result<Vec<u8>, CoreError> {
    canonicalize(&Element::parse(xml)?)
}

fn split_qname(name: &str) -> (&str, &str) {
    match name.split_once(':') {
        Some((prefix, local)) => (prefix, local),
        None => ("", name),
    }
}

fn resolve<'a>(scope: &'a Bindings, prefix: &str) -> Result<&'a str, CoreError> {
    if prefix == "xml" {
        return Ok(XML_NAMESPACE);
    }
    match scope.get(prefix) {
        Some(uri) if !uri.is_empty() => Ok(uri),
        _ => Err(CoreError::MalformedXml(format!(
            "namespace prefix {prefix:?} is not bound"
        ))),
    }
}

/// Render one element.
///
/// `inherited` holds the input namespace bindings in scope at the parent;
/// `rendered` holds the declarations already emitted by output ancestors.
fn render_element(
    el: &Element,
    inherited: &Bindings,
    rendered: &Bindings,
    out: &mut Vec<u8>,
) -> Result<(), CoreError> {
    let mut scope = inherited.clone();
    let mut plain: Vec<(&str, &str)> = Vec::new();
    for (key, value) in &el.attributes {
        if key == "xmlns" {
            scope.insert(String::new(), value.clone());
        } else if let Some(prefix) = key.strip_prefix("xmlns:") {
            scope.insert(prefix.to_string(), value.clone());
        } else {
            plain.push((key.as_str(), value.as_str()));
        }
    }

    // Prefixes visibly utilized by this element: its own and its attributes'.
    let (el_prefix, _) = split_qname(&el.name);
    let mut used: BTreeSet<&str> = BTreeSet::new();
    used.insert(el_prefix);

    let mut attrs: Vec<(&str, &str, &str, &str)> = Vec::with_capacity(plain.len());
    for (qname, value) in plain {
        let (prefix, local) = split_qname(qname);
        let uri = if prefix.is_empty() {
            ""
        } else {
            used.insert(prefix);
            resolve(&scope, prefix)?
        };
        attrs.push((uri, local, qname, value));
    }
    attrs.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));

    let mut now_rendered = rendered.clone();
    let mut decls: Vec<(&str, &str)> = Vec::new();
    for prefix in used {
        if prefix == "xml" {
            continue;
        }
        let uri = if prefix.is_empty() {
            scope.get("").map(String::as_str).unwrap_or("")
        } else {
            resolve(&scope, prefix)?
        };
        let needed = if prefix.is_empty() {
            // An absent default declaration is equivalent to xmlns="".
            rendered.get("").map(String::as_str).unwrap_or("") != uri
        } else {
            rendered.get(prefix).map(String::as_str) != Some(uri)
        };
        if needed {
            decls.push((prefix, uri));
            now_rendered.insert(prefix.to_string(), uri.to_string());
        }
    }

    out.push(b'<');
    out.extend_from_slice(el.name.as_bytes());
    for (prefix, uri) in decls {
        if prefix.is_empty() {
            out.extend_from_slice(b" xmlns=\"");
        } else {
            out.extend_from_slice(b" xmlns:");
            out.extend_from_slice(prefix.as_bytes());
            out.extend_from_slice(b"=\"");
        }
        escape_attr(uri, out);
        out.push(b'"');
    }
    for (_, _, qname, value) in attrs {
        out.push(b' ');
        out.extend_from_slice(qname.as_bytes());
        out.extend_from_slice(b"=\"");
        escape_attr(value, out);
        out.push(b'"');
    }
    out.push(b'>');

    for child in &el.children {
        match child {
            Node::Element(e) => render_element(e, &scope, &now_rendered, out)?,
            Node::Text(t) if is_xml_whitespace(t) => {}
            Node::Text(t) => escape_text(t, out),
        }
    }

    out.extend_from_slice(b"</");
    out.extend_from_slice(el.name.as_bytes());
    out.push(b'>');
    Ok(())
}

fn escape_text(s: &str, out: &mut Vec<u8>) {
    for c in s.chars() {
        match c {
            '&' => out.extend_from_slice(b"&amp;"),
            '<' => out.extend_from_slice(b"&lt;"),
            '>' => out.extend_from_slice(b"&gt;"),
            '\r' => out.extend_from_slice(b"&#xD;"),
            c => push_char(c, out),
        }
    }
}

fn escape_attr(s: &str, out: &mut Vec<u8>) {
    for c in s.chars() {
        match c {
            '&' => out.extend_from_slice(b"&amp;"),
            '<' => out.extend_from_slice(b"&lt;"),
            '"' => out.extend_from_slice(b"&quot;"),
            '\t' => out.extend_from_slice(b"&#x9;"),
            '\n' => out.extend_from_slice(b"&#xA;"),
            '\r' => out.extend_from_slice(b"&#xD;"),
            c => push_char(c, out),
        }
    }
}

fn push_char(c: char, out: &mut Vec<u8>) {
    let mut buf = [0u8; 4];
    out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c14n(xml: &str) -> String {
        String::from_utf8(canonicalize_bytes(xml.as_bytes()).unwrap()).unwrap()
    }

    #[test]
    fn test_drops_declaration_comments_and_whitespace() {
        let xml = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<!-- head -->\n<a>\n  <b>1</b>\n  <!-- c -->\n</a>";
        assert_eq!(c14n(xml), "<a><b>1</b></a>");
    }

    #[test]
    fn test_empty_element_as_pair() {
        assert_eq!(c14n("<a><b/></a>"), "<a><b></b></a>");
    }

    #[test]
    fn test_attribute_order_insensitive() {
        let one = c14n("<a z=\"1\" b=\"2\" m=\"3\"/>");
        let two = c14n("<a m=\"3\" z=\"1\" b=\"2\"/>");
        assert_eq!(one, two);
        assert_eq!(one, "<a b=\"2\" m=\"3\" z=\"1\"></a>");
    }

    #[test]
    fn test_attributes_sorted_by_namespace_uri() {
        let xml = "<a xmlns:y=\"urn:a\" xmlns:x=\"urn:b\" x:k=\"1\" y:k=\"2\" k=\"3\"/>";
        assert_eq!(
            c14n(xml),
            "<a xmlns:x=\"urn:b\" xmlns:y=\"urn:a\" k=\"3\" y:k=\"2\" x:k=\"1\"></a>"
        );
    }

    #[test]
    fn test_namespace_declaration_order_insensitive() {
        let one = c14n("<r xmlns=\"urn:i\" xmlns:cac=\"urn:a\" xmlns:cbc=\"urn:b\"><cac:P><cbc:ID>1</cbc:ID></cac:P></r>");
        let two = c14n("<r xmlns:cbc=\"urn:b\" xmlns:cac=\"urn:a\" xmlns=\"urn:i\"><cac:P><cbc:ID>1</cbc:ID></cac:P></r>");
        assert_eq!(one, two);
    }

    #[test]
    fn test_declarations_move_to_first_use() {
        let xml = "<Invoice xmlns=\"urn:i\" xmlns:cbc=\"urn:b\"><cbc:ID>1</cbc:ID><cbc:UUID>u</cbc:UUID></Invoice>";
        assert_eq!(
            c14n(xml),
            "<Invoice xmlns=\"urn:i\"><cbc:ID xmlns:cbc=\"urn:b\">1</cbc:ID><cbc:UUID xmlns:cbc=\"urn:b\">u</cbc:UUID></Invoice>"
        );
    }

    #[test]
    fn test_declaration_not_repeated_below_user() {
        let xml = "<cac:P xmlns:cac=\"urn:a\" xmlns:cbc=\"urn:b\"><cbc:ID>1</cbc:ID><cac:Q xmlns:cac=\"urn:a\"/></cac:P>";
        assert_eq!(
            c14n(xml),
            "<cac:P xmlns:cac=\"urn:a\"><cbc:ID xmlns:cbc=\"urn:b\">1</cbc:ID><cac:Q></cac:Q></cac:P>"
        );
    }

    #[test]
    fn test_unused_declaration_dropped() {
        assert_eq!(c14n("<a xmlns:x=\"urn:x\"><b/></a>"), "<a><b></b></a>");
    }

    #[test]
    fn test_default_namespace_undeclared() {
        assert_eq!(
            c14n("<a xmlns=\"urn:a\"><b xmlns=\"\"/></a>"),
            "<a xmlns=\"urn:a\"><b xmlns=\"\"></b></a>"
        );
        assert_eq!(c14n("<a xmlns=\"\"/>"), "<a></a>");
    }

    #[test]
    fn test_escaping() {
        assert_eq!(
            c14n("<a t=\"&quot;&lt;&amp;&gt;&#9;&#10;\">&amp;&lt;&gt;\"'&#13;</a>"),
            "<a t=\"&quot;&lt;&amp;>&#x9;&#xA;\">&amp;&lt;&gt;\"'&#xD;</a>"
        );
    }

    #[test]
    fn test_unbound_prefix_rejected() {
        assert!(matches!(
            canonicalize_bytes(b"<x:a/>"),
            Err(CoreError::MalformedXml(_))
        ));
    }

    #[test]
    fn test_tree_and_bytes_agree() {
        let tree = Element::new("Invoice")
            .attr("xmlns:cbc", "urn:b")
            .attr("xmlns", "urn:i")
            .child(Element::leaf("cbc:ID", "A&B"))
            .child(Element::new("cbc:Note").attr("b", "2").attr("a", "1"));
        let direct = canonicalize(&tree).unwrap();
        let pretty = canonicalize_bytes(&tree.to_bytes().unwrap()).unwrap();
        let compact = canonicalize_bytes(&tree.to_compact_bytes().unwrap()).unwrap();
        assert_eq!(direct, pretty);
        assert_eq!(direct, compact);
    }

    #[test]
    fn test_idempotent() {
        let first = c14n("<r xmlns=\"urn:i\" xmlns:cbc=\"urn:b\">\n <cbc:ID a=\"1\">x</cbc:ID>\n</r>");
        assert_eq!(c14n(&first), first);
    }
}
