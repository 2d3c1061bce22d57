//! Lossless XLIFF document tree
//!
//! The document is read with `quick-xml` into a small owned tree. Text and
//! attribute values are kept exactly as written (entities stay escaped), so
//! writing an unmodified tree reproduces the input apart from the XML
//! declaration, which is always emitted with `encoding="UTF-8"`, and
//! insignificant whitespace inside tags.
//!
//! Element names keep their namespace prefix (`ns0:trans-unit`); lookups go by
//! local name so prefixed and unprefixed documents are handled alike.

use once_cell::sync::Lazy;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use regex::Regex;

use crate::xliff::error::{XliffError, XliffResult};

static ENTITY_REF_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:#[0-9]+|#x[0-9A-Fa-f]+|([A-Za-z_][\w.\-]*));").expect("entity regex")
});

const XML_PREDEFINED_ENTITIES: [&str; 5] = ["amp", "lt", "gt", "quot", "apos"];

/// HTML named entities that web translators commonly emit
const HTML_ENTITIES: &[(&str, char)] = &[
    ("nbsp", '\u{a0}'),
    ("laquo", '«'),
    ("raquo", '»'),
    ("hellip", '…'),
    ("ndash", '–'),
    ("mdash", '—'),
    ("lsquo", '‘'),
    ("rsquo", '’'),
    ("ldquo", '“'),
    ("rdquo", '”'),
    ("copy", '©'),
    ("reg", '®'),
    ("euro", '€'),
    ("agrave", 'à'),
    ("aacute", 'á'),
    ("acirc", 'â'),
    ("ccedil", 'ç'),
    ("egrave", 'è'),
    ("eacute", 'é'),
    ("ecirc", 'ê'),
    ("euml", 'ë'),
    ("iacute", 'í'),
    ("icirc", 'î'),
    ("iuml", 'ï'),
    ("ntilde", 'ñ'),
    ("oacute", 'ó'),
    ("ocirc", 'ô'),
    ("ugrave", 'ù'),
    ("uacute", 'ú'),
    ("ucirc", 'û'),
    ("Eacute", 'É'),
    ("Agrave", 'À'),
];

const FRAGMENT_WRAPPER: &str = "xlf-mt-fragment";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNode {
    Element(XmlElement),
    /// Raw (still escaped) character data
    Text(String),
    CData(String),
    Comment(String),
    ProcessingInstruction(String),
    DocType(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement {
    /// Qualified name, prefix included
    pub name: String,
    /// Attributes with raw (still escaped) values, in document order
    pub attrs: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
    /// Written as `<name/>` while it has no children
    pub self_closing: bool,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        XmlElement {
            name: name.into(),
            attrs: Vec::new(),
            children: Vec::new(),
            self_closing: false,
        }
    }

    pub fn local_name(&self) -> &str {
        local_name(&self.name)
    }

    /// Namespace prefix, if the element name has one
    pub fn prefix(&self) -> Option<&str> {
        self.name.split_once(':').map(|(prefix, _)| prefix)
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Set an attribute from an already-escaped value
    pub fn set_attr(&mut self, key: &str, value: &str) {
        match self.attrs.iter_mut().find(|(k, _)| k == key) {
            Some((_, v)) => *v = value.to_string(),
            None => self.attrs.push((key.to_string(), value.to_string())),
        }
    }

    /// Index into `children` of the first child element with this local name
    pub fn child_index(&self, local: &str) -> Option<usize> {
        self.children.iter().position(|node| match node {
            XmlNode::Element(el) => el.local_name() == local,
            _ => false,
        })
    }

    pub fn child(&self, local: &str) -> Option<&XmlElement> {
        self.child_index(local).and_then(|i| match &self.children[i] {
            XmlNode::Element(el) => Some(el),
            _ => None,
        })
    }

    pub fn child_mut(&mut self, local: &str) -> Option<&mut XmlElement> {
        let index = self.child_index(local)?;
        match &mut self.children[index] {
            XmlNode::Element(el) => Some(el),
            _ => None,
        }
    }

    /// Serialized content between the start and end tags
    pub fn inner_xml(&self) -> String {
        let mut out = String::new();
        for node in &self.children {
            write_node(&mut out, node);
        }
        out
    }

    pub fn set_children(&mut self, children: Vec<XmlNode>) {
        self.children = children;
        self.self_closing = false;
    }
}

pub fn local_name(name: &str) -> &str {
    name.rsplit_once(':').map(|(_, local)| local).unwrap_or(name)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlDecl {
    pub version: String,
    pub standalone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XliffDocument {
    pub decl: Option<XmlDecl>,
    pub nodes: Vec<XmlNode>,
}

impl XliffDocument {
    pub fn parse(xml: &str) -> XliffResult<Self> {
        let (decl, nodes) = parse_nodes(xml)?;
        if !nodes.iter().any(|n| matches!(n, XmlNode::Element(_))) {
            return Err(XliffError::Malformed("no root element".to_string()));
        }
        Ok(XliffDocument { decl, nodes })
    }

    pub fn to_xml_string(&self) -> String {
        let mut out = String::new();
        let version = self.decl.as_ref().map(|d| d.version.as_str()).unwrap_or("1.0");
        out.push_str("<?xml version=\"");
        out.push_str(version);
        out.push_str("\" encoding=\"UTF-8\"");
        if let Some(standalone) = self.decl.as_ref().and_then(|d| d.standalone.as_deref()) {
            out.push_str(" standalone=\"");
            out.push_str(standalone);
            out.push('"');
        }
        out.push_str("?>");
        if self.decl.is_none() {
            out.push('\n');
        }
        for node in &self.nodes {
            write_node(&mut out, node);
        }
        out
    }

    /// `source-language` of the first `<file>` element
    pub fn source_language(&self) -> Option<&str> {
        fn find<'a>(nodes: &'a [XmlNode]) -> Option<&'a XmlElement> {
            nodes.iter().find_map(|node| match node {
                XmlNode::Element(el) if el.local_name() == "file" => Some(el),
                XmlNode::Element(el) => find(&el.children),
                _ => None,
            })
        }
        find(&self.nodes)?.attr("source-language")
    }

    /// Paths (child indices from the top level) of every `trans-unit`, in
    /// document order
    pub fn unit_paths(&self) -> Vec<Vec<usize>> {
        fn walk(nodes: &[XmlNode], prefix: &mut Vec<usize>, out: &mut Vec<Vec<usize>>) {
            for (i, node) in nodes.iter().enumerate() {
                if let XmlNode::Element(el) = node {
                    prefix.push(i);
                    if el.local_name() == "trans-unit" {
                        out.push(prefix.clone());
                    } else {
                        walk(&el.children, prefix, out);
                    }
                    prefix.pop();
                }
            }
        }
        let mut out = Vec::new();
        walk(&self.nodes, &mut Vec::new(), &mut out);
        out
    }

    pub fn element_at(&self, path: &[usize]) -> Option<&XmlElement> {
        let (first, rest) = path.split_first()?;
        let mut current = match self.nodes.get(*first)? {
            XmlNode::Element(el) => el,
            _ => return None,
        };
        for i in rest {
            current = match current.children.get(*i)? {
                XmlNode::Element(el) => el,
                _ => return None,
            };
        }
        Some(current)
    }

    pub fn element_at_mut(&mut self, path: &[usize]) -> Option<&mut XmlElement> {
        let (first, rest) = path.split_first()?;
        let mut current = match self.nodes.get_mut(*first)? {
            XmlNode::Element(el) => el,
            _ => return None,
        };
        for i in rest {
            current = match current.children.get_mut(*i)? {
                XmlNode::Element(el) => el,
                _ => return None,
            };
        }
        Some(current)
    }
}

/// Parse a piece of element content (text mixed with inline elements)
pub fn parse_fragment(fragment: &str) -> XliffResult<Vec<XmlNode>> {
    let wrapped = format!("<{0}>{1}</{0}>", FRAGMENT_WRAPPER, fragment);
    let (_, mut nodes) = parse_nodes(&wrapped)?;
    match nodes.pop() {
        Some(XmlNode::Element(el)) if nodes.is_empty() => Ok(el.children),
        _ => Err(XliffError::Malformed("fragment escapes its wrapper".to_string())),
    }
}

/// Turn a provider's output into well-formed element content
///
/// Bare `&` that does not start an entity reference, and `<` that cannot
/// start markup, are escaped first. Known HTML named entities (`&nbsp;`) are
/// decoded to their characters; any other name outside the five XML ones is
/// escaped, as the document declares no DTD. Whatever still fails to parse
/// (unbalanced or reordered tags) is an error.
pub fn sanitize_fragment(fragment: &str) -> XliffResult<Vec<XmlNode>> {
    parse_fragment(&escape_stray_markup(fragment))
}

fn escape_stray_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(c) = rest.chars().next() {
        let after = &rest[c.len_utf8()..];
        match c {
            '&' => {
                let Some(caps) = ENTITY_REF_RE.captures(after) else {
                    out.push_str("&amp;");
                    rest = after;
                    continue;
                };
                let reference = &caps[0];
                match caps.get(1).map(|m| m.as_str()) {
                    Some(name) if !XML_PREDEFINED_ENTITIES.contains(&name) => match html_entity(name) {
                        Some(ch) => out.push(ch),
                        None => {
                            out.push_str("&amp;");
                            out.push_str(reference);
                        }
                    },
                    _ => {
                        out.push('&');
                        out.push_str(reference);
                    }
                }
                rest = &after[reference.len()..];
                continue;
            }
            '<' if !after.starts_with(|n: char| n.is_alphabetic() || matches!(n, '_' | '/' | '!' | '?')) => {
                out.push_str("&lt;")
            }
            _ => out.push(c),
        }
        rest = after;
    }
    out
}

fn html_entity(name: &str) -> Option<char> {
    HTML_ENTITIES
        .iter()
        .find(|(entity, _)| *entity == name)
        .map(|(_, ch)| *ch)
}

fn parse_nodes(xml: &str) -> XliffResult<(Option<XmlDecl>, Vec<XmlNode>)> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);

    let mut decl = None;
    let mut top: Vec<XmlNode> = Vec::new();
    let mut stack: Vec<XmlElement> = Vec::new();

    loop {
        let node = match reader.read_event()? {
            Event::Eof => break,
            Event::Decl(d) => {
                let version = to_string(d.version()?);
                let standalone = d.standalone().transpose()?.map(to_string);
                decl = Some(XmlDecl { version, standalone });
                continue;
            }
            Event::Start(s) => {
                stack.push(start_element(&s, false)?);
                continue;
            }
            Event::End(_) => {
                let el = stack
                    .pop()
                    .ok_or_else(|| XliffError::Malformed("unexpected closing tag".to_string()))?;
                XmlNode::Element(el)
            }
            Event::Empty(s) => XmlNode::Element(start_element(&s, true)?),
            Event::Text(t) => XmlNode::Text(to_string(t.into_inner())),
            Event::CData(t) => XmlNode::CData(to_string(t.into_inner())),
            Event::Comment(t) => XmlNode::Comment(to_string(t.into_inner())),
            Event::PI(t) => XmlNode::ProcessingInstruction(format!(
                "{}{}",
                to_string(t.target()),
                to_string(t.content())
            )),
            Event::DocType(t) => XmlNode::DocType(to_string(t.into_inner())),
        };
        match stack.last_mut() {
            Some(parent) => parent.children.push(node),
            None => top.push(node),
        }
    }

    if let Some(open) = stack.last() {
        return Err(XliffError::Malformed(format!("unclosed element <{}>", open.name)));
    }
    Ok((decl, top))
}

fn start_element(start: &BytesStart<'_>, self_closing: bool) -> XliffResult<XmlElement> {
    let mut el = XmlElement::new(to_string(start.name().as_ref()));
    el.self_closing = self_closing;
    for attr in start.attributes() {
        let attr = attr?;
        el.attrs
            .push((to_string(attr.key.as_ref()), to_string(attr.value.as_ref())));
    }
    Ok(el)
}

fn to_string(bytes: impl AsRef<[u8]>) -> String {
    String::from_utf8_lossy(bytes.as_ref()).into_owned()
}

fn write_node(out: &mut String, node: &XmlNode) {
    match node {
        XmlNode::Element(el) => write_element(out, el),
        XmlNode::Text(text) => out.push_str(text),
        XmlNode::CData(text) => {
            out.push_str("<![CDATA[");
            out.push_str(text);
            out.push_str("]]>");
        }
        XmlNode::Comment(text) => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
        XmlNode::ProcessingInstruction(content) => {
            out.push_str("<?");
            out.push_str(content);
            out.push_str("?>");
        }
        XmlNode::DocType(text) => {
            out.push_str("<!DOCTYPE ");
            out.push_str(text.trim_start());
            out.push('>');
        }
    }
}

fn write_element(out: &mut String, el: &XmlElement) {
    out.push('<');
    out.push_str(&el.name);
    for (key, value) in &el.attrs {
        // Raw values were read from either quote style.
        let quote = if value.contains('"') { '\'' } else { '"' };
        out.push(' ');
        out.push_str(key);
        out.push('=');
        out.push(quote);
        out.push_str(value);
        out.push(quote);
    }
    if el.self_closing && el.children.is_empty() {
        out.push_str("/>");
        return;
    }
    out.push('>');
    for child in &el.children {
        write_node(out, child);
    }
    out.push_str("</");
    out.push_str(&el.name);
    out.push('>');
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<xliff version="1.2" xmlns="urn:oasis:names:tc:xliff:document:1.2">
  <file source-language="es" datatype="plaintext" original="ng2.template">
    <body>
      <trans-unit id="1" datatype="html">
        <source>Hola <x id="A" ctype="x-span"/>mundo &amp; más</source>
        <context-group purpose="location">
          <context context-type="sourcefile">app.component.html</context>
        </context-group>
      </trans-unit>
      <!-- comment -->
      <trans-unit id="2"><source/></trans-unit>
    </body>
  </file>
</xliff>
"#;

    #[test]
    fn test_round_trip_is_lossless() {
        let doc = XliffDocument::parse(SAMPLE).unwrap();
        assert_eq!(doc.to_xml_string(), SAMPLE);
    }

    #[test]
    fn test_unit_paths_and_lookup() {
        let doc = XliffDocument::parse(SAMPLE).unwrap();
        let paths = doc.unit_paths();
        assert_eq!(paths.len(), 2);
        let unit = doc.element_at(&paths[0]).unwrap();
        assert_eq!(unit.attr("id"), Some("1"));
        assert_eq!(
            unit.child("source").unwrap().inner_xml(),
            r#"Hola <x id="A" ctype="x-span"/>mundo &amp; más"#
        );
        let second = doc.element_at(&paths[1]).unwrap();
        assert_eq!(second.child("source").unwrap().inner_xml(), "");
    }

    #[test]
    fn test_source_language() {
        let doc = XliffDocument::parse(SAMPLE).unwrap();
        assert_eq!(doc.source_language(), Some("es"));
    }

    #[test]
    fn test_prefixed_names() {
        let xml = r#"<ns0:xliff xmlns:ns0="urn:oasis:names:tc:xliff:document:1.2"><ns0:file><ns0:body><ns0:trans-unit id="a"><ns0:source>Hola</ns0:source></ns0:trans-unit></ns0:body></ns0:file></ns0:xliff>"#;
        let doc = XliffDocument::parse(xml).unwrap();
        let paths = doc.unit_paths();
        assert_eq!(paths.len(), 1);
        let unit = doc.element_at(&paths[0]).unwrap();
        assert_eq!(unit.prefix(), Some("ns0"));
        assert_eq!(unit.child("source").unwrap().name, "ns0:source");
        assert!(doc.to_xml_string().starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<ns0:xliff"));
    }

    #[test]
    fn test_declaration_rewritten_to_utf8() {
        let xml = "<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>\n<xliff/>";
        let doc = XliffDocument::parse(xml).unwrap();
        assert_eq!(
            doc.to_xml_string(),
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<xliff/>"
        );
    }

    #[test]
    fn test_single_quoted_attribute_kept_valid() {
        let xml = r#"<a title='say "hi"'/>"#;
        let doc = XliffDocument::parse(xml).unwrap();
        assert!(doc.to_xml_string().ends_with(r#"<a title='say "hi"'/>"#));
    }

    #[test]
    fn test_unclosed_element_is_malformed() {
        assert!(XliffDocument::parse("<xliff><file>").is_err());
        assert!(XliffDocument::parse("just text").is_err());
    }

    #[test]
    fn test_set_attr() {
        let mut el = XmlElement::new("target");
        el.set_attr("state", "new");
        el.set_attr("state", "translated");
        assert_eq!(el.attrs, vec![("state".to_string(), "translated".to_string())]);
    }

    #[test]
    fn test_parse_fragment() {
        let nodes = parse_fragment(r#"Hello <x id="A"/>world"#).unwrap();
        assert_eq!(nodes.len(), 3);
        assert!(parse_fragment("<b>open").is_err());
    }

    #[test]
    fn test_sanitize_escapes_stray_characters() {
        let nodes = sanitize_fragment("Tom & Jerry &amp; 1 < 2 <b>ok</b> &#233;").unwrap();
        let mut holder = XmlElement::new("target");
        holder.set_children(nodes);
        assert_eq!(
            holder.inner_xml(),
            "Tom &amp; Jerry &amp; 1 &lt; 2 <b>ok</b> &#233;"
        );
    }

    #[test]
    fn test_sanitize_handles_html_named_entities() {
        let nodes = sanitize_fragment("Bonjour&nbsp;le monde &eacute;t&eacute; &bogus; &quot;x&quot;").unwrap();
        let mut holder = XmlElement::new("target");
        holder.set_children(nodes);
        let xml = holder.inner_xml();
        assert_eq!(xml, "Bonjour\u{a0}le monde été &amp;bogus; &quot;x&quot;");
        assert!(quick_xml::escape::unescape(&xml).is_ok());
    }

    #[test]
    fn test_sanitize_rejects_reordered_tags() {
        assert!(sanitize_fragment("</b>text<b>").is_err());
    }
}
