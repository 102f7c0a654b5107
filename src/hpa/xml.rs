//! Minimal XML element tree and pretty printer.

use std::borrow::Cow;
use std::fmt::Write;

/// A child of an element.
#[derive(Clone, Debug, PartialEq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
    CData(String),
}

/// An element with ordered attributes and children.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Default::default() }
    }

    /// Builder-style attribute.
    pub fn attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(key, value);
        self
    }

    pub fn set_attr(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.attributes.push((key.into(), value.into()));
    }

    /// Builder-style child element.
    pub fn with(mut self, child: XmlElement) -> Self {
        self.children.push(XmlNode::Element(child));
        self
    }

    pub fn push(&mut self, child: XmlElement) {
        self.children.push(XmlNode::Element(child));
    }

    pub fn push_text(&mut self, text: impl Into<String>) {
        self.children.push(XmlNode::Text(text.into()));
    }

    pub fn push_cdata(&mut self, text: impl Into<String>) {
        self.children.push(XmlNode::CData(text.into()));
    }

    /// `<name>text</name>`
    pub fn text_element(name: impl Into<String>, text: impl Into<String>) -> Self {
        let mut el = Self::new(name);
        el.push_text(text);
        el
    }

    /// `<name><![CDATA[text]]></name>`
    pub fn cdata_element(name: impl Into<String>, text: impl Into<String>) -> Self {
        let mut el = Self::new(name);
        el.push_cdata(text);
        el
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|c| match c {
            XmlNode::Element(el) => Some(el),
            _ => None,
        })
    }

    /// First child element named `name`.
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.elements().find(|el| el.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> + 'a {
        self.elements().filter(move |el| el.name == name)
    }

    /// Concatenated text and CDATA content.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for c in &self.children {
            match c {
                XmlNode::Text(t) | XmlNode::CData(t) => out.push_str(t),
                XmlNode::Element(_) => {}
            }
        }
        out
    }
}

/// Escape text and attribute values.
pub fn escape(s: &str) -> Cow<'_, str> {
    if !s.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(s);
    }
    let mut out = String::with_capacity(s.len() + 8);
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// CDATA cannot contain its terminator; split it across sections.
fn cdata(s: &str) -> String {
    format!("<![CDATA[{}]]>", s.replace("]]>", "]]]]><![CDATA[>"))
}

/// Render with an XML declaration, two-space indent.
pub fn render(root: &XmlElement) -> String {
    let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    write_element(&mut out, root, 0);
    out
}

fn write_element(out: &mut String, el: &XmlElement, depth: usize) {
    let indent = "  ".repeat(depth);
    let _ = write!(out, "{}<{}", indent, el.name);
    for (k, v) in &el.attributes {
        let _ = write!(out, " {}=\"{}\"", k, escape(v));
    }
    if el.children.is_empty() {
        out.push_str(" />\n");
        return;
    }
    out.push('>');

    let inline = el.children.iter().all(|c| !matches!(c, XmlNode::Element(_)));
    if inline {
        for c in &el.children {
            match c {
                XmlNode::Text(t) => out.push_str(&escape(t)),
                XmlNode::CData(t) => out.push_str(&cdata(t)),
                XmlNode::Element(_) => {}
            }
        }
    } else {
        out.push('\n');
        for c in &el.children {
            match c {
                XmlNode::Element(child) => write_element(out, child, depth + 1),
                XmlNode::Text(t) => {
                    let _ = writeln!(out, "{}  {}", indent, escape(t));
                }
                XmlNode::CData(t) => {
                    let _ = writeln!(out, "{}  {}", indent, cdata(t));
                }
            }
        }
        out.push_str(&indent);
    }
    let _ = writeln!(out, "</{}>", el.name);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_nested() {
        let mut root = XmlElement::new("project");
        root.push(XmlElement::text_element("schema", "1.0"));
        root.push(XmlElement::new("position").attr("x", "1.00000").attr("y", "2.00000"));
        root.push(XmlElement::cdata_element("name", "a <b> & c"));

        let xml = render(&root);
        assert_eq!(
            xml,
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
             <project>\n  \
             <schema>1.0</schema>\n  \
             <position x=\"1.00000\" y=\"2.00000\" />\n  \
             <name><![CDATA[a <b> & c]]></name>\n\
             </project>\n"
        );
    }

    #[test]
    fn test_escaping() {
        assert_eq!(escape("plain"), "plain");
        assert_eq!(escape("a\"b<c>&'"), "a&quot;b&lt;c&gt;&amp;&apos;");
        assert_eq!(cdata("x]]>y"), "<![CDATA[x]]]]><![CDATA[>y]]>");

        let el = XmlElement::new("v").attr("val", "<1>");
        assert!(render(&el).contains("val=\"&lt;1&gt;\""));
    }

    #[test]
    fn test_lookup_helpers() {
        let mut root = XmlElement::new("linkset");
        root.push(XmlElement::new("box").attr("id", "1"));
        root.push(XmlElement::new("box").attr("id", "2"));
        root.push(XmlElement::cdata_element("name", "n"));
        assert_eq!(root.children_named("box").count(), 2);
        assert_eq!(root.child("box").unwrap().attribute("id"), Some("1"));
        assert_eq!(root.child("name").unwrap().text(), "n");
    }
}
