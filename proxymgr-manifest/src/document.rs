//! Lossless XML node tree for build manifests.
//!
//! Every node keeps the exact text it was parsed from, so rendering an
//! unmodified document reproduces the input byte-for-byte (including the BOM,
//! declaration, comments and whitespace). Only elements touched by an upsert
//! change, and new markup borrows the indentation and line ending already in
//! use around it.

use quick_xml::escape::{escape, unescape};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::entry::{same_include, EntryKind, ManifestEntry};

const ITEM_GROUP: &str = "ItemGroup";
const INDENT_STEP: &str = "  ";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Node {
    Element(Element),
    /// Text, whitespace or markup copied through verbatim.
    Raw(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Element {
    /// Start tag content between `<` and `>` (or `/>`).
    start: String,
    /// End tag content between `</` and `>`.
    end: String,
    name: String,
    include: Option<String>,
    self_closing: bool,
    children: Vec<Node>,
}

/// A parsed build manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Document {
    bom: bool,
    newline: &'static str,
    nodes: Vec<Node>,
}

impl Document {
    pub(crate) fn parse(source: &str) -> Result<Self, String> {
        let (bom, body) = match source.strip_prefix('\u{feff}') {
            Some(rest) => (true, rest),
            None => (false, source),
        };
        let newline = if body.contains("\r\n") { "\r\n" } else { "\n" };

        let mut reader = Reader::from_str(body);
        reader.config_mut().trim_markup_names_in_closing_tags = false;

        let mut stack: Vec<Element> = Vec::new();
        let mut nodes: Vec<Node> = Vec::new();
        loop {
            let event = reader.read_event().map_err(|e| e.to_string())?;
            let node = match event {
                Event::Start(e) => {
                    stack.push(Element::parsed(&e, false)?);
                    continue;
                }
                Event::Empty(e) => Node::Element(Element::parsed(&e, true)?),
                Event::End(e) => {
                    let mut element = stack
                        .pop()
                        .ok_or_else(|| "closing tag without an open element".to_owned())?;
                    element.end = utf8(&e)?;
                    Node::Element(element)
                }
                Event::Text(e) => Node::Raw(utf8(&e)?),
                Event::CData(e) => Node::Raw(format!("<![CDATA[{}]]>", utf8(&e)?)),
                Event::Comment(e) => Node::Raw(format!("<!--{}-->", utf8(&e)?)),
                Event::Decl(e) => Node::Raw(format!("<?{}?>", utf8(&e)?)),
                Event::PI(e) => Node::Raw(format!("<?{}?>", utf8(&e)?)),
                Event::DocType(e) => Node::Raw(format!("<!DOCTYPE {}>", utf8(&e)?.trim_start())),
                Event::Eof => break,
            };
            match stack.last_mut() {
                Some(parent) => parent.children.push(node),
                None => nodes.push(node),
            }
        }

        if let Some(open) = stack.last() {
            return Err(format!("element <{}> is never closed", open.name));
        }
        if !nodes.iter().any(|n| matches!(n, Node::Element(_))) {
            return Err("document has no root element".to_owned());
        }
        Ok(Self {
            bom,
            newline,
            nodes,
        })
    }

    pub(crate) fn render(&self) -> String {
        let mut out = String::new();
        if self.bom {
            out.push('\u{feff}');
        }
        for node in &self.nodes {
            node.write(&mut out);
        }
        out
    }

    /// Whether an item of `kind` with an equivalent `include` exists in any
    /// top-level `ItemGroup`.
    pub(crate) fn contains(&self, kind: EntryKind, include: &str) -> bool {
        let Some(root) = self.root() else {
            return false;
        };
        root.element_indices(ITEM_GROUP)
            .filter_map(|gi| root.element_at(gi))
            .any(|group| group.find_item(kind, include).is_some())
    }

    /// Merge `entry` into the document: overwrite/append the tags of a
    /// matching item, or append a new item.
    pub(crate) fn upsert(&mut self, entry: &ManifestEntry) -> Result<(), String> {
        let newline = self.newline;
        let root_index = self
            .nodes
            .iter()
            .position(|n| matches!(n, Node::Element(_)))
            .ok_or_else(|| "document has no root element".to_owned())?;
        let root_indent = indent_before(&self.nodes, root_index).to_owned();
        let root = match self.nodes.get_mut(root_index) {
            Some(Node::Element(root)) => root,
            _ => return Err("document has no root element".to_owned()),
        };

        let groups: Vec<usize> = root.element_indices(ITEM_GROUP).collect();
        let existing = groups.iter().find_map(|&gi| {
            root.element_at(gi)
                .and_then(|group| group.find_item(entry.kind, &entry.include))
                .map(|ii| (gi, ii))
        });
        if let Some((gi, ii)) = existing {
            if let Some(group) = root.element_at_mut(gi) {
                let item_indent = indent_before(&group.children, ii).to_owned();
                if let Some(item) = group.element_at_mut(ii) {
                    item.merge_tags(&entry.tags, &item_indent, newline);
                }
            }
            return Ok(());
        }

        let kind_name = entry.kind.element_name();
        let same_kind_group = groups.iter().copied().find(|&gi| {
            root.element_at(gi)
                .is_some_and(|group| group.element_indices(kind_name).next().is_some())
        });
        let gi = match (same_kind_group, groups.last()) {
            (Some(gi), _) => gi,
            (None, Some(&last)) => {
                let indent = indent_before(&root.children, last).to_owned();
                root.children.splice(
                    last + 1..last + 1,
                    [
                        Node::Raw(format!("{newline}{indent}")),
                        Node::Element(Element::new(ITEM_GROUP, None)),
                    ],
                );
                last + 2
            }
            (None, None) => root.append(Element::new(ITEM_GROUP, None), &root_indent, newline),
        };

        let group_indent = indent_before(&root.children, gi).to_owned();
        if let Some(group) = root.element_at_mut(gi) {
            let item_indent = group.child_indent(&group_indent);
            let item = Element::item(entry, &item_indent, newline);
            group.append(item, &group_indent, newline);
        }
        Ok(())
    }

    fn root(&self) -> Option<&Element> {
        self.nodes.iter().find_map(|n| match n {
            Node::Element(e) => Some(e),
            Node::Raw(_) => None,
        })
    }
}

impl Node {
    fn write(&self, out: &mut String) {
        match self {
            Node::Raw(text) => out.push_str(text),
            Node::Element(element) => element.write(out),
        }
    }
}

impl Element {
    fn parsed(start: &BytesStart<'_>, self_closing: bool) -> Result<Self, String> {
        let mut include = None;
        for attr in start.attributes() {
            let attr = attr.map_err(|e| e.to_string())?;
            if attr.key.as_ref() == b"Include" {
                let value = attr.unescape_value().map_err(|e| e.to_string())?;
                include = Some(value.into_owned());
            }
        }
        let name = utf8(start.name().as_ref())?;
        Ok(Self {
            start: utf8(start)?,
            end: name.clone(),
            name,
            include,
            self_closing,
            children: Vec::new(),
        })
    }

    fn new(name: &str, include: Option<&str>) -> Self {
        let start = match include {
            Some(path) => format!("{name} Include=\"{}\"", escape(path)),
            None => name.to_owned(),
        };
        Self {
            start,
            end: name.to_owned(),
            name: name.to_owned(),
            include: include.map(str::to_owned),
            self_closing: false,
            children: Vec::new(),
        }
    }

    fn with_text(name: &str, value: &str) -> Self {
        let mut element = Self::new(name, None);
        element.children.push(Node::Raw(escape(value).into_owned()));
        element
    }

    /// A new item for `entry`; tags become child elements at `indent` + one step.
    fn item(entry: &ManifestEntry, indent: &str, newline: &str) -> Self {
        let mut item = Self::new(entry.kind.element_name(), Some(&entry.include));
        if entry.tags.is_empty() {
            item.self_closing = true;
            item.start.push(' ');
            return item;
        }
        for (key, value) in &entry.tags {
            item.append(Self::with_text(key, value), indent, newline);
        }
        item
    }

    fn write(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.start);
        if self.self_closing {
            out.push_str("/>");
            return;
        }
        out.push('>');
        for child in &self.children {
            child.write(out);
        }
        out.push_str("</");
        out.push_str(&self.end);
        out.push('>');
    }

    fn name_is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    fn is_entry(&self, kind: EntryKind, include: &str) -> bool {
        self.name_is(kind.element_name())
            && self
                .include
                .as_deref()
                .is_some_and(|own| same_include(kind, own, include))
    }

    fn find_item(&self, kind: EntryKind, include: &str) -> Option<usize> {
        self.children
            .iter()
            .position(|n| matches!(n, Node::Element(item) if item.is_entry(kind, include)))
    }

    fn element_at(&self, idx: usize) -> Option<&Element> {
        match self.children.get(idx) {
            Some(Node::Element(e)) => Some(e),
            _ => None,
        }
    }

    fn element_at_mut(&mut self, idx: usize) -> Option<&mut Element> {
        match self.children.get_mut(idx) {
            Some(Node::Element(e)) => Some(e),
            _ => None,
        }
    }

    fn element_indices<'a>(&'a self, name: &'a str) -> impl Iterator<Item = usize> + 'a {
        self.children
            .iter()
            .enumerate()
            .filter_map(move |(i, n)| match n {
                Node::Element(e) if e.name_is(name) => Some(i),
                _ => None,
            })
    }

    /// Indentation used by this element's children, taken from the first
    /// existing child element when there is one.
    fn child_indent(&self, own_indent: &str) -> String {
        self.children
            .iter()
            .position(|n| matches!(n, Node::Element(_)))
            .filter(|&first| first > 0)
            .map(|first| indent_before(&self.children, first))
            .filter(|indent| !indent.is_empty())
            .map(str::to_owned)
            .unwrap_or_else(|| format!("{own_indent}{INDENT_STEP}"))
    }

    /// Append `child` after the last child, keeping the closing tag on its
    /// own line. Returns the child's index.
    fn append(&mut self, child: Element, own_indent: &str, newline: &str) -> usize {
        let inner = self.child_indent(own_indent);
        if self.self_closing {
            self.self_closing = false;
            self.start = self.start.trim_end().to_owned();
            self.end = self.name.clone();
        }
        let tail_is_whitespace = matches!(self.children.last(), Some(Node::Raw(text)) if is_blank(text));
        let at = if tail_is_whitespace {
            self.children.len() - 1
        } else {
            self.children.len()
        };
        let mut inserted = vec![
            Node::Raw(format!("{newline}{inner}")),
            Node::Element(child),
        ];
        if !tail_is_whitespace {
            inserted.push(Node::Raw(format!("{newline}{own_indent}")));
        }
        self.children.splice(at..at, inserted);
        at + 1
    }

    fn merge_tags(&mut self, tags: &[(String, String)], own_indent: &str, newline: &str) {
        for (key, value) in tags {
            let existing = self
                .children
                .iter()
                .position(|n| matches!(n, Node::Element(tag) if tag.name_is(key)));
            if let Some(idx) = existing {
                if let Some(tag) = self.element_at_mut(idx) {
                    if tag.text().as_deref() != Some(value.as_str()) {
                        tag.set_text(value);
                    }
                }
            } else {
                self.append(Self::with_text(key, value), own_indent, newline);
            }
        }
    }

    /// Trimmed, unescaped text content.
    fn text(&self) -> Option<String> {
        if self.children.iter().any(|n| matches!(n, Node::Element(_))) {
            return None;
        }
        let raw: String = self
            .children
            .iter()
            .filter_map(|n| match n {
                Node::Raw(text) => Some(text.as_str()),
                Node::Element(_) => None,
            })
            .collect();
        let text = unescape(&raw).map(|t| t.into_owned()).unwrap_or(raw);
        Some(text.trim().to_owned())
    }

    fn set_text(&mut self, value: &str) {
        if self.self_closing {
            self.self_closing = false;
            self.start = self.start.trim_end().to_owned();
            self.end = self.name.clone();
        }
        self.children = vec![Node::Raw(escape(value).into_owned())];
    }
}

/// Indentation of `nodes[idx]`: the text after the last line break of the
/// whitespace node right before it.
fn indent_before(nodes: &[Node], idx: usize) -> &str {
    match idx.checked_sub(1).and_then(|prev| nodes.get(prev)) {
        Some(Node::Raw(text)) if is_blank(text) => match text.rfind('\n') {
            Some(pos) => &text[pos + 1..],
            None => "",
        },
        _ => "",
    }
}

fn is_blank(text: &str) -> bool {
    !text.is_empty() && text.chars().all(char::is_whitespace)
}

fn utf8(bytes: &[u8]) -> Result<String, String> {
    std::str::from_utf8(bytes)
        .map(str::to_owned)
        .map_err(|e| e.to_string())
}
