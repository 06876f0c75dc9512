//! Owned rich-text document model.
//!
//! A [`Document`] is a tree of [`Node`]s. Only [`Node::Text`] leaves carry
//! characters; [`Node::LineBreak`] is structural and styling elements only
//! wrap their children. Concatenating the text leaves left to right always
//! yields the plain text, so every formatting operation in [`edit`] can be
//! checked against `plain_text()` before and after.
//!
//! Positions inside the tree are expressed as [`NodePath`]s (child indices
//! from the root) plus a local offset; linear offsets count `char`s of the
//! plain text.

mod edit;
mod markup;

pub use markup::{has_markup, strip_markup, visible_text};

use serde::{Deserialize, Serialize};

/// Child indices from the document root down to a node.
pub type NodePath = Vec<usize>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ListKind {
    Unordered,
    Ordered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Alignment {
    Left,
    Center,
    Right,
}

impl Alignment {
    pub fn as_css(self) -> &'static str {
        match self {
            Alignment::Left => "left",
            Alignment::Center => "center",
            Alignment::Right => "right",
        }
    }

    pub fn from_css(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "left" | "start" | "justify" => Some(Alignment::Left),
            "center" => Some(Alignment::Center),
            "right" | "end" => Some(Alignment::Right),
            _ => None,
        }
    }
}

/// Styling carried by an element node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Style {
    Bold,
    Italic,
    Underline,
    Color(String),
    /// Font size in pixels
    FontSize(u8),
    List(ListKind),
    ListItem,
    Align(Alignment),
    /// Plain block container (`div`/`p` without alignment)
    Block,
}

/// Style discriminant, used where any value of a style should match
/// (e.g. "remove every color in this range").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StyleKind {
    Bold,
    Italic,
    Underline,
    Color,
    FontSize,
    List,
    ListItem,
    Align,
    Block,
}

impl Style {
    pub fn kind(&self) -> StyleKind {
        match self {
            Style::Bold => StyleKind::Bold,
            Style::Italic => StyleKind::Italic,
            Style::Underline => StyleKind::Underline,
            Style::Color(_) => StyleKind::Color,
            Style::FontSize(_) => StyleKind::FontSize,
            Style::List(_) => StyleKind::List,
            Style::ListItem => StyleKind::ListItem,
            Style::Align(_) => StyleKind::Align,
            Style::Block => StyleKind::Block,
        }
    }

    /// Block styles own whole lines; inline styles wrap runs of text.
    pub fn is_block(&self) -> bool {
        matches!(
            self.kind(),
            StyleKind::List | StyleKind::ListItem | StyleKind::Align | StyleKind::Block
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Text(String),
    LineBreak,
    Element { style: Style, children: Vec<Node> },
}

impl Node {
    pub fn text(text: impl Into<String>) -> Self {
        Node::Text(text.into())
    }

    pub fn element(style: Style, children: Vec<Node>) -> Self {
        Node::Element { style, children }
    }

    /// Number of plain-text characters under this node
    pub fn char_len(&self) -> usize {
        match self {
            Node::Text(text) => text.chars().count(),
            Node::LineBreak => 0,
            Node::Element { children, .. } => children.iter().map(Node::char_len).sum(),
        }
    }

    pub fn is_block(&self) -> bool {
        matches!(self, Node::Element { style, .. } if style.is_block())
    }

    pub fn style(&self) -> Option<&Style> {
        match self {
            Node::Element { style, .. } => Some(style),
            _ => None,
        }
    }

    pub fn children(&self) -> &[Node] {
        match self {
            Node::Element { children, .. } => children,
            _ => &[],
        }
    }

    fn push_plain_text(&self, out: &mut String) {
        match self {
            Node::Text(text) => out.push_str(text),
            Node::LineBreak => {}
            Node::Element { children, .. } => {
                for child in children {
                    child.push_plain_text(out);
                }
            }
        }
    }
}

/// A leaf text-bearing node, as enumerated in document order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Leaf<'a> {
    pub path: NodePath,
    pub text: &'a str,
    /// Linear offset of the leaf's first character
    pub start: usize,
    /// Length in characters
    pub len: usize,
}

impl Leaf<'_> {
    pub fn end(&self) -> usize {
        self.start + self.len
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaretStop {
    pub path: NodePath,
    pub offset: usize,
    pub linear: usize,
}

impl CaretStop {
    fn new(path: NodePath, offset: usize, linear: usize) -> Self {
        Self {
            path,
            offset,
            linear,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    pub(crate) nodes: Vec<Node>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_nodes(nodes: Vec<Node>) -> Self {
        let mut doc = Self { nodes };
        doc.normalize();
        doc
    }

    /// Parse serialized markup. Never fails: unknown tags are transparent
    /// and stray `<` characters are kept as text.
    pub fn parse(markup: &str) -> Self {
        Self::from_nodes(markup::parse(markup))
    }

    pub fn to_markup(&self) -> String {
        markup::serialize(&self.nodes)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        for node in &self.nodes {
            node.push_plain_text(&mut out);
        }
        out
    }

    pub fn char_len(&self) -> usize {
        self.nodes.iter().map(Node::char_len).sum()
    }

    /// Every text leaf in document order with its linear start offset
    pub fn leaves(&self) -> Vec<Leaf<'_>> {
        fn walk<'a>(nodes: &'a [Node], path: &mut NodePath, pos: &mut usize, out: &mut Vec<Leaf<'a>>) {
            for (index, node) in nodes.iter().enumerate() {
                path.push(index);
                match node {
                    Node::Text(text) => {
                        let len = text.chars().count();
                        out.push(Leaf {
                            path: path.clone(),
                            text,
                            start: *pos,
                            len,
                        });
                        *pos += len;
                    }
                    Node::LineBreak => {}
                    Node::Element { children, .. } => walk(children, path, pos, out),
                }
                path.pop();
            }
        }

        let mut leaves = Vec::new();
        walk(&self.nodes, &mut Vec::new(), &mut 0, &mut leaves);
        leaves
    }

    /// Node addressed by `path`; `None` for the root or an invalid path
    pub fn node_at(&self, path: &[usize]) -> Option<&Node> {
        let (first, rest) = path.split_first()?;
        let mut node = self.nodes.get(*first)?;
        for index in rest {
            node = node.children().get(*index)?;
        }
        Some(node)
    }

    /// Styles of the elements enclosing `path`, outermost first. A path to
    /// an element includes that element.
    pub fn styles_at(&self, path: &[usize]) -> Vec<&Style> {
        (1..=path.len())
            .filter_map(|len| self.node_at(&path[..len])?.style())
            .collect()
    }

    /// Children of the container addressed by `path` (the root for `[]`)
    pub fn children_at(&self, path: &[usize]) -> Option<&[Node]> {
        if path.is_empty() {
            return Some(&self.nodes);
        }
        match self.node_at(path)? {
            Node::Element { children, .. } => Some(children),
            _ => None,
        }
    }

    pub(crate) fn node_at_mut(&mut self, path: &[usize]) -> Option<&mut Node> {
        let (first, rest) = path.split_first()?;
        let mut node = self.nodes.get_mut(*first)?;
        for index in rest {
            node = match node {
                Node::Element { children, .. } => children.get_mut(*index)?,
                _ => return None,
            };
        }
        Some(node)
    }

    pub(crate) fn children_at_mut(&mut self, path: &[usize]) -> Option<&mut Vec<Node>> {
        if path.is_empty() {
            return Some(&mut self.nodes);
        }
        match self.node_at_mut(path)? {
            Node::Element { children, .. } => Some(children),
            _ => None,
        }
    }

    /// Leaf path and local offset owning linear `offset`. At a boundary
    /// between two leaves the earlier one wins; offsets past the end clamp
    /// to the end of the last leaf. `None` when there are no leaves.
    pub fn position_of_offset(&self, offset: usize) -> Option<(NodePath, usize)> {
        let leaves = self.leaves();
        let last = leaves.last()?;
        for leaf in &leaves {
            if leaf.end() >= offset {
                let local = offset.saturating_sub(leaf.start).min(leaf.len);
                return Some((leaf.path.clone(), local));
            }
        }
        Some((last.path.clone(), last.len))
    }

    /// Every place a caret can rest, in document order: the start, after
    /// each character and after each line break.
    pub fn caret_stops(&self) -> Vec<CaretStop> {
        fn walk(nodes: &[Node], path: &mut NodePath, linear: &mut usize, stops: &mut Vec<CaretStop>) {
            for (index, node) in nodes.iter().enumerate() {
                path.push(index);
                match node {
                    Node::Text(text) => {
                        if stops.is_empty() && !text.is_empty() {
                            stops.push(CaretStop::new(path.clone(), 0, *linear));
                        }
                        for local in 1..=text.chars().count() {
                            *linear += 1;
                            stops.push(CaretStop::new(path.clone(), local, *linear));
                        }
                    }
                    Node::LineBreak => {
                        if stops.is_empty() {
                            stops.push(CaretStop::new(path[..path.len() - 1].to_vec(), index, *linear));
                        }
                        stops.push(CaretStop::new(path[..path.len() - 1].to_vec(), index + 1, *linear));
                    }
                    Node::Element { children, .. } => walk(children, path, linear, stops),
                }
                path.pop();
            }
        }

        let mut stops = Vec::new();
        walk(&self.nodes, &mut Vec::new(), &mut 0, &mut stops);
        if stops.is_empty() {
            stops.push(CaretStop::new(Vec::new(), 0, 0));
        }
        stops
    }

    /// Linear offset of the first character under the node at `path`
    pub fn offset_of_path(&self, path: &[usize]) -> Option<usize> {
        let mut offset = 0;
        let mut siblings: &[Node] = &self.nodes;
        for index in path {
            if *index >= siblings.len() {
                return None;
            }
            offset += siblings[..*index].iter().map(Node::char_len).sum::<usize>();
            siblings = siblings[*index].children();
        }
        Some(offset)
    }

    /// Linear offset just before child `child_index` of the container at
    /// `parent`. Indices past the last child clamp to the container's end.
    pub fn offset_before_child(&self, parent: &[usize], child_index: usize) -> Option<usize> {
        let children = self.children_at(parent)?;
        let base = self.offset_of_path(parent)?;
        let clamped = child_index.min(children.len());
        Some(base + children[..clamped].iter().map(Node::char_len).sum::<usize>())
    }

    /// Drop empty text and empty inline wrappers, merge adjacent text runs
    /// and adjacent identical inline wrappers. Plain text is unchanged.
    pub fn normalize(&mut self) {
        self.nodes = normalize_nodes(std::mem::take(&mut self.nodes));
    }
}

fn normalize_nodes(nodes: Vec<Node>) -> Vec<Node> {
    let mut out: Vec<Node> = Vec::with_capacity(nodes.len());
    for node in nodes {
        match node {
            Node::Text(text) if text.is_empty() => {}
            Node::Text(text) => {
                if let Some(Node::Text(previous)) = out.last_mut() {
                    previous.push_str(&text);
                } else {
                    out.push(Node::Text(text));
                }
            }
            Node::LineBreak => out.push(Node::LineBreak),
            Node::Element { style, children } => {
                let children = normalize_nodes(children);
                let droppable = !style.is_block() || style.kind() == StyleKind::List;
                if children.is_empty() && droppable {
                    continue;
                }
                if !style.is_block()
                    && let Some(Node::Element {
                        style: previous_style,
                        children: previous_children,
                    }) = out.last_mut()
                    && *previous_style == style
                {
                    previous_children.extend(children);
                    let merged = normalize_nodes(std::mem::take(previous_children));
                    *previous_children = merged;
                    continue;
                }
                out.push(Node::Element { style, children });
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> Document {
        Document::from_nodes(vec![
            Node::text("Dearly "),
            Node::element(Style::Bold, vec![Node::text("beloved")]),
            Node::LineBreak,
            Node::element(
                Style::Italic,
                vec![Node::text("we are "), Node::element(Style::Underline, vec![Node::text("gathered")])],
            ),
        ])
    }

    #[test]
    fn test_plain_text_concatenates_leaves() {
        let doc = sample();
        assert_eq!(doc.plain_text(), "Dearly belovedwe are gathered");
        assert_eq!(doc.char_len(), 29);
    }

    #[test]
    fn test_leaves_in_document_order() {
        let doc = sample();
        let leaves = doc.leaves();
        let summary: Vec<(NodePath, &str, usize)> =
            leaves.iter().map(|leaf| (leaf.path.clone(), leaf.text, leaf.start)).collect();
        assert_eq!(
            summary,
            vec![
                (vec![0], "Dearly ", 0),
                (vec![1, 0], "beloved", 7),
                (vec![3, 0], "we are ", 14),
                (vec![3, 1, 0], "gathered", 21),
            ]
        );
    }

    #[test]
    fn test_offsets_of_paths_and_children() {
        let doc = sample();
        assert_eq!(doc.offset_of_path(&[3, 1]), Some(21));
        assert_eq!(doc.offset_before_child(&[], 2), Some(14));
        assert_eq!(doc.offset_before_child(&[], 99), Some(29));
        assert_eq!(doc.offset_of_path(&[7]), None);
    }

    #[test]
    fn test_normalize_merges_runs_and_drops_empties() {
        let doc = Document::from_nodes(vec![
            Node::text("a"),
            Node::text(""),
            Node::text("b"),
            Node::element(Style::Bold, vec![]),
            Node::element(Style::Bold, vec![Node::text("c")]),
            Node::element(Style::Bold, vec![Node::text("d")]),
            Node::element(Style::ListItem, vec![]),
        ]);
        assert_eq!(
            doc.nodes(),
            &[
                Node::text("ab"),
                Node::element(Style::Bold, vec![Node::text("cd")]),
                Node::element(Style::ListItem, vec![]),
            ]
        );
    }

    #[test]
    fn test_line_breaks_carry_no_characters() {
        let doc = Document::from_nodes(vec![Node::text("a"), Node::LineBreak, Node::text("b")]);
        assert_eq!(doc.char_len(), 2);
        assert_eq!(doc.leaves().len(), 2);
    }

    #[test]
    fn test_styles_at_lists_enclosing_elements() {
        let doc = sample();
        assert_eq!(doc.styles_at(&[3, 1, 0]), vec![&Style::Italic, &Style::Underline]);
        assert_eq!(doc.styles_at(&[3, 1]), vec![&Style::Italic, &Style::Underline]);
        assert_eq!(doc.styles_at(&[0]), Vec::<&Style>::new());
        assert!(doc.styles_at(&[]).is_empty());
    }
}
