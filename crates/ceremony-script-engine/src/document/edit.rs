//! Structural mutations over the document tree.
//!
//! Inline styles split text runs at the range boundaries and wrap the
//! middle; block styles (lists, alignment) operate on whole top-level lines.
//! None of these change the plain text except `insert_text` and
//! `delete_range`.

use std::ops::Range;

use super::{Alignment, Document, ListKind, Node, NodePath, Style, StyleKind};

/// A top-level line: a run of inline children between line breaks, or a
/// single block element.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Line {
    /// Indices into the top-level children
    nodes: Range<usize>,
    start: usize,
    end: usize,
}

impl Document {
    /// Wrap every character in `range` with `style`, replacing any existing
    /// style of the same kind there. Returns false for an empty range.
    pub fn wrap_inline(&mut self, range: Range<usize>, style: Style) -> bool {
        if range.is_empty() || style.is_block() {
            return false;
        }
        let kind = style.kind();
        let nodes = unwrap_nodes(std::mem::take(&mut self.nodes), &range, kind);
        self.nodes = wrap_nodes(nodes, &range, &style);
        self.normalize();
        true
    }

    /// Remove every style of `kind` from `range`, splitting wrappers that
    /// straddle its boundaries.
    pub fn unwrap_inline(&mut self, range: Range<usize>, kind: StyleKind) -> bool {
        if range.is_empty() {
            return false;
        }
        self.nodes = unwrap_nodes(std::mem::take(&mut self.nodes), &range, kind);
        self.normalize();
        true
    }

    /// Whether every character in `range` sits under a style of `kind`
    pub fn style_covers(&self, range: Range<usize>, kind: StyleKind) -> bool {
        if range.is_empty() {
            return false;
        }
        covers(&self.nodes, &range, kind, false, &mut 0)
    }

    /// Toggle an inline style over `range`: removed when the whole range
    /// already carries it, applied otherwise.
    pub fn toggle_inline(&mut self, range: Range<usize>, style: Style) -> bool {
        if self.style_covers(range.clone(), style.kind()) {
            self.unwrap_inline(range, style.kind())
        } else {
            self.wrap_inline(range, style)
        }
    }

    /// Pull the run out, wrap it in a color node and put it back in place
    pub fn recolor(&mut self, range: Range<usize>, color: &str) -> bool {
        self.wrap_inline(range, Style::Color(color.to_string()))
    }

    /// Turn the lines touched by `range` into a one-level list. Applying the
    /// same kind to an existing list turns it back into plain lines.
    pub fn set_list(&mut self, range: Range<usize>, kind: ListKind) -> bool {
        let Some(span) = self.touched_span(&range) else {
            return false;
        };
        let group: Vec<Node> = self.nodes.drain(span.clone()).collect();

        let replacement = match group.as_slice() {
            [Node::Element { style: Style::List(existing), children }] if *existing == kind => {
                list_items_to_lines(children.clone())
            }
            [Node::Element { style: Style::List(_), children }] => {
                vec![Node::element(Style::List(kind), children.clone())]
            }
            _ => vec![Node::element(Style::List(kind), lines_to_list_items(group))],
        };

        let replacement = separate_lines(&self.nodes, span.start, replacement);
        self.nodes.splice(span.start..span.start, replacement);
        self.normalize();
        true
    }

    /// Align the lines touched by `range`. Left alignment is the default, so
    /// it removes alignment wrappers instead of adding one.
    pub fn set_alignment(&mut self, range: Range<usize>, alignment: Alignment) -> bool {
        let Some(span) = self.touched_span(&range) else {
            return false;
        };
        let group: Vec<Node> = self.nodes.drain(span.clone()).collect();

        let mut unaligned = Vec::with_capacity(group.len());
        for node in group {
            match node {
                Node::Element {
                    style: Style::Align(_),
                    children,
                } => unaligned.extend(children),
                other => unaligned.push(other),
            }
        }

        let replacement = match alignment {
            Alignment::Left => unaligned,
            other => vec![Node::element(Style::Align(other), unaligned)],
        };

        let replacement = separate_lines(&self.nodes, span.start, replacement);
        self.nodes.splice(span.start..span.start, replacement);
        self.normalize();
        true
    }

    /// Insert typed text at linear `offset`; at a run boundary the earlier
    /// run receives it. Returns the number of characters inserted.
    pub fn insert_text(&mut self, offset: usize, text: &str, styles: &[Style]) -> usize {
        let (path, local) = self.position_of_offset(offset).unwrap_or_default();
        let count = text.chars().filter(|c| *c != '\n' && *c != '\r').count();
        if self.insert_at(&path, local, text, styles).is_some() {
            self.normalize();
            count
        } else {
            0
        }
    }

    /// Insert typed text at a tree position: inside a text leaf at a local
    /// char offset, or inside a container before child `offset`. Newlines
    /// become line breaks; `styles` (outermost first) wrap the new run.
    ///
    /// Returns the caret position just after the inserted text. The tree is
    /// not normalized, so the returned path stays valid.
    pub fn insert_at(
        &mut self,
        path: &[usize],
        offset: usize,
        text: &str,
        styles: &[Style],
    ) -> Option<(NodePath, usize)> {
        let inserted = build_inserted(text, styles);
        if inserted.is_empty() {
            return Some((path.to_vec(), offset));
        }

        let (parent, index) = match self.node_at(path) {
            Some(Node::Text(existing)) => {
                let local = offset.min(existing.chars().count());
                let plain = styles.is_empty() && !text.contains(['\n', '\r']);
                let (parent, index) = path.split_at(path.len() - 1);
                let index = index[0];
                let Some(Node::Text(existing)) = self.node_at_mut(path) else {
                    return None;
                };
                if plain {
                    let at = byte_index(existing, local);
                    existing.insert_str(at, text);
                    return Some((path.to_vec(), local + text.chars().count()));
                }
                let len = existing.chars().count();
                if local == 0 {
                    (parent.to_vec(), index)
                } else if local >= len {
                    (parent.to_vec(), index + 1)
                } else {
                    let right = existing.split_off(byte_index(existing, local));
                    let children = self.children_at_mut(parent)?;
                    children.insert(index + 1, Node::Text(right));
                    (parent.to_vec(), index + 1)
                }
            }
            Some(Node::LineBreak) => {
                let (parent, index) = path.split_at(path.len() - 1);
                (parent.to_vec(), index[0])
            }
            None if !path.is_empty() => return None,
            _ => {
                let len = self.children_at(path)?.len();
                (path.to_vec(), offset.min(len))
            }
        };

        let caret = caret_after(&parent, index, &inserted);
        let children = self.children_at_mut(&parent)?;
        children.splice(index..index, inserted);
        Some(caret)
    }

    /// Remove the character or line break immediately before a tree
    /// position. Returns the caret position afterwards, or `None` at the
    /// start of the document.
    pub fn delete_before(&mut self, path: &[usize], offset: usize) -> Option<(NodePath, usize)> {
        let (mut parent, mut index) = match self.node_at(path) {
            Some(Node::Text(existing)) if offset > 0 => {
                let local = offset.min(existing.chars().count());
                let Some(Node::Text(existing)) = self.node_at_mut(path) else {
                    return None;
                };
                let at = byte_index(existing, local - 1);
                existing.remove(at);
                return Some((path.to_vec(), local - 1));
            }
            Some(Node::Text(_)) | Some(Node::LineBreak) => {
                let (parent, index) = path.split_at(path.len() - 1);
                (parent.to_vec(), index[0])
            }
            None if !path.is_empty() => return None,
            _ => {
                let len = self.children_at(path)?.len();
                (path.to_vec(), offset.min(len))
            }
        };

        'outer: loop {
            if index == 0 {
                let (&last, grand) = parent.split_last()?;
                parent = grand.to_vec();
                index = last;
                continue;
            }

            let mut target = parent.clone();
            target.push(index - 1);
            loop {
                match self.node_at(&target)? {
                    Node::Text(existing) if !existing.is_empty() => {
                        let len = existing.chars().count();
                        let Some(Node::Text(existing)) = self.node_at_mut(&target) else {
                            return None;
                        };
                        let at = byte_index(existing, len - 1);
                        existing.remove(at);
                        return Some((target, len - 1));
                    }
                    Node::LineBreak => {
                        let (&last, target_parent) = target.split_last()?;
                        self.children_at_mut(target_parent)?.remove(last);
                        return Some((target_parent.to_vec(), last));
                    }
                    Node::Element { children, .. } if !children.is_empty() => {
                        target.push(children.len() - 1);
                    }
                    // Empty run: step over it
                    _ => {
                        let (&last, target_parent) = target.split_last()?;
                        parent = target_parent.to_vec();
                        index = last;
                        continue 'outer;
                    }
                }
            }
        }
    }

    /// Delete the characters in `range`, along with line breaks strictly
    /// inside it. Block containers are kept even when emptied.
    pub fn delete_range(&mut self, range: Range<usize>) -> bool {
        if range.is_empty() {
            return false;
        }
        self.nodes = delete_nodes(std::mem::take(&mut self.nodes), &range);
        self.normalize();
        true
    }

    fn lines(&self) -> Vec<Line> {
        let mut lines = Vec::new();
        let mut pos = 0;
        let mut current: Option<Line> = None;

        for (index, node) in self.nodes.iter().enumerate() {
            let len = node.char_len();
            match node {
                Node::LineBreak => {
                    lines.extend(current.take());
                }
                node if node.is_block() => {
                    lines.extend(current.take());
                    lines.push(Line {
                        nodes: index..index + 1,
                        start: pos,
                        end: pos + len,
                    });
                }
                _ => {
                    let line = current.get_or_insert(Line {
                        nodes: index..index,
                        start: pos,
                        end: pos,
                    });
                    line.nodes.end = index + 1;
                    line.end = pos + len;
                }
            }
            pos += len;
        }
        lines.extend(current);
        lines
    }

    /// Child index span covering every line `range` touches. A collapsed
    /// range touches the first line containing it.
    fn touched_span(&self, range: &Range<usize>) -> Option<Range<usize>> {
        let lines = self.lines();
        let contains = |line: &&Line| line.start <= range.start && range.start <= line.end;

        let touched: Vec<&Line> = if range.is_empty() {
            lines.iter().find(contains).into_iter().collect()
        } else {
            let overlapping: Vec<&Line> = lines
                .iter()
                .filter(|line| line.start < range.end && range.start < line.end)
                .collect();
            if overlapping.is_empty() {
                lines.iter().find(contains).into_iter().collect()
            } else {
                overlapping
            }
        };

        let first = touched.first()?;
        let last = touched.last()?;
        Some(first.nodes.start..last.nodes.end)
    }
}

/// Split a node at local character offset `at`, cloning wrappers onto both
/// halves.
fn split_node(node: Node, at: usize) -> (Option<Node>, Option<Node>) {
    if at == 0 {
        return (None, Some(node));
    }
    if at >= node.char_len() {
        return (Some(node), None);
    }
    match node {
        Node::Text(text) => {
            let index = byte_index(&text, at);
            let (left, right) = text.split_at(index);
            (Some(Node::text(left)), Some(Node::text(right)))
        }
        Node::LineBreak => (Some(Node::LineBreak), None),
        Node::Element { style, children } => {
            let (left, right) = split_children(children, at);
            (
                Some(Node::element(style.clone(), left)),
                Some(Node::element(style, right)),
            )
        }
    }
}

fn split_children(children: Vec<Node>, at: usize) -> (Vec<Node>, Vec<Node>) {
    let mut left = Vec::new();
    let mut right = Vec::new();
    let mut pos = 0;
    for child in children {
        let len = child.char_len();
        if pos >= at {
            right.push(child);
        } else if pos + len <= at {
            left.push(child);
        } else {
            let (a, b) = split_node(child, at - pos);
            left.extend(a);
            right.extend(b);
        }
        pos += len;
    }
    (left, right)
}

fn byte_index(text: &str, char_offset: usize) -> usize {
    text.char_indices()
        .nth(char_offset)
        .map(|(index, _)| index)
        .unwrap_or(text.len())
}

fn shift(range: &Range<usize>, by: usize) -> Range<usize> {
    range.start.saturating_sub(by)..range.end.saturating_sub(by)
}

fn overlaps(span: &Range<usize>, range: &Range<usize>) -> bool {
    span.start < range.end && range.start < span.end
}

/// Split `node` (spanning `start..start + len`) into the parts before,
/// inside and after `range`.
fn split_three(
    node: Node,
    start: usize,
    range: &Range<usize>,
) -> (Option<Node>, Option<Node>, Option<Node>) {
    let len = node.char_len();
    let local_start = range.start.saturating_sub(start);
    let local_end = (range.end - start).min(len);
    let (before, rest) = split_node(node, local_start);
    let (middle, after) = match rest {
        Some(rest) => split_node(rest, local_end - local_start),
        None => (None, None),
    };
    (before, middle, after)
}

fn wrap_nodes(children: Vec<Node>, range: &Range<usize>, style: &Style) -> Vec<Node> {
    fn flush(out: &mut Vec<Node>, group: &mut Vec<Node>, style: &Style) {
        if !group.is_empty() {
            out.push(Node::element(style.clone(), std::mem::take(group)));
        }
    }

    let mut out = Vec::with_capacity(children.len());
    let mut group = Vec::new();
    let mut pos = 0;

    for child in children {
        let len = child.char_len();
        let span = pos..pos + len;
        pos += len;

        if child.is_block() {
            flush(&mut out, &mut group, style);
            match child {
                Node::Element { style: block, children } if overlaps(&span, range) => {
                    let inner = wrap_nodes(children, &shift(range, span.start), style);
                    out.push(Node::element(block, inner));
                }
                other => out.push(other),
            }
            continue;
        }

        if len == 0 {
            // Line breaks strictly inside the range join the wrapped run
            if range.start < span.start && span.start < range.end && !group.is_empty() {
                group.push(child);
            } else {
                flush(&mut out, &mut group, style);
                out.push(child);
            }
        } else if !overlaps(&span, range) {
            flush(&mut out, &mut group, style);
            out.push(child);
        } else if range.start <= span.start && span.end <= range.end {
            group.push(child);
        } else {
            let (before, middle, after) = split_three(child, span.start, range);
            if let Some(before) = before {
                flush(&mut out, &mut group, style);
                out.push(before);
            }
            group.extend(middle);
            if let Some(after) = after {
                flush(&mut out, &mut group, style);
                out.push(after);
            }
        }
    }
    flush(&mut out, &mut group, style);
    out
}

fn unwrap_nodes(children: Vec<Node>, range: &Range<usize>, kind: StyleKind) -> Vec<Node> {
    let mut out = Vec::with_capacity(children.len());
    let mut pos = 0;

    for child in children {
        let len = child.char_len();
        let span = pos..pos + len;
        pos += len;

        if !overlaps(&span, range) {
            out.push(child);
            continue;
        }
        match child {
            Node::Element { style, children } if style.kind() == kind => {
                let node = Node::element(style, children);
                let (before, middle, after) = split_three(node, span.start, range);
                out.extend(before);
                if let Some(Node::Element { children, .. }) = middle {
                    let middle_len: usize = children.iter().map(Node::char_len).sum();
                    out.extend(unwrap_nodes(children, &(0..middle_len), kind));
                }
                out.extend(after);
            }
            Node::Element { style, children } => {
                let inner = unwrap_nodes(children, &shift(range, span.start), kind);
                out.push(Node::element(style, inner));
            }
            other => out.push(other),
        }
    }
    out
}

fn covers(nodes: &[Node], range: &Range<usize>, kind: StyleKind, inside: bool, pos: &mut usize) -> bool {
    for node in nodes {
        match node {
            Node::Text(_) => {
                let len = node.char_len();
                let span = *pos..*pos + len;
                *pos += len;
                if overlaps(&span, range) && !inside {
                    return false;
                }
            }
            Node::LineBreak => {}
            Node::Element { style, children } => {
                let inside = inside || style.kind() == kind;
                if !covers(children, range, kind, inside, pos) {
                    return false;
                }
            }
        }
    }
    true
}

fn build_inserted(text: &str, styles: &[Style]) -> Vec<Node> {
    let mut inserted = Vec::new();
    for (index, line) in text.split('\n').enumerate() {
        if index > 0 {
            inserted.push(Node::LineBreak);
        }
        let line = line.strip_suffix('\r').unwrap_or(line);
        if !line.is_empty() {
            inserted.push(Node::text(line));
        }
    }
    if inserted.is_empty() {
        return inserted;
    }
    for style in styles.iter().rev() {
        inserted = vec![Node::element(style.clone(), inserted)];
    }
    inserted
}

/// Caret position just after `inserted` once spliced into `parent` at
/// `index`: the end of the last text leaf, or the container position after
/// a trailing line break.
fn caret_after(parent: &[usize], index: usize, inserted: &[Node]) -> (NodePath, usize) {
    let mut path = parent.to_vec();
    path.push(index + inserted.len() - 1);
    let mut node = inserted.last();
    while let Some(current) = node {
        match current {
            Node::Text(text) => return (path, text.chars().count()),
            Node::LineBreak => {
                let last = path.pop().unwrap_or_default();
                return (path, last + 1);
            }
            Node::Element { children, .. } => {
                if children.is_empty() {
                    return (path, 0);
                }
                path.push(children.len() - 1);
                node = children.last();
            }
        }
    }
    (path, 0)
}

fn delete_nodes(children: Vec<Node>, range: &Range<usize>) -> Vec<Node> {
    let mut out = Vec::with_capacity(children.len());
    let mut pos = 0;

    for child in children {
        let len = child.char_len();
        let span = pos..pos + len;
        pos += len;

        match child {
            Node::LineBreak => {
                if !(range.start < span.start && span.start < range.end) {
                    out.push(Node::LineBreak);
                }
            }
            child if !overlaps(&span, range) => out.push(child),
            Node::Text(text) => {
                let keep_before = range.start.saturating_sub(span.start);
                let keep_from = (range.end - span.start).min(len);
                let kept: String = text
                    .chars()
                    .enumerate()
                    .filter(|(index, _)| *index < keep_before || *index >= keep_from)
                    .map(|(_, c)| c)
                    .collect();
                out.push(Node::Text(kept));
            }
            Node::Element { style, children } => {
                let inner = delete_nodes(children, &shift(range, span.start));
                out.push(Node::element(style, inner));
            }
        }
    }
    out
}

fn lines_to_list_items(group: Vec<Node>) -> Vec<Node> {
    let mut items = Vec::new();
    let mut line = Vec::new();

    fn finish(items: &mut Vec<Node>, line: &mut Vec<Node>) {
        if !line.is_empty() {
            items.push(Node::element(Style::ListItem, std::mem::take(line)));
        }
    }

    for node in group {
        match node {
            Node::LineBreak => finish(&mut items, &mut line),
            Node::Element {
                style: Style::List(_),
                children,
            } => {
                finish(&mut items, &mut line);
                // Lists stay one level deep: fold existing items in
                for child in children {
                    match child {
                        item @ Node::Element {
                            style: Style::ListItem,
                            ..
                        } => items.push(item),
                        other => items.push(Node::element(Style::ListItem, vec![other])),
                    }
                }
            }
            block if block.is_block() => {
                finish(&mut items, &mut line);
                items.push(Node::element(Style::ListItem, vec![block]));
            }
            inline => line.push(inline),
        }
    }
    finish(&mut items, &mut line);
    items
}

/// Unwrapped lines must not run into inline neighbours at `at`
fn separate_lines(nodes: &[Node], at: usize, mut replacement: Vec<Node>) -> Vec<Node> {
    let inline = |node: Option<&Node>| matches!(node, Some(node) if !node.is_block() && *node != Node::LineBreak);
    if inline(replacement.last()) && inline(nodes.get(at)) {
        replacement.push(Node::LineBreak);
    }
    if at > 0 && inline(replacement.first()) && inline(nodes.get(at - 1)) {
        replacement.insert(0, Node::LineBreak);
    }
    replacement
}

fn list_items_to_lines(items: Vec<Node>) -> Vec<Node> {
    let mut out = Vec::new();
    for (index, item) in items.into_iter().enumerate() {
        if index > 0 {
            out.push(Node::LineBreak);
        }
        match item {
            Node::Element {
                style: Style::ListItem,
                children,
            } => out.extend(children),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn doc(markup: &str) -> Document {
        Document::parse(markup)
    }

    #[test]
    fn test_wrap_splits_text_run() {
        let mut d = doc("Hello world");
        assert!(d.wrap_inline(6..11, Style::Bold));
        insta::assert_snapshot!(d.to_markup(), @"Hello <b>world</b>");
    }

    #[test]
    fn test_wrap_across_existing_styles() {
        let mut d = doc("ab<i>cd</i>ef");
        d.wrap_inline(1..5, Style::Bold);
        insta::assert_snapshot!(d.to_markup(), @"a<b>b<i>cd</i>e</b>f");
    }

    #[test]
    fn test_wrap_merges_with_adjacent_same_style() {
        let mut d = doc("<b>ab</b>cd");
        d.wrap_inline(2..4, Style::Bold);
        assert_eq!(d.to_markup(), "<b>abcd</b>");
    }

    #[test]
    fn test_wrap_inside_list_keeps_items() {
        let mut d = doc("<ul><li>one</li><li>two</li></ul>");
        d.wrap_inline(1..5, Style::Underline);
        assert_eq!(d.to_markup(), "<ul><li>o<u>ne</u></li><li><u>tw</u>o</li></ul>");
    }

    #[test]
    fn test_toggle_removes_when_fully_covered() {
        let mut d = doc("say <b>I do</b> now");
        assert!(d.style_covers(5..7, StyleKind::Bold));
        d.toggle_inline(5..7, Style::Bold);
        insta::assert_snapshot!(d.to_markup(), @"say <b>I</b> d<b>o</b> now");
    }

    #[test]
    fn test_toggle_applies_when_partially_covered() {
        let mut d = doc("say <b>I</b> do");
        assert!(!d.style_covers(4..8, StyleKind::Bold));
        d.toggle_inline(4..8, Style::Bold);
        assert_eq!(d.to_markup(), "say <b>I do</b>");
    }

    #[test]
    fn test_recolor_replaces_existing_color() {
        let mut d = doc(r#"<span style="color: red">roses</span>"#);
        d.recolor(0..5, "#2255aa");
        assert_eq!(d.to_markup(), r#"<span style="color: #2255aa">roses</span>"#);
    }

    #[test]
    fn test_set_list_from_lines() {
        let mut d = doc("Welcome<br>Vows<br>Rings");
        d.set_list(0..12, ListKind::Unordered);
        assert_eq!(d.to_markup(), "<ul><li>Welcome</li><li>Vows</li><li>Rings</li></ul>");
    }

    #[test]
    fn test_set_list_collapsed_touches_one_line() {
        let mut d = doc("Welcome<br>Vows<br>Rings");
        d.set_list(9..9, ListKind::Ordered);
        assert_eq!(d.to_markup(), "Welcome<br><ol><li>Vows</li></ol><br>Rings");
    }

    #[test]
    fn test_set_same_list_kind_unwraps() {
        let mut d = doc("<ol><li>a</li><li>b</li></ol>");
        d.set_list(0..0, ListKind::Ordered);
        assert_eq!(d.to_markup(), "a<br>b");
    }

    #[test]
    fn test_unwrapped_lines_stay_apart_from_neighbours() {
        let mut d = doc("Intro<ol><li>a</li><li>b</li></ol>Outro");
        d.set_list(5..6, ListKind::Ordered);
        assert_eq!(d.to_markup(), "Intro<br>a<br>b<br>Outro");

        let mut d = doc(r#"<div style="text-align: right">Title</div>Body"#);
        d.set_alignment(0..0, Alignment::Left);
        assert_eq!(d.to_markup(), "Title<br>Body");
    }

    #[test]
    fn test_set_other_list_kind_switches() {
        let mut d = doc("<ol><li>a</li><li>b</li></ol>");
        d.set_list(0..2, ListKind::Unordered);
        assert_eq!(d.to_markup(), "<ul><li>a</li><li>b</li></ul>");
    }

    #[test]
    fn test_alignment_wrap_rewrap_and_unwrap() {
        let mut d = doc("Title<br>Body");
        d.set_alignment(0..0, Alignment::Center);
        assert_eq!(d.to_markup(), r#"<div style="text-align: center">Title</div><br>Body"#);

        d.set_alignment(2..2, Alignment::Right);
        assert_eq!(d.to_markup(), r#"<div style="text-align: right">Title</div><br>Body"#);

        d.set_alignment(2..2, Alignment::Left);
        assert_eq!(d.to_markup(), "Title<br>Body");
    }

    #[test]
    fn test_block_commands_on_empty_document_do_nothing() {
        let mut d = Document::new();
        assert!(!d.set_list(0..0, ListKind::Unordered));
        assert!(!d.set_alignment(0..0, Alignment::Center));
    }

    #[rstest]
    #[case::bold(Style::Bold)]
    #[case::italic(Style::Italic)]
    #[case::underline(Style::Underline)]
    #[case::size(Style::FontSize(20))]
    #[case::color(Style::Color("green".to_string()))]
    fn test_inline_styles_preserve_plain_text(#[case] style: Style) {
        let mut d = doc("We <i>are</i> gathered<br>here <b>today</b>");
        let before = d.plain_text();
        for range in [0..3, 2..9, 5..20, 0..before.chars().count()] {
            d.toggle_inline(range, style.clone());
            assert_eq!(d.plain_text(), before);
        }
    }

    #[rstest]
    #[case(0..0)]
    #[case(3..12)]
    #[case(0..17)]
    fn test_block_styles_preserve_plain_text(#[case] range: Range<usize>) {
        let mut d = doc("We are<br>gathered<br>here");
        let before = d.plain_text();
        d.set_list(range.clone(), ListKind::Unordered);
        assert_eq!(d.plain_text(), before);
        d.set_alignment(range.clone(), Alignment::Center);
        assert_eq!(d.plain_text(), before);
        d.set_list(range, ListKind::Ordered);
        assert_eq!(d.plain_text(), before);
    }

    #[test]
    fn test_insert_text_inherits_left_formatting() {
        let mut d = doc("<b>I do</b> vow");
        let count = d.insert_text(4, " so", &[]);
        assert_eq!(count, 3);
        assert_eq!(d.to_markup(), "<b>I do so</b> vow");
    }

    #[test]
    fn test_insert_text_with_typing_styles_and_newline() {
        let mut d = doc("Hello world");
        d.insert_text(5, "!\nX", &[Style::Color("red".to_string())]);
        assert_eq!(
            d.to_markup(),
            r#"Hello<span style="color: red">!<br>X</span> world"#
        );
        assert_eq!(d.plain_text(), "Hello!X world");
    }

    #[test]
    fn test_insert_into_empty_document() {
        let mut d = Document::new();
        d.insert_text(0, "First words", &[]);
        assert_eq!(d.to_markup(), "First words");
    }

    #[test]
    fn test_insert_at_start_goes_into_first_run() {
        let mut d = doc("<ul><li>vows</li></ul>");
        d.insert_text(0, "- ", &[]);
        assert_eq!(d.to_markup(), "<ul><li>- vows</li></ul>");
    }

    #[test]
    fn test_delete_range_across_runs() {
        let mut d = doc("ab<b>cd</b><br>ef");
        d.delete_range(1..5);
        assert_eq!(d.to_markup(), "af");
    }

    #[test]
    fn test_delete_keeps_boundary_line_breaks() {
        let mut d = doc("ab<br>cd");
        d.delete_range(2..4);
        assert_eq!(d.to_markup(), "ab<br>");
    }

    #[test]
    fn test_typing_after_trailing_line_break() {
        let mut d = doc("abc");
        let caret = d.insert_at(&[0], 3, "\n", &[]).unwrap();
        assert_eq!(caret, (vec![], 2));
        let caret = d.insert_at(&caret.0, caret.1, "def", &[]).unwrap();
        assert_eq!(caret, (vec![2], 3));
        assert_eq!(d.to_markup(), "abc<br>def");
    }

    #[test]
    fn test_insert_at_with_style_returns_caret_inside_run() {
        let mut d = doc("Hello world");
        let caret = d.insert_at(&[0], 5, "!", &[Style::Bold]).unwrap();
        assert_eq!(caret, (vec![1, 0], 1));
        let caret = d.insert_at(&caret.0, caret.1, "!", &[]).unwrap();
        assert_eq!(caret, (vec![1, 0], 2));
        assert_eq!(d.to_markup(), "Hello<b>!!</b> world");
    }

    #[test]
    fn test_delete_before_removes_breaks_then_characters() {
        let mut d = doc("abc<br>");
        assert_eq!(d.delete_before(&[], 2), Some((vec![], 1)));
        assert_eq!(d.to_markup(), "abc");
        assert_eq!(d.delete_before(&[], 1), Some((vec![0], 2)));
        assert_eq!(d.to_markup(), "ab");
    }

    #[test]
    fn test_delete_before_crosses_into_previous_run() {
        let mut d = doc("<b>ab</b>cd");
        assert_eq!(d.delete_before(&[1], 0), Some((vec![0, 0], 1)));
        assert_eq!(d.to_markup(), "<b>a</b>cd");
    }

    #[test]
    fn test_delete_before_at_document_start() {
        let mut d = doc("abc");
        assert_eq!(d.delete_before(&[0], 0), None);
        assert_eq!(d.to_markup(), "abc");
    }

    #[test]
    fn test_caret_stops_include_line_starts() {
        let d = doc("a<br><b>c</b>");
        let stops: Vec<(NodePath, usize, usize)> = d
            .caret_stops()
            .into_iter()
            .map(|stop| (stop.path, stop.offset, stop.linear))
            .collect();
        assert_eq!(
            stops,
            vec![(vec![0], 0, 0), (vec![0], 1, 1), (vec![], 2, 1), (vec![2, 0], 1, 2)]
        );
    }
}
