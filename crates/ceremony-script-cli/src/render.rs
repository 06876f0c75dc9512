use std::ops::Range;
use std::str::FromStr;

use ceremony_script_engine::{Alignment, ListKind, Node, NodePath, Position, Style as NodeStyle};
use ratatui::{
    layout,
    style::{Color, Modifier, Style},
    text::{Line, Span},
};

const CARET: &str = "▏";

/// Turn a document into terminal lines: inline styles become span styles,
/// line breaks and blocks start new lines, list items get markers. A
/// collapsed selection is drawn as a caret, a range as reversed text.
pub fn render_document(
    nodes: &[Node],
    caret: Option<&Position>,
    selected: Option<Range<usize>>,
) -> Vec<Line<'static>> {
    let mut renderer = Renderer {
        lines: Vec::new(),
        spans: Vec::new(),
        alignment: None,
        caret,
        selected: selected.filter(|range| !range.is_empty()),
        pos: 0,
    };
    renderer.walk(nodes, &mut Vec::new(), Style::default());
    renderer.finish_line(false);
    if renderer.lines.is_empty() {
        renderer.lines.push(Line::default());
    }
    renderer.lines
}

struct Renderer<'a> {
    lines: Vec<Line<'static>>,
    spans: Vec<Span<'static>>,
    alignment: Option<layout::Alignment>,
    caret: Option<&'a Position>,
    selected: Option<Range<usize>>,
    pos: usize,
}

impl Renderer<'_> {
    fn walk(&mut self, nodes: &[Node], path: &mut NodePath, style: Style) {
        for (index, node) in nodes.iter().enumerate() {
            self.caret_at_container(path, index);
            self.node(index, node, path, style);
        }
        self.caret_at_container(path, nodes.len());
    }

    fn node(&mut self, index: usize, node: &Node, path: &mut NodePath, style: Style) {
        path.push(index);
        match node {
            Node::Text(text) => self.push_text(text, path, style),
            Node::LineBreak => self.finish_line(true),
            Node::Element { style: node_style, children } => {
                self.element(node_style, children, path, style);
            }
        }
        path.pop();
    }

    fn element(&mut self, node_style: &NodeStyle, children: &[Node], path: &mut NodePath, style: Style) {
        match node_style {
            NodeStyle::List(kind) => {
                self.finish_line(false);
                for (index, item) in children.iter().enumerate() {
                    self.caret_at_container(path, index);
                    let marker = match kind {
                        ListKind::Unordered => "• ".to_string(),
                        ListKind::Ordered => format!("{}. ", index + 1),
                    };
                    self.spans.push(Span::styled(marker, Style::default().fg(Color::DarkGray)));
                    if let Node::Element {
                        style: NodeStyle::ListItem,
                        children: item_children,
                    } = item
                    {
                        path.push(index);
                        self.walk(item_children, path, style);
                        path.pop();
                    } else {
                        self.node(index, item, path, style);
                    }
                    self.finish_line(false);
                }
                self.caret_at_container(path, children.len());
            }
            NodeStyle::ListItem | NodeStyle::Block => {
                self.finish_line(false);
                self.walk(children, path, style);
                self.finish_line(false);
            }
            NodeStyle::Align(alignment) => {
                self.finish_line(false);
                let outer = self.alignment.replace(match alignment {
                    Alignment::Left => layout::Alignment::Left,
                    Alignment::Center => layout::Alignment::Center,
                    Alignment::Right => layout::Alignment::Right,
                });
                self.walk(children, path, style);
                self.finish_line(false);
                self.alignment = outer;
            }
            inline => self.walk(children, path, apply_inline(style, inline)),
        }
    }

    fn push_text(&mut self, text: &str, path: &NodePath, style: Style) {
        let caret = self
            .caret
            .filter(|caret| caret.path == *path && self.selected.is_none())
            .map(|caret| caret.offset);

        let mut run = String::new();
        let mut run_selected = false;
        for (local, ch) in text.chars().enumerate() {
            let is_selected = self.selected.as_ref().is_some_and(|range| range.contains(&(self.pos + local)));
            if caret == Some(local) || is_selected != run_selected {
                self.flush_run(&mut run, style, run_selected);
                run_selected = is_selected;
            }
            if caret == Some(local) {
                self.push_caret();
            }
            run.push(ch);
        }
        self.flush_run(&mut run, style, run_selected);

        let len = text.chars().count();
        if caret.is_some_and(|offset| offset >= len) {
            self.push_caret();
        }
        self.pos += len;
    }

    fn flush_run(&mut self, run: &mut String, style: Style, selected: bool) {
        if run.is_empty() {
            return;
        }
        let style = if selected {
            style.add_modifier(Modifier::REVERSED)
        } else {
            style
        };
        self.spans.push(Span::styled(std::mem::take(run), style));
    }

    fn caret_at_container(&mut self, path: &NodePath, child_index: usize) {
        if self.selected.is_none()
            && let Some(caret) = self.caret
            && caret.path == *path
            && caret.offset == child_index
        {
            self.push_caret();
        }
    }

    fn push_caret(&mut self) {
        self.spans.push(Span::styled(CARET, Style::default().fg(Color::Yellow)));
    }

    /// End the current line. Blocks only end a line that has content; a
    /// line break always does.
    fn finish_line(&mut self, force: bool) {
        if !force && self.spans.is_empty() {
            return;
        }
        let spans = std::mem::take(&mut self.spans);
        let mut line = Line::from(spans);
        if let Some(alignment) = self.alignment {
            line = line.alignment(alignment);
        }
        self.lines.push(line);
    }
}

fn apply_inline(style: Style, node_style: &NodeStyle) -> Style {
    match node_style {
        NodeStyle::Bold => style.add_modifier(Modifier::BOLD),
        NodeStyle::Italic => style.add_modifier(Modifier::ITALIC),
        NodeStyle::Underline => style.add_modifier(Modifier::UNDERLINED),
        NodeStyle::Color(css) => match Color::from_str(css.trim()) {
            Ok(color) => style.fg(color),
            Err(_) => style,
        },
        // Terminals have one font size
        _ => style,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ceremony_script_engine::Document;
    use pretty_assertions::assert_eq;

    fn plain(lines: &[Line<'_>]) -> Vec<String> {
        lines
            .iter()
            .map(|line| line.spans.iter().map(|span| span.content.as_ref()).collect())
            .collect()
    }

    #[test]
    fn test_line_breaks_and_lists_become_lines() {
        let doc = Document::parse("Welcome<br><ol><li>Vows</li><li>Rings</li></ol>Kiss");
        let lines = render_document(doc.nodes(), None, None);
        assert_eq!(plain(&lines), vec!["Welcome", "1. Vows", "2. Rings", "Kiss"]);
    }

    #[test]
    fn test_caret_inside_text_and_after_break() {
        let doc = Document::parse("ab<br>");
        let in_text = render_document(doc.nodes(), Some(&Position::new(vec![0], 1)), None);
        assert_eq!(plain(&in_text), vec!["a▏b"]);

        let after_break = render_document(doc.nodes(), Some(&Position::new(vec![], 2)), None);
        assert_eq!(plain(&after_break), vec!["ab", "▏"]);
    }

    #[test]
    fn test_selection_is_reversed() {
        let doc = Document::parse("Hello <b>world</b>");
        let lines = render_document(doc.nodes(), Some(&Position::new(vec![1, 0], 2)), Some(3..8));
        let spans: Vec<(String, bool)> = lines[0]
            .spans
            .iter()
            .map(|span| {
                (
                    span.content.to_string(),
                    span.style.add_modifier.contains(Modifier::REVERSED),
                )
            })
            .collect();
        assert_eq!(
            spans,
            vec![
                ("Hel".to_string(), false),
                ("lo ".to_string(), true),
                ("wo".to_string(), true),
                ("rld".to_string(), false),
            ]
        );
        assert!(lines[0].spans[2].style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn test_alignment_and_color() {
        let doc = Document::parse(r#"<div style="text-align: center"><span style="color: red">Rise</span></div>"#);
        let lines = render_document(doc.nodes(), None, None);
        let line = lines.iter().find(|line| !line.spans.is_empty()).unwrap();
        assert_eq!(line.alignment, Some(layout::Alignment::Center));
        assert_eq!(line.spans[0].style.fg, Some(Color::Red));
    }
}
