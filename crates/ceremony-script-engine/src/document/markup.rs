//! HTML-subset codec for serialized script content.
//!
//! Recognised tags: `b`/`strong`, `i`/`em`, `u`, `span` and `font` carrying a
//! color or font size, `ul`/`ol`/`li`, `div`/`p` with optional alignment and
//! `br`. Any other tag is transparent: its children are kept and the tag
//! itself is dropped.

use std::sync::OnceLock;

use logos::Logos;
use regex::Regex;

use super::{Alignment, ListKind, Node, Style};

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    #[regex(r"</[A-Za-z][A-Za-z0-9]*[^>]*>")]
    CloseTag,
    #[regex(r"<[A-Za-z][A-Za-z0-9]*[^>]*>")]
    OpenTag,
    #[regex(r"[^<]+")]
    Text,
    #[token("<")]
    Lt,
}

const VOID_TAGS: &[&str] = &[
    "area", "base", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track", "wbr",
];

struct Frame {
    tag: String,
    styles: Vec<Style>,
    children: Vec<Node>,
}

impl Frame {
    fn root() -> Self {
        Self {
            tag: String::new(),
            styles: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Wrap children innermost-first so the first style ends up outermost
    fn into_nodes(self) -> Vec<Node> {
        let mut nodes = self.children;
        for style in self.styles.into_iter().rev() {
            nodes = vec![Node::element(style, nodes)];
        }
        nodes
    }
}

pub(super) fn parse(markup: &str) -> Vec<Node> {
    let mut stack = vec![Frame::root()];
    let mut lexer = Token::lexer(markup);

    while let Some(token) = lexer.next() {
        let slice = lexer.slice();
        match token {
            Ok(Token::Text) => push_text(&mut stack, &html_escape::decode_html_entities(slice)),
            Ok(Token::OpenTag) => {
                let name = tag_name(slice);
                if name == "br" {
                    push_node(&mut stack, Node::LineBreak);
                } else if VOID_TAGS.contains(&name.as_str()) {
                    continue;
                } else {
                    let styles = styles_for(&name, slice);
                    stack.push(Frame {
                        tag: name,
                        styles,
                        children: Vec::new(),
                    });
                }
            }
            Ok(Token::CloseTag) => {
                let name = tag_name(slice);
                // Unmatched closing tags are ignored
                if let Some(depth) = stack.iter().skip(1).rposition(|frame| frame.tag == name) {
                    let target = depth + 1;
                    while stack.len() > target {
                        close_frame(&mut stack);
                    }
                }
            }
            Ok(Token::Lt) | Err(_) => push_text(&mut stack, slice),
        }
    }

    while stack.len() > 1 {
        close_frame(&mut stack);
    }
    stack.pop().map(|root| root.children).unwrap_or_default()
}

fn push_text(stack: &mut [Frame], text: &str) {
    push_node(stack, Node::text(text));
}

fn push_node(stack: &mut [Frame], node: Node) {
    if let Some(frame) = stack.last_mut() {
        frame.children.push(node);
    }
}

fn close_frame(stack: &mut Vec<Frame>) {
    if let Some(frame) = stack.pop() {
        let nodes = frame.into_nodes();
        if let Some(parent) = stack.last_mut() {
            parent.children.extend(nodes);
        }
    }
}

fn tag_name(slice: &str) -> String {
    slice
        .trim_start_matches('<')
        .trim_start_matches('/')
        .chars()
        .take_while(char::is_ascii_alphanumeric)
        .collect::<String>()
        .to_ascii_lowercase()
}

fn styles_for(name: &str, tag: &str) -> Vec<Style> {
    match name {
        "b" | "strong" => vec![Style::Bold],
        "i" | "em" => vec![Style::Italic],
        "u" => vec![Style::Underline],
        "ul" => vec![Style::List(ListKind::Unordered)],
        "ol" => vec![Style::List(ListKind::Ordered)],
        "li" => vec![Style::ListItem],
        "span" | "font" => {
            let mut styles = Vec::new();
            let color = declaration(tag, "color").or_else(|| attribute(tag, "color"));
            if let Some(color) = color.filter(|c| !c.is_empty()) {
                styles.push(Style::Color(color));
            }
            if let Some(size) = declaration(tag, "font-size").and_then(|v| parse_pixels(&v)) {
                styles.push(Style::FontSize(size));
            }
            styles
        }
        "div" | "p" => {
            let alignment = declaration(tag, "text-align")
                .or_else(|| attribute(tag, "align"))
                .and_then(|value| Alignment::from_css(&value));
            match alignment {
                Some(alignment) => vec![Style::Align(alignment)],
                None => vec![Style::Block],
            }
        }
        _ => Vec::new(),
    }
}

fn attribute_regex() -> &'static Regex {
    static ATTRIBUTE_REGEX: OnceLock<Regex> = OnceLock::new();
    ATTRIBUTE_REGEX.get_or_init(|| {
        Regex::new(r#"([A-Za-z-]+)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>/]+))"#)
            .expect("Invalid attribute regex")
    })
}

fn attribute(tag: &str, wanted: &str) -> Option<String> {
    attribute_regex().captures_iter(tag).find_map(|captures| {
        let name = captures.get(1)?.as_str();
        if !name.eq_ignore_ascii_case(wanted) {
            return None;
        }
        let value = captures
            .get(2)
            .or_else(|| captures.get(3))
            .or_else(|| captures.get(4))?
            .as_str();
        Some(html_escape::decode_html_entities(value).trim().to_string())
    })
}

/// Value of a CSS declaration inside the tag's `style` attribute
fn declaration(tag: &str, property: &str) -> Option<String> {
    let style = attribute(tag, "style")?;
    style.split(';').find_map(|decl| {
        let (name, value) = decl.split_once(':')?;
        name.trim()
            .eq_ignore_ascii_case(property)
            .then(|| value.trim().to_string())
    })
}

fn parse_pixels(value: &str) -> Option<u8> {
    let digits = value.trim().trim_end_matches("px").trim();
    digits.parse::<f32>().ok().map(|px| px.round().clamp(1.0, 255.0) as u8)
}

pub(super) fn serialize(nodes: &[Node]) -> String {
    let mut out = String::new();
    write_nodes(nodes, &mut out);
    out
}

fn write_nodes(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(&html_escape::encode_text(text)),
            Node::LineBreak => out.push_str("<br>"),
            Node::Element { style, children } => {
                let (open, close) = tags_for(style);
                out.push_str(&open);
                write_nodes(children, out);
                out.push_str(close);
            }
        }
    }
}

fn tags_for(style: &Style) -> (String, &'static str) {
    match style {
        Style::Bold => ("<b>".to_string(), "</b>"),
        Style::Italic => ("<i>".to_string(), "</i>"),
        Style::Underline => ("<u>".to_string(), "</u>"),
        Style::Color(color) => (
            format!(
                "<span style=\"color: {}\">",
                html_escape::encode_double_quoted_attribute(color)
            ),
            "</span>",
        ),
        Style::FontSize(px) => (format!("<span style=\"font-size: {px}px\">"), "</span>"),
        Style::List(ListKind::Unordered) => ("<ul>".to_string(), "</ul>"),
        Style::List(ListKind::Ordered) => ("<ol>".to_string(), "</ol>"),
        Style::ListItem => ("<li>".to_string(), "</li>"),
        Style::Align(alignment) => (
            format!("<div style=\"text-align: {}\">", alignment.as_css()),
            "</div>",
        ),
        Style::Block => ("<div>".to_string(), "</div>"),
    }
}

/// Serialized content with every tag removed. Entities are left encoded,
/// so stripping already-stripped text changes nothing.
pub fn strip_markup(content: &str) -> String {
    let mut out = strip_tags(content);
    // Dropping a tag can join the halves of another one
    while has_markup(&out) {
        out = strip_tags(&out);
    }
    out
}

/// What a reader sees: tags removed, then entities decoded once.
pub fn visible_text(content: &str) -> String {
    html_escape::decode_html_entities(&strip_markup(content)).into_owned()
}

fn strip_tags(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut lexer = Token::lexer(content);
    while let Some(token) = lexer.next() {
        match token {
            Ok(Token::Text) | Ok(Token::Lt) | Err(_) => out.push_str(lexer.slice()),
            Ok(Token::OpenTag) | Ok(Token::CloseTag) => {}
        }
    }
    out
}

/// Whether the content contains any structural markup at all
pub fn has_markup(content: &str) -> bool {
    Token::lexer(content).any(|token| matches!(token, Ok(Token::OpenTag) | Ok(Token::CloseTag)))
}
