use crate::document::{Alignment, Document, Leaf, ListKind, NodePath, Style, StyleKind};
use crate::editing::selection::{self, SelectionOffsets};
use crate::editing::FormatCommand;

/// One end of a selection: a node plus a local offset.
///
/// When `path` addresses a text leaf, `offset` counts characters into it.
/// When it addresses an element (or the container itself, `[]`), `offset` is
/// a child index, exactly like a DOM range boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    pub path: NodePath,
    pub offset: usize,
}

impl Position {
    pub fn new(path: NodePath, offset: usize) -> Self {
        Self { path, offset }
    }

    /// Position 0 in the container itself
    pub fn container_start() -> Self {
        Self::new(Vec::new(), 0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub anchor: Position,
    pub focus: Position,
}

impl Selection {
    pub fn new(anchor: Position, focus: Position) -> Self {
        Self { anchor, focus }
    }

    pub fn collapsed(at: Position) -> Self {
        Self::new(at.clone(), at)
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }
}

/// Styles waiting for the next typed characters at a collapsed cursor:
/// styles to add, and kinds to leave when the caret sits inside them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypingStyle {
    styles: Vec<Style>,
    cleared: Vec<StyleKind>,
}

impl TypingStyle {
    /// Set a style, replacing anything pending for the same kind
    pub fn set(&mut self, style: Style) {
        self.remove(&style);
        self.styles.push(style);
    }

    /// Add the style, or drop it if it is already pending
    pub fn toggle(&mut self, style: Style) {
        if self.styles.contains(&style) {
            self.remove(&style);
        } else {
            self.set(style);
        }
    }

    /// Mark `kind` to be left by the next typed characters, or undo that
    /// if it is already marked
    pub fn toggle_cleared(&mut self, kind: StyleKind) {
        if self.cleared.contains(&kind) {
            self.cleared.retain(|cleared| *cleared != kind);
        } else {
            self.styles.retain(|pending| pending.kind() != kind);
            self.cleared.push(kind);
        }
    }

    pub fn remove(&mut self, style: &Style) {
        let kind = style.kind();
        self.styles.retain(|pending| pending.kind() != kind);
        self.cleared.retain(|cleared| *cleared != kind);
    }

    pub fn styles(&self) -> &[Style] {
        &self.styles
    }

    pub fn cleared(&self) -> &[StyleKind] {
        &self.cleared
    }

    pub fn color(&self) -> Option<&str> {
        self.styles.iter().find_map(|style| match style {
            Style::Color(color) => Some(color.as_str()),
            _ => None,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty() && self.cleared.is_empty()
    }

    pub fn clear(&mut self) {
        self.styles.clear();
        self.cleared.clear();
    }
}

/// The live editing surface: the document being edited, the active
/// selection, focus, the pending typing style and the font size for new
/// text.
#[derive(Debug, Clone, Default)]
pub struct EditorSurface {
    document: Document,
    selection: Option<Selection>,
    focused: bool,
    typing_style: TypingStyle,
    font_size: Option<u8>,
}

impl EditorSurface {
    pub fn new(document: Document) -> Self {
        Self {
            document,
            ..Self::default()
        }
    }

    pub fn from_markup(markup: &str) -> Self {
        Self::new(Document::parse(markup))
    }

    pub fn focus(&mut self) {
        self.focused = true;
    }

    pub fn blur(&mut self) {
        self.focused = false;
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub(crate) fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    /// Serialized content of the surface
    pub fn content(&self) -> String {
        self.document.to_markup()
    }

    /// Leaf text-bearing nodes in document order
    pub fn leaves(&self) -> Vec<Leaf<'_>> {
        self.document.leaves()
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    /// User-driven selection change; drops any pending typing style.
    pub fn set_selection(&mut self, selection: Option<Selection>) {
        if self.selection != selection {
            self.typing_style.clear();
        }
        self.selection = selection;
    }

    /// Programmatic selection change that keeps the pending typing style
    pub(crate) fn restore_selection(&mut self, selection: Selection) {
        self.selection = Some(selection);
    }

    pub fn typing_style(&self) -> &TypingStyle {
        &self.typing_style
    }

    pub fn typing_style_mut(&mut self) -> &mut TypingStyle {
        &mut self.typing_style
    }

    /// Size every newly typed run gets unless a pending style says
    /// otherwise. `None` is the default size and adds no markup.
    pub fn font_size(&self) -> Option<u8> {
        self.font_size
    }

    pub fn set_font_size(&mut self, size: Option<u8>) {
        self.font_size = size;
    }

    /// Replace the whole document. The old selection no longer addresses
    /// anything, so it is dropped.
    pub fn replace_content(&mut self, markup: &str) {
        self.document = Document::parse(markup);
        self.selection = None;
        self.typing_style.clear();
    }

    /// Run a named structural mutation against the current selection.
    ///
    /// Returns false when there is no selection or nothing was changed.
    /// Selection paths may be stale afterwards; callers restore the
    /// selection through linear offsets.
    pub fn exec(&mut self, command: &FormatCommand) -> bool {
        let Some(offsets) = selection::capture_offsets(self) else {
            return false;
        };
        let range = offsets.range();

        match command {
            FormatCommand::Bold => self.toggle_inline(offsets, Style::Bold),
            FormatCommand::Italic => self.toggle_inline(offsets, Style::Italic),
            FormatCommand::Underline => self.toggle_inline(offsets, Style::Underline),
            FormatCommand::FontSize(px) => {
                if offsets.is_collapsed() {
                    self.typing_style.set(Style::FontSize(*px));
                    true
                } else {
                    self.document.wrap_inline(range, Style::FontSize(*px))
                }
            }
            FormatCommand::UnorderedList => self.document.set_list(range, ListKind::Unordered),
            FormatCommand::OrderedList => self.document.set_list(range, ListKind::Ordered),
            FormatCommand::AlignLeft => self.document.set_alignment(range, Alignment::Left),
            FormatCommand::AlignCenter => self.document.set_alignment(range, Alignment::Center),
            FormatCommand::AlignRight => self.document.set_alignment(range, Alignment::Right),
        }
    }

    fn toggle_inline(&mut self, offsets: SelectionOffsets, style: Style) -> bool {
        if !offsets.is_collapsed() {
            return self.document.toggle_inline(offsets.range(), style);
        }
        let kind = style.kind();
        let inside = self
            .selection
            .as_ref()
            .is_some_and(|s| self.document.styles_at(&s.focus.path).iter().any(|at| at.kind() == kind));
        if inside {
            self.typing_style.toggle_cleared(kind);
        } else {
            self.typing_style.toggle(style);
        }
        true
    }

    /// Type text at the selection, replacing a selected range.
    ///
    /// Pending typing styles and the surface font size wrap the new
    /// characters unless the caret already carries them; pending cleared
    /// kinds are split off around them. The typing style is then consumed.
    pub fn insert_text(&mut self, text: &str) -> bool {
        let Some(caret) = self.caret_for_edit() else {
            return false;
        };
        let start = selection::linear_offset(&self.document, &caret);
        let carried: Vec<Style> = self.document.styles_at(&caret.path).into_iter().cloned().collect();

        let mut styles = self.typing_style.styles().to_vec();
        if let Some(px) = self.font_size
            && !styles.iter().any(|style| style.kind() == StyleKind::FontSize)
        {
            styles.push(Style::FontSize(px));
        }
        styles.retain(|style| !carried.contains(style));
        let cleared: Vec<StyleKind> = self
            .typing_style
            .cleared()
            .iter()
            .copied()
            .filter(|kind| carried.iter().any(|style| style.kind() == *kind))
            .collect();

        let Some((path, offset)) = self.document.insert_at(&caret.path, caret.offset, text, &styles) else {
            return false;
        };
        self.typing_style.clear();
        self.selection = Some(Selection::collapsed(Position::new(path, offset)));

        if let Some(start) = start
            && !cleared.is_empty()
        {
            let end = start + text.chars().filter(|c| *c != '\n' && *c != '\r').count();
            for kind in cleared {
                self.document.unwrap_inline(start..end, kind);
            }
            selection::restore_offsets(self, SelectionOffsets::collapsed(end));
        }
        true
    }

    /// Backspace: delete the selected range, or the character or line break
    /// before the caret.
    pub fn delete_backward(&mut self) -> bool {
        let Some(offsets) = selection::capture_offsets(self) else {
            return false;
        };
        if !offsets.is_collapsed() {
            return self.caret_for_edit().is_some();
        }
        let Some(focus) = self.selection.as_ref().map(|s| s.focus.clone()) else {
            return false;
        };
        match self.document.delete_before(&focus.path, focus.offset) {
            Some((path, offset)) => {
                self.set_selection(Some(Selection::collapsed(Position::new(path, offset))));
                true
            }
            None => false,
        }
    }

    /// Move the caret by `delta` caret stops. With `extend` the anchor stays
    /// put and the selection grows or shrinks.
    pub fn move_caret(&mut self, delta: isize, extend: bool) {
        let stops = self.document.caret_stops();
        let current = self
            .selection
            .as_ref()
            .map(|s| s.focus.clone())
            .unwrap_or_else(Position::container_start);

        let index = stops
            .iter()
            .position(|stop| stop.path == current.path && stop.offset == current.offset)
            .or_else(|| {
                let linear = selection::linear_offset(&self.document, &current)?;
                stops.iter().position(|stop| stop.linear >= linear)
            })
            .unwrap_or(0);
        let target = index.saturating_add_signed(delta).min(stops.len() - 1);
        let stop = &stops[target];
        let focus = Position::new(stop.path.clone(), stop.offset);

        let selection = match (&self.selection, extend) {
            (Some(existing), true) => Selection::new(existing.anchor.clone(), focus),
            _ => Selection::collapsed(focus),
        };
        self.set_selection(Some(selection));
    }

    /// Collapse a selected range by deleting it, returning the caret to
    /// insert at.
    fn caret_for_edit(&mut self) -> Option<Position> {
        let offsets = selection::capture_offsets(self)?;
        if offsets.is_collapsed() {
            return self.selection.as_ref().map(|s| s.focus.clone());
        }
        self.document.delete_range(offsets.range());
        selection::restore_offsets(self, SelectionOffsets::collapsed(offsets.start));
        self.selection.as_ref().map(|s| s.focus.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn surface_with_caret(markup: &str, offset: usize) -> EditorSurface {
        let mut surface = EditorSurface::from_markup(markup);
        selection::restore_offsets(&mut surface, SelectionOffsets::collapsed(offset));
        surface
    }

    #[test]
    fn test_typing_replaces_selected_range() {
        let mut surface = EditorSurface::from_markup("We are gathered");
        selection::restore_offsets(&mut surface, SelectionOffsets::new(3, 6));
        assert!(surface.insert_text("were"));
        assert_eq!(surface.document().plain_text(), "We were gathered");
        assert_eq!(selection::capture_offsets(&surface), Some(SelectionOffsets::collapsed(7)));
    }

    #[test]
    fn test_typing_without_selection_is_rejected() {
        let mut surface = EditorSurface::from_markup("text");
        assert!(!surface.insert_text("x"));
        assert_eq!(surface.content(), "text");
    }

    #[test]
    fn test_typing_style_is_consumed_by_next_characters() {
        let mut surface = surface_with_caret("Hello world", 5);
        surface.typing_style_mut().set(Style::Color("red".to_string()));
        surface.insert_text(",");
        surface.insert_text(" dear");
        assert!(surface.typing_style().is_empty());
        assert_eq!(
            surface.content(),
            r#"Hello<span style="color: red">, dear</span> world"#
        );
    }

    #[test]
    fn test_moving_selection_clears_typing_style() {
        let mut surface = surface_with_caret("Hello", 2);
        surface.typing_style_mut().set(Style::Bold);
        surface.move_caret(1, false);
        assert!(surface.typing_style().is_empty());
    }

    #[test]
    fn test_enter_then_type_starts_a_new_line() {
        let mut surface = surface_with_caret("I do", 4);
        surface.insert_text("\n");
        surface.insert_text("I do too");
        assert_eq!(surface.content(), "I do<br>I do too");
    }

    #[test]
    fn test_backspace_joins_lines() {
        let mut surface = surface_with_caret("ab", 2);
        surface.insert_text("\n");
        assert!(surface.delete_backward());
        assert!(surface.delete_backward());
        assert_eq!(surface.content(), "a");
    }

    #[test]
    fn test_move_caret_extends_selection() {
        let mut surface = surface_with_caret("Hello", 0);
        surface.move_caret(3, true);
        assert_eq!(selection::capture_offsets(&surface), Some(SelectionOffsets::new(0, 3)));
        surface.move_caret(-10, false);
        assert_eq!(selection::capture_offsets(&surface), Some(SelectionOffsets::collapsed(0)));
    }

    #[test]
    fn test_exec_without_selection_reports_false() {
        let mut surface = EditorSurface::from_markup("Hello");
        assert!(!surface.exec(&FormatCommand::Bold));
        assert_eq!(surface.content(), "Hello");
    }

    #[rstest]
    #[case::middle_of_run(2, "<b>bo</b>X<b>ld</b> text")]
    #[case::end_of_run(4, "<b>bold</b>X text")]
    fn test_bold_at_caret_inside_bold_leaves_the_run(#[case] caret: usize, #[case] expected: &str) {
        let mut surface = surface_with_caret("<b>bold</b> text", caret);
        assert!(surface.exec(&FormatCommand::Bold));
        assert_eq!(surface.typing_style().cleared(), &[StyleKind::Bold]);

        surface.insert_text("X");

        assert_eq!(surface.content(), expected);
        assert!(surface.typing_style().is_empty());
        assert_eq!(
            selection::capture_offsets(&surface),
            Some(SelectionOffsets::collapsed(caret + 1))
        );
    }

    #[test]
    fn test_typing_after_leaving_a_run_stays_outside() {
        let mut surface = surface_with_caret("<i>vows</i>", 4);
        surface.exec(&FormatCommand::Italic);
        surface.insert_text("!");
        surface.insert_text("?");
        assert_eq!(surface.content(), "<i>vows</i>!?");
    }

    #[test]
    fn test_bold_toggled_twice_inside_bold_keeps_the_run() {
        let mut surface = surface_with_caret("<b>bold</b>", 2);
        surface.exec(&FormatCommand::Bold);
        surface.exec(&FormatCommand::Bold);
        assert!(surface.typing_style().is_empty());
        surface.insert_text("X");
        assert_eq!(surface.content(), "<b>boXld</b>");
    }

    #[test]
    fn test_pending_style_already_at_caret_does_not_nest() {
        let mut surface = surface_with_caret(r#"<span style="color: red">rose</span>"#, 2);
        surface.typing_style_mut().set(Style::Color("red".to_string()));
        surface.insert_text("X");
        assert_eq!(surface.content(), r#"<span style="color: red">roXse</span>"#);
    }
}
