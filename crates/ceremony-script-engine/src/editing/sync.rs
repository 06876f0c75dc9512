use crate::document::visible_text;
use crate::editing::selection::{self, SelectionOffsets};
use crate::editing::surface::EditorSurface;

/// What `reconcile` did to the surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Plain text already matched; the surface (and its caret) was left alone
    Unchanged,
    /// Surface content was fully replaced
    Replaced,
}

/// Keeps the application's copy of the content aligned with the surface.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentSynchronizer {
    content: String,
}

impl ContentSynchronizer {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }

    /// Application-side content
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Every input event: the surface is the source of truth.
    pub fn on_input(&mut self, surface: &EditorSurface) {
        self.content = surface.content();
    }

    /// Push out-of-band content into the surface.
    ///
    /// Markup is stripped from both sides first. When the plain text is the
    /// same nothing is written, which also means a structure-only change to
    /// otherwise identical text is dropped. Otherwise the surface is
    /// replaced and the caret collapses at the end.
    pub fn reconcile(&mut self, surface: &mut EditorSurface, target: &str) -> ReconcileOutcome {
        self.content = target.to_string();
        if visible_text(&surface.content()) == visible_text(target) {
            return ReconcileOutcome::Unchanged;
        }

        surface.replace_content(target);
        let end = surface.document().char_len();
        selection::restore_offsets(surface, SelectionOffsets::collapsed(end));
        log::debug!("Reconciled surface with {} characters of new content", end);
        ReconcileOutcome::Replaced
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_on_input_takes_surface_content() {
        let mut surface = EditorSurface::from_markup("Hi");
        selection::restore_offsets(&mut surface, SelectionOffsets::collapsed(2));
        let mut sync = ContentSynchronizer::new("Hi");

        surface.insert_text(" there");
        sync.on_input(&surface);
        assert_eq!(sync.content(), "Hi there");
    }

    #[test]
    fn test_reconcile_with_same_text_keeps_caret() {
        let mut surface = EditorSurface::from_markup("Dearly <b>beloved</b>");
        selection::restore_offsets(&mut surface, SelectionOffsets::collapsed(3));
        let mut sync = ContentSynchronizer::new(surface.content());

        let outcome = sync.reconcile(&mut surface, "<i>Dearly beloved</i>");

        assert_eq!(outcome, ReconcileOutcome::Unchanged);
        assert_eq!(surface.content(), "Dearly <b>beloved</b>");
        assert_eq!(selection::capture_offsets(&surface), Some(SelectionOffsets::collapsed(3)));
        assert_eq!(sync.content(), "<i>Dearly beloved</i>");
    }

    #[test]
    fn test_reconcile_with_new_text_replaces_surface() {
        let mut surface = EditorSurface::from_markup("Old script");
        let mut sync = ContentSynchronizer::new(surface.content());

        let outcome = sync.reconcile(&mut surface, "New <u>script</u>");

        assert_eq!(outcome, ReconcileOutcome::Replaced);
        assert_eq!(surface.content(), "New <u>script</u>");
        assert_eq!(selection::capture_offsets(&surface), Some(SelectionOffsets::collapsed(10)));
    }

    #[test]
    fn test_reconcile_treats_escaped_tags_as_text() {
        let mut surface = EditorSurface::from_markup("Use &amp;lt;b&amp;gt; here");
        let mut sync = ContentSynchronizer::new(surface.content());

        assert_eq!(
            sync.reconcile(&mut surface, "<i>Use &amp;lt;b&amp;gt; here</i>"),
            ReconcileOutcome::Unchanged
        );
        assert_eq!(
            sync.reconcile(&mut surface, "Use &lt;b&gt; here"),
            ReconcileOutcome::Replaced
        );
        assert_eq!(surface.document().plain_text(), "Use <b> here");
    }
}
