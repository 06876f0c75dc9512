//! Selection tracking across structural mutations.
//!
//! A live selection is a pair of (node path, local offset) positions, which
//! go stale as soon as a formatting command splits or wraps a run. The
//! tracker translates the selection into linear plain-text offsets before the
//! mutation and back into positions on the reshaped tree afterwards.

use std::ops::Range;

use crate::document::{Document, Node};
use crate::editing::surface::{EditorSurface, Position, Selection};
use crate::error::EditorError;

/// Linear character positions into the concatenated plain text.
///
/// Always ordered: `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SelectionOffsets {
    pub start: usize,
    pub end: usize,
}

impl SelectionOffsets {
    /// Build from two ends in any order
    pub fn new(a: usize, b: usize) -> Self {
        Self {
            start: a.min(b),
            end: a.max(b),
        }
    }

    pub fn collapsed(at: usize) -> Self {
        Self { start: at, end: at }
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.is_collapsed()
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// Translate the surface's active selection into linear offsets.
///
/// Returns `None` when there is no active selection, or when an end no
/// longer addresses anything in the document.
pub fn capture_offsets(surface: &EditorSurface) -> Option<SelectionOffsets> {
    let selection = surface.selection()?;
    let document = surface.document();

    let anchor = linear_offset(document, &selection.anchor);
    let focus = linear_offset(document, &selection.focus);
    match (anchor, focus) {
        (Some(anchor), Some(focus)) => Some(SelectionOffsets::new(anchor, focus)),
        _ => {
            log::debug!("Selection {selection:?} no longer addresses the document");
            None
        }
    }
}

/// Set the surface selection from linear offsets on the current tree.
///
/// Offsets past the end clamp to the end of the last leaf; an empty document
/// gets a caret at position 0 of the container. The pending typing style is
/// kept.
pub fn restore_offsets(surface: &mut EditorSurface, offsets: SelectionOffsets) {
    let document = surface.document();
    let selection = match (
        position_for(document, offsets.start),
        position_for(document, offsets.end),
    ) {
        (Ok(start), Ok(end)) => Selection::new(start, end),
        (Err(err), _) | (_, Err(err)) => {
            log::debug!("{err}; collapsing selection at the container start");
            Selection::collapsed(Position::container_start())
        }
    };
    surface.restore_selection(selection);
}

fn position_for(document: &Document, offset: usize) -> Result<Position, EditorError> {
    document
        .position_of_offset(offset)
        .map(|(path, local)| Position::new(path, local))
        .ok_or(EditorError::RestoreFailed { offset })
}

/// Linear offset of a position, or `None` if its path is stale.
pub(crate) fn linear_offset(document: &Document, position: &Position) -> Option<usize> {
    match document.node_at(&position.path) {
        Some(Node::Text(text)) => {
            let start = document.offset_of_path(&position.path)?;
            Some(start + position.offset.min(text.chars().count()))
        }
        Some(Node::LineBreak) => document.offset_of_path(&position.path),
        Some(Node::Element { .. }) | None => {
            document.offset_before_child(&position.path, position.offset)
        }
    }
}
