use crate::document::Style;
use crate::editing::selection::{self, SelectionOffsets};
use crate::editing::surface::EditorSurface;
use crate::editing::sync::ContentSynchronizer;
use crate::error::EditorError;
use crate::settings::FontSizeBounds;

/// Named structural mutations the surface knows how to run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatCommand {
    Bold,
    Italic,
    Underline,
    UnorderedList,
    OrderedList,
    AlignLeft,
    AlignCenter,
    AlignRight,
    /// Font size in pixels for the selected run
    FontSize(u8),
}

impl FormatCommand {
    pub fn name(&self) -> &'static str {
        match self {
            FormatCommand::Bold => "bold",
            FormatCommand::Italic => "italic",
            FormatCommand::Underline => "underline",
            FormatCommand::UnorderedList => "insertUnorderedList",
            FormatCommand::OrderedList => "insertOrderedList",
            FormatCommand::AlignLeft => "justifyLeft",
            FormatCommand::AlignCenter => "justifyCenter",
            FormatCommand::AlignRight => "justifyRight",
            FormatCommand::FontSize(_) => "fontSize",
        }
    }

    /// Look a command up by name. `fontSize` needs a pixel value.
    pub fn from_name(name: &str, value: Option<u8>) -> Option<Self> {
        let command = match name {
            "bold" => FormatCommand::Bold,
            "italic" => FormatCommand::Italic,
            "underline" => FormatCommand::Underline,
            "insertUnorderedList" => FormatCommand::UnorderedList,
            "insertOrderedList" => FormatCommand::OrderedList,
            "justifyLeft" => FormatCommand::AlignLeft,
            "justifyCenter" => FormatCommand::AlignCenter,
            "justifyRight" => FormatCommand::AlignRight,
            "fontSize" => FormatCommand::FontSize(value?),
            _ => return None,
        };
        Some(command)
    }
}

/// Result of a formatting call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatOutcome {
    /// What the underlying mutation reported
    pub applied: bool,
    /// Application content after the mutation settled
    pub content: String,
    /// Selection offsets after restoring, if there was a selection
    pub selection: Option<SelectionOffsets>,
}

/// Applies formatting intents while keeping the selection on the same
/// characters.
#[derive(Debug, Clone)]
pub struct FormattingController {
    font_size: u8,
    bounds: FontSizeBounds,
}

impl Default for FormattingController {
    fn default() -> Self {
        Self::new(FontSizeBounds::default())
    }
}

impl FormattingController {
    pub fn new(bounds: FontSizeBounds) -> Self {
        Self {
            font_size: bounds.clamp(bounds.default),
            bounds,
        }
    }

    /// Current default font size for newly typed text
    pub fn font_size(&self) -> u8 {
        self.font_size
    }

    /// Capture the selection, focus, run the mutation, pull the new content
    /// and restore the selection onto the reshaped tree.
    pub fn apply_format(
        &mut self,
        surface: &mut EditorSurface,
        sync: &mut ContentSynchronizer,
        command: FormatCommand,
    ) -> FormatOutcome {
        let captured = selection::capture_offsets(surface);
        if captured.is_none() {
            log::debug!("{}: {} has nothing to act on", EditorError::SelectionUnavailable, command.name());
        }

        surface.focus();
        let applied = surface.exec(&command);
        log::debug!("Applied {} -> {applied}", command.name());
        self.settle(surface, sync, captured, applied)
    }

    /// Color the selected run, or set a pending color for the next typed
    /// characters when the selection is collapsed.
    pub fn apply_color(
        &mut self,
        surface: &mut EditorSurface,
        sync: &mut ContentSynchronizer,
        color: &str,
    ) -> FormatOutcome {
        let Some(offsets) = selection::capture_offsets(surface) else {
            log::debug!("{}: color {color} ignored", EditorError::SelectionUnavailable);
            return FormatOutcome {
                applied: false,
                content: sync.content().to_string(),
                selection: None,
            };
        };

        surface.focus();
        let applied = if offsets.is_collapsed() {
            surface.typing_style_mut().set(Style::Color(color.to_string()));
            true
        } else {
            surface.document_mut().recolor(offsets.range(), color)
        };
        self.settle(surface, sync, Some(offsets), applied)
    }

    pub fn increase_font_size(&mut self, surface: &mut EditorSurface) -> u8 {
        let next = self.font_size.saturating_add(self.bounds.step);
        self.set_font_size(surface, next)
    }

    pub fn decrease_font_size(&mut self, surface: &mut EditorSurface) -> u8 {
        let next = self.font_size.saturating_sub(self.bounds.step);
        self.set_font_size(surface, next)
    }

    /// Existing runs are never rewritten; text typed afterwards, wherever
    /// the caret goes, picks up the new size.
    fn set_font_size(&mut self, surface: &mut EditorSurface, size: u8) -> u8 {
        self.font_size = self.bounds.clamp(size);
        surface.typing_style_mut().remove(&Style::FontSize(self.font_size));
        surface.set_font_size((self.font_size != self.bounds.default).then_some(self.font_size));
        self.font_size
    }

    fn settle(
        &self,
        surface: &mut EditorSurface,
        sync: &mut ContentSynchronizer,
        captured: Option<SelectionOffsets>,
        applied: bool,
    ) -> FormatOutcome {
        sync.on_input(surface);
        if let Some(offsets) = captured {
            selection::restore_offsets(surface, offsets);
        }
        FormatOutcome {
            applied,
            content: sync.content().to_string(),
            selection: captured.and_then(|_| selection::capture_offsets(surface)),
        }
    }
}
