//! A single script editing session.
//!
//! `Closed -> Loading -> Editing -> Saved -> Closed`. A failed save stays in
//! `Editing`; editing after a save goes back to `Editing`; closing without a
//! save keeps whatever autosave entry was already written.

use crate::editing::{
    ContentSynchronizer, EditorSurface, FormatCommand, FormatOutcome, FormattingController,
    ReconcileOutcome, SelectionOffsets, capture_offsets, restore_offsets,
};
use crate::error::EditorError;
use crate::models::{ScriptId, ScriptRecord, ScriptStatus, now_millis};
use crate::persistence::{AutoSaveEntry, AutoSaveManager, ContentSource, KeyValueStore};
use crate::settings::EditorSettings;
use crate::validation::{ValidationError, Validator};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Closed,
    Loading,
    Editing,
    Saved,
}

/// Deferred idle autosave, bound to the script that was active when it was
/// scheduled.
#[derive(Debug, Clone, PartialEq, Eq)]
struct FollowUp {
    script_id: ScriptId,
    due_at: u64,
}

struct ActiveScript {
    record: ScriptRecord,
    surface: EditorSurface,
    sync: ContentSynchronizer,
    controller: FormattingController,
}

pub struct EditorSession<S> {
    settings: EditorSettings,
    validator: Validator,
    autosave: AutoSaveManager<S>,
    state: SessionState,
    active: Option<ActiveScript>,
    follow_ups: Vec<FollowUp>,
}

impl<S: KeyValueStore> EditorSession<S> {
    pub fn new(store: S, settings: EditorSettings) -> Self {
        Self {
            validator: Validator::new(settings.limits()),
            autosave: AutoSaveManager::new(store),
            settings,
            state: SessionState::Closed,
            active: None,
            follow_ups: Vec::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn settings(&self) -> &EditorSettings {
        &self.settings
    }

    pub fn autosave_manager(&self) -> &AutoSaveManager<S> {
        &self.autosave
    }

    pub fn record(&self) -> Option<&ScriptRecord> {
        self.active.as_ref().map(|active| &active.record)
    }

    pub fn surface(&self) -> Option<&EditorSurface> {
        self.active.as_ref().map(|active| &active.surface)
    }

    /// Application-side content of the open script
    pub fn content(&self) -> Option<&str> {
        self.active.as_ref().map(|active| active.sync.content())
    }

    pub fn font_size(&self) -> Option<u8> {
        self.active.as_ref().map(|active| active.controller.font_size())
    }

    /// Open a script by id. Any script still being edited is closed first,
    /// keeping its changes as an autosave.
    pub fn open(&mut self, id: ScriptId, title: &str, fallback: &str) -> ContentSource {
        self.open_record(ScriptRecord::new(id, title, fallback))
    }

    /// Open a stored record; its content is the fallback when no snapshot
    /// exists.
    pub fn open_record(&mut self, record: ScriptRecord) -> ContentSource {
        if self.active.is_some() {
            self.close(false);
        }

        self.state = SessionState::Loading;
        log::info!("Opening script {} ({:?})", record.id, record.title);
        let (source, content) = self.autosave.load(&record.id, &record.content);

        let mut surface = EditorSurface::from_markup(&content);
        let end = surface.document().char_len();
        restore_offsets(&mut surface, SelectionOffsets::collapsed(end));
        surface.focus();

        self.active = Some(ActiveScript {
            sync: ContentSynchronizer::new(surface.content()),
            controller: FormattingController::new(self.settings.font_size_bounds()),
            surface,
            record,
        });
        self.state = SessionState::Editing;
        source
    }

    /// Validate and persist the current content.
    ///
    /// On success the backup is written, the autosave entry is cleared and
    /// the record is marked ready. On a validation failure the session stays
    /// in `Editing`.
    pub fn save(&mut self) -> Result<ScriptRecord, EditorError> {
        let active = self.active.as_mut().ok_or(EditorError::NoActiveSession)?;
        let content = active.sync.content().to_string();

        if let Err(err) = self.validator.validate(&content) {
            log::info!("Save of script {} rejected: {err}", active.record.id);
            return Err(err.into());
        }

        let id = active.record.id.clone();
        self.follow_ups.retain(|follow_up| follow_up.script_id != id);
        let saved_at = self.autosave.backup(&id, &content)?;
        self.autosave.promote(&id)?;

        active.record.content = content;
        active.record.last_modified = saved_at;
        active.record.status = ScriptStatus::Ready;
        self.state = SessionState::Saved;
        log::info!("Saved script {id}");
        Ok(active.record.clone())
    }

    /// Leave the session. Unless `discard` is set, unsaved edits are kept
    /// as an autosave entry first.
    pub fn close(&mut self, discard: bool) {
        if !discard
            && self.state == SessionState::Editing
            && let Err(err) = self.autosave()
        {
            log::warn!("Autosave on close failed: {err}");
        }
        if let Some(active) = self.active.take() {
            log::info!("Closed script {}", active.record.id);
        }
        self.state = SessionState::Closed;
    }

    /// Live count for the UI; 0 when nothing is open
    pub fn character_count(&self) -> usize {
        self.content().map(Validator::character_count).unwrap_or_default()
    }

    /// Non-blocking guidance: what `save` would say about the content now
    pub fn validation(&self) -> Option<Result<usize, ValidationError>> {
        self.content().map(|content| self.validator.validate(content))
    }

    pub fn apply_format(&mut self, command: FormatCommand) -> Option<FormatOutcome> {
        let active = self.active_mut(command.name())?;
        let before = active.sync.content().to_string();
        let outcome = active
            .controller
            .apply_format(&mut active.surface, &mut active.sync, command);
        if outcome.content != before {
            self.mark_edited();
        }
        Some(outcome)
    }

    pub fn apply_color(&mut self, color: &str) -> Option<FormatOutcome> {
        let active = self.active_mut("color")?;
        let before = active.sync.content().to_string();
        let outcome = active
            .controller
            .apply_color(&mut active.surface, &mut active.sync, color);
        if outcome.content != before {
            self.mark_edited();
        }
        Some(outcome)
    }

    pub fn increase_font_size(&mut self) -> Option<u8> {
        let active = self.active_mut("increase font size")?;
        Some(active.controller.increase_font_size(&mut active.surface))
    }

    pub fn decrease_font_size(&mut self) -> Option<u8> {
        let active = self.active_mut("decrease font size")?;
        Some(active.controller.decrease_font_size(&mut active.surface))
    }

    /// Type at the caret (replacing any selected range) and schedule an
    /// idle autosave.
    pub fn type_text(&mut self, text: &str) -> bool {
        self.edit("type", |surface| surface.insert_text(text))
    }

    /// Backspace
    pub fn delete_backward(&mut self) -> bool {
        self.edit("delete", EditorSurface::delete_backward)
    }

    pub fn move_caret(&mut self, delta: isize, extend: bool) {
        if let Some(active) = self.active_mut("move caret") {
            active.surface.move_caret(delta, extend);
        }
    }

    /// User selection by linear offsets; drops any pending typing style
    pub fn select(&mut self, offsets: SelectionOffsets) {
        let Some(active) = self.active_mut("select") else {
            return;
        };
        if capture_offsets(&active.surface) != Some(offsets) {
            active.surface.typing_style_mut().clear();
        }
        restore_offsets(&mut active.surface, offsets);
    }

    pub fn selection(&self) -> Option<SelectionOffsets> {
        self.surface().and_then(capture_offsets)
    }

    /// Losing focus writes an autosave snapshot
    pub fn blur(&mut self) {
        let Some(active) = self.active_mut("blur") else {
            return;
        };
        active.surface.blur();
        if let Err(err) = self.autosave() {
            log::warn!("Autosave on blur failed: {err}");
        }
    }

    /// Write the current content as the transient autosave entry
    pub fn autosave(&mut self) -> Result<AutoSaveEntry, EditorError> {
        let active = self.active.as_ref().ok_or(EditorError::NoActiveSession)?;
        let id = active.record.id.clone();
        let content = active.sync.content().to_string();
        self.follow_ups.retain(|follow_up| follow_up.script_id != id);
        Ok(self.autosave.save(&id, &content)?)
    }

    /// Content changed outside the editor
    pub fn reconcile(&mut self, target: &str) -> Option<ReconcileOutcome> {
        let active = self.active_mut("reconcile")?;
        let outcome = active.sync.reconcile(&mut active.surface, target);
        if outcome == ReconcileOutcome::Replaced {
            self.mark_edited();
        }
        Some(outcome)
    }

    /// Run follow-ups due at `now` (unix ms). A follow-up scheduled for a
    /// script that is no longer open, or that has nothing unsaved, is
    /// dropped. Returns how many ran.
    pub fn tick(&mut self, now: u64) -> usize {
        let (due, pending): (Vec<FollowUp>, Vec<FollowUp>) = std::mem::take(&mut self.follow_ups)
            .into_iter()
            .partition(|follow_up| follow_up.due_at <= now);
        self.follow_ups = pending;

        let mut ran = 0;
        for follow_up in due {
            let current = self.record().map(|record| &record.id);
            if current != Some(&follow_up.script_id) {
                log::debug!("Dropping follow-up for script {}: no longer open", follow_up.script_id);
                continue;
            }
            if self.state != SessionState::Editing {
                log::debug!("Dropping follow-up for script {}: nothing unsaved", follow_up.script_id);
                continue;
            }
            match self.autosave() {
                Ok(_) => ran += 1,
                Err(err) => log::warn!("Idle autosave failed: {err}"),
            }
        }
        ran
    }

    /// Follow-ups waiting to run
    pub fn pending_follow_ups(&self) -> usize {
        self.follow_ups.len()
    }

    fn edit(&mut self, operation: &str, change: impl FnOnce(&mut EditorSurface) -> bool) -> bool {
        let delay = self.settings.autosave_delay_ms;
        let Some(active) = self.active_mut(operation) else {
            return false;
        };
        active.surface.focus();
        if !change(&mut active.surface) {
            return false;
        }
        active.sync.on_input(&active.surface);

        let script_id = active.record.id.clone();
        self.follow_ups.retain(|follow_up| follow_up.script_id != script_id);
        self.follow_ups.push(FollowUp {
            script_id,
            due_at: now_millis().saturating_add(delay),
        });
        self.mark_edited();
        true
    }

    fn mark_edited(&mut self) {
        if self.state == SessionState::Saved {
            self.state = SessionState::Editing;
        }
    }

    fn active_mut(&mut self, operation: &str) -> Option<&mut ActiveScript> {
        if self.active.is_none() {
            log::warn!("{}: {operation} aborted", EditorError::SurfaceMissing);
        }
        self.active.as_mut()
    }
}
