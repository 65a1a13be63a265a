//! # Edit Session
//!
//! Ties the editing pieces together for one editor instance: the page
//! document, the property panel, bindings, history and the mode machine.
//!
//! Time is passed in (`now: Instant`) wherever the history debounce is
//! involved, so hosts drive it from their event loop and tests from a
//! fixed clock.

use crate::bindings::{set_field, BindingTable};
use crate::document::{parse_data_context, Document, Page};
use crate::errors::{EditorError, EditorResult};
use crate::history::{Debouncer, HistoryManager, Snapshot, DEFAULT_CAPACITY, DEFAULT_QUIET_PERIOD};
use crate::mode::EditorMode;
use crate::panel::PropertyPanel;
use crate::patch::{patch_with_data, PatchError, PropertyChanges};
use livecanvas_evaluator::{Evaluator, SandboxMessage, Viewport, VirtualDomDocument};
use livecanvas_parser::ElementIds;
use serde_json::Value;
use std::time::{Duration, Instant};

const NO_DATA: &Value = &Value::Null;

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub history_capacity: usize,
    pub quiet_period: Duration,
    pub viewport: Viewport,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_CAPACITY,
            quiet_period: DEFAULT_QUIET_PERIOD,
            viewport: Viewport::default(),
        }
    }
}

/// What "save changes" did with the pending panel edits
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SaveReport {
    /// Elements whose source text changed
    pub patched: usize,
    /// Data fields written through bindings
    pub data_fields: Vec<String>,
    pub diagnostics: Vec<PatchError>,
}

pub struct EditSession {
    document: Document,
    history: HistoryManager,
    debouncer: Debouncer,
    mode: EditorMode,
    panel: PropertyPanel,
    bindings: BindingTable,
    ids: ElementIds,
    viewport: Viewport,
}

impl EditSession {
    /// Open `document` at its first page
    pub fn new(document: Document, config: SessionConfig) -> EditorResult<Self> {
        let first = document.page(0).ok_or(EditorError::NoPage)?;
        let ids = ElementIds::new(&first.id);
        let mut session = Self {
            document,
            history: HistoryManager::with_capacity(config.history_capacity),
            debouncer: Debouncer::new(config.quiet_period),
            mode: EditorMode::Idle,
            panel: PropertyPanel::new(),
            bindings: BindingTable::default(),
            ids,
            viewport: config.viewport,
        };
        session.load_current()?;
        Ok(session)
    }

    /// Single-page session
    pub fn for_page(page: Page, config: SessionConfig) -> EditorResult<Self> {
        Self::new(Document::new(vec![page]), config)
    }

    fn load_current(&mut self) -> EditorResult<()> {
        self.mode = EditorMode::Loading;
        let page = self.document.current().ok_or(EditorError::NoPage)?;
        self.history
            .reset(Snapshot::now(page.source.clone(), page.data.clone()));
        self.bindings = BindingTable::from_source(&page.source);
        self.ids = ElementIds::new(&page.id);
        self.panel.clear();
        self.debouncer.cancel();
        tracing::info!(page = %page.id, bindings = self.bindings.len(), "page loaded");
        self.mode = EditorMode::Idle;
        Ok(())
    }

    /// Switch pages. Unsaved edits on the page being left are discarded.
    pub fn select_page(&mut self, index: usize) -> EditorResult<()> {
        if index >= self.document.len() {
            return Err(EditorError::PageOutOfRange {
                index,
                len: self.document.len(),
            });
        }
        if let Some(page) = self.document.current_mut() {
            if page.discard_changes() {
                tracing::warn!(page = %page.id, "leaving page with unsaved changes; discarded");
            }
        }
        self.document.select(index);
        self.load_current()
    }

    pub fn next_page(&mut self) -> EditorResult<bool> {
        let next = self.document.current_index() + 1;
        if next >= self.document.len() {
            return Ok(false);
        }
        self.select_page(next)?;
        Ok(true)
    }

    pub fn prev_page(&mut self) -> EditorResult<bool> {
        match self.document.current_index().checked_sub(1) {
            Some(prev) => self.select_page(prev).map(|_| true),
            None => Ok(false),
        }
    }

    /// Replace the current page with a freshly loaded one
    pub fn reload_page(&mut self, page: Page) -> EditorResult<()> {
        self.mode = EditorMode::Loading;
        let current = self.document.current_mut().ok_or(EditorError::NoPage)?;
        *current = page;
        self.load_current()
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn page(&self) -> EditorResult<&Page> {
        self.document.current().ok_or(EditorError::NoPage)
    }

    fn page_mut(&mut self) -> EditorResult<&mut Page> {
        self.document.current_mut().ok_or(EditorError::NoPage)
    }

    pub fn source(&self) -> &str {
        self.document
            .current()
            .map(|p| p.source.as_str())
            .unwrap_or_default()
    }

    pub fn data(&self) -> &Value {
        self.document.current().map(|p| &p.data).unwrap_or(NO_DATA)
    }

    pub fn mode(&self) -> EditorMode {
        self.mode
    }

    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    pub fn panel(&self) -> &PropertyPanel {
        &self.panel
    }

    pub fn panel_mut(&mut self) -> &mut PropertyPanel {
        &mut self.panel
    }

    pub fn bindings(&self) -> &BindingTable {
        &self.bindings
    }

    pub fn ids(&self) -> &ElementIds {
        &self.ids
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Unsaved changes on the current page
    pub fn is_dirty(&self) -> bool {
        self.document.current().is_some_and(Page::is_dirty)
    }

    /// Render the current page
    pub fn render(&self) -> VirtualDomDocument {
        let page_id = self.document.current().map(|p| p.id.as_str()).unwrap_or_default();
        Evaluator::new(page_id)
            .with_viewport(self.viewport)
            .render(self.source(), self.data())
    }

    /// User change to the source
    pub fn set_source(&mut self, source: impl Into<String>, now: Instant) -> EditorResult<()> {
        let source = source.into();
        let page = self.page_mut()?;
        if page.source == source {
            return Ok(());
        }
        page.source = source;
        self.after_source_change();
        self.note_change(now);
        Ok(())
    }

    /// User change to the data context
    pub fn set_data(&mut self, data: Value, now: Instant) -> EditorResult<()> {
        let page = self.page_mut()?;
        if page.data == data {
            return Ok(());
        }
        page.data = data;
        self.note_change(now);
        Ok(())
    }

    /// Data context edited as text; invalid JSON becomes `{}`
    pub fn set_data_text(&mut self, text: &str, now: Instant) -> EditorResult<()> {
        self.set_data(parse_data_context(text), now)
    }

    fn after_source_change(&mut self) {
        let source = self.source().to_string();
        self.bindings = BindingTable::from_source(&source);
        self.panel.revalidate(&source);
    }

    fn note_change(&mut self, now: Instant) {
        if self.mode.records_history() {
            self.mode = EditorMode::Editing;
            self.debouncer.touch(now);
        }
    }

    /// Commit a history snapshot once the quiet period has passed.
    /// Returns `true` if a snapshot was recorded.
    pub fn tick(&mut self, now: Instant) -> bool {
        self.debouncer.take_ready(now) && self.commit_now()
    }

    /// Commit any pending change immediately
    pub fn flush(&mut self) -> bool {
        self.debouncer.cancel() && self.commit_now()
    }

    fn commit_now(&mut self) -> bool {
        if !self.mode.records_history() {
            return false;
        }
        let snapshot = Snapshot::now(self.source(), self.data().clone());
        let committed = self.history.commit(snapshot);
        self.mode = EditorMode::Idle;
        committed
    }

    /// Feed a sandbox event into the property panel
    pub fn handle_event(&mut self, message: &SandboxMessage) -> bool {
        self.panel.apply_event(message)
    }

    pub fn ordinal_of(&self, element_id: &str) -> EditorResult<usize> {
        self.ids
            .ordinal_of(element_id)
            .ok_or_else(|| EditorError::UnknownElement(element_id.to_string()))
    }

    /// Edit an element's displayed text. Bound elements update the data
    /// context right away (live preview); literal text is staged for
    /// "save changes".
    pub fn edit_text(&mut self, ordinal: usize, text: &str, now: Instant) -> EditorResult<()> {
        match self.bindings.field_for(ordinal) {
            Some(field) => {
                let data = set_field(self.data(), field, text);
                self.set_data(data, now)
            }
            None => {
                self.panel.stage(ordinal, PropertyChanges::new().text(text));
                Ok(())
            }
        }
    }

    /// Write every pending panel change into the source (and bound data)
    pub fn save_changes(&mut self, now: Instant) -> EditorResult<SaveReport> {
        let pending = self.panel.take_pending();
        let mut source = self.source().to_string();
        let mut data = self.data().clone();
        let mut report = SaveReport::default();

        for (ordinal, changes) in pending {
            let outcome = patch_with_data(&source, ordinal, &changes, &data);
            if outcome.changed {
                report.patched += 1;
            }
            source = outcome.source;
            for edit in outcome.data_edits {
                data = set_field(&data, &edit.field, &edit.value);
                report.data_fields.push(edit.field);
            }
            report.diagnostics.extend(outcome.diagnostics);
        }

        self.set_source(source, now)?;
        self.set_data(data, now)?;
        tracing::info!(patched = report.patched, data_fields = report.data_fields.len(), "changes saved to source");
        Ok(report)
    }

    /// Wholesale source replacement (AI code edit)
    pub fn replace_source(&mut self, source: impl Into<String>, now: Instant) -> EditorResult<()> {
        self.set_source(source, now)
    }

    /// Wholesale data replacement (AI data edit)
    pub fn replace_data(&mut self, data: Value, now: Instant) -> EditorResult<()> {
        self.set_data(data, now)
    }

    pub fn undo(&mut self) -> bool {
        self.replay(|history| history.undo().cloned())
    }

    pub fn redo(&mut self) -> bool {
        self.replay(|history| history.redo().cloned())
    }

    fn replay(&mut self, step: impl FnOnce(&mut HistoryManager) -> Option<Snapshot>) -> bool {
        // an edit still inside its quiet period becomes its own entry first
        self.flush();

        self.mode = EditorMode::Replaying;
        let restored = match step(&mut self.history) {
            Some(snapshot) => {
                if let Some(page) = self.document.current_mut() {
                    page.source = snapshot.source;
                    page.data = snapshot.data;
                }
                self.after_source_change();
                true
            }
            None => false,
        };
        self.mode = EditorMode::Idle;
        restored
    }

    /// The current state has been persisted
    pub fn mark_saved(&mut self) {
        if let Some(page) = self.document.current_mut() {
            page.mark_saved();
            tracing::info!(page = %page.id, "page marked saved");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const QUIET: Duration = Duration::from_millis(500);

    fn session(source: &str, data: Value) -> EditSession {
        EditSession::for_page(Page::new("slide-1", source, data), SessionConfig::default()).unwrap()
    }

    #[test]
    fn test_edits_commit_after_quiet_period() {
        let t0 = Instant::now();
        let mut s = session("const C = () => <div>a</div>;", json!({}));
        s.set_source("const C = () => <div>b</div>;", t0).unwrap();
        assert_eq!(s.mode(), EditorMode::Editing);
        assert!(!s.tick(t0 + Duration::from_millis(100)));
        s.set_source("const C = () => <div>c</div>;", t0 + Duration::from_millis(200)).unwrap();
        assert!(!s.tick(t0 + Duration::from_millis(600)));
        assert!(s.tick(t0 + Duration::from_millis(700)));
        assert_eq!(s.history().len(), 2);
        assert_eq!(s.mode(), EditorMode::Idle);
    }

    #[test]
    fn test_replay_is_not_recorded() {
        let t0 = Instant::now();
        let mut s = session("const C = () => <div>a</div>;", json!({}));
        s.set_source("const C = () => <div>b</div>;", t0).unwrap();
        s.tick(t0 + QUIET);
        assert!(s.undo());
        assert_eq!(s.source(), "const C = () => <div>a</div>;");
        assert!(!s.tick(t0 + QUIET * 4));
        assert_eq!(s.history().len(), 2);
        assert!(s.redo());
        assert_eq!(s.source(), "const C = () => <div>b</div>;");
    }

    #[test]
    fn test_undo_flushes_pending_edit() {
        let t0 = Instant::now();
        let mut s = session("const C = () => <div>a</div>;", json!({ "k": 1 }));
        s.set_data(json!({ "k": 2 }), t0).unwrap();
        assert!(s.undo());
        assert_eq!(s.data(), &json!({ "k": 1 }));
        assert!(s.redo());
        assert_eq!(s.data(), &json!({ "k": 2 }));
    }

    #[test]
    fn test_bound_text_edit_updates_data_only() {
        let t0 = Instant::now();
        let source = "const C = ({ data }) => <div>{data.title}</div>;";
        let mut s = session(source, json!({ "title": "Hello" }));
        s.edit_text(0, "Goodbye", t0).unwrap();
        assert_eq!(s.data(), &json!({ "title": "Goodbye" }));
        assert_eq!(s.source(), source);
        assert!(s.is_dirty());
    }

    #[test]
    fn test_save_changes_patches_pending_edits() {
        let t0 = Instant::now();
        let source = "const C = ({ data }) => <div><h1>{data.title}</h1><p>Old</p></div>;";
        let mut s = session(source, json!({}));
        s.edit_text(2, "New", t0).unwrap();
        s.panel_mut().stage(1, PropertyChanges::new().text("Routed"));
        let report = s.save_changes(t0).unwrap();
        assert_eq!(report.patched, 1);
        assert_eq!(report.data_fields, vec!["title".to_string()]);
        assert_eq!(
            s.source(),
            "const C = ({ data }) => <div><h1>{data.title}</h1><p>New</p></div>;"
        );
        assert_eq!(s.data(), &json!({ "title": "Routed" }));
    }

    #[test]
    fn test_navigation_discards_unsaved_edits() {
        let t0 = Instant::now();
        let doc = Document::new(vec![
            Page::new("a", "const A = () => <div>a</div>;", json!({})),
            Page::new("b", "const B = () => <div>b</div>;", json!({})),
        ]);
        let mut s = EditSession::new(doc, SessionConfig::default()).unwrap();
        s.set_source("const A = () => <div>edited</div>;", t0).unwrap();
        assert!(s.next_page().unwrap());
        assert_eq!(s.history().len(), 1);
        assert!(s.prev_page().unwrap());
        assert_eq!(s.source(), "const A = () => <div>a</div>;");
        assert!(!s.prev_page().unwrap());
        assert!(matches!(
            s.select_page(7),
            Err(EditorError::PageOutOfRange { index: 7, len: 2 })
        ));
    }

    #[test]
    fn test_element_ids_map_to_ordinals() {
        let s = session("const C = () => <div><p>x</p></div>;", json!({}));
        let id = s.ids().id_for(1);
        assert_eq!(s.ordinal_of(&id).unwrap(), 1);
        assert!(s.ordinal_of("zzz-1").is_err());
    }

    #[test]
    fn test_empty_document_is_rejected() {
        assert!(matches!(
            EditSession::new(Document::default(), SessionConfig::default()),
            Err(EditorError::NoPage)
        ));
    }
}
