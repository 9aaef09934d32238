//! Editor session bound to one document.

use crate::autolayout::{AutoLayoutMapper, LayoutBatch, LayoutReport};
use crate::clipboard::{Clipboard, LocalClipboard, prepare_paste};
use crate::config::EditorConfig;
use crate::document::AnnotationDocument;
use crate::geometry::{PageLayout, PageSource, ViewMode};
use crate::history::History;
use crate::interaction::{InteractionState, ToolKind};
use crate::objects::{AnnotationObject, ApproxTextMeasurer, GroupId, ObjectId, TextMeasurer};
use crate::placement::Placement;
use crate::selection::SelectionSet;
use crate::services::{CaptureTarget, ExportError, Exporter, LayoutError, LayoutService};
use crate::storage::{AnnotationStore, StorageError, StorageResult};
use crate::strokes::{FrameStats, StrokePipeline, StrokeSurface};
use kurbo::{Size, Vec2};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Severity of a user-facing notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Error,
}

/// A transient message for the host to show.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

/// Keyboard commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorKey {
    Escape,
    Delete,
    Undo,
    Redo,
    Copy,
    Paste,
    SelectAll,
    Group,
    Ungroup,
}

/// The annotation editor for one document.
pub struct Editor {
    pub(crate) doc_id: String,
    pub(crate) document: AnnotationDocument,
    pub(crate) history: History,
    pub(crate) selection: SelectionSet,
    pub(crate) pages: Vec<PageSource>,
    /// Rendered sizes reported by the host, by page.
    pub(crate) surface_sizes: BTreeMap<usize, Size>,
    pub(crate) view_mode: ViewMode,
    pub(crate) current_page: usize,
    pub(crate) layout: PageLayout,
    pub(crate) tool: ToolKind,
    pub(crate) state: InteractionState,
    pub(crate) strokes: StrokePipeline,
    pub(crate) clipboard: Box<dyn Clipboard>,
    pub(crate) measurer: Box<dyn TextMeasurer>,
    pub(crate) config: EditorConfig,
    notifications: Vec<Notification>,
}

impl Editor {
    pub fn new(doc_id: impl Into<String>, pages: Vec<PageSource>) -> Self {
        Self::with_config(doc_id, pages, EditorConfig::default())
    }

    pub fn with_config(doc_id: impl Into<String>, pages: Vec<PageSource>, config: EditorConfig) -> Self {
        let mut editor = Self {
            doc_id: doc_id.into(),
            document: AnnotationDocument::new(),
            history: History::new(config.history_limit),
            selection: SelectionSet::new(),
            pages,
            surface_sizes: BTreeMap::new(),
            view_mode: ViewMode::Single,
            current_page: 0,
            layout: PageLayout::default(),
            tool: ToolKind::Select,
            state: InteractionState::Idle,
            strokes: StrokePipeline::new(),
            clipboard: Box::new(LocalClipboard::default()),
            measurer: Box::new(ApproxTextMeasurer::default()),
            config,
            notifications: Vec::new(),
        };
        editor.rebuild_layout();
        editor
    }

    /// Use a shared or platform clipboard.
    pub fn with_clipboard(mut self, clipboard: impl Clipboard + 'static) -> Self {
        self.clipboard = Box::new(clipboard);
        self
    }

    /// Use a real text shaper for box heights.
    pub fn with_measurer(mut self, measurer: impl TextMeasurer + 'static) -> Self {
        self.measurer = Box::new(measurer);
        self
    }

    pub fn doc_id(&self) -> &str {
        &self.doc_id
    }

    pub fn document(&self) -> &AnnotationDocument {
        &self.document
    }

    pub fn objects(&self) -> &[AnnotationObject] {
        self.document.objects()
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    // --- pages and view ---

    pub fn pages(&self) -> &[PageSource] {
        &self.pages
    }

    pub fn layout(&self) -> &PageLayout {
        &self.layout
    }

    pub fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    /// Rendered size of a page surface: host-reported, or the natural size.
    pub fn page_size(&self, page: usize) -> Option<Size> {
        let natural = self.pages.get(page)?.natural_size();
        Some(self.surface_sizes.get(&page).copied().unwrap_or(natural))
    }

    pub fn set_view_mode(&mut self, mode: ViewMode) {
        if self.view_mode != mode {
            log::info!("View mode {:?} -> {:?}", self.view_mode, mode);
            self.view_mode = mode;
            self.rebuild_layout();
        }
    }

    /// Show another page in the single view.
    pub fn set_current_page(&mut self, page: usize) {
        if page < self.pages.len() && page != self.current_page {
            self.current_page = page;
            self.rebuild_layout();
        }
    }

    /// The host laid a page out at a new pixel size (zoom, window resize).
    pub fn set_surface_size(&mut self, page: usize, size: Size) {
        if page < self.pages.len() {
            self.surface_sizes.insert(page, size);
            self.rebuild_layout();
        }
    }

    /// Replace the page list. Surfaces of pages that no longer exist are torn down.
    pub fn set_pages(&mut self, pages: Vec<PageSource>) {
        for page in pages.len()..self.pages.len() {
            self.surface_sizes.remove(&page);
            self.strokes.remove_page(page);
        }
        self.pages = pages;
        if self.current_page >= self.pages.len() {
            self.current_page = self.pages.len().saturating_sub(1);
        }
        self.rebuild_layout();
    }

    fn rebuild_layout(&mut self) {
        let layout = match self.view_mode {
            _ if self.pages.is_empty() => PageLayout::default(),
            ViewMode::Single => match self.page_size(self.current_page) {
                Some(size) => PageLayout::single(self.current_page, size),
                None => PageLayout::default(),
            },
            ViewMode::Combined => {
                let sizes: Vec<Size> = (0..self.pages.len()).filter_map(|p| self.page_size(p)).collect();
                PageLayout::combined(&sizes, self.config.page_gap)
            }
        };

        for old in self.layout.surfaces() {
            if !layout.is_rendered(old.page) {
                self.strokes.remove_page(old.page);
            }
        }
        for surface in layout.surfaces() {
            let unchanged = self.layout.surface(surface.page).map(|s| s.size()) == Some(surface.size());
            if !unchanged {
                self.strokes.invalidate_page(surface.page);
            }
        }
        self.layout = layout;
    }

    // --- tools ---

    pub fn tool(&self) -> ToolKind {
        self.tool
    }

    /// Switch tools. A running gesture is cancelled.
    pub fn set_tool(&mut self, tool: ToolKind) {
        if self.state.is_gesture() {
            self.abort_gesture();
        }
        self.tool = tool;
    }

    /// Toggle the draw tool. Turning it on turns erase off.
    pub fn toggle_draw(&mut self) {
        let next = if self.tool == ToolKind::Draw { ToolKind::Select } else { ToolKind::Draw };
        self.set_tool(next);
    }

    /// Toggle the erase tool. Turning it on turns draw off.
    pub fn toggle_erase(&mut self) {
        let next = if self.tool == ToolKind::Erase { ToolKind::Select } else { ToolKind::Erase };
        self.set_tool(next);
    }

    // --- placement ---

    /// Arm click-to-place. Replaces any pending placement.
    pub fn begin_placement(&mut self, placement: Placement) {
        if self.state.is_gesture() {
            return;
        }
        log::debug!("Placement pending: {}", placement.name());
        self.state = InteractionState::PlacementPending(placement);
    }

    pub fn pending_placement(&self) -> Option<&Placement> {
        match &self.state {
            InteractionState::PlacementPending(p) => Some(p),
            _ => None,
        }
    }

    pub fn cancel_placement(&mut self) {
        if let InteractionState::PlacementPending(_) = self.state {
            self.state = InteractionState::Idle;
        }
    }

    // --- selection ---

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    /// The object plus the other members of its group.
    pub(crate) fn with_group(&self, id: ObjectId) -> Vec<ObjectId> {
        match self.document.get(id).and_then(AnnotationObject::group) {
            Some(group) => self.document.group_members(group),
            None => vec![id],
        }
    }

    /// Select an object and its group.
    pub fn select(&mut self, id: ObjectId) {
        if self.document.contains(id) {
            let members = self.with_group(id);
            self.selection.set(members);
        }
    }

    pub fn select_all(&mut self) {
        self.selection.set(self.document.objects().iter().map(AnnotationObject::id));
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    // --- history ---

    /// Record the current collection before a mutation.
    pub(crate) fn record_history(&mut self) {
        self.history.push(self.document.objects());
        log::debug!("History depth {}", self.history.undo_depth());
    }

    pub(crate) fn sync_strokes(&mut self) {
        self.strokes.sync(self.document.objects());
    }

    /// After the collection was swapped wholesale.
    fn after_restore(&mut self) {
        let document = &self.document;
        self.selection.retain(|id| document.contains(id));
        self.sync_strokes();
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn undo(&mut self) -> bool {
        if self.state.is_gesture() {
            return false;
        }
        match self.history.undo(self.document.objects()) {
            Some(snapshot) => {
                self.document.restore(snapshot);
                self.after_restore();
                log::debug!("Undo");
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        if self.state.is_gesture() {
            return false;
        }
        match self.history.redo(self.document.objects()) {
            Some(snapshot) => {
                self.document.restore(snapshot);
                self.after_restore();
                log::debug!("Redo");
                true
            }
            None => false,
        }
    }

    // --- mutations ---

    /// Add an object on top of the collection.
    pub fn add_object(&mut self, object: AnnotationObject) -> ObjectId {
        let id = object.id();
        let is_stroke = object.is_stroke();
        self.record_history();
        self.document.add(object);
        if is_stroke {
            self.sync_strokes();
        }
        id
    }

    /// Remove the selected objects. Returns how many were removed.
    pub fn delete_selected(&mut self) -> usize {
        if self.selection.is_empty() {
            return 0;
        }
        self.record_history();
        let removed = self.document.remove_all(self.selection.ids());
        self.selection.clear();
        self.sync_strokes();
        log::info!("Deleted {} objects", removed);
        removed
    }

    /// Move the selection by a page-local delta as one history step.
    pub fn move_selected_by(&mut self, delta: Vec2) {
        if self.selection.is_empty() || delta == Vec2::ZERO {
            return;
        }
        self.record_history();
        for id in self.selection.ids() {
            if let Some(object) = self.document.get_mut(*id) {
                object.translate(delta);
            }
        }
        self.sync_strokes();
    }

    /// Edit the content of a text or target object. Text boxes grow to fit.
    pub fn set_content(&mut self, id: ObjectId, content: impl Into<String>) -> bool {
        let content = content.into();
        if !matches!(
            self.document.get(id),
            Some(AnnotationObject::Text(_) | AnnotationObject::Target(_))
        ) {
            return false;
        }
        self.record_history();
        let measurer = &*self.measurer;
        match self.document.get_mut(id) {
            Some(AnnotationObject::Text(text)) => {
                text.content = content;
                text.fit_height(measurer);
            }
            Some(AnnotationObject::Target(target)) => target.content = content,
            _ => {}
        }
        true
    }

    /// Change the font size of a text, score or target object.
    pub fn set_font_size(&mut self, id: ObjectId, font_size: f64) -> bool {
        if !(font_size.is_finite() && font_size > 0.0)
            || !matches!(
                self.document.get(id),
                Some(AnnotationObject::Text(_) | AnnotationObject::Score(_) | AnnotationObject::Target(_))
            )
        {
            return false;
        }
        self.record_history();
        let measurer = &*self.measurer;
        match self.document.get_mut(id) {
            Some(AnnotationObject::Text(text)) => {
                text.font_size = font_size;
                text.fit_height(measurer);
            }
            Some(AnnotationObject::Score(score)) => {
                score.font_size = font_size.max(crate::objects::Score::MIN_FONT_SIZE)
            }
            Some(AnnotationObject::Target(target)) => target.font_size = font_size,
            _ => {}
        }
        true
    }

    pub fn set_score_points(&mut self, id: ObjectId, points: i64) -> bool {
        if !matches!(self.document.get(id), Some(AnnotationObject::Score(_))) {
            return false;
        }
        self.record_history();
        if let Some(AnnotationObject::Score(score)) = self.document.get_mut(id) {
            score.points = points;
        }
        true
    }

    /// Put the selected objects in a new group. Needs at least two.
    pub fn group_selected(&mut self) -> Option<GroupId> {
        if self.selection.len() < 2 {
            return None;
        }
        self.record_history();
        let group = Uuid::new_v4();
        for id in self.selection.ids() {
            if let Some(object) = self.document.get_mut(*id) {
                object.set_group(Some(group));
            }
        }
        log::debug!("Grouped {} objects", self.selection.len());
        Some(group)
    }

    /// Clear the group of every selected object. Returns how many changed.
    pub fn ungroup_selected(&mut self) -> usize {
        let grouped: Vec<ObjectId> = self
            .selection
            .ids()
            .iter()
            .copied()
            .filter(|id| self.document.get(*id).and_then(AnnotationObject::group).is_some())
            .collect();
        if grouped.is_empty() {
            return 0;
        }
        self.record_history();
        for id in &grouped {
            if let Some(object) = self.document.get_mut(*id) {
                object.set_group(None);
            }
        }
        grouped.len()
    }

    // --- clipboard ---

    /// Copy the selection. Returns how many objects were copied.
    pub fn copy_selected(&mut self) -> usize {
        let objects: Vec<AnnotationObject> = self
            .document
            .objects()
            .iter()
            .filter(|o| self.selection.contains(o.id()))
            .cloned()
            .collect();
        let count = objects.len();
        if count > 0 {
            self.clipboard.copy(objects);
        }
        count
    }

    /// Paste the clipboard, offset from the originals, and select the copies.
    pub fn paste(&mut self) -> Vec<ObjectId> {
        let Some(contents) = self.clipboard.contents() else {
            return Vec::new();
        };
        let offset = Vec2::new(self.config.paste_offset, self.config.paste_offset);
        let pasted = prepare_paste(&contents, offset);
        let ids: Vec<ObjectId> = pasted.iter().map(AnnotationObject::id).collect();
        self.record_history();
        self.document.extend(pasted);
        self.selection.set(ids.iter().copied());
        self.sync_strokes();
        log::debug!("Pasted {} objects", ids.len());
        ids
    }

    // --- keyboard ---

    /// Run a keyboard command. Returns true if it did something.
    pub fn handle_key(&mut self, key: EditorKey) -> bool {
        if key == EditorKey::Escape {
            return match self.state {
                InteractionState::Idle => false,
                InteractionState::PlacementPending(_) => {
                    self.cancel_placement();
                    true
                }
                _ => {
                    self.abort_gesture();
                    true
                }
            };
        }
        if self.state.is_gesture() {
            return false;
        }
        match key {
            EditorKey::Delete => self.delete_selected() > 0,
            EditorKey::Undo => self.undo(),
            EditorKey::Redo => self.redo(),
            EditorKey::Copy => self.copy_selected() > 0,
            EditorKey::Paste => !self.paste().is_empty(),
            EditorKey::SelectAll => {
                self.select_all();
                !self.selection.is_empty()
            }
            EditorKey::Group => self.group_selected().is_some(),
            EditorKey::Ungroup => self.ungroup_selected() > 0,
            EditorKey::Escape => false,
        }
    }

    // --- rendering ---

    /// Whether the stroke overlay needs a frame.
    pub fn frame_requested(&self) -> bool {
        self.strokes.frame_requested()
    }

    /// Flush pending stroke work. Call once per display refresh.
    pub fn render_frame(&mut self, surface: &mut dyn StrokeSurface) -> FrameStats {
        self.strokes.flush(surface, &self.layout)
    }

    pub fn strokes(&self) -> &StrokePipeline {
        &self.strokes
    }

    // --- auto layout ---

    /// Apply a batch of layout suggestions as one history step.
    pub fn apply_auto_layout(&mut self, batch: &LayoutBatch) -> LayoutReport {
        let (objects, report) = AutoLayoutMapper::new(&self.layout, &self.config, &*self.measurer).map(batch);
        if !objects.is_empty() {
            self.record_history();
            let ids: Vec<ObjectId> = objects.iter().map(AnnotationObject::id).collect();
            self.document.extend(objects);
            self.selection.set(ids);
        }
        log::info!(
            "Auto-layout applied {} suggestions, skipped {}",
            report.applied,
            report.skipped
        );
        self.notify(
            NotificationLevel::Info,
            format!("Placed {} suggestions", report.applied),
        );
        report
    }

    /// Apply the result of a layout request. Failures change nothing.
    pub fn complete_auto_layout(&mut self, result: Result<LayoutBatch, LayoutError>) -> Option<LayoutReport> {
        match result {
            Ok(batch) => Some(self.apply_auto_layout(&batch)),
            Err(e) => {
                self.notify(NotificationLevel::Error, format!("Auto-layout failed: {}", e));
                None
            }
        }
    }

    pub async fn run_auto_layout(&mut self, service: &dyn LayoutService) -> Option<LayoutReport> {
        let result = service.request_auto_layout(&self.doc_id).await;
        self.complete_auto_layout(result)
    }

    // --- persistence ---

    /// Record the outcome of a save. Local state is never rolled back.
    pub fn complete_save(&mut self, result: StorageResult<()>) -> bool {
        match result {
            Ok(()) => {
                log::info!("Saved {} objects for {}", self.document.len(), self.doc_id);
                true
            }
            Err(e) => {
                self.notify(NotificationLevel::Error, format!("Save failed: {}", e));
                false
            }
        }
    }

    /// Replace the collection with loaded annotations. A missing document loads empty.
    pub fn complete_load(&mut self, result: StorageResult<Vec<AnnotationObject>>) -> bool {
        let objects = match result {
            Ok(objects) => objects,
            Err(StorageError::NotFound(_)) => {
                log::info!("No saved annotations for {}", self.doc_id);
                Vec::new()
            }
            Err(e) => {
                self.notify(NotificationLevel::Error, format!("Load failed: {}", e));
                return false;
            }
        };
        if self.state.is_gesture() {
            self.abort_gesture();
        }
        log::info!("Loaded {} objects for {}", objects.len(), self.doc_id);
        self.document.restore(objects);
        self.history.clear();
        self.selection.clear();
        self.sync_strokes();
        true
    }

    pub async fn save(&mut self, store: &dyn AnnotationStore) -> bool {
        let result = store
            .save_annotations(&self.doc_id, self.document.objects())
            .await;
        self.complete_save(result)
    }

    pub async fn load(&mut self, store: &dyn AnnotationStore) -> bool {
        let result = store.load_annotations(&self.doc_id).await;
        self.complete_load(result)
    }

    // --- export ---

    /// One capture per page, with the objects drawn on it.
    pub fn capture_targets(&self) -> Vec<CaptureTarget> {
        self.pages
            .iter()
            .enumerate()
            .filter_map(|(page, source)| {
                Some(CaptureTarget {
                    page,
                    raster: source.reference.clone(),
                    surface_size: self.page_size(page)?,
                    objects: self.document.on_page(page).cloned().collect(),
                })
            })
            .collect()
    }

    pub async fn export(&mut self, exporter: &dyn Exporter) -> Option<String> {
        let captures = self.capture_targets();
        let result = if captures.is_empty() {
            Err(ExportError::Empty)
        } else {
            exporter.export(&self.doc_id, captures).await
        };
        match result {
            Ok(artifact) => {
                self.notify(NotificationLevel::Info, format!("Exported {}", artifact));
                Some(artifact)
            }
            Err(e) => {
                self.notify(NotificationLevel::Error, format!("Export failed: {}", e));
                None
            }
        }
    }

    // --- notifications ---

    fn notify(&mut self, level: NotificationLevel, message: String) {
        if level == NotificationLevel::Error {
            log::warn!("{}", message);
        }
        self.notifications.push(Notification { level, message });
    }

    /// Drain pending notifications.
    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }
}
