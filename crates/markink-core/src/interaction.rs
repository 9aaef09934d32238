//! Pointer-driven interaction state machine.
//!
//! Pointer positions arrive in container coordinates. A gesture captures the
//! pointer that started it; events from other pointers are ignored until it
//! ends.

use crate::editor::Editor;
use crate::geometry::ViewMode;
use crate::objects::{AnnotationObject, ObjectId};
use crate::placement::Placement;
use crate::selection::{MoveGesture, ResizeGesture, apply_resize, hit_test_handles};
use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};

/// Active canvas tool. Draw and erase exclude each other by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ToolKind {
    #[default]
    Select,
    Draw,
    Erase,
}

/// Kind of device behind a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PointerDevice {
    #[default]
    Mouse,
    Pen,
    Touch,
}

/// Keyboard modifiers held during a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    pub fn shift() -> Self {
        Self {
            shift: true,
            ..Self::NONE
        }
    }

    /// Whether a click should toggle membership instead of replacing the selection.
    pub fn multi_select(&self) -> bool {
        self.shift || self.ctrl || self.meta
    }
}

/// A pointer event in container coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerInput {
    pub pointer_id: u64,
    pub position: Point,
    pub device: PointerDevice,
    /// Pen pressure in `[0, 1]`.
    pub pressure: Option<f64>,
    pub modifiers: Modifiers,
}

impl PointerInput {
    pub fn new(pointer_id: u64, position: Point, device: PointerDevice) -> Self {
        Self {
            pointer_id,
            position,
            device,
            pressure: None,
            modifiers: Modifiers::NONE,
        }
    }

    /// Primary mouse pointer.
    pub fn mouse(position: Point) -> Self {
        Self::new(1, position, PointerDevice::Mouse)
    }

    pub fn with_pressure(mut self, pressure: f64) -> Self {
        self.pressure = Some(pressure);
        self
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Pressure as the stroke pipeline should see it. Only pens report pressure.
    fn stroke_pressure(&self) -> Option<f64> {
        match self.device {
            PointerDevice::Pen => self.pressure,
            PointerDevice::Mouse | PointerDevice::Touch => None,
        }
    }
}

/// A freehand stroke in progress.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawGesture {
    pub pointer_id: u64,
    pub page: usize,
}

/// An erase drag in progress.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EraseGesture {
    pub pointer_id: u64,
    pub history_pushed: bool,
    pub erased: usize,
}

/// Where the editor is in a pointer interaction.
#[derive(Debug, Clone, Default)]
pub enum InteractionState {
    #[default]
    Idle,
    Drawing(DrawGesture),
    Erasing(EraseGesture),
    MovingSelection(MoveGesture),
    Resizing(ResizeGesture),
    /// The next canvas click places this.
    PlacementPending(Placement),
}

impl InteractionState {
    /// Pointer captured by the active gesture.
    pub fn pointer_id(&self) -> Option<u64> {
        match self {
            InteractionState::Drawing(g) => Some(g.pointer_id),
            InteractionState::Erasing(g) => Some(g.pointer_id),
            InteractionState::MovingSelection(g) => Some(g.pointer_id),
            InteractionState::Resizing(g) => Some(g.pointer_id),
            InteractionState::Idle | InteractionState::PlacementPending(_) => None,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, InteractionState::Idle)
    }

    /// True while a pointer gesture is running.
    pub fn is_gesture(&self) -> bool {
        self.pointer_id().is_some()
    }

    pub fn name(&self) -> &'static str {
        match self {
            InteractionState::Idle => "idle",
            InteractionState::Drawing(_) => "drawing",
            InteractionState::Erasing(_) => "erasing",
            InteractionState::MovingSelection(_) => "moving",
            InteractionState::Resizing(_) => "resizing",
            InteractionState::PlacementPending(_) => "placement",
        }
    }
}

impl Editor {
    /// Handle a pointer press.
    pub fn pointer_down(&mut self, input: PointerInput) {
        if self.state.is_gesture() {
            log::debug!(
                "Ignoring pointer {} while {}",
                input.pointer_id,
                self.state.name()
            );
            return;
        }

        if let InteractionState::PlacementPending(placement) = &self.state {
            let placement = placement.clone();
            self.place(placement, input.position);
            return;
        }

        match self.tool {
            ToolKind::Draw => self.begin_draw(&input),
            ToolKind::Erase => self.begin_erase(&input),
            ToolKind::Select => self.begin_select(&input),
        }
    }

    /// Handle pointer motion.
    pub fn pointer_move(&mut self, input: PointerInput) {
        if self.state.pointer_id() != Some(input.pointer_id) {
            return;
        }
        let mut state = std::mem::take(&mut self.state);
        match &mut state {
            InteractionState::Drawing(g) => self.continue_draw(g, &input),
            InteractionState::Erasing(g) => self.erase_under(g, input.position),
            InteractionState::MovingSelection(g) => self.continue_move(g, input.position),
            InteractionState::Resizing(g) => self.continue_resize(g, input.position),
            InteractionState::Idle | InteractionState::PlacementPending(_) => {}
        }
        self.state = state;
    }

    /// Handle a pointer release. Ends the captured gesture.
    pub fn pointer_up(&mut self, input: PointerInput) {
        if self.state.pointer_id() != Some(input.pointer_id) {
            return;
        }
        match std::mem::take(&mut self.state) {
            InteractionState::Drawing(_) => self.commit_stroke(),
            InteractionState::Erasing(g) => {
                if g.erased > 0 {
                    log::info!("Erased {} strokes", g.erased);
                }
            }
            InteractionState::MovingSelection(mut g) => {
                self.continue_move(&mut g, input.position);
                self.finish_move(&g, input.position);
            }
            InteractionState::Resizing(mut g) => {
                self.continue_resize(&mut g, input.position);
                self.finish_resize(&g);
            }
            other @ (InteractionState::Idle | InteractionState::PlacementPending(_)) => self.state = other,
        }
    }

    /// The captured pointer was cancelled or lost.
    pub fn pointer_cancel(&mut self, pointer_id: u64) {
        if self.state.pointer_id() == Some(pointer_id) {
            self.abort_gesture();
        }
    }

    /// Drop whatever the pointer was doing. Changes already applied are kept.
    pub(crate) fn abort_gesture(&mut self) {
        if let InteractionState::Drawing(_) = self.state {
            self.strokes.cancel_stroke();
        }
        log::debug!("Gesture {} aborted", self.state.name());
        self.state = InteractionState::Idle;
    }

    fn place(&mut self, placement: Placement, position: Point) {
        let Some((page, local)) = self.layout.locate_page(position) else {
            return;
        };
        let Some(page_size) = self.layout.surface(page).map(|s| s.size()) else {
            return;
        };
        let objects = placement.build(page, local, page_size, &self.config, &*self.measurer);
        let ids: Vec<ObjectId> = objects.iter().map(AnnotationObject::id).collect();
        log::info!("Placed {} ({} objects) on page {}", placement.name(), ids.len(), page);

        self.record_history();
        self.document.extend(objects);
        self.selection.set(ids);
        self.state = InteractionState::Idle;
    }

    fn begin_draw(&mut self, input: &PointerInput) {
        if input.device == PointerDevice::Touch {
            return;
        }
        let Some((page, local)) = self.layout.locate_page(input.position) else {
            return;
        };
        self.strokes.begin_stroke(
            page,
            local,
            input.stroke_pressure(),
            self.config.stroke_width,
            self.config.stroke_color,
        );
        self.state = InteractionState::Drawing(DrawGesture {
            pointer_id: input.pointer_id,
            page,
        });
    }

    fn continue_draw(&mut self, gesture: &DrawGesture, input: &PointerInput) {
        let Some(local) = self.layout.container_to_page(gesture.page, input.position) else {
            return;
        };
        self.strokes
            .extend_stroke(local, input.stroke_pressure(), self.config.min_stroke_distance);
    }

    fn commit_stroke(&mut self) {
        let Some(active) = self.strokes.take_active() else {
            return;
        };
        let stroke = active.into_stroke();
        log::debug!("Committing stroke with {} points on page {}", stroke.len(), stroke.page);
        self.record_history();
        self.document.add(AnnotationObject::Draw(stroke));
        self.sync_strokes();
    }

    fn begin_erase(&mut self, input: &PointerInput) {
        let mut gesture = EraseGesture {
            pointer_id: input.pointer_id,
            history_pushed: false,
            erased: 0,
        };
        self.erase_under(&mut gesture, input.position);
        self.state = InteractionState::Erasing(gesture);
    }

    /// Delete every stroke under the pointer. History is recorded once per gesture.
    fn erase_under(&mut self, gesture: &mut EraseGesture, position: Point) {
        let Some((page, local)) = self.layout.locate_page(position) else {
            return;
        };
        let ids = self
            .document
            .strokes_touching(page, local, self.config.erase_radius);
        if ids.is_empty() {
            return;
        }
        if !gesture.history_pushed {
            self.record_history();
            gesture.history_pushed = true;
        }
        gesture.erased += self.document.remove_all(&ids);
        self.selection.retain(|id| !ids.contains(&id));
        self.sync_strokes();
    }

    fn begin_select(&mut self, input: &PointerInput) {
        let multi = input.modifiers.multi_select();
        let Some((page, local)) = self.layout.locate_page(input.position) else {
            if !multi {
                self.selection.clear();
            }
            return;
        };

        if !multi {
            if let Some(gesture) = self.handle_under(input, page, local) {
                self.record_history();
                log::debug!("Resize {:?} on {}", gesture.handle, gesture.object_id);
                self.state = InteractionState::Resizing(gesture);
                return;
            }
        }

        let Some(hit) = self
            .document
            .topmost_at(page, local, self.config.selection_tolerance)
        else {
            if !multi {
                self.selection.clear();
            }
            return;
        };

        // A modifier toggles the hit object alone; groups expand only on a plain click.
        if multi {
            if self.selection.contains(hit) {
                self.selection.remove(hit);
            } else {
                self.selection.insert(hit);
            }
            return;
        }

        if !self.selection.contains(hit) {
            let members = self.with_group(hit);
            self.selection.set(members);
        }
        let originals: Vec<AnnotationObject> = self
            .selection
            .ids()
            .iter()
            .filter_map(|id| self.document.get(*id).cloned())
            .collect();
        self.state = InteractionState::MovingSelection(MoveGesture::new(
            input.pointer_id,
            input.position,
            originals,
        ));
    }

    fn handle_under(&self, input: &PointerInput, page: usize, local: Point) -> Option<ResizeGesture> {
        let id = self.selection.single()?;
        let object = self.document.get(id)?;
        if object.page() != page {
            return None;
        }
        let handle = hit_test_handles(object, local, self.config.handle_tolerance)?;
        Some(ResizeGesture::new(input.pointer_id, handle, input.position, object.clone()))
    }

    fn continue_move(&mut self, gesture: &mut MoveGesture, position: Point) {
        gesture.current_point = position;
        let delta = gesture.delta();
        if delta == Vec2::ZERO && !gesture.history_pushed {
            return;
        }
        if !gesture.history_pushed {
            self.record_history();
            gesture.history_pushed = true;
        }
        for original in &gesture.originals {
            let mut moved = original.clone();
            moved.translate(delta);
            self.document.replace(moved);
        }
        if gesture.originals.iter().any(AnnotationObject::is_stroke) {
            self.sync_strokes();
        }
    }

    /// In the combined view, objects dropped onto another page move to that page.
    fn finish_move(&mut self, gesture: &MoveGesture, position: Point) {
        if !gesture.history_pushed || self.view_mode != ViewMode::Combined {
            return;
        }
        let Some((drop_page, _)) = self.layout.locate_page(position) else {
            return;
        };
        let mut rebased = 0;
        for id in gesture.object_ids() {
            let Some(object) = self.document.get_mut(id) else {
                continue;
            };
            let from = object.page();
            if from == drop_page {
                continue;
            }
            if let Some(offset) = self.layout.rebase_offset(from, drop_page) {
                object.set_page(drop_page);
                object.translate(offset);
                rebased += 1;
            }
        }
        if rebased > 0 {
            log::debug!("Moved {} objects to page {}", rebased, drop_page);
            self.sync_strokes();
        }
    }

    fn continue_resize(&mut self, gesture: &mut ResizeGesture, position: Point) {
        gesture.current_point = position;
        let resized = apply_resize(&gesture.original, gesture.handle, gesture.delta());
        self.document.replace(resized);
    }

    fn finish_resize(&mut self, gesture: &ResizeGesture) {
        let measurer = &*self.measurer;
        if let Some(text) = self
            .document
            .get_mut(gesture.object_id)
            .and_then(AnnotationObject::as_text_mut)
        {
            text.fit_height(measurer);
        }
    }
}
