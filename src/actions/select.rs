use egui::{Pos2, Rect};

use super::{AcceptResult, ActionKind, EditorAction};
use crate::editor::state::{EditorState, SaveReason};
use crate::graph_utils::geometry::{contains_rect, rect_from_points};
use crate::graph_utils::ids::ObjectId;
use crate::graph_utils::objects::Object;
use crate::persistence::settings::BoxSelectMode;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum BoxOp {
    #[default]
    Replace,
    Add,
    Toggle,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
enum Mode {
    #[default]
    Idle,
    Click(ObjectId),
    Box,
}

/// Click selection and rectangle selection.
#[derive(Debug, Default)]
pub struct SelectAction {
    mode: Mode,
    op: BoxOp,
    start: Pos2,
    base: Vec<ObjectId>,
    rect: Option<Rect>,
    selection_id: u64,
}

/// Objects a selection rectangle picks up, nodes first in z order, then links.
pub fn box_candidates(state: &EditorState, rect: Rect) -> Vec<ObjectId> {
    let intersect = state.config.box_select_mode == BoxSelectMode::Intersect;
    let mut result: Vec<ObjectId> = state
        .graph
        .nodes_in_z_order()
        .into_iter()
        // A rectangle drawn inside a group's body doesn't grab the group itself
        .filter(|n| !(intersect && n.is_group() && contains_rect(n.group_bounds, rect)))
        .filter(|n| n.test_hit_rect(rect, intersect))
        .map(|n| ObjectId::Node(n.id))
        .collect();
    result.extend(state.graph.links.iter().filter(|l| l.test_hit_rect(rect, intersect)).map(|l| ObjectId::Link(l.id)));
    result
}

impl SelectAction {
    pub fn selection_rect(&self) -> Option<Rect> { self.rect }

    fn op_for(state: &EditorState) -> BoxOp {
        let modifiers = state.pointer.modifiers();
        if modifiers.command {
            BoxOp::Toggle
        } else if modifiers.shift {
            BoxOp::Add
        } else {
            BoxOp::Replace
        }
    }

    fn mark_if_changed(&self, state: &mut EditorState) {
        if state.selection.selection_id() != self.selection_id {
            state.make_dirty(SaveReason::SELECTION, None);
        }
    }
}

impl EditorAction for SelectAction {
    fn kind(&self) -> ActionKind { ActionKind::Select }

    fn accept(&mut self, state: &mut EditorState) -> AcceptResult {
        let button = state.config.select_button;
        let control = &state.control;
        let clicked = if control.is_clicked_with(button) && (control.clicked.is_node() || control.clicked.is_link()) {
            Some(control.clicked)
        } else if control.background_clicked == Some(button) {
            Some(ObjectId::None)
        } else {
            None
        };
        if let Some(target) = clicked {
            self.mode = Mode::Click(target);
            self.op = Self::op_for(state);
            self.selection_id = state.selection.selection_id();
            return AcceptResult::True;
        }

        let pressed = control.pressed_object(button);
        if pressed == Some(ObjectId::None)
            && state.pointer.is_dragging(button)
            && let Some(press) = state.pointer.press_pos(button)
        {
            self.mode = Mode::Box;
            self.op = Self::op_for(state);
            self.start = state.view.to_canvas(press);
            self.base = state.selection.items().to_vec();
            self.selection_id = state.selection.selection_id();
            return AcceptResult::True;
        }
        if pressed.is_some_and(|p| !p.is_pin()) && state.pointer.is_down(button) {
            return AcceptResult::Possible;
        }
        AcceptResult::False
    }

    fn process(&mut self, state: &mut EditorState) -> bool {
        match self.mode {
            Mode::Idle => false,
            Mode::Click(target) => {
                match (self.op, target.is_some()) {
                    (BoxOp::Toggle, true) => {
                        state.toggle_selection(target);
                    }
                    (BoxOp::Add, true) => {
                        state.select_object(target);
                    }
                    (BoxOp::Replace, true) => state.set_selection(target),
                    (BoxOp::Replace, false) => state.clear_selection(),
                    _ => {}
                }
                self.mark_if_changed(state);
                self.mode = Mode::Idle;
                false
            }
            Mode::Box => {
                if !state.pointer.is_down(state.config.select_button) {
                    log::debug!("box selected {} object(s)", state.selection.len());
                    self.mark_if_changed(state);
                    self.cancel(state);
                    return false;
                }
                let Some(pointer) = state.canvas_pointer() else { return true };
                let rect = rect_from_points(self.start, pointer);
                self.rect = Some(rect);
                let candidates = box_candidates(state, rect);
                let ids: Vec<ObjectId> = match self.op {
                    BoxOp::Replace => candidates,
                    BoxOp::Add => {
                        let mut ids = self.base.clone();
                        ids.extend(candidates.into_iter().filter(|id| !self.base.contains(id)));
                        ids
                    }
                    BoxOp::Toggle => {
                        let mut ids: Vec<ObjectId> =
                            self.base.iter().copied().filter(|id| !candidates.contains(id)).collect();
                        ids.extend(candidates.into_iter().filter(|id| !self.base.contains(id)));
                        ids
                    }
                };
                state.replace_selection(&ids);
                true
            }
        }
    }

    fn cancel(&mut self, _state: &mut EditorState) {
        self.mode = Mode::Idle;
        self.rect = None;
        self.base.clear();
    }

    fn is_active(&self) -> bool { self.mode != Mode::Idle }

    fn is_dragging(&self) -> bool { self.mode == Mode::Box }
}
