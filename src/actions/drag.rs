use std::collections::HashSet;

use egui::{Pos2, Vec2};

use super::{AcceptResult, ActionKind, EditorAction};
use crate::editor::state::{EditorState, SaveReason};
use crate::graph_utils::geometry::align_to_grid;
use crate::graph_utils::ids::{NodeId, ObjectId};
use crate::graph_utils::objects::Object;

/// Moves the grabbed node, or the whole selection when the grabbed node is selected.
/// Groups carry their contents along.
#[derive(Debug, Default)]
pub struct DragAction {
    nodes: Vec<NodeId>,
    primary: Option<NodeId>,
    start_pointer: Pos2,
    // Group the primary node would join if dropped now
    drop_group: Option<NodeId>,
}

impl DragAction {
    pub fn dragged_nodes(&self) -> &[NodeId] { &self.nodes }

    pub fn drop_group(&self) -> Option<NodeId> { self.drop_group }

    fn grabbed_node(state: &EditorState) -> Option<NodeId> {
        let button = state.config.drag_button;
        let node = state.control.pressed_object(button)?.as_node()?;
        let region = state.control.pressed_region(button);
        let node = state.graph.live_node(node)?;
        // Group edges belong to resizing
        if node.is_group() && region.is_resize_handle() {
            return None;
        }
        Some(node.id)
    }

    // Nodes not dragged along with one of their (transitive) groups
    fn top_level(&self, state: &EditorState) -> Vec<NodeId> {
        let dragged: HashSet<NodeId> = self.nodes.iter().copied().collect();
        self.nodes
            .iter()
            .copied()
            .filter(|&id| {
                !state.graph.get_node(id).and_then(|n| n.group_id).is_some_and(|group| dragged.contains(&group))
            })
            .collect()
    }

    fn target_group(state: &EditorState, node: NodeId) -> Option<NodeId> {
        let bounds = state.graph.get_node(node)?.bounds;
        let mut exclude: HashSet<NodeId> = state.graph.grouped_nodes(node, true).into_iter().collect();
        exclude.insert(node);
        state.graph.group_containing(bounds, &exclude)
    }

    fn regroup(&self, state: &mut EditorState) {
        for node in self.top_level(state) {
            let target = Self::target_group(state, node);
            let Some(entry) = state.graph.get_node_mut(node) else { continue };
            if entry.group_id != target {
                log::debug!("{node:?} moved from group {:?} to {target:?}", entry.group_id);
                entry.group_id = target;
                state.make_dirty(SaveReason::POSITION, Some(node));
            }
        }
    }

    fn finish(&mut self, state: &mut EditorState, commit: bool) {
        for &id in &self.nodes {
            let Some(node) = state.graph.get_node_mut(id) else { continue };
            if !commit
                && let Some(start) = node.drag_start
            {
                node.position = start;
            }
            if node.end_drag() {
                state.make_dirty(SaveReason::POSITION, Some(id));
            }
        }
        if commit && state.config.auto_group_on_drop {
            self.regroup(state);
        }
        state.resolver.release_capture();
        self.nodes.clear();
        self.primary = None;
        self.drop_group = None;
    }
}

impl EditorAction for DragAction {
    fn kind(&self) -> ActionKind { ActionKind::Drag }

    fn accept(&mut self, state: &mut EditorState) -> AcceptResult {
        let button = state.config.drag_button;
        let Some(grabbed) = Self::grabbed_node(state) else { return AcceptResult::False };
        if !state.pointer.is_dragging(button) {
            return if state.pointer.is_down(button) { AcceptResult::Possible } else { AcceptResult::False };
        }
        let Some(press) = state.pointer.press_pos(button) else { return AcceptResult::False };

        let object = ObjectId::Node(grabbed);
        if !state.is_selected(object) {
            let modifiers = state.pointer.modifiers();
            if modifiers.shift || modifiers.command {
                state.select_object(object);
            } else {
                state.set_selection(object);
            }
        }
        let mut nodes = Vec::new();
        for id in state.selected_nodes_with_groups() {
            if let Some(node) = state.graph.get_node_mut(id)
                && node.accept_drag()
            {
                nodes.push(id);
            }
        }
        if nodes.is_empty() {
            return AcceptResult::False;
        }
        log::debug!("dragging {} node(s)", nodes.len());
        self.nodes = nodes;
        self.primary = Some(grabbed);
        self.start_pointer = state.view.to_canvas(press);
        state.resolver.capture(object);
        AcceptResult::True
    }

    fn process(&mut self, state: &mut EditorState) -> bool {
        if self.nodes.is_empty() {
            return false;
        }
        if !state.pointer.is_down(state.config.drag_button) {
            self.finish(state, true);
            return false;
        }
        let Some(pointer) = state.canvas_pointer() else { return true };
        let mut offset = pointer - self.start_pointer;
        if state.config.snap_to_grid
            && !state.pointer.modifiers().alt
            && let Some(start) = self.primary.and_then(|id| state.graph.get_node(id)).and_then(|n| n.drag_start)
        {
            offset = snapped_offset(start, offset, state.config.grid_size);
        }
        for &id in &self.nodes {
            if let Some(node) = state.graph.get_node_mut(id) {
                node.update_drag(offset);
            }
        }
        self.drop_group = match (state.config.auto_group_on_drop, self.primary) {
            (true, Some(primary)) => Self::target_group(state, primary),
            _ => None,
        };
        true
    }

    fn cancel(&mut self, state: &mut EditorState) {
        self.finish(state, false);
    }

    fn is_active(&self) -> bool { !self.nodes.is_empty() }

    fn is_dragging(&self) -> bool { !self.nodes.is_empty() }
}

// Offset that lands `start + raw` on the grid
pub fn snapped_offset(start: Pos2, raw: Vec2, grid: f32) -> Vec2 {
    align_to_grid(start + raw, grid) - start
}
