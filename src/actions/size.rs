use egui::{Pos2, Rect, Vec2};

use super::{AcceptResult, ActionKind, EditorAction};
use crate::editor::state::{EditorState, SaveReason};
use crate::graph_utils::geometry::align_to_grid;
use crate::graph_utils::ids::{NodeId, ObjectId};
use crate::graph_utils::objects::NodeRegion;

/// Resizes a group by one of its edges or corners.
#[derive(Debug, Default)]
pub struct SizeAction {
    node: Option<NodeId>,
    region: NodeRegion,
    start_bounds: Option<Rect>,
    start_pointer: Pos2,
}

/// Moves the grabbed edges of `start` by `delta`, never shrinking below `min_size`.
/// The edges opposite the grabbed ones stay put.
pub fn resize_rect(start: Rect, region: NodeRegion, delta: Vec2, min_size: Vec2) -> Rect {
    let mut rect = start;
    if region.contains(NodeRegion::LEFT) {
        rect.min.x = (start.min.x + delta.x).min(start.max.x - min_size.x);
    }
    if region.contains(NodeRegion::RIGHT) {
        rect.max.x = (start.max.x + delta.x).max(start.min.x + min_size.x);
    }
    if region.contains(NodeRegion::TOP) {
        rect.min.y = (start.min.y + delta.y).min(start.max.y - min_size.y);
    }
    if region.contains(NodeRegion::BOTTOM) {
        rect.max.y = (start.max.y + delta.y).max(start.min.y + min_size.y);
    }
    rect
}

impl SizeAction {
    fn grabbed_group(state: &EditorState) -> Option<(NodeId, NodeRegion)> {
        let button = state.config.drag_button;
        let node = state.control.pressed_object(button)?.as_node()?;
        let region = state.control.pressed_region(button);
        let group = state.graph.live_node(node).filter(|n| n.is_group())?;
        region.is_resize_handle().then_some((group.id, region))
    }

    fn finish(&mut self, state: &mut EditorState) {
        if let (Some(node), Some(start)) = (self.node, self.start_bounds)
            && state.graph.get_node(node).is_some_and(|n| n.bounds != start)
        {
            state.make_dirty(SaveReason::SIZE | SaveReason::POSITION, Some(node));
        }
        state.resolver.release_capture();
        self.node = None;
        self.start_bounds = None;
    }

    pub fn node(&self) -> Option<NodeId> { self.node }
}

impl EditorAction for SizeAction {
    fn kind(&self) -> ActionKind { ActionKind::Size }

    fn accept(&mut self, state: &mut EditorState) -> AcceptResult {
        let button = state.config.drag_button;
        let Some((node, region)) = Self::grabbed_group(state) else { return AcceptResult::False };
        if !state.pointer.is_dragging(button) {
            return if state.pointer.is_down(button) { AcceptResult::Possible } else { AcceptResult::False };
        }
        let (Some(bounds), Some(press)) = (state.graph.get_node(node).map(|n| n.bounds), state.pointer.press_pos(button))
        else {
            return AcceptResult::False;
        };
        self.node = Some(node);
        self.region = region;
        self.start_bounds = Some(bounds);
        self.start_pointer = state.view.to_canvas(press);
        state.resolver.capture(ObjectId::Node(node));
        AcceptResult::True
    }

    fn process(&mut self, state: &mut EditorState) -> bool {
        let (Some(node), Some(start)) = (self.node, self.start_bounds) else { return false };
        if !state.pointer.is_down(state.config.drag_button) || state.graph.live_node(node).is_none() {
            log::debug!("resized {node:?}");
            self.finish(state);
            return false;
        }
        let Some(pointer) = state.canvas_pointer() else { return true };
        let mut delta = pointer - self.start_pointer;
        if state.config.snap_to_grid && !state.pointer.modifiers().alt {
            let grid = state.config.grid_size;
            let corner = Pos2::new(
                if self.region.contains(NodeRegion::LEFT) { start.min.x } else { start.max.x },
                if self.region.contains(NodeRegion::TOP) { start.min.y } else { start.max.y },
            );
            delta = align_to_grid(corner + delta, grid) - corner;
        }
        let rect = resize_rect(start, self.region, delta, state.config.min_group_size());
        if let Some(group) = state.graph.get_node_mut(node) {
            group.position = rect.min;
            group.group_size = Some(rect.size());
            group.bounds = rect;
        }
        true
    }

    fn cancel(&mut self, state: &mut EditorState) {
        if let (Some(node), Some(start)) = (self.node, self.start_bounds)
            && let Some(group) = state.graph.get_node_mut(node)
        {
            group.position = start.min;
            group.group_size = Some(start.size());
            group.bounds = start;
        }
        state.resolver.release_capture();
        self.node = None;
        self.start_bounds = None;
    }

    fn is_active(&self) -> bool { self.node.is_some() }

    fn is_dragging(&self) -> bool { self.node.is_some() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::{pos2, vec2};

    #[test]
    fn opposite_edges_stay_anchored() {
        let start = Rect::from_min_max(pos2(0.0, 0.0), pos2(100.0, 100.0));
        let rect = resize_rect(start, NodeRegion::TOP_LEFT, vec2(20.0, -10.0), vec2(10.0, 10.0));
        assert_eq!(rect, Rect::from_min_max(pos2(20.0, -10.0), pos2(100.0, 100.0)));
        let rect = resize_rect(start, NodeRegion::RIGHT, vec2(-500.0, 40.0), vec2(30.0, 10.0));
        assert_eq!(rect, Rect::from_min_max(pos2(0.0, 0.0), pos2(30.0, 100.0)));
    }

    #[test]
    fn shrinking_left_edge_stops_at_minimum() {
        let start = Rect::from_min_max(pos2(0.0, 0.0), pos2(100.0, 100.0));
        let rect = resize_rect(start, NodeRegion::LEFT, vec2(95.0, 0.0), vec2(40.0, 40.0));
        assert_eq!(rect.min.x, 60.0);
        assert_eq!(rect.max.x, 100.0);
    }
}
