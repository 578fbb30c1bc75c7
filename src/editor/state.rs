use std::collections::{BTreeSet, HashSet};

use bitflags::bitflags;
use egui::{Pos2, Rect, Vec2};

use super::animation::{Animations, NavigateReason, ZoomMode, navigation_target};
use super::control::{Control, ControlResolver};
use super::input::PointerTracker;
use super::selection::Selection;
use super::view::CanvasView;
use crate::graph_utils::graph::EditorGraph;
use crate::graph_utils::ids::{LinkId, NodeId, ObjectId, PinId};
use crate::persistence::settings::EditorConfig;

bitflags! {
    /// Why persisted state went stale since the host last drained it.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct SaveReason: u16 {
        const NAVIGATION = 1 << 0;
        const POSITION = 1 << 1;
        const SIZE = 1 << 2;
        const SELECTION = 1 << 3;
        const ADD_NODE = 1 << 4;
        const REMOVE_NODE = 1 << 5;
        const USER = 1 << 6;
    }
}

/// A link the editor already removed on its own, waiting to be reported to the host
/// through a delete session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RemovedLink {
    pub id: LinkId,
    pub start: PinId,
    pub end: PinId,
}

/// Everything an action may read or mutate. Owned by `EditorContext`.
#[derive(Debug, Default)]
pub struct EditorState {
    pub config: EditorConfig,
    pub graph: EditorGraph,
    pub selection: Selection,
    pub view: CanvasView,
    pub pointer: PointerTracker,
    pub resolver: ControlResolver,
    pub control: Control,
    pub animations: Animations,
    // Deletions requested by the host outside of any pointer interaction
    pub pending_deletions: Vec<ObjectId>,
    pub removed_links: Vec<RemovedLink>,
    // Removed links the host may still declare until it has been told
    pub tombstones: HashSet<LinkId>,
    pub shortcuts_enabled: bool,
    pub save_reasons: SaveReason,
    pub dirty_nodes: BTreeSet<NodeId>,
    pub navigation_reason: NavigateReason,
    pub frame: u64,
    pub time: f64,
    pub dt: f32,
}

impl EditorState {
    pub fn new(mut config: EditorConfig) -> Self {
        config.normalize();
        let shortcuts_enabled = config.shortcuts_enabled;
        Self { config, shortcuts_enabled, ..Default::default() }
    }

    pub fn canvas_pointer(&self) -> Option<Pos2> { self.pointer.pos().map(|p| self.view.to_canvas(p)) }

    pub fn make_dirty(&mut self, reason: SaveReason, node: Option<NodeId>) {
        self.save_reasons |= reason;
        if let Some(node) = node {
            self.dirty_nodes.insert(node);
        }
    }

    pub fn is_selected(&self, id: ObjectId) -> bool { self.selection.contains(id) }

    pub fn select_object(&mut self, id: ObjectId) -> bool {
        if !self.graph.object(id).is_some_and(|o| o.as_object().is_selectable()) {
            return false;
        }
        let added = self.selection.select(id);
        self.graph.set_selected(id, true);
        added
    }

    pub fn deselect_object(&mut self, id: ObjectId) -> bool {
        self.graph.set_selected(id, false);
        self.selection.deselect(id)
    }

    pub fn set_selection(&mut self, id: ObjectId) {
        for dropped in self.selection.set_selected(id) {
            self.graph.set_selected(dropped, false);
        }
        if id.is_some() {
            self.graph.set_selected(id, true);
        }
    }

    pub fn toggle_selection(&mut self, id: ObjectId) -> bool {
        if self.is_selected(id) {
            self.deselect_object(id);
            false
        } else {
            self.select_object(id)
        }
    }

    pub fn clear_selection(&mut self) {
        for dropped in self.selection.clear() {
            self.graph.set_selected(dropped, false);
        }
    }

    /// Replaces the selection with `ids` in order, touching the selection id only on change.
    pub fn replace_selection(&mut self, ids: &[ObjectId]) {
        let unchanged = self.selection.len() == ids.len() && ids.iter().all(|&id| self.selection.contains(id));
        if unchanged {
            return;
        }
        self.clear_selection();
        for &id in ids {
            self.select_object(id);
        }
    }

    // Selected nodes with group contents pulled in, each once
    pub fn selected_nodes_with_groups(&self) -> Vec<NodeId> {
        let mut result = Vec::new();
        for node in self.selection.nodes() {
            if !result.contains(&node) {
                result.push(node);
            }
            if self.graph.get_node(node).is_some_and(|n| n.is_group()) {
                for inner in self.graph.grouped_nodes(node, true) {
                    if !result.contains(&inner) {
                        result.push(inner);
                    }
                }
            }
        }
        result
    }

    pub fn selection_bounds(&self) -> Option<Rect> {
        self.selection
            .items()
            .iter()
            .filter_map(|&id| self.graph.object(id))
            .map(|o| o.as_object())
            .filter(|o| o.is_live())
            .map(|o| o.bounds())
            .reduce(|a, b| a.union(b))
    }

    /// Moves the camera so `target` (canvas space) is in view. `None` duration uses the configured one.
    pub fn navigate_to(&mut self, target: Rect, mode: ZoomMode, duration: Option<f32>, reason: NavigateReason) {
        let zoom_range = (self.config.min_zoom(), self.config.max_zoom());
        let to = navigation_target(&self.view, target, mode, self.config.navigate_margin, zoom_range);
        let duration = duration.unwrap_or(self.config.navigate_duration);
        self.animations.navigate(&mut self.view, to, duration, self.time, reason);
        self.navigation_reason = reason;
        self.make_dirty(SaveReason::NAVIGATION, None);
    }

    pub fn navigate_to_content(&mut self, duration: Option<f32>) -> bool {
        match self.graph.content_bounds() {
            Some(bounds) => {
                self.navigate_to(bounds, ZoomMode::WithMargin, duration, NavigateReason::Content);
                true
            }
            None => false,
        }
    }

    pub fn navigate_to_selection(&mut self, zoom_in: bool, duration: Option<f32>) -> bool {
        let Some(bounds) = self.selection_bounds() else { return false };
        let mode = if zoom_in { ZoomMode::WithMargin } else { ZoomMode::None };
        self.navigate_to(bounds, mode, duration, NavigateReason::Selection);
        true
    }

    /// Pans the view while the pointer hovers the viewport border.
    pub fn edge_scroll(&mut self) {
        let Some(pos) = self.pointer.pos() else { return };
        let viewport = self.view.viewport;
        let margin = self.config.edge_scroll_margin;
        if margin <= 0.0 || viewport.width() <= margin * 2.0 || viewport.height() <= margin * 2.0 {
            return;
        }
        let inner = viewport.shrink(margin);
        let depth = |value: f32, min: f32, max: f32| -> f32 {
            if value < min {
                ((min - value) / margin).min(1.0)
            } else if value > max {
                -((value - max) / margin).min(1.0)
            } else {
                0.0
            }
        };
        let direction = Vec2::new(depth(pos.x, inner.min.x, inner.max.x), depth(pos.y, inner.min.y, inner.max.y));
        if direction == Vec2::ZERO {
            return;
        }
        self.animations.stop_navigation();
        self.view.pan(direction * self.config.edge_scroll_speed * self.dt);
        self.navigation_reason = NavigateReason::Edge;
        self.make_dirty(SaveReason::NAVIGATION, None);
    }

    pub fn discard_link(&mut self, id: LinkId) -> bool {
        self.deselect_object(ObjectId::Link(id));
        self.animations.stop_flow(id);
        self.graph.remove_link(id)
    }

    /// Removes a link right away and queues a notice for the host.
    pub fn remove_link_now(&mut self, id: LinkId) -> bool {
        let Some(link) = self.graph.get_link(id) else { return false };
        let removed = RemovedLink { id, start: link.start_pin, end: link.end_pin };
        self.discard_link(id);
        self.tombstones.insert(id);
        if !self.removed_links.contains(&removed) {
            self.removed_links.push(removed);
        }
        true
    }

    // Node removal never leaves its pins behind
    pub fn remove_node_now(&mut self, id: NodeId, with_links: bool) -> Vec<LinkId> {
        let links = if with_links { self.graph.links_for_node(id) } else { Vec::new() };
        for &link in &links {
            self.remove_link_now(link);
        }
        self.deselect_object(ObjectId::Node(id));
        self.graph.remove_node(id, false);
        self.make_dirty(SaveReason::REMOVE_NODE, Some(id));
        links
    }
}
