use std::collections::BTreeMap;

use egui::{Pos2, Rect, Vec2};

use super::animation::{FlowDirection, NavigateReason, ZoomMode};
use super::control::Control;
use super::input::{InputState, MouseButton};
use super::state::{EditorState, SaveReason};
use crate::actions::create_item::Stage;
use crate::actions::{ActionKind, ActionSet};
use crate::graph_utils::graph::EditorGraph;
use crate::graph_utils::ids::{LinkId, NodeId, ObjectId, PinId};
use crate::graph_utils::objects::{DrawFlags, NodeKind, PinKind};
use crate::persistence::persist::{NodeState, NodesState, SelectionState, ViewState};
use crate::persistence::settings::EditorConfig;

pub use crate::actions::context_menu::MenuTarget;
pub use crate::actions::create_item::{CreateItem, ItemQuery};
pub use crate::actions::shortcut::Shortcut;

/// The editor as the host sees it. Each frame the host calls `begin`, declares nodes,
/// pins and links, answers whatever sessions are open, then calls `end`.
///
/// Pointer interaction is resolved in `end`, so sessions the host sees during a frame
/// were opened by the previous frame's `end`.
#[derive(Debug, Default)]
pub struct EditorContext {
    state: EditorState,
    actions: ActionSet,
    current_node: Option<NodeId>,
    current_pin: Option<PinId>,
    in_frame: bool,
    create_open: bool,
    delete_open: bool,
    shortcut_open: bool,
}

impl EditorContext {
    pub fn new(config: EditorConfig) -> Self {
        Self { state: EditorState::new(config), ..Default::default() }
    }

    pub fn state(&self) -> &EditorState { &self.state }
    pub fn graph(&self) -> &EditorGraph { &self.state.graph }
    pub fn config(&self) -> &EditorConfig { &self.state.config }
    pub fn control(&self) -> &Control { &self.state.control }

    pub fn set_config(&mut self, mut config: EditorConfig) {
        config.normalize();
        self.state.config = config;
    }

    pub fn current_action(&self) -> Option<ActionKind> { self.actions.current() }

    pub fn running_action_count(&self) -> usize { self.actions.running_count() }

    /// Action that answered Possible and waits for a verdict.
    pub fn provisional_action(&self) -> Option<ActionKind> { self.actions.provisional() }

    /// True while any interaction owns the pointer or a session is open.
    pub fn is_active(&self) -> bool { self.actions.current().is_some() }

    // ---- frame ----

    pub fn begin(&mut self, input: &InputState) {
        if self.in_frame {
            log::warn!("begin called twice without end");
        }
        let state = &mut self.state;
        state.frame += 1;
        state.dt = ((input.time - state.time) as f32).clamp(0.0, 0.25);
        state.time = input.time;
        state.view.viewport = input.viewport;
        state.pointer.update(input, state.config.drag_threshold);
        if state.animations.update(&mut state.view, state.time) {
            state.make_dirty(SaveReason::NAVIGATION, None);
        }
        state.graph.begin_frame();
        self.current_node = None;
        self.current_pin = None;
        self.in_frame = true;
    }

    pub fn end(&mut self) {
        if !self.in_frame {
            log::warn!("end called without begin");
        }
        if self.current_node.is_some() {
            log::warn!("node {:?} left open at end of frame", self.current_node);
            self.end_node(Vec2::ZERO);
        }
        for (open, name) in [(self.create_open, "create"), (self.delete_open, "delete"), (self.shortcut_open, "shortcut")] {
            if open {
                log::warn!("{name} session left open at end of frame");
            }
        }
        self.create_open = false;
        self.delete_open = false;
        self.shortcut_open = false;

        let state = &mut self.state;
        state.selection.mark_frame_boundary();
        let selection_id = state.selection.selection_id();

        state.graph.update_geometry(state.config.group_header_height);
        let centered: Vec<(NodeId, Rect)> = state
            .graph
            .nodes
            .iter_mut()
            .filter(|n| n.live && n.center_on_screen)
            .map(|n| {
                n.center_on_screen = false;
                (n.id, n.bounds)
            })
            .collect();
        for (_, bounds) in centered {
            state.navigate_to(bounds, ZoomMode::None, None, NavigateReason::Object);
        }

        state.control = state.resolver.resolve(&state.graph, &state.pointer, &state.view, &state.config);
        self.actions.step(state);

        let scrolling = matches!(
            self.actions.current(),
            Some(ActionKind::Drag | ActionKind::Select | ActionKind::Size | ActionKind::CreateItem)
        );
        if scrolling && self.actions.is_dragging() {
            state.edge_scroll();
        }

        let graph = &state.graph;
        let gone = state.selection.retain(|id| graph.is_live(id));
        for id in gone {
            state.graph.set_selected(id, false);
        }
        if state.selection.selection_id() != selection_id {
            state.make_dirty(SaveReason::SELECTION, None);
        }
        self.in_frame = false;
    }

    // ---- building ----

    pub fn begin_node(&mut self, id: NodeId) {
        if self.current_node.is_some() {
            log::warn!("begin_node({id:?}) inside another node");
            self.end_node(Vec2::ZERO);
        }
        if !id.is_valid() {
            log::warn!("begin_node with invalid id");
            return;
        }
        let (node, created) = self.state.graph.declare_node(id);
        node.kind = NodeKind::Plain;
        if node.restore_state {
            node.restore_state = false;
            if let Some(stored) = node.stored_state.clone() {
                node.apply_state(&stored);
            }
        }
        if created {
            self.state.make_dirty(SaveReason::ADD_NODE, Some(id));
        }
        self.current_node = Some(id);
    }

    /// Marks the current node as a group, `size` being its initial group size.
    pub fn group(&mut self, size: Vec2) {
        let Some(node) = self.current_node.and_then(|id| self.state.graph.get_node_mut(id)) else {
            log::warn!("group() outside of a node");
            return;
        };
        node.kind = NodeKind::Group;
        if node.group_size.is_none() {
            node.group_size = Some(size);
        }
    }

    pub fn begin_pin(&mut self, id: PinId, kind: PinKind) {
        let Some(node) = self.current_node else {
            log::warn!("begin_pin({id:?}) outside of a node");
            return;
        };
        if self.current_pin.is_some() {
            self.end_pin();
        }
        if !id.is_valid() {
            log::warn!("begin_pin with invalid id");
            return;
        }
        let pin = self.state.graph.declare_pin(id, node, kind);
        pin.local_pivot = None;
        self.current_pin = Some(id);
    }

    fn node_origin(&self) -> Pos2 {
        self.current_node.and_then(|id| self.state.graph.get_node(id)).map(|n| n.position).unwrap_or(Pos2::ZERO)
    }

    /// Pin area in canvas space.
    pub fn pin_rect(&mut self, rect: Rect) {
        let offset = self.node_origin().to_vec2();
        match self.current_pin.and_then(|id| self.state.graph.pins.get_mut(id)) {
            Some(pin) => pin.local_rect = rect.translate(-offset),
            None => log::warn!("pin_rect() outside of a pin"),
        }
    }

    /// Area links attach to, canvas space. Defaults to the pin rect.
    pub fn pin_pivot_rect(&mut self, rect: Rect) {
        let offset = self.node_origin().to_vec2();
        match self.current_pin.and_then(|id| self.state.graph.pins.get_mut(id)) {
            Some(pin) => pin.local_pivot = Some(rect.translate(-offset)),
            None => log::warn!("pin_pivot_rect() outside of a pin"),
        }
    }

    pub fn pin_style(&mut self, direction: Vec2, strength: f32, arrow_size: f32) {
        if let Some(pin) = self.current_pin.and_then(|id| self.state.graph.pins.get_mut(id)) {
            pin.direction = direction;
            pin.strength = strength;
            pin.arrow_size = arrow_size;
        }
    }

    pub fn end_pin(&mut self) {
        if self.current_pin.take().is_none() {
            log::warn!("end_pin() without begin_pin()");
        }
    }

    /// Closes the current node with the size its content took.
    pub fn end_node(&mut self, size: Vec2) {
        if self.current_pin.is_some() {
            log::warn!("pin {:?} left open in node", self.current_pin);
            self.current_pin = None;
        }
        let Some(id) = self.current_node.take() else {
            log::warn!("end_node() without begin_node()");
            return;
        };
        if let Some(node) = self.state.graph.get_node_mut(id) {
            node.size = size;
        }
    }

    /// Declares a link. Links the editor removed are ignored until the host has been told.
    pub fn link(&mut self, id: LinkId, start: PinId, end: PinId) -> bool {
        if !id.is_valid() || !start.is_valid() || !end.is_valid() || self.state.tombstones.contains(&id) {
            return false;
        }
        self.state.graph.declare_link(id, start, end);
        true
    }

    /// A fresh id in the editor's id space, for hosts that don't allocate their own.
    pub fn reserve_id(&mut self) -> u64 { self.state.graph.reserve_id() }

    // ---- creation ----

    pub fn begin_create(&mut self) -> bool {
        self.create_open = true;
        self.actions.create.in_progress()
    }

    pub fn query_new_link(&self) -> ItemQuery<(LinkId, PinId, PinId)> { self.actions.create.query_link() }

    pub fn query_new_node(&self) -> ItemQuery<(NodeId, PinId, Pos2)> { self.actions.create.query_node() }

    /// True carries the item that was just added to the graph.
    pub fn accept_new_item(&mut self) -> ItemQuery<CreateItem> { self.actions.create.accept_item(&mut self.state) }

    pub fn reject_new_item(&mut self) -> bool { self.actions.create.reject_item() }

    pub fn end_create(&mut self) {
        if !self.create_open {
            log::warn!("end_create() without begin_create()");
        }
        self.create_open = false;
    }

    pub fn create_stage(&self) -> Stage { self.actions.create.stage() }

    /// Everything committed since the last call, including links that committed themselves.
    pub fn take_created_items(&mut self) -> Vec<CreateItem> { self.actions.create.take_committed() }

    pub fn create_preview(&self) -> Option<(Pos2, Pos2)> { self.actions.create.preview(&self.state) }

    // ---- deletion ----

    pub fn begin_delete(&mut self) -> bool {
        self.delete_open = true;
        self.actions.delete.in_progress()
    }

    pub fn query_deleted_link(&mut self) -> Option<(LinkId, PinId, PinId)> {
        self.actions.delete.query_link(&mut self.state)
    }

    pub fn query_deleted_node(&mut self) -> Option<NodeId> { self.actions.delete.query_node(&mut self.state) }

    pub fn accept_deleted_item(&mut self, delete_dependencies: bool) -> bool {
        self.actions.delete.accept_item(&mut self.state, delete_dependencies)
    }

    pub fn reject_deleted_item(&mut self) -> bool { self.actions.delete.reject_item(&mut self.state) }

    pub fn end_delete(&mut self) {
        if !self.delete_open {
            log::warn!("end_delete() without begin_delete()");
        }
        self.delete_open = false;
    }

    /// Queues a node for the next delete session.
    pub fn delete_node(&mut self, id: NodeId) -> bool { self.request_deletion(ObjectId::Node(id)) }

    pub fn delete_link(&mut self, id: LinkId) -> bool { self.request_deletion(ObjectId::Link(id)) }

    fn request_deletion(&mut self, id: ObjectId) -> bool {
        if self.state.graph.object(id).is_none() {
            return false;
        }
        if !self.state.pending_deletions.contains(&id) {
            self.state.pending_deletions.push(id);
        }
        true
    }

    // ---- shortcuts ----

    pub fn enable_shortcuts(&mut self, enabled: bool) { self.state.shortcuts_enabled = enabled; }

    pub fn are_shortcuts_enabled(&self) -> bool { self.state.shortcuts_enabled }

    pub fn begin_shortcut(&mut self) -> bool {
        self.shortcut_open = true;
        self.actions.shortcut.shortcut().is_some()
    }

    pub fn accept_cut(&self) -> bool { self.actions.shortcut.is(Shortcut::Cut) }
    pub fn accept_copy(&self) -> bool { self.actions.shortcut.is(Shortcut::Copy) }
    pub fn accept_paste(&self) -> bool { self.actions.shortcut.is(Shortcut::Paste) }
    pub fn accept_duplicate(&self) -> bool { self.actions.shortcut.is(Shortcut::Duplicate) }
    pub fn accept_create_node(&self) -> bool { self.actions.shortcut.is(Shortcut::CreateNode) }

    pub fn shortcut_context_size(&self) -> usize { self.actions.shortcut.context().len() }
    pub fn shortcut_context_nodes(&self) -> Vec<NodeId> { self.actions.shortcut.context_nodes() }
    pub fn shortcut_context_links(&self) -> Vec<LinkId> { self.actions.shortcut.context_links() }

    pub fn end_shortcut(&mut self) {
        if !self.shortcut_open {
            log::warn!("end_shortcut() without begin_shortcut()");
        }
        self.shortcut_open = false;
    }

    // ---- context menus ----

    pub fn show_node_context_menu(&self) -> Option<NodeId> { self.actions.context_menu.node() }
    pub fn show_pin_context_menu(&self) -> Option<PinId> { self.actions.context_menu.pin() }
    pub fn show_link_context_menu(&self) -> Option<LinkId> { self.actions.context_menu.link() }
    pub fn show_background_context_menu(&self) -> bool { self.actions.context_menu.background() }

    // ---- pointer queries, valid for the current frame ----

    pub fn hovered_node(&self) -> Option<NodeId> { self.state.control.hot_node() }
    pub fn hovered_pin(&self) -> Option<PinId> { self.state.control.hot_pin() }
    pub fn hovered_link(&self) -> Option<LinkId> { self.state.control.hot_link() }
    pub fn double_clicked_node(&self) -> Option<NodeId> { self.state.control.double_clicked_node() }
    pub fn double_clicked_pin(&self) -> Option<PinId> { self.state.control.double_clicked_pin() }
    pub fn double_clicked_link(&self) -> Option<LinkId> { self.state.control.double_clicked_link() }
    pub fn background_clicked(&self) -> Option<MouseButton> { self.state.control.background_clicked }
    pub fn background_double_clicked(&self) -> Option<MouseButton> { self.state.control.background_double_clicked }

    pub fn zoom(&self) -> f32 { self.state.view.zoom }
    pub fn origin(&self) -> Vec2 { self.state.view.origin }
    pub fn visible_rect(&self) -> Rect { self.state.view.visible_rect() }
    pub fn screen_to_canvas(&self, point: Pos2) -> Pos2 { self.state.view.to_canvas(point) }
    pub fn canvas_to_screen(&self, point: Pos2) -> Pos2 { self.state.view.to_screen(point) }
    pub fn navigation_reason(&self) -> NavigateReason { self.state.navigation_reason }

    /// Live nodes, back to front.
    pub fn node_ids(&self) -> Vec<NodeId> { self.state.graph.live_node_ids() }

    pub fn node_count(&self) -> usize { self.node_ids().len() }

    // ---- nodes and groups ----

    /// Moves a node, creating it (not live) when the id is new.
    pub fn set_node_position(&mut self, id: NodeId, position: Pos2) {
        if !self.state.graph.insert_node(id, position)
            && let Some(node) = self.state.graph.get_node_mut(id)
            && node.position != position
        {
            node.position = position;
            self.state.make_dirty(SaveReason::POSITION, Some(id));
        }
    }

    pub fn node_position(&self, id: NodeId) -> Option<Pos2> { self.state.graph.get_node(id).map(|n| n.position) }

    pub fn node_size(&self, id: NodeId) -> Option<Vec2> { self.state.graph.get_node(id).map(|n| n.bounds.size()) }

    pub fn node_bounds(&self, id: NodeId) -> Option<Rect> { self.state.graph.get_node(id).map(|n| n.bounds) }

    pub fn set_node_z_position(&mut self, id: NodeId, z: f32) {
        if let Some(node) = self.state.graph.get_node_mut(id) {
            node.z = z;
        }
    }

    pub fn node_z_position(&self, id: NodeId) -> Option<f32> { self.state.graph.get_node(id).map(|n| n.z) }

    pub fn set_group_size(&mut self, id: NodeId, size: Vec2) {
        if let Some(node) = self.state.graph.get_node_mut(id) {
            node.group_size = Some(size);
            self.state.make_dirty(SaveReason::SIZE, Some(id));
        }
    }

    pub fn node_group(&self, id: NodeId) -> Option<NodeId> { self.state.graph.get_node(id).and_then(|n| n.group_id) }

    pub fn set_node_group(&mut self, id: NodeId, group: Option<NodeId>) {
        if let Some(node) = self.state.graph.get_node_mut(id) {
            node.group_id = group;
        }
    }

    pub fn grouped_nodes(&self, group: NodeId, recursive: bool) -> Vec<NodeId> {
        self.state.graph.grouped_nodes(group, recursive)
    }

    pub fn has_any_links_node(&self, id: NodeId) -> bool { self.state.graph.has_any_links_for_node(id) }
    pub fn has_any_links_pin(&self, id: PinId) -> bool { self.state.graph.has_any_links_for_pin(id) }

    // Whether the pin had a link last frame, for spotting links that just broke
    pub fn pin_had_any_links(&self, id: PinId) -> bool {
        self.state.graph.get_pin(id).is_some_and(|p| p.had_connection)
    }

    /// Removes every link on the node's pins. The host hears about them in the next delete session.
    pub fn break_links_node(&mut self, id: NodeId) -> usize {
        let links = self.state.graph.links_for_node(id);
        links.into_iter().filter(|&link| self.state.remove_link_now(link)).count()
    }

    pub fn break_links_pin(&mut self, id: PinId) -> usize {
        let links = self.state.graph.links_for_pin(id);
        links.into_iter().filter(|&link| self.state.remove_link_now(link)).count()
    }

    // ---- selection ----

    pub fn select_node(&mut self, id: NodeId, append: bool) { self.select(ObjectId::Node(id), append); }
    pub fn select_link(&mut self, id: LinkId, append: bool) { self.select(ObjectId::Link(id), append); }

    fn select(&mut self, id: ObjectId, append: bool) {
        if append {
            self.state.select_object(id);
        } else if self.state.graph.object(id).is_some() {
            self.state.set_selection(id);
        }
    }

    pub fn deselect_node(&mut self, id: NodeId) { self.state.deselect_object(ObjectId::Node(id)); }
    pub fn deselect_link(&mut self, id: LinkId) { self.state.deselect_object(ObjectId::Link(id)); }
    pub fn clear_selection(&mut self) { self.state.clear_selection(); }
    pub fn is_node_selected(&self, id: NodeId) -> bool { self.state.is_selected(ObjectId::Node(id)) }
    pub fn is_link_selected(&self, id: LinkId) -> bool { self.state.is_selected(ObjectId::Link(id)) }
    pub fn selected_nodes(&self) -> Vec<NodeId> { self.state.selection.nodes() }
    pub fn selected_links(&self) -> Vec<LinkId> { self.state.selection.links() }
    pub fn selected_object_count(&self) -> usize { self.state.selection.len() }

    /// Whether the selection differs, as a set, from the one at the last frame boundary.
    pub fn has_selection_changed(&self) -> bool { self.state.selection.has_changed() }

    /// Rectangle being dragged out by box selection, canvas space.
    pub fn selection_rect(&self) -> Option<Rect> { self.actions.select.selection_rect() }

    // ---- navigation ----

    pub fn navigate_to_content(&mut self, duration: Option<f32>) -> bool { self.state.navigate_to_content(duration) }

    pub fn navigate_to_selection(&mut self, zoom_in: bool, duration: Option<f32>) -> bool {
        self.state.navigate_to_selection(zoom_in, duration)
    }

    pub fn center_node_on_screen(&mut self, id: NodeId) -> bool {
        match self.state.graph.get_node_mut(id) {
            Some(node) => {
                node.center_on_screen = true;
                true
            }
            None => false,
        }
    }

    // ---- flow ----

    pub fn flow(&mut self, link: LinkId, direction: FlowDirection) -> bool {
        if self.state.graph.valid_link(link).is_none() {
            return false;
        }
        let duration = self.state.config.flow_duration;
        self.state.animations.flow(link, direction, duration, self.state.time);
        true
    }

    pub fn link_flow(&self, link: LinkId) -> Option<(FlowDirection, f32)> {
        self.state.animations.flow_progress(link, self.state.time)
    }

    // ---- drawing ----

    pub fn node_draw_flags(&self, id: NodeId) -> DrawFlags {
        let mut flags = DrawFlags::empty();
        flags.set(DrawFlags::HOVERED, self.state.control.hot_node() == Some(id));
        flags.set(DrawFlags::SELECTED, self.is_node_selected(id));
        flags.set(DrawFlags::HIGHLIGHTED, self.actions.drag.drop_group() == Some(id));
        flags
    }

    pub fn pin_draw_flags(&self, id: PinId) -> DrawFlags {
        let create = &self.actions.create;
        let mut flags = DrawFlags::empty();
        flags.set(DrawFlags::HOVERED, self.state.control.hot_pin() == Some(id));
        flags.set(DrawFlags::HIGHLIGHTED, create.anchor() == Some(id) || create.target_pin() == Some(id));
        flags
    }

    pub fn link_draw_flags(&self, id: LinkId) -> DrawFlags {
        let mut flags = DrawFlags::empty();
        flags.set(DrawFlags::HOVERED, self.state.control.hot_link() == Some(id));
        flags.set(DrawFlags::SELECTED, self.is_link_selected(id));
        if self.state.config.highlight_connected_links
            && let Some(link) = self.state.graph.get_link(id)
        {
            let touches_focus = [link.start_pin, link.end_pin].into_iter().any(|pin| {
                self.state.graph.get_pin(pin).is_some_and(|p| {
                    self.is_node_selected(p.node) || self.state.control.hot_node() == Some(p.node)
                })
            });
            flags.set(DrawFlags::HIGHLIGHTED, touches_focus);
        }
        flags
    }

    // ---- persistence ----

    pub fn take_save_reasons(&mut self) -> SaveReason { std::mem::take(&mut self.state.save_reasons) }

    pub fn take_dirty_nodes(&mut self) -> Vec<NodeId> {
        std::mem::take(&mut self.state.dirty_nodes).into_iter().collect()
    }

    pub fn node_state(&self, id: NodeId) -> Option<NodeState> { self.state.graph.get_node(id).map(|n| n.state()) }

    pub fn nodes_state(&self) -> NodesState {
        let nodes: BTreeMap<NodeId, NodeState> =
            self.state.graph.nodes.iter().filter(|n| n.live).map(|n| (n.id, n.state())).collect();
        NodesState { nodes }
    }

    /// Stores `state` for the node and re-applies it the next time the node is declared.
    pub fn apply_node_state(&mut self, id: NodeId, state: &NodeState) {
        let (position, _, _) = state.to_runtime();
        self.state.graph.insert_node(id, position);
        if let Some(node) = self.state.graph.get_node_mut(id) {
            node.stored_state = Some(state.clone());
            node.restore_state = true;
        }
    }

    pub fn apply_nodes_state(&mut self, state: &NodesState) {
        for (&id, node) in &state.nodes {
            self.apply_node_state(id, node);
        }
    }

    /// Re-applies the last stored state of the node when it is next declared.
    pub fn restore_node_state(&mut self, id: NodeId) -> bool {
        match self.state.graph.get_node_mut(id) {
            Some(node) if node.stored_state.is_some() => {
                node.restore_state = true;
                true
            }
            _ => false,
        }
    }

    pub fn selection_state(&self) -> SelectionState {
        SelectionState { objects: self.state.selection.items().to_vec() }
    }

    pub fn apply_selection_state(&mut self, selection: &SelectionState) {
        self.state.clear_selection();
        for &id in &selection.objects {
            self.state.select_object(id);
        }
    }

    pub fn view_state(&self) -> ViewState {
        let view = &self.state.view;
        ViewState::from_runtime(view.scroll(), view.zoom, view.visible_rect(), &self.state.config.theme)
    }

    pub fn apply_view_state(&mut self, view_state: &ViewState) {
        let (scroll, zoom) = view_state.to_runtime();
        let config = &self.state.config;
        self.state.animations.stop_navigation();
        self.state.view.zoom = zoom.clamp(config.min_zoom(), config.max_zoom());
        self.state.view.set_scroll(scroll);
        if !view_state.theme.is_empty() {
            self.state.config.theme = view_state.theme.clone();
        }
    }
}
