use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use eframe::egui::{self, Color32, Pos2, Rect, Sense, Stroke, Vec2};
use serde::{Deserialize, Serialize};

use node_loom::editor::animation::FlowDirection;
use node_loom::graph_utils::objects::{DrawFlags, PinKind};
use node_loom::persistence::persist::{NodesState, ViewState};
use node_loom::{
    CreateItem, EditorConfig, EditorContext, InputState, ItemQuery, LinkId, MenuTarget, MouseButton, NodeId, PinId,
};

const NODE_WIDTH: f32 = 150.0;
const HEADER_HEIGHT: f32 = 24.0;
const ROW_HEIGHT: f32 = 20.0;
const PIN_SIZE: f32 = 10.0;
const PASTE_OFFSET: Vec2 = Vec2::new(32.0, 32.0);

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DemoPin {
    pub id: PinId,
    pub label: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DemoNode {
    pub id: NodeId,
    pub title: String,
    pub position: (f32, f32),
    #[serde(default)]
    pub inputs: Vec<DemoPin>,
    #[serde(default)]
    pub outputs: Vec<DemoPin>,
    // Groups carry their size and no pins
    #[serde(default)]
    pub group: Option<(f32, f32)>,
    #[serde(default)]
    pub parent: Option<NodeId>,
}

impl DemoNode {
    fn size(&self) -> Vec2 {
        let rows = self.inputs.len().max(self.outputs.len()) as f32;
        egui::vec2(NODE_WIDTH, HEADER_HEIGHT + rows * ROW_HEIGHT + 6.0)
    }

    fn pins(&self) -> impl Iterator<Item = (&DemoPin, PinKind)> {
        self.inputs
            .iter()
            .map(|p| (p, PinKind::Input))
            .chain(self.outputs.iter().map(|p| (p, PinKind::Output)))
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DemoLink {
    pub id: LinkId,
    pub start: PinId,
    pub end: PinId,
}

/// What the demo host owns: the graph content. Geometry lives in the editor and is
/// copied back here before saving.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Document {
    pub nodes: Vec<DemoNode>,
    pub links: Vec<DemoLink>,
    #[serde(default)]
    pub layout: NodesState,
    #[serde(default)]
    pub view: Option<ViewState>,
}

fn pin(id: u64, label: &str) -> DemoPin {
    DemoPin { id: PinId(id), label: label.to_string() }
}

impl Document {
    pub fn sample() -> Self {
        let node = |id: u64, title: &str, x: f32, y: f32, inputs: Vec<DemoPin>, outputs: Vec<DemoPin>| DemoNode {
            id: NodeId(id),
            title: title.to_string(),
            position: (x, y),
            inputs,
            outputs,
            group: None,
            parent: None,
        };
        let mut nodes = vec![
            node(1, "Source", 80.0, 120.0, vec![], vec![pin(11, "value"), pin(12, "clock")]),
            node(2, "Filter", 360.0, 100.0, vec![pin(21, "in"), pin(22, "rate")], vec![pin(23, "out")]),
            node(3, "Mixer", 360.0, 260.0, vec![pin(31, "a"), pin(32, "b")], vec![pin(33, "mix")]),
            node(4, "Output", 640.0, 180.0, vec![pin(41, "signal")], vec![]),
        ];
        nodes.push(DemoNode {
            id: NodeId(5),
            title: "Processing".to_string(),
            position: (320.0, 60.0),
            inputs: vec![],
            outputs: vec![],
            group: Some((240.0, 300.0)),
            parent: None,
        });
        let links = vec![
            DemoLink { id: LinkId(101), start: PinId(11), end: PinId(21) },
            DemoLink { id: LinkId(102), start: PinId(12), end: PinId(32) },
            DemoLink { id: LinkId(103), start: PinId(23), end: PinId(41) },
        ];
        Self { nodes, links, ..Default::default() }
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text)?;
        Ok(())
    }

    fn pin_kind(&self, id: PinId) -> Option<(NodeId, PinKind)> {
        self.nodes
            .iter()
            .find_map(|n| n.pins().find(|(p, _)| p.id == id).map(|(_, kind)| (n.id, kind)))
    }

    fn pin_label(&self, id: PinId) -> Option<&str> {
        self.nodes.iter().find_map(|n| n.pins().find(|(p, _)| p.id == id).map(|(p, _)| p.label.as_str()))
    }

    // Output to input, across two nodes, at most once
    fn orient(&self, a: PinId, b: PinId) -> Option<(PinId, PinId)> {
        let (node_a, kind_a) = self.pin_kind(a)?;
        let (node_b, kind_b) = self.pin_kind(b)?;
        if node_a == node_b || kind_a == kind_b {
            return None;
        }
        let (start, end) = if kind_a == PinKind::Output { (a, b) } else { (b, a) };
        if self.links.iter().any(|l| l.start == start && l.end == end) {
            return None;
        }
        Some((start, end))
    }

    fn remove_node(&mut self, id: NodeId) {
        let Some(index) = self.nodes.iter().position(|n| n.id == id) else { return };
        let node = self.nodes.remove(index);
        let pins: Vec<PinId> = node.pins().map(|(p, _)| p.id).collect();
        self.links.retain(|l| !pins.contains(&l.start) && !pins.contains(&l.end));
    }
}

#[derive(Clone, Copy, Debug)]
struct MenuState {
    target: MenuTarget,
    pos: Pos2,
    canvas: Pos2,
}

pub struct NodeLoomApp {
    editor: EditorContext,
    doc: Document,
    document_path: PathBuf,
    clipboard: (Vec<DemoNode>, Vec<DemoLink>),
    menu: Option<MenuState>,
    menu_rect: Option<Rect>,
    dirty: bool,
    last_change: Instant,
    save_error: Option<String>,
    flows_running: bool,
}

impl NodeLoomApp {
    pub fn new(config: EditorConfig, doc: Document, document_path: PathBuf) -> Self {
        let mut editor = EditorContext::new(config);
        editor.apply_nodes_state(&doc.layout);
        for node in &doc.nodes {
            if editor.node_position(node.id).is_none() {
                editor.set_node_position(node.id, egui::pos2(node.position.0, node.position.1));
            }
            editor.set_node_group(node.id, node.parent);
        }
        if let Some(view) = &doc.view {
            editor.apply_view_state(view);
        }
        let _ = editor.take_save_reasons();
        Self {
            editor,
            doc,
            document_path,
            clipboard: (Vec::new(), Vec::new()),
            menu: None,
            menu_rect: None,
            dirty: false,
            last_change: Instant::now(),
            save_error: None,
            flows_running: false,
        }
    }

    fn mark_dirty(&mut self) {
        self.dirty = true;
        self.last_change = Instant::now();
    }

    fn sync_document(&mut self) {
        for node in &mut self.doc.nodes {
            if let Some(p) = self.editor.node_position(node.id) {
                node.position = (p.x, p.y);
            }
            node.parent = self.editor.node_group(node.id);
            if node.group.is_some()
                && let Some(state) = self.editor.node_state(node.id)
            {
                node.group = Some(state.group_size);
            }
        }
        self.doc.layout = self.editor.nodes_state();
        self.doc.view = Some(self.editor.view_state());
    }

    fn save_now(&mut self) {
        self.sync_document();
        match self.doc.save(&self.document_path) {
            Ok(()) => {
                self.dirty = false;
                self.save_error = None;
                log::info!("saved document to {}", self.document_path.display());
            }
            Err(e) => {
                log::warn!("save failed: {e}");
                self.save_error = Some(format!("Save failed: {}", e));
            }
        }
    }

    fn collect_input(ctx: &egui::Context, viewport: Rect) -> InputState {
        let typing = ctx.wants_keyboard_input();
        ctx.input(|i| {
            let keys_pressed = i
                .events
                .iter()
                .filter_map(|e| match e {
                    egui::Event::Key { key, pressed: true, repeat: false, .. } => Some(*key),
                    // Clipboard shortcuts arrive as their own events on most platforms
                    egui::Event::Copy => Some(egui::Key::C),
                    egui::Event::Cut => Some(egui::Key::X),
                    egui::Event::Paste(_) => Some(egui::Key::V),
                    _ => None,
                })
                .collect();
            let mut input = InputState {
                viewport,
                pointer_pos: i.pointer.latest_pos(),
                scroll_delta: i.raw_scroll_delta.y,
                modifiers: i.modifiers,
                keys_pressed,
                time: i.time,
                has_focus: !typing && i.viewport().focused.unwrap_or(true),
                ..Default::default()
            };
            for button in [egui::PointerButton::Primary, egui::PointerButton::Secondary, egui::PointerButton::Middle] {
                if let Ok(b) = MouseButton::try_from(button) {
                    input.set_down(b, i.pointer.button_down(button));
                    input.double_clicked[b.index()] = i.pointer.button_double_clicked(button);
                }
            }
            input
        })
    }

    fn run_frame(&mut self, input: &InputState) {
        self.editor.begin(input);
        self.declare();
        self.handle_creation();
        self.handle_deletion();
        self.handle_shortcuts(input);
        self.handle_context_menu(input);
        self.editor.end();

        for item in self.editor.take_created_items() {
            self.adopt_created(item);
        }
        if let Some(id) = self.editor.double_clicked_node() {
            self.editor.center_node_on_screen(id);
        } else if self.editor.background_double_clicked() == Some(MouseButton::Primary) {
            self.editor.navigate_to_content(None);
        }
        let reasons = self.editor.take_save_reasons();
        if !reasons.is_empty() {
            log::trace!("editor changes: {reasons:?} on {:?}", self.editor.take_dirty_nodes());
            self.mark_dirty();
        }
    }

    fn declare(&mut self) {
        let editor = &mut self.editor;
        for node in &self.doc.nodes {
            if editor.node_position(node.id).is_none() {
                editor.set_node_position(node.id, egui::pos2(node.position.0, node.position.1));
            }
            editor.begin_node(node.id);
            if let Some((w, h)) = node.group {
                editor.group(egui::vec2(w, h));
                editor.end_node(egui::vec2(NODE_WIDTH, HEADER_HEIGHT));
                continue;
            }
            let origin = editor.node_position(node.id).unwrap_or(Pos2::ZERO);
            for kind in [PinKind::Input, PinKind::Output] {
                let pins = if kind == PinKind::Input { &node.inputs } else { &node.outputs };
                for (row, pin) in pins.iter().enumerate() {
                    editor.begin_pin(pin.id, kind);
                    editor.pin_rect(pin_rect(origin, row, kind));
                    editor.end_pin();
                }
            }
            editor.end_node(node.size());
        }
        for link in &self.doc.links {
            editor.link(link.id, link.start, link.end);
        }
    }

    fn handle_creation(&mut self) {
        if self.editor.begin_create() {
            if let ItemQuery::True((_, start, end)) = self.editor.query_new_link() {
                if self.doc.orient(start, end).is_some() {
                    let _ = self.editor.accept_new_item();
                } else {
                    self.editor.reject_new_item();
                }
            }
            if let ItemQuery::True((_, pin, _)) = self.editor.query_new_node()
                && self.doc.pin_kind(pin).is_some()
            {
                let _ = self.editor.accept_new_item();
            }
        }
        self.editor.end_create();
    }

    fn adopt_created(&mut self, item: CreateItem) {
        match item {
            CreateItem::Link { id, start, end } => {
                let Some((start, end)) = self.doc.orient(start, end) else {
                    log::warn!("editor created link {id:?} the document can't hold");
                    return;
                };
                log::info!("new link {id:?}: {start:?} -> {end:?}");
                self.doc.links.push(DemoLink { id, start, end });
            }
            CreateItem::Node { id, pin, position } => {
                let node = self.fresh_node(id, "Node", position);
                let target = match self.doc.pin_kind(pin) {
                    Some((_, PinKind::Output)) => node.inputs.first().map(|p| (pin, p.id)),
                    Some((_, PinKind::Input)) => node.outputs.first().map(|p| (p.id, pin)),
                    None => None,
                };
                log::info!("new node {id:?} at {position:?}");
                self.doc.nodes.push(node);
                if let Some((start, end)) = target {
                    let link = LinkId(self.editor.reserve_id());
                    self.doc.links.push(DemoLink { id: link, start, end });
                }
            }
        }
        self.mark_dirty();
    }

    fn fresh_node(&mut self, id: NodeId, title: &str, position: Pos2) -> DemoNode {
        let input = pin(self.editor.reserve_id(), "in");
        let output = pin(self.editor.reserve_id(), "out");
        self.editor.set_node_position(id, position);
        DemoNode {
            id,
            title: title.to_string(),
            position: (position.x, position.y),
            inputs: vec![input],
            outputs: vec![output],
            group: None,
            parent: None,
        }
    }

    fn handle_deletion(&mut self) {
        if self.editor.begin_delete() {
            while let Some(id) = self.editor.query_deleted_node() {
                if self.editor.accept_deleted_item(true) {
                    log::info!("deleted node {id:?}");
                    self.doc.remove_node(id);
                }
            }
            // Links attached to deleted nodes come through here as well
            while let Some((id, _, _)) = self.editor.query_deleted_link() {
                if self.editor.accept_deleted_item(true) {
                    self.doc.links.retain(|l| l.id != id);
                }
            }
            self.mark_dirty();
        }
        self.editor.end_delete();
    }

    fn handle_shortcuts(&mut self, input: &InputState) {
        if self.editor.begin_shortcut() {
            let context = self.editor.shortcut_context_nodes();
            if self.editor.accept_copy() || self.editor.accept_cut() {
                self.clipboard = self.copy_nodes(&context);
                if self.editor.accept_cut() {
                    for id in context {
                        self.editor.delete_node(id);
                    }
                }
            } else if self.editor.accept_paste() {
                let (nodes, links) = self.clipboard.clone();
                self.paste_nodes(nodes, links);
            } else if self.editor.accept_duplicate() {
                let (nodes, links) = self.copy_nodes(&context);
                self.paste_nodes(nodes, links);
            } else if self.editor.accept_create_node()
                && let Some(pos) = input.pointer_pos
            {
                let id = NodeId(self.editor.reserve_id());
                let canvas = self.editor.screen_to_canvas(pos);
                let node = self.fresh_node(id, "Node", canvas);
                self.doc.nodes.push(node);
                self.mark_dirty();
            }
        }
        self.editor.end_shortcut();
    }

    fn copy_nodes(&self, ids: &[NodeId]) -> (Vec<DemoNode>, Vec<DemoLink>) {
        let nodes: Vec<DemoNode> = self
            .doc
            .nodes
            .iter()
            .filter(|n| ids.contains(&n.id) && n.group.is_none())
            .map(|n| {
                let mut copy = n.clone();
                if let Some(p) = self.editor.node_position(n.id) {
                    copy.position = (p.x, p.y);
                }
                copy
            })
            .collect();
        let pins: Vec<PinId> = nodes.iter().flat_map(|n| n.pins().map(|(p, _)| p.id)).collect();
        let links = self
            .doc
            .links
            .iter()
            .filter(|l| pins.contains(&l.start) && pins.contains(&l.end))
            .cloned()
            .collect();
        (nodes, links)
    }

    fn paste_nodes(&mut self, nodes: Vec<DemoNode>, links: Vec<DemoLink>) {
        if nodes.is_empty() {
            return;
        }
        let mut pin_map: HashMap<PinId, PinId> = HashMap::new();
        let mut pasted = Vec::with_capacity(nodes.len());
        for mut node in nodes {
            node.id = NodeId(self.editor.reserve_id());
            node.parent = None;
            for p in node.inputs.iter_mut().chain(node.outputs.iter_mut()) {
                let fresh = PinId(self.editor.reserve_id());
                pin_map.insert(p.id, fresh);
                p.id = fresh;
            }
            let position = egui::pos2(node.position.0, node.position.1) + PASTE_OFFSET;
            node.position = (position.x, position.y);
            self.editor.set_node_position(node.id, position);
            pasted.push(node.id);
            self.doc.nodes.push(node);
        }
        for link in links {
            if let (Some(&start), Some(&end)) = (pin_map.get(&link.start), pin_map.get(&link.end)) {
                let id = LinkId(self.editor.reserve_id());
                self.doc.links.push(DemoLink { id, start, end });
            }
        }
        self.editor.clear_selection();
        for id in pasted {
            self.editor.select_node(id, true);
        }
        self.mark_dirty();
    }

    fn handle_context_menu(&mut self, input: &InputState) {
        let target = if let Some(id) = self.editor.show_node_context_menu() {
            Some(MenuTarget::Node(id))
        } else if let Some(id) = self.editor.show_pin_context_menu() {
            Some(MenuTarget::Pin(id))
        } else if let Some(id) = self.editor.show_link_context_menu() {
            Some(MenuTarget::Link(id))
        } else if self.editor.show_background_context_menu() {
            Some(MenuTarget::Background)
        } else {
            None
        };
        if let (Some(target), Some(pos)) = (target, input.pointer_pos)
            && self.menu.map(|m| m.target) != Some(target)
        {
            self.menu = Some(MenuState { target, pos, canvas: self.editor.screen_to_canvas(pos) });
        }
    }

    fn context_menu(&mut self, ctx: &egui::Context) {
        let Some(menu) = self.menu else {
            self.menu_rect = None;
            return;
        };
        let mut close = false;
        let area = egui::Area::new(egui::Id::new("editor_context_menu"))
            .fixed_pos(menu.pos)
            .order(egui::Order::Foreground)
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| match menu.target {
                    MenuTarget::Background => {
                        if ui.button("Add node").clicked() {
                            let id = NodeId(self.editor.reserve_id());
                            let node = self.fresh_node(id, "Node", menu.canvas);
                            self.doc.nodes.push(node);
                            self.mark_dirty();
                            close = true;
                        }
                        if ui.button("Zoom to content").clicked() {
                            self.editor.navigate_to_content(None);
                            close = true;
                        }
                    }
                    MenuTarget::Node(id) => {
                        if ui.button("Delete").clicked() {
                            self.editor.delete_node(id);
                            close = true;
                        }
                        if ui.button("Break links").clicked() {
                            let n = self.editor.break_links_node(id);
                            log::info!("broke {n} links on {id:?}");
                            close = true;
                        }
                        if ui.button("Center").clicked() {
                            self.editor.center_node_on_screen(id);
                            close = true;
                        }
                    }
                    MenuTarget::Pin(id) => {
                        if ui.button("Break links").clicked() {
                            self.editor.break_links_pin(id);
                            close = true;
                        }
                    }
                    MenuTarget::Link(id) => {
                        if ui.button("Delete").clicked() {
                            self.editor.delete_link(id);
                            close = true;
                        }
                        if ui.button("Flow").clicked() {
                            self.editor.flow(id, FlowDirection::Forward);
                            close = true;
                        }
                    }
                });
            });
        let rect = area.response.rect;
        let pressed_outside = ctx.input(|i| {
            i.pointer.any_pressed() && i.pointer.interact_pos().is_some_and(|p| !rect.contains(p))
        });
        if close || pressed_outside {
            self.menu = None;
            self.menu_rect = None;
        } else {
            self.menu_rect = Some(rect);
        }
    }

    fn top_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui.button("Zoom to content").clicked() {
                    self.editor.navigate_to_content(None);
                }
                if ui.button("Zoom to selection").clicked() {
                    self.editor.navigate_to_selection(true, None);
                }
                if ui.button("Flow selected").clicked() {
                    for link in self.editor.selected_links() {
                        self.editor.flow(link, FlowDirection::Forward);
                    }
                }
                if ui.button("Save").clicked() {
                    self.save_now();
                }
                ui.separator();
                let action = self.editor.current_action().map(|a| format!("{a:?}")).unwrap_or_else(|| "idle".into());
                ui.label(format!(
                    "{} | zoom {:.0}% | {} nodes | {} selected",
                    action,
                    self.editor.zoom() * 100.0,
                    self.editor.node_count(),
                    self.editor.selected_object_count()
                ));
                if let Some(err) = &self.save_error {
                    ui.colored_label(Color32::LIGHT_RED, err);
                }
            });
        });
    }

    fn paint(&mut self, painter: &egui::Painter, available: Rect) {
        painter.rect_filled(available, 0.0, Color32::from_rgb(24, 24, 28));
        let editor = &self.editor;
        let zoom = editor.zoom();
        let to_screen = |p: Pos2| editor.canvas_to_screen(p);
        let screen_rect = |r: Rect| Rect::from_min_max(to_screen(r.min), to_screen(r.max));
        let titles: HashMap<NodeId, &str> = self.doc.nodes.iter().map(|n| (n.id, n.title.as_str())).collect();
        let font = egui::FontId::proportional((13.0 * zoom).clamp(6.0, 26.0));
        let graph = editor.graph();
        let nodes = graph.nodes_in_z_order();

        for node in nodes.iter().filter(|n| n.is_group()) {
            let flags = editor.node_draw_flags(node.id);
            let rect = screen_rect(node.bounds);
            let fill = if flags.contains(DrawFlags::HIGHLIGHTED) {
                Color32::from_rgba_premultiplied(50, 80, 60, 140)
            } else {
                Color32::from_rgba_premultiplied(40, 40, 52, 120)
            };
            painter.rect_filled(rect, 6.0 * zoom, fill);
            let header = Rect::from_min_max(rect.min, egui::pos2(rect.max.x, (rect.min.y + HEADER_HEIGHT * zoom).min(rect.max.y)));
            painter.rect_filled(header, 6.0 * zoom, Color32::from_rgb(70, 70, 96));
            painter.rect_stroke(rect, 6.0 * zoom, node_stroke(flags), egui::StrokeKind::Inside);
            let title = titles.get(&node.id).copied().unwrap_or("Group");
            painter.text(header.left_center() + Vec2::new(8.0 * zoom, 0.0), egui::Align2::LEFT_CENTER, title, font.clone(), Color32::WHITE);
        }

        let mut flows = false;
        for link in graph.links.iter().filter(|l| l.is_valid()) {
            let flags = editor.link_draw_flags(link.id);
            let color = if flags.contains(DrawFlags::SELECTED) {
                Color32::from_rgb(255, 190, 80)
            } else if flags.intersects(DrawFlags::HOVERED | DrawFlags::HIGHLIGHTED) {
                Color32::from_rgb(170, 200, 255)
            } else {
                Color32::from_rgb(130, 130, 150)
            };
            let width = if flags.is_empty() { 2.0 } else { 3.0 };
            let points: Vec<Pos2> = link.curve.flatten().into_iter().map(to_screen).collect();
            painter.add(egui::Shape::line(points, Stroke { width, color }));
            if let Some((direction, progress)) = editor.link_flow(link.id) {
                flows = true;
                let t = match direction {
                    FlowDirection::Forward => progress,
                    FlowDirection::Backward => 1.0 - progress,
                };
                painter.circle_filled(to_screen(link.curve.point_at(t)), 4.0, Color32::from_rgb(255, 210, 90));
            }
        }

        for node in nodes.iter().filter(|n| !n.is_group()) {
            let flags = editor.node_draw_flags(node.id);
            let rect = screen_rect(node.bounds);
            painter.rect_filled(rect, 5.0 * zoom, Color32::from_rgb(48, 50, 60));
            let header = Rect::from_min_size(rect.min, egui::vec2(rect.width(), HEADER_HEIGHT * zoom));
            painter.rect_filled(header, 5.0 * zoom, Color32::from_rgb(62, 90, 130));
            painter.rect_stroke(rect, 5.0 * zoom, node_stroke(flags), egui::StrokeKind::Inside);
            let title = titles.get(&node.id).copied().unwrap_or("Node");
            painter.text(header.left_center() + Vec2::new(8.0 * zoom, 0.0), egui::Align2::LEFT_CENTER, title, font.clone(), Color32::WHITE);
            for pin in node.pins.iter().filter_map(|&id| graph.get_pin(id)) {
                let pin_flags = editor.pin_draw_flags(pin.id);
                let center = to_screen(pin.bounds.center());
                let color = if pin_flags.contains(DrawFlags::HIGHLIGHTED) {
                    Color32::from_rgb(255, 210, 90)
                } else if pin_flags.contains(DrawFlags::HOVERED) || pin.has_connection {
                    Color32::from_rgb(170, 200, 255)
                } else {
                    Color32::from_gray(110)
                };
                painter.circle_filled(center, PIN_SIZE * 0.5 * zoom, color);
                if let Some(label) = self.doc.pin_label(pin.id) {
                    let (offset, align) = match pin.kind {
                        PinKind::Input => (Vec2::new(10.0 * zoom, 0.0), egui::Align2::LEFT_CENTER),
                        PinKind::Output => (Vec2::new(-10.0 * zoom, 0.0), egui::Align2::RIGHT_CENTER),
                    };
                    painter.text(center + offset, align, label, font.clone(), Color32::from_gray(200));
                }
            }
        }

        if let Some((from, to)) = editor.create_preview() {
            let stroke = Stroke { width: 2.0, color: Color32::from_rgb(255, 210, 90) };
            painter.extend(egui::Shape::dashed_line(&[to_screen(from), to_screen(to)], stroke, 6.0, 4.0));
        }
        if let Some(rect) = editor.selection_rect() {
            let rect = screen_rect(rect);
            painter.rect_filled(rect, 0.0, Color32::from_rgba_premultiplied(60, 90, 140, 50));
            painter.rect_stroke(rect, 0.0, Stroke { width: 1.0, color: Color32::from_rgb(120, 160, 230) }, egui::StrokeKind::Inside);
        }
        self.flows_running = flows;
    }
}

fn node_stroke(flags: DrawFlags) -> Stroke {
    if flags.contains(DrawFlags::SELECTED) {
        Stroke { width: 2.0, color: Color32::from_rgb(255, 190, 80) }
    } else if flags.intersects(DrawFlags::HOVERED | DrawFlags::HIGHLIGHTED) {
        Stroke { width: 1.5, color: Color32::from_rgb(170, 200, 255) }
    } else {
        Stroke { width: 1.0, color: Color32::from_gray(80) }
    }
}

fn pin_rect(origin: Pos2, row: usize, kind: PinKind) -> Rect {
    let y = origin.y + HEADER_HEIGHT + row as f32 * ROW_HEIGHT + ROW_HEIGHT * 0.5;
    let x = match kind {
        PinKind::Input => origin.x,
        PinKind::Output => origin.x + NODE_WIDTH,
    };
    Rect::from_center_size(egui::pos2(x, y), egui::vec2(PIN_SIZE, PIN_SIZE))
}

impl eframe::App for NodeLoomApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.top_bar(ctx);

        egui::CentralPanel::default().show(ctx, |ui| {
            let available = ui.available_rect_before_wrap();
            ui.allocate_rect(available, Sense::click_and_drag());
            let mut input = Self::collect_input(ctx, available);
            // The popup owns the pointer while it is over it
            if let (Some(rect), Some(pos)) = (self.menu_rect, input.pointer_pos)
                && rect.contains(pos)
            {
                input.pointer_pos = None;
            }
            self.run_frame(&input);
            let painter = ui.painter_at(available);
            self.paint(&painter, available);
        });

        self.context_menu(ctx);

        if self.dirty && self.last_change.elapsed() >= Duration::from_secs(2) {
            self.save_now();
        }
        if self.editor.is_active() || self.editor.state().animations.is_navigating() || self.flows_running {
            ctx.request_repaint_after(Duration::from_millis(16));
        }
    }
}
