use egui::Pos2;

use super::input::{MouseButton, PointerTracker};
use super::view::CanvasView;
use crate::graph_utils::graph::EditorGraph;
use crate::graph_utils::ids::{LinkId, NodeId, ObjectId, PinId};
use crate::graph_utils::objects::{NodeRegion, Object};
use crate::persistence::settings::EditorConfig;

/// What the pointer is doing to which object this frame. Rebuilt once per frame
/// before any action runs; every action reads the same snapshot.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Control {
    pub hot: ObjectId,
    pub active: ObjectId,
    pub clicked: ObjectId,
    pub double_clicked: ObjectId,
    // Button behind `clicked` / `double_clicked`
    pub click_button: Option<MouseButton>,
    pub double_click_button: Option<MouseButton>,
    pub background_hot: bool,
    pub background_active: bool,
    pub background_clicked: Option<MouseButton>,
    pub background_double_clicked: Option<MouseButton>,
    // Node part under the pointer, for resize handles and group headers
    pub hot_region: NodeRegion,
    // Object (or background) under the pointer when a button went down, per button
    pub pressed: [Option<ObjectId>; 3],
    pub pressed_region: [NodeRegion; 3],
    // Pointer in canvas space
    pub pointer: Option<Pos2>,
}

impl Control {
    pub fn hot_node(&self) -> Option<NodeId> { self.hot.as_node() }
    pub fn hot_pin(&self) -> Option<PinId> { self.hot.as_pin() }
    pub fn hot_link(&self) -> Option<LinkId> { self.hot.as_link() }
    pub fn active_node(&self) -> Option<NodeId> { self.active.as_node() }
    pub fn active_pin(&self) -> Option<PinId> { self.active.as_pin() }
    pub fn active_link(&self) -> Option<LinkId> { self.active.as_link() }
    pub fn clicked_node(&self) -> Option<NodeId> { self.clicked.as_node() }
    pub fn clicked_pin(&self) -> Option<PinId> { self.clicked.as_pin() }
    pub fn clicked_link(&self) -> Option<LinkId> { self.clicked.as_link() }
    pub fn double_clicked_node(&self) -> Option<NodeId> { self.double_clicked.as_node() }
    pub fn double_clicked_pin(&self) -> Option<PinId> { self.double_clicked.as_pin() }
    pub fn double_clicked_link(&self) -> Option<LinkId> { self.double_clicked.as_link() }

    /// What was under the pointer when `button` went down. `Some(ObjectId::None)` is the background.
    pub fn pressed_object(&self, button: MouseButton) -> Option<ObjectId> { self.pressed[button.index()] }

    pub fn pressed_region(&self, button: MouseButton) -> NodeRegion { self.pressed_region[button.index()] }

    pub fn is_clicked_with(&self, button: MouseButton) -> bool { self.click_button == Some(button) }
}

/// Hit tests the pointer against the graph and tracks press ownership and capture
/// between frames.
#[derive(Clone, Debug, Default)]
pub struct ControlResolver {
    capture: ObjectId,
    pressed: [Option<ObjectId>; 3],
    pressed_region: [NodeRegion; 3],
    last: Control,
}

impl ControlResolver {
    /// Keeps `id` active regardless of where the pointer goes until released.
    pub fn capture(&mut self, id: ObjectId) { self.capture = id; }

    pub fn release_capture(&mut self) { self.capture = ObjectId::None; }

    pub fn captured(&self) -> ObjectId { self.capture }

    fn hit_test(graph: &EditorGraph, point: Pos2, zoom: f32, config: &EditorConfig) -> (ObjectId, NodeRegion) {
        let nodes = graph.nodes_in_z_order();
        let pin_margin = config.pin_hit_margin / zoom;
        // Pins of the topmost node first, then pins beat any node body
        for node in nodes.iter().rev() {
            for &pin_id in &node.pins {
                if let Some(pin) = graph.live_pin(pin_id)
                    && pin.test_hit_point(point, pin_margin)
                {
                    return (ObjectId::Pin(pin.id), NodeRegion::empty());
                }
            }
        }
        let edge = config.group_resize_edge / zoom;
        for node in nodes.iter().rev() {
            if node.test_hit_point(point, 0.0) {
                let region = node.region_at(point, edge, config.group_header_height);
                // A group's body is see-through, only its header and edges are grabbable
                if node.is_group() && region == NodeRegion::CENTER {
                    continue;
                }
                return (ObjectId::Node(node.id), region);
            }
        }
        let link_distance = config.link_hit_distance / zoom;
        for link in graph.links.iter() {
            if link.test_hit_point(point, link_distance) {
                return (ObjectId::Link(link.id), NodeRegion::empty());
            }
        }
        (ObjectId::None, NodeRegion::empty())
    }

    pub fn resolve(
        &mut self,
        graph: &EditorGraph,
        pointer: &PointerTracker,
        view: &CanvasView,
        config: &EditorConfig,
    ) -> Control {
        // A captured object that stopped existing releases the capture
        if self.capture.is_some() && !graph.is_live(self.capture) {
            self.capture = ObjectId::None;
        }

        let over_viewport = pointer.is_over_viewport();
        let canvas = pointer.pos().map(|p| view.to_canvas(p));
        let (hot, hot_region) = match canvas {
            Some(point) if over_viewport => Self::hit_test(graph, point, view.zoom, config),
            _ => (ObjectId::None, NodeRegion::empty()),
        };
        let background_hot = hot.is_none() && over_viewport;

        let mut control = Control {
            hot,
            hot_region,
            background_hot,
            pointer: canvas,
            ..Default::default()
        };

        for button in MouseButton::ALL {
            let index = button.index();
            if pointer.pressed(button) {
                self.pressed[index] = if hot.is_some() || background_hot { Some(hot) } else { None };
                self.pressed_region[index] = hot_region;
            }
            if pointer.clicked(button) && control.click_button.is_none() {
                if hot.is_some() {
                    control.clicked = hot;
                    control.click_button = Some(button);
                } else if background_hot {
                    control.background_clicked = Some(button);
                }
            }
            if pointer.double_clicked(button) && control.double_click_button.is_none() {
                if hot.is_some() {
                    control.double_clicked = hot;
                    control.double_click_button = Some(button);
                } else if background_hot {
                    control.background_double_clicked = Some(button);
                }
            }
            control.pressed[index] = self.pressed[index];
            control.pressed_region[index] = self.pressed_region[index];
            if !pointer.is_down(button) && !pointer.released(button) {
                self.pressed[index] = None;
                self.pressed_region[index] = NodeRegion::empty();
            }
        }

        // Active follows the capture, then whatever a held button went down on
        let held = MouseButton::ALL
            .into_iter()
            .find(|&b| pointer.is_down(b))
            .and_then(|b| self.pressed[b.index()]);
        if self.capture.is_some() {
            control.active = self.capture;
        } else if let Some(held) = held {
            control.active = held;
            control.background_active = held.is_none();
        } else {
            control.active = hot;
            control.background_active = background_hot;
        }

        if control != self.last {
            log::trace!(
                "control: hot {:?} active {:?} clicked {:?} background hot {} active {}",
                control.hot,
                control.active,
                control.clicked,
                control.background_hot,
                control.background_active
            );
            self.last = control.clone();
        }
        control
    }
}
