use bitflags::bitflags;
use egui::{Pos2, Rect, Vec2};
use serde::{Deserialize, Serialize};

use super::geometry::{contains_rect, overlaps, CubicBezier};
use super::ids::{LinkId, NodeId, ObjectId, PinId};
use crate::persistence::persist::NodeState;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NodeKind {
    #[default]
    Plain,
    Group,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PinKind {
    Input,
    Output,
}

impl PinKind {
    // Links leave outputs to the right and enter inputs from the left
    pub fn default_direction(self) -> Vec2 {
        match self {
            PinKind::Input => Vec2::new(-1.0, 0.0),
            PinKind::Output => Vec2::new(1.0, 0.0),
        }
    }
}

bitflags! {
    /// Part of a node under a point; edges combine into corners.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct NodeRegion: u8 {
        const TOP = 1 << 0;
        const BOTTOM = 1 << 1;
        const LEFT = 1 << 2;
        const RIGHT = 1 << 3;
        const CENTER = 1 << 4;
        const HEADER = 1 << 5;
        const TOP_LEFT = Self::TOP.bits() | Self::LEFT.bits();
        const TOP_RIGHT = Self::TOP.bits() | Self::RIGHT.bits();
        const BOTTOM_LEFT = Self::BOTTOM.bits() | Self::LEFT.bits();
        const BOTTOM_RIGHT = Self::BOTTOM.bits() | Self::RIGHT.bits();
    }
}

impl NodeRegion {
    pub fn is_resize_handle(self) -> bool {
        self.intersects(NodeRegion::TOP | NodeRegion::BOTTOM | NodeRegion::LEFT | NodeRegion::RIGHT)
    }
}

bitflags! {
    /// What the renderer should emphasize for an object this frame.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct DrawFlags: u8 {
        const HOVERED = 1 << 0;
        const SELECTED = 1 << 1;
        const HIGHLIGHTED = 1 << 2;
    }
}

/// Capabilities shared by nodes, pins and links.
pub trait Object {
    fn object_id(&self) -> ObjectId;
    fn bounds(&self) -> Rect;
    fn is_live(&self) -> bool;
    fn is_selected(&self) -> bool;
    fn set_selected(&mut self, selected: bool);

    fn is_selectable(&self) -> bool { true }

    fn is_visible(&self, viewport: Rect) -> bool {
        self.is_live() && overlaps(self.bounds(), viewport)
    }

    fn test_hit_point(&self, point: Pos2, extra_thickness: f32) -> bool {
        self.is_live() && self.bounds().expand(extra_thickness).contains(point)
    }

    fn test_hit_rect(&self, rect: Rect, allow_intersect: bool) -> bool {
        if !self.is_live() {
            return false;
        }
        if allow_intersect { overlaps(rect, self.bounds()) } else { contains_rect(rect, self.bounds()) }
    }

    fn accept_drag(&mut self) -> bool { false }
    fn update_drag(&mut self, _offset: Vec2) {}
    fn end_drag(&mut self) -> bool { false }
    fn drag_start_location(&self) -> Pos2 { self.bounds().min }
}

#[derive(Clone, Debug)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    pub position: Pos2,
    pub size: Vec2,
    pub group_size: Option<Vec2>,
    pub bounds: Rect,
    pub group_bounds: Rect,
    pub z: f32,
    pub group_id: Option<NodeId>,
    pub pins: Vec<PinId>,
    pub live: bool,
    pub selected: bool,
    pub center_on_screen: bool,
    pub restore_state: bool,
    pub stored_state: Option<NodeState>,
    pub(crate) drag_start: Option<Pos2>,
}

impl Node {
    pub fn new(id: NodeId) -> Self {
        Self {
            id,
            kind: NodeKind::Plain,
            position: Pos2::ZERO,
            size: Vec2::ZERO,
            group_size: None,
            bounds: Rect::from_min_size(Pos2::ZERO, Vec2::ZERO),
            group_bounds: Rect::from_min_size(Pos2::ZERO, Vec2::ZERO),
            z: 0.0,
            group_id: None,
            pins: Vec::new(),
            live: false,
            selected: false,
            center_on_screen: false,
            restore_state: false,
            stored_state: None,
            drag_start: None,
        }
    }

    pub fn is_group(&self) -> bool { self.kind == NodeKind::Group }

    pub fn is_dragging(&self) -> bool { self.drag_start.is_some() }

    // Groups take their size from the resizable group size, plain nodes from their content
    pub fn update_bounds(&mut self, header_height: f32) {
        let size = match (self.kind, self.group_size) {
            (NodeKind::Group, Some(group)) => group.max(self.size),
            _ => self.size,
        };
        self.bounds = Rect::from_min_size(self.position, size);
        self.group_bounds = if self.is_group() {
            let header = header_height.min(self.bounds.height());
            Rect::from_min_max(Pos2::new(self.bounds.min.x, self.bounds.min.y + header), self.bounds.max)
        } else {
            self.bounds
        };
    }

    pub fn region_at(&self, point: Pos2, edge: f32, header_height: f32) -> NodeRegion {
        if !self.bounds.contains(point) {
            return NodeRegion::empty();
        }
        if !self.is_group() {
            return NodeRegion::CENTER;
        }
        let mut region = NodeRegion::empty();
        if point.x - self.bounds.min.x < edge { region |= NodeRegion::LEFT; }
        if self.bounds.max.x - point.x < edge { region |= NodeRegion::RIGHT; }
        if point.y - self.bounds.min.y < edge { region |= NodeRegion::TOP; }
        if self.bounds.max.y - point.y < edge { region |= NodeRegion::BOTTOM; }
        if region.is_empty() {
            region = if point.y < self.bounds.min.y + header_height { NodeRegion::HEADER } else { NodeRegion::CENTER };
        }
        region
    }

    pub fn state(&self) -> NodeState {
        NodeState::from_runtime(self.position, self.size, self.group_size.unwrap_or(Vec2::ZERO))
    }

    pub fn apply_state(&mut self, state: &NodeState) {
        let (position, size, group_size) = state.to_runtime();
        self.position = position;
        self.size = size;
        if self.is_group() || group_size != Vec2::ZERO {
            self.group_size = Some(group_size);
        }
    }
}

impl Object for Node {
    fn object_id(&self) -> ObjectId { ObjectId::Node(self.id) }
    fn bounds(&self) -> Rect { self.bounds }
    fn is_live(&self) -> bool { self.live }
    fn is_selected(&self) -> bool { self.selected }
    fn set_selected(&mut self, selected: bool) { self.selected = selected; }

    fn accept_drag(&mut self) -> bool {
        if !self.live {
            return false;
        }
        self.drag_start = Some(self.position);
        true
    }

    fn update_drag(&mut self, offset: Vec2) {
        if let Some(start) = self.drag_start {
            self.position = start + offset;
            self.bounds = Rect::from_min_size(self.position, self.bounds.size());
        }
    }

    // Reports whether the node actually moved
    fn end_drag(&mut self) -> bool {
        match self.drag_start.take() {
            Some(start) => start != self.position,
            None => false,
        }
    }

    fn drag_start_location(&self) -> Pos2 { self.drag_start.unwrap_or(self.position) }
}

#[derive(Clone, Debug)]
pub struct Pin {
    pub id: PinId,
    pub node: NodeId,
    pub kind: PinKind,
    // Node-relative geometry reported by the host while building
    pub local_rect: Rect,
    pub local_pivot: Option<Rect>,
    pub bounds: Rect,
    pub pivot: Rect,
    pub direction: Vec2,
    pub strength: f32,
    pub arrow_size: f32,
    pub has_connection: bool,
    pub had_connection: bool,
    pub live: bool,
}

impl Pin {
    pub fn new(id: PinId, node: NodeId, kind: PinKind) -> Self {
        Self {
            id,
            node,
            kind,
            local_rect: Rect::from_min_size(Pos2::ZERO, Vec2::ZERO),
            local_pivot: None,
            bounds: Rect::from_min_size(Pos2::ZERO, Vec2::ZERO),
            pivot: Rect::from_min_size(Pos2::ZERO, Vec2::ZERO),
            direction: kind.default_direction(),
            strength: 100.0,
            arrow_size: 0.0,
            has_connection: false,
            had_connection: false,
            live: false,
        }
    }

    pub fn update_bounds(&mut self, node_origin: Pos2) {
        let offset = node_origin.to_vec2();
        self.bounds = self.local_rect.translate(offset);
        self.pivot = self.local_pivot.unwrap_or(self.local_rect).translate(offset);
    }

    pub fn anchor(&self) -> Pos2 { self.pivot.center() }
}

impl Object for Pin {
    fn object_id(&self) -> ObjectId { ObjectId::Pin(self.id) }
    fn bounds(&self) -> Rect { self.bounds }
    fn is_live(&self) -> bool { self.live }
    fn is_selected(&self) -> bool { false }
    fn set_selected(&mut self, _selected: bool) {}
    fn is_selectable(&self) -> bool { false }
}

#[derive(Clone, Debug)]
pub struct Link {
    pub id: LinkId,
    pub start_pin: PinId,
    pub end_pin: PinId,
    pub start: Pos2,
    pub end: Pos2,
    pub curve: CubicBezier,
    pub thickness: f32,
    pub live: bool,
    // Both endpoint pins and their nodes were declared this frame
    pub endpoints_live: bool,
    pub selected: bool,
}

impl Link {
    pub fn new(id: LinkId, start_pin: PinId, end_pin: PinId) -> Self {
        Self {
            id,
            start_pin,
            end_pin,
            start: Pos2::ZERO,
            end: Pos2::ZERO,
            curve: CubicBezier::straight(Pos2::ZERO, Pos2::ZERO),
            thickness: 1.0,
            live: false,
            endpoints_live: false,
            selected: false,
        }
    }

    pub fn is_valid(&self) -> bool { self.live && self.endpoints_live }

    pub fn touches(&self, pin: PinId) -> bool { self.start_pin == pin || self.end_pin == pin }

    pub fn update_endpoints(&mut self, start: &Pin, end: &Pin) {
        self.start = start.anchor();
        self.end = end.anchor();
        let strength = start.strength.max(end.strength);
        self.curve = CubicBezier::from_endpoints(self.start, start.direction, self.end, end.direction, strength);
    }
}

impl Object for Link {
    fn object_id(&self) -> ObjectId { ObjectId::Link(self.id) }
    fn bounds(&self) -> Rect { self.curve.bounds().expand(self.thickness * 0.5) }
    fn is_live(&self) -> bool { self.live }
    fn is_selected(&self) -> bool { self.selected }
    fn set_selected(&mut self, selected: bool) { self.selected = selected; }

    fn is_visible(&self, viewport: Rect) -> bool {
        self.is_valid() && overlaps(self.bounds(), viewport)
    }

    fn test_hit_point(&self, point: Pos2, extra_thickness: f32) -> bool {
        if !self.is_valid() || !self.bounds().expand(extra_thickness).contains(point) {
            return false;
        }
        self.curve.distance_to(point) <= self.thickness * 0.5 + extra_thickness
    }

    fn test_hit_rect(&self, rect: Rect, allow_intersect: bool) -> bool {
        if !self.is_valid() {
            return false;
        }
        if allow_intersect { self.curve.intersects_rect(rect) } else { self.curve.inside_rect(rect) }
    }
}

/// Borrowed view of any object, for code that doesn't care about the kind.
#[derive(Clone, Copy)]
pub enum ObjectRef<'a> {
    Node(&'a Node),
    Pin(&'a Pin),
    Link(&'a Link),
}

impl<'a> ObjectRef<'a> {
    pub fn as_object(self) -> &'a dyn Object {
        match self {
            ObjectRef::Node(node) => node,
            ObjectRef::Pin(pin) => pin,
            ObjectRef::Link(link) => link,
        }
    }

    pub fn as_node(self) -> Option<&'a Node> {
        match self { ObjectRef::Node(node) => Some(node), _ => None }
    }

    pub fn as_pin(self) -> Option<&'a Pin> {
        match self { ObjectRef::Pin(pin) => Some(pin), _ => None }
    }

    pub fn as_link(self) -> Option<&'a Link> {
        match self { ObjectRef::Link(link) => Some(link), _ => None }
    }
}
