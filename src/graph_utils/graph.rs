use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use egui::{Pos2, Rect, Vec2};

use super::ids::{LinkId, NodeId, ObjectId, PinId};
use super::objects::{Link, Node, NodeKind, Object, ObjectRef, Pin, PinKind};

/// Slot storage keyed by a stable external id. Slots are reused only after removal,
/// so an object keeps its slot for as long as it exists.
#[derive(Clone, Debug)]
pub struct Pool<K, T> {
    slots: Vec<Option<T>>,
    index: HashMap<K, usize>,
    free: Vec<usize>,
}

impl<K: Copy + Eq + Hash, T> Default for Pool<K, T> {
    fn default() -> Self {
        Self { slots: Vec::new(), index: HashMap::new(), free: Vec::new() }
    }
}

impl<K: Copy + Eq + Hash, T> Pool<K, T> {
    pub fn get(&self, id: K) -> Option<&T> {
        self.index.get(&id).and_then(|&slot| self.slots[slot].as_ref())
    }

    pub fn get_mut(&mut self, id: K) -> Option<&mut T> {
        match self.index.get(&id) {
            Some(&slot) => self.slots[slot].as_mut(),
            None => None,
        }
    }

    pub fn contains(&self, id: K) -> bool { self.index.contains_key(&id) }

    // Returns the object and whether it was created by this call
    pub fn get_or_insert_with(&mut self, id: K, make: impl FnOnce() -> T) -> (&mut T, bool) {
        let slot = match self.index.get(&id) {
            Some(&slot) => slot,
            None => {
                let slot = self.free.pop().unwrap_or_else(|| {
                    self.slots.push(None);
                    self.slots.len() - 1
                });
                self.index.insert(id, slot);
                slot
            }
        };
        let created = self.slots[slot].is_none();
        (self.slots[slot].get_or_insert_with(make), created)
    }

    pub fn remove(&mut self, id: K) -> Option<T> {
        let slot = self.index.remove(&id)?;
        self.free.push(slot);
        self.slots[slot].take()
    }

    // Slot order, which is creation order until slots get reused
    pub fn iter(&self) -> impl Iterator<Item = &T> { self.slots.iter().flatten() }
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> { self.slots.iter_mut().flatten() }

    pub fn len(&self) -> usize { self.index.len() }
    pub fn is_empty(&self) -> bool { self.index.is_empty() }
}

/// Per-kind pools of everything the host has declared.
#[derive(Clone, Debug, Default)]
pub struct EditorGraph {
    pub nodes: Pool<NodeId, Node>,
    pub pins: Pool<PinId, Pin>,
    pub links: Pool<LinkId, Link>,
    // Highest raw id handed out or seen, so generated ids never collide with declared ones
    id_watermark: u64,
}

impl EditorGraph {
    pub fn new() -> Self { Self::default() }

    fn observe_id(&mut self, raw: u64) {
        self.id_watermark = self.id_watermark.max(raw);
    }

    /// Next raw id above everything declared so far, in the shared id space.
    pub fn reserve_id(&mut self) -> u64 {
        self.id_watermark += 1;
        self.id_watermark
    }

    // Frame rebuild: everything goes not-live until declared again
    pub fn begin_frame(&mut self) {
        for node in self.nodes.iter_mut() {
            node.live = false;
        }
        for pin in self.pins.iter_mut() {
            pin.live = false;
            pin.had_connection = pin.has_connection;
            pin.has_connection = false;
        }
        for link in self.links.iter_mut() {
            link.live = false;
        }
    }

    pub fn declare_node(&mut self, id: NodeId) -> (&mut Node, bool) {
        self.observe_id(id.0);
        let (node, created) = self.nodes.get_or_insert_with(id, || Node::new(id));
        node.live = true;
        node.pins.clear();
        (node, created)
    }

    pub fn declare_pin(&mut self, id: PinId, node: NodeId, kind: PinKind) -> &mut Pin {
        self.observe_id(id.0);
        if let Some(owner) = self.nodes.get_mut(node)
            && !owner.pins.contains(&id)
        {
            owner.pins.push(id);
        }
        let (pin, _) = self.pins.get_or_insert_with(id, || Pin::new(id, node, kind));
        if pin.kind != kind {
            pin.direction = kind.default_direction();
        }
        pin.node = node;
        pin.kind = kind;
        pin.live = true;
        pin
    }

    pub fn declare_link(&mut self, id: LinkId, start: PinId, end: PinId) -> &mut Link {
        self.observe_id(id.0);
        let (link, _) = self.links.get_or_insert_with(id, || Link::new(id, start, end));
        link.start_pin = start;
        link.end_pin = end;
        link.live = true;
        link
    }

    pub fn get_node(&self, id: NodeId) -> Option<&Node> { self.nodes.get(id) }
    pub fn get_node_mut(&mut self, id: NodeId) -> Option<&mut Node> { self.nodes.get_mut(id) }
    pub fn get_pin(&self, id: PinId) -> Option<&Pin> { self.pins.get(id) }
    pub fn get_link(&self, id: LinkId) -> Option<&Link> { self.links.get(id) }

    pub fn live_node(&self, id: NodeId) -> Option<&Node> { self.nodes.get(id).filter(|n| n.live) }

    // A pin is usable only while both it and its node are declared
    pub fn live_pin(&self, id: PinId) -> Option<&Pin> {
        self.pins.get(id).filter(|p| p.live && self.live_node(p.node).is_some())
    }

    pub fn valid_link(&self, id: LinkId) -> Option<&Link> { self.links.get(id).filter(|l| l.is_valid()) }

    pub fn object(&self, id: ObjectId) -> Option<ObjectRef<'_>> {
        match id {
            ObjectId::None => None,
            ObjectId::Node(node) => self.nodes.get(node).map(ObjectRef::Node),
            ObjectId::Pin(pin) => self.pins.get(pin).map(ObjectRef::Pin),
            ObjectId::Link(link) => self.links.get(link).map(ObjectRef::Link),
        }
    }

    pub fn object_mut(&mut self, id: ObjectId) -> Option<&mut dyn Object> {
        match id {
            ObjectId::None => None,
            ObjectId::Node(node) => self.nodes.get_mut(node).map(|n| n as &mut dyn Object),
            ObjectId::Pin(pin) => self.pins.get_mut(pin).map(|p| p as &mut dyn Object),
            ObjectId::Link(link) => self.links.get_mut(link).map(|l| l as &mut dyn Object),
        }
    }

    pub fn is_live(&self, id: ObjectId) -> bool {
        match id {
            ObjectId::None => false,
            ObjectId::Node(node) => self.live_node(node).is_some(),
            ObjectId::Pin(pin) => self.live_pin(pin).is_some(),
            ObjectId::Link(link) => self.valid_link(link).is_some(),
        }
    }

    pub fn set_selected(&mut self, id: ObjectId, selected: bool) {
        if let Some(object) = self.object_mut(id) {
            object.set_selected(selected);
        }
    }

    /// Recomputes derived geometry: node bounds, pin rects, link endpoints and
    /// connection flags. Links whose endpoints are gone are flagged, not removed.
    pub fn update_geometry(&mut self, header_height: f32) {
        for node in self.nodes.iter_mut() {
            node.update_bounds(header_height);
        }
        let origins: HashMap<NodeId, Pos2> = self.nodes.iter().map(|n| (n.id, n.position)).collect();
        for pin in self.pins.iter_mut() {
            if let Some(&origin) = origins.get(&pin.node) {
                pin.update_bounds(origin);
            }
        }
        let mut connected = HashSet::new();
        let mut ends = Vec::new();
        for link in self.links.iter() {
            let start = self.live_pin(link.start_pin).cloned();
            let end = self.live_pin(link.end_pin).cloned();
            ends.push((link.id, start, end));
        }
        for (id, start, end) in ends {
            let Some(link) = self.links.get_mut(id) else { continue };
            match (start, end) {
                (Some(start), Some(end)) => {
                    link.endpoints_live = true;
                    link.update_endpoints(&start, &end);
                    if link.live {
                        connected.insert(start.id);
                        connected.insert(end.id);
                    }
                }
                _ => link.endpoints_live = false,
            }
        }
        for pin in self.pins.iter_mut() {
            if connected.contains(&pin.id) {
                pin.has_connection = true;
            }
        }
    }

    // Live nodes in z order; groups always sit below plain nodes
    pub fn nodes_in_z_order(&self) -> Vec<&Node> {
        let mut nodes: Vec<&Node> = self.nodes.iter().filter(|n| n.live).collect();
        nodes.sort_by(|a, b| {
            let ka = (a.kind == NodeKind::Plain, a.z);
            let kb = (b.kind == NodeKind::Plain, b.z);
            ka.partial_cmp(&kb).unwrap_or(std::cmp::Ordering::Equal)
        });
        nodes
    }

    pub fn live_node_ids(&self) -> Vec<NodeId> {
        self.nodes_in_z_order().iter().map(|n| n.id).collect()
    }

    pub fn links_for_pin(&self, pin: PinId) -> Vec<LinkId> {
        self.links.iter().filter(|l| l.touches(pin)).map(|l| l.id).collect()
    }

    pub fn links_for_node(&self, node: NodeId) -> Vec<LinkId> {
        self.links
            .iter()
            .filter(|l| {
                [l.start_pin, l.end_pin]
                    .iter()
                    .any(|&p| self.pins.get(p).is_some_and(|pin| pin.node == node))
            })
            .map(|l| l.id)
            .collect()
    }

    pub fn has_any_links_for_pin(&self, pin: PinId) -> bool {
        self.links.iter().any(|l| l.live && l.touches(pin))
    }

    pub fn has_any_links_for_node(&self, node: NodeId) -> bool {
        self.links_for_node(node).into_iter().any(|id| self.links.get(id).is_some_and(|l| l.live))
    }

    pub fn insert_link(&mut self, id: LinkId, start: PinId, end: PinId) -> bool {
        if self.links.contains(id) {
            return false;
        }
        self.declare_link(id, start, end);
        true
    }

    // Created not-live at `position`; the host declares it from the next frame on
    pub fn insert_node(&mut self, id: NodeId, position: Pos2) -> bool {
        if self.nodes.contains(id) {
            return false;
        }
        self.observe_id(id.0);
        let (node, _) = self.nodes.get_or_insert_with(id, || Node::new(id));
        node.position = position;
        true
    }

    pub fn remove_link(&mut self, id: LinkId) -> bool {
        self.links.remove(id).is_some()
    }

    // Pins never outlive their node. Attached links go too when asked.
    pub fn remove_node(&mut self, id: NodeId, with_links: bool) -> Vec<LinkId> {
        let mut removed_links = Vec::new();
        if !self.nodes.contains(id) {
            return removed_links;
        }
        if with_links {
            removed_links = self.links_for_node(id);
            for link in &removed_links {
                self.links.remove(*link);
            }
        }
        let pins: Vec<PinId> = self.pins.iter().filter(|p| p.node == id).map(|p| p.id).collect();
        for pin in pins {
            self.pins.remove(pin);
        }
        self.nodes.remove(id);
        removed_links
    }

    /// Nodes whose group id points at `group`, optionally following nested groups.
    pub fn grouped_nodes(&self, group: NodeId, recursive: bool) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut visited = HashSet::from([group]);
        let mut pending = vec![group];
        while let Some(current) = pending.pop() {
            for node in self.nodes.iter().filter(|n| n.group_id == Some(current)) {
                if !visited.insert(node.id) {
                    continue;
                }
                result.push(node.id);
                if recursive && node.is_group() {
                    pending.push(node.id);
                }
            }
        }
        result
    }

    /// Innermost live group whose interior fully contains `rect`.
    pub fn group_containing(&self, rect: Rect, exclude: &HashSet<NodeId>) -> Option<NodeId> {
        self.nodes
            .iter()
            .filter(|n| n.live && n.is_group() && !exclude.contains(&n.id))
            .filter(|n| super::geometry::contains_rect(n.group_bounds, rect))
            .min_by(|a, b| {
                a.group_bounds.area().partial_cmp(&b.group_bounds.area()).unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|n| n.id)
    }

    pub fn content_bounds(&self) -> Option<Rect> {
        self.nodes
            .iter()
            .filter(|n| n.live)
            .map(|n| n.bounds)
            .reduce(|a, b| a.union(b))
    }

    pub fn translate_node(&mut self, id: NodeId, delta: Vec2) -> bool {
        match self.nodes.get_mut(id) {
            Some(node) => {
                node.position += delta;
                true
            }
            None => false,
        }
    }

    pub fn node_count(&self) -> usize { self.nodes.len() }
    pub fn pin_count(&self) -> usize { self.pins.len() }
    pub fn link_count(&self) -> usize { self.links.len() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::{pos2, vec2};

    fn two_node_graph() -> EditorGraph {
        let mut graph = EditorGraph::new();
        graph.begin_frame();
        graph.declare_node(NodeId(1));
        graph.declare_pin(PinId(11), NodeId(1), PinKind::Output).local_rect =
            Rect::from_min_size(pos2(90.0, 10.0), vec2(10.0, 10.0));
        graph.declare_node(NodeId(2)).0.position = pos2(200.0, 0.0);
        graph.declare_pin(PinId(21), NodeId(2), PinKind::Input).local_rect =
            Rect::from_min_size(pos2(0.0, 10.0), vec2(10.0, 10.0));
        graph.declare_link(LinkId(100), PinId(11), PinId(21));
        graph.update_geometry(0.0);
        graph
    }

    #[test]
    fn pool_reuses_freed_slots_and_keeps_identity() {
        let mut pool: Pool<u64, &str> = Pool::default();
        pool.get_or_insert_with(1, || "a");
        pool.get_or_insert_with(2, || "b");
        let (_, created) = pool.get_or_insert_with(1, || "ignored");
        assert!(!created);
        assert_eq!(pool.get(1), Some(&"a"));
        assert_eq!(pool.remove(1), Some("a"));
        assert!(pool.get(1).is_none());
        pool.get_or_insert_with(3, || "c");
        assert_eq!(pool.iter().copied().collect::<Vec<_>>(), vec!["c", "b"]);
    }

    #[test]
    fn not_live_objects_are_retained() {
        let mut graph = two_node_graph();
        graph.begin_frame();
        graph.update_geometry(0.0);
        assert!(graph.get_node(NodeId(1)).is_some());
        assert!(graph.live_node(NodeId(1)).is_none());
        assert!(graph.valid_link(LinkId(100)).is_none());
    }

    #[test]
    fn link_endpoints_follow_pin_pivots() {
        let graph = two_node_graph();
        let link = graph.valid_link(LinkId(100)).expect("link should be valid");
        assert_eq!(link.start, pos2(95.0, 15.0));
        assert_eq!(link.end, pos2(205.0, 15.0));
        assert!(graph.get_pin(PinId(11)).is_some_and(|p| p.has_connection));
    }

    #[test]
    fn removing_a_node_drops_its_pins_and_optionally_links() {
        let mut graph = two_node_graph();
        let removed = graph.remove_node(NodeId(1), false);
        assert!(removed.is_empty());
        assert!(graph.get_pin(PinId(11)).is_none());
        graph.update_geometry(0.0);
        assert!(graph.get_link(LinkId(100)).is_some_and(|l| !l.endpoints_live));

        let mut graph = two_node_graph();
        assert_eq!(graph.remove_node(NodeId(2), true), vec![LinkId(100)]);
        assert!(graph.get_link(LinkId(100)).is_none());
    }

    #[test]
    fn reserved_ids_sit_above_declared_ones() {
        let mut graph = two_node_graph();
        assert_eq!(graph.reserve_id(), 101);
        assert_eq!(graph.reserve_id(), 102);
    }

    #[test]
    fn grouped_nodes_tolerate_cycles_and_missing_groups() {
        let mut graph = EditorGraph::new();
        graph.declare_node(NodeId(1)).0.kind = NodeKind::Group;
        graph.declare_node(NodeId(2)).0.group_id = Some(NodeId(1));
        let (inner, _) = graph.declare_node(NodeId(3));
        inner.kind = NodeKind::Group;
        inner.group_id = Some(NodeId(1));
        graph.declare_node(NodeId(4)).0.group_id = Some(NodeId(3));
        graph.get_node_mut(NodeId(1)).expect("group").group_id = Some(NodeId(3));

        let mut direct = graph.grouped_nodes(NodeId(1), false);
        direct.sort();
        assert_eq!(direct, vec![NodeId(2), NodeId(3)]);
        let mut all = graph.grouped_nodes(NodeId(1), true);
        all.sort();
        assert_eq!(all, vec![NodeId(2), NodeId(3), NodeId(4)]);

        graph.remove_node(NodeId(3), true);
        assert!(graph.get_node(NodeId(3)).is_none());
        assert_eq!(graph.get_node(NodeId(4)).and_then(|n| n.group_id), Some(NodeId(3)));
        assert!(graph.grouped_nodes(NodeId(3), true).contains(&NodeId(4)));
    }
}
