use crate::graph_utils::ids::{LinkId, NodeId, ObjectId};

/// Ordered set of selected objects. Order is insertion order; change detection
/// ignores it.
#[derive(Clone, Debug, Default)]
pub struct Selection {
    items: Vec<ObjectId>,
    selection_id: u64,
    // Sorted copy taken at the last frame boundary
    last_frame: Vec<ObjectId>,
}

impl Selection {
    pub fn items(&self) -> &[ObjectId] { &self.items }
    pub fn len(&self) -> usize { self.items.len() }
    pub fn is_empty(&self) -> bool { self.items.is_empty() }
    pub fn contains(&self, id: ObjectId) -> bool { self.items.contains(&id) }

    /// Bumped on every mutation.
    pub fn selection_id(&self) -> u64 { self.selection_id }

    pub fn nodes(&self) -> Vec<NodeId> { self.items.iter().filter_map(|id| id.as_node()).collect() }
    pub fn links(&self) -> Vec<LinkId> { self.items.iter().filter_map(|id| id.as_link()).collect() }

    fn touch(&mut self) { self.selection_id += 1; }

    pub fn select(&mut self, id: ObjectId) -> bool {
        if id.is_none() || self.contains(id) {
            return false;
        }
        self.items.push(id);
        self.touch();
        true
    }

    pub fn deselect(&mut self, id: ObjectId) -> bool {
        let before = self.items.len();
        self.items.retain(|&item| item != id);
        let removed = self.items.len() != before;
        if removed {
            self.touch();
        }
        removed
    }

    // Returns whatever got dropped so callers can clear object flags
    pub fn set_selected(&mut self, id: ObjectId) -> Vec<ObjectId> {
        let dropped: Vec<ObjectId> = self.items.iter().copied().filter(|&item| item != id).collect();
        if dropped.is_empty() && self.contains(id) {
            return dropped;
        }
        self.items.clear();
        if id.is_some() {
            self.items.push(id);
        }
        self.touch();
        dropped
    }

    // New state of `id`
    pub fn toggle(&mut self, id: ObjectId) -> bool {
        if self.contains(id) {
            self.deselect(id);
            false
        } else {
            self.select(id)
        }
    }

    pub fn clear(&mut self) -> Vec<ObjectId> {
        if self.items.is_empty() {
            return Vec::new();
        }
        self.touch();
        std::mem::take(&mut self.items)
    }

    // Returns the removed ids
    pub fn retain(&mut self, mut keep: impl FnMut(ObjectId) -> bool) -> Vec<ObjectId> {
        let (kept, removed): (Vec<ObjectId>, Vec<ObjectId>) = self.items.iter().partition(|&&id| keep(id));
        if !removed.is_empty() {
            self.items = kept;
            self.touch();
        }
        removed
    }

    fn sorted(&self) -> Vec<ObjectId> {
        let mut sorted = self.items.clone();
        sorted.sort();
        sorted
    }

    pub fn mark_frame_boundary(&mut self) { self.last_frame = self.sorted(); }

    pub fn has_changed(&self) -> bool { self.sorted() != self.last_frame }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph_utils::ids::PinId;

    fn node(raw: u64) -> ObjectId { ObjectId::Node(NodeId(raw)) }

    #[test]
    fn keeps_insertion_order_without_duplicates() {
        let mut selection = Selection::default();
        assert!(selection.select(node(3)));
        assert!(selection.select(node(1)));
        assert!(!selection.select(node(3)));
        assert!(!selection.select(ObjectId::None));
        assert_eq!(selection.items(), &[node(3), node(1)]);
    }

    #[test]
    fn set_selected_replaces_and_reports_dropped() {
        let mut selection = Selection::default();
        selection.select(node(1));
        selection.select(node(2));
        let dropped = selection.set_selected(node(2));
        assert_eq!(dropped, vec![node(1)]);
        assert_eq!(selection.items(), &[node(2)]);
        let id = selection.selection_id();
        assert!(selection.set_selected(node(2)).is_empty());
        assert_eq!(selection.selection_id(), id);
    }

    #[test]
    fn change_detection_ignores_order() {
        let mut selection = Selection::default();
        selection.select(node(1));
        selection.select(node(2));
        selection.mark_frame_boundary();
        assert!(!selection.has_changed());

        selection.clear();
        selection.select(node(2));
        selection.select(node(1));
        assert!(!selection.has_changed());

        selection.toggle(node(2));
        assert!(selection.has_changed());
    }

    #[test]
    fn kinds_are_split_out() {
        let mut selection = Selection::default();
        selection.select(node(1));
        selection.select(ObjectId::Link(LinkId(5)));
        selection.select(ObjectId::Pin(PinId(7)));
        assert_eq!(selection.nodes(), vec![NodeId(1)]);
        assert_eq!(selection.links(), vec![LinkId(5)]);
        let removed = selection.retain(|id| !id.is_pin());
        assert_eq!(removed, vec![ObjectId::Pin(PinId(7))]);
    }
}
