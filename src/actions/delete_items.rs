use egui::Key;

use super::{AcceptResult, ActionKind, EditorAction};
use crate::editor::state::EditorState;
use crate::graph_utils::ids::{LinkId, NodeId, ObjectId, PinId};

/// Snapshot of an object up for deletion, taken when the session opened.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeleteCandidate {
    Link { id: LinkId, start: PinId, end: PinId },
    Node { id: NodeId },
}

impl DeleteCandidate {
    pub fn object_id(self) -> ObjectId {
        match self {
            DeleteCandidate::Link { id, .. } => ObjectId::Link(id),
            DeleteCandidate::Node { id } => ObjectId::Node(id),
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Entry {
    item: DeleteCandidate,
    yielded: bool,
    // Already gone from the graph, the host is only being told
    notice: bool,
}

/// Batch deletion the host negotiates item by item. A session lasts one frame.
#[derive(Debug, Default)]
pub struct DeleteItemsAction {
    entries: Vec<Entry>,
    current: Option<usize>,
    decided: bool,
    active: bool,
    fresh: bool,
}

impl DeleteItemsAction {
    pub fn in_progress(&self) -> bool { self.active }

    fn candidate(state: &EditorState, id: ObjectId) -> Option<DeleteCandidate> {
        match id {
            ObjectId::Node(node) => state.graph.get_node(node).map(|_| DeleteCandidate::Node { id: node }),
            ObjectId::Link(link) => state
                .graph
                .get_link(link)
                .map(|l| DeleteCandidate::Link { id: link, start: l.start_pin, end: l.end_pin }),
            _ => None,
        }
    }

    fn push(&mut self, item: DeleteCandidate, notice: bool) {
        if let Some(entry) = self.entries.iter_mut().find(|e| !e.yielded && e.item.object_id() == item.object_id()) {
            entry.notice |= notice;
            return;
        }
        self.entries.push(Entry { item, yielded: false, notice });
    }

    fn requested(state: &mut EditorState) -> Vec<ObjectId> {
        let mut requested = std::mem::take(&mut state.pending_deletions);
        let pointer = &state.pointer;
        if pointer.has_focus() && pointer.key_pressed(Key::Delete) && !pointer.any_down() {
            requested.extend(state.selection.items().iter().copied().filter(|id| id.is_node() || id.is_link()));
        }
        let control = &state.control;
        if pointer.modifiers().alt
            && control.is_clicked_with(state.config.select_button)
            && let Some(link) = control.clicked_link()
        {
            requested.push(ObjectId::Link(link));
        }
        requested
    }

    // An undecided current item counts as accepted with its dependencies
    fn settle_current(&mut self, state: &mut EditorState) {
        if self.current.is_some() && !self.decided {
            self.accept_item(state, true);
        }
        self.current = None;
    }

    fn next(&mut self, state: &mut EditorState, links: bool) -> Option<DeleteCandidate> {
        if !self.active {
            return None;
        }
        self.settle_current(state);
        let index = self.entries.iter().position(|e| {
            !e.yielded && matches!(e.item, DeleteCandidate::Link { .. }) == links
        })?;
        self.entries[index].yielded = true;
        self.current = Some(index);
        self.decided = false;
        Some(self.entries[index].item)
    }

    pub fn query_link(&mut self, state: &mut EditorState) -> Option<(LinkId, PinId, PinId)> {
        match self.next(state, true)? {
            DeleteCandidate::Link { id, start, end } => Some((id, start, end)),
            DeleteCandidate::Node { .. } => None,
        }
    }

    pub fn query_node(&mut self, state: &mut EditorState) -> Option<NodeId> {
        match self.next(state, false)? {
            DeleteCandidate::Node { id } => Some(id),
            DeleteCandidate::Link { .. } => None,
        }
    }

    /// Deletes the current candidate. With `delete_dependencies`, links attached to a
    /// deleted node go too and are queued for the host to hear about.
    pub fn accept_item(&mut self, state: &mut EditorState, delete_dependencies: bool) -> bool {
        let Some(index) = self.current else { return false };
        if self.decided {
            return false;
        }
        self.decided = true;
        let entry = self.entries[index];
        match entry.item {
            DeleteCandidate::Link { id, .. } if entry.notice => {
                state.tombstones.remove(&id);
            }
            DeleteCandidate::Link { id, .. } => {
                log::debug!("deleted link {id:?}");
                state.discard_link(id);
            }
            DeleteCandidate::Node { id } => {
                if delete_dependencies {
                    for link in state.graph.links_for_node(id) {
                        let Some(candidate) = Self::candidate(state, ObjectId::Link(link)) else { continue };
                        state.discard_link(link);
                        state.tombstones.insert(link);
                        self.push(candidate, true);
                    }
                }
                log::debug!("deleted node {id:?} (dependencies: {delete_dependencies})");
                state.remove_node_now(id, false);
            }
        }
        true
    }

    pub fn reject_item(&mut self, state: &mut EditorState) -> bool {
        let Some(index) = self.current else { return false };
        if self.decided {
            return false;
        }
        self.decided = true;
        let entry = self.entries[index];
        if let DeleteCandidate::Link { id, .. } = entry.item
            && entry.notice
        {
            // The host keeps it and may declare it again
            state.tombstones.remove(&id);
        }
        log::debug!("deletion of {:?} rejected", entry.item);
        true
    }

    /// Settles the current item. Notices the host never queried are dropped along with
    /// their tombstones, so a host that keeps declaring the link gets it back.
    pub fn close(&mut self, state: &mut EditorState) {
        self.settle_current(state);
        for entry in self.entries.drain(..).filter(|e| e.notice && !e.yielded) {
            if let DeleteCandidate::Link { id, .. } = entry.item {
                log::debug!("removal of {id:?} went unreported");
                state.tombstones.remove(&id);
            }
        }
        self.active = false;
        self.fresh = false;
    }
}

impl EditorAction for DeleteItemsAction {
    fn kind(&self) -> ActionKind { ActionKind::DeleteItems }

    fn accept(&mut self, state: &mut EditorState) -> AcceptResult {
        let requested = Self::requested(state);
        let notices = std::mem::take(&mut state.removed_links);
        if requested.is_empty() && notices.is_empty() {
            return AcceptResult::False;
        }
        self.entries.clear();
        for id in requested {
            if let Some(candidate) = Self::candidate(state, id) {
                self.push(candidate, false);
            }
        }
        for removed in notices {
            self.push(DeleteCandidate::Link { id: removed.id, start: removed.start, end: removed.end }, true);
        }
        if self.entries.is_empty() {
            return AcceptResult::False;
        }
        log::debug!("delete session with {} candidate(s)", self.entries.len());
        self.active = true;
        self.fresh = true;
        self.current = None;
        AcceptResult::True
    }

    // Open for the frame after acceptance only
    fn process(&mut self, state: &mut EditorState) -> bool {
        if self.fresh {
            self.fresh = false;
            return true;
        }
        self.close(state);
        false
    }

    fn cancel(&mut self, state: &mut EditorState) { self.close(state); }

    fn is_active(&self) -> bool { self.active }

    fn is_interruptible(&self) -> bool { false }
}
