use egui::{Key, Pos2};

use super::{AcceptResult, ActionKind, EditorAction};
use crate::editor::state::{EditorState, SaveReason};
use crate::graph_utils::ids::{LinkId, NodeId, ObjectId, PinId};
use crate::persistence::settings::CreateReleasePolicy;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Stage {
    #[default]
    None,
    // Dragging, the proposal follows the pointer
    Possible,
    // Released, the proposal waits for the host's final answer
    Create,
}

/// Something the user is dragging into existence. Ids are reserved up front so the host
/// can adopt them.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CreateItem {
    Link { id: LinkId, start: PinId, end: PinId },
    Node { id: NodeId, pin: PinId, position: Pos2 },
}

/// Tri-state answer to a host query.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ItemQuery<T> {
    False,
    Indeterminate,
    True(T),
}

impl<T> ItemQuery<T> {
    pub fn is_true(&self) -> bool { matches!(self, ItemQuery::True(_)) }

    pub fn value(self) -> Option<T> {
        match self {
            ItemQuery::True(value) => Some(value),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
enum UserAction {
    #[default]
    None,
    Accept,
    Reject,
}

/// Drag from a pin to another pin (new link) or to empty canvas (new node).
#[derive(Debug, Default)]
pub struct CreateItemAction {
    dragging: bool,
    stage: Stage,
    // Pin the new link stays attached to
    anchor: Option<PinId>,
    anchor_is_start: bool,
    // Existing link being re-routed with Ctrl held
    detached: Option<LinkId>,
    target: Option<PinId>,
    end_point: Pos2,
    proposal: Option<CreateItem>,
    user_action: UserAction,
    // Create stage proposal already answered
    consumed: bool,
    link_id: Option<LinkId>,
    node_id: Option<NodeId>,
    committed: Vec<CreateItem>,
}

impl CreateItemAction {
    pub fn stage(&self) -> Stage { self.stage }

    pub fn in_progress(&self) -> bool { self.stage != Stage::None }

    pub fn proposal(&self) -> Option<CreateItem> { self.proposal }

    pub fn anchor(&self) -> Option<PinId> { self.anchor }

    pub fn target_pin(&self) -> Option<PinId> { self.target }

    pub fn detached_link(&self) -> Option<LinkId> { self.detached }

    pub fn take_committed(&mut self) -> Vec<CreateItem> { std::mem::take(&mut self.committed) }

    /// Endpoints of the link being dragged, canvas space, in link direction.
    pub fn preview(&self, state: &EditorState) -> Option<(Pos2, Pos2)> {
        if !self.dragging {
            return None;
        }
        let anchor = state.graph.get_pin(self.anchor?)?.anchor();
        let free = self
            .target
            .and_then(|pin| state.graph.get_pin(pin))
            .map(|pin| pin.anchor())
            .unwrap_or(self.end_point);
        Some(if self.anchor_is_start { (anchor, free) } else { (free, anchor) })
    }

    pub fn query_link(&self) -> ItemQuery<(LinkId, PinId, PinId)> {
        if self.stage == Stage::None || self.consumed {
            return ItemQuery::False;
        }
        match self.proposal {
            Some(CreateItem::Link { id, start, end }) => ItemQuery::True((id, start, end)),
            _ => ItemQuery::Indeterminate,
        }
    }

    pub fn query_node(&self) -> ItemQuery<(NodeId, PinId, Pos2)> {
        if self.stage == Stage::None || self.consumed {
            return ItemQuery::False;
        }
        match self.proposal {
            Some(CreateItem::Node { id, pin, position }) => ItemQuery::True((id, pin, position)),
            _ => ItemQuery::Indeterminate,
        }
    }

    /// While dragging this only records the host's consent. After release it commits the
    /// item to the graph and answers True exactly once.
    pub fn accept_item(&mut self, state: &mut EditorState) -> ItemQuery<CreateItem> {
        let Some(item) = self.proposal else { return ItemQuery::False };
        match self.stage {
            Stage::None => ItemQuery::False,
            Stage::Possible => {
                self.user_action = UserAction::Accept;
                ItemQuery::Indeterminate
            }
            Stage::Create if self.consumed => ItemQuery::Indeterminate,
            Stage::Create => {
                self.consumed = true;
                if self.commit(state, item) { ItemQuery::True(item) } else { ItemQuery::False }
            }
        }
    }

    pub fn reject_item(&mut self) -> bool {
        if self.proposal.is_none() {
            return false;
        }
        match self.stage {
            Stage::None => false,
            Stage::Possible => {
                self.user_action = UserAction::Reject;
                true
            }
            Stage::Create if self.consumed => false,
            Stage::Create => {
                log::debug!("creation of {:?} rejected", self.proposal);
                self.consumed = true;
                true
            }
        }
    }

    // False when the id was taken in the meantime
    fn commit(&mut self, state: &mut EditorState, item: CreateItem) -> bool {
        match item {
            CreateItem::Link { id, start, end } => {
                if !state.graph.insert_link(id, start, end) {
                    log::warn!("link {id:?} already exists, not created");
                    return false;
                }
                log::debug!("created link {id:?} {start:?} -> {end:?}");
                if let Some(old) = self.detached
                    && !state.pending_deletions.contains(&ObjectId::Link(old))
                {
                    state.pending_deletions.push(ObjectId::Link(old));
                }
            }
            CreateItem::Node { id, position, .. } => {
                if !state.graph.insert_node(id, position) {
                    log::warn!("node {id:?} already exists, not created");
                    return false;
                }
                log::debug!("created node {id:?} at {position:?}");
                state.make_dirty(SaveReason::ADD_NODE, Some(id));
            }
        }
        self.committed.push(item);
        true
    }

    fn reset(&mut self, state: &mut EditorState) {
        if self.dragging {
            state.resolver.release_capture();
        }
        let committed = std::mem::take(&mut self.committed);
        *self = Self { committed, ..Default::default() };
    }

    fn update_proposal(&mut self, state: &mut EditorState) {
        let Some(anchor) = self.anchor else { return };
        if let Some(pointer) = state.canvas_pointer() {
            self.end_point = pointer;
        }
        self.target = state.control.hot_pin().filter(|&pin| pin != anchor && state.graph.live_pin(pin).is_some());
        self.proposal = match self.target {
            Some(target) => {
                let id = *self.link_id.get_or_insert_with(|| LinkId(state.graph.reserve_id()));
                let (start, end) = if self.anchor_is_start { (anchor, target) } else { (target, anchor) };
                Some(CreateItem::Link { id, start, end })
            }
            None if state.control.background_hot => {
                let id = *self.node_id.get_or_insert_with(|| NodeId(state.graph.reserve_id()));
                Some(CreateItem::Node { id, pin: anchor, position: self.end_point })
            }
            None => None,
        };
    }

    fn release(&mut self, state: &mut EditorState, answer: UserAction) -> bool {
        let keep = self.proposal.is_some()
            && match state.config.create_release_policy {
                CreateReleasePolicy::Implicit => answer != UserAction::Reject,
                CreateReleasePolicy::Explicit => answer == UserAction::Accept,
            };
        if !keep {
            log::debug!("creation discarded on release");
            self.reset(state);
            return false;
        }
        state.resolver.release_capture();
        self.dragging = false;
        self.target = None;
        self.stage = Stage::Create;
        self.consumed = false;
        true
    }

    // End of the frame in which the host saw the Create stage
    fn finalize(&mut self, state: &mut EditorState) {
        if !self.consumed
            && state.config.create_release_policy == CreateReleasePolicy::Implicit
            && let Some(item @ CreateItem::Link { .. }) = self.proposal
        {
            self.commit(state, item);
        } else if !self.consumed {
            log::debug!("unanswered proposal {:?} dropped", self.proposal);
        }
        self.reset(state);
    }
}

impl EditorAction for CreateItemAction {
    fn kind(&self) -> ActionKind { ActionKind::CreateItem }

    fn accept(&mut self, state: &mut EditorState) -> AcceptResult {
        let button = state.config.drag_button;
        let Some(pin) = state.control.pressed_object(button).and_then(|p| p.as_pin()) else {
            return AcceptResult::False;
        };
        if state.graph.live_pin(pin).is_none() {
            return AcceptResult::False;
        }
        if !state.pointer.is_dragging(button) {
            return if state.pointer.is_down(button) { AcceptResult::Possible } else { AcceptResult::False };
        }

        let mut anchor = pin;
        let mut anchor_is_start = true;
        let mut detached = None;
        if state.pointer.modifiers().command
            && let Some(link) = state
                .graph
                .links_for_pin(pin)
                .into_iter()
                .find_map(|id| state.graph.valid_link(id))
        {
            // Keep the far end, drag the grabbed one
            anchor_is_start = link.end_pin == pin;
            anchor = if anchor_is_start { link.start_pin } else { link.end_pin };
            detached = Some(link.id);
        }

        log::debug!("create drag from {anchor:?} (detaching {detached:?})");
        self.dragging = true;
        self.stage = Stage::Possible;
        self.anchor = Some(anchor);
        self.anchor_is_start = anchor_is_start;
        self.detached = detached;
        state.clear_selection();
        state.resolver.capture(ObjectId::Pin(pin));
        AcceptResult::True
    }

    fn process(&mut self, state: &mut EditorState) -> bool {
        if self.stage == Stage::Create {
            self.finalize(state);
            return false;
        }
        if !self.dragging {
            self.reset(state);
            return false;
        }
        let answer = std::mem::take(&mut self.user_action);
        if state.pointer.key_pressed(Key::Escape) {
            log::debug!("creation cancelled");
            self.reset(state);
            return false;
        }
        if !state.pointer.is_down(state.config.drag_button) {
            return self.release(state, answer);
        }
        self.update_proposal(state);
        true
    }

    fn cancel(&mut self, state: &mut EditorState) { self.reset(state); }

    fn is_active(&self) -> bool { self.dragging || self.stage != Stage::None }

    fn is_dragging(&self) -> bool { self.dragging }

    fn is_interruptible(&self) -> bool { false }
}
