use super::{AcceptResult, ActionKind, EditorAction};
use crate::editor::state::EditorState;
use crate::graph_utils::ids::{LinkId, NodeId, ObjectId, PinId};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MenuTarget {
    Node(NodeId),
    Pin(PinId),
    Link(LinkId),
    Background,
}

/// Click with the context menu button. The host sees the request for one frame.
#[derive(Debug, Default)]
pub struct ContextMenuAction {
    target: Option<MenuTarget>,
    fresh: bool,
}

impl ContextMenuAction {
    pub fn target(&self) -> Option<MenuTarget> { self.target }

    pub fn node(&self) -> Option<NodeId> {
        match self.target { Some(MenuTarget::Node(id)) => Some(id), _ => None }
    }

    pub fn pin(&self) -> Option<PinId> {
        match self.target { Some(MenuTarget::Pin(id)) => Some(id), _ => None }
    }

    pub fn link(&self) -> Option<LinkId> {
        match self.target { Some(MenuTarget::Link(id)) => Some(id), _ => None }
    }

    pub fn background(&self) -> bool { self.target == Some(MenuTarget::Background) }
}

impl EditorAction for ContextMenuAction {
    fn kind(&self) -> ActionKind { ActionKind::ContextMenu }

    fn accept(&mut self, state: &mut EditorState) -> AcceptResult {
        let button = state.config.context_menu_button;
        let control = &state.control;
        let target = if control.is_clicked_with(button) {
            match control.clicked {
                ObjectId::Node(id) => Some(MenuTarget::Node(id)),
                ObjectId::Pin(id) => Some(MenuTarget::Pin(id)),
                ObjectId::Link(id) => Some(MenuTarget::Link(id)),
                ObjectId::None => None,
            }
        } else if control.background_clicked == Some(button) {
            Some(MenuTarget::Background)
        } else {
            None
        };
        let Some(target) = target else { return AcceptResult::False };
        log::debug!("context menu for {target:?}");
        self.target = Some(target);
        self.fresh = true;
        AcceptResult::True
    }

    fn process(&mut self, _state: &mut EditorState) -> bool {
        if self.fresh {
            self.fresh = false;
            return true;
        }
        self.target = None;
        false
    }

    fn cancel(&mut self, _state: &mut EditorState) {
        self.target = None;
        self.fresh = false;
    }

    fn is_active(&self) -> bool { self.target.is_some() }

    fn is_interruptible(&self) -> bool { false }
}
