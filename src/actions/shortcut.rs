use egui::Key;

use super::{AcceptResult, ActionKind, EditorAction};
use crate::editor::state::EditorState;
use crate::graph_utils::ids::{LinkId, NodeId, ObjectId};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shortcut {
    Cut,
    Copy,
    Paste,
    Duplicate,
    CreateNode,
}

impl Shortcut {
    // Shortcuts that do nothing without something to act on
    fn needs_context(self) -> bool { matches!(self, Shortcut::Cut | Shortcut::Copy | Shortcut::Duplicate) }
}

/// Clipboard style keyboard shortcuts. The host sees the request for one frame.
#[derive(Debug, Default)]
pub struct ShortcutAction {
    shortcut: Option<Shortcut>,
    context: Vec<ObjectId>,
    fresh: bool,
}

impl ShortcutAction {
    pub fn shortcut(&self) -> Option<Shortcut> { self.shortcut }

    pub fn is(&self, shortcut: Shortcut) -> bool { self.shortcut == Some(shortcut) }

    pub fn context(&self) -> &[ObjectId] { &self.context }

    pub fn context_nodes(&self) -> Vec<NodeId> { self.context.iter().filter_map(|id| id.as_node()).collect() }

    pub fn context_links(&self) -> Vec<LinkId> { self.context.iter().filter_map(|id| id.as_link()).collect() }

    fn pressed(state: &EditorState) -> Option<Shortcut> {
        let pointer = &state.pointer;
        let modifiers = pointer.modifiers();
        if modifiers.command {
            [(Key::X, Shortcut::Cut), (Key::C, Shortcut::Copy), (Key::V, Shortcut::Paste), (Key::D, Shortcut::Duplicate)]
                .into_iter()
                .find(|(key, _)| pointer.key_pressed(*key))
                .map(|(_, shortcut)| shortcut)
        } else if pointer.key_pressed(Key::Space) {
            Some(Shortcut::CreateNode)
        } else {
            None
        }
    }

    // Selection with group contents, else whatever is under the pointer
    fn gather_context(state: &EditorState) -> Vec<ObjectId> {
        let mut context: Vec<ObjectId> =
            state.selected_nodes_with_groups().into_iter().map(ObjectId::Node).collect();
        context.extend(state.selection.links().into_iter().map(ObjectId::Link));
        if context.is_empty() {
            let hot = state.control.hot;
            if hot.is_node() || hot.is_link() {
                context.push(hot);
            }
        }
        context
    }
}

impl EditorAction for ShortcutAction {
    fn kind(&self) -> ActionKind { ActionKind::Shortcut }

    fn accept(&mut self, state: &mut EditorState) -> AcceptResult {
        if !state.shortcuts_enabled || !state.pointer.has_focus() || state.pointer.any_down() {
            return AcceptResult::False;
        }
        let Some(shortcut) = Self::pressed(state) else { return AcceptResult::False };
        let context = Self::gather_context(state);
        if shortcut.needs_context() && context.is_empty() {
            return AcceptResult::False;
        }
        log::debug!("shortcut {shortcut:?} with {} object(s)", context.len());
        self.shortcut = Some(shortcut);
        self.context = context;
        self.fresh = true;
        AcceptResult::True
    }

    fn process(&mut self, _state: &mut EditorState) -> bool {
        if self.fresh {
            self.fresh = false;
            return true;
        }
        self.shortcut = None;
        self.context.clear();
        false
    }

    fn cancel(&mut self, _state: &mut EditorState) {
        self.shortcut = None;
        self.context.clear();
        self.fresh = false;
    }

    fn is_active(&self) -> bool { self.shortcut.is_some() }

    fn is_interruptible(&self) -> bool { false }
}
