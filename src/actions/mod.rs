pub mod context_menu;
pub mod create_item;
pub mod delete_items;
pub mod drag;
pub mod navigate;
pub mod select;
pub mod shortcut;
pub mod size;

use crate::editor::state::EditorState;

pub use context_menu::ContextMenuAction;
pub use create_item::CreateItemAction;
pub use delete_items::DeleteItemsAction;
pub use drag::DragAction;
pub use navigate::NavigateAction;
pub use select::SelectAction;
pub use shortcut::ShortcutAction;
pub use size::SizeAction;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AcceptResult {
    False,
    True,
    // Could start, but defers to anything that answers True this frame
    Possible,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Shortcut,
    ContextMenu,
    CreateItem,
    DeleteItems,
    Size,
    Drag,
    Select,
    Navigate,
}

impl ActionKind {
    /// Arbitration order, first wins.
    pub const PRIORITY: [ActionKind; 8] = [
        ActionKind::Shortcut,
        ActionKind::ContextMenu,
        ActionKind::CreateItem,
        ActionKind::DeleteItems,
        ActionKind::Size,
        ActionKind::Drag,
        ActionKind::Select,
        ActionKind::Navigate,
    ];

    fn rank(self) -> usize {
        Self::PRIORITY.iter().position(|&k| k == self).unwrap_or(Self::PRIORITY.len())
    }
}

/// One high-level interaction. Actions are plain state machines advanced once per frame.
pub trait EditorAction {
    fn kind(&self) -> ActionKind;

    /// Votes on starting this frame. Must not touch shared state unless answering True.
    fn accept(&mut self, state: &mut EditorState) -> AcceptResult;

    /// Advances one frame. Returns false once finished.
    fn process(&mut self, state: &mut EditorState) -> bool;

    /// Called when a Possible vote loses arbitration.
    fn reject(&mut self, _state: &mut EditorState) {}

    /// Called when a running action is interrupted.
    fn cancel(&mut self, _state: &mut EditorState) {}

    fn is_active(&self) -> bool;

    fn is_dragging(&self) -> bool { false }

    fn is_interruptible(&self) -> bool { !self.is_dragging() }
}

/// Owns every action and runs at most one of them per frame.
#[derive(Debug, Default)]
pub struct ActionSet {
    pub shortcut: ShortcutAction,
    pub context_menu: ContextMenuAction,
    pub create: CreateItemAction,
    pub delete: DeleteItemsAction,
    pub size: SizeAction,
    pub drag: DragAction,
    pub select: SelectAction,
    pub navigate: NavigateAction,
    current: Option<ActionKind>,
    // First Possible vote from an earlier frame, still waiting for a verdict
    provisional: Option<ActionKind>,
}

impl ActionSet {
    pub fn action_mut(&mut self, kind: ActionKind) -> &mut dyn EditorAction {
        match kind {
            ActionKind::Shortcut => &mut self.shortcut,
            ActionKind::ContextMenu => &mut self.context_menu,
            ActionKind::CreateItem => &mut self.create,
            ActionKind::DeleteItems => &mut self.delete,
            ActionKind::Size => &mut self.size,
            ActionKind::Drag => &mut self.drag,
            ActionKind::Select => &mut self.select,
            ActionKind::Navigate => &mut self.navigate,
        }
    }

    pub fn action(&self, kind: ActionKind) -> &dyn EditorAction {
        match kind {
            ActionKind::Shortcut => &self.shortcut,
            ActionKind::ContextMenu => &self.context_menu,
            ActionKind::CreateItem => &self.create,
            ActionKind::DeleteItems => &self.delete,
            ActionKind::Size => &self.size,
            ActionKind::Drag => &self.drag,
            ActionKind::Select => &self.select,
            ActionKind::Navigate => &self.navigate,
        }
    }

    pub fn current(&self) -> Option<ActionKind> { self.current }

    pub fn provisional(&self) -> Option<ActionKind> { self.provisional }

    // The running action holds the pointer
    pub fn is_dragging(&self) -> bool { self.current.is_some_and(|kind| self.action(kind).is_dragging()) }

    pub fn running_count(&self) -> usize {
        ActionKind::PRIORITY.iter().filter(|&&k| self.action(k).is_active()).count()
    }

    fn start(&mut self, kind: ActionKind, state: &mut EditorState) {
        log::debug!("action {kind:?} accepted");
        self.current = Some(kind);
        if !self.action_mut(kind).process(state) {
            log::debug!("action {kind:?} finished");
            self.current = None;
        }
    }

    fn drop_provisional(&mut self, state: &mut EditorState, keep: Option<ActionKind>) {
        if let Some(previous) = self.provisional.take()
            && Some(previous) != keep
        {
            log::debug!("action {previous:?} rejected");
            self.action_mut(previous).reject(state);
        }
    }

    /// Runs one frame of arbitration against the control snapshot already in `state`.
    pub fn step(&mut self, state: &mut EditorState) {
        if let Some(kind) = self.current {
            if self.action(kind).is_interruptible() && self.interrupt(kind, state) {
                return;
            }
            if !self.action_mut(kind).process(state) {
                log::debug!("action {kind:?} finished");
                self.current = None;
            }
            return;
        }

        let mut winner = None;
        let mut possible = None;
        for kind in ActionKind::PRIORITY {
            match self.action_mut(kind).accept(state) {
                AcceptResult::True => {
                    winner = Some(kind);
                    break;
                }
                AcceptResult::Possible if possible.is_none() => possible = Some(kind),
                AcceptResult::Possible => self.action_mut(kind).reject(state),
                AcceptResult::False => {}
            }
        }

        match winner {
            Some(kind) => {
                if let Some(candidate) = possible
                    && candidate != kind
                    && Some(candidate) != self.provisional
                {
                    self.action_mut(candidate).reject(state);
                }
                self.drop_provisional(state, Some(kind));
                self.start(kind, state);
            }
            None => {
                self.drop_provisional(state, possible);
                self.provisional = possible;
            }
        }
    }

    // Higher priority actions get a chance to cut in on a running one
    fn interrupt(&mut self, running: ActionKind, state: &mut EditorState) -> bool {
        for kind in ActionKind::PRIORITY.into_iter().take_while(|k| k.rank() < running.rank()) {
            match self.action_mut(kind).accept(state) {
                AcceptResult::True => {
                    log::debug!("action {running:?} cancelled by {kind:?}");
                    self.action_mut(running).cancel(state);
                    self.current = None;
                    self.start(kind, state);
                    return true;
                }
                AcceptResult::Possible => self.action_mut(kind).reject(state),
                AcceptResult::False => {}
            }
        }
        false
    }

    /// Abandons whatever is running or pending.
    pub fn cancel_all(&mut self, state: &mut EditorState) {
        self.drop_provisional(state, None);
        if let Some(kind) = self.current.take() {
            log::debug!("action {kind:?} cancelled");
            self.action_mut(kind).cancel(state);
        }
    }
}
