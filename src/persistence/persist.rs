use std::collections::BTreeMap;

use egui::{Pos2, Rect, Vec2};
use serde::{Deserialize, Serialize};

use crate::graph_utils::ids::{NodeId, ObjectId};

// The state shapes below are what a host persists between sessions. How they are
// encoded is up to the host; every shape derives serde.

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeState {
    pub location: (f32, f32),
    pub size: (f32, f32),
    pub group_size: (f32, f32),
}

impl NodeState {
    pub fn from_runtime(location: Pos2, size: Vec2, group_size: Vec2) -> Self {
        Self {
            location: (location.x, location.y),
            size: (size.x, size.y),
            group_size: (group_size.x, group_size.y),
        }
    }

    #[allow(clippy::wrong_self_convention)]
    pub fn to_runtime(&self) -> (Pos2, Vec2, Vec2) {
        (
            egui::pos2(self.location.0, self.location.1),
            egui::vec2(self.size.0, self.size.1),
            egui::vec2(self.group_size.0, self.group_size.1),
        )
    }

    pub fn has_changed(&self, other: &Self) -> bool { self != other }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NodesState {
    pub nodes: BTreeMap<NodeId, NodeState>,
}

impl NodesState {
    pub fn has_changed(&self, other: &Self) -> bool { self != other }

    pub fn get(&self, id: NodeId) -> Option<&NodeState> { self.nodes.get(&id) }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SelectionState {
    pub objects: Vec<ObjectId>,
}

impl SelectionState {
    // Order is part of the state, as it drives deletion batching
    pub fn has_changed(&self, other: &Self) -> bool {
        self != other
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    pub scroll: (f32, f32),
    pub zoom: f32,
    // min x, min y, max x, max y in canvas space
    pub visible_rect: (f32, f32, f32, f32),
    #[serde(default)]
    pub theme: String,
}

impl Default for ViewState {
    fn default() -> Self {
        Self { scroll: (0.0, 0.0), zoom: 1.0, visible_rect: (0.0, 0.0, 0.0, 0.0), theme: String::new() }
    }
}

impl ViewState {
    pub fn from_runtime(scroll: Vec2, zoom: f32, visible: Rect, theme: &str) -> Self {
        Self {
            scroll: (scroll.x, scroll.y),
            zoom,
            visible_rect: (visible.min.x, visible.min.y, visible.max.x, visible.max.y),
            theme: theme.to_string(),
        }
    }

    #[allow(clippy::wrong_self_convention)]
    pub fn to_runtime(&self) -> (Vec2, f32) {
        (egui::vec2(self.scroll.0, self.scroll.1), self.zoom)
    }

    pub fn visible_rect(&self) -> Rect {
        let (x0, y0, x1, y1) = self.visible_rect;
        Rect::from_min_max(egui::pos2(x0, y0), egui::pos2(x1, y1))
    }

    pub fn has_changed(&self, other: &Self) -> bool { self != other }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph_utils::ids::{LinkId, PinId};

    #[test]
    fn node_state_comparator_is_field_wise() {
        let a = NodeState::from_runtime(egui::pos2(1.0, 2.0), egui::vec2(10.0, 20.0), Vec2::ZERO);
        let mut b = a.clone();
        assert!(!a.has_changed(&b));
        b.group_size = (5.0, 5.0);
        assert!(a.has_changed(&b));
    }

    #[test]
    fn selection_state_compares_kinds_by_raw_identity() {
        let a = SelectionState { objects: vec![ObjectId::from(NodeId(1)), ObjectId::from(LinkId(2))] };
        let b = SelectionState { objects: vec![ObjectId::from(NodeId(1)), ObjectId::from(LinkId(2))] };
        let c = SelectionState { objects: vec![ObjectId::from(LinkId(2)), ObjectId::from(NodeId(1))] };
        assert!(!a.has_changed(&b));
        assert!(a.has_changed(&c));
        let d = SelectionState { objects: vec![ObjectId::from(PinId(1)), ObjectId::from(LinkId(2))] };
        assert!(!a.has_changed(&d));
    }

    #[test]
    fn view_state_survives_json() {
        let view = ViewState::from_runtime(egui::vec2(-4.0, 8.0), 1.5, Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(100.0, 50.0)), "dark");
        let text = serde_json::to_string(&view).expect("serialize");
        let back: ViewState = serde_json::from_str(&text).expect("deserialize");
        assert!(!view.has_changed(&back));
        assert_eq!(back.visible_rect().width(), 100.0);
    }
}
