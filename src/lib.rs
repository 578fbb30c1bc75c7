pub mod actions;
pub mod editor;
pub mod graph_utils;
pub mod persistence;

pub use editor::context::{CreateItem, EditorContext, ItemQuery, MenuTarget, Shortcut};
pub use editor::input::{InputState, MouseButton};
pub use graph_utils::ids::{LinkId, NodeId, ObjectId, PinId};
pub use persistence::settings::EditorConfig;
