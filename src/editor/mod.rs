pub mod animation;
pub mod context;
pub mod control;
pub mod input;
pub mod selection;
pub mod state;
pub mod view;
