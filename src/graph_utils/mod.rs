pub mod geometry;
pub mod graph;
pub mod ids;
pub mod objects;
