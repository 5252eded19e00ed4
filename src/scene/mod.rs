pub mod builder;
pub mod glow_ring;
pub mod graph;
pub mod timer;
