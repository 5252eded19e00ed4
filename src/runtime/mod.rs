pub mod render_loop;
pub mod renderer;
pub mod scheduler;
pub mod surface;
