use crate::{foundation::core::Raster, foundation::error::QuiltResult, scene::graph::SceneGraph};

pub mod camera;
pub mod raycast;

use camera::PerspectiveCamera;

/// Renders one view of a scene graph.
///
/// `prepare` runs once per quilt and syncs canvas textures; `render_view` is then called
/// for every camera position against the unchanged scene.
pub trait SceneRenderer {
    fn prepare(&mut self, scene: &mut SceneGraph) -> QuiltResult<()>;

    fn render_view(
        &self,
        scene: &SceneGraph,
        camera: &PerspectiveCamera,
        width: u32,
        height: u32,
    ) -> QuiltResult<Raster>;
}
