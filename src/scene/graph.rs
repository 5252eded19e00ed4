use glam::{EulerRot, Mat4, Quat, Vec3};

use crate::raster::canvas::Canvas2D;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub(crate) usize);

/// Local transform; rotation is an XYZ Euler triple in radians.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform3 {
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for Transform3 {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl Transform3 {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    pub fn matrix(&self) -> Mat4 {
        let rotation = Quat::from_euler(
            EulerRot::XYZ,
            self.rotation.x,
            self.rotation.y,
            self.rotation.z,
        );
        Mat4::from_scale_rotation_translation(self.scale, rotation, self.position)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Geometry {
    /// Rectangle in the local XY plane, centered on the origin, facing +Z.
    Plane { width: f32, height: f32 },
    /// Disc in the local XY plane, facing +Z.
    Circle { radius: f32 },
    Sphere { radius: f32 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shading {
    /// Texture/color only.
    Unlit,
    /// Diffuse lighting plus emissive.
    Lit,
}

/// Surface properties; colors are linear `[0, 1]` RGB.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Material {
    pub shading: Shading,
    pub color: Vec3,
    pub map: Option<TextureId>,
    pub emissive: Vec3,
    pub emissive_intensity: f32,
    pub opacity: f32,
    pub transparent: bool,
    pub depth_write: bool,
    pub double_sided: bool,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            shading: Shading::Lit,
            color: Vec3::ONE,
            map: None,
            emissive: Vec3::ZERO,
            emissive_intensity: 1.0,
            opacity: 1.0,
            transparent: false,
            depth_write: true,
            double_sided: false,
        }
    }
}

/// `0xRRGGBB` to `[0, 1]` RGB.
pub fn rgb_hex(rgb: u32) -> Vec3 {
    Vec3::new(
        ((rgb >> 16) & 0xff) as f32 / 255.0,
        ((rgb >> 8) & 0xff) as f32 / 255.0,
        (rgb & 0xff) as f32 / 255.0,
    )
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum NodeKind {
    Group,
    Mesh {
        geometry: Geometry,
        material: Material,
    },
}

#[derive(Clone, Debug)]
pub struct Node {
    pub name: String,
    pub kind: NodeKind,
    pub transform: Transform3,
    pub parent: Option<NodeId>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AmbientLight {
    pub color: Vec3,
    pub intensity: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointLight {
    pub color: Vec3,
    pub intensity: f32,
    pub position: Vec3,
}

/// Flat node arena with parent links; textures are canvases owned by the graph.
#[derive(Clone, Debug)]
pub struct SceneGraph {
    pub background: Vec3,
    pub ambient: AmbientLight,
    pub point: Option<PointLight>,
    nodes: Vec<Node>,
    textures: Vec<Canvas2D>,
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self {
            background: Vec3::ZERO,
            ambient: AmbientLight {
                color: Vec3::ONE,
                intensity: 0.0,
            },
            point: None,
            nodes: Vec::new(),
            textures: Vec::new(),
        }
    }
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_group(
        &mut self,
        name: impl Into<String>,
        transform: Transform3,
        parent: Option<NodeId>,
    ) -> NodeId {
        self.push(Node {
            name: name.into(),
            kind: NodeKind::Group,
            transform,
            parent,
        })
    }

    pub fn add_mesh(
        &mut self,
        name: impl Into<String>,
        geometry: Geometry,
        material: Material,
        transform: Transform3,
        parent: Option<NodeId>,
    ) -> NodeId {
        self.push(Node {
            name: name.into(),
            kind: NodeKind::Mesh { geometry, material },
            transform,
            parent,
        })
    }

    fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    pub fn add_texture(&mut self, canvas: Canvas2D) -> TextureId {
        let id = TextureId(self.textures.len());
        self.textures.push(canvas);
        id
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.nodes.iter().position(|n| n.name == name).map(NodeId)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn texture(&self, id: TextureId) -> &Canvas2D {
        &self.textures[id.0]
    }

    pub fn texture_mut(&mut self, id: TextureId) -> &mut Canvas2D {
        &mut self.textures[id.0]
    }

    pub fn texture_ids(&self) -> impl Iterator<Item = TextureId> {
        (0..self.textures.len()).map(TextureId)
    }

    /// Local-to-world matrix including every ancestor.
    pub fn world_matrix(&self, id: NodeId) -> Mat4 {
        let node = self.node(id);
        let local = node.transform.matrix();
        match node.parent {
            Some(parent) => self.world_matrix(parent) * local,
            None => local,
        }
    }

    /// Every mesh with its world matrix, in insertion order.
    pub fn meshes(&self) -> impl Iterator<Item = (NodeId, Geometry, Material, Mat4)> + '_ {
        self.nodes.iter().enumerate().filter_map(|(i, n)| match n.kind {
            NodeKind::Mesh { geometry, material } => {
                let id = NodeId(i);
                Some((id, geometry, material, self.world_matrix(id)))
            }
            NodeKind::Group => None,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/graph.rs"]
mod tests;
