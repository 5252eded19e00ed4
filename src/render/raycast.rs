use std::{collections::HashMap, sync::Arc};

use glam::{Mat3, Mat4, Vec2, Vec3};
use rayon::prelude::*;

use crate::{
    foundation::{
        core::{Raster, unit_to_u8},
        error::{QuiltError, QuiltResult},
    },
    raster::{
        cpu::{CpuRasterizer, Rasterizer2D},
        text::FontSource,
    },
    render::{
        SceneRenderer,
        camera::{PerspectiveCamera, Ray},
    },
    scene::graph::{Geometry, Material, SceneGraph, Shading, TextureId},
};

const EPS: f32 = 1e-6;

#[derive(Clone, Copy, Debug)]
struct Hit {
    depth: f32,
    point: Vec3,
    normal: Vec3,
    uv: Vec2,
}

/// Straight color plus coverage.
#[derive(Clone, Copy, Debug)]
struct Shaded {
    rgb: Vec3,
    alpha: f32,
}

#[derive(Clone, Debug)]
struct Primitive {
    geometry: Geometry,
    local_from_world: Mat4,
    normal_to_world: Mat3,
    material: Material,
    texture: Option<Arc<Raster>>,
    sort_depth: f32,
}

impl Primitive {
    fn intersect(&self, ray: &Ray, forward: Vec3) -> Option<Hit> {
        let o = self.local_from_world.transform_point3(ray.origin);
        let d = self.local_from_world.transform_vector3(ray.direction);

        let (t, local_normal, uv) = match self.geometry {
            Geometry::Plane { width, height } => {
                let (t, p) = hit_xy_plane(o, d)?;
                if p.x.abs() > width * 0.5 || p.y.abs() > height * 0.5 {
                    return None;
                }
                (t, Vec3::Z, Vec2::new(p.x / width + 0.5, p.y / height + 0.5))
            }
            Geometry::Circle { radius } => {
                let (t, p) = hit_xy_plane(o, d)?;
                if p.x * p.x + p.y * p.y > radius * radius {
                    return None;
                }
                let diameter = 2.0 * radius;
                (
                    t,
                    Vec3::Z,
                    Vec2::new(p.x / diameter + 0.5, p.y / diameter + 0.5),
                )
            }
            Geometry::Sphere { radius } => {
                let a = d.dot(d);
                let b = o.dot(d);
                let c = o.dot(o) - radius * radius;
                let disc = b * b - a * c;
                if disc < 0.0 || a <= EPS {
                    return None;
                }
                let sq = disc.sqrt();
                let t0 = (-b - sq) / a;
                let t1 = (-b + sq) / a;
                let t = if t0 > EPS {
                    t0
                } else if t1 > EPS {
                    t1
                } else {
                    return None;
                };
                let p = o + d * t;
                let n = p / radius;
                let uv = Vec2::new(
                    0.5 + n.z.atan2(n.x) / std::f32::consts::TAU,
                    0.5 + n.y.clamp(-1.0, 1.0).asin() / std::f32::consts::PI,
                );
                (t, n, uv)
            }
        };

        let point = ray.at(t);
        let depth = (point - ray.origin).dot(forward);
        let mut normal = (self.normal_to_world * local_normal).normalize_or_zero();
        if normal.dot(ray.direction) > 0.0 {
            if !self.material.double_sided {
                return None;
            }
            normal = -normal;
        }
        Some(Hit {
            depth,
            point,
            normal,
            uv,
        })
    }

    fn shade(&self, hit: &Hit, lights: &Lighting) -> Option<Shaded> {
        let m = &self.material;
        let (texel, texel_alpha) = match (m.map, &self.texture) {
            (Some(_), Some(tex)) => {
                let [r, g, b, a] = tex.sample_bilinear(hit.uv.x, 1.0 - hit.uv.y);
                let straight = if a > 0.0 {
                    Vec3::new(r, g, b) / a
                } else {
                    Vec3::ZERO
                };
                (straight, a)
            }
            (Some(_), None) => return None,
            (None, _) => (Vec3::ONE, 1.0),
        };

        let albedo = texel * m.color;
        let rgb = match m.shading {
            Shading::Unlit => albedo,
            Shading::Lit => {
                albedo * lights.irradiance(hit.point, hit.normal)
                    + m.emissive * m.emissive_intensity
            }
        };
        Some(Shaded {
            rgb: rgb.clamp(Vec3::ZERO, Vec3::ONE),
            alpha: (texel_alpha * m.opacity).clamp(0.0, 1.0),
        })
    }
}

/// Ray hit against the local z = 0 plane.
fn hit_xy_plane(o: Vec3, d: Vec3) -> Option<(f32, Vec3)> {
    if d.z.abs() <= EPS {
        return None;
    }
    let t = -o.z / d.z;
    if t.is_nan() || t <= EPS {
        return None;
    }
    Some((t, o + d * t))
}

#[derive(Clone, Copy, Debug)]
struct Lighting {
    ambient: Vec3,
    point: Option<(Vec3, Vec3)>,
}

impl Lighting {
    fn from_scene(scene: &SceneGraph) -> Self {
        Self {
            ambient: scene.ambient.color * scene.ambient.intensity,
            point: scene.point.map(|p| (p.position, p.color * p.intensity)),
        }
    }

    /// Ambient plus Lambert term; point lights do not attenuate.
    fn irradiance(&self, point: Vec3, normal: Vec3) -> Vec3 {
        let mut e = self.ambient;
        if let Some((pos, radiance)) = self.point {
            let l = (pos - point).normalize_or_zero();
            e += radiance * normal.dot(l).max(0.0);
        }
        e
    }
}

/// CPU ray caster for the quilt scene.
///
/// Opaque meshes resolve to the nearest hit. Transparent meshes are blended back to front
/// by object depth, each depth-tested against what has been written so far; only meshes
/// with `depth_write` update the depth buffer.
pub struct CpuSceneRenderer {
    rasterizer: Box<dyn Rasterizer2D>,
    textures: HashMap<TextureId, Arc<Raster>>,
}

impl std::fmt::Debug for CpuSceneRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CpuSceneRenderer")
            .field("textures", &self.textures.len())
            .finish()
    }
}

impl CpuSceneRenderer {
    pub fn new(rasterizer: Box<dyn Rasterizer2D>) -> Self {
        Self {
            rasterizer,
            textures: HashMap::new(),
        }
    }

    pub fn with_font(font: Option<FontSource>) -> Self {
        Self::new(Box::new(CpuRasterizer::new(font)))
    }

    /// Last successfully rasterized pixels for a canvas.
    pub fn texture(&self, id: TextureId) -> Option<&Arc<Raster>> {
        self.textures.get(&id)
    }

    fn primitives(
        &self,
        scene: &SceneGraph,
        camera: &PerspectiveCamera,
    ) -> (Vec<Primitive>, Vec<Primitive>) {
        let mut opaque = Vec::new();
        let mut transparent = Vec::new();
        for (_, geometry, material, world) in scene.meshes() {
            if world.determinant().abs() <= f32::EPSILON {
                continue;
            }
            let local_from_world = world.inverse();
            let prim = Primitive {
                geometry,
                local_from_world,
                normal_to_world: Mat3::from_mat4(local_from_world).transpose(),
                material,
                texture: material.map.and_then(|id| self.textures.get(&id).cloned()),
                sort_depth: camera.view_depth(world.transform_point3(Vec3::ZERO)),
            };
            if material.transparent {
                transparent.push(prim);
            } else {
                opaque.push(prim);
            }
        }
        transparent.sort_by(|a, b| b.sort_depth.total_cmp(&a.sort_depth));
        (opaque, transparent)
    }
}

struct ViewPass<'a> {
    opaque: &'a [Primitive],
    transparent: &'a [Primitive],
    lights: Lighting,
    background: Vec3,
    forward: Vec3,
    near: f32,
    far: f32,
}

impl ViewPass<'_> {
    fn in_range(&self, hit: &Hit) -> bool {
        hit.depth >= self.near && hit.depth <= self.far
    }

    fn trace(&self, ray: &Ray) -> Vec3 {
        let mut color = self.background;
        let mut depth = f32::INFINITY;

        let mut nearest: Option<(f32, Shaded)> = None;
        for prim in self.opaque {
            let Some(hit) = prim.intersect(ray, self.forward) else {
                continue;
            };
            if !self.in_range(&hit) || nearest.is_some_and(|(d, _)| hit.depth > d) {
                continue;
            }
            if let Some(s) = prim.shade(&hit, &self.lights) {
                nearest = Some((hit.depth, s));
            }
        }
        if let Some((d, s)) = nearest {
            color = s.rgb;
            depth = d;
        }

        for prim in self.transparent {
            let Some(hit) = prim.intersect(ray, self.forward) else {
                continue;
            };
            if !self.in_range(&hit) || hit.depth > depth {
                continue;
            }
            let Some(s) = prim.shade(&hit, &self.lights) else {
                continue;
            };
            color = s.rgb * s.alpha + color * (1.0 - s.alpha);
            if prim.material.depth_write {
                depth = hit.depth;
            }
        }
        color
    }
}

impl SceneRenderer for CpuSceneRenderer {
    #[tracing::instrument(level = "debug", skip_all)]
    fn prepare(&mut self, scene: &mut SceneGraph) -> QuiltResult<()> {
        let ids: Vec<TextureId> = scene.texture_ids().collect();
        for id in ids {
            let canvas = scene.texture(id);
            if !canvas.needs_upload() && self.textures.contains_key(&id) {
                continue;
            }
            let revision = canvas.revision();
            match self.rasterizer.rasterize(canvas) {
                Ok(raster) => {
                    self.textures.insert(id, Arc::new(raster));
                }
                Err(err) => {
                    tracing::warn!(?id, error = %err, "canvas rasterization failed, keeping last texture");
                }
            }
            scene.texture_mut(id).mark_uploaded(revision);
        }
        Ok(())
    }

    fn render_view(
        &self,
        scene: &SceneGraph,
        camera: &PerspectiveCamera,
        width: u32,
        height: u32,
    ) -> QuiltResult<Raster> {
        if width == 0 || height == 0 {
            return Err(QuiltError::render("view size must be non-zero"));
        }
        let (opaque, transparent) = self.primitives(scene, camera);
        let pass = ViewPass {
            opaque: &opaque,
            transparent: &transparent,
            lights: Lighting::from_scene(scene),
            background: scene.background,
            forward: camera.forward(),
            near: camera.near,
            far: camera.far,
        };
        let rays = camera.pixel_rays(width, height);

        let mut out = Raster::try_new(width, height)?;
        let stride = out.stride();
        out.data_mut()
            .par_chunks_mut(stride)
            .enumerate()
            .for_each(|(y, row)| {
                for (x, px) in row.chunks_exact_mut(4).enumerate() {
                    let c = pass.trace(&rays.ray(x as u32, y as u32));
                    px.copy_from_slice(&[unit_to_u8(c.x), unit_to_u8(c.y), unit_to_u8(c.z), 255]);
                }
            });
        Ok(out)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/raycast.rs"]
mod tests;
