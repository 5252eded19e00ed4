use std::collections::BTreeMap;

use glam::Vec3;

use crate::{
    foundation::core::Rgba8,
    params::config::{SceneElement, SceneElementPlacement},
    raster::canvas::{Canvas2D, TextRun, TextShadow},
    scene::{
        glow_ring::glow_ring_canvas,
        graph::{
            AmbientLight, Geometry, Material, NodeId, PointLight, SceneGraph, Shading,
            TextureId, Transform3, rgb_hex,
        },
        timer::{TIMER_DIGITS, timer_glyphs},
    },
};

pub const DISC_RADIUS: f32 = 100.0;
/// Disc rotation per tick, radians.
pub const DISC_SPIN_STEP: f32 = 0.03;

pub const LABEL_SIZE: (f32, f32) = (250.0, 64.0);
pub const LABEL_CANVAS: (u32, u32) = (512, 128);
pub const LABEL_FONT_PX: f32 = 42.0;
pub const INITIAL_LABEL: &str = "任务名称";

pub const DIGIT_SIZE: (f32, f32) = (25.0, 50.0);
pub const DIGIT_CANVAS: (u32, u32) = (256, 512);
pub const DIGIT_FONT_PX: f32 = 280.0;
pub const DIGIT_OFFSETS: [f32; TIMER_DIGITS] = [-63.0, -45.0, -9.0, 9.0, 45.0, 63.0];

pub const COLON_RADIUS: f32 = 1.5;
pub const COLON_OFFSETS: [(f32, f32); 4] = [(-27.0, 6.0), (-27.0, -6.0), (27.0, 6.0), (27.0, -6.0)];

/// Small y tilt on the text planes.
pub const TEXT_PLANE_TILT: f32 = 0.01;

const LABEL_EMISSIVE: u32 = 0x2a3550;
const DIGIT_EMISSIVE: u32 = 0x4488ff;
const TEXT_EMISSIVE_INTENSITY: f32 = 0.2;
const TEXT_OPACITY: f32 = 0.95;
const COLON_OPACITY: f32 = 0.9;

fn label_run(text: &str) -> TextRun {
    TextRun {
        text: text.to_owned(),
        anchor: (LABEL_CANVAS.0 as f32 / 2.0, LABEL_CANVAS.1 as f32 / 2.0),
        size_px: LABEL_FONT_PX,
        color: Rgba8::WHITE,
        shadow: Some(TextShadow {
            color: Rgba8::from_hex(0xffffff, 0.6),
            blur: 6.0,
        }),
    }
}

fn digit_run(glyph: char) -> TextRun {
    TextRun {
        text: glyph.to_string(),
        anchor: (DIGIT_CANVAS.0 as f32 / 2.0, DIGIT_CANVAS.1 as f32 / 2.0),
        size_px: DIGIT_FONT_PX,
        color: Rgba8::WHITE,
        shadow: Some(TextShadow {
            color: Rgba8::from_hex(0xffffff, 0.8),
            blur: 16.0,
        }),
    }
}

fn placed(placement: SceneElementPlacement) -> Transform3 {
    Transform3 {
        position: placement.scene_position(),
        rotation: Vec3::ZERO,
        scale: Vec3::splat(placement.scale),
    }
}

fn text_material(map: TextureId, emissive: u32) -> Material {
    Material {
        shading: Shading::Lit,
        map: Some(map),
        emissive: rgb_hex(emissive),
        emissive_intensity: TEXT_EMISSIVE_INTENSITY,
        opacity: TEXT_OPACITY,
        transparent: true,
        depth_write: false,
        double_sided: true,
        ..Material::default()
    }
}

/// The fixed scene rendered into every quilt view.
///
/// Owns the graph plus handles to the nodes and canvases that change at runtime.
#[derive(Clone, Debug)]
pub struct QuiltScene {
    graph: SceneGraph,
    disc: NodeId,
    label: NodeId,
    timer: NodeId,
    digits: [NodeId; TIMER_DIGITS],
    label_canvas: TextureId,
    digit_canvases: [TextureId; TIMER_DIGITS],
    placements: BTreeMap<SceneElement, SceneElementPlacement>,
}

impl QuiltScene {
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn build(placements: &[(SceneElement, SceneElementPlacement)]) -> Self {
        let mut resolved: BTreeMap<SceneElement, SceneElementPlacement> = SceneElement::ALL
            .iter()
            .map(|e| (*e, SceneElementPlacement::default_for(*e)))
            .collect();
        for (element, placement) in placements {
            resolved.insert(*element, sanitize(*element, *placement));
        }

        let mut graph = SceneGraph::new();
        graph.background = Vec3::ZERO;
        graph.ambient = AmbientLight {
            color: Vec3::ONE,
            intensity: 0.5,
        };
        graph.point = Some(PointLight {
            color: Vec3::ONE,
            intensity: 1.0,
            position: Vec3::new(100.0, 100.0, 200.0),
        });

        let ring = graph.add_texture(glow_ring_canvas());
        let disc = graph.add_mesh(
            "disc",
            Geometry::Circle {
                radius: DISC_RADIUS,
            },
            Material {
                shading: Shading::Unlit,
                map: Some(ring),
                transparent: true,
                depth_write: true,
                double_sided: true,
                ..Material::default()
            },
            placed(resolved[&SceneElement::GlowDisc]),
            None,
        );

        let mut label_canvas = Canvas2D::new(LABEL_CANVAS.0, LABEL_CANVAS.1);
        label_canvas.fill_text(label_run(INITIAL_LABEL));
        let label_canvas = graph.add_texture(label_canvas);
        let mut label_transform = placed(resolved[&SceneElement::LabelCard]);
        label_transform.rotation.y = TEXT_PLANE_TILT;
        let label = graph.add_mesh(
            "taskNameCard",
            Geometry::Plane {
                width: LABEL_SIZE.0,
                height: LABEL_SIZE.1,
            },
            text_material(label_canvas, LABEL_EMISSIVE),
            label_transform,
            None,
        );

        let timer = graph.add_group("timerGroup", placed(resolved[&SceneElement::TimerGroup]), None);
        let slots: [(NodeId, TextureId); TIMER_DIGITS] = std::array::from_fn(|i| {
            let mut canvas = Canvas2D::new(DIGIT_CANVAS.0, DIGIT_CANVAS.1);
            canvas.fill_text(digit_run('0'));
            let tex = graph.add_texture(canvas);
            let node = graph.add_mesh(
                format!("timerDigit{i}"),
                Geometry::Plane {
                    width: DIGIT_SIZE.0,
                    height: DIGIT_SIZE.1,
                },
                text_material(tex, DIGIT_EMISSIVE),
                Transform3 {
                    position: Vec3::new(DIGIT_OFFSETS[i], 0.0, 0.0),
                    rotation: Vec3::new(0.0, TEXT_PLANE_TILT, 0.0),
                    scale: Vec3::ONE,
                },
                Some(timer),
            );
            (node, tex)
        });

        let colon = Material {
            shading: Shading::Lit,
            color: Vec3::ONE,
            emissive: Vec3::ONE,
            emissive_intensity: 1.0,
            opacity: COLON_OPACITY,
            transparent: true,
            depth_write: false,
            ..Material::default()
        };
        for (i, (x, y)) in COLON_OFFSETS.iter().enumerate() {
            graph.add_mesh(
                format!("timerColon{i}"),
                Geometry::Sphere {
                    radius: COLON_RADIUS,
                },
                colon,
                Transform3::at(Vec3::new(*x, *y, 0.0)),
                Some(timer),
            );
        }

        tracing::debug!(nodes = graph.len(), "quilt scene built");

        Self {
            graph,
            disc,
            label,
            timer,
            digits: slots.map(|(node, _)| node),
            label_canvas,
            digit_canvases: slots.map(|(_, tex)| tex),
            placements: resolved,
        }
    }

    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut SceneGraph {
        &mut self.graph
    }

    pub fn disc(&self) -> NodeId {
        self.disc
    }

    pub fn label(&self) -> NodeId {
        self.label
    }

    pub fn timer_group(&self) -> NodeId {
        self.timer
    }

    pub fn digits(&self) -> &[NodeId; TIMER_DIGITS] {
        &self.digits
    }

    pub fn label_canvas(&self) -> &Canvas2D {
        self.graph.texture(self.label_canvas)
    }

    pub fn digit_canvas(&self, index: usize) -> &Canvas2D {
        self.graph.texture(self.digit_canvases[index])
    }

    /// Repaint the label card with `text`; prior text is erased.
    pub fn update_label_text(&mut self, text: &str) {
        let canvas = self.graph.texture_mut(self.label_canvas);
        canvas.clear();
        canvas.fill_text(label_run(text));
    }

    /// Repaint all six digit planes from a display string such as `"01:23:45"`.
    pub fn update_timer_text(&mut self, display: &str) {
        let glyphs = timer_glyphs(display);
        for (tex, glyph) in self.digit_canvases.iter().zip(glyphs) {
            let canvas = self.graph.texture_mut(*tex);
            canvas.clear();
            canvas.fill_text(digit_run(glyph));
        }
    }

    pub fn rotate_disc(&mut self, step: f32) {
        self.graph.node_mut(self.disc).transform.rotation.z += step;
    }

    pub fn disc_rotation(&self) -> f32 {
        self.graph.node(self.disc).transform.rotation.z
    }

    /// Move and rescale a live element. Rotation is left untouched.
    pub fn apply_placement(&mut self, element: SceneElement, placement: SceneElementPlacement) {
        let placement = sanitize(element, placement);
        let node = self.node_for(element);
        let transform = &mut self.graph.node_mut(node).transform;
        transform.position = placement.scene_position();
        transform.scale = Vec3::splat(placement.scale);
        self.placements.insert(element, placement);
    }

    pub fn placement(&self, element: SceneElement) -> SceneElementPlacement {
        self.placements
            .get(&element)
            .copied()
            .unwrap_or_else(|| SceneElementPlacement::default_for(element))
    }

    pub fn node_for(&self, element: SceneElement) -> NodeId {
        match element {
            SceneElement::GlowDisc => self.disc,
            SceneElement::LabelCard => self.label,
            SceneElement::TimerGroup => self.timer,
        }
    }
}

/// Non-finite components fall back to the element's defaults.
fn sanitize(element: SceneElement, p: SceneElementPlacement) -> SceneElementPlacement {
    let d = SceneElementPlacement::default_for(element);
    let pick = |v: f32, fallback: f32| if v.is_finite() { v } else { fallback };
    SceneElementPlacement {
        y: pick(p.y, d.y),
        z: pick(p.z, d.z),
        scale: pick(p.scale, d.scale),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/builder.rs"]
mod tests;
