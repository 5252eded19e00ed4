use crate::foundation::core::Rgba8;

/// Stroke of a circular arc, angles in radians measured clockwise from +x in canvas space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ArcStroke {
    pub center: (f32, f32),
    pub radius: f32,
    pub start_angle: f32,
    pub end_angle: f32,
    pub width: f32,
    pub color: Rgba8,
}

/// Blurred copy of the glyph coverage drawn beneath the text.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextShadow {
    pub color: Rgba8,
    pub blur: f32,
}

/// Single line of text, centered horizontally and vertically on `anchor`.
#[derive(Clone, Debug, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub anchor: (f32, f32),
    pub size_px: f32,
    pub color: Rgba8,
    pub shadow: Option<TextShadow>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum DrawCmd {
    StrokeArc(ArcStroke),
    FillText(TextRun),
}

/// Re-drawable 2D surface backing a texture.
///
/// The surface is kept as a display list over a transparent background. Every mutation
/// bumps the revision; a texture consumer re-rasterizes while `needs_upload()` holds.
#[derive(Clone, Debug)]
pub struct Canvas2D {
    width: u32,
    height: u32,
    commands: Vec<DrawCmd>,
    revision: u64,
    uploaded: Option<u64>,
}

impl Canvas2D {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            commands: Vec::new(),
            revision: 0,
            uploaded: None,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Erase everything back to transparent.
    pub fn clear(&mut self) {
        self.commands.clear();
        self.revision += 1;
    }

    pub fn stroke_arc(&mut self, arc: ArcStroke) {
        self.commands.push(DrawCmd::StrokeArc(arc));
        self.revision += 1;
    }

    pub fn fill_text(&mut self, run: TextRun) {
        self.commands.push(DrawCmd::FillText(run));
        self.revision += 1;
    }

    pub fn commands(&self) -> &[DrawCmd] {
        &self.commands
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn needs_upload(&self) -> bool {
        self.uploaded != Some(self.revision)
    }

    pub fn mark_uploaded(&mut self, revision: u64) {
        self.uploaded = Some(revision);
    }

    /// Texts currently drawn, in paint order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().filter_map(|c| match c {
            DrawCmd::FillText(run) => Some(run.text.as_str()),
            DrawCmd::StrokeArc(_) => None,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/raster/canvas.rs"]
mod tests;
