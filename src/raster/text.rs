use std::sync::Arc;

use crate::foundation::error::{QuiltError, QuiltResult};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// RGBA8 brush color used by Parley text layout.
pub struct TextBrushRgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

/// Font bytes shared between layout (parley) and glyph rendering (vello_cpu).
#[derive(Clone)]
pub struct FontSource {
    bytes: Arc<Vec<u8>>,
}

impl std::fmt::Debug for FontSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontSource")
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl FontSource {
    pub fn from_bytes(bytes: Vec<u8>) -> QuiltResult<Self> {
        if bytes.is_empty() {
            return Err(QuiltError::validation("font data is empty"));
        }
        Ok(Self {
            bytes: Arc::new(bytes),
        })
    }

    pub fn load(path: &std::path::Path) -> QuiltResult<Self> {
        use anyhow::Context as _;
        let bytes = std::fs::read(path)
            .with_context(|| format!("read font '{}'", path.display()))?;
        Self::from_bytes(bytes)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Stateful helper for building Parley text layouts from raw font bytes.
pub struct TextLayoutEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrushRgba8>,
    family_name: Option<String>,
}

impl Default for TextLayoutEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TextLayoutEngine {
    pub fn new() -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
            family_name: None,
        }
    }

    /// Register `font` once; later calls reuse the resolved family.
    fn family_for(&mut self, font: &FontSource) -> QuiltResult<String> {
        if let Some(name) = &self.family_name {
            return Ok(name.clone());
        }
        let families = self
            .font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(font.bytes().to_vec()), None);
        let family_id = families
            .first()
            .map(|(id, _)| *id)
            .ok_or_else(|| QuiltError::validation("no font families registered from font bytes"))?;

        let family_name = self
            .font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| QuiltError::validation("registered font family has no name"))?
            .to_string();
        self.family_name = Some(family_name.clone());
        Ok(family_name)
    }

    /// Shape a single unwrapped line.
    pub fn layout_line(
        &mut self,
        text: &str,
        font: &FontSource,
        size_px: f32,
        brush: TextBrushRgba8,
    ) -> QuiltResult<parley::Layout<TextBrushRgba8>> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(QuiltError::validation(
                "text size_px must be finite and > 0",
            ));
        }
        let family_name = self.family_for(font)?;

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(family_name)),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::Brush(brush));

        let mut layout: parley::Layout<TextBrushRgba8> = builder.build(text);
        layout.break_all_lines(None);
        Ok(layout)
    }
}
