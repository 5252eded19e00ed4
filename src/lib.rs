//! quiltlens renders a small 3D scene for a multi-view lenticular panel on the CPU.
//!
//! The pipeline has two stages:
//!
//! - A [`QuiltGenerator`] renders the scene from 40 cameras spread along a horizontal arc
//!   and packs the views into an 8x5 [`QuiltImage`].
//! - A [`LenticularCompositor`] interlaces the quilt: every output subpixel samples the view
//!   that the panel's slanted lenticules direct toward the viewer at that position.
//!
//! [`LenticularRenderer`] ties both stages to a [`ParamStore`], the live debug controls and a
//! [`FrameScheduler`]-driven loop; [`DeferredRenderer`] postpones construction until the host
//! can provide fonts.
#![forbid(unsafe_code)]

pub mod compositor;
pub mod foundation;
pub mod params;
pub mod quilt;
pub mod raster;
pub mod render;
pub mod runtime;
pub mod scene;

pub use crate::compositor::LenticularCompositor;
pub use crate::foundation::core::{Raster, Rgba8, Rgba8Premul};
pub use crate::foundation::error::{QuiltError, QuiltResult};
pub use crate::params::config::{
    CameraSweepConfig, OpticalConfig, SceneElement, SceneElementPlacement,
};
pub use crate::params::control::{ControlCommand, ControlSender, DebugControl};
pub use crate::params::store::{JsonFileKv, KvBackend, MemoryKv, ParamKey, ParamStore};
pub use crate::quilt::{QuiltGenerator, QuiltImage, QuiltLayout};
pub use crate::raster::text::FontSource;
pub use crate::render::{SceneRenderer, raycast::CpuSceneRenderer};
pub use crate::runtime::render_loop::{LoopState, TickPlan};
pub use crate::runtime::renderer::{
    Capabilities, CapabilityProbe, DeferredRenderer, FontFileProbe, LenticularRenderer,
    RendererOptions,
};
pub use crate::runtime::scheduler::{FrameScheduler, FrameToken, ManualScheduler};
pub use crate::runtime::surface::RenderSurfaceState;
pub use crate::scene::builder::QuiltScene;
pub use crate::scene::timer::format_focus_timer;
