use std::{path::PathBuf, time::Duration};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use quiltlens::{
    CameraSweepConfig, Capabilities, CapabilityProbe, ControlCommand, DebugControl,
    DeferredRenderer, FontFileProbe, FontSource, LenticularRenderer, ManualScheduler, ParamKey,
    ParamStore, RenderSurfaceState, RendererOptions, format_focus_timer,
    params::control::ControlTarget,
};

#[derive(Parser, Debug)]
#[command(name = "quiltlens", version, about = "Quilt renderer for lenticular panels")]
struct Cli {
    /// JSON parameter store; in-memory defaults when omitted.
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render the 8x5 quilt as a PNG.
    Quilt(QuiltArgs),
    /// Render one interlaced frame as a PNG.
    Frame(FrameArgs),
    /// Drive the frame loop headlessly and write the last frame.
    Run(RunArgs),
    /// Inspect or change persisted parameters.
    #[command(subcommand)]
    Params(ParamsCommand),
}

#[derive(Args, Debug)]
struct SceneArgs {
    /// Font used for the label and timer glyphs.
    #[arg(long)]
    font: Option<PathBuf>,

    /// Label card text.
    #[arg(long)]
    label: Option<String>,

    /// Timer display, e.g. 00:25:00.
    #[arg(long)]
    timer: Option<String>,

    #[arg(long, default_value_t = 450)]
    tile_width: u32,

    #[arg(long, default_value_t = 800)]
    tile_height: u32,

    /// Reverse the view order of the interlacing.
    #[arg(long)]
    invert_views: bool,
}

impl SceneArgs {
    fn options(&self) -> RendererOptions {
        RendererOptions {
            tile_width: self.tile_width,
            tile_height: self.tile_height,
            invert_views: self.invert_views,
        }
    }

    fn load_font(&self) -> anyhow::Result<Option<FontSource>> {
        match &self.font {
            Some(path) => Ok(Some(FontSource::load(path)?)),
            None => {
                tracing::warn!("no --font given, text planes will be empty");
                Ok(None)
            }
        }
    }
}

#[derive(Args, Debug)]
struct SurfaceArgs {
    /// Logical window width.
    #[arg(long, default_value_t = 1440.0)]
    width: f32,

    /// Logical window height.
    #[arg(long, default_value_t = 2560.0)]
    height: f32,

    /// Device pixel ratio.
    #[arg(long, default_value_t = 1.0)]
    dpr: f32,
}

impl SurfaceArgs {
    fn surface(&self) -> RenderSurfaceState {
        RenderSurfaceState::new(self.width, self.height, self.dpr)
    }
}

#[derive(Args, Debug)]
struct QuiltArgs {
    #[command(flatten)]
    scene: SceneArgs,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Args, Debug)]
struct FrameArgs {
    #[command(flatten)]
    scene: SceneArgs,

    #[command(flatten)]
    surface: SurfaceArgs,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Args, Debug)]
struct RunArgs {
    #[command(flatten)]
    scene: SceneArgs,

    #[command(flatten)]
    surface: SurfaceArgs,

    /// Number of frame callbacks to deliver.
    #[arg(long, default_value_t = 30)]
    frames: u32,

    /// Simulated refresh rate.
    #[arg(long, default_value_t = 60.0)]
    fps: f64,

    /// Focus timer value at the first frame, seconds.
    #[arg(long, default_value_t = 0)]
    timer_start: u64,

    /// Output PNG path for the last frame.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Subcommand, Debug)]
enum ParamsCommand {
    /// Print every parameter.
    List,
    /// Print one parameter by store key or control id.
    Get { name: String },
    /// Set a parameter by store key or control id.
    Set { name: String, value: String },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let store = open_store(cli.store.as_ref())?;
    match cli.cmd {
        Command::Quilt(args) => cmd_quilt(store, args),
        Command::Frame(args) => cmd_frame(store, args),
        Command::Run(args) => cmd_run(store, args),
        Command::Params(cmd) => cmd_params(store, cmd),
    }
}

fn open_store(path: Option<&PathBuf>) -> anyhow::Result<ParamStore> {
    match path {
        Some(p) => ParamStore::open_json(p)
            .with_context(|| format!("open parameter store '{}'", p.display())),
        None => Ok(ParamStore::in_memory()),
    }
}

fn build_renderer(
    store: ParamStore,
    scene: &SceneArgs,
    surface: RenderSurfaceState,
) -> anyhow::Result<LenticularRenderer<ManualScheduler>> {
    let mut renderer = LenticularRenderer::with_font(
        store,
        surface,
        ManualScheduler::new(),
        scene.load_font()?,
        scene.options(),
    )?;
    apply_text(&mut renderer, scene);
    Ok(renderer)
}

fn apply_text(renderer: &mut LenticularRenderer<ManualScheduler>, scene: &SceneArgs) {
    if let Some(label) = &scene.label {
        renderer.update_label_text(label);
    }
    if let Some(timer) = &scene.timer {
        renderer.update_timer_text(timer);
    }
}

fn ensure_parent(path: &std::path::Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    Ok(())
}

fn cmd_quilt(store: ParamStore, args: QuiltArgs) -> anyhow::Result<()> {
    let mut renderer = build_renderer(store, &args.scene, RenderSurfaceState::new(1.0, 1.0, 1.0))?;
    let quilt = renderer.render_quilt()?;
    ensure_parent(&args.out)?;
    quilt.raster().save_png(&args.out)?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_frame(store: ParamStore, args: FrameArgs) -> anyhow::Result<()> {
    let mut renderer = build_renderer(store, &args.scene, args.surface.surface())?;
    renderer.render_quilt()?;
    let frame = renderer
        .render_frame()?
        .context("surface has zero physical size")?;
    ensure_parent(&args.out)?;
    frame.save_png(&args.out)?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

/// Probe used by `run`: the font file when one was given, otherwise ready immediately.
enum RunProbe {
    Font(FontFileProbe),
    NoText,
}

impl CapabilityProbe for RunProbe {
    fn probe(&mut self) -> Option<Capabilities> {
        match self {
            RunProbe::Font(p) => p.probe(),
            RunProbe::NoText => Some(Capabilities::default()),
        }
    }
}

fn cmd_run(store: ParamStore, args: RunArgs) -> anyhow::Result<()> {
    anyhow::ensure!(args.fps.is_finite() && args.fps > 0.0, "--fps must be > 0");
    let probe = match &args.scene.font {
        Some(path) => RunProbe::Font(FontFileProbe::new(path)),
        None => RunProbe::NoText,
    };
    let mut host = DeferredRenderer::new(
        probe,
        store,
        args.surface.surface(),
        ManualScheduler::new(),
        args.scene.options(),
    );
    if let Some(label) = &args.scene.label {
        host.update_label_text(label);
    }

    let frame_time = Duration::from_secs_f64(1.0 / args.fps);
    let mut delivered = 0u32;
    for i in 0..args.frames {
        let now = frame_time * i;
        if !host.poll(now)? {
            continue;
        }
        let timer = match &args.scene.timer {
            Some(t) => t.clone(),
            None => format_focus_timer(args.timer_start + now.as_secs()),
        };
        host.update_timer_text(&timer);

        let Some(renderer) = host.renderer_mut() else {
            continue;
        };
        let Some(token) = renderer.scheduler_mut().fire_next() else {
            continue;
        };
        if let Some(plan) = renderer.on_frame(token, now)? {
            delivered += 1;
            tracing::debug!(frame = i, regenerated = plan.regenerate_quilt, "tick");
        }
    }

    let renderer = host
        .renderer_mut()
        .context("renderer never initialized; is the font readable?")?;
    renderer.stop();
    let frame = renderer
        .current_frame()
        .context("no frame was rendered")?;
    ensure_parent(&args.out)?;
    frame.save_png(&args.out)?;
    eprintln!("delivered {delivered} frames, wrote {}", args.out.display());
    Ok(())
}

fn resolve_control(name: &str) -> anyhow::Result<DebugControl> {
    DebugControl::parse(name).with_context(|| {
        let known: Vec<&str> = DebugControl::ALL.iter().map(|c| c.id()).collect();
        format!("unknown parameter '{name}' (controls: {})", known.join(", "))
    })
}

fn cmd_params(mut store: ParamStore, cmd: ParamsCommand) -> anyhow::Result<()> {
    store.seed_defaults()?;
    match cmd {
        ParamsCommand::List => {
            for (key, value) in store.entries() {
                let control = DebugControl::ALL.into_iter().find(|c| c.key() == key);
                match control {
                    Some(c) => println!(
                        "{:<14} {:<16} {}",
                        key.as_str(),
                        c.id(),
                        c.display_value(&value)
                    ),
                    None => println!("{:<14} {:<16} {value}", key.as_str(), "-"),
                }
            }
        }
        ParamsCommand::Get { name } => {
            let key = match ParamKey::parse(&name) {
                Some(k) => k,
                None => resolve_control(&name)?.key(),
            };
            println!("{}", store.get(key));
        }
        ParamsCommand::Set { name, value } => {
            let control = resolve_control(&name)?;
            let cmd = ControlCommand::parse(control, &value)?;
            if matches!(
                control.target(),
                ControlTarget::ViewCone | ControlTarget::CameraDistance
            ) && cmd.value <= 0.0
            {
                anyhow::bail!(
                    "'{}' must be > 0 (default sweep {:?})",
                    control.id(),
                    CameraSweepConfig::default()
                );
            }
            store.set(control.key(), &cmd.raw)?;
            println!("{} = {}", control.key(), control.display_value(&cmd.raw));
        }
    }
    Ok(())
}
