use std::{cell::Cell, rc::Rc};

use super::*;
use crate::{
    foundation::core::Rgba8Premul,
    params::{
        control::DebugControl,
        store::{KvBackend, MemoryKv, ParamKey},
    },
    render::camera::PerspectiveCamera,
    runtime::scheduler::ManualScheduler,
    scene::graph::SceneGraph,
};

/// Flat gray views; counts quilt generations.
struct FlatRenderer {
    prepares: Rc<Cell<usize>>,
}

impl SceneRenderer for FlatRenderer {
    fn prepare(&mut self, _scene: &mut SceneGraph) -> QuiltResult<()> {
        self.prepares.set(self.prepares.get() + 1);
        Ok(())
    }

    fn render_view(
        &self,
        _scene: &SceneGraph,
        _camera: &PerspectiveCamera,
        width: u32,
        height: u32,
    ) -> QuiltResult<Raster> {
        Ok(Raster::filled(
            width,
            height,
            Rgba8Premul::from_straight_rgba(90, 90, 90, 255),
        ))
    }
}

/// Memory backend whose writes can be switched off.
struct FlakyKv {
    inner: MemoryKv,
    broken: Rc<Cell<bool>>,
}

impl KvBackend for FlakyKv {
    fn get_item(&self, key: &str) -> Option<String> {
        self.inner.get_item(key)
    }

    fn set_item(&mut self, key: &str, value: &str) -> QuiltResult<()> {
        if self.broken.get() {
            return Err(QuiltError::store("disk full"));
        }
        self.inner.set_item(key, value)
    }

    fn keys(&self) -> Vec<String> {
        self.inner.keys()
    }
}

const SMALL: RendererOptions = RendererOptions {
    tile_width: 4,
    tile_height: 6,
    invert_views: false,
};

fn renderer_with(store: ParamStore) -> (LenticularRenderer<ManualScheduler>, Rc<Cell<usize>>) {
    let prepares = Rc::new(Cell::new(0));
    let r = LenticularRenderer::new(
        store,
        RenderSurfaceState::new(24.0, 16.0, 1.0),
        ManualScheduler::new(),
        Box::new(FlatRenderer {
            prepares: prepares.clone(),
        }),
        SMALL,
    )
    .unwrap();
    (r, prepares)
}

fn renderer() -> (LenticularRenderer<ManualScheduler>, Rc<Cell<usize>>) {
    renderer_with(ParamStore::in_memory())
}

fn tick(r: &mut LenticularRenderer<ManualScheduler>, at_ms: u64) -> Option<TickPlan> {
    let token = r.scheduler_mut().fire_next()?;
    r.on_frame(token, Duration::from_millis(at_ms)).unwrap()
}

#[test]
fn construction_seeds_store_and_reads_placements() {
    let store = ParamStore::new(MemoryKv::with_items([("posY", "40"), ("posX", "12")]));
    let (mut r, _) = renderer_with(store);
    assert_eq!(r.store_mut().get_raw("posX").as_deref(), Some("0"));
    assert_eq!(r.store_mut().get_raw("viewCone").as_deref(), Some("5"));
    assert_eq!(r.scene().placement(SceneElement::GlowDisc).y, 40.0);
    assert_eq!(r.compositor().optics().center_offset, -0.489);
}

#[test]
fn first_tick_generates_quilt_and_frame() {
    let (mut r, prepares) = renderer();
    assert!(r.current_frame().is_none());
    r.start();
    let plan = tick(&mut r, 0).unwrap();
    assert!(plan.regenerate_quilt);
    assert_eq!(prepares.get(), 1);

    let quilt = r.current_quilt().unwrap();
    assert_eq!(quilt.raster().width(), 32);
    let frame = r.current_frame().unwrap();
    assert_eq!((frame.width(), frame.height()), (24, 16));
    assert!(frame.data().chunks_exact(4).all(|px| px == [90, 90, 90, 255]));
}

#[test]
fn quilt_is_throttled_but_disc_spins_every_tick() {
    let (mut r, prepares) = renderer();
    r.start();
    for t in [0, 16, 33, 50, 100, 116, 200, 217] {
        tick(&mut r, t).unwrap();
    }
    // 0, 116 and 217 regenerate
    assert_eq!(prepares.get(), 3);
    assert!((r.scene().disc_rotation() - 8.0 * DISC_SPIN_STEP).abs() < 1e-5);
}

#[test]
fn stale_tokens_do_no_work() {
    let (mut r, prepares) = renderer();
    r.start();
    let token = r.scheduler_mut().fire_next().unwrap();
    r.stop();
    assert_eq!(r.on_frame(token, Duration::ZERO).unwrap(), None);
    assert_eq!(prepares.get(), 0);
    assert_eq!(r.scene().disc_rotation(), 0.0);
    assert_eq!(r.scheduler().pending_count(), 0);
}

#[test]
fn start_twice_then_stop_leaves_nothing_pending() {
    let (mut r, _) = renderer();
    r.start();
    r.start();
    assert_eq!(r.scheduler().pending_count(), 1);
    r.stop();
    assert_eq!(r.state(), LoopState::Idle);
    assert_eq!(r.scheduler().pending_count(), 0);
}

#[test]
fn resize_updates_uniform_before_next_frame() {
    let (mut r, _) = renderer();
    r.start();
    tick(&mut r, 0).unwrap();
    r.on_resize(21.0, 11.0, 1.5);
    assert_eq!(r.compositor().resolution(), (31.5, 16.5));
    tick(&mut r, 16).unwrap();
    let frame = r.current_frame().unwrap();
    assert_eq!((frame.width(), frame.height()), (31, 16));
}

#[test]
fn empty_surface_keeps_previous_frame() {
    let (mut r, _) = renderer();
    r.render_quilt().unwrap();
    r.render_frame().unwrap();
    r.on_resize(0.0, 10.0, 1.0);
    let frame = r.render_frame().unwrap().unwrap();
    assert_eq!(frame.width(), 24);
}

#[test]
fn queued_controls_write_through_and_apply_on_tick() {
    let (mut r, _) = renderer();
    let tx = r.control_sender();
    assert!(tx.send_input(DebugControl::DiscY, "25").unwrap());
    assert!(tx.send_input(DebugControl::TimerZ, "-40").unwrap());
    assert!(tx.send_input(DebugControl::CenterOffset, "0.125").unwrap());
    assert!(tx.send_input(DebugControl::ViewCone, "8").unwrap());

    r.start();
    tick(&mut r, 0).unwrap();

    assert_eq!(r.store_mut().get(ParamKey::PosY), "25");
    assert_eq!(r.store_mut().get(ParamKey::TimerZ), "-40");
    let disc = r.scene().graph().node(r.scene().disc()).transform;
    assert_eq!(disc.position.y, 25.0);
    let timer = r.scene().graph().node(r.scene().timer_group()).transform;
    assert_eq!(timer.position.z, 40.0);
    assert_eq!(r.compositor().optics().center_offset, 0.125);
    assert_eq!(r.sweep().view_cone_degrees, 8.0);
}

#[test]
fn invalid_camera_values_are_rejected_without_writing() {
    let (mut r, _) = renderer();
    let cmd = ControlCommand::parse(DebugControl::CamDist, "0").unwrap();
    assert!(r.apply_control(&cmd).is_err());
    assert_eq!(r.store_mut().get(ParamKey::CamDist), "650");
    assert_eq!(r.sweep().camera_distance, 650.0);

    let tx = r.control_sender();
    assert!(tx.send_input(DebugControl::DiscScale, "NaN").is_err());
    assert!(tx.send_input(DebugControl::DiscScale, "big").is_err());
    assert_eq!(r.apply_pending_controls(), 0);
}

#[test]
fn oversized_stored_values_do_not_block_startup_or_frames() {
    let store = ParamStore::new(MemoryKv::with_items([
        ("centerOffset", "1e39"),
        ("camDist", "1e39"),
    ]));
    let (mut r, prepares) = renderer_with(store);
    assert_eq!(r.compositor().optics().center_offset, -0.489);
    assert_eq!(r.sweep().camera_distance, 650.0);

    r.start();
    assert!(tick(&mut r, 0).unwrap().regenerate_quilt);
    assert_eq!(prepares.get(), 1);
    assert!(r.current_frame().is_some());
}

#[test]
fn oversized_control_values_are_never_persisted() {
    let (mut r, _) = renderer();
    let cmd = ControlCommand {
        control: DebugControl::CenterOffset,
        raw: "1e39".to_string(),
        value: 1e39,
    };
    assert!(r.apply_control(&cmd).is_err());
    assert_eq!(r.store_mut().get(ParamKey::CenterOffset), "-0.489");
    assert_eq!(r.compositor().optics().center_offset, -0.489);

    let tx = r.control_sender();
    assert!(tx.send_input(DebugControl::CenterOffset, "1e39").is_err());
    assert_eq!(r.apply_pending_controls(), 0);
}

#[test]
fn store_failure_still_applies_live_value() {
    let broken = Rc::new(Cell::new(false));
    let store = ParamStore::new(FlakyKv {
        inner: MemoryKv::new(),
        broken: broken.clone(),
    });
    let (mut r, _) = renderer_with(store);
    broken.set(true);

    let cmd = ControlCommand::parse(DebugControl::LabelScale, "1.5").unwrap();
    r.apply_control(&cmd).unwrap();
    assert_eq!(r.scene().placement(SceneElement::LabelCard).scale, 1.5);
    assert_eq!(r.store_mut().get(ParamKey::TaskNameScale), "0.7");
}

#[test]
fn text_updates_reach_the_scene() {
    let (mut r, _) = renderer();
    r.update_label_text("Deep work");
    r.update_timer_text("00:25:00");
    assert_eq!(r.scene().label_canvas().texts().collect::<Vec<_>>(), vec!["Deep work"]);
    assert_eq!(r.scene().digit_canvas(3).texts().collect::<String>(), "5");
}

fn flaky_probe(ready_after: u32) -> impl FnMut() -> Option<Capabilities> {
    let mut calls = 0;
    move || {
        calls += 1;
        (calls > ready_after).then(Capabilities::default)
    }
}

fn deferred(ready_after: u32) -> DeferredRenderer<impl CapabilityProbe, ManualScheduler> {
    DeferredRenderer::new(
        flaky_probe(ready_after),
        ParamStore::in_memory(),
        RenderSurfaceState::new(10.0, 10.0, 1.0),
        ManualScheduler::new(),
        SMALL,
    )
}

#[test]
fn deferred_init_retries_every_100ms() {
    let mut d = deferred(2);
    let ms = Duration::from_millis;

    assert!(!d.poll(ms(0)).unwrap());
    assert_eq!(d.attempts(), 1);
    assert_eq!(d.next_attempt(), Some(ms(100)));

    assert!(!d.poll(ms(50)).unwrap());
    assert_eq!(d.attempts(), 1);

    assert!(!d.poll(ms(100)).unwrap());
    assert_eq!(d.attempts(), 2);

    assert!(d.poll(ms(200)).unwrap());
    assert_eq!(d.attempts(), 3);
    assert!(d.is_ready());

    let r = d.renderer().unwrap();
    assert_eq!(r.state(), LoopState::Running);
    assert_eq!(r.scheduler().pending_count(), 1);

    assert!(d.poll(ms(300)).unwrap());
    assert_eq!(d.attempts(), 3);
}

#[test]
fn deferred_keeps_resize_and_text_until_ready() {
    let mut d = deferred(1);
    d.on_resize(30.0, 20.0, 2.0);
    d.update_label_text("Read");
    d.update_timer_text("01:00:00");
    assert!(d.renderer().is_none());
    assert_eq!(d.surface().physical_size(), (60, 40));

    d.poll(Duration::ZERO).unwrap();
    d.poll(Duration::from_millis(100)).unwrap();
    let r = d.renderer().unwrap();
    assert_eq!(r.compositor().resolution(), (60.0, 40.0));
    assert_eq!(r.scene().label_canvas().texts().collect::<Vec<_>>(), vec!["Read"]);
    assert_eq!(r.scene().digit_canvas(1).texts().collect::<String>(), "1");
}
