use super::*;
use crate::runtime::scheduler::ManualScheduler;

fn ms(v: u64) -> Duration {
    Duration::from_millis(v)
}

#[test]
fn start_then_stop_leaves_nothing_scheduled() {
    let mut lp = RenderLoop::new(ManualScheduler::new());
    lp.start();
    assert_eq!(lp.scheduler().pending_count(), 1);
    lp.stop();
    assert_eq!(lp.state(), LoopState::Idle);
    assert_eq!(lp.scheduler().pending_count(), 0);
    assert_eq!(lp.pending_token(), None);
}

#[test]
fn double_start_schedules_one_loop() {
    let mut lp = RenderLoop::new(ManualScheduler::new());
    lp.start();
    lp.start();
    assert_eq!(lp.scheduler().pending_count(), 1);
    assert_eq!(lp.scheduler().requested_total(), 1);
}

#[test]
fn stop_while_idle_is_a_noop() {
    let mut lp = RenderLoop::new(ManualScheduler::new());
    lp.stop();
    assert_eq!(lp.scheduler().cancelled_total(), 0);
}

#[test]
fn each_tick_requests_the_next_frame() {
    let mut lp = RenderLoop::new(ManualScheduler::new());
    lp.start();
    for i in 0..5 {
        let token = lp.scheduler_mut().fire_next().unwrap();
        assert!(lp.on_frame(token, ms(i * 16)).is_some());
        assert_eq!(lp.scheduler().pending_count(), 1);
    }
}

#[test]
fn stale_tokens_are_ignored() {
    let mut lp = RenderLoop::new(ManualScheduler::new());
    lp.start();
    let first = lp.scheduler_mut().fire_next().unwrap();
    lp.stop();
    assert_eq!(lp.on_frame(first, ms(0)), None);
    assert_eq!(lp.scheduler().pending_count(), 0);

    lp.start();
    assert_eq!(lp.on_frame(first, ms(10)), None);
    assert_eq!(lp.on_frame(FrameToken(12345), ms(10)), None);
    assert_eq!(lp.scheduler().pending_count(), 1);
}

#[test]
fn quilt_regenerates_at_most_every_100ms() {
    fn tick(lp: &mut RenderLoop<ManualScheduler>, t: u64) -> bool {
        let token = lp.scheduler_mut().fire_next().unwrap();
        lp.on_frame(token, ms(t)).unwrap().regenerate_quilt
    }

    let mut lp = RenderLoop::new(ManualScheduler::new());
    lp.start();

    assert!(tick(&mut lp, 1_000));
    assert!(!tick(&mut lp, 1_016));
    assert!(!tick(&mut lp, 1_100));
    assert!(tick(&mut lp, 1_101));
    assert!(!tick(&mut lp, 1_150));
    assert!(tick(&mut lp, 1_300));
}

#[test]
fn restart_regenerates_on_first_tick() {
    let mut lp = RenderLoop::new(ManualScheduler::new());
    lp.start();
    let t = lp.scheduler_mut().fire_next().unwrap();
    assert!(lp.on_frame(t, ms(0)).unwrap().regenerate_quilt);
    lp.stop();
    lp.start();
    let t = lp.scheduler_mut().fire_next().unwrap();
    assert!(lp.on_frame(t, ms(10)).unwrap().regenerate_quilt);
}
