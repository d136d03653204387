use glam::{UVec2, Vec2, Vec4};
use rand::{SeedableRng, rngs::StdRng};
use stablefluid::input::{DRAG_THRESHOLD_SQ, display_to_field, hsv_to_rgb, random_splats};
use stablefluid::viewport::{DisplayTracker, resolution_for};
use stablefluid::{
    ChannelFormat, ConfigError, DoubleBufferedGrid, FrameClock, Grid, PointerEvent, PointerTracker,
};
use std::time::{Duration, Instant};

const DISPLAY: UVec2 = UVec2::new(100, 100);
const FIELD: UVec2 = UVec2::new(50, 50);

fn event(x: f32, y: f32, delta: Vec2, active: bool) -> PointerEvent {
    PointerEvent {
        position: Vec2::new(x, y),
        delta,
        active,
    }
}

fn assert_close(actual: Vec4, expected: Vec4) {
    assert!(
        (actual - expected).abs().max_element() < 1e-5,
        "{actual} != {expected}"
    );
}

#[test]
fn test_click_leaves_a_motionless_droplet() {
    let mut pointer = PointerTracker::new(2.0, 3.0);
    pointer.handle(event(50.0, 50.0, Vec2::ZERO, true), DISPLAY, FIELD);
    pointer.handle(event(51.0, 50.0, Vec2::new(1.0, 0.0), true), DISPLAY, FIELD);
    assert!(!pointer.is_dragging());
    assert!(pointer.take_splats().is_empty());

    pointer.handle(event(51.0, 50.0, Vec2::ZERO, false), DISPLAY, FIELD);
    let splats = pointer.take_splats();
    assert_eq!(splats.len(), 1);
    let droplet = splats[0];
    assert_eq!(droplet.direction, Vec2::ZERO);
    assert_eq!(droplet.radius, 2.0);
    let expected = Vec2::new(25.0, 24.5);
    assert!(droplet.point.abs_diff_eq(expected, 1e-4), "{}", droplet.point);
    assert!(droplet.color.is_some());

    // Nothing left over for the next frame
    assert!(pointer.take_splats().is_empty());
}

#[test]
fn test_drag_pushes_along_pointer_motion() {
    let mut pointer = PointerTracker::new(2.0, 3.0);
    pointer.handle(event(10.0, 10.0, Vec2::ZERO, true), DISPLAY, FIELD);
    pointer.handle(event(20.0, 10.0, Vec2::new(10.0, 0.0), true), DISPLAY, FIELD);
    assert!(pointer.is_dragging());

    let splats = pointer.take_splats();
    assert_eq!(splats.len(), 1);
    // 10 display pixels are 5 field cells, times the force
    assert_eq!(splats[0].direction, Vec2::new(15.0, 0.0));
    assert_eq!(splats[0].point, display_to_field(Vec2::new(20.0, 10.0), DISPLAY, FIELD));

    // Releasing after a drag adds nothing
    pointer.handle(event(20.0, 10.0, Vec2::ZERO, false), DISPLAY, FIELD);
    assert!(!pointer.is_dragging());
    assert!(pointer.take_splats().is_empty());
}

#[test]
fn test_each_gesture_gets_its_own_color() {
    let mut pointer = PointerTracker::new(2.0, 1.0);
    let mut colors = Vec::new();
    for _ in 0..2 {
        pointer.handle(event(30.0, 30.0, Vec2::ZERO, true), DISPLAY, FIELD);
        pointer.handle(event(30.0, 30.0, Vec2::ZERO, false), DISPLAY, FIELD);
        colors.push(pointer.take_splats()[0].color);
    }
    assert_ne!(colors[0], colors[1]);
}

#[test]
fn test_drag_threshold_is_in_display_pixels() {
    let mut pointer = PointerTracker::new(2.0, 1.0);
    let just_below = DRAG_THRESHOLD_SQ.sqrt() - 0.5;
    pointer.handle(event(0.0, 0.0, Vec2::ZERO, true), DISPLAY, FIELD);
    pointer.handle(event(just_below, 0.0, Vec2::X, true), DISPLAY, FIELD);
    assert!(!pointer.is_dragging());
    pointer.handle(event(just_below + 1.0, 0.0, Vec2::X, true), DISPLAY, FIELD);
    assert!(pointer.is_dragging());
}

#[test]
fn test_display_to_field_maps_pixel_centers() {
    assert_eq!(display_to_field(Vec2::ZERO, DISPLAY, FIELD), Vec2::splat(-0.5));
    assert!(
        display_to_field(Vec2::new(100.0, 50.0), DISPLAY, FIELD)
            .abs_diff_eq(Vec2::new(49.5, 24.5), 1e-4)
    );
}

#[test]
fn test_frame_clock() {
    let start = Instant::now();
    let mut clock = FrameClock::new(1.0 / 60.0);
    assert_eq!(clock.tick_at(start), 0.0);

    let dt = clock.tick_at(start + Duration::from_millis(10));
    assert!((dt - 0.01).abs() < 1e-6);

    // A long pause is clamped
    assert_eq!(clock.tick_at(start + Duration::from_secs(5)), 1.0 / 60.0);
    // Going back in time is not
    assert_eq!(clock.tick_at(start), 0.0);
}

#[test]
fn test_resolution_follows_display_aspect() {
    assert_eq!(resolution_for(UVec2::new(1920, 1080), 128), [228, 128]);
    assert_eq!(resolution_for(UVec2::new(600, 1200), 64), [64, 128]);
    assert_eq!(resolution_for(UVec2::new(512, 512), 256), [256, 256]);
    assert_eq!(resolution_for(UVec2::ZERO, 64), [64, 64]);
}

#[test]
fn test_display_tracker_reports_changes_only() {
    let mut tracker = DisplayTracker::new();
    assert_eq!(tracker.current(), None);
    assert!(tracker.update(UVec2::new(800, 600)));
    assert!(!tracker.update(UVec2::new(800, 600)));
    assert!(tracker.update(UVec2::new(1024, 600)));
    assert_eq!(tracker.current(), Some(UVec2::new(1024, 600)));
}

#[test]
fn test_random_splats_are_reproducible() {
    let field = UVec2::new(64, 32);
    let first = random_splats(&mut StdRng::seed_from_u64(7), 10, field, 3.0, 40.0);
    let second = random_splats(&mut StdRng::seed_from_u64(7), 10, field, 3.0, 40.0);
    assert_eq!(first, second);
    assert_eq!(first.len(), 10);

    for splat in &first {
        assert!(splat.point.cmpge(Vec2::ZERO).all());
        assert!(splat.point.cmplt(field.as_vec2()).all());
        let speed = splat.direction.length();
        assert!((10.0 - 1e-3..=40.0 + 1e-3).contains(&speed), "speed {speed}");
        assert!(splat.color.is_some());
    }
}

#[test]
fn test_hsv_primaries() {
    assert_close(hsv_to_rgb(0.0, 1.0, 1.0), Vec4::new(1.0, 0.0, 0.0, 1.0));
    assert_close(hsv_to_rgb(1.0 / 3.0, 1.0, 1.0), Vec4::new(0.0, 1.0, 0.0, 1.0));
    assert_close(hsv_to_rgb(2.0 / 3.0, 1.0, 1.0), Vec4::new(0.0, 0.0, 1.0, 1.0));
    assert_close(hsv_to_rgb(0.5, 0.0, 0.5), Vec4::new(0.5, 0.5, 0.5, 1.0));
}

#[test]
fn test_double_buffer_rejects_mismatched_shapes() {
    let front = Grid::new(8, 8, ChannelFormat::Rg).unwrap();
    let back = Grid::new(8, 4, ChannelFormat::Rg).unwrap();
    assert!(matches!(
        DoubleBufferedGrid::from_grids(front, back),
        Err(ConfigError::ShapeMismatch { .. })
    ));

    let front = Grid::new(8, 8, ChannelFormat::Rg).unwrap();
    let back = Grid::new(8, 8, ChannelFormat::R).unwrap();
    assert!(DoubleBufferedGrid::from_grids(front, back).is_err());
}

#[test]
fn test_double_buffer_swap_exposes_written_back_buffer() {
    let mut field = DoubleBufferedGrid::new(4, 4, ChannelFormat::R, Vec4::ZERO).unwrap();
    let front_id = field.front().id();
    field.back_mut().set(1, 2, Vec4::new(3.0, 0.0, 0.0, 0.0));
    field.swap();
    assert_ne!(field.front().id(), front_id);
    assert_eq!(field.front().get(1, 2).x, 3.0);
}
