// Local motion prediction
//
// The local player moves immediately on input, ahead of the server:
//   dir = normalize(axis)
//   pos = pos + dir * SPEED * dt
// There is no correction step; the predicted position is what we draw and
// what we report.
use glam::Vec2;

use crate::input::Axis;

/// World units per second.
pub const SPEED: f32 = 200.0;

pub struct MotionPredictor {
    speed: f32,
}

impl MotionPredictor {
    pub fn new() -> Self {
        Self { speed: SPEED }
    }

    /// Advance `position` by one frame. Returns `None` when nothing moved:
    /// idle axis, or a zero/negative/non-finite `dt`.
    pub fn step(&self, position: Vec2, axis: Axis, dt: f32) -> Option<Vec2> {
        if axis.is_idle() || !dt.is_finite() || dt <= 0.0 {
            return None;
        }
        Some(position + axis.direction() * self.speed * dt)
    }
}

impl Default for MotionPredictor {
    fn default() -> Self {
        Self::new()
    }
}

/// Turns animation-frame timestamps (ms) into frame deltas (s).
///
/// No clamping: a tab that was in the background produces one large step
/// when it resumes.
#[derive(Debug, Default)]
pub struct FrameClock {
    last: Option<f64>,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seconds since the previous tick; 0 on the first one. Timestamps that
    /// run backwards also yield 0.
    pub fn tick(&mut self, timestamp_ms: f64) -> f32 {
        let dt = match self.last {
            Some(last) => ((timestamp_ms - last) / 1000.0).max(0.0),
            None => 0.0,
        };
        self.last = Some(timestamp_ms);
        dt as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_axis_aligned_step() {
        let p = MotionPredictor::new();
        let next = p.step(Vec2::new(10.0, 10.0), Axis { x: 1, y: 0 }, 0.5).unwrap();
        assert_eq!(next, Vec2::new(110.0, 10.0));
    }

    #[test]
    fn test_zero_dt_is_idempotent() {
        let p = MotionPredictor::new();
        assert_eq!(p.step(Vec2::ZERO, Axis { x: 1, y: 1 }, 0.0), None);
        assert_eq!(p.step(Vec2::ZERO, Axis { x: 1, y: 1 }, -0.1), None);
        assert_eq!(p.step(Vec2::ZERO, Axis { x: 1, y: 1 }, f32::NAN), None);
    }

    #[test]
    fn test_idle_axis_does_not_move() {
        let p = MotionPredictor::new();
        assert_eq!(p.step(Vec2::new(3.0, 4.0), Axis::IDLE, 1.0), None);
    }

    #[test]
    fn test_frame_clock() {
        let mut clock = FrameClock::new();
        assert_eq!(clock.tick(1000.0), 0.0);
        assert!((clock.tick(1016.0) - 0.016).abs() < 1e-6);
        assert_eq!(clock.tick(1010.0), 0.0);
        // A stalled tab catches up in one step.
        assert!((clock.tick(6010.0) - 5.0).abs() < 1e-6);
    }

    proptest! {
        #[test]
        fn step_length_is_speed_times_dt(
            x in -1i8..=1,
            y in -1i8..=1,
            dt in 0.001f32..2.0,
            start_x in -5000.0f32..5000.0,
            start_y in -5000.0f32..5000.0,
        ) {
            let p = MotionPredictor::new();
            let start = Vec2::new(start_x, start_y);
            let axis = Axis { x, y };
            match p.step(start, axis, dt) {
                None => prop_assert!(axis.is_idle()),
                Some(next) => {
                    let moved = (next - start).length();
                    let expected = SPEED * dt;
                    prop_assert!((moved - expected).abs() <= expected * 1e-3 + 1e-2);
                }
            }
        }
    }
}
