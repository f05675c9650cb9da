//! Idle animation
//!
//! The per-tick math is kept in free functions of elapsed time so it can be
//! checked without a scene. [`Animator`] applies it to the rigged nodes.

use crate::scene::SceneGraph;
use crate::vignette::Rig;
use glam::Vec3;
use std::f32::consts::TAU;

/// Spacing between star phases, in seconds of animation time
const STAR_PHASE_STEP: f64 = 0.1;
/// Radius of each star's per-tick wobble
const STAR_WOBBLE: f64 = 0.01;
/// Amplitude of the arm and leg swing
const LIMB_SWING: f64 = 0.5;

/// Slow sway shared by all limbs
pub fn sway_delta(time: f64) -> f32 {
    ((time * 5.0).sin() * 0.05) as f32
}

/// X rotations of the four limbs at a point in time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LimbPose {
    pub left_arm: f32,
    pub right_arm: f32,
    pub left_leg: f32,
    pub right_leg: f32,
}

/// Arms and legs swing in opposition; the sway biases arms one way and legs the other
pub fn limb_pose(time: f64) -> LimbPose {
    let swing = (time * 10.0).sin() * LIMB_SWING;
    let delta = sway_delta(time);
    LimbPose {
        left_arm: swing as f32 + delta,
        right_arm: -swing as f32 + delta,
        left_leg: -swing as f32 - delta,
        right_leg: swing as f32 - delta,
    }
}

/// Offset applied to star `index` at `time`; only x and y move
pub fn star_offset(time: f64, index: usize) -> Vec3 {
    let phase = (time + index as f64 * STAR_PHASE_STEP) * 2.0;
    Vec3::new(
        (phase.cos() * STAR_WOBBLE) as f32,
        (phase.sin() * STAR_WOBBLE) as f32,
        0.0,
    )
}

/// How star offsets are applied each tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StarMotion {
    /// Add the offset to the previous position; stars drift without bound
    #[default]
    Accumulate,
    /// Place the star at its base position plus the offset
    Anchored,
}

/// How the figure turns about its vertical axis
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FigureSpin {
    /// Fixed increment per tick, so the speed follows the frame rate
    PerTick { radians: f32 },
    /// Yaw proportional to elapsed time
    PerSecond { radians: f32 },
}

impl Default for FigureSpin {
    fn default() -> Self {
        FigureSpin::PerTick { radians: 0.01 }
    }
}

impl FigureSpin {
    /// Yaw after a tick, given the yaw before it, wrapped into [0, 2π)
    pub fn advance(&self, yaw: f32, time: f64) -> f32 {
        match *self {
            FigureSpin::PerTick { radians } => (yaw.rem_euclid(TAU) + radians).rem_euclid(TAU),
            FigureSpin::PerSecond { radians } => {
                (radians as f64 * time).rem_euclid(std::f64::consts::TAU) as f32
            }
        }
    }
}

/// Animation state threaded through every tick
#[derive(Debug, Clone, Default)]
pub struct Animator {
    pub star_motion: StarMotion,
    pub figure_spin: FigureSpin,
    ticks: u64,
}

impl Animator {
    pub fn new(star_motion: StarMotion, figure_spin: FigureSpin) -> Self {
        Self {
            star_motion,
            figure_spin,
            ticks: 0,
        }
    }

    /// Number of ticks applied so far
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Write one frame of animation into the rigged nodes
    pub fn tick(&mut self, scene: &mut SceneGraph, rig: &Rig, time: f64) {
        let pose = limb_pose(time);
        let limbs = [
            (rig.left_arm, pose.left_arm),
            (rig.right_arm, pose.right_arm),
            (rig.left_leg, pose.left_leg),
            (rig.right_leg, pose.right_leg),
        ];
        for (node, angle) in limbs {
            if let Some(transform) = scene.transform_mut(node) {
                transform.rotation.x = angle;
            }
        }

        if let Some(transform) = scene.transform_mut(rig.figure) {
            transform.rotation.y = self.figure_spin.advance(transform.rotation.y, time);
        }

        for (index, star) in rig.stars.iter().enumerate() {
            let offset = star_offset(time, index);
            if let Some(transform) = scene.transform_mut(star.node) {
                match self.star_motion {
                    StarMotion::Accumulate => transform.translate(offset),
                    StarMotion::Anchored => transform.position = star.base + offset,
                }
            }
        }

        self.ticks += 1;
    }
}

/// Monotonic clock measuring seconds since it was (re)started
#[derive(Debug, Clone)]
pub struct Clock {
    #[cfg(not(target_arch = "wasm32"))]
    origin: std::time::Instant,
    #[cfg(target_arch = "wasm32")]
    origin_ms: f64,
}

impl Clock {
    pub fn start() -> Self {
        Self {
            #[cfg(not(target_arch = "wasm32"))]
            origin: std::time::Instant::now(),
            #[cfg(target_arch = "wasm32")]
            origin_ms: now_ms(),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::start();
    }

    /// Seconds elapsed since start
    pub fn elapsed(&self) -> f64 {
        #[cfg(not(target_arch = "wasm32"))]
        {
            self.origin.elapsed().as_secs_f64()
        }
        #[cfg(target_arch = "wasm32")]
        {
            (now_ms() - self.origin_ms) / 1000.0
        }
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::start()
    }
}

#[cfg(target_arch = "wasm32")]
fn now_ms() -> f64 {
    web_sys::window()
        .and_then(|window| window.performance())
        .map(|performance| performance.now())
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    fn sample_times() -> impl Iterator<Item = f64> {
        (0..500).map(|i| i as f64 * 0.037)
    }

    #[test]
    fn arms_mirror_around_sway() {
        for t in sample_times() {
            let pose = limb_pose(t);
            let delta = sway_delta(t);
            assert!((pose.left_arm - (-pose.right_arm + 2.0 * delta)).abs() < EPS, "t={t}");
        }
    }

    #[test]
    fn legs_mirror_around_sway() {
        for t in sample_times() {
            let pose = limb_pose(t);
            let delta = sway_delta(t);
            assert!((pose.left_leg - (-pose.right_leg - 2.0 * delta)).abs() < EPS, "t={t}");
        }
    }

    #[test]
    fn rest_pose_at_time_zero() {
        let pose = limb_pose(0.0);
        assert_eq!(pose, LimbPose { left_arm: 0.0, right_arm: 0.0, left_leg: 0.0, right_leg: 0.0 });
        assert_eq!(sway_delta(0.0), 0.0);
    }

    #[test]
    fn sway_peaks_at_quarter_period() {
        let t = std::f64::consts::FRAC_PI_2 / 5.0;
        assert!((sway_delta(t) - 0.05).abs() < EPS);
    }

    #[test]
    fn star_offset_phase_follows_index() {
        let first = star_offset(0.0, 0);
        assert!((first - Vec3::new(0.01, 0.0, 0.0)).length() < EPS);

        // Star 10 at t=0 shares the phase of star 0 at t=1
        assert!((star_offset(0.0, 10) - star_offset(1.0, 0)).length() < EPS);

        for i in 0..200 {
            let offset = star_offset(3.3, i);
            assert!((offset.length() - 0.01).abs() < EPS);
            assert_eq!(offset.z, 0.0);
        }
    }

    #[test]
    fn per_tick_spin_ignores_time() {
        let spin = FigureSpin::default();
        let mut yaw = 0.0;
        for i in 0..100 {
            yaw = spin.advance(yaw, i as f64 * 123.0);
        }
        assert!((yaw - 1.0).abs() < 1e-4);
    }

    #[test]
    fn per_tick_spin_keeps_step_at_large_yaw() {
        let spin = FigureSpin::default();
        let start = 131_072.5_f32;
        let after = spin.advance(start, 0.0);
        assert!((0.0..TAU).contains(&after));
        assert!((after - start.rem_euclid(TAU) - 0.01).abs() < 1e-5);
    }

    #[test]
    fn per_tick_spin_stays_in_one_turn() {
        let spin = FigureSpin::PerTick { radians: 0.01 };
        let mut yaw = 0.0;
        for _ in 0..2_000 {
            yaw = spin.advance(yaw, 0.0);
            assert!((0.0..TAU).contains(&yaw));
        }
        // 20 rad is three full turns plus the remainder
        assert!((yaw - (20.0 - 3.0 * TAU)).abs() < 1e-3);
    }

    #[test]
    fn per_second_spin_follows_time() {
        let spin = FigureSpin::PerSecond { radians: 0.6 };
        assert!((spin.advance(42.0, 2.0) - 1.2).abs() < EPS);
        assert_eq!(spin.advance(1.0, 0.0), 0.0);
        // Twelve radians wraps past one full turn
        assert!((spin.advance(0.0, 20.0) - (12.0 - TAU)).abs() < EPS);
    }

    #[test]
    fn clock_is_monotonic() {
        let mut clock = Clock::start();
        let first = clock.elapsed();
        let second = clock.elapsed();
        assert!(first >= 0.0);
        assert!(second >= first);
        clock.reset();
        assert!(clock.elapsed() < 1.0);
    }
}
