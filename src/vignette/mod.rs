//! The vignette context
//!
//! [`Vignette`] owns the scene, the fixed camera and the animation state, and
//! exposes the start/tick/resize/stop lifecycle the run loops drive.

mod builder;

pub use builder::*;

use crate::animation::{Animator, Clock};
use crate::error::VignetteError;
use crate::scene::{Camera, Projection, SceneGraph};
use crate::VignetteConfig;
use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VignetteState {
    Idle,
    Running,
    Stopped,
}

pub struct Vignette {
    scene: SceneGraph,
    rig: Rig,
    camera: Camera,
    animator: Animator,
    clock: Clock,
    state: VignetteState,
}

impl Vignette {
    /// Build the scene, seeding star placement from the config or from entropy
    pub fn new(config: &VignetteConfig) -> Result<Self, VignetteError> {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_rng(config, &mut rng)
    }

    pub fn with_rng(config: &VignetteConfig, rng: &mut impl Rng) -> Result<Self, VignetteError> {
        let (scene, rig) = build_scene(rng)?;

        let aspect = if config.width > 0 && config.height > 0 {
            config.width as f32 / config.height as f32
        } else {
            1.0
        };
        let camera = Camera::new(Vec3::new(5.0, 3.0, 5.0), Vec3::new(0.0, 2.0, 0.0))
            .with_projection(Projection::perspective(75.0, aspect, 0.1, 1000.0));

        log::info!(
            "Vignette ready: {} nodes, {} stars, {:?}, {:?}",
            scene.node_count(),
            rig.stars.len(),
            config.star_motion,
            config.figure_spin
        );

        Ok(Self {
            scene,
            rig,
            camera,
            animator: Animator::new(config.star_motion, config.figure_spin),
            clock: Clock::start(),
            state: VignetteState::Idle,
        })
    }

    /// Begin animating; restarts the clock. Does nothing while already running.
    pub fn start(&mut self) {
        if self.state == VignetteState::Running {
            return;
        }
        self.clock.reset();
        self.state = VignetteState::Running;
        log::info!("Vignette started");
    }

    /// Apply one animation step at `time` seconds; returns whether it ran
    pub fn tick(&mut self, time: f64) -> bool {
        if self.state != VignetteState::Running {
            return false;
        }
        self.animator.tick(&mut self.scene, &self.rig, time);
        true
    }

    /// Tick at the clock's current elapsed time
    pub fn update(&mut self) -> bool {
        let time = self.clock.elapsed();
        self.tick(time)
    }

    /// Follow a viewport resize; zero-sized viewports are ignored
    pub fn resize(&mut self, width: u32, height: u32) {
        if self.camera.set_aspect(width, height) {
            log::debug!("Vignette viewport resized to {}x{}", width, height);
        }
    }

    pub fn stop(&mut self) {
        if self.state == VignetteState::Running {
            self.state = VignetteState::Stopped;
            log::info!("Vignette stopped after {} ticks", self.animator.ticks());
        }
    }

    pub fn state(&self) -> VignetteState {
        self.state
    }

    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    pub fn rig(&self) -> &Rig {
        &self.rig
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn animator(&self) -> &Animator {
        &self.animator
    }
}
