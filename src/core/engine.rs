//! Engine: configuration and the frame loop

use serde::{Deserialize, Serialize};

use crate::core::stats::FrameStats;
use crate::core::Time;
use crate::render::RenderContext;
use crate::scene::camera::CameraMatrices;
use crate::scene::component::ComponentId;
use crate::scene::{Scene, SceneError};

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Name of the initial scene
    pub scene_name: String,
    /// Initial render target width
    pub width: u32,
    /// Initial render target height
    pub height: u32,
    /// Frame samples kept for statistics
    pub stats_samples: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            scene_name: String::from("Scene"),
            width: 1280,
            height: 720,
            stats_samples: 120,
        }
    }
}

impl EngineConfig {
    /// Set the initial scene name.
    pub fn with_scene_name(mut self, name: impl Into<String>) -> Self {
        self.scene_name = name.into();
        self
    }

    /// Set render target dimensions.
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Set the statistics sample window.
    pub fn with_stats_samples(mut self, samples: usize) -> Self {
        self.stats_samples = samples;
        self
    }
}

/// Owns the scene, render context, clock, and statistics, and drives them
/// through the frame loop.
pub struct Engine {
    config: EngineConfig,
    scene: Scene,
    context: RenderContext,
    time: Time,
    stats: FrameStats,
}

impl Engine {
    /// Build an engine from a configuration.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        let scene = Scene::new(&config.scene_name);
        let context = RenderContext::new(config.width, config.height);
        let stats = FrameStats::new(config.stats_samples);
        Self {
            config,
            scene,
            context,
            time: Time::new(),
            stats,
        }
    }

    /// Initialize env-based logging. Safe to call more than once.
    pub fn init_logging() {
        let _ = env_logger::try_init();
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    #[must_use]
    pub fn context(&self) -> &RenderContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut RenderContext {
        &mut self.context
    }

    #[must_use]
    pub fn time(&self) -> Time {
        self.time
    }

    #[must_use]
    pub fn stats(&self) -> &FrameStats {
        &self.stats
    }

    /// Resize the render target.
    pub fn resize(&mut self, width: u32, height: u32) {
        log::debug!("resizing render target to {width}x{height}");
        self.context.set_viewport_size(width, height);
    }

    /// Advance one frame: clock, statistics, then scene dispatch.
    pub fn tick(&mut self) {
        self.time.update();
        self.stats.record_frame(self.time.delta());
        self.scene.update(self.time);
    }

    /// Render the scene through a camera component.
    pub fn render(&mut self, camera: ComponentId) -> Result<CameraMatrices, SceneError> {
        self.scene.render(camera, &mut self.context)
    }

    /// Run a fixed number of frames, without rendering.
    pub fn run_frames(&mut self, frames: u64) {
        log::info!(
            "running {} frame(s) of scene '{}'",
            frames,
            self.scene.name()
        );
        for _ in 0..frames {
            self.tick();
        }
    }
}
