//! Renderer crate for Event Horizon.
//!
//! The crate builds a black hole scene (event horizon, accretion disk, glow,
//! Einstein ring, lensing arcs, glow shells and a starfield), animates it and
//! presents it through `wgpu` in a `winit` window. The overall flow is:
//!
//! ```text
//!   eventhorizon CLI
//!          │ RendererConfig
//!          ▼
//!   Renderer::run ──▶ WindowState ──▶ winit event loop ──▶ FrameLoop::tick
//!                         │                                     │
//!                         ├─▶ SceneRuntime (graph, camera) ◀────┤ advance(dt)
//!                         └─▶ GpuState ◀────────────────────────┘ render(scene)
//! ```
//!
//! Everything under [`scene`], [`animation`], [`camera`], [`controls`],
//! [`runtime`] and [`shading`] is GPU-free and unit tested directly. The
//! GPU side lives in the private `gpu` module and only reads the scene.
//! [`FrameHooks`] lets the caller attach side channels such as audio.

pub mod animation;
pub mod camera;
mod compile;
pub mod controls;
mod gpu;
mod hooks;
pub mod probe;
pub mod runtime;
pub mod scene;
pub mod shading;
mod types;
mod window;

use anyhow::Result;

pub use hooks::{FrameHooks, NoopHooks};
pub use probe::{probe, CapabilityReport, ContextProvider, ContextRequest, WgpuProvider};
pub use runtime::{FrameClock, FrameLoop, FrameOutcome, FrameScheduler, TimeSample};
pub use scene::SceneRuntime;
pub use types::{AdapterProfile, Antialiasing, ColorSpaceMode, RendererConfig};

/// High-level entry point that owns the chosen configuration.
///
/// The heavy lifting lives in the window loop; `Renderer` validates the
/// scene and forwards the request.
pub struct Renderer {
    config: RendererConfig,
}

impl Renderer {
    pub fn new(config: RendererConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Opens the window and blocks until the user closes it.
    ///
    /// Returns an error if the scene configuration is invalid or the window
    /// or GPU context cannot be created.
    pub fn run<H>(self, hooks: H) -> Result<()>
    where
        H: FrameHooks + 'static,
    {
        self.config.scene.validate()?;
        window::run_window(self.config, hooks)
    }
}
