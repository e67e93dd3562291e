use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use tracing::{debug, error, info, trace, warn};
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::{ElementState, Event, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowBuilder};

use crate::controls::PointerButton;
use crate::gpu::GpuState;
use crate::hooks::{compose_title, FrameHooks};
use crate::runtime::{clock_for, FrameLoop, FrameOutcome, FrameScheduler};
use crate::scene::SceneRuntime;
use crate::types::{AdapterProfile, RendererConfig};

const SOFTWARE_FPS_CAP: f32 = 15.0;
/// Pixel-precise wheel deltas (touchpads) are scaled down to "lines".
const PIXELS_PER_SCROLL_LINE: f32 = 50.0;

/// Window, GPU resources and the scene they present.
struct WindowState {
    window: Arc<Window>,
    /// `None` once the loop is exiting and the surface has been released.
    gpu: Option<GpuState>,
    scene: SceneRuntime,
    frame_loop: FrameLoop,
    scheduler: FrameScheduler,
    title: String,
}

impl WindowState {
    fn new(window: Arc<Window>, config: &RendererConfig) -> Result<Self> {
        let size = window.inner_size();
        let scene = SceneRuntime::new(
            &config.scene,
            (size.width.max(1), size.height.max(1)),
            config.seed,
        );
        let gpu = GpuState::new(window.as_ref(), size, config, &scene)?;

        Ok(Self {
            window,
            gpu: Some(gpu),
            scene,
            frame_loop: FrameLoop::new(clock_for(&config.scene.animation)),
            scheduler: FrameScheduler::new(config.target_fps),
            title: config.title.clone(),
        })
    }

    fn window(&self) -> &Window {
        self.window.as_ref()
    }

    fn adapter_profile(&self) -> Option<&AdapterProfile> {
        self.gpu.as_ref().map(GpuState::adapter_profile)
    }

    fn size(&self) -> PhysicalSize<u32> {
        self.gpu
            .as_ref()
            .map(GpuState::size)
            .unwrap_or_else(|| self.window.inner_size())
    }

    fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if !self.scene.resize(new_size.width, new_size.height) {
            debug!(?new_size, "ignoring zero-sized resize");
            return;
        }
        if let Some(gpu) = self.gpu.as_mut() {
            gpu.resize(new_size);
        }
    }

    fn pointer_moved(&mut self, position: PhysicalPosition<f64>) {
        let viewport = self.scene.viewport();
        let fov = self.scene.camera().fov_y;
        self.scene
            .controls_mut()
            .pointer_moved(position.x as f32, position.y as f32, viewport, fov);
        self.scene.sync_camera();
    }

    fn pointer_button(&mut self, button: MouseButton, pressed: bool) {
        let button = match button {
            MouseButton::Left => PointerButton::Primary,
            MouseButton::Right => PointerButton::Secondary,
            _ => PointerButton::Other,
        };
        self.scene.controls_mut().button(button, pressed);
    }

    fn scroll(&mut self, delta: MouseScrollDelta) {
        let steps = match delta {
            MouseScrollDelta::LineDelta(_, y) => y,
            MouseScrollDelta::PixelDelta(position) => position.y as f32 / PIXELS_PER_SCROLL_LINE,
        };
        self.scene.controls_mut().zoom(steps);
        self.scene.sync_camera();
    }

    fn refresh_title<H: FrameHooks>(&self, hooks: &H) {
        let status = hooks.status();
        self.window
            .set_title(&compose_title(&self.title, status.as_deref()));
    }

    /// Advances the scene by one clock sample and draws it.
    fn render_frame(&mut self, now: Instant) -> FrameOutcome<wgpu::SurfaceError> {
        let Some(gpu) = self.gpu.as_mut() else {
            return FrameOutcome::Skipped;
        };
        let scene = &mut self.scene;
        self.frame_loop.tick(now, |sample| {
            scene.advance(sample.delta);
            gpu.render(scene)
        })
    }

    fn reconfigure(&mut self) {
        if let Some(gpu) = self.gpu.as_mut() {
            gpu.reconfigure();
        }
    }
}

/// Opens the window and drives the winit event loop until the user quits.
pub(crate) fn run_window<H>(config: RendererConfig, mut hooks: H) -> Result<()>
where
    H: FrameHooks + 'static,
{
    let event_loop = EventLoop::new().context("failed to initialize event loop")?;
    let window_size = PhysicalSize::new(config.surface_size.0, config.surface_size.1);
    let window = WindowBuilder::new()
        .with_title(config.title.as_str())
        .with_inner_size(window_size)
        .build(&event_loop)
        .context("failed to create window")?;
    let window = Arc::new(window);

    let mut state = WindowState::new(window, &config)?;

    if let Some(profile) = state.adapter_profile() {
        info!(
            adapter = %profile.name,
            vendor = %profile.vendor,
            backend = ?profile.backend,
            api = %profile.api_version(),
            "window renderer ready"
        );
        if profile.is_software() && config.target_fps.is_none() {
            warn!(
                adapter = %profile.name,
                cap = SOFTWARE_FPS_CAP,
                "software rasterizer detected; capping to {} FPS (override with --fps)",
                SOFTWARE_FPS_CAP
            );
            state.scheduler = FrameScheduler::new(Some(SOFTWARE_FPS_CAP));
        }
    }
    if let Some(gpu) = state.gpu.as_ref() {
        debug!(pipelines = gpu.pipeline_count(), "pipelines compiled");
    }
    state.refresh_title(&hooks);
    state.window().request_redraw();

    event_loop
        .run(move |event, elwt| match event {
            Event::WindowEvent { window_id, event } if window_id == state.window().id() => {
                match event {
                    WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                        elwt.exit();
                    }
                    WindowEvent::KeyboardInput { event, .. } => {
                        if event.state == ElementState::Pressed
                            && matches!(event.logical_key, Key::Named(NamedKey::Escape))
                        {
                            elwt.exit();
                        }
                    }
                    WindowEvent::CursorMoved { position, .. } => {
                        state.pointer_moved(position);
                    }
                    WindowEvent::CursorLeft { .. } => {
                        state.scene.controls_mut().pointer_left();
                    }
                    WindowEvent::MouseInput {
                        state: button_state,
                        button,
                        ..
                    } => {
                        let pressed = button_state == ElementState::Pressed;
                        state.pointer_button(button, pressed);
                        if pressed && button == MouseButton::Left {
                            hooks.on_pointer_press();
                            state.refresh_title(&hooks);
                        }
                    }
                    WindowEvent::MouseWheel { delta, .. } => {
                        state.scroll(delta);
                    }
                    WindowEvent::Occluded(occluded) => {
                        if occluded {
                            debug!("window occluded; pausing frame loop");
                            state.frame_loop.pause();
                        } else {
                            debug!("window visible; resuming frame loop");
                            state.frame_loop.resume();
                            state.scheduler.reset();
                            state.window().request_redraw();
                        }
                        hooks.on_visibility_changed(!occluded);
                        state.refresh_title(&hooks);
                    }
                    WindowEvent::Resized(new_size) => {
                        state.resize(new_size);
                    }
                    WindowEvent::ScaleFactorChanged {
                        mut inner_size_writer,
                        ..
                    } => {
                        let _ = inner_size_writer.request_inner_size(state.size());
                    }
                    WindowEvent::RedrawRequested => {
                        let now = Instant::now();
                        match state.render_frame(now) {
                            FrameOutcome::Rendered => state.scheduler.mark_rendered(now),
                            FrameOutcome::Skipped => {}
                            FrameOutcome::Failed(
                                wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated,
                            ) => {
                                state.reconfigure();
                            }
                            FrameOutcome::Failed(wgpu::SurfaceError::OutOfMemory) => {
                                error!("surface out of memory; exiting");
                                elwt.exit();
                            }
                            FrameOutcome::Failed(wgpu::SurfaceError::Timeout) => {
                                debug!("surface timeout; retrying next frame");
                            }
                            FrameOutcome::Failed(_) => {}
                        }
                    }
                    _ => {}
                }
            }
            Event::AboutToWait => {
                if !state.frame_loop.is_running() {
                    elwt.set_control_flow(ControlFlow::Wait);
                    return;
                }
                let now = Instant::now();
                if state.scheduler.ready_for_frame(now) {
                    trace!("scheduler: issuing redraw now");
                    state.window().request_redraw();
                    elwt.set_control_flow(ControlFlow::Wait);
                } else if let Some(deadline) = state.scheduler.next_deadline() {
                    trace!(
                        deadline_ms = deadline.saturating_duration_since(now).as_millis(),
                        "scheduler: waiting until next frame"
                    );
                    elwt.set_control_flow(ControlFlow::WaitUntil(deadline));
                } else {
                    elwt.set_control_flow(ControlFlow::Wait);
                }
            }
            Event::LoopExiting => {
                info!(
                    frames = state.frame_loop.frames(),
                    failed_frames = state.frame_loop.failed_frames(),
                    time = state.scene.shader_time(),
                    "event loop exiting"
                );
                state.gpu = None;
                hooks.on_exit();
            }
            _ => {}
        })
        .map_err(|err| anyhow!("event loop error: {err}"))
}
