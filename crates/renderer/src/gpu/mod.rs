//! GPU side of the renderer.
//!
//! - `context` owns the wgpu instance, device and surface and rebuilds the
//!   swapchain when the window resizes.
//! - `mesh` uploads scene geometry into vertex/index buffers.
//! - `pipeline` compiles the material shaders into render pipelines keyed by
//!   blending, culling and depth behaviour.
//! - `uniforms` mirrors the GLSL uniform blocks.
//! - `state` glues everything together and walks the scene graph each frame.

mod context;
mod mesh;
mod pipeline;
mod state;
mod uniforms;

pub(crate) use state::GpuState;
