//! Penumbra bridge: wgpu implementation of `penumbra_rhi::GpuDevice` and the
//! `render_api::RenderBackend` implementations driving the renderer.

mod device;
mod plugin;
mod window_backend;

pub use device::WgpuDevice;
pub use plugin::PenumbraPlugin;
pub use window_backend::PenumbraWindowBackend;
