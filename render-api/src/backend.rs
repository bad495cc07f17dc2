//! Traits the host uses to drive a render backend uniformly.

use crate::{FrameInfo, Input};
use raw_window_handle::{RawDisplayHandle, RawWindowHandle};

pub trait RenderBackend: Send {
    /// Update phase: consume this frame's input, move the camera and pack per-frame parameters.
    fn update(&mut self, input: &Input, frame: &FrameInfo) -> anyhow::Result<()>;

    /// Render one frame into the backend's default target. Submits work internally.
    fn render_frame(&mut self, frame: &FrameInfo) -> anyhow::Result<()>;
}

/// Extension for backends that can present to a window. Host passes raw handles (e.g. from winit);
/// the backend owns the surface and acquires/presents internally.
pub trait RenderBackendWindow: RenderBackend + Send {
    /// Render one frame and present it. The surface is configured from `frame.viewport_size`.
    fn render_frame_to_window(
        &mut self,
        frame: &FrameInfo,
        raw_window_handle: RawWindowHandle,
        raw_display_handle: RawDisplayHandle,
    ) -> anyhow::Result<()>;
}
