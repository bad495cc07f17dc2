//! Penumbra plugin: implements RenderBackend for the host over any GpuDevice.

use anyhow::Context;
use penumbra_renderer::{Renderer, RendererConfig, RendererError};
use penumbra_rhi::GpuDevice;
use render_api::{FrameInfo, Input, RenderBackend};

/// Owns a device and the renderer driving it.
pub struct PenumbraPlugin<D: GpuDevice> {
    device: D,
    renderer: Renderer,
}

impl<D: GpuDevice> PenumbraPlugin<D> {
    /// Build the renderer on `device` for a `(width, height)` viewport.
    pub fn new(mut device: D, config: RendererConfig, (width, height): (u32, u32)) -> anyhow::Result<Self> {
        let renderer = Renderer::new(&mut device, config, width, height).context("renderer setup failed")?;
        Ok(Self { device, renderer })
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut Renderer {
        &mut self.renderer
    }

    /// Run `f` with the renderer and its device, e.g. to load models or populate the scene.
    pub fn setup<T>(
        &mut self,
        f: impl FnOnce(&mut Renderer, &mut dyn GpuDevice) -> Result<T, RendererError>,
    ) -> Result<T, RendererError> {
        f(&mut self.renderer, &mut self.device)
    }
}

impl<D: GpuDevice + Send> RenderBackend for PenumbraPlugin<D> {
    fn update(&mut self, input: &Input, frame: &FrameInfo) -> anyhow::Result<()> {
        self.renderer.update(&mut self.device, input, frame)?;
        Ok(())
    }

    fn render_frame(&mut self, frame: &FrameInfo) -> anyhow::Result<()> {
        let (width, height) = frame.viewport_size;
        if width == 0 || height == 0 {
            log::trace!("skipping frame for a {width}x{height} viewport");
            return Ok(());
        }
        self.renderer.render(&mut self.device)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use penumbra_renderer::demo::build_demo_scene;
    use penumbra_rhi::headless::RecordingDevice;

    fn frame(width: u32, height: u32) -> FrameInfo {
        FrameInfo {
            viewport_size: (width, height),
            delta_seconds: 1.0 / 60.0,
        }
    }

    #[test]
    fn renders_the_demo_scene_through_the_backend_trait() {
        let mut plugin = PenumbraPlugin::new(RecordingDevice::new(), RendererConfig::default(), (320, 240)).unwrap();
        plugin.setup(|renderer, device| build_demo_scene(renderer, device, None)).unwrap();

        let backend: &mut dyn RenderBackend = &mut plugin;
        backend.update(&Input::new(), &frame(320, 240)).unwrap();
        backend.render_frame(&frame(320, 240)).unwrap();

        let submitted = plugin.device().last_submission().unwrap();
        assert_eq!(submitted.passes().last().unwrap().label, "composite");
    }

    #[test]
    fn minimised_window_skips_the_frame() {
        let mut plugin = PenumbraPlugin::new(RecordingDevice::new(), RendererConfig::default(), (320, 240)).unwrap();
        plugin.render_frame(&frame(0, 240)).unwrap();
        assert!(plugin.device().submissions().is_empty());
    }
}
