//! Window-capable backend: created from a window, implements RenderBackendWindow.

use anyhow::{anyhow, Context};
use penumbra_renderer::{Renderer, RendererConfig, RendererError};
use penumbra_rhi::GpuDevice;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle, RawDisplayHandle, RawWindowHandle};
use render_api::{FrameInfo, Input, RenderBackend, RenderBackendWindow};
use wgpu::SurfaceTargetUnsafe;

use crate::device::WgpuDevice;
use crate::plugin::PenumbraPlugin;

/// Owns the wgpu instance and a [`PenumbraPlugin`] over a [`WgpuDevice`].
/// The surface is recreated every frame from the raw handles the host passes in, so its
/// lifetime never outlives the window.
pub struct PenumbraWindowBackend {
    instance: wgpu::Instance,
    format: wgpu::TextureFormat,
    plugin: PenumbraPlugin<WgpuDevice>,
}

impl PenumbraWindowBackend {
    /// Create a backend from a window (e.g. winit). The window is only used for its raw
    /// handles and to pick an adapter that can present to it; the host keeps it alive.
    pub fn from_window(
        window: &(impl HasWindowHandle + HasDisplayHandle),
        config: RendererConfig,
        viewport_size: (u32, u32),
    ) -> anyhow::Result<Self> {
        let (raw_window, raw_display) = {
            let wh = window.window_handle().context("window handle unavailable")?;
            let dh = window.display_handle().context("display handle unavailable")?;
            (wh.as_raw(), dh.as_raw())
        };
        pollster::block_on(Self::from_raw_handles_async(raw_window, raw_display, config, viewport_size))
    }

    async fn from_raw_handles_async(
        raw_window_handle: RawWindowHandle,
        raw_display_handle: RawDisplayHandle,
        config: RendererConfig,
        (width, height): (u32, u32),
    ) -> anyhow::Result<Self> {
        let instance = wgpu::Instance::default();
        let target = SurfaceTargetUnsafe::RawHandle {
            raw_window_handle,
            raw_display_handle,
        };
        let surface = unsafe { instance.create_surface_unsafe(target)? };
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| anyhow!("no adapter can present to this window"))?;
        log::info!("adapter: {:?}", adapter.get_info());
        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("penumbra_device"),
                    ..Default::default()
                },
                None,
            )
            .await?;
        let format = surface
            .get_capabilities(&adapter)
            .formats
            .first()
            .copied()
            .unwrap_or(wgpu::TextureFormat::Bgra8Unorm);
        drop(surface);

        let plugin = PenumbraPlugin::new(WgpuDevice::new(device, queue), config, (width.max(1), height.max(1)))?;
        Ok(Self {
            instance,
            format,
            plugin,
        })
    }

    pub fn renderer(&self) -> &Renderer {
        self.plugin.renderer()
    }

    /// See [`PenumbraPlugin::setup`].
    pub fn setup<T>(
        &mut self,
        f: impl FnOnce(&mut Renderer, &mut dyn GpuDevice) -> Result<T, RendererError>,
    ) -> Result<T, RendererError> {
        self.plugin.setup(f)
    }

    fn surface_config(&self, width: u32, height: u32) -> wgpu::SurfaceConfiguration {
        let srgb = self.format.add_srgb_suffix();
        wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: self.format,
            width,
            height,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: wgpu::CompositeAlphaMode::Opaque,
            view_formats: if srgb == self.format { vec![] } else { vec![srgb] },
            desired_maximum_frame_latency: 2,
        }
    }
}

impl RenderBackend for PenumbraWindowBackend {
    fn update(&mut self, input: &Input, frame: &FrameInfo) -> anyhow::Result<()> {
        self.plugin.update(input, frame)
    }

    /// Renders offscreen; use [`RenderBackendWindow::render_frame_to_window`] to present.
    fn render_frame(&mut self, frame: &FrameInfo) -> anyhow::Result<()> {
        self.plugin.render_frame(frame)
    }
}

impl RenderBackendWindow for PenumbraWindowBackend {
    fn render_frame_to_window(
        &mut self,
        frame: &FrameInfo,
        raw_window_handle: RawWindowHandle,
        raw_display_handle: RawDisplayHandle,
    ) -> anyhow::Result<()> {
        let (width, height) = frame.viewport_size;
        if width == 0 || height == 0 {
            return Ok(());
        }
        let target = SurfaceTargetUnsafe::RawHandle {
            raw_window_handle,
            raw_display_handle,
        };
        let surface = unsafe { self.instance.create_surface_unsafe(target)? };
        let config = self.surface_config(width, height);
        surface.configure(self.plugin.device().device(), &config);

        let surface_texture = match surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Outdated | wgpu::SurfaceError::Lost) => {
                surface.configure(self.plugin.device().device(), &config);
                surface.get_current_texture()?
            }
            Err(wgpu::SurfaceError::Timeout) => return Err(anyhow!("surface texture acquisition timed out")),
            Err(e) => return Err(e.into()),
        };
        let srgb = self.format.add_srgb_suffix();
        let view = surface_texture.texture.create_view(&wgpu::TextureViewDescriptor {
            format: Some(srgb),
            ..Default::default()
        });

        self.plugin.device_mut().set_surface_target(view, srgb, width, height);
        let rendered = self.plugin.render_frame(frame);
        self.plugin.device_mut().release_surface_target();
        rendered?;
        surface_texture.present();
        Ok(())
    }
}
