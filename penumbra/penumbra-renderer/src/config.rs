//! Penumbra configuration: pipeline selection, clear color, tone mapping, buffer sizes.

use glam::Vec3;
use penumbra_rhi::ClearColor;
use render_api::{RenderMode, RenderTarget};

/// Tone mapping applied when compositing the lit result.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ToneMapping {
    #[default]
    Reinhard,
    /// No tone mapping (clamp).
    None,
}

impl ToneMapping {
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "reinhard" => Some(Self::Reinhard),
            "none" | "off" => Some(Self::None),
            _ => None,
        }
    }
}

pub const ENV_MODE: &str = "PENUMBRA_MODE";
pub const ENV_TARGET: &str = "PENUMBRA_TARGET";
pub const ENV_TONE_MAPPING: &str = "PENUMBRA_TONE_MAPPING";

/// Renderer and bridge configuration.
#[derive(Clone, Debug)]
pub struct RendererConfig {
    /// Pipeline used at startup; `F` toggles it at run time.
    pub mode: RenderMode,
    /// Attachment shown by the deferred composite pass.
    pub target: RenderTarget,
    pub clear_color: ClearColor,
    pub tone_mapping: ToneMapping,
    pub camera_position: Vec3,
    /// Vertex arrays cached per submesh before `find_vao` refuses new programs.
    pub vao_cache_limit: usize,
    /// Capacity of the entity buffer; `None` uses the device's max uniform block size.
    pub entity_buffer_capacity: Option<u32>,
    /// Capacity of the light-volume buffer; `None` uses the device's max uniform block size.
    pub light_volume_buffer_capacity: Option<u32>,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            mode: RenderMode::default(),
            target: RenderTarget::default(),
            clear_color: ClearColor::new(0.1, 0.1, 0.1, 1.0),
            tone_mapping: ToneMapping::default(),
            camera_position: Vec3::new(-3.0, 5.0, -15.0),
            vao_cache_limit: 16,
            entity_buffer_capacity: None,
            light_volume_buffer_capacity: None,
        }
    }
}

impl RendererConfig {
    /// Defaults overridden by `PENUMBRA_MODE`, `PENUMBRA_TARGET` and `PENUMBRA_TONE_MAPPING`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_overrides(|key| std::env::var(key).ok());
        config
    }

    /// Apply overrides from `lookup` (an environment-like key → value source).
    /// Unrecognised values are logged and ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(value) = lookup(ENV_MODE) {
            match RenderMode::parse(&value) {
                Some(mode) => self.mode = mode,
                None => log::warn!("{ENV_MODE}={value}: expected 'forward' or 'deferred'"),
            }
        }
        if let Some(value) = lookup(ENV_TARGET) {
            match RenderTarget::parse(&value) {
                Some(target) => self.target = target,
                None => log::warn!("{ENV_TARGET}={value}: expected position, diffuse, normals, depth or final"),
            }
        }
        if let Some(value) = lookup(ENV_TONE_MAPPING) {
            match ToneMapping::parse(&value) {
                Some(tone_mapping) => self.tone_mapping = tone_mapping,
                None => log::warn!("{ENV_TONE_MAPPING}={value}: expected 'reinhard' or 'none'"),
            }
        }
    }
}
