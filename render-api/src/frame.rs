//! Per-frame selection types shared by host and backend.

/// Which pipeline renders the frame. The two are mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RenderMode {
    Forward,
    #[default]
    Deferred,
}

impl RenderMode {
    pub fn toggled(self) -> Self {
        match self {
            Self::Forward => Self::Deferred,
            Self::Deferred => Self::Forward,
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "forward" => Some(Self::Forward),
            "deferred" => Some(Self::Deferred),
            _ => None,
        }
    }
}

/// Attachment shown by the deferred composite pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RenderTarget {
    Position,
    Diffuse,
    Normals,
    Depth,
    #[default]
    Final,
}

impl RenderTarget {
    pub const ALL: [RenderTarget; 5] = [
        RenderTarget::Position,
        RenderTarget::Diffuse,
        RenderTarget::Normals,
        RenderTarget::Depth,
        RenderTarget::Final,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Position => "position",
            Self::Diffuse => "diffuse",
            Self::Normals => "normals",
            Self::Depth => "depth",
            Self::Final => "final",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|t| t.name() == name)
    }
}

/// Frame timing and output size, supplied by the host every frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInfo {
    pub viewport_size: (u32, u32),
    pub delta_seconds: f32,
}

impl Default for FrameInfo {
    fn default() -> Self {
        Self {
            viewport_size: (800, 600),
            delta_seconds: 1.0 / 60.0,
        }
    }
}
