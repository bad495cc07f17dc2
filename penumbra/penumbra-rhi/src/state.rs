//! Fixed-function render state attached to draws.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Never,
    Less,
    Equal,
    LessOrEqual,
    Greater,
    NotEqual,
    GreaterOrEqual,
    Always,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StencilOp {
    Keep,
    Zero,
    Replace,
    IncrementWrap,
    DecrementWrap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StencilFaceState {
    pub compare: CompareOp,
    pub fail_op: StencilOp,
    pub depth_fail_op: StencilOp,
    pub pass_op: StencilOp,
}

impl StencilFaceState {
    /// Always passes, never modifies.
    pub const IGNORE: Self = Self {
        compare: CompareOp::Always,
        fail_op: StencilOp::Keep,
        depth_fail_op: StencilOp::Keep,
        pass_op: StencilOp::Keep,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StencilState {
    pub front: StencilFaceState,
    pub back: StencilFaceState,
    pub read_mask: u32,
    pub write_mask: u32,
    pub reference: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DepthState {
    pub compare: CompareOp,
    pub write: bool,
}

impl DepthState {
    pub const LESS_WRITE: Self = Self {
        compare: CompareOp::Less,
        write: true,
    };
    pub const LESS_READ_ONLY: Self = Self {
        compare: CompareOp::Less,
        write: false,
    };
    pub const DISABLED: Self = Self {
        compare: CompareOp::Always,
        write: false,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendFactor {
    Zero,
    One,
    SrcAlpha,
    OneMinusSrcAlpha,
}

/// Same factors for color and alpha, add operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlendState {
    pub src: BlendFactor,
    pub dst: BlendFactor,
}

impl BlendState {
    pub const ADDITIVE: Self = Self {
        src: BlendFactor::One,
        dst: BlendFactor::One,
    };
    pub const ALPHA: Self = Self {
        src: BlendFactor::SrcAlpha,
        dst: BlendFactor::OneMinusSrcAlpha,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CullMode {
    None,
    #[default]
    Back,
    Front,
}

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ColorWrites: u32 {
        const RED = 1 << 0;
        const GREEN = 1 << 1;
        const BLUE = 1 << 2;
        const ALPHA = 1 << 3;
        const ALL = Self::RED.bits() | Self::GREEN.bits() | Self::BLUE.bits() | Self::ALPHA.bits();
    }
}

/// Everything a draw needs besides program, bindings and geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PipelineState {
    /// Ignored when the target has no depth attachment.
    pub depth: DepthState,
    pub stencil: Option<StencilState>,
    pub blend: Option<BlendState>,
    pub cull: CullMode,
    pub color_writes: ColorWrites,
}

impl Default for PipelineState {
    fn default() -> Self {
        Self {
            depth: DepthState::LESS_WRITE,
            stencil: None,
            blend: None,
            cull: CullMode::Back,
            color_writes: ColorWrites::ALL,
        }
    }
}
