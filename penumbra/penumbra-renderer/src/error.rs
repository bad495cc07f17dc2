//! Error types for the renderer. Every fallible operation returns one of these; setup errors are fatal.

use std::path::PathBuf;

use penumbra_rhi::RhiError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConstantBufferError {
    #[error("constant buffer '{label}': writing {requested} bytes at head {head} exceeds capacity {capacity}")]
    Overflow {
        label: String,
        head: u32,
        requested: u32,
        capacity: u32,
    },

    #[error("constant buffer alignment must be non-zero")]
    ZeroAlignment,

    #[error("constant buffer '{0}' is mapped and cannot be bound")]
    Mapped(String),

    #[error("range {offset}+{size} of constant buffer '{label}' was not written this frame (head {head})")]
    Unwritten {
        label: String,
        offset: u32,
        size: u32,
        head: u32,
    },

    #[error(transparent)]
    Device(#[from] RhiError),
}

#[derive(Debug, Error)]
pub enum VertexBindingError {
    #[error("submesh {submesh} of mesh {mesh} has no attribute for program '{program}' input location {location}")]
    MissingAttribute {
        mesh: u32,
        submesh: usize,
        program: String,
        location: u32,
    },

    #[error("vertex array cache of submesh {submesh} in mesh {mesh} is full ({limit} programs)")]
    CacheFull { mesh: u32, submesh: usize, limit: usize },

    #[error("unknown {kind} {index}")]
    UnknownHandle { kind: &'static str, index: u32 },

    #[error(transparent)]
    Device(#[from] RhiError),
}

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode image '{path}': {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to load model '{path}': {source}")]
    Model {
        path: PathBuf,
        #[source]
        source: tobj::LoadError,
    },

    #[error("model '{0}' contains no geometry")]
    EmptyModel(PathBuf),

    #[error("model has {materials} materials for {submeshes} submeshes")]
    MaterialCount { materials: usize, submeshes: usize },

    #[error("texture '{path}' has {len} bytes, expected {expected}")]
    PixelCount { path: String, len: usize, expected: usize },

    #[error(transparent)]
    Device(#[from] RhiError),
}

#[derive(Debug, Error)]
pub enum RendererError {
    #[error(transparent)]
    Device(#[from] RhiError),

    #[error(transparent)]
    ConstantBuffer(#[from] ConstantBufferError),

    #[error(transparent)]
    VertexBinding(#[from] VertexBindingError),

    #[error(transparent)]
    Asset(#[from] AssetError),

    #[error("framebuffer '{label}' is incomplete: {reason}")]
    FramebufferIncomplete { label: &'static str, reason: &'static str },

    #[error("scene has {count} lights, at most {max} are supported")]
    TooManyLights { count: usize, max: usize },

    #[error("invalid viewport {width}x{height}")]
    InvalidViewport { width: u32, height: u32 },

    #[error("mesh '{label}' has no submeshes")]
    EmptyMesh { label: String },
}
