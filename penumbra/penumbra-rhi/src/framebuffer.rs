//! Framebuffer completeness rules shared by every backend.

use crate::{TextureInfo, TextureUsage};

pub const MAX_COLOR_ATTACHMENTS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FramebufferStatus {
    Complete,
    /// No attachment at all.
    MissingAttachment,
    /// An attachment is unknown, empty, of the wrong kind, or not renderable.
    IncompleteAttachment,
    /// Attachments disagree on size.
    IncompleteDimensions,
    TooManyColorAttachments,
}

impl FramebufferStatus {
    pub fn is_complete(self) -> bool {
        self == Self::Complete
    }

    pub fn reason_code(self) -> &'static str {
        match self {
            Self::Complete => "FRAMEBUFFER_COMPLETE",
            Self::MissingAttachment => "FRAMEBUFFER_INCOMPLETE_MISSING_ATTACHMENT",
            Self::IncompleteAttachment => "FRAMEBUFFER_INCOMPLETE_ATTACHMENT",
            Self::IncompleteDimensions => "FRAMEBUFFER_INCOMPLETE_DIMENSIONS",
            Self::TooManyColorAttachments => "FRAMEBUFFER_INCOMPLETE_TOO_MANY_COLOR_ATTACHMENTS",
        }
    }
}

/// Validate resolved attachments. `None` entries are handles the device does not know.
/// `depth_stencil` is `None` when the framebuffer has no depth attachment.
pub fn check_framebuffer(colors: &[Option<TextureInfo>], depth_stencil: Option<Option<TextureInfo>>) -> FramebufferStatus {
    if colors.is_empty() && depth_stencil.is_none() {
        return FramebufferStatus::MissingAttachment;
    }
    if colors.len() > MAX_COLOR_ATTACHMENTS {
        return FramebufferStatus::TooManyColorAttachments;
    }

    let mut size: Option<(u32, u32)> = None;
    let mut dimensions_match = true;
    let mut visit = |info: &TextureInfo| {
        let s = (info.width, info.height);
        match size {
            None => size = Some(s),
            Some(prev) if prev != s => dimensions_match = false,
            Some(_) => {}
        }
    };

    for color in colors {
        let Some(info) = color else {
            return FramebufferStatus::IncompleteAttachment;
        };
        if info.format.is_depth() || !renderable(info) {
            return FramebufferStatus::IncompleteAttachment;
        }
        visit(info);
    }
    if let Some(depth) = depth_stencil {
        let Some(info) = depth else {
            return FramebufferStatus::IncompleteAttachment;
        };
        if !info.format.is_depth() || !renderable(&info) {
            return FramebufferStatus::IncompleteAttachment;
        }
        visit(&info);
    }

    if dimensions_match {
        FramebufferStatus::Complete
    } else {
        FramebufferStatus::IncompleteDimensions
    }
}

fn renderable(info: &TextureInfo) -> bool {
    info.width > 0 && info.height > 0 && info.usage.contains(TextureUsage::RENDER_ATTACHMENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TextureFormat;

    fn target(width: u32, height: u32, format: TextureFormat) -> Option<TextureInfo> {
        Some(TextureInfo {
            width,
            height,
            format,
            usage: TextureUsage::RENDER_ATTACHMENT | TextureUsage::TEXTURE_BINDING,
        })
    }

    #[test]
    fn gbuffer_layout_is_complete() {
        let colors = [
            target(640, 480, TextureFormat::Rgba16Float),
            target(640, 480, TextureFormat::Rgba16Float),
            target(640, 480, TextureFormat::Rgba8Unorm),
        ];
        let status = check_framebuffer(&colors, Some(target(640, 480, TextureFormat::Depth24PlusStencil8)));
        assert_eq!(status, FramebufferStatus::Complete);
    }

    #[test]
    fn empty_framebuffer_is_missing_attachment() {
        assert_eq!(check_framebuffer(&[], None), FramebufferStatus::MissingAttachment);
    }

    #[test]
    fn mismatched_sizes_are_reported() {
        let colors = [target(640, 480, TextureFormat::Rgba8Unorm)];
        let status = check_framebuffer(&colors, Some(target(320, 240, TextureFormat::Depth32Float)));
        assert_eq!(status, FramebufferStatus::IncompleteDimensions);
        assert_eq!(status.reason_code(), "FRAMEBUFFER_INCOMPLETE_DIMENSIONS");
    }

    #[test]
    fn wrong_kind_or_unknown_attachment_is_incomplete() {
        let depth_as_color = [target(8, 8, TextureFormat::Depth32Float)];
        assert_eq!(check_framebuffer(&depth_as_color, None), FramebufferStatus::IncompleteAttachment);

        let color_as_depth = check_framebuffer(&[], Some(target(8, 8, TextureFormat::Rgba8Unorm)));
        assert_eq!(color_as_depth, FramebufferStatus::IncompleteAttachment);

        assert_eq!(check_framebuffer(&[None], None), FramebufferStatus::IncompleteAttachment);

        let sampled_only = [Some(TextureInfo {
            width: 8,
            height: 8,
            format: TextureFormat::Rgba8Unorm,
            usage: TextureUsage::TEXTURE_BINDING,
        })];
        assert_eq!(check_framebuffer(&sampled_only, None), FramebufferStatus::IncompleteAttachment);
    }

    #[test]
    fn too_many_color_attachments() {
        let colors = vec![target(4, 4, TextureFormat::Rgba8Unorm); MAX_COLOR_ATTACHMENTS + 1];
        assert_eq!(check_framebuffer(&colors, None), FramebufferStatus::TooManyColorAttachments);
    }
}
