//! `wgpu` adapter (feature `wgpu`).
//!
//! Converts a [`VertexLayout`] into an owned vertex buffer description and the
//! render state enums into their `wgpu` counterparts.

use crate::layout::{Attribute, AttributeType, VertexLayout};
use crate::state::{Blend, BlendFactor, BlendOp, ColorMask, CompareFunc, CullMode, StencilOp};

/// Owned form of `wgpu::VertexBufferLayout`.
#[derive(Debug, Clone)]
pub struct OwnedVertexBufferDesc {
    pub array_stride: u64,
    pub step_mode: wgpu::VertexStepMode,
    pub attributes: Vec<wgpu::VertexAttribute>,
}

impl OwnedVertexBufferDesc {
    #[must_use]
    pub fn as_wgpu(&self) -> wgpu::VertexBufferLayout<'_> {
        wgpu::VertexBufferLayout {
            array_stride: self.array_stride,
            step_mode: self.step_mode,
            attributes: &self.attributes,
        }
    }
}

/// The `wgpu` vertex format of an attribute, if one exists.
#[must_use]
pub fn vertex_format(attribute: &Attribute) -> Option<wgpu::VertexFormat> {
    use wgpu::VertexFormat as F;

    let format = match (attribute.ty, attribute.normalized, attribute.count) {
        (AttributeType::Float, _, 1) => F::Float32,
        (AttributeType::Float, _, 2) => F::Float32x2,
        (AttributeType::Float, _, 3) => F::Float32x3,
        (AttributeType::Float, _, 4) => F::Float32x4,

        (AttributeType::Int, false, 1) => F::Sint32,
        (AttributeType::Int, false, 2) => F::Sint32x2,
        (AttributeType::Int, false, 3) => F::Sint32x3,
        (AttributeType::Int, false, 4) => F::Sint32x4,

        (AttributeType::Short, false, 1) => F::Sint16,
        (AttributeType::Short, false, 2) => F::Sint16x2,
        (AttributeType::Short, false, 4) => F::Sint16x4,
        (AttributeType::Short, true, 1) => F::Snorm16,
        (AttributeType::Short, true, 2) => F::Snorm16x2,
        (AttributeType::Short, true, 4) => F::Snorm16x4,

        (AttributeType::Byte, false, 1) => F::Sint8,
        (AttributeType::Byte, false, 2) => F::Sint8x2,
        (AttributeType::Byte, false, 4) => F::Sint8x4,
        (AttributeType::Byte, true, 1) => F::Snorm8,
        (AttributeType::Byte, true, 2) => F::Snorm8x2,
        (AttributeType::Byte, true, 4) => F::Snorm8x4,

        _ => return None,
    };
    Some(format)
}

impl VertexLayout {
    /// A single interleaved vertex buffer holding every attribute, with shader
    /// locations in attribute order.
    ///
    /// Returns `None` when an attribute has no `wgpu` vertex format.
    #[must_use]
    pub fn to_wgpu(&self, step_mode: wgpu::VertexStepMode) -> Option<OwnedVertexBufferDesc> {
        let mut attributes = Vec::with_capacity(self.attributes().len());
        for (location, attribute) in self.attributes().iter().enumerate() {
            let Some(format) = vertex_format(attribute) else {
                log::warn!(
                    "Attribute '{}' ({} x{}{}) has no wgpu vertex format",
                    attribute.name,
                    attribute.ty.name(),
                    attribute.count,
                    if attribute.normalized { ", normalized" } else { "" }
                );
                return None;
            };
            attributes.push(wgpu::VertexAttribute {
                format,
                offset: u64::from(attribute.offset),
                shader_location: location as u32,
            });
        }

        Some(OwnedVertexBufferDesc {
            array_stride: u64::from(self.stride()),
            step_mode,
            attributes,
        })
    }
}

impl From<CompareFunc> for wgpu::CompareFunction {
    fn from(func: CompareFunc) -> Self {
        match func {
            CompareFunc::Never => Self::Never,
            CompareFunc::Less => Self::Less,
            CompareFunc::Equal => Self::Equal,
            CompareFunc::LessEqual => Self::LessEqual,
            CompareFunc::Greater => Self::Greater,
            CompareFunc::NotEqual => Self::NotEqual,
            CompareFunc::GreaterEqual => Self::GreaterEqual,
            CompareFunc::Always => Self::Always,
        }
    }
}

impl From<StencilOp> for wgpu::StencilOperation {
    fn from(op: StencilOp) -> Self {
        match op {
            StencilOp::Keep => Self::Keep,
            StencilOp::Zero => Self::Zero,
            StencilOp::Replace => Self::Replace,
            StencilOp::Increment => Self::IncrementClamp,
            StencilOp::IncrementWrap => Self::IncrementWrap,
            StencilOp::Decrement => Self::DecrementClamp,
            StencilOp::DecrementWrap => Self::DecrementWrap,
            StencilOp::Invert => Self::Invert,
        }
    }
}

impl From<BlendFactor> for wgpu::BlendFactor {
    fn from(factor: BlendFactor) -> Self {
        match factor {
            BlendFactor::Zero => Self::Zero,
            BlendFactor::One => Self::One,
            BlendFactor::SrcColor => Self::Src,
            BlendFactor::OneMinusSrcColor => Self::OneMinusSrc,
            BlendFactor::DstColor => Self::Dst,
            BlendFactor::OneMinusDstColor => Self::OneMinusDst,
            BlendFactor::SrcAlpha => Self::SrcAlpha,
            BlendFactor::OneMinusSrcAlpha => Self::OneMinusSrcAlpha,
            BlendFactor::DstAlpha => Self::DstAlpha,
            BlendFactor::OneMinusDstAlpha => Self::OneMinusDstAlpha,
            BlendFactor::ConstantColor => Self::Constant,
            BlendFactor::OneMinusConstantColor => Self::OneMinusConstant,
            BlendFactor::SrcAlphaSaturate => Self::SrcAlphaSaturated,
        }
    }
}

impl From<BlendOp> for wgpu::BlendOperation {
    fn from(op: BlendOp) -> Self {
        match op {
            BlendOp::Add => Self::Add,
            BlendOp::Subtract => Self::Subtract,
            BlendOp::ReverseSubtract => Self::ReverseSubtract,
            BlendOp::Min => Self::Min,
            BlendOp::Max => Self::Max,
        }
    }
}

impl From<ColorMask> for wgpu::ColorWrites {
    fn from(mask: ColorMask) -> Self {
        Self::from_bits_truncate(mask.bits())
    }
}

impl Blend {
    /// `None` for disabled blending.
    #[must_use]
    pub fn to_wgpu(self) -> Option<wgpu::BlendState> {
        match self {
            Blend::Disabled => None,
            Blend::Enabled { src, dst, op } => {
                let component = wgpu::BlendComponent {
                    src_factor: src.into(),
                    dst_factor: dst.into(),
                    operation: op.into(),
                };
                Some(wgpu::BlendState {
                    color: component,
                    alpha: component,
                })
            }
        }
    }
}

impl CullMode {
    /// The face `wgpu` should cull. `FrontAndBack` cannot be expressed and
    /// maps to no culling.
    #[must_use]
    pub fn to_wgpu(self) -> Option<wgpu::Face> {
        match self {
            CullMode::None => None,
            CullMode::Front => Some(wgpu::Face::Front),
            CullMode::Back => Some(wgpu::Face::Back),
            CullMode::FrontAndBack => {
                log::warn!("wgpu cannot cull both faces, culling disabled");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{AttributeDecl, VertexLayoutBuilder};

    #[test]
    fn test_vertex_buffer_desc() {
        let mut builder = VertexLayoutBuilder::new();
        builder.add("position", AttributeDecl::new(AttributeType::Float, 3));
        builder.add("color", AttributeDecl::new(AttributeType::Byte, 4).normalized());
        builder.begin_packed(None);
        builder.add_packed_field("flags", AttributeType::Byte, 1, 4).unwrap();
        builder.end_packed();
        let layout = builder.build();

        let desc = layout.to_wgpu(wgpu::VertexStepMode::Vertex).unwrap();
        assert_eq!(desc.array_stride, 20);
        let formats: Vec<_> = desc.attributes.iter().map(|a| a.format).collect();
        assert_eq!(
            formats,
            vec![
                wgpu::VertexFormat::Float32x3,
                wgpu::VertexFormat::Snorm8x4,
                wgpu::VertexFormat::Sint32
            ]
        );
        assert_eq!(desc.as_wgpu().attributes[2].offset, 16);
    }

    #[test]
    fn test_unrepresentable_attribute() {
        let mut builder = VertexLayoutBuilder::new();
        builder.add("rgb", AttributeDecl::new(AttributeType::Byte, 3));
        assert!(builder.build().to_wgpu(wgpu::VertexStepMode::Vertex).is_none());
    }

    #[test]
    fn test_state_conversions() {
        assert_eq!(CullMode::Back.to_wgpu(), Some(wgpu::Face::Back));
        assert_eq!(Blend::Disabled.to_wgpu(), None);
        assert_eq!(
            wgpu::ColorWrites::from(ColorMask::R | ColorMask::A),
            wgpu::ColorWrites::RED | wgpu::ColorWrites::ALPHA
        );
        assert_eq!(
            wgpu::CompareFunction::from(CompareFunc::LessEqual),
            wgpu::CompareFunction::LessEqual
        );
    }
}
