//! Fixed-function render state from the `state` section.
//!
//! Every field is optional; `None` leaves the backend default in place.

use bitflags::bitflags;
use serde::Serialize;

bitflags! {
    /// Color channels written by the pipeline.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
    pub struct ColorMask: u32 {
        const R = 1 << 0;
        const G = 1 << 1;
        const B = 1 << 2;
        const A = 1 << 3;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CullMode {
    None,
    Front,
    Back,
    FrontAndBack,
}

impl CullMode {
    #[must_use]
    pub fn parse(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "none" => Some(Self::None),
            "front" => Some(Self::Front),
            "back" => Some(Self::Back),
            "front_and_back" => Some(Self::FrontAndBack),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BlendFactor {
    Zero,
    One,
    SrcColor,
    OneMinusSrcColor,
    DstColor,
    OneMinusDstColor,
    SrcAlpha,
    OneMinusSrcAlpha,
    DstAlpha,
    OneMinusDstAlpha,
    ConstantColor,
    OneMinusConstantColor,
    SrcAlphaSaturate,
}

impl BlendFactor {
    #[must_use]
    pub fn parse(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "zero" => Some(Self::Zero),
            "one" => Some(Self::One),
            "src_color" => Some(Self::SrcColor),
            "one_minus_src_color" => Some(Self::OneMinusSrcColor),
            "dst_color" => Some(Self::DstColor),
            "one_minus_dst_color" => Some(Self::OneMinusDstColor),
            "src_alpha" => Some(Self::SrcAlpha),
            "one_minus_src_alpha" => Some(Self::OneMinusSrcAlpha),
            "dst_alpha" => Some(Self::DstAlpha),
            "one_minus_dst_alpha" => Some(Self::OneMinusDstAlpha),
            "constant_color" => Some(Self::ConstantColor),
            "one_minus_constant_color" => Some(Self::OneMinusConstantColor),
            "src_alpha_saturate" => Some(Self::SrcAlphaSaturate),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub enum BlendOp {
    #[default]
    Add,
    Subtract,
    ReverseSubtract,
    Min,
    Max,
}

impl BlendOp {
    #[must_use]
    pub fn parse(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "add" => Some(Self::Add),
            "subtract" => Some(Self::Subtract),
            "reverse_subtract" => Some(Self::ReverseSubtract),
            "min" => Some(Self::Min),
            "max" => Some(Self::Max),
            _ => None,
        }
    }
}

/// Blending configuration. `Disabled` corresponds to `blend off`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Blend {
    Disabled,
    Enabled {
        src: BlendFactor,
        dst: BlendFactor,
        op: BlendOp,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CompareFunc {
    Never,
    Less,
    Equal,
    LessEqual,
    Greater,
    NotEqual,
    GreaterEqual,
    Always,
}

impl CompareFunc {
    #[must_use]
    pub fn parse(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "never" => Some(Self::Never),
            "less" => Some(Self::Less),
            "equal" => Some(Self::Equal),
            "lequal" => Some(Self::LessEqual),
            "greater" => Some(Self::Greater),
            "notequal" => Some(Self::NotEqual),
            "gequal" => Some(Self::GreaterEqual),
            "always" => Some(Self::Always),
            _ => None,
        }
    }
}

/// Depth testing. `Disabled` corresponds to `depth off`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DepthTest {
    Disabled,
    Enabled(CompareFunc),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum StencilOp {
    Keep,
    Zero,
    Replace,
    Increment,
    IncrementWrap,
    Decrement,
    DecrementWrap,
    Invert,
}

impl StencilOp {
    #[must_use]
    pub fn parse(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "keep" => Some(Self::Keep),
            "zero" => Some(Self::Zero),
            "replace" => Some(Self::Replace),
            "incr" => Some(Self::Increment),
            "incr_wrap" => Some(Self::IncrementWrap),
            "decr" => Some(Self::Decrement),
            "decr_wrap" => Some(Self::DecrementWrap),
            "invert" => Some(Self::Invert),
            _ => None,
        }
    }
}

/// Stencil testing. `Disabled` corresponds to `stencil off`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum StencilTest {
    Disabled,
    Enabled {
        func: CompareFunc,
        reference: u32,
        mask: u32,
        fail: StencilOp,
        depth_fail: StencilOp,
        pass: StencilOp,
    },
}

/// Render state overrides declared by a pipeline definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct State {
    pub cull: Option<CullMode>,
    pub blend: Option<Blend>,
    pub color_mask: Option<ColorMask>,
    pub depth_write: Option<bool>,
    pub depth: Option<DepthTest>,
    pub stencil_mask: Option<u32>,
    pub stencil: Option<StencilTest>,
}

impl State {
    /// `true` when no field is set.
    #[must_use]
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}
